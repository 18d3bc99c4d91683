use serde::Serialize;

use crate::aggregate::{group_in_order, percentage};
use crate::models::{AttendanceRecord, CourseProgressRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseAttendance {
    pub course_code: String,
    pub course_name: String,
    pub semester: String,
    pub academic_year: String,
    pub teacher_name: Option<String>,
    pub present: usize,
    pub total: usize,
    pub percentage: f64,
    pub records: Vec<AttendanceRecord>,
}

impl CourseAttendance {
    pub fn teacher_display(&self) -> &str {
        self.teacher_name.as_deref().unwrap_or("TBA")
    }

    pub fn absent(&self) -> usize {
        self.total - self.present
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub present: usize,
    pub total: usize,
    pub percentage: f64,
    pub courses: Vec<CourseAttendance>,
}

pub fn summarize(records: &[AttendanceRecord]) -> AttendanceSummary {
    let present = records.iter().filter(|r| r.is_present()).count();
    let total = records.len();

    let groups = group_in_order(records.iter().cloned(), |r| {
        (r.course_code.clone(), r.course_name.clone())
    });

    let courses = groups
        .into_iter()
        .map(|((course_code, course_name), records)| {
            // Offering fields are homogeneous within a course; take the first row.
            let first = &records[0];
            let semester = first.semester.clone();
            let academic_year = first.academic_year.clone();
            let teacher_name = first.teacher_name.clone();
            let present = records.iter().filter(|r| r.is_present()).count();
            let total = records.len();

            CourseAttendance {
                course_code,
                course_name,
                semester,
                academic_year,
                teacher_name,
                present,
                total,
                percentage: percentage(present, total),
                records,
            }
        })
        .collect();

    AttendanceSummary {
        present,
        total,
        percentage: percentage(present, total),
        courses,
    }
}

/// Attendance percentage for a pre-aggregated dashboard row.
pub fn course_percentage(row: &CourseProgressRow) -> f64 {
    percentage(
        row.present_count.max(0) as usize,
        row.total_count.max(0) as usize,
    )
}
