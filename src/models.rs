use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub id: Uuid,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub program: String,
    pub current_semester: i32,
    pub enrolled_on: NaiveDate,
}

impl StudentProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One attendance mark joined with its course and teacher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub course_code: String,
    pub course_name: String,
    pub semester: String,
    pub academic_year: String,
    pub teacher_name: Option<String>,
    pub attended_on: NaiveDate,
    pub status: String,
    pub remarks: Option<String>,
}

impl AttendanceRecord {
    pub fn is_present(&self) -> bool {
        self.status.eq_ignore_ascii_case("present")
    }

    pub fn remarks_display(&self) -> &str {
        self.remarks.as_deref().unwrap_or("-")
    }
}

/// An enrollment joined with its offering, course, teacher and optional grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentRecord {
    pub enrollment_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub credits: i32,
    pub semester: String,
    pub academic_year: String,
    pub teacher_name: Option<String>,
    pub status: String,
    pub letter_grade: Option<String>,
    pub grade_point: Option<f64>,
}

impl EnrollmentRecord {
    pub fn teacher_display(&self) -> &str {
        self.teacher_name.as_deref().unwrap_or("TBA")
    }

    pub fn grade_display(&self) -> &str {
        self.letter_grade.as_deref().unwrap_or("Not Graded")
    }

    pub fn grade_point_display(&self) -> String {
        match self.grade_point {
            Some(point) => format!("{point:.2}"),
            None => "-".to_string(),
        }
    }
}

/// Per-enrollment rollup used by the dashboard: grade plus attendance counts.
#[derive(Debug, Clone, Serialize)]
pub struct CourseProgressRow {
    pub course_code: String,
    pub course_name: String,
    pub credits: i32,
    pub status: String,
    pub grade_point: Option<f64>,
    pub present_count: i64,
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeeRecord {
    pub id: Uuid,
    pub description: String,
    pub semester: i32,
    pub amount: f64,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub fee_id: Option<Uuid>,
    pub fee_description: Option<String>,
    pub amount: f64,
    pub status: String,
    pub method: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case("pending")
    }

    pub fn fee_display(&self) -> &str {
        self.fee_description.as_deref().unwrap_or("-")
    }

    pub fn method_display(&self) -> &str {
        self.method.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryIssue {
    pub book_title: String,
    pub author: String,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub status: String,
    pub fine: Option<f64>,
}

impl LibraryIssue {
    pub fn returned_display(&self) -> String {
        self.returned_on
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn fine_display(&self) -> String {
        match self.fine {
            Some(fine) => format!("{fine:.2}"),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token: Uuid,
    pub role: String,
    pub profile_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}
