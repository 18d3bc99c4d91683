use serde::Serialize;

use crate::aggregate::{group_in_order, round2, term_label};
use crate::models::EnrollmentRecord;

/// Credit-weighted mean of grade points. Pairs without a grade point are
/// skipped entirely, so an ungraded enrollment never pulls the average down.
pub fn compute_gpa<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (Option<f64>, f64)>,
{
    let mut total_points = 0.0;
    let mut total_credits = 0.0;

    for (grade_point, credits) in pairs {
        let Some(point) = grade_point else {
            continue;
        };
        total_points += point * credits;
        total_credits += credits;
    }

    if total_credits > 0.0 {
        round2(total_points / total_credits)
    } else {
        0.0
    }
}

fn gpa_of(records: &[EnrollmentRecord]) -> f64 {
    compute_gpa(
        records
            .iter()
            .map(|r| (r.grade_point, f64::from(r.credits))),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterGrades {
    pub label: String,
    pub gpa: f64,
    /// Credits across every enrollment in the term, graded or not.
    pub total_credits: i32,
    pub graded_credits: i32,
    pub records: Vec<EnrollmentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub overall_gpa: f64,
    pub total_credits: i32,
    pub graded_credits: i32,
    pub semesters: Vec<SemesterGrades>,
}

pub fn summarize_grades(records: &[EnrollmentRecord]) -> GradeReport {
    let overall_gpa = gpa_of(records);
    let (total_credits, graded_credits) = credit_totals(records);

    let semesters = group_in_order(records.iter().cloned(), |r| {
        term_label(&r.academic_year, &r.semester)
    })
    .into_iter()
    .map(|(label, records)| {
        let gpa = gpa_of(&records);
        let (total_credits, graded_credits) = credit_totals(&records);
        SemesterGrades {
            label,
            gpa,
            total_credits,
            graded_credits,
            records,
        }
    })
    .collect();

    GradeReport {
        overall_gpa,
        total_credits,
        graded_credits,
        semesters,
    }
}

fn credit_totals(records: &[EnrollmentRecord]) -> (i32, i32) {
    records.iter().fold((0, 0), |(total, graded), r| {
        let graded = if r.grade_point.is_some() {
            graded + r.credits
        } else {
            graded
        };
        (total + r.credits, graded)
    })
}
