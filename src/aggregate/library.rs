use chrono::NaiveDate;
use serde::Serialize;

use crate::models::LibraryIssue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibrarySummary {
    pub on_loan: usize,
    pub overdue: usize,
    pub total_fines: f64,
}

/// Only `issued` rows are out with the student; `lost` and `returned` are not.
fn is_on_loan(issue: &LibraryIssue) -> bool {
    issue.status.eq_ignore_ascii_case("issued") && issue.returned_on.is_none()
}

pub fn is_overdue(issue: &LibraryIssue, today: NaiveDate) -> bool {
    is_on_loan(issue) && issue.due_on < today
}

/// Loan counts as of `today` plus every recorded fine, whatever the row's
/// status. A missing fine counts as zero.
pub fn summarize_library(issues: &[LibraryIssue], today: NaiveDate) -> LibrarySummary {
    LibrarySummary {
        on_loan: issues.iter().filter(|i| is_on_loan(i)).count(),
        overdue: issues.iter().filter(|i| is_overdue(i, today)).count(),
        total_fines: issues.iter().filter_map(|i| i.fine).sum(),
    }
}
