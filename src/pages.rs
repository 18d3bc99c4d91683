//! Page models for the student panel.
//!
//! Each page has a pure `build` step that turns row sets into a model, and
//! an async `load` step that fetches those rows for one student. Models
//! render to HTML through askama and serialize to JSON for the CLI.

use askama::Template;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::attendance::{self, AttendanceSummary, CourseAttendance};
use crate::aggregate::fees::{self, FeeBalance, PaymentSummary};
use crate::aggregate::gpa::{self, GradeReport};
use crate::aggregate::library::{self, LibrarySummary};
use crate::aggregate::{group_in_order, term_label};
use crate::db;
use crate::error::PortalError;
use crate::models::{
    CourseProgressRow, EnrollmentRecord, FeeRecord, LibraryIssue, Notice, PaymentRecord,
    StudentProfile,
};
use crate::profile::ProfileForm;

const DASHBOARD_NOTICE_LIMIT: i64 = 5;
const LOW_ATTENDANCE_THRESHOLD: f64 = 75.0;

fn attendance_class(percentage: f64) -> &'static str {
    if percentage >= LOW_ATTENDANCE_THRESHOLD {
        "status-ok"
    } else if percentage >= 50.0 {
        "status-warn"
    } else {
        "status-bad"
    }
}

impl CourseAttendance {
    pub fn css_class(&self) -> &'static str {
        attendance_class(self.percentage)
    }
}

async fn require_profile(pool: &PgPool, student_id: Uuid) -> Result<StudentProfile, PortalError> {
    db::student_profile(pool, student_id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("student {student_id}")))
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCourse {
    pub course_code: String,
    pub course_name: String,
    pub credits: i32,
    pub status: String,
    pub grade_point: Option<f64>,
    pub attendance_percentage: f64,
}

impl DashboardCourse {
    pub fn grade_point_display(&self) -> String {
        match self.grade_point {
            Some(point) => format!("{point:.2}"),
            None => "Not Graded".to_string(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        attendance_class(self.attendance_percentage)
    }
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub student: StudentProfile,
    pub gpa: f64,
    pub course_count: usize,
    pub active_course_count: usize,
    pub courses: Vec<DashboardCourse>,
    pub fees: Vec<FeeBalance>,
    pub outstanding_balance: f64,
    pub payment_count: usize,
    pub notices: Vec<Notice>,
}

impl DashboardPage {
    pub fn build(
        student: StudentProfile,
        progress: &[CourseProgressRow],
        fee_rows: &[FeeRecord],
        payments: &[PaymentRecord],
        notices: Vec<Notice>,
    ) -> Self {
        let gpa = gpa::compute_gpa(
            progress
                .iter()
                .map(|row| (row.grade_point, f64::from(row.credits))),
        );

        let courses: Vec<DashboardCourse> = progress
            .iter()
            .map(|row| DashboardCourse {
                course_code: row.course_code.clone(),
                course_name: row.course_name.clone(),
                credits: row.credits,
                status: row.status.clone(),
                grade_point: row.grade_point,
                attendance_percentage: attendance::course_percentage(row),
            })
            .collect();

        let fees = fees::reconcile_all(fee_rows, payments);
        let outstanding_balance = fees.iter().map(|f| f.remaining.max(0.0)).sum();

        Self {
            student,
            gpa,
            course_count: courses.len(),
            active_course_count: courses
                .iter()
                .filter(|c| c.status.eq_ignore_ascii_case("enrolled"))
                .count(),
            courses,
            fees,
            outstanding_balance,
            payment_count: payments.len(),
            notices,
        }
    }

    pub async fn load(pool: &PgPool, student_id: Uuid) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        let progress = db::course_progress(pool, student_id).await?;
        let fee_rows =
            db::program_fees(pool, &student.program, Some(student.current_semester)).await?;
        let payments = db::payments(pool, student_id).await?;
        let notices = db::student_notices(pool, DASHBOARD_NOTICE_LIMIT).await?;
        Ok(Self::build(student, &progress, &fee_rows, &payments, notices))
    }
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "attendance.html")]
pub struct AttendancePage {
    pub student_name: String,
    pub summary: AttendanceSummary,
}

impl AttendancePage {
    pub fn overall_class(&self) -> &'static str {
        attendance_class(self.summary.percentage)
    }

    pub async fn load(pool: &PgPool, student_id: Uuid) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        let records = db::attendance_records(pool, student_id).await?;
        Ok(Self {
            student_name: student.full_name(),
            summary: attendance::summarize(&records),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseTerm {
    pub label: String,
    pub courses: Vec<EnrollmentRecord>,
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "courses.html")]
pub struct CoursesPage {
    pub student_name: String,
    pub course_count: usize,
    pub terms: Vec<CourseTerm>,
}

impl CoursesPage {
    pub fn build(student_name: String, records: Vec<EnrollmentRecord>) -> Self {
        let course_count = records.len();
        let terms = group_in_order(records, |r| term_label(&r.academic_year, &r.semester))
            .into_iter()
            .map(|(label, courses)| CourseTerm { label, courses })
            .collect();
        Self {
            student_name,
            course_count,
            terms,
        }
    }

    pub async fn load(pool: &PgPool, student_id: Uuid) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        let records = db::enrollment_records(pool, student_id).await?;
        Ok(Self::build(student.full_name(), records))
    }
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "grades.html")]
pub struct GradesPage {
    pub student_name: String,
    pub report: GradeReport,
}

impl GradesPage {
    pub async fn load(pool: &PgPool, student_id: Uuid) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        let records = db::enrollment_records(pool, student_id).await?;
        Ok(Self {
            student_name: student.full_name(),
            report: gpa::summarize_grades(&records),
        })
    }
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "payments.html")]
pub struct PaymentsPage {
    pub student_name: String,
    pub program: String,
    pub summary: PaymentSummary,
    pub payments: Vec<PaymentRecord>,
    pub fees: Vec<FeeBalance>,
}

impl PaymentsPage {
    pub fn build(student: &StudentProfile, payments: Vec<PaymentRecord>, fee_rows: &[FeeRecord]) -> Self {
        Self {
            student_name: student.full_name(),
            program: student.program.clone(),
            summary: fees::summarize_payments(&payments),
            fees: fees::reconcile_all(fee_rows, &payments),
            payments,
        }
    }

    pub async fn load(pool: &PgPool, student_id: Uuid) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        let payments = db::payments(pool, student_id).await?;
        let fee_rows = db::program_fees(pool, &student.program, None).await?;
        Ok(Self::build(&student, payments, &fee_rows))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryLoan {
    #[serde(flatten)]
    pub issue: LibraryIssue,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "library.html")]
pub struct LibraryPage {
    pub student_name: String,
    pub today: NaiveDate,
    pub summary: LibrarySummary,
    pub loans: Vec<LibraryLoan>,
}

impl LibraryPage {
    pub fn build(student_name: String, issues: Vec<LibraryIssue>, today: NaiveDate) -> Self {
        let summary = library::summarize_library(&issues, today);
        let loans = issues
            .into_iter()
            .map(|issue| LibraryLoan {
                overdue: library::is_overdue(&issue, today),
                issue,
            })
            .collect();
        Self {
            student_name,
            today,
            summary,
            loans,
        }
    }

    pub async fn load(pool: &PgPool, student_id: Uuid) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        let issues = db::library_issues(pool, student_id).await?;
        Ok(Self::build(student.full_name(), issues, Utc::now().date_naive()))
    }
}

#[derive(Debug, Clone, Serialize, Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub student: StudentProfile,
    pub form: ProfileForm,
    pub errors: Vec<String>,
    pub saved: bool,
}

impl ProfilePage {
    pub fn new(student: StudentProfile, saved: bool) -> Self {
        let form = ProfileForm::from(&student);
        Self {
            student,
            form,
            errors: Vec::new(),
            saved,
        }
    }

    /// Re-renders the submitted values alongside the validation messages.
    pub fn with_errors(student: StudentProfile, form: ProfileForm, errors: Vec<String>) -> Self {
        Self {
            student,
            form,
            errors,
            saved: false,
        }
    }

    pub async fn load(pool: &PgPool, student_id: Uuid, saved: bool) -> Result<Self, PortalError> {
        let student = require_profile(pool, student_id).await?;
        Ok(Self::new(student, saved))
    }
}

#[derive(Debug, Clone, Default, Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub signed_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn student() -> StudentProfile {
        StudentProfile {
            id: Uuid::new_v4(),
            student_number: "S2024001".to_string(),
            first_name: "Maya".to_string(),
            last_name: "Chen".to_string(),
            email: "maya.chen@campus.edu".to_string(),
            phone: None,
            address: None,
            emergency_contact: None,
            emergency_phone: None,
            program: "BSc Computer Science".to_string(),
            current_semester: 3,
            enrolled_on: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        }
    }

    fn enrollment(code: &str, year: &str, semester: &str, point: Option<f64>) -> EnrollmentRecord {
        EnrollmentRecord {
            enrollment_id: Uuid::new_v4(),
            course_code: code.to_string(),
            course_name: format!("{code} <intro>"),
            credits: 3,
            semester: semester.to_string(),
            academic_year: year.to_string(),
            teacher_name: None,
            status: "enrolled".to_string(),
            letter_grade: point.map(|_| "B".to_string()),
            grade_point: point,
        }
    }

    fn progress(code: &str, point: Option<f64>, present: i64, total: i64) -> CourseProgressRow {
        CourseProgressRow {
            course_code: code.to_string(),
            course_name: format!("{code} name"),
            credits: 3,
            status: "enrolled".to_string(),
            grade_point: point,
            present_count: present,
            total_count: total,
        }
    }

    fn fee(amount: f64) -> FeeRecord {
        FeeRecord {
            id: Uuid::new_v4(),
            description: "Tuition".to_string(),
            semester: 3,
            amount,
            due_date: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        }
    }

    fn payment(fee_id: Uuid, amount: f64, status: &str) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            fee_id: Some(fee_id),
            fee_description: Some("Tuition".to_string()),
            amount,
            status: status.to_string(),
            method: None,
            paid_at: Utc.with_ymd_and_hms(2025, 9, 2, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn dashboard_combines_gpa_attendance_and_fees() {
        let tuition = fee(1000.0);
        let payments = vec![
            payment(tuition.id, 400.0, "completed"),
            payment(tuition.id, 300.0, "pending"),
        ];
        let page = DashboardPage::build(
            student(),
            &[
                progress("CS101", Some(4.0), 3, 4),
                progress("MA101", Some(3.0), 0, 0),
                progress("CS201", None, 1, 2),
            ],
            &[tuition],
            &payments,
            Vec::new(),
        );

        assert_eq!(page.gpa, 3.5);
        assert_eq!(page.course_count, 3);
        assert_eq!(page.active_course_count, 3);
        assert_eq!(page.courses[0].attendance_percentage, 75.0);
        assert_eq!(page.courses[1].attendance_percentage, 0.0);
        assert_eq!(page.courses[2].grade_point_display(), "Not Graded");
        assert_eq!(page.fees[0].remaining, 600.0);
        assert_eq!(page.fees[0].status, fees::FeeStatus::Partial);
        assert_eq!(page.outstanding_balance, 600.0);
        assert_eq!(page.payment_count, 2);
    }

    #[test]
    fn courses_group_by_term_in_query_order() {
        let page = CoursesPage::build(
            "Maya Chen".to_string(),
            vec![
                enrollment("CS201", "2025-2026", "Fall", None),
                enrollment("EN110", "2024-2025", "Spring", Some(3.7)),
                enrollment("CS220", "2025-2026", "Fall", None),
            ],
        );
        assert_eq!(page.course_count, 3);
        assert_eq!(page.terms.len(), 2);
        assert_eq!(page.terms[0].label, "2025-2026 - Fall");
        assert_eq!(page.terms[0].courses.len(), 2);
        assert_eq!(page.terms[0].courses[1].course_code, "CS220");
        assert_eq!(page.terms[1].label, "2024-2025 - Spring");
    }

    #[test]
    fn grades_page_shows_placeholder_for_ungraded() {
        let records = vec![
            enrollment("CS101", "2024-2025", "Fall", Some(3.0)),
            enrollment("CS201", "2025-2026", "Fall", None),
        ];
        let page = GradesPage {
            student_name: "Maya Chen".to_string(),
            report: gpa::summarize_grades(&records),
        };
        let html = page.render().unwrap();
        assert!(html.contains("Not Graded"));
        assert!(html.contains("3.00"));
        assert!(html.contains("2025-2026 - Fall"));
    }

    #[test]
    fn rendered_markup_escapes_row_values() {
        let page = CoursesPage::build(
            "Maya Chen".to_string(),
            vec![enrollment("CS101", "2024-2025", "Fall", Some(3.0))],
        );
        let html = page.render().unwrap();
        assert!(html.contains("CS101 &lt;intro&gt;"));
        assert!(!html.contains("CS101 <intro>"));
    }

    #[test]
    fn payments_page_keeps_gross_and_credited_apart() {
        let tuition = fee(1000.0);
        let payments = vec![
            payment(tuition.id, 400.0, "completed"),
            payment(tuition.id, 250.0, "pending"),
        ];
        let page = PaymentsPage::build(&student(), payments, &[tuition]);
        assert_eq!(page.summary.gross_recorded, 650.0);
        assert_eq!(page.summary.credited_amount, 400.0);
        assert_eq!(page.fees[0].paid, 400.0);

        let html = page.render().unwrap();
        assert!(html.contains("650.00"));
        assert!(html.contains("400.00"));
        assert!(html.contains("Partial"));
    }

    #[test]
    fn attendance_page_renders_empty_state() {
        let page = AttendancePage {
            student_name: "Maya Chen".to_string(),
            summary: attendance::summarize(&[]),
        };
        let html = page.render().unwrap();
        assert!(html.contains("0.00%"));
        assert!(html.contains("No attendance recorded"));
    }

    #[test]
    fn profile_page_lists_validation_errors() {
        let page = ProfilePage::with_errors(
            student(),
            ProfileForm::default(),
            vec!["Email address is not valid.".to_string()],
        );
        let html = page.render().unwrap();
        assert!(html.contains("Email address is not valid."));
    }

    #[test]
    fn library_page_flags_overdue_loans() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let issues = vec![LibraryIssue {
            book_title: "Database System Concepts".to_string(),
            author: "Silberschatz".to_string(),
            issued_on: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            due_on: NaiveDate::from_ymd_opt(2025, 10, 15).unwrap(),
            returned_on: None,
            status: "issued".to_string(),
            fine: None,
        }];
        let page = LibraryPage::build("Maya Chen".to_string(), issues, today);
        assert!(page.loans[0].overdue);
        assert_eq!(page.summary.overdue, 1);
        let html = page.render().unwrap();
        assert!(html.contains("Overdue"));
        assert!(html.contains("<td>-</td>"));
    }
}
