use std::time::Instant;

use chrono::{Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    AttendanceRecord, CourseProgressRow, EnrollmentRecord, FeeRecord, LibraryIssue, Notice,
    PaymentRecord, SessionRecord, StudentProfile,
};
use crate::profile::ProfileUpdate;
use crate::session::Role;

/// Per-query timing. `QUERY_DEBUG` raises this module's stderr level so these
/// lines show up without touching `RUST_LOG`.
fn observe(query: &'static str, started: Instant, rows: usize) {
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    debug!(query, rows, elapsed_ms, "query executed");
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn student_id_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<Uuid>> {
    let started = Instant::now();
    let row = sqlx::query("SELECT id FROM portal.students WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    observe("student_id_by_email", started, row.iter().count());
    Ok(row.map(|r| r.get("id")))
}

pub async fn student_profile(pool: &PgPool, student_id: Uuid) -> sqlx::Result<Option<StudentProfile>> {
    let started = Instant::now();
    let row = sqlx::query(
        r#"
        SELECT id, student_number, first_name, last_name, email, phone, address,
               emergency_contact, emergency_phone, program, current_semester, enrolled_on
        FROM portal.students
        WHERE id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?;
    observe("student_profile", started, row.iter().count());

    Ok(row.map(|row| StudentProfile {
        id: row.get("id"),
        student_number: row.get("student_number"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        address: row.get("address"),
        emergency_contact: row.get("emergency_contact"),
        emergency_phone: row.get("emergency_phone"),
        program: row.get("program"),
        current_semester: row.get("current_semester"),
        enrolled_on: row.get("enrolled_on"),
    }))
}

pub async fn attendance_records(pool: &PgPool, student_id: Uuid) -> sqlx::Result<Vec<AttendanceRecord>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT c.code, c.name, o.semester, o.academic_year, t.full_name AS teacher_name,
               a.attended_on, a.status, a.remarks
        FROM portal.attendance a
        JOIN portal.enrollments e ON e.id = a.enrollment_id
        JOIN portal.course_offerings o ON o.id = e.offering_id
        JOIN portal.courses c ON c.id = o.course_id
        LEFT JOIN portal.teachers t ON t.id = o.teacher_id
        WHERE e.student_id = $1
        ORDER BY o.starts_on DESC, c.code, a.attended_on DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    observe("attendance_records", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| AttendanceRecord {
            course_code: row.get("code"),
            course_name: row.get("name"),
            semester: row.get("semester"),
            academic_year: row.get("academic_year"),
            teacher_name: row.get("teacher_name"),
            attended_on: row.get("attended_on"),
            status: row.get("status"),
            remarks: row.get("remarks"),
        })
        .collect())
}

pub async fn enrollment_records(pool: &PgPool, student_id: Uuid) -> sqlx::Result<Vec<EnrollmentRecord>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT e.id AS enrollment_id, c.code, c.name, c.credits, o.semester, o.academic_year,
               t.full_name AS teacher_name, e.status, g.letter_grade,
               g.grade_point::float8 AS grade_point
        FROM portal.enrollments e
        JOIN portal.course_offerings o ON o.id = e.offering_id
        JOIN portal.courses c ON c.id = o.course_id
        LEFT JOIN portal.teachers t ON t.id = o.teacher_id
        LEFT JOIN portal.grades g ON g.enrollment_id = e.id
        WHERE e.student_id = $1
        ORDER BY o.starts_on DESC, c.code
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    observe("enrollment_records", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| EnrollmentRecord {
            enrollment_id: row.get("enrollment_id"),
            course_code: row.get("code"),
            course_name: row.get("name"),
            credits: row.get("credits"),
            semester: row.get("semester"),
            academic_year: row.get("academic_year"),
            teacher_name: row.get("teacher_name"),
            status: row.get("status"),
            letter_grade: row.get("letter_grade"),
            grade_point: row.get("grade_point"),
        })
        .collect())
}

pub async fn course_progress(pool: &PgPool, student_id: Uuid) -> sqlx::Result<Vec<CourseProgressRow>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT c.code, c.name, c.credits, e.status,
               g.grade_point::float8 AS grade_point,
               COUNT(a.id) FILTER (WHERE lower(a.status) = 'present') AS present_count,
               COUNT(a.id) AS total_count
        FROM portal.enrollments e
        JOIN portal.course_offerings o ON o.id = e.offering_id
        JOIN portal.courses c ON c.id = o.course_id
        LEFT JOIN portal.grades g ON g.enrollment_id = e.id
        LEFT JOIN portal.attendance a ON a.enrollment_id = e.id
        WHERE e.student_id = $1
        GROUP BY e.id, o.id, c.id, g.id
        ORDER BY o.starts_on DESC, c.code
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    observe("course_progress", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| CourseProgressRow {
            course_code: row.get("code"),
            course_name: row.get("name"),
            credits: row.get("credits"),
            status: row.get("status"),
            grade_point: row.get("grade_point"),
            present_count: row.get("present_count"),
            total_count: row.get("total_count"),
        })
        .collect())
}

/// Fee structure for a program, optionally limited to semesters up to `up_to_semester`.
pub async fn program_fees(
    pool: &PgPool,
    program: &str,
    up_to_semester: Option<i32>,
) -> sqlx::Result<Vec<FeeRecord>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT id, description, semester, amount::float8 AS amount, due_date
        FROM portal.fees
        WHERE program = $1 AND ($2::int IS NULL OR semester <= $2)
        ORDER BY semester, due_date, description
        "#,
    )
    .bind(program)
    .bind(up_to_semester)
    .fetch_all(pool)
    .await?;
    observe("program_fees", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| FeeRecord {
            id: row.get("id"),
            description: row.get("description"),
            semester: row.get("semester"),
            amount: row.get("amount"),
            due_date: row.get("due_date"),
        })
        .collect())
}

pub async fn payments(pool: &PgPool, student_id: Uuid) -> sqlx::Result<Vec<PaymentRecord>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.fee_id, f.description AS fee_description,
               p.amount::float8 AS amount, p.status, p.method, p.paid_at
        FROM portal.payments p
        LEFT JOIN portal.fees f ON f.id = p.fee_id
        WHERE p.student_id = $1
        ORDER BY p.paid_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    observe("payments", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| PaymentRecord {
            id: row.get("id"),
            fee_id: row.get("fee_id"),
            fee_description: row.get("fee_description"),
            amount: row.get("amount"),
            status: row.get("status"),
            method: row.get("method"),
            paid_at: row.get("paid_at"),
        })
        .collect())
}

pub async fn library_issues(pool: &PgPool, student_id: Uuid) -> sqlx::Result<Vec<LibraryIssue>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT b.title, b.author, li.issued_on, li.due_on, li.returned_on, li.status,
               li.fine::float8 AS fine
        FROM portal.library_issues li
        JOIN portal.books b ON b.id = li.book_id
        WHERE li.student_id = $1
        ORDER BY li.issued_on DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    observe("library_issues", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| LibraryIssue {
            book_title: row.get("title"),
            author: row.get("author"),
            issued_on: row.get("issued_on"),
            due_on: row.get("due_on"),
            returned_on: row.get("returned_on"),
            status: row.get("status"),
            fine: row.get("fine"),
        })
        .collect())
}

pub async fn student_notices(pool: &PgPool, limit: i64) -> sqlx::Result<Vec<Notice>> {
    let started = Instant::now();
    let rows = sqlx::query(
        r#"
        SELECT title, body, published_at
        FROM portal.notices
        WHERE audience IN ('all', 'student') AND published_at <= now()
        ORDER BY published_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    observe("student_notices", started, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| Notice {
            title: row.get("title"),
            body: row.get("body"),
            published_at: row.get("published_at"),
        })
        .collect())
}

pub async fn update_profile(pool: &PgPool, student_id: Uuid, update: &ProfileUpdate) -> sqlx::Result<bool> {
    let started = Instant::now();
    let result = sqlx::query(
        r#"
        UPDATE portal.students
        SET first_name = $2, last_name = $3, email = $4, phone = $5, address = $6,
            emergency_contact = $7, emergency_phone = $8, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(student_id)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .bind(&update.phone)
    .bind(&update.address)
    .bind(&update.emergency_contact)
    .bind(&update.emergency_phone)
    .execute(pool)
    .await?;
    observe("update_profile", started, result.rows_affected() as usize);

    Ok(result.rows_affected() > 0)
}

pub async fn find_session(pool: &PgPool, token: Uuid) -> sqlx::Result<Option<SessionRecord>> {
    let started = Instant::now();
    let row = sqlx::query(
        "SELECT token, role, profile_id, expires_at FROM portal.sessions WHERE token = $1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    observe("find_session", started, row.iter().count());

    Ok(row.map(|row| SessionRecord {
        token: row.get("token"),
        role: row.get("role"),
        profile_id: row.get("profile_id"),
        expires_at: row.get("expires_at"),
    }))
}

pub async fn open_session(
    pool: &PgPool,
    role: Role,
    profile_id: Option<Uuid>,
    ttl: Duration,
) -> sqlx::Result<Uuid> {
    let pruned = prune_expired_sessions(pool).await?;
    if pruned > 0 {
        debug!(pruned, "expired sessions removed");
    }

    let token = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO portal.sessions (token, role, profile_id, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(token)
    .bind(role.as_str())
    .bind(profile_id)
    .bind(Utc::now() + ttl)
    .execute(pool)
    .await?;
    Ok(token)
}

pub async fn close_session(pool: &PgPool, token: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM portal.sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    prune_expired_sessions(pool).await?;
    Ok(())
}

pub async fn prune_expired_sessions(pool: &PgPool) -> sqlx::Result<u64> {
    let started = Instant::now();
    let result = sqlx::query("DELETE FROM portal.sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    observe("prune_expired_sessions", started, result.rows_affected() as usize);
    Ok(result.rows_affected())
}
