use anyhow::Context;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).context("invalid date")
}

/// Loads a realistic demo term: two students with graded and ungraded
/// enrollments, attendance marks, fees with partial payments, and loans.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let mut teachers = Vec::new();
    for (name, email) in [
        ("Dr. Amara Okafor", "amara.okafor@campus.edu"),
        ("Prof. Lucas Brandt", "lucas.brandt@campus.edu"),
    ] {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.teachers (id, full_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await?
        .get("id");
        teachers.push(id);
    }

    let program = "BSc Computer Science";
    let mut students = Vec::new();
    for (number, first, last, email, phone) in [
        ("S2024001", "Maya", "Chen", "maya.chen@campus.edu", Some("+1 555 010 2001")),
        ("S2024002", "Omar", "Haddad", "omar.haddad@campus.edu", None),
    ] {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.students
            (id, student_number, first_name, last_name, email, phone, program,
             current_semester, enrolled_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 3, $8)
            ON CONFLICT (student_number) DO UPDATE
            SET program = EXCLUDED.program, current_semester = EXCLUDED.current_semester
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(number)
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(phone)
        .bind(program)
        .bind(date(2024, 9, 1)?)
        .fetch_one(pool)
        .await?
        .get("id");
        students.push(id);
    }

    let courses = [
        ("CS101", "Programming Fundamentals", 4),
        ("MA101", "Calculus I", 3),
        ("EN110", "Academic Writing", 2),
        ("CS201", "Data Structures", 4),
        ("CS220", "Database Systems", 3),
    ];
    let mut course_ids = Vec::new();
    for (code, name, credits) in courses {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.courses (id, code, name, credits)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name, credits = EXCLUDED.credits
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(name)
        .bind(credits)
        .fetch_one(pool)
        .await?
        .get("id");
        course_ids.push(id);
    }

    // (course index, semester, academic year, teacher index, first session)
    let offerings = [
        (0, "Fall", "2024-2025", Some(0), date(2024, 9, 2)?),
        (1, "Fall", "2024-2025", Some(1), date(2024, 9, 2)?),
        (2, "Spring", "2024-2025", None, date(2025, 1, 13)?),
        (3, "Fall", "2025-2026", Some(0), date(2025, 9, 1)?),
        (4, "Fall", "2025-2026", Some(1), date(2025, 9, 1)?),
    ];
    let mut offering_ids = Vec::new();
    for (course, semester, year, teacher, starts_on) in offerings {
        let teacher_id: Option<Uuid> = teacher.map(|t: usize| teachers[t]);
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.course_offerings
            (id, course_id, teacher_id, semester, academic_year, starts_on)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (course_id, semester, academic_year) DO UPDATE
            SET teacher_id = EXCLUDED.teacher_id
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_ids[course])
        .bind(teacher_id)
        .bind(semester)
        .bind(year)
        .bind(starts_on)
        .fetch_one(pool)
        .await?
        .get("id");
        offering_ids.push((id, starts_on));
    }

    // (student index, offering index, status, letter grade, grade point)
    let enrollments: [(usize, usize, &str, Option<&str>, Option<f64>); 8] = [
        (0, 0, "completed", Some("A"), Some(4.0)),
        (0, 1, "completed", Some("B+"), Some(3.3)),
        (0, 2, "completed", Some("A-"), Some(3.7)),
        (0, 3, "enrolled", None, None),
        (0, 4, "enrolled", None, None),
        (1, 0, "completed", Some("B"), Some(3.0)),
        (1, 1, "completed", Some("I"), None),
        (1, 3, "enrolled", None, None),
    ];
    let statuses = ["present", "present", "absent", "present", "late", "present", "present", "absent"];

    for (student, offering, status, letter, point) in enrollments {
        let (offering_id, starts_on) = offering_ids[offering];
        let enrollment_id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.enrollments (id, student_id, offering_id, status, enrolled_on)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id, offering_id) DO UPDATE SET status = EXCLUDED.status
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(students[student])
        .bind(offering_id)
        .bind(status)
        .bind(starts_on - Duration::days(14))
        .fetch_one(pool)
        .await?
        .get("id");

        if letter.is_some() {
            sqlx::query(
                r#"
                INSERT INTO portal.grades (id, enrollment_id, letter_grade, grade_point)
                VALUES ($1, $2, $3, $4::float8)
                ON CONFLICT (enrollment_id) DO UPDATE
                SET letter_grade = EXCLUDED.letter_grade, grade_point = EXCLUDED.grade_point
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(enrollment_id)
            .bind(letter)
            .bind(point)
            .execute(pool)
            .await?;
        }

        if status == "enrolled" {
            for (week, mark) in statuses.iter().enumerate().skip(student) {
                let remarks = (*mark == "late").then_some("Arrived after roll call");
                sqlx::query(
                    r#"
                    INSERT INTO portal.attendance (id, enrollment_id, attended_on, status, remarks)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (enrollment_id, attended_on) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(enrollment_id)
                .bind(starts_on + Duration::weeks(week as i64))
                .bind(*mark)
                .bind(remarks)
                .execute(pool)
                .await?;
            }
        }
    }

    let fees = [
        (1, "Tuition", 2500.0, date(2024, 9, 15)?),
        (1, "Library fee", 50.0, date(2024, 9, 15)?),
        (2, "Tuition", 2500.0, date(2025, 1, 20)?),
        (3, "Tuition", 2600.0, date(2025, 9, 15)?),
        (3, "Lab fee", 150.0, date(2025, 9, 15)?),
    ];
    let mut fee_ids = Vec::new();
    for (semester, description, amount, due_date) in fees {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.fees (id, program, semester, description, amount, due_date)
            VALUES ($1, $2, $3, $4, $5::float8, $6)
            ON CONFLICT (program, semester, description) DO UPDATE
            SET amount = EXCLUDED.amount, due_date = EXCLUDED.due_date
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(program)
        .bind(semester)
        .bind(description)
        .bind(amount)
        .bind(due_date)
        .fetch_one(pool)
        .await?
        .get("id");
        fee_ids.push(id);
    }

    // (reference, student index, fee index, amount, status, method, paid on)
    let payments = [
        ("seed-pay-001", 0, 0, 2500.0, "completed", "card", (2024, 9, 10)),
        ("seed-pay-002", 0, 1, 50.0, "completed", "card", (2024, 9, 10)),
        ("seed-pay-003", 0, 2, 2500.0, "completed", "bank transfer", (2025, 1, 15)),
        ("seed-pay-004", 0, 3, 1000.0, "completed", "card", (2025, 9, 5)),
        ("seed-pay-005", 0, 3, 600.0, "pending", "bank transfer", (2025, 9, 28)),
        ("seed-pay-006", 1, 0, 2500.0, "completed", "bank transfer", (2024, 9, 12)),
        ("seed-pay-007", 1, 2, 1200.0, "completed", "card", (2025, 1, 18)),
        ("seed-pay-008", 1, 3, 300.0, "failed", "card", (2025, 9, 14)),
    ];
    for (reference, student, fee, amount, status, method, (y, m, d)) in payments {
        let paid_at = Utc
            .with_ymd_and_hms(y, m, d, 10, 30, 0)
            .single()
            .context("invalid payment timestamp")?;
        sqlx::query(
            r#"
            INSERT INTO portal.payments
            (id, student_id, fee_id, amount, status, method, reference, paid_at)
            VALUES ($1, $2, $3, $4::float8, $5, $6, $7, $8)
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(students[student])
        .bind(fee_ids[fee])
        .bind(amount)
        .bind(status)
        .bind(method)
        .bind(reference)
        .bind(paid_at)
        .execute(pool)
        .await?;
    }

    let books = [
        ("9780262046305", "Introduction to Algorithms", "Cormen et al."),
        ("9780078022159", "Database System Concepts", "Silberschatz et al."),
        ("9780133594140", "Computer Networking", "Kurose and Ross"),
    ];
    let mut book_ids = Vec::new();
    for (isbn, title, author) in books {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.books (id, isbn, title, author)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (isbn) DO UPDATE SET title = EXCLUDED.title
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(isbn)
        .bind(title)
        .bind(author)
        .fetch_one(pool)
        .await?
        .get("id");
        book_ids.push(id);
    }

    // (student, book, issued, due, returned, status, fine)
    let issues = [
        (0, 0, date(2025, 9, 10)?, date(2025, 9, 24)?, Some(date(2025, 9, 30)?), "returned", Some(3.0)),
        (0, 1, date(2025, 10, 1)?, date(2025, 10, 15)?, None, "issued", None),
        (1, 2, date(2025, 9, 20)?, date(2025, 10, 4)?, Some(date(2025, 10, 2)?), "returned", None),
    ];
    for (student, book, issued_on, due_on, returned_on, status, fine) in issues {
        sqlx::query(
            r#"
            INSERT INTO portal.library_issues
            (id, student_id, book_id, issued_on, due_on, returned_on, status, fine)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8::float8)
            ON CONFLICT (student_id, book_id, issued_on) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(students[student])
        .bind(book_ids[book])
        .bind(issued_on)
        .bind(due_on)
        .bind(returned_on)
        .bind(status)
        .bind(fine)
        .execute(pool)
        .await?;
    }

    let notices = [
        ("Fall registration closes", "Add/drop for the Fall term closes on September 15.", "student"),
        ("Library hours extended", "The main library is open until midnight during exams.", "all"),
        ("Faculty meeting", "Department meeting in room B204.", "teacher"),
    ];
    for (title, body, audience) in notices {
        sqlx::query(
            r#"
            INSERT INTO portal.notices (id, title, body, audience)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(body)
        .bind(audience)
        .execute(pool)
        .await?;
    }

    Ok(())
}
