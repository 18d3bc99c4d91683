use std::path::PathBuf;

use anyhow::Context;
use askama::Template;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

mod aggregate;
mod config;
mod db;
mod error;
mod models;
mod pages;
mod profile;
mod seed;
mod server;
mod session;
mod telemetry;

use crate::config::Config;
use crate::pages::{
    AttendancePage, CoursesPage, DashboardPage, GradesPage, LibraryPage, PaymentsPage, ProfilePage,
};
use crate::session::Role;

#[derive(Parser)]
#[command(name = "campus-portal")]
#[command(about = "Student panel for the campus management portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Issue a student session token for the given email
    OpenSession {
        #[arg(long)]
        email: String,
    },
    /// Render one student page to stdout or a file
    Render {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum)]
        page: PageKind,
        #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Serve the student panel over HTTP
    Serve {
        /// Overrides PORTAL_BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageKind {
    Dashboard,
    Attendance,
    Courses,
    Grades,
    Payments,
    Library,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Json,
}

fn emit<T>(page: &T, format: OutputFormat) -> anyhow::Result<String>
where
    T: Template + serde::Serialize,
{
    match format {
        OutputFormat::Html => Ok(page.render()?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
    }
}

async fn render_page(
    pool: &PgPool,
    student_id: Uuid,
    page: PageKind,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match page {
        PageKind::Dashboard => emit(&DashboardPage::load(pool, student_id).await?, format),
        PageKind::Attendance => emit(&AttendancePage::load(pool, student_id).await?, format),
        PageKind::Courses => emit(&CoursesPage::load(pool, student_id).await?, format),
        PageKind::Grades => emit(&GradesPage::load(pool, student_id).await?, format),
        PageKind::Payments => emit(&PaymentsPage::load(pool, student_id).await?, format),
        PageKind::Library => emit(&LibraryPage::load(pool, student_id).await?, format),
        PageKind::Profile => emit(&ProfilePage::load(pool, student_id, false).await?, format),
    }
}

async fn student_id(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    db::student_id_by_email(pool, email)
        .await?
        .with_context(|| format!("no student with email {email}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let _log_guard = telemetry::init(&config.log_file_path, config.query_debug)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            seed::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::OpenSession { email } => {
            let student_id = student_id(&pool, &email).await?;
            let token =
                db::open_session(&pool, Role::Student, Some(student_id), config.session_ttl).await?;
            info!(%student_id, "student session opened");
            println!("Session token: {token}");
            println!(
                "Cookie: {}",
                session::session_cookie(token, config.session_ttl.num_seconds())
            );
        }
        Commands::Render {
            email,
            page,
            format,
            out,
        } => {
            let student_id = student_id(&pool, &email).await?;
            let rendered = render_page(&pool, student_id, page, format).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Page written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            server::serve(server::AppState { pool }, &bind_addr).await?;
        }
    }

    Ok(())
}
