use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use service_hours::models::{LogStatus, SettingsUpdate};
use service_hours::report::{self, ExportKind};
use service_hours::{Config, DemoStore, ResolutionMode, SeedData, SharedStore};

#[derive(Parser)]
#[command(name = "service-hours")]
#[command(about = "Service hours tracking for university volunteer programs", long_about = None)]
struct Cli {
    /// JSON seed file (defaults to SERVICE_HOURS_SEED_FILE, then the demo tenant)
    #[arg(long, global = true)]
    seed: Option<PathBuf>,
    /// How decisions on unknown request ids behave: strict or tolerant
    #[arg(long, global = true)]
    mode: Option<ResolutionMode>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List academic terms
    Terms,
    /// Show tenant settings
    Settings,
    /// Change the university name or dashboard title
    UpdateSettings {
        #[arg(long)]
        university_name: Option<String>,
        #[arg(long)]
        dashboard_title: Option<String>,
    },
    /// List programs offered in a term
    Programs {
        #[arg(long, default_value = "spring-2026")]
        term: String,
    },
    /// Show one program with its enrolled students
    Program {
        #[arg(long)]
        id: String,
    },
    /// List students with recomputed progress and risk
    Students {
        #[arg(long, default_value = "spring-2026")]
        term: String,
    },
    /// Show one student with their logs and pending hours
    Student {
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "spring-2026")]
        term: String,
    },
    /// List service logs, optionally by status
    Logs {
        #[arg(long, default_value = "spring-2026")]
        term: String,
        #[arg(long)]
        status: Option<LogStatus>,
    },
    /// List verification requests awaiting confirmation
    Requests {
        #[arg(long, default_value = "spring-2026")]
        term: String,
    },
    /// Show term KPIs
    Kpis {
        #[arg(long, default_value = "spring-2026")]
        term: String,
    },
    /// Confirm a verification request and credit its hours
    Confirm {
        #[arg(long)]
        request: String,
    },
    /// Reject a verification request
    Reject {
        #[arg(long)]
        request: String,
        #[arg(long)]
        reason: String,
    },
    /// Flag a verification request for follow-up
    Flag {
        #[arg(long)]
        request: String,
        #[arg(long)]
        reason: String,
    },
    /// Show recent audit events
    Audit {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Export confirmed service logs as CSV
    ExportLogs {
        #[arg(long, default_value = "spring-2026")]
        term: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the verification audit trail as CSV
    ExportAudit {
        #[arg(long, default_value = "spring-2026")]
        term: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown term report
    Report {
        #[arg(long, default_value = "spring-2026")]
        term: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "service_hours=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(seed) = cli.seed {
        config.seed_file = Some(seed);
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }

    let seed = match &config.seed_file {
        Some(path) => SeedData::from_path(path)
            .with_context(|| format!("failed to load seed from {}", path.display()))?,
        None => SeedData::demo().context("failed to build demo seed")?,
    };
    let store = SharedStore::new(
        DemoStore::new(seed, config.store_options()).context("seed data is inconsistent")?,
    );

    match cli.command {
        Commands::Terms => print_json(&store.list_terms().await)?,
        Commands::Settings => print_json(&store.get_settings().await)?,
        Commands::UpdateSettings {
            university_name,
            dashboard_title,
        } => {
            let settings = store
                .update_settings(SettingsUpdate {
                    university_name,
                    dashboard_title,
                })
                .await;
            print_json(&settings)?;
        }
        Commands::Programs { term } => {
            let programs = store.read(|store| store.list_programs(&term)).await;
            print_json(&programs)?;
        }
        Commands::Program { id } => {
            let detail = store.read(|store| store.get_program_detail(&id)).await?;
            print_json(&detail)?;
        }
        Commands::Students { term } => print_json(&store.list_students(&term).await)?,
        Commands::Student { id, term } => {
            let detail = store
                .write(|store| store.get_student_detail(&id, &term))
                .await?;
            print_json(&detail)?;
        }
        Commands::Logs { term, status } => {
            let logs = match status {
                Some(status) => {
                    store
                        .read(|store| store.list_service_logs_by_status(&term, status))
                        .await
                }
                None => store.read(|store| store.list_service_logs(&term)).await,
            };
            print_json(&logs)?;
        }
        Commands::Requests { term } => {
            let requests = store.list_verification_requests(&term).await;
            print_json(&requests)?;
        }
        Commands::Kpis { term } => print_json(&store.get_kpis(&term).await)?,
        Commands::Confirm { request } => {
            let outcome = store.confirm(&request).await?;
            print_json(&outcome)?;
        }
        Commands::Reject { request, reason } => {
            let outcome = store.reject(&request, &reason).await?;
            print_json(&outcome)?;
        }
        Commands::Flag { request, reason } => {
            let outcome = store.flag(&request, &reason).await?;
            print_json(&outcome)?;
        }
        Commands::Audit { limit } => {
            let events = store.read(|store| store.audit_events(limit)).await;
            print_json(&events)?;
        }
        Commands::ExportLogs { term, out } => {
            let rows = store.write(|store| store.export_verified_logs(&term)).await;
            let out = out.unwrap_or_else(|| ExportKind::VerifiedLogs.file_name(&term).into());
            write_export(&out, ExportKind::VerifiedLogs, &rows)?;
            println!("Wrote {} verified logs to {}.", rows.len(), out.display());
        }
        Commands::ExportAudit { term, out } => {
            let rows = store.write(|store| store.export_audit_trail(&term)).await;
            let out = out.unwrap_or_else(|| ExportKind::AuditTrail.file_name(&term).into());
            write_export(&out, ExportKind::AuditTrail, &rows)?;
            println!("Wrote {} audit events to {}.", rows.len(), out.display());
        }
        Commands::Report { term, out } => {
            let report = store
                .write(|store| {
                    let term_record = store.get_term(&term).ok();
                    let kpis = store.get_kpis(&term);
                    let students = store.list_students(&term);
                    let requests = store.list_verification_requests(&term, None);
                    report::build_report(&term, term_record.as_ref(), &kpis, &students, &requests)
                })
                .await;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_export<R: Serialize>(out: &Path, kind: ExportKind, rows: &[R]) -> anyhow::Result<()> {
    let file = std::fs::File::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    report::write_csv(file, kind.columns(), rows)?;
    Ok(())
}
