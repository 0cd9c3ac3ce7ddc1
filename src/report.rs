use std::fmt::Write;

use serde::Serialize;

use crate::models::{
    AuditEvent, KpiSnapshot, LogStatus, Program, RiskStatus, ServiceLog, Student, Term,
    VerificationRequest,
};

pub const VERIFIED_LOG_COLUMNS: &[&str] = &[
    "student_name",
    "student_email",
    "program_name",
    "term_name",
    "log_date",
    "hours",
    "evidence_tier",
    "status",
    "description",
];

pub const AUDIT_COLUMNS: &[&str] = &[
    "event_id",
    "actor_id",
    "actor_role",
    "entity_type",
    "entity_id",
    "action",
    "timestamp",
    "reason",
    "notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    VerifiedLogs,
    AuditTrail,
}

impl ExportKind {
    pub fn entity_id(&self, term_id: &str) -> String {
        match self {
            ExportKind::VerifiedLogs => format!("verified-logs-{term_id}"),
            ExportKind::AuditTrail => format!("audit-trail-{term_id}"),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ExportKind::VerifiedLogs => VERIFIED_LOG_COLUMNS,
            ExportKind::AuditTrail => AUDIT_COLUMNS,
        }
    }

    pub fn file_name(&self, term_id: &str) -> String {
        match self {
            ExportKind::VerifiedLogs => format!("verified_logs_{term_id}.csv"),
            ExportKind::AuditTrail => format!("audit_trail_{term_id}.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedLogRow {
    pub student_name: String,
    pub student_email: String,
    pub program_name: String,
    pub term_name: String,
    pub log_date: String,
    pub hours: f64,
    pub evidence_tier: String,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub event_id: String,
    pub actor_id: String,
    pub actor_role: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub timestamp: String,
    pub reason: String,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct RiskSummary {
    pub risk_status: RiskStatus,
    pub count: usize,
    pub avg_progress: f64,
}

pub fn verified_log_rows(
    term_id: &str,
    term: Option<&Term>,
    students: &[Student],
    programs: &[Program],
    logs: &[ServiceLog],
) -> Vec<VerifiedLogRow> {
    let term_name = term.map_or(term_id, |term| term.name.as_str());

    logs.iter()
        .filter(|log| log.status == LogStatus::Confirmed)
        .map(|log| {
            let student = students
                .iter()
                .find(|student| student.student_id == log.student_id);
            let program = programs
                .iter()
                .find(|program| program.program_id == log.program_id);

            VerifiedLogRow {
                student_name: student.map_or("Unknown", |s| s.name.as_str()).to_string(),
                student_email: student.map_or("", |s| s.email.as_str()).to_string(),
                program_name: program.map_or("Unknown", |p| p.name.as_str()).to_string(),
                term_name: term_name.to_string(),
                log_date: log.date.to_string(),
                hours: log.hours,
                evidence_tier: log.evidence_tier.as_str().to_string(),
                status: log.status.as_str().to_string(),
                description: log.description.clone(),
            }
        })
        .collect()
}

pub fn audit_rows(events: &[AuditEvent]) -> Vec<AuditRow> {
    events
        .iter()
        .map(|event| AuditRow {
            event_id: event.event_id.to_string(),
            actor_id: event.actor_id.clone(),
            actor_role: event.actor_role.as_str().to_string(),
            entity_type: event.entity_type.as_str().to_string(),
            entity_id: event.entity_id.clone(),
            action: event.action.as_str().to_string(),
            timestamp: event.timestamp.to_rfc3339(),
            reason: event.reason.clone().unwrap_or_default(),
            notes: event.notes.clone(),
        })
        .collect()
}

/// Writes `columns` as the header row, then one record per row. The header
/// is written even when there are no rows.
pub fn write_csv<W: std::io::Write, R: Serialize>(
    writer: W,
    columns: &[&str],
    rows: &[R],
) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(columns)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn summarize_by_risk(students: &[Student]) -> Vec<RiskSummary> {
    let mut summaries: Vec<RiskSummary> = Vec::new();

    for student in students {
        match summaries
            .iter()
            .position(|summary| summary.risk_status == student.risk_status)
        {
            Some(index) => {
                let summary = &mut summaries[index];
                summary.avg_progress += student.progress as f64;
                summary.count += 1;
            }
            None => summaries.push(RiskSummary {
                risk_status: student.risk_status,
                count: 1,
                avg_progress: student.progress as f64,
            }),
        }
    }

    for summary in summaries.iter_mut() {
        summary.avg_progress /= summary.count as f64;
    }
    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(
    term_id: &str,
    term: Option<&Term>,
    kpis: &KpiSnapshot,
    students: &[Student],
    requests: &[VerificationRequest],
) -> String {
    let summaries = summarize_by_risk(students);

    let mut output = String::new();
    let term_label = term.map_or(term_id, |term| term.name.as_str());

    let _ = writeln!(output, "# Service Hours Report");
    match term {
        Some(term) => {
            let _ = writeln!(
                output,
                "Generated for {} ({} to {}, {} hours required)",
                term_label, term.start_date, term.end_date, term.required_hours
            );
        }
        None => {
            let _ = writeln!(output, "Generated for {}", term_label);
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Figures");
    let _ = writeln!(output, "- Verified hours: {}", kpis.verified_hours.value);
    let _ = writeln!(output, "- Active students: {}", kpis.active_students.value);
    let _ = writeln!(output, "- Active programs: {}", kpis.active_programs.value);
    let _ = writeln!(output, "- Retention rate: {}%", kpis.retention_rate.value);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students enrolled this term.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students (avg progress {:.0}%)",
                summary.risk_status.label(),
                summary.count,
                summary.avg_progress
            );
        }
    }

    let mut attention: Vec<&Student> = students
        .iter()
        .filter(|student| student.risk_status != RiskStatus::OnTrack)
        .collect();
    attention.sort_by(|a, b| {
        b.risk_score
            .cmp(&a.risk_score)
            .then_with(|| a.progress.cmp(&b.progress))
    });
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Needing Attention");

    if attention.is_empty() {
        let _ = writeln!(output, "Every student is on track.");
    } else {
        for student in attention.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) {}: {} of {} hours ({}%)",
                student.name,
                student.email,
                student.risk_status.label(),
                student.verified_hours,
                student.required_hours,
                student.progress
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Awaiting Verification");

    if requests.is_empty() {
        let _ = writeln!(output, "No requests awaiting confirmation.");
    } else {
        for request in requests.iter() {
            let _ = writeln!(
                output,
                "- {} for {} ({}) on {}: {} hours, {}",
                request.request_id,
                request.snapshot.student_name,
                request.snapshot.program_name,
                request.snapshot.log_date,
                request.snapshot.hours,
                request.snapshot.evidence_tier.as_str()
            );
        }
    }

    output
}
