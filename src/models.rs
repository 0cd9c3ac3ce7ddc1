use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_UNIVERSITY_NAME: &str = "Columbia University";
pub const DEFAULT_DASHBOARD_TITLE: &str = "Test Pilot Dashboard";
pub const DEFAULT_PROGRAM_ICON: &str = "users";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub required_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub university_name: String,
    pub dashboard_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            university_name: DEFAULT_UNIVERSITY_NAME.to_string(),
            dashboard_title: DEFAULT_DASHBOARD_TITLE.to_string(),
        }
    }
}

/// Partial settings payload. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub university_name: Option<String>,
    #[serde(default)]
    pub dashboard_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Campus,
    NgoPartner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub program_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProgramKind,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub term_id: String,
}

fn default_icon() -> String {
    DEFAULT_PROGRAM_ICON.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    OnTrack,
    NeedsAttention,
    #[default]
    AtRisk,
}

impl RiskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RiskStatus::OnTrack => "on track",
            RiskStatus::NeedsAttention => "needs attention",
            RiskStatus::AtRisk => "at risk",
        }
    }
}

/// A student enrolled in one term.
///
/// Everything after `program_ids` is derived from the term's service logs
/// and is overwritten on every recompute; seed files may omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub program_ids: Vec<String>,
    #[serde(default)]
    pub verified_hours: f64,
    #[serde(default)]
    pub required_hours: f64,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub risk_status: RiskStatus,
    #[serde(default = "default_risk_score")]
    pub risk_score: u8,
    #[serde(default)]
    pub last_activity: Option<NaiveDate>,
}

fn default_risk_score() -> u8 {
    3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceTier {
    SelfReported,
    OrgConfirmed,
}

impl EvidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceTier::SelfReported => "self_reported",
            EvidenceTier::OrgConfirmed => "org_confirmed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Confirmed,
    Rejected,
    Flagged,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Pending => "pending",
            LogStatus::Confirmed => "confirmed",
            LogStatus::Rejected => "rejected",
            LogStatus::Flagged => "flagged",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LogStatus::Pending)
    }
}

impl FromStr for LogStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LogStatus::Pending),
            "confirmed" => Ok(LogStatus::Confirmed),
            "rejected" => Ok(LogStatus::Rejected),
            "flagged" => Ok(LogStatus::Flagged),
            other => Err(format!(
                "unknown log status '{other}' (expected pending, confirmed, rejected or flagged)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLog {
    pub log_id: String,
    pub student_id: String,
    pub program_id: String,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
    pub evidence_tier: EvidenceTier,
    pub status: LogStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    AwaitingConfirmation,
}

/// Student and program fields copied into a request when it was raised.
///
/// This is a point-in-time snapshot, not a live join: later changes to the
/// student, program or log are not reflected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    #[serde(default)]
    pub student_avatar: String,
    pub program_id: String,
    pub program_name: String,
    pub hours: f64,
    pub log_date: NaiveDate,
    pub evidence_tier: EvidenceTier,
    pub description: String,
    #[serde(default)]
    pub ngo_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub request_id: String,
    pub log_id: String,
    #[serde(flatten)]
    pub snapshot: RequestSnapshot,
    #[serde(default)]
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric<T> {
    pub value: T,
    pub delta: String,
}

impl<T> Metric<T> {
    pub fn new(value: T, delta: impl Into<String>) -> Self {
        Self {
            value,
            delta: delta.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub verified_hours: Metric<f64>,
    pub active_students: Metric<usize>,
    pub active_programs: Metric<usize>,
    pub retention_rate: Metric<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub students: Vec<Student>,
    pub active_students_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub logs: Vec<ServiceLog>,
    pub pending_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    UniversityAdmin,
    NgoPartner,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::UniversityAdmin => "university_admin",
            ActorRole::NgoPartner => "ngo_partner",
            ActorRole::System => "system",
        }
    }
}

/// Identity attached to audit events. Authentication is stubbed, so this
/// comes from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: ActorRole,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            id: "admin-001".to_string(),
            name: "Admin User".to_string(),
            role: ActorRole::UniversityAdmin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    ServiceLog,
    VerificationRequest,
    Settings,
    Export,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::ServiceLog => "service_log",
            EntityType::VerificationRequest => "verification_request",
            EntityType::Settings => "settings",
            EntityType::Export => "export",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Confirm,
    Reject,
    Flag,
    Edit,
    Export,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Confirm => "confirm",
            AuditAction::Reject => "reject",
            AuditAction::Flag => "flag",
            AuditAction::Edit => "edit",
            AuditAction::Export => "export",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub actor_id: String,
    pub actor_role: ActorRole,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: AuditAction,
    pub term_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
    pub notes: String,
}

/// Decision applied to a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Reject,
    Flag,
}

impl Decision {
    pub fn log_status(&self) -> LogStatus {
        match self {
            Decision::Confirm => LogStatus::Confirmed,
            Decision::Reject => LogStatus::Rejected,
            Decision::Flag => LogStatus::Flagged,
        }
    }

    pub fn audit_action(&self) -> AuditAction {
        match self {
            Decision::Confirm => AuditAction::Confirm,
            Decision::Reject => AuditAction::Reject,
            Decision::Flag => AuditAction::Flag,
        }
    }
}

/// Result of a confirm/reject/flag call.
///
/// `applied` is false only in tolerant mode when the request id was not
/// queued; such outcomes carry no term, log or audit event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub request_id: String,
    pub decision: Decision,
    pub applied: bool,
    pub hours_credited: f64,
    pub term_id: Option<String>,
    pub log_id: Option<String>,
    pub reason: Option<String>,
    pub audit_event_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_kind_uses_type_field_on_the_wire() {
        let program = Program {
            program_id: "hno-003".to_string(),
            name: "Hope NYC Outreach".to_string(),
            kind: ProgramKind::NgoPartner,
            icon: "users".to_string(),
            term_id: "spring-2026".to_string(),
        };
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["type"], "ngo_partner");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn student_derived_fields_default_when_missing() {
        let student: Student = serde_json::from_str(
            r#"{"student_id":"stu-9","name":"Rae Park","email":"rae@columbia.edu"}"#,
        )
        .unwrap();
        assert_eq!(student.verified_hours, 0.0);
        assert_eq!(student.progress, 0);
        assert_eq!(student.risk_status, RiskStatus::AtRisk);
        assert_eq!(student.risk_score, 3);
        assert!(student.program_ids.is_empty());
    }

    #[test]
    fn request_snapshot_is_flattened() {
        let json = r#"{
            "request_id": "vr-001",
            "log_id": "log-002",
            "student_id": "stu-002",
            "student_name": "Jordan Lee",
            "student_email": "jordan@columbia.edu",
            "program_id": "hno-003",
            "program_name": "Hope NYC Outreach",
            "hours": 3,
            "log_date": "2026-01-29",
            "evidence_tier": "self_reported",
            "description": "Shelter intake assistance",
            "created_at": "2026-01-29T08:00:00Z"
        }"#;
        let request: VerificationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.snapshot.student_name, "Jordan Lee");
        assert_eq!(request.snapshot.hours, 3.0);
        assert_eq!(request.status, RequestStatus::AwaitingConfirmation);

        let back = serde_json::to_value(&request).unwrap();
        assert_eq!(back["status"], "awaiting_confirmation");
        assert_eq!(back["student_id"], "stu-002");
    }

    #[test]
    fn decisions_map_to_terminal_statuses() {
        assert_eq!(Decision::Confirm.log_status(), LogStatus::Confirmed);
        assert_eq!(Decision::Reject.log_status(), LogStatus::Rejected);
        assert_eq!(Decision::Flag.log_status(), LogStatus::Flagged);
        assert!(Decision::Flag.log_status().is_terminal());
        assert!(!LogStatus::Pending.is_terminal());
    }

    #[test]
    fn log_status_parses_wire_names() {
        for status in [
            LogStatus::Pending,
            LogStatus::Confirmed,
            LogStatus::Rejected,
            LogStatus::Flagged,
        ] {
            assert_eq!(status.as_str().parse::<LogStatus>(), Ok(status));
        }
        assert!("approved".parse::<LogStatus>().is_err());
    }
}
