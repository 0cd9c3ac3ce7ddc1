use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    EvidenceTier, LogStatus, Program, ProgramKind, RequestSnapshot, RequestStatus, ServiceLog,
    Settings, Student, Term, VerificationRequest,
};

/// Everything a store is constructed from. Collections are keyed by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub programs_by_term: BTreeMap<String, Vec<Program>>,
    #[serde(default)]
    pub students_by_term: BTreeMap<String, Vec<Student>>,
    #[serde(default)]
    pub service_logs_by_term: BTreeMap<String, Vec<ServiceLog>>,
    #[serde(default)]
    pub verification_requests_by_term: BTreeMap<String, Vec<VerificationRequest>>,
}

impl SeedData {
    pub fn from_json(raw: &str) -> StoreResult<Self> {
        let seed: SeedData =
            serde_json::from_str(raw).map_err(|err| StoreError::Seed(err.to_string()))?;
        seed.validate()?;
        Ok(seed)
    }

    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| StoreError::Seed(format!("{}: {err}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Checks the cross-collection links the store relies on. Log ids are
    /// unique within a term, request ids are unique, and every queued request
    /// points at its own pending log of the same term.
    pub fn validate(&self) -> StoreResult<()> {
        for (term_id, logs) in &self.service_logs_by_term {
            let mut log_ids = HashSet::new();
            for log in logs {
                if !log_ids.insert(log.log_id.as_str()) {
                    return Err(StoreError::Seed(format!(
                        "duplicate service log {} in term {term_id}",
                        log.log_id
                    )));
                }
            }
        }

        let mut request_ids = HashSet::new();
        for (term_id, requests) in &self.verification_requests_by_term {
            let logs = self
                .service_logs_by_term
                .get(term_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let mut claimed_logs = HashSet::new();

            for request in requests {
                if !request_ids.insert(request.request_id.as_str()) {
                    return Err(StoreError::Seed(format!(
                        "duplicate verification request {}",
                        request.request_id
                    )));
                }
                if !claimed_logs.insert(request.log_id.as_str()) {
                    return Err(StoreError::Seed(format!(
                        "request {} references log {} which another request already covers",
                        request.request_id, request.log_id
                    )));
                }

                let log = logs
                    .iter()
                    .find(|log| log.log_id == request.log_id)
                    .ok_or_else(|| {
                        StoreError::Seed(format!(
                            "request {} references unknown log {} in term {term_id}",
                            request.request_id, request.log_id
                        ))
                    })?;

                if log.status != LogStatus::Pending {
                    return Err(StoreError::Seed(format!(
                        "request {} references log {} which is already {}",
                        request.request_id,
                        request.log_id,
                        log.status.as_str()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Built-in demo tenant: three terms, one of them with activity and two
    /// requests awaiting review.
    pub fn demo() -> StoreResult<Self> {
        let terms = vec![
            Term {
                term_id: "fall-2025".to_string(),
                name: "Fall 2025".to_string(),
                start_date: date(2025, 9, 1)?,
                end_date: date(2025, 12, 15)?,
                required_hours: 20.0,
            },
            Term {
                term_id: "spring-2026".to_string(),
                name: "Spring 2026".to_string(),
                start_date: date(2026, 1, 15)?,
                end_date: date(2026, 5, 15)?,
                required_hours: 20.0,
            },
            Term {
                term_id: "summer-2026".to_string(),
                name: "Summer 2026".to_string(),
                start_date: date(2026, 6, 1)?,
                end_date: date(2026, 8, 15)?,
                required_hours: 10.0,
            },
        ];

        let mut programs_by_term = BTreeMap::new();
        programs_by_term.insert(
            "spring-2026".to_string(),
            vec![
                program(
                    "csc-001",
                    "Columbia Service Corps",
                    ProgramKind::Campus,
                    "heart",
                    "spring-2026",
                ),
                program(
                    "gi-002",
                    "Green Initiative",
                    ProgramKind::Campus,
                    "leaf",
                    "spring-2026",
                ),
                program(
                    "hno-003",
                    "Hope NYC Outreach",
                    ProgramKind::NgoPartner,
                    "users",
                    "spring-2026",
                ),
            ],
        );
        programs_by_term.insert(
            "fall-2025".to_string(),
            vec![program(
                "csc-fall",
                "Columbia Service Corps",
                ProgramKind::Campus,
                "heart",
                "fall-2025",
            )],
        );
        programs_by_term.insert(
            "summer-2026".to_string(),
            vec![program(
                "summer-001",
                "Community Summer Support",
                ProgramKind::NgoPartner,
                "sun",
                "summer-2026",
            )],
        );

        let mut students_by_term = BTreeMap::new();
        students_by_term.insert(
            "spring-2026".to_string(),
            vec![
                student("stu-001", "Maya Chen", &["csc-001", "gi-002"]),
                student("stu-002", "Jordan Lee", &["hno-003"]),
                student("stu-003", "Amira Khan", &["csc-001"]),
            ],
        );
        students_by_term.insert(
            "fall-2025".to_string(),
            vec![student("stu-010", "Casey Moore", &["csc-fall"])],
        );
        students_by_term.insert("summer-2026".to_string(), Vec::new());

        let spring_logs = vec![
            log(
                "log-001",
                "stu-001",
                "csc-001",
                date(2026, 2, 1)?,
                4.0,
                "Weekend food pantry support",
                EvidenceTier::OrgConfirmed,
                LogStatus::Confirmed,
            )?,
            log(
                "log-002",
                "stu-002",
                "hno-003",
                date(2026, 1, 29)?,
                3.0,
                "Shelter intake assistance",
                EvidenceTier::SelfReported,
                LogStatus::Pending,
            )?,
            log(
                "log-003",
                "stu-003",
                "csc-001",
                date(2026, 1, 24)?,
                2.0,
                "Flagged duplicate attendance",
                EvidenceTier::SelfReported,
                LogStatus::Flagged,
            )?,
            log(
                "log-004",
                "stu-001",
                "gi-002",
                date(2026, 2, 8)?,
                10.0,
                "Riverside park restoration",
                EvidenceTier::OrgConfirmed,
                LogStatus::Confirmed,
            )?,
            log(
                "log-005",
                "stu-002",
                "hno-003",
                date(2026, 1, 20)?,
                6.0,
                "Meal delivery route",
                EvidenceTier::OrgConfirmed,
                LogStatus::Confirmed,
            )?,
            log(
                "log-006",
                "stu-003",
                "csc-001",
                date(2026, 2, 10)?,
                3.0,
                "Community garden training",
                EvidenceTier::SelfReported,
                LogStatus::Pending,
            )?,
            log(
                "log-007",
                "stu-003",
                "csc-001",
                date(2026, 1, 18)?,
                3.0,
                "After-school tutoring",
                EvidenceTier::OrgConfirmed,
                LogStatus::Confirmed,
            )?,
        ];
        let fall_logs = vec![
            log(
                "log-010",
                "stu-010",
                "csc-fall",
                date(2025, 10, 15)?,
                12.0,
                "Fall community event",
                EvidenceTier::OrgConfirmed,
                LogStatus::Confirmed,
            )?,
            log(
                "log-011",
                "stu-010",
                "csc-fall",
                date(2025, 12, 12)?,
                8.0,
                "Holiday toy drive",
                EvidenceTier::OrgConfirmed,
                LogStatus::Confirmed,
            )?,
        ];

        let spring_requests = vec![
            request_for(
                &spring_logs[1],
                "vr-001",
                "Jordan Lee",
                "jordan@columbia.edu",
                "JL",
                "Hope NYC Outreach",
                Some("Hope NYC Outreach"),
            ),
            request_for(
                &spring_logs[5],
                "vr-002",
                "Amira Khan",
                "amira@columbia.edu",
                "AK",
                "Columbia Service Corps",
                Some("Harlem Grown"),
            ),
        ];

        let mut service_logs_by_term = BTreeMap::new();
        service_logs_by_term.insert("spring-2026".to_string(), spring_logs);
        service_logs_by_term.insert("fall-2025".to_string(), fall_logs);
        service_logs_by_term.insert("summer-2026".to_string(), Vec::new());

        let mut verification_requests_by_term = BTreeMap::new();
        verification_requests_by_term.insert("spring-2026".to_string(), spring_requests);
        verification_requests_by_term.insert("fall-2025".to_string(), Vec::new());
        verification_requests_by_term.insert("summer-2026".to_string(), Vec::new());

        Ok(SeedData {
            settings: Settings::default(),
            terms,
            programs_by_term,
            students_by_term,
            service_logs_by_term,
            verification_requests_by_term,
        })
    }
}

fn date(year: i32, month: u32, day: u32) -> StoreResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| StoreError::Seed(format!("invalid date {year}-{month}-{day}")))
}

fn morning_of(day: NaiveDate) -> StoreResult<DateTime<Utc>> {
    let at = day
        .and_hms_opt(8, 0, 0)
        .ok_or_else(|| StoreError::Seed(format!("invalid timestamp on {day}")))?;
    Ok(Utc.from_utc_datetime(&at))
}

fn program(id: &str, name: &str, kind: ProgramKind, icon: &str, term_id: &str) -> Program {
    Program {
        program_id: id.to_string(),
        name: name.to_string(),
        kind,
        icon: icon.to_string(),
        term_id: term_id.to_string(),
    }
}

/// Demo students use `<first name>@columbia.edu` and their initials as avatar.
fn student(id: &str, name: &str, program_ids: &[&str]) -> Student {
    let first_name = name.split_whitespace().next().unwrap_or(name);
    Student {
        student_id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@columbia.edu", first_name.to_lowercase()),
        avatar: name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect(),
        program_ids: program_ids.iter().map(|id| id.to_string()).collect(),
        verified_hours: 0.0,
        required_hours: 0.0,
        progress: 0,
        risk_status: Default::default(),
        risk_score: 3,
        last_activity: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn log(
    id: &str,
    student_id: &str,
    program_id: &str,
    day: NaiveDate,
    hours: f64,
    description: &str,
    evidence_tier: EvidenceTier,
    status: LogStatus,
) -> StoreResult<ServiceLog> {
    Ok(ServiceLog {
        log_id: id.to_string(),
        student_id: student_id.to_string(),
        program_id: program_id.to_string(),
        date: day,
        hours,
        description: description.to_string(),
        evidence_tier,
        status,
        created_at: morning_of(day)?,
        updated_at: None,
    })
}

fn request_for(
    log: &ServiceLog,
    request_id: &str,
    student_name: &str,
    student_email: &str,
    student_avatar: &str,
    program_name: &str,
    ngo_name: Option<&str>,
) -> VerificationRequest {
    VerificationRequest {
        request_id: request_id.to_string(),
        log_id: log.log_id.clone(),
        snapshot: RequestSnapshot {
            student_id: log.student_id.clone(),
            student_name: student_name.to_string(),
            student_email: student_email.to_string(),
            student_avatar: student_avatar.to_string(),
            program_id: log.program_id.clone(),
            program_name: program_name.to_string(),
            hours: log.hours,
            log_date: log.date,
            evidence_tier: log.evidence_tier,
            description: log.description.clone(),
            ngo_name: ngo_name.map(str::to_string),
        },
        status: RequestStatus::AwaitingConfirmation,
        created_at: log.created_at,
    }
}
