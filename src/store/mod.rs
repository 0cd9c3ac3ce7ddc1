//! In-memory data store for one tenant.
//!
//! Service logs are the source of truth for hours. Student progress, risk
//! tiers and term KPIs are derived from them by [`DemoStore::recompute_term`]
//! and refreshed on construction, on recomputing reads and after every
//! write. Reads hand out owned copies; writes take `&mut self`, so a
//! decision is never observable half-applied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Actor, AuditAction, AuditEvent, EntityType, KpiSnapshot, Program, ServiceLog, Settings,
    SettingsUpdate, Student, Term, VerificationRequest,
};
use crate::seed::SeedData;

mod export;
mod query;
mod recompute;
mod resolve;
mod shared;

pub use shared::SharedStore;

/// What a decision on an unknown request id does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Unknown request ids are a `NotFound` error.
    #[default]
    Strict,
    /// Unknown request ids resolve to a no-op outcome with `applied = false`,
    /// so a repeated click on an already-resolved request is harmless.
    Tolerant,
}

impl FromStr for ResolutionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ResolutionMode::Strict),
            "tolerant" => Ok(ResolutionMode::Tolerant),
            other => Err(format!(
                "unknown resolution mode '{other}' (expected strict or tolerant)"
            )),
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::Strict => write!(f, "strict"),
            ResolutionMode::Tolerant => write!(f, "tolerant"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub mode: ResolutionMode,
    pub actor: Actor,
}

#[derive(Debug)]
pub struct DemoStore {
    options: StoreOptions,
    settings: Settings,
    terms: Vec<Term>,
    programs_by_term: BTreeMap<String, Vec<Program>>,
    students_by_term: BTreeMap<String, Vec<Student>>,
    logs_by_term: BTreeMap<String, Vec<ServiceLog>>,
    requests_by_term: BTreeMap<String, Vec<VerificationRequest>>,
    kpis_by_term: BTreeMap<String, KpiSnapshot>,
    audit_log: Vec<AuditEvent>,
}

impl DemoStore {
    pub fn new(seed: SeedData, options: StoreOptions) -> StoreResult<Self> {
        seed.validate()?;

        let mut store = Self {
            options,
            settings: seed.settings,
            terms: seed.terms,
            programs_by_term: seed.programs_by_term,
            students_by_term: seed.students_by_term,
            logs_by_term: seed.service_logs_by_term,
            requests_by_term: seed.verification_requests_by_term,
            kpis_by_term: BTreeMap::new(),
            audit_log: Vec::new(),
        };
        store.recompute_all();

        info!(
            terms = store.terms.len(),
            mode = %store.options.mode,
            "demo store ready"
        );
        Ok(store)
    }

    pub fn demo(options: StoreOptions) -> StoreResult<Self> {
        Self::new(SeedData::demo()?, options)
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Merges `update` into the settings. An empty or missing dashboard title
    /// keeps the current one.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Settings {
        if let Some(university_name) = update.university_name {
            self.settings.university_name = university_name;
        }
        if let Some(title) = update.dashboard_title {
            if !title.trim().is_empty() {
                self.settings.dashboard_title = title;
            }
        }

        let notes = format!(
            "Settings changed to university '{}', title '{}'",
            self.settings.university_name, self.settings.dashboard_title
        );
        self.record_event(
            EntityType::Settings,
            "settings".to_string(),
            AuditAction::Edit,
            None,
            None,
            notes,
        );
        info!(university = %self.settings.university_name, "settings updated");

        self.settings.clone()
    }

    /// Every term id the store holds data for, seeded term or not.
    fn known_term_ids(&self) -> BTreeSet<String> {
        self.terms
            .iter()
            .map(|term| term.term_id.clone())
            .chain(self.programs_by_term.keys().cloned())
            .chain(self.students_by_term.keys().cloned())
            .chain(self.logs_by_term.keys().cloned())
            .chain(self.requests_by_term.keys().cloned())
            .collect()
    }

    fn is_known_term(&self, term_id: &str) -> bool {
        self.terms.iter().any(|term| term.term_id == term_id)
            || self.programs_by_term.contains_key(term_id)
            || self.students_by_term.contains_key(term_id)
            || self.logs_by_term.contains_key(term_id)
            || self.requests_by_term.contains_key(term_id)
    }

    fn record_event(
        &mut self,
        entity_type: EntityType,
        entity_id: String,
        action: AuditAction,
        term_id: Option<String>,
        reason: Option<String>,
        notes: String,
    ) -> Uuid {
        let event = AuditEvent {
            event_id: Uuid::new_v4(),
            actor_id: self.options.actor.id.clone(),
            actor_role: self.options.actor.role,
            entity_type,
            entity_id,
            action,
            term_id,
            timestamp: Utc::now(),
            reason,
            notes,
        };
        let event_id = event.event_id;
        self.audit_log.push(event);
        event_id
    }
}

fn require_reason(reason: Option<&str>) -> StoreResult<String> {
    match reason.map(str::trim) {
        Some(reason) if !reason.is_empty() => Ok(reason.to_string()),
        _ => Err(StoreError::Validation(
            "a reason is required to reject or flag a request".to_string(),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::{ActorRole, RiskStatus};

    #[test]
    fn construction_refreshes_seeded_derived_fields() {
        let mut seed = single_student_seed();
        let students = seed.students_by_term.get_mut(TERM).unwrap();
        students[0].verified_hours = 99.0;
        students[0].progress = 100;

        let mut store = DemoStore::new(seed, StoreOptions::default()).unwrap();
        let students = store.list_students(TERM);
        let student = &students[0];
        assert_eq!(student.verified_hours, 4.0);
        assert_eq!(student.progress, 20);
        assert_eq!(student.risk_status, RiskStatus::AtRisk);
    }

    #[test]
    fn invalid_seed_is_refused() {
        let mut seed = single_student_seed();
        seed.service_logs_by_term.get_mut(TERM).unwrap().pop();

        let err = DemoStore::new(seed, StoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::Seed(_)));
    }

    #[test]
    fn settings_update_keeps_title_when_absent() {
        let mut store = DemoStore::new(single_student_seed(), StoreOptions::default()).unwrap();
        let before = store.get_settings();

        let merged = store.update_settings(SettingsUpdate {
            university_name: Some("X".to_string()),
            dashboard_title: None,
        });

        assert_eq!(merged.university_name, "X");
        assert_eq!(merged.dashboard_title, before.dashboard_title);
        assert_eq!(store.get_settings(), merged);
    }

    #[test]
    fn settings_update_ignores_blank_title() {
        let mut store = DemoStore::new(single_student_seed(), StoreOptions::default()).unwrap();

        let merged = store.update_settings(SettingsUpdate {
            university_name: None,
            dashboard_title: Some("   ".to_string()),
        });
        assert_eq!(merged, Settings::default());

        let merged = store.update_settings(SettingsUpdate {
            university_name: None,
            dashboard_title: Some("Impact Board".to_string()),
        });
        assert_eq!(merged.dashboard_title, "Impact Board");
        assert_eq!(merged.university_name, Settings::default().university_name);
    }

    #[test]
    fn settings_edits_are_audited_with_configured_actor() {
        let options = StoreOptions {
            mode: ResolutionMode::Strict,
            actor: Actor {
                id: "admin-042".to_string(),
                name: "Dana Ortiz".to_string(),
                role: ActorRole::UniversityAdmin,
            },
        };
        let mut store = DemoStore::new(single_student_seed(), options).unwrap();
        store.update_settings(SettingsUpdate {
            university_name: Some("Barnard College".to_string()),
            dashboard_title: None,
        });

        let events = store.audit_events(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor_id, "admin-042");
        assert_eq!(events[0].action, AuditAction::Edit);
        assert_eq!(events[0].entity_type, EntityType::Settings);
        assert!(events[0].notes.contains("Barnard College"));
    }

    #[test]
    fn resolution_mode_parses_case_insensitively() {
        let strict: ResolutionMode = "Strict".parse().unwrap();
        assert_eq!(strict, ResolutionMode::Strict);
        let tolerant: ResolutionMode = " tolerant ".parse().unwrap();
        assert_eq!(tolerant, ResolutionMode::Tolerant);
        assert!("lenient".parse::<ResolutionMode>().is_err());
        assert_eq!(ResolutionMode::Tolerant.to_string(), "tolerant");
    }

    #[test]
    fn blank_reasons_are_invalid() {
        assert!(require_reason(None).is_err());
        assert!(require_reason(Some("")).is_err());
        assert!(require_reason(Some("  \t")).is_err());
        let reason = require_reason(Some(" duplicate ")).unwrap();
        assert_eq!(reason, "duplicate");
    }
}
