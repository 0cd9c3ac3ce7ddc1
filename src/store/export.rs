use tracing::info;

use crate::models::{AuditAction, EntityType};
use crate::report::{self, AuditRow, ExportKind, VerifiedLogRow};

use super::DemoStore;

// Exports are reads, but each one leaves an `export` event behind.
impl DemoStore {
    pub fn export_verified_logs(&mut self, term_id: &str) -> Vec<VerifiedLogRow> {
        let students = self.list_students(term_id);
        let term = self.get_term(term_id).ok();
        let rows = report::verified_log_rows(
            term_id,
            term.as_ref(),
            &students,
            &self.list_programs(term_id),
            &self.list_service_logs(term_id),
        );

        let label = term.as_ref().map_or(term_id, |term| term.name.as_str());
        let count = rows.len();
        let notes = format!("Exported verified logs for {label}. {count} records.");
        self.record_export(ExportKind::VerifiedLogs, term_id, notes);
        rows
    }

    /// Rows reflect the trail as it stood before this export was recorded.
    pub fn export_audit_trail(&mut self, term_id: &str) -> Vec<AuditRow> {
        let rows = report::audit_rows(&self.audit_trail(term_id));

        let term = self.get_term(term_id).ok();
        let label = term.as_ref().map_or(term_id, |term| term.name.as_str());
        let count = rows.len();
        let notes = format!("Exported audit trail for {label}. {count} events.");
        self.record_export(ExportKind::AuditTrail, term_id, notes);
        rows
    }

    fn record_export(&mut self, kind: ExportKind, term_id: &str, notes: String) {
        let entity_id = kind.entity_id(term_id);
        info!(term_id, export = %entity_id, "export recorded");
        self.record_event(
            EntityType::Export,
            entity_id,
            AuditAction::Export,
            Some(term_id.to_string()),
            None,
            notes,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::StoreOptions;
    use super::*;

    #[test]
    fn verified_log_export_is_audited() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();
        let rows = store.export_verified_logs("spring-2026");
        assert_eq!(rows.len(), 4);

        let events = store.audit_events(1);
        assert_eq!(events[0].action, AuditAction::Export);
        assert_eq!(events[0].entity_id, "verified-logs-spring-2026");
        assert_eq!(
            events[0].notes,
            "Exported verified logs for Spring 2026. 4 records."
        );
    }

    #[test]
    fn confirmed_request_shows_up_in_next_export() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();
        store.confirm("vr-001").unwrap();

        let rows = store.export_verified_logs("spring-2026");
        assert_eq!(rows.len(), 5);
        assert!(rows
            .iter()
            .any(|row| row.student_name == "Jordan Lee" && row.hours == 3.0));
    }

    #[test]
    fn audit_export_excludes_itself() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();
        store.reject("vr-002", "insufficient evidence").unwrap();

        let first = store.export_audit_trail("spring-2026");
        assert_eq!(first.len(), 1);

        let second = store.export_audit_trail("spring-2026");
        assert_eq!(second.len(), 2);
        assert_eq!(second[1].action, "export");
        assert_eq!(second[1].entity_id, "audit-trail-spring-2026");
    }

    #[test]
    fn unknown_term_export_is_empty_but_recorded() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();
        assert!(store.export_verified_logs("winter-2030").is_empty());
        assert_eq!(
            store.audit_events(1)[0].notes,
            "Exported verified logs for winter-2030. 0 records."
        );
    }
}
