use crate::error::{StoreError, StoreResult};
use crate::models::{
    AuditEvent, KpiSnapshot, LogStatus, Program, ProgramDetail, RequestStatus, ServiceLog,
    Settings, Student, StudentDetail, Term, VerificationRequest,
};
use crate::risk;

use super::DemoStore;

// Unknown term ids read as empty collections; only lookups by entity id
// can fail.
impl DemoStore {
    pub fn list_terms(&self) -> Vec<Term> {
        self.terms.clone()
    }

    pub fn get_term(&self, term_id: &str) -> StoreResult<Term> {
        self.terms
            .iter()
            .find(|term| term.term_id == term_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("term", term_id))
    }

    pub fn get_settings(&self) -> Settings {
        self.settings.clone()
    }

    pub fn list_programs(&self, term_id: &str) -> Vec<Program> {
        self.programs_by_term
            .get(term_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The program plus every student, in any term, enrolled in it.
    pub fn get_program_detail(&self, program_id: &str) -> StoreResult<ProgramDetail> {
        let program = self
            .programs_by_term
            .values()
            .flatten()
            .find(|program| program.program_id == program_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("program", program_id))?;

        let students: Vec<Student> = self
            .students_by_term
            .values()
            .flatten()
            .filter(|student| student.program_ids.iter().any(|id| id == program_id))
            .cloned()
            .collect();

        Ok(ProgramDetail {
            program,
            active_students_count: students.len(),
            students,
        })
    }

    pub fn list_verification_requests(
        &self,
        term_id: &str,
        status: Option<RequestStatus>,
    ) -> Vec<VerificationRequest> {
        self.requests_by_term
            .get(term_id)
            .map(|requests| {
                requests
                    .iter()
                    .filter(|request| status.map_or(true, |status| request.status == status))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn list_service_logs(&self, term_id: &str) -> Vec<ServiceLog> {
        self.logs_by_term.get(term_id).cloned().unwrap_or_default()
    }

    pub fn list_service_logs_by_status(&self, term_id: &str, status: LogStatus) -> Vec<ServiceLog> {
        self.logs_by_term
            .get(term_id)
            .map(|logs| {
                logs.iter()
                    .filter(|log| log.status == status)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn list_students(&mut self, term_id: &str) -> Vec<Student> {
        self.recompute_term(term_id);
        self.students_by_term
            .get(term_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_student_detail(
        &mut self,
        student_id: &str,
        term_id: &str,
    ) -> StoreResult<StudentDetail> {
        self.recompute_term(term_id);

        let student = self
            .students_by_term
            .get(term_id)
            .and_then(|students| {
                students
                    .iter()
                    .find(|student| student.student_id == student_id)
            })
            .cloned()
            .ok_or_else(|| StoreError::not_found("student", student_id))?;

        let logs: Vec<ServiceLog> = self
            .logs_by_term
            .get(term_id)
            .map(|logs| {
                logs.iter()
                    .filter(|log| log.student_id == student_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let pending_hours = risk::pending_hours(&logs, student_id);

        Ok(StudentDetail {
            student,
            logs,
            pending_hours,
        })
    }

    pub fn get_kpis(&mut self, term_id: &str) -> KpiSnapshot {
        self.recompute_term(term_id)
    }

    /// KPIs as of the last recompute. Construction and every decision
    /// recompute their term, so this agrees with [`DemoStore::get_kpis`].
    /// `None` for terms the store holds no data for.
    pub fn cached_kpis(&self, term_id: &str) -> Option<KpiSnapshot> {
        self.kpis_by_term.get(term_id).cloned()
    }

    /// Most recent events first.
    pub fn audit_events(&self, limit: usize) -> Vec<AuditEvent> {
        self.audit_log.iter().rev().take(limit).cloned().collect()
    }

    /// Events for `term_id` plus tenant-wide events (settings edits), oldest
    /// first.
    pub fn audit_trail(&self, term_id: &str) -> Vec<AuditEvent> {
        self.audit_log
            .iter()
            .filter(|event| event.term_id.as_deref().map_or(true, |id| id == term_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::StoreOptions;
    use super::*;
    use crate::models::{RiskStatus, SettingsUpdate};

    fn demo() -> DemoStore {
        DemoStore::demo(StoreOptions::default()).unwrap()
    }

    #[test]
    fn cached_kpis_follow_decisions() {
        let mut store = demo();
        let seeded = store.cached_kpis("spring-2026").unwrap();
        assert_eq!(seeded.verified_hours.value, 23.0);

        store.confirm("vr-001").unwrap();
        let cached = store.cached_kpis("spring-2026").unwrap();
        assert_eq!(cached.verified_hours.value, 26.0);
        assert_eq!(cached, store.get_kpis("spring-2026"));
        assert!(store.cached_kpis("winter-2030").is_none());
    }

    #[test]
    fn unknown_term_reads_are_empty() {
        let mut store = demo();
        assert!(store.list_programs("winter-2030").is_empty());
        assert!(store.list_service_logs("winter-2030").is_empty());
        assert!(store
            .list_verification_requests("winter-2030", None)
            .is_empty());
        assert!(store.list_students("winter-2030").is_empty());
        assert_eq!(store.get_kpis("winter-2030").verified_hours.value, 0.0);
    }

    #[test]
    fn unknown_entities_are_not_found() {
        let mut store = demo();
        assert!(matches!(
            store.get_term("winter-2030"),
            Err(StoreError::NotFound { entity: "term", .. })
        ));
        assert!(matches!(
            store.get_program_detail("nope"),
            Err(StoreError::NotFound { entity: "program", .. })
        ));
        assert!(matches!(
            store.get_student_detail("stu-999", "spring-2026"),
            Err(StoreError::NotFound { entity: "student", .. })
        ));
        // Known student, wrong term.
        assert!(store.get_student_detail("stu-010", "spring-2026").is_err());
    }

    #[test]
    fn scenario_pending_hours_do_not_count() {
        let mut store = DemoStore::new(single_student_seed(), StoreOptions::default()).unwrap();
        let students = store.list_students(TERM);

        assert_eq!(students.len(), 1);
        assert_eq!(students[0].verified_hours, 4.0);
        assert_eq!(students[0].progress, 20);
        assert_eq!(students[0].risk_status, RiskStatus::AtRisk);
        assert_eq!(students[0].risk_score, 3);
    }

    #[test]
    fn student_detail_attaches_logs_and_pending_hours() {
        let mut store = DemoStore::new(single_student_seed(), StoreOptions::default()).unwrap();
        let detail = store.get_student_detail("stu-1", TERM).unwrap();

        assert_eq!(detail.student.student_id, "stu-1");
        assert_eq!(detail.logs.len(), 2);
        assert_eq!(detail.pending_hours, 3.0);
        assert_eq!(detail.student.verified_hours, 4.0);
    }

    #[test]
    fn program_detail_joins_enrolled_students() {
        let store = demo();
        let detail = store.get_program_detail("csc-001").unwrap();

        assert_eq!(detail.program.name, "Columbia Service Corps");
        let ids: Vec<&str> = detail
            .students
            .iter()
            .map(|student| student.student_id.as_str())
            .collect();
        assert_eq!(ids, vec!["stu-001", "stu-003"]);
        assert_eq!(detail.active_students_count, 2);
    }

    #[test]
    fn request_filter_by_status() {
        let store = demo();
        let all = store.list_verification_requests("spring-2026", None);
        assert_eq!(all.len(), 2);
        let status = Some(RequestStatus::AwaitingConfirmation);
        let awaiting = store.list_verification_requests("spring-2026", status);
        assert_eq!(awaiting.len(), 2);
    }

    #[test]
    fn logs_filter_by_status() {
        let store = demo();
        let pending = store.list_service_logs_by_status("spring-2026", LogStatus::Pending);
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|log| log.status == LogStatus::Pending));
    }

    #[test]
    fn returned_values_are_isolated_from_the_store() {
        let mut store = demo();

        let mut students = store.list_students("spring-2026");
        students[0].verified_hours = 999.0;
        students[0].name = "Changed".to_string();
        students.clear();

        let mut logs = store.list_service_logs("spring-2026");
        logs[0].status = LogStatus::Rejected;

        let mut requests = store.list_verification_requests("spring-2026", None);
        requests.pop();

        let mut settings = store.get_settings();
        settings.university_name = "Changed".to_string();

        let mut detail = store.get_student_detail("stu-001", "spring-2026").unwrap();
        detail.logs.clear();

        let fresh = store.list_students("spring-2026");
        assert_eq!(fresh.len(), 3);
        assert_eq!(fresh[0].name, "Maya Chen");
        assert_eq!(fresh[0].verified_hours, 14.0);
        let logs = store.list_service_logs("spring-2026");
        assert_eq!(logs[0].status, LogStatus::Confirmed);
        let queue = store.list_verification_requests("spring-2026", None);
        assert_eq!(queue.len(), 2);
        assert_eq!(store.get_settings().university_name, "Columbia University");
        assert_eq!(
            store
                .get_student_detail("stu-001", "spring-2026")
                .unwrap()
                .logs
                .len(),
            2
        );
    }

    #[test]
    fn audit_trail_includes_tenant_wide_events() {
        let mut store = demo();
        store.update_settings(SettingsUpdate {
            university_name: Some("Barnard College".to_string()),
            dashboard_title: None,
        });
        store.confirm("vr-001").unwrap();
        store.reject("vr-002", "duplicate").unwrap();

        let trail = store.audit_trail("spring-2026");
        assert_eq!(trail.len(), 3);
        assert!(store.audit_trail("fall-2025").len() == 1);

        let recent = store.audit_events(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "vr-002");
        assert_eq!(recent[1].entity_id, "vr-001");
    }
}
