use tracing::debug;

use crate::models::{KpiSnapshot, Metric, ServiceLog, Student};
use crate::risk::{self, FALLBACK_REQUIRED_HOURS};

use super::DemoStore;

const RECOMPUTED_DELTA: &str = "Demo data";

impl DemoStore {
    pub(crate) fn required_hours(&self, term_id: &str) -> f64 {
        self.terms
            .iter()
            .find(|term| term.term_id == term_id)
            .map(|term| term.required_hours)
            .unwrap_or(FALLBACK_REQUIRED_HOURS)
    }

    /// Rebuilds every student's derived fields for `term_id` from its logs,
    /// then the term's KPIs from those students.
    ///
    /// Deterministic: with no log change in between, two calls produce the
    /// same students and KPIs. The snapshot is only kept for terms the store
    /// holds data for.
    pub fn recompute_term(&mut self, term_id: &str) -> KpiSnapshot {
        let required_hours = self.required_hours(term_id);
        let logs = self
            .logs_by_term
            .get(term_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut total_verified = 0.0;
        let mut progresses = Vec::new();
        if let Some(students) = self.students_by_term.get_mut(term_id) {
            for student in students.iter_mut() {
                refresh_student(student, logs, required_hours);
                total_verified += student.verified_hours;
                progresses.push(student.progress);
            }
        }

        let kpis = KpiSnapshot {
            verified_hours: Metric::new(total_verified, RECOMPUTED_DELTA),
            active_students: Metric::new(progresses.len(), RECOMPUTED_DELTA),
            active_programs: Metric::new(
                self.programs_by_term.get(term_id).map_or(0, Vec::len),
                RECOMPUTED_DELTA,
            ),
            retention_rate: Metric::new(risk::retention_rate(&progresses), RECOMPUTED_DELTA),
        };

        debug!(
            term_id,
            students = progresses.len(),
            verified_hours = total_verified,
            "recomputed term"
        );

        if self.is_known_term(term_id) {
            self.kpis_by_term.insert(term_id.to_string(), kpis.clone());
        }
        kpis
    }

    pub(crate) fn recompute_all(&mut self) {
        for term_id in self.known_term_ids() {
            self.recompute_term(&term_id);
        }
    }
}

fn refresh_student(student: &mut Student, logs: &[ServiceLog], required_hours: f64) {
    let verified_hours = risk::verified_hours(logs, &student.student_id);
    let progress = risk::progress(verified_hours, required_hours);
    let (risk_status, risk_score) = risk::classify(progress);

    student.verified_hours = verified_hours;
    student.required_hours = required_hours;
    student.progress = progress;
    student.risk_status = risk_status;
    student.risk_score = risk_score;
    student.last_activity = logs
        .iter()
        .filter(|log| log.student_id == student.student_id)
        .map(|log| log.date)
        .max();
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::StoreOptions;
    use super::*;
    use crate::models::{LogStatus, RiskStatus};
    use crate::seed::SeedData;

    #[test]
    fn recompute_is_idempotent() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();

        let first_kpis = store.recompute_term("spring-2026");
        let first_students = serde_json::to_string(&store.list_students("spring-2026")).unwrap();
        let second_kpis = store.recompute_term("spring-2026");
        let second_students = serde_json::to_string(&store.list_students("spring-2026")).unwrap();

        assert_eq!(
            serde_json::to_string(&first_kpis).unwrap(),
            serde_json::to_string(&second_kpis).unwrap()
        );
        assert_eq!(first_students, second_students);
    }

    #[test]
    fn demo_term_kpis_match_student_roster() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();
        let kpis = store.get_kpis("spring-2026");

        // 14h + 6h + 3h confirmed across three students.
        assert_eq!(kpis.verified_hours.value, 23.0);
        assert_eq!(kpis.active_students.value, 3);
        assert_eq!(kpis.active_programs.value, 3);
        // Only Maya Chen (70%) clears the 50% mark.
        assert_eq!(kpis.retention_rate.value, 33);
        assert_eq!(kpis.retention_rate.delta, "Demo data");
    }

    #[test]
    fn unknown_term_falls_back_without_storing() {
        let mut store = DemoStore::demo(StoreOptions::default()).unwrap();
        assert_eq!(store.required_hours("winter-2030"), FALLBACK_REQUIRED_HOURS);

        let kpis = store.recompute_term("winter-2030");
        assert_eq!(kpis.active_students.value, 0);
        assert_eq!(kpis.retention_rate.value, 0);
        assert!(store.cached_kpis("winter-2030").is_none());
    }

    #[test]
    fn term_without_requirement_reports_zero_progress() {
        let mut seed = single_student_seed();
        seed.terms[0].required_hours = 0.0;
        let mut store = DemoStore::new(seed, StoreOptions::default()).unwrap();

        let students = store.list_students(TERM);
        let student = &students[0];
        assert_eq!(student.verified_hours, 4.0);
        assert_eq!(student.progress, 0);
        assert_eq!(student.risk_status, RiskStatus::AtRisk);
    }

    #[test]
    fn last_activity_tracks_latest_log_of_any_status() {
        let mut store = DemoStore::new(single_student_seed(), StoreOptions::default()).unwrap();
        let students = store.list_students(TERM);
        let student = &students[0];
        // The pending log on Feb 3 is newer than the confirmed one on Feb 1.
        assert_eq!(
            student.last_activity,
            chrono::NaiveDate::from_ymd_opt(2026, 2, 3)
        );
    }

    #[test]
    fn progress_above_requirement_is_kept() {
        let mut seed = SeedData::default();
        seed.students_by_term
            .insert(TERM.to_string(), vec![student("stu-1", "Avery Lee")]);
        seed.service_logs_by_term.insert(
            TERM.to_string(),
            vec![log("log-1", "stu-1", 2, 30.0, LogStatus::Confirmed)],
        );
        let mut store = DemoStore::new(seed, StoreOptions::default()).unwrap();

        // No term record, so the fallback requirement applies.
        let students = store.list_students(TERM);
        let student = &students[0];
        assert_eq!(student.required_hours, FALLBACK_REQUIRED_HOURS);
        assert_eq!(student.progress, 150);
        assert_eq!(student.risk_score, 0);
    }
}
