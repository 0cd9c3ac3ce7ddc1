use crate::models::{LogStatus, RiskStatus, ServiceLog};

/// Required hours assumed for a term the store has never seen.
pub const FALLBACK_REQUIRED_HOURS: f64 = 20.0;

/// Progress at or above this counts toward the retention rate.
pub const RETENTION_THRESHOLD: u32 = 50;

pub fn verified_hours(logs: &[ServiceLog], student_id: &str) -> f64 {
    hours_with_status(logs, student_id, LogStatus::Confirmed)
}

pub fn pending_hours(logs: &[ServiceLog], student_id: &str) -> f64 {
    hours_with_status(logs, student_id, LogStatus::Pending)
}

fn hours_with_status(logs: &[ServiceLog], student_id: &str, status: LogStatus) -> f64 {
    logs.iter()
        .filter(|log| log.student_id == student_id && log.status == status)
        .map(|log| log.hours)
        .sum()
}

/// Whole-percent progress toward `required_hours`. Not clamped: a student
/// past the requirement reports more than 100.
pub fn progress(verified_hours: f64, required_hours: f64) -> u32 {
    if required_hours <= 0.0 {
        return 0;
    }
    (verified_hours / required_hours * 100.0).round().max(0.0) as u32
}

pub fn classify(progress: u32) -> (RiskStatus, u8) {
    match progress {
        75.. => (RiskStatus::OnTrack, 0),
        50..=74 => (RiskStatus::OnTrack, 1),
        25..=49 => (RiskStatus::NeedsAttention, 2),
        _ => (RiskStatus::AtRisk, 3),
    }
}

pub fn retention_rate(progresses: &[u32]) -> u32 {
    if progresses.is_empty() {
        return 0;
    }
    let retained = progresses
        .iter()
        .filter(|progress| **progress >= RETENTION_THRESHOLD)
        .count();
    (retained as f64 / progresses.len() as f64 * 100.0).round() as u32
}
