use chrono::Utc;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::{Decision, EntityType, Resolution};

use super::{require_reason, DemoStore, ResolutionMode};

/// Where a queued request sits and what it points at.
struct Located {
    term_id: String,
    queue_index: usize,
    log_index: usize,
    log_id: String,
    hours: f64,
}

impl DemoStore {
    /// Credits the linked log's hours to its student.
    pub fn confirm(&mut self, request_id: &str) -> StoreResult<Resolution> {
        self.resolve(request_id, Decision::Confirm, None)
    }

    pub fn reject(&mut self, request_id: &str, reason: &str) -> StoreResult<Resolution> {
        self.resolve(request_id, Decision::Reject, Some(reason))
    }

    /// Marks the log for follow-up. The reason replaces the log description.
    pub fn flag(&mut self, request_id: &str, reason: &str) -> StoreResult<Resolution> {
        self.resolve(request_id, Decision::Flag, Some(reason))
    }

    pub fn resolve(
        &mut self,
        request_id: &str,
        decision: Decision,
        reason: Option<&str>,
    ) -> StoreResult<Resolution> {
        // Everything that can fail is checked before the first mutation.
        let reason = match decision {
            Decision::Confirm => reason
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .map(str::to_string),
            Decision::Reject | Decision::Flag => Some(require_reason(reason)?),
        };

        let Some(found) = self.locate(request_id)? else {
            return match self.options.mode {
                ResolutionMode::Strict => {
                    Err(StoreError::not_found("verification request", request_id))
                }
                ResolutionMode::Tolerant => {
                    warn!(request_id, ?decision, "request not queued, nothing to resolve");
                    Ok(Resolution {
                        request_id: request_id.to_string(),
                        decision,
                        applied: false,
                        hours_credited: 0.0,
                        term_id: None,
                        log_id: None,
                        reason,
                        audit_event_id: None,
                    })
                }
            };
        };

        if let Some(queue) = self.requests_by_term.get_mut(&found.term_id) {
            queue.remove(found.queue_index);
        }
        if let Some(log) = self
            .logs_by_term
            .get_mut(&found.term_id)
            .and_then(|logs| logs.get_mut(found.log_index))
        {
            log.status = decision.log_status();
            log.updated_at = Some(Utc::now());
            if let (Decision::Flag, Some(reason)) = (decision, reason.as_ref()) {
                log.description = reason.clone();
            }
        }

        let hours_credited = match decision {
            Decision::Confirm => found.hours,
            Decision::Reject | Decision::Flag => 0.0,
        };
        let notes = format!(
            "{} by {}. Log ID: {}, Hours: {}",
            past_tense(decision),
            self.options.actor.name,
            found.log_id,
            found.hours
        );
        let audit_event_id = self.record_event(
            EntityType::VerificationRequest,
            request_id.to_string(),
            decision.audit_action(),
            Some(found.term_id.clone()),
            reason.clone(),
            notes,
        );

        self.recompute_term(&found.term_id);

        info!(
            request_id,
            ?decision,
            term_id = %found.term_id,
            log_id = %found.log_id,
            hours_credited,
            "verification request resolved"
        );

        Ok(Resolution {
            request_id: request_id.to_string(),
            decision,
            applied: true,
            hours_credited,
            term_id: Some(found.term_id),
            log_id: Some(found.log_id),
            reason,
            audit_event_id: Some(audit_event_id),
        })
    }

    /// Finds a queued request in any term. A request whose log is gone, or
    /// whose log already left `pending`, is an error rather than a miss. The
    /// request stays queued and nothing is touched.
    fn locate(&self, request_id: &str) -> StoreResult<Option<Located>> {
        for (term_id, queue) in &self.requests_by_term {
            let Some(queue_index) = queue
                .iter()
                .position(|request| request.request_id == request_id)
            else {
                continue;
            };
            let log_id = &queue[queue_index].log_id;

            let logs = self
                .logs_by_term
                .get(term_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let log_index = logs
                .iter()
                .position(|log| &log.log_id == log_id)
                .ok_or_else(|| StoreError::DanglingRequest {
                    request_id: request_id.to_string(),
                    log_id: log_id.clone(),
                })?;
            let log = &logs[log_index];
            if log.status.is_terminal() {
                return Err(StoreError::AlreadyResolved {
                    request_id: request_id.to_string(),
                    log_id: log_id.clone(),
                    status: log.status.as_str(),
                });
            }

            return Ok(Some(Located {
                term_id: term_id.clone(),
                queue_index,
                log_index,
                log_id: log_id.clone(),
                hours: log.hours,
            }));
        }
        Ok(None)
    }
}

fn past_tense(decision: Decision) -> &'static str {
    match decision {
        Decision::Confirm => "Confirmed",
        Decision::Reject => "Rejected",
        Decision::Flag => "Flagged",
    }
}
