//! Dispatch engine - one pass over all active mailings

use super::transport::{MailTransport, OutgoingEmail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use maildrip_common::types::LogStatus;
use maildrip_common::{Error, Result};
use maildrip_storage::models::{CreateLog, Mailing};
use maildrip_storage::repository::{
    ClientRepository, LogRepository, MailingRepository, MessageRepository,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for one dispatch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Active mailings scanned
    pub scanned: usize,
    /// Mailings moved to completed because their end date passed
    pub completed: usize,
    /// Sends that the relay accepted
    pub sent: usize,
    /// Sends that failed at the transport
    pub failed: usize,
    /// Mailings left untouched (not due, no recipients, or claim conflict)
    pub skipped: usize,
}

/// Outcome of evaluating one mailing within a pass
enum MailingOutcome {
    Completed,
    Sent,
    Failed,
    Skipped,
}

/// Dispatch engine
///
/// Owns the mutable lifecycle fields of mailings: it is the only writer of
/// `status` and `next_send_time` after creation, and the sole writer of
/// dispatch logs. Clients and messages are read-only inputs.
pub struct DispatchEngine {
    mailings: Arc<dyn MailingRepository>,
    clients: Arc<dyn ClientRepository>,
    messages: Arc<dyn MessageRepository>,
    logs: Arc<dyn LogRepository>,
    transport: Arc<dyn MailTransport>,
    from_address: String,
    tz: Tz,
}

impl DispatchEngine {
    pub fn new(
        mailings: Arc<dyn MailingRepository>,
        clients: Arc<dyn ClientRepository>,
        messages: Arc<dyn MessageRepository>,
        logs: Arc<dyn LogRepository>,
        transport: Arc<dyn MailTransport>,
        from_address: String,
        tz: Tz,
    ) -> Self {
        Self {
            mailings,
            clients,
            messages,
            logs,
            transport,
            from_address,
            tz,
        }
    }

    /// Run one dispatch pass at the current time
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let now = Utc::now();
        debug!(local_time = %now.with_timezone(&self.tz), "Starting dispatch pass");
        self.run_pass_at(now).await
    }

    /// Run one dispatch pass, evaluating every active mailing against `now`
    ///
    /// Transport failures are recorded and never abort the pass; a storage
    /// error does abort it (the scheduler logs and retries on the next tick).
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassSummary> {
        let mailings = self.mailings.list_active().await?;

        let mut summary = PassSummary {
            scanned: mailings.len(),
            ..PassSummary::default()
        };

        for mailing in mailings {
            match self.process_mailing(&mailing, now).await? {
                MailingOutcome::Completed => summary.completed += 1,
                MailingOutcome::Sent => summary.sent += 1,
                MailingOutcome::Failed => summary.failed += 1,
                MailingOutcome::Skipped => summary.skipped += 1,
            }
        }

        if summary.sent + summary.failed + summary.completed > 0 {
            info!(
                scanned = summary.scanned,
                completed = summary.completed,
                sent = summary.sent,
                failed = summary.failed,
                skipped = summary.skipped,
                "Dispatch pass finished"
            );
        }

        Ok(summary)
    }

    async fn process_mailing(
        &self,
        mailing: &Mailing,
        now: DateTime<Utc>,
    ) -> Result<MailingOutcome> {
        // End date reached: complete, no send this cycle even if also due
        if mailing.is_ended(now) {
            if self.mailings.mark_completed(mailing.id).await? {
                info!(mailing_id = %mailing.id, "Mailing completed, end date reached");
            }
            return Ok(MailingOutcome::Completed);
        }

        // No schedule, or not yet due: untouched
        let Some(next_send_time) = mailing.next_send_time else {
            return Ok(MailingOutcome::Skipped);
        };
        if now < next_send_time {
            return Ok(MailingOutcome::Skipped);
        }

        let Some(periodicity) = mailing.periodicity_enum() else {
            warn!(
                mailing_id = %mailing.id,
                periodicity = %mailing.periodicity,
                "Skipping mailing with unknown periodicity"
            );
            return Ok(MailingOutcome::Skipped);
        };

        // Claim the row before sending. A conflict means another writer moved
        // the schedule or status since our read; skip to avoid a double-send.
        if !self.mailings.claim_due(mailing.id, next_send_time).await? {
            debug!(mailing_id = %mailing.id, "Claim conflict, skipping this pass");
            return Ok(MailingOutcome::Skipped);
        }

        let recipients = self.clients.list_for_mailing(mailing.id).await?;
        if recipients.is_empty() {
            debug!(mailing_id = %mailing.id, "No recipients, nothing to send");
            return Ok(MailingOutcome::Skipped);
        }

        let message = self
            .messages
            .get(mailing.message_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Message {} for mailing {}",
                    mailing.message_id, mailing.id
                ))
            })?;

        let email = OutgoingEmail {
            subject: message.title.clone(),
            body: message.body.clone(),
            from: self.from_address.clone(),
            recipients: recipients.iter().map(|c| c.email.clone()).collect(),
        };

        let outcome = match self.transport.send(&email).await {
            Ok(response) => {
                info!(
                    mailing_id = %mailing.id,
                    recipients = email.recipients.len(),
                    "Mailing sent"
                );
                self.logs
                    .create(CreateLog {
                        mailing_id: mailing.id,
                        status: LogStatus::Success,
                        server_response: response,
                    })
                    .await?;
                MailingOutcome::Sent
            }
            Err(e) => {
                warn!(mailing_id = %mailing.id, error = %e, "Mailing send failed");
                self.logs
                    .create(CreateLog {
                        mailing_id: mailing.id,
                        status: LogStatus::Fail,
                        server_response: e.to_string(),
                    })
                    .await?;
                MailingOutcome::Failed
            }
        };

        // Advance by one periodicity step regardless of outcome. No retry
        // before the next scheduled occurrence.
        let new_next = next_send_time + periodicity.step();
        if !self
            .mailings
            .advance_schedule(mailing.id, next_send_time, new_next)
            .await?
        {
            warn!(mailing_id = %mailing.id, "Schedule changed concurrently, not advancing");
        }

        Ok(outcome)
    }
}
