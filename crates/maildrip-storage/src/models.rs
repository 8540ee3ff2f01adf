//! Database models

use chrono::{DateTime, Utc};
use maildrip_common::types::{
    ClientId, LogId, LogStatus, MailingId, MailingStatus, MessageId, OwnerId, Periodicity,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Mailing campaign model
///
/// `status` and `next_send_time` belong to the dispatch engine once the
/// mailing has been created; nothing else writes them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Mailing {
    pub id: MailingId,
    pub owner_id: OwnerId,
    pub message_id: MessageId,
    pub status: String,
    pub periodicity: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_send_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mailing {
    /// Get the status as an enum
    pub fn status_enum(&self) -> Option<MailingStatus> {
        MailingStatus::parse(&self.status)
    }

    /// Get the periodicity as an enum
    pub fn periodicity_enum(&self) -> Option<Periodicity> {
        Periodicity::parse(&self.periodicity)
    }

    /// Whether the mailing's end date has been reached at `now`
    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        matches!(self.end_date, Some(end) if now >= end)
    }

    /// Whether the mailing is due for a send at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.next_send_time, Some(next) if now >= next)
    }
}

/// Client (recipient) model - read-only input to dispatch
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub owner_id: OwnerId,
    pub email: String,
    pub full_name: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Message model - a title/body pair reused across mailings
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub owner_id: OwnerId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Dispatch log model - immutable record of one send attempt
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DispatchLog {
    pub id: LogId,
    pub mailing_id: MailingId,
    pub status: String,
    pub server_response: String,
    pub attempted_at: DateTime<Utc>,
}

impl DispatchLog {
    /// Get the status as an enum
    pub fn status_enum(&self) -> Option<LogStatus> {
        LogStatus::parse(&self.status)
    }
}

/// Create mailing input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMailing {
    pub owner_id: OwnerId,
    pub message_id: MessageId,
    pub periodicity: Periodicity,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_send_time: Option<DateTime<Utc>>,
}

/// Create client input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClient {
    pub owner_id: OwnerId,
    pub email: String,
    pub full_name: Option<String>,
    pub comment: Option<String>,
}

/// Create message input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub owner_id: OwnerId,
    pub title: String,
    pub body: String,
}

/// Create dispatch log input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLog {
    pub mailing_id: MailingId,
    pub status: LogStatus,
    pub server_response: String,
}
