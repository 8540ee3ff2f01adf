//! Common types for maildrip

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for mailings
pub type MailingId = Uuid;

/// Unique identifier for clients (recipients)
pub type ClientId = Uuid;

/// Unique identifier for messages
pub type MessageId = Uuid;

/// Unique identifier for dispatch log entries
pub type LogId = Uuid;

/// Unique identifier for owners (the user a record belongs to)
pub type OwnerId = Uuid;

/// Mailing lifecycle status
///
/// A mailing is created in `Created`, moves to `Started` once the dispatch
/// engine picks it up, and ends in `Completed` when its end date is reached.
/// Only the dispatch engine mutates the status after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailingStatus {
    Created,
    Started,
    Completed,
}

impl MailingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailingStatus::Created => "created",
            MailingStatus::Started => "started",
            MailingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(MailingStatus::Created),
            "started" => Some(MailingStatus::Started),
            "completed" => Some(MailingStatus::Completed),
            _ => None,
        }
    }

    /// Whether the dispatch engine should scan this mailing at all
    pub fn is_active(&self) -> bool {
        matches!(self, MailingStatus::Created | MailingStatus::Started)
    }
}

impl std::fmt::Display for MailingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MailingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown mailing status: {}", s)))
    }
}

/// Recurrence unit governing schedule advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
}

impl Periodicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Periodicity::Daily),
            "weekly" => Some(Periodicity::Weekly),
            "monthly" => Some(Periodicity::Monthly),
            _ => None,
        }
    }

    /// Duration by which `next_send_time` advances after each dispatch.
    ///
    /// Monthly is a fixed 30-day offset, not calendar-month-aware.
    pub fn step(&self) -> Duration {
        match self {
            Periodicity::Daily => Duration::days(1),
            Periodicity::Weekly => Duration::weeks(1),
            Periodicity::Monthly => Duration::days(30),
        }
    }
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Periodicity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown periodicity: {}", s)))
    }
}

/// Outcome of a single dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Fail,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Fail => "fail",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(LogStatus::Success),
            "fail" => Some(LogStatus::Fail),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| crate::Error::Validation(format!("Unknown log status: {}", s)))
    }
}
