//! maildrip Core - Mailing dispatch engine and scheduler
//!
//! This crate provides the dispatch core: the pass that scans due mailings,
//! sends them over SMTP, records outcomes, and advances schedules, plus the
//! recurring scheduler that drives it.

pub mod dispatch;

pub use dispatch::{
    DispatchEngine, DispatchScheduler, MailTransport, OutgoingEmail, PassSummary, SmtpMailer,
    TransportError,
};
