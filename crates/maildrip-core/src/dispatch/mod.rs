//! Dispatch module - scan-evaluate-send-reschedule cycle over active mailings

mod engine;
mod scheduler;
mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{DispatchEngine, PassSummary};
pub use scheduler::DispatchScheduler;
pub use transport::{MailTransport, OutgoingEmail, SmtpMailer, TransportError};
