//! Repository layer for data access

pub mod clients;
pub mod logs;
pub mod mailings;
pub mod messages;

// Re-export concrete repository implementations
pub use clients::DbClientRepository;
pub use logs::DbLogRepository;
pub use mailings::DbMailingRepository;
pub use messages::DbMessageRepository;

// Re-export repository traits
pub use clients::ClientRepository;
pub use logs::LogRepository;
pub use mailings::MailingRepository;
pub use messages::MessageRepository;
