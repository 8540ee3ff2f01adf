//! In-memory repositories and a recording transport for dispatch tests

use super::transport::{MailTransport, OutgoingEmail, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maildrip_common::types::{
    ClientId, LogStatus, MailingId, MailingStatus, MessageId, OwnerId, Periodicity,
};
use maildrip_common::{Error, Result};
use maildrip_storage::models::{
    Client, CreateClient, CreateLog, CreateMailing, CreateMessage, DispatchLog, Mailing, Message,
};
use maildrip_storage::repository::{
    ClientRepository, LogRepository, MailingRepository, MessageRepository,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory store implementing all repository traits.
///
/// Conditional updates mirror the database semantics: a claim or advance only
/// succeeds when the observed `next_send_time` still matches.
pub struct MemStore {
    mailings: Mutex<Vec<Mailing>>,
    client_records: Mutex<HashMap<ClientId, Client>>,
    mailing_clients: Mutex<HashMap<MailingId, Vec<ClientId>>>,
    messages: Mutex<HashMap<MessageId, Message>>,
    log_entries: Mutex<Vec<DispatchLog>>,
    claim_conflict: AtomicBool,
    fail_listing: AtomicBool,
}

impl MemStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            mailings: Mutex::new(Vec::new()),
            client_records: Mutex::new(HashMap::new()),
            mailing_clients: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
            log_entries: Mutex::new(Vec::new()),
            claim_conflict: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
        })
    }

    /// Add a mailing with a fresh message titled "Campaign title"
    pub fn add_mailing(
        &self,
        periodicity: Periodicity,
        next_send_time: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> MailingId {
        let owner_id: OwnerId = Uuid::new_v4();
        let message = Message {
            id: Uuid::new_v4(),
            owner_id,
            title: "Campaign title".to_string(),
            body: "Campaign body".to_string(),
            created_at: Utc::now(),
        };
        let mailing = Mailing {
            id: Uuid::new_v4(),
            owner_id,
            message_id: message.id,
            status: MailingStatus::Created.as_str().to_string(),
            periodicity: periodicity.as_str().to_string(),
            start_date: Utc::now(),
            end_date,
            next_send_time,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = mailing.id;
        self.messages.lock().unwrap().insert(message.id, message);
        self.mailings.lock().unwrap().push(mailing);
        id
    }

    /// Attach a new client with the given email to a mailing
    pub fn add_recipient(&self, mailing_id: MailingId, email: &str) -> ClientId {
        let client = Client {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: None,
            comment: None,
            created_at: Utc::now(),
        };
        let id = client.id;
        self.client_records.lock().unwrap().insert(id, client);
        self.mailing_clients
            .lock()
            .unwrap()
            .entry(mailing_id)
            .or_default()
            .push(id);
        id
    }

    pub fn set_status(&self, id: MailingId, status: MailingStatus) {
        let mut mailings = self.mailings.lock().unwrap();
        if let Some(m) = mailings.iter_mut().find(|m| m.id == id) {
            m.status = status.as_str().to_string();
        }
    }

    pub fn set_claim_conflict(&self, conflict: bool) {
        self.claim_conflict.store(conflict, Ordering::SeqCst);
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn mailing(&self, id: MailingId) -> Mailing {
        self.mailings
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .expect("mailing exists")
    }

    pub fn logs(&self) -> Vec<DispatchLog> {
        self.log_entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailingRepository for MemStore {
    async fn list_active(&self) -> Result<Vec<Mailing>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::Database("listing failed".to_string()));
        }
        Ok(self
            .mailings
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m.status_enum(), Some(s) if s.is_active()))
            .cloned()
            .collect())
    }

    async fn get(&self, id: MailingId) -> Result<Option<Mailing>> {
        Ok(self
            .mailings
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn create(&self, input: CreateMailing) -> Result<Mailing> {
        let mailing = Mailing {
            id: Uuid::new_v4(),
            owner_id: input.owner_id,
            message_id: input.message_id,
            status: MailingStatus::Created.as_str().to_string(),
            periodicity: input.periodicity.as_str().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            next_send_time: input.next_send_time,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.mailings.lock().unwrap().push(mailing.clone());
        Ok(mailing)
    }

    async fn attach_client(&self, mailing_id: MailingId, client_id: ClientId) -> Result<()> {
        self.mailing_clients
            .lock()
            .unwrap()
            .entry(mailing_id)
            .or_default()
            .push(client_id);
        Ok(())
    }

    async fn mark_completed(&self, id: MailingId) -> Result<bool> {
        let mut mailings = self.mailings.lock().unwrap();
        match mailings
            .iter_mut()
            .find(|m| m.id == id && matches!(m.status_enum(), Some(s) if s.is_active()))
        {
            Some(m) => {
                m.status = MailingStatus::Completed.as_str().to_string();
                m.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn claim_due(
        &self,
        id: MailingId,
        expected_next_send_time: DateTime<Utc>,
    ) -> Result<bool> {
        if self.claim_conflict.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut mailings = self.mailings.lock().unwrap();
        match mailings.iter_mut().find(|m| {
            m.id == id
                && matches!(m.status_enum(), Some(s) if s.is_active())
                && m.next_send_time == Some(expected_next_send_time)
        }) {
            Some(m) => {
                m.status = MailingStatus::Started.as_str().to_string();
                m.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn advance_schedule(
        &self,
        id: MailingId,
        expected_next_send_time: DateTime<Utc>,
        new_next_send_time: DateTime<Utc>,
    ) -> Result<bool> {
        let mut mailings = self.mailings.lock().unwrap();
        match mailings
            .iter_mut()
            .find(|m| m.id == id && m.next_send_time == Some(expected_next_send_time))
        {
            Some(m) => {
                m.next_send_time = Some(new_next_send_time);
                m.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ClientRepository for MemStore {
    async fn get(&self, id: ClientId) -> Result<Option<Client>> {
        Ok(self.client_records.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Client>> {
        Ok(self
            .client_records
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_for_mailing(&self, mailing_id: MailingId) -> Result<Vec<Client>> {
        let ids = self
            .mailing_clients
            .lock()
            .unwrap()
            .get(&mailing_id)
            .cloned()
            .unwrap_or_default();
        let records = self.client_records.lock().unwrap();
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn create(&self, input: CreateClient) -> Result<Client> {
        let client = Client {
            id: Uuid::new_v4(),
            owner_id: input.owner_id,
            email: input.email,
            full_name: input.full_name,
            comment: input.comment,
            created_at: Utc::now(),
        };
        self.client_records
            .lock()
            .unwrap()
            .insert(client.id, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl MessageRepository for MemStore {
    async fn get(&self, id: MessageId) -> Result<Option<Message>> {
        Ok(self.messages.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, input: CreateMessage) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            owner_id: input.owner_id,
            title: input.title,
            body: input.body,
            created_at: Utc::now(),
        };
        self.messages
            .lock()
            .unwrap()
            .insert(message.id, message.clone());
        Ok(message)
    }
}

#[async_trait]
impl LogRepository for MemStore {
    async fn create(&self, input: CreateLog) -> Result<DispatchLog> {
        let log = DispatchLog {
            id: Uuid::new_v4(),
            mailing_id: input.mailing_id,
            status: input.status.as_str().to_string(),
            server_response: input.server_response,
            attempted_at: Utc::now(),
        };
        self.log_entries.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn list_for_mailing(&self, mailing_id: MailingId) -> Result<Vec<DispatchLog>> {
        let mut logs: Vec<DispatchLog> = self
            .log_entries
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.mailing_id == mailing_id)
            .cloned()
            .collect();
        logs.reverse();
        Ok(logs)
    }

    async fn count_for_mailing(
        &self,
        mailing_id: MailingId,
        status: Option<LogStatus>,
    ) -> Result<i64> {
        Ok(self
            .log_entries
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.mailing_id == mailing_id)
            .filter(|l| status.map_or(true, |s| l.status == s.as_str()))
            .count() as i64)
    }
}

/// Transport stub recording every send
pub struct StubTransport {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    default: std::result::Result<String, String>,
    sent_emails: Mutex<Vec<OutgoingEmail>>,
}

impl StubTransport {
    /// Every send succeeds with the given server response
    pub fn succeeding(response: &str) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            default: Ok(response.to_string()),
            sent_emails: Mutex::new(Vec::new()),
        })
    }

    /// Every send fails with the given description
    pub fn failing(description: &str) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            default: Err(description.to_string()),
            sent_emails: Mutex::new(Vec::new()),
        })
    }

    /// Scripted responses, in order; falls back to success once exhausted
    pub fn with_responses(responses: Vec<std::result::Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            default: Ok("250 Ok".to_string()),
            sent_emails: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent_emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for StubTransport {
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<String, TransportError> {
        self.sent_emails.lock().unwrap().push(email.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        response.map_err(TransportError::Send)
    }
}
