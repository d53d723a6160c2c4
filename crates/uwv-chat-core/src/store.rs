//! Conversation store
//!
//! Holds the message log, the in-flight flag and model metadata. Front ends
//! never mutate it directly while a request is running: they take a [`Ticket`]
//! with one of the `begin_*` methods, run the request, and hand the outcome
//! back as a [`Completion`].
//!
//! Every reset and every start request advances the conversation epoch. A
//! reply carrying an older epoch belongs to a conversation that no longer
//! exists and is dropped. Start and clear requests also take a number in the
//! order they were issued; the outcome of one is dropped once a later start or
//! clear has been issued or applied, so overlapping requests always settle on
//! the newest action.

use crate::backend::BackendError;
use crate::state::ChatMessage;
use crate::texts::Texts;

/// Conversation state captured when a request was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

/// Outcome of a backend request, ready to be applied to the store
#[derive(Debug)]
pub enum Completion {
    Started {
        ticket: Ticket,
        result: Result<String, BackendError>,
    },
    Replied {
        ticket: Ticket,
        result: Result<String, BackendError>,
    },
    Models(Result<Vec<String>, BackendError>),
    ModelSelected {
        model: String,
        result: Result<(), BackendError>,
    },
    MemoryCleared {
        ticket: Ticket,
        result: Result<(), BackendError>,
    },
}

#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<ChatMessage>,
    pending: bool,
    selected_model: Option<String>,
    available_models: Vec<String>,
    epoch: u64,
    /// Start and clear requests issued so far
    issued: u64,
    /// `seq` of the newest start request
    latest_start: u64,
    /// `seq` of the newest start or clear that has been applied
    settled: u64,
    texts: Texts,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(Texts::default())
    }
}

impl ConversationStore {
    pub fn new(texts: Texts) -> Self {
        Self {
            messages: Vec::new(),
            pending: false,
            selected_model: None,
            available_models: Vec::new(),
            epoch: 0,
            issued: 0,
            latest_start: 0,
            settled: 0,
            texts,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn texts(&self) -> &Texts {
        &self.texts
    }

    /// Replace the conversation with a single assistant message.
    pub fn reset(&mut self, initial_message: impl Into<String>) {
        self.messages = vec![ChatMessage::assistant(initial_message)];
        self.pending = false;
        self.epoch += 1;
    }

    /// Append a user message and mark a reply as pending.
    ///
    /// Blank input is ignored; returns whether the message was appended. The
    /// content is kept exactly as typed.
    pub fn append_user(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.messages.push(ChatMessage::user(text));
        self.pending = true;
        true
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(text));
        self.pending = false;
    }

    /// Replace the model list. Duplicates are dropped, first occurrence wins.
    pub fn set_models(&mut self, models: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(models.len());
        for model in models {
            if !unique.contains(&model) {
                unique.push(model);
            }
        }
        self.available_models = unique;
    }

    pub fn set_selected_model(&mut self, name: impl Into<String>) {
        self.selected_model = Some(name.into());
    }

    /// Start a new conversation. Anything still in flight for the old one is
    /// discarded when it completes.
    pub fn begin_start(&mut self) -> Ticket {
        self.epoch += 1;
        self.issued += 1;
        self.latest_start = self.issued;
        self.pending = true;
        self.ticket()
    }

    /// Append the user's message and return a ticket for the reply, or `None`
    /// when the input is blank or a reply is already pending.
    pub fn begin_send(&mut self, text: &str) -> Option<Ticket> {
        if self.pending {
            tracing::debug!("send refused: request already pending");
            return None;
        }
        if !self.append_user(text) {
            return None;
        }
        Some(self.ticket())
    }

    /// Clearing leaves the conversation untouched until the backend confirms.
    pub fn begin_clear(&mut self) -> Ticket {
        self.issued += 1;
        self.ticket()
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            seq: self.issued,
        }
    }

    /// Apply a finished request. Returns whether the store changed.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Started { ticket, result } => {
                if self.is_stale(ticket, "start-conversation") {
                    return false;
                }
                self.settled = ticket.seq;
                match result {
                    Ok(message) => self.reset(message),
                    Err(e) => {
                        tracing::warn!("Error starting new conversation: {}", e);
                        let message = self.texts.start_error.clone();
                        self.reset(message);
                    }
                }
                true
            }
            Completion::Replied { ticket, result } => {
                if self.is_stale(ticket, "send-message") {
                    return false;
                }
                match result {
                    Ok(response) => self.append_assistant(response),
                    Err(e) => {
                        tracing::warn!("Error sending message: {}", e);
                        let message = self.texts.send_error.clone();
                        self.append_assistant(message);
                    }
                }
                true
            }
            Completion::Models(result) => match result {
                Ok(models) => {
                    if let Some(first) = models.first() {
                        self.set_selected_model(first.clone());
                    }
                    self.set_models(models);
                    true
                }
                Err(e) => {
                    tracing::warn!("Error fetching models: {}", e);
                    false
                }
            },
            Completion::ModelSelected { model, result } => match result {
                Ok(()) => {
                    tracing::info!(model = %model, "model selected");
                    self.set_selected_model(model);
                    true
                }
                Err(e) => {
                    tracing::warn!(model = %model, "Error selecting model: {}", e);
                    false
                }
            },
            Completion::MemoryCleared { ticket, result } => {
                if let Err(e) = result {
                    tracing::warn!("Error clearing memory: {}", e);
                    return false;
                }
                if self.is_superseded(ticket, "clear-memory") {
                    return false;
                }
                self.settled = ticket.seq;
                let message = self.texts.memory_cleared.clone();
                self.reset(message);
                true
            }
        }
    }

    fn is_stale(&self, ticket: Ticket, endpoint: &str) -> bool {
        let stale = ticket.epoch != self.epoch;
        if stale {
            tracing::debug!(
                endpoint,
                ticket = ticket.epoch,
                current = self.epoch,
                "discarding response for a superseded conversation"
            );
        }
        stale
    }

    /// A start issued later always resets the conversation itself, whether it
    /// succeeds or fails.
    fn is_superseded(&self, ticket: Ticket, endpoint: &str) -> bool {
        let superseded = ticket.seq < self.latest_start || ticket.seq < self.settled;
        if superseded {
            tracing::debug!(
                endpoint,
                ticket = ticket.seq,
                latest_start = self.latest_start,
                settled = self.settled,
                "discarding response superseded by a later request"
            );
        }
        superseded
    }
}
