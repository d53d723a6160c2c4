//! Sequential chat session
//!
//! Binds a [`ConversationStore`] to a [`BackendClient`]. Each operation runs
//! one request, applies its effect to the store and returns; failures are
//! absorbed into the store (or logged) and never reach the caller.

use crate::backend::BackendClient;
use crate::state::ChatMessage;
use crate::store::{Completion, ConversationStore};

pub struct ChatSession {
    client: BackendClient,
    store: ConversationStore,
}

impl ChatSession {
    pub fn new(client: BackendClient, store: ConversationStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub async fn start_conversation(&mut self) {
        let ticket = self.store.begin_start();
        let result = self.client.start_conversation().await;
        self.store.apply(Completion::Started { ticket, result });
    }

    /// Send `text` and wait for the reply. Returns false when nothing was sent
    /// (blank input or a reply already pending).
    pub async fn send_message(&mut self, text: &str) -> bool {
        let Some(ticket) = self.store.begin_send(text) else {
            return false;
        };
        let result = self.client.send_message(text).await;
        self.store.apply(Completion::Replied { ticket, result });
        true
    }

    pub async fn list_models(&mut self) {
        let result = self.client.available_models().await;
        self.store.apply(Completion::Models(result));
    }

    pub async fn select_model(&mut self, name: &str) {
        let result = self.client.select_model(name).await;
        self.store.apply(Completion::ModelSelected {
            model: name.to_string(),
            result,
        });
    }

    pub async fn clear_memory(&mut self) {
        let ticket = self.store.begin_clear();
        let result = self.client.clear_memory().await;
        self.store.apply(Completion::MemoryCleared { ticket, result });
    }
}
