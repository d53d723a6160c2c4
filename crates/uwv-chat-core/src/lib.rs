pub mod backend;
pub mod config;
pub mod session;
pub mod state;
pub mod store;
pub mod texts;

// Re-export main types for convenience
pub use backend::{BackendClient, BackendError, DEFAULT_BASE_URL};
pub use config::Config;
pub use session::ChatSession;
pub use state::{ChatMessage, ChatRole};
pub use store::{Completion, ConversationStore, Ticket};
pub use texts::Texts;
