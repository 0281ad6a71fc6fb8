//! Typed client data layer: the fetch wrapper, the session object and the
//! chat state (conversation polling, fetch-on-select, offline outbox).

mod api;
mod chat;
mod session;

pub use api::{Api, ApiError};
pub use chat::{CONVERSATION_POLL_INTERVAL, ChatClient};
pub use session::{AuthSession, MemoryTokenStore, TokenStore};
