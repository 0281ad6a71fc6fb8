mod list;
mod msg;
mod new;
mod remove;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::AppState;

pub use list::ConversationSummary;
pub use msg::{MessageWithSender, SendMessageRequest};
pub use new::NewConversationRequest;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list).post(new::new_conversation))
        .route("/{id}", delete(remove::delete_conversation))
        .route("/{id}/messages", get(msg::list_messages).post(msg::send_message))
}
