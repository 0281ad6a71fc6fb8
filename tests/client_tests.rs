use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;

use wasl::AppState;
use wasl::auth::{SignupRequest, TokenKeys};
use wasl::client::{Api, ApiError, AuthSession, ChatClient, MemoryTokenStore, TokenStore};
use wasl::db::MessageStatus;

/// Serves the real app on an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    wasl::db::migrate(&db_pool).await.unwrap();

    let app = wasl::router(AppState::new(db_pool, TokenKeys::new(b"client-test-secret")));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn signup_request(name: &str) -> SignupRequest {
    SignupRequest {
        email: format!("{name}@example.com"),
        username: name.to_owned(),
        password: "secret123".to_owned(),
        full_name: None,
    }
}

/// Signs a user up through the raw Api and returns an authenticated client.
async fn signed_up_chat(base_url: &str, name: &str) -> ChatClient {
    let mut api = Api::new(base_url);
    let auth = api.sign_up(&signup_request(name)).await.unwrap();
    api.set_token(auth.token);
    ChatClient::new(api, auth.user)
}

#[tokio::test]
async fn session_restores_a_remembered_token_and_clears_a_rejected_one() {
    let base_url = spawn_server().await;
    let store = Arc::new(MemoryTokenStore::new());

    let mut session = AuthSession::new(Api::new(&base_url), store.clone());
    session.sign_up(&signup_request("alice"), true).await.unwrap();
    assert!(store.remembered());
    assert!(store.load().is_some());

    // a fresh session over the same store picks the user back up
    let mut restored = AuthSession::new(Api::new(&base_url), store.clone());
    let user = restored.restore().await.unwrap().cloned();
    assert_eq!(user.unwrap().username, "alice");

    restored.sign_out();
    assert!(store.load().is_none());
    assert!(restored.user().is_none());

    // a stale token fails the exchange and is dropped from the store
    store.save("not-a-real-token", true);
    let mut broken = AuthSession::new(Api::new(&base_url), store.clone());
    assert!(broken.restore().await.unwrap().is_none());
    assert!(store.load().is_none());
}

#[tokio::test]
async fn sign_in_with_bad_password_surfaces_the_server_error() {
    let base_url = spawn_server().await;
    let store = MemoryTokenStore::new();
    let mut session = AuthSession::new(Api::new(&base_url), store);
    session.sign_up(&signup_request("alice"), false).await.unwrap();

    session.sign_out();
    let err = session
        .sign_in("alice@example.com", "wrong1", false)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(session.user().is_none());
}

#[tokio::test]
async fn offline_sends_queue_locally_and_only_manual_resend_transmits() {
    let base_url = spawn_server().await;
    let mut alice = signed_up_chat(&base_url, "alice").await;
    let bob = signed_up_chat(&base_url, "bob").await;

    let summary = alice.start_conversation("bob").await.unwrap();
    let conversation_id = summary.conversation.id;
    alice.select_conversation(conversation_id).await.unwrap();

    alice.set_online(false);
    let local = alice.send("salam").await.unwrap();
    assert_eq!(local.status, MessageStatus::Sending);
    assert!(local.is_offline);
    assert_eq!(alice.outbox().len(), 1);
    assert_eq!(alice.messages().len(), 1);

    // nothing reached the server
    assert!(bob.api().messages(conversation_id).await.unwrap().is_empty());

    // reconnecting does not drain the queue
    alice.set_online(true);
    assert_eq!(alice.outbox().len(), 1);

    let sent = alice.resend(local.id).await.unwrap();
    assert!(alice.outbox().is_empty());
    assert_eq!(sent.status, MessageStatus::Sent);
    assert!(sent.is_offline);
    assert_eq!(alice.messages()[0].message.id, sent.id);

    let bob_view = bob.api().messages(conversation_id).await.unwrap();
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].message.content, "salam");
    assert_eq!(bob_view[0].message.sender_id, alice.me().id);

    // resending an id that is not queued is an error
    let err = alice.resend(local.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn conversation_refresh_reflects_unread_and_last_message() {
    let base_url = spawn_server().await;
    let mut alice = signed_up_chat(&base_url, "alice").await;
    let mut bob = signed_up_chat(&base_url, "bob").await;

    let summary = bob.start_conversation("alice").await.unwrap();
    let conversation_id = summary.conversation.id;
    bob.select_conversation(conversation_id).await.unwrap();
    bob.send("hey").await.unwrap();

    let list = alice.refresh_conversations().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].unread_count, 1);
    assert_eq!(list[0].other_user.username, "bob");
    assert_eq!(
        list[0].last_message.as_ref().unwrap().content,
        "hey"
    );

    // selecting fetches and, server-side, marks bob's message read
    alice.select_conversation(conversation_id).await.unwrap();
    assert_eq!(alice.messages().len(), 1);

    let list = alice.refresh_conversations().await.unwrap();
    assert_eq!(list[0].unread_count, 0);
}

#[tokio::test]
async fn deleting_a_message_tombstones_it_locally_and_remotely() {
    let base_url = spawn_server().await;
    let mut alice = signed_up_chat(&base_url, "alice").await;
    let mut bob = signed_up_chat(&base_url, "bob").await;

    let summary = alice.start_conversation("bob").await.unwrap();
    let conversation_id = summary.conversation.id;
    alice.select_conversation(conversation_id).await.unwrap();
    let message = alice.send("oops").await.unwrap();

    alice.delete_message(message.id).await.unwrap();
    assert_eq!(alice.messages()[0].message.is_deleted, Some(true));

    bob.select_conversation(conversation_id).await.unwrap();
    assert_eq!(bob.messages().len(), 1);
    assert_eq!(bob.messages()[0].message.is_deleted, Some(true));
}
