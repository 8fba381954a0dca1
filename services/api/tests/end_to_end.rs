//! End-to-end flow over an in-memory store: account creation, login token
//! round-trip, session lifecycle, conversation log, and teardown.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;

use api_lib::adapters::db::DbAdapter;
use api_lib::web::jwt::TokenManager;
use glasspanel_core::domain::{ConversationState, NewConversation, Persona};
use glasspanel_core::ports::{DatabaseService, PortError};

async fn test_db() -> Arc<dyn DatabaseService> {
    let db = DbAdapter::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.run_migrations().await.unwrap();
    Arc::new(db)
}

fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn login_session_conversation_flow() {
    let db = test_db().await;
    let tokens = TokenManager::new("end-to-end-test-secret-end-to-end-test");

    // Signup: hash and store credentials.
    let user = db
        .create_user("a@b.com", &hash_password("x"), None)
        .await
        .unwrap();

    // Login: verify the password, then issue a token that resolves back to
    // the same user id.
    let creds = db.get_user_credentials("a@b.com").await.unwrap();
    let parsed = PasswordHash::new(&creds.password_hash).unwrap();
    assert!(Argon2::default()
        .verify_password(b"x", &parsed)
        .is_ok());
    assert!(Argon2::default()
        .verify_password(b"wrong", &parsed)
        .is_err());
    db.touch_last_login(creds.id).await.unwrap();

    let token = tokens.issue(creds.id, &creds.email).unwrap();
    let claims = tokens.verify(&token).unwrap();
    assert_eq!(claims.user_id, user.id);

    // Create a work session and start a named conversation.
    let session = db
        .create_session(claims.user_id, "Standup glasses", Persona::Work, 180)
        .await
        .unwrap();
    db.start_conversation(session.id, claims.user_id, "standup")
        .await
        .unwrap();
    let session = db.get_session(session.id, claims.user_id).await.unwrap();
    assert_eq!(session.conversation_state, ConversationState::Recording);
    assert_eq!(session.conversation_name.as_deref(), Some("standup"));

    // Append an exchange and read it back through the persona filter.
    let created = db
        .create_conversation(
            session.id,
            session.persona,
            NewConversation {
                query: "hi".into(),
                response: "hello".into(),
                response_pages: None,
                duration: None,
            },
        )
        .await
        .unwrap();
    let listed = db
        .list_conversations(session.id, session.persona)
        .await
        .unwrap();
    assert!(listed.iter().any(|c| c.id == created.id));

    // Stop: back to idle with the name cleared.
    db.stop_conversation(session.id, claims.user_id)
        .await
        .unwrap();
    let session = db.get_session(session.id, claims.user_id).await.unwrap();
    assert_eq!(session.conversation_state, ConversationState::Idle);
    assert!(session.conversation_name.is_none());

    // Teardown cascades the log.
    db.delete_session(session.id, claims.user_id).await.unwrap();
    assert!(matches!(
        db.get_session(session.id, claims.user_id).await,
        Err(PortError::NotFound(_))
    ));
}
