//! End-to-end: the real router on an ephemeral port, driven through the
//! client gateway and controller.

use notecmd::auth::SignedTokenAuthenticator;
use notecmd::client::{ApiGateway, NoteController, Session};
use notecmd::config::days;
use notecmd::models::{CreateNoteRequest, DeleteConfirmation, Note, OwnerId, UpdateNoteRequest};
use notecmd::server::{self, AppState};
use notecmd::Database;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use tokio::net::TcpListener;

const SECRET: &str = "integration-secret";

struct TestServer {
    base_url: String,
    tokens: SignedTokenAuthenticator,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let db = Database::open_memory().unwrap();
        let authenticator = SignedTokenAuthenticator::new(SECRET, days(1));
        tokio::spawn(server::serve(listener, AppState::new(db, Arc::new(authenticator))));

        Self {
            base_url: format!("http://{}/api", addr),
            tokens: SignedTokenAuthenticator::new(SECRET, days(1)),
        }
    }

    fn gateway(&self) -> ApiGateway {
        ApiGateway::new(self.base_url.clone()).unwrap()
    }

    fn session(&self, user: &str) -> Session {
        let token = self.tokens.issue(&OwnerId::parse(user).unwrap());
        Session::new(token, self.base_url.clone())
    }

    fn controller(&self, user: &str) -> NoteController {
        NoteController::new(self.gateway(), self.session(user))
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let health: serde_json::Value = server.gateway().get("/health", None).await.unwrap();
    assert_eq!(health["status"], "ok");
    assert!(health["uptimeSecs"].is_u64());
}

#[tokio::test]
async fn test_create_then_list() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");

    let created = alice.create("Groceries", "milk, eggs").await.unwrap().clone();
    assert_eq!(created.owner_id.as_str(), "alice");
    assert!(!created.archived);
    assert_eq!(created.created_at, created.updated_at);

    let mut fresh = server.controller("alice");
    fresh.load("").await.unwrap();
    assert_eq!(fresh.notes(), &[created]);
    assert!(fresh.error().is_none());
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");

    alice.create("first", "1").await.unwrap();
    alice.create("second", "2").await.unwrap();
    alice.load("").await.unwrap();

    let titles: Vec<&str> = alice.notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[tokio::test]
async fn test_ownership_isolation() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let mut bob = server.controller("bob");

    let note = alice.create("Secret", "alice only").await.unwrap().clone();

    bob.load("").await.unwrap();
    assert!(bob.notes().is_empty());

    let body = UpdateNoteRequest {
        title: "Stolen".to_string(),
        content: "bob was here".to_string(),
        archived: Some(true),
    };
    let err = server
        .gateway()
        .request::<Note, _>(
            &format!("/notes/{}", note.id),
            Method::PUT,
            Some(&body),
            Some(&server.session("bob")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(!err.to_string().contains("alice only"));

    let err = bob.delete(note.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(bob.error(), Some("Failed to delete note"));

    alice.load("").await.unwrap();
    assert_eq!(alice.notes(), &[note]);
}

#[tokio::test]
async fn test_delete_twice() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let id = alice.create("Temp", "gone soon").await.unwrap().id;

    alice.delete(id).await.unwrap();
    assert!(alice.note(id).is_none());

    let err = alice.delete(id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.to_string(), "Note not found");
}

#[tokio::test]
async fn test_delete_confirmation_body() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let id = alice.create("Temp", "gone soon").await.unwrap().id;

    let confirmation: DeleteConfirmation = server
        .gateway()
        .delete(&format!("/notes/{}", id), Some(&server.session("alice")))
        .await
        .unwrap();
    assert_eq!(confirmation.message, "Note deleted");
}

#[tokio::test]
async fn test_update_round_trip() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let created = alice.create("Draft", "v1").await.unwrap().clone();

    let updated = alice.edit(created.id, "Final", "v2").await.unwrap().clone();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.content, "v2");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    let mut fresh = server.controller("alice");
    fresh.load("").await.unwrap();
    assert_eq!(fresh.notes(), &[updated]);
}

#[tokio::test]
async fn test_edit_keeps_archive_flag() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let id = alice.create("Old", "done").await.unwrap().id;

    alice.set_archived(id, true).await.unwrap();
    let edited = alice.edit(id, "Old", "done, really").await.unwrap();
    assert!(edited.archived);
}

#[tokio::test]
async fn test_search_is_case_insensitive_subset() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    alice.create("Groceries", "Milk and eggs").await.unwrap();
    alice.create("Work", "Quarterly report").await.unwrap();
    alice.create("milk run", "Saturday").await.unwrap();

    alice.load("MILK").await.unwrap();
    let mut titles: Vec<&str> = alice.notes().iter().map(|n| n.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Groceries", "milk run"]);
    assert_eq!(alice.search_term(), "MILK");

    alice.load("100%").await.unwrap();
    assert!(alice.notes().is_empty());

    alice.create("Café visit", "Ordered a crème brûlée").await.unwrap();
    alice.load("CAFÉ").await.unwrap();
    let titles: Vec<&str> = alice.notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Café visit"]);

    alice.load("CRÈME BRÛLÉE").await.unwrap();
    assert_eq!(alice.notes().len(), 1);

    alice.load("").await.unwrap();
    assert_eq!(alice.notes().len(), 4);
}

#[tokio::test]
async fn test_empty_title_is_rejected() {
    let server = TestServer::start().await;
    let session = server.session("alice");

    let body = CreateNoteRequest {
        title: String::new(),
        content: "body".to_string(),
    };
    let err = server
        .gateway()
        .request::<Note, _>("/notes", Method::POST, Some(&body), Some(&session))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.to_string(), "Title and content are required");

    let err = server
        .gateway()
        .request::<Note, _>(
            "/notes",
            Method::POST,
            Some(&serde_json::json!({ "content": "no title" })),
            Some(&session),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let mut alice = server.controller("alice");
    assert!(alice.create("  ", "body").await.is_err());
    assert_eq!(alice.error(), Some("Title and content are required"));

    alice.load("").await.unwrap();
    assert!(alice.notes().is_empty());
}

#[tokio::test]
async fn test_update_unknown_and_malformed_id() {
    let server = TestServer::start().await;
    let session = server.session("alice");
    let body = UpdateNoteRequest {
        title: "t".to_string(),
        content: "c".to_string(),
        archived: None,
    };

    for id in ["00000000-0000-4000-8000-000000000000", "not-a-uuid"] {
        let err = server
            .gateway()
            .request::<Note, _>(&format!("/notes/{}", id), Method::PUT, Some(&body), Some(&session))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}

#[tokio::test]
async fn test_archive_flow() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let keep = alice.create("Keep", "active").await.unwrap().id;
    let old = alice.create("Old", "archived").await.unwrap().id;

    alice.set_archived(old, true).await.unwrap();
    assert!(alice.note(old).unwrap().archived);

    let mut fresh = server.controller("alice");
    fresh.load("").await.unwrap();
    let active: Vec<_> = fresh.active().iter().map(|n| n.id).collect();
    let archived: Vec<_> = fresh.archived().iter().map(|n| n.id).collect();
    assert_eq!(active, vec![keep]);
    assert_eq!(archived, vec![old]);

    fresh.set_archived(old, false).await.unwrap();
    fresh.load("").await.unwrap();
    assert!(fresh.archived().is_empty());
    assert_eq!(fresh.active().len(), 2);
}

#[tokio::test]
async fn test_archive_toggle_is_optimistic_and_rolls_back() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    let id = alice.create("Doomed", "deleted elsewhere").await.unwrap().id;

    let mut other_tab = server.controller("alice");
    other_tab.delete(id).await.unwrap();

    let request = alice.toggle_archive(id).unwrap();
    assert!(alice.note(id).unwrap().archived);
    assert_eq!(alice.archived().len(), 1);

    let response = request.send().await;
    let err = alice.reconcile_archive(response).unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(!alice.note(id).unwrap().archived);
    assert_eq!(alice.error(), Some("Failed to archive note"));
}

#[tokio::test]
async fn test_stale_search_is_discarded() {
    let server = TestServer::start().await;
    let mut alice = server.controller("alice");
    alice.create("apple pie", "dessert").await.unwrap();
    alice.create("banana bread", "breakfast").await.unwrap();

    let older = alice.begin_search("apple");
    let newer = alice.begin_search("banana");

    let newer_response = newer.send().await;
    let older_response = older.send().await;

    assert!(matches!(alice.apply_search(newer_response), Some(Ok(()))));
    assert!(alice.apply_search(older_response).is_none());

    let titles: Vec<&str> = alice.notes().iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["banana bread"]);
    assert_eq!(alice.search_term(), "banana");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() {
    let server = TestServer::start().await;

    let err = server
        .gateway()
        .get::<Vec<Note>>("/notes?search=", None)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Authentication required");

    let forged = Session::new("YWxpY2U.0.deadbeef", server.base_url.clone());
    let mut controller = NoteController::new(server.gateway(), forged);
    let err = controller.load("").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid token");
    assert_eq!(controller.error(), Some("Failed to fetch notes"));

    let other_secret = SignedTokenAuthenticator::new("other", days(1));
    let token = other_secret.issue(&OwnerId::parse("alice").unwrap());
    let mut controller =
        NoteController::new(server.gateway(), Session::new(token, server.base_url.clone()));
    assert!(controller.create("t", "c").await.unwrap_err().is_unauthorized());
}
