use super::*;
use std::collections::VecDeque;

use futures::executor::block_on;

use crate::state::session::{MemoryStorage, STORAGE_KEY, StorageBackend};

// =============================================================
// Scripted transport mock
// =============================================================

#[derive(Clone, Default)]
struct MockApi {
    inner: Rc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    responses: RefCell<VecDeque<Result<Envelope, ApiError>>>,
    calls: RefCell<Vec<ApiRequest>>,
}

impl MockApi {
    fn push(&self, result: Result<Envelope, ApiError>) {
        self.inner.responses.borrow_mut().push_back(result);
    }

    fn calls(&self) -> Vec<ApiRequest> {
        self.inner.calls.borrow().clone()
    }
}

impl Api for MockApi {
    async fn send(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        self.inner.calls.borrow_mut().push(request);
        self.inner
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::network("no scripted response")))
    }
}

// =============================================================
// Helpers
// =============================================================

fn ok(data: serde_json::Value) -> Result<Envelope, ApiError> {
    Ok(Envelope { success: true, message: None, data: Some(data) })
}

fn ok_message(message: &str) -> Result<Envelope, ApiError> {
    Ok(Envelope { success: true, message: Some(message.to_owned()), data: None })
}

fn rejected(message: &str) -> Result<Envelope, ApiError> {
    Ok(Envelope { success: false, message: Some(message.to_owned()), data: None })
}

fn unauthorized(message: &str) -> Result<Envelope, ApiError> {
    Err(ApiError::status(401, message, None))
}

fn user_json(name: &str) -> serde_json::Value {
    json!({
        "id": "u-1",
        "name": name,
        "email": "ada@example.com",
        "email_verified_at": "2026-01-01T00:00:00Z"
    })
}

fn login_data(session_id: &str) -> serde_json::Value {
    json!({ "session_id": session_id, "user": user_json("Ada") })
}

fn seeded_session(id: &str) -> Session {
    Session {
        session_id: id.to_owned(),
        user: serde_json::from_value(user_json("Ada")).expect("user"),
        established_via: EstablishedVia::Credentials,
        created_at: 0.0,
    }
}

fn engine() -> (AuthEngine<MockApi>, MockApi, SessionStore) {
    let api = MockApi::default();
    let store = SessionStore::in_memory();
    (AuthEngine::new(api.clone(), store.clone()), api, store)
}

// =============================================================
// Login
// =============================================================

#[test]
fn login_success_sets_store() {
    let (engine, api, store) = engine();
    api.push(ok(login_data("s-1")));

    let session = block_on(engine.login("ada@example.com", "pw", false)).expect("login");
    assert_eq!(session.session_id, "s-1");
    assert_eq!(session.established_via, EstablishedVia::Credentials);
    assert_eq!(store.get(), Some(session));

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, endpoints::LOGIN);
    assert!(calls[0].session_id.is_none());
    let body = calls[0].body.as_ref().expect("body");
    assert_eq!(body["remember_me"], json!(false));
}

#[test]
fn login_forwards_remember_me() {
    let (engine, api, _store) = engine();
    api.push(ok(login_data("s-1")));

    block_on(engine.login("ada@example.com", "pw", true)).expect("login");
    let body = api.calls()[0].body.clone().expect("body");
    assert_eq!(body["remember_me"], json!(true));
}

#[test]
fn login_rejection_leaves_store_untouched() {
    let (engine, api, store) = engine();
    api.push(unauthorized("Invalid credentials"));

    let err = block_on(engine.login("ada@example.com", "wrong", false)).expect_err("rejected");
    assert_eq!(err.message, "Invalid credentials");
    assert!(store.get().is_none());
    // A login 401 never triggers recovery.
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn login_soft_rejection_surfaces_backend_message() {
    let (engine, api, store) = engine();
    api.push(rejected("Account locked"));

    let err = block_on(engine.login("ada@example.com", "pw", false)).expect_err("rejected");
    assert_eq!(err.message, "Account locked");
    assert!(store.get().is_none());
}

#[test]
fn login_then_check_auth_yields_same_user() {
    let (engine, api, _store) = engine();
    api.push(ok(login_data("s-1")));
    api.push(ok(user_json("Ada")));

    let session = block_on(engine.login("ada@example.com", "pw", false)).expect("login");
    let check = block_on(engine.check_auth());

    let AuthCheck::Authenticated(current) = check else {
        panic!("expected authenticated");
    };
    assert_eq!(current.user, session.user);
    // The validation call carried the session id from the store.
    assert_eq!(api.calls()[1].session_id.as_deref(), Some("s-1"));
}

// =============================================================
// Logout
// =============================================================

#[test]
fn logout_clears_store_even_when_remote_fails() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    api.push(Err(ApiError::status(500, "backend down", None)));

    block_on(engine.logout(false));
    assert!(store.get().is_none());
}

#[test]
fn logout_sends_session_and_all_devices_flag() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    api.push(ok_message("bye"));

    block_on(engine.logout(true));

    let calls = api.calls();
    assert_eq!(calls[0].path, endpoints::LOGOUT);
    assert_eq!(calls[0].session_id.as_deref(), Some("s-1"));
    assert_eq!(calls[0].body.as_ref().expect("body")["all_devices"], json!(true));
    assert!(store.get().is_none());
}

// =============================================================
// check_auth recovery ladder
// =============================================================

#[test]
fn check_auth_adopts_valid_stored_session() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    // Backend returns a newer snapshot; it replaces the cached one wholesale.
    api.push(ok(user_json("Ada Lovelace")));

    let AuthCheck::Authenticated(session) = block_on(engine.check_auth()) else {
        panic!("expected authenticated");
    };
    assert_eq!(session.session_id, "s-1");
    assert_eq!(session.user.name, "Ada Lovelace");
    assert_eq!(store.get().expect("session").user.name, "Ada Lovelace");
}

#[test]
fn check_auth_without_stored_session_uses_persistent_login() {
    let (engine, api, store) = engine();
    api.push(ok(login_data("s-9")));

    let AuthCheck::Authenticated(session) = block_on(engine.check_auth()) else {
        panic!("expected authenticated");
    };
    assert_eq!(session.session_id, "s-9");
    assert_eq!(session.established_via, EstablishedVia::PersistentCookie);
    assert_eq!(store.session_id().as_deref(), Some("s-9"));

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, endpoints::CHECK_PERSISTENT);
    assert!(calls[0].session_id.is_none());
}

#[test]
fn check_auth_discards_rejected_session_then_recovers() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-stale"));
    api.push(unauthorized("Session expired"));
    api.push(ok(login_data("s-new")));

    let AuthCheck::Authenticated(session) = block_on(engine.check_auth()) else {
        panic!("expected authenticated");
    };
    assert_eq!(session.session_id, "s-new");
    assert_eq!(store.session_id().as_deref(), Some("s-new"));

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].path, endpoints::CURRENT_USER);
    assert_eq!(calls[1].path, endpoints::CHECK_PERSISTENT);
}

#[test]
fn check_auth_both_checks_fail_is_anonymous() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-stale"));
    api.push(unauthorized("Session expired"));
    api.push(unauthorized("No persistent login"));

    assert_eq!(block_on(engine.check_auth()), AuthCheck::Anonymous);
    assert!(store.get().is_none());
}

#[test]
fn check_auth_network_error_is_anonymous_but_keeps_credential() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    api.push(Err(ApiError::timeout()));

    assert_eq!(block_on(engine.check_auth()), AuthCheck::Anonymous);
    // Fail safe: the stored credential is retried on the next start.
    assert_eq!(store.session_id().as_deref(), Some("s-1"));
    assert_eq!(api.calls().len(), 1);
}

// =============================================================
// Retry-once request path
// =============================================================

#[test]
fn request_retries_exactly_once_after_recovery() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-old"));
    api.push(unauthorized("Session expired"));
    api.push(ok(login_data("s-new")));
    api.push(ok(json!({ "report": 1 })));

    let envelope =
        block_on(engine.request(Method::Get, "/reports/weekly", None)).expect("request");
    assert!(envelope.success);

    let calls = api.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].session_id.as_deref(), Some("s-old"));
    assert_eq!(calls[1].path, endpoints::CHECK_PERSISTENT);
    // The resend carries the recovered session id, and only happens once.
    assert_eq!(calls[2].path, "/reports/weekly");
    assert_eq!(calls[2].session_id.as_deref(), Some("s-new"));
    assert_eq!(store.session_id().as_deref(), Some("s-new"));
}

#[test]
fn second_401_after_recovery_is_terminal() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-old"));
    api.push(unauthorized("first failure"));
    api.push(ok(login_data("s-new")));
    api.push(unauthorized("second failure"));

    let err = block_on(engine.request(Method::Get, "/reports/weekly", None)).expect_err("terminal");
    // The surfaced error is the post-recovery failure, not the first one.
    assert_eq!(err.message, "second failure");
    assert!(store.get().is_none());
    assert_eq!(api.calls().len(), 3);
}

#[test]
fn failed_recovery_surfaces_recovery_error() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-old"));
    api.push(unauthorized("Session expired"));
    api.push(Err(ApiError::status(500, "recovery down", None)));

    let err = block_on(engine.request(Method::Get, "/reports/weekly", None)).expect_err("failed");
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "recovery down");
    assert!(store.get().is_none());
    assert_eq!(api.calls().len(), 2);
}

#[test]
fn non_auth_errors_pass_through_without_recovery() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    api.push(Err(ApiError::status(500, "oops", None)));

    let err = block_on(engine.request(Method::Get, "/reports/weekly", None)).expect_err("server");
    assert_eq!(err.status, 500);
    assert_eq!(api.calls().len(), 1);
    assert!(store.get().is_some());
}

// =============================================================
// Single-flight recovery
// =============================================================

#[test]
fn concurrent_recovery_shares_one_call() {
    let (engine, api, _store) = engine();
    api.push(ok(login_data("s-new")));

    let first = engine.recover();
    let second = engine.recover();
    let (a, b) = block_on(futures::future::join(first, second));

    assert_eq!(a.expect("a").session_id, "s-new");
    assert_eq!(b.expect("b").session_id, "s-new");
    assert_eq!(api.calls().len(), 1);
}

#[test]
fn recovery_slot_clears_after_completion() {
    let (engine, api, _store) = engine();
    api.push(ok(login_data("s-1")));
    block_on(engine.recover()).expect("first recovery");

    // A later expiry starts a fresh recovery call.
    api.push(ok(login_data("s-2")));
    let session = block_on(engine.recover()).expect("second recovery");
    assert_eq!(session.session_id, "s-2");
    assert_eq!(api.calls().len(), 2);
}

// =============================================================
// Register / verify / password flows
// =============================================================

#[test]
fn register_does_not_establish_session() {
    let (engine, api, store) = engine();
    api.push(ok_message("Check your email"));

    let envelope = block_on(engine.register("ada@example.com", "Ada", "longenough")).expect("ok");
    assert_eq!(envelope.message_or(""), "Check your email");
    assert!(store.get().is_none());
    assert!(api.calls()[0].session_id.is_none());
}

#[test]
fn register_conflict_surfaces_error() {
    let (engine, api, _store) = engine();
    api.push(Err(ApiError::status(409, "Email already registered", None)));

    let err = block_on(engine.register("ada@example.com", "Ada", "longenough")).expect_err("dup");
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn verify_email_leaves_session_untouched() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    api.push(ok_message("Email verified"));

    block_on(engine.verify_email("tok-1")).expect("verified");
    assert_eq!(store.get(), Some(seeded_session("s-1")));
    assert_eq!(api.calls()[0].body.as_ref().expect("body")["token"], json!("tok-1"));
}

#[test]
fn forgot_password_relays_uniform_ack() {
    let (engine, api, _store) = engine();
    let ack = "If the address exists, a reset link has been sent";
    api.push(ok_message(ack));
    api.push(ok_message(ack));

    let real = block_on(engine.forgot_password("real@x.com")).expect("ack");
    let missing = block_on(engine.forgot_password("nonexistent@x.com")).expect("ack");
    assert_eq!(real.message_or(""), missing.message_or(""));
}

#[test]
fn reset_password_round_trip() {
    let (engine, api, _store) = engine();
    api.push(ok_message("Password reset successful"));
    api.push(ok(login_data("s-after-reset")));
    api.push(unauthorized("Invalid credentials"));

    block_on(engine.reset_password("tok-1", "NewPass123")).expect("reset");
    let body = api.calls()[0].body.clone().expect("body");
    assert_eq!(body["new_password"], json!("NewPass123"));

    // New password logs in; the old one is rejected by the backend.
    block_on(engine.login("ada@example.com", "NewPass123", false)).expect("new password");
    block_on(engine.login("ada@example.com", "OldPass123", false)).expect_err("old password");
}

#[test]
fn reset_password_invalid_token() {
    let (engine, api, _store) = engine();
    api.push(rejected("Reset token expired"));

    let err = block_on(engine.reset_password("tok-stale", "NewPass123")).expect_err("expired");
    assert_eq!(err.message, "Reset token expired");
}

// =============================================================
// Refresh and reload behavior
// =============================================================

#[test]
fn refresh_user_adopts_fresh_snapshot() {
    let (engine, api, store) = engine();
    store.set(seeded_session("s-1"));
    api.push(ok(user_json("Ada Byron")));

    let user = block_on(engine.refresh_user()).expect("profile");
    assert_eq!(user.name, "Ada Byron");
    assert_eq!(store.get().expect("session").user.name, "Ada Byron");
}

#[test]
fn reload_restores_session_before_any_network_call() {
    let backend = Rc::new(MemoryStorage::default());
    let store = SessionStore::new(Box::new(Rc::clone(&backend)));
    let api = MockApi::default();
    let engine = AuthEngine::new(api.clone(), store);
    api.push(ok(login_data("s-1")));
    block_on(engine.login("ada@example.com", "pw", true)).expect("login");
    assert!(backend.get(STORAGE_KEY).is_some());

    // Fresh store over the same backend simulates the page reload: the
    // cached user is available synchronously, then the backend confirms.
    let reloaded_store = SessionStore::new(Box::new(backend));
    assert_eq!(reloaded_store.session_id().as_deref(), Some("s-1"));

    let api = MockApi::default();
    let engine = AuthEngine::new(api.clone(), reloaded_store);
    api.push(ok(user_json("Ada")));
    let AuthCheck::Authenticated(session) = block_on(engine.check_auth()) else {
        panic!("expected authenticated");
    };
    assert_eq!(session.session_id, "s-1");
}
