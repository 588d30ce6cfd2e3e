//! Login, remote session validation and the authorization gate.

use serde::Deserialize;
use serde_json::json;

use crate::api::{ApiClient, Method};
use crate::error::{LedgerError, Result};
use crate::session::{Session, SessionStore};

pub const LOGIN_ROUTE: &str = "/Login";
pub const DASHBOARD_ROUTE: &str = "/Dashboard";
pub const ADMIN_DASHBOARD_ROUTE: &str = "/AdminDashboard";

const AUTHENTICATE_PATH: &str = "/api/token/authenticate/";
const VALIDATE_PATH: &str = "/api/token/validate/";
const PASSWORD_PATH: &str = "/api/password/change/";

const TOKEN_VALID: &str = "token valid";
pub const MIN_PASSWORD_LEN: usize = 7;

#[derive(Deserialize)]
struct LoginReply {
    token: String,
    user_id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ValidateReply {
    #[serde(default)]
    token_status: String,
    /// Anything but a JSON boolean leaves this empty and fails validation.
    #[serde(default)]
    admin_flag: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub admin: bool,
}

impl Validation {
    const INVALID: Self = Self {
        valid: false,
        admin: false,
    };
}

/// Exchange credentials for a token and store the resulting session.
pub async fn login(
    api: &ApiClient,
    store: &SessionStore,
    username: &str,
    password: &str,
) -> Result<Session> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(LedgerError::validation(
            "Please enter a username and password.",
        ));
    }
    let body = json!({ "username": username, "password": password });
    let response = api
        .call_unchecked(Method::Post, AUTHENTICATE_PATH, Some(body))
        .await?;
    if !response.is_success() {
        tracing::warn!(status = response.status, "login rejected");
        return Err(LedgerError::Status {
            status: response.status,
            message: "Login failed. Please check your credentials.".to_string(),
        });
    }
    let reply: LoginReply = response.json()?;
    let session = Session::new(reply.token, reply.user_id, reply.name);
    store.set(session.clone())?;
    tracing::info!(user_id = session.user_id, "logged in");
    Ok(session)
}

/// Ask the server whether `session` is still good. Any failure, including a
/// transport error or an unreadable reply, counts as invalid.
pub async fn validate(api: &ApiClient, session: &Session) -> Validation {
    let body = json!({
        "user_id": session.user_id,
        "token": session.validation_token(),
    });
    let response = match api
        .with_token(&session.token)
        .call_unchecked(Method::Post, VALIDATE_PATH, Some(body))
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "token validation failed");
            return Validation::INVALID;
        }
    };
    match response.json::<ValidateReply>() {
        Ok(ValidateReply {
            token_status,
            admin_flag: Some(admin),
        }) if token_status == TOKEN_VALID => Validation { valid: true, admin },
        Ok(_) => Validation::INVALID,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable validation reply");
            Validation::INVALID
        }
    }
}

/// Where a freshly validated user lands.
pub fn landing_route(validation: Validation) -> &'static str {
    match validation {
        Validation { valid: false, .. } => LOGIN_ROUTE,
        Validation { admin: true, .. } => ADMIN_DASHBOARD_ROUTE,
        Validation { admin: false, .. } => DASHBOARD_ROUTE,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Granted { session: Session, admin: bool },
    Redirect(&'static str),
}

/// Guards a protected screen. `expect_admin` of `None` admits any
/// authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthGate {
    expect_admin: Option<bool>,
}

impl AuthGate {
    pub fn new(expect_admin: Option<bool>) -> Self {
        Self { expect_admin }
    }

    pub fn any() -> Self {
        Self::new(None)
    }

    pub fn admin() -> Self {
        Self::new(Some(true))
    }

    pub fn staff() -> Self {
        Self::new(Some(false))
    }

    pub async fn check(&self, api: &ApiClient, store: &SessionStore) -> Result<GateOutcome> {
        let Some(session) = store.get()? else {
            return Ok(GateOutcome::Redirect(LOGIN_ROUTE));
        };
        tracing::debug!(user_id = session.user_id, "validating session");
        eprintln!("Validating session…");
        let validation = validate(api, &session).await;
        if !validation.valid {
            store.clear()?;
            return Ok(GateOutcome::Redirect(LOGIN_ROUTE));
        }
        // A role mismatch redirects but leaves the stored session in place.
        if let Some(expected) = self.expect_admin {
            if expected != validation.admin {
                tracing::info!(expected, actual = validation.admin, "role mismatch");
                return Ok(GateOutcome::Redirect(LOGIN_ROUTE));
            }
        }
        Ok(GateOutcome::Granted {
            session,
            admin: validation.admin,
        })
    }

    /// Like [`check`](Self::check) but turns a redirect into an error.
    pub async fn enter(&self, api: &ApiClient, store: &SessionStore) -> Result<Session> {
        let had_session = store.get()?.is_some();
        match self.check(api, store).await? {
            GateOutcome::Granted { session, .. } => Ok(session),
            GateOutcome::Redirect(_) if !had_session => Err(LedgerError::NotLoggedIn),
            GateOutcome::Redirect(route) => Err(LedgerError::Redirect(route.to_string())),
        }
    }
}

pub fn check_new_password(new_password: &str, confirm: &str) -> Result<()> {
    if new_password != confirm {
        return Err(LedgerError::validation("Passwords do not match"));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LedgerError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

pub async fn change_password(
    api: &ApiClient,
    session: &Session,
    old_password: &str,
    new_password: &str,
    confirm: &str,
) -> Result<()> {
    check_new_password(new_password, confirm)?;
    let body = json!({
        "user_id": session.user_id,
        "new_password": new_password,
        "old_password": old_password,
    });
    api.with_token(&session.token)
        .send_unit(
            Method::Post,
            PASSWORD_PATH,
            body,
            "Failed to change password. Try Again.",
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::fake::FakeTransport;

    fn fake_with_login() -> Arc<FakeTransport> {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Post,
            AUTHENTICATE_PATH,
            200,
            json!({"token": "Token s3cr3t", "user_id": 12, "name": "Grace"}),
        );
        fake
    }

    fn validation_reply(fake: &FakeTransport, status: &str, admin: bool) {
        fake.respond(
            Method::Post,
            VALIDATE_PATH,
            200,
            json!({"token_status": status, "admin_flag": admin}),
        );
    }

    #[tokio::test]
    async fn test_non_admin_redirected_from_admin_screen_keeps_session() {
        let fake = fake_with_login();
        validation_reply(&fake, TOKEN_VALID, false);
        let api = ApiClient::new(fake.clone());
        let store = SessionStore::in_memory();

        login(&api, &store, "grace", "hunter22").await.unwrap();
        assert!(store.get().unwrap().is_some());

        let outcome = AuthGate::admin().check(&api, &store).await.unwrap();
        assert_eq!(outcome, GateOutcome::Redirect(LOGIN_ROUTE));
        assert!(store.get().unwrap().is_some(), "mismatch must not clear");

        let validate_call = fake
            .requests()
            .into_iter()
            .find(|r| r.path == VALIDATE_PATH)
            .unwrap();
        assert_eq!(validate_call.token.as_deref(), Some("Token s3cr3t"));
        assert_eq!(validate_call.body.unwrap()["token"], "s3cr3t");
    }

    #[tokio::test]
    async fn test_invalid_token_clears_session() {
        let fake = fake_with_login();
        validation_reply(&fake, "token invalid", false);
        let api = ApiClient::new(fake);
        let store = SessionStore::in_memory();
        login(&api, &store, "grace", "hunter22").await.unwrap();

        let outcome = AuthGate::any().check(&api, &store).await.unwrap();
        assert_eq!(outcome, GateOutcome::Redirect(LOGIN_ROUTE));
        assert!(store.get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_fails_closed() {
        let fake = fake_with_login();
        fake.fail(Method::Post, VALIDATE_PATH, "dns failure");
        let api = ApiClient::new(fake);
        let store = SessionStore::in_memory();
        login(&api, &store, "grace", "hunter22").await.unwrap();

        let outcome = AuthGate::staff().check(&api, &store).await.unwrap();
        assert_eq!(outcome, GateOutcome::Redirect(LOGIN_ROUTE));
    }

    #[tokio::test]
    async fn test_missing_admin_flag_fails_closed() {
        for reply in [
            json!({"token_status": TOKEN_VALID}),
            json!({"token_status": TOKEN_VALID, "admin_flag": null}),
            json!({"token_status": TOKEN_VALID, "admin_flag": "false"}),
        ] {
            let fake = fake_with_login();
            fake.respond(Method::Post, VALIDATE_PATH, 200, reply);
            let api = ApiClient::new(fake);
            let store = SessionStore::in_memory();
            let session = login(&api, &store, "grace", "hunter22").await.unwrap();

            assert_eq!(validate(&api, &session).await, Validation::INVALID);
            let outcome = AuthGate::staff().check(&api, &store).await.unwrap();
            assert_eq!(outcome, GateOutcome::Redirect(LOGIN_ROUTE));
            assert!(store.get().unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_matching_role_is_granted() {
        let fake = fake_with_login();
        validation_reply(&fake, TOKEN_VALID, true);
        let api = ApiClient::new(fake);
        let store = SessionStore::in_memory();
        login(&api, &store, "grace", "hunter22").await.unwrap();

        match AuthGate::admin().check(&api, &store).await.unwrap() {
            GateOutcome::Granted { session, admin } => {
                assert!(admin);
                assert_eq!(session.user_id, 12);
            }
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_session_redirects_without_calling_server() {
        let fake = Arc::new(FakeTransport::new());
        let api = ApiClient::new(fake.clone());
        let store = SessionStore::in_memory();
        let err = AuthGate::any().enter(&api, &store).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotLoggedIn));
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_login_stores_nothing() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, AUTHENTICATE_PATH, 401, json!({"error": "bad"}));
        let api = ApiClient::new(fake);
        let store = SessionStore::in_memory();
        let err = login(&api, &store, "grace", "wrong").await.unwrap_err();
        assert!(err.to_string().starts_with("Login failed."));
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_landing_routes() {
        let admin = Validation { valid: true, admin: true };
        let staff = Validation { valid: true, admin: false };
        assert_eq!(landing_route(admin), ADMIN_DASHBOARD_ROUTE);
        assert_eq!(landing_route(staff), DASHBOARD_ROUTE);
        assert_eq!(landing_route(Validation::INVALID), LOGIN_ROUTE);
    }

    #[tokio::test]
    async fn test_password_rules_checked_before_request() {
        let fake = Arc::new(FakeTransport::new());
        let api = ApiClient::new(fake.clone());
        let session = Session::new("Token abc".into(), 1, "x".into());

        let err = change_password(&api, &session, "old", "abcdefg", "abcdefh").await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
        let err = change_password(&api, &session, "old", "short", "short").await.unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 7 characters long");
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_password_change_posts_both_passwords() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, PASSWORD_PATH, 200, json!({}));
        let api = ApiClient::new(fake.clone());
        let session = Session::new("Token abc".into(), 5, "x".into());
        change_password(&api, &session, "old-pass", "new-pass1", "new-pass1")
            .await
            .unwrap();
        let body = fake.requests()[0].body.clone().unwrap();
        assert_eq!(body, json!({"user_id": 5, "new_password": "new-pass1", "old_password": "old-pass"}));
    }
}
