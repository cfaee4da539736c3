//! Session gate, navigation routes and the login flow.

use medview_client::{AuthClient, ClientError, LoginResponse, LoginState};
use medview_types::{NonEmptyText, ResourceId};
use std::fmt;

// ============================================================================
// ROUTES
// ============================================================================

/// Tabs shown once signed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Patients,
    Settings,
}

/// Navigation targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Onboarding,
    Login,
    Tabs(Tab),
    PatientDetail(ResourceId),
}

/// Where the app starts: signed-in users go straight to the patients tab; otherwise
/// onboarding on first run, then login.
pub fn route(first_run: bool, authenticated: bool) -> Route {
    if authenticated {
        Route::Tabs(Tab::Patients)
    } else if first_run {
        Route::Onboarding
    } else {
        Route::Login
    }
}

// ============================================================================
// LOGIN
// ============================================================================

/// Which part of the login form an error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
    Form,
}

/// A login error attached to a form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginFailure {
    pub field: LoginField,
    pub message: String,
}

impl LoginFailure {
    /// Attach a server message to the field it most likely concerns.
    ///
    /// "not found" points at the email, "password" at the password; anything else is
    /// a form-level error.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let field = if lower.contains("not found") {
            LoginField::Email
        } else if lower.contains("password") {
            LoginField::Password
        } else {
            LoginField::Form
        };
        Self { field, message }
    }

    fn from_client(error: ClientError) -> Self {
        match error {
            ClientError::Server { message, .. } => Self::from_message(message),
            other => Self::from_message(other.to_string()),
        }
    }
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LoginFailure {}

/// Sign in with email and password.
///
/// When the server answers with memberships instead of a code, the first membership
/// is selected. The resulting tokens are persisted by the client.
pub async fn sign_in(
    auth: &dyn AuthClient,
    email: &str,
    password: &str,
) -> Result<LoginState, LoginFailure> {
    let email = NonEmptyText::new(email).map_err(|_| LoginFailure {
        field: LoginField::Email,
        message: "Email is required".into(),
    })?;
    let email = email.as_str();
    if password.is_empty() {
        return Err(LoginFailure {
            field: LoginField::Password,
            message: "Password is required".into(),
        });
    }

    let response = auth
        .start_login(email, password)
        .await
        .map_err(LoginFailure::from_client)?;
    let code = authorization_code(auth, response).await?;
    let state = auth
        .process_code(&code)
        .await
        .map_err(LoginFailure::from_client)?;
    tracing::info!(email, "login complete");
    Ok(state)
}

async fn authorization_code(
    auth: &dyn AuthClient,
    response: LoginResponse,
) -> Result<String, LoginFailure> {
    if let Some(code) = response.code {
        return Ok(code);
    }

    let membership = response.memberships.first().ok_or_else(|| LoginFailure {
        field: LoginField::Form,
        message: "No project membership available for this account".into(),
    })?;
    if response.memberships.len() > 1 {
        tracing::info!(
            count = response.memberships.len(),
            chosen = %membership.id,
            "several memberships; using the first"
        );
    }

    let selected = auth
        .select_profile(&response.login, &membership.id)
        .await
        .map_err(LoginFailure::from_client)?;
    selected.code.ok_or_else(|| LoginFailure {
        field: LoginField::Form,
        message: "Server did not issue an authorization code".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medview_client::{ClientResult, Membership};
    use std::sync::Mutex;

    /// Scripted auth server recording the calls it receives.
    #[derive(Default)]
    struct FakeAuth {
        login: Option<LoginResponse>,
        login_error: Option<String>,
        profile_code: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeAuth {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuthClient for FakeAuth {
        async fn start_login(&self, email: &str, _password: &str) -> ClientResult<LoginResponse> {
            self.calls.lock().unwrap().push(format!("login {email}"));
            if let Some(message) = &self.login_error {
                return Err(ClientError::Server {
                    status: 400,
                    message: message.clone(),
                });
            }
            Ok(self.login.clone().expect("scripted login response"))
        }

        async fn select_profile(
            &self,
            login: &str,
            membership_id: &str,
        ) -> ClientResult<LoginResponse> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("profile {login} {membership_id}"));
            Ok(LoginResponse {
                login: login.into(),
                code: self.profile_code.clone(),
                memberships: vec![],
            })
        }

        async fn process_code(&self, code: &str) -> ClientResult<LoginState> {
            self.calls.lock().unwrap().push(format!("code {code}"));
            Ok(LoginState {
                access_token: format!("token-for-{code}"),
                refresh_token: None,
                expires_at: None,
                profile: None,
            })
        }

        async fn sign_out(&self) -> ClientResult<()> {
            Ok(())
        }

        fn is_authenticated(&self) -> bool {
            false
        }
    }

    fn membership(id: &str) -> Membership {
        Membership {
            id: id.into(),
            profile: None,
            project: None,
        }
    }

    #[test]
    fn test_route_gate() {
        assert_eq!(route(true, false), Route::Onboarding);
        assert_eq!(route(true, true), Route::Tabs(Tab::Patients));
        assert_eq!(route(false, false), Route::Login);
        assert_eq!(route(false, true), Route::Tabs(Tab::Patients));
    }

    #[test]
    fn test_login_messages_map_to_fields() {
        assert_eq!(LoginFailure::from_message("User not found").field, LoginField::Email);
        assert_eq!(
            LoginFailure::from_message("Email or password is invalid").field,
            LoginField::Password
        );
        assert_eq!(LoginFailure::from_message("Too many requests").field, LoginField::Form);
    }

    #[tokio::test]
    async fn test_sign_in_with_direct_code() {
        let auth = FakeAuth {
            login: Some(LoginResponse {
                login: "l1".into(),
                code: Some("c1".into()),
                memberships: vec![],
            }),
            ..Default::default()
        };
        let state = sign_in(&auth, " a@b.c ", "pw").await.expect("sign in");
        assert_eq!(state.access_token, "token-for-c1");
        assert_eq!(auth.calls(), ["login a@b.c", "code c1"]);
    }

    #[tokio::test]
    async fn test_sign_in_selects_first_membership() {
        let auth = FakeAuth {
            login: Some(LoginResponse {
                login: "l1".into(),
                code: None,
                memberships: vec![membership("m1"), membership("m2")],
            }),
            profile_code: Some("c2".into()),
            ..Default::default()
        };
        sign_in(&auth, "a@b.c", "pw").await.expect("sign in");
        assert_eq!(auth.calls(), ["login a@b.c", "profile l1 m1", "code c2"]);
    }

    #[tokio::test]
    async fn test_sign_in_server_error_lands_on_field() {
        let auth = FakeAuth {
            login_error: Some("User not found".into()),
            ..Default::default()
        };
        let failure = sign_in(&auth, "nobody@b.c", "pw").await.expect_err("should fail");
        assert_eq!(failure.field, LoginField::Email);
        assert_eq!(failure.message, "User not found");
    }

    #[tokio::test]
    async fn test_sign_in_validates_before_calling_server() {
        let auth = FakeAuth::default();
        let failure = sign_in(&auth, "  ", "pw").await.expect_err("empty email");
        assert_eq!(failure.field, LoginField::Email);
        let failure = sign_in(&auth, "a@b.c", "").await.expect_err("empty password");
        assert_eq!(failure.field, LoginField::Password);
        assert!(auth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_without_code_or_membership_is_form_error() {
        let auth = FakeAuth {
            login: Some(LoginResponse {
                login: "l1".into(),
                code: None,
                memberships: vec![],
            }),
            ..Default::default()
        };
        let failure = sign_in(&auth, "a@b.c", "pw").await.expect_err("should fail");
        assert_eq!(failure.field, LoginField::Form);
    }
}
