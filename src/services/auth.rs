use crate::error::{ClientError, Result};
use crate::models::auth::{LoginOutcome, LoginRequest, RegistrationForm, UserProfile};
use crate::models::Route;
use crate::services::api::SharedApi;
use crate::services::navigation::Navigator;
use crate::services::session::{SessionEnd, SessionStore};
use crate::services::validation::validate_registration;
use tracing::{info, warn};

const USER_NOT_FOUND: &str = "USER_NOT_FOUND";

pub struct AuthService {
    api: SharedApi,
    session: SessionStore,
    navigator: Navigator,
}

impl AuthService {
    pub fn new(api: SharedApi, session: SessionStore, navigator: Navigator) -> Self {
        Self {
            api,
            session,
            navigator,
        }
    }

    /// Login is not validated client-side; older accounts may predate the password rules.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.api.login(&request).await {
            Ok(token) => {
                self.session.set(token.access_token);
                info!("Logged in");
                self.navigator.navigate(Route::Home);
                Ok(LoginOutcome::LoggedIn)
            }
            Err(e) if e.code() == Some(USER_NOT_FOUND) => {
                info!("No account for login email, offering registration");
                Ok(LoginOutcome::RegistrationHint)
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<()> {
        validate_registration(form)?;

        let token = self.api.register(&form.to_request()).await?;
        self.session.set(token.access_token);
        info!("Registered new account");
        self.navigator.navigate(Route::Home);
        Ok(())
    }

    pub fn logout(&self) {
        self.session.clear(SessionEnd::LoggedOut);
        self.navigator.navigate(Route::Login);
    }

    pub async fn current_user(&self) -> Result<UserProfile> {
        if !self.session.is_logged_in() {
            self.navigator.navigate(Route::Login);
            return Err(ClientError::Unauthorized("Please login first".to_string()));
        }

        match self.api.current_user().await {
            Err(e) if e.is_unauthorized() => {
                self.session.clear(SessionEnd::Unauthorized);
                self.navigator.navigate(Route::Login);
                Err(e)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::TokenResponse;
    use crate::services::api::MockVotingApi;
    use std::sync::Arc;

    fn service(api: MockVotingApi) -> (AuthService, SessionStore, Navigator) {
        let session = SessionStore::in_memory();
        let navigator = Navigator::new();
        let auth = AuthService::new(Arc::new(api), session.clone(), navigator.clone());
        (auth, session, navigator)
    }

    #[tokio::test]
    async fn login_stores_token() {
        let mut api = MockVotingApi::new();
        api.expect_login()
            .withf(|req| req.email == "asha@gmail.com" && req.password == "old")
            .times(1)
            .returning(|_| Ok(TokenResponse { access_token: "tok".into() }));

        let (auth, session, navigator) = service(api);
        assert_eq!(auth.login("asha@gmail.com", "old").await.unwrap(), LoginOutcome::LoggedIn);
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(navigator.current(), Some(Route::Home));
    }

    #[tokio::test]
    async fn unknown_user_becomes_registration_hint() {
        let mut api = MockVotingApi::new();
        api.expect_login().times(1).returning(|_| {
            Err(ClientError::rejected(
                401,
                Some("USER_NOT_FOUND".into()),
                "No account found with this email",
            ))
        });

        let (auth, session, _) = service(api);
        assert_eq!(
            auth.login("new@gmail.com", "x").await.unwrap(),
            LoginOutcome::RegistrationHint
        );
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn other_login_errors_surface() {
        let mut api = MockVotingApi::new();
        api.expect_login().times(1).returning(|_| {
            Err(ClientError::rejected(401, Some("INVALID_CREDENTIALS".into()), "Invalid credentials"))
        });

        let (auth, _, _) = service(api);
        let err = auth.login("asha@gmail.com", "bad").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn registration_with_disallowed_domain_never_hits_network() {
        let mut api = MockVotingApi::new();
        api.expect_register().times(0);

        let (auth, session, _) = service(api);
        let form = RegistrationForm {
            name: "Eve".into(),
            email: "a@evilmail.xyz".into(),
            password: "Str0ng!pw".into(),
            confirm_password: "Str0ng!pw".into(),
        };
        let err = auth.register(&form).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(err.to_string().contains("legitimate email provider"));
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn registration_stores_token() {
        let mut api = MockVotingApi::new();
        api.expect_register()
            .withf(|req| req.name == "Asha" && req.email == "asha@yahoo.co.in")
            .times(1)
            .returning(|_| Ok(TokenResponse { access_token: "fresh".into() }));

        let (auth, session, _) = service(api);
        let form = RegistrationForm {
            name: "Asha".into(),
            email: "asha@yahoo.co.in".into(),
            password: "Str0ng!pw".into(),
            confirm_password: "Str0ng!pw".into(),
        };
        auth.register(&form).await.unwrap();
        assert_eq!(session.token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn current_user_without_session_redirects() {
        let mut api = MockVotingApi::new();
        api.expect_current_user().times(0);

        let (auth, _, navigator) = service(api);
        assert!(auth.current_user().await.unwrap_err().is_unauthorized());
        assert_eq!(navigator.current(), Some(Route::Login));
    }

    #[tokio::test]
    async fn expired_session_is_cleared() {
        let mut api = MockVotingApi::new();
        api.expect_current_user()
            .times(1)
            .returning(|| Err(ClientError::Unauthorized("Token has expired".into())));

        let (auth, session, navigator) = service(api);
        session.set("stale");
        assert!(auth.current_user().await.is_err());
        assert!(!session.is_logged_in());
        assert_eq!(navigator.current(), Some(Route::Login));
    }

    #[test]
    fn logout_clears_and_redirects() {
        let (auth, session, navigator) = service(MockVotingApi::new());
        session.set("tok");
        auth.logout();
        assert!(!session.is_logged_in());
        assert_eq!(navigator.current(), Some(Route::Login));
    }
}
