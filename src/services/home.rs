use crate::error::{ClientError, Result};
use crate::models::auth::{Stats, UserProfile};
use crate::models::Route;
use crate::services::api::SharedApi;
use crate::services::navigation::Navigator;
use crate::services::session::{SessionEnd, SessionStore};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct HomeSummary {
    pub user: Option<UserProfile>,
    pub stats: Stats,
}

impl HomeSummary {
    pub fn greeting(&self) -> String {
        match &self.user {
            Some(user) if !user.name.is_empty() => format!("Welcome, {}!", user.name),
            _ => "Welcome!".to_string(),
        }
    }
}

/// Loads the landing view. Statistics are optional and fall back to zeroes.
pub async fn load_home(api: &SharedApi, session: &SessionStore, navigator: &Navigator) -> Result<HomeSummary> {
    if !session.is_logged_in() {
        navigator.navigate(Route::Login);
        return Err(ClientError::Unauthorized("Please login first".to_string()));
    }

    let (user, stats) = futures::join!(api.current_user(), api.stats());

    let user = match user {
        Ok(user) => Some(user),
        Err(e) if e.is_unauthorized() => {
            session.clear(SessionEnd::Unauthorized);
            navigator.navigate(Route::Login);
            return Err(e);
        }
        Err(e) => {
            debug!("User lookup failed: {}", e);
            None
        }
    };

    let stats = stats.unwrap_or_else(|e| {
        debug!("Stats unavailable, using defaults: {}", e);
        Stats::default()
    });

    Ok(HomeSummary { user, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::{MockVotingApi, SharedApi};
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_stats_endpoint_uses_zeroes() {
        let mut api = MockVotingApi::new();
        api.expect_current_user().returning(|| {
            Ok(UserProfile {
                id: 1,
                name: "Asha".into(),
                email: "asha@gmail.com".into(),
                role: "user".into(),
                profile_picture_url: None,
            })
        });
        api.expect_stats()
            .returning(|| Err(ClientError::rejected(404, None, "Not Found")));

        let api: SharedApi = Arc::new(api);
        let session = SessionStore::in_memory();
        session.set("tok");

        let summary = load_home(&api, &session, &Navigator::new()).await.unwrap();
        assert_eq!(summary.stats, Stats::default());
        assert_eq!(summary.greeting(), "Welcome, Asha!");
    }

    #[tokio::test]
    async fn unauthorized_user_lookup_signs_out() {
        let mut api = MockVotingApi::new();
        api.expect_current_user()
            .returning(|| Err(ClientError::Unauthorized("Token has expired".into())));
        api.expect_stats().returning(|| Ok(Stats::default()));

        let api: SharedApi = Arc::new(api);
        let session = SessionStore::in_memory();
        session.set("tok");
        let navigator = Navigator::new();

        assert!(load_home(&api, &session, &navigator).await.is_err());
        assert!(!session.is_logged_in());
        assert_eq!(navigator.current(), Some(Route::Login));
    }
}
