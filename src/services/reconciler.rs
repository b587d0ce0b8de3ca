//! Keeps the profile view's "am I a candidate, and how many votes do I have"
//! aligned with the server while the view is mounted.
//!
//! Vote counts are refreshed by a background timer and on demand. Every
//! refresh takes a sequence number when it starts; a response is applied only
//! if no newer refresh (or local reset) has started since, so a slow response
//! can never overwrite a newer one.

use crate::error::{ClientError, Result};
use crate::models::auth::UserProfile;
use crate::models::candidate::{
    ApplicationForm, ApplicationSubmission, CandidateApplication, CandidateStatus, ProfilePicture,
};
use crate::models::Route;
use crate::services::api::SharedApi;
use crate::services::navigation::Navigator;
use crate::services::session::{SessionEnd, SessionStore};
use crate::services::validation::validate_application;
use crate::utils::task::RepeatingTask;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loaded,
    SignedOut,
    Unmounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Reactivated,
}

impl ApplyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ApplyOutcome::Created => "Successfully applied as a candidate!",
            ApplyOutcome::Reactivated => "Your candidacy has been successfully reactivated!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied(u64),
    /// A newer request started first, or the view went away.
    Discarded,
    /// Not a candidate, or not loaded.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSnapshot {
    pub phase: Phase,
    pub user: Option<UserProfile>,
    pub status: CandidateStatus,
    pub vote_count: u64,
    pub form: ApplicationForm,
}

struct ProfileState {
    phase: Phase,
    user: Option<UserProfile>,
    status: CandidateStatus,
    vote_count: u64,
    form: ApplicationForm,
    latest_request: u64,
}

impl ProfileState {
    fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            user: None,
            status: CandidateStatus::not_candidate(),
            vote_count: 0,
            form: ApplicationForm::default(),
            latest_request: 0,
        }
    }

    fn is_live(&self) -> bool {
        self.phase == Phase::Loaded
    }

    /// Sets the count locally and supersedes every refresh still in flight.
    fn reset_vote_count(&mut self, count: u64) {
        self.vote_count = count;
        self.latest_request += 1;
    }
}

struct Shared {
    api: SharedApi,
    session: SessionStore,
    navigator: Navigator,
    state: Mutex<ProfileState>,
}

impl Shared {
    fn begin_vote_refresh(&self) -> Option<RequestTicket> {
        let mut state = self.state.lock();
        if !state.is_live() || !state.status.is_candidate {
            return None;
        }
        state.latest_request += 1;
        Some(RequestTicket(state.latest_request))
    }

    fn accept_vote_count(&self, ticket: RequestTicket, count: u64) -> bool {
        let mut state = self.state.lock();
        if !state.is_live() || ticket.0 != state.latest_request {
            return false;
        }
        state.vote_count = count;
        true
    }

    async fn refresh_votes(&self) -> RefreshOutcome {
        let ticket = match self.begin_vote_refresh() {
            Some(ticket) => ticket,
            None => return RefreshOutcome::Skipped,
        };

        match self.api.vote_count().await {
            Ok(count) => {
                if self.accept_vote_count(ticket, count) {
                    debug!("Vote count refreshed: {}", count);
                    RefreshOutcome::Applied(count)
                } else {
                    debug!("Discarding stale vote count response {:?}", ticket);
                    RefreshOutcome::Discarded
                }
            }
            Err(e) if e.is_unauthorized() => {
                self.sign_out();
                RefreshOutcome::Failed
            }
            Err(e) => {
                // Best effort: keep the last known value, try again next tick
                debug!("Vote count refresh failed: {}", e);
                RefreshOutcome::Failed
            }
        }
    }

    fn sign_out(&self) {
        self.session.clear(SessionEnd::Unauthorized);
        let was_mounted = {
            let mut state = self.state.lock();
            let mounted = state.phase != Phase::Unmounted;
            if mounted {
                state.phase = Phase::SignedOut;
            }
            mounted
        };
        if was_mounted {
            self.navigator.navigate(Route::Login);
        }
    }

    fn fail(&self, e: ClientError) -> ClientError {
        if e.is_unauthorized() {
            self.sign_out();
        }
        e
    }

    /// A remount after `unmount` starts over; stale tickets stay invalid.
    fn reopen(&self) {
        let mut state = self.state.lock();
        if state.phase == Phase::Unmounted {
            state.phase = Phase::Uninitialized;
            state.latest_request += 1;
        }
    }

    fn merge_loaded(&self, user: Option<UserProfile>, status: CandidateStatus) {
        let mut state = self.state.lock();
        if state.phase == Phase::Unmounted {
            return;
        }

        if let Some(user) = &user {
            state.form.name = user.name.clone();
        }
        state.user = user;

        if let (true, Some(candidate)) = (status.is_candidate, status.candidate.as_ref()) {
            state.form = ApplicationForm::from_application(candidate);
            let count = candidate.vote_count;
            state.reset_vote_count(count);
        }
        state.status = status;
        state.phase = Phase::Loaded;
    }
}

pub struct CandidateReconciler {
    shared: Arc<Shared>,
    refresh_period: Duration,
    ticker: Option<RepeatingTask>,
}

impl CandidateReconciler {
    pub fn new(api: SharedApi, session: SessionStore, navigator: Navigator, refresh_period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                session,
                navigator,
                state: Mutex::new(ProfileState::new()),
            }),
            refresh_period,
            ticker: None,
        }
    }

    /// Loads user and candidacy, then starts the background vote refresh.
    pub async fn mount(&mut self) -> Result<()> {
        self.shared.reopen();
        if !self.shared.session.is_logged_in() {
            self.shared.sign_out();
            return Err(ClientError::Unauthorized("Please login first".to_string()));
        }

        let (user, status) = futures::join!(
            self.shared.api.current_user(),
            self.shared.api.candidate_status()
        );

        let user = match user {
            Ok(user) => Some(user),
            Err(e) if e.is_unauthorized() => return Err(self.shared.fail(e)),
            Err(e) => {
                warn!("Failed to fetch user info: {}", e);
                None
            }
        };
        let status = status.map_err(|e| self.shared.fail(e))?;

        let is_candidate = status.is_candidate && status.candidate.is_some();
        self.shared.merge_loaded(user, status);
        info!("Profile loaded (candidate: {})", is_candidate);

        if is_candidate {
            self.shared.refresh_votes().await;
        }

        if self.ticker.is_none() {
            let shared = Arc::clone(&self.shared);
            self.ticker = Some(RepeatingTask::spawn("vote-refresh", self.refresh_period, move || {
                let shared = Arc::clone(&shared);
                async move {
                    shared.refresh_votes().await;
                }
            }));
        }

        Ok(())
    }

    /// Manual refresh; runs alongside any timer refresh already in flight.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.shared.refresh_votes().await
    }

    pub async fn apply(&self, form: ApplicationForm, picture: Option<ProfilePicture>) -> Result<ApplyOutcome> {
        {
            let mut state = self.shared.state.lock();
            match state.phase {
                Phase::Loaded => {}
                Phase::SignedOut => return Err(ClientError::Unauthorized("Please login first".to_string())),
                _ => return Err(ClientError::Validation("Profile is not loaded".to_string())),
            }
            if state.status.is_active_candidate() {
                return Err(ClientError::Validation("You are already an active candidate".to_string()));
            }
            state.form = form.clone();
        }
        validate_application(&form)?;

        let submission = ApplicationSubmission { form, picture };
        let response = match self.shared.api.apply(&submission).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Candidate application failed: {}", e);
                return Err(self.shared.fail(e));
            }
        };

        let outcome = if response.reactivated {
            ApplyOutcome::Reactivated
        } else {
            ApplyOutcome::Created
        };
        info!("Candidate application accepted: {:?}", outcome);

        let refreshed = match self.shared.api.candidate_status().await {
            Ok(status) => status,
            Err(e) if e.is_unauthorized() => return Err(self.shared.fail(e)),
            Err(e) => {
                warn!("Status refresh after applying failed: {}", e);
                CandidateStatus {
                    is_candidate: true,
                    candidate: Some(application_from_form(&submission.form, response.candidate_id)),
                }
            }
        };

        let mut state = self.shared.state.lock();
        if state.is_live() {
            state.status = refreshed;
            // Placeholder until the next refresh reports the real total
            state.reset_vote_count(0);
        }
        Ok(outcome)
    }

    pub async fn revoke(&self) -> Result<()> {
        {
            let state = self.shared.state.lock();
            if state.phase == Phase::SignedOut {
                return Err(ClientError::Unauthorized("Please login first".to_string()));
            }
            if !state.is_live() || !state.status.is_active_candidate() {
                return Err(ClientError::Validation(
                    "You are not a candidate or already inactive".to_string(),
                ));
            }
        }

        if let Err(e) = self.shared.api.revoke().await {
            warn!("Revoke failed: {}", e);
            return Err(self.shared.fail(e));
        }

        let mut state = self.shared.state.lock();
        if state.is_live() {
            // Form fields stay so a later re-apply is pre-filled
            state.status = CandidateStatus::not_candidate();
            state.reset_vote_count(0);
        }
        info!("Candidacy revoked");
        Ok(())
    }

    /// Replaces the account picture and shows the new one straight away.
    pub async fn upload_picture(&self, picture: ProfilePicture) -> Result<String> {
        {
            let state = self.shared.state.lock();
            match state.phase {
                Phase::Loaded => {}
                Phase::SignedOut => return Err(ClientError::Unauthorized("Please login first".to_string())),
                _ => return Err(ClientError::Validation("Profile is not loaded".to_string())),
            }
        }

        let url = match self.shared.api.upload_profile_picture(&picture).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Profile picture upload failed: {}", e);
                return Err(self.shared.fail(e));
            }
        };

        let mut state = self.shared.state.lock();
        if state.is_live() {
            if let Some(user) = state.user.as_mut() {
                user.profile_picture_url = Some(url.clone());
            }
        }
        info!("Profile picture updated");
        Ok(url)
    }

    /// Stops the timer; responses that arrive later are dropped.
    pub fn unmount(&mut self) {
        self.ticker.take();
        self.shared.state.lock().phase = Phase::Unmounted;
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut ApplicationForm)) {
        edit(&mut self.shared.state.lock().form);
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        let state = self.shared.state.lock();
        ProfileSnapshot {
            phase: state.phase,
            user: state.user.clone(),
            status: state.status.clone(),
            vote_count: state.vote_count,
            form: state.form.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.shared.state.lock().phase
    }

    pub fn vote_count(&self) -> u64 {
        self.shared.state.lock().vote_count
    }

    pub fn is_candidate(&self) -> bool {
        self.shared.state.lock().status.is_candidate
    }

    pub fn form(&self) -> ApplicationForm {
        self.shared.state.lock().form.clone()
    }

    pub fn is_refreshing_in_background(&self) -> bool {
        self.ticker.as_ref().map_or(false, RepeatingTask::is_running)
    }
}

impl Drop for CandidateReconciler {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn application_from_form(form: &ApplicationForm, id: Option<i64>) -> CandidateApplication {
    CandidateApplication {
        id,
        name: form.name.clone(),
        date_of_birth: Some(form.dob.clone()),
        gender: Some(form.gender.clone()),
        party: Some(form.party.clone()),
        description: form.description.clone(),
        profile_picture_url: None,
        is_active: true,
        vote_count: 0,
    }
}
