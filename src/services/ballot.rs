//! Ballot view and the guard around casting a single vote.
//!
//! The client-side checks are for the user's benefit only; the vote endpoint
//! is what actually enforces one vote per voter.

use crate::error::{ClientError, Result};
use crate::models::candidate::BallotCandidate;
use crate::models::voting::{VoteReceipt, VotingWindow};
use crate::models::{CandidateId, Route};
use crate::services::api::SharedApi;
use crate::services::navigation::Navigator;
use crate::services::session::{SessionEnd, SessionStore};
use crate::utils::task::DelayedTask;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteRejected {
    #[error("Please select a candidate first!")]
    NoSelection,
    #[error("You have already voted!")]
    AlreadyVoted,
    #[error("Voting is closed")]
    WindowClosed,
    #[error("A vote is already being submitted")]
    InFlight,
    #[error("{0}")]
    Server(String),
    #[error("Session expired. Please login again.")]
    SignedOut,
}

/// Why the submit action is currently disabled, if it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlock {
    WindowClosed,
    InFlight,
}

#[derive(Debug, Default)]
struct GuardState {
    selected: Option<CandidateId>,
    has_voted: bool,
    in_flight: bool,
    window: Option<VotingWindow>,
}

/// Serialises vote submission: one request at a time, none after a success.
pub struct VoteGuard {
    api: SharedApi,
    session: SessionStore,
    navigator: Navigator,
    redirect_delay: Duration,
    state: Mutex<GuardState>,
    pending_redirect: Mutex<Option<DelayedTask>>,
}

impl VoteGuard {
    pub fn new(api: SharedApi, session: SessionStore, navigator: Navigator, redirect_delay: Duration) -> Self {
        Self {
            api,
            session,
            navigator,
            redirect_delay,
            state: Mutex::new(GuardState::default()),
            pending_redirect: Mutex::new(None),
        }
    }

    pub fn set_window(&self, window: Option<VotingWindow>) {
        self.state.lock().window = window;
    }

    pub fn set_has_voted(&self, has_voted: bool) {
        self.state.lock().has_voted = has_voted;
    }

    /// Ignored once a vote has been cast.
    pub fn select(&self, candidate_id: CandidateId) -> bool {
        let mut state = self.state.lock();
        if state.has_voted {
            return false;
        }
        state.selected = Some(candidate_id);
        true
    }

    pub fn selected(&self) -> Option<CandidateId> {
        self.state.lock().selected
    }

    pub fn has_voted(&self) -> bool {
        self.state.lock().has_voted
    }

    pub fn is_submitting(&self) -> bool {
        self.state.lock().in_flight
    }

    pub fn blocked_by(&self) -> Option<SubmitBlock> {
        let state = self.state.lock();
        if state.in_flight {
            Some(SubmitBlock::InFlight)
        } else if state.window.as_ref().map_or(false, |w| !w.is_open) {
            Some(SubmitBlock::WindowClosed)
        } else {
            None
        }
    }

    pub fn can_submit(&self) -> bool {
        self.blocked_by().is_none()
    }

    pub fn redirect_pending(&self) -> bool {
        self.pending_redirect
            .lock()
            .as_ref()
            .map_or(false, DelayedTask::is_pending)
    }

    pub async fn submit(&self) -> std::result::Result<VoteReceipt, VoteRejected> {
        let candidate_id = {
            let mut state = self.state.lock();
            let candidate_id = state.selected.ok_or(VoteRejected::NoSelection)?;
            if state.has_voted {
                return Err(VoteRejected::AlreadyVoted);
            }
            if state.window.as_ref().map_or(false, |w| !w.is_open) {
                return Err(VoteRejected::WindowClosed);
            }
            if state.in_flight {
                return Err(VoteRejected::InFlight);
            }
            state.in_flight = true;
            candidate_id
        };

        let result = self.api.cast_vote(candidate_id).await;

        let mut state = self.state.lock();
        state.in_flight = false;
        match result {
            Ok(receipt) => {
                state.has_voted = true;
                drop(state);
                info!("Vote cast for candidate {}", candidate_id);
                let redirect = self.navigator.navigate_after(Route::Results, self.redirect_delay);
                *self.pending_redirect.lock() = Some(redirect);
                Ok(receipt)
            }
            Err(e) if e.is_unauthorized() => {
                drop(state);
                self.session.clear(SessionEnd::Unauthorized);
                self.navigator.navigate(Route::Login);
                Err(VoteRejected::SignedOut)
            }
            Err(e) => {
                warn!("Vote rejected: {}", e);
                Err(VoteRejected::Server(e.user_message()))
            }
        }
    }
}

/// Everything the voting view shows, plus its guard.
pub struct BallotView {
    pub candidates: Vec<BallotCandidate>,
    pub window: Option<VotingWindow>,
    pub guard: VoteGuard,
}

impl BallotView {
    /// Window, candidate list and has-voted flag are fetched together. Only an
    /// unauthorized response fails the load.
    pub async fn load(
        api: SharedApi,
        session: SessionStore,
        navigator: Navigator,
        redirect_delay: Duration,
    ) -> Result<Self> {
        if !session.is_logged_in() {
            navigator.navigate(Route::Login);
            return Err(ClientError::Unauthorized("Please login first".to_string()));
        }

        let (window, candidates, has_voted) =
            futures::join!(api.voting_window(), api.candidates(), api.has_voted());

        if let Some(e) = [
            window.as_ref().err(),
            candidates.as_ref().err(),
            has_voted.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .find(|e| e.is_unauthorized())
        {
            let message = e.to_string();
            session.clear(SessionEnd::Unauthorized);
            navigator.navigate(Route::Login);
            return Err(ClientError::Unauthorized(message));
        }

        let window = window
            .map_err(|e| warn!("Failed to fetch voting status: {}", e))
            .ok();
        let candidates = candidates.unwrap_or_else(|e| {
            warn!("Failed to fetch candidates: {}", e);
            Vec::new()
        });
        // Optional endpoint; assume not voted when it is missing
        let has_voted = has_voted.unwrap_or_else(|e| {
            debug!("Has-voted check unavailable: {}", e);
            false
        });

        let guard = VoteGuard::new(api, session, navigator, redirect_delay);
        guard.set_window(window.clone());
        guard.set_has_voted(has_voted);

        Ok(Self {
            candidates,
            window,
            guard,
        })
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&BallotCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn headline(&self) -> &'static str {
        if self.guard.has_voted() {
            "You have already voted today! Come back tomorrow to vote again."
        } else {
            "Select a candidate and cast your vote (resets daily)"
        }
    }
}
