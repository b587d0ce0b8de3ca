#![allow(dead_code)]

use async_trait::async_trait;
use ballot_client::error::{ClientError, Result};
use ballot_client::models::auth::{LoginRequest, RegisterRequest, Stats, TokenResponse, UserProfile};
use ballot_client::models::candidate::{
    ApplicationSubmission, ApplyResponse, BallotCandidate, CandidateApplication, CandidateStatus,
    ProfilePicture,
};
use ballot_client::models::voting::{ResultsSnapshot, VoteReceipt, VotingWindow};
use ballot_client::models::CandidateId;
use ballot_client::services::api::VotingApi;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// In-memory backend. Individual replies can be held back with a gate so
/// tests decide the order responses arrive in.
#[derive(Default)]
pub struct FakeApi {
    pub user: Mutex<Option<UserProfile>>,
    pub status: Mutex<CandidateStatus>,
    pub vote_count: Mutex<u64>,
    pub candidates: Mutex<Vec<BallotCandidate>>,
    pub window: Mutex<VotingWindow>,
    pub has_voted: Mutex<bool>,
    pub results: Mutex<ResultsSnapshot>,
    vote_count_gates: Mutex<VecDeque<oneshot::Receiver<u64>>>,
    cast_gate: Mutex<Option<oneshot::Receiver<Result<VoteReceipt>>>>,
    health_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub vote_count_calls: AtomicUsize,
    pub cast_vote_calls: AtomicUsize,
    pub apply_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, name: &str) -> Self {
        *self.user.lock() = Some(UserProfile {
            id: 1,
            name: name.to_string(),
            email: "voter@gmail.com".to_string(),
            role: "user".to_string(),
            profile_picture_url: None,
        });
        self
    }

    pub fn with_candidacy(self, application: CandidateApplication) -> Self {
        *self.status.lock() = CandidateStatus {
            is_candidate: true,
            candidate: Some(application),
        };
        self
    }

    pub fn with_candidates(self, candidates: Vec<BallotCandidate>) -> Self {
        *self.candidates.lock() = candidates;
        self
    }

    pub fn with_window_open(self, is_open: bool) -> Self {
        self.window.lock().is_open = is_open;
        self
    }

    /// The next unanswered `vote_count` call waits for the returned sender.
    pub fn gate_vote_count(&self) -> oneshot::Sender<u64> {
        let (tx, rx) = oneshot::channel();
        self.vote_count_gates.lock().push_back(rx);
        tx
    }

    pub fn gate_cast_vote(&self) -> oneshot::Sender<Result<VoteReceipt>> {
        let (tx, rx) = oneshot::channel();
        *self.cast_gate.lock() = Some(rx);
        tx
    }

    /// Health probes hang until the sender is used or dropped.
    pub fn stall_health(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.health_gate.lock() = Some(rx);
        tx
    }
}

pub fn application(name: &str, is_active: bool, votes: u64) -> CandidateApplication {
    CandidateApplication {
        id: Some(11),
        name: name.to_string(),
        date_of_birth: Some("Thu, 12 Apr 1990 00:00:00 GMT".to_string()),
        gender: Some("female".to_string()),
        party: Some("Green".to_string()),
        description: "Clean water for every ward".to_string(),
        profile_picture_url: Some("/uploads/11.jpg".to_string()),
        is_active,
        vote_count: votes,
    }
}

pub fn ballot_candidate(id: CandidateId, name: &str, votes: u64) -> BallotCandidate {
    BallotCandidate {
        id,
        name: name.to_string(),
        party: None,
        date_of_birth: None,
        description: None,
        profile_picture_url: None,
        vote_count: votes,
    }
}

#[async_trait]
impl VotingApi for FakeApi {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        Ok(TokenResponse {
            access_token: format!("token-for-{}", request.email),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse> {
        Ok(TokenResponse {
            access_token: format!("token-for-{}", request.email),
        })
    }

    async fn current_user(&self) -> Result<UserProfile> {
        self.user
            .lock()
            .clone()
            .ok_or_else(|| ClientError::rejected(404, None, "User not found"))
    }

    async fn upload_profile_picture(&self, picture: &ProfilePicture) -> Result<String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let url = format!("/uploads/{}", picture.file_name);
        if let Some(user) = self.user.lock().as_mut() {
            user.profile_picture_url = Some(url.clone());
        }
        Ok(url)
    }

    async fn candidate_status(&self) -> Result<CandidateStatus> {
        Ok(self.status.lock().clone())
    }

    async fn vote_count(&self) -> Result<u64> {
        self.vote_count_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.vote_count_gates.lock().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .map_err(|_| ClientError::rejected(503, None, "Gate dropped")),
            None => Ok(*self.vote_count.lock()),
        }
    }

    async fn apply(&self, submission: &ApplicationSubmission) -> Result<ApplyResponse> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        let mut status = self.status.lock();
        let reactivated = status.candidate.is_some();
        let id = status.candidate.as_ref().and_then(|c| c.id).or(Some(11));
        let form = &submission.form;
        *status = CandidateStatus {
            is_candidate: true,
            candidate: Some(CandidateApplication {
                id,
                name: form.name.clone(),
                date_of_birth: Some(form.dob.clone()),
                gender: Some(form.gender.clone()),
                party: Some(form.party.clone()),
                description: form.description.clone(),
                profile_picture_url: None,
                is_active: true,
                vote_count: 0,
            }),
        };
        Ok(ApplyResponse {
            message: Some("Application submitted".to_string()),
            candidate_id: id,
            reactivated,
        })
    }

    async fn revoke(&self) -> Result<()> {
        let mut status = self.status.lock();
        if let Some(candidate) = status.candidate.as_mut() {
            candidate.is_active = false;
        }
        Ok(())
    }

    async fn candidates(&self) -> Result<Vec<BallotCandidate>> {
        Ok(self.candidates.lock().clone())
    }

    async fn results(&self) -> Result<ResultsSnapshot> {
        Ok(self.results.lock().clone())
    }

    async fn voting_window(&self) -> Result<VotingWindow> {
        Ok(self.window.lock().clone())
    }

    async fn has_voted(&self) -> Result<bool> {
        Ok(*self.has_voted.lock())
    }

    async fn cast_vote(&self, _candidate_id: CandidateId) -> Result<VoteReceipt> {
        self.cast_vote_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.cast_gate.lock().take();
        let receipt = match gate {
            Some(rx) => rx
                .await
                .map_err(|_| ClientError::rejected(503, None, "Gate dropped"))??,
            None => VoteReceipt {
                message: Some("Vote cast successfully".to_string()),
                vote_id: Some(1),
            },
        };
        *self.has_voted.lock() = true;
        Ok(receipt)
    }

    async fn stats(&self) -> Result<Stats> {
        Ok(Stats::default())
    }

    async fn health(&self) -> Result<()> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.health_gate.lock().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        Ok(())
    }
}
