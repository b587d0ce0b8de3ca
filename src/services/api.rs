use crate::error::{ClientError, Result};
use crate::models::auth::{
    LoginRequest, PictureUploadResponse, RegisterRequest, Stats, TokenResponse, UserProfile,
};
use crate::models::candidate::{
    ApplicationSubmission, ApplyResponse, BallotCandidate, CandidateList, CandidateStatus,
    ProfilePicture, VoteCountResponse, DEFAULT_PARTY,
};
use crate::models::config::ApiConfig;
use crate::models::envelope::ErrorBody;
use crate::models::voting::{HasVotedResponse, ResultsSnapshot, VoteReceipt, VoteRequest, VotingWindow};
use crate::models::CandidateId;
use crate::services::session::{SessionEnd, SessionStore};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

pub type SharedApi = Arc<dyn VotingApi>;

/// The remote voting service as the views see it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotingApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse>;
    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse>;
    async fn current_user(&self) -> Result<UserProfile>;
    /// Returns the stored picture's URL.
    async fn upload_profile_picture(&self, picture: &ProfilePicture) -> Result<String>;
    async fn candidate_status(&self) -> Result<CandidateStatus>;
    async fn vote_count(&self) -> Result<u64>;
    async fn apply(&self, submission: &ApplicationSubmission) -> Result<ApplyResponse>;
    async fn revoke(&self) -> Result<()>;
    async fn candidates(&self) -> Result<Vec<BallotCandidate>>;
    async fn results(&self) -> Result<ResultsSnapshot>;
    async fn voting_window(&self) -> Result<VotingWindow>;
    async fn has_voted(&self) -> Result<bool>;
    async fn cast_vote(&self, candidate_id: CandidateId) -> Result<VoteReceipt>;
    async fn stats(&self) -> Result<Stats>;
    async fn health(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// `VotingApi` over HTTP. A 401 on any bearer call clears the shared session.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl HttpGateway {
    pub fn new(config: &ApiConfig, session: SessionStore) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn authorize(&self, request: RequestBuilder, auth: Auth) -> Result<RequestBuilder> {
        match auth {
            Auth::None => Ok(request),
            Auth::Bearer => match self.session.token() {
                Some(token) => Ok(request.bearer_auth(token)),
                None => Err(ClientError::Unauthorized("Token is missing".to_string())),
            },
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: Auth,
        fallback: &str,
    ) -> Result<T> {
        let request = self.authorize(request, auth)?;
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let payload = if body.trim().is_empty() { "null" } else { body.as_str() };
            return Ok(serde_json::from_str(payload)?);
        }

        let error = ErrorBody::parse(&body);
        let message = error.message_or(fallback);

        if status == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
            warn!("Unauthorized response, clearing session: {}", message);
            self.session.clear(SessionEnd::Unauthorized);
            return Err(ClientError::Unauthorized(message));
        }

        debug!("Request rejected with {}: {}", status, message);
        Err(ClientError::rejected(status.as_u16(), error.code(), message))
    }
}

fn application_form(submission: &ApplicationSubmission) -> Form {
    let form = &submission.form;
    let party = if form.party.trim().is_empty() {
        DEFAULT_PARTY.to_string()
    } else {
        form.party.clone()
    };

    let mut multipart = Form::new()
        .text("name", form.name.clone())
        .text("dob", form.dob.clone())
        .text("gender", form.gender.clone())
        .text("party", party)
        .text("description", form.description.clone());

    if let Some(picture) = &submission.picture {
        multipart = multipart.part("profile_pic", picture_part(picture));
    }

    multipart
}

fn picture_part(picture: &ProfilePicture) -> Part {
    Part::bytes(picture.bytes.clone()).file_name(picture.file_name.clone())
}

#[async_trait]
impl VotingApi for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse> {
        let req = self.client.post(self.url("/api/auth/login")).json(request);
        self.send(req, Auth::None, "Login failed").await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<TokenResponse> {
        let req = self.client.post(self.url("/api/auth/register")).json(request);
        self.send(req, Auth::None, "Registration failed").await
    }

    async fn current_user(&self) -> Result<UserProfile> {
        let req = self.client.get(self.url("/api/auth/me"));
        self.send(req, Auth::Bearer, "Failed to load user").await
    }

    async fn upload_profile_picture(&self, picture: &ProfilePicture) -> Result<String> {
        let form = Form::new().part("profile_pic", picture_part(picture));
        let req = self
            .client
            .post(self.url("/api/auth/profile/picture"))
            .multipart(form);
        let response: PictureUploadResponse = self.send(req, Auth::Bearer, "Upload failed").await?;
        response
            .profile_pic
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ClientError::rejected(200, None, "Upload failed"))
    }

    async fn candidate_status(&self) -> Result<CandidateStatus> {
        let req = self.client.get(self.url("/api/candidates/status"));
        self.send(req, Auth::Bearer, "Failed to load candidate status").await
    }

    async fn vote_count(&self) -> Result<u64> {
        let req = self.client.get(self.url("/api/candidates/votes"));
        let response: VoteCountResponse = self.send(req, Auth::Bearer, "Failed to load votes").await?;
        Ok(response.vote_count)
    }

    async fn apply(&self, submission: &ApplicationSubmission) -> Result<ApplyResponse> {
        let req = self
            .client
            .post(self.url("/api/candidates/apply"))
            .multipart(application_form(submission));
        self.send(req, Auth::Bearer, "Application failed").await
    }

    async fn revoke(&self) -> Result<()> {
        let req = self.client.post(self.url("/api/candidates/revoke"));
        let _ack: serde_json::Value = self.send(req, Auth::Bearer, "Revoke failed").await?;
        Ok(())
    }

    async fn candidates(&self) -> Result<Vec<BallotCandidate>> {
        let req = self.client.get(self.url("/api/candidates"));
        let list: CandidateList = self.send(req, Auth::Bearer, "Failed to load candidates").await?;
        Ok(list.candidates)
    }

    async fn results(&self) -> Result<ResultsSnapshot> {
        let req = self.client.get(self.url("/api/candidates/results"));
        self.send(req, Auth::Bearer, "Failed to load results").await
    }

    async fn voting_window(&self) -> Result<VotingWindow> {
        let req = self.client.get(self.url("/api/voters/voting-status"));
        self.send(req, Auth::Bearer, "Failed to load voting status").await
    }

    async fn has_voted(&self) -> Result<bool> {
        let req = self.client.get(self.url("/api/voters/status"));
        let response: HasVotedResponse = self.send(req, Auth::Bearer, "Failed to load voter status").await?;
        Ok(response.has_voted)
    }

    async fn cast_vote(&self, candidate_id: CandidateId) -> Result<VoteReceipt> {
        let req = self
            .client
            .post(self.url("/api/voters/vote"))
            .json(&VoteRequest { candidate_id });
        self.send(req, Auth::Bearer, "Failed to cast vote").await
    }

    async fn stats(&self) -> Result<Stats> {
        let req = self.client.get(self.url("/api/stats"));
        self.send(req, Auth::Bearer, "Failed to load stats").await
    }

    async fn health(&self) -> Result<()> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::rejected(status.as_u16(), None, "Server not ready"))
        }
    }
}
