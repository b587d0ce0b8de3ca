use serde::{Deserialize, Serialize};

use super::candidate::BallotCandidate;
use super::{null_as_default, CandidateId};

/// Snapshot of the server's voting hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotingWindow {
    #[serde(default)]
    pub is_open: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(rename = "voting_hours", default, deserialize_with = "null_as_default")]
    pub hours_description: String,
    #[serde(rename = "current_time", default, deserialize_with = "null_as_default")]
    pub server_time: String,
    #[serde(default)]
    pub opens_at: Option<String>,
    #[serde(default)]
    pub closes_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteRequest {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub vote_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HasVotedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_voted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub id: CandidateId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
    #[serde(default)]
    pub tie_broken: bool,
    #[serde(rename = "tied_candidates", default, deserialize_with = "null_as_default")]
    pub tied_candidate_names: Vec<String>,
    #[serde(rename = "tie_breaking_method", default, deserialize_with = "null_as_default")]
    pub tie_break_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevokedWinnerInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsSnapshot {
    #[serde(rename = "results", default, deserialize_with = "null_as_default")]
    pub per_candidate_counts: Vec<BallotCandidate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_votes: u64,
    #[serde(default)]
    pub total_candidates: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_finalized: bool,
    #[serde(default)]
    pub winner: Option<Winner>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub voting_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub previous_winner_revoked: bool,
    #[serde(default)]
    pub revoked_winner_info: Option<RevokedWinnerInfo>,
}
