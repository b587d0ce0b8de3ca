use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{null_as_default, CandidateId};

pub const DEFAULT_PARTY: &str = "Independent";

/// The signed-in user's own candidacy as reported by `/api/candidates/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateApplication {
    #[serde(default)]
    pub id: Option<CandidateId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "dob", default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "profile_pic", default)]
    pub profile_picture_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateStatus {
    #[serde(default)]
    pub is_candidate: bool,
    #[serde(default)]
    pub candidate: Option<CandidateApplication>,
}

impl CandidateStatus {
    pub fn not_candidate() -> Self {
        Self::default()
    }

    /// A live candidacy: the only allowed transition is revoke.
    pub fn is_active_candidate(&self) -> bool {
        self.is_candidate && self.candidate.as_ref().map_or(false, |c| c.is_active)
    }
}

/// One row of the ballot or results list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotCandidate {
    pub id: CandidateId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(rename = "dob", default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "profile_pic", default)]
    pub profile_picture_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
}

impl BallotCandidate {
    pub fn party_label(&self) -> &str {
        match self.party.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => DEFAULT_PARTY,
        }
    }

    /// Age in whole calendar years relative to `today`'s year, as shown on the ballot card.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let dob = self.date_of_birth.as_deref().and_then(parse_server_date)?;
        Some(today.year() - dob.year())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<BallotCandidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteCountResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub candidate_id: Option<CandidateId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactivated: bool,
}

/// Editable fields of the candidacy form.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationForm {
    pub name: String,
    /// `yyyy-MM-dd`, empty when not chosen.
    pub dob: String,
    pub gender: String,
    pub party: String,
    pub description: String,
}

impl Default for ApplicationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            dob: String::new(),
            gender: String::new(),
            party: DEFAULT_PARTY.to_string(),
            description: String::new(),
        }
    }
}

impl ApplicationForm {
    /// Pre-fill from the last known application so a re-apply starts from the old values.
    pub fn from_application(application: &CandidateApplication) -> Self {
        Self {
            name: application.name.clone(),
            dob: application
                .date_of_birth
                .as_deref()
                .map(format_date_for_input)
                .unwrap_or_default(),
            gender: application.gender.clone().unwrap_or_default(),
            party: application
                .party
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PARTY.to_string()),
            description: application.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePicture {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything sent to `/api/candidates/apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSubmission {
    pub form: ApplicationForm,
    pub picture: Option<ProfilePicture>,
}

/// Parses the date shapes the backend has been seen to emit.
pub fn parse_server_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
        .or_else(|| DateTime::parse_from_rfc2822(raw).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S GMT")
                .ok()
                .map(|d| d.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|d| d.date())
        })
}

/// Normalises a server date to `yyyy-MM-dd`; unparseable input becomes empty.
pub fn format_date_for_input(raw: &str) -> String {
    parse_server_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
