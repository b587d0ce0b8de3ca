use crate::error::{ClientError, Result};
use crate::models::candidate::{BallotCandidate, DEFAULT_PARTY};
use crate::models::voting::{ResultsSnapshot, RevokedWinnerInfo, Winner};
use crate::models::{CandidateId, Route};
use crate::services::api::SharedApi;
use crate::services::navigation::Navigator;
use crate::services::session::{SessionEnd, SessionStore};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Share of the vote, rounded to one decimal place. Zero when nobody has voted.
pub fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = votes as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub candidate: BallotCandidate,
    pub percentage: f64,
    pub is_winner: bool,
}

/// Highest count first. Equal counts keep the server's order.
pub fn rank(snapshot: &ResultsSnapshot) -> Vec<ResultRow> {
    let winner_id = finalized_winner(snapshot).map(|w| w.id);

    let mut rows: Vec<ResultRow> = snapshot
        .per_candidate_counts
        .iter()
        .map(|candidate| ResultRow {
            candidate: candidate.clone(),
            percentage: percentage(candidate.vote_count, snapshot.total_votes),
            is_winner: winner_id == Some(candidate.id),
        })
        .collect();

    rows.sort_by(|a, b| b.candidate.vote_count.cmp(&a.candidate.vote_count));
    rows
}

fn finalized_winner(snapshot: &ResultsSnapshot) -> Option<&Winner> {
    if snapshot.is_finalized {
        snapshot.winner.as_ref()
    } else {
        None
    }
}

pub fn tie_summary(winner: &Winner) -> Option<String> {
    if !winner.tie_broken {
        return None;
    }
    Some(format!(
        "Tie broken by {} order among: {}",
        winner.tie_break_method,
        winner.tied_candidate_names.join(", ")
    ))
}

/// A loaded results page. The winner celebration is a one-shot latch.
#[derive(Debug)]
pub struct ResultsView {
    snapshot: ResultsSnapshot,
    rows: Vec<ResultRow>,
    celebrated: AtomicBool,
}

impl ResultsView {
    pub fn new(snapshot: ResultsSnapshot) -> Self {
        let rows = rank(&snapshot);
        Self {
            snapshot,
            rows,
            celebrated: AtomicBool::new(false),
        }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn total_votes(&self) -> u64 {
        self.snapshot.total_votes
    }

    pub fn total_candidates(&self) -> u64 {
        self.snapshot
            .total_candidates
            .unwrap_or(self.snapshot.per_candidate_counts.len() as u64)
    }

    pub fn is_finalized(&self) -> bool {
        self.snapshot.is_finalized
    }

    pub fn voting_status(&self) -> &str {
        &self.snapshot.voting_status
    }

    pub fn winner(&self) -> Option<&Winner> {
        finalized_winner(&self.snapshot)
    }

    pub fn winner_id(&self) -> Option<CandidateId> {
        self.winner().map(|w| w.id)
    }

    pub fn tie_info(&self) -> Option<String> {
        self.winner().and_then(tie_summary)
    }

    pub fn revoked_winner(&self) -> Option<&RevokedWinnerInfo> {
        if self.snapshot.previous_winner_revoked {
            self.snapshot.revoked_winner_info.as_ref()
        } else {
            None
        }
    }

    pub fn revoked_notice(&self) -> Option<String> {
        self.revoked_winner().map(|info| {
            format!(
                "Previous winner {} ({}) withdrew their candidacy. The next highest candidate has been declared the winner.",
                info.name,
                info.party.as_deref().unwrap_or(DEFAULT_PARTY)
            )
        })
    }

    /// Returns the winner the first time a finalized result is seen, then never again.
    pub fn take_celebration(&self) -> Option<&Winner> {
        let winner = self.winner()?;
        if self.celebrated.swap(true, Ordering::SeqCst) {
            return None;
        }
        info!("Celebrating winner {} ({})", winner.name, winner.id);
        Some(winner)
    }
}

/// Single fetch, no retry. A missing or rejected session sends the user to login.
pub async fn load_results(api: &SharedApi, session: &SessionStore, navigator: &Navigator) -> Result<ResultsView> {
    if !session.is_logged_in() {
        navigator.navigate(Route::Login);
        return Err(ClientError::Unauthorized("Please login first".to_string()));
    }

    match api.results().await {
        Ok(snapshot) => Ok(ResultsView::new(snapshot)),
        Err(e) if e.is_unauthorized() => {
            session.clear(SessionEnd::Unauthorized);
            navigator.navigate(Route::Login);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::MockVotingApi;
    use std::sync::Arc;
    use tokio_test::assert_err;

    fn signed_in() -> (SessionStore, Navigator) {
        let session = SessionStore::in_memory();
        session.set("tok");
        (session, Navigator::new())
    }

    fn candidate(id: CandidateId, name: &str, votes: u64) -> BallotCandidate {
        BallotCandidate {
            id,
            name: name.into(),
            party: None,
            date_of_birth: None,
            description: None,
            profile_picture_url: None,
            vote_count: votes,
        }
    }

    fn winner(id: CandidateId, name: &str) -> Winner {
        Winner {
            id,
            name: name.into(),
            party: None,
            vote_count: 5,
            tie_broken: false,
            tied_candidate_names: Vec::new(),
            tie_break_method: String::new(),
        }
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(5, 5), 100.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn ranking_is_stable_descending() {
        let snapshot = ResultsSnapshot {
            per_candidate_counts: vec![
                candidate(1, "Abe", 2),
                candidate(2, "Bea", 5),
                candidate(3, "Cal", 2),
                candidate(4, "Dee", 1),
            ],
            total_votes: 10,
            ..Default::default()
        };
        let ids: Vec<CandidateId> = rank(&snapshot).iter().map(|r| r.candidate.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
        assert_eq!(rank(&snapshot)[0].percentage, 50.0);
    }

    #[test]
    fn winner_only_when_finalized() {
        let mut snapshot = ResultsSnapshot {
            per_candidate_counts: vec![candidate(7, "Gia", 5), candidate(8, "Hal", 3)],
            total_votes: 8,
            winner: Some(winner(7, "Gia")),
            ..Default::default()
        };
        assert!(ResultsView::new(snapshot.clone()).rows().iter().all(|r| !r.is_winner));
        assert!(ResultsView::new(snapshot.clone()).take_celebration().is_none());

        snapshot.is_finalized = true;
        let view = ResultsView::new(snapshot);
        let flagged: Vec<CandidateId> = view.rows().iter().filter(|r| r.is_winner).map(|r| r.candidate.id).collect();
        assert_eq!(flagged, vec![7]);
    }

    #[test]
    fn celebration_fires_once() {
        let view = ResultsView::new(ResultsSnapshot {
            per_candidate_counts: vec![candidate(7, "Gia", 5)],
            total_votes: 5,
            is_finalized: true,
            winner: Some(winner(7, "Gia")),
            ..Default::default()
        });
        assert_eq!(view.take_celebration().map(|w| w.id), Some(7));
        assert!(view.take_celebration().is_none());
        assert!(view.take_celebration().is_none());
    }

    #[test]
    fn tie_and_revocation_text() {
        let mut tied = winner(1, "Abe");
        tied.tie_broken = true;
        tied.tie_break_method = "alphabetical".into();
        tied.tied_candidate_names = vec!["Abe".into(), "Bea".into()];
        assert_eq!(
            tie_summary(&tied).as_deref(),
            Some("Tie broken by alphabetical order among: Abe, Bea")
        );
        assert!(tie_summary(&winner(1, "Abe")).is_none());

        let view = ResultsView::new(ResultsSnapshot {
            is_finalized: true,
            winner: Some(tied),
            previous_winner_revoked: true,
            revoked_winner_info: Some(RevokedWinnerInfo {
                name: "Zed".into(),
                party: None,
                vote_count: 9,
            }),
            ..Default::default()
        });
        assert!(view.tie_info().is_some());
        assert!(view.revoked_notice().unwrap().starts_with("Previous winner Zed (Independent)"));
        assert_eq!(view.total_candidates(), 0);
    }

    #[tokio::test]
    async fn load_is_a_single_fetch() {
        let mut api = MockVotingApi::new();
        api.expect_results()
            .times(1)
            .returning(|| Err(ClientError::rejected(500, None, "Internal Server Error")));
        let api: SharedApi = Arc::new(api);
        let (session, navigator) = signed_in();
        let err = assert_err!(load_results(&api, &session, &navigator).await);
        assert_eq!(err.user_message(), "Internal Server Error");
        assert!(session.is_logged_in());
        assert_eq!(navigator.current(), None);
    }

    #[tokio::test]
    async fn expired_token_redirects_to_login() {
        let mut api = MockVotingApi::new();
        api.expect_results()
            .times(1)
            .returning(|| Err(ClientError::Unauthorized("Token has expired".into())));
        let api: SharedApi = Arc::new(api);
        let (session, navigator) = signed_in();

        let err = assert_err!(load_results(&api, &session, &navigator).await);
        assert!(err.is_unauthorized());
        assert!(!session.is_logged_in());
        assert_eq!(navigator.current(), Some(Route::Login));
    }

    #[tokio::test]
    async fn missing_session_never_fetches() {
        let mut api = MockVotingApi::new();
        api.expect_results().times(0);
        let api: SharedApi = Arc::new(api);
        let session = SessionStore::in_memory();
        let navigator = Navigator::new();

        let err = assert_err!(load_results(&api, &session, &navigator).await);
        assert!(err.is_unauthorized());
        assert_eq!(navigator.current(), Some(Route::Login));
    }

    #[test]
    fn displayed_percentages_sum_to_about_one_hundred() {
        let tallies: [&[u64]; 5] = [&[1, 1, 1], &[1, 2], &[3, 3, 4], &[7, 0, 2, 5], &[1, 1, 1, 1, 1, 1, 1]];
        for counts in tallies {
            let snapshot = ResultsSnapshot {
                per_candidate_counts: counts
                    .iter()
                    .enumerate()
                    .map(|(i, votes)| candidate(i as CandidateId + 1, "C", *votes))
                    .collect(),
                total_votes: counts.iter().sum(),
                ..Default::default()
            };
            let sum: f64 = rank(&snapshot).iter().map(|r| r.percentage).sum();
            // Each row rounds by at most 0.05
            let tolerance = 0.05 * counts.len() as f64 + 1e-9;
            assert!((sum - 100.0).abs() <= tolerance, "{:?} sums to {}", counts, sum);
        }
    }
}
