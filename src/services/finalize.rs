//! Finalization sink: hands a completed match off for permanent storage.
//!
//! Called exactly once per match, after its status reaches Finished, never
//! during play. The engine awaits the call so a completed match cannot slip
//! away unrecorded, then forgets the match.

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    scoring::GameVariant,
    state::live_match::{LiveMatch, Participant},
};

/// Summary handed to the downstream record keeper.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    /// Live match identifier (not the permanent record id).
    pub match_id: Uuid,
    /// Variant that was played.
    pub variant: GameVariant,
    /// Per-participant results in play order.
    pub results: Vec<ParticipantResult>,
    /// Winning identity, absent for abandoned matches.
    pub winner_user_id: Option<Uuid>,
    /// Total darts thrown.
    pub throw_count: usize,
}

/// One participant's final standing.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResult {
    /// Identity of the player.
    pub user_id: Uuid,
    /// Display name at match time.
    pub name: String,
    /// Final variant-specific scoring fields.
    #[serde(flatten)]
    pub score: crate::scoring::ScoreState,
}

impl MatchSummary {
    /// Build the summary from a finished match.
    pub fn from_finished(live: &LiveMatch) -> Self {
        let winner_user_id = live
            .winner
            .and_then(|id| live.participants.get(&id))
            .map(|participant: &Participant| participant.user_id);

        Self {
            match_id: live.id,
            variant: live.variant,
            results: live
                .participants
                .values()
                .map(|participant| ParticipantResult {
                    user_id: participant.user_id,
                    name: participant.name.clone(),
                    score: participant.score.clone(),
                })
                .collect(),
            winner_user_id,
            throw_count: live.throws.len(),
        }
    }
}

/// Failure handing the summary downstream.
#[derive(Debug, Error)]
#[error("finalization failed: {message}")]
pub struct FinalizeError {
    /// What went wrong, as reported by the sink.
    pub message: String,
}

/// Abstraction over the permanent record keeper.
pub trait FinalizeSink: Send + Sync {
    /// Deliver the summary; returns the permanent record identifier.
    fn finalize(&self, summary: MatchSummary) -> BoxFuture<'static, Result<Uuid, FinalizeError>>;
}

/// Sink that acknowledges summaries without storing them.
///
/// Used when no downstream record keeper is configured; the match simply
/// ends and its live state is discarded.
#[derive(Debug, Default)]
pub struct NoopFinalizeSink;

impl FinalizeSink for NoopFinalizeSink {
    fn finalize(&self, summary: MatchSummary) -> BoxFuture<'static, Result<Uuid, FinalizeError>> {
        Box::pin(async move {
            tracing::debug!(match_id = %summary.match_id, "finalization sink disabled; dropping summary");
            Ok(Uuid::new_v4())
        })
    }
}

/// Sink that POSTs the summary to a configured HTTP endpoint.
#[cfg(feature = "http-finalizer")]
pub mod http {
    use super::*;

    /// Expected response body from the record keeper.
    #[derive(Debug, serde::Deserialize)]
    struct FinalizeResponse {
        record_id: Uuid,
    }

    /// HTTP implementation of [`FinalizeSink`].
    pub struct HttpFinalizeSink {
        client: reqwest::Client,
        url: String,
    }

    impl HttpFinalizeSink {
        /// Build a sink posting to `url`.
        pub fn new(url: String) -> Self {
            Self {
                client: reqwest::Client::new(),
                url,
            }
        }
    }

    impl FinalizeSink for HttpFinalizeSink {
        fn finalize(
            &self,
            summary: MatchSummary,
        ) -> BoxFuture<'static, Result<Uuid, FinalizeError>> {
            let client = self.client.clone();
            let url = self.url.clone();
            Box::pin(async move {
                let response = client
                    .post(&url)
                    .json(&summary)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|err| FinalizeError {
                        message: err.to_string(),
                    })?;

                let body: FinalizeResponse =
                    response.json().await.map_err(|err| FinalizeError {
                        message: err.to_string(),
                    })?;

                Ok(body.record_id)
            })
        }
    }
}
