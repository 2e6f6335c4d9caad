//! AniList adapter.
//!
//! Implements the `aniplan-core` AnimeSource port over the public AniList
//! GraphQL endpoint. Queries are anonymous; no token is sent.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use aniplan_core::{
    anime::{AnimeStatistics, UserPlanningList},
    domain::Username,
    errors::Error,
    source::{AnimeSource, RemoteResult},
    Result,
};

pub mod types;

use types::{GraphQLError, PlanningData, StatsData};

const PLANNING_QUERY: &str = r#"
query ($username: String) {
    MediaListCollection(userName: $username, type: ANIME, status: PLANNING) {
        lists {
            entries {
                media {
                    id
                    title { romaji english native }
                    coverImage { large }
                    genres
                    averageScore
                }
            }
        }
    }
}
"#;

const STATS_QUERY: &str = r#"
query ($username: String) {
    User(name: $username) {
        statistics {
            anime {
                meanScore
                count
                episodesWatched
                minutesWatched
                genres { genre count meanScore }
            }
        }
    }
}
"#;

/// AniList GraphQL API client.
#[derive(Clone, Debug)]
pub struct AniListClient {
    endpoint: String,
    http: reqwest::Client,
}

impl AniListClient {
    /// `timeout: None` leaves requests unbounded.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("aniplan/0.1");
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| Error::External(format!("anilist client build error: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        username: &Username,
    ) -> Result<RemoteResult<T>> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "query": query,
                "variables": { "username": username.as_str() },
            }))
            .send()
            .await
            .map_err(|e| Error::External(format!("anilist request error: {e}")))?;

        // AniList reports unknown users as 404 with a GraphQL `errors` body,
        // so the status alone does not decide success.
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("anilist read error: {e}")))?;
        tracing::debug!(username = %username, %status, bytes = body.len(), "anilist response");

        decode_response(&body).map_err(|e| {
            Error::External(format!(
                "anilist returned {status}: {e}: {}",
                body.chars().take(200).collect::<String>()
            ))
        })
    }
}

/// Decode a GraphQL response body.
///
/// `errors` is checked before `data` is looked at; a response carrying
/// errors is a `Failure` even if it also has partial data.
pub fn decode_response<T: DeserializeOwned>(
    body: &str,
) -> std::result::Result<RemoteResult<T>, serde_json::Error> {
    let mut v: serde_json::Value = serde_json::from_str(body)?;

    if let Some(errors) = v.get("errors").filter(|e| !e.is_null()) {
        return Ok(RemoteResult::Failure(describe_errors(errors)));
    }

    match v.get_mut("data").map(serde_json::Value::take) {
        Some(data) if !data.is_null() => Ok(RemoteResult::Success(serde_json::from_value(data)?)),
        _ => Ok(RemoteResult::Failure("response has no data".to_string())),
    }
}

fn describe_errors(errors: &serde_json::Value) -> String {
    let parsed: Option<Vec<GraphQLError>> = serde_json::from_value(errors.clone()).ok();
    match parsed {
        Some(errs) if !errs.is_empty() => errs
            .iter()
            .map(|e| match e.status {
                Some(s) => format!("{} ({s})", e.message),
                None => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => errors.to_string(),
    }
}

#[async_trait]
impl AnimeSource for AniListClient {
    async fn planning_list(
        &self,
        username: &Username,
    ) -> Result<RemoteResult<Option<UserPlanningList>>> {
        let resp: RemoteResult<PlanningData> = self.graphql(PLANNING_QUERY, username).await?;
        Ok(match resp {
            RemoteResult::Failure(d) => RemoteResult::Failure(d),
            RemoteResult::Success(PlanningData {
                media_list_collection: None,
            }) => RemoteResult::Failure("no media list collection in response".to_string()),
            RemoteResult::Success(PlanningData {
                media_list_collection: Some(c),
            }) => RemoteResult::Success(c.into_planning_list(username)),
        })
    }

    async fn statistics(&self, username: &Username) -> Result<RemoteResult<AnimeStatistics>> {
        let resp: RemoteResult<StatsData> = self.graphql(STATS_QUERY, username).await?;
        Ok(match resp {
            RemoteResult::Failure(d) => RemoteResult::Failure(d),
            RemoteResult::Success(data) => match data
                .user
                .and_then(|u| u.statistics)
                .and_then(|s| s.anime)
            {
                Some(stats) => RemoteResult::Success(stats.into_statistics()),
                None => RemoteResult::Failure(format!("no anime statistics for {username}")),
            },
        })
    }
}
