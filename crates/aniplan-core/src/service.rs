//! Application operations behind the chat commands.

use std::sync::Arc;

use crate::{
    anime::UserPlanningList,
    common::{compute_common, CommonSet},
    config::Config,
    domain::Username,
    errors::Error,
    registry::{RegisterOutcome, RegistryStore, RemoveOutcome},
    source::{AnimeSource, RemoteResult},
    stats::StatsView,
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommonReport {
    /// Identities the command was asked about, in request order.
    pub users: Vec<Username>,
    /// Identities with no planning list; left out of the intersection.
    pub skipped: Vec<Username>,
    pub common: CommonSet,
}

pub struct PlanService {
    cfg: Arc<Config>,
    registry: RegistryStore,
    source: Arc<dyn AnimeSource>,
}

impl PlanService {
    pub fn new(cfg: Arc<Config>, source: Arc<dyn AnimeSource>) -> Self {
        Self {
            registry: RegistryStore::new(cfg.registry_file.clone()),
            cfg,
            source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn registered(&self) -> Result<Vec<Username>> {
        self.registry.load()
    }

    pub fn register(&self, username: &Username) -> Result<RegisterOutcome> {
        self.registry.register(username)
    }

    pub fn remove(&self, username: &Username) -> Result<RemoveOutcome> {
        self.registry.remove(username)
    }

    /// Usernames a `common` run compares.
    ///
    /// An empty request falls back to the whole registry. Fewer than two
    /// effective names is rejected here, before anything is fetched.
    pub fn resolve_identities(&self, requested: &[Username]) -> Result<Vec<Username>> {
        let max = self.cfg.common_max_users;
        if requested.len() > max {
            return Err(Error::TooManyIdentities {
                max,
                found: requested.len(),
            });
        }

        let users = if requested.is_empty() {
            self.registry.load()?
        } else {
            requested.to_vec()
        };

        if users.len() < 2 {
            return Err(Error::InsufficientIdentities { found: users.len() });
        }
        Ok(users)
    }

    /// Fetch every user's planning list (sequentially) and intersect them.
    ///
    /// A service error for any user aborts the whole run. A user with no
    /// planning list at all is skipped instead of forcing an empty result.
    pub async fn find_common(&self, users: &[Username]) -> Result<CommonReport> {
        if users.len() < 2 {
            return Err(Error::InsufficientIdentities { found: users.len() });
        }

        let mut lists: Vec<UserPlanningList> = Vec::with_capacity(users.len());
        let mut skipped = Vec::new();
        for user in users {
            match self.source.planning_list(user).await? {
                RemoteResult::Failure(detail) => {
                    tracing::warn!(username = %user, %detail, "planning list fetch failed");
                    return Err(Error::Remote {
                        username: user.to_string(),
                        detail,
                    });
                }
                RemoteResult::Success(None) => {
                    tracing::info!(username = %user, "no planning list; skipping");
                    skipped.push(user.clone());
                }
                RemoteResult::Success(Some(list)) => {
                    tracing::debug!(username = %user, entries = list.entries.len(), "planning list fetched");
                    lists.push(list);
                }
            }
        }

        let common = compute_common(&lists);
        tracing::info!(
            users = users.len(),
            contributing = lists.len(),
            common = common.len(),
            "computed common planning list"
        );

        Ok(CommonReport {
            users: users.to_vec(),
            skipped,
            common,
        })
    }

    pub async fn fetch_stats(&self, username: &Username) -> Result<StatsView> {
        match self.source.statistics(username).await? {
            RemoteResult::Success(stats) => Ok(StatsView::from_statistics(&stats)),
            RemoteResult::Failure(detail) => {
                tracing::warn!(username = %username, %detail, "statistics fetch failed");
                Err(Error::Remote {
                    username: username.to_string(),
                    detail,
                })
            }
        }
    }
}
