use async_trait::async_trait;

use crate::{
    anime::{AnimeStatistics, UserPlanningList},
    domain::Username,
    Result,
};

/// Outcome of one remote query, decoded at the adapter boundary.
///
/// `Failure` carries the raw error detail from the service (e.g. the GraphQL
/// `errors` array). Transport problems (network, undecodable body) are not a
/// `Failure`; they come back as `Err(Error::External)`.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteResult<T> {
    Success(T),
    Failure(String),
}

/// Hexagonal port for the anime-tracking service.
#[async_trait]
pub trait AnimeSource: Send + Sync {
    /// The user's planning list.
    ///
    /// `Success(None)` means the service returned no planning list at all for
    /// this user, which the common-list command skips.
    async fn planning_list(
        &self,
        username: &Username,
    ) -> Result<RemoteResult<Option<UserPlanningList>>>;

    async fn statistics(&self, username: &Username) -> Result<RemoteResult<AnimeStatistics>>;
}
