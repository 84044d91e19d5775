//! Concurrent profile + posts aggregation.
//!
//! Each call fans out to both fetchers as independent Tokio tasks that share
//! one [`CancellationToken`]. The first failure wins: it cancels the token,
//! the surviving task is dropped with the `JoinSet`, and its result is never
//! looked at. A result is only built once both tasks have succeeded.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{AggregateFailure, Source};
use crate::models::{AggregateResult, PostRecord, ProfileRecord, UserId};
use crate::upstream::{PostsFetcher, ProfileFetcher};

/// Output slot of one fetch task.
enum Part {
    Profile(ProfileRecord),
    Posts(Vec<PostRecord>),
}

type PartResult = Result<Part, AggregateFailure>;

/// Fans a user lookup out to the profile and posts fetchers.
#[derive(Clone)]
pub struct Aggregator {
    profiles: Arc<dyn ProfileFetcher>,
    posts: Arc<dyn PostsFetcher>,
    deadline: Duration,
}

impl Aggregator {
    pub fn new(
        profiles: Arc<dyn ProfileFetcher>,
        posts: Arc<dyn PostsFetcher>,
        deadline: Duration,
    ) -> Self {
        Self {
            profiles,
            posts,
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Fetch profile and posts for `id` concurrently and combine them.
    pub async fn aggregate(&self, id: UserId) -> Result<AggregateResult, AggregateFailure> {
        self.aggregate_with_cancel(id, &CancellationToken::new()).await
    }

    /// Same as [`Aggregator::aggregate`], bound to a caller-owned token.
    ///
    /// Cancelling `parent` cancels both fetches and yields
    /// `AggregateFailure::Cancelled`.
    pub async fn aggregate_with_cancel(
        &self,
        id: UserId,
        parent: &CancellationToken,
    ) -> Result<AggregateResult, AggregateFailure> {
        let scope = parent.child_token();
        let mut tasks: JoinSet<PartResult> = JoinSet::new();

        let profiles = Arc::clone(&self.profiles);
        let token = scope.clone();
        tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(AggregateFailure::Cancelled),
                res = profiles.fetch(id) => res
                    .map(Part::Profile)
                    .map_err(|e| AggregateFailure::fetch(Source::Profile, e)),
            }
        });

        let posts = Arc::clone(&self.posts);
        let token = scope.clone();
        tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(AggregateFailure::Cancelled),
                res = posts.fetch(id) => res
                    .map(Part::Posts)
                    .map_err(|e| AggregateFailure::fetch(Source::Posts, e)),
            }
        });

        let outcome = tokio::select! {
            biased;
            _ = parent.cancelled() => Err(AggregateFailure::Cancelled),
            _ = tokio::time::sleep(self.deadline) => {
                Err(AggregateFailure::DeadlineExceeded(self.deadline.as_millis() as u64))
            }
            res = join_parts(id, &mut tasks) => res,
        };

        // Stops whichever task is still running; dropping the set aborts it.
        scope.cancel();
        drop(tasks);

        match &outcome {
            Ok(result) => debug!("Aggregated user {} with {} posts", id, result.posts.len()),
            Err(failure) => warn!("Aggregation for user {} failed: {}", id, failure),
        }

        outcome
    }
}

/// Wait for both slots to fill, returning on the first failure.
async fn join_parts(
    id: UserId,
    tasks: &mut JoinSet<PartResult>,
) -> Result<AggregateResult, AggregateFailure> {
    let mut profile = None;
    let mut posts = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(Part::Profile(p))) => profile = Some(p),
            Ok(Ok(Part::Posts(p))) => posts = Some(p),
            Ok(Err(failure)) => return Err(failure),
            Err(e) => return Err(AggregateFailure::TaskFailed(e.to_string())),
        }
    }

    match (profile, posts) {
        (Some(profile), Some(posts)) => Ok(AggregateResult { id, profile, posts }),
        // Unreachable while both tasks are spawned; kept as an error, not a panic.
        _ => Err(AggregateFailure::TaskFailed(
            "fetch task finished without a result".to_string(),
        )),
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
