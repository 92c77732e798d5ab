//! Ranking of discovered subreddits by popularity.

mod top_k;

pub use top_k::TopK;

use std::collections::HashSet;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::forums::ForumError;
use crate::models::ForumSummary;

/// Keep the `k` most-subscribed forums from a candidate stream.
///
/// Candidates are pulled one at a time. Display names are compared
/// case-insensitively and only the first occurrence of a name is considered.
/// The result is ordered by subscribers descending, then display name.
///
/// If the stream fails after producing candidates, the ranking built so far is
/// returned; a failure before any candidate is returned as an error.
///
/// # Errors
///
/// Returns the stream's error when it fails before yielding anything.
pub async fn select_top_k<S>(candidates: S, k: usize) -> Result<Vec<ForumSummary>, ForumError>
where
    S: Stream<Item = Result<ForumSummary, ForumError>>,
{
    let mut candidates = std::pin::pin!(candidates);
    let mut top = TopK::new(k);
    let mut seen_names = HashSet::new();
    let mut considered = 0usize;

    while let Some(candidate) = candidates.next().await {
        let forum = match candidate {
            Ok(forum) => forum,
            Err(e) if considered > 0 => {
                warn!(considered, "Forum discovery stopped early: {e}");
                break;
            }
            Err(e) => return Err(e),
        };
        considered += 1;

        if !seen_names.insert(forum.display_name.to_lowercase()) {
            continue;
        }
        top.push(forum.subscribers, forum);
    }

    let mut ranked: Vec<ForumSummary> = top.into_sorted_vec().into_iter().map(|(_, f)| f).collect();
    ranked.sort_by(|a, b| {
        b.subscribers
            .cmp(&a.subscribers)
            .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
    });

    debug!(considered, kept = ranked.len(), "Ranked discovered forums");
    Ok(ranked)
}
