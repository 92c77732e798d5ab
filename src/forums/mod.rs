//! Forum access: the [`ForumSource`] seam and its Reddit implementation.

mod reddit;
mod traits;

pub use reddit::RedditClient;
pub use traits::{ForumError, ForumResults, ForumSource};

use tracing::{debug, info, warn};

use crate::models::Post;

/// Fetch posts from each named forum, skipping forums that fail.
///
/// Forums are queried in order, one call each. A failure for one forum is
/// logged and does not affect the others; a failure shared by the whole run
/// skips every forum. Names are not de-duplicated.
pub async fn fetch_posts(
    source: &dyn ForumSource,
    forum_names: &[String],
    per_forum_limit: u32,
    query: &str,
) -> Vec<Post> {
    debug!(forums = forum_names.len(), limit = per_forum_limit, "Fetching posts");

    let results = match source
        .search_forums(forum_names, query, per_forum_limit)
        .await
    {
        Ok(results) => results,
        Err(e) => {
            warn!(forums = forum_names.len(), "Skipping all forums: {e}");
            return Vec::new();
        }
    };

    let mut all_posts = Vec::new();
    for (forum, result) in forum_names.iter().zip(results) {
        match result {
            Ok(posts) => {
                debug!(forum = %forum, count = posts.len(), "Fetched posts");
                all_posts.extend(posts);
            }
            Err(e) => {
                warn!(forum = %forum, "Skipping forum: {e}");
            }
        }
    }

    info!(
        forums = forum_names.len(),
        posts = all_posts.len(),
        "Finished fetching posts"
    );

    all_posts
}
