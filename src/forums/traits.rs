use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::models::{ForumSummary, Post};

/// Failures talking to the forum API.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("forum API credentials are not configured (set REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET)")]
    MissingCredentials,
    #[error("forum authentication failed: {0}")]
    Auth(String),
    #[error("unknown or private forum: {0}")]
    UnknownForum(String),
    #[error("forum API rate limit exceeded")]
    RateLimited,
    #[error("forum API returned status {status} for {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("forum API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid forum API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Per-forum outcomes of a multi-forum search, in request order.
pub type ForumResults = Vec<Result<Vec<Post>, ForumError>>;

/// A source of forum posts and forum metadata.
#[async_trait]
pub trait ForumSource: Send + Sync {
    /// Search one forum for posts matching `query`, returning at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the forum does not exist or the API call fails.
    async fn search_posts(
        &self,
        forum: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<Post>, ForumError>;

    /// Search several forums in order, one result per name.
    ///
    /// The outer error is for failures shared by every forum, such as
    /// authentication. Implementations that hold per-run state override this;
    /// the default calls [`ForumSource::search_posts`] for each name.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot start at all.
    async fn search_forums(
        &self,
        forums: &[String],
        query: &str,
        limit: u32,
    ) -> Result<ForumResults, ForumError> {
        let mut results = Vec::with_capacity(forums.len());
        for forum in forums {
            results.push(self.search_posts(forum, query, limit).await);
        }
        Ok(results)
    }

    /// Lazily search forums by name or keyword.
    ///
    /// Candidates are produced one at a time as pages arrive; nothing is
    /// collected up front.
    fn discover<'a>(&'a self, query: &'a str) -> BoxStream<'a, Result<ForumSummary, ForumError>>;
}
