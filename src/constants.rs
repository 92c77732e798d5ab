//! Shared constants used across the application.

/// User agent sent to Reddit when `REDDIT_USER_AGENT` is unset.
///
/// Reddit throttles generic agents aggressively, so deployments should set
/// their own.
pub const DEFAULT_USER_AGENT: &str = "web app by /u/default";

/// Search query used to pull complaint-like posts from each subreddit.
pub const DEFAULT_SEARCH_QUERY: &str = "complain OR issue OR problem";

/// Default posts fetched per subreddit by `/analyze`.
pub const DEFAULT_SEARCH_LIMIT: u32 = 30;

/// Default number of subreddits returned by `/search-subreddits`.
pub const DEFAULT_DISCOVERY_LIMIT: usize = 20;

/// Page size used when paging Reddit's subreddit search.
pub const DISCOVERY_PAGE_SIZE: u32 = 100;

/// Category label used when the model output has none.
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// Summary used when the model output has none.
pub const FALLBACK_PAIN_POINTS: &str = "No clear pain points identified.";
