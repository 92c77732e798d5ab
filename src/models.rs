//! Records shared by the fetch, cluster and summarize stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{FALLBACK_CATEGORY, FALLBACK_PAIN_POINTS};

/// Cluster label. Opaque beyond grouping.
pub type ClusterId = i32;

/// Label reserved for documents that fit no cluster.
pub const OUTLIER_CLUSTER: ClusterId = -1;

/// Document indices grouped by cluster label.
pub type ClusterAssignment = BTreeMap<ClusterId, Vec<usize>>;

/// A single submission fetched from a subreddit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub subreddit: String,
    pub subreddit_icon: Option<String>,
    pub title: String,
    pub content: String,
    pub url: String,
    pub score: i64,
    pub num_comments: u64,
}

impl Post {
    /// Text handed to clustering and summarization.
    ///
    /// Link posts have an empty body, so the title is always included.
    #[must_use]
    pub fn document(&self) -> String {
        let title = self.title.trim();
        let content = self.content.trim();
        match (title.is_empty(), content.is_empty()) {
            (true, _) => content.to_string(),
            (false, true) => title.to_string(),
            (false, false) => format!("{title}\n{content}"),
        }
    }
}

/// A subreddit returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumSummary {
    /// Reddit fullname, e.g. `t5_2qh0y`.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub subscribers: u64,
    pub url: String,
    pub subreddit_icon: Option<String>,
}

/// Label and pain-point summary for one cluster.
///
/// Both fields are guaranteed non-blank; build through [`CategorySummary::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    category: String,
    pain_points: String,
}

impl CategorySummary {
    /// Returns `None` when either field is empty or whitespace.
    #[must_use]
    pub fn new(category: impl Into<String>, pain_points: impl Into<String>) -> Option<Self> {
        let category = category.into().trim().to_string();
        let pain_points = pain_points.into().trim().to_string();
        if category.is_empty() || pain_points.is_empty() {
            return None;
        }
        Some(Self {
            category,
            pain_points,
        })
    }

    /// Placeholder text for output the model left unusable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            category: FALLBACK_CATEGORY.to_string(),
            pain_points: FALLBACK_PAIN_POINTS.to_string(),
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn pain_points(&self) -> &str {
        &self.pain_points
    }
}

/// Summary plus member posts for one non-outlier cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    pub category: String,
    pub pain_points: String,
    pub posts: Vec<Post>,
}

impl CategoryResult {
    #[must_use]
    pub fn new(summary: CategorySummary, posts: Vec<Post>) -> Self {
        Self {
            category: summary.category,
            pain_points: summary.pain_points,
            posts,
        }
    }
}

/// Response of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub categories: BTreeMap<ClusterId, CategoryResult>,
    /// Every fetched post, outliers included.
    pub total_posts: usize,
}
