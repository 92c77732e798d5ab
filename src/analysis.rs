//! Fetch → cluster → summarize pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::clustering::Clusterer;
use crate::discovery::select_top_k;
use crate::forums::{fetch_posts, ForumError, ForumSource};
use crate::models::{AnalysisResult, CategoryResult, ForumSummary, Post, OUTLIER_CLUSTER};
use crate::summarize::Summarizer;

/// Composes the forum source, clusterer and summarizer.
///
/// One instance is built at startup and shared across requests.
#[derive(Clone)]
pub struct Analyzer {
    source: Arc<dyn ForumSource>,
    clusterer: Clusterer,
    summarizer: Arc<dyn Summarizer>,
    search_query: String,
}

impl Analyzer {
    #[must_use]
    pub fn new(
        source: Arc<dyn ForumSource>,
        clusterer: Clusterer,
        summarizer: Arc<dyn Summarizer>,
        search_query: impl Into<String>,
    ) -> Self {
        Self {
            source,
            clusterer,
            summarizer,
            search_query: search_query.into(),
        }
    }

    /// Analyze pain points across the given subreddits.
    ///
    /// Forums that fail to load and clusters whose summary fails are left out;
    /// `total_posts` still counts every fetched post, outliers included.
    pub async fn analyze(&self, forum_names: &[String], per_forum_limit: u32) -> AnalysisResult {
        info!(
            forums = forum_names.len(),
            per_forum_limit, "Starting analysis"
        );

        let posts = fetch_posts(
            self.source.as_ref(),
            forum_names,
            per_forum_limit,
            &self.search_query,
        )
        .await;
        let documents: Vec<String> = posts.iter().map(Post::document).collect();
        let assignment = self.clusterer.cluster(&documents).await;

        let mut categories = BTreeMap::new();
        for (cluster_id, indices) in assignment {
            if cluster_id == OUTLIER_CLUSTER || indices.is_empty() {
                continue;
            }

            let cluster_documents: Vec<String> =
                indices.iter().map(|&i| documents[i].clone()).collect();

            match self.summarizer.summarize(&cluster_documents).await {
                Ok(summary) => {
                    let cluster_posts = indices.iter().map(|&i| posts[i].clone()).collect();
                    categories.insert(cluster_id, CategoryResult::new(summary, cluster_posts));
                }
                Err(e) => {
                    warn!(cluster = cluster_id, "Dropping cluster, summary failed: {e:#}");
                }
            }
        }

        info!(
            total_posts = posts.len(),
            categories = categories.len(),
            "Analysis complete"
        );

        AnalysisResult {
            categories,
            total_posts: posts.len(),
        }
    }

    /// Find the `limit` most-subscribed subreddits matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails before producing any candidate.
    pub async fn discover(&self, query: &str, limit: usize) -> Result<Vec<ForumSummary>, ForumError> {
        select_top_k(self.source.discover(query), limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use futures_util::stream::{self, BoxStream, StreamExt};

    use crate::clustering::TopicModel;
    use crate::models::{CategorySummary, ClusterId};

    struct StaticSource {
        posts: Vec<Post>,
    }

    #[async_trait]
    impl ForumSource for StaticSource {
        async fn search_posts(
            &self,
            forum: &str,
            _query: &str,
            limit: u32,
        ) -> Result<Vec<Post>, ForumError> {
            Ok(self
                .posts
                .iter()
                .filter(|p| p.subreddit == forum)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        fn discover<'a>(
            &'a self,
            _query: &'a str,
        ) -> BoxStream<'a, Result<ForumSummary, ForumError>> {
            stream::empty().boxed()
        }
    }

    struct FixedModel(Vec<ClusterId>);

    #[async_trait]
    impl TopicModel for FixedModel {
        async fn fit_transform(&self, _documents: &[String]) -> Result<Vec<ClusterId>> {
            Ok(self.0.clone())
        }
    }

    /// Fails for any cluster containing a document with "boom".
    struct RecordingSummarizer {
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, documents: &[String]) -> Result<CategorySummary> {
            self.calls.lock().unwrap().push(documents.to_vec());
            if documents.iter().any(|d| d.contains("boom")) {
                bail!("quota exceeded");
            }
            Ok(CategorySummary::new("Slow app", "Users report lag.").unwrap())
        }
    }

    fn post(forum: &str, title: &str) -> Post {
        Post {
            subreddit: forum.to_string(),
            subreddit_icon: None,
            title: title.to_string(),
            content: String::new(),
            url: format!("https://reddit.com/r/{forum}/{title}"),
            score: 1,
            num_comments: 0,
        }
    }

    fn analyzer(posts: Vec<Post>, labels: Vec<ClusterId>) -> (Analyzer, Arc<RecordingSummarizer>) {
        let summarizer = Arc::new(RecordingSummarizer {
            calls: Mutex::new(Vec::new()),
        });
        let analyzer = Analyzer::new(
            Arc::new(StaticSource { posts }),
            Clusterer::new(Arc::new(FixedModel(labels)), 2),
            summarizer.clone(),
            "q",
        );
        (analyzer, summarizer)
    }

    #[tokio::test]
    async fn test_outliers_and_failed_clusters_are_excluded() {
        let posts = vec![
            post("a", "one"),
            post("a", "two"),
            post("a", "boom"),
            post("a", "three"),
            post("a", "stray"),
        ];
        let (analyzer, summarizer) = analyzer(posts, vec![0, 0, 1, 0, -1]);

        let result = analyzer.analyze(&["a".to_string()], 10).await;

        assert_eq!(result.total_posts, 5);
        assert_eq!(result.categories.len(), 1);
        assert!(!result.categories.contains_key(&-1));
        assert!(!result.categories.contains_key(&1));

        let titles: Vec<_> = result.categories[&0].posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);

        // Outlier bucket is never sent to the model
        assert_eq!(summarizer.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_posts_yields_empty_result() {
        let (analyzer, summarizer) = analyzer(vec![], vec![]);
        let result = analyzer.analyze(&["missing".to_string()], 10).await;

        assert_eq!(result.total_posts, 0);
        assert!(result.categories.is_empty());
        assert!(summarizer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_post_is_summarized_as_catch_all() {
        let (analyzer, _) = analyzer(vec![post("a", "lonely")], vec![-1]);
        let result = analyzer.analyze(&["a".to_string()], 10).await;

        assert_eq!(result.total_posts, 1);
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[&0].posts.len(), 1);
    }
}
