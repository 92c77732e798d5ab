//! Grouping of documents into topics.

mod embedding;

pub use embedding::EmbeddingTopicModel;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::models::{ClusterAssignment, ClusterId};

/// Cluster used when clustering is skipped or fails. It is summarized like
/// any other cluster.
pub const CATCH_ALL_CLUSTER: ClusterId = 0;

/// A topic-modelling pipeline: one label per document, `-1` for outliers.
#[async_trait]
pub trait TopicModel: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the pipeline fails.
    async fn fit_transform(&self, documents: &[String]) -> Result<Vec<ClusterId>>;
}

/// Applies the small-batch and failure policy around a [`TopicModel`].
#[derive(Clone)]
pub struct Clusterer {
    model: Arc<dyn TopicModel>,
    min_documents: usize,
}

impl Clusterer {
    #[must_use]
    pub fn new(model: Arc<dyn TopicModel>, min_documents: usize) -> Self {
        Self {
            model,
            min_documents,
        }
    }

    /// Group document indices by topic.
    ///
    /// Never fails: batches below the minimum size, pipeline errors and
    /// malformed pipeline output all produce one cluster holding every
    /// document. Every index appears in exactly one cluster.
    pub async fn cluster(&self, documents: &[String]) -> ClusterAssignment {
        if documents.is_empty() {
            return ClusterAssignment::new();
        }

        if documents.len() < self.min_documents {
            debug!(
                documents = documents.len(),
                min_documents = self.min_documents,
                "Too few documents to cluster"
            );
            return catch_all(documents.len());
        }

        let labels = match self.model.fit_transform(documents).await {
            Ok(labels) => labels,
            Err(e) => {
                warn!("Topic model failed, using a single cluster: {e:#}");
                return catch_all(documents.len());
            }
        };

        if labels.len() != documents.len() {
            warn!(
                labels = labels.len(),
                documents = documents.len(),
                "Topic model returned wrong label count, using a single cluster"
            );
            return catch_all(documents.len());
        }

        let mut assignment = ClusterAssignment::new();
        for (index, label) in labels.into_iter().enumerate() {
            assignment.entry(label).or_default().push(index);
        }
        assignment
    }
}

fn catch_all(len: usize) -> ClusterAssignment {
    ClusterAssignment::from([(CATCH_ALL_CLUSTER, (0..len).collect())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;

    use crate::models::OUTLIER_CLUSTER;

    struct FixedModel {
        labels: Vec<ClusterId>,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(labels: Vec<ClusterId>) -> Self {
            Self {
                labels,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TopicModel for FixedModel {
        async fn fit_transform(&self, _documents: &[String]) -> Result<Vec<ClusterId>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.labels.clone())
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl TopicModel for BrokenModel {
        async fn fit_transform(&self, _documents: &[String]) -> Result<Vec<ClusterId>> {
            bail!("embedding server unreachable")
        }
    }

    fn docs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc {i}")).collect()
    }

    #[tokio::test]
    async fn test_below_threshold_skips_model() {
        let model = Arc::new(FixedModel::new(vec![3, 3, 3]));
        let clusterer = Clusterer::new(model.clone(), 5);

        let assignment = clusterer.cluster(&docs(3)).await;

        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment[&CATCH_ALL_CLUSTER], vec![0, 1, 2]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_error_falls_back_to_single_cluster() {
        let clusterer = Clusterer::new(Arc::new(BrokenModel), 2);
        let assignment = clusterer.cluster(&docs(6)).await;

        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment[&CATCH_ALL_CLUSTER], (0..6).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_wrong_label_count_falls_back() {
        let clusterer = Clusterer::new(Arc::new(FixedModel::new(vec![0, 1])), 2);
        let assignment = clusterer.cluster(&docs(4)).await;
        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment[&CATCH_ALL_CLUSTER].len(), 4);
    }

    #[tokio::test]
    async fn test_labels_map_directly() {
        let clusterer = Clusterer::new(Arc::new(FixedModel::new(vec![1, -1, 0, 1, 0])), 2);
        let assignment = clusterer.cluster(&docs(5)).await;

        assert_eq!(assignment[&0], vec![2, 4]);
        assert_eq!(assignment[&1], vec![0, 3]);
        assert_eq!(assignment[&OUTLIER_CLUSTER], vec![1]);

        let total: usize = assignment.values().map(Vec::len).sum();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_empty_input_yields_no_clusters() {
        let clusterer = Clusterer::new(Arc::new(BrokenModel), 2);
        assert!(clusterer.cluster(&[]).await.is_empty());
    }
}
