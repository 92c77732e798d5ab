use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use hdbscan::{Hdbscan, HdbscanHyperParams};
use tracing::debug;

use super::TopicModel;
use crate::llm::Embedder;
use crate::models::{ClusterId, OUTLIER_CLUSTER};

/// Smallest cluster HDBSCAN can form.
const MIN_CLUSTER_SIZE: usize = 2;

/// Topic model: embed every document and group the vectors with HDBSCAN.
///
/// Points HDBSCAN calls noise, and any group smaller than `min_topic_size`,
/// go to the outlier bucket. Surviving topics are numbered from 0 by
/// descending size.
pub struct EmbeddingTopicModel {
    embedder: Arc<dyn Embedder>,
    min_topic_size: usize,
    min_samples: usize,
}

impl EmbeddingTopicModel {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, min_topic_size: usize, min_samples: usize) -> Self {
        Self {
            embedder,
            min_topic_size: min_topic_size.max(MIN_CLUSTER_SIZE),
            min_samples: min_samples.max(1),
        }
    }
}

#[async_trait]
impl TopicModel for EmbeddingTopicModel {
    async fn fit_transform(&self, documents: &[String]) -> Result<Vec<ClusterId>> {
        let mut vectors = self.embedder.embed(documents).await?;

        let Some(dim) = vectors.first().map(Vec::len) else {
            return Ok(Vec::new());
        };
        if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
            bail!("embeddings have inconsistent or zero dimensions");
        }
        // Unit length makes euclidean distance track cosine similarity
        for v in &mut vectors {
            normalize(v);
        }

        let hyper_params = HdbscanHyperParams::builder()
            .min_cluster_size(self.min_topic_size)
            .min_samples(self.min_samples)
            .build();
        let raw = Hdbscan::new(&vectors, hyper_params)
            .cluster()
            .map_err(|e| anyhow!("HDBSCAN failed: {e:?}"))?;

        let raw: Vec<Option<usize>> = raw
            .into_iter()
            .map(|label| usize::try_from(label).ok())
            .collect();

        let labels = relabel_by_size(&raw, self.min_topic_size);
        debug!(
            documents = documents.len(),
            topics = labels.iter().filter(|&&l| l != OUTLIER_CLUSTER).max().map_or(0, |m| m + 1),
            outliers = labels.iter().filter(|&&l| l == OUTLIER_CLUSTER).count(),
            "Fitted topic model"
        );
        Ok(labels)
    }
}

/// Scale to unit length in place; zero vectors are left alone.
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON || !norm.is_finite() {
        return;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Drop groups smaller than `min_size` to the outlier label and number the
/// rest from 0, largest first (ties by earliest member).
fn relabel_by_size(raw: &[Option<usize>], min_size: usize) -> Vec<ClusterId> {
    let mut groups: HashMap<usize, (usize, usize)> = HashMap::new();
    for (i, label) in raw.iter().enumerate() {
        if let Some(label) = label {
            let entry = groups.entry(*label).or_insert((0, i));
            entry.0 += 1;
        }
    }

    let mut kept: Vec<(usize, usize, usize)> = groups
        .into_iter()
        .filter(|(_, (size, _))| *size >= min_size)
        .map(|(label, (size, first))| (label, size, first))
        .collect();
    kept.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let new_ids: HashMap<usize, ClusterId> = kept
        .iter()
        .enumerate()
        .map(|(rank, (label, _, _))| (*label, rank as ClusterId))
        .collect();

    raw.iter()
        .map(|label| {
            label
                .and_then(|l| new_ids.get(&l).copied())
                .unwrap_or(OUTLIER_CLUSTER)
        })
        .collect()
}
