//! Ordered parallel sample loading.
//!
//! Series are decoded on tokio's blocking pool with at most `workers` loads
//! in flight. Samples are yielded strictly in dataset order regardless of
//! which load finishes first.

use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use tracing::debug;

use crate::dataset::{Sample, SampleSource};
use crate::error::DatasetError;

/// Prefetching loader over a [`SampleSource`] (batch size 1, no shuffling).
#[derive(Clone)]
pub struct SampleLoader {
    source: Arc<dyn SampleSource>,
    workers: usize,
}

impl SampleLoader {
    /// `workers` is clamped to at least 1.
    pub fn new(source: Arc<dyn SampleSource>, workers: usize) -> Self {
        Self {
            source,
            workers: workers.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Stream every sample in order. A failed load is yielded as an error
    /// item in that sample's position.
    pub fn stream(&self) -> impl Stream<Item = Result<Sample, DatasetError>> + Send + 'static {
        let source = Arc::clone(&self.source);
        let len = source.len();
        debug!(samples = len, workers = self.workers, "starting sample loader");

        stream::iter(0..len)
            .map(move |index| {
                let source = Arc::clone(&source);
                async move {
                    tokio::task::spawn_blocking(move || source.load(index))
                        .await
                        .map_err(|e| DatasetError::Worker(e.to_string()))?
                }
            })
            .buffered(self.workers)
    }
}
