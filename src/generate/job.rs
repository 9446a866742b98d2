use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::foundation::core::BoundingBox;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::raster::RasterImage;

/// Shared cancellation flag for one generation. Clones control the same flag, and
/// [`CancelToken::cancelled`] wakes every waiter when it is set.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<CancelState>);

#[derive(Debug, Default)]
struct CancelState {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.flag.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.flag.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled; immediately if it already is.
    pub async fn cancelled(&self) {
        let notified = self.0.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel cannot be missed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Whether both handles control the same flag.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Rasterized inputs plus an instruction for the external image generator.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub instruction: String,
    pub images: Vec<RasterImage>,
}

/// One image returned by the generator, as encoded bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// Settings that produced the image, embedded into exports when present.
    pub metadata: Option<serde_json::Value>,
}

/// External image-generation service.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> ComposerResult<Vec<GeneratedImage>>;
}

/// A prepared generation: its requests, its cancellation token, and where results land.
#[derive(Clone, Debug)]
pub struct GenerationJob {
    pub token: CancelToken,
    /// One request, or one per source layer in batch mode.
    pub requests: Vec<GenerationRequest>,
    /// Box of the source layers; results are centered on it. `None` centers on the canvas.
    pub anchor: Option<BoundingBox>,
}

impl GenerationJob {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Issue every request of `job` concurrently and join them all-or-nothing.
///
/// Any failed request fails the job; the successes of that batch are logged and dropped.
/// A job cancelled before or during the run yields [`ComposerError::Cancelled`] as soon as the
/// token fires: the outstanding generator futures are dropped, which aborts their requests.
#[tracing::instrument(skip(generator, job), fields(requests = job.requests.len()))]
pub async fn run_job(
    generator: &dyn ImageGenerator,
    job: &GenerationJob,
) -> ComposerResult<Vec<GeneratedImage>> {
    if job.is_cancelled() {
        return Err(ComposerError::Cancelled);
    }

    let all = futures::future::join_all(
        job.requests
            .iter()
            .cloned()
            .map(|req| generator.generate(req)),
    );
    let results = tokio::select! {
        biased;
        () = job.token.cancelled() => {
            tracing::warn!(requests = job.requests.len(), "generation cancelled in flight");
            return Err(ComposerError::Cancelled);
        }
        results = all => results,
    };

    let mut images = Vec::new();
    let mut first_err = None;
    let mut failed = 0usize;
    for (i, res) in results.into_iter().enumerate() {
        match res {
            Ok(mut out) => images.append(&mut out),
            Err(e) => {
                tracing::warn!(request = i, error = %e, "generation request failed");
                failed += 1;
                first_err.get_or_insert(e);
            }
        }
    }

    if job.is_cancelled() {
        tracing::warn!(discarded = images.len(), "generation cancelled; discarding results");
        return Err(ComposerError::Cancelled);
    }
    if let Some(e) = first_err {
        tracing::warn!(
            failed,
            discarded = images.len(),
            "batch failed; no results will be added"
        );
        return Err(e);
    }
    Ok(images)
}

#[cfg(test)]
#[path = "../../tests/unit/generate/job.rs"]
mod tests;
