/*!
 * Document summaries.
 *
 * A summary of the whole document is generated once and injected into every
 * section prompt as context. Summaries are cached per document content and
 * context window; concurrent requests for the same key share a single
 * generation.
 */

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::document::checksum::summary_key;
use crate::errors::TranslationError;
use crate::providers::Provider;

use super::attempt::{self, AttemptFailure, LoopFailure, run_attempts};
use super::critic::{Verdict, parse_summary_verdict};
use super::request::DocumentContext;

/// Summary cache with at-most-once computation per key
#[derive(Debug, Default)]
pub struct SummaryCache {
    /// One cell per key; the cell is filled by the first caller
    entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
    /// Lookups answered from the cache
    hits: AtomicUsize,
    /// Lookups that had to generate
    misses: AtomicUsize,
}

impl SummaryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or compute it with `init`.
    ///
    /// Concurrent callers for the same key wait for the first one. A failed
    /// computation leaves the key empty so a later call can try again.
    pub async fn get_or_try_init<F, Fut>(&self, key: &str, init: F) -> Result<String, TranslationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, TranslationError>>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(key.to_string()).or_default())
        };

        if let Some(value) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Summary cache hit for {}", &key[..key.len().min(12)]);
            return Ok(value.clone());
        }

        let mut computed = false;
        let value = cell
            .get_or_try_init(|| {
                computed = true;
                init()
            })
            .await?;

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value.clone())
    }

    /// Cached value for `key`, if any
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).and_then(|cell| cell.get().cloned())
    }

    /// Number of keys with a value
    pub fn len(&self) -> usize {
        self.entries.lock().values().filter(|cell| cell.initialized()).count()
    }

    /// Whether no summary is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit and miss counters
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    /// Drop every cached summary
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Generate (or fetch from cache) the summary of `document`.
///
/// With `review` the summary critic must approve the summary; rejected
/// summaries are regenerated with the critique until the budget runs out.
pub(crate) async fn summarize(
    provider: &dyn Provider,
    context: &DocumentContext,
    document: &str,
    review: bool,
    max_attempts: usize,
    cache: &SummaryCache,
    cancel: &CancellationToken,
) -> Result<String, TranslationError> {
    let key = summary_key(document, context.context_window);

    cache
        .get_or_try_init(&key, || async {
            info!("Generating document summary");
            let accepted = run_attempts("Summary", max_attempts, cancel, |_, critique| async move {
                let request = context.summary_worker(document, critique.as_deref());
                let summary = attempt::generate(provider, &request, cancel).await?;
                let summary = summary.trim().to_string();
                if summary.is_empty() {
                    return Err(AttemptFailure::Malformed("the summary was empty".to_string()));
                }

                if review {
                    let request = context.summary_critic(document, &summary);
                    let reply = attempt::generate(provider, &request, cancel).await?;
                    if let Verdict::Rejected(critique) = parse_summary_verdict(&reply) {
                        return Err(AttemptFailure::Rejected(critique));
                    }
                }

                Ok(summary)
            })
            .await
            .map_err(|failure| match failure {
                LoopFailure::Exhausted { attempts } => TranslationError::SummaryExhausted { attempts },
                LoopFailure::Cancelled => TranslationError::Cancelled,
            })?;

            debug!("Summary accepted after {} attempt(s)", accepted.attempts);
            Ok(accepted.value)
        })
        .await
}
