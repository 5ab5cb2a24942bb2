//! In-memory extractor with scripted outcomes.
//!
//! Stands in for a real page fetcher in tests and local dry runs. Each URL
//! has a list of outcomes consumed in order; the last one repeats.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{ExtractError, Extractor};
use crate::store::Record;

#[derive(Default)]
pub struct StaticExtractor {
    outcomes: Mutex<HashMap<String, VecDeque<Result<Record, ExtractError>>>>,
    calls: Mutex<Vec<String>>,
    acquire_failures: AtomicUsize,
    acquire_calls: AtomicUsize,
    acquired: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// When set, every extraction waits for a permit.
    gate: Option<Semaphore>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractions block until [`StaticExtractor::allow`] hands out permits.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Queues the next outcome for `url`.
    pub fn push_outcome(&self, url: &str, outcome: Result<Record, ExtractError>) {
        lock(&self.outcomes)
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn succeed(&self, url: &str, record: Record) {
        self.push_outcome(url, Ok(record));
    }

    pub fn fail(&self, url: &str, error: ExtractError) {
        self.push_outcome(url, Err(error));
    }

    /// Makes the next `n` calls to `acquire` fail.
    pub fn fail_next_acquires(&self, n: usize) {
        self.acquire_failures.store(n, Ordering::SeqCst);
    }

    /// Lets `n` gated extractions proceed.
    pub fn allow(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// URLs passed to `extract`, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Highest number of `extract` calls that were ever running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, url: &str) -> Result<Record, ExtractError> {
        let mut outcomes = lock(&self.outcomes);
        match outcomes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(no_script(url))),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| Err(no_script(url))),
            None => Err(no_script(url)),
        }
    }
}

fn no_script(url: &str) -> ExtractError {
    ExtractError::EmptyResult(format!("no scripted outcome for {url}"))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Extractor for StaticExtractor {
    async fn acquire(&self) -> Result<(), ExtractError> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);

        let pending_failures = self.acquire_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.acquire_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(ExtractError::Acquire("browser failed to launch".to_string()));
        }

        self.acquired.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn extract(&self, url: &str) -> Result<Record, ExtractError> {
        lock(&self.calls).push(url.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        // Give any other caller a chance to overlap with this one.
        tokio::task::yield_now().await;
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_outcome(url)
    }

    async fn release(&self) {
        self.acquired.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(title: &str) -> Record {
        let mut record = Record::new();
        record.insert("job_title".to_string(), json!(title));
        record
    }

    #[tokio::test]
    async fn test_outcomes_consumed_in_order_last_repeats() {
        let extractor = StaticExtractor::new();
        extractor.fail(
            "https://a",
            ExtractError::Network("timeout".to_string()),
        );
        extractor.succeed("https://a", record("A"));

        assert!(extractor.extract("https://a").await.is_err());
        assert_eq!(extractor.extract("https://a").await.unwrap(), record("A"));
        assert_eq!(extractor.extract("https://a").await.unwrap(), record("A"));
        assert_eq!(extractor.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_url_fails() {
        let extractor = StaticExtractor::new();
        let result = extractor.extract("https://unknown").await;
        assert!(matches!(result, Err(ExtractError::EmptyResult(_))));
    }

    #[tokio::test]
    async fn test_acquire_failures_then_success() {
        let extractor = StaticExtractor::new();
        extractor.fail_next_acquires(1);

        assert!(extractor.acquire().await.is_err());
        assert!(!extractor.is_acquired());
        assert!(extractor.acquire().await.is_ok());
        assert!(extractor.acquire().await.is_ok());
        assert!(extractor.is_acquired());
        assert_eq!(extractor.acquire_calls(), 3);

        extractor.release().await;
        assert!(!extractor.is_acquired());
    }

    #[tokio::test]
    async fn test_overlapping_calls_are_counted() {
        let extractor = StaticExtractor::new();
        extractor.succeed("https://a", record("A"));
        extractor.succeed("https://b", record("B"));

        let _ = extractor.extract("https://a").await;
        assert_eq!(extractor.max_in_flight(), 1);

        let (a, b) = tokio::join!(extractor.extract("https://a"), extractor.extract("https://b"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(extractor.max_in_flight(), 2);
    }
}
