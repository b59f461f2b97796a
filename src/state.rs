//! Fetch state machine owned by each view
//!
//! A [`FetchSite`] holds one view's [`FetchState`] and controls its fetch
//! lifecycle. Every chain it starts gets a new generation; a result is only
//! applied while its generation is still current, so a superseded chain can
//! never overwrite the state of a newer one regardless of completion order.

use crate::error::ProviderError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lifecycle status of a fetch site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Nothing fetched yet, or the first fetch was cancelled
    Idle,
    /// A chain is in flight
    Loading,
    /// The last settled chain succeeded
    Ready,
    /// The last settled chain failed
    Error,
}

/// What an error does to the last successful value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Keep showing the stale value next to the error
    KeepLastValue,
    /// Drop the value; only the error is shown
    ClearValue,
}

/// Category of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    HttpStatus(u16),
    UnsupportedCurrency,
    MissingRate,
    InvalidResponse,
}

/// Human-readable failure stored in the state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub message: String,
    pub kind: FailureKind,
}

impl FetchFailure {
    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::HttpStatus(404)
    }
}

impl From<&ProviderError> for FetchFailure {
    fn from(err: &ProviderError) -> Self {
        let kind = match err {
            ProviderError::Network(_) => FailureKind::Network,
            ProviderError::HttpStatus { status, .. } => FailureKind::HttpStatus(*status),
            ProviderError::UnsupportedCurrency { .. } => FailureKind::UnsupportedCurrency,
            ProviderError::MissingRate { .. } => FailureKind::MissingRate,
            // Cancellation never reaches the state
            ProviderError::InvalidResponse(_)
            | ProviderError::InvalidUrl(_)
            | ProviderError::Cancelled => {
                FailureKind::InvalidResponse
            }
        };

        Self {
            message: err.to_string(),
            kind,
        }
    }
}

/// Snapshot of one fetch site
///
/// `Loading` and `Error` are exclusive: starting a chain clears the error.
#[derive(Debug)]
pub struct FetchState<T> {
    pub status: FetchStatus,
    /// Last successful value, possibly stale while a refresh is in flight
    pub value: Option<Arc<T>>,
    pub error: Option<FetchFailure>,
    /// When `value` was last replaced
    pub last_updated: Option<DateTime<Utc>>,
    /// Generation of the most recently started chain
    pub generation: u64,
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            value: self.value.clone(),
            error: self.error.clone(),
            last_updated: self.last_updated,
            generation: self.generation,
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            value: None,
            error: None,
            last_updated: None,
            generation: 0,
        }
    }
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Status to fall back to when a chain ends without a result
    fn resting_status(&self) -> FetchStatus {
        if self.value.is_some() {
            FetchStatus::Ready
        } else {
            FetchStatus::Idle
        }
    }
}

/// How a chain ended from the site's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Result stored as the new value
    Applied,
    /// Error stored in the state
    Failed,
    /// Chain was cancelled; state returned to rest untouched
    Cancelled,
    /// A newer chain started first; the result was discarded
    Superseded,
}

/// Fetch lifecycle controller for one view
pub struct FetchSite<T> {
    name: &'static str,
    policy: ErrorPolicy,
    cancel: Mutex<CancellationToken>,
    state: watch::Sender<FetchState<T>>,
}

impl<T: Send + Sync + 'static> FetchSite<T> {
    /// Creates an idle site
    ///
    /// # Arguments
    /// * `name` - Label used in logs
    /// * `policy` - Whether an error clears the last value
    pub fn new(name: &'static str, policy: ErrorPolicy) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            name,
            policy,
            cancel: Mutex::new(CancellationToken::new()),
            state,
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Current state
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Starts a chain, superseding and cancelling any chain in flight
    ///
    /// `fetch` receives the chain's cancellation token and must thread it
    /// through every request it makes.
    pub async fn run<F, Fut>(&self, fetch: F) -> Settled
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let (generation, token) = self.begin();
        self.drive(generation, token, fetch).await
    }

    async fn drive<F, Fut>(&self, generation: u64, token: CancellationToken, fetch: F) -> Settled
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let chain_id = Uuid::new_v4();
        tracing::debug!(site = self.name, %chain_id, generation, "Fetch started");

        let result = fetch(token).await;
        let outcome = self.settle(generation, result);

        tracing::debug!(site = self.name, %chain_id, generation, ?outcome, "Fetch settled");
        outcome
    }

    /// Runs a chain and waits until the site is no longer loading
    ///
    /// When this chain is superseded the returned state is the one left by
    /// whichever chain settled last.
    pub async fn load<F, Fut>(&self, fetch: F) -> FetchState<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.run(fetch).await;
        self.settled().await
    }

    /// Joins the chain in flight, or starts one when the site is at rest
    ///
    /// Unlike [`FetchSite::load`] this never supersedes, so a steady stream
    /// of callers cannot keep the site loading forever.
    pub async fn load_shared<F, Fut>(&self, fetch: F) -> FetchState<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        match self.begin_if_idle() {
            Some((generation, token)) => {
                self.drive(generation, token, fetch).await;
            }
            None => tracing::debug!(site = self.name, "Joining fetch in flight"),
        }
        self.settled().await
    }

    /// Waits for the site to leave the loading state
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Cancels the chain in flight without touching error or value
    pub fn cancel(&self) {
        let token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();

        self.state.send_if_modified(|state| {
            state.generation += 1;
            if state.is_loading() {
                state.status = state.resting_status();
                true
            } else {
                false
            }
        });
        tracing::debug!(site = self.name, "Fetch cancelled");
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        self.begin_locked(&mut slot)
    }

    /// Chains only start under the cancel lock, so two callers cannot both
    /// see the site at rest.
    fn begin_if_idle(&self) -> Option<(u64, CancellationToken)> {
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        let loading = self.state.borrow().is_loading();
        if loading {
            return None;
        }
        Some(self.begin_locked(&mut slot))
    }

    fn begin_locked(&self, slot: &mut CancellationToken) -> (u64, CancellationToken) {
        slot.cancel();
        let token = CancellationToken::new();
        *slot = token.clone();

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.status = FetchStatus::Loading;
            state.error = None;
            generation = state.generation;
        });

        (generation, token)
    }

    fn settle(&self, generation: u64, result: Result<T, ProviderError>) -> Settled {
        let name = self.name;
        let policy = self.policy;
        let mut outcome = Settled::Superseded;

        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }

            match result {
                Ok(value) => {
                    state.status = FetchStatus::Ready;
                    state.value = Some(Arc::new(value));
                    state.error = None;
                    state.last_updated = Some(Utc::now());
                    outcome = Settled::Applied;
                }
                Err(e) if e.is_cancelled() => {
                    state.status = state.resting_status();
                    outcome = Settled::Cancelled;
                }
                Err(e) => {
                    tracing::warn!(site = name, error = %e, "Fetch failed");
                    state.status = FetchStatus::Error;
                    state.error = Some(FetchFailure::from(&e));
                    if policy == ErrorPolicy::ClearValue {
                        state.value = None;
                    }
                    outcome = Settled::Failed;
                }
            }
            true
        });

        outcome
    }
}
