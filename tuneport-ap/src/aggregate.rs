//! Concurrent fan-out over independent collaborators
//!
//! Runs one operation per collaborator in parallel and folds the answers
//! into a single outcome: all successful lists concatenated, all failures
//! joined into one error. A collaborator that fails or panics never takes the
//! others down with it.

use crate::error::{Error, Result};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Separator between collaborator error messages
pub const ERROR_SEPARATOR: &str = "; ";

/// Merged answer of a fan-out
#[derive(Debug)]
pub struct AggregateOutcome<T> {
    pub results: Vec<T>,
    /// `AggregateFailure` carrying every failure message, if any failed
    pub error: Option<Error>,
}

impl<T> AggregateOutcome<T> {
    /// Some collaborators answered and some failed
    pub fn is_partial(&self) -> bool {
        self.error.is_some() && !self.results.is_empty()
    }

    /// Conservative policy: any failure fails the whole request
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.results),
        }
    }
}

struct Accumulator<T> {
    results: Vec<T>,
    errors: Vec<String>,
}

/// Invoke `operation` once per collaborator, all concurrently
///
/// Results are appended as each call completes, so ordering across
/// collaborators follows completion order while each list keeps its own
/// order.
pub async fn run_concurrent<C, T, E, F, Fut>(
    collaborators: impl IntoIterator<Item = C>,
    operation: F,
) -> AggregateOutcome<T>
where
    C: Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(C) -> Fut,
    Fut: Future<Output = std::result::Result<Vec<T>, E>> + Send + 'static,
{
    let shared = Arc::new(Mutex::new(Accumulator {
        results: Vec::new(),
        errors: Vec::new(),
    }));

    let mut tasks = JoinSet::new();
    for collaborator in collaborators {
        let call = operation(collaborator);
        let shared = Arc::clone(&shared);
        tasks.spawn(async move {
            // Lock only once the call has finished
            let outcome = call.await;
            let mut acc = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match outcome {
                Ok(mut items) => acc.results.append(&mut items),
                Err(e) => acc.errors.push(e.to_string()),
            }
        });
    }

    let invoked = tasks.len();
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Collaborator task failed: {}", e);
            shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .errors
                .push(format!("collaborator task failed: {}", e));
        }
    }

    let mut acc = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let results = std::mem::take(&mut acc.results);
    let errors = std::mem::take(&mut acc.errors);

    debug!(
        collaborators = invoked,
        results = results.len(),
        failures = errors.len(),
        "Concurrent query finished"
    );

    let error = if errors.is_empty() {
        None
    } else {
        Some(Error::AggregateFailure(errors.join(ERROR_SEPARATOR)))
    };

    AggregateOutcome { results, error }
}
