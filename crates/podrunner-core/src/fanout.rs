//! Fan-out/fan-in over per-container work.

use std::future::Future;

/// A failed member of a fan-out, tagged with its input position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure<E> {
    /// Position of the failed future in the input.
    pub index: usize,
    /// Its error.
    pub error: E,
}

/// Runs every future concurrently and waits for all of them to settle.
///
/// Nothing is cancelled: a failure never short-circuits its siblings.
/// Returns every value in input order when all succeed, otherwise every
/// failure in ascending index order (values of successful siblings are
/// discarded).
///
/// # Errors
///
/// Returns the non-empty list of failures if any future failed.
pub async fn join_settled<I, F, T, E>(futures: I) -> Result<Vec<T>, Vec<StageFailure<E>>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let outcomes = futures::future::join_all(futures).await;
    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => values.push(value),
            Err(error) => failures.push(StageFailure { index, error }),
        }
    }
    if failures.is_empty() {
        Ok(values)
    } else {
        Err(failures)
    }
}
