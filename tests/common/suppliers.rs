//! Candidate suppliers driven by a fixed script.

use songmatch_server::spotify::{CandidateSong, CandidateSupplier, SupplierError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays `responses` in order, then returns empty batches forever.
pub struct ScriptedSupplier {
    responses: Mutex<VecDeque<Result<Vec<CandidateSong>, SupplierError>>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSupplier {
    pub fn new(responses: Vec<Result<Vec<CandidateSong>, SupplierError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the same batch on every call.
    pub fn repeating(batch: Vec<CandidateSong>, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(batch.clone())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CandidateSupplier for ScriptedSupplier {
    fn fetch(&self, _seed_artists: &[String]) -> Result<Vec<CandidateSong>, SupplierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}
