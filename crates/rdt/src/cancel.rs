//! Cooperative stop signalling for the engine loop.
//!
//! Setting the flag is a request, not an interrupt: the engine keeps
//! draining its send buffer until it is empty before it actually exits (see
//! [`crate::engine::Engine::run`]).

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Clone)]
pub(crate) struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub(crate) fn requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn request(&self) {
        self.0.store(true, Ordering::Release);
    }
}
