// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Cooperative cancellation for [`crate::solve_cancellable`].

use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::Arc;

/// A cheap, clonable handle a caller may flag to request early termination
/// of a running [`crate::solve_cancellable`] call. Checked at the start of
/// each isolation-domain group the solver processes (§5): once per domain
/// during L3 partitioning, once per CPU during L2 partitioning and L1
/// spreading.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Flags the token as cancelled. Visible to every clone.
    pub fn cancel(&self) {
        self.0.store(true, SeqCst);
    }

    /// Whether [`Self::cancel`] has been called on this token or a clone of
    /// it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(SeqCst)
    }
}
