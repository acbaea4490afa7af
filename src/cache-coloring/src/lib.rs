// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

//! Cache-aware page-coloring assignment for a statically partitioned
//! separation kernel.
//!
//! Given a hardware description (CPUs and the color counts of three cache
//! levels) and a workload description (executors, their CPU affinities,
//! channels between them, and cache isolation domains), [`solve`] computes
//! a mapping from every memory region to a non-empty set of page colors
//! such that regions in different isolation domains never share cache at
//! the levels where that is enforceable, and reports how much of the
//! available color space the assignment uses.
//!
//! Control flow is linear: [`validate_and_derive`] turns an [`Input`] into
//! a [`Model`], then [`solve`] (or [`solve_cancellable`]) turns a `Model`
//! into an [`Assignment`].

mod assignment;
mod cancel;
mod errors;
mod input;
mod model;
mod solver;
mod universe;

pub use assignment::Assignment;
pub use cancel::CancellationToken;
pub use errors::{Diagnostic, SolveError, ValidationError};
pub use input::{validate_and_derive, Input};
pub use model::{CacheConfig, CpuId, DomainId, L1Color, L2Color, L3Color, Model, PageColor, RegionId, RegionInfo};
pub use universe::ColorUniverse;

/// Validates `input`, derives its [`Model`], and solves it in one call.
///
/// Equivalent to [`validate_and_derive`] followed by [`solve`], with the
/// non-fatal diagnostics carried forward into the returned
/// [`Assignment::diagnostics`] rather than discarded.
///
/// # Errors
///
/// Returns [`SolveError::InputValidation`] if `input` fails validation, or
/// [`SolveError::UnsatL3`]/[`SolveError::UnsatL2`] if no assignment
/// satisfies the isolation constraints under the configured color counts.
pub fn solve(input: &Input) -> Result<Assignment, SolveError> {
    let (model, diagnostics) = validate_and_derive(input)?;
    let mut assignment = solver::solve(&model)?;
    assignment.diagnostics = diagnostics;
    Ok(assignment)
}

/// As [`solve`], but checks `token` cooperatively during the search and
/// returns [`SolveError::Cancelled`] as soon as cancellation is observed.
///
/// # Errors
///
/// As [`solve`], plus [`SolveError::Cancelled`].
pub fn solve_cancellable(input: &Input, token: &CancellationToken) -> Result<Assignment, SolveError> {
    let (model, diagnostics) = validate_and_derive(input)?;
    let mut assignment = solver::solve_cancellable(&model, token)?;
    assignment.diagnostics = diagnostics;
    Ok(assignment)
}
