// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The constraint solver and lexicographic optimizer.
//!
//! The L3 and per-CPU L2 exclusion subproblems decompose (distinct
//! isolation domains never need to share a color at either level), so
//! rather than searching the combined space this builds the unique
//! structure that is both minimal-feasible and maximally color-spreading:
//! partition the L3 range across domains, partition each CPU's L2 range
//! across the domains present on it, then let every region claim the full
//! L1 range on each CPU it touches ([`optimizer::build_assignment`]).

mod optimizer;
mod partition;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::assignment::Assignment;
use crate::cancel::CancellationToken;
use crate::errors::SolveError;
use crate::model::{CpuId, DomainId, Model};

/// Solves `model`, running to completion.
#[tracing::instrument(level = "debug", skip(model))]
pub fn solve(model: &Model) -> Result<Assignment, SolveError> {
    solve_cancellable(model, &CancellationToken::new())
}

/// Solves `model`, checking `token` once before L3 partitioning and once
/// per CPU during L2 partitioning.
#[tracing::instrument(level = "debug", skip(model, token))]
pub fn solve_cancellable(model: &Model, token: &CancellationToken) -> Result<Assignment, SolveError> {
    if model.regions.is_empty() || model.cpus.is_empty() {
        debug!("degenerate model, emitting empty assignment");
        return Ok(Assignment {
            map_pc: BTreeMap::new(),
            l1_count: 0,
            l2_count: 0,
            l3_count: 0,
            diagnostics: Vec::new(),
        });
    }

    let domains: Vec<DomainId> = model.domains().into_iter().collect();
    let n_l3 = model.cache_config.n_l3;

    if domains.len() > n_l3 as usize {
        warn!(domains = domains.len(), n_l3, "L3 colors exhausted");
        return Err(SolveError::UnsatL3 {
            domains,
            required: domains.len(),
            available: n_l3,
        });
    }

    if token.is_cancelled() {
        return Err(SolveError::Cancelled);
    }
    let l3_of_domain = partition::distribute(n_l3, &domains).expect("checked above");

    let n_l2 = model.cache_config.n_l2;
    let mut l2_of_domain_cpu: BTreeMap<(DomainId, CpuId), BTreeSet<u32>> = BTreeMap::new();
    for cpu in &model.cpus {
        if token.is_cancelled() {
            return Err(SolveError::Cancelled);
        }

        let domains_on_cpu: Vec<DomainId> = domains_present_on(model, cpu);
        if domains_on_cpu.len() > n_l2 as usize {
            warn!(cpu = %cpu, domains = domains_on_cpu.len(), n_l2, "L2 colors exhausted");
            return Err(SolveError::UnsatL2 {
                cpu: cpu.clone(),
                domains: domains_on_cpu,
                required: domains_on_cpu.len(),
                available: n_l2,
            });
        }

        let dist = partition::distribute(n_l2, &domains_on_cpu).expect("checked above");
        for (domain, colors) in dist {
            l2_of_domain_cpu.insert((domain, cpu.clone()), colors);
        }
    }

    let assignment = optimizer::build_assignment(model, &l3_of_domain, &l2_of_domain_cpu);
    debug!(
        l1_count = assignment.l1_count,
        l2_count = assignment.l2_count,
        l3_count = assignment.l3_count,
        "solved"
    );
    Ok(assignment)
}

/// Every isolation domain with at least one region pinned to `cpu`, in
/// canonical (ascending id) order.
fn domains_present_on(model: &Model, cpu: &CpuId) -> Vec<DomainId> {
    model
        .regions_on_cpu(cpu)
        .map(|region| model.regions[region].domain)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
