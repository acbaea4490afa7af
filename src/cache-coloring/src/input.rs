// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Input records and the validator/deriver.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::errors::{Diagnostic, ValidationError};
use crate::model::{CacheConfig, CpuId, DomainId, Model, RegionId, RegionInfo};

/// The caller-supplied, pre-validated hardware and workload description.
///
/// `mr_cache_isolation` is a list of `(region, domain)` pairs rather than a
/// map, so that [`RegionId`] (whose `Channel` variant is not a bare string)
/// round-trips through `serde_json` without relying on non-string map keys.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// Names of kernel executors.
    pub kernels: BTreeSet<String>,
    /// Names of subject executors. Disjoint from `kernels`.
    pub subjects: BTreeSet<String>,
    /// Directed `(from, to)` channels between executors.
    pub channels: BTreeSet<(String, String)>,
    /// Every CPU in the system.
    pub cpus: BTreeSet<CpuId>,
    /// `ex_cpu`: the CPU affinity of every executor. Values must be
    /// non-empty.
    pub ex_cpu: BTreeMap<String, BTreeSet<CpuId>>,
    /// Every declared cache isolation domain.
    pub cache_isolation_domains: BTreeSet<DomainId>,
    /// `mr_cache_isolation`: the isolation domain of every region, as
    /// `(region, domain)` pairs.
    pub mr_cache_isolation: Vec<(RegionId, DomainId)>,
    /// The cache topology.
    pub cache_config: CacheConfig,
}

/// Validates `input` and derives the [`Model`] the solver consumes,
/// alongside any non-fatal [`Diagnostic`]s.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, checked in a fixed
/// order (entity-id and channel-endpoint checks first, then executor/CPU
/// totality, then isolation-domain totality and functionality).
#[tracing::instrument(level = "debug", skip(input))]
pub fn validate_and_derive(input: &Input) -> Result<(Model, Vec<Diagnostic>), ValidationError> {
    // Entity ids: kernels and subjects must be disjoint.
    for name in input.kernels.intersection(&input.subjects) {
        warn!(entity = %name, "duplicate entity id across kernels and subjects");
        return Err(ValidationError::DuplicateEntityId(name.clone()));
    }

    // ex_cpu totality over every executor.
    for name in input.kernels.iter().chain(input.subjects.iter()) {
        match input.ex_cpu.get(name) {
            Some(cpus) if !cpus.is_empty() => {}
            _ => return Err(ValidationError::MissingExecutorCpu(name.clone())),
        }
    }

    // Channel endpoints must be declared executors.
    for (from, to) in &input.channels {
        for endpoint in [from, to] {
            if !input.kernels.contains(endpoint) && !input.subjects.contains(endpoint) {
                return Err(ValidationError::UnknownChannelEndpoint {
                    from: from.clone(),
                    to: to.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    // Derive mr_cpu for every region.
    let mut regions: BTreeMap<RegionId, BTreeSet<CpuId>> = BTreeMap::new();
    for name in input.kernels.iter().chain(input.subjects.iter()) {
        regions.insert(RegionId::Executor(name.clone()), input.ex_cpu[name].clone());
    }
    for (from, to) in &input.channels {
        let mut cpus = input.ex_cpu[from].clone();
        cpus.extend(input.ex_cpu[to].iter().cloned());
        regions.insert(RegionId::Channel(from.clone(), to.clone()), cpus);
    }

    // Every CPU must be covered by at least one region.
    for cpu in &input.cpus {
        if !regions.values().any(|cpus| cpus.contains(cpu)) {
            return Err(ValidationError::UnusedCpu(cpu.clone()));
        }
    }

    // mr_cache_isolation totality and functionality.
    let mut domain_of: BTreeMap<RegionId, DomainId> = BTreeMap::new();
    for (region, domain) in &input.mr_cache_isolation {
        match domain_of.get(region) {
            Some(existing) if *existing != *domain => {
                return Err(ValidationError::NonFunctionalIsolation(region.clone()));
            }
            _ => {
                domain_of.insert(region.clone(), *domain);
            }
        }
    }
    for region in regions.keys() {
        if !domain_of.contains_key(region) {
            return Err(ValidationError::MissingIsolationDomain(region.clone()));
        }
    }

    // Declared isolation domains must have at least one member.
    for domain in &input.cache_isolation_domains {
        if !domain_of.values().any(|d| d == domain) {
            return Err(ValidationError::EmptyIsolationDomain(*domain));
        }
    }

    let model_regions: BTreeMap<RegionId, RegionInfo> = regions
        .into_iter()
        .map(|(region, cpus)| {
            let domain = domain_of[&region];
            (region, RegionInfo { cpus, domain })
        })
        .collect();

    let diagnostics = channel_isolation_diagnostics(input, &model_regions);

    // Degenerate input (no regions or no CPUs): cache_config's color counts
    // are irrelevant since nothing needs coloring in the degenerate case.
    if !(model_regions.is_empty() || input.cpus.is_empty())
        && (input.cache_config.n_l1 == 0 || input.cache_config.n_l2 == 0 || input.cache_config.n_l3 == 0)
    {
        return Err(ValidationError::DegenerateCacheConfig {
            n_l1: input.cache_config.n_l1,
            n_l2: input.cache_config.n_l2,
            n_l3: input.cache_config.n_l3,
        });
    }

    debug!(
        regions = model_regions.len(),
        cpus = input.cpus.len(),
        "input validated"
    );

    Ok((
        Model {
            regions: model_regions,
            cpus: input.cpus.clone(),
            cache_config: input.cache_config,
        },
        diagnostics,
    ))
}

/// Flags channel-regions whose explicit isolation domain differs from the
/// common domain of their two endpoints.
fn channel_isolation_diagnostics(
    input: &Input,
    regions: &BTreeMap<RegionId, RegionInfo>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (from, to) in &input.channels {
        let from_domain = regions.get(&RegionId::Executor(from.clone())).map(|i| i.domain);
        let to_domain = regions.get(&RegionId::Executor(to.clone())).map(|i| i.domain);
        let Some(channel_domain) = regions
            .get(&RegionId::Channel(from.clone(), to.clone()))
            .map(|i| i.domain)
        else {
            continue;
        };
        if let (Some(fd), Some(td)) = (from_domain, to_domain) {
            if fd == td && fd != channel_domain {
                diagnostics.push(Diagnostic::ChannelIsolationMismatch {
                    from: from.clone(),
                    to: to.clone(),
                    endpoints_domain: fd,
                    channel_domain,
                });
            }
        }
    }
    diagnostics
}
