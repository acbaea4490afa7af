// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Family construction and L1 spreading.
//!
//! L1 is never constrained across regions (it is CPU-private, and isolation
//! is never enforced cross-region at that level), so every region may
//! legally claim the full `1..=n_l1` range on each of its CPUs. Doing so
//! for every region on every CPU is a single monotone-improving move that
//! reaches the L1 component of the optimum in one step, which is why there
//! is no separate swap/augment loop here: a local optimum under this move
//! set is already a global optimum, so the construction can jump straight
//! to it.

use std::collections::{BTreeMap, BTreeSet};

use crate::assignment::Assignment;
use crate::model::{CpuId, DomainId, Model, PageColor, RegionId};

/// Builds the final [`Assignment`] from the per-domain L3 allocation and
/// the per-`(domain, cpu)` L2 allocation. Every region is given the full
/// cross product of its domain's allocated L3 ids, its domain's allocated
/// L2 ids on each of its CPUs, and the complete `1..=n_l1` range on each of
/// those CPUs.
pub fn build_assignment(
    model: &Model,
    l3_of_domain: &BTreeMap<DomainId, BTreeSet<u32>>,
    l2_of_domain_cpu: &BTreeMap<(DomainId, CpuId), BTreeSet<u32>>,
) -> Assignment {
    let n_l1 = model.cache_config.n_l1;
    let mut map_pc: BTreeMap<RegionId, BTreeSet<PageColor>> = BTreeMap::new();

    for (region_id, info) in &model.regions {
        let l3_ids = &l3_of_domain[&info.domain];
        let mut colors = BTreeSet::new();
        for cpu in &info.cpus {
            let l2_ids = &l2_of_domain_cpu[&(info.domain, cpu.clone())];
            for &c in l3_ids {
                for &b in l2_ids {
                    for a in 1..=n_l1 {
                        colors.insert(PageColor::new(a, b, c, cpu.clone()));
                    }
                }
            }
        }
        map_pc.insert(region_id.clone(), colors);
    }

    let l3_count = map_pc
        .values()
        .flat_map(|colors| colors.iter().map(|pc| pc.l3.id))
        .collect::<BTreeSet<_>>()
        .len() as u32;
    let l2_count = map_pc
        .values()
        .flat_map(|colors| colors.iter().map(|pc| (pc.l2.id, pc.l2.cpu.clone())))
        .collect::<BTreeSet<_>>()
        .len() as u32;
    let l1_count = map_pc
        .values()
        .flat_map(|colors| colors.iter().map(|pc| (pc.l1.id, pc.l1.cpu.clone())))
        .collect::<BTreeSet<_>>()
        .len() as u32;

    Assignment {
        map_pc,
        l1_count,
        l2_count,
        l3_count,
        diagnostics: Vec::new(),
    }
}
