// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use cache_coloring::{solve, CacheConfig, CpuId, DomainId, Input, RegionId};
use proptest::prelude::*;

/// Builds a feasible `Input`: `n_cpus` CPUs, `n_regions` subjects spread
/// round-robin across the CPUs (so every CPU is used), each subject
/// assigned one of `n_domains` isolation domains round-robin. `n_l3` is
/// fixed to `n_domains` and `n_l2` to the worst-case domains-per-CPU, so
/// the generated input is always feasible by construction.
fn build_feasible_input(n_cpus: usize, n_regions: usize, n_domains: usize, n_l1: u32) -> Input {
    let cpus: Vec<CpuId> = (0..n_cpus).map(|i| CpuId(format!("cpu_{i}"))).collect();
    let subjects: Vec<String> = (0..n_regions).map(|i| format!("s{i}")).collect();

    let mut ex_cpu = BTreeMap::new();
    let mut domain_of_region = BTreeMap::new();
    let mut domains_on_cpu: Vec<BTreeSet<DomainId>> = vec![BTreeSet::new(); n_cpus];
    for (i, name) in subjects.iter().enumerate() {
        let cpu = cpus[i % n_cpus].clone();
        let domain = DomainId((i % n_domains) as u32 + 1);
        ex_cpu.insert(name.clone(), [cpu.clone()].into_iter().collect());
        domain_of_region.insert(RegionId::Executor(name.clone()), domain);
        domains_on_cpu[i % n_cpus].insert(domain);
    }

    let n_l3 = n_domains as u32;
    let n_l2 = domains_on_cpu.iter().map(BTreeSet::len).max().unwrap_or(1) as u32;

    Input {
        kernels: BTreeSet::new(),
        subjects: subjects.iter().cloned().collect(),
        channels: BTreeSet::new(),
        cpus: cpus.into_iter().collect(),
        ex_cpu,
        cache_isolation_domains: (1..=n_domains as u32).map(DomainId).collect(),
        mr_cache_isolation: domain_of_region.into_iter().collect(),
        cache_config: CacheConfig { n_l1, n_l2, n_l3 },
    }
}

proptest! {
    /// Invariant 1 & 2: every region has a page color on each CPU it
    /// touches, and every page color's L1/L2 components share one CPU.
    #[test]
    fn coverage_and_cpu_binding(n_cpus in 1usize..=3, n_regions in 1usize..=6, n_domains in 1usize..=3, n_l1 in 1u32..=3) {
        let n_regions = n_regions.max(n_cpus);
        let n_domains = n_domains.min(n_regions);
        let input = build_feasible_input(n_cpus, n_regions, n_domains, n_l1);
        let (model, _) = cache_coloring::validate_and_derive(&input).expect("feasible by construction");
        let assignment = solve(&input).expect("feasible by construction");

        for (region, info) in &model.regions {
            let colors = &assignment.map_pc[region];
            prop_assert!(!colors.is_empty());
            for cpu in &info.cpus {
                prop_assert!(colors.iter().any(|pc| pc.l1.cpu == *cpu && pc.l2.cpu == *cpu));
            }
            for pc in colors {
                prop_assert_eq!(&pc.l1.cpu, &pc.l2.cpu);
            }
        }
    }

    /// Invariant 3 & 4: distinct isolation domains never share an L3 color,
    /// and never share an L2 color on a CPU they both occupy.
    #[test]
    fn exclusion_across_domains(n_cpus in 1usize..=3, n_regions in 1usize..=6, n_domains in 1usize..=3, n_l1 in 1u32..=3) {
        let n_regions = n_regions.max(n_cpus);
        let n_domains = n_domains.min(n_regions);
        let input = build_feasible_input(n_cpus, n_regions, n_domains, n_l1);
        let (model, _) = cache_coloring::validate_and_derive(&input).expect("feasible by construction");
        let assignment = solve(&input).expect("feasible by construction");

        let regions: Vec<_> = model.regions.keys().collect();
        for a in &regions {
            for b in &regions {
                if a == b {
                    continue;
                }
                let (info_a, info_b) = (&model.regions[*a], &model.regions[*b]);
                if info_a.domain == info_b.domain {
                    continue;
                }
                let l3_a: BTreeSet<_> = assignment.map_pc[*a].iter().map(|pc| pc.l3.id).collect();
                let l3_b: BTreeSet<_> = assignment.map_pc[*b].iter().map(|pc| pc.l3.id).collect();
                prop_assert!(l3_a.is_disjoint(&l3_b));

                for cpu in info_a.cpus.intersection(&info_b.cpus) {
                    let l2_a: BTreeSet<_> = assignment.map_pc[*a]
                        .iter()
                        .filter(|pc| pc.l2.cpu == *cpu)
                        .map(|pc| pc.l2.id)
                        .collect();
                    let l2_b: BTreeSet<_> = assignment.map_pc[*b]
                        .iter()
                        .filter(|pc| pc.l2.cpu == *cpu)
                        .map(|pc| pc.l2.id)
                        .collect();
                    prop_assert!(l2_a.is_disjoint(&l2_b));
                }
            }
        }
    }

    /// Invariant 6: increasing a color count never decreases the
    /// corresponding objective count.
    #[test]
    fn monotonicity(n_cpus in 1usize..=3, n_regions in 1usize..=6, n_domains in 1usize..=3, n_l1 in 1u32..=3, extra in 0u32..=3) {
        let n_regions = n_regions.max(n_cpus);
        let n_domains = n_domains.min(n_regions);
        let small = build_feasible_input(n_cpus, n_regions, n_domains, n_l1);
        let mut bigger = small.clone();
        bigger.cache_config.n_l1 += extra;
        bigger.cache_config.n_l2 += extra;
        bigger.cache_config.n_l3 += extra;

        let before = solve(&small).expect("feasible by construction");
        let after = solve(&bigger).expect("feasible by construction");
        prop_assert!(after.l1_count >= before.l1_count);
        prop_assert!(after.l2_count >= before.l2_count);
        prop_assert!(after.l3_count >= before.l3_count);
    }
}

/// Invariant 5: permuting the raw construction order of an equivalent input
/// does not change the objective counts or the resulting mapping, since
/// every set-valued field is a `BTreeSet`/`BTreeMap` and therefore already
/// canonicalizes its own iteration order.
#[test]
fn permutation_invariance() {
    let forward = build_feasible_input(2, 4, 2, 2);

    let mut reversed = forward.clone();
    reversed.subjects = forward.subjects.iter().rev().cloned().collect();
    reversed.cpus = forward.cpus.iter().rev().cloned().collect();
    reversed.mr_cache_isolation = forward.mr_cache_isolation.iter().rev().cloned().collect();

    let a = solve(&forward).expect("feasible");
    let b = solve(&reversed).expect("feasible");
    assert_eq!(a, b);
}
