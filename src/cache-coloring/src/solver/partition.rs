// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Distribution of a contiguous color range across a set of groups such
//! that every group receives at least one color and the groups partition
//! the range disjointly.

use std::collections::{BTreeMap, BTreeSet};

/// Distributes `1..=n_colors` across `groups` (given in canonical order)
/// such that:
/// - every group receives at least one color,
/// - every color is assigned to exactly one group,
/// - leftover colors (beyond one-per-group) are handed out round-robin in
///   group order, so the distribution is even and deterministic.
///
/// Returns `None` if `groups` is empty and `n_colors > 0`, or if there are
/// more groups than colors (the caller is expected to have already checked
/// `groups.len() <= n_colors as usize`).
#[must_use]
pub fn distribute<G: Ord + Clone>(n_colors: u32, groups: &[G]) -> Option<BTreeMap<G, BTreeSet<u32>>> {
    if groups.is_empty() {
        return if n_colors == 0 { Some(BTreeMap::new()) } else { None };
    }
    let k = groups.len();
    if (n_colors as usize) < k {
        return None;
    }

    let mut out: BTreeMap<G, BTreeSet<u32>> = groups.iter().cloned().map(|g| (g, BTreeSet::new())).collect();

    for (i, group) in groups.iter().enumerate() {
        let color = (i + 1) as u32;
        out.get_mut(group).expect("group present").insert(color);
    }
    for color in (k as u32 + 1)..=n_colors {
        let idx = ((color - 1) as usize) % k;
        out.get_mut(&groups[idx]).expect("group present").insert(color);
    }

    Some(out)
}
