// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Entity types shared by every stage of the solver: CPUs, cache isolation
//! domains, memory regions and the three-level cache colors they are
//! assigned.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A CPU identifier, as given by the caller (e.g. `"cpu_1"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct CpuId(pub String);

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CpuId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// An opaque cache isolation domain tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DomainId(pub u32);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a memory region: either an executor's own image, or a
/// channel's shared buffer. Per the external interface, this is
/// `Name | Channel(Name, Name)` — the kernel/subject distinction lives only
/// in the executor sets of [`crate::Input`], not in region identity, since
/// downstream the two behave identically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegionId {
    /// An executor-backed region (a kernel's or a subject's own image).
    Executor(String),
    /// A channel-backed region, identified by its `(from, to)` endpoints.
    Channel(String, String),
}

impl RegionId {
    /// The channel endpoints, if this is a channel-backed region.
    #[must_use]
    pub fn channel_endpoints(&self) -> Option<(&str, &str)> {
        match self {
            Self::Executor(_) => None,
            Self::Channel(from, to) => Some((from.as_str(), to.as_str())),
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executor(name) => write!(f, "{name}"),
            Self::Channel(from, to) => write!(f, "c({from}, {to})"),
        }
    }
}

// Regions are ordered by their canonical display name so that every
// "regions by name" tie-break (determinism, representative selection,
// textual rendering) can just rely on `BTreeMap`/`BTreeSet` iteration
// order.
impl PartialOrd for RegionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for RegionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

/// `n_l1`/`n_l2`/`n_l3` — the number of page colors available at each cache
/// level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Number of L1 colors, CPU-bound.
    pub n_l1: u32,
    /// Number of L2 colors, CPU-bound.
    pub n_l2: u32,
    /// Number of L3 colors, shared across all CPUs.
    pub n_l3: u32,
}

/// A single CPU-bound L1 color.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct L1Color {
    /// The color id, in `1..=n_l1`.
    pub id: u32,
    /// The CPU this L1 cache belongs to.
    pub cpu: CpuId,
}

/// A single CPU-bound L2 color.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct L2Color {
    /// The color id, in `1..=n_l2`.
    pub id: u32,
    /// The CPU this L2 cache belongs to.
    pub cpu: CpuId,
}

/// A single shared L3 color.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct L3Color {
    /// The color id, in `1..=n_l3`.
    pub id: u32,
}

/// A page color: one color per cache level, with the L1 and L2 components
/// bound to the same CPU by construction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageColor {
    /// The L1 component.
    pub l1: L1Color,
    /// The L2 component.
    pub l2: L2Color,
    /// The L3 component.
    pub l3: L3Color,
}

impl PageColor {
    /// Builds a page color `(L1(a,p), L2(b,p), L3(c))`. The single `cpu`
    /// parameter is shared between the L1 and L2 components, so the
    /// `l1.cpu == l2.cpu` invariant cannot be violated by construction.
    #[must_use]
    pub fn new(a: u32, b: u32, c: u32, cpu: CpuId) -> Self {
        Self {
            l1: L1Color { id: a, cpu: cpu.clone() },
            l2: L2Color { id: b, cpu },
            l3: L3Color { id: c },
        }
    }
}

// Ordered by `(l3, l2.id, l1.id, cpu)` to match the canonical rendering
// order: "sorted by region name and by the tuple (c, b, a, p) within each
// region".
impl PartialOrd for PageColor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PageColor {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.l3.id, self.l2.id, self.l1.id, &self.l1.cpu).cmp(&(
            other.l3.id,
            other.l2.id,
            other.l1.id,
            &other.l1.cpu,
        ))
    }
}

/// The validated, derived model handed from the input validator to the
/// solver: every region's CPU footprint and isolation domain, already
/// resolved from the raw [`crate::Input`].
#[derive(Clone, Debug)]
pub struct Model {
    /// Every memory region, in canonical (name) order.
    pub regions: BTreeMap<RegionId, RegionInfo>,
    /// Every declared CPU.
    pub cpus: BTreeSet<CpuId>,
    /// The cache topology.
    pub cache_config: CacheConfig,
}

/// The derived per-region facts the solver needs: `mr_cpu` and
/// `mr_cache_isolation`, after validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionInfo {
    /// `mr_cpu(region)`: the non-empty set of CPUs this region is visible
    /// on.
    pub cpus: BTreeSet<CpuId>,
    /// `mr_cache_isolation(region)`: the region's cache isolation domain.
    pub domain: DomainId,
}

impl Model {
    /// Every distinct isolation domain with at least one member region.
    #[must_use]
    pub fn domains(&self) -> BTreeSet<DomainId> {
        self.regions.values().map(|info| info.domain).collect()
    }

    /// The regions, in canonical order, whose footprint includes `cpu`.
    pub fn regions_on_cpu<'a>(&'a self, cpu: &'a CpuId) -> impl Iterator<Item = &'a RegionId> {
        self.regions
            .iter()
            .filter(move |(_, info)| info.cpus.contains(cpu))
            .map(|(id, _)| id)
    }
}
