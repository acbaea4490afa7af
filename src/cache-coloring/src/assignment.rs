// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The solver's output: the region-to-page-colors mapping and the
//! per-level usage counts the optimizer reports.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::errors::Diagnostic;
use crate::model::{PageColor, RegionId};

/// The immutable, final color assignment.
///
/// `map_pc` is keyed by [`RegionId`], whose `Channel` variant is not a bare
/// string, so `serde` (de)serializes it as a sequence of `(region, colors)`
/// pairs rather than a JSON object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    /// `region -> set<PageColor>`, non-empty per region.
    pub map_pc: BTreeMap<RegionId, BTreeSet<PageColor>>,
    /// Count of distinct `L1(id, cpu)` pairs used across the whole mapping.
    pub l1_count: u32,
    /// Count of distinct `L2(id, cpu)` pairs used across the whole mapping.
    pub l2_count: u32,
    /// Count of distinct `L3(id)` values used across the whole mapping.
    pub l3_count: u32,
    /// Non-fatal observations from validation, carried forward unchanged.
    /// Empty unless [`crate::validate_and_derive`] produced diagnostics for
    /// this input.
    pub diagnostics: Vec<Diagnostic>,
}

impl Assignment {
    /// The stable textual rendering, as a standalone `String` for fixtures
    /// and tooling that want the rendered form without going through
    /// `Display`/`to_string`.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Assignment {
    /// Renders one line per region: `region_name -> {(l1=a@p, l2=b@p,
    /// l3=c), ...}`, sorted by region name and, within each region, by the
    /// `(c, b, a, p)` tuple ([`PageColor`]'s `Ord`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (region, colors) in &self.map_pc {
            write!(f, "{region} -> {{")?;
            for (i, pc) in colors.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(
                    f,
                    "(l1={}@{}, l2={}@{}, l3={})",
                    pc.l1.id, pc.l1.cpu, pc.l2.id, pc.l2.cpu, pc.l3.id
                )?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct AssignmentEntry {
    region: RegionId,
    colors: BTreeSet<PageColor>,
}

impl Serialize for RegionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RegionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_region_id(&raw).ok_or_else(|| de::Error::custom(format!("invalid region id `{raw}`")))
    }
}

/// Parses the canonical `region_name` / `c(from, to)` rendering produced by
/// [`RegionId`]'s `Display` impl back into a [`RegionId`].
fn parse_region_id(raw: &str) -> Option<RegionId> {
    if let Some(inner) = raw.strip_prefix("c(").and_then(|s| s.strip_suffix(')')) {
        let (from, to) = inner.split_once(", ")?;
        Some(RegionId::Channel(from.to_owned(), to.to_owned()))
    } else {
        Some(RegionId::Executor(raw.to_owned()))
    }
}

impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            regions: RegionSeq<'a>,
            l1_count: u32,
            l2_count: u32,
            l3_count: u32,
            diagnostics: &'a [Diagnostic],
        }
        struct RegionSeq<'a>(&'a BTreeMap<RegionId, BTreeSet<PageColor>>);
        impl Serialize for RegionSeq<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
                for (region, colors) in self.0 {
                    seq.serialize_element(&AssignmentEntry {
                        region: region.clone(),
                        colors: colors.clone(),
                    })?;
                }
                seq.end()
            }
        }
        Repr {
            regions: RegionSeq(&self.map_pc),
            l1_count: self.l1_count,
            l2_count: self.l2_count,
            l3_count: self.l3_count,
            diagnostics: &self.diagnostics,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Assignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Repr {
            regions: Vec<AssignmentEntry>,
            l1_count: u32,
            l2_count: u32,
            l3_count: u32,
            diagnostics: Vec<Diagnostic>,
        }
        let repr = Repr::deserialize(deserializer)?;
        let map_pc = repr
            .regions
            .into_iter()
            .map(|entry| (entry.region, entry.colors))
            .collect();
        Ok(Assignment {
            map_pc,
            l1_count: repr.l1_count,
            l2_count: repr.l2_count,
            l3_count: repr.l3_count,
            diagnostics: repr.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CpuId, L1Color, L2Color, L3Color};

    fn sample() -> Assignment {
        let cpu = CpuId("cpu_1".to_owned());
        let mut colors = BTreeSet::new();
        colors.insert(PageColor {
            l1: L1Color { id: 1, cpu: cpu.clone() },
            l2: L2Color { id: 1, cpu: cpu.clone() },
            l3: L3Color { id: 1 },
        });
        let mut map_pc = BTreeMap::new();
        map_pc.insert(RegionId::Executor("k".to_owned()), colors);
        map_pc.insert(
            RegionId::Channel("a".to_owned(), "b".to_owned()),
            BTreeSet::new(),
        );
        Assignment {
            map_pc,
            l1_count: 1,
            l2_count: 1,
            l3_count: 1,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn render_matches_display() {
        let assignment = sample();
        assert_eq!(assignment.render(), assignment.to_string());
    }

    #[test]
    fn renders_sorted_by_region_name() {
        let rendered = sample().render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "c(a, b) -> {}");
        assert_eq!(lines[1], "k -> {(l1=1@cpu_1, l2=1@cpu_1, l3=1)}");
    }

    #[test]
    fn json_round_trips() {
        let assignment = sample();
        let json = serde_json::to_string(&assignment).expect("serialize");
        let back: Assignment = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(assignment, back);
    }

    #[test]
    fn region_id_parses_channel_and_executor() {
        assert_eq!(parse_region_id("k"), Some(RegionId::Executor("k".to_owned())));
        assert_eq!(
            parse_region_id("c(a, b)"),
            Some(RegionId::Channel("a".to_owned(), "b".to_owned()))
        );
    }
}
