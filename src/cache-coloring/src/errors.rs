// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Error and diagnostic types surfaced by the solver.

use std::fmt;

use crate::model::{CpuId, DomainId, RegionId};

/// Errors that reject an [`crate::Input`] before any solving is attempted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An executor (kernel or subject) has no CPU assigned in `ex_cpu`.
    #[error("executor `{0}` has no CPU assignment")]
    MissingExecutorCpu(String),
    /// A CPU has no executor pinned to it.
    #[error("CPU `{0}` has no executor pinned to it")]
    UnusedCpu(CpuId),
    /// A region is not present in `mr_cache_isolation`.
    #[error("region `{0}` has no cache isolation domain assigned")]
    MissingIsolationDomain(RegionId),
    /// A region is mapped to more than one isolation domain.
    #[error("region `{0}` is mapped to more than one cache isolation domain")]
    NonFunctionalIsolation(RegionId),
    /// A declared isolation domain has no members.
    #[error("cache isolation domain `{0}` has no member regions")]
    EmptyIsolationDomain(DomainId),
    /// A name is used for more than one of {kernel, subject, channel-region}.
    #[error("entity id `{0}` is used for more than one kernel/subject/channel")]
    DuplicateEntityId(String),
    /// A channel names an endpoint that is not a declared kernel or subject.
    #[error("channel `({from}, {to})` names an undeclared endpoint `{endpoint}`")]
    UnknownChannelEndpoint {
        /// The channel's `from` endpoint.
        from: String,
        /// The channel's `to` endpoint.
        to: String,
        /// Whichever of `from`/`to` is undeclared.
        endpoint: String,
    },
    /// `n_l1`, `n_l2` or `n_l3` is zero.
    #[error("cache config has a zero-color level: n_l1={n_l1}, n_l2={n_l2}, n_l3={n_l3}")]
    DegenerateCacheConfig {
        /// Configured number of L1 colors.
        n_l1: u32,
        /// Configured number of L2 colors.
        n_l2: u32,
        /// Configured number of L3 colors.
        n_l3: u32,
    },
}

/// Errors returned by [`crate::solve`] and [`crate::solve_cancellable`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The input failed validation; see [`ValidationError`] for the specific kind.
    #[error("input validation failed: {0}")]
    InputValidation(#[from] ValidationError),
    /// The cache-isolation-domain graph demands more L3 colors than are configured.
    #[error(
        "unsatisfiable L3 constraint: domains {domains:?} require {required} disjoint L3 \
         colors but only {available} are configured"
    )]
    UnsatL3 {
        /// The isolation domains competing for L3 colors.
        domains: Vec<DomainId>,
        /// The number of disjoint L3 colors the domains require.
        required: usize,
        /// The number of L3 colors configured (`n_l3`).
        available: u32,
    },
    /// On some CPU, the isolation domains present exceed the configured L2 colors.
    #[error(
        "unsatisfiable L2 constraint on CPU `{cpu}`: domains {domains:?} require \
         {required} disjoint L2 colors but only {available} are configured"
    )]
    UnsatL2 {
        /// The CPU on which the L2 exclusion graph could not be colored.
        cpu: CpuId,
        /// The isolation domains present on that CPU.
        domains: Vec<DomainId>,
        /// The number of disjoint L2 colors the domains require.
        required: usize,
        /// The number of L2 colors configured (`n_l2`).
        available: u32,
    },
    /// Cooperative cancellation was observed.
    #[error("solve cancelled")]
    Cancelled,
}

/// A non-fatal observation about the input, carried alongside a successful
/// [`crate::Assignment`] rather than rejecting the input.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Diagnostic {
    /// An explicit channel-region isolation domain differs from the common
    /// domain of its two endpoints.
    ChannelIsolationMismatch {
        /// The channel's `from` endpoint.
        from: String,
        /// The channel's `to` endpoint.
        to: String,
        /// The domain common to both endpoints.
        endpoints_domain: DomainId,
        /// The domain explicitly assigned to the channel region.
        channel_domain: DomainId,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelIsolationMismatch {
                from,
                to,
                endpoints_domain,
                channel_domain,
            } => write!(
                f,
                "channel `({from}, {to})` is assigned domain {channel_domain} but its \
                 endpoints share domain {endpoints_domain}"
            ),
        }
    }
}
