//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== ControllerID =====

/// Globally-unique identifier for a sector's controlling process.
///
/// Assigned once at bootstrap and never reused; two controllers are the
/// same sector iff their IDs compare equal.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ControllerId(Uuid);

impl ControllerId {
    pub fn new() -> ControllerId {
        ControllerId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> ControllerId {
        ControllerId(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ===== GlobalPathSearchId =====

/// Correlates every recursive peer-RPC frame belonging to the same
/// path-activation attempt, across every sector it touches.
///
/// Carries the requesting controller plus the source/target IPv4
/// addresses and scenario type the request was originally made for,
/// exactly the 4-tuple the request is keyed by at its origin.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GlobalPathSearchId {
    source_controller_id: ControllerId,
    source_ipv4: std::net::Ipv4Addr,
    target_ipv4: std::net::Ipv4Addr,
    scenario_type: ScenarioType,
}

impl GlobalPathSearchId {
    pub fn new(
        source_controller_id: ControllerId,
        source_ipv4: std::net::Ipv4Addr,
        target_ipv4: std::net::Ipv4Addr,
        scenario_type: ScenarioType,
    ) -> GlobalPathSearchId {
        GlobalPathSearchId {
            source_controller_id,
            source_ipv4,
            target_ipv4,
            scenario_type,
        }
    }

    pub fn source_controller_id(&self) -> ControllerId {
        self.source_controller_id
    }

    pub fn source_ipv4(&self) -> std::net::Ipv4Addr {
        self.source_ipv4
    }

    pub fn target_ipv4(&self) -> std::net::Ipv4Addr {
        self.target_ipv4
    }

    pub fn scenario_type(&self) -> ScenarioType {
        self.scenario_type
    }
}

impl fmt::Display for GlobalPathSearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}->{}/{}",
            self.source_controller_id, self.source_ipv4, self.target_ipv4, self.scenario_type
        )
    }
}

// ===== HashVal =====

/// Opaque integer identifying a specific switch+port boundary at a
/// sector edge. Sector-to-sector links are provisioned out of band, so
/// both controllers agree on the same tag for their shared edge; a
/// sector with several peering links to the same neighbor uses a
/// distinct tag per link to disambiguate which one a request arrived
/// on.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HashVal(u64);

impl HashVal {
    pub fn new(value: u64) -> HashVal {
        HashVal(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HashVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ===== CookieId =====

/// OpenFlow cookie, unique per switch for the lifetime of the flow it
/// tags. Allocated out of a 64-bit space by [`crate::allocator::CookieAllocator`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CookieId(u64);

impl CookieId {
    pub fn new(value: u64) -> CookieId {
        CookieId(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CookieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ===== MplsLabelId =====

/// 20-bit MPLS label, allocated starting at 16 (0-15 are reserved by
/// convention) by [`crate::allocator::MplsLabelAllocator`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MplsLabelId(u32);

impl MplsLabelId {
    pub const RESERVED_MAX: u32 = 15;
    pub const VALUE_MAX: u32 = (1 << 20) - 1;

    pub fn new(value: u32) -> MplsLabelId {
        debug_assert!(value <= Self::VALUE_MAX);
        MplsLabelId(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MplsLabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ===== ScenarioType =====

/// Distinguishes the families of end-to-end service a path activation
/// request may be requesting.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ScenarioType {
    Icmpv4,
    Ipv4Generic,
    SectorToSectorMpls,
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScenarioType::Icmpv4 => "icmpv4",
            ScenarioType::Ipv4Generic => "ipv4-generic",
            ScenarioType::SectorToSectorMpls => "sector-to-sector-mpls",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_id_roundtrip() {
        let a = ControllerId::new();
        let b = ControllerId::from_uuid(a.as_uuid());
        assert_eq!(a, b);
    }

    #[test]
    fn mpls_label_display() {
        let label = MplsLabelId::new(16);
        assert_eq!(label.to_string(), "16");
    }
}
