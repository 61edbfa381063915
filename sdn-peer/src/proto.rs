//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Wire types exchanged between controller processes.
//!
//! These mirror the operations a sector can ask a neighboring sector's
//! controller to perform, but describe entities by stable identifiers
//! rather than by local arena indexes, since an index from one
//! process's topology graph means nothing in another's.

use serde::{Deserialize, Serialize};

use sdn_utils::ids::{ControllerId, GlobalPathSearchId, HashVal, MplsLabelId, ScenarioType};

/// A peer-safe reference to an entity, by the same natural key its
/// owning sector uses to look it up locally.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum EntityKey {
    Host(std::net::Ipv4Addr),
    Switch(u64),
    Sector(ControllerId),
    /// The boundary a sector-crossing request is pinned to, tagged
    /// by the shared [`HashVal`] both ends of the link agree on.
    Boundary(HashVal),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdgeDescriptor {
    pub local: EntityKey,
    pub remote: EntityKey,
    pub hash_val: HashVal,
    pub remaining_bandwidth: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum EntityDescriptor {
    Host { id: std::net::Ipv4Addr, mac: [u8; 6] },
    Switch { id: u64 },
    Sector { controller_id: ControllerId },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActivateScenarioRequest {
    pub search_id: GlobalPathSearchId,
    pub scenario_type: ScenarioType,
    pub origin: ControllerId,
    pub entry_point: EntityKey,
    pub target: EntityKey,
    /// The sector that actually owns `target`. Every hop searches for a
    /// path towards this sector rather than towards `target` directly;
    /// only the owning sector resolves `target` to a concrete local
    /// entity.
    pub target_owner: ControllerId,
    pub bandwidth: f64,
    pub upstream_label: Option<MplsLabelId>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum ActivateScenarioResult {
    /// `q_value` is the Q-value the responder just computed for the
    /// hop it took, carried back so the caller can use it as the
    /// forward term of its own Q-update instead of a locally-guessed
    /// value.
    Activated { path_length: u32, q_value: f64 },
    /// `forward_q` is the best Q-value the responder had registered
    /// towards this target before giving up, carried back so the
    /// caller can penalize the hop it tried with an informed value
    /// instead of a bare zero.
    PathNotFound { forward_q: f64 },
    TaskExists,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TerminateScenarioRequest {
    pub search_id: GlobalPathSearchId,
    pub origin: ControllerId,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum TerminateScenarioResult {
    Terminated,
    NotFound,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Request {
    QuerySectorsIds,
    QueryEdgesToSector { sector: ControllerId },
    QueryEntity { key: EntityKey },
    ActivateScenario(ActivateScenarioRequest),
    TerminateScenario(TerminateScenarioRequest),
    /// Kept for compatibility with peers still speaking the full RPC
    /// set; this controller has no use for the reply.
    ReqLocalTime,
    /// Kept for compatibility; events are not republished to peers.
    PublishEvent { topic: String, payload: Vec<u8> },
    QueryAddressInfo { id: ControllerId },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Reply {
    SectorsIds(Vec<ControllerId>),
    EdgesToSector(Vec<EdgeDescriptor>),
    Entity(Option<EntityDescriptor>),
    ActivateScenario(ActivateScenarioResult),
    TerminateScenario(TerminateScenarioResult),
    LocalTime(u64),
    EventPublished,
    AddressInfo(Option<ControllerAddressInfo>),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ControllerAddressInfo {
    pub ipv4: Option<std::net::Ipv4Addr>,
    pub ipv4_port: Option<u16>,
    pub ipv6: Option<std::net::Ipv6Addr>,
    pub ipv6_port: Option<u16>,
}
