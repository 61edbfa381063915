//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! The recursive path-activation state machine: given a request to
//! reach some target owned by a (possibly distant) sector, either
//! serve it locally or extend it one hop further through a
//! Q-learning-guided neighbor and recurse.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use sdn_peer::proto::{
    ActivateScenarioRequest, ActivateScenarioResult, EdgeDescriptor, EntityDescriptor, EntityKey,
    TerminateScenarioRequest, TerminateScenarioResult,
};
use sdn_peer::{PeerHandler, PeerProxy};
use sdn_qlearn::QKey;
use sdn_scenario::ActiveScenario;
use sdn_services::southbound::SouthboundTx;
use sdn_topology::{Entity, EntityIndex, PortId, SwitchId, Topology};
use sdn_utils::ids::{ControllerId, MplsLabelId, ScenarioType};

use crate::central_registry::CentralRegistryClient;
use crate::error::Error;
use crate::state::ControllerState;

/// A boundary switch+port pairing with a neighboring sector, ready to
/// be tried as the next hop of a recursive activation.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    local_entity: EntityIndex,
    switch_id: SwitchId,
    port: PortId,
    neighbor: ControllerId,
    hash_val: sdn_utils::ids::HashVal,
}

pub struct Engine {
    state: ControllerState,
    southbound: Arc<dyn SouthboundTx>,
    central_registry: Arc<dyn CentralRegistryClient>,
    peers: Mutex<HashMap<ControllerId, Arc<PeerProxy>>>,
}

impl Engine {
    pub fn new(
        state: ControllerState,
        southbound: Arc<dyn SouthboundTx>,
        central_registry: Arc<dyn CentralRegistryClient>,
    ) -> Engine {
        Engine {
            state,
            southbound,
            central_registry,
            peers: Mutex::new(HashMap::new()),
        }
    }

    pub fn local_id(&self) -> ControllerId {
        self.state.local_id
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    async fn peer(&self, id: ControllerId) -> Result<Arc<PeerProxy>, Error> {
        if let Some(proxy) = self.peers.lock().unwrap().get(&id) {
            return Ok(proxy.clone());
        }

        let address = self
            .central_registry
            .query_controller_info(id)
            .await
            .map_err(|_| Error::InvalidArgument(format!("unknown controller {id}")))?;
        let (ipv4, port) = address
            .ipv4
            .zip(address.ipv4_port)
            .ok_or_else(|| Error::InvalidArgument(format!("controller {id} has no IPv4 address on record")))?;

        let proxy = Arc::new(PeerProxy::new(SocketAddr::from((ipv4, port))));
        self.peers.lock().unwrap().insert(id, proxy.clone());
        Ok(proxy)
    }

    pub async fn activate_scenario_entry(
        &self,
        request: ActivateScenarioRequest,
    ) -> ActivateScenarioResult {
        match self.try_activate_scenario(request).await {
            Ok(result) => result,
            Err(error) => {
                error.log();
                ActivateScenarioResult::PathNotFound { forward_q: 0.0 }
            }
        }
    }

    async fn try_activate_scenario(
        &self,
        request: ActivateScenarioRequest,
    ) -> Result<ActivateScenarioResult, Error> {
        if request.search_id.source_controller_id() == self.state.local_id {
            debug!(search_id = %request.search_id, "loop detected, refusing activation");
            return Ok(ActivateScenarioResult::PathNotFound { forward_q: 0.0 });
        }
        if self
            .state
            .scenarios
            .lock()
            .unwrap()
            .is_scenario_active(request.search_id)
        {
            return Ok(ActivateScenarioResult::PathNotFound { forward_q: 0.0 });
        }

        let token = match self
            .state
            .scenarios
            .lock()
            .unwrap()
            .begin_implementation(request.search_id)
        {
            Ok(token) => token,
            Err(_) => return Ok(ActivateScenarioResult::TaskExists),
        };

        let result = if request.target_owner == self.state.local_id {
            self.activate_target_in_sector(&request).await
        } else {
            self.activate_forward(&request).await
        };

        drop(token);
        result
    }

    async fn activate_target_in_sector(
        &self,
        request: &ActivateScenarioRequest,
    ) -> Result<ActivateScenarioResult, Error> {
        let entry_idx = resolve_entity(&self.state.topology.lock().unwrap(), request.entry_point)
            .ok_or_else(|| Error::InvalidArgument("unknown entry point".to_string()))?;
        let target_idx = resolve_entity(&self.state.topology.lock().unwrap(), request.target)
            .ok_or_else(|| Error::InvalidArgument("unknown target".to_string()))?;

        let bandwidth = request.bandwidth;
        let path = {
            let topology = self.state.topology.lock().unwrap();
            if request.scenario_type == ScenarioType::Icmpv4 {
                topology.construct_bidirectional_path(entry_idx, target_idx, bandwidth)
            } else {
                topology.construct_unidirectional_path(entry_idx, target_idx, bandwidth)
            }?
        };

        let handles = self.install_path(request, &path).await?;
        self.state
            .topology
            .lock()
            .unwrap()
            .allocate_bandwidth(&path, bandwidth)?;

        self.state.scenarios.lock().unwrap().set_active_scenario(
            request.search_id,
            ActiveScenario {
                refcount: 1,
                downstream: None,
                handles,
                mpls_label: None,
                reserved_path: Some((path.clone(), bandwidth)),
            },
        );

        info!(search_id = %request.search_id, path_length = path.length(), "scenario activated locally");
        Ok(ActivateScenarioResult::Activated {
            path_length: path.length() as u32,
            // The target sector makes no forwarding decision of its
            // own, so there is no Q-update here; the original reports
            // a fixed value of 1 for this leaf case.
            q_value: 1.0,
        })
    }

    async fn activate_forward(
        &self,
        request: &ActivateScenarioRequest,
    ) -> Result<ActivateScenarioResult, Error> {
        let adjacents: Vec<ControllerId> = {
            let topology = self.state.topology.lock().unwrap();
            topology
                .query_sectors_ids()
                .filter(|id| *id != request.origin)
                .collect()
        };
        if adjacents.is_empty() {
            return Ok(ActivateScenarioResult::PathNotFound { forward_q: 0.0 });
        }

        let mut candidates = self.gather_candidates(request, &adjacents);
        let bandwidth = request.bandwidth;

        loop {
            if candidates.is_empty() {
                let forward_q = self.state.qlearn.lock().unwrap().best_qvalue(request.target_owner);
                return Ok(ActivateScenarioResult::PathNotFound { forward_q });
            }

            let chosen = self.select_candidate(request.target_owner, &candidates);
            let candidate = candidates[chosen];

            let entry_idx =
                resolve_entity(&self.state.topology.lock().unwrap(), request.entry_point)
                    .ok_or_else(|| Error::InvalidArgument("unknown entry point".to_string()))?;

            let path = {
                let topology = self.state.topology.lock().unwrap();
                if request.scenario_type == ScenarioType::Icmpv4 {
                    topology.construct_bidirectional_path(entry_idx, candidate.local_entity, bandwidth)
                } else {
                    topology.construct_unidirectional_path(entry_idx, candidate.local_entity, bandwidth)
                }
            };
            let path = match path {
                Ok(path) => path,
                Err(_) => {
                    candidates.remove(chosen);
                    continue;
                }
            };

            let local_label = self.maybe_allocate_label(&path)?;

            let peer_request = ActivateScenarioRequest {
                search_id: request.search_id,
                scenario_type: request.scenario_type,
                origin: self.state.local_id,
                entry_point: EntityKey::Boundary(candidate.hash_val),
                target: request.target,
                target_owner: request.target_owner,
                bandwidth: request.bandwidth,
                upstream_label: local_label,
            };

            let peer_result = self.call_peer_activate(candidate.neighbor, &peer_request).await;

            match peer_result {
                Ok(ActivateScenarioResult::Activated {
                    path_length: peer_length,
                    q_value: forward_q_value,
                }) => {
                    let total_length = (path.length() as u32 + peer_length).saturating_sub(1);
                    let action = QKey::Link(candidate.switch_id, candidate.port);

                    let mut qlearn = self.state.qlearn.lock().unwrap();
                    qlearn.record_path_length(request.target_owner, action, peer_length);
                    let kspl = qlearn
                        .kspl(request.target_owner, action)
                        .unwrap_or(1)
                        .max(1) as f64;
                    let reward = path.remaining_bandwidth_average() / kspl;
                    qlearn.update(request.target_owner, action, reward, forward_q_value);
                    let new_q_value = qlearn.qvalue(request.target_owner, action);
                    drop(qlearn);

                    let handles = self
                        .install_forward_hop(request, &path, local_label, &candidate)
                        .await?;
                    self.state
                        .topology
                        .lock()
                        .unwrap()
                        .allocate_bandwidth(&path, bandwidth)?;

                    self.state.scenarios.lock().unwrap().set_active_scenario(
                        request.search_id,
                        ActiveScenario {
                            refcount: 1,
                            downstream: Some(candidate.neighbor),
                            handles,
                            mpls_label: local_label.map(|l| (l, self.state.mpls_alloc.clone())),
                            reserved_path: Some((path.clone(), bandwidth)),
                        },
                    );

                    return Ok(ActivateScenarioResult::Activated {
                        path_length: total_length,
                        q_value: new_q_value,
                    });
                }
                Ok(ActivateScenarioResult::PathNotFound { forward_q }) => {
                    if let Some(label) = local_label {
                        let _ = self.state.mpls_alloc.free(label);
                    }
                    let penalty_key = if request.target_owner == candidate.neighbor {
                        // Deliberate asymmetry preserved from the
                        // original controller: a failure against the
                        // directly-adjacent owner of the target
                        // penalizes the sector-level action, not the
                        // specific link that was tried.
                        QKey::Sector(request.target_owner)
                    } else {
                        QKey::Link(candidate.switch_id, candidate.port)
                    };
                    self.state.qlearn.lock().unwrap().update(
                        request.target_owner,
                        penalty_key,
                        sdn_qlearn::REWARD_FAILURE,
                        forward_q,
                    );
                    candidates.remove(chosen);
                }
                Ok(ActivateScenarioResult::TaskExists) => {
                    if let Some(label) = local_label {
                        let _ = self.state.mpls_alloc.free(label);
                    }
                    candidates.remove(chosen);
                }
                Err(error) => {
                    warn!(neighbor = %candidate.neighbor, %error, "peer activation failed");
                    if let Some(label) = local_label {
                        let _ = self.state.mpls_alloc.free(label);
                    }
                    let penalty_key = if request.target_owner == candidate.neighbor {
                        QKey::Sector(request.target_owner)
                    } else {
                        QKey::Link(candidate.switch_id, candidate.port)
                    };
                    let forward_q = self.state.qlearn.lock().unwrap().best_qvalue(request.target_owner);
                    self.state.qlearn.lock().unwrap().update(
                        request.target_owner,
                        penalty_key,
                        sdn_qlearn::REWARD_FAILURE,
                        forward_q,
                    );
                    candidates.remove(chosen);
                }
            }
        }
    }

    fn gather_candidates(
        &self,
        request: &ActivateScenarioRequest,
        adjacents: &[ControllerId],
    ) -> Vec<Candidate> {
        let topology = self.state.topology.lock().unwrap();
        let owner_adjacent = adjacents.contains(&request.target_owner);
        let neighbors: Vec<ControllerId> = if owner_adjacent {
            vec![request.target_owner]
        } else {
            adjacents.to_vec()
        };

        neighbors
            .into_iter()
            .flat_map(|neighbor| {
                topology
                    .query_edges_to_sector(neighbor)
                    .into_iter()
                    .filter_map(move |(local_end, _remote_end, edge)| {
                        let switch = topology.query_entity(local_end.entity)?.as_switch()?;
                        Some(Candidate {
                            local_entity: local_end.entity,
                            switch_id: switch.id,
                            port: local_end.port.0,
                            neighbor,
                            hash_val: edge.hash_val,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn select_candidate(&self, target: ControllerId, candidates: &[Candidate]) -> usize {
        let qlearn = self.state.qlearn.lock().unwrap();
        candidates
            .iter()
            .position(|c| qlearn.qvalue(target, QKey::Link(c.switch_id, c.port)) == 0.0)
            .unwrap_or_else(|| {
                candidates
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| {
                        let qa = qlearn.qvalue(target, QKey::Link(a.switch_id, a.port));
                        let qb = qlearn.qvalue(target, QKey::Link(b.switch_id, b.port));
                        qa.total_cmp(&qb)
                    })
                    .map(|(idx, _)| idx)
                    .expect("candidates is non-empty")
            })
    }

    fn maybe_allocate_label(&self, path: &sdn_topology::Path) -> Result<Option<MplsLabelId>, Error> {
        if path.length() >= 3 {
            Ok(Some(self.state.mpls_alloc.alloc().map_err(|_| Error::Exhausted)?))
        } else {
            Ok(None)
        }
    }

    /// Installs one flow entry per transit switch along `path` (the
    /// switches adjacent to the path's two endpoints, which are
    /// themselves hosts or boundaries handled by the surrounding
    /// in/out ports rather than a flow entry of their own).
    ///
    /// MPLS labels are not used for intra-sector hops in this design —
    /// see [`sdn_services::sector_to_sector_mpls_flow_activation`],
    /// the only installer that touches MPLS actions — so transit flows
    /// always match on the request's source/target IPv4 addresses.
    async fn install_path(
        &self,
        request: &ActivateScenarioRequest,
        path: &sdn_topology::Path,
    ) -> Result<Vec<sdn_services::ServiceHandle>, Error> {
        let entities = path.entities();
        if entities.len() < 3 {
            return Ok(Vec::new());
        }

        let hops: Vec<(SwitchId, PortId, PortId)> = {
            let topology = self.state.topology.lock().unwrap();
            entities
                .windows(3)
                .filter_map(|window| {
                    let (prev, here, next) = (window[0], window[1], window[2]);
                    let switch = topology.query_entity(here).and_then(Entity::as_switch)?;
                    let in_port = topology.port_towards(here, prev)?;
                    let out_port = topology.port_towards(here, next)?;
                    Some((switch.id, in_port.0, out_port.0))
                })
                .collect()
        };

        let src = request.search_id.source_ipv4();
        let dst = request.search_id.target_ipv4();

        let mut handles = Vec::new();
        for (switch_id, in_port, out_port) in hops {
            let handle = match request.scenario_type {
                ScenarioType::Icmpv4 => {
                    sdn_services::icmpv4_flow_activation(
                        switch_id,
                        in_port,
                        out_port,
                        src,
                        dst,
                        &self.state.cookie_alloc,
                        &self.southbound,
                    )
                    .await?
                }
                _ => {
                    sdn_services::ipv4_generic_flow_activation(
                        switch_id,
                        in_port,
                        out_port,
                        src,
                        dst,
                        &self.state.cookie_alloc,
                        &self.southbound,
                    )
                    .await?
                }
            };
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Installs the intra-sector transit flows plus the dedicated flow
    /// entry on the boundary switch itself (the path's last local hop,
    /// which `install_path`'s windowing never covers since there is no
    /// local entity beyond it — the next hop lives on the peer's side
    /// of the wire).
    ///
    /// When a label has been negotiated for this hop, the boundary
    /// entry swaps it rather than matching on the IP 5-tuple, mirroring
    /// how [`sdn_services::sector_to_sector_mpls_flow_activation`] is
    /// reserved for exactly this sector-crossing case.
    async fn install_forward_hop(
        &self,
        request: &ActivateScenarioRequest,
        path: &sdn_topology::Path,
        local_label: Option<MplsLabelId>,
        candidate: &Candidate,
    ) -> Result<Vec<sdn_services::ServiceHandle>, Error> {
        let mut handles = self.install_path(request, path).await?;

        let in_port = {
            let topology = self.state.topology.lock().unwrap();
            let entities = path.entities();
            if entities.len() >= 2 {
                topology.port_towards(candidate.local_entity, entities[entities.len() - 2])
            } else {
                None
            }
        };

        if let Some(in_port) = in_port {
            let boundary_handle = match request.upstream_label {
                Some(upstream_label) => {
                    sdn_services::sector_to_sector_mpls_flow_activation(
                        candidate.switch_id,
                        in_port.0,
                        candidate.port,
                        upstream_label,
                        local_label,
                        &self.state.cookie_alloc,
                        &self.southbound,
                    )
                    .await?
                }
                None => {
                    sdn_services::ipv4_generic_flow_activation(
                        candidate.switch_id,
                        in_port.0,
                        candidate.port,
                        request.search_id.source_ipv4(),
                        request.search_id.target_ipv4(),
                        &self.state.cookie_alloc,
                        &self.southbound,
                    )
                    .await?
                }
            };
            handles.push(boundary_handle);
        }

        Ok(handles)
    }

    async fn call_peer_activate(
        &self,
        neighbor: ControllerId,
        request: &ActivateScenarioRequest,
    ) -> Result<ActivateScenarioResult, Error> {
        let peer = self.peer(neighbor).await?;
        let reply = peer
            .call(&sdn_peer::proto::Request::ActivateScenario(request.clone()))
            .await?;
        match reply {
            sdn_peer::proto::Reply::ActivateScenario(result) => Ok(result),
            _ => Err(Error::Fatal("unexpected reply to ActivateScenario".to_string())),
        }
    }

    pub async fn terminate_scenario_entry(
        &self,
        request: TerminateScenarioRequest,
    ) -> TerminateScenarioResult {
        let released = self
            .state
            .scenarios
            .lock()
            .unwrap()
            .release_active_scenario(request.search_id);

        match released {
            Ok(Some(scenario)) => {
                if let Some((path, bandwidth)) = &scenario.reserved_path {
                    let _ = self
                        .state
                        .topology
                        .lock()
                        .unwrap()
                        .release_bandwidth(path, *bandwidth);
                }
                if let Some(downstream) = scenario.downstream {
                    let peer_request = TerminateScenarioRequest {
                        search_id: request.search_id,
                        origin: self.state.local_id,
                    };
                    if let Ok(peer) = self.peer(downstream).await {
                        if let Err(error) = peer
                            .call(&sdn_peer::proto::Request::TerminateScenario(peer_request))
                            .await
                        {
                            Error::from(error).log();
                        }
                    }
                }
                drop(scenario);
                TerminateScenarioResult::Terminated
            }
            Ok(None) => TerminateScenarioResult::Terminated,
            Err(error) => {
                Error::from(error).log();
                TerminateScenarioResult::NotFound
            }
        }
    }
}

fn resolve_entity(topology: &Topology, key: EntityKey) -> Option<EntityIndex> {
    match key {
        EntityKey::Host(ip) => topology.query_host(ip).map(|(idx, _)| idx),
        EntityKey::Switch(id) => topology.query_switch(id).map(|(idx, _)| idx),
        EntityKey::Sector(id) => topology.query_sector(id).map(|(idx, _)| idx),
        EntityKey::Boundary(hash_val) => topology.resolve_boundary(hash_val),
    }
}

fn entity_key_of(topology: &Topology, idx: EntityIndex) -> Option<EntityKey> {
    match topology.query_entity(idx)? {
        Entity::Host(host) => Some(EntityKey::Host(host.id)),
        Entity::Switch(switch) => Some(EntityKey::Switch(switch.id)),
        Entity::Sector(sector) => Some(EntityKey::Sector(sector.controller_id)),
    }
}

#[async_trait]
impl PeerHandler for Engine {
    fn query_sectors_ids(&self) -> Vec<ControllerId> {
        self.state.topology.lock().unwrap().query_sectors_ids().collect()
    }

    fn query_edges_to_sector(&self, sector: ControllerId) -> Vec<EdgeDescriptor> {
        let topology = self.state.topology.lock().unwrap();
        topology
            .query_edges_to_sector(sector)
            .into_iter()
            .filter_map(|(local_end, remote_end, edge)| {
                Some(EdgeDescriptor {
                    local: entity_key_of(&topology, local_end.entity)?,
                    remote: entity_key_of(&topology, remote_end.entity)?,
                    hash_val: edge.hash_val,
                    remaining_bandwidth: edge.remaining_bandwidth(),
                })
            })
            .collect()
    }

    fn query_entity(&self, key: EntityKey) -> Option<EntityDescriptor> {
        let topology = self.state.topology.lock().unwrap();
        let idx = resolve_entity(&topology, key)?;
        match topology.query_entity(idx)? {
            Entity::Host(host) => Some(EntityDescriptor::Host { id: host.id, mac: host.mac }),
            Entity::Switch(switch) => Some(EntityDescriptor::Switch { id: switch.id }),
            Entity::Sector(sector) => Some(EntityDescriptor::Sector { controller_id: sector.controller_id }),
        }
    }

    async fn activate_scenario(&self, request: ActivateScenarioRequest) -> ActivateScenarioResult {
        self.activate_scenario_entry(request).await
    }

    async fn terminate_scenario(&self, request: TerminateScenarioRequest) -> TerminateScenarioResult {
        self.terminate_scenario_entry(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use sdn_services::southbound::{channel, FlowCommand};
    use sdn_topology::{Host, PortNumber, Switch};
    use sdn_utils::ids::GlobalPathSearchId;

    use crate::central_registry::{InMemoryCentralRegistry, NetworkPolicies};

    /// A single switch with two attached hosts, wired up with a
    /// channel-backed southbound so tests can observe the installed
    /// flow commands directly.
    type FlowRx = tokio::sync::mpsc::UnboundedReceiver<FlowCommand>;

    fn single_switch_fixture() -> (Engine, ControllerId, Ipv4Addr, Ipv4Addr, FlowRx) {
        let local_id = ControllerId::new();
        let src_host = Ipv4Addr::new(10, 0, 0, 1);
        let dst_host = Ipv4Addr::new(10, 0, 0, 2);

        let mut topology = Topology::new();
        let switch = topology.insert_switch(Switch { id: 1 });
        let src = topology.insert_host(Host { id: src_host, mac: [0; 6] });
        let dst = topology.insert_host(Host { id: dst_host, mac: [0; 6] });
        topology.connect(
            sdn_topology::Endpoint { entity: src, port: PortNumber(1) },
            sdn_topology::Endpoint { entity: switch, port: PortNumber(1) },
            100.0,
        );
        topology.connect(
            sdn_topology::Endpoint { entity: switch, port: PortNumber(2) },
            sdn_topology::Endpoint { entity: dst, port: PortNumber(2) },
            100.0,
        );

        let state = ControllerState::new(local_id, topology);
        let (tx, rx) = channel();
        let southbound: Arc<dyn SouthboundTx> = Arc::new(tx);
        let central_registry = Arc::new(InMemoryCentralRegistry::new(NetworkPolicies::default()));
        let engine = Engine::new(state, southbound, central_registry);

        (engine, local_id, src_host, dst_host, rx)
    }

    fn icmp_request(
        local_id: ControllerId,
        origin: ControllerId,
        src: Ipv4Addr,
        dst: Ipv4Addr,
    ) -> ActivateScenarioRequest {
        ActivateScenarioRequest {
            search_id: GlobalPathSearchId::new(origin, src, dst, ScenarioType::Icmpv4),
            scenario_type: ScenarioType::Icmpv4,
            origin,
            entry_point: EntityKey::Host(src),
            target: EntityKey::Host(dst),
            target_owner: local_id,
            bandwidth: 1.0,
            upstream_label: None,
        }
    }

    #[tokio::test]
    async fn activates_and_installs_flow_for_local_target() {
        let (engine, local_id, src, dst, mut rx) = single_switch_fixture();
        let origin = ControllerId::new();
        let request = icmp_request(local_id, origin, src, dst);

        let result = engine.activate_scenario_entry(request).await;
        assert!(matches!(
            result,
            ActivateScenarioResult::Activated { path_length: 2, .. }
        ));

        match rx.try_recv().unwrap() {
            FlowCommand::Install(entry) => assert_eq!(entry.switch_id, 1),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_activation_reports_task_exists_while_in_flight() {
        let (engine, local_id, src, dst, _rx) = single_switch_fixture();
        let origin = ControllerId::new();
        let request = icmp_request(local_id, origin, src, dst);
        let search_id = request.search_id;

        let token = engine
            .state()
            .scenarios
            .lock()
            .unwrap()
            .begin_implementation(search_id)
            .unwrap();

        let result = engine.activate_scenario_entry(request).await;
        assert!(matches!(result, ActivateScenarioResult::TaskExists));

        drop(token);
    }

    #[tokio::test]
    async fn reports_path_not_found_when_bandwidth_exceeds_capacity() {
        let (engine, local_id, src, dst, _rx) = single_switch_fixture();
        let origin = ControllerId::new();
        let mut request = icmp_request(local_id, origin, src, dst);
        request.bandwidth = 1000.0;

        let result = engine.activate_scenario_entry(request).await;
        assert!(matches!(result, ActivateScenarioResult::PathNotFound { .. }));
    }

    #[tokio::test]
    async fn terminating_a_scenario_uninstalls_its_flows() {
        let (engine, local_id, src, dst, mut rx) = single_switch_fixture();
        let origin = ControllerId::new();
        let request = icmp_request(local_id, origin, src, dst);
        let search_id = request.search_id;

        engine.activate_scenario_entry(request).await;
        let _ = rx.try_recv(); // the Install command

        let terminate = TerminateScenarioRequest { search_id, origin };
        let result = engine.terminate_scenario_entry(terminate).await;
        assert!(matches!(result, TerminateScenarioResult::Terminated));

        match rx.try_recv().unwrap() {
            FlowCommand::Uninstall { switch_id, .. } => assert_eq!(switch_id, 1),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminating_an_unknown_scenario_reports_not_found() {
        let (engine, local_id, ..) = single_switch_fixture();
        let terminate = TerminateScenarioRequest {
            search_id: GlobalPathSearchId::new(
                ControllerId::new(),
                Ipv4Addr::new(10, 0, 0, 9),
                Ipv4Addr::new(10, 0, 0, 10),
                ScenarioType::Icmpv4,
            ),
            origin: local_id,
        };

        let result = engine.terminate_scenario_entry(terminate).await;
        assert!(matches!(result, TerminateScenarioResult::NotFound));
    }
}
