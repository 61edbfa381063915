//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Every structure shared across concurrently running activations,
//! bundled together and guarded by ordinary `std::sync::Mutex`es: the
//! engine never holds one across an `.await`, so a synchronous lock is
//! sufficient even on a multi-threaded runtime.

use std::sync::{Arc, Mutex};

use sdn_qlearn::QLearning;
use sdn_topology::Topology;
use sdn_utils::allocator::{CookieAllocator, MplsLabelAllocator};
use sdn_utils::ids::ControllerId;

pub struct ControllerState {
    pub local_id: ControllerId,
    pub topology: Mutex<Topology>,
    pub qlearn: Mutex<QLearning>,
    pub scenarios: Mutex<sdn_scenario::Registry>,
    pub cookie_alloc: Arc<CookieAllocator>,
    pub mpls_alloc: Arc<MplsLabelAllocator>,
}

impl ControllerState {
    pub fn new(local_id: ControllerId, topology: Topology) -> ControllerState {
        ControllerState {
            local_id,
            topology: Mutex::new(topology),
            qlearn: Mutex::new(QLearning::new()),
            scenarios: Mutex::new(sdn_scenario::Registry::new()),
            cookie_alloc: Arc::new(CookieAllocator::new()),
            mpls_alloc: Arc::new(MplsLabelAllocator::new()),
        }
    }
}
