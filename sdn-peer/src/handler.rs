//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! The server-side contract a controller process implements to answer
//! incoming peer requests. Kept independent of the engine crate that
//! implements it, so the transport does not depend on the logic that
//! rides on top of it.

use async_trait::async_trait;

use sdn_utils::ids::ControllerId;

use crate::proto::{
    ActivateScenarioRequest, ActivateScenarioResult, EdgeDescriptor, EntityDescriptor, EntityKey,
    TerminateScenarioRequest, TerminateScenarioResult,
};

#[async_trait]
pub trait PeerHandler: Send + Sync {
    fn query_sectors_ids(&self) -> Vec<ControllerId>;
    fn query_edges_to_sector(&self, sector: ControllerId) -> Vec<EdgeDescriptor>;
    fn query_entity(&self, key: EntityKey) -> Option<EntityDescriptor>;
    async fn activate_scenario(&self, request: ActivateScenarioRequest) -> ActivateScenarioResult;
    async fn terminate_scenario(
        &self,
        request: TerminateScenarioRequest,
    ) -> TerminateScenarioResult;
}
