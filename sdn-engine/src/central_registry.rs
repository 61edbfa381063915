//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Thin typed client over the out-of-process central registry, which
//! assigns controller identities, tracks which controller owns each
//! address, and hands out the network-wide addressing policy. Mirrors
//! `holo-southbound`'s "typed client over a channel" shape: callers see
//! plain async methods, the actual wire exchange is somebody else's
//! concern.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;

use sdn_utils::ids::ControllerId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    ControllerAlreadyRegistered,
    Ipv4InfoAlreadyRegistered,
    Ipv6InfoAlreadyRegistered,
    ClientNotRegistered,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ControllerAlreadyRegistered => write!(f, "controller already registered"),
            Error::Ipv4InfoAlreadyRegistered => write!(f, "IPv4 info already registered"),
            Error::Ipv6InfoAlreadyRegistered => write!(f, "IPv6 info already registered"),
            Error::ClientNotRegistered => write!(f, "controller is not registered"),
        }
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Copy, Debug)]
pub struct ControllerAddress {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv4_port: Option<u16>,
    pub ipv6: Option<Ipv6Addr>,
    pub ipv6_port: Option<u16>,
}

#[derive(Clone, Copy, Debug)]
pub struct AddressInfo {
    pub controller_id: ControllerId,
}

#[derive(Clone, Copy, Debug)]
pub struct NetworkPolicies {
    pub ipv4_network: Ipv4Addr,
    pub ipv4_service: Ipv4Addr,
    pub mac_service: [u8; 6],
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AddressQuery {
    Ipv4(Ipv4Addr),
    Mac([u8; 6]),
}

#[async_trait]
pub trait CentralRegistryClient: Send + Sync {
    async fn register_controller(&self, id: ControllerId) -> Result<(), Error>;
    async fn update_controller_address(
        &self,
        id: ControllerId,
        address: ControllerAddress,
    ) -> Result<(), Error>;
    async fn query_controller_info(&self, id: ControllerId) -> Result<ControllerAddress, Error>;
    async fn query_address_info(&self, query: AddressQuery) -> Result<AddressInfo, Error>;
    async fn query_central_network_policies(&self) -> Result<NetworkPolicies, Error>;
}

/// In-memory double used by tests and by the engine when run without a
/// real central registry process.
#[derive(Debug, Default)]
pub struct InMemoryCentralRegistry {
    addresses: Mutex<HashMap<ControllerId, ControllerAddress>>,
    by_ipv4: Mutex<HashMap<Ipv4Addr, ControllerId>>,
    policies: NetworkPolicies,
}

impl InMemoryCentralRegistry {
    pub fn new(policies: NetworkPolicies) -> InMemoryCentralRegistry {
        InMemoryCentralRegistry {
            addresses: Mutex::new(HashMap::new()),
            by_ipv4: Mutex::new(HashMap::new()),
            policies,
        }
    }

    /// Test/bootstrap helper: directly asserts which controller owns a
    /// given host address, bypassing registration.
    pub fn seed_owner(&self, ipv4: Ipv4Addr, owner: ControllerId) {
        self.by_ipv4.lock().unwrap().insert(ipv4, owner);
    }
}

#[async_trait]
impl CentralRegistryClient for InMemoryCentralRegistry {
    async fn register_controller(&self, id: ControllerId) -> Result<(), Error> {
        let mut guard = self.addresses.lock().unwrap();
        if guard.contains_key(&id) {
            return Err(Error::ControllerAlreadyRegistered);
        }
        guard.insert(
            id,
            ControllerAddress {
                ipv4: None,
                ipv4_port: None,
                ipv6: None,
                ipv6_port: None,
            },
        );
        Ok(())
    }

    async fn update_controller_address(
        &self,
        id: ControllerId,
        address: ControllerAddress,
    ) -> Result<(), Error> {
        let mut guard = self.addresses.lock().unwrap();
        let entry = guard.get_mut(&id).ok_or(Error::ClientNotRegistered)?;
        if address.ipv4.is_some() && entry.ipv4.is_some() {
            return Err(Error::Ipv4InfoAlreadyRegistered);
        }
        if address.ipv6.is_some() && entry.ipv6.is_some() {
            return Err(Error::Ipv6InfoAlreadyRegistered);
        }
        *entry = address;
        if let Some(ipv4) = address.ipv4 {
            self.by_ipv4.lock().unwrap().insert(ipv4, id);
        }
        Ok(())
    }

    async fn query_controller_info(&self, id: ControllerId) -> Result<ControllerAddress, Error> {
        self.addresses
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .ok_or(Error::ClientNotRegistered)
    }

    async fn query_address_info(&self, query: AddressQuery) -> Result<AddressInfo, Error> {
        match query {
            AddressQuery::Ipv4(ipv4) => self
                .by_ipv4
                .lock()
                .unwrap()
                .get(&ipv4)
                .copied()
                .map(|controller_id| AddressInfo { controller_id })
                .ok_or(Error::ClientNotRegistered),
            AddressQuery::Mac(_) => Err(Error::ClientNotRegistered),
        }
    }

    async fn query_central_network_policies(&self) -> Result<NetworkPolicies, Error> {
        Ok(self.policies)
    }
}

impl Default for NetworkPolicies {
    fn default() -> NetworkPolicies {
        NetworkPolicies {
            ipv4_network: Ipv4Addr::new(10, 0, 0, 0),
            ipv4_service: Ipv4Addr::new(10, 255, 0, 0),
            mac_service: [0, 0, 0, 0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn owner_lookup_resolves_seeded_address() {
        let registry = InMemoryCentralRegistry::new(NetworkPolicies::default());
        let owner = ControllerId::new();
        let host = Ipv4Addr::new(10, 0, 0, 5);
        registry.seed_owner(host, owner);

        let info = registry
            .query_address_info(AddressQuery::Ipv4(host))
            .await
            .unwrap();
        assert_eq!(info.controller_id, owner);
    }

    #[tokio::test]
    async fn registering_twice_is_rejected() {
        let registry = InMemoryCentralRegistry::new(NetworkPolicies::default());
        let id = ControllerId::new();
        registry.register_controller(id).await.unwrap();
        assert_eq!(
            registry.register_controller(id).await,
            Err(Error::ControllerAlreadyRegistered)
        );
    }
}
