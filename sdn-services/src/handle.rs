//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use sdn_topology::SwitchId;
use sdn_utils::allocator::CookieAllocator;
use sdn_utils::ids::CookieId;

use crate::southbound::SouthboundTx;

/// Owns every cookie reserved to implement one service on one switch.
/// Uninstalling the flows and releasing the cookies both happen when
/// the handle is dropped, so a service can never outlive its last
/// reference without also leaking state in the switch or the
/// allocator.
pub struct ServiceHandle {
    switch_id: SwitchId,
    cookies: Vec<CookieId>,
    cookie_alloc: Arc<CookieAllocator>,
    southbound: Arc<dyn SouthboundTx>,
}

impl ServiceHandle {
    pub fn new(
        switch_id: SwitchId,
        cookies: Vec<CookieId>,
        cookie_alloc: Arc<CookieAllocator>,
        southbound: Arc<dyn SouthboundTx>,
    ) -> ServiceHandle {
        ServiceHandle {
            switch_id,
            cookies,
            cookie_alloc,
            southbound,
        }
    }

    pub fn switch_id(&self) -> SwitchId {
        self.switch_id
    }

    pub fn cookies(&self) -> &[CookieId] {
        &self.cookies
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        for &cookie in &self.cookies {
            self.southbound.notify_uninstall(self.switch_id, cookie);
            let _ = self.cookie_alloc.free(cookie);
        }
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("switch_id", &self.switch_id)
            .field("cookies", &self.cookies)
            .finish()
    }
}
