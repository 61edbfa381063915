//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Tracks which service scenarios are currently active, and guards each
//! one against being implemented twice concurrently.

pub mod error;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub use crate::error::Error;
use sdn_services::ServiceHandle;
use sdn_topology::Path;
use sdn_utils::allocator::MplsLabelAllocator;
use sdn_utils::ids::{ControllerId, GlobalPathSearchId, MplsLabelId};

/// A scenario that has been fully activated: the local flow entries
/// installed for it, kept alive for as long as the scenario is active.
pub struct ActiveScenario {
    /// Number of requesters currently sharing this installed service.
    pub refcount: u32,
    /// The neighboring sector this scenario was recursively extended
    /// into, if any. Termination must be propagated there once the
    /// last local reference is released.
    pub downstream: Option<ControllerId>,
    /// Local flow entries backing this scenario. Dropping these
    /// uninstalls them and frees their cookies.
    pub handles: Vec<ServiceHandle>,
    /// The MPLS label reserved for this scenario's upstream hop, if
    /// the path crossed the labeling threshold. Freed back to
    /// `mpls_alloc` when the scenario is dropped.
    pub mpls_label: Option<(MplsLabelId, Arc<MplsLabelAllocator>)>,
    /// The local path this scenario reserved bandwidth along, and how
    /// much. The caller is responsible for releasing it back to the
    /// topology when the scenario is torn down (topology is shared and
    /// locked elsewhere, so this cannot be a `Drop` impl here).
    pub reserved_path: Option<(Path, f64)>,
}

impl Drop for ActiveScenario {
    fn drop(&mut self) {
        if let Some((label, alloc)) = self.mpls_label.take() {
            let _ = alloc.free(label);
        }
    }
}

impl std::fmt::Debug for ActiveScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveScenario")
            .field("refcount", &self.refcount)
            .field("downstream", &self.downstream)
            .field("handles", &self.handles)
            .field("mpls_label", &self.mpls_label.as_ref().map(|(l, _)| l))
            .field("reserved_path", &self.reserved_path.as_ref().map(|(_, bw)| bw))
            .finish()
    }
}

/// Central registry of active and in-progress scenarios for one
/// controller process, keyed by the path search they belong to.
#[derive(Debug, Default)]
pub struct Registry {
    active: HashMap<GlobalPathSearchId, ActiveScenario>,
    in_progress: Arc<Mutex<HashSet<GlobalPathSearchId>>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn is_scenario_active(&self, search_id: GlobalPathSearchId) -> bool {
        self.active.contains_key(&search_id)
    }

    pub fn set_active_scenario(&mut self, search_id: GlobalPathSearchId, scenario: ActiveScenario) {
        self.active.insert(search_id, scenario);
    }

    /// Increments the share count of an already-active scenario.
    pub fn share_active_scenario(&mut self, search_id: GlobalPathSearchId) -> Result<(), Error> {
        let scenario = self
            .active
            .get_mut(&search_id)
            .ok_or(Error::ScenarioNotFound(search_id))?;
        scenario.refcount += 1;
        Ok(())
    }

    /// Decrements the share count of an active scenario. Returns
    /// `Some(scenario)` when this was the last reference (the scenario
    /// has been removed from the registry and the caller now owns
    /// tearing it down), or `None` when other requesters still hold it.
    pub fn release_active_scenario(
        &mut self,
        search_id: GlobalPathSearchId,
    ) -> Result<Option<ActiveScenario>, Error> {
        let scenario = self
            .active
            .get_mut(&search_id)
            .ok_or(Error::ScenarioNotFound(search_id))?;
        scenario.refcount -= 1;
        if scenario.refcount == 0 {
            Ok(self.active.remove(&search_id))
        } else {
            Ok(None)
        }
    }

    /// Attempts to begin implementing the scenario identified by
    /// `search_id`. Succeeds with a [`TaskToken`] that releases the
    /// guard when dropped; fails with [`Error::TaskExists`] if another
    /// task is already implementing the same scenario.
    pub fn begin_implementation(&self, search_id: GlobalPathSearchId) -> Result<TaskToken, Error> {
        let mut guard = self.in_progress.lock().unwrap();
        if !guard.insert(search_id) {
            return Err(Error::TaskExists(search_id));
        }
        drop(guard);
        Ok(TaskToken {
            search_id,
            registry: self.in_progress.clone(),
        })
    }
}

/// RAII guard marking a scenario's implementation task as in progress.
/// Releases the mutual-exclusion slot when dropped, whether the task
/// completed, failed, or was cancelled.
#[derive(Debug)]
pub struct TaskToken {
    search_id: GlobalPathSearchId,
    registry: Arc<Mutex<HashSet<GlobalPathSearchId>>>,
}

impl Drop for TaskToken {
    fn drop(&mut self) {
        self.registry.lock().unwrap().remove(&self.search_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn search_id(n: u8) -> GlobalPathSearchId {
        GlobalPathSearchId::new(
            ControllerId::new(),
            Ipv4Addr::new(10, 0, 0, n),
            Ipv4Addr::new(10, 0, 0, 100),
            sdn_utils::ids::ScenarioType::Icmpv4,
        )
    }

    #[test]
    fn duplicate_implementation_is_rejected_while_guard_held() {
        let registry = Registry::new();
        let id = search_id(1);
        let token = registry.begin_implementation(id).unwrap();
        assert_eq!(
            registry.begin_implementation(id),
            Err(Error::TaskExists(id))
        );
        drop(token);
        assert!(registry.begin_implementation(id).is_ok());
    }

    #[test]
    fn release_removes_scenario_once_refcount_hits_zero() {
        let mut registry = Registry::new();
        let id = search_id(2);
        registry.set_active_scenario(
            id,
            ActiveScenario {
                refcount: 1,
                downstream: None,
                handles: vec![],
                mpls_label: None,
                reserved_path: None,
            },
        );
        assert!(registry.is_scenario_active(id));
        assert!(registry.release_active_scenario(id).unwrap().is_some());
        assert!(!registry.is_scenario_active(id));
    }

    #[test]
    fn release_only_tears_down_on_last_reference() {
        let mut registry = Registry::new();
        let id = search_id(3);
        registry.set_active_scenario(
            id,
            ActiveScenario {
                refcount: 1,
                downstream: None,
                handles: vec![],
                mpls_label: None,
                reserved_path: None,
            },
        );
        registry.share_active_scenario(id).unwrap();
        assert!(registry.release_active_scenario(id).unwrap().is_none());
        assert!(registry.is_scenario_active(id));
        assert!(registry.release_active_scenario(id).unwrap().is_some());
        assert!(!registry.is_scenario_active(id));
    }
}
