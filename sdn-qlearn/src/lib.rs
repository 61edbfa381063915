//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Q-learning-guided next-hop selection.
//!
//! Every sector maintains its own table: rows are keyed by the final
//! destination sector of a path search, columns by the candidate next
//! hop (either a directly adjacent sector, or a local link). Successful
//! activations reinforce the hop that was used; failures penalize it.

use std::collections::HashMap;

use sdn_topology::{PortId, SwitchId};
use sdn_utils::ids::ControllerId;

/// Learning rate.
pub const ALPHA: f64 = 0.9;
/// Discount factor applied to the best next-state value.
pub const BETA: f64 = 0.1;

/// Reward handed out when a candidate hop completes an activation.
pub const REWARD_SUCCESS: f64 = 1.0;
/// Reward (penalty) handed out when a candidate hop fails.
pub const REWARD_FAILURE: f64 = -1.0;

/// A candidate action in the Q-table: either forward to a neighboring
/// sector, or cross a specific local link.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum QKey {
    Sector(ControllerId),
    Link(SwitchId, PortId),
}

/// Per-target Q-values and the known-shortest-path-length floor used
/// to bound further exploration.
#[derive(Debug, Default)]
pub struct QLearning {
    table: HashMap<(ControllerId, QKey), f64>,
    /// Keyed the same way as `table`: the KSPL floor is a property of
    /// a specific action tried towards a target, not of the target
    /// alone, since two distinct links to the same sector can have
    /// very different path lengths.
    kspl: HashMap<(ControllerId, QKey), u32>,
}

impl QLearning {
    pub fn new() -> QLearning {
        QLearning::default()
    }

    /// Returns the current Q-value for taking `action` towards `target`,
    /// defaulting to zero for actions never updated before.
    pub fn qvalue(&self, target: ControllerId, action: QKey) -> f64 {
        self.table.get(&(target, action)).copied().unwrap_or(0.0)
    }

    pub fn set_qvalue(&mut self, target: ControllerId, action: QKey, value: f64) {
        self.table.insert((target, action), value);
    }

    /// Updates the Q-value for `action` towards `target` using the
    /// observed `reward` and the best value known for whatever action
    /// comes next in the chain.
    pub fn update(
        &mut self,
        target: ControllerId,
        action: QKey,
        reward: f64,
        best_next_qvalue: f64,
    ) {
        let old = self.qvalue(target, action);
        let new = calculate_new_qvalue(old, reward, best_next_qvalue);
        self.set_qvalue(target, action, new);
    }

    /// Returns the greatest Q-value registered for `target` across
    /// every action tried so far, or zero if none has.
    pub fn best_qvalue(&self, target: ControllerId) -> f64 {
        self.table
            .iter()
            .filter(|((t, _), _)| *t == target)
            .map(|(_, v)| *v)
            .fold(0.0, f64::max)
    }

    /// Returns the known shortest path length for `action` towards
    /// `target`, if that action has ever reached it.
    pub fn kspl(&self, target: ControllerId, action: QKey) -> Option<u32> {
        self.kspl.get(&(target, action)).copied()
    }

    /// Records that a path of `path_length` hops was found to `target`
    /// via `action`.
    ///
    /// This unconditionally overwrites the previous floor with
    /// `path_length + 1`, rather than keeping the minimum observed: the
    /// floor tracks "one more than the last path we actually walked",
    /// not a monotonic lower bound.
    pub fn record_path_length(&mut self, target: ControllerId, action: QKey, path_length: u32) {
        self.kspl.insert((target, action), path_length + 1);
    }
}

/// The standard one-step Q-learning update rule.
pub fn calculate_new_qvalue(old_qvalue: f64, reward: f64, best_next_qvalue: f64) -> f64 {
    old_qvalue + ALPHA * (reward + BETA * best_next_qvalue - old_qvalue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn controller(n: u128) -> ControllerId {
        ControllerId::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn unrewarded_action_defaults_to_zero() {
        let q = QLearning::new();
        assert_eq!(q.qvalue(controller(1), QKey::Sector(controller(2))), 0.0);
    }

    #[test]
    fn repeated_success_converges_towards_reward() {
        let mut q = QLearning::new();
        let target = controller(1);
        let action = QKey::Sector(controller(2));
        for _ in 0..200 {
            q.update(target, action, REWARD_SUCCESS, 0.0);
        }
        assert!((q.qvalue(target, action) - REWARD_SUCCESS).abs() < 1e-6);
    }

    #[test]
    fn failure_pulls_qvalue_negative() {
        let mut q = QLearning::new();
        let target = controller(1);
        let action = QKey::Link(7, 3);
        q.update(target, action, REWARD_FAILURE, 0.0);
        assert!(q.qvalue(target, action) < 0.0);
    }

    #[test]
    fn record_path_length_always_overwrites() {
        let mut q = QLearning::new();
        let target = controller(5);
        let action = QKey::Sector(controller(6));
        q.record_path_length(target, action, 4);
        assert_eq!(q.kspl(target, action), Some(5));
        q.record_path_length(target, action, 1);
        assert_eq!(q.kspl(target, action), Some(2));
    }

    #[test]
    fn kspl_is_independent_per_action() {
        let mut q = QLearning::new();
        let target = controller(5);
        let link_a = QKey::Link(1, 1);
        let link_b = QKey::Link(2, 2);
        q.record_path_length(target, link_a, 2);
        q.record_path_length(target, link_b, 9);
        assert_eq!(q.kspl(target, link_a), Some(3));
        assert_eq!(q.kspl(target, link_b), Some(10));
    }
}
