//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

//! Channel-based adapter to the OpenFlow control plane. The real
//! implementation would sit behind a switch-manager process; tests and
//! the engine's unit tests instead drive the channel directly via the
//! `testing` feature, following `holo-southbound`'s zclient split.

use async_trait::async_trait;
use derive_new::new;
use tokio::sync::mpsc;
use tracing::debug;

use sdn_topology::{PortId, SwitchId};
use sdn_utils::ids::{CookieId, MplsLabelId};

use crate::error::Error;

/// Flow table numbers, carried over from the original controller's
/// table-miss pipeline so generated OpenFlow commands land in the
/// table the rest of the pipeline expects.
pub const PORT_SEGREGATION_TABLE: u8 = 0;
pub const HOST_FILTERING_TABLE: u8 = 1;
pub const SECTOR_FILTERING_TABLE: u8 = 2;
pub const MPLS_FILTERING_TABLE: u8 = 3;
pub const FOREIGN_HOST_FILTERING_TABLE: u8 = 4;

/// Priority bands, highest first within a table.
pub const PRIORITY_HOST_SPECIFIC: u16 = 3000;
pub const PRIORITY_SECTOR_SPECIFIC: u16 = 2000;
pub const PRIORITY_GENERIC: u16 = 1000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchField {
    InPort(PortId),
    EthTypeIpv4,
    Ipv4Src(std::net::Ipv4Addr),
    Ipv4Dst(std::net::Ipv4Addr),
    MplsLabel(MplsLabelId),
    IpProto(u8),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Output(PortId),
    PushMpls(MplsLabelId),
    PopMpls,
    GotoTable(u8),
}

#[derive(Clone, Debug)]
pub struct FlowEntry {
    pub switch_id: SwitchId,
    pub table: u8,
    pub priority: u16,
    pub cookie: CookieId,
    pub matches: Vec<MatchField>,
    pub actions: Vec<Action>,
}

#[derive(Clone, Debug)]
pub enum FlowCommand {
    Install(FlowEntry),
    Uninstall { switch_id: SwitchId, cookie: CookieId },
}

#[async_trait]
pub trait SouthboundTx: Send + Sync {
    async fn send(&self, command: FlowCommand) -> Result<(), Error>;

    /// Best-effort uninstall notification issued from synchronous
    /// contexts (namely `Drop`), where there is no executor available
    /// to await `send`.
    fn notify_uninstall(&self, switch_id: SwitchId, cookie: CookieId);
}

/// Default channel-backed implementation: hands commands off to
/// whatever is reading `channel_rx`, in production the task that
/// speaks OpenFlow to the switches, in tests the assertion harness
/// itself.
#[derive(Debug, new)]
pub struct ChannelSouthboundTx {
    channel_tx: mpsc::UnboundedSender<FlowCommand>,
}

#[async_trait]
impl SouthboundTx for ChannelSouthboundTx {
    async fn send(&self, command: FlowCommand) -> Result<(), Error> {
        debug!(?command, "sending southbound flow command");
        self.channel_tx.send(command).map_err(|_| Error::SendFailed)
    }

    fn notify_uninstall(&self, switch_id: SwitchId, cookie: CookieId) {
        let _ = self
            .channel_tx
            .send(FlowCommand::Uninstall { switch_id, cookie });
    }
}

pub fn channel() -> (ChannelSouthboundTx, mpsc::UnboundedReceiver<FlowCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSouthboundTx::new(tx), rx)
}

/// Events received asynchronously from the switch manager.
#[derive(Clone, Debug)]
pub enum SouthboundEvent {
    SwitchConnect { switch_id: SwitchId },
    SwitchDisconnect { switch_id: SwitchId },
    PacketIn { switch_id: SwitchId, in_port: PortId, payload: Vec<u8> },
    PortStateChange { switch_id: SwitchId, port: PortId, up: bool },
}

#[derive(Debug)]
pub struct SouthboundRx {
    channel_rx: mpsc::UnboundedReceiver<SouthboundEvent>,
}

impl SouthboundRx {
    pub fn new(channel_rx: mpsc::UnboundedReceiver<SouthboundEvent>) -> SouthboundRx {
        SouthboundRx { channel_rx }
    }

    pub async fn recv(&mut self) -> Option<SouthboundEvent> {
        self.channel_rx.recv().await
    }
}
