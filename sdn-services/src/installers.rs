//
// Copyright (c) The ArchSDN Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use sdn_topology::{PortId, SwitchId};
use sdn_utils::allocator::CookieAllocator;
use sdn_utils::ids::MplsLabelId;

use crate::error::Error;
use crate::handle::ServiceHandle;
use crate::southbound::{
    Action, FlowCommand, FlowEntry, MatchField, SouthboundTx, HOST_FILTERING_TABLE,
    MPLS_FILTERING_TABLE, FOREIGN_HOST_FILTERING_TABLE, PRIORITY_GENERIC, PRIORITY_HOST_SPECIFIC,
    PRIORITY_SECTOR_SPECIFIC,
};

const ICMP_PROTOCOL: u8 = 1;

/// Installs the single-hop flow entry that forwards ICMPv4 traffic
/// between `src` and `dst` out of `out_port`.
pub async fn icmpv4_flow_activation(
    switch_id: SwitchId,
    in_port: PortId,
    out_port: PortId,
    src: std::net::Ipv4Addr,
    dst: std::net::Ipv4Addr,
    cookie_alloc: &Arc<CookieAllocator>,
    southbound: &Arc<dyn SouthboundTx>,
) -> Result<ServiceHandle, Error> {
    let cookie = cookie_alloc.alloc().map_err(|_| Error::CookiesExhausted)?;

    let entry = FlowEntry {
        switch_id,
        table: HOST_FILTERING_TABLE,
        priority: PRIORITY_HOST_SPECIFIC,
        cookie,
        matches: vec![
            MatchField::InPort(in_port),
            MatchField::EthTypeIpv4,
            MatchField::IpProto(ICMP_PROTOCOL),
            MatchField::Ipv4Src(src),
            MatchField::Ipv4Dst(dst),
        ],
        actions: vec![Action::Output(out_port)],
    };
    southbound.send(FlowCommand::Install(entry)).await?;

    Ok(ServiceHandle::new(
        switch_id,
        vec![cookie],
        cookie_alloc.clone(),
        southbound.clone(),
    ))
}

/// Installs the single-hop flow entry that forwards any IPv4 traffic
/// between `src` and `dst` out of `out_port`, without restricting the
/// upper-layer protocol.
pub async fn ipv4_generic_flow_activation(
    switch_id: SwitchId,
    in_port: PortId,
    out_port: PortId,
    src: std::net::Ipv4Addr,
    dst: std::net::Ipv4Addr,
    cookie_alloc: &Arc<CookieAllocator>,
    southbound: &Arc<dyn SouthboundTx>,
) -> Result<ServiceHandle, Error> {
    let cookie = cookie_alloc.alloc().map_err(|_| Error::CookiesExhausted)?;

    let entry = FlowEntry {
        switch_id,
        table: FOREIGN_HOST_FILTERING_TABLE,
        priority: PRIORITY_GENERIC,
        cookie,
        matches: vec![
            MatchField::InPort(in_port),
            MatchField::EthTypeIpv4,
            MatchField::Ipv4Src(src),
            MatchField::Ipv4Dst(dst),
        ],
        actions: vec![Action::Output(out_port)],
    };
    southbound.send(FlowCommand::Install(entry)).await?;

    Ok(ServiceHandle::new(
        switch_id,
        vec![cookie],
        cookie_alloc.clone(),
        southbound.clone(),
    ))
}

/// Installs the flow entry that swaps `incoming_label` for
/// `outgoing_label` (or pops it, at the final hop) on the way out of
/// `out_port`.
pub async fn sector_to_sector_mpls_flow_activation(
    switch_id: SwitchId,
    in_port: PortId,
    out_port: PortId,
    incoming_label: MplsLabelId,
    outgoing_label: Option<MplsLabelId>,
    cookie_alloc: &Arc<CookieAllocator>,
    southbound: &Arc<dyn SouthboundTx>,
) -> Result<ServiceHandle, Error> {
    let cookie = cookie_alloc.alloc().map_err(|_| Error::CookiesExhausted)?;

    let mut actions = Vec::new();
    actions.push(Action::PopMpls);
    if let Some(label) = outgoing_label {
        actions.push(Action::PushMpls(label));
    }
    actions.push(Action::Output(out_port));

    let entry = FlowEntry {
        switch_id,
        table: MPLS_FILTERING_TABLE,
        priority: PRIORITY_SECTOR_SPECIFIC,
        cookie,
        matches: vec![
            MatchField::InPort(in_port),
            MatchField::MplsLabel(incoming_label),
        ],
        actions,
    };
    southbound.send(FlowCommand::Install(entry)).await?;

    Ok(ServiceHandle::new(
        switch_id,
        vec![cookie],
        cookie_alloc.clone(),
        southbound.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::southbound::channel;

    #[tokio::test]
    async fn icmpv4_activation_sends_install_and_frees_cookie_on_drop() {
        let cookie_alloc = Arc::new(CookieAllocator::new());
        let (tx, mut rx) = channel();
        let southbound: Arc<dyn SouthboundTx> = Arc::new(tx);

        let handle = icmpv4_flow_activation(
            1,
            1,
            2,
            std::net::Ipv4Addr::new(10, 0, 0, 1),
            std::net::Ipv4Addr::new(10, 0, 0, 2),
            &cookie_alloc,
            &southbound,
        )
        .await
        .unwrap();

        let cookie = handle.cookies()[0];
        match rx.try_recv().unwrap() {
            FlowCommand::Install(entry) => assert_eq!(entry.cookie, cookie),
            other => panic!("unexpected command: {other:?}"),
        }

        drop(handle);
        match rx.try_recv().unwrap() {
            FlowCommand::Uninstall { cookie: freed, .. } => assert_eq!(freed, cookie),
            other => panic!("unexpected command: {other:?}"),
        }

        // Cookie is actually back in the allocator's pool.
        let reused = cookie_alloc.alloc().unwrap();
        assert_eq!(reused, cookie);
    }
}
