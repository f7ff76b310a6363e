//! Server topology handlers: SERVER, SQUIT.

use crate::state::Network;
use slserv_proto::Event;
use tracing::debug;

/// A new server link. An unsourced SERVER is our uplink; a sourced one
/// was introduced by its parent.
pub(super) fn handle_server(net: &mut Network, event: &Event, _now: i64) {
    let Some(name) = event.arg(0) else {
        debug!("SERVER without name");
        return;
    };
    let hops = event
        .arg(1)
        .and_then(|a| a.parse::<u32>().ok())
        .unwrap_or(1);
    let description = event.arg(2).unwrap_or("");
    net.servers
        .add(name, event.source.as_deref(), description, hops);
}

pub(super) fn handle_squit(net: &mut Network, event: &Event, now: i64) {
    let Some(server) = event.arg(0) else {
        debug!("SQUIT without server");
        return;
    };
    net.handle_squit(server, now);
}
