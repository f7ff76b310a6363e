//! PRIVMSG handler: the command pipeline entry point.

use crate::services;
use crate::state::Network;
use slserv_proto::Event;
use tracing::debug;

pub(super) fn handle_privmsg(net: &mut Network, event: &Event, now: i64) {
    let Some(source) = &event.source else {
        debug!("PRIVMSG without source");
        return;
    };
    let (Some(target), Some(text)) = (event.arg(0), event.arg(1)) else {
        debug!(source = %source, "malformed PRIVMSG");
        return;
    };

    if !services::route_service_message(net, source, target, text, now) {
        debug!(target = %target, "message for unknown target");
    }
}
