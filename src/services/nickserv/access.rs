//! ACCESS command handlers for NickServ.

use crate::error::ServiceError;
use crate::services::{check_read_only, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_access(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.nickserv();
    let Some(sub) = args.first().map(|a| a.to_uppercase()) else {
        reply(net, &service, user_key, "Syntax: ACCESS <ADD|DEL|LIST> [mask]");
        return;
    };

    let Some(real) = net.users.get(user_key).and_then(|u| u.real_identity.clone()) else {
        let nick = net
            .users
            .get(user_key)
            .map(|u| u.nick.clone())
            .unwrap_or_default();
        reply_error(net, &service, user_key, &ServiceError::NotFound(nick));
        return;
    };
    if !net.nicks.get(&real).map(|r| r.identified).unwrap_or(false) {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    match sub.as_str() {
        "LIST" => {
            let masks = net
                .nicks
                .get(&real)
                .map(|r| r.access.clone())
                .unwrap_or_default();
            if masks.is_empty() {
                reply(net, &service, user_key, "Your access list is empty.");
                return;
            }
            reply(net, &service, user_key, "Access list:");
            for (i, mask) in masks.iter().enumerate() {
                reply(net, &service, user_key, &format!("  {:>3}  {}", i + 1, mask));
            }
        }
        "ADD" => {
            let Some(mask) = args.get(1) else {
                reply(net, &service, user_key, "Syntax: ACCESS ADD <mask>");
                return;
            };
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            if !mask.contains('@') || mask.contains('!') {
                reply_error(
                    net,
                    &service,
                    user_key,
                    &ServiceError::InvalidArgument(format!("bad mask {}", mask)),
                );
                return;
            }
            match net.nicks.access_add(&real, mask) {
                Ok(()) => reply(
                    net,
                    &service,
                    user_key,
                    &format!("\x02{}\x02 added to your access list.", mask),
                ),
                Err(err) => reply_error(net, &service, user_key, &err),
            }
        }
        "DEL" => {
            let Some(mask) = args.get(1) else {
                reply(net, &service, user_key, "Syntax: ACCESS DEL <mask>");
                return;
            };
            if let Err(err) = check_read_only(net) {
                reply_error(net, &service, user_key, &err);
                return;
            }
            match net.nicks.access_del(&real, mask) {
                Ok(()) => reply(
                    net,
                    &service,
                    user_key,
                    &format!("\x02{}\x02 removed from your access list.", mask),
                ),
                Err(err) => reply_error(net, &service, user_key, &err),
            }
        }
        _ => reply(net, &service, user_key, "Syntax: ACCESS <ADD|DEL|LIST> [mask]"),
    }
}
