//! SESSION command handlers for OperServ.

use super::require_admin;
use crate::services::{reply, reply_error};
use crate::state::Network;

pub(super) fn handle_session(net: &mut Network, user_key: &str, args: &[&str], now: i64) {
    let service = net.operserv();
    if let Err(err) = require_admin(net, user_key) {
        reply_error(net, &service, user_key, &err);
        return;
    }
    let Some(sub) = args.first().map(|s| s.to_uppercase()) else {
        reply(net, &service, user_key, "Syntax: SESSION <LIST threshold|VIEW host>");
        return;
    };

    match sub.as_str() {
        "LIST" => {
            let threshold: u32 = args
                .get(1)
                .and_then(|a| a.parse().ok())
                .unwrap_or(1);
            let rows: Vec<(String, u32)> = net
                .sessions
                .counts_sorted()
                .into_iter()
                .filter(|(_, count)| *count >= threshold)
                .collect();
            if rows.is_empty() {
                reply(
                    net,
                    &service,
                    user_key,
                    &format!("No hosts have at least {} sessions.", threshold),
                );
                return;
            }
            reply(
                net,
                &service,
                user_key,
                &format!("Hosts with at least {} sessions:", threshold),
            );
            for (host, count) in rows {
                reply(net, &service, user_key, &format!("  {:>4}  {}", count, host));
            }
        }
        "VIEW" => {
            let Some(host) = args.get(1) else {
                reply(net, &service, user_key, "Syntax: SESSION VIEW <host>");
                return;
            };
            let count = net.sessions.count_of(host);
            if count == 0 {
                reply(
                    net,
                    &service,
                    user_key,
                    &format!("\x02{}\x02 currently has no sessions.", host),
                );
                return;
            }
            let limit = net.sessions.limit_for(host, now);
            reply(
                net,
                &service,
                user_key,
                &format!(
                    "\x02{}\x02 currently has {} session(s), limit {}.",
                    host,
                    count,
                    if limit == 0 {
                        "none".to_owned()
                    } else {
                        limit.to_string()
                    }
                ),
            );
        }
        _ => reply(net, &service, user_key, "Syntax: SESSION <LIST threshold|VIEW host>"),
    }
}
