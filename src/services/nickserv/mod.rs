//! NickServ - nickname registration and identification service.
//!
//! Handles:
//! - REGISTER <password> [email] - register the current nick
//! - IDENTIFY <password> - identify to the current nick
//! - DROP [nick] - drop a registration
//! - SET <option> <value> - owner settings
//! - ACCESS ADD/DEL/LIST - passwordless recognition masks
//! - LINK <target> <password> / UNLINK - identity grouping
//! - INFO <nick> - show a registration
//! - RECOVER/RELEASE/GHOST <nick> [password] - enforcement front-ends
//! - FORBID <nick> - administrative block

mod access;
mod drop;
mod forbid;
mod identify;
mod info;
mod link;
mod recover;
mod register;
mod set;

use super::{reply, split_command};
use crate::state::Network;

/// Dispatch one command line addressed to NickServ.
pub fn handle(net: &mut Network, user_key: &str, text: &str, now: i64) {
    let service = net.nickserv();
    let Some((verb, args)) = split_command(text) else {
        reply(
            net,
            &service,
            user_key,
            "Commands: REGISTER IDENTIFY DROP SET ACCESS LINK UNLINK INFO RECOVER RELEASE GHOST FORBID",
        );
        return;
    };

    match verb.as_str() {
        "REGISTER" => register::handle_register(net, user_key, &args, now),
        "IDENTIFY" => identify::handle_identify(net, user_key, &args, now),
        "DROP" => drop::handle_drop(net, user_key, &args, now),
        "SET" => set::handle_set(net, user_key, &args),
        "ACCESS" => access::handle_access(net, user_key, &args),
        "LINK" => link::handle_link(net, user_key, &args),
        "UNLINK" => link::handle_unlink(net, user_key, &args),
        "INFO" => info::handle_info(net, user_key, &args),
        "RECOVER" => recover::handle_recover(net, user_key, &args, now),
        "RELEASE" => recover::handle_release(net, user_key, &args),
        "GHOST" => recover::handle_ghost(net, user_key, &args, now),
        "FORBID" => forbid::handle_forbid(net, user_key, &args, now),
        _ => reply(
            net,
            &service,
            user_key,
            &format!("Unknown command \x02{}\x02. Try HELP.", verb),
        ),
    }
}
