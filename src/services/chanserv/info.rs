//! INFO command handler for ChanServ.

use super::acting_admin;
use crate::error::ServiceError;
use crate::services::{format_time, reply, reply_error};
use crate::state::Network;

pub(super) fn handle_info(net: &mut Network, user_key: &str, args: &[&str]) {
    let service = net.chanserv();
    let Some(chan) = args.first() else {
        reply(net, &service, user_key, "Syntax: INFO <#channel>");
        return;
    };

    let Some(record) = net.chans.get(chan) else {
        reply_error(
            net,
            &service,
            user_key,
            &ServiceError::NotFound((*chan).to_owned()),
        );
        return;
    };

    if record.forbidden {
        let text = format!("Channel \x02{}\x02 may not be registered or used.", record.name);
        reply(net, &service, user_key, &text);
        return;
    }
    if record.flags.private && !acting_admin(net, user_key) {
        reply_error(net, &service, user_key, &ServiceError::PermissionDenied);
        return;
    }

    let mut lines = vec![format!("Information for channel \x02{}\x02:", record.name)];
    lines.push(format!("        Founder: {}", record.founder));
    if let Some(successor) = &record.successor {
        lines.push(format!("      Successor: {}", successor));
    }
    lines.push(format!("    Description: {}", record.desc));
    lines.push(format!("     Registered: {}", format_time(record.time_registered)));
    lines.push(format!("      Last used: {}", format_time(record.last_used)));
    if let Some(topic) = &record.last_topic {
        lines.push(format!("     Last topic: {}", topic.text));
        lines.push(format!("   Topic set by: {}", topic.set_by));
    }
    if let Some(url) = &record.url {
        lines.push(format!("            URL: {}", url));
    }
    if let Some(email) = &record.email {
        lines.push(format!(" E-mail address: {}", email));
    }
    let lock = record.mlock.to_string();
    if !lock.is_empty() {
        lines.push(format!("      Mode lock: {}", lock));
    }
    let mut options = Vec::new();
    if record.flags.keep_topic {
        options.push("Topic retention");
    }
    if record.flags.topic_lock {
        options.push("Topic lock");
    }
    if record.flags.private {
        options.push("Private");
    }
    if record.flags.secure_ops {
        options.push("Secure ops");
    }
    if record.flags.leave_ops {
        options.push("Leave ops");
    }
    if record.flags.restricted {
        options.push("Restricted access");
    }
    if record.flags.secure {
        options.push("Security");
    }
    if record.flags.op_notice {
        options.push("Op notice");
    }
    if record.no_expire {
        options.push("No expire");
    }
    lines.push(format!(
        "        Options: {}",
        if options.is_empty() {
            "None".to_owned()
        } else {
            options.join(", ")
        }
    ));

    for line in lines {
        reply(net, &service, user_key, &line);
    }
}
