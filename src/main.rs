//! slservd - Straylight IRC Services Daemon.
//!
//! Wires the pieces together and runs the single owner loop: protocol
//! events, one-second timer ticks, periodic expiry sweeps and saves all
//! execute on one task, never concurrently.

use slservd::config::Config;
use slservd::db::Db;
use slservd::handlers::Registry;
use slservd::state::Network;
use slservd::uplink;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "slservd.toml".to_string());
    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "failed to load config");
        e
    })?;

    info!(
        server = %config.uplink.server_name,
        network = %config.uplink.network,
        read_only = config.read_only,
        "starting slservd"
    );

    let db = Db::new(&config.database.dir)?;
    let save_interval = config.database.save_interval.max(1) as i64;
    let expire_interval = config.database.expire_interval.max(1) as i64;

    let (transport, mut events) = uplink::connect(&config.uplink).await?;
    uplink::introduce_services(&transport, &config);

    let now = chrono::Utc::now().timestamp();
    let mut net = Network::new(config, Box::new(transport), now);
    // Unreadable registries are fatal here and only here.
    db.load_all(&mut net)?;

    let registry = Registry::new();
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let mut last_save = now;
    let mut last_expire = now;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!("uplink gone, saving and shutting down");
                    break;
                };
                let now = chrono::Utc::now().timestamp();
                registry.dispatch(&mut net, &event, now);
            }
            _ = tick.tick() => {
                let now = chrono::Utc::now().timestamp();
                net.tick(now);
                if now - last_expire >= expire_interval {
                    last_expire = now;
                    net.expire_sweep(now);
                }
                if now - last_save >= save_interval {
                    last_save = now;
                    if let Err(e) = db.save_all(&mut net) {
                        error!(error = %e, "periodic save failed");
                    }
                }
            }
        }
    }

    db.save_all(&mut net)?;
    Ok(())
}
