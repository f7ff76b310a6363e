//! Uplink transport.
//!
//! The thin line-framed connection to the network: a reader task that
//! tokenizes inbound lines into events, and a writer that drains the
//! outbound queue. Everything interesting happens in the core; this
//! module only moves lines.

use crate::config::UplinkConfig;
use crate::transport::Transport;
use futures_util::{SinkExt, StreamExt};
use slserv_proto::line::with_source;
use slserv_proto::Event;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

/// Outbound side of the uplink; cheap to clone into the core.
#[derive(Debug, Clone)]
pub struct UplinkTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl Transport for UplinkTransport {
    fn send(&self, source: &str, line: &str) {
        // A send after disconnect is dropped; the reconnect logic in
        // main owns recovery.
        let _ = self.tx.send(with_source(source, line));
    }
}

/// Connect to the uplink and start the read/write pumps.
///
/// Returns the outbound transport and the stream of decoded events.
/// The event channel closing means the link died.
pub async fn connect(
    config: &UplinkConfig,
) -> anyhow::Result<(UplinkTransport, mpsc::UnboundedReceiver<Event>)> {
    let stream = TcpStream::connect(&config.addr).await?;
    info!(addr = %config.addr, "connected to uplink");
    let mut framed = Framed::new(stream, LinesCodec::new());

    // Introduce ourselves as a server link.
    framed
        .send(format!("PASS {}", config.password))
        .await?;
    framed
        .send(format!(
            "SERVER {} 1 :{}",
            config.server_name, config.description
        ))
        .await?;

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    tokio::spawn(async move {
        let (mut sink, mut source) = framed.split();
        loop {
            tokio::select! {
                outbound = out_rx.recv() => {
                    match outbound {
                        Some(line) => {
                            if let Err(e) = sink.send(line).await {
                                warn!(error = %e, "uplink write failed");
                                break;
                            }
                        }
                        None => break,
                    }
                }
                inbound = source.next() => {
                    match inbound {
                        Some(Ok(line)) => match Event::parse(&line) {
                            Ok(event) => {
                                if event_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => debug!(error = %e, line = %line, "unparseable line"),
                        },
                        Some(Err(e)) => {
                            warn!(error = %e, "uplink read failed");
                            break;
                        }
                        None => {
                            info!("uplink closed the connection");
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok((UplinkTransport { tx: out_tx }, event_rx))
}

/// Introduce the service pseudo-clients after the link is up.
pub fn introduce_services(transport: &UplinkTransport, config: &crate::config::Config) {
    let server = &config.uplink.server_name;
    for nick in [
        &config.services.nickserv,
        &config.services.chanserv,
        &config.services.operserv,
    ] {
        transport.send(
            server,
            &format!(
                "NICK {} 1 1 {} {} {} :Services",
                nick, config.services.user, config.services.host, server
            ),
        );
    }
}
