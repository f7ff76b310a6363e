//! slservd - Straylight IRC Services Daemon.
//!
//! A single-process network-services daemon that links to an IRC
//! network as a pseudo-server and provides nickname and channel
//! registration, access control and network policing (autokill, session
//! limiting, clone detection).
//!
//! The crate is organized around one rule: every registry and every
//! piece of live network state is owned by [`state::Network`], and all
//! mutation funnels through a single task. Protocol events arrive as
//! decoded [`slserv_proto::Event`]s via [`handlers::Registry`]; service
//! commands arrive as PRIVMSGs and run through [`services`]; outbound
//! lines leave through [`transport::Transport`].

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod security;
pub mod services;
pub mod state;
pub mod timers;
pub mod transport;
pub mod uplink;
