//! # async-mib
//!
//! An async SNMPv1 agent serving a user-extensible MIB tree.
//!
//! The MIB is a sparse tree of object identifiers with three kinds of
//! registered leaves:
//!
//! - **plugins** — producer functions returning arbitrary nested shapes
//!   (scalars, sequences, sparse maps), optionally cached for N seconds;
//! - **proxies** — delegations of a subtree to an upstream SNMP agent;
//! - **literal values** — plain scalars.
//!
//! Managers talk to the agent with `GetRequest` and `GetNextRequest`; the
//! tree engine resolves exact lookups and lexicographic successors across
//! plugin views and proxied subtrees, which is what makes SNMP walks work.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_mib::{Agent, PluginOutput, oid};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), async_mib::Error> {
//!     let mut agent = Agent::builder()
//!         .bind("0.0.0.0:161")
//!         .community("public")
//!         .sys_name("router1")
//!         .sys_contact("ops@example.net")
//!         .build()
//!         .await?;
//!
//!     // A cached table of fan speeds under an enterprise OID
//!     agent.add_plugin(&oid!(1, 3, 6, 1, 4, 1, 99999, 4), |_ctx| {
//!         Ok(PluginOutput::cached(
//!             vec![1200, 1180, 1210],
//!             Duration::from_secs(30),
//!         ))
//!     })?;
//!
//!     agent.run().await
//! }
//! ```

pub mod agent;
pub mod ber;
pub mod client;
pub mod error;
pub mod message;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod transport;
pub mod value;
pub mod varbind;

pub(crate) mod util;

// Re-exports for convenience
pub use agent::{Agent, AgentBuilder};
pub use client::{Backoff, Client, ClientConfig, Retry};
pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use message::CommunityMessage;
pub use mib::{
    BoxFuture, Lookup, ManagerClient, MibTree, PluginContext, PluginOutput, PluginValue,
};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use transport::{Transport, UdpTransport};
pub use value::Value;
pub use varbind::VarBind;
