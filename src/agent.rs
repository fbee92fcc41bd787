//! SNMPv1 agent.
//!
//! The agent owns the MIB tree, a UDP socket, and the accepted community
//! set. Registration (`add_plugin`, `add_proxy`, `add_plugin_dir`) happens
//! before [`Agent::run`]; request handling within one agent is sequential.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_mib::{Agent, PluginOutput, oid};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), async_mib::Error> {
//!     let mut agent = Agent::builder()
//!         .bind("0.0.0.0:161")
//!         .community("public")
//!         .sys_name("router1")
//!         .build()
//!         .await?;
//!
//!     agent.add_plugin(&oid!(1, 3, 6, 1, 4, 1, 99999, 1), |_ctx| {
//!         Ok(PluginOutput::new(vec![42, 43]))
//!     })?;
//!
//!     agent.run().await
//! }
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use subtle::ConstantTimeEq;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::client::{Client, ClientConfig};
use crate::error::{Error, ErrorStatus, Result};
use crate::message::CommunityMessage;
use crate::mib::{
    ManagerClient, MibTree, PluginContext, PluginOutput, PluginValue, parse_plugin_file,
};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::util::bind_udp_socket;
use crate::value::Value;
use crate::varbind::VarBind;

/// Default UDP listen address.
const DEFAULT_BIND: &str = "0.0.0.0:161";

/// Default maximum UDP read size.
const DEFAULT_MAX_PACKET: usize = 8000;

/// The OID of the auto-registered system group (mib-2 system).
const SYSTEM_GROUP: [u32; 7] = [1, 3, 6, 1, 2, 1, 1];

/// Builder for [`Agent`].
pub struct AgentBuilder {
    bind_addr: String,
    max_packet: usize,
    communities: Vec<Bytes>,
    sys_contact: String,
    sys_name: String,
    sys_location: String,
    cancel: Option<CancellationToken>,
}

impl AgentBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Bind address: `0.0.0.0:161` (UDP)
    /// - Max packet size: 8000 bytes
    /// - Community: `public` (when none configured)
    /// - Empty sysContact / sysName / sysLocation
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            max_packet: DEFAULT_MAX_PACKET,
            communities: Vec::new(),
            sys_contact: String::new(),
            sys_name: String::new(),
            sys_location: String::new(),
            cancel: None,
        }
    }

    /// Set the UDP bind address.
    ///
    /// Binding to port 161 typically requires elevated privileges; tests
    /// bind to `127.0.0.1:0` for an ephemeral port.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set the maximum UDP read size.
    pub fn max_packet(mut self, size: usize) -> Self {
        self.max_packet = size;
        self
    }

    /// Add an accepted community string. May be called repeatedly.
    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.communities
            .push(Bytes::copy_from_slice(community.as_ref()));
        self
    }

    /// Add multiple accepted community strings.
    pub fn communities<I, C>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        for c in communities {
            self.communities.push(Bytes::copy_from_slice(c.as_ref()));
        }
        self
    }

    /// Set the sysContact string served from the system group.
    pub fn sys_contact(mut self, contact: impl Into<String>) -> Self {
        self.sys_contact = contact.into();
        self
    }

    /// Set the sysName string served from the system group.
    pub fn sys_name(mut self, name: impl Into<String>) -> Self {
        self.sys_name = name.into();
        self
    }

    /// Set the sysLocation string served from the system group.
    pub fn sys_location(mut self, location: impl Into<String>) -> Self {
        self.sys_location = location.into();
        self
    }

    /// Set a cancellation token for graceful shutdown.
    ///
    /// If not set, the agent creates its own token accessible via
    /// [`Agent::cancel`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind the socket and build the agent.
    ///
    /// Auto-registers the system group plugin at `1.3.6.1.2.1.1` serving
    /// host identification, uptime ticks since this call, and the
    /// configured sysContact / sysName / sysLocation.
    pub async fn build(self) -> Result<Agent> {
        let bind_addr: SocketAddr = self
            .bind_addr
            .parse()
            .map_err(|_| Error::config(format!("invalid bind address: {}", self.bind_addr)))?;

        let socket = bind_udp_socket(bind_addr).map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;
        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;

        let communities = if self.communities.is_empty() {
            vec![Bytes::from_static(b"public")]
        } else {
            self.communities
        };

        let mut agent = Agent {
            socket,
            local_addr,
            mib: MibTree::new(),
            communities,
            max_packet: self.max_packet,
            started: Instant::now(),
            cancel: self.cancel.unwrap_or_default(),
        };
        agent.register_system_group(self.sys_contact, self.sys_name, self.sys_location)?;

        Ok(agent)
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// SNMPv1 agent serving Get and GetNext out of the MIB tree.
pub struct Agent {
    socket: UdpSocket,
    local_addr: SocketAddr,
    mib: MibTree,
    communities: Vec<Bytes>,
    max_packet: usize,
    started: Instant,
    cancel: CancellationToken,
}

impl Agent {
    /// Create a builder for configuring the agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Get the local address the agent is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the cancellation token; cancel it to stop [`Agent::run`].
    pub fn cancel(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The MIB tree, for direct registration or inspection.
    pub fn mib(&mut self) -> &mut MibTree {
        &mut self.mib
    }

    /// Register a plugin producer owning the subtree at `base`.
    ///
    /// Fails with [`Error::Occupied`] or [`Error::EncroachesOnPlugin`] when
    /// the registration rule is violated.
    pub fn add_plugin<F>(&mut self, base: &Oid, producer: F) -> Result<()>
    where
        F: Fn(&PluginContext) -> Result<PluginOutput> + Send + Sync + 'static,
    {
        self.mib.register_plugin(base, Box::new(producer))
    }

    /// Register a proxy delegating the subtree at `base` to the agent at
    /// `host:port`.
    pub async fn add_proxy(&mut self, base: &Oid, host: &str, port: u16) -> Result<()> {
        let target = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| Error::Io {
                target: None,
                source: e,
            })?
            .next()
            .ok_or_else(|| Error::config(format!("cannot resolve {host}:{port}")))?;

        let client = Client::connect(target, ClientConfig::default()).await?;
        self.mib.register_proxy(base, Arc::new(client))
    }

    /// Register a proxy with an explicit upstream client handle.
    ///
    /// Tests substitute an in-memory client here.
    pub fn add_proxy_client(&mut self, base: &Oid, client: Arc<dyn ManagerClient>) -> Result<()> {
        self.mib.register_proxy(base, client)
    }

    /// Batch-register plugins from a directory.
    ///
    /// Files whose name parses as a dotted OID are read and their body
    /// parsed as a value literal; each becomes a plugin at that OID. A file
    /// that fails to parse or register is logged at warning level and
    /// skipped; the rest of the directory still loads. Other files are
    /// ignored.
    pub fn add_plugin_dir(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let entries = std::fs::read_dir(path).map_err(|e| Error::Io {
            target: None,
            source: e,
        })?;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(target: "async_mib::agent", { dir = %path.display(), error = %err }, "unreadable directory entry");
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(base) = parse_oid_filename(name) else {
                tracing::debug!(target: "async_mib::agent", { file = name }, "ignoring non-OID file");
                continue;
            };

            let loaded = std::fs::read_to_string(entry.path())
                .map_err(|e| Error::Io {
                    target: None,
                    source: e,
                })
                .and_then(|text| parse_plugin_file(&text))
                .and_then(|output| {
                    let cache_for = output.cache_for;
                    let value = output.value;
                    self.add_plugin(&base, move |_ctx| {
                        Ok(PluginOutput {
                            value: value.clone(),
                            cache_for,
                        })
                    })
                });

            if let Err(err) = loaded {
                tracing::warn!(target: "async_mib::agent", { file = name, error = %err }, "skipping plugin file");
            } else {
                tracing::debug!(target: "async_mib::agent", { file = name, base = %base }, "loaded plugin file");
            }
        }

        Ok(())
    }

    /// Serve one Get request: every varbind's value becomes the typed
    /// lookup of its name, `NoSuchObject` where nothing exists.
    pub async fn process_get_request(&self, message: CommunityMessage) -> CommunityMessage {
        self.process_get(message, None).await
    }

    /// Serve one GetNext request.
    ///
    /// Each varbind's name is rewritten to its lexicographic successor and
    /// the value to the successor's typed lookup. A varbind with no
    /// successor has its name rewritten to the OID `0`, and the PDU's
    /// error-status set to noSuchName with error-index naming the varbind's
    /// position as iterated.
    pub async fn process_get_next_request(&self, message: CommunityMessage) -> CommunityMessage {
        self.process_get_next(message, None).await
    }

    async fn process_get(
        &self,
        message: CommunityMessage,
        source: Option<SocketAddr>,
    ) -> CommunityMessage {
        let ctx = PluginContext {
            community: message.community.clone(),
            source,
        };
        let pdu = &message.pdu;

        let mut varbinds = Vec::with_capacity(pdu.varbinds.len());
        for vb in &pdu.varbinds {
            let value = self.mib.get_value(&vb.oid, &ctx).await;
            varbinds.push(VarBind::new(vb.oid.clone(), value));
        }

        CommunityMessage::new(
            message.community.clone(),
            Pdu::response(pdu.request_id, varbinds),
        )
    }

    async fn process_get_next(
        &self,
        message: CommunityMessage,
        source: Option<SocketAddr>,
    ) -> CommunityMessage {
        let ctx = PluginContext {
            community: message.community.clone(),
            source,
        };
        let pdu = &message.pdu;

        let mut response = Pdu::response(pdu.request_id, Vec::with_capacity(pdu.varbinds.len()));
        for (index, vb) in pdu.varbinds.iter().enumerate() {
            match self.mib.next(&vb.oid, &ctx).await {
                Some(successor) => {
                    let value = self.mib.get_value(&successor, &ctx).await;
                    response.varbinds.push(VarBind::new(successor, value));
                }
                None => {
                    response
                        .varbinds
                        .push(VarBind::new(Oid::from_slice(&[0]), Value::Null));
                    response.error_status = ErrorStatus::NoSuchName.as_i32();
                    response.error_index = index as i32;
                }
            }
        }

        CommunityMessage::new(message.community.clone(), response)
    }

    /// Run the serving loop until the cancellation token fires.
    ///
    /// Handling is sequential: one datagram is received, dispatched, and
    /// answered before the next is read. Per-request failures are logged
    /// and never terminate the loop.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(target: "async_mib::agent", { local_addr = %self.local_addr }, "agent listening");
        let mut buf = vec![0u8; self.max_packet];

        loop {
            let (len, source) = tokio::select! {
                result = self.socket.recv_from(&mut buf) => match result {
                    Ok(received) => received,
                    Err(err) => {
                        // A closed socket is the shutdown path; anything
                        // else is logged and survived.
                        if self.cancel.is_cancelled() {
                            return Ok(());
                        }
                        tracing::error!(target: "async_mib::agent", { error = %err }, "receive failed");
                        continue;
                    }
                },
                _ = self.cancel.cancelled() => {
                    tracing::info!(target: "async_mib::agent", "agent shutdown requested");
                    return Ok(());
                }
            };

            let data = Bytes::copy_from_slice(&buf[..len]);
            if let Some(response) = self.handle_datagram(data, source).await
                && let Err(err) = self.socket.send_to(&response, source).await
            {
                tracing::warn!(target: "async_mib::agent", { source = %source, error = %err }, "failed to send response");
            }
        }
    }

    /// Decode, authorize, and dispatch one datagram.
    ///
    /// Returns `None` whenever no response should be sent: community
    /// mismatch (silent drop) or an undecodable/unsupported message.
    async fn handle_datagram(&self, data: Bytes, source: SocketAddr) -> Option<Bytes> {
        let message = match CommunityMessage::decode(data) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(target: "async_mib::agent", { source = %source, error = %err }, "unknown message");
                return None;
            }
        };

        if !self.validate_community(&message.community) {
            tracing::debug!(target: "async_mib::agent", { source = %source }, "community mismatch, dropping request");
            return None;
        }

        let response = match message.pdu.pdu_type {
            PduType::GetRequest => self.process_get(message, Some(source)).await,
            PduType::GetNextRequest => self.process_get_next(message, Some(source)).await,
            PduType::Response => {
                tracing::error!(target: "async_mib::agent", { source = %source }, "unexpected response PDU");
                return None;
            }
        };

        Some(response.encode())
    }

    /// Validate a community string against the configured set.
    ///
    /// Comparison is constant-time per candidate so community strings are
    /// not guessable character by character.
    fn validate_community(&self, community: &[u8]) -> bool {
        let mut valid = false;
        for configured in &self.communities {
            if configured.len() == community.len()
                && bool::from(configured.as_ref().ct_eq(community))
            {
                valid = true;
            }
        }
        valid
    }

    /// The auto-registered mib-2 system group.
    fn register_system_group(
        &mut self,
        contact: String,
        name: String,
        location: String,
    ) -> Result<()> {
        let started = self.started;
        let descr = format!(
            "async-mib {} on {} {}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH,
        );

        self.mib
            .register_plugin(&Oid::from_slice(&SYSTEM_GROUP), Box::new(move |_ctx| {
                let uptime = (started.elapsed().as_millis() / 10).min(u32::MAX as u128) as u32;
                let mut group: BTreeMap<u32, PluginValue> = BTreeMap::new();
                group.insert(1, PluginValue::Seq(vec![descr.clone().into()]));
                group.insert(
                    3,
                    PluginValue::Seq(vec![Value::TimeTicks(uptime).into()]),
                );
                group.insert(4, PluginValue::Seq(vec![contact.clone().into()]));
                group.insert(5, PluginValue::Seq(vec![name.clone().into()]));
                group.insert(6, PluginValue::Seq(vec![location.clone().into()]));
                Ok(PluginOutput::new(PluginValue::Map(group)))
            }))
    }
}

/// Interpret a file name as a registration OID: dotted digits only.
fn parse_oid_filename(name: &str) -> Option<Oid> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return None;
    }
    Oid::parse(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn get_message(community: &[u8], oids: &[Oid]) -> CommunityMessage {
        CommunityMessage::new(Bytes::copy_from_slice(community), Pdu::get_request(7, oids))
    }

    fn get_next_message(community: &[u8], oids: &[Oid]) -> CommunityMessage {
        CommunityMessage::new(
            Bytes::copy_from_slice(community),
            Pdu::get_next_request(7, oids),
        )
    }

    async fn test_agent() -> Agent {
        Agent::builder()
            .bind("127.0.0.1:0")
            .sys_name("testhost")
            .sys_contact("ops@example.net")
            .sys_location("rack 3")
            .build()
            .await
            .expect("failed to build test agent")
    }

    #[tokio::test]
    async fn get_serves_plugin_scalar() {
        let mut agent = test_agent().await;
        agent
            .add_plugin(&oid!(1, 2, 3), |_| Ok(PluginOutput::new(42)))
            .unwrap();

        let response = agent
            .process_get_request(get_message(b"public", &[oid!(1, 2, 3)]))
            .await;
        assert_eq!(response.pdu.pdu_type, PduType::Response);
        assert_eq!(response.pdu.request_id, 7);
        assert_eq!(response.pdu.varbinds[0].value, Value::Integer(42));

        // Below the scalar: NoSuchObject, request still succeeds
        let response = agent
            .process_get_request(get_message(b"public", &[oid!(1, 2, 3, 4)]))
            .await;
        assert_eq!(response.pdu.varbinds[0].value, Value::NoSuchObject);
        assert_eq!(response.pdu.error_status, 0);
    }

    #[tokio::test]
    async fn get_next_walks_and_flags_end_of_view() {
        let mut agent = test_agent().await;
        agent
            .add_plugin(&oid!(3, 2, 1), |_| {
                Ok(PluginOutput::new(vec![1, 1, 2, 3, 5, 8, 13]))
            })
            .unwrap();

        let response = agent
            .process_get_next_request(get_next_message(
                b"public",
                &[oid!(3, 2, 1), oid!(3, 2, 1, 4), oid!(3, 2, 1, 6)],
            ))
            .await;

        let vbs = &response.pdu.varbinds;
        assert_eq!(vbs[0].oid, oid!(3, 2, 1, 0));
        assert_eq!(vbs[0].value, Value::Integer(1));
        assert_eq!(vbs[1].oid, oid!(3, 2, 1, 5));
        assert_eq!(vbs[1].value, Value::Integer(8));
        assert_eq!(vbs[2].oid, oid!(0));
        assert_eq!(vbs[2].value, Value::Null);
        assert_eq!(response.pdu.error_status, ErrorStatus::NoSuchName.as_i32());
        assert_eq!(response.pdu.error_index, 2);
    }

    #[tokio::test]
    async fn get_next_descends_into_scalar_plugin() {
        let mut agent = test_agent().await;
        agent
            .add_plugin(&oid!(3, 2, 1), |_| Ok(PluginOutput::new(42)))
            .unwrap();

        let response = agent
            .process_get_next_request(get_next_message(b"public", &[oid!(3, 2)]))
            .await;
        assert_eq!(response.pdu.varbinds[0].oid, oid!(3, 2, 1));
        assert_eq!(response.pdu.varbinds[0].value, Value::Integer(42));
    }

    #[tokio::test]
    async fn failing_producer_yields_no_such_object() {
        let mut agent = test_agent().await;
        agent
            .add_plugin(&oid!(1, 2, 3), |_| Err(Error::config("broken sensor")))
            .unwrap();

        let response = agent
            .process_get_request(get_message(b"public", &[oid!(1, 2, 3, 4)]))
            .await;
        assert_eq!(response.pdu.varbinds[0].value, Value::NoSuchObject);
    }

    #[tokio::test]
    async fn producer_receives_request_community() {
        let mut agent = test_agent().await;
        agent
            .add_plugin(&oid!(1, 2, 3), |ctx| {
                Ok(PluginOutput::new(
                    std::str::from_utf8(&ctx.community).unwrap_or("").to_string(),
                ))
            })
            .unwrap();

        let response = agent
            .process_get_request(get_message(b"public", &[oid!(1, 2, 3)]))
            .await;
        assert_eq!(response.pdu.varbinds[0].value.as_str(), Some("public"));
    }

    #[tokio::test]
    async fn sparse_plugin_walks_skip_empty_branches() {
        let mut agent = test_agent().await;
        agent
            .add_plugin(&oid!(27068, 2, 2, 7), |_| {
                let mut map: BTreeMap<u32, PluginValue> = BTreeMap::new();
                for key in 1..=14u32 {
                    map.insert(key, PluginValue::Seq(vec![]));
                }
                map.insert(6, PluginValue::Seq(vec![5.into(), 6.into(), 7.into()]));
                map.insert(7, PluginValue::Seq(vec![1171334642.into()]));
                map.insert(11, PluginValue::Seq(vec![1.into(), 2.into()]));
                Ok(PluginOutput::new(PluginValue::Map(map)))
            })
            .unwrap();

        let response = agent
            .process_get_next_request(get_next_message(b"public", &[oid!(27068, 2, 2, 7, 6, 2)]))
            .await;
        assert_eq!(response.pdu.varbinds[0].oid, oid!(27068, 2, 2, 7, 7, 0));
        assert_eq!(response.pdu.varbinds[0].value, Value::Integer(1171334642));

        let response = agent
            .process_get_next_request(get_next_message(b"public", &[oid!(27068, 2, 2, 7, 7, 2)]))
            .await;
        assert_eq!(response.pdu.varbinds[0].oid, oid!(27068, 2, 2, 7, 11, 0));
        assert_eq!(response.pdu.varbinds[0].value, Value::Integer(1));
    }

    #[tokio::test]
    async fn system_group_is_served() {
        let agent = test_agent().await;

        let response = agent
            .process_get_request(get_message(
                b"public",
                &[
                    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0),
                    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0),
                    oid!(1, 3, 6, 1, 2, 1, 1, 6, 0),
                ],
            ))
            .await;
        let vbs = &response.pdu.varbinds;
        assert_eq!(vbs[0].value.as_str(), Some("ops@example.net"));
        assert_eq!(vbs[1].value.as_str(), Some("testhost"));
        assert_eq!(vbs[2].value.as_str(), Some("rack 3"));

        let response = agent
            .process_get_request(get_message(b"public", &[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]))
            .await;
        assert!(matches!(
            response.pdu.varbinds[0].value,
            Value::TimeTicks(_)
        ));
    }

    #[tokio::test]
    async fn system_group_occupies_its_subtree() {
        let mut agent = test_agent().await;
        let err = agent
            .add_plugin(&oid!(1, 3, 6, 1, 2, 1, 1, 5), |_| Ok(PluginOutput::new(1)))
            .unwrap_err();
        assert!(matches!(err, Error::EncroachesOnPlugin { .. }));
    }

    #[tokio::test]
    async fn community_validation_is_membership() {
        let agent = Agent::builder()
            .bind("127.0.0.1:0")
            .communities(["private", "parts"])
            .build()
            .await
            .unwrap();

        assert!(agent.validate_community(b"private"));
        assert!(agent.validate_community(b"parts"));
        assert!(!agent.validate_community(b"somethingfunny"));
        assert!(!agent.validate_community(b"privat"));
    }

    #[tokio::test]
    async fn plugin_dir_loads_oid_named_files() {
        let dir = std::env::temp_dir().join(format!(
            "async-mib-plugins-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("1.2.3"), "[10, 20, 30]").unwrap();
        std::fs::write(dir.join("1.2.4"), "\"label\"").unwrap();
        std::fs::write(dir.join("1.2.5"), "{broken").unwrap();
        std::fs::write(dir.join("README"), "not a plugin").unwrap();

        let mut agent = test_agent().await;
        agent.add_plugin_dir(&dir).unwrap();

        let response = agent
            .process_get_request(get_message(
                b"public",
                &[oid!(1, 2, 3, 1), oid!(1, 2, 4), oid!(1, 2, 5)],
            ))
            .await;
        let vbs = &response.pdu.varbinds;
        assert_eq!(vbs[0].value, Value::Integer(20));
        assert_eq!(vbs[1].value.as_str(), Some("label"));
        // The malformed file was skipped, not fatal
        assert_eq!(vbs[2].value, Value::NoSuchObject);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn oid_filenames() {
        assert_eq!(parse_oid_filename("1.2.3"), Some(oid!(1, 2, 3)));
        assert_eq!(parse_oid_filename("10"), Some(oid!(10)));
        assert_eq!(parse_oid_filename("README"), None);
        assert_eq!(parse_oid_filename("1.2.3.txt"), None);
        assert_eq!(parse_oid_filename(".1.2"), None);
        assert_eq!(parse_oid_filename("1..2"), None);
        assert_eq!(parse_oid_filename(""), None);
    }
}
