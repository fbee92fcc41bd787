//! Shared test infrastructure: an in-process agent on an ephemeral
//! localhost port with automatic shutdown, plus client helpers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use async_mib::{Agent, Client, ClientConfig, Retry, UdpTransport};
use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An in-process agent under test.
///
/// Starts serving when spawned and shuts down when dropped.
pub struct TestAgent {
    addr: SocketAddr,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl TestAgent {
    /// Take ownership of a configured agent and run it in the background.
    pub fn spawn(agent: Agent) -> Self {
        let addr = agent.local_addr();
        let cancel = agent.cancel();
        let task = tokio::spawn(async move {
            if let Err(e) = agent.run().await {
                eprintln!("TestAgent error: {}", e);
            }
        });

        Self {
            addr,
            cancel,
            _task: task,
        }
    }

    /// The agent's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Explicitly stop the agent (also happens on drop).
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A loopback agent accepting the default community, not yet spawned, so
/// tests can register plugins and proxies first.
pub async fn build_agent() -> Agent {
    Agent::builder()
        .bind("127.0.0.1:0")
        .sys_name("test-agent")
        .sys_contact("tests@example.net")
        .sys_location("memory")
        .build()
        .await
        .expect("failed to build test agent")
}

/// A client pointed at `addr` with a short timeout and no retries.
pub async fn client_for(addr: SocketAddr, community: &str) -> Client<UdpTransport> {
    let config = ClientConfig {
        community: Bytes::copy_from_slice(community.as_bytes()),
        timeout: Duration::from_millis(500),
        retry: Retry::none(),
    };
    Client::connect(addr, config)
        .await
        .expect("failed to connect test client")
}
