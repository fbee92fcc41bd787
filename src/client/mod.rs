//! SNMPv1 manager client.
//!
//! The narrow client proxies need: `get` and `get_next` over a pluggable
//! [`Transport`], with request-id correlation, a finite timeout, and
//! configurable retries.

mod retry;

pub use retry::{Backoff, Retry};

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::error::{DecodeErrorKind, Error, Result};
use crate::message::CommunityMessage;
use crate::mib::{BoxFuture, ManagerClient};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::transport::{Transport, UdpTransport};
use crate::varbind::VarBind;

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Community string (default: "public")
    pub community: Bytes,
    /// Request timeout (default: 1 second)
    pub timeout: Duration,
    /// Retry configuration (default: 3 retries, no backoff)
    pub retry: Retry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            community: Bytes::from_static(b"public"),
            timeout: Duration::from_secs(1),
            retry: Retry::default(),
        }
    }
}

/// SNMPv1 client, generic over transport.
#[derive(Clone)]
pub struct Client<T: Transport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
    transport: T,
    config: ClientConfig,
    request_id: AtomicI32,
}

impl Client<UdpTransport> {
    /// Connect a UDP client to `target` with the given configuration.
    pub async fn connect(target: std::net::SocketAddr, config: ClientConfig) -> Result<Self> {
        let transport = UdpTransport::connect(target).await?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over an existing transport.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                request_id: AtomicI32::new(1),
            }),
        }
    }

    fn next_request_id(&self) -> i32 {
        self.inner.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Issue a Get for the given names.
    pub async fn get(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let pdu = Pdu::get_request(self.next_request_id(), oids);
        let response = self.send_request(pdu).await?;
        Ok(response.varbinds)
    }

    /// Issue a GetNext for the given names.
    pub async fn get_next(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let pdu = Pdu::get_next_request(self.next_request_id(), oids);
        let response = self.send_request(pdu).await?;
        Ok(response.varbinds)
    }

    async fn send_request(&self, pdu: Pdu) -> Result<Pdu> {
        tracing::debug!(target: "async_mib::client", { pdu_type = %pdu.pdu_type, varbind_count = pdu.varbinds.len() }, "sending request");

        let request_id = pdu.request_id;
        let message = CommunityMessage::new(self.inner.config.community.clone(), pdu);
        let data = message.encode();
        self.send_and_recv(request_id, &data).await
    }

    async fn send_and_recv(&self, request_id: i32, data: &[u8]) -> Result<Pdu> {
        let start = Instant::now();
        let max_attempts = self.inner.config.retry.max_attempts;
        let mut last_error: Option<Error> = None;

        for attempt in 0..=max_attempts {
            if attempt > 0 {
                tracing::debug!(target: "async_mib::client", { request_id, attempt }, "retrying request");
            }

            self.inner.transport.send(data).await?;

            match self
                .inner
                .transport
                .recv(request_id, self.inner.config.timeout)
                .await
            {
                Ok((response_data, _source)) => {
                    let response = CommunityMessage::decode(response_data)?;
                    let response_pdu = response.into_pdu();

                    if response_pdu.pdu_type != PduType::Response
                        || response_pdu.request_id != request_id
                    {
                        tracing::warn!(target: "async_mib::client", { expected = request_id, actual = response_pdu.request_id, peer = %self.inner.transport.peer_addr() }, "response failed correlation");
                        return Err(Error::MalformedResponse {
                            target: self.inner.transport.peer_addr(),
                        });
                    }

                    if response_pdu.is_error() {
                        return Err(Error::Snmp {
                            target: Some(self.inner.transport.peer_addr()),
                            status: response_pdu.error_status_enum(),
                            index: response_pdu.error_index.max(0) as u32,
                        });
                    }

                    if response_pdu.varbinds.is_empty() {
                        return Err(Error::decode(0, DecodeErrorKind::EmptyResponse));
                    }

                    return Ok(response_pdu);
                }
                Err(Error::Timeout { .. }) => {
                    last_error = Some(Error::Timeout {
                        target: Some(self.inner.transport.peer_addr()),
                        elapsed: start.elapsed(),
                        request_id,
                        retries: attempt,
                    });
                    if attempt < max_attempts {
                        let delay = self.inner.config.retry.compute_delay(attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let elapsed = start.elapsed();
        tracing::debug!(target: "async_mib::client", { request_id, peer = %self.inner.transport.peer_addr(), ?elapsed, retries = max_attempts }, "request timed out");
        Err(last_error.unwrap_or(Error::Timeout {
            target: Some(self.inner.transport.peer_addr()),
            elapsed,
            request_id,
            retries: max_attempts,
        }))
    }
}

impl<T: Transport + 'static> ManagerClient for Client<T> {
    fn get<'a>(&'a self, oids: &'a [Oid]) -> BoxFuture<'a, Result<Vec<VarBind>>> {
        Box::pin(Client::get(self, oids))
    }

    fn get_next<'a>(&'a self, oids: &'a [Oid]) -> BoxFuture<'a, Result<Vec<VarBind>>> {
        Box::pin(Client::get_next(self, oids))
    }
}
