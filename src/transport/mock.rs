//! Mock transport for testing.
//!
//! A programmable transport that simulates an upstream agent without a
//! network: queue responses, timeouts, or I/O errors and inspect the
//! requests the client sent.

use super::Transport;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock response to return for a request.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this data (request_id patched to match the request)
    Data(Bytes),
    /// Return this data as-is, without request_id patching
    RawData(Bytes),
    /// Simulate a timeout
    Timeout,
    /// Simulate an IO error
    IoError(String),
}

struct MockTransportInner {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<Bytes>,
    default_response: Option<MockResponse>,
    last_request_id: Option<i32>,
}

/// Mock transport for testing the manager client and proxies.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    /// Create a new mock transport pretending to talk to `target`.
    pub fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
                default_response: None,
                last_request_id: None,
            })),
        }
    }

    /// Queue a data response; its request_id is patched to match the
    /// request actually sent.
    pub fn queue_response(&self, data: impl Into<Bytes>) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(MockResponse::Data(data.into()));
    }

    /// Queue a raw response without request_id patching.
    pub fn queue_raw_response(&self, data: impl Into<Bytes>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .responses
            .push_back(MockResponse::RawData(data.into()));
    }

    /// Queue a timeout.
    pub fn queue_timeout(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(MockResponse::Timeout);
    }

    /// Queue an IO error.
    pub fn queue_io_error(&self, msg: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(MockResponse::IoError(msg.into()));
    }

    /// Set a default response for when the queue is empty.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut inner = self.inner.lock().unwrap();
        inner.default_response = Some(response);
    }

    /// Raw bytes of every request sent so far.
    pub fn requests(&self) -> Vec<Bytes> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Number of queued responses remaining.
    pub fn queued_response_count(&self) -> usize {
        self.inner.lock().unwrap().responses.len()
    }

    fn extract_request_id(data: &[u8]) -> Option<i32> {
        use crate::message::CommunityMessage;
        CommunityMessage::decode(Bytes::copy_from_slice(data))
            .ok()
            .map(|msg| msg.pdu.request_id)
    }

    /// Patch the request_id in a queued response to match the request.
    fn patch_response_request_id(data: Bytes, new_id: i32) -> Bytes {
        use crate::message::CommunityMessage;

        let Ok(mut msg) = CommunityMessage::decode(data.clone()) else {
            return data; // Can't decode, return as-is
        };
        msg.pdu.request_id = new_id;
        msg.encode()
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let data = Bytes::copy_from_slice(data);
        let request_id = Self::extract_request_id(&data);

        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(data);
        inner.last_request_id = request_id;
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let (response, target, last_req_id) = {
            let mut inner = self.inner.lock().unwrap();
            let response = inner
                .responses
                .pop_front()
                .or_else(|| inner.default_response.clone());
            (response, inner.target, inner.last_request_id)
        };

        match response {
            Some(MockResponse::Data(data)) => {
                let patched = if let Some(req_id) = last_req_id {
                    Self::patch_response_request_id(data, req_id)
                } else {
                    data
                };
                Ok((patched, target))
            }
            Some(MockResponse::RawData(data)) => Ok((data, target)),
            Some(MockResponse::IoError(msg)) => Err(Error::Io {
                target: Some(target),
                source: std::io::Error::other(msg),
            }),
            Some(MockResponse::Timeout) | None => Err(Error::Timeout {
                target: Some(target),
                elapsed: timeout,
                request_id,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.lock().unwrap().target
    }

    fn local_addr(&self) -> SocketAddr {
        "127.0.0.1:0".parse().expect("valid literal")
    }
}

/// Builder for SNMP response messages used in tests.
///
/// Constructs valid response bytes without hand-crafting BER.
pub struct ResponseBuilder {
    request_id: i32,
    varbinds: Vec<(crate::Oid, crate::Value)>,
    error_status: i32,
    error_index: i32,
}

impl ResponseBuilder {
    /// Create a new response builder with the given request ID.
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            varbinds: Vec::new(),
            error_status: 0,
            error_index: 0,
        }
    }

    /// Add a varbind to the response.
    pub fn varbind(mut self, oid: crate::Oid, value: crate::Value) -> Self {
        self.varbinds.push((oid, value));
        self
    }

    /// Set the error status.
    pub fn error_status(mut self, status: i32) -> Self {
        self.error_status = status;
        self
    }

    /// Set the error index.
    pub fn error_index(mut self, index: i32) -> Self {
        self.error_index = index;
        self
    }

    /// Build a v1 response message.
    pub fn build(self, community: &[u8]) -> Bytes {
        use crate::message::CommunityMessage;
        use crate::pdu::{Pdu, PduType};
        use crate::varbind::VarBind;

        let varbinds: Vec<VarBind> = self
            .varbinds
            .into_iter()
            .map(|(oid, value)| VarBind::new(oid, value))
            .collect();

        let pdu = Pdu {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: self.error_status,
            error_index: self.error_index,
            varbinds,
        };
        CommunityMessage::new(Bytes::copy_from_slice(community), pdu).encode()
    }
}
