//! Transport layer abstraction for the manager client.
//!
//! Provides the [`Transport`] trait, the connected-socket [`UdpTransport`],
//! and (for tests) a programmable [`MockTransport`].

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::UdpTransport;

#[cfg(any(test, feature = "testing"))]
pub use mock::{MockResponse, MockTransport, ResponseBuilder};

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// Client-side transport abstraction.
///
/// Implementations use `Arc` internally so cloning is cheap; walk loops and
/// retries hold clones freely.
pub trait Transport: Send + Sync + Clone {
    /// Send request data to the target.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Receive a response, waiting at most `timeout`.
    ///
    /// `request_id` is available for correlation; the client validates the
    /// decoded response's request-id regardless.
    fn recv(
        &self,
        request_id: i32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The peer address this transport sends to.
    fn peer_addr(&self) -> SocketAddr;

    /// Local bind address.
    fn local_addr(&self) -> SocketAddr;
}
