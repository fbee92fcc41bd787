//! UDP transport: one connected socket per target.
//!
//! Each [`UdpTransport`] owns an ephemeral socket connected to a single
//! upstream agent. The kernel filters datagrams from other sources, so the
//! receive path only has to apply the timeout and hand bytes up for
//! request-id validation.

use super::Transport;
use crate::error::{Error, Result};
use crate::util::ephemeral_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Maximum UDP payload we will read.
const UDP_RECV_BUFFER_SIZE: usize = 65535;

/// A connected UDP transport for one target.
#[derive(Clone)]
pub struct UdpTransport {
    inner: Arc<UdpTransportInner>,
}

struct UdpTransportInner {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Create a transport connected to `target`.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        let socket = ephemeral_udp_socket(target).map_err(|e| Error::Io {
            target: Some(target),
            source: e,
        })?;
        socket.connect(target).await.map_err(|e| Error::Io {
            target: Some(target),
            source: e,
        })?;
        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(target),
            source: e,
        })?;

        Ok(Self {
            inner: Arc::new(UdpTransportInner {
                socket,
                target,
                local_addr,
            }),
        })
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        self.inner.socket.send(data).await.map_err(|e| Error::Io {
            target: Some(self.inner.target),
            source: e,
        })?;
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];

        match tokio::time::timeout(timeout, self.inner.socket.recv(&mut buf)).await {
            Ok(Ok(len)) => {
                buf.truncate(len);
                Ok((Bytes::from(buf), self.inner.target))
            }
            Ok(Err(e)) => Err(Error::Io {
                target: Some(self.inner.target),
                source: e,
            }),
            Err(_) => Err(Error::Timeout {
                target: Some(self.inner.target),
                elapsed: timeout,
                request_id,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }

    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_and_echo() {
        // Stand up a loopback echo peer
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            if let Ok((len, from)) = peer.recv_from(&mut buf).await {
                let _ = peer.send_to(&buf[..len], from).await;
            }
        });

        let transport = UdpTransport::connect(peer_addr).await.unwrap();
        assert_eq!(transport.peer_addr(), peer_addr);

        transport.send(b"ping").await.unwrap();
        let (data, from) = transport.recv(1, Duration::from_secs(2)).await.unwrap();
        assert_eq!(&data[..], b"ping");
        assert_eq!(from, peer_addr);
    }

    #[tokio::test]
    async fn recv_times_out() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let transport = UdpTransport::connect(peer_addr).await.unwrap();
        let result = transport.recv(7, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::Timeout { request_id: 7, .. })));
    }
}
