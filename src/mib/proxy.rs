//! Proxy wrapper: delegation of an OID subtree to an upstream agent.
//!
//! A proxy owns its base OID's subtree. Lookups become upstream Get
//! requests, successor searches become upstream GetNext requests, and every
//! upstream failure (timeout, transport error, protocol error, malformed
//! response) degrades to "nothing there" so the serving loop is never
//! killed by a misbehaving upstream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::shape::Lookup;
use crate::error::Result;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// Boxed future type used by object-safe async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The manager-side contract a proxy consumes.
///
/// [`crate::client::Client`] implements this over any transport; tests
/// substitute an in-memory one.
pub trait ManagerClient: Send + Sync {
    /// Issue a Get for the given names.
    fn get<'a>(&'a self, oids: &'a [Oid]) -> BoxFuture<'a, Result<Vec<VarBind>>>;

    /// Issue a GetNext for the given names.
    fn get_next<'a>(&'a self, oids: &'a [Oid]) -> BoxFuture<'a, Result<Vec<VarBind>>>;
}

/// A registered proxy: base OID plus upstream client handle.
pub(crate) struct ProxyNode {
    base: Oid,
    client: Arc<dyn ManagerClient>,
}

impl ProxyNode {
    pub(crate) fn new(base: Oid, client: Arc<dyn ManagerClient>) -> Self {
        Self { base, client }
    }

    /// Exact lookup of the remainder OID beneath the proxy base.
    pub(crate) async fn lookup(&self, rest: &[u32]) -> Lookup {
        let target = self.base.concat_arcs(rest);
        match self.client.get(std::slice::from_ref(&target)).await {
            Ok(varbinds) => match varbinds.into_iter().next() {
                Some(vb) => match vb.value {
                    Value::NoSuchObject | Value::EndOfMibView | Value::Null => Lookup::Absent,
                    value => Lookup::Scalar(value),
                },
                None => Lookup::Absent,
            },
            Err(err) => {
                tracing::warn!(target: "async_mib::proxy", { base = %self.base, oid = %target, error = %err }, "upstream get failed");
                Lookup::Absent
            }
        }
    }

    /// Successor search beneath the proxy base.
    ///
    /// Returns the full successor OID, which must lie inside the base
    /// subtree; an upstream that walks past the base means the proxy's view
    /// is exhausted.
    pub(crate) async fn next(&self, rest: &[u32]) -> Option<Oid> {
        let target = self.base.concat_arcs(rest);
        match self.client.get_next(std::slice::from_ref(&target)).await {
            Ok(varbinds) => {
                let vb = varbinds.into_iter().next()?;
                if vb.value == Value::EndOfMibView {
                    return None;
                }
                if vb.oid.starts_with(&self.base) && vb.oid > target {
                    Some(vb.oid)
                } else {
                    None
                }
            }
            Err(err) => {
                tracing::warn!(target: "async_mib::proxy", { base = %self.base, oid = %target, error = %err }, "upstream get-next failed");
                None
            }
        }
    }

    /// Smallest name the upstream serves inside the base subtree.
    pub(crate) async fn leftmost(&self) -> Option<Oid> {
        self.next(&[]).await
    }
}

impl std::fmt::Debug for ProxyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyNode")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
