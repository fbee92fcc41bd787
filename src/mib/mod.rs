//! The MIB tree engine.
//!
//! A sparse tree of object identifiers keyed by unsigned integer sub-ids,
//! with three kinds of registered leaves: literal values, plugins (deferred
//! producers of arbitrary shapes, optionally cached), and proxies
//! (delegations to upstream agents). Two traversals give SNMP its
//! semantics:
//!
//! - **exact lookup** resolves a full OID to a scalar, a subtree, or
//!   absent (serving Get);
//! - **successor** finds the smallest OID strictly greater than a given
//!   one that holds a scalar (serving GetNext), across plugin views and
//!   proxied subtrees alike.
//!
//! Plugins and proxies are leaf-owners of their whole subtree: registration
//! rejects anything at, beneath, or on top of one.

mod loader;
mod node;
mod plugin;
mod proxy;
mod shape;

pub use loader::parse_plugin_file;
pub use plugin::{PluginContext, Producer};
pub use proxy::{BoxFuture, ManagerClient};
pub use shape::{Lookup, PluginOutput, PluginValue};

use std::sync::Arc;

use node::{MibChild, MibNode, RegisterError};
use plugin::PluginNode;
use proxy::ProxyNode;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::value::Value;

/// The composite MIB tree.
///
/// Mutated only by registration, which is expected to finish before
/// serving starts; lookups and successor searches take `&self`.
#[derive(Debug, Default)]
pub struct MibTree {
    root: MibNode,
}

impl MibTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin owning the subtree at `base`.
    pub fn register_plugin(
        &mut self,
        base: &Oid,
        producer: Box<Producer>,
    ) -> Result<()> {
        self.insert(base, MibChild::Plugin(PluginNode::new(producer)))
    }

    /// Register a proxy owning the subtree at `base`.
    pub fn register_proxy(
        &mut self,
        base: &Oid,
        client: Arc<dyn ManagerClient>,
    ) -> Result<()> {
        self.insert(
            base,
            MibChild::Proxy(ProxyNode::new(base.clone(), client)),
        )
    }

    /// Register a literal scalar value at `base`.
    pub fn register_value(&mut self, base: &Oid, value: Value) -> Result<()> {
        self.insert(base, MibChild::Scalar(value))
    }

    fn insert(&mut self, base: &Oid, child: MibChild) -> Result<()> {
        if base.is_empty() {
            return Err(Error::config("registration base OID must not be empty"));
        }
        self.root.insert_at(base.arcs(), child).map_err(|err| match err {
            RegisterError::Occupied { at } => Error::Occupied {
                oid: base.slice(0, at),
            },
            // The walk reports plugin traversal; callers see an encroachment.
            RegisterError::Traverses { at } => Error::EncroachesOnPlugin {
                oid: base.clone(),
                owner: base.slice(0, at),
            },
            RegisterError::NestedInProxy { at } => Error::CannotNestInProxy {
                oid: base.slice(0, at),
            },
        })
    }

    /// Exact lookup: scalar, subtree, or absent.
    pub async fn lookup(&self, oid: &Oid, ctx: &PluginContext) -> Lookup {
        self.root.lookup(oid, ctx).await
    }

    /// Typed lookup: the value a Get varbind receives.
    ///
    /// Interior subtrees and absent names both answer `NoSuchObject`: an
    /// interior node is a real node but not a value.
    pub async fn get_value(&self, oid: &Oid, ctx: &PluginContext) -> Value {
        match self.lookup(oid, ctx).await {
            Lookup::Scalar(value) => value,
            Lookup::Subtree | Lookup::Absent => Value::NoSuchObject,
        }
    }

    /// Lexicographic successor holding a scalar, or `None` at end of view.
    pub async fn next(&self, oid: &Oid, ctx: &PluginContext) -> Option<Oid> {
        self.root.next(oid, ctx).await
    }
}
