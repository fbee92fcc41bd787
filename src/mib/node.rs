//! The composite MIB tree.
//!
//! A [`MibNode`] maps sub-ids to children; a child is a nested subtree, a
//! scalar leaf, a plugin, or a proxy. Lookup and successor are functions on
//! the child union itself, so the walk crosses into plugin views and
//! upstream agents without the callers noticing.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::Bound;

use super::plugin::{PluginContext, PluginNode};
use super::proxy::{BoxFuture, ProxyNode};
use super::shape::Lookup;
use crate::oid::Oid;
use crate::value::Value;

/// One child slot of a tree node.
#[derive(Debug)]
pub(crate) enum MibChild {
    /// A nested plain subtree.
    Subtree(MibNode),
    /// A literal scalar leaf.
    Scalar(Value),
    /// A plugin owning the subtree below this sub-id.
    Plugin(PluginNode),
    /// A proxy owning the subtree below this sub-id.
    Proxy(ProxyNode),
}

/// Why a registration could not be applied.
///
/// Carries the arc count of the offending prefix so the caller can name the
/// owner. `Traverses` stays internal to the tree; the agent façade reports
/// it as an encroachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterError {
    /// The slot (or an ancestor leaf) is already taken.
    Occupied { at: usize },
    /// The path runs through a registered plugin.
    Traverses { at: usize },
    /// The path runs through a registered proxy.
    NestedInProxy { at: usize },
}

/// A sparse tree node keyed by non-negative integer sub-ids.
#[derive(Debug, Default)]
pub(crate) struct MibNode {
    children: BTreeMap<u32, MibChild>,
}

impl MibNode {
    /// Insert `child` at the path `arcs`, creating empty subtrees along the
    /// prefix as needed.
    ///
    /// Enforces the registration rule: nothing may be added at, beneath, or
    /// on top of an existing plugin/proxy, and an occupied slot stays
    /// occupied.
    pub(crate) fn insert_at(
        &mut self,
        arcs: &[u32],
        child: MibChild,
    ) -> Result<(), RegisterError> {
        debug_assert!(!arcs.is_empty(), "registration base must be non-empty");

        let mut node = self;
        for (depth, &arc) in arcs[..arcs.len() - 1].iter().enumerate() {
            let slot = node
                .children
                .entry(arc)
                .or_insert_with(|| MibChild::Subtree(MibNode::default()));
            node = match slot {
                MibChild::Subtree(n) => n,
                MibChild::Plugin(_) => return Err(RegisterError::Traverses { at: depth + 1 }),
                MibChild::Proxy(_) => return Err(RegisterError::NestedInProxy { at: depth + 1 }),
                MibChild::Scalar(_) => return Err(RegisterError::Occupied { at: depth + 1 }),
            };
        }

        match node.children.entry(arcs[arcs.len() - 1]) {
            Entry::Occupied(slot) => Err(match slot.get() {
                MibChild::Plugin(_) => RegisterError::Traverses { at: arcs.len() },
                MibChild::Proxy(_) => RegisterError::NestedInProxy { at: arcs.len() },
                _ => RegisterError::Occupied { at: arcs.len() },
            }),
            Entry::Vacant(slot) => {
                slot.insert(child);
                Ok(())
            }
        }
    }

    /// Exact lookup. The OID is consumed arc by arc; plugins continue the
    /// walk against their materialised view, proxies against the upstream.
    pub(crate) async fn lookup(&self, oid: &Oid, ctx: &PluginContext) -> Lookup {
        let arcs = oid.arcs();
        let mut node = self;
        let mut depth = 0;

        loop {
            if depth == arcs.len() {
                return Lookup::Subtree;
            }
            match node.children.get(&arcs[depth]) {
                None => return Lookup::Absent,
                Some(MibChild::Subtree(n)) => {
                    node = n;
                    depth += 1;
                }
                Some(MibChild::Scalar(value)) => {
                    // A scalar answers only when it consumes the final arc.
                    return if depth == arcs.len() - 1 {
                        Lookup::Scalar(value.clone())
                    } else {
                        Lookup::Absent
                    };
                }
                Some(MibChild::Plugin(plugin)) => {
                    return plugin.lookup(&arcs[depth + 1..], ctx);
                }
                Some(MibChild::Proxy(proxy)) => {
                    return proxy.lookup(&arcs[depth + 1..]).await;
                }
            }
        }
    }

    /// Lexicographic successor: the smallest OID strictly greater than
    /// `oid` that resolves to a scalar, or `None` for end-of-view.
    pub(crate) async fn next(&self, oid: &Oid, ctx: &PluginContext) -> Option<Oid> {
        let arcs = oid.arcs();

        // Descend along the exact path, keeping every node on it so the
        // sibling search can ascend later.
        let mut path: Vec<&MibNode> = vec![self];
        let mut depth = 0;

        while depth < arcs.len() {
            let node = *path.last().expect("path starts non-empty");
            match node.children.get(&arcs[depth]) {
                Some(MibChild::Subtree(n)) => {
                    path.push(n);
                    depth += 1;
                }
                Some(MibChild::Plugin(plugin)) => {
                    // Delegate the remaining suffix to the plugin view.
                    if let Some(rel) = plugin.next(&arcs[depth + 1..], ctx) {
                        return Some(Oid::from_slice(&arcs[..=depth]).concat_arcs(&rel));
                    }
                    break;
                }
                Some(MibChild::Proxy(proxy)) => {
                    if let Some(found) = proxy.next(&arcs[depth + 1..]).await {
                        return Some(found);
                    }
                    break;
                }
                // Scalar or absent: nothing below, ascend from here.
                Some(MibChild::Scalar(_)) | None => break,
            }
        }

        if depth == arcs.len() {
            // The name resolves to an existing subtree: the successor is its
            // leftmost scalar, if any branch is non-empty.
            let node = *path.last().expect("path starts non-empty");
            let prefix = Oid::from_slice(arcs);
            for (k, child) in &node.children {
                if let Some(found) = first_scalar(child, prefix.child(*k), ctx).await {
                    return Some(found);
                }
            }
        }

        // Sibling search: at each depth, the smallest strictly greater key;
        // the deepest depth that yields a candidate wins, so walk upward.
        let top = if depth == arcs.len() {
            arcs.len().checked_sub(1)?
        } else {
            depth
        };
        for d in (0..=top).rev() {
            let node = path[d];
            for (k, child) in node
                .children
                .range((Bound::Excluded(arcs[d]), Bound::Unbounded))
            {
                let prefix = Oid::from_slice(&arcs[..d]).child(*k);
                if let Some(found) = first_scalar(child, prefix, ctx).await {
                    return Some(found);
                }
            }
        }

        None
    }
}

/// Smallest scalar OID inside `child`, where `prefix` already names the
/// child itself. Branches with no scalars anywhere (however deep) yield
/// nothing and the caller moves on to the next sibling.
pub(crate) fn first_scalar<'a>(
    child: &'a MibChild,
    prefix: Oid,
    ctx: &'a PluginContext,
) -> BoxFuture<'a, Option<Oid>> {
    Box::pin(async move {
        match child {
            MibChild::Scalar(_) => Some(prefix),
            MibChild::Subtree(node) => {
                for (k, c) in &node.children {
                    if let Some(found) = first_scalar(c, prefix.child(*k), ctx).await {
                        return Some(found);
                    }
                }
                None
            }
            MibChild::Plugin(plugin) => plugin
                .leftmost(ctx)
                .map(|rel| prefix.concat_arcs(&rel)),
            MibChild::Proxy(proxy) => proxy.leftmost().await,
        }
    })
}
