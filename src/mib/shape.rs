//! Plugin output shapes and their coercion into a tree view.
//!
//! Producers return arbitrarily nested [`PluginValue`]s. Each
//! materialisation coerces the output once into a [`ValueTree`], the
//! immutable view the lookup and successor walks run against. Coercion is
//! shallow-by-reference: typed SNMP values are moved into the view, never
//! deep-copied.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;

use crate::value::Value;

/// A value produced by a plugin.
///
/// Ordered sequences coerce to sparse maps where index `i` becomes key `i`;
/// `Nil` in child position leaves the slot absent; empty sequences and maps
/// coerce to empty subtrees, which answer `NoSuchObject` to exact queries
/// and contribute nothing to GetNext.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginValue {
    /// No value; the slot is absent.
    Nil,
    /// An integer scalar, typed as INTEGER.
    Int(i32),
    /// A text scalar, typed as OCTET STRING.
    Str(String),
    /// An already-typed SNMP value, passed through verbatim.
    Typed(Value),
    /// An ordered sequence; element i lands at sub-id i.
    Seq(Vec<PluginValue>),
    /// A sparse mapping from sub-id to value.
    Map(BTreeMap<u32, PluginValue>),
}

impl From<i32> for PluginValue {
    fn from(v: i32) -> Self {
        PluginValue::Int(v)
    }
}

impl From<&str> for PluginValue {
    fn from(s: &str) -> Self {
        PluginValue::Str(s.to_string())
    }
}

impl From<String> for PluginValue {
    fn from(s: String) -> Self {
        PluginValue::Str(s)
    }
}

impl From<Value> for PluginValue {
    fn from(v: Value) -> Self {
        PluginValue::Typed(v)
    }
}

impl From<Vec<PluginValue>> for PluginValue {
    fn from(items: Vec<PluginValue>) -> Self {
        PluginValue::Seq(items)
    }
}

impl From<Vec<i32>> for PluginValue {
    fn from(items: Vec<i32>) -> Self {
        PluginValue::Seq(items.into_iter().map(PluginValue::Int).collect())
    }
}

impl From<BTreeMap<u32, PluginValue>> for PluginValue {
    fn from(map: BTreeMap<u32, PluginValue>) -> Self {
        PluginValue::Map(map)
    }
}

/// What one producer invocation hands back: a value plus an optional cache
/// TTL.
///
/// The TTL plays the role of the `cache` key the original wire format
/// carried inside the top-level mapping; the plugin wrapper consumes it
/// before coercion.
#[derive(Debug, Clone)]
pub struct PluginOutput {
    pub value: PluginValue,
    pub cache_for: Option<Duration>,
}

impl PluginOutput {
    /// Uncached output: the next materialisation re-invokes the producer.
    pub fn new(value: impl Into<PluginValue>) -> Self {
        Self {
            value: value.into(),
            cache_for: None,
        }
    }

    /// Output cached for `ttl`; the producer runs at most once per window.
    pub fn cached(value: impl Into<PluginValue>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            cache_for: Some(ttl),
        }
    }
}

/// The coerced view of one plugin materialisation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ValueTree {
    Scalar(Value),
    Subtree(BTreeMap<u32, ValueTree>),
}

/// Result of an exact lookup against a tree (composite or view).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A scalar value exists at the name.
    Scalar(Value),
    /// The name resolves to an interior subtree, not a value.
    Subtree,
    /// Nothing exists at the name.
    Absent,
}

/// Coerce a produced value into a view. `Nil` coerces to no view at all.
pub(crate) fn coerce(value: PluginValue) -> Option<ValueTree> {
    match value {
        PluginValue::Nil => None,
        PluginValue::Int(v) => Some(ValueTree::Scalar(Value::Integer(v))),
        PluginValue::Str(s) => Some(ValueTree::Scalar(Value::OctetString(Bytes::from(s)))),
        PluginValue::Typed(v) => Some(ValueTree::Scalar(v)),
        PluginValue::Seq(items) => {
            let mut children = BTreeMap::new();
            for (i, item) in items.into_iter().enumerate() {
                if let Some(child) = coerce(item) {
                    children.insert(i as u32, child);
                }
            }
            Some(ValueTree::Subtree(children))
        }
        PluginValue::Map(map) => {
            let mut children = BTreeMap::new();
            for (key, item) in map {
                if let Some(child) = coerce(item) {
                    children.insert(key, child);
                }
            }
            Some(ValueTree::Subtree(children))
        }
    }
}

impl ValueTree {
    /// Exact lookup of a relative name within this view.
    pub(crate) fn lookup(&self, arcs: &[u32]) -> Lookup {
        match self {
            ValueTree::Scalar(v) => {
                if arcs.is_empty() {
                    Lookup::Scalar(v.clone())
                } else {
                    Lookup::Absent
                }
            }
            ValueTree::Subtree(children) => {
                if arcs.is_empty() {
                    return Lookup::Subtree;
                }
                match children.get(&arcs[0]) {
                    Some(child) => child.lookup(&arcs[1..]),
                    None => Lookup::Absent,
                }
            }
        }
    }

    /// Relative path to the smallest scalar in this view.
    ///
    /// A scalar leaf is its own leftmost path (the empty sequence); empty
    /// branches are skipped; a view with only empty branches has none.
    pub(crate) fn leftmost(&self) -> Option<Vec<u32>> {
        match self {
            ValueTree::Scalar(_) => Some(Vec::new()),
            ValueTree::Subtree(children) => {
                for (k, child) in children {
                    if let Some(mut path) = child.leftmost() {
                        path.insert(0, *k);
                        return Some(path);
                    }
                }
                None
            }
        }
    }

    /// Relative path to the smallest scalar strictly after `arcs`.
    ///
    /// The deepest divergence wins: we first try to extend the exact path,
    /// then strictly-greater siblings on the way back up.
    pub(crate) fn next_after(&self, arcs: &[u32]) -> Option<Vec<u32>> {
        match self {
            // A scalar leaf holds nothing after itself.
            ValueTree::Scalar(_) => None,
            ValueTree::Subtree(children) => {
                if arcs.is_empty() {
                    return self.leftmost();
                }
                let head = arcs[0];
                if let Some(child) = children.get(&head) {
                    if let Some(mut path) = child.next_after(&arcs[1..]) {
                        path.insert(0, head);
                        return Some(path);
                    }
                }
                use std::ops::Bound;
                for (k, child) in children.range((Bound::Excluded(head), Bound::Unbounded)) {
                    if let Some(mut path) = child.leftmost() {
                        path.insert(0, *k);
                        return Some(path);
                    }
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shaped(value: PluginValue) -> ValueTree {
        coerce(value).expect("value should coerce to a view")
    }

    #[test]
    fn scalar_coerces_to_leaf() {
        assert_eq!(shaped(42.into()), ValueTree::Scalar(Value::Integer(42)));
        assert_eq!(
            shaped("hi".into()),
            ValueTree::Scalar(Value::OctetString(Bytes::from_static(b"hi")))
        );
    }

    #[test]
    fn typed_value_passes_through() {
        let view = shaped(PluginValue::Typed(Value::TimeTicks(99)));
        assert_eq!(view, ValueTree::Scalar(Value::TimeTicks(99)));
    }

    #[test]
    fn nil_coerces_to_nothing() {
        assert_eq!(coerce(PluginValue::Nil), None);
    }

    #[test]
    fn sequence_becomes_zero_based_map() {
        let view = shaped(vec![10, 20, 30].into());
        assert_eq!(view.lookup(&[0]), Lookup::Scalar(Value::Integer(10)));
        assert_eq!(view.lookup(&[2]), Lookup::Scalar(Value::Integer(30)));
        assert_eq!(view.lookup(&[3]), Lookup::Absent);
    }

    #[test]
    fn nil_child_is_absent() {
        let view = shaped(PluginValue::Seq(vec![
            PluginValue::Int(1),
            PluginValue::Nil,
            PluginValue::Int(3),
        ]));
        assert_eq!(view.lookup(&[0]), Lookup::Scalar(Value::Integer(1)));
        assert_eq!(view.lookup(&[1]), Lookup::Absent);
        assert_eq!(view.lookup(&[2]), Lookup::Scalar(Value::Integer(3)));
    }

    #[test]
    fn empty_sequence_is_empty_subtree() {
        let view = shaped(PluginValue::Seq(vec![]));
        assert_eq!(view.lookup(&[]), Lookup::Subtree);
        assert_eq!(view.lookup(&[0]), Lookup::Absent);
        assert_eq!(view.leftmost(), None);
    }

    #[test]
    fn lookup_below_scalar_is_absent() {
        let view = shaped(42.into());
        assert_eq!(view.lookup(&[4]), Lookup::Absent);
        assert_eq!(view.lookup(&[]), Lookup::Scalar(Value::Integer(42)));
    }

    #[test]
    fn interior_name_is_subtree_not_scalar() {
        let mut map = BTreeMap::new();
        map.insert(1, PluginValue::Seq(vec![PluginValue::Int(5)]));
        let view = shaped(PluginValue::Map(map));
        assert_eq!(view.lookup(&[1]), Lookup::Subtree);
        assert_eq!(view.lookup(&[1, 0]), Lookup::Scalar(Value::Integer(5)));
    }

    #[test]
    fn leftmost_skips_empty_branches() {
        let mut map = BTreeMap::new();
        map.insert(0, PluginValue::Seq(vec![]));
        map.insert(1, PluginValue::Seq(vec![PluginValue::Int(7)]));
        let view = shaped(PluginValue::Map(map));
        assert_eq!(view.leftmost(), Some(vec![1, 0]));
    }

    #[test]
    fn leftmost_of_scalar_is_empty_path() {
        assert_eq!(shaped(42.into()).leftmost(), Some(vec![]));
    }

    #[test]
    fn next_after_walks_in_order() {
        let view = shaped(vec![1, 1, 2, 3, 5, 8, 13].into());
        assert_eq!(view.next_after(&[]), Some(vec![0]));
        assert_eq!(view.next_after(&[0]), Some(vec![1]));
        assert_eq!(view.next_after(&[4]), Some(vec![5]));
        assert_eq!(view.next_after(&[6]), None);
        // Names between present keys still find the right successor
        assert_eq!(view.next_after(&[4, 9]), Some(vec![5]));
    }

    #[test]
    fn next_after_skips_empty_branches() {
        let mut map = BTreeMap::new();
        map.insert(0, PluginValue::Seq(vec![1.into(), 2.into(), 3.into()]));
        map.insert(1, PluginValue::Seq(vec![]));
        map.insert(2, PluginValue::Seq(vec![9.into()]));
        let view = shaped(PluginValue::Map(map));
        // Successor of the last scalar under 0 jumps over the empty branch 1
        assert_eq!(view.next_after(&[0, 2]), Some(vec![2, 0]));
        assert_eq!(view.next_after(&[2, 0]), None);
    }

    #[test]
    fn next_after_scalar_root_is_none() {
        assert_eq!(shaped(42.into()).next_after(&[]), None);
        assert_eq!(shaped(42.into()).next_after(&[3]), None);
    }
}
