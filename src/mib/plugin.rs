//! Plugin wrapper: a deferred value producer with time-based caching.
//!
//! A plugin owns the entire OID subtree beneath its base. Each lookup or
//! successor search materialises the producer's output into a [`ValueTree`]
//! view; a producer may ask for its result to be cached for N seconds by
//! returning [`PluginOutput::cached`]. Producer failures are isolated: the
//! plugin answers as an empty view for the request and the serving loop
//! carries on.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::Bytes;

use super::shape::{Lookup, PluginOutput, ValueTree, coerce};
use crate::error::Result;

/// Per-request information handed to producers.
///
/// Carries the community name of the request being served, so producers can
/// vary their answer by caller.
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Community string of the request being served.
    pub community: Bytes,
    /// Source address of the request, when it arrived over the network.
    pub source: Option<SocketAddr>,
}

impl PluginContext {
    /// Context for calls not driven by a network request.
    pub fn internal() -> Self {
        Self {
            community: Bytes::new(),
            source: None,
        }
    }

    /// Context carrying only a community name.
    pub fn with_community(community: impl Into<Bytes>) -> Self {
        Self {
            community: community.into(),
            source: None,
        }
    }
}

/// The producer function a plugin wraps.
pub type Producer = dyn Fn(&PluginContext) -> Result<PluginOutput> + Send + Sync;

struct PluginState {
    /// Last materialised view; `None` means the producer yielded nothing
    /// usable (failed, or returned nil).
    view: Option<Arc<ValueTree>>,
    /// When the cached view stops being served. `None` means stale, so the
    /// first call always invokes the producer.
    expires_at: Option<Instant>,
}

/// A registered plugin: producer plus cached last result.
pub(crate) struct PluginNode {
    producer: Box<Producer>,
    state: Mutex<PluginState>,
}

impl PluginNode {
    pub(crate) fn new(producer: Box<Producer>) -> Self {
        Self {
            producer,
            state: Mutex::new(PluginState {
                view: None,
                expires_at: None,
            }),
        }
    }

    /// Produce the current view, invoking the producer if the cache window
    /// has closed.
    ///
    /// Materialisation is mutually exclusive per plugin: the producer runs
    /// at most once per cache miss even when requests are processed in
    /// parallel. A producer error or panic stores an absent view and is
    /// logged at warning level; the expiry is left stale so the next window
    /// retries.
    pub(crate) fn materialise(&self, ctx: &PluginContext) -> Option<Arc<ValueTree>> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(expires_at) = state.expires_at
            && Instant::now() < expires_at
        {
            return state.view.clone();
        }

        match std::panic::catch_unwind(AssertUnwindSafe(|| (self.producer)(ctx))) {
            Ok(Ok(output)) => {
                state.expires_at = output
                    .cache_for
                    .map(|ttl| Instant::now() + ttl);
                state.view = coerce(output.value).map(Arc::new);
            }
            Ok(Err(err)) => {
                tracing::warn!(target: "async_mib::plugin", { error = %err }, "plugin producer failed");
                state.view = None;
            }
            Err(_) => {
                tracing::warn!(target: "async_mib::plugin", "plugin producer panicked");
                state.view = None;
            }
        }

        state.view.clone()
    }

    /// Exact lookup of the remainder OID beneath the plugin base.
    pub(crate) fn lookup(&self, rest: &[u32], ctx: &PluginContext) -> Lookup {
        match self.materialise(ctx) {
            Some(view) => view.lookup(rest),
            None => Lookup::Absent,
        }
    }

    /// Successor search beneath the plugin base.
    ///
    /// Returns the relative path of the smallest scalar strictly after
    /// `rest`, or `None` when the plugin's view is exhausted.
    pub(crate) fn next(&self, rest: &[u32], ctx: &PluginContext) -> Option<Vec<u32>> {
        self.materialise(ctx)?.next_after(rest)
    }

    /// Relative path of the smallest scalar in the plugin's view.
    pub(crate) fn leftmost(&self, ctx: &PluginContext) -> Option<Vec<u32>> {
        self.materialise(ctx)?.leftmost()
    }
}

impl std::fmt::Debug for PluginNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginNode").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mib::shape::PluginValue;
    use crate::value::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn counting_plugin(counter: Arc<AtomicU32>, output: impl Fn() -> PluginOutput + Send + Sync + 'static) -> PluginNode {
        PluginNode::new(Box::new(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(output())
        }))
    }

    #[test]
    fn first_call_materialises() {
        let calls = Arc::new(AtomicU32::new(0));
        let plugin = counting_plugin(calls.clone(), || PluginOutput::new(42));
        let ctx = PluginContext::internal();

        assert_eq!(plugin.lookup(&[], &ctx), Lookup::Scalar(Value::Integer(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uncached_output_reinvokes_every_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let plugin = counting_plugin(calls.clone(), || PluginOutput::new(1));
        let ctx = PluginContext::internal();

        plugin.lookup(&[], &ctx);
        plugin.lookup(&[], &ctx);
        plugin.lookup(&[], &ctx);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cached_output_invokes_once_per_window() {
        let calls = Arc::new(AtomicU32::new(0));
        let plugin = counting_plugin(calls.clone(), || {
            PluginOutput::cached(7, Duration::from_secs(60))
        });
        let ctx = PluginContext::internal();

        for _ in 0..5 {
            assert_eq!(plugin.lookup(&[], &ctx), Lookup::Scalar(Value::Integer(7)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_window_expiry_reinvokes() {
        let calls = Arc::new(AtomicU32::new(0));
        let plugin = counting_plugin(calls.clone(), || {
            PluginOutput::cached(7, Duration::from_millis(1))
        });
        let ctx = PluginContext::internal();

        plugin.lookup(&[], &ctx);
        std::thread::sleep(Duration::from_millis(5));
        plugin.lookup(&[], &ctx);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failing_producer_is_absent() {
        let plugin = PluginNode::new(Box::new(|_ctx| {
            Err(Error::config("deliberate failure"))
        }));
        let ctx = PluginContext::internal();

        assert_eq!(plugin.lookup(&[], &ctx), Lookup::Absent);
        assert_eq!(plugin.lookup(&[4], &ctx), Lookup::Absent);
        assert_eq!(plugin.next(&[], &ctx), None);
        assert_eq!(plugin.leftmost(&ctx), None);
    }

    #[test]
    fn panicking_producer_is_absent() {
        let plugin = PluginNode::new(Box::new(|_ctx| panic!("boom")));
        let ctx = PluginContext::internal();

        assert_eq!(plugin.lookup(&[], &ctx), Lookup::Absent);
        // A later call still works against the same wrapper
        assert_eq!(plugin.next(&[], &ctx), None);
    }

    #[test]
    fn nil_output_is_absent() {
        let plugin = PluginNode::new(Box::new(|_ctx| Ok(PluginOutput::new(PluginValue::Nil))));
        let ctx = PluginContext::internal();
        assert_eq!(plugin.lookup(&[], &ctx), Lookup::Absent);
    }

    #[test]
    fn producer_sees_the_request_community(){
        let plugin = PluginNode::new(Box::new(|ctx: &PluginContext| {
            Ok(PluginOutput::new(
                std::str::from_utf8(&ctx.community).unwrap_or(""),
            ))
        }));
        let ctx = PluginContext::with_community("private");
        assert_eq!(
            plugin.lookup(&[], &ctx),
            Lookup::Scalar(Value::OctetString(Bytes::from_static(b"private")))
        );
    }

    #[test]
    fn fresh_shape_every_window() {
        // Producer output changes between calls; without a TTL each call
        // sees the new shape.
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let plugin = PluginNode::new(Box::new(move |_ctx| {
            let n = calls2.fetch_add(1, Ordering::SeqCst) as i32;
            Ok(PluginOutput::new(vec![n, n + 1]))
        }));
        let ctx = PluginContext::internal();

        assert_eq!(plugin.lookup(&[0], &ctx), Lookup::Scalar(Value::Integer(0)));
        assert_eq!(plugin.lookup(&[0], &ctx), Lookup::Scalar(Value::Integer(1)));
    }
}
