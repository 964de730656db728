//! The event subscription registry and demultiplexer.
//!
//! Listeners subscribe to an [`EventFilter`] (one event kind, or all of
//! them) within a [`Scope`] (every account, or one context id). When an
//! event arrives, [`Subscriptions::dispatch`] delivers it in four buckets,
//! each in registration order:
//!
//! ```text
//! (a) Named(kind) @ Global
//! (b) All         @ Global
//! (c) Named(kind) @ Context(event.context_id)
//! (d) All         @ Context(event.context_id)
//! ```
//!
//! # Growth caveat
//!
//! A context's listener set is created by the first subscription for that
//! context and is never evicted on its own, even after its last listener
//! is removed. Call [`Subscriptions::release_context`] once an account is
//! gone to reclaim it.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use deltarpc_protocol::{Event, EventKind, UnknownEventName};

use crate::lock;

/// A subscriber callback. Called on the client's reader task, so it
/// should return quickly; hand heavy work off to a channel or task.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Which events a subscription wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Every event, whatever its kind (`"ALL"`).
    All,
    /// Only events of one kind.
    Named(EventKind),
}

impl EventFilter {
    fn is_named(self, kind: EventKind) -> bool {
        self == Self::Named(kind)
    }
}

impl From<EventKind> for EventFilter {
    fn from(kind: EventKind) -> Self {
        Self::Named(kind)
    }
}

impl FromStr for EventFilter {
    type Err = UnknownEventName;

    /// Parses `"ALL"` or a catalog name such as `"INCOMING_MSG"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ALL" {
            return Ok(Self::All);
        }
        s.parse().map(Self::Named)
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Named(kind) => f.write_str(kind.as_str()),
        }
    }
}

/// Where a subscription listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Events from every context.
    Global,
    /// Events whose `context_id` equals this one.
    Context(u32),
}

/// Handle returned by a subscribe call; pass it to `off` to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What happened during one [`Subscriptions::dispatch`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that returned normally.
    pub delivered: usize,
    /// Listeners that panicked. Delivery continued past each of them.
    pub panicked: Vec<SubscriptionId>,
}

struct Entry {
    id: SubscriptionId,
    filter: EventFilter,
    once: bool,
    listener: Listener,
}

/// One scope's listeners, in registration order.
#[derive(Default)]
struct ScopeListeners {
    entries: Vec<Entry>,
}

impl ScopeListeners {
    /// Appends the matching listeners of this scope to `out`, named
    /// bucket first, then the `All` bucket. One-shot entries are removed
    /// as they are selected.
    fn select(
        &mut self,
        kind: EventKind,
        out: &mut Vec<(SubscriptionId, Listener)>,
    ) {
        for named in [true, false] {
            self.entries.retain(|entry| {
                let hit = if named {
                    entry.filter.is_named(kind)
                } else {
                    entry.filter == EventFilter::All
                };
                if hit {
                    out.push((entry.id, Arc::clone(&entry.listener)));
                }
                !(hit && entry.once)
            });
        }
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}

struct Registry {
    next_id: u64,
    global: ScopeListeners,
    contexts: HashMap<u32, ScopeListeners>,
}

/// The registry of every subscription a client holds.
pub struct Subscriptions {
    registry: Mutex<Registry>,
}

impl Subscriptions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 1,
                global: ScopeListeners::default(),
                contexts: HashMap::new(),
            }),
        }
    }

    /// Registers `listener` for `filter` within `scope`.
    ///
    /// A `once` subscription is removed right before its first delivery.
    pub fn subscribe(
        &self,
        filter: EventFilter,
        scope: Scope,
        once: bool,
        listener: Listener,
    ) -> SubscriptionId {
        let mut registry = lock(&self.registry);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;

        let listeners = match scope {
            Scope::Global => &mut registry.global,
            Scope::Context(context_id) => {
                registry.contexts.entry(context_id).or_insert_with(|| {
                    tracing::debug!(context_id, "context listener set created");
                    ScopeListeners::default()
                })
            }
        };
        listeners.entries.push(Entry {
            id,
            filter,
            once,
            listener,
        });

        tracing::debug!(%id, %filter, ?scope, once, "subscribed");
        id
    }

    /// Removes one subscription. Returns `false` if it was not found
    /// (already removed, fired as a one-shot, or released).
    ///
    /// An emptied context set is kept; see the module docs.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = lock(&self.registry);
        let Registry {
            global, contexts, ..
        } = &mut *registry;

        let removed = global.remove(id)
            || contexts.values_mut().any(|listeners| listeners.remove(id));
        if removed {
            tracing::debug!(%id, "unsubscribed");
        }
        removed
    }

    /// Drops a context's whole listener set. Returns how many listeners
    /// it still held.
    pub fn release_context(&self, context_id: u32) -> usize {
        let released = lock(&self.registry)
            .contexts
            .remove(&context_id)
            .map(|listeners| listeners.entries.len())
            .unwrap_or(0);
        tracing::debug!(context_id, released, "context listener set released");
        released
    }

    /// Number of per-context listener sets currently allocated.
    pub fn context_count(&self) -> usize {
        lock(&self.registry).contexts.len()
    }

    /// Total number of live subscriptions across all scopes.
    pub fn len(&self) -> usize {
        let registry = lock(&self.registry);
        registry.global.entries.len()
            + registry
                .contexts
                .values()
                .map(|listeners| listeners.entries.len())
                .sum::<usize>()
    }

    /// Returns `true` if there are no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to every matching listener.
    ///
    /// Listeners run after the registry lock is released, so they may
    /// subscribe or unsubscribe from inside the callback. A listener that
    /// panics is logged and skipped; the rest still run.
    pub fn dispatch(&self, event: &Event) -> DispatchReport {
        let mut selected = Vec::new();
        {
            let mut registry = lock(&self.registry);
            registry.global.select(event.kind, &mut selected);
            // Dispatch never creates a context set, it only reads one.
            if let Some(listeners) =
                registry.contexts.get_mut(&event.context_id)
            {
                listeners.select(event.kind, &mut selected);
            }
        }

        let mut report = DispatchReport::default();
        for (id, listener) in selected {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    tracing::error!(
                        subscription = %id,
                        event = event.name(),
                        context_id = event.context_id,
                        "event listener panicked"
                    );
                    report.panicked.push(id);
                }
            }
        }
        report
    }
}

impl Default for Subscriptions {
    fn default() -> Self {
        Self::new()
    }
}
