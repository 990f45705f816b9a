//! Deferred definition subscribers.

use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::schema::SchemaClass;

/// Invoked with each matching schema class
pub type DefinitionCallback = Arc<dyn Fn(&SchemaClass) + Send + Sync>;

/// Subscriber lists keyed by qualified name or tag
///
/// Subscriptions are never removed. Delivery happens outside this type:
/// the registry snapshots the list while holding its lock and invokes the
/// callbacks after releasing it.
pub(crate) struct Subscribers<K> {
    entries: FxHashMap<K, Vec<DefinitionCallback>>,
}

impl<K: Eq + Hash> Subscribers<K> {
    pub(crate) fn subscribe(&mut self, key: K, callback: DefinitionCallback) {
        self.entries.entry(key).or_default().push(callback);
    }

    /// The callbacks for `key`, in subscription order
    pub(crate) fn snapshot<Q>(&self, key: &Q) -> Vec<DefinitionCallback>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key).cloned().unwrap_or_default()
    }
}

impl<K> Default for Subscribers<K> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}
