//! Context store
//!
//! One bucket per workspace, held as a persistent [`im::HashMap`]. Readers get
//! snapshots that share structure with the live bucket; writers replace
//! top-level values with freshly built copies, so a snapshot taken before a
//! write never observes it.
//!
//! The store never fails. Reads without a selected workspace see an empty
//! bucket; writes without one are dropped and logged.

use crate::interpolate::interpolate_with;
use crate::path::ContextPath;
use crate::update::{get_in, remove_in, set_in};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Snapshot of one workspace's context
pub type Bucket = im::HashMap<String, Value>;

#[derive(Debug, Default)]
struct StoreState {
    buckets: HashMap<String, Bucket>,
    current: Option<String>,
}

impl StoreState {
    fn current_bucket_mut(&mut self, op: &str) -> Option<&mut Bucket> {
        let Some(workspace) = self.current.as_deref() else {
            tracing::warn!(op, "context write dropped: no workspace selected");
            return None;
        };
        let bucket = self.buckets.get_mut(workspace);
        if bucket.is_none() {
            tracing::warn!(op, workspace, "context write dropped: workspace not loaded");
        }
        bucket
    }
}

/// Per-workspace hierarchical key/value store
#[derive(Debug, Default)]
pub struct ContextStore {
    state: RwLock<StoreState>,
}

impl ContextStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the bucket for a workspace from its initial context
    ///
    /// Only the first load seeds; returns `false` if the bucket already
    /// existed and was left untouched.
    pub fn seed(&self, workspace_id: &str, initial: &Map<String, Value>) -> bool {
        let mut state = self.state.write();
        if state.buckets.contains_key(workspace_id) {
            return false;
        }
        let bucket: Bucket = initial
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        tracing::debug!(workspace = workspace_id, keys = bucket.len(), "context bucket seeded");
        state.buckets.insert(workspace_id.to_string(), bucket);
        true
    }

    /// Make a workspace current
    ///
    /// Returns whether the workspace already has a bucket.
    pub fn select(&self, workspace_id: &str) -> bool {
        let mut state = self.state.write();
        state.current = Some(workspace_id.to_string());
        state.buckets.contains_key(workspace_id)
    }

    /// Clear the current workspace
    #[inline]
    pub fn deselect(&self) {
        self.state.write().current = None;
    }

    /// Current workspace id
    #[inline]
    #[must_use]
    pub fn current_workspace(&self) -> Option<String> {
        self.state.read().current.clone()
    }

    /// Check if a workspace has been loaded
    #[inline]
    #[must_use]
    pub fn has_bucket(&self, workspace_id: &str) -> bool {
        self.state.read().buckets.contains_key(workspace_id)
    }

    /// Number of buckets
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.state.read().buckets.len()
    }

    /// Delete a workspace's bucket (explicit workspace deletion)
    pub fn remove_bucket(&self, workspace_id: &str) -> Option<Bucket> {
        let mut state = self.state.write();
        if state.current.as_deref() == Some(workspace_id) {
            state.current = None;
        }
        state.buckets.remove(workspace_id)
    }

    /// Replace a workspace's bucket wholesale (restore from storage)
    ///
    /// Only existing buckets are replaced; returns `false` and leaves the
    /// store untouched for a workspace that was never seeded.
    pub fn replace_bucket(&self, workspace_id: &str, values: &Map<String, Value>) -> bool {
        let mut state = self.state.write();
        let Some(bucket) = state.buckets.get_mut(workspace_id) else {
            tracing::warn!(workspace = workspace_id, "refusing to restore context of unseeded workspace");
            return false;
        };
        *bucket = values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        true
    }

    /// Snapshot of the current bucket (empty if none)
    #[must_use]
    pub fn snapshot(&self) -> Bucket {
        let state = self.state.read();
        state
            .current
            .as_deref()
            .and_then(|ws| state.buckets.get(ws))
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of a specific workspace's bucket (empty if none)
    #[must_use]
    pub fn snapshot_of(&self, workspace_id: &str) -> Bucket {
        self.state
            .read()
            .buckets
            .get(workspace_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Current bucket as a JSON object
    #[must_use]
    pub fn to_value(&self) -> Value {
        bucket_to_value(&self.snapshot())
    }

    /// Read a dotted path from the current bucket
    ///
    /// An empty path returns the whole bucket as an object. Any missing
    /// segment, or an unparsable path, yields `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        lookup(&self.snapshot(), path)
    }

    /// Read a dotted path from a specific workspace's bucket
    #[must_use]
    pub fn get_in_workspace(&self, workspace_id: &str, path: &str) -> Option<Value> {
        let state = self.state.read();
        let bucket = state.buckets.get(workspace_id)?;
        lookup(bucket, path)
    }

    /// Replace a top-level key
    ///
    /// Returns `false` when the write was dropped.
    pub fn set(&self, key: &str, value: Value) -> bool {
        let mut state = self.state.write();
        let Some(bucket) = state.current_bucket_mut("set") else {
            return false;
        };
        bucket.insert(key.to_string(), value);
        true
    }

    /// Copy-on-write nested update below a top-level key
    ///
    /// The top-level value is rebuilt along `sub_path`; nothing reachable from
    /// an earlier snapshot is mutated. An empty `sub_path` behaves like
    /// [`ContextStore::set`].
    pub fn set_path(&self, key: &str, sub_path: &str, value: Value) -> bool {
        let Ok(sub_path) = sub_path.parse::<ContextPath>() else {
            tracing::warn!(key, sub_path, "context write dropped: invalid path");
            return false;
        };
        let mut state = self.state.write();
        let Some(bucket) = state.current_bucket_mut("set_path") else {
            return false;
        };
        let top = bucket.get(key).unwrap_or(&Value::Null);
        let updated = set_in(top, sub_path.segments(), value);
        bucket.insert(key.to_string(), updated);
        true
    }

    /// Write at a full dotted path (`key.sub.path`)
    pub fn set_at(&self, path: &str, value: Value) -> bool {
        let Ok(path) = path.parse::<ContextPath>() else {
            tracing::warn!(path, "context write dropped: invalid path");
            return false;
        };
        let Some(key) = path.key() else {
            tracing::warn!("context write dropped: empty path");
            return false;
        };
        let mut state = self.state.write();
        let Some(bucket) = state.current_bucket_mut("set_at") else {
            return false;
        };
        let top = bucket.get(key).unwrap_or(&Value::Null);
        let updated = set_in(top, path.rest(), value);
        bucket.insert(key.to_string(), updated);
        true
    }

    /// Remove the value at a dotted path, returning it
    pub fn remove(&self, path: &str) -> Option<Value> {
        let path = path.parse::<ContextPath>().ok()?;
        let key = path.key()?;
        let mut state = self.state.write();
        let bucket = state.current_bucket_mut("remove")?;
        if path.rest().is_empty() {
            return bucket.remove(key);
        }
        let top = bucket.get(key)?;
        let previous = get_in(top, path.rest())?.clone();
        let updated = remove_in(top, path.rest());
        bucket.insert(key.to_string(), updated);
        Some(previous)
    }

    /// Apply a batch of updates keyed by dotted path
    ///
    /// Returns the number of updates applied.
    pub fn apply_updates(&self, updates: &Map<String, Value>) -> usize {
        updates
            .iter()
            .filter(|(path, value)| self.set_at(path, (*value).clone()))
            .count()
    }

    /// Interpolate `{{path}}` tokens against the current bucket
    #[must_use]
    pub fn interpolate(&self, template: &str) -> String {
        let snapshot = self.snapshot();
        interpolate_with(template, |path| lookup(&snapshot, path))
    }
}

/// Convert a bucket snapshot into a JSON object
#[must_use]
pub fn bucket_to_value(bucket: &Bucket) -> Value {
    Value::Object(
        bucket
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Map<String, Value>>(),
    )
}

fn lookup(bucket: &Bucket, path: &str) -> Option<Value> {
    let path = path.parse::<ContextPath>().ok()?;
    let Some(key) = path.key() else {
        return Some(bucket_to_value(bucket));
    };
    let top = bucket.get(key)?;
    get_in(top, path.rest()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_with(initial: Value) -> ContextStore {
        let store = ContextStore::new();
        let Value::Object(map) = initial else {
            panic!("initial context must be an object");
        };
        store.seed("ws", &map);
        store.select("ws");
        store
    }

    #[test]
    fn get_without_workspace_is_none() {
        let store = ContextStore::new();
        assert!(store.get("a").is_none());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.get(""), Some(json!({})));
    }

    #[test]
    fn write_without_workspace_is_dropped() {
        let store = ContextStore::new();
        assert!(!store.set("a", json!(1)));
        assert!(!store.set_path("a", "b", json!(1)));
        assert_eq!(store.bucket_count(), 0);
    }

    #[test]
    fn write_to_unloaded_workspace_is_dropped() {
        let store = ContextStore::new();
        assert!(!store.select("ghost"));
        assert!(!store.set("a", json!(1)));
        assert!(!store.has_bucket("ghost"));
    }

    #[test]
    fn seed_only_on_first_load() {
        let store = store_with(json!({"a": 1}));
        store.set("a", json!(2));
        let mut reseed = Map::new();
        reseed.insert("a".to_string(), json!(100));
        assert!(!store.seed("ws", &reseed));
        assert_eq!(store.get("a"), Some(json!(2)));
    }

    #[test]
    fn set_path_round_trip() {
        let store = store_with(json!({}));
        store.set_path("a", "b.c", json!(5));
        assert_eq!(store.get("a.b.c"), Some(json!(5)));
    }

    #[test]
    fn snapshot_isolated_from_later_writes() {
        let store = store_with(json!({"a": {"b": {"c": 1}}}));
        let before = store.snapshot();
        let before_value = store.get("a").unwrap();

        store.set_path("a", "b.c", json!(2));

        assert_eq!(before.get("a").unwrap()["b"]["c"], json!(1));
        assert_eq!(before_value["b"]["c"], json!(1));
        assert_eq!(store.get("a.b.c"), Some(json!(2)));
    }

    #[test]
    fn mutating_returned_value_does_not_leak() {
        let store = store_with(json!({"a": {"b": 1}}));
        let mut value = store.get("a").unwrap();
        value["b"] = json!(99);
        assert_eq!(store.get("a.b"), Some(json!(1)));
    }

    #[test]
    fn buckets_never_merge() {
        let store = store_with(json!({"shared": "ws"}));
        let mut other = Map::new();
        other.insert("shared".to_string(), json!("other"));
        store.seed("other", &other);

        assert_eq!(store.get("shared"), Some(json!("ws")));
        store.select("other");
        assert_eq!(store.get("shared"), Some(json!("other")));
        assert_eq!(store.get_in_workspace("ws", "shared"), Some(json!("ws")));
    }

    #[test]
    fn set_at_and_remove() {
        let store = store_with(json!({}));
        store.set_at("form.fields.email", json!("a@b.c"));
        assert_eq!(store.get("form.fields.email"), Some(json!("a@b.c")));

        assert_eq!(store.remove("form.fields.email"), Some(json!("a@b.c")));
        assert_eq!(store.get("form.fields"), Some(json!({})));
        assert_eq!(store.remove("form"), Some(json!({"fields": {}})));
        assert!(store.get("form").is_none());
    }

    #[test]
    fn apply_updates_counts_applied() {
        let store = store_with(json!({}));
        let mut updates = Map::new();
        updates.insert("a".to_string(), json!(1));
        updates.insert("b.c".to_string(), json!(2));
        updates.insert("bad..path".to_string(), json!(3));
        assert_eq!(store.apply_updates(&updates), 2);
        assert_eq!(store.get("b.c"), Some(json!(2)));
    }

    #[test]
    fn interpolate_against_current_bucket() {
        let store = store_with(json!({"user": {"name": "Ann"}}));
        assert_eq!(store.interpolate("Hi {{user.name}}!"), "Hi Ann!");
        assert_eq!(store.interpolate("Hi {{user.missing}}!"), "Hi !");
    }

    #[test]
    fn remove_bucket_clears_selection() {
        let store = store_with(json!({"a": 1}));
        assert!(store.remove_bucket("ws").is_some());
        assert!(store.current_workspace().is_none());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn replace_bucket_restores() {
        let store = store_with(json!({"a": 1}));
        let mut restored = Map::new();
        restored.insert("b".to_string(), json!(2));
        assert!(store.replace_bucket("ws", &restored));
        assert!(store.get("a").is_none());
        assert_eq!(store.get("b"), Some(json!(2)));
    }

    #[test]
    fn replace_bucket_refuses_unseeded_workspace() {
        let store = store_with(json!({"a": 1}));
        let mut restored = Map::new();
        restored.insert("b".to_string(), json!(2));
        assert!(!store.replace_bucket("ghost", &restored));
        assert!(!store.has_bucket("ghost"));
        assert_eq!(store.bucket_count(), 1);
    }
}
