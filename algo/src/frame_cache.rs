use std::{borrow::Borrow, collections::HashMap, hash::Hash};

use ahash::RandomState;

/// A cache keyed by an arbitrary key whose entries are only retained across
/// `frame_end` if they were looked up (a "hit") during the frame that just
/// ended. Anything that wasn't touched is evicted, bounding memory to what
/// the current frame's working set actually needs.
///
/// This is a frame-scoped cousin of an LRU cache: instead of ranking entries
/// by recency, it ranks them by "used this frame or not" and clears the flag
/// at each frame boundary.
pub struct FrameCache<K, V> {
  map: HashMap<K, Entry<V>, RandomState>,
}

struct Entry<V> {
  value: V,
  hit: bool,
}

impl<K: Eq + Hash, V> Default for FrameCache<K, V> {
  fn default() -> Self { Self { map: HashMap::default() } }
}

impl<K: Eq + Hash, V> FrameCache<K, V> {
  pub fn new() -> Self { Self::default() }

  /// Fetch a cached value, marking it as hit this frame. Returns `None` if
  /// absent (the caller is expected to compute and `insert` it).
  pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.map.get_mut(key).map(|e| {
      e.hit = true;
      &e.value
    })
  }

  pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.map.get_mut(key).map(|e| {
      e.hit = true;
      &mut e.value
    })
  }

  /// Insert or replace an entry, marking it hit for the current frame.
  pub fn insert(&mut self, key: K, value: V) {
    self.map.insert(key, Entry { value, hit: true });
  }

  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.map.contains_key(key)
  }

  pub fn len(&self) -> usize { self.map.len() }

  pub fn is_empty(&self) -> bool { self.map.is_empty() }

  /// Drop every entry that was not hit since the last `frame_end`, then
  /// clear the hit flag on survivors so the next frame starts fresh.
  pub fn frame_end(&mut self) {
    self.map.retain(|_, e| e.hit);
    for e in self.map.values_mut() {
      e.hit = false;
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> { self.map.iter().map(|(k, e)| (k, &e.value)) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unhit_entries_are_evicted_after_frame_end() {
    let mut cache = FrameCache::new();
    cache.insert("a", 1);
    cache.insert("b", 2);
    cache.frame_end();

    // neither was looked up again after frame_end, both should be gone
    // after a second frame boundary.
    cache.frame_end();
    assert!(cache.is_empty());
  }

  #[test]
  fn hit_entries_survive() {
    let mut cache = FrameCache::new();
    cache.insert("a", 1);
    cache.frame_end();

    assert_eq!(cache.get("a"), Some(&1));
    cache.frame_end();
    assert_eq!(cache.len(), 1);

    // not touched this time, drops next boundary.
    cache.frame_end();
    assert!(cache.is_empty());
  }

  #[test]
  fn insert_refreshes_hit_flag() {
    let mut cache = FrameCache::new();
    cache.insert("a", 1);
    cache.frame_end();
    cache.insert("a", 2);
    cache.frame_end();
    assert_eq!(cache.get("a"), Some(&2));
  }
}
