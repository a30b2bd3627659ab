//! Ordering-index bookkeeping for preference groups
//!
//! Preferences sharing a key prefix can carry a stable relative order via
//! auxiliary `<order-prefix><key>` entries. Corrupted ordering data
//! degrades (warn + drop or fall back to encounter order), it never fails
//! an enumeration.

use tracing::{debug, warn};

use crate::constants::{UNORDERED, keys};
use crate::store::map::PropertyMap;

/// Derived key holding the position of `key` within its group.
pub(crate) fn order_key(key: &str) -> String {
    format!("{}{key}", keys::ORDER_PREFIX)
}

/// Position of `key` within its group, or [`UNORDERED`] when absent.
///
/// Ordering-index keys are themselves always unordered, so an index entry
/// can never refer to another index entry.
pub(crate) fn order_of(map: &PropertyMap, key: &str) -> i32 {
    if key.starts_with(keys::ORDER_PREFIX) {
        return UNORDERED;
    }
    match map.get(&order_key(key)) {
        None => UNORDERED,
        Some(text) => text.trim().parse::<i32>().unwrap_or_else(|_| {
            warn!(key = %key, text = %text, "unparseable ordering index, treating as unordered");
            UNORDERED
        }),
    }
}

/// Record the position of `key`; a negative index clears the ordering.
pub(crate) fn set_order(map: &mut PropertyMap, key: &str, index: i32) {
    if key.starts_with(keys::ORDER_PREFIX) {
        debug!(key = %key, "refusing to order an ordering-index key");
        return;
    }
    if index < 0 {
        map.remove(&order_key(key));
    } else {
        map.set(&order_key(key), &index.to_string());
    }
}

/// All keys under `prefix`, ordered.
///
/// If every matching key carries an index, keys are placed into a dense
/// array by position and returned compacted in index order; entries that
/// collide on a slot are dropped with a warning. If any matching key lacks
/// an index, all keys are returned in encounter order instead.
pub(crate) fn enumerate(map: &PropertyMap, prefix: &str) -> Vec<String> {
    let matching = map.keys_with_prefix(prefix);
    let orders: Vec<i32> = matching.iter().map(|k| order_of(map, k)).collect();

    if orders.iter().any(|&o| o < 0) {
        // Unordered enumeration contract: encounter order wins.
        return matching;
    }

    let mut slots: Vec<Option<String>> = vec![None; matching.len()];
    for (key, order) in matching.into_iter().zip(orders) {
        let slot = order as usize;
        if slot >= slots.len() {
            slots.resize(slot + 1, None);
        }
        match &slots[slot] {
            Some(occupant) => {
                warn!(
                    key = %key,
                    occupant = %occupant,
                    slot = slot,
                    "ordering-index collision, dropping entry from enumeration"
                );
            }
            None => slots[slot] = Some(key),
        }
    }
    slots.into_iter().flatten().collect()
}

/// Remove `key` and its ordering entry, closing the positional gap it
/// leaves: every sibling (same prefix up to the last dot) placed after it
/// moves down by one.
pub(crate) fn remove_with_reindex(map: &mut PropertyMap, key: &str) -> bool {
    let removed_order = order_of(map, key);
    let removed = map.remove(key).is_some();
    map.remove(&order_key(key));

    if removed && removed_order >= 0 {
        let prefix = match key.rfind('.') {
            Some(i) => &key[..=i],
            None => "",
        };
        for sibling in map.keys_with_prefix(prefix) {
            if sibling.starts_with(keys::ORDER_PREFIX) {
                continue;
            }
            let order = order_of(map, &sibling);
            if order > removed_order {
                set_order(map, &sibling, order - 1);
            }
        }
    }
    removed
}

/// Remove every key under `prefix` along with its ordering entry. No
/// reindexing happens since the whole group goes away.
pub(crate) fn remove_group(map: &mut PropertyMap, prefix: &str) -> usize {
    let doomed = map.keys_with_prefix(prefix);
    let count = doomed.len();
    for key in doomed {
        map.remove(&key);
        map.remove(&order_key(&key));
    }
    count
}

/// Move both the value and the ordering entry from `old` to `new`.
/// Returns false when `old` is absent (nothing changes).
pub(crate) fn rename(map: &mut PropertyMap, old: &str, new: &str) -> bool {
    if !map.rename(old, new) {
        return false;
    }
    map.rename(&order_key(old), &order_key(new));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered_group() -> PropertyMap {
        let mut map = PropertyMap::new();
        map.set("scale.a", "va");
        map.set("scale.b", "vb");
        map.set("scale.c", "vc");
        set_order(&mut map, "scale.a", 0);
        set_order(&mut map, "scale.b", 1);
        set_order(&mut map, "scale.c", 2);
        map
    }

    #[test]
    fn test_order_roundtrip_and_clear() {
        let mut map = PropertyMap::new();
        map.set("menu.item", "v");
        assert_eq!(order_of(&map, "menu.item"), UNORDERED);
        set_order(&mut map, "menu.item", 4);
        assert_eq!(order_of(&map, "menu.item"), 4);
        set_order(&mut map, "menu.item", UNORDERED);
        assert_eq!(order_of(&map, "menu.item"), UNORDERED);
    }

    #[test]
    fn test_order_keys_are_never_ordered() {
        let mut map = PropertyMap::new();
        map.set("menu.item", "v");
        set_order(&mut map, "menu.item", 1);
        let index_key = order_key("menu.item");
        assert_eq!(order_of(&map, &index_key), UNORDERED);
        set_order(&mut map, &index_key, 7);
        assert!(!map.contains_key(&order_key(&index_key)));
    }

    #[test]
    fn test_enumerate_ordered() {
        let mut map = PropertyMap::new();
        map.set("menu.z", "1");
        map.set("menu.a", "2");
        set_order(&mut map, "menu.z", 1);
        set_order(&mut map, "menu.a", 0);
        assert_eq!(enumerate(&map, "menu."), vec!["menu.a", "menu.z"]);
    }

    #[test]
    fn test_enumerate_falls_back_to_encounter_order() {
        let mut map = PropertyMap::new();
        map.set("menu.z", "1");
        map.set("menu.a", "2");
        set_order(&mut map, "menu.z", 0);
        // menu.a has no index, so encounter order wins for the whole group
        assert_eq!(enumerate(&map, "menu."), vec!["menu.z", "menu.a"]);
    }

    #[test]
    fn test_enumerate_drops_collisions() {
        let mut map = PropertyMap::new();
        map.set("menu.a", "1");
        map.set("menu.b", "2");
        map.set("menu.c", "3");
        set_order(&mut map, "menu.a", 0);
        set_order(&mut map, "menu.b", 0);
        set_order(&mut map, "menu.c", 2);
        // menu.b collides with menu.a on slot 0 and is dropped; the rest
        // come back compacted in index order.
        assert_eq!(enumerate(&map, "menu."), vec!["menu.a", "menu.c"]);
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut map = ordered_group();
        assert!(remove_with_reindex(&mut map, "scale.b"));
        assert_eq!(order_of(&map, "scale.a"), 0);
        assert_eq!(order_of(&map, "scale.c"), 1);
        assert!(remove_with_reindex(&mut map, "scale.a"));
        assert_eq!(order_of(&map, "scale.c"), 0);
        assert_eq!(enumerate(&map, "scale."), vec!["scale.c"]);
    }

    #[test]
    fn test_rename_carries_order() {
        let mut map = ordered_group();
        assert!(rename(&mut map, "scale.b", "scale.renamed"));
        assert_eq!(map.get("scale.renamed"), Some("vb"));
        assert_eq!(order_of(&map, "scale.renamed"), 1);
        assert_eq!(order_of(&map, "scale.b"), UNORDERED);
        assert!(!rename(&mut map, "scale.b", "scale.elsewhere"));
    }

    #[test]
    fn test_remove_group_takes_index_entries_too() {
        let mut map = ordered_group();
        assert_eq!(remove_group(&mut map, "scale."), 3);
        assert!(map.keys_with_prefix("scale.").is_empty());
        assert!(map.keys_with_prefix(keys::ORDER_PREFIX).is_empty());
    }
}
