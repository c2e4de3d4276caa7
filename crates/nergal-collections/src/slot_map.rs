use bytemuck::NoUninit;

use crate::{HashTable, SlotTable};

/// Keyed dense storage: a [`HashTable`] from key to [`SlotTable`] handle.
///
/// Values stay packed like in a slot table, and the handle returned by
/// `insert` remains valid until the key is removed.
#[derive(Debug, Clone)]
pub struct SlotMap<K, V> {
    lookup: HashTable<K, u32>,
    slots: SlotTable<V>,
}

impl<K, V> Default for SlotMap<K, V> {
    fn default() -> Self {
        Self {
            lookup: HashTable::default(),
            slots: SlotTable::default(),
        }
    }
}

impl<K: NoUninit, V> SlotMap<K, V> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores `value` under `key`. An existing key keeps its handle and has its value replaced.
    pub fn insert(&mut self, key: K, value: V) -> u32 {
        if let Some(handle) = self.lookup.get(&key).copied() {
            if let Some(slot) = self.slots.get_mut(handle) {
                *slot = value;
                return handle;
            }
        }

        let handle = self.slots.insert(value);
        self.lookup.insert(key, handle);
        handle
    }

    #[inline]
    pub fn handle(&self, key: &K) -> Option<u32> {
        self.lookup.get(key).copied()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.slots.get(self.handle(key)?)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = self.handle(key)?;
        self.slots.get_mut(handle)
    }

    #[inline]
    pub fn get_by_handle(&self, handle: u32) -> Option<&V> {
        self.slots.get(handle)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let handle = self.lookup.remove(key)?;
        self.slots.remove(handle)
    }

    pub fn clear(&mut self) {
        self.lookup.clear();
        self.slots.clear();
    }

    /// Live `(key, value)` pairs in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.lookup
            .iter()
            .filter_map(|(key, &handle)| self.slots.get(handle).map(|value| (key, value)))
    }

    /// Packed values in storage order.
    #[inline]
    pub fn values(&self) -> &[V] {
        self.slots.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_str;

    #[test]
    fn values_are_reachable_by_key_and_handle() {
        let mut map = SlotMap::new();
        let quad = map.insert(hash_str("quad"), "quad mesh");
        let cube = map.insert(hash_str("cube"), "cube mesh");

        assert_eq!(map.get(&hash_str("quad")), Some(&"quad mesh"));
        assert_eq!(map.get_by_handle(cube), Some(&"cube mesh"));
        assert_eq!(map.handle(&hash_str("quad")), Some(quad));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn insert_existing_key_keeps_handle() {
        let mut map = SlotMap::new();
        let first = map.insert(7u32, 1);
        let second = map.insert(7u32, 2);

        assert_eq!(first, second);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&7), Some(&2));
    }

    #[test]
    fn remove_keeps_other_keys() {
        let mut map = SlotMap::new();
        for key in 0u32..5 {
            map.insert(key, key * 2);
        }

        assert_eq!(map.remove(&1), Some(2));
        assert_eq!(map.remove(&1), None);
        assert!(!map.contains_key(&1));
        for key in [0u32, 2, 3, 4] {
            assert_eq!(map.get(&key), Some(&(key * 2)));
        }
        assert_eq!(map.iter().count(), 4);
    }

    #[test]
    fn get_mut_and_clear() {
        let mut map = SlotMap::new();
        map.insert(1u64, String::from("a"));
        if let Some(value) = map.get_mut(&1) {
            value.push('b');
        }
        assert_eq!(map.get(&1).map(String::as_str), Some("ab"));

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get(&1), None);
    }
}
