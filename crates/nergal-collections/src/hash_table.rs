use std::mem;

use bytemuck::NoUninit;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Seed used for every key hash.
pub const HASH_SEED: u64 = 0x3141_5296;

/// Growth is triggered when an insert would start at or above this load.
const MAX_LOAD_FACTOR: f32 = 0.5;

#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh3_64_with_seed(bytes, HASH_SEED)
}

#[inline]
pub fn hash_str(value: &str) -> u64 {
    hash_bytes(value.as_bytes())
}

#[derive(Debug, Clone)]
enum Slot<K, V> {
    Inactive,
    Active { hash: u64, key: K, value: V },
}

/// Open-addressing hash table with linear probing.
///
/// Keys are plain-old-data and compared by their raw bytes. Removal only marks
/// a slot inactive, so a lookup miss probes the whole table rather than stopping
/// at the first inactive slot.
///
/// Capacity starts at 2 and doubles; after any insert `len / capacity <= 0.5`.
#[derive(Debug, Clone)]
pub struct HashTable<K, V> {
    slots: Vec<Slot<K, V>>,
    len: usize,
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }
}

impl<K: NoUninit, V> HashTable<K, V> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f32 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.len as f32 / self.slots.len() as f32
        }
    }

    /// Inserts `value` under `key`, returning the previous value if the key was present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_key(&key);
        if let Some(index) = self.find(hash, &key) {
            if let Slot::Active { value: slot, .. } = &mut self.slots[index] {
                return Some(mem::replace(slot, value));
            }
        }

        if self.slots.is_empty() || self.load_factor() >= MAX_LOAD_FACTOR {
            self.grow();
        }
        self.place(hash, key, value);
        self.len += 1;
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.find(hash_key(key), key)?;
        match &self.slots[index] {
            Slot::Active { value, .. } => Some(value),
            Slot::Inactive => None,
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find(hash_key(key), key)?;
        match &mut self.slots[index] {
            Slot::Active { value, .. } => Some(value),
            Slot::Inactive => None,
        }
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(hash_key(key), key).is_some()
    }

    /// Removes `key`, leaving its slot inactive.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.find(hash_key(key), key)?;
        match mem::replace(&mut self.slots[index], Slot::Inactive) {
            Slot::Active { value, .. } => {
                self.len -= 1;
                Some(value)
            }
            Slot::Inactive => None,
        }
    }

    /// Marks every slot inactive. Keeps allocated capacity for reuse.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Inactive;
        }
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Active { key, value, .. } => Some((key, value)),
            Slot::Inactive => None,
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Active { key, value, .. } => Some((&*key, value)),
            Slot::Inactive => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    fn find(&self, hash: u64, key: &K) -> Option<usize> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return None;
        }

        let key_bytes = bytemuck::bytes_of(key);
        let start = (hash % capacity as u64) as usize;
        (0..capacity)
            .map(|step| (start + step) % capacity)
            .find(|&index| match &self.slots[index] {
                Slot::Active { hash: h, key: k, .. } => *h == hash && bytemuck::bytes_of(k) == key_bytes,
                Slot::Inactive => false,
            })
    }

    /// Claims the first inactive slot along the probe sequence of `hash`.
    fn place(&mut self, hash: u64, key: K, value: V) {
        let capacity = self.slots.len();
        let start = (hash % capacity as u64) as usize;
        let index = (0..capacity)
            .map(|step| (start + step) % capacity)
            .find(|&index| matches!(self.slots[index], Slot::Inactive));

        match index {
            Some(index) => self.slots[index] = Slot::Active { hash, key, value },
            // The load factor bound keeps at least half the slots inactive.
            None => unreachable!("hash table has no inactive slot at capacity {capacity}"),
        }
    }

    /// Doubles capacity and rehashes active entries into their new probe positions.
    fn grow(&mut self) {
        let capacity = (self.slots.len() * 2).max(2);
        let old = mem::replace(&mut self.slots, Vec::with_capacity(capacity));
        self.slots.resize_with(capacity, || Slot::Inactive);

        for slot in old {
            if let Slot::Active { hash, key, value } = slot {
                self.place(hash, key, value);
            }
        }
    }
}

#[inline]
fn hash_key<K: NoUninit>(key: &K) -> u64 {
    hash_bytes(bytemuck::bytes_of(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── round trip ───────────────────────────────────────────────────────────

    #[test]
    fn inserted_pairs_are_found_until_removed() {
        let mut table = HashTable::new();
        for key in 0u32..64 {
            assert_eq!(table.insert(key, key * 10), None);
        }

        for key in 0u32..64 {
            assert_eq!(table.get(&key), Some(&(key * 10)));
            assert!(table.contains_key(&key));
        }

        assert_eq!(table.remove(&17), Some(170));
        assert!(!table.contains_key(&17));
        assert_eq!(table.get(&17), None);
        assert_eq!(table.len(), 63);
    }

    #[test]
    fn missing_key_is_none_on_empty_table() {
        let table: HashTable<u64, u8> = HashTable::new();
        assert_eq!(table.get(&5), None);
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn insert_existing_key_updates_in_place() {
        let mut table = HashTable::new();
        table.insert(3u32, "a");
        let capacity = table.capacity();

        assert_eq!(table.insert(3u32, "b"), Some("a"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.get(&3), Some(&"b"));
    }

    #[test]
    fn reinsert_after_remove_is_found() {
        let mut table = HashTable::new();
        for key in 0u64..8 {
            table.insert(key, key);
        }
        table.remove(&2);
        table.remove(&5);
        table.insert(5, 500);

        assert_eq!(table.get(&5), Some(&500));
        assert_eq!(table.get(&2), None);
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn byte_array_keys_compare_by_content() {
        let mut table = HashTable::new();
        table.insert([1u8, 2, 3, 4], 1);
        table.insert([4u8, 3, 2, 1], 2);

        let probe = [1u8, 2, 3, 4];
        assert_eq!(table.get(&probe), Some(&1));
    }

    // ── growth ───────────────────────────────────────────────────────────────

    #[test]
    fn load_factor_never_exceeds_half_after_insert() {
        let mut table = HashTable::new();
        for key in 0u32..500 {
            table.insert(key.wrapping_mul(2_654_435_761), ());
            assert!(table.load_factor() <= 0.5, "load {} at len {}", table.load_factor(), table.len());
        }
    }

    #[test]
    fn capacity_starts_at_two_and_doubles() {
        let mut table = HashTable::new();
        let mut seen = Vec::new();
        for key in 0u32..9 {
            table.insert(key, ());
            if seen.last() != Some(&table.capacity()) {
                seen.push(table.capacity());
            }
        }
        assert_eq!(seen, vec![2, 4, 8, 16, 32]);
    }

    #[test]
    fn entries_survive_growth() {
        let mut table = HashTable::new();
        for key in 0u16..1000 {
            table.insert(key, u32::from(key) + 1);
        }
        assert!((0u16..1000).all(|key| table.get(&key) == Some(&(u32::from(key) + 1))));
    }

    // ── iteration ────────────────────────────────────────────────────────────

    #[test]
    fn iteration_skips_inactive_slots() {
        let mut table = HashTable::new();
        for key in 0u32..10 {
            table.insert(key, key);
        }
        for key in (0u32..10).step_by(2) {
            table.remove(&key);
        }

        let mut keys: Vec<u32> = table.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn iter_mut_updates_values() {
        let mut table = HashTable::new();
        table.insert(1u8, 1);
        table.insert(2u8, 2);
        for (_, value) in table.iter_mut() {
            *value *= 100;
        }
        assert_eq!(table.values().sum::<i32>(), 300);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table = HashTable::new();
        for key in 0u32..20 {
            table.insert(key, ());
        }
        let capacity = table.capacity();
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn string_hash_is_stable_for_equal_content() {
        assert_eq!(hash_str("u_color"), hash_str(&String::from("u_color")));
        assert_ne!(hash_str("u_color"), hash_str("u_colour"));
    }
}
