use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Indirection entry of a handle that owns no data.
pub const INVALID_SLOT: u32 = u32::MAX;

/// Dense storage addressed through stable integer handles.
///
/// A handle is a position in `indices`; `indices[handle]` is either
/// [`INVALID_SLOT`] or the position of the value in `data`. Values stay packed
/// (erase swaps the last value into the hole), so iteration over `as_slice()`
/// touches no gaps.
///
/// Performance characteristics:
/// - `insert()` reuses the lowest free handle in O(log n), else appends
/// - `remove()` is O(1): `owners` maps each dense position back to its handle
/// - lookups are two array reads
#[derive(Debug, Clone)]
pub struct SlotTable<T> {
    indices: Vec<u32>,
    data: Vec<T>,
    /// `owners[i]` is the handle whose indirection entry points at `data[i]`.
    owners: Vec<u32>,
    free: BinaryHeap<Reverse<u32>>,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            data: Vec::new(),
            owners: Vec::new(),
            free: BinaryHeap::new(),
        }
    }
}

impl<T> SlotTable<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut table = Self::default();
        table.reserve(capacity);
        table
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of handles ever allocated since the last clear.
    #[inline]
    pub fn handle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.indices.reserve(additional);
        self.data.reserve(additional);
        self.owners.reserve(additional);
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> u32 {
        let handle = match self.free.pop() {
            Some(Reverse(handle)) => handle,
            None => {
                self.indices.push(INVALID_SLOT);
                (self.indices.len() - 1) as u32
            }
        };

        self.indices[handle as usize] = self.data.len() as u32;
        self.data.push(value);
        self.owners.push(handle);
        handle
    }

    #[inline]
    pub fn contains(&self, handle: u32) -> bool {
        self.dense_index(handle).is_some()
    }

    #[inline]
    pub fn get(&self, handle: u32) -> Option<&T> {
        self.dense_index(handle).map(|index| &self.data[index])
    }

    #[inline]
    pub fn get_mut(&mut self, handle: u32) -> Option<&mut T> {
        self.dense_index(handle).map(|index| &mut self.data[index])
    }

    /// Removes the value behind `handle`.
    ///
    /// The last value moves into the vacated position; every other handle stays
    /// valid. Removing the only live value resets the table, so handle numbering
    /// restarts at 0.
    pub fn remove(&mut self, handle: u32) -> Option<T> {
        let Some(index) = self.dense_index(handle) else {
            log::warn!("slot table: remove of invalid handle {handle}");
            return None;
        };

        if self.data.len() == 1 {
            let value = self.data.pop();
            self.clear();
            return value;
        }

        let value = self.data.swap_remove(index);
        self.owners.swap_remove(index);
        if let Some(&moved) = self.owners.get(index) {
            self.indices[moved as usize] = index as u32;
        }

        self.indices[handle as usize] = INVALID_SLOT;
        self.free.push(Reverse(handle));
        Some(value)
    }

    /// Drops every value and handle. Keeps allocated capacity for reuse.
    pub fn clear(&mut self) {
        self.indices.clear();
        self.data.clear();
        self.owners.clear();
        self.free.clear();
    }

    /// Live `(handle, value)` pairs in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.indices
            .iter()
            .enumerate()
            .filter(|&(_, &index)| index != INVALID_SLOT)
            .map(|(handle, &index)| (handle as u32, &self.data[index as usize]))
    }

    /// Live `(handle, value)` pairs in dense storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.owners.iter().copied().zip(self.data.iter_mut())
    }

    /// Live handles in handle order.
    pub fn handles(&self) -> impl Iterator<Item = u32> {
        self.iter().map(|(handle, _)| handle)
    }

    /// Packed values in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn dense_index(&self, handle: u32) -> Option<usize> {
        match self.indices.get(handle as usize) {
            Some(&index) if index != INVALID_SLOT => Some(index as usize),
            _ => None,
        }
    }
}
