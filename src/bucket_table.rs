use alloc::vec::Vec;
use core::mem;

/// Number of buckets in a freshly constructed table.
pub const DEFAULT_CAPACITY: usize = 16;

/// Smallest bucket count the table will shrink to.
pub const MIN_CAPACITY: usize = 1;

/// Capacity multiplier applied on growth and divisor applied on shrink.
const RESIZE_FACTOR: usize = 2;

/// True once `populated` entries fill `capacity` buckets to at least 3/4.
///
/// Widened to u128 so the products cannot overflow for any `usize` inputs.
#[inline]
fn reached_grow_threshold(populated: usize, capacity: usize) -> bool {
    populated as u128 * 4 >= capacity as u128 * 3
}

/// True while `populated` entries fill `capacity` buckets to less than 1/4.
#[inline]
fn below_shrink_threshold(populated: usize, capacity: usize) -> bool {
    (populated as u128) * 4 < capacity as u128
}

/// Separate-chaining bucket storage.
///
/// A `BucketTable<V>` owns a power-of-two number of buckets, each an ordered
/// growable sequence of values. It knows nothing about keys: every operation
/// takes a precomputed 64-bit hash plus closures for equality and (where a
/// resize may move entries) rehashing. [`HashMap`] layers key/value semantics
/// on top by storing `(K, V)` pairs.
///
/// The table doubles its bucket count when an append would fill it to 3/4 or
/// more, and halves (repeatedly, to a floor of one bucket) when a removal
/// leaves it under 1/4 full. Lookups never resize.
///
/// [`HashMap`]: crate::HashMap
#[derive(Clone)]
pub struct BucketTable<V> {
    buckets: Vec<Vec<V>>,
    populated: usize,
}

impl<V> BucketTable<V> {
    /// Creates a table with [`DEFAULT_CAPACITY`] empty buckets.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a table with at least `capacity` buckets.
    ///
    /// The bucket count is rounded up to a power of two, with a minimum of
    /// [`MIN_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Vec::new);
        BucketTable {
            buckets,
            populated: 0,
        }
    }

    /// Returns the number of values stored in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the current bucket count.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the ratio of stored values to buckets.
    pub fn load_factor(&self) -> f64 {
        self.populated as f64 / self.buckets.len() as f64
    }

    /// Returns the bucket index a value with this hash belongs to.
    ///
    /// The bucket count is a power of two, so the modulo reduces to a mask.
    pub fn bucket_of(&self, hash: u64) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    /// Returns the number of values currently chained in bucket `index`, or
    /// zero for an out-of-range index.
    pub fn bucket_len(&self, index: usize) -> usize {
        self.buckets.get(index).map_or(0, Vec::len)
    }

    /// Returns a reference to the first value in the target bucket matching
    /// `eq`.
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.bucket_of(hash);
        self.buckets[index].iter().find(|value| eq(value))
    }

    /// Returns a mutable reference to the first value in the target bucket
    /// matching `eq`.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.bucket_of(hash);
        self.buckets[index].iter_mut().find(|value| eq(value))
    }

    /// Appends `value` to the bucket selected by `hash` and returns a
    /// reference to it.
    ///
    /// The caller must have established that no equal value is present; the
    /// table itself never compares appended values. Runs the growth check
    /// first: if the table would reach 3/4 full, the bucket count doubles
    /// (exactly once) and every entry is rehashed through `hasher` before the
    /// new value lands in its bucket.
    pub fn append(&mut self, hash: u64, value: V, hasher: impl Fn(&V) -> u64) -> &mut V {
        if reached_grow_threshold(self.populated + 1, self.capacity()) {
            let capacity = self.capacity() * RESIZE_FACTOR;
            self.rehash(capacity, &hasher);
        }
        let index = self.bucket_of(hash);
        self.populated += 1;
        let bucket = &mut self.buckets[index];
        bucket.push(value);
        let last = bucket.len() - 1;
        &mut bucket[last]
    }

    /// Returns the value matching `eq`, appending `value` first if no match
    /// exists.
    ///
    /// `eq` compares a stored candidate against `value`. On a hit the passed
    /// `value` is dropped.
    pub fn find_or_append(
        &mut self,
        hash: u64,
        value: V,
        eq: impl Fn(&V, &V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> &mut V {
        let index = self.bucket_of(hash);
        let position = self.buckets[index].iter().position(|stored| eq(stored, &value));
        match position {
            Some(position) => &mut self.buckets[index][position],
            None => self.append(hash, value, hasher),
        }
    }

    /// Removes and returns the first value in the target bucket matching
    /// `eq`.
    ///
    /// The relative order of the remaining values in that bucket is
    /// preserved. A successful removal runs the shrink check: the bucket
    /// count halves while the table is under 1/4 full, stopping at
    /// [`MIN_CAPACITY`], with all entries rehashed through `hasher` into the
    /// final bucket count.
    pub fn remove(
        &mut self,
        hash: u64,
        eq: impl Fn(&V) -> bool,
        hasher: impl Fn(&V) -> u64,
    ) -> Option<V> {
        let index = self.bucket_of(hash);
        let position = self.buckets[index].iter().position(|value| eq(value))?;
        let value = self.buckets[index].remove(position);
        self.populated -= 1;
        self.shrink_if_sparse(&hasher);
        Some(value)
    }

    /// Empties every bucket without changing the bucket count.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.populated = 0;
    }

    /// Returns an iterator over all stored values in bucket order, skipping
    /// empty buckets.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: &self.buckets,
            bucket: 0,
            slot: 0,
        }
    }

    fn shrink_if_sparse(&mut self, hasher: &impl Fn(&V) -> u64) {
        let mut capacity = self.capacity();
        while capacity > MIN_CAPACITY && below_shrink_threshold(self.populated, capacity) {
            capacity /= RESIZE_FACTOR;
        }
        if capacity != self.capacity() {
            self.rehash(capacity, hasher);
        }
    }

    /// Moves every value into a fresh bucket array of `new_capacity` slots.
    ///
    /// `new_capacity` must be a power of two. Bucket indices are recomputed
    /// from each value's hash under the new mask; values that still share a
    /// bucket keep their relative order.
    fn rehash(&mut self, new_capacity: usize, hasher: &impl Fn(&V) -> u64) {
        let mask = new_capacity - 1;
        let mut buckets = Vec::with_capacity(new_capacity);
        buckets.resize_with(new_capacity, Vec::new);
        for bucket in mem::take(&mut self.buckets) {
            for value in bucket {
                let index = hasher(&value) as usize & mask;
                buckets[index].push(value);
            }
        }
        self.buckets = buckets;
    }
}

impl<V> Default for BucketTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A cursor over the values of a [`BucketTable`].
///
/// Walks the bucket array in index order; within a bucket, values come out in
/// insertion order. Advancing past the end of a bucket steps to the next
/// non-empty one.
pub struct Iter<'a, V> {
    buckets: &'a [Vec<V>],
    bucket: usize,
    slot: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(bucket) = self.buckets.get(self.bucket) {
            if let Some(value) = bucket.get(self.slot) {
                self.slot += 1;
                return Some(value);
            }
            self.bucket += 1;
            self.slot = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn ident(value: &u64) -> u64 {
        *value
    }

    #[test]
    fn test_with_capacity_rounds_to_power_of_two() {
        assert_eq!(BucketTable::<u64>::with_capacity(0).capacity(), 1);
        assert_eq!(BucketTable::<u64>::with_capacity(1).capacity(), 1);
        assert_eq!(BucketTable::<u64>::with_capacity(3).capacity(), 4);
        assert_eq!(BucketTable::<u64>::with_capacity(16).capacity(), 16);
        assert_eq!(BucketTable::<u64>::with_capacity(17).capacity(), 32);
    }

    #[test]
    fn test_new_is_empty_at_default_capacity() {
        let table: BucketTable<u64> = BucketTable::new();
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
        assert_eq!(table.len(), 0);
        assert!(table.is_empty());
        assert_eq!(table.load_factor(), 0.0);
    }

    #[test]
    fn test_append_and_find() {
        let mut table = BucketTable::new();
        table.append(7, 7u64, ident);
        table.append(9, 9u64, ident);

        assert_eq!(table.len(), 2);
        assert_eq!(table.find(7, |v| *v == 7), Some(&7));
        assert_eq!(table.find(9, |v| *v == 9), Some(&9));
        assert_eq!(table.find(8, |v| *v == 8), None);
    }

    #[test]
    fn test_find_mut_updates_in_place() {
        let mut table = BucketTable::new();
        table.append(3, (3u64, 0u32), |(k, _)| *k);
        if let Some((_, count)) = table.find_mut(3, |(k, _)| *k == 3) {
            *count += 1;
        }
        assert_eq!(table.find(3, |(k, _)| *k == 3), Some(&(3, 1)));
    }

    #[test]
    fn test_append_grows_at_upper_load_factor() {
        let mut table = BucketTable::new();
        for value in 0..11u64 {
            table.append(value, value, ident);
        }
        // 11/16 is under 3/4.
        assert_eq!(table.capacity(), 16);

        table.append(11, 11u64, ident);
        // 12/16 reaches 3/4, so the append doubles the bucket count.
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.len(), 12);
        for value in 0..12u64 {
            assert_eq!(table.find(value, |v| *v == value), Some(&value));
        }
    }

    #[test]
    fn test_grow_doubles_exactly_once_per_append() {
        let mut table: BucketTable<u64> = BucketTable::with_capacity(1);
        table.append(0, 0, ident);
        assert_eq!(table.capacity(), 2);
        table.append(1, 1, ident);
        assert_eq!(table.capacity(), 4);
        table.append(2, 2, ident);
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn test_remove_shrinks_below_lower_load_factor() {
        let mut table = BucketTable::new();
        for value in 0..8u64 {
            table.append(value, value, ident);
        }
        assert_eq!(table.capacity(), 16);

        // 4/16 sits exactly on 1/4, which does not shrink.
        for value in 0..4u64 {
            table.remove(value, |v| *v == value, ident);
        }
        assert_eq!(table.capacity(), 16);

        // 3/16 is under 1/4; halving repeats until 3/8 >= 1/4.
        table.remove(4, |v| *v == 4, ident);
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_remove_last_entry_shrinks_to_floor() {
        let mut table = BucketTable::new();
        table.append(5, 5u64, ident);
        table.remove(5, |v| *v == 5, ident);

        assert_eq!(table.capacity(), MIN_CAPACITY);
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_missing_value_leaves_table_alone() {
        let mut table = BucketTable::new();
        table.append(5, 5u64, ident);

        assert_eq!(table.remove(6, |v| *v == 6, ident), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn test_remove_preserves_bucket_order() {
        let mut table = BucketTable::new();
        // All three land in bucket 0 of a 16-bucket table.
        table.append(0, 0u64, ident);
        table.append(16, 16u64, ident);
        table.append(32, 32u64, ident);

        table.remove(16, |v| *v == 16, ident);
        let remaining: Vec<u64> = table.iter().copied().collect();
        assert_eq!(remaining, vec![0, 32]);
    }

    #[test]
    fn test_find_or_append_reuses_existing_value() {
        let mut table = BucketTable::new();
        table.append(4, (4u64, 1u32), |(k, _)| *k);

        let (_, count) = table.find_or_append(4, (4u64, 9u32), |a, b| a.0 == b.0, |(k, _)| *k);
        assert_eq!(*count, 1);
        assert_eq!(table.len(), 1);

        let (_, count) = table.find_or_append(5, (5u64, 9u32), |a, b| a.0 == b.0, |(k, _)| *k);
        assert_eq!(*count, 9);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_iter_skips_empty_buckets() {
        let mut table = BucketTable::new();
        table.append(9, 9u64, ident);
        table.append(3, 3u64, ident);
        table.append(19, 19u64, ident);

        // Bucket 3 chains [3, 19]; bucket 9 holds [9]; the rest are empty.
        let values: Vec<u64> = table.iter().copied().collect();
        assert_eq!(values, vec![3, 19, 9]);
    }

    #[test]
    fn test_iter_on_empty_table() {
        let table: BucketTable<u64> = BucketTable::new();
        assert_eq!(table.iter().next(), None);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut table = BucketTable::new();
        for value in 0..12u64 {
            table.append(value, value, ident);
        }
        assert_eq!(table.capacity(), 32);

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.iter().next(), None);
    }

    #[test]
    fn test_rehash_recomputes_bucket_indices() {
        let mut table = BucketTable::new();
        // 17 maps to bucket 1 of 16 buckets, then to bucket 17 of 32.
        table.append(17, 17u64, ident);
        assert_eq!(table.bucket_of(17), 1);
        assert_eq!(table.bucket_len(1), 1);

        for value in 0..11u64 {
            table.append(value, value, ident);
        }
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.bucket_of(17), 17);
        assert_eq!(table.bucket_len(17), 1);
        assert_eq!(table.bucket_len(1), 1);
    }

    #[test]
    fn test_load_factor_tracks_population() {
        let mut table = BucketTable::new();
        for value in 0..8u64 {
            table.append(value, value, ident);
        }
        assert_eq!(table.load_factor(), 0.5);
    }
}
