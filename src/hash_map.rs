#[cfg(any(feature = "foldhash", feature = "std"))]
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::bucket_table::BucketTable;
use crate::bucket_table::Iter as TableIter;
use crate::error::Error;

/// Builds the rehash callback the storage layer runs when it resizes.
///
/// Borrows only the hash builder, so the table can be mutated while the
/// returned closure is alive.
fn make_hasher<K, V, S>(hash_builder: &S) -> impl Fn(&(K, V)) -> u64 + '_
where
    K: Hash,
    S: BuildHasher,
{
    move |(key, _)| hash_builder.hash_one(key)
}

/// A hash map implemented using the separate-chaining BucketTable as the
/// underlying storage.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Pairs live in the
/// bucket their key hashes to, and the bucket count doubles or halves as the
/// load factor crosses 3/4 upward or 1/4 downward.
///
/// Unlike the standard library map, inserting an already-present key through
/// [`insert`] is a refusal rather than an overwrite; [`set`] is the
/// overwriting form. Keyed queries that can miss return [`Error::KeyNotFound`]
/// instead of an `Option`, and the bucket a key occupies is observable through
/// [`bucket_index`] and [`bucket_size`].
///
/// [`insert`]: HashMap::insert
/// [`set`]: HashMap::set
/// [`bucket_index`]: HashMap::bucket_index
/// [`bucket_size`]: HashMap::bucket_size
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: BucketTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash map with the given hasher builder and the default
    /// bucket count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::DefaultHashBuilder;
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::with_hasher(DefaultHashBuilder::default());
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: BucketTable::new(),
            hash_builder,
        }
    }

    /// Creates a new hash map with at least `capacity` buckets and the given
    /// hasher builder.
    ///
    /// The bucket count is rounded up to a power of two, with a minimum of
    /// one bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::DefaultHashBuilder;
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::with_capacity_and_hasher(100, DefaultHashBuilder::default());
    /// assert_eq!(map.capacity(), 128);
    /// # }
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: BucketTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Returns the number of key-value pairs in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no key-value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert!(map.is_empty());
    /// map.insert(1, "a");
    /// assert!(!map.is_empty());
    /// # }
    /// ```
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current bucket count of the map.
    ///
    /// This is the denominator of the load factor, not the number of pairs
    /// the map can hold; chains grow without bound until the resize
    /// thresholds move them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert_eq!(map.capacity(), 16);
    /// # }
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the ratio of stored pairs to buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.load_factor(), 1.0 / 16.0);
    /// # }
    /// ```
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Removes all key-value pairs from the map.
    ///
    /// The bucket count is left unchanged; only erasing pairs one at a time
    /// shrinks the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// for n in 0..12 {
    ///     map.insert(n, n);
    /// }
    /// assert_eq!(map.capacity(), 32);
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 32);
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Inserts a key-value pair into the map, refusing duplicates.
    ///
    /// Returns `true` if the pair was inserted. If the key is already
    /// present the map is left untouched, the given value is dropped, and
    /// `false` is returned; use [`set`] to overwrite.
    ///
    /// [`set`]: HashMap::set
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert!(map.insert(37, "a"));
    /// assert!(!map.insert(37, "b"));
    /// assert_eq!(map.at(&37), Ok(&"a"));
    /// # }
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.hash_builder.hash_one(&key);
        if self.table.find(hash, |(k, _)| k == &key).is_some() {
            return false;
        }
        let hasher = make_hasher(&self.hash_builder);
        self.table.append(hash, (key, value), hasher);
        true
    }

    /// Sets the value for a key, inserting the pair if the key is absent.
    ///
    /// Returns the previous value if the key was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.set(7, "a"), None);
    /// assert_eq!(map.set(7, "b"), Some("a"));
    /// assert_eq!(map.at(&7), Ok(&"b"));
    /// # }
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        let existing = self.table.find_mut(hash, |(k, _)| k == &key);
        match existing {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                let hasher = make_hasher(&self.hash_builder);
                self.table.append(hash, (key, value), hasher);
                None
            }
        }
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::Error;
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.at(&1), Ok(&"a"));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// # }
    /// ```
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, 10);
    /// if let Ok(value) = map.at_mut(&1) {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.at(&1), Ok(&11));
    /// # }
    /// ```
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, Error> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, |(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or(Error::KeyNotFound)
    }

    /// Returns the value for `key`, or a default value if the key is absent.
    ///
    /// The miss path constructs `V::default()` without inserting anything;
    /// the map is never modified. Use [`get_or_insert_default`] when the
    /// default should be stored.
    ///
    /// [`get_or_insert_default`]: HashMap::get_or_insert_default
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("hits", 3u32);
    ///
    /// assert_eq!(map.get_or_default(&"hits"), 3);
    /// assert_eq!(map.get_or_default(&"misses"), 0);
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn get_or_default(&self, key: &K) -> V
    where
        V: Default + Clone,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map: HashMap<&str, u32> = HashMap::new();
    /// *map.get_or_insert_default("count") += 1;
    /// *map.get_or_insert_default("count") += 1;
    /// assert_eq!(map.at(&"count"), Ok(&2));
    /// # }
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let hash = self.hash_builder.hash_one(&key);
        let hasher = make_hasher(&self.hash_builder);
        let (_, value) =
            self.table
                .find_or_append(hash, (key, V::default()), |a, b| a.0 == b.0, hasher);
        value
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// # }
    /// ```
    pub fn contains_key(&self, key: &K) -> bool {
        self.at(key).is_ok()
    }

    /// Removes the pair for `key` from the map.
    ///
    /// Returns `true` if a pair was removed, `false` if the key was absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert!(map.erase(&1));
    /// assert!(!map.erase(&1));
    /// # }
    /// ```
    pub fn erase(&mut self, key: &K) -> bool {
        let hash = self.hash_builder.hash_one(key);
        let hasher = make_hasher(&self.hash_builder);
        self.table.remove(hash, |(k, _)| k == key, hasher).is_some()
    }

    /// Returns the index of the bucket holding `key`.
    ///
    /// The index is only meaningful until the next resize moves the pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("spam", 1);
    ///
    /// let index = map.bucket_index(&"spam").unwrap();
    /// assert!(index < map.capacity());
    /// assert!(map.bucket_index(&"eggs").is_err());
    /// # }
    /// ```
    pub fn bucket_index(&self, key: &K) -> Result<usize, Error> {
        let hash = self.hash_builder.hash_one(key);
        if self.table.find(hash, |(k, _)| k == key).is_none() {
            return Err(Error::KeyNotFound);
        }
        Ok(self.table.bucket_of(hash))
    }

    /// Returns the number of pairs chained in the bucket holding `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert("spam", 1);
    /// assert_eq!(map.bucket_size(&"spam"), Ok(1));
    /// # }
    /// ```
    pub fn bucket_size(&self, key: &K) -> Result<usize, Error> {
        let index = self.bucket_index(key)?;
        Ok(self.table.bucket_len(index))
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// The iterator walks buckets in index order and chains in insertion
    /// order, skipping empty buckets, so the overall order tracks the
    /// current bucket layout rather than insertion history.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let keys: Vec<_> = map.keys().collect();
    /// assert_eq!(keys.len(), 2);
    /// # }
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let values: Vec<_> = map.values().collect();
    /// assert_eq!(values.len(), 2);
    /// # }
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates a new hash map with at least `capacity` buckets using the
    /// default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::with_capacity(100);
    /// assert_eq!(map.capacity(), 128);
    /// # }
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Builds a map by pairing a sequence of keys with a sequence of values.
    ///
    /// Pairs are applied in order with [`set`] semantics, so a key appearing
    /// twice keeps the value paired with its last occurrence.
    ///
    /// [`set`]: HashMap::set
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeMismatch`] if the sequences differ in length;
    /// nothing is inserted in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let map = HashMap::from_keys_values(vec!["a", "b"], vec![1, 2]).unwrap();
    /// assert_eq!(map.at(&"b"), Ok(&2));
    ///
    /// let mismatched = HashMap::<&str, i32>::from_keys_values(vec!["a"], vec![]);
    /// assert!(mismatched.is_err());
    /// # }
    /// ```
    pub fn from_keys_values(keys: Vec<K>, values: Vec<V>) -> Result<Self, Error> {
        if keys.len() != values.len() {
            return Err(Error::SizeMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        let mut map = Self::new();
        for (key, value) in keys.into_iter().zip(values) {
            map.set(key, value);
        }
        Ok(map)
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    /// Two maps are equal when they hold the same pairs, regardless of
    /// bucket count, hasher state, or the order pairs were inserted.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.at(key).is_ok_and(|v| *value == *v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: TableIter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}
