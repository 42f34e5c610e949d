#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bucket_table;

/// Lookup and construction errors reported by the map.
pub mod error;

/// A key-value map over separate-chaining bucket storage.
///
/// This module provides a `HashMap` that wraps the `BucketTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

/// Phrase-scoring spam detection built on top of the map.
///
/// This module provides the parsing, scoring, and classification logic used
/// by the `spam-detector` binary.
#[cfg(feature = "std")]
pub mod detector;

pub use bucket_table::BucketTable;
pub use error::Error;
pub use hash_map::HashMap;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Default hash builder for [`HashMap`].
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Default hash builder for [`HashMap`].
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Dummy default hash builder for [`HashMap`].
        ///
        /// This type is uninhabited; without the `foldhash` or `std` features
        /// a map must be constructed through [`HashMap::with_hasher`] or
        /// [`HashMap::with_capacity_and_hasher`].
        pub enum DefaultHashBuilder {}
    }
}
