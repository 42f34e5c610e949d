use thiserror::Error;

/// Errors returned by fallible [`HashMap`] operations.
///
/// [`HashMap`]: crate::HashMap
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A keyed operation named a key the map does not contain.
    #[error("key not found in map")]
    KeyNotFound,

    /// Paired key and value sequences differ in length.
    #[error("cannot pair {keys} keys with {values} values")]
    SizeMismatch {
        /// Number of keys supplied.
        keys: usize,
        /// Number of values supplied.
        values: usize,
    },
}
