//! Immutable key/value pair

/// A key/value pair frozen at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrozenEntry<K, V> {
    key: K,
    value: V,
}

impl<K, V> FrozenEntry<K, V> {
    /// Freeze a pair
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// The key
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Unwrap back into a pair
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for FrozenEntry<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}
