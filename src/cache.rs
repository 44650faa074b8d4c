//! Last-query memo
//!
//! Typeahead front ends re-run the same query often (key repeat, focus
//! changes). The engine itself is stateless, so callers keep the most
//! recent result here and skip the search when the query repeats.

use tracing::debug;

/// Remembers the result for the most recent key
#[derive(Debug, Clone)]
pub struct LastSearch<K, V> {
    last: Option<(K, V)>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for LastSearch<K, V> {
    fn default() -> Self {
        Self {
            last: None,
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: PartialEq, V> LastSearch<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, if it is the most recent key
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.last {
            Some((last, value)) if last == key => Some(value),
            _ => None,
        }
    }

    /// Return the value for `key`, computing and remembering it when the key changed.
    /// A failed computation leaves the previous entry in place.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, compute: F) -> Result<&V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let entry = match self.last.take() {
            Some((last, value)) if last == key => {
                self.hits += 1;
                debug!("Reusing last result ({} hits, {} misses)", self.hits, self.misses);
                (last, value)
            }
            previous => {
                self.misses += 1;
                match compute(&key) {
                    Ok(value) => (key, value),
                    Err(err) => {
                        self.last = previous;
                        return Err(err);
                    }
                }
            }
        };
        Ok(&self.last.insert(entry).1)
    }

    /// Forget the remembered result, e.g. after the candidates changed
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
