//! Platform objects kept from the last enumeration, keyed by package name.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

pub struct Enumerated<V> {
    inner: RwLock<HashMap<String, V>>,
}

impl<V: Clone> Enumerated<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Swap in a fresh enumeration; packages missing from it are forgotten.
    pub fn replace(&self, entries: impl IntoIterator<Item = (String, V)>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = entries.into_iter().collect();
    }

    pub fn get(&self, package_name: &str) -> Option<V> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(package_name)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_survive_until_the_next_enumeration() {
        let infos = Enumerated::new();
        assert_eq!(infos.get("com.a"), None);

        infos.replace([("com.a".to_string(), 1), ("com.b".to_string(), 2)]);
        assert_eq!(infos.get("com.a"), Some(1));
        assert_eq!(infos.get("com.b"), Some(2));

        infos.replace([("com.b".to_string(), 3)]);
        assert_eq!(infos.get("com.a"), None);
        assert_eq!(infos.get("com.b"), Some(3));
    }
}
