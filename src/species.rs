use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::defaults::{ATOM_TYPE_MAP, UNMAPPED_SPECIES};

/// Maps raw atom type tokens from a dump onto species labels.
///
/// A token that is not in the map is not an error. It maps onto [`UNMAPPED_SPECIES`], which
/// shows up in the output as a data-quality signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct TypeMap {
    entries: BTreeMap<String, Arc<str>>,
    unmapped: Arc<str>,
}

impl TypeMap {
    /// Create an empty [`TypeMap`]. Every token maps to the sentinel.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            unmapped: Arc::from(UNMAPPED_SPECIES),
        }
    }

    pub fn insert(&mut self, token: impl Into<String>, species: &str) {
        self.entries.insert(token.into(), Arc::from(species));
    }

    /// Look up the species for `token`, or `None` if it is not mapped.
    pub fn get(&self, token: &str) -> Option<&Arc<str>> {
        self.entries.get(token)
    }

    /// Returns the species label for `token`, falling back to the sentinel.
    ///
    /// The label is shared, so this does not allocate.
    pub fn species(&self, token: &str) -> Arc<str> {
        self.get(token).unwrap_or(&self.unmapped).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        ATOM_TYPE_MAP.into_iter().collect()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for TypeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::empty();
        for (token, species) in iter {
            map.insert(token, species.as_ref());
        }
        map
    }
}

impl From<BTreeMap<String, String>> for TypeMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<TypeMap> for BTreeMap<String, String> {
    fn from(map: TypeMap) -> Self {
        map.iter()
            .map(|(token, species)| (token.to_string(), species.to_string()))
            .collect()
    }
}

impl std::fmt::Display for TypeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (token, species) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{token} -> {species}")?;
            first = false;
        }
        if first {
            write!(f, "(empty)")?;
        }
        Ok(())
    }
}
