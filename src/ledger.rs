//! Named results of a run. Each number format gets its own ledger, and
//! ledgers are compared name by name.
use indexmap::map::Entry;
use indexmap::IndexMap;

/// The name of the result of `lane` in `batch`.
pub fn result_name(batch: usize, lane: usize) -> String {
    format!("result[{}][{}]", batch, lane)
}

/// Append-only, insertion-ordered map from result names to values.
#[derive(Debug, Clone)]
pub struct Ledger<T> {
    values: IndexMap<String, T>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }
}

impl<T> Ledger<T> {
    pub fn new() -> Self {
        Self::default()
    }
    /// Records a value under a new name. A name already present keeps its
    /// first value, and false is returned.
    pub fn record(&mut self, name: String, value: T) -> bool {
        match self.values.entry(name) {
            Entry::Occupied(entry) => {
                warn!("{} is already recorded", entry.key());
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }
    pub fn get(&self, name: &str) -> Option<&T> {
        self.values.get(name)
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|name| name.as_str())
    }
}

impl<T> std::iter::FromIterator<(String, T)> for Ledger<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut ledger = Ledger::new();
        for (name, value) in iter {
            ledger.record(name, value);
        }
        ledger
    }
}
