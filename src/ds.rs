use std::{
    collections::{hash_map, BTreeMap, HashMap},
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    gym::Cell,
};

/// Action values recorded for a single state, ordered row-major
pub type ActionValues = BTreeMap<Cell, f64>;

/// State-key → action → value mapping learned by the Q-table agent
///
/// Lookups of absent entries read as `0.0`. Entries are only ever inserted or
/// overwritten, never removed. Keys are not validated against reachable boards.
///
/// Persisted as a JSON object of objects: `{ "X   O    ": { "0,1": 0.25 } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueTable {
    states: HashMap<String, ActionValues>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states with an entry
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of recorded state-action pairs
    pub fn num_values(&self) -> usize {
        self.states.values().map(BTreeMap::len).sum()
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    /// Recorded values for `state`, if it was ever visited
    pub fn actions(&self, state: &str) -> Option<&ActionValues> {
        self.states.get(state)
    }

    /// Value of `action` in `state`, `0.0` when unseen
    pub fn get(&self, state: &str, action: Cell) -> f64 {
        self.states
            .get(state)
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: &str, action: Cell, value: f64) {
        self.entry(state).insert(action, value);
    }

    /// Create `state` and any of `actions` not yet recorded, at `0.0`
    pub fn touch(&mut self, state: &str, actions: &[Cell]) {
        let values = self.entry(state);
        for &action in actions {
            values.entry(action).or_insert(0.0);
        }
    }

    /// Highest value recorded for `state` over all of its stored actions
    ///
    /// `0.0` if the state is unseen or has no recorded actions.
    pub fn max_value(&self, state: &str) -> f64 {
        self.states
            .get(state)
            .and_then(|actions| actions.values().copied().reduce(f64::max))
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, ActionValues> {
        self.states.iter()
    }

    fn entry(&mut self, state: &str) -> &mut ActionValues {
        self.states.entry(state.to_string()).or_default()
    }

    /// Write the table to `path` as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io("create", path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(Error::Encode)?;
        writer.flush().map_err(|e| Error::io("write", path, e))?;
        log::info!("saved value table to {} ({} states)", path.display(), self.len());
        Ok(())
    }

    /// Read a table previously written by [`save`](Self::save)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io("open", path, e))?;
        let table: Self = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            Error::CorruptTable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        log::info!("loaded value table from {} ({} states)", path.display(), table.len());
        Ok(table)
    }

    /// Like [`load`](Self::load), but a missing or corrupt file yields an empty
    /// table, treated as having no prior knowledge
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; starting from an empty value table");
            Self::new()
        })
    }
}

impl<'a> IntoIterator for &'a ValueTable {
    type Item = (&'a String, &'a ActionValues);
    type IntoIter = hash_map::Iter<'a, String, ActionValues>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_BOARD: &str = "         ";

    fn cell(row: usize, col: usize) -> Cell {
        Cell::new(row, col).unwrap()
    }

    #[test]
    fn defaults_to_zero() {
        let table = ValueTable::new();
        assert_eq!(table.get(EMPTY_BOARD, cell(0, 0)), 0.0, "Unseen value is zero");
        assert_eq!(table.max_value(EMPTY_BOARD), 0.0, "Unseen max is zero");
        assert!(table.is_empty());
    }

    #[test]
    fn set_and_max() {
        let mut table = ValueTable::new();
        table.set(EMPTY_BOARD, cell(0, 0), -0.5);
        table.set(EMPTY_BOARD, cell(1, 1), -0.2);
        assert_eq!(table.get(EMPTY_BOARD, cell(1, 1)), -0.2);
        assert_eq!(
            table.max_value(EMPTY_BOARD),
            -0.2,
            "Max over recorded actions only, even when all are negative"
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.num_values(), 2);
    }

    #[test]
    fn touch_does_not_overwrite() {
        let mut table = ValueTable::new();
        table.set(EMPTY_BOARD, cell(0, 0), 0.7);
        table.touch(EMPTY_BOARD, &[cell(0, 0), cell(0, 1)]);
        assert_eq!(table.get(EMPTY_BOARD, cell(0, 0)), 0.7, "Existing value kept");
        assert_eq!(
            table.actions(EMPTY_BOARD).map(BTreeMap::len),
            Some(2),
            "Missing action created"
        );
        table.touch("X        ", &[]);
        assert!(table.contains_state("X        "), "State created without actions");
        assert_eq!(table.max_value("X        "), 0.0);
    }

    #[test]
    fn save_load_roundtrip() {
        let mut table = ValueTable::new();
        table.set(EMPTY_BOARD, cell(0, 0), 0.1 + 0.2);
        table.set(EMPTY_BOARD, cell(2, 2), -1.0 / 3.0);
        table.set("O   X    ", cell(1, 2), 1e-300);
        table.set("OX O X   ", cell(2, 0), 0.123_456_789_012_345_68);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        table.save(&path).unwrap();
        let loaded = ValueTable::load(&path).unwrap();
        assert_eq!(loaded, table, "Identical keys and values after round-trip");
    }

    #[test]
    fn json_layout() {
        let mut table = ValueTable::new();
        table.set(EMPTY_BOARD, cell(1, 1), 0.5);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"         ":{"1,1":0.5}}"#, "Nested object keyed by action key");
    }

    #[test]
    fn load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(
            matches!(ValueTable::load(&missing), Err(Error::Io { .. })),
            "Missing file is an IO error"
        );

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{\"         \": {\"9,9\": 1.0}}").unwrap();
        assert!(
            matches!(ValueTable::load(&corrupt), Err(Error::CorruptTable { .. })),
            "Bad action key is corruption"
        );

        assert!(ValueTable::load_or_empty(&missing).is_empty(), "Falls back to empty");
        assert!(ValueTable::load_or_empty(&corrupt).is_empty(), "Falls back to empty");
    }
}
