//! Durable favorites store.
//!
//! One ordered list of full country snapshots (so the favorites page renders
//! without another network fetch), unique by `cca3`, backed by a single JSON
//! file. The in-memory list is authoritative for the session; the file is
//! best-effort and rewritten in full after every successful mutation.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::models::Country;

pub struct FavoritesStore {
    path: PathBuf,
    entries: Vec<Country>,
}

impl FavoritesStore {
    /// Loads the store from disk. A missing or malformed file yields an
    /// empty store, never an error.
    pub fn load(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<Country>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!(
                        "Favorites file {} is malformed, starting empty: {e}",
                        path.display()
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self { path, entries }
    }

    /// Current favorites in insertion order.
    pub fn list(&self) -> &[Country] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.entries.iter().any(|c| c.cca3 == code)
    }

    /// Appends at the end. A country that is already favorited is left
    /// alone; add is idempotent per code.
    pub fn add(&mut self, country: Country) {
        if self.is_favorite(&country.cca3) {
            return;
        }
        self.entries.push(country);
        self.persist();
    }

    /// Removes every entry with the given code; no-op if absent.
    pub fn remove(&mut self, code: &str) {
        let before = self.entries.len();
        self.entries.retain(|c| c.cca3 != code);
        if self.entries.len() != before {
            self.persist();
        }
    }

    /// Removes if present, adds otherwise. Returns the new membership
    /// state. This is the only mutation the handlers call.
    pub fn toggle(&mut self, country: Country) -> bool {
        if self.is_favorite(&country.cca3) {
            self.remove(&country.cca3);
            false
        } else {
            self.add(country);
            true
        }
    }

    /// Rewrites the whole list to disk. Failures are logged and swallowed;
    /// the session keeps running on the in-memory state.
    fn persist(&self) {
        let json = match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize favorites: {e}");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create {}: {e}", parent.display());
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, json) {
            warn!("Failed to persist favorites to {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountryName, Flags};
    use tempfile::TempDir;

    fn country(code: &str, name: &str) -> Country {
        Country {
            cca3: code.to_string(),
            name: CountryName {
                common: name.to_string(),
                official: name.to_string(),
            },
            flags: Flags::default(),
            capital: vec!["Capital".to_string()],
            region: "Europe".to_string(),
            subregion: None,
            population: 1_000_000,
            languages: None,
            currencies: None,
            timezones: None,
        }
    }

    fn store_in(dir: &TempDir) -> FavoritesStore {
        FavoritesStore::load(dir.path().join("favorites.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{not json").unwrap();

        let store = FavoritesStore::load(path);
        assert!(store.is_empty());
    }

    #[test]
    fn add_and_remove_reflect_in_membership() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.add(country("FIN", "Finland"));
        store.add(country("BRA", "Brazil"));
        assert!(store.is_favorite("FIN"));
        assert!(store.is_favorite("BRA"));
        assert_eq!(store.len(), 2);

        store.remove("FIN");
        assert!(!store.is_favorite("FIN"));
        assert_eq!(store.len(), 1);

        // Removing something absent is a no-op.
        store.remove("FIN");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_is_idempotent_per_code() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.add(country("FIN", "Finland"));
        store.add(country("FIN", "Finland"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn toggle_removes_then_re_adds_at_the_end() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(store.toggle(country("FIN", "Finland")));
        assert!(store.toggle(country("BRA", "Brazil")));

        // Off: gone entirely.
        assert!(!store.toggle(country("FIN", "Finland")));
        assert!(!store.is_favorite("FIN"));

        // On again: back as the trailing entry.
        assert!(store.toggle(country("FIN", "Finland")));
        let codes: Vec<_> = store.list().iter().map(|c| c.cca3.as_str()).collect();
        assert_eq!(codes, ["BRA", "FIN"]);
    }

    #[test]
    fn mutations_persist_and_reload_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("favorites.json");

        let mut store = FavoritesStore::load(path.clone());
        store.add(country("FIN", "Finland"));
        store.add(country("BRA", "Brazil"));
        store.add(country("CAN", "Canada"));
        store.remove("BRA");
        drop(store);

        let reloaded = FavoritesStore::load(path);
        let codes: Vec<_> = reloaded.list().iter().map(|c| c.cca3.as_str()).collect();
        assert_eq!(codes, ["FIN", "CAN"]);
        assert_eq!(reloaded.list()[0].name.common, "Finland");
    }

    #[test]
    fn persist_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("favorites.json");

        let mut store = FavoritesStore::load(path.clone());
        store.add(country("FIN", "Finland"));
        assert!(path.exists());
    }
}
