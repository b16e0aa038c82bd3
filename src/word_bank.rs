//! Word lists and the bank that maps list names to them.
//!
//! Built-in lists are embedded at compile time; user lists (including the
//! mined `frequent` list) live as JSON files in the data directory and are
//! loaded with one thread per file. A single failed file fails the whole
//! load and partial results are discarded.

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

static WORDS_DIR: Dir = include_dir!("src/words");

#[derive(Debug, Error)]
pub enum WordBankError {
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse word list {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("embedded word list {0} is malformed")]
    Embedded(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordList {
    pub name: String,
    #[serde(default)]
    pub no_lazy_mode: bool,
    #[serde(default)]
    pub ordered_by_frequency: bool,
    pub words: Vec<String>,
}

impl WordList {
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.name));
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(&path, data)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WordBank {
    lists: HashMap<String, WordList>,
}

impl WordBank {
    /// Bank holding only the lists embedded in the binary.
    pub fn embedded() -> Result<Self, WordBankError> {
        let mut lists = HashMap::new();
        for file in WORDS_DIR.files() {
            let text = file
                .contents_utf8()
                .ok_or_else(|| WordBankError::Embedded(file.path().display().to_string()))?;
            let list: WordList = serde_json::from_str(text)
                .map_err(|_| WordBankError::Embedded(file.path().display().to_string()))?;
            lists.insert(list.name.clone(), list);
        }
        Ok(Self { lists })
    }

    /// Embedded lists plus whatever JSON lists exist under `dir`. Disk
    /// lists shadow embedded ones of the same name.
    pub fn load(dir: &Path) -> Result<Self, WordBankError> {
        let mut bank = Self::embedded()?;
        if dir.is_dir() {
            for list in load_lists_dir(dir)? {
                bank.merge(list);
            }
        }
        Ok(bank)
    }

    pub fn get(&self, name: &str) -> Option<&WordList> {
        self.lists.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    /// Inserts or replaces a list. Only the event-loop thread mutates the
    /// bank; generators read a snapshot taken at session start.
    pub fn merge(&mut self, list: WordList) {
        self.lists.insert(list.name.clone(), list);
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lists.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

fn read_list_file(path: &Path) -> Result<WordList, WordBankError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| WordBankError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every `.json` file in `dir`, one thread per file. The first error
/// wins and the partial results are dropped.
fn load_lists_dir(dir: &Path) -> Result<Vec<WordList>, WordBankError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }

    let (tx, rx) = mpsc::channel();

    thread::scope(|s| {
        for path in &paths {
            let tx = tx.clone();
            s.spawn(move || {
                let _ = tx.send(read_list_file(path));
            });
        }
    });
    drop(tx);

    let mut lists = Vec::with_capacity(paths.len());
    for result in rx {
        lists.push(result?);
    }
    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn write_list(dir: &Path, name: &str, words: &[&str]) {
        let list = WordList {
            name: name.to_string(),
            no_lazy_mode: false,
            ordered_by_frequency: false,
            words: words.iter().map(|w| w.to_string()).collect(),
        };
        list.save_to(dir).unwrap();
    }

    #[test]
    fn embedded_bank_has_english() {
        let bank = WordBank::embedded().unwrap();
        let english = bank.get("english").unwrap();
        assert!(!english.words.is_empty());
    }

    #[test]
    fn load_merges_disk_lists_over_embedded() {
        let dir = tempdir().unwrap();
        write_list(dir.path(), "wuxia", &["sword", "mountain", "river"]);
        let bank = WordBank::load(dir.path()).unwrap();
        assert!(bank.contains("english"));
        assert_eq!(bank.get("wuxia").unwrap().words.len(), 3);
    }

    #[test]
    fn load_of_missing_dir_is_embedded_only() {
        let dir = tempdir().unwrap();
        let bank = WordBank::load(&dir.path().join("absent")).unwrap();
        assert!(bank.contains("english"));
    }

    #[test]
    fn one_bad_file_fails_the_whole_load() {
        let dir = tempdir().unwrap();
        write_list(dir.path(), "good", &["a", "b"]);
        fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        let result = WordBank::load(dir.path());
        assert_matches!(result, Err(WordBankError::Parse { .. }));
    }

    #[test]
    fn concurrent_load_collects_every_file() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            write_list(dir.path(), &format!("list{i}"), &["x", "y"]);
        }
        let lists = load_lists_dir(dir.path()).unwrap();
        assert_eq!(lists.len(), 8);
    }

    #[test]
    fn merge_replaces_same_name() {
        let mut bank = WordBank::default();
        bank.merge(WordList {
            name: "frequent".into(),
            no_lazy_mode: false,
            ordered_by_frequency: true,
            words: vec!["old".into()],
        });
        bank.merge(WordList {
            name: "frequent".into(),
            no_lazy_mode: false,
            ordered_by_frequency: true,
            words: vec!["new".into()],
        });
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.get("frequent").unwrap().words, vec!["new".to_string()]);
    }

    #[test]
    fn save_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let list = WordList {
            name: "frequent".into(),
            no_lazy_mode: false,
            ordered_by_frequency: true,
            words: vec!["dog".into(), "cat".into()],
        };
        let path = list.save_to(dir.path()).unwrap();
        let loaded = read_list_file(&path).unwrap();
        assert_eq!(loaded, list);
    }

    #[test]
    fn names_are_sorted() {
        let dir = tempdir().unwrap();
        write_list(dir.path(), "zzz", &["a"]);
        write_list(dir.path(), "aaa", &["a"]);
        let bank = WordBank::load(dir.path()).unwrap();
        let names = bank.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
