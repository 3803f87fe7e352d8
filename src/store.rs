//! Profile sections read from an INI file.
//!
//! Parsing is done by `rust-ini`. On top of it the store applies the
//! configparser conventions the file format relies on: keys are
//! case-insensitive, `[DEFAULT]` keys are inherited by every section, and
//! anything after a section header's closing bracket is ignored.

use ini::{Ini, ParseOption};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Section whose keys every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] ini::ParseError),
}

#[derive(Debug, Clone, Default)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Own keys in file order, then inherited ones.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        let key = key.trim().to_lowercase();
        let value = join_continuation(value);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    sections: Vec<Section>,
}

impl ConfigStore {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            enabled_indented_mutiline_value: true,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(&strip_header_trailers(text), options)?;

        let mut defaults = Section::default();
        let mut own: Vec<Section> = Vec::new();
        for (name, properties) in ini.iter() {
            // Keys above the first header have no section to belong to
            let Some(name) = name else {
                continue;
            };
            let target = if name == DEFAULT_SECTION {
                &mut defaults
            } else {
                match own.iter().position(|s| s.name == name) {
                    Some(i) => &mut own[i],
                    None => {
                        own.push(Section {
                            name: name.to_string(),
                            entries: Vec::new(),
                        });
                        let last = own.len() - 1;
                        &mut own[last]
                    }
                }
            };
            for (key, value) in properties.iter() {
                target.set(key, value);
            }
        }

        for section in &mut own {
            for (key, value) in &defaults.entries {
                if !section.entries.iter().any(|(k, _)| k == key) {
                    section.entries.push((key.clone(), value.clone()));
                }
            }
        }
        Ok(Self { sections: own })
    }

    /// Look up a profile section. `[DEFAULT]` is never returned itself.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }
}

/// Cut whatever follows the `]` of a section header, such as a comment.
fn strip_header_trailers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let header_end = line.starts_with('[').then(|| line.find(']')).flatten();
        match header_end {
            Some(end) => out.push_str(&line[..=end]),
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// One value line per continuation line, blank lines dropped.
fn join_continuation(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
