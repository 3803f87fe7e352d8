use std::path::PathBuf;
use thiserror::Error;

/// A recoverable problem: the value it concerns was replaced by a default
/// and the run carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("invalid wait value {value:?}, using 0 seconds")]
    InvalidWait { value: String },

    #[error("could not split {command:?} into arguments, launching it as a single executable")]
    Tokenize { command: String },

    #[error("invalid colour {value:?} for '{key}', using the default")]
    InvalidColour { key: &'static str, value: String },

    #[error("invalid value {value:?} for '{key}', expected 0 or 1")]
    InvalidFlag { key: &'static str, value: String },

    #[error("animation {} does not exist, showing none", path.display())]
    MissingAnimation { path: PathBuf },

    #[error("could not load animation {}: {reason}", path.display())]
    AnimationLoad { path: PathBuf, reason: String },
}

/// A value together with whatever was defaulted while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Parsed<T> {
    pub fn clean(value: T) -> Self {
        Self { value, diagnostics: Vec::new() }
    }

    pub fn with(value: T, diagnostic: Diagnostic) -> Self {
        Self { value, diagnostics: vec![diagnostic] }
    }

    #[cfg(test)]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Moves the diagnostics into `sink` and hands back the value.
    pub fn collect_into(self, sink: &mut Vec<Diagnostic>) -> T {
        sink.extend(self.diagnostics);
        self.value
    }

    /// Logs every diagnostic as a warning and hands back the value.
    pub fn log(self, context: &str) -> T {
        for diagnostic in &self.diagnostics {
            log::warn!("{}: {}", context, diagnostic);
        }
        self.value
    }
}
