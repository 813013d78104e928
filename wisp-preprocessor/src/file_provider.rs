//! The file-reader contract (§4.5/§6): abstracts filesystem access so
//! `#import`/`#include` resolution can be exercised without touching disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use wisp_foundation::errors::FileError;
use wisp_foundation::Diagnostics;

pub trait FileProvider {
    fn is_file(&self, path: &str) -> bool;

    /// Reads `path` to a string, recording `cannot_open_file` on failure.
    fn read_file(&self, path: &str, diagnostics: &mut Diagnostics) -> Option<String>;
}

/// The real, `std::fs`-backed provider used by the CLI driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileProvider;

impl FileProvider for StdFileProvider {
    fn is_file(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn read_file(&self, path: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(_) => {
                diagnostics.insert(FileError::CannotOpenFile.to_string());
                None
            }
        }
    }
}

/// An in-memory provider for tests, keyed by the exact path strings a test
/// source passes to `#import`/`#include`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFileProvider {
    files: HashMap<String, String>,
}

impl InMemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileProvider for InMemoryFileProvider {
    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read_file(&self, path: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        match self.files.get(path) {
            Some(contents) => Some(contents.clone()),
            None => {
                diagnostics.insert(FileError::CannotOpenFile.to_string());
                None
            }
        }
    }
}
