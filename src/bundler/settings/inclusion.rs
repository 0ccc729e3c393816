//! Selectors describing which application sources go into the archive.

use serde::Serialize;
use std::path::PathBuf;

/// One rule of the `build` configuration section.
///
/// Relative paths are kept as written; the bundler tool resolves them
/// against the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildInclusion {
    /// A single file.
    File(PathBuf),
    /// A directory, included recursively.
    Directory(PathBuf),
    /// A rule-based finder.
    Finder(FinderRule),
}

/// Rule-based file selection, mirroring the bundler tool's finder syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FinderRule {
    /// Directories to search.
    #[serde(rename = "in")]
    pub directories: Vec<PathBuf>,
    /// Directories excluded from the search.
    #[serde(rename = "exclude", skip_serializing_if = "Vec::is_empty")]
    pub excluded_directories: Vec<PathBuf>,
    /// File name patterns to include.
    #[serde(rename = "name", skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// File name patterns to exclude.
    #[serde(rename = "notName", skip_serializing_if = "Vec::is_empty")]
    pub excluded_names: Vec<String>,
}

impl FinderRule {
    /// Creates a finder searching the given directories.
    pub fn new<I, P>(directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            directories: directories.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Excludes the given directories.
    pub fn excluding_directories<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.excluded_directories = directories.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts matches to the given name patterns.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Excludes the given name patterns.
    pub fn excluding_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_names = names.into_iter().map(Into::into).collect();
        self
    }
}
