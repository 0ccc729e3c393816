//! Runtime editions and capability matching.

use crate::bundler::{
    error::{Error, Remediation, Result},
    settings::{Arch, Configuration, Os},
};
use std::{collections::BTreeSet, fmt};

const MINIMAL: &[&str] = &["ctype", "filter", "json", "phar", "tokenizer", "zlib"];

const STANDARD: &[&str] = &[
    "curl",
    "fileinfo",
    "iconv",
    "mbstring",
    "opcache",
    "openssl",
    "pdo",
    "pdo_sqlite",
    "session",
    "sockets",
    "sqlite3",
];

const FULL: &[&str] = &["ffi", "gd", "intl", "pdo_mysql", "pdo_pgsql", "sodium"];

/// Named extension set a prebuilt runtime stub ships with.
///
/// Editions are ordered from smallest to largest and each one contains
/// every extension of the editions before it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Edition {
    Minimal,
    Standard,
    Full,
}

impl Edition {
    /// Lowercase name, as used in stub file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Edition::Minimal => "minimal",
            Edition::Standard => "standard",
            Edition::Full => "full",
        }
    }

    /// Editions published for `os`, smallest first.
    pub fn available(os: Os) -> &'static [Edition] {
        match os {
            Os::Linux | Os::Windows => &[Edition::Minimal, Edition::Standard, Edition::Full],
            Os::MacOs => &[Edition::Minimal, Edition::Standard],
        }
    }

    /// Every extension compiled into this edition.
    pub fn extensions(self) -> impl Iterator<Item = &'static str> {
        let layers: &[&[&str]] = match self {
            Edition::Minimal => &[MINIMAL],
            Edition::Standard => &[MINIMAL, STANDARD],
            Edition::Full => &[MINIMAL, STANDARD, FULL],
        };
        layers.iter().flat_map(|layer| layer.iter().copied())
    }

    /// Returns true when the edition ships `extension`.
    pub fn provides(self, extension: &str) -> bool {
        self.extensions().any(|provided| provided == extension)
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true for extensions shipped by at least one edition.
pub fn is_known_extension(name: &str) -> bool {
    Edition::Full.provides(name)
}

/// Extensions the build needs at runtime.
///
/// The archive extension is always required. Configured `extensions` are
/// added as-is, and every `ini` key whose prefix (the text before the first
/// `.`) names a known extension adds that extension.
pub fn required_extensions(config: &Configuration) -> BTreeSet<String> {
    let mut required = BTreeSet::from(["phar".to_string()]);

    required.extend(
        config
            .extensions()
            .iter()
            .map(|extension| extension.trim().to_ascii_lowercase())
            .filter(|extension| !extension.is_empty()),
    );

    for key in config.ini().keys() {
        if let Some((prefix, _)) = key.split_once('.') {
            let prefix = prefix.to_ascii_lowercase();
            if is_known_extension(&prefix) {
                required.insert(prefix);
            }
        }
    }

    required
}

/// Picks the smallest edition for `os` that ships every required extension.
///
/// # Errors
///
/// [`Error::MissingCapabilities`] naming the extensions even the largest
/// edition lacks. On macOS the error carries the steps for building a
/// custom stub.
pub fn select_edition(os: Os, arch: Arch, required: &BTreeSet<String>) -> Result<Edition> {
    let editions = Edition::available(os);

    if let Some(edition) = editions
        .iter()
        .copied()
        .find(|edition| required.iter().all(|extension| edition.provides(extension)))
    {
        log::debug!("Selected {} edition for {}/{}", edition, os, arch);
        return Ok(edition);
    }

    let largest = editions.last().copied().unwrap_or(Edition::Minimal);
    let missing: Vec<String> = required
        .iter()
        .filter(|extension| !largest.provides(extension))
        .cloned()
        .collect();

    Err(Error::MissingCapabilities {
        platform: os.to_string(),
        arch: arch.to_string(),
        remediation: remediation(os, arch, required),
        missing,
    })
}

fn remediation(os: Os, arch: Arch, required: &BTreeSet<String>) -> Option<Remediation> {
    if os != Os::MacOs {
        return None;
    }

    let extensions = required.iter().cloned().collect::<Vec<_>>().join(",");
    Some(Remediation {
        summary: format!("Build a custom {os}/{arch} runtime stub with the required extensions"),
        steps: vec![
            format!(
                "Run the runtime-stubs CI workflow with os={os}, arch={arch}, extensions={extensions}"
            ),
            format!("Download the {os}-{arch}.custom.stub artifact from the finished workflow run"),
            format!(
                "Add {{\"type\": \"{os}\", \"arch\": \"{arch}\", \"stub\": \"<path to {os}-{arch}.custom.stub>\"}} to \"targets\""
            ),
        ],
    })
}
