//! Native companion library discovery.
//!
//! Companion libraries live flat in the library directory and are named
//! `<library>-<os>-<arch>.<dll|so|dylib>`, for example
//! `libsass-linux-amd64.so`.

use crate::bundler::{
    error::{Error, Result},
    settings::{Arch, Os},
};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// File name pattern for one OS/arch pair.
pub fn library_pattern(os: Os, arch: Arch) -> String {
    format!("*-{}-{}.{}", os, arch, os.library_extension())
}

/// Libraries built for `os`/`arch`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn libraries_for(directory: &Path, os: Os, arch: Arch) -> Result<Vec<PathBuf>> {
    let pattern = compile(&library_pattern(os, arch))?;
    Ok(scan(directory, &[pattern]))
}

/// Every library for any supported OS/arch pair, sorted by path.
pub fn all_libraries(directory: &Path) -> Result<Vec<PathBuf>> {
    let patterns = Os::ALL
        .iter()
        .flat_map(|os| os.supported_archs().iter().map(move |arch| library_pattern(*os, *arch)))
        .map(|pattern| compile(&pattern))
        .collect::<Result<Vec<_>>>()?;
    Ok(scan(directory, &patterns))
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern)
        .map_err(|e| Error::GenericError(format!("invalid library pattern {pattern}: {e}")))
}

fn scan(directory: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    if !directory.is_dir() {
        log::debug!("No library directory at {}", directory.display());
        return Vec::new();
    }

    let mut found: Vec<PathBuf> = walkdir::WalkDir::new(directory)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            patterns.iter().any(|pattern| pattern.matches(&name))
        })
        .map(|e| e.into_path())
        .collect();

    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_os_and_arch() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "sass-linux-amd64.so",
            "sass-linux-arm64.so",
            "sass-windows-amd64.dll",
            "readme.txt",
        ] {
            std::fs::write(dir.path().join(name), b"lib").unwrap();
        }

        let linux = libraries_for(dir.path(), Os::Linux, Arch::Amd64).unwrap();
        assert_eq!(linux, vec![dir.path().join("sass-linux-amd64.so")]);

        let all = all_libraries(dir.path()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(libraries_for(&dir.path().join("libs"), Os::Linux, Arch::Amd64)
            .unwrap()
            .is_empty());
    }
}
