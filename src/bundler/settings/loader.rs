//! Loading `kodegen.json` on top of a base configuration.

use super::{BuildInclusion, Configuration, FinderRule, schema::configuration_schema};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    target::TargetDescriptor,
};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "kodegen.json";

/// Schema violations grouped by JSON path.
///
/// Paths whose ancestor already failed are dropped, so one broken object
/// reports once instead of once per child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    groups: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    /// Groups `(path, message)` pairs and removes child paths of failed parents.
    pub fn from_violations<I>(violations: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (path, message) in violations {
            let messages = groups.entry(path).or_default();
            if !messages.contains(&message) {
                messages.push(message);
            }
        }

        let failed: Vec<String> = groups.keys().cloned().collect();
        groups.retain(|path, _| {
            !failed
                .iter()
                .any(|parent| parent != path && is_ancestor(parent, path))
        });

        Self { groups }
    }

    /// Violations by JSON pointer (`""` is the document root).
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Returns true when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (path, messages)) in self.groups.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            let path = if path.is_empty() { "/" } else { path.as_str() };
            write!(f, "  {path} → {}", messages.join("; "))?;
        }
        Ok(())
    }
}

fn is_ancestor(parent: &str, child: &str) -> bool {
    parent.is_empty() || child.strip_prefix(parent).is_some_and(|rest| rest.starts_with('/'))
}

/// Loads a configuration file on top of `base`.
///
/// A relative `file` is looked up in the base root first, then in the
/// current directory. A missing or blank file returns `base` unchanged.
///
/// # Errors
///
/// - [`Error::ConfigParse`] when the file is not valid JSON
/// - [`Error::ConfigValidation`] when the file violates the schema
pub fn load(file: impl AsRef<Path>, base: Configuration) -> Result<Configuration> {
    let Some(path) = locate(file.as_ref(), &base) else {
        log::debug!("No configuration file at {}", file.as_ref().display());
        return Ok(base);
    };

    let contents = std::fs::read_to_string(&path).fs_context("reading configuration file", &path)?;
    if contents.trim().is_empty() {
        log::debug!("Configuration file {} is empty", path.display());
        return Ok(base);
    }

    let document: Value = serde_json::from_str(&contents).map_err(|source| Error::ConfigParse {
        path: path.clone(),
        source,
    })?;

    validate(&path, &document)?;

    let modified = std::fs::metadata(&path)
        .and_then(|metadata| metadata.modified())
        .fs_context("reading configuration file timestamp", &path)?;
    let timestamp = chrono::DateTime::<chrono::Utc>::from(modified).timestamp();

    log::info!("Loaded configuration from {}", path.display());
    Ok(apply(&document, base).with_timestamp(timestamp))
}

/// Finds the configuration file [`load`] would read, if any.
pub fn locate(file: &Path, base: &Configuration) -> Option<PathBuf> {
    if file.is_absolute() {
        return file.is_file().then(|| file.to_path_buf());
    }

    let mut candidates = vec![base.root().join(file)];
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(file));
    }
    candidates.into_iter().find(|candidate| candidate.is_file())
}

fn validate(path: &Path, document: &Value) -> Result<()> {
    let validator = jsonschema::validator_for(&configuration_schema())
        .map_err(|e| Error::GenericError(format!("invalid configuration schema: {e}")))?;

    let report = ValidationReport::from_violations(
        validator
            .iter_errors(document)
            .map(|error| (error.instance_path.to_string(), error.to_string())),
    );

    if report.is_empty() {
        Ok(())
    } else {
        Err(Error::ConfigValidation {
            path: path.to_path_buf(),
            report,
        })
    }
}

/// Applies every recognized key through the matching `with_*` call.
fn apply(document: &Value, base: Configuration) -> Configuration {
    let mut config = base;

    if let Some(root) = document.get("root").and_then(Value::as_str) {
        config = config.with_root(root);
    }
    if let Some(name) = document.get("name").and_then(Value::as_str) {
        config = config.with_name(name);
    }
    if let Some(entrypoint) = document.get("entrypoint").and_then(Value::as_str) {
        config = config.with_entrypoint(entrypoint);
    }
    if let Some(version) = document.get("box-version").and_then(Value::as_str) {
        config = config.with_box_version(version);
    }
    if let Some(output) = document.get("output").and_then(Value::as_str) {
        config = config.with_output(output);
    }
    if let Some(arch) = document.get("arch") {
        config = config.with_arch(strings(arch));
    }
    if let Some(platform) = document.get("platform") {
        config = config.with_platform(strings(platform));
    }
    if let Some(extensions) = document.get("extensions") {
        config = config.with_extensions(strings(extensions));
    }
    if let Some(libraries) = document.get("libraries").and_then(Value::as_str) {
        config = config.with_libraries_directory(libraries);
    }
    if let Some(interpreter) = document.get("interpreter").and_then(Value::as_str) {
        config = config.with_interpreter(interpreter);
    }

    if let Some(build) = document.get("build") {
        for file in build.get("files").map(strings).unwrap_or_default() {
            config = config.with_build(BuildInclusion::File(file.into()));
        }
        for directory in build.get("directories").map(strings).unwrap_or_default() {
            config = config.with_build(BuildInclusion::Directory(directory.into()));
        }
        for rule in build
            .get("finder")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            config = config.with_build(BuildInclusion::Finder(finder_rule(rule)));
        }
    }

    if let Some(ini) = document.get("ini").and_then(Value::as_object) {
        for (key, value) in ini {
            config = config.with_ini(key, ini_value(value));
        }
    }

    for target in document
        .get("targets")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(TargetDescriptor::from_value)
    {
        config = config.with_target(target);
    }

    config
}

fn finder_rule(rule: &Value) -> FinderRule {
    let list = |key: &str| rule.get(key).map(strings).unwrap_or_default();
    FinderRule::new(list("directory"))
        .excluding_directories(list("not-directory"))
        .with_names(list("name"))
        .excluding_names(list("not-name"))
}

/// Accepts a string or an array of strings.
fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn ini_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".into(),
        Value::Bool(false) => "0".into(),
        other => other.to_string(),
    }
}
