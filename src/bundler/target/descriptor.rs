//! Declarative target descriptions, before factory resolution.

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Declarative description of one build target.
///
/// Descriptors come from the `targets` configuration key or from the
/// `platform × arch` expansion. The full configuration object is kept in
/// [`TargetDescriptor::config`] and handed to user-defined factories
/// unmodified.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetDescriptor {
    /// Target type tag (`linux`, `archive`, or a registered user type).
    pub kind: String,
    /// Requested architecture, if any.
    pub arch: Option<String>,
    /// Output subpath override, relative to the output directory.
    pub output: Option<PathBuf>,
    /// Custom runtime stub, bypassing edition selection.
    pub stub: Option<PathBuf>,
    /// Raw configuration object.
    pub config: Value,
}

impl TargetDescriptor {
    /// Creates a descriptor for the given target type.
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let mut config = Map::new();
        config.insert("type".into(), Value::String(kind.clone()));
        Self {
            kind,
            arch: None,
            output: None,
            stub: None,
            config: Value::Object(config),
        }
    }

    /// Sets the architecture.
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        let arch = arch.into();
        self.set("arch", Value::String(arch.clone()));
        self.arch = Some(arch);
        self
    }

    /// Sets the output subpath.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        self.set("output", Value::String(output.to_string_lossy().into_owned()));
        self.output = Some(output);
        self
    }

    /// Sets a custom runtime stub.
    pub fn with_stub(mut self, stub: impl Into<PathBuf>) -> Self {
        let stub = stub.into();
        self.set("stub", Value::String(stub.to_string_lossy().into_owned()));
        self.stub = Some(stub);
        self
    }

    /// Builds a descriptor from a schema-validated `targets[]` entry.
    ///
    /// Returns `None` when the object has no string `type`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let kind = value.get("type")?.as_str()?.to_string();
        let string = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            kind,
            arch: string("arch"),
            output: string("output").map(PathBuf::from),
            stub: string("stub").map(PathBuf::from),
            config: value.clone(),
        })
    }

    fn set(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.config {
            map.insert(key.into(), value);
        }
    }
}
