//! Core Configuration struct and implementations.

use super::{Arch, BuildInclusion, Os};
use crate::bundler::{
    error::{ErrorExt, Result},
    target::{ARCH_INDEPENDENT_KINDS, TargetDescriptor},
};
use path_absolutize::Absolutize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Default bundler tool (Box) release.
pub const DEFAULT_BOX_VERSION: &str = "4.6.6";

/// Default base URI runtime stubs are downloaded from.
pub const DEFAULT_STUB_BASE_URI: &str =
    "https://github.com/kodegen-ai/runtime-stubs/releases/latest/download";

const BOX_RELEASE_BASE_URI: &str = "https://github.com/box-project/box/releases/download";

/// Build configuration.
///
/// `Configuration` is an immutable value: every `with_*` method returns a
/// new instance and leaves the receiver untouched, so earlier references
/// stay valid snapshots.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_compile::bundler::Configuration;
///
/// # fn example() -> kodegen_bundler_compile::bundler::Result<()> {
/// let base = Configuration::new()?;
/// let first = base.with_name("x");
/// let second = first.with_name("y");
///
/// assert_eq!(first.name(), "x");
/// assert_eq!(second.name(), "y");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    name: String,
    entrypoint: String,
    box_version: String,
    /// Absolute output directory. `None` means `<root>/build`.
    output: Option<PathBuf>,
    /// Absolute project root.
    root: PathBuf,
    arch: Vec<String>,
    platform: Vec<String>,
    build: Vec<BuildInclusion>,
    ini: BTreeMap<String, String>,
    timestamp: i64,
    targets: Vec<TargetDescriptor>,
    extensions: Vec<String>,
    libraries: Option<PathBuf>,
    interpreter: Option<PathBuf>,
    cache_directory: PathBuf,
    stub_base_uri: String,
}

impl Configuration {
    /// Creates the built-in default configuration rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().fs_context("reading current directory", ".")?;
        Ok(Self::with_defaults(cwd))
    }

    /// Creates the built-in default configuration rooted at `root`.
    ///
    /// A relative `root` is resolved against the current directory.
    pub fn rooted_at(root: impl AsRef<Path>) -> Result<Self> {
        let root = root
            .as_ref()
            .absolutize()
            .fs_context("resolving project root", root.as_ref())?
            .into_owned();
        Ok(Self::with_defaults(root))
    }

    fn with_defaults(root: PathBuf) -> Self {
        let cache_directory = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("kodegen-compile");

        Self {
            name: "app".into(),
            entrypoint: "index.php".into(),
            box_version: DEFAULT_BOX_VERSION.into(),
            output: None,
            root,
            arch: Vec::new(),
            platform: Vec::new(),
            build: Vec::new(),
            ini: BTreeMap::new(),
            timestamp: chrono::Utc::now().timestamp(),
            targets: Vec::new(),
            extensions: Vec::new(),
            libraries: None,
            interpreter: None,
            cache_directory,
            stub_base_uri: DEFAULT_STUB_BASE_URI.into(),
        }
    }

    /// Application name, used for the archive and executable names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entrypoint script, relative to the project root.
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    /// Bundler tool version.
    pub fn box_version(&self) -> &str {
        &self.box_version
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute output directory.
    pub fn output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.root.join("build"))
    }

    /// Configured architecture names, as written.
    pub fn arch(&self) -> &[String] {
        &self.arch
    }

    /// Configured platform names, as written.
    pub fn platform(&self) -> &[String] {
        &self.platform
    }

    /// Build inclusion rules.
    pub fn build(&self) -> &[BuildInclusion] {
        &self.build
    }

    /// Interpreter settings embedded into native executables.
    pub fn ini(&self) -> &BTreeMap<String, String> {
        &self.ini
    }

    /// Build timestamp (seconds since the Unix epoch).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Explicit target descriptors from the `targets` key.
    pub fn targets(&self) -> &[TargetDescriptor] {
        &self.targets
    }

    /// Extensions the application requires beyond those implied by `ini`.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Directory holding native companion libraries.
    pub fn libraries_directory(&self) -> PathBuf {
        self.libraries
            .clone()
            .unwrap_or_else(|| self.root.join("libs"))
    }

    /// Host interpreter used to run the bundler tool, if pinned.
    pub fn interpreter(&self) -> Option<&Path> {
        self.interpreter.as_deref()
    }

    /// Download cache shared between builds.
    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    /// Base URI runtime stubs are downloaded from.
    pub fn stub_base_uri(&self) -> &str {
        &self.stub_base_uri
    }

    /// Returns a copy with a new application name. Empty names are ignored.
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            log::warn!("Ignoring empty application name");
            return self.clone();
        }
        Self {
            name,
            ..self.clone()
        }
    }

    /// Returns a copy with a new entrypoint. Empty entrypoints are ignored.
    #[must_use]
    pub fn with_entrypoint(&self, entrypoint: impl Into<String>) -> Self {
        let entrypoint = entrypoint.into();
        if entrypoint.trim().is_empty() {
            log::warn!("Ignoring empty entrypoint");
            return self.clone();
        }
        Self {
            entrypoint,
            ..self.clone()
        }
    }

    /// Returns a copy with a new bundler tool version.
    #[must_use]
    pub fn with_box_version(&self, version: impl Into<String>) -> Self {
        Self {
            box_version: version.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with a new project root.
    ///
    /// A relative root is resolved against the current root.
    #[must_use]
    pub fn with_root(&self, root: impl AsRef<Path>) -> Self {
        Self {
            root: self.resolve(root.as_ref()),
            ..self.clone()
        }
    }

    /// Returns a copy with a new output directory.
    ///
    /// A relative output is resolved against the project root.
    #[must_use]
    pub fn with_output(&self, output: impl AsRef<Path>) -> Self {
        Self {
            output: Some(self.resolve(output.as_ref())),
            ..self.clone()
        }
    }

    /// Returns a copy with additional architectures. Duplicates are skipped.
    #[must_use]
    pub fn with_arch<I, S>(&self, arch: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        extend_unique(&mut next.arch, arch);
        next
    }

    /// Returns a copy with additional platforms. Duplicates are skipped.
    #[must_use]
    pub fn with_platform<I, S>(&self, platform: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        extend_unique(&mut next.platform, platform);
        next
    }

    /// Returns a copy with an additional build inclusion rule.
    #[must_use]
    pub fn with_build(&self, inclusion: BuildInclusion) -> Self {
        let mut next = self.clone();
        next.build.push(inclusion);
        next
    }

    /// Returns a copy with an interpreter setting added or replaced.
    #[must_use]
    pub fn with_ini(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.ini.insert(key.into(), value.into());
        next
    }

    /// Returns a copy with a new build timestamp.
    #[must_use]
    pub fn with_timestamp(&self, timestamp: i64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// Returns a copy with an additional explicit target.
    #[must_use]
    pub fn with_target(&self, target: TargetDescriptor) -> Self {
        let mut next = self.clone();
        next.targets.push(target);
        next
    }

    /// Returns a copy with additional required extensions.
    #[must_use]
    pub fn with_extensions<I, S>(&self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        extend_unique(&mut next.extensions, extensions);
        next
    }

    /// Returns a copy with a new companion library directory.
    #[must_use]
    pub fn with_libraries_directory(&self, directory: impl AsRef<Path>) -> Self {
        Self {
            libraries: Some(self.resolve(directory.as_ref())),
            ..self.clone()
        }
    }

    /// Returns a copy with a pinned host interpreter.
    #[must_use]
    pub fn with_interpreter(&self, interpreter: impl AsRef<Path>) -> Self {
        Self {
            interpreter: Some(self.resolve(interpreter.as_ref())),
            ..self.clone()
        }
    }

    /// Returns a copy with a new download cache directory.
    #[must_use]
    pub fn with_cache_directory(&self, directory: impl AsRef<Path>) -> Self {
        Self {
            cache_directory: self.resolve(directory.as_ref()),
            ..self.clone()
        }
    }

    /// Returns a copy with a new stub download base URI.
    #[must_use]
    pub fn with_stub_base_uri(&self, uri: impl Into<String>) -> Self {
        Self {
            stub_base_uri: uri.into().trim_end_matches('/').to_string(),
            ..self.clone()
        }
    }

    /// Archive file name, `<name>.phar`.
    pub fn archive_filename(&self) -> String {
        format!("{}.phar", self.name)
    }

    /// Absolute archive path inside the output directory.
    pub fn archive_path(&self) -> PathBuf {
        self.output().join(self.archive_filename())
    }

    /// Scratch directory for generated build inputs.
    pub fn temp_directory(&self) -> PathBuf {
        self.output().join(".build")
    }

    /// Loader stub file name.
    pub fn loader_filename(&self) -> &'static str {
        "loader.php"
    }

    /// Absolute loader stub path.
    pub fn loader_path(&self) -> PathBuf {
        self.temp_directory().join(self.loader_filename())
    }

    /// Absolute bundler manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.temp_directory().join("box.json")
    }

    /// Cached bundler tool path, keyed by version.
    pub fn box_path(&self) -> PathBuf {
        self.cache_directory
            .join("tools")
            .join(format!("box-{}.phar", self.box_version))
    }

    /// Bundler tool download URI.
    pub fn box_uri(&self) -> String {
        format!("{BOX_RELEASE_BASE_URI}/{}/box.phar", self.box_version)
    }

    /// Directory searched for pre-fetched runtime stubs.
    pub fn local_stub_directory(&self) -> PathBuf {
        self.root.join("stubs")
    }

    /// Download cache for runtime stubs.
    pub fn stub_cache_directory(&self) -> PathBuf {
        self.cache_directory.join("stubs")
    }

    /// Expands the configuration into target descriptors.
    ///
    /// Explicit `targets` come first, followed by the `platform × arch`
    /// product. Platforms default to the host OS and architectures to the
    /// host architecture when neither `targets` nor `platform` is set.
    /// Arch-independent kinds are emitted once without an architecture.
    pub fn target_descriptors(&self) -> Vec<TargetDescriptor> {
        let mut descriptors = self.targets.clone();

        let platforms = if self.platform.is_empty() && self.targets.is_empty() {
            vec![Os::host().as_str().to_string()]
        } else {
            self.platform.clone()
        };
        let archs = if self.arch.is_empty() {
            vec![Arch::host().as_str().to_string()]
        } else {
            self.arch.clone()
        };

        for platform in platforms {
            if ARCH_INDEPENDENT_KINDS.contains(&platform.as_str()) {
                descriptors.push(TargetDescriptor::new(platform));
                continue;
            }
            for arch in &archs {
                descriptors.push(TargetDescriptor::new(platform.clone()).with_arch(arch.clone()));
            }
        }

        descriptors
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        path.absolutize_from(&self.root)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.root.join(path))
    }
}

fn extend_unique<I, S>(values: &mut Vec<String>, additions: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for value in additions {
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }
}
