//! Progress steps emitted by build coroutines.

use std::fmt;

/// Reporting level chosen by the primitive that emitted a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// State transition a presenter should always show.
    Notify,
    /// Long-running work in flight.
    Progress,
    /// Supplementary detail.
    Info,
}

/// Unit of work a step belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    CreateDirectory,
    ClearDirectory,
    CopyFile,
    CopyFiles,
    Download,
    ApplyPermissions,
    AssembleTarget,
    WriteManifest,
    WriteLoaderStub,
    InvokeBundler,
    ResolveStub,
    Prepare,
    Pack,
    Compile,
    Target,
}

impl TaskKind {
    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::CreateDirectory => "create-directory",
            TaskKind::ClearDirectory => "clear-directory",
            TaskKind::CopyFile => "copy-file",
            TaskKind::CopyFiles => "copy-files",
            TaskKind::Download => "download",
            TaskKind::ApplyPermissions => "apply-permissions",
            TaskKind::AssembleTarget => "assemble-target",
            TaskKind::WriteManifest => "write-manifest",
            TaskKind::WriteLoaderStub => "write-loader-stub",
            TaskKind::InvokeBundler => "invoke-bundler",
            TaskKind::ResolveStub => "resolve-stub",
            TaskKind::Prepare => "prepare",
            TaskKind::Pack => "pack",
            TaskKind::Compile => "compile",
            TaskKind::Target => "target",
        }
    }
}

/// Position of a step in its task's `ready → running → completed` sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// About to start.
    Ready,
    /// Work in progress.
    Running,
    /// Finished successfully.
    Completed,
}

impl Phase {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Completed => "completed",
        }
    }
}

/// One observable moment in a task's progress.
///
/// Steps are immutable once emitted and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    level: Level,
    task: TaskKind,
    phase: Phase,
    label: String,
    args: Vec<(&'static str, String)>,
}

impl Step {
    /// Creates a step. The level is assigned by the emitting primitive.
    pub fn new(task: TaskKind, phase: Phase, label: impl Into<String>) -> Self {
        Self {
            level: Level::Notify,
            task,
            phase,
            label: label.into(),
            args: Vec::new(),
        }
    }

    /// Attaches a structured argument.
    pub fn arg(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.args.push((key, value.to_string()));
        self
    }

    pub(crate) fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn args(&self) -> &[(&'static str, String)] {
        &self.args
    }

    /// Looks up an argument by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when the step belongs to `task` and is in `phase`.
    pub fn is(&self, task: TaskKind, phase: Phase) -> bool {
        self.task == task && self.phase == phase
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {}",
            self.task.as_str(),
            self.phase.as_str(),
            self.label
        )
    }
}
