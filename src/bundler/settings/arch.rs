//! CPU architecture and operating system types.

use std::fmt;

/// CPU architecture of a native target.
///
/// Only the canonical lowercase names are accepted when parsing. Which
/// architectures a platform actually supports is decided by [`Os::supports`].
///
/// # Examples
///
/// ```
/// use kodegen_bundler_compile::bundler::Arch;
///
/// assert_eq!(Arch::parse("arm64"), Some(Arch::Arm64));
/// assert_eq!(Arch::parse("riscv"), None);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// x86 (32-bit)
    X86,
    /// x86_64 / AMD64 (64-bit)
    Amd64,
    /// ARM (32-bit)
    Arm,
    /// AArch64 / ARM64 (64-bit)
    Arm64,
    /// RISC-V (64-bit)
    Riscv64,
}

impl Arch {
    /// Every architecture known to the compiler.
    pub const ALL: [Arch; 5] = [
        Arch::X86,
        Arch::Amd64,
        Arch::Arm,
        Arch::Arm64,
        Arch::Riscv64,
    ];

    /// Canonical name used in configuration files, stub names, and output paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::Amd64 => "amd64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Riscv64 => "riscv64",
        }
    }

    /// Parses a canonical architecture name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|arch| arch.as_str() == name)
    }

    /// Architecture of the machine running the compiler.
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "x86" => Arch::X86,
            "arm" => Arch::Arm,
            "aarch64" => Arch::Arm64,
            "riscv64" => Arch::Riscv64,
            _ => Arch::Amd64,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system family of a native target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Os {
    /// Microsoft Windows
    Windows,
    /// Linux distributions
    Linux,
    /// Apple macOS
    MacOs,
}

impl Os {
    /// Every operating system with native targets.
    pub const ALL: [Os; 3] = [Os::Windows, Os::Linux, Os::MacOs];

    /// Target type tag, also used as the first output path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
            Os::MacOs => "macos",
        }
    }

    /// Parses a target type tag.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|os| os.as_str() == name)
    }

    /// Operating system running the compiler.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Os::Windows,
            "macos" => Os::MacOs,
            _ => Os::Linux,
        }
    }

    /// Architectures a runtime stub is published for.
    pub fn supported_archs(self) -> &'static [Arch] {
        match self {
            Os::Windows => &[Arch::X86, Arch::Amd64, Arch::Arm64],
            Os::Linux => &[Arch::X86, Arch::Amd64, Arch::Arm, Arch::Arm64, Arch::Riscv64],
            Os::MacOs => &[Arch::Amd64, Arch::Arm64],
        }
    }

    /// Returns true when a stub exists for `arch` on this platform.
    pub fn supports(self, arch: Arch) -> bool {
        self.supported_archs().contains(&arch)
    }

    /// Suffix appended to produced executables.
    pub fn executable_suffix(self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            Os::Linux | Os::MacOs => "",
        }
    }

    /// File extension of native companion libraries.
    pub fn library_extension(self) -> &'static str {
        match self {
            Os::Windows => "dll",
            Os::Linux => "so",
            Os::MacOs => "dylib",
        }
    }

    /// Returns true for platforms with POSIX permission bits.
    pub fn is_posix(self) -> bool {
        !matches!(self, Os::Windows)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
