//! Platform-conditional defaults for the wrapper.
//!
//! Everything that differs between Windows and POSIX hosts goes through
//! [`Platform`] so callers can pick a variant explicitly in tests instead of
//! depending on the host they run on.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

/// Default location of the real `p4` binary on POSIX hosts.
pub const POSIX_EXECUTABLE: &str = "/usr/local/bin/p4";
/// Default location of the real `p4` binary on Windows hosts.
pub const WINDOWS_EXECUTABLE: &str = "C:\\Program Files\\Perforce\\p4.exe";
pub const POSIX_LOG_DIR: &str = "/tmp";
pub const WINDOWS_LOG_DIR: &str = "C:\\tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Windows => "windows",
        }
    }

    pub fn default_executable(&self) -> PathBuf {
        match self {
            Self::Posix => PathBuf::from(POSIX_EXECUTABLE),
            Self::Windows => PathBuf::from(WINDOWS_EXECUTABLE),
        }
    }

    pub fn default_log_dir(&self) -> PathBuf {
        match self {
            Self::Posix => PathBuf::from(POSIX_LOG_DIR),
            Self::Windows => PathBuf::from(WINDOWS_LOG_DIR),
        }
    }

    pub fn line_ending(&self) -> &'static str {
        match self {
            Self::Posix => "\n",
            Self::Windows => "\r\n",
        }
    }

    /// Rewrite every `\n` to the native line ending.
    ///
    /// The rewrite is unconditional: an existing `\r\n` becomes `\r\r\n` on
    /// Windows, matching what log readers on that platform have always seen.
    pub fn native_line_endings<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::Posix => Cow::Borrowed(text),
            Self::Windows => Cow::Owned(text.replace('\n', "\r\n")),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
