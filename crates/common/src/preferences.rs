//! Preferences document loading.
//!
//! The document is optional. Any field that is missing or blank falls back to
//! the [`Platform`] default, so an empty `{}` behaves exactly like no file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::platform::Platform;

/// Effective settings for one wrapper run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Real executable the wrapper forwards to.
    pub executable_path: PathBuf,
    /// Directory holding the diagnostic log.
    pub log_directory: PathBuf,
    /// Number of output lines relayed to the caller; `None` relays everything.
    pub max_output_lines: Option<usize>,
    /// Prepend the verbosity flag pair to the forwarded arguments.
    pub verbose: bool,
    /// Prefix the first relayed line with a marker when output was cut.
    pub mark_truncation: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreferences {
    #[serde(default, alias = "p4Path")]
    executable_path: Option<String>,
    #[serde(default, alias = "logDir")]
    log_directory: Option<String>,
    #[serde(default, alias = "maxLines")]
    max_output_lines: Option<i64>,
    #[serde(default)]
    verbose: Option<bool>,
    #[serde(default)]
    mark_truncation: Option<bool>,
}

impl Preferences {
    pub fn defaults(platform: Platform) -> Self {
        Self {
            executable_path: platform.default_executable(),
            log_directory: platform.default_log_dir(),
            max_output_lines: None,
            verbose: false,
            mark_truncation: false,
        }
    }

    /// Parse a preferences document, filling gaps from the platform defaults.
    pub fn from_json(text: &str, platform: Platform) -> Result<Self> {
        let raw: RawPreferences =
            serde_json::from_str(text).context("Malformed preferences document")?;
        Ok(raw.resolve(platform))
    }

    pub fn load_from_path(path: &Path, platform: Platform) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
        Self::from_json(&text, platform)
            .with_context(|| format!("Invalid preferences file {}", path.display()))
    }

    /// Load preferences from the first document found in `sources`, or the
    /// platform defaults when there is none.
    pub fn load(sources: &PreferenceSources, platform: Platform) -> Result<Self> {
        match sources.locate()? {
            Some(path) => {
                log::debug!("loading preferences from {}", path.display());
                Self::load_from_path(&path, platform)
            }
            None => {
                log::debug!("no preferences file found, using {platform} defaults");
                Ok(Self::defaults(platform))
            }
        }
    }

    /// Full path of the diagnostic log.
    pub fn log_file(&self) -> PathBuf {
        paths::log_file(&self.log_directory)
    }
}

impl RawPreferences {
    fn resolve(self, platform: Platform) -> Preferences {
        let defaults = Preferences::defaults(platform);

        let executable_path = non_blank(self.executable_path)
            .map(PathBuf::from)
            .unwrap_or(defaults.executable_path);
        let log_directory = non_blank(self.log_directory)
            .map(PathBuf::from)
            .unwrap_or(defaults.log_directory);
        let max_output_lines = self
            .max_output_lines
            .filter(|limit| *limit > 0)
            .and_then(|limit| usize::try_from(limit).ok());

        Preferences {
            executable_path,
            log_directory,
            max_output_lines,
            verbose: self.verbose.unwrap_or(defaults.verbose),
            mark_truncation: self.mark_truncation.unwrap_or(defaults.mark_truncation),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Candidate locations for the preferences document, in priority order.
#[derive(Debug, Clone, Default)]
pub struct PreferenceSources {
    /// Explicit path; it is an error for this file to be missing.
    pub override_path: Option<PathBuf>,
    /// Directory the wrapper was invoked from.
    pub cwd: PathBuf,
    /// User-level document, used when the working directory has none.
    pub home_file: Option<PathBuf>,
}

impl PreferenceSources {
    pub fn from_env(cwd: &Path) -> Self {
        Self {
            override_path: paths::prefs_override(),
            cwd: cwd.to_path_buf(),
            home_file: paths::home_prefs_file().ok(),
        }
    }

    pub fn locate(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.override_path {
            if !path.is_file() {
                return Err(anyhow!(
                    "{} points to missing preferences file {}",
                    paths::PREFS_PATH_VAR,
                    path.display()
                ));
            }
            return Ok(Some(path.clone()));
        }

        let local = paths::cwd_prefs_file(&self.cwd);
        if local.is_file() {
            return Ok(Some(local));
        }

        Ok(self.home_file.clone().filter(|path| path.is_file()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_document_yields_defaults() {
        let prefs = Preferences::from_json("{}", Platform::Posix).unwrap();
        assert_eq!(prefs, Preferences::defaults(Platform::Posix));
        assert_eq!(prefs.executable_path, PathBuf::from("/usr/local/bin/p4"));
        assert_eq!(prefs.max_output_lines, None);
    }

    #[test]
    fn blank_fields_fall_back_per_platform() {
        let doc = r#"{"executablePath": "   ", "logDirectory": "", "verbose": true}"#;
        let prefs = Preferences::from_json(doc, Platform::Windows).unwrap();
        assert_eq!(
            prefs.executable_path,
            PathBuf::from("C:\\Program Files\\Perforce\\p4.exe")
        );
        assert_eq!(prefs.log_directory, PathBuf::from("C:\\tmp"));
        assert!(prefs.verbose);
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let doc = r#"{"p4Path": "/opt/p4/bin/p4", "logDir": "/var/tmp/p4", "maxLines": 40}"#;
        let prefs = Preferences::from_json(doc, Platform::Posix).unwrap();
        assert_eq!(prefs.executable_path, PathBuf::from("/opt/p4/bin/p4"));
        assert_eq!(prefs.log_directory, PathBuf::from("/var/tmp/p4"));
        assert_eq!(prefs.max_output_lines, Some(40));
        assert_eq!(prefs.log_file(), PathBuf::from("/var/tmp/p4/p4-debug.log"));
    }

    #[test]
    fn non_positive_line_limit_means_unlimited() {
        for limit in ["0", "-1", "-250"] {
            let doc = format!(r#"{{"maxOutputLines": {limit}}}"#);
            let prefs = Preferences::from_json(&doc, Platform::Posix).unwrap();
            assert_eq!(prefs.max_output_lines, None, "limit {limit}");
        }
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = Preferences::from_json("{\"verbose\": ", Platform::Posix).unwrap_err();
        assert!(err.to_string().contains("Malformed preferences"));

        let err = Preferences::from_json(r#"{"verbose": "yes"}"#, Platform::Posix).unwrap_err();
        assert!(err.to_string().contains("Malformed preferences"));
    }

    #[test]
    fn missing_files_load_defaults() {
        let temp = TempDir::new().unwrap();
        let sources = PreferenceSources {
            override_path: None,
            cwd: temp.path().to_path_buf(),
            home_file: Some(temp.path().join("nope.json")),
        };

        let prefs = Preferences::load(&sources, Platform::Posix).unwrap();
        assert_eq!(prefs, Preferences::defaults(Platform::Posix));
    }

    #[test]
    fn working_directory_file_beats_home_file() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home.json");
        fs::write(&home, r#"{"maxOutputLines": 3}"#).unwrap();
        fs::write(
            temp.path().join(paths::PREFS_FILE_NAME),
            r#"{"maxOutputLines": 7}"#,
        )
        .unwrap();

        let sources = PreferenceSources {
            override_path: None,
            cwd: temp.path().to_path_buf(),
            home_file: Some(home.clone()),
        };
        let prefs = Preferences::load(&sources, Platform::Posix).unwrap();
        assert_eq!(prefs.max_output_lines, Some(7));

        fs::remove_file(temp.path().join(paths::PREFS_FILE_NAME)).unwrap();
        let prefs = Preferences::load(&sources, Platform::Posix).unwrap();
        assert_eq!(prefs.max_output_lines, Some(3));
    }

    #[test]
    fn override_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let sources = PreferenceSources {
            override_path: Some(temp.path().join("missing.json")),
            cwd: temp.path().to_path_buf(),
            home_file: None,
        };

        let err = Preferences::load(&sources, Platform::Posix).unwrap_err();
        assert!(err.to_string().contains(paths::PREFS_PATH_VAR));
    }

    #[test]
    fn unreadable_document_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "not json").unwrap();

        let err = Preferences::load_from_path(&path, Platform::Posix).unwrap_err();
        assert!(format!("{err:?}").contains("broken.json"));
    }
}
