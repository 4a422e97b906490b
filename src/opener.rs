//! Handing files to the operating system's default application.

use std::fmt::Debug;
use std::path::Path;
use std::process::Command;
use strum_macros::Display;
use tracing::debug;

use crate::error::NetViewerError;

/// Capability to open a file with whatever application the desktop
/// associates with it.
pub trait OpenWithDefaultApplication: Send + Sync + Debug {
    fn open(&self, path: &Path) -> Result<(), NetViewerError>;
}

/// Desktop family the process runs on.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    #[strum(serialize = "windows")]
    Windows,
    #[strum(serialize = "macos")]
    MacOs,
    #[strum(serialize = "unix")]
    Unix,
}

impl Platform {
    pub fn current() -> Platform {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Unix
        }
    }

    /// Command line that opens `path` on this platform.
    pub fn command(&self, path: &Path) -> Command {
        match self {
            Platform::Windows => {
                let mut command = Command::new("cmd");
                command.arg("/C").arg("start").arg("").arg(path);
                command
            }
            Platform::MacOs => {
                let mut command = Command::new("open");
                command.arg(path);
                command
            }
            Platform::Unix => {
                let mut command = Command::new("xdg-open");
                command.arg(path);
                command
            }
        }
    }
}

/// Opens files through the platform's launcher, chosen once at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemOpener {
    platform: Platform,
}

impl SystemOpener {
    pub fn detect() -> Self {
        SystemOpener {
            platform: Platform::current(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl OpenWithDefaultApplication for SystemOpener {
    fn open(&self, path: &Path) -> Result<(), NetViewerError> {
        let mut command = self.platform.command(path);
        debug!(platform = %self.platform, ?command, "opening file");
        let status = command.status().map_err(|e| NetViewerError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(NetViewerError::OpenFailed {
                path: path.to_path_buf(),
                reason: format!("launcher exited with {}", status),
            })
        }
    }
}

/// Leaves files where they are. Used when opening is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOpener;

impl OpenWithDefaultApplication for NoopOpener {
    fn open(&self, path: &Path) -> Result<(), NetViewerError> {
        debug!(path = %path.display(), "opening disabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn parts(command: &Command) -> (String, Vec<String>) {
        (
            command.get_program().to_string_lossy().into_owned(),
            command
                .get_args()
                .map(OsStr::to_string_lossy)
                .map(|arg| arg.into_owned())
                .collect(),
        )
    }

    #[test]
    fn test_platform_commands() {
        let path = Path::new("/tmp/reminder.ics");

        assert_eq!(
            parts(&Platform::Unix.command(path)),
            ("xdg-open".to_string(), vec!["/tmp/reminder.ics".to_string()])
        );
        assert_eq!(
            parts(&Platform::MacOs.command(path)),
            ("open".to_string(), vec!["/tmp/reminder.ics".to_string()])
        );
        let (program, args) = parts(&Platform::Windows.command(path));
        assert_eq!(program, "cmd");
        assert_eq!(args[..3], ["/C", "start", ""]);
    }

    #[test]
    fn test_detect_matches_build_target() {
        let platform = SystemOpener::detect().platform();
        if cfg!(target_os = "linux") {
            assert_eq!(platform, Platform::Unix);
        }
        assert_eq!(Platform::MacOs.to_string(), "macos");
    }
}
