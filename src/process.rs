use crate::sequencer::Spawner;
use nix::unistd::setsid;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Starts programs in their own session so they outlive the launcher.
///
/// Children are never waited on; once the launcher exits they are adopted
/// by init.
#[derive(Debug, Default)]
pub struct DetachedSpawner;

impl DetachedSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl Spawner for DetachedSpawner {
    fn spawn(&mut self, executable: &str, arguments: &[String]) -> io::Result<u32> {
        if executable.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        }

        let mut cmd = Command::new(executable);
        cmd.args(arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        unsafe {
            cmd.pre_exec(|| {
                // Leave our session so terminal hangups and our exit don't reach the child
                setsid().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                Ok(())
            });
        }

        let child = cmd.spawn()?;
        Ok(child.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_existing_program() {
        let pid = DetachedSpawner::new().spawn("true", &[]).unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn test_spawn_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("echo launched > '{}'", marker.display());

        DetachedSpawner::new()
            .spawn("sh", &["-c".to_string(), script])
            .unwrap();

        for _ in 0..100 {
            if marker.exists() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(marker.exists());
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let err = DetachedSpawner::new()
            .spawn("/nonexistent/definitely-not-here", &[])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_spawn_empty_command_fails() {
        let err = DetachedSpawner::new().spawn("", &[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
