use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use log::{debug, info};

use crate::constants::{ARCHIVER_PROGRAM, ARCHIVE_EXTENSION};
use crate::error::YarderError;

/// Path of the archive built from `output_file`.
///
/// The archive sits next to the output file and is named
/// `<file name>.tar.gz`.
///
/// # Example
///
/// ```
/// # use std::path::{Path, PathBuf};
/// # use yarder::utils::compress::archive_path_for;
/// let archive = archive_path_for(Path::new("/tmp/capture.log"))?;
/// assert_eq!(archive, PathBuf::from("/tmp/capture.log.tar.gz"));
/// # Ok::<(), yarder::error::YarderError>(())
/// ```
pub fn archive_path_for(output_file: &Path) -> Result<PathBuf, YarderError> {
    let (dir, name) = split_output_path(output_file)?;
    Ok(dir.join(archive_name(name)))
}

fn archive_name(file_name: &str) -> String {
    format!("{}.{}", file_name, ARCHIVE_EXTENSION)
}

/// Split `output_file` into its directory and file name.
///
/// The directory is empty for a bare file name.
fn split_output_path(output_file: &Path) -> Result<(&Path, &str), YarderError> {
    let name = output_file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| YarderError::Archive {
            path: output_file.to_path_buf(),
            reason: "output path has no usable file name".to_string(),
        })?;
    let dir = output_file.parent().unwrap_or_else(|| Path::new(""));
    Ok((dir, name))
}

/// Builds a gzip-compressed tar archive of a single file with an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archiver {
    program: String,
}

impl Default for Archiver {
    fn default() -> Self {
        Archiver {
            program: ARCHIVER_PROGRAM.to_string(),
        }
    }
}

impl Archiver {
    /// Use a different `tar`-compatible program
    pub fn with_program(program: impl Into<String>) -> Self {
        Archiver {
            program: program.into(),
        }
    }

    /// Compress `output_file` into `<file name>.tar.gz` in the same directory.
    ///
    /// Runs `tar -czf <name>.tar.gz <name>` from the file's directory so the
    /// archive holds a single entry without leading path components. One
    /// attempt only.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path to the created archive
    /// * `Err(YarderError::Archive)` - If the tool cannot be run or exits non-zero
    pub fn archive(&self, output_file: &Path) -> Result<PathBuf, YarderError> {
        let start = Instant::now();
        let (dir, name) = split_output_path(output_file)?;
        let archive_file = archive_name(name);
        let archive_path = dir.join(&archive_file);

        let working_dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };

        debug!(
            "Running {} -czf {} {} in {}",
            self.program,
            archive_file,
            name,
            working_dir.display()
        );

        let output = Command::new(&self.program)
            .arg("-czf")
            .arg(&archive_file)
            .arg(name)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| YarderError::Archive {
                path: output_file.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(YarderError::archive_exit(
                output_file.to_path_buf(),
                output.status,
                &output.stderr,
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{} output: {}", self.program, stdout.trim());
        }

        info!(
            "Compressed {} to {} in {:?}",
            output_file.display(),
            archive_path.display(),
            start.elapsed()
        );
        Ok(archive_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_temp_dir;
    use crate::utils::sniff::detect_content_type;
    use std::fs;

    #[test]
    fn test_archive_path_for_absolute() {
        let path = archive_path_for(Path::new("/var/tmp/capture.log")).unwrap();
        assert_eq!(path, PathBuf::from("/var/tmp/capture.log.tar.gz"));
    }

    #[test]
    fn test_archive_path_for_bare_name() {
        let path = archive_path_for(Path::new("capture.log")).unwrap();
        assert_eq!(path, PathBuf::from("capture.log.tar.gz"));
    }

    #[test]
    fn test_archive_path_for_relative_dir() {
        let path = archive_path_for(Path::new("out/nested/capture")).unwrap();
        assert_eq!(path, PathBuf::from("out/nested/capture.tar.gz"));
    }

    #[test]
    fn test_archive_path_requires_file_name() {
        assert!(matches!(
            archive_path_for(Path::new("/")),
            Err(YarderError::Archive { .. })
        ));
        assert!(matches!(
            archive_path_for(Path::new("")),
            Err(YarderError::Archive { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_creates_gzip_next_to_output() {
        let temp_dir = create_temp_dir().unwrap();
        let output_file = temp_dir.path().join("capture.log");
        fs::write(&output_file, b"line one\nline two\nline three\n").unwrap();

        let archive = Archiver::default().archive(&output_file).unwrap();

        assert_eq!(archive, temp_dir.path().join("capture.log.tar.gz"));
        assert!(archive.exists());
        let bytes = fs::read(&archive).unwrap();
        assert_eq!(detect_content_type(&bytes), "application/x-gzip");

        // The archive holds exactly the one file, without directory components
        let listing = Command::new("tar").arg("-tzf").arg(&archive).output().unwrap();
        assert!(listing.status.success());
        let entries = String::from_utf8_lossy(&listing.stdout);
        assert_eq!(entries.lines().collect::<Vec<_>>(), vec!["capture.log"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_fails_for_missing_output() {
        let temp_dir = create_temp_dir().unwrap();
        let output_file = temp_dir.path().join("never-written.log");

        let result = Archiver::default().archive(&output_file);
        match result {
            Err(YarderError::Archive { path, reason }) => {
                assert_eq!(path, output_file);
                assert!(reason.contains("exited"));
            }
            other => panic!("expected archive error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_fails_on_non_zero_exit() {
        let temp_dir = create_temp_dir().unwrap();
        let output_file = temp_dir.path().join("capture.log");
        fs::write(&output_file, b"data\n").unwrap();

        let result = Archiver::with_program("false").archive(&output_file);
        assert!(matches!(result, Err(YarderError::Archive { .. })));
        assert!(!temp_dir.path().join("capture.log.tar.gz").exists());
    }

    #[test]
    fn test_archive_fails_for_missing_program() {
        let temp_dir = create_temp_dir().unwrap();
        let output_file = temp_dir.path().join("capture.log");
        fs::write(&output_file, b"data\n").unwrap();

        let result = Archiver::with_program("yarder-no-such-archiver").archive(&output_file);
        match result {
            Err(YarderError::Archive { reason, .. }) => assert!(reason.contains("failed to run")),
            other => panic!("expected archive error, got {:?}", other),
        }
    }
}
