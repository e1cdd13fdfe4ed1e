use crate::error::ShellError;
use crate::parser::{RedirectionMode, RedirectionSpec};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// An opened redirection target, ready to become a child's standard output.
///
/// A target dropped without [`finish`](Self::finish) still restores any
/// staged content, so an aborted sub-command never loses what the file held.
#[derive(Debug)]
pub(crate) struct OpenedTarget {
    path: PathBuf,
    file: File,
    /// Previous content of the target, staged while the child writes.
    side: Option<File>,
}

impl OpenedTarget {
    /// Open the target according to its mode, before anything is spawned.
    ///
    /// `>` and `>+` on a missing target create it fresh. `>+` on an existing
    /// target copies its content into an anonymous side file and truncates
    /// it, so the child's output lands at the beginning.
    pub fn open(spec: &RedirectionSpec) -> Result<Self, ShellError> {
        let path = spec.target.clone();
        let io_err = |e: io::Error| ShellError::redirection_io(&spec.target, e);

        if spec.mode == RedirectionMode::OverwriteCreate || !path.exists() {
            let file = create_fresh(&path).map_err(io_err)?;
            log::debug!("redirecting into new file {}", path.display());
            return Ok(Self {
                path,
                file,
                side: None,
            });
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(io_err)?;
        let mut side = tempfile::tempfile().map_err(io_err)?;
        let staged = io::copy(&mut file, &mut side).map_err(io_err)?;
        // Truncation comes last: nothing is lost if an earlier step fails.
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        file.set_len(0).map_err(io_err)?;
        log::debug!(
            "staged {staged} bytes of {} in a side file",
            path.display()
        );

        Ok(Self {
            path,
            file,
            side: Some(side),
        })
    }

    /// A handle to the target for a child's standard output.
    pub fn stdio(&self) -> Result<Stdio, ShellError> {
        self.file
            .try_clone()
            .map(Stdio::from)
            .map_err(|e| ShellError::redirection_io(&self.path, e))
    }

    /// The target itself, for output the interpreter writes on the child's behalf.
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Finish the redirection once the child has been reaped.
    ///
    /// For a prepend onto existing content, the staged content is appended
    /// after what the child wrote. Otherwise there is nothing left to do.
    pub fn finish(mut self) -> Result<(), ShellError> {
        self.restore()
    }

    /// The side file is taken first, so content is appended at most once.
    fn restore(&mut self) -> Result<(), ShellError> {
        let Some(mut side) = self.side.take() else {
            return Ok(());
        };

        let io_err = |e: io::Error| ShellError::redirection_io(&self.path, e);
        let mut target = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        side.seek(SeekFrom::Start(0)).map_err(io_err)?;
        let restored = io::copy(&mut side, &mut target).map_err(io_err)?;
        log::debug!(
            "restored {restored} bytes after new output in {}",
            self.path.display()
        );
        Ok(())
    }
}

impl Drop for OpenedTarget {
    fn drop(&mut self) {
        if self.side.is_none() {
            return;
        }
        log::debug!("redirection to {} abandoned", self.path.display());
        if let Err(e) = self.restore() {
            log::error!("{e}");
        }
    }
}

/// Create `path`, failing if something already exists there.
fn create_fresh(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o700);
    }
    options.open(path)
}
