//! Rotation-tolerant forward reader for an append-only log file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Identifies which physical file is open.
///
/// Stable across rename-in-place and appends, different after a
/// delete+recreate. On Unix this is the (device, inode) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity(u64, u64);

impl FileIdentity {
    fn from_metadata(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Self(meta.dev(), meta.ino())
        }

        #[cfg(not(unix))]
        {
            let created = meta
                .created()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            Self(created, 0)
        }
    }
}

/// Owns the open log handle, the read cursor, and the partial-line buffer.
///
/// Historical content is never replayed: every (re)open seeks to the end of
/// the file, and a fragment buffered before a rotation is discarded because
/// it belongs to the replaced file.
pub struct TailReader {
    path: PathBuf,
    file: Option<File>,
    identity: Option<FileIdentity>,
    partial: Vec<u8>,
}

impl TailReader {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            identity: None,
            partial: Vec::new(),
        }
    }

    /// Opens the log file, records its identity, and seeks to its end.
    pub fn open(&mut self) -> std::io::Result<()> {
        let mut file = File::open(&self.path)?;
        let identity = FileIdentity::from_metadata(&file.metadata()?);
        file.seek(SeekFrom::End(0))?;

        self.file = Some(file);
        self.identity = Some(identity);
        self.partial.clear();
        Ok(())
    }

    /// Returns the identity of the file at `path` without opening it.
    pub fn identity_of(path: &Path) -> std::io::Result<FileIdentity> {
        Ok(FileIdentity::from_metadata(&std::fs::metadata(path)?))
    }

    /// Returns the identity of the currently open file, if any.
    pub fn identity(&self) -> Option<FileIdentity> {
        self.identity
    }

    /// Reopens only when the on-disk file is a different physical file than
    /// the held handle (rotation, truncate-and-replace, recreation).
    ///
    /// A plain append leaves the identity unchanged and must not reopen,
    /// otherwise buffered bytes would be skipped. A missing path is a no-op;
    /// the create event for the replacement file lands here later.
    ///
    /// Returns `true` if a reopen happened.
    pub fn reopen_if_changed(&mut self) -> std::io::Result<bool> {
        let on_disk = match Self::identity_of(&self.path) {
            Ok(id) => id,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if self.identity == Some(on_disk) {
            return Ok(false);
        }

        self.open()?;
        tracing::info!(file = %self.path.display(), "log file reopened");
        Ok(true)
    }

    /// Reads everything appended since the last call and returns the complete
    /// lines, in file order.
    ///
    /// An unterminated trailing fragment is retained and prefixed onto the
    /// next read. Returns an empty vec when no file is open.
    pub fn poll(&mut self) -> std::io::Result<Vec<String>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(Vec::new());
        };

        let mut chunk = [0u8; 8192];
        loop {
            let n = file.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            self.partial.extend_from_slice(&chunk[..n]);
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.partial.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(lines)
    }

    /// Closes the handle and drops any buffered fragment.
    pub fn close(&mut self) {
        self.file = None;
        self.identity = None;
        self.partial.clear();
    }
}
