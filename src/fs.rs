//! Whole-file reads into arena memory.

use core::fmt;
use core::ptr::NonNull;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::allocator::provider::MemoryProvider;
use crate::arena::{Arena, ArenaError};

/// Errors from arena-backed file operations.
#[derive(Debug)]
pub enum FileError {
    /// An I/O operation on `path` failed.
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The arena could not supply a buffer.
    Arena(ArenaError),
    /// Fewer bytes were read or written than expected.
    Truncated {
        /// File being accessed.
        path: PathBuf,
        /// Expected byte count.
        expected: u64,
        /// Actual byte count.
        actual: u64,
    },
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Arena(err) => write!(f, "arena buffer unavailable: {err}"),
            Self::Truncated {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{}: expected {expected} bytes, got {actual}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Arena(err) => Some(err),
            Self::Truncated { .. } => None,
        }
    }
}

impl From<ArenaError> for FileError {
    fn from(err: ArenaError) -> Self {
        Self::Arena(err)
    }
}

/// Reads all of `path` into a buffer pushed on `arena`.
///
/// The returned slice covers the file contents and is followed by one NUL
/// byte inside the same allocation. It is valid until the arena is popped
/// past it, cleared or destroyed.
///
/// # Errors
/// Returns [`FileError::Io`] if the file cannot be opened or read,
/// [`FileError::Truncated`] if it shrinks while being read, and
/// [`FileError::Arena`] if the buffer cannot be allocated.
pub fn read_entire_file<P: MemoryProvider>(
    arena: &mut Arena<P>,
    path: impl AsRef<Path>,
) -> Result<NonNull<[u8]>, FileError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|err| FileError::io(path, err))?;
    let len = file.metadata().map_err(|err| FileError::io(path, err))?.len();
    let size = usize::try_from(len).map_err(|_| ArenaError::CapacityOverflow)?;

    let mark = arena.total_used_size();
    let buffer = arena.push(size.checked_add(1).ok_or(ArenaError::CapacityOverflow)?, 1)?;
    // SAFETY: the arena just handed out `size + 1` writable bytes.
    let bytes = unsafe { core::slice::from_raw_parts_mut(buffer.as_ptr(), size + 1) };
    let (contents, terminator) = bytes.split_at_mut(size);

    if let Err(err) = fill(&mut file, contents, path) {
        arena.pop(mark);
        return Err(err);
    }
    terminator[0] = 0;

    debug!(path = %path.display(), bytes = size, "read file into arena");
    Ok(NonNull::slice_from_raw_parts(buffer, size))
}

fn fill(file: &mut File, buf: &mut [u8], path: &Path) -> Result<(), FileError> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(FileError::Truncated {
                    path: path.to_path_buf(),
                    expected: buf.len() as u64,
                    actual: filled as u64,
                })
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(FileError::io(path, err)),
        }
    }
    Ok(())
}

/// Copies `src` to `dst` through a temporary arena buffer.
///
/// The arena's watermark is the same after the call as before it. Returns the
/// number of bytes copied.
///
/// # Errors
/// As [`read_entire_file`], plus [`FileError::Io`] for the destination and
/// [`FileError::Truncated`] if the destination length does not match.
pub fn copy_file<P: MemoryProvider>(
    arena: &mut Arena<P>,
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
) -> Result<u64, FileError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    let mut scratch = arena.scope();

    let contents = read_entire_file(&mut *scratch, src)?;
    // SAFETY: the buffer lives until `scratch` is dropped at the end of this call.
    let contents = unsafe { contents.as_ref() };

    let mut out = File::create(dst).map_err(|err| FileError::io(dst, err))?;
    out.write_all(contents).map_err(|err| FileError::io(dst, err))?;
    out.flush().map_err(|err| FileError::io(dst, err))?;
    drop(out);

    let expected = contents.len() as u64;
    let actual = std::fs::metadata(dst)
        .map_err(|err| FileError::io(dst, err))?
        .len();
    if actual != expected {
        warn!(src = %src.display(), dst = %dst.display(), expected, actual, "copy size mismatch");
        return Err(FileError::Truncated {
            path: dst.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(actual)
}
