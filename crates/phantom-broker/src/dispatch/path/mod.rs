//! Path introspection and manipulation.
//!
//! [`PathOp`] is the complete allowlist for `kind: "path"` requests. Each
//! variant maps to one handler function through a fixed table; an op string
//! that does not parse into the enum never reaches the filesystem.
//!
//! The empty path names the current directory. Operations that touch the
//! filesystem see it as `.`; lexical operations see it verbatim.

mod content;
mod directory;
mod metadata;
mod mutation;
mod pure;

use std::path::{Path, PathBuf};

use camino::Utf8Path;
use phantom_broker_protocol::Request;
use strum::{Display, EnumString};

use crate::error::BrokerError;
use crate::normalise::Outcome;

type Handler = fn(&Request) -> Result<Outcome, BrokerError>;

/// Operations accepted for `kind: "path"` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PathOp {
    /// Whether the path exists, following symlinks.
    Exists,
    /// Whether the path is a regular file.
    IsFile,
    /// Whether the path is a directory.
    IsDir,
    /// Whether the path itself is a symlink.
    IsSymlink,
    /// Whether the path is absolute.
    IsAbsolute,
    /// Metadata, following symlinks.
    Stat,
    /// Metadata of the path itself.
    Lstat,
    /// Final component.
    Name,
    /// Final component's extension, including the dot.
    Suffix,
    /// Final component without its suffix.
    Stem,
    /// Logical parent.
    Parent,
    /// Components as a list.
    Parts,
    /// Joins further components.
    Joinpath,
    /// Replaces the final component.
    WithName,
    /// Replaces the final component's suffix.
    WithSuffix,
    /// Creates a directory.
    Mkdir,
    /// Lists directory entries.
    Iterdir,
    /// Matches a relative pattern below the path.
    Glob,
    /// Matches a relative pattern at any depth below the path.
    Rglob,
    /// Reads the file as UTF-8 text.
    ReadText,
    /// Reads the file as raw bytes.
    ReadBytes,
    /// Writes UTF-8 text, truncating.
    WriteText,
    /// Writes base64-supplied bytes, truncating.
    WriteBytes,
    /// Renames the path.
    Rename,
    /// Renames the path, overwriting the target.
    Replace,
    /// Removes a file or symlink.
    Unlink,
    /// Removes an empty directory.
    Rmdir,
    /// Creates the file or refreshes its timestamps.
    Touch,
    /// Reads a symlink's target.
    Readlink,
    /// Makes the path a symlink to a target.
    SymlinkTo,
    /// Canonical absolute form.
    Resolve,
    /// Absolute form without resolving symlinks.
    Absolute,
}

impl PathOp {
    /// Whether the operation only inspects the path string.
    const fn is_lexical(self) -> bool {
        matches!(
            self,
            Self::IsAbsolute
                | Self::Name
                | Self::Suffix
                | Self::Stem
                | Self::Parent
                | Self::Parts
                | Self::Joinpath
                | Self::WithName
                | Self::WithSuffix
        )
    }

    const fn handler(self) -> Handler {
        match self {
            Self::Exists => metadata::exists,
            Self::IsFile => metadata::is_file,
            Self::IsDir => metadata::is_dir,
            Self::IsSymlink => metadata::is_symlink,
            Self::Stat => metadata::stat,
            Self::Lstat => metadata::lstat,
            Self::IsAbsolute => pure::is_absolute,
            Self::Name => pure::name,
            Self::Suffix => pure::suffix,
            Self::Stem => pure::stem,
            Self::Parent => pure::parent,
            Self::Parts => pure::parts,
            Self::Joinpath => pure::joinpath,
            Self::WithName => pure::with_name,
            Self::WithSuffix => pure::with_suffix,
            Self::Mkdir => directory::mkdir,
            Self::Iterdir => directory::iterdir,
            Self::Glob => directory::glob,
            Self::Rglob => directory::rglob,
            Self::ReadText => content::read_text,
            Self::ReadBytes => content::read_bytes,
            Self::WriteText => content::write_text,
            Self::WriteBytes => content::write_bytes,
            Self::Rename => mutation::rename,
            Self::Replace => mutation::replace,
            Self::Unlink => mutation::unlink,
            Self::Rmdir => mutation::rmdir,
            Self::Touch => mutation::touch,
            Self::Readlink => mutation::readlink,
            Self::SymlinkTo => mutation::symlink_to,
            Self::Resolve => mutation::resolve,
            Self::Absolute => mutation::absolute,
        }
    }
}

pub(super) fn handle(request: &Request) -> Result<Outcome, BrokerError> {
    let op: PathOp = request
        .op()
        .parse()
        .map_err(|_| BrokerError::unknown_operation(request.op()))?;
    if request.path().as_str().is_empty() && !op.is_lexical() {
        return (op.handler())(&request.clone().with_path(CURRENT_DIR));
    }
    (op.handler())(request)
}

const CURRENT_DIR: &str = ".";

/// Joins `name` onto `base` without a leading `./` for the current directory.
fn child_of(base: &Path, name: impl AsRef<Path>) -> PathBuf {
    if base.as_os_str().is_empty() || base == Path::new(".") {
        name.as_ref().to_path_buf()
    } else {
        base.join(name)
    }
}

/// Returns the absolute form of `path`; `.` is the working directory itself.
fn absolute_of(path: &Utf8Path) -> std::io::Result<PathBuf> {
    if path.as_str().is_empty() || path.as_str() == CURRENT_DIR {
        std::env::current_dir()
    } else {
        std::path::absolute(path)
    }
}
