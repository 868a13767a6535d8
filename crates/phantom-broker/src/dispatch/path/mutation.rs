//! Renames, removals, links, timestamps, and resolution.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use camino::Utf8Path;
use phantom_broker_protocol::Request;

use super::absolute_of;
use crate::dispatch::arguments::Bound;
use crate::error::BrokerError;
use crate::normalise::Outcome;

const DEFAULT_FILE_MODE: u32 = 0o666;

/// Renames within one filesystem; the target string is returned.
pub(super) fn rename(request: &Request) -> Result<Outcome, BrokerError> {
    move_to(request)
}

/// Same as [`rename`]; an existing target is overwritten on every host.
pub(super) fn replace(request: &Request) -> Result<Outcome, BrokerError> {
    move_to(request)
}

fn move_to(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["target"])?;
    let target = Utf8Path::new(args.required_text("target")?);
    let path = request.path();
    fs::rename(path, target).map_err(|error| BrokerError::io_pair(path, target, error))?;
    Ok(Outcome::Text(target.as_str().to_owned()))
}

pub(super) fn unlink(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["missing_ok"])?;
    let missing_ok = args.flag("missing_ok", false)?;
    let path = request.path();
    match fs::remove_file(path) {
        Ok(()) => Ok(Outcome::Unit),
        Err(error) if missing_ok && error.kind() == io::ErrorKind::NotFound => Ok(Outcome::Unit),
        Err(error) => Err(BrokerError::io(path, error)),
    }
}

pub(super) fn rmdir(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let path = request.path();
    fs::remove_dir(path)
        .map(|()| Outcome::Unit)
        .map_err(|error| BrokerError::io(path, error))
}

/// Refreshes timestamps on an existing path or creates an empty file.
///
/// Only a missing path falls through to creation. Any other refresh failure
/// is reported as is.
pub(super) fn touch(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["mode", "exist_ok"])?;
    let mode = args.mode("mode", DEFAULT_FILE_MODE)?;
    let exist_ok = args.flag("exist_ok", true)?;
    let path = request.path();

    if exist_ok {
        match refresh_times(path.as_std_path()) {
            Ok(()) => return Ok(Outcome::Unit),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(BrokerError::io(path, error)),
        }
    }

    let mut options = file_options(mode);
    options.write(true);
    if exist_ok {
        options.create(true);
    } else {
        options.create_new(true);
    }
    options
        .open(path)
        .map(|_| Outcome::Unit)
        .map_err(|error| BrokerError::io(path, error))
}

/// Sets both timestamps to the current time; write access is enough.
#[cfg(unix)]
fn refresh_times(path: &Path) -> io::Result<()> {
    use nix::sys::stat::{UtimensatFlags, utimensat};
    use nix::sys::time::TimeSpec;

    utimensat(
        None,
        path,
        &TimeSpec::UTIME_NOW,
        &TimeSpec::UTIME_NOW,
        UtimensatFlags::FollowSymlink,
    )
    .map_err(io::Error::from)
}

#[cfg(not(unix))]
fn refresh_times(path: &Path) -> io::Result<()> {
    use std::fs::FileTimes;
    use std::time::SystemTime;

    let now = SystemTime::now();
    OpenOptions::new()
        .write(true)
        .open(path)?
        .set_times(FileTimes::new().set_accessed(now).set_modified(now))
}

#[cfg(unix)]
fn file_options(mode: u32) -> OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.mode(mode);
    options
}

#[cfg(not(unix))]
fn file_options(_mode: u32) -> OpenOptions {
    OpenOptions::new()
}

pub(super) fn readlink(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let path = request.path();
    fs::read_link(path)
        .map(Outcome::Path)
        .map_err(|error| BrokerError::io(path, error))
}

/// Makes the request path a symlink pointing at `target`.
pub(super) fn symlink_to(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["target", "target_is_directory"])?;
    let target = Utf8Path::new(args.required_text("target")?);
    let directory = args.flag("target_is_directory", false)?;
    let path = request.path();
    create_symlink(target, path, directory)
        .map(|()| Outcome::Unit)
        .map_err(|error| BrokerError::io_pair(path, target, error))
}

#[cfg(unix)]
fn create_symlink(target: &Utf8Path, link: &Utf8Path, _directory: bool) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Utf8Path, link: &Utf8Path, directory: bool) -> io::Result<()> {
    if directory {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Utf8Path, _link: &Utf8Path, _directory: bool) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Canonicalises the path.
///
/// Strict mode requires every component to exist. Otherwise the longest
/// existing prefix is canonicalised and the remainder is appended
/// lexically, with `..` popping a component.
pub(super) fn resolve(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["strict"])?;
    let strict = args.flag("strict", false)?;
    let path = request.path();
    let absolute = absolute_of(path).map_err(|error| BrokerError::io(path, error))?;
    let resolved = if strict {
        fs::canonicalize(&absolute)
    } else {
        resolve_lenient(&absolute)
    };
    resolved
        .map(Outcome::Path)
        .map_err(|error| BrokerError::io(path, error))
}

fn resolve_lenient(absolute: &Path) -> io::Result<PathBuf> {
    let mut last_error = None;
    for existing in absolute.ancestors() {
        match fs::canonicalize(existing) {
            Ok(base) => {
                let remainder = absolute
                    .strip_prefix(existing)
                    .unwrap_or_else(|_| Path::new(""));
                return Ok(append_lexically(base, remainder));
            }
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)))
}

fn append_lexically(mut base: PathBuf, remainder: &Path) -> PathBuf {
    for component in remainder.components() {
        match component {
            Component::ParentDir => {
                base.pop();
            }
            Component::Normal(name) => base.push(name),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    base
}

pub(super) fn absolute(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let path = request.path();
    absolute_of(path)
        .map(Outcome::Path)
        .map_err(|error| BrokerError::io(path, error))
}
