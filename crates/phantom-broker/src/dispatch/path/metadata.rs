//! Existence predicates and stat records.

use std::fs::{self, Metadata};
use std::io;
#[cfg(not(unix))]
use std::time::UNIX_EPOCH;

use camino::Utf8Path;
use phantom_broker_protocol::{Request, StatRecord};

use crate::dispatch::arguments::Bound;
use crate::error::BrokerError;
use crate::normalise::Outcome;

type Lookup = fn(&Utf8Path) -> io::Result<Metadata>;

/// Runs a predicate over metadata, reading "missing" as `false`.
fn probe(
    request: &Request,
    lookup: Lookup,
    test: fn(&Metadata) -> bool,
) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let path = request.path();
    match lookup(path) {
        Ok(metadata) => Ok(Outcome::Bool(test(&metadata))),
        Err(error) if is_absent(&error) => Ok(Outcome::Bool(false)),
        Err(error) => Err(BrokerError::io(path, error)),
    }
}

fn is_absent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn follow(path: &Utf8Path) -> io::Result<Metadata> {
    fs::metadata(path)
}

fn no_follow(path: &Utf8Path) -> io::Result<Metadata> {
    fs::symlink_metadata(path)
}

pub(super) fn exists(request: &Request) -> Result<Outcome, BrokerError> {
    probe(request, follow, |_| true)
}

pub(super) fn is_file(request: &Request) -> Result<Outcome, BrokerError> {
    probe(request, follow, Metadata::is_file)
}

pub(super) fn is_dir(request: &Request) -> Result<Outcome, BrokerError> {
    probe(request, follow, Metadata::is_dir)
}

pub(super) fn is_symlink(request: &Request) -> Result<Outcome, BrokerError> {
    probe(request, no_follow, Metadata::is_symlink)
}

pub(super) fn stat(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["follow_symlinks"])?;
    let lookup: Lookup = if args.flag("follow_symlinks", true)? {
        follow
    } else {
        no_follow
    };
    record(request, lookup)
}

pub(super) fn lstat(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    record(request, no_follow)
}

fn record(
    request: &Request,
    lookup: Lookup,
) -> Result<Outcome, BrokerError> {
    let path = request.path();
    let metadata = lookup(path).map_err(|error| BrokerError::io(path, error))?;
    Ok(Outcome::Stat(stat_record(&metadata)))
}

#[cfg(unix)]
fn stat_record(metadata: &Metadata) -> StatRecord {
    use std::os::unix::fs::MetadataExt;

    StatRecord {
        size: metadata.size(),
        mode: metadata.mode(),
        mtime: metadata.mtime(),
        mtime_ns: Some(metadata.mtime_nsec()),
        atime: Some(metadata.atime()),
        ctime: Some(metadata.ctime()),
        uid: Some(metadata.uid()),
        gid: Some(metadata.gid()),
        nlink: Some(metadata.nlink()),
        ino: Some(metadata.ino()),
        dev: Some(metadata.dev()),
    }
}

#[cfg(not(unix))]
fn stat_record(metadata: &Metadata) -> StatRecord {
    let type_bits = if metadata.is_dir() { 0o040_000 } else { 0o100_000 };
    let permission_bits = if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .and_then(|elapsed| i64::try_from(elapsed.as_secs()).ok())
        .unwrap_or_default();
    StatRecord {
        size: metadata.len(),
        mode: type_bits | permission_bits,
        mtime,
        ..StatRecord::default()
    }
}
