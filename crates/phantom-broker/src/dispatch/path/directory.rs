//! Directory creation, listing, and pattern matching.
//!
//! Listings are materialised in the order the host's directory enumeration
//! yields entries; nothing is sorted.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, DirBuilder};
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use phantom_broker_protocol::Request;
use tracing::debug;

use super::child_of;
use crate::dispatch::DISPATCH_TARGET;
use crate::dispatch::arguments::Bound;
use crate::error::BrokerError;
use crate::normalise::Outcome;

const DEFAULT_DIR_MODE: u32 = 0o777;

const SEGMENT_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

pub(super) fn mkdir(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["mode", "parents", "exist_ok"])?;
    let mode = args.mode("mode", DEFAULT_DIR_MODE)?;
    let parents = args.flag("parents", false)?;
    let exist_ok = args.flag("exist_ok", false)?;
    let path = request.path();
    make_dir(path.as_std_path(), mode, parents, exist_ok)
        .map(|()| Outcome::Unit)
        .map_err(|error| BrokerError::io(path, error))
}

fn make_dir(path: &Path, mode: u32, parents: bool, exist_ok: bool) -> io::Result<()> {
    match dir_builder(mode).create(path) {
        Ok(()) => Ok(()),
        Err(error) if parents && error.kind() == io::ErrorKind::NotFound => {
            let Some(parent) = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty() && *parent != path)
            else {
                return Err(error);
            };
            make_dir(parent, DEFAULT_DIR_MODE, true, true)?;
            make_dir(path, mode, false, exist_ok)
        }
        Err(error) if exist_ok && path.is_dir() => {
            debug!(target: DISPATCH_TARGET, path = %path.display(), %error, "directory exists");
            Ok(())
        }
        Err(error) => Err(error),
    }
}

#[cfg(unix)]
fn dir_builder(mode: u32) -> DirBuilder {
    use std::os::unix::fs::DirBuilderExt;

    let mut builder = DirBuilder::new();
    builder.mode(mode);
    builder
}

#[cfg(not(unix))]
fn dir_builder(_mode: u32) -> DirBuilder {
    DirBuilder::new()
}

pub(super) fn iterdir(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let path = request.path();
    let entries = fs::read_dir(path)
        .and_then(|entries| {
            entries
                .map(|entry| entry.map(|found| child_of(path.as_std_path(), found.file_name())))
                .collect::<io::Result<Vec<_>>>()
        })
        .map_err(|error| BrokerError::io(path, error))?;
    Ok(Outcome::Paths(entries))
}

pub(super) fn glob(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["pattern"])?;
    let pattern = args.required_text("pattern")?;
    select(request, pattern)
}

pub(super) fn rglob(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["pattern"])?;
    let pattern = args.required_text("pattern")?;
    select(request, &format!("**/{pattern}"))
}

/// One `/`-separated piece of a relative pattern.
#[derive(Debug)]
enum Segment {
    Literal(String),
    Wildcard(Pattern),
    Recursive,
}

fn compile(pattern: &str) -> Result<(Vec<Segment>, bool), BrokerError> {
    if pattern.is_empty() {
        return Err(BrokerError::bad_argument(format!(
            "unacceptable pattern: '{pattern}'"
        )));
    }
    if Path::new(pattern).has_root() {
        return Err(BrokerError::bad_argument(format!(
            "non-relative patterns are unsupported: '{pattern}'"
        )));
    }
    let directories_only = pattern.ends_with('/');
    let mut segments = pattern
        .split('/')
        .filter(|piece| !piece.is_empty() && *piece != ".")
        .map(|piece| {
            if piece == "**" {
                Ok(Segment::Recursive)
            } else if piece.contains(['*', '?', '[']) {
                Pattern::new(piece).map(Segment::Wildcard).map_err(|error| {
                    BrokerError::bad_argument(format!("invalid pattern '{pattern}': {error}"))
                })
            } else {
                Ok(Segment::Literal(piece.to_owned()))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    segments.dedup_by(|next, previous| {
        matches!((previous, next), (Segment::Recursive, Segment::Recursive))
    });
    Ok((segments, directories_only))
}

fn select(request: &Request, pattern: &str) -> Result<Outcome, BrokerError> {
    let (segments, directories_only) = compile(pattern)?;
    let mut matches = Vec::new();
    walk(request.path().as_std_path().to_path_buf(), &segments, &mut matches);
    let mut seen = HashSet::new();
    matches.retain(|found| (!directories_only || found.is_dir()) && seen.insert(found.clone()));
    Ok(Outcome::Paths(matches))
}

fn walk(base: PathBuf, segments: &[Segment], matches: &mut Vec<PathBuf>) {
    let Some((segment, rest)) = segments.split_first() else {
        matches.push(base);
        return;
    };
    match segment {
        Segment::Literal(name) => {
            let candidate = child_of(&base, name);
            let present = if rest.is_empty() {
                fs::symlink_metadata(&candidate).is_ok()
            } else {
                candidate.is_dir()
            };
            if present {
                walk(candidate, rest, matches);
            }
        }
        Segment::Wildcard(pattern) => {
            for (name, is_dir) in children(&base) {
                let matched = name
                    .to_str()
                    .is_some_and(|text| pattern.matches_with(text, SEGMENT_MATCH));
                if matched && (rest.is_empty() || is_dir) {
                    walk(child_of(&base, &name), rest, matches);
                }
            }
        }
        Segment::Recursive => {
            let mut directories = Vec::new();
            descend(base, &mut directories);
            for directory in directories {
                walk(directory, rest, matches);
            }
        }
    }
}

/// Lists `base`'s entries with a follow-symlinks directory flag.
///
/// Unreadable directories and entries are skipped.
fn children(base: &Path) -> Vec<(OsString, bool)> {
    fs::read_dir(base).map_or_else(
        |error| {
            debug!(
                target: DISPATCH_TARGET,
                path = %base.display(),
                %error,
                "skipping unreadable directory"
            );
            Vec::new()
        },
        |entries| {
            entries
                .filter_map(|entry| {
                    entry
                        .inspect_err(|error| {
                            debug!(target: DISPATCH_TARGET, %error, "skipping unreadable entry");
                        })
                        .ok()
                })
                .map(|found| {
                    let is_dir = fs::metadata(found.path()).is_ok_and(|meta| meta.is_dir());
                    (found.file_name(), is_dir)
                })
                .collect()
        },
    )
}

/// Collects `directory` and every directory below it in pre-order, without
/// following symlinks.
fn descend(directory: PathBuf, into: &mut Vec<PathBuf>) {
    let subdirectories: Vec<PathBuf> = fs::read_dir(&directory)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|found| found.file_type().is_ok_and(|kind| kind.is_dir()))
                .map(|found| child_of(&directory, found.file_name()))
                .collect()
        })
        .unwrap_or_default();
    into.push(directory);
    for subdirectory in subdirectories {
        descend(subdirectory, into);
    }
}

