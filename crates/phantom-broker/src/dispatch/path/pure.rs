//! Lexical path operations. Nothing here touches the filesystem.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use phantom_broker_protocol::Request;

use crate::dispatch::arguments::{Bound, variadic_text};
use crate::error::BrokerError;
use crate::normalise::Outcome;

/// Final component, `..` kept verbatim, empty for roots and `.`.
fn final_name(path: &Utf8Path) -> &str {
    match path.components().next_back() {
        Some(Utf8Component::Normal(name)) => name,
        Some(Utf8Component::ParentDir) => "..",
        _ => "",
    }
}

/// Splits a name into stem and suffix. Leading-dot names have no suffix.
fn split_suffix(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            (stem, Some(extension))
        }
        _ => (name, None),
    }
}

fn lexical_parent(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        Some(_) => Utf8Path::new("."),
        None if path.as_str().is_empty() => Utf8Path::new("."),
        None => path,
    }
}

pub(super) fn is_absolute(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    Ok(Outcome::Bool(request.path().is_absolute()))
}

pub(super) fn name(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    Ok(Outcome::Text(final_name(request.path()).to_owned()))
}

pub(super) fn suffix(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let (_, extension) = split_suffix(final_name(request.path()));
    Ok(Outcome::Text(
        extension.map(|ext| format!(".{ext}")).unwrap_or_default(),
    ))
}

pub(super) fn stem(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let (stem, _) = split_suffix(final_name(request.path()));
    Ok(Outcome::Text(stem.to_owned()))
}

pub(super) fn parent(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    Ok(Outcome::Text(lexical_parent(request.path()).as_str().to_owned()))
}

pub(super) fn parts(request: &Request) -> Result<Outcome, BrokerError> {
    Bound::bind(request, &[])?;
    let parts = request
        .path()
        .components()
        .filter(|component| *component != Utf8Component::CurDir)
        .map(|component| component.as_str().to_owned())
        .collect();
    Ok(Outcome::Texts(parts))
}

pub(super) fn joinpath(request: &Request) -> Result<Outcome, BrokerError> {
    let mut joined = request.path().to_path_buf();
    for segment in variadic_text(request)? {
        if !segment.is_empty() {
            joined.push(segment);
        }
    }
    Ok(Outcome::Text(joined.into_string()))
}

pub(super) fn with_name(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["name"])?;
    let replacement = args.required_text("name")?;
    let path = request.path();
    if final_name(path).is_empty() {
        return Err(BrokerError::bad_argument(format!("'{path}' has an empty name")));
    }
    if replacement.is_empty() || replacement == "." || replacement.contains('/') {
        return Err(BrokerError::bad_argument(format!(
            "invalid name '{replacement}'"
        )));
    }
    Ok(Outcome::Text(replace_final(path, replacement).into_string()))
}

pub(super) fn with_suffix(request: &Request) -> Result<Outcome, BrokerError> {
    let args = Bound::bind(request, &["suffix"])?;
    let replacement = args.required_text("suffix")?;
    let path = request.path();
    let name = final_name(path);
    if name.is_empty() {
        return Err(BrokerError::bad_argument(format!("'{path}' has an empty name")));
    }
    let valid = replacement.is_empty()
        || (replacement.starts_with('.') && replacement != "." && !replacement.contains('/'));
    if !valid {
        return Err(BrokerError::bad_argument(format!(
            "invalid suffix '{replacement}'"
        )));
    }
    let (stem, _) = split_suffix(name);
    Ok(Outcome::Text(
        replace_final(path, &format!("{stem}{replacement}")).into_string(),
    ))
}

fn replace_final(path: &Utf8Path, name: &str) -> Utf8PathBuf {
    path.parent()
        .map_or_else(|| Utf8PathBuf::from(name), |parent| parent.join(name))
}
