//! Request records accepted by the broker.
//!
//! A [`Request`] names a handler family ([`RequestKind`]), the filesystem
//! path to act on, the operation name, and call arguments restricted to
//! [`Scalar`] values. Operation names are plain strings here; the broker
//! validates them against its allowlist, so an unknown name still decodes.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Handler family a request is routed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestKind {
    /// Path introspection and manipulation.
    Path,
    /// Whole-file text I/O.
    File,
}

/// A single argument value.
///
/// Only JSON strings, integers, booleans, and `null` are accepted. Floats,
/// arrays, and objects fail to decode, which the codec reports as an
/// invalid invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A JSON boolean.
    Bool(bool),
    /// A JSON integer representable as `i64`.
    Integer(i64),
    /// A JSON string.
    Text(String),
    /// JSON `null`.
    Null,
}

impl Scalar {
    /// Returns the string value, if this scalar is text.
    #[must_use]
    pub const fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the boolean value, if this scalar is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value, if this scalar is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns whether this scalar is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short JSON type name used in argument diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Text(_) => "string",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A filesystem request decoded from the broker's single argv element.
///
/// `args` and `kwargs` are serialised only when the request carries them, so
/// a decoded payload re-encodes with the same keys whether it spelt an empty
/// collection out or left it absent. Keyword names must be unique; a payload
/// repeating one fails to decode.
///
/// # Example
///
/// ```
/// use phantom_broker_protocol::{Request, RequestKind, Scalar};
///
/// let request = Request::new(RequestKind::Path, "/tmp/d", "mkdir")
///     .with_kwarg("parents", true)
///     .with_kwarg("exist_ok", true);
/// assert_eq!(request.op(), "mkdir");
/// assert_eq!(request.kwargs().get("parents"), Some(&Scalar::Bool(true)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    kind: RequestKind,
    path: Utf8PathBuf,
    op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Vec<Scalar>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "unique_keywords"
    )]
    kwargs: Option<BTreeMap<String, Scalar>>,
}

static NO_KEYWORDS: BTreeMap<String, Scalar> = BTreeMap::new();

impl Request {
    /// Creates a request with no arguments.
    #[must_use]
    pub fn new(kind: RequestKind, path: impl Into<Utf8PathBuf>, op: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            op: op.into(),
            args: None,
            kwargs: None,
        }
    }

    /// Replaces the target path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Replaces the positional arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<Scalar>) -> Self {
        self.args = Some(args);
        self
    }

    /// Adds or replaces one keyword argument.
    #[must_use]
    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.kwargs
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Returns the handler family.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the target path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn op(&self) -> &str {
        self.op.as_str()
    }

    /// Returns the positional arguments.
    #[must_use]
    pub fn args(&self) -> &[Scalar] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Returns the keyword arguments.
    #[must_use]
    pub fn kwargs(&self) -> &BTreeMap<String, Scalar> {
        self.kwargs.as_ref().unwrap_or(&NO_KEYWORDS)
    }
}

fn unique_keywords<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, Scalar>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(UniqueKeywords).map(Some)
}

/// Builds the keyword map, refusing a name that appears twice.
struct UniqueKeywords;

impl<'de> Visitor<'de> for UniqueKeywords {
    type Value = BTreeMap<String, Scalar>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of uniquely named scalar arguments")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut keywords = BTreeMap::new();
        while let Some((name, value)) = access.next_entry::<String, Scalar>()? {
            match keywords.entry(name) {
                Entry::Occupied(existing) => {
                    return Err(de::Error::custom(format_args!(
                        "duplicate keyword argument '{}'",
                        existing.key()
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
        Ok(keywords)
    }
}
