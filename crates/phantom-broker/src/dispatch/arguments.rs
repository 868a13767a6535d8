//! Binds request arguments to a handler's parameter list.
//!
//! Binding follows call-signature rules: positional values fill parameters
//! in declaration order, then keywords fill the rest by name. A keyword that
//! repeats a positional, an unknown keyword, or surplus positionals are all
//! rejected before the handler touches the filesystem.

use phantom_broker_protocol::{Request, Scalar};

use crate::error::BrokerError;

/// Arguments bound to named parameters.
#[derive(Debug)]
pub(crate) struct Bound<'a> {
    op: &'a str,
    params: &'static [&'static str],
    values: Vec<Option<&'a Scalar>>,
}

impl<'a> Bound<'a> {
    /// Binds `request`'s arguments to `params`.
    pub(crate) fn bind(
        request: &'a Request,
        params: &'static [&'static str],
    ) -> Result<Self, BrokerError> {
        let op = request.op();
        let args = request.args();
        if args.len() > params.len() {
            return Err(BrokerError::bad_argument(format!(
                "{op}() takes {} positional argument{} but {} were given",
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }

        let mut values: Vec<Option<&'a Scalar>> = vec![None; params.len()];
        for (slot, value) in values.iter_mut().zip(args) {
            *slot = Some(value);
        }

        for (name, value) in request.kwargs() {
            let Some(index) = params.iter().position(|param| param == name) else {
                return Err(BrokerError::bad_argument(format!(
                    "{op}() got an unexpected keyword argument '{name}'"
                )));
            };
            let Some(slot) = values.get_mut(index) else {
                continue;
            };
            if slot.is_some() {
                return Err(BrokerError::bad_argument(format!(
                    "{op}() got multiple values for argument '{name}'"
                )));
            }
            *slot = Some(value);
        }

        Ok(Self { op, params, values })
    }

    fn lookup(&self, name: &str) -> Option<&'a Scalar> {
        let index = self.params.iter().position(|param| *param == name)?;
        self.values
            .get(index)
            .copied()
            .flatten()
            .filter(|value| !value.is_null())
    }

    fn type_error(&self, name: &str, expected: &str, found: &Scalar) -> BrokerError {
        BrokerError::bad_argument(format!(
            "{}() argument '{name}' must be {expected}, not {}",
            self.op,
            found.type_name()
        ))
    }

    /// Returns an optional string parameter. `null` counts as absent.
    pub(crate) fn text(&self, name: &str) -> Result<Option<&'a str>, BrokerError> {
        self.lookup(name).map_or(Ok(None), |value| {
            value
                .as_str()
                .map(Some)
                .ok_or_else(|| self.type_error(name, "string", value))
        })
    }

    /// Returns a string parameter the call cannot do without.
    pub(crate) fn required_text(&self, name: &str) -> Result<&'a str, BrokerError> {
        self.text(name)?.ok_or_else(|| {
            BrokerError::bad_argument(format!(
                "{}() missing required argument: '{name}'",
                self.op
            ))
        })
    }

    /// Returns a boolean parameter, or `default` when absent.
    pub(crate) fn flag(&self, name: &str, default: bool) -> Result<bool, BrokerError> {
        self.lookup(name).map_or(Ok(default), |value| {
            value
                .as_bool()
                .ok_or_else(|| self.type_error(name, "boolean", value))
        })
    }

    /// Returns a permission-bits parameter, or `default` when absent.
    pub(crate) fn mode(&self, name: &str, default: u32) -> Result<u32, BrokerError> {
        let Some(value) = self.lookup(name) else {
            return Ok(default);
        };
        let raw = value
            .as_integer()
            .ok_or_else(|| self.type_error(name, "integer", value))?;
        u32::try_from(raw).map_err(|_| {
            BrokerError::bad_argument(format!(
                "{}() argument '{name}' is out of range: {raw}",
                self.op
            ))
        })
    }

    /// Rejects any text encoding other than UTF-8.
    pub(crate) fn require_utf8(&self, name: &str) -> Result<(), BrokerError> {
        let Some(encoding) = self.text(name)? else {
            return Ok(());
        };
        if is_utf8_label(encoding) {
            Ok(())
        } else {
            Err(BrokerError::bad_argument(format!(
                "{}() unsupported encoding: {encoding}",
                self.op
            )))
        }
    }
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8")
}

/// Collects a variadic list of string positionals; keywords are refused.
pub(crate) fn variadic_text(request: &Request) -> Result<Vec<&str>, BrokerError> {
    let op = request.op();
    if let Some(name) = request.kwargs().keys().next() {
        return Err(BrokerError::bad_argument(format!(
            "{op}() got an unexpected keyword argument '{name}'"
        )));
    }
    request
        .args()
        .iter()
        .map(|value| {
            value.as_str().ok_or_else(|| {
                BrokerError::bad_argument(format!(
                    "{op}() arguments must be strings, not {}",
                    value.type_name()
                ))
            })
        })
        .collect()
}
