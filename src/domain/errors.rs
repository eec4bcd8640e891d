//! Canonical error types
//!
//! These errors are transport-agnostic. The HTTP and RPC layers translate
//! them into wire responses (see `api::error` and `rpc::status`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Structured context attached to an error, e.g. per-field validation reasons.
pub type Fields = BTreeMap<String, Value>;

/// The closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Unknown,
    NotFound,
    Unauthorized,
    Internal,
    AlreadyExists,
    Forbidden,
    Conflict,
    Timeout,
    TooManyRequests,
    BadRequest,
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::Unknown,
        Kind::NotFound,
        Kind::Unauthorized,
        Kind::Internal,
        Kind::AlreadyExists,
        Kind::Forbidden,
        Kind::Conflict,
        Kind::Timeout,
        Kind::TooManyRequests,
        Kind::BadRequest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Unknown => "unknown",
            Kind::NotFound => "not_found",
            Kind::Unauthorized => "unauthorized",
            Kind::Internal => "internal",
            Kind::AlreadyExists => "already_exists",
            Kind::Forbidden => "forbidden",
            Kind::Conflict => "conflict",
            Kind::Timeout => "timeout",
            Kind::TooManyRequests => "too_many_requests",
            Kind::BadRequest => "bad_request",
        }
    }

    /// Shorthand for `Error::new(kind, message)`.
    pub fn with_message(self, message: impl Into<String>) -> Error {
        Error::new(self, message)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name that is not one of the ten kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised error kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// The single error value flowing between the data layer and the transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    #[serde(rename = "code")]
    pub kind: Kind,
    pub message: String,
    /// Opaque correlation code, never part of the default wire rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_code: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

impl Error {
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_code: None,
            fields: Fields::new(),
        }
    }

    /// A `BadRequest` carrying field-level detail.
    pub fn validation(message: impl Into<String>, fields: Fields) -> Self {
        Self::new(Kind::BadRequest, message).with_fields(fields)
    }

    pub fn with_internal_code(mut self, code: impl Into<String>) -> Self {
        self.internal_code = Some(code.into());
        self
    }

    /// Replaces any fields already set.
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.kind == kind
    }

    /// Converts any error into a canonical one. Canonical errors pass through
    /// untouched; anything else becomes `Unknown` carrying the error's text.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        match err.downcast_ref::<Error>() {
            Some(canonical) => canonical.clone(),
            None => Self::new(Kind::Unknown, err.to_string()),
        }
    }

    /// Owned variant of [`Error::from_error`]; avoids the clone on passthrough.
    pub fn from_boxed(err: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        match err.downcast::<Error>() {
            Ok(canonical) => *canonical,
            Err(other) => Self::new(Kind::Unknown, other.to_string()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{}: {} ({})", self.kind, self.message, FieldsRepr(&self.fields))
        }
    }
}

impl std::error::Error for Error {}

/// Reports whether `err` is a canonical error of the given kind.
pub fn is(err: &(dyn std::error::Error + 'static), kind: Kind) -> bool {
    err.downcast_ref::<Error>().is_some_and(|e| e.kind == kind)
}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for Error {
    fn from(e: sea_orm::DbErr) -> Self {
        match e {
            sea_orm::DbErr::RecordNotFound(what) => Error::new(Kind::NotFound, what),
            other => Error::new(Kind::Internal, other.to_string()),
        }
    }
}

/// Renders fields as `map[k1:v1 k2:v2]`, keys in sorted order.
struct FieldsRepr<'a>(&'a Fields);

impl fmt::Display for FieldsRepr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_map(f, self.0.iter())
    }
}

fn write_map<'a>(
    f: &mut fmt::Formatter<'_>,
    entries: impl Iterator<Item = (&'a String, &'a Value)>,
) -> fmt::Result {
    f.write_str("map[")?;
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}:", key)?;
        write_value(f, value)?;
    }
    f.write_str("]")
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("<nil>"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if n.is_f64() => write_float(f, x),
            _ => write!(f, "{}", n),
        },
        Value::String(s) => f.write_str(s),
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_value(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(map) => write_map(f, map.iter()),
    }
}

/// Shortest representation, switching to `1.5e+07` style outside
/// `1e-4 <= |x| < 1e6`, with a signed exponent of at least two digits.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let sci = format!("{:e}", x);
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            if (-4..6).contains(&exp) {
                write!(f, "{}", x)
            } else {
                let sign = if exp < 0 { '-' } else { '+' };
                write!(f, "{}e{}{:02}", mantissa, sign, exp.abs())
            }
        }
        None => write!(f, "{}", x),
    }
}
