//! RPC status codec
//!
//! Outbound, a canonical error becomes a `tonic::Status` whose message is the
//! error's display text (`"<kind>: <message>"`, optionally followed by
//! `" (<fields>)"`). Inbound, the kind comes from the status code and the
//! original message is recovered by stripping that decoration again.
//!
//! Fields do not survive the trip; [`from_status_with_details`] lets the
//! receiver re-attach them when it has them out of band.

use tonic::{Code, Status};

use crate::domain::{Error, Fields, Kind};

pub fn code_for(kind: Kind) -> Code {
    match kind {
        Kind::NotFound => Code::NotFound,
        Kind::BadRequest => Code::InvalidArgument,
        Kind::Unauthorized => Code::Unauthenticated,
        Kind::Forbidden => Code::PermissionDenied,
        Kind::AlreadyExists => Code::AlreadyExists,
        Kind::Conflict => Code::Aborted,
        Kind::Timeout => Code::DeadlineExceeded,
        Kind::TooManyRequests => Code::ResourceExhausted,
        Kind::Internal => Code::Internal,
        Kind::Unknown => Code::Unknown,
    }
}

/// Inverse of [`code_for`]. Codes outside the table map to `Internal`.
pub fn kind_for_code(code: Code) -> Kind {
    match code {
        Code::NotFound => Kind::NotFound,
        Code::InvalidArgument => Kind::BadRequest,
        Code::Unauthenticated => Kind::Unauthorized,
        Code::PermissionDenied => Kind::Forbidden,
        Code::AlreadyExists => Kind::AlreadyExists,
        Code::Aborted => Kind::Conflict,
        Code::DeadlineExceeded => Kind::Timeout,
        Code::ResourceExhausted => Kind::TooManyRequests,
        Code::Internal => Kind::Internal,
        Code::Unknown => Kind::Unknown,
        _ => Kind::Internal,
    }
}

pub fn to_status(err: &Error) -> Status {
    Status::new(code_for(err.kind), err.to_string())
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        to_status(&err)
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        from_status(&status)
    }
}

/// Recovers the free-text message from an encoded status message.
///
/// Everything after the first colon (leading spaces dropped) is kept, minus
/// a parenthesised block that ends the string. Without a colon the message
/// is returned as-is. A message that legitimately contains a colon or ends
/// in parentheses is cut the same way.
pub fn parse_message(message: &str) -> &str {
    let Some((_, rest)) = message.split_once(':') else {
        return message;
    };
    let rest = rest.trim_start_matches(' ');

    if rest.ends_with(')')
        && let Some(open) = rest.find('(')
    {
        return rest[..open].trim_end();
    }
    rest
}

pub fn from_code(code: Code, message: &str) -> Error {
    Error::new(kind_for_code(code), parse_message(message))
}

pub fn from_status(status: &Status) -> Error {
    from_code(status.code(), status.message())
}

/// Like [`from_status`] but re-attaches fields that the wire format dropped.
pub fn from_status_with_details(status: &Status, fields: Fields) -> Error {
    from_status(status).with_fields(fields)
}

/// Converts an arbitrary error received from an RPC call.
///
/// Canonical errors pass through untouched, statuses are decoded, and
/// anything else becomes `Unknown` with the error's full text.
pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Error {
    if let Some(canonical) = err.downcast_ref::<Error>() {
        return canonical.clone();
    }
    match err.downcast_ref::<Status>() {
        Some(status) => from_status(status),
        None => Error::new(Kind::Unknown, err.to_string()),
    }
}

pub fn is_status(err: &(dyn std::error::Error + 'static)) -> bool {
    err.is::<Status>()
}

/// The status code carried by `err`, `Unknown` when it is not a status.
pub fn status_code(err: &(dyn std::error::Error + 'static)) -> Code {
    err.downcast_ref::<Status>()
        .map_or(Code::Unknown, |status| status.code())
}

/// The raw status message, or the error's text when it is not a status.
pub fn status_message(err: &(dyn std::error::Error + 'static)) -> String {
    match err.downcast_ref::<Status>() {
        Some(status) => status.message().to_string(),
        None => err.to_string(),
    }
}
