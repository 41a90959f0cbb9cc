//! Types module for the main runtime, exposing error and result types.
//!
//! Most code in this module is based around coercion of error types into
//! a common error type, to be used as the general "Error" of this crate.
use logger::SetLoggerError;
use quick_xml::events::Event;
use quick_xml::Reader;
use rusoto_core::request;

use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use std::path::StripPrefixError;

/// Public type alias for a result with a `UtilError` error type.
pub type UtilResult<T> = Result<T, UtilError>;

/// Delegating error wrapper for errors raised by any of the tools.
///
/// The internal `String` representation enables cheap coercion from
/// other error types by binding their error messages through.
pub struct UtilError(String);

impl Debug for UtilError {
    /// Formats an `UtilError` by delegating to `Display`.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for UtilError {
    /// Formats an `UtilError` by writing out the inner representation.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Macro to implement `From` for provided types.
macro_rules! derive_from {
    ($type:ty) => {
        impl<'a> From<$type> for UtilError {
            fn from(t: $type) -> UtilError {
                UtilError(t.to_string())
            }
        }
    };
}

derive_from!(&'a str);
derive_from!(io::Error);
derive_from!(clap::Error);
derive_from!(SetLoggerError);
derive_from!(regex::Error);
derive_from!(request::TlsError);
derive_from!(serde_json::Error);
derive_from!(humantime::DurationError);
derive_from!(std::num::ParseIntError);
derive_from!(StripPrefixError);
derive_from!(String);

/// Pulls the text of the first `<Message>` tag out of an XML error body.
///
/// Both S3 and the query protocol services (IAM) return their errors as
/// XML documents, which is rather unfriendly to print to a terminal.
fn xml_message(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    let mut buffer = Vec::new();

    loop {
        match reader.read_event(&mut buffer) {
            // end, or error, just give up
            Ok(Event::Eof) | Err(_) => return None,

            // if we find a message tag, we'll use that as the error
            Ok(Event::Start(ref e)) if e.name() == b"Message" => {
                return reader.read_text(b"Message", &mut Vec::new()).ok();
            }

            _ => (),
        }
        buffer.clear();
    }
}

/// Macro to implement `From` for Rusoto types.
macro_rules! derive_from_rusoto {
    ($type:ty) => {
        impl From<rusoto_core::RusotoError<$type>> for UtilError {
            /// Converts a Rusoto error to a `UtilError`.
            fn from(err: rusoto_core::RusotoError<$type>) -> UtilError {
                let msg = err.to_string();

                // XML, look for a message!
                if msg.starts_with("<?xml") || msg.starts_with("<ErrorResponse") {
                    if let Some(message) = xml_message(&msg) {
                        return UtilError(message);
                    }
                }

                UtilError(msg)
            }
        }
    };
}

// derive error display for all used rusoto types
derive_from_rusoto!(rusoto_s3::PutObjectError);
derive_from_rusoto!(rusoto_ssm::GetParametersByPathError);
derive_from_rusoto!(rusoto_organizations::ListRootsError);
derive_from_rusoto!(rusoto_iam::GenerateOrganizationsAccessReportError);
derive_from_rusoto!(rusoto_iam::GetOrganizationsAccessReportError);

#[cfg(test)]
mod tests {
    use super::UtilError;
    use rusoto_core::RusotoError;
    use rusoto_iam::GetOrganizationsAccessReportError;
    use std::io::{Error, ErrorKind};

    #[test]
    fn converting_io_to_error() {
        let message = "My fake access key failed message";
        let io_errs = Error::new(ErrorKind::Other, message);
        let convert = UtilError::from(io_errs);

        assert_eq!(convert.0, message);
    }

    #[test]
    fn converting_str_to_error() {
        let message = "Unexpected job status: FAILED";
        let convert = UtilError::from(message);

        assert_eq!(convert.0, message);
    }

    #[test]
    fn converting_xml_rusoto_error_to_message() {
        let body = concat!(
            "<?xml version=\"1.0\"?>",
            "<ErrorResponse><Error><Code>AccessDenied</Code>",
            "<Message>Not authorized to generate reports</Message>",
            "</Error></ErrorResponse>"
        );

        let err: RusotoError<GetOrganizationsAccessReportError> =
            RusotoError::Validation(body.to_string());
        let convert = UtilError::from(err);

        assert_eq!(convert.0, "Not authorized to generate reports");
    }

    #[test]
    fn converting_plain_rusoto_error_keeps_message() {
        let err: RusotoError<GetOrganizationsAccessReportError> =
            RusotoError::Validation("job id is required".to_string());
        let convert = UtilError::from(err);

        assert_eq!(convert.0, "job id is required");
    }
}
