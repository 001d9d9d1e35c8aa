//! A parser for converting pasted curl commands into structured request descriptions.
//!
//! This crate turns a single curl invocation — typically copied out of browser
//! devtools ("Copy as cURL") or API documentation — into a [`ParsedRequest`]
//! a request-building UI can use to populate its fields. It's particularly
//! useful for:
//!
//! - Importing requests into HTTP clients and load-testing tools
//! - Pre-filling request forms from documentation examples
//! - Inspecting what a copied command would actually send
//!
//! # Design Goals
//!
//! The main goals of this crate are:
//!
//! - **Fidelity**: Preserve the URL, method, headers, body, authorization and
//!   multipart form fields a command describes
//! - **Leniency**: Never fail on half-pasted input; unrecognized flags are
//!   ignored and malformed pieces degrade to best-effort results
//! - **Purity**: No I/O, no execution — `@path` file references are recorded,
//!   never read
//!
//! # Architecture
//!
//! Parsing is a strictly one-way, three-stage pipeline:
//!
//! 1. **Tokenizer**: Splits the command into shell words with a small state
//!    machine honoring single, double and ANSI-C (`$'...'`) quoting
//! 2. **Flag Interpreter**: Walks the tokens once, left to right, applying the
//!    recognized curl flags and the positional URL
//! 3. **Body Classifier**: Sniffs the resolved `Content-Type` and, for
//!    multipart bodies, re-parses the raw body into named form fields
//!
//! The interpreter handles the common curl options:
//! - HTTP method (`-X`, `--request`)
//! - Headers (`-H`, `--header`) and cookies (`-b`, `--cookie`)
//! - Request body (`-d`, `--data`, `--data-raw`, `--data-binary`)
//! - Multipart form fields (`-F`, `--form`)
//! - Basic authentication (`-u`, `--user`)
//!
//! # Examples
//!
//! Basic GET request:
//!
//! ```
//! use curl_import::ParsedRequest;
//! use std::str::FromStr;
//! # fn main() -> Result<(), curl_import::Error> {
//! let request = ParsedRequest::from_str("curl https://api.example.com/users")?;
//! assert_eq!(request.method, http::Method::GET);
//! assert_eq!(request.url, "https://api.example.com/users");
//! # Ok(())
//! # }
//! ```
//!
//! POST request with headers and body, with `{{ placeholder }}` template
//! variables rendered before parsing:
//!
//! ```
//! use curl_import::ParsedRequest;
//! use serde_json::json;
//! # fn main() -> Result<(), curl_import::Error> {
//! let curl = r#"curl -X POST https://api.example.com/users \
//!     -H 'Content-Type: application/json' \
//!     -H 'Authorization: Bearer {{ token }}' \
//!     -d '{"name": "John Doe", "email": "john@example.com"}'"#;
//! let request = ParsedRequest::load(curl, json!({ "token": "123456" }))?;
//! assert_eq!(request.method, http::Method::POST);
//! assert_eq!(request.authorization.as_deref(), Some("Bearer 123456"));
//! assert!(request.body.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Multipart form fields:
//!
//! ```
//! use curl_import::{BodyKind, FormValue, ParsedRequest};
//! use std::str::FromStr;
//! # fn main() -> Result<(), curl_import::Error> {
//! let curl = "curl https://api.example.com/upload -F 'file=@/tmp/report.pdf' -F 'title=Q3'";
//! let request = ParsedRequest::from_str(curl)?;
//! assert_eq!(request.body_kind, BodyKind::FormData);
//! assert_eq!(
//!     request.form_fields["file"],
//!     FormValue::FilePath("/tmp/report.pdf".into())
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Using with reqwest (requires the `reqwest` feature). The conversion only
//! builds the request; sending it is the caller's decision:
//!
//! ```
//! # #[cfg(feature = "reqwest")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use curl_import::ParsedRequest;
//! use std::str::FromStr;
//!
//! let parsed = ParsedRequest::from_str(
//!     r#"curl -X POST https://api.example.com/users -d '{"name": "John Doe"}'"#,
//! )?;
//! let builder = reqwest::RequestBuilder::try_from(&parsed)?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod error;
mod multipart;
mod parser;
mod tokenizer;

use std::collections::HashMap;

use http::Method;
use serde::{Deserialize, Serialize};

pub use error::Error;

/// High-level classification of the request body.
///
/// Serializes as `"json"` / `"form-data"`, the values a request-execution
/// backend expects in its `bodyType` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyKind {
    /// Raw body text, JSON-oriented. The default.
    #[default]
    Json,
    /// Multipart form data, described by [`ParsedRequest::form_fields`].
    FormData,
}

/// A single named field of a multipart form body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormValue {
    /// A plain text value.
    Text(String),
    /// A reference to a local file, from a `-F name=@path` or `-F name=<path`
    /// value. The path is recorded verbatim and never read here; resolving it
    /// is the caller's job. Note that curl itself treats `<path` as "send the
    /// file's content as the field value" rather than as a file upload, but
    /// both spellings are recorded identically.
    FilePath(String),
    /// A file part recovered from a raw multipart body. `content` is always
    /// empty: the pasted command carries only the part headers, not the
    /// original bytes, so the caller must supply them.
    File { filename: String, content: String },
}

/// Structured description of one HTTP request, recovered from a curl command.
///
/// Constructed via [`FromStr`](std::str::FromStr) or [`ParsedRequest::load`],
/// then handed to the caller as a plain value; the parser keeps no state
/// between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// Request URL. Stays empty if the command never named one; that is not
    /// an error.
    pub url: String,
    /// HTTP method. Defaults to `GET`; promoted to `POST` when a body-carrying
    /// flag appears while the method is still `GET`.
    pub method: Method,
    /// Headers with their key case preserved. `Authorization` is diverted to
    /// [`authorization`](Self::authorization) instead of landing here.
    pub headers: HashMap<String, String>,
    /// Raw body from a data flag. Cleared once the multipart reparser has
    /// decomposed it into [`form_fields`](Self::form_fields).
    pub body: Option<String>,
    pub body_kind: BodyKind,
    /// Non-empty only for form-data requests; `body_kind` is `FormData`
    /// whenever this has entries.
    pub form_fields: HashMap<String, FormValue>,
    /// Raw `Authorization` header value, kept out of `headers` so credential
    /// material can be handled distinctly.
    pub authorization: Option<String>,
}

impl Default for ParsedRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: Method::GET,
            headers: HashMap::with_capacity(8), // Pre-allocate for typical header count
            body: None,
            body_kind: BodyKind::Json,
            form_fields: HashMap::new(),
            authorization: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_kind_serializes_to_wire_strings() {
        assert_eq!(serde_json::to_value(BodyKind::Json).unwrap(), json!("json"));
        assert_eq!(
            serde_json::to_value(BodyKind::FormData).unwrap(),
            json!("form-data")
        );
    }

    #[test]
    fn form_values_serialize_with_variant_tags() {
        assert_eq!(
            serde_json::to_value(FormValue::Text("Q3".to_string())).unwrap(),
            json!({ "text": "Q3" })
        );
        assert_eq!(
            serde_json::to_value(FormValue::FilePath("/tmp/x.txt".to_string())).unwrap(),
            json!({ "file_path": "/tmp/x.txt" })
        );
        assert_eq!(
            serde_json::to_value(FormValue::File {
                filename: "a.png".to_string(),
                content: String::new(),
            })
            .unwrap(),
            json!({ "file": { "filename": "a.png", "content": "" } })
        );
    }

    #[test]
    fn headers_map_is_directly_json_stringifiable() {
        let mut request = ParsedRequest::default();
        request
            .headers
            .insert("X-Custom".to_string(), "v".to_string());
        let encoded = serde_json::to_string(&request.headers).unwrap();
        assert_eq!(encoded, r#"{"X-Custom":"v"}"#);
    }
}
