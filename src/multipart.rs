//! Body classification and multipart reparsing.
//!
//! Runs once after the flag interpreter. If the resolved `Content-Type` names
//! `multipart/form-data`, or the request already is form-data with a raw body
//! that looks multipart, the body is decomposed into named form fields and
//! dropped. When nothing can be extracted the request is left untouched, so a
//! caller seeing `BodyKind::FormData` with a raw body still present knows the
//! decomposition failed.

use crate::{BodyKind, FormValue, ParsedRequest};
use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static BOUNDARY_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)boundary=([^;]+)").expect("valid regex"));
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="([^"]+)""#).expect("valid regex"));
static FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="([^"]+)""#).expect("valid regex"));
static GENERIC_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[A-Za-z0-9-]+").expect("valid regex"));

/// Classifies the body and, for multipart content, replaces the raw body with
/// the form fields extracted from it. No-op whenever the body does not look
/// multipart or no field can be recovered.
pub(crate) fn decompose(request: &mut ParsedRequest) {
    let mut boundary: Option<String> = None;
    if let Some(content_type) = header_value(&request.headers, "content-type") {
        if content_type.to_ascii_lowercase().contains("multipart/form-data") {
            request.body_kind = BodyKind::FormData;
            boundary = boundary_from_header(content_type).map(str::to_string);
        }
    }

    if request.body_kind != BodyKind::FormData {
        return;
    }
    let Some(body) = request.body.as_deref() else {
        return;
    };
    if boundary.is_none() && !body.contains("Content-Disposition: form-data") {
        return;
    }

    let boundary = boundary.or_else(|| boundary_from_body(body).map(str::to_string));
    if boundary.is_none() && !body.contains("--") {
        return;
    }

    let fields = extract_fields(body, boundary.as_deref());
    if !fields.is_empty() {
        request.form_fields.extend(fields);
        request.body = None;
    }
}

fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// First boundary tier: the `boundary=` parameter of the `Content-Type`
/// value. The parameter name matches case-insensitively but the boundary
/// token's own case is preserved, since the body is split on it verbatim.
fn boundary_from_header(content_type: &str) -> Option<&str> {
    BOUNDARY_PARAM
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Second tier: infer the boundary from the body's own leading `--token`
/// line, up to the first CRLF.
fn boundary_from_body(body: &str) -> Option<&str> {
    let rest = body.strip_prefix("--")?;
    let end = rest.find("\r\n")?;
    Some(&rest[..end])
}

/// Splits the body into parts and parses each. With no known boundary the
/// third tier splits on anything shaped like a boundary line.
fn extract_fields(body: &str, boundary: Option<&str>) -> Vec<(String, FormValue)> {
    let parts: Vec<&str> = match boundary {
        Some(boundary) => body.split(format!("--{boundary}").as_str()).collect(),
        None => GENERIC_BOUNDARY.split(body).collect(),
    };

    let mut fields = Vec::new();
    for part in parts {
        let trimmed = part.trim();
        if trimmed.is_empty() || trimmed == "--" {
            continue;
        }
        if let Some(field) = parse_part(part) {
            fields.push(field);
        }
    }
    fields
}

/// A part without a `name="..."` disposition is not a field. A `filename`
/// makes it an inline file whose content the command cannot carry; anything
/// else takes the text after the first blank line as its value, minus one
/// trailing CRLF.
fn parse_part(part: &str) -> Option<(String, FormValue)> {
    let name = FIELD_NAME.captures(part)?.get(1)?.as_str().to_string();

    if let Some(filename) = FILE_NAME.captures(part).and_then(|caps| caps.get(1)) {
        let field = FormValue::File {
            filename: filename.as_str().to_string(),
            content: String::new(),
        };
        return Some((name, field));
    }

    let header_end = part.find("\r\n\r\n")?;
    let value = &part[header_end + 4..];
    let value = value.strip_suffix("\r\n").unwrap_or(value);
    Some((name, FormValue::Text(value.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_data_request(content_type: Option<&str>, body: &str) -> ParsedRequest {
        let mut request = ParsedRequest {
            body: Some(body.to_string()),
            ..Default::default()
        };
        if let Some(content_type) = content_type {
            request
                .headers
                .insert("Content-Type".to_string(), content_type.to_string());
        } else {
            request.body_kind = BodyKind::FormData;
        }
        request
    }

    #[test]
    fn splits_on_header_boundary() {
        let body = "--XYZ\r\nContent-Disposition: form-data; name=\"field1\"\r\n\r\nhello\r\n--XYZ--\r\n";
        let mut request =
            form_data_request(Some("multipart/form-data; boundary=XYZ"), body);
        decompose(&mut request);
        assert_eq!(request.body_kind, BodyKind::FormData);
        assert_eq!(request.body, None);
        assert_eq!(
            request.form_fields.get("field1"),
            Some(&FormValue::Text("hello".to_string()))
        );
    }

    #[test]
    fn boundary_parameter_matches_case_insensitively() {
        let body = "--MiXeD\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--MiXeD--\r\n";
        let mut request =
            form_data_request(Some("Multipart/Form-Data; BOUNDARY=MiXeD"), body);
        decompose(&mut request);
        assert_eq!(request.body, None);
        assert_eq!(
            request.form_fields.get("a"),
            Some(&FormValue::Text("1".to_string()))
        );
    }

    #[test]
    fn boundary_inferred_from_body_when_header_lacks_it() {
        let body = "--inferred123\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nv\r\n--inferred123--\r\n";
        let mut request = form_data_request(Some("multipart/form-data"), body);
        decompose(&mut request);
        assert_eq!(request.body, None);
        assert_eq!(
            request.form_fields.get("a"),
            Some(&FormValue::Text("v".to_string()))
        );
    }

    #[test]
    fn generic_split_when_no_boundary_is_known() {
        // no content-type header, body_kind already form-data, body does not
        // start with the boundary line
        let body = "preamble\r\n--gen-42\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nv\r\n--gen-42--\r\n";
        let mut request = form_data_request(None, body);
        decompose(&mut request);
        assert_eq!(request.body, None);
        assert_eq!(
            request.form_fields.get("a"),
            Some(&FormValue::Text("v".to_string()))
        );
    }

    #[test]
    fn file_parts_become_inline_files_with_empty_content() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nBYTES\r\n--B--\r\n";
        let mut request = form_data_request(Some("multipart/form-data; boundary=B"), body);
        decompose(&mut request);
        assert_eq!(
            request.form_fields.get("upload"),
            Some(&FormValue::File {
                filename: "a.png".to_string(),
                content: String::new(),
            })
        );
    }

    #[test]
    fn undecomposable_body_is_left_untouched() {
        let body = "--B\r\nno disposition here\r\n\r\nvalue\r\n--B--\r\n";
        let mut request = form_data_request(Some("multipart/form-data; boundary=B"), body);
        decompose(&mut request);
        // observable "could not decompose": form-data kind with the raw body kept
        assert_eq!(request.body_kind, BodyKind::FormData);
        assert_eq!(request.body.as_deref(), Some(body));
        assert!(request.form_fields.is_empty());
    }

    #[test]
    fn non_multipart_content_type_is_ignored() {
        let mut request =
            form_data_request(Some("application/json"), r#"{"a":1}"#);
        decompose(&mut request);
        assert_eq!(request.body_kind, BodyKind::Json);
        assert_eq!(request.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn form_data_kind_without_multipart_body_is_untouched() {
        let mut request = form_data_request(None, "a=1&b=2");
        decompose(&mut request);
        assert_eq!(request.body.as_deref(), Some("a=1&b=2"));
        assert!(request.form_fields.is_empty());
    }

    #[test]
    fn part_value_keeps_internal_crlf() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nline1\r\nline2\r\n--B--\r\n";
        let mut request = form_data_request(Some("multipart/form-data; boundary=B"), body);
        decompose(&mut request);
        assert_eq!(
            request.form_fields.get("a"),
            Some(&FormValue::Text("line1\r\nline2".to_string()))
        );
    }
}
