use crate::tokenizer::{strip_quote_pair, tokenize, unquote};
use crate::{error::*, multipart, BodyKind, FormValue, ParsedRequest};
use base64::{engine::general_purpose::STANDARD, Engine};
use http::Method;
use minijinja::Environment;
use serde::Serialize;
use snafu::{ensure, ResultExt};
use std::collections::HashMap;
use std::str::FromStr;

fn parse_input(input: &str) -> Result<ParsedRequest> {
    ensure!(
        input.trim().to_ascii_lowercase().starts_with("curl"),
        NotCurlCommandSnafu
    );

    let mut tokens = tokenize(input).into_iter();
    // token 0 is the program name
    tokens.next();

    let mut builder = RequestBuilder::default();
    while let Some(token) = tokens.next() {
        if token.starts_with("http://") || token.starts_with("https://") {
            builder.set_url(unquote(&token).into_owned());
            continue;
        }
        match token.as_str() {
            "-X" | "--request" => {
                let arg = next_arg(&mut tokens);
                builder.set_method(&arg);
            }
            "-H" | "--header" => {
                let arg = next_arg(&mut tokens);
                builder.add_header(&arg);
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" => {
                builder.set_body(next_arg(&mut tokens));
            }
            "-b" | "--cookie" => {
                let arg = next_arg(&mut tokens);
                builder.add_cookie(&arg);
            }
            "-F" | "--form" => {
                let arg = next_arg(&mut tokens);
                builder.add_form_field(&arg);
            }
            "-u" | "--user" => {
                let arg = next_arg(&mut tokens);
                builder.set_basic_auth(&arg);
            }
            flag if flag.starts_with('-') => {} // unrecognized flags are ignored
            _ => builder.set_positional_url(unquote(&token).into_owned()),
        }
    }
    Ok(builder.build())
}

/// Consumes the argument of a flag. A flag at the end of the command gets an
/// empty argument rather than an error.
fn next_arg(tokens: &mut std::vec::IntoIter<String>) -> String {
    tokens
        .next()
        .map(|token| unquote(&token).into_owned())
        .unwrap_or_default()
}

/// Accumulates flag effects during the single pass over the tokens. Partial
/// state stays private; [`RequestBuilder::build`] runs the multipart pass and
/// hands out the finished [`ParsedRequest`].
#[derive(Default)]
struct RequestBuilder {
    url: String,
    method: Method,
    headers: HashMap<String, String>,
    body: Option<String>,
    body_kind: BodyKind,
    form_fields: HashMap<String, FormValue>,
    authorization: Option<String>,
}

impl RequestBuilder {
    /// Scheme-prefixed tokens win unconditionally, so a stray positional word
    /// (multi-line pastes produce literal-newline tokens) cannot shadow the
    /// real URL.
    fn set_url(&mut self, url: String) {
        self.url = url;
    }

    fn set_positional_url(&mut self, url: String) {
        if self.url.is_empty() {
            self.url = url;
        }
    }

    fn set_method(&mut self, raw: &str) {
        // curl itself treats a missing method argument as GET; an argument
        // that is not a valid HTTP token leaves the method unchanged
        let raw = if raw.is_empty() { "GET" } else { raw };
        if let Ok(method) = Method::from_bytes(raw.to_ascii_uppercase().as_bytes()) {
            self.method = method;
        }
    }

    fn add_header(&mut self, raw: &str) {
        let Some((name, value)) = raw.split_once(':') else {
            return;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("authorization") {
            self.authorization = Some(value.to_string());
        } else {
            self.headers.insert(name.to_string(), value.to_string());
        }
    }

    fn set_body(&mut self, body: String) {
        self.body = Some(body);
        if self.method == Method::GET {
            self.method = Method::POST;
        }
    }

    fn add_cookie(&mut self, cookie: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case("cookie"))
        {
            Some((_, existing)) => {
                existing.push_str("; ");
                existing.push_str(cookie);
            }
            None => {
                self.headers.insert("Cookie".to_string(), cookie.to_string());
            }
        }
    }

    fn add_form_field(&mut self, raw: &str) {
        self.body_kind = BodyKind::FormData;
        if self.method == Method::GET {
            self.method = Method::POST;
        }
        let Some((name, value)) = raw.split_once('=') else {
            return;
        };
        let (name, value) = (name.trim(), value.trim());
        let field = if let Some(path) = value.strip_prefix(['@', '<']) {
            // quotes inside the form value survive the outer unquoting,
            // e.g. -F 'file=@"/tmp/a b.png"'
            FormValue::FilePath(strip_quote_pair(path).to_string())
        } else {
            FormValue::Text(value.to_string())
        };
        self.form_fields.insert(name.to_string(), field);
    }

    fn set_basic_auth(&mut self, credentials: &str) {
        self.authorization = Some(format!("Basic {}", STANDARD.encode(credentials)));
    }

    fn build(self) -> ParsedRequest {
        let mut request = ParsedRequest {
            url: self.url,
            method: self.method,
            headers: self.headers,
            body: self.body,
            body_kind: self.body_kind,
            form_fields: self.form_fields,
            authorization: self.authorization,
        };
        multipart::decompose(&mut request);
        request
    }
}

impl ParsedRequest {
    /// Renders `{{ placeholder }}` variables in the command with the given
    /// context, then parses it.
    pub fn load(input: &str, context: impl Serialize) -> Result<Self> {
        let env = Environment::new();
        let input = env.render_str(input, context).context(RenderSnafu)?;
        parse_input(&input)
    }
}

impl FromStr for ParsedRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_input(s)
    }
}

#[cfg(feature = "reqwest")]
impl TryFrom<&ParsedRequest> for reqwest::RequestBuilder {
    type Error = reqwest::Error;

    /// Builds (but does not send) a request. Plain-text and inline-file form
    /// fields become multipart parts; [`FormValue::FilePath`] references are
    /// skipped since this crate performs no file I/O.
    fn try_from(req: &ParsedRequest) -> Result<Self, Self::Error> {
        let client = reqwest::Client::builder().build()?;

        // curl defaults to HTTP when the scheme is missing
        let url = if req.url.contains("://") {
            req.url.clone()
        } else {
            format!("http://{}", req.url)
        };

        let mut builder = client.request(req.method.clone(), url);
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if let Some(authorization) = &req.authorization {
            builder = builder.header("Authorization", authorization);
        }

        match req.body_kind {
            BodyKind::FormData if !req.form_fields.is_empty() => {
                let mut form = reqwest::multipart::Form::new();
                for (name, field) in &req.form_fields {
                    form = match field {
                        FormValue::Text(value) => form.text(name.clone(), value.clone()),
                        FormValue::File { filename, content } => form.part(
                            name.clone(),
                            reqwest::multipart::Part::text(content.clone())
                                .file_name(filename.clone()),
                        ),
                        FormValue::FilePath(_) => form,
                    };
                }
                builder = builder.multipart(form);
            }
            _ => {
                if let Some(body) = &req.body {
                    builder = builder.body(body.clone());
                }
            }
        }
        Ok(builder)
    }
}
