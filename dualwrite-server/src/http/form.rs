//! Strict `application/x-www-form-urlencoded` decoding
//!
//! Unlike lenient decoders, a bad `%` escape, a `;` separator, or decoded
//! bytes that are not UTF-8 are errors rather than being passed through.
//! A `Content-Type` that is not a well-formed media type is an error too,
//! whatever type it names.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use thiserror::Error;

/// Largest form body read before giving up.
pub const MAX_FORM_BYTES: usize = 10 << 20;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Form decoding failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid semicolon separator in query")]
    Semicolon,

    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    #[error("form value is not valid UTF-8")]
    InvalidUtf8,

    #[error("failed to read form body: {0}")]
    Body(String),

    #[error("invalid media type {0:?}")]
    InvalidMediaType(String),
}

/// Decoded key/value pairs in input order.
///
/// Repeated keys are kept; lookups return the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pairs: Vec<(String, String)>,
}

impl FormValues {
    /// Decode a URL-encoded byte string.
    ///
    /// Empty segments (`a=1&&b=2`) are skipped; a segment without `=` has an
    /// empty value. The first error wins but the whole input is still scanned.
    pub fn parse(input: &[u8]) -> Result<Self, FormError> {
        let mut pairs = Vec::new();
        let mut first_err = None;

        for segment in input.split(|&b| b == b'&') {
            if segment.contains(&b';') {
                first_err.get_or_insert(FormError::Semicolon);
                continue;
            }
            if segment.is_empty() {
                continue;
            }

            let (raw_key, raw_value) = match segment.iter().position(|&b| b == b'=') {
                Some(idx) => (&segment[..idx], &segment[idx + 1..]),
                None => (segment, &segment[segment.len()..]),
            };

            match (unescape(raw_key), unescape(raw_value)) {
                (Ok(key), Ok(value)) => pairs.push((key, value)),
                (Err(e), _) | (_, Err(e)) => {
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(Self { pairs }),
        }
    }

    /// First value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, or the empty string.
    pub fn value(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_owned()
    }

    /// Append `fallback`'s pairs after these, so ours win on lookup.
    pub fn with_fallback(mut self, fallback: FormValues) -> Self {
        self.pairs.extend(fallback.pairs);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Read the form carried by a request.
///
/// Query-string pairs are always decoded. The body is decoded only for a
/// URL-encoded content type and its pairs take precedence over the query.
/// Any other well-formed content type leaves the body unread.
pub async fn read_form(parts: &Parts, body: Body) -> Result<FormValues, FormError> {
    let content_type = content_type(parts)?;
    let query = FormValues::parse(parts.uri.query().unwrap_or_default().as_bytes());

    if content_type.as_deref() != Some(FORM_URLENCODED) {
        return query;
    }

    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| FormError::Body(e.to_string()))?;
    let posted = FormValues::parse(&bytes)?;

    Ok(posted.with_fallback(query?))
}

/// Lowercased media type of the request, `None` when the header is absent
/// or empty.
fn content_type(parts: &Parts) -> Result<Option<String>, FormError> {
    let Some(header) = parts.headers.get(CONTENT_TYPE) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| {
        FormError::InvalidMediaType(String::from_utf8_lossy(header.as_bytes()).into_owned())
    })?;
    if value.is_empty() {
        return Ok(None);
    }
    parse_media_type(value).map(Some)
}

/// Validate `type/subtype; name=value; ...` and return the lowercased
/// `type/subtype`.
///
/// Parameter values may be tokens or quoted strings. A trailing `;` is
/// allowed; a parameter without `=value` or a repeated parameter name is not.
fn parse_media_type(value: &str) -> Result<String, FormError> {
    let invalid = || FormError::InvalidMediaType(value.to_owned());

    let split = value.find(';').unwrap_or(value.len());
    let essence = value[..split].trim().to_ascii_lowercase();

    let (kind, rest) = split_token(&essence);
    if kind.is_empty() {
        return Err(invalid());
    }
    if !rest.is_empty() {
        let subtype = rest.strip_prefix('/').ok_or_else(invalid)?;
        let (subtype, rest) = split_token(subtype);
        if subtype.is_empty() || !rest.is_empty() {
            return Err(invalid());
        }
    }

    let mut seen: Vec<String> = Vec::new();
    let mut params = &value[split..];
    loop {
        params = params.trim_start();
        if params.is_empty() {
            break;
        }
        match consume_param(params) {
            Some((name, rest)) => {
                if seen.contains(&name) {
                    return Err(invalid());
                }
                seen.push(name);
                params = rest;
            }
            None if params.trim() == ";" => break,
            None => return Err(invalid()),
        }
    }

    Ok(essence)
}

/// `; name = value`, returning the lowercased name and the remaining input.
fn consume_param(input: &str) -> Option<(String, &str)> {
    let rest = input.trim_start().strip_prefix(';')?.trim_start();
    let (name, rest) = split_token(rest);
    if name.is_empty() {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    Some((name.to_ascii_lowercase(), skip_param_value(rest)?))
}

fn skip_param_value(input: &str) -> Option<&str> {
    let Some(quoted) = input.strip_prefix('"') else {
        let (token, rest) = split_token(input);
        return (!token.is_empty()).then_some(rest);
    };

    let mut escaped = false;
    for (i, c) in quoted.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(&quoted[i + 1..]),
            '\r' | '\n' => return None,
            _ => {}
        }
    }
    None
}

fn split_token(input: &str) -> (&str, &str) {
    let end = input.find(|c: char| !is_token_char(c)).unwrap_or(input.len());
    input.split_at(end)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?=".contains(c)
}

/// Decode `+` and `%XX` escapes.
fn unescape(raw: &[u8]) -> Result<String, FormError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        match raw[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let escape = raw.get(i + 1..i + 3).unwrap_or(&raw[i + 1..]);
                match (escape.first().and_then(hex_val), escape.get(1).and_then(hex_val)) {
                    (Some(hi), Some(lo)) if escape.len() == 2 => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        let shown = &raw[i..raw.len().min(i + 3)];
                        return Err(FormError::InvalidEscape(
                            String::from_utf8_lossy(shown).into_owned(),
                        ));
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|_| FormError::InvalidUtf8)
}

fn hex_val(b: &u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
