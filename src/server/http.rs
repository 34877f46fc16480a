//! Minimal HTTP/1.1 framing for a single request per connection.
//!
//! read head (bounded) -> parse request line + headers -> read the rest of
//! the body by `Content-Length` -> dispatch -> one response -> close.
//! No keep-alive, no pipelining, no chunked bodies.

use std::collections::HashMap;
use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const MAX_HEAD_BYTES: usize = 64 * 1024;
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 4096;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const CSS_CONTENT_TYPE: &str = "text/css; charset=utf-8";
pub const JS_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed before the request was complete")]
    Incomplete,

    #[error("request head exceeds the size limit")]
    HeadTooLarge,

    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("invalid Content-Length: {0}")]
    InvalidContentLength(String),

    #[error("declared body of {0} bytes exceeds the size limit")]
    BodyTooLarge(usize),
}

impl RequestError {
    /// Response to send for this failure, or `None` to close silently.
    pub fn response(&self) -> Option<Response> {
        match self {
            Self::Io(_) | Self::Incomplete | Self::HeadTooLarge => None,
            Self::MalformedRequestLine => Some(Response::json_message(400, "Invalid request")),
            Self::InvalidContentLength(_) => {
                Some(Response::json_message(400, "Invalid Content-Length"))
            }
            Self::BodyTooLarge(_) => Some(Response::json_message(413, "Payload too large")),
        }
    }
}

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Normalized path (see `normalize_path`).
    pub path: String,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Media type without parameters, case preserved; empty when absent.
    pub fn media_type(&self) -> &str {
        self.header("content-type")
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .unwrap_or_default()
    }
}

/// Drop query and fragment, trim trailing slashes (root excepted).
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(|c: char| c == '?' || c == '#').unwrap_or(raw.len());
    let trimmed = raw[..end].trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|p| from + p)
}

/// Read until the blank line ending the head. Returns (head, buffered body).
pub async fn read_head<R>(reader: &mut R) -> Result<(Vec<u8>, Vec<u8>), RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(RequestError::Incomplete);
        }
        let scan_from = buf.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = find_terminator(&buf, scan_from) {
            if pos > MAX_HEAD_BYTES {
                return Err(RequestError::HeadTooLarge);
            }
            let body = buf.split_off(pos + HEAD_TERMINATOR.len());
            buf.truncate(pos);
            return Ok((buf, body));
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(RequestError::HeadTooLarge);
        }
    }
}

/// Parsed request line and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
}

pub fn parse_head(head: &[u8]) -> Result<RequestHead, RequestError> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(RequestError::MalformedRequestLine);
    };

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    Ok(RequestHead {
        method: method.to_ascii_uppercase(),
        path: normalize_path(target),
        headers,
    })
}

/// Read one full request: head, then body up to `Content-Length`.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, RequestError>
where
    R: AsyncRead + Unpin,
{
    let (head, mut body) = read_head(reader).await?;
    let head = parse_head(&head)?;

    if let Some(raw) = head.headers.get("content-length") {
        let length: usize = raw
            .trim()
            .parse()
            .map_err(|_| RequestError::InvalidContentLength(raw.clone()))?;
        if length > MAX_BODY_BYTES {
            return Err(RequestError::BodyTooLarge(length));
        }
        if body.len() < length {
            let already = body.len();
            body.resize(length, 0);
            reader.read_exact(&mut body[already..]).await.map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    RequestError::Incomplete
                } else {
                    RequestError::Io(e)
                }
            })?;
        } else {
            body.truncate(length);
        }
    }

    Ok(Request {
        method: head.method,
        path: head.path,
        headers: head.headers,
        body,
    })
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, JSON_CONTENT_TYPE, body)
    }

    /// `{"message": ...}` body.
    pub fn json_message(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "message": message }).to_string();
        Self::json(status, body)
    }

    /// Status line, headers and body, ready to write.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len()
        );
        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
