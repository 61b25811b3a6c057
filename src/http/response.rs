use crate::error::ServerError;
use serde::Serialize;
use std::collections::HashMap;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl Default for Response {
    fn default() -> Self {
        Response::new(200)
    }
}

impl Response {
    pub fn new(status: u16) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    // Chainable status setter
    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn body<T: AsRef<[u8]>>(&mut self, body: T) -> &mut Self {
        self.body = body.as_ref().to_vec();
        self
    }

    /// Sets a header, replacing any existing header whose name differs only
    /// in case.
    pub fn header<K: AsRef<str>, V: AsRef<str>>(&mut self, name: K, value: V) -> &mut Self {
        let name = name.as_ref();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.as_ref().to_string());
        self
    }

    pub fn headers(&mut self, headers: HashMap<String, String>) -> &mut Self {
        for (name, value) in headers {
            self.header(name, value);
        }
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, ServerError> {
        let json = serde_json::to_vec(value)?;
        self.header("Content-Type", "application/json");
        self.body(json);
        Ok(self)
    }

    pub fn text<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response
            .header("Content-Type", "text/plain")
            .body(content.as_ref());
        response
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn error(err: &ServerError) -> Response {
        let status = err.status_code();
        let mut response = Response::new(status);
        let payload = serde_json::json!({
            "error": {
                "message": err.to_string(),
                "status": status
            }
        });
        if response.json(&payload).is_err() {
            response.header("Content-Type", "text/plain").body(err.to_string());
        }
        response
    }

    /// Serializes the response as an HTTP/1.1 message that closes the connection.
    pub fn to_http_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("connection") {
                continue;
            }
            head += &format!("{}: {}\r\n", name, value);
        }
        if self.get_header("Date").is_none() {
            head += &format!("Date: {}\r\n", httpdate::fmt_http_date(SystemTime::now()));
        }
        head += &format!("Content-Length: {}\r\nConnection: close\r\n\r\n", self.body.len());

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

pub(crate) fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_serialization() {
        let mut response = Response::text("hi");
        response.header("X-Trace", "1");
        let raw = String::from_utf8(response.to_http_bytes()).unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.contains("X-Trace: 1\r\n"));
        assert!(raw.contains("Date: "));
        assert!(raw.contains("Content-Length: 2\r\n"));
        assert!(raw.contains("Connection: close\r\n"));
        assert!(raw.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let mut response = Response::new(200);
        response.header("content-type", "text/html").header("Content-Type", "text/plain");
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.get_header("CONTENT-TYPE"), Some("text/plain"));

        let raw = String::from_utf8(response.to_http_bytes()).unwrap();
        assert_eq!(raw.to_ascii_lowercase().matches("content-type:").count(), 1);
    }

    #[test]
    fn test_error_response_is_json() {
        let response = Response::error(&ServerError::BadRequest("missing path".into()));
        assert_eq!(response.status, 400);
        assert_eq!(response.get_header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["error"]["status"], 400);
        assert_eq!(body["error"]["message"], "Bad request: missing path");
    }
}
