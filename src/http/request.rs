use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ServerError;

/// HTTP methods the router keeps a trie for.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    pub fn from_string(s: &str) -> Option<Method> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "CONNECT" => Some(Method::CONNECT),
            "OPTIONS" => Some(Method::OPTIONS),
            "TRACE" => Some(Method::TRACE),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }
}

impl FromStr for Method {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::from_string(s).ok_or_else(|| ServerError::UnsupportedMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Body {
    pub(crate) content_type: String,
    pub(crate) data: Vec<u8>,
}

impl Body {
    pub fn new() -> Body {
        Body::default()
    }

    pub fn from_string(s: &str) -> Body {
        Body {
            content_type: "text/plain".to_string(),
            data: s.as_bytes().to_vec(),
        }
    }

    pub fn from_bytes(b: Vec<u8>) -> Body {
        Body {
            content_type: "application/octet-stream".to_string(),
            data: b,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Body {
        self.content_type = content_type.to_string();
        self
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn json<T>(&self) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if self.content_type.starts_with("application/json") {
            serde_json::from_slice(&self.data).ok()
        } else {
            None
        }
    }

    /// Decoded key/value pairs of an `application/x-www-form-urlencoded` body.
    pub fn form(&self) -> HashMap<String, String> {
        if self.content_type.starts_with("application/x-www-form-urlencoded") {
            parse_urlencoded(&String::from_utf8_lossy(&self.data))
        } else {
            HashMap::new()
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Body {
        Body::from_bytes(b)
    }
}

/// A request as handed over by the host HTTP layer.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Body,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Request {
        Request {
            method,
            path: path.to_string(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: Body::new(),
        }
    }

    /// Builds a request from a request target, splitting off the query string.
    ///
    /// The path is percent-decoded, so route parameters bind decoded text. A
    /// path that does not decode to UTF-8 is kept as sent.
    pub fn from_target(method: Method, target: &str) -> Request {
        let (raw_path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_urlencoded(query)),
            None => (target, HashMap::new()),
        };
        let path = match urlencoding::decode(raw_path) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => raw_path.to_string(),
        };
        let path = if path.is_empty() { "/" } else { path.as_str() };
        Request {
            query,
            ..Request::new(method, path)
        }
    }

    /// Header names are stored lowercased.
    pub fn with_header(mut self, key: &str, value: &str) -> Request {
        self.headers.insert(key.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Body) -> Request {
        self.body = body;
        self
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn get_method(&self) -> &Method {
        &self.method
    }
}

pub(crate) fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::GET);
        assert_eq!(Method::from_string("PATCH"), Some(Method::PATCH));
        assert!(Method::from_string("get").is_none());
        assert!("BREW".parse::<Method>().is_err());
        assert_eq!(Method::DELETE.to_string(), "DELETE");
    }

    #[test]
    fn test_from_target_splits_query() {
        let req = Request::from_target(Method::GET, "/search?q=rust+lang&page=2&empty");
        assert_eq!(req.path, "/search");
        assert_eq!(req.query.get("q").map(String::as_str), Some("rust lang"));
        assert_eq!(req.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(req.query.get("empty").map(String::as_str), Some(""));
    }

    #[test]
    fn test_from_target_decodes_path() {
        let req = Request::from_target(Method::GET, "/hello/ada%20lovelace?x=%2F");
        assert_eq!(req.path, "/hello/ada lovelace");
        assert_eq!(req.query.get("x").map(String::as_str), Some("/"));

        // `+` is only a space inside the query
        let req = Request::from_target(Method::GET, "/a+b");
        assert_eq!(req.path, "/a+b");

        // not valid UTF-8 once decoded
        let req = Request::from_target(Method::GET, "/bad/%FF");
        assert_eq!(req.path, "/bad/%FF");
    }

    #[test]
    fn test_form_body() {
        let body = Body::from_string("name=Ada%20Lovelace&lang=en")
            .with_content_type("application/x-www-form-urlencoded");
        let form = body.form();
        assert_eq!(form.get("name").map(String::as_str), Some("Ada Lovelace"));
        assert_eq!(form.get("lang").map(String::as_str), Some("en"));

        assert!(Body::from_string("a=b").form().is_empty());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = Request::new(Method::GET, "/").with_header("X-Token", "abc");
        assert_eq!(req.get_header("x-token"), Some("abc"));
        assert_eq!(req.get_header("X-TOKEN"), Some("abc"));
    }
}
