//! Per-request state and the cooperative handler chain.
//!
//! A [`Context`] owns the request, the parameters bound by the router, the
//! ordered list of handlers for this request and a cursor into it. Handlers
//! receive `&mut Context`; calling [`Context::next`] runs the next handler
//! and returns once the rest of the chain has finished, so code after the
//! call runs as post-processing. A handler that returns without calling
//! `next` ends the chain.

use crate::handler::HandlerFunc;
use crate::http::{Method, Request, Response};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct Context {
    request: Request,
    params: HashMap<String, String>,
    handlers: Vec<HandlerFunc>,
    cursor: usize,
    aborted: bool,
    response: Response,
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            params: HashMap::new(),
            handlers: Vec::new(),
            cursor: 0,
            aborted: false,
            response: Response::new(200),
            values: HashMap::new(),
        }
    }

    pub(crate) fn push_handlers<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.handlers.extend(handlers);
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Runs the handler after the cursor, if any.
    ///
    /// The cursor only moves forward, so every handler runs at most once per
    /// request no matter how many times `next` is called.
    pub fn next(&mut self) {
        if let Some(handler) = self.handlers.get(self.cursor).cloned() {
            self.cursor += 1;
            handler.call(self);
        }
    }

    /// Writes a JSON error and skips every handler that has not run yet.
    pub fn fail(&mut self, status: u16, message: &str) {
        self.cursor = self.handlers.len();
        self.aborted = true;
        self.json(status, &serde_json::json!({ "message": message }));
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Number of handlers that have been started.
    pub fn handlers_run(&self) -> usize {
        self.cursor
    }

    pub fn method(&self) -> Method {
        self.request.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query.get(key).map(String::as_str)
    }

    pub fn post_form(&self, key: &str) -> Option<String> {
        self.request.body.form().remove(key)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.request.get_header(key)
    }

    pub fn body_json<T>(&self) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request.body.json()
    }

    // Per-request values shared between middleware and handlers.

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.values.insert(key.to_string(), value);
            }
            Err(err) => tracing::warn!(key, error = %err, "dropping unserializable context value"),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_typed<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    // Response writers.

    pub fn status(&mut self, status: u16) {
        self.response.status(status);
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.response.header(key, value);
    }

    pub fn string<T: AsRef<str>>(&mut self, status: u16, body: T) {
        self.set_header("Content-Type", "text/plain");
        self.status(status);
        self.response.body(body.as_ref());
    }

    pub fn json<T: Serialize>(&mut self, status: u16, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header("Content-Type", "application/json");
                self.status(status);
                self.response.body(body);
            }
            Err(err) => {
                tracing::error!(error = %err, path = %self.request.path, "failed to encode JSON response");
                self.string(500, err.to_string());
            }
        }
    }

    pub fn html<T: AsRef<str>>(&mut self, status: u16, html: T) {
        self.set_header("Content-Type", "text/html");
        self.status(status);
        self.response.body(html.as_ref());
    }

    pub fn data(&mut self, status: u16, data: &[u8]) {
        self.status(status);
        self.response.body(data);
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Body;
    use std::sync::{Arc, Mutex};

    type Trace = Arc<Mutex<Vec<String>>>;

    fn step(trace: &Trace, name: &'static str, call_next: bool) -> HandlerFunc {
        let trace = trace.clone();
        Arc::new(move |c: &mut Context| {
            trace.lock().unwrap().push(format!("{name}:before"));
            if call_next {
                c.next();
            }
            trace.lock().unwrap().push(format!("{name}:after"));
        })
    }

    fn context() -> Context {
        Context::new(Request::new(Method::GET, "/"))
    }

    #[test]
    fn test_next_wraps_downstream_handlers() {
        let trace = Trace::default();
        let mut c = context();
        c.push_handlers([step(&trace, "a", true), step(&trace, "b", true), step(&trace, "h", false)]);
        c.next();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["a:before", "b:before", "h:before", "h:after", "b:after", "a:after"]
        );
        assert_eq!(c.handlers_run(), 3);
    }

    #[test]
    fn test_handler_without_next_short_circuits() {
        let trace = Trace::default();
        let mut c = context();
        c.push_handlers([step(&trace, "a", false), step(&trace, "b", true), step(&trace, "h", false)]);
        c.next();

        assert_eq!(*trace.lock().unwrap(), vec!["a:before", "a:after"]);
        assert_eq!(c.handlers_run(), 1);
    }

    #[test]
    fn test_repeated_next_never_reruns() {
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let twice: HandlerFunc = Arc::new(|c: &mut Context| {
            c.next();
            c.next();
        });
        let handler: HandlerFunc = Arc::new(move |_c: &mut Context| {
            *counter.lock().unwrap() += 1;
        });

        let mut c = context();
        c.push_handlers([twice, handler]);
        c.next();
        c.next();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_fail_skips_remaining_handlers() {
        let trace = Trace::default();
        let guard: HandlerFunc = Arc::new(|c: &mut Context| {
            c.fail(401, "unauthorized");
            c.next();
        });

        let mut c = context();
        c.push_handlers([guard, step(&trace, "h", false)]);
        c.next();

        assert!(c.is_aborted());
        assert!(trace.lock().unwrap().is_empty());
        let response = c.into_response();
        assert_eq!(response.status, 401);
        assert_eq!(response.body_string(), r#"{"message":"unauthorized"}"#);
    }

    #[test]
    fn test_writers_set_content_type() {
        let mut c = context();
        c.string(201, "made");
        assert_eq!(c.response().status, 201);
        assert_eq!(c.response().get_header("Content-Type"), Some("text/plain"));

        c.html(200, "<b>hi</b>");
        assert_eq!(c.response().get_header("Content-Type"), Some("text/html"));
        assert_eq!(c.response().body_string(), "<b>hi</b>");

        c.json(200, &serde_json::json!({ "ok": true }));
        assert_eq!(c.response().get_header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_writer_replaces_lowercase_header() {
        let mut c = context();
        c.set_header("content-type", "application/xml");
        c.string(200, "plain");
        assert_eq!(c.response().headers.len(), 1);
        assert_eq!(c.response().get_header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_request_accessors() {
        let request = Request::from_target(Method::POST, "/login?next=%2Fhome")
            .with_header("Authorization", "Bearer t")
            .with_body(
                Body::from_string("user=ada&pass=x").with_content_type("application/x-www-form-urlencoded"),
            );
        let mut c = Context::new(request);
        c.set_params([("id".to_string(), "7".to_string())].into());
        c.set("user_id", 7);

        assert_eq!(c.method(), Method::POST);
        assert_eq!(c.path(), "/login");
        assert_eq!(c.query("next"), Some("/home"));
        assert_eq!(c.header("authorization"), Some("Bearer t"));
        assert_eq!(c.post_form("user").as_deref(), Some("ada"));
        assert_eq!(c.param("id"), Some("7"));
        assert_eq!(c.get_typed::<u32>("user_id"), Some(7));
        assert!(c.get("missing").is_none());
    }
}
