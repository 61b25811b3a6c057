//! The engine owns the router and every route group, and turns a parsed
//! request into a response.
//!
//! # Examples
//!
//! ```rust
//! use waymark::app::Engine;
//! use waymark::http::{Method, Request};
//!
//! let mut engine = Engine::new();
//! engine
//!     .get("/hello/:name", |c| {
//!         let name = c.param("name").unwrap_or_default().to_string();
//!         c.string(200, format!("hello {name}"));
//!     })
//!     .unwrap();
//!
//! let response = engine.handle(Request::new(Method::GET, "/hello/ada"));
//! assert_eq!(response.body_string(), "hello ada");
//! ```

use crate::config::{ConflictPolicy, ServerConfig};
use crate::context::Context;
use crate::error::RouteError;
use crate::group::{Group, GroupId, RouteGroup};
use crate::handler::{self, Handler, HandlerFunc};
use crate::http::{Method, Request, Response};
use crate::router::Router;
use std::sync::Arc;

/// Top-level dispatcher.
///
/// Routes and middleware are registered through `&mut Engine` before
/// serving; [`Engine::handle`] only needs `&Engine`, so a registered engine
/// can be shared across workers behind an `Arc` without locking.
pub struct Engine {
    pub(crate) router: Router,
    pub(crate) groups: Vec<Group>,
    pub(crate) config: ServerConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the default configuration and an empty root group.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            router: Router::with_policy(config.conflict_policy),
            groups: vec![Group::root()],
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn max_connections(&mut self, max_connections: usize) -> &mut Self {
        self.config.max_connections = max_connections;
        self
    }

    pub fn max_body_bytes(&mut self, max_body_bytes: usize) -> &mut Self {
        self.config.max_body_bytes = max_body_bytes;
        self
    }

    pub fn max_header_bytes(&mut self, max_header_bytes: usize) -> &mut Self {
        self.config.max_header_bytes = max_header_bytes;
        self
    }

    /// Only affects routes registered after the call.
    pub fn conflict_policy(&mut self, policy: ConflictPolicy) -> &mut Self {
        self.config.conflict_policy = policy;
        self.router.set_policy(policy);
        self
    }

    /// Handle onto the root group.
    pub fn root(&mut self) -> RouteGroup<'_> {
        RouteGroup {
            engine: self,
            id: GroupId::ROOT,
        }
    }

    /// Creates a top-level group with the given prefix.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        let id = self.new_group(GroupId::ROOT, prefix);
        RouteGroup { engine: self, id }
    }

    /// Reopens a group created earlier.
    pub fn group_at(&mut self, id: GroupId) -> Option<RouteGroup<'_>> {
        if id.0 < self.groups.len() {
            Some(RouteGroup { engine: self, id })
        } else {
            None
        }
    }

    /// Adds a middleware to the root group, which applies to every request.
    pub fn middleware<H: Handler>(&mut self, middleware: H) -> &mut Self {
        self.add_middleware(GroupId::ROOT, Arc::new(middleware));
        self
    }

    /// Registers a route on the root group.
    ///
    /// # Arguments
    /// * `method` - HTTP method the route answers
    /// * `pattern` - Route pattern, e.g. `/p/:lang/doc` or `/static/*filepath`
    /// * `handler` - The route handler
    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.register(GroupId::ROOT, method, pattern, Arc::new(handler))?;
        Ok(self)
    }

    /// Registers a GET route handler
    pub fn get<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::GET, pattern, handler)
    }

    /// Registers a POST route handler
    pub fn post<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::POST, pattern, handler)
    }

    /// Registers a PUT route handler
    pub fn put<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::PUT, pattern, handler)
    }

    /// Registers a PATCH route handler
    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::PATCH, pattern, handler)
    }

    /// Registers a DELETE route handler
    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::DELETE, pattern, handler)
    }

    /// Registers a HEAD route handler
    pub fn head<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::HEAD, pattern, handler)
    }

    /// Registers an OPTIONS route handler
    pub fn options<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::OPTIONS, pattern, handler)
    }

    pub(crate) fn new_group(&mut self, parent: GroupId, prefix: &str) -> GroupId {
        let prefix = format!("{}{}", self.groups[parent.0].prefix, prefix);
        tracing::debug!(prefix = %prefix, parent = parent.0, "group created");
        self.groups.push(Group {
            prefix,
            middlewares: Vec::new(),
            parent: Some(parent),
        });
        GroupId(self.groups.len() - 1)
    }

    pub(crate) fn add_middleware(&mut self, group: GroupId, middleware: HandlerFunc) {
        self.groups[group.0].middlewares.push(middleware);
    }

    pub(crate) fn register(
        &mut self,
        group: GroupId,
        method: Method,
        comp: &str,
        handler: HandlerFunc,
    ) -> Result<(), RouteError> {
        let pattern = format!("{}{}", self.groups[group.0].prefix, comp);
        self.router.add_route(method, &pattern, handler)?;
        tracing::info!("Route {:>4} - {}", method, pattern);
        Ok(())
    }

    /// Middleware of every group whose prefix is a string prefix of `path`,
    /// in group creation order.
    fn collect_middlewares(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(&group.prefix))
            .flat_map(|group| group.middlewares.iter().cloned())
            .collect()
    }

    /// Runs the full chain for one request.
    ///
    /// Handler panics are not caught here; add [`crate::middleware::recovery`]
    /// to turn them into a 500 response.
    pub fn handle(&self, request: Request) -> Response {
        let mut c = Context::new(request);
        let method = c.method();

        let middlewares = self.collect_middlewares(c.path());
        tracing::trace!(path = %c.path(), count = middlewares.len(), "middleware collected");
        c.push_handlers(middlewares);

        let resolved = self
            .router
            .get_route(method, c.path())
            .map(|m| (m.pattern, m.params));
        let route_handler = match resolved {
            Some((pattern, params)) => {
                tracing::trace!(%method, pattern, "route resolved");
                c.set_params(params);
                match self.router.handler(method, pattern) {
                    Some(handler) => handler.clone(),
                    None => {
                        tracing::error!(%method, pattern, "matched pattern has no handler");
                        handler::not_found()
                    }
                }
            }
            None => {
                tracing::debug!(%method, path = %c.path(), "no route matched");
                handler::not_found()
            }
        };
        c.push_handlers([route_handler]);

        c.next();
        c.into_response()
    }
}
