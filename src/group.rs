//! Route groups: a path prefix plus the middleware that applies under it.
//!
//! Groups live in a flat list owned by the [`Engine`]. A [`RouteGroup`] is a
//! borrowed handle onto one entry of that list, so nested groups never hold
//! references to each other; the parent is recorded as a [`GroupId`].

use crate::app::Engine;
use crate::context::Context;
use crate::error::RouteError;
use crate::handler::{Handler, HandlerFunc};
use crate::http::Method;
use std::sync::Arc;

/// Index of a group in the engine's group list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// The top-level group every engine starts with. Its prefix is empty.
    pub const ROOT: GroupId = GroupId(0);
}

pub(crate) struct Group {
    pub(crate) prefix: String,
    pub(crate) middlewares: Vec<HandlerFunc>,
    pub(crate) parent: Option<GroupId>,
}

impl Group {
    pub(crate) fn root() -> Self {
        Self {
            prefix: String::new(),
            middlewares: Vec::new(),
            parent: None,
        }
    }
}

pub struct RouteGroup<'e> {
    pub(crate) engine: &'e mut Engine,
    pub(crate) id: GroupId,
}

impl<'e> RouteGroup<'e> {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.id.0].prefix
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.engine.groups[self.id.0].parent
    }

    /// Creates a nested group whose prefix is this group's prefix followed
    /// by `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        let id = self.engine.new_group(self.id, prefix);
        RouteGroup {
            engine: &mut *self.engine,
            id,
        }
    }

    /// Appends a middleware. It runs for every request whose path starts
    /// with this group's prefix.
    pub fn middleware<H: Handler>(&mut self, middleware: H) -> &mut Self {
        self.engine.add_middleware(self.id, Arc::new(middleware));
        self
    }

    pub fn middlewares<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        for middleware in middlewares {
            self.engine.add_middleware(self.id, middleware);
        }
        self
    }

    /// Registers a route under this group's prefix.
    ///
    /// # Arguments
    /// * `method` - HTTP method the route answers
    /// * `comp` - Pattern relative to the group prefix, e.g. `/users/:id`
    /// * `handler` - The route handler
    pub fn add_route<F>(&mut self, method: Method, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.engine.register(self.id, method, comp, Arc::new(handler))?;
        Ok(self)
    }

    pub fn get<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::GET, comp, handler)
    }

    pub fn post<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::POST, comp, handler)
    }

    pub fn put<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::PUT, comp, handler)
    }

    pub fn patch<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::PATCH, comp, handler)
    }

    pub fn delete<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::DELETE, comp, handler)
    }

    pub fn head<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::HEAD, comp, handler)
    }

    pub fn options<F>(&mut self, comp: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::OPTIONS, comp, handler)
    }
}
