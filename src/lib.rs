//! # Waymark
//!
//! A small HTTP request router built around a per-method segment trie.
//!
//! ## Features
//!
//! - Static segments, named parameters (`/p/:lang/doc`) and trailing
//!   catch-alls (`/static/*filepath`)
//! - Route groups with a shared prefix and their own middleware
//! - A cooperative middleware chain: call `next()` to continue, return to stop
//! - A minimal tokio-based HTTP/1.1 host to serve an engine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waymark::app::Engine;
//! use waymark::middleware::{logger, recovery};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new();
//!     engine.middleware(logger()).middleware(recovery());
//!
//!     engine.get("/", |c| c.html(200, "<h1>Hello</h1>"))?;
//!
//!     let mut v1 = engine.group("/v1");
//!     v1.get("/hello/:name", |c| {
//!         let name = c.param("name").unwrap_or_default().to_string();
//!         c.string(200, format!("hello {name}\n"));
//!     })?;
//!
//!     engine.listen("127.0.0.1:9999")?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod group;
pub mod handler;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod router;
mod server;
pub extern crate serde_json;

pub use app::Engine;
pub use config::{ConflictPolicy, ServerConfig};
pub use context::Context;
pub use error::{RouteError, ServerError, ServerResult};
pub use group::{GroupId, RouteGroup};
pub use handler::{Handler, HandlerFunc};
pub use http::{Body, Method, Request, Response};
pub use serde_json::{json, Value};
