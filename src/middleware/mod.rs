//! Built-in middleware.
//!
//! Middleware are plain [`Handler`]s registered on a group. Each one decides
//! whether the chain continues by calling [`Context::next`].

mod security;

pub use security::{Cors, CorsConfig, SecurityConfig, SecurityHeaders};

use crate::context::Context;
use crate::error::panic_message;
use crate::handler::Handler;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Logs method, path, status and latency of every request it wraps.
pub fn logger() -> impl Handler {
    |c: &mut Context| {
        let start = Instant::now();
        c.next();
        tracing::info!(
            method = %c.method(),
            path = %c.path(),
            status = c.response().status,
            elapsed_us = start.elapsed().as_micros() as u64,
            "request served"
        );
    }
}

/// Turns a panic anywhere further down the chain into a 500 response.
pub fn recovery() -> impl Handler {
    |c: &mut Context| {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| c.next())) {
            let message = panic_message(payload.as_ref());
            tracing::error!(path = %c.path(), panic = %message, "handler panicked");
            c.string(500, "Internal Server Error");
        }
    }
}
