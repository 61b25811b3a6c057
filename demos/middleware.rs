//! Middleware example
//!
//! This example demonstrates how to write and scope middleware for:
//! - Logging requests (global)
//! - Authentication (only under `/admin`)
//! - Security headers and panic recovery

use std::time::Instant;

use waymark::middleware::{logger, recovery, SecurityConfig, SecurityHeaders};
use waymark::{Context, Engine};

// Runs before and after everything below it in the chain.
fn timing(c: &mut Context) {
    let start = Instant::now();
    c.next();
    let elapsed = format!("{}us", start.elapsed().as_micros());
    c.set_header("X-Response-Time", &elapsed);
}

// Stops the chain unless a bearer token is present.
fn auth(c: &mut Context) {
    let authorized = c
        .header("authorization")
        .is_some_and(|token| token.starts_with("Bearer "));
    if authorized {
        c.next();
    } else {
        c.fail(401, "authentication required");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    waymark::logging::init("waymark=debug")?;

    let mut engine = Engine::new();
    engine
        .middleware(logger())
        .middleware(recovery())
        .middleware(timing)
        .middleware(SecurityHeaders::new(SecurityConfig::default()));

    engine.get("/public", |c| c.string(200, "This is a public endpoint\n"))?;
    engine.get("/panic", |_c| panic!("something went wrong"))?;

    let mut admin = engine.group("/admin");
    admin.middleware(auth);
    admin.get("/profile", |c| {
        c.json(200, &waymark::json!({ "name": "User", "email": "user@example.com" }));
    })?;

    engine.listen("127.0.0.1:9999")?;
    Ok(())
}
