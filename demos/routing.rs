//! Routing example
//!
//! This example demonstrates:
//! - Static routes
//! - Named parameters (`:name`) and catch-alls (`*filepath`)
//! - Query and JSON bodies
//! - Nested route groups

use serde::{Deserialize, Serialize};
use waymark::{json, Engine, ServerConfig};

#[derive(Serialize, Deserialize)]
struct User {
    name: String,
    role: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    waymark::logging::init(&config.log_filter)?;

    let mut engine = Engine::with_config(config);

    engine.get("/", |c| c.html(200, "<h1>Welcome</h1>"))?;

    engine.get("/p/:lang/doc", |c| {
        let lang = c.param("lang").unwrap_or_default().to_string();
        c.string(200, format!("docs for {lang}\n"));
    })?;

    engine.get("/assets/*filepath", |c| {
        let filepath = c.param("filepath").unwrap_or_default().to_string();
        c.json(200, &json!({ "filepath": filepath }));
    })?;

    engine.get("/search", |c| {
        let q = c.query("q").unwrap_or_default().to_string();
        c.json(200, &json!({ "query": q }));
    })?;

    engine.post("/users", |c| match c.body_json::<User>() {
        Some(user) => c.json(201, &user),
        None => c.fail(400, "invalid JSON body"),
    })?;

    let mut v1 = engine.group("/v1");
    v1.get("/status", |c| {
        c.json(200, &json!({ "status": "operational", "version": "1.0.0" }));
    })?;

    let mut users = v1.group("/users");
    users.get("/:id", |c| {
        let id = c.param("id").unwrap_or_default().to_string();
        c.string(200, format!("User ID: {id}\n"));
    })?;

    engine.listen("127.0.0.1:9999")?;
    Ok(())
}
