//! A minimal "Hello, World!" server.
//!
//! Run with `cargo run --example hello_world`, then
//! `curl http://127.0.0.1:9999/`.

use waymark::Engine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    waymark::logging::init("waymark=info")?;

    let mut engine = Engine::new();
    engine.get("/", |c| c.string(200, "Hello, World!\n"))?;

    engine.listen("127.0.0.1:9999")?;
    Ok(())
}
