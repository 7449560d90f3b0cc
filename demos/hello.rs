//! The simplest possible weft application.
//!
//! ```bash
//! cargo run --example hello
//! ```
//!
//! - `GET /` — plain-text greeting
//! - `GET /users/{name}` — greets a path parameter

use weft::{Response, Scope, Server, ServerConfig};

async fn index() -> Response {
    Response::new(200).text("hello from weft")
}

async fn greet(path: weft::PathInfo) -> Response {
    let name = path.get("name").unwrap_or("stranger");
    Response::new(200).text(format!("hello, {name}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let router = Scope::root()
        .get("/", index)?
        .get("/users/{name}", greet)?
        .finish()?;

    let addr = "127.0.0.1:3000".parse()?;
    let server = Server::bind(addr, router, ServerConfig::new());

    tracing::info!("listening on {addr}");
    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
