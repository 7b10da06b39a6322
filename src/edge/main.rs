/**
 * Trivia Edge Entry Point
 *
 * Starts the caching edge in front of the trivia origin. Settings come from
 * the `EDGE_*` environment variables (see `edge::config`).
 */

#[cfg(feature = "edge")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = trivia_offline::edge::EdgeConfig::from_env()?;
    let app = trivia_offline::edge::create_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        "Edge listening on http://{} (origin {})",
        config.bind_addr,
        config.upstream_url
    );
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "edge"))]
fn main() {
    eprintln!("The edge requires the 'edge' feature to be enabled.");
    eprintln!("Run with: cargo run --bin trivia-edge --features edge");
    std::process::exit(1);
}
