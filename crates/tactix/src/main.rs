use tactix::TactixServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("TACTIX_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = TactixServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "tactix server started");
    server.run().await?;
    Ok(())
}
