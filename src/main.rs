use fileport::config::Config;
use fileport::server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let mut server = Server::bind(&cfg)?;
    let shutdown = server.shutdown_handle();

    // The loop blocks in its poller; the runtime only watches for Ctrl-C
    let mut serve = tokio::task::spawn_blocking(move || server.run());

    tokio::select! {
        res = &mut serve => {
            res??;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shutdown.shutdown()?;
            serve.await??;
        }
    }

    Ok(())
}
