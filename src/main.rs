use anyhow::Result;
use mail_autofile::{
    app,
    config,
    infrastructure::{directories, logging, shutdown},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    let log_guard = logging::init_tracing(&config, &paths)?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::AutofileApp::initialize(config, paths, shutdown.clone()).await?;
    let outcome = app.run().await;

    drop(log_guard);
    // a pending stdin read would keep the runtime from shutting down
    match outcome {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("Error: {err:?}");
            std::process::exit(1);
        }
    }
}
