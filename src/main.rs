use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod store;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config path (without extension) as the first argument
    let cfg = match std::env::args().nth(1) {
        Some(path) => config::Config::load_from(&path)?,
        None => config::Config::load()?,
    };
    logger::init(&cfg)?;

    // Worker thread count comes from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.performance.backlog)?;
    let state = Arc::new(config::AppState::new(&cfg));

    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::spawn_shutdown_listener(Arc::clone(&shutdown));
    server::start_server_loop(listener, state, shutdown).await;
    Ok(())
}
