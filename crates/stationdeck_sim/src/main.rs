mod args;
mod session;

use std::sync::Arc;
use std::time::Duration;

use stationdeck_spatial::{
    InteractionConfig, InteractionCore, PersistFuture, PositionPersister, PositionStore,
    PositionUpdate,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::session::Session;

fn setup_logging(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .init();
}

fn load_config(args: &Args) -> InteractionConfig {
    let Some(path) = &args.config else {
        return InteractionConfig::default();
    };

    match InteractionConfig::load(path) {
        Ok(config) => {
            info!("loaded config from {}", path.display());
            config
        }
        Err(err) => {
            error!("failed to load config {}: {err}, using defaults", path.display());
            InteractionConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized) = Args::parse(&args);
    setup_logging(args.debug);

    for arg in &unrecognized {
        warn!("unrecognized argument: {arg}");
    }

    let config = load_config(&args);
    if let Some(path) = &args.write_config {
        match config.save(path) {
            Ok(()) => info!("wrote config to {}", path.display()),
            Err(err) => error!("failed to write config {}: {err}", path.display()),
        }
    }

    let store: Arc<dyn PositionStore> = Arc::new(|update: PositionUpdate| -> PersistFuture {
        Box::pin(async move {
            info!("persisted {} at {:?}", update.id, update.position());
            Ok(())
        })
    });

    let core = InteractionCore::new(config, PositionPersister::new(store));
    let mut session = Session::new(core, args.frames);
    session.run();

    // let in-flight persistence land before the runtime goes away
    tokio::time::sleep(Duration::from_millis(50)).await;
}
