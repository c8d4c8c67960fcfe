use army_store::catalog::{seed_catalog, ProductService};
use army_store::engine::FileSubstrate;
use army_store::server::Router;
use clap::Parser;
use log::{error, info};
use tokio::signal;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding one JSON file per collection.
    #[arg(short, long, env = "ARMY_STORE_DATA_DIR", default_value = "data")]
    data_dir: String,

    #[arg(short, long, env = "ARMY_STORE_PORT", default_value = "7002")]
    port: String,

    /// Populate an empty catalog with sample products before serving.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let substrate = FileSubstrate::new(&args.data_dir)?;
    let service = ProductService::open(substrate)?;

    if args.seed {
        seed_catalog(&service, &mut rand::thread_rng())?;
    }

    info!(
        "Engine started. Loaded {} products from {}",
        service.get_all_products()?.len(),
        args.data_dir
    );

    let router = Router::new(service);

    tokio::select! {
        res = router.listen(&args.port) => {
            if let Err(e) = res {
                error!("TCP Server failed: {}", e);
            }
        }
        _ = signal::ctrl_c() => {
            // Writes are synchronous, so nothing is pending once a command returns.
            info!("Shutdown signal received. Exiting.");
        }
    }

    Ok(())
}
