use clap::Parser;
use env_logger::Env;
use maps_admission::{Harvest, RunConfig};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut harvest = match &args.config {
        Some(path) => match Harvest::from_config_file(path) {
            Ok(harvest) => harvest,
            Err(e) => {
                ::log::error!("Failed to read config {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => Harvest::new(RunConfig::default()),
    };
    let config = harvest.config_mut();
    config.apply_env();
    args.apply(config);

    ::log::info!("Places: {:?}", config.places);

    let start_time = std::time::Instant::now();
    let outcomes = match harvest.execute().await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            ::log::error!("Run failed: {}", e);
            std::process::exit(1);
        }
    };

    for outcome in &outcomes {
        match (&outcome.failure, &outcome.csv_path) {
            (Some(failure), _) => ::log::info!("{}: skipped ({})", outcome.place, failure),
            (None, Some(csv)) => ::log::info!("{}: {}", outcome.place, csv.display()),
            (None, None) => ::log::info!("{}: {} rows, CSV not written", outcome.place, outcome.rows.len()),
        }
    }

    ::log::info!(
        "Run complete - {} places in {:.2} seconds",
        outcomes.len(),
        start_time.elapsed().as_secs_f64()
    );
}
