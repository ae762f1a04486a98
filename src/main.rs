use clap::Parser;
use page_harvest::Harvest;
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match args.harvest_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!("Harvesting {} (timeout {}ms)", args.url, args.timeout);
    ::log::debug!("Using WebDriver at {}", config.webdriver_url);

    let harvest = Harvest::new(args.url.clone())
        .with_config(config)
        .with_assets(!args.no_assets)
        .with_webp(!args.no_webp)
        .with_timeout(args.timeout);

    let start_time = std::time::Instant::now();
    let result = match harvest.run().await {
        Ok(result) => result,
        Err(e) if e.is_timeout() => {
            ::log::error!("Gateway timeout: {} did not load in time ({})", args.url, e);
            return ExitCode::from(2);
        }
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            ::log::error!("Could not serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ::log::info!(
        "Harvest complete in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );
    ExitCode::SUCCESS
}
