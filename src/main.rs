/*!
Here we go!
*/
use std::sync::Arc;

use clap::Parser;
use simplelog::{ColorChoice, TerminalMode, TermLogger};

use impact::{config, inter};

#[derive(Parser, Debug)]
#[command(version, about = "Serve the lab website.")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("impact")
        .build();
    TermLogger::init(
        impact::log_level_from_env(),
        log_cfg,
        TerminalMode::Stdout,
        ColorChoice::Auto
    ).map_err(|e| format!("Unable to start logging: {}", &e))?;
    log::info!("Logging started.");

    let glob = config::load_configuration(&args.config).await?;
    let addr = glob.addr;

    let app = inter::router(Arc::new(glob));

    let listener = tokio::net::TcpListener::bind(addr).await
        .map_err(|e| format!("Unable to bind {}: {}", &addr, &e))?;
    log::info!("Listening on {}", &addr);

    axum::serve(listener, app).await
        .map_err(|e| format!("Server error: {}", &e))
}
