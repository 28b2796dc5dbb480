//! Tickdown - A state-managed countdown timer with a terminal front-end
//!
//! This is the main entry point for the tickdown application.

use std::sync::Arc;

use tracing::info;

use tickdown::{
    config::Config,
    sched::IntervalScheduler,
    state::CountdownController,
    term::{self, ScreenOptions},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level, on stderr so log
    // lines stay off the countdown display
    tracing_subscriber::fmt()
        .with_env_filter(format!("tickdown={}", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting tickdown v0.1.0");
    info!(
        "Configuration: seconds={}, tick={}ms, bar_width={}",
        config.seconds, config.tick_ms, config.bar_width
    );

    // Create the controller and hand its updates to the screen
    let scheduler = Arc::new(IntervalScheduler::new());
    let controller = Arc::new(CountdownController::new(config.countdown(), scheduler));
    let updates = controller.subscribe();

    controller.start();

    let screen = term::run_screen(
        updates,
        ScreenOptions {
            bar_width: config.bar_width,
            json: config.json,
        },
    );

    tokio::select! {
        result = screen => {
            if let Err(e) = result {
                tracing::error!("Screen rendering error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, cancelling the countdown");
            controller.cancel();
            if !config.json {
                println!();
            }
        }
    }

    if let Some((intent, at)) = controller.last_intent() {
        info!("Last intent: {} at {}", intent, at);
    }
    info!("tickdown shutdown complete");
    Ok(())
}
