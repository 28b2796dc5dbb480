//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

use crate::state::{CountdownConfig, DEFAULT_SECONDS};

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "tickdown")]
#[command(about = "A state-managed countdown timer with a terminal front-end")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Countdown duration in seconds
    #[arg(short, long, default_value_t = DEFAULT_SECONDS)]
    pub seconds: u64,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// Width of the progress bar in characters
    #[arg(long, default_value = "40")]
    pub bar_width: usize,

    /// Emit state snapshots as JSON lines instead of drawing the bar
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Controller settings derived from the CLI flags
    pub fn countdown(&self) -> CountdownConfig {
        CountdownConfig {
            initial_seconds: self.seconds,
            // tokio intervals reject a zero period
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
        }
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
