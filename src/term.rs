//! Terminal front-end for the countdown screen
//!
//! Stands in for the original rendering layer: it observes snapshots and
//! draws, never mutating the controller.

use std::io::Write;

use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;

use crate::state::CountdownSnapshot;
use crate::view;

/// Rendering options for the screen loop
#[derive(Debug, Clone)]
pub struct ScreenOptions {
    /// Width of the fill bar in characters
    pub bar_width: usize,
    /// Emit JSON lines instead of drawing the bar
    pub json: bool,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            bar_width: 40,
            json: false,
        }
    }
}

/// Redraw on every state update until an observed run reaches idle again
/// or the controller goes away
pub async fn run_screen(
    mut updates: watch::Receiver<CountdownSnapshot>,
    options: ScreenOptions,
) -> Result<()> {
    let mut saw_a_run = false;

    loop {
        let snapshot = updates.borrow_and_update().clone();
        draw(&snapshot, &options)?;

        if saw_a_run && !snapshot.is_running() {
            debug!("Run over, leaving the screen loop");
            break;
        }
        saw_a_run = saw_a_run || snapshot.is_running();

        if updates.changed().await.is_err() {
            debug!("Controller gone, leaving the screen loop");
            break;
        }
    }

    if !options.json {
        // move past the \r-redrawn bar before anyone else prints
        println!();
    }
    Ok(())
}

fn draw(snapshot: &CountdownSnapshot, options: &ScreenOptions) -> Result<()> {
    let mut out = std::io::stdout();
    if options.json {
        writeln!(out, "{}", serde_json::to_string(snapshot)?)?;
    } else {
        write!(out, "\r{}", render_frame(snapshot, options.bar_width))?;
        out.flush()?;
    }
    Ok(())
}

/// Format one frame: the fill bar plus the large numeral
pub fn render_frame(snapshot: &CountdownSnapshot, width: usize) -> String {
    let filled = (view::fill_fraction(snapshot) * width as f64).round() as usize;
    let filled = filled.min(width);

    let mut bar = String::new();
    bar.push_str(&"█".repeat(filled));
    bar.push_str(&"░".repeat(width - filled));

    let value = view::displayed_value(snapshot);
    if view::final_stretch(snapshot) {
        format!("[{}] \x1b[1m{:>3}\x1b[0m", bar, value)
    } else {
        format!("[{}] {:>3}", bar, value)
    }
}
