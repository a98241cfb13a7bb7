use std::time::{Duration, Instant};

use anyhow::Result;
use yeargrid_core::{AppError, ConfigError};
use yeargrid_ui::{AppServices, YearModel};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    yeargrid_core::init()?;

    let mut app = match yeargrid_core::App::new() {
        Ok(app) => app,
        Err(e) => {
            if let Some(config_error) = e.downcast_ref::<ConfigError>() {
                eprintln!("{}", AppError::Config(config_error.clone()).user_message());
            }
            return Err(e);
        }
    };
    app.initialize()?;

    let config = app.shared_config();
    let services = AppServices::from_config(&config)?;
    let mut model = YearModel::new(services.clone(), &config);

    if services.accounts().is_empty() {
        println!("No Google accounts configured, showing an empty year.");
    } else {
        model.fetch_calendars();
        let deadline = Instant::now() + FETCH_TIMEOUT;
        while (model.is_loading() || model.is_refreshing()) && Instant::now() < deadline {
            model.poll_channel();
            std::thread::sleep(POLL_INTERVAL);
        }
        if model.is_loading() {
            tracing::warn!("timed out waiting for calendar data");
        }
    }

    let calendars = model.calendars().len();
    let events = model.events().len();
    let error = model.error_message().to_string();
    let layout = model.layout();

    println!("YearGrid {}", layout.year);
    println!(
        "  Grid: {} columns x {} rows, {}px cells{}",
        layout.dimensions.columns,
        layout.dimensions.rows,
        layout.dimensions.cell_size_px,
        if layout.dimensions.overflows { " (scrolls)" } else { "" }
    );
    println!("  Calendars: {}, events: {}", calendars, events);
    println!(
        "  Bars: {} in up to {} lanes ({} used)",
        layout.bars.len(),
        layout.diagnostics.max_lanes,
        layout.diagnostics.lanes_used
    );
    println!(
        "  Skipped events: {}, dropped segments: {}",
        layout.diagnostics.skipped_events, layout.diagnostics.dropped_segments
    );
    if !error.is_empty() {
        println!("  Error: {}", error);
    }

    services.shutdown();
    app.shutdown()?;

    Ok(())
}
