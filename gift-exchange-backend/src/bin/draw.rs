use std::io::Write as _;

use gift_exchange_backend::telemetry::setup_logging;
use gift_exchange_backend::{AppError, DrawService, DrawState, Roster};
use gift_exchange_config::get_config;
use tracing::info;

/// Reads the roster named by the config, draws once and prints the pairs as JSON.
fn main() -> Result<(), AppError> {
    let config = get_config()?;
    setup_logging(&config)?;

    let roster_file = config
        .roster_file
        .as_deref()
        .ok_or(AppError::MissingRosterFile)?;
    let roster = Roster::load(roster_file)?;
    info!(
        participants = roster.participants().len(),
        exclusions = roster.exclusions().len(),
        "loaded roster from {}",
        roster_file.display()
    );

    let service = DrawService::new(&config);
    service.restore(DrawState {
        roster,
        assignment: None,
    })?;
    let assignment = service.draw()?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &assignment)?;
    writeln!(stdout)?;
    Ok(())
}
