use clap::Subcommand;
use tomata_core::storage::Database;

use super::print_json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Statistics for sessions started today
    Today,
    /// All-time statistics
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Today => print_json(&db.stats_today()?)?,
        StatsAction::All => print_json(&db.stats_all()?)?,
    }
    Ok(())
}
