use clap::Subcommand;
use tomata_core::storage::Database;

use super::print_json;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List the most recent session records
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List today's session records
    Today,
    /// Delete all session records
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        HistoryAction::List { limit } => print_json(&db.recent_sessions(limit)?)?,
        HistoryAction::Today => print_json(&db.sessions_today()?)?,
        HistoryAction::Clear => {
            let removed = db.clear_sessions()?;
            println!("removed {removed} session records");
        }
    }
    Ok(())
}
