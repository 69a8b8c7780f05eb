use std::rc::Rc;

use clap::Subcommand;
use tomata_core::storage::{Config, Database};
use tomata_core::{SystemClock, TimerEngine, TimerStatus};

use super::print_json;

const TICK_INTERVAL_MS: u64 = 100;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start an idle session or resume a paused one
    Start {
        /// Task ID to bind the session to
        #[arg(long)]
        task: Option<String>,
    },
    /// Pause the countdown
    Pause,
    /// Print current timer state as JSON
    Status,
    /// Abandon the session and return to idle
    Reset,
    /// Abandon the session and advance to the next session type
    Skip,
    /// Run the countdown in the foreground until it completes
    Watch,
}

fn open_engine() -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let db = Rc::new(Database::open()?);
    // One database serves as both the state store and the history sink.
    Ok(TimerEngine::new(
        Box::new(SystemClock),
        Box::new(Rc::clone(&db)),
        Box::new(db),
    ))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut engine = open_engine()?;

    match action {
        TimerAction::Start { task } => {
            if let Some(task) = task {
                engine.set_task(Some(task));
            }
            match engine.start(&config.timer) {
                Some(event) => print_json(&event)?,
                None => print_json(&engine.snapshot())?,
            }
        }
        TimerAction::Pause => match engine.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&engine.snapshot())?,
        },
        TimerAction::Status => {
            // Tick once so a running countdown reports current numbers.
            let completed = engine.tick();
            print_json(&engine.snapshot())?;
            if let Some(event) = completed {
                print_json(&event)?;
            }
        }
        TimerAction::Reset => match engine.reset() {
            Some(event) => print_json(&event)?,
            None => print_json(&engine.snapshot())?,
        },
        TimerAction::Skip => match engine.skip(&config.timer) {
            Some(event) => print_json(&event)?,
            None => print_json(&engine.snapshot())?,
        },
        TimerAction::Watch => return watch(&mut engine, &config),
    }

    Ok(())
}

/// Drive the countdown in the foreground until it completes.
///
/// Owns the one repeating tick handle; the interval is a responsiveness
/// knob only -- remaining time is recomputed from the anchor on every tick.
fn watch(engine: &mut TimerEngine, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write as _;

    if let Some(event) = engine.start(&config.timer) {
        print_json(&event)?;
    }
    if engine.state().status != TimerStatus::Running {
        println!("nothing to watch; the timer is {:?}", engine.state().status);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let completion = runtime.block_on(async {
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(TICK_INTERVAL_MS));
        loop {
            ticker.tick().await;
            if let Some(event) = engine.tick() {
                break event;
            }
            let state = engine.state();
            print!(
                "\r{} {}  ",
                state.session_type.as_str(),
                state.formatted_remaining()
            );
            let _ = std::io::stdout().flush();
        }
    });

    println!();
    print_json(&completion)
}
