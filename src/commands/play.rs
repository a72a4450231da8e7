use std::path::Path;

use hunter::{
    CommandDecoder, DigitsDecoder, Dispatcher, HttpTransport, PuzzleDecoder, RequestStats,
    RunOptions, Session, StopSignal, Task, load_graph, load_request_stats,
    modules::{
        scheduler::{self, Outcome},
        snapshot::{self, MapSource},
    },
    save_request_stats,
    state::{self, Status},
};

use super::{Globals, print_request_summary};

fn connect(globals: &Globals) -> Result<Session<HttpTransport>, String> {
    let config = globals.config()?;
    let token = config.require_token().map_err(|e| e.to_string())?;
    let transport = HttpTransport::new(&config.base_url, token, config.request_timeout())
        .map_err(|e| e.to_string())?;
    let dispatcher = Dispatcher::new(transport, config.cooldown_guard()).with_stop_signal(
        StopSignal::StateFile(state::state_file_path(&globals.dir)),
    );
    let decoder: Box<dyn PuzzleDecoder> = match &config.decoder_command {
        Some(command) => Box::new(CommandDecoder::new(command).map_err(|e| e.to_string())?),
        None => Box::new(DigitsDecoder),
    };
    let graph = load_graph(&globals.dir)
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    Ok(Session::new(dispatcher, config, decoder).with_graph(graph))
}

/// A live session plus what the counters on disk held before it sent anything.
struct Started {
    session: Session<HttpTransport>,
    tasks: u64,
    baseline: RequestStats,
}

fn require_init(dir: &Path) -> Result<u64, String> {
    match state::load_state(dir).map_err(|e| e.to_string())? {
        Some(prev) => Ok(prev.tasks_completed),
        None => Err("Not initialized. Run `hunter init` first.".into()),
    }
}

/// Bootstrap and make sure the map is complete, marking the run as live.
fn start(globals: &Globals, message: &str) -> Result<Started, String> {
    let tasks = require_init(&globals.dir)?;
    let baseline = load_request_stats(&globals.dir).map_err(|e| e.to_string())?;
    state::set_status(
        &globals.dir,
        Status::Running,
        tasks,
        None,
        Some(message.into()),
    )
    .map_err(|e| e.to_string())?;

    let mut session = connect(globals)?;
    let room = session.bootstrap().map_err(|e| e.to_string())?;
    println!(
        "Player {} in room {} ({} gold, {}/{} carried)",
        session.player.name,
        room,
        session.player.gold,
        session.player.encumbrance,
        session.player.strength
    );

    match snapshot::complete_map(&mut session, &globals.dir).map_err(|e| e.to_string())? {
        MapSource::Loaded => println!("Map loaded: {} rooms", session.graph.len()),
        MapSource::Explored(report) => println!(
            "Explored {} new rooms in {} moves ({} total)",
            report.rooms_found,
            report.moves,
            session.graph.len()
        ),
    }
    Ok(Started {
        session,
        tasks,
        baseline,
    })
}

fn finish(globals: &Globals, started: &Started, tasks: u64, message: String) -> Result<(), String> {
    let session = &started.session;
    let mut totals = started.baseline.clone();
    totals.merge(session.dispatcher.stats());
    save_request_stats(&globals.dir, &totals).map_err(|e| e.to_string())?;
    state::set_status(
        &globals.dir,
        Status::Stopped,
        tasks,
        Some(session.room()),
        Some(message),
    )
    .map_err(|e| e.to_string())?;
    print_request_summary(&globals.dir)
}

pub(super) fn run_explore(globals: &Globals) -> Result<(), String> {
    let started = start(globals, "exploring")?;
    let message = format!(
        "map has {} rooms, {} unresolved exits",
        started.session.graph.len(),
        started.session.graph.unresolved_count()
    );
    println!("Map saved: {}", message);
    finish(globals, &started, started.tasks, message)
}

pub(super) fn run_play(globals: &Globals, max_tasks: Option<u64>) -> Result<(), String> {
    let mut started = start(globals, "playing")?;
    let options = RunOptions {
        max_tasks,
        state_dir: Some(globals.dir.clone()),
    };
    let result = scheduler::run(&mut started.session, &options);
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            let tasks = require_init(&globals.dir)?;
            finish(globals, &started, tasks, format!("failed: {}", err))?;
            return Err(err.to_string());
        }
    };
    let player = &started.session.player;

    let message = if summary.stopped {
        "stopped by user".to_string()
    } else {
        format!("finished {} tasks", summary.tasks_completed)
    };
    println!(
        "Run {}: {} gold, {} coins, {} snitches",
        message, player.gold, player.coins, player.snitches
    );
    finish(globals, &started, summary.tasks_completed, message)
}

pub(super) fn run_mine(globals: &Globals) -> Result<(), String> {
    let mut started = start(globals, "mining")?;
    let outcome = scheduler::perform(&mut started.session, Task::MineCoin, Some(&globals.dir))
        .map_err(|e| e.to_string())?;
    let message = match outcome {
        Outcome::Done => format!("mined; balance {} coins", started.session.player.coins),
        Outcome::Refused => "mining refused".to_string(),
    };
    println!("{}", message);
    finish(globals, &started, started.tasks, message)?;
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Refused => Err("the mine is unknown or rejected the proof".into()),
    }
}
