use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use hunter::{
    Config, Overrides, RequestStats, config, load_graph, load_request_stats, reset_request_stats,
    state::{self, Status},
};

mod map;
mod play;
mod pow;

use map::{run_map, run_path};
use play::{run_explore, run_mine, run_play};
use pow::run_pow;

#[derive(Parser)]
#[command(
    name = "hunter",
    version,
    about = "Autonomous treasure hunt player (map, forage, sell, mine)",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Config file (default: .hunter/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// API token (also HUNTER_TOKEN or .hunter/.key)
    #[arg(long, global = true)]
    pub token: Option<String>,
    /// Remote world base URL (also HUNTER_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize local state and write a default config
    Init,
    /// Map the world (or load the saved map) and save it
    Explore,
    /// Run the task loop: forage, unlock milestones, sell, mine
    Play {
        /// Number of tasks to run (omit to run until stopped)
        #[arg(short = 't', long)]
        tasks: Option<u64>,
    },
    /// Show runtime state, request counts and the saved map
    Status,
    /// Ask a running `play` to stop after its current request
    Stop,
    /// Summarize the saved map
    Map,
    /// Shortest path between two rooms of the saved map
    Path {
        #[arg(long)]
        from: u32,
        #[arg(long)]
        to: u32,
    },
    /// Search a proof-of-work nonce offline
    Pow {
        #[arg(long)]
        seed: String,
        #[arg(long)]
        difficulty: u32,
        /// First nonce to try
        #[arg(long, default_value_t = 0)]
        start: u64,
    },
    /// Travel to the mine named by the well and mine one coin
    Mine,
}

/// Global options shared by the handlers.
pub(crate) struct Globals {
    pub dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub overrides: Overrides,
}

impl Globals {
    pub fn config(&self) -> Result<Config, String> {
        Config::resolve(&self.dir, self.config_path.as_deref(), &self.overrides)
            .map_err(|e| e.to_string())
    }
}

pub fn run(cli: Cli) {
    let globals = Globals {
        dir: config::hunter_dir(),
        config_path: cli.config,
        overrides: Overrides {
            token: cli.token,
            base_url: cli.base_url,
        },
    };
    if let Err(err) = dispatch(cli.command, &globals) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command, globals: &Globals) -> Result<(), String> {
    match command {
        Command::Init => run_init(globals),
        Command::Explore => run_explore(globals),
        Command::Play { tasks } => run_play(globals, tasks),
        Command::Status => run_status(&globals.dir),
        Command::Stop => run_stop(&globals.dir),
        Command::Map => run_map(&globals.dir),
        Command::Path { from, to } => run_path(&globals.dir, from, to),
        Command::Pow {
            seed,
            difficulty,
            start,
        } => run_pow(&seed, difficulty, start),
        Command::Mine => run_mine(globals),
    }
}

fn run_init(globals: &Globals) -> Result<(), String> {
    state::init_state(&globals.dir).map_err(|e| e.to_string())?;
    reset_request_stats(&globals.dir).map_err(|e| e.to_string())?;
    println!(
        "Initialized state at {}",
        state::state_file_path(&globals.dir).display()
    );
    let config_path = globals
        .config_path
        .clone()
        .unwrap_or_else(|| config::config_file_path(&globals.dir));
    if Config::create_default(&config_path).map_err(|e| e.to_string())? {
        println!("Wrote default config to {}", config_path.display());
    }
    Ok(())
}

fn run_status(dir: &Path) -> Result<(), String> {
    match state::load_state(dir).map_err(|e| e.to_string())? {
        None => {
            println!("Status: not initialized. Run `hunter init`.");
        }
        Some(state) => {
            println!(
                "Status: {:?} | tasks={} | room={} | message={}",
                state.status,
                state.tasks_completed,
                state
                    .room
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".into()),
                state.message.unwrap_or_else(|| "-".into())
            );
        }
    }
    print_request_summary(dir)?;
    if let Some(graph) = load_graph(dir).map_err(|e| e.to_string())? {
        println!(
            "Map: {} rooms, {} unresolved exits",
            graph.len(),
            graph.unresolved_count()
        );
    }
    Ok(())
}

fn run_stop(dir: &Path) -> Result<(), String> {
    let current = state::load_state(dir).map_err(|e| e.to_string())?;
    let Some(prev) = current else {
        return Err("Not initialized. Run `hunter init` first.".into());
    };
    let updated = state::set_status(
        dir,
        Status::Stopped,
        prev.tasks_completed,
        None,
        Some("stopped by user".into()),
    )
    .map_err(|e| e.to_string())?;
    println!("Stopped. tasks={}", updated.tasks_completed);
    print_request_summary(dir)
}

pub(crate) fn print_request_summary(dir: &Path) -> Result<(), String> {
    let stats: RequestStats = load_request_stats(dir).map_err(|e| e.to_string())?;
    println!("Requests: {} ({})", stats.total(), stats.summary());
    Ok(())
}
