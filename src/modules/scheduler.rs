//! The top-level decision loop.
//!
//! Each iteration evaluates the configured rules in order and performs the first task that
//! is eligible. Tasks that cannot be routed to are set aside until the map grows.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::modules::config::Config;
use crate::modules::error::{AgentError, Result};
use crate::modules::explorer;
use crate::modules::graph::RoomId;
use crate::modules::places::{Place, Places};
use crate::modules::player::{Milestone, PlayerState};
use crate::modules::session::Session;
use crate::modules::snapshot;
use crate::modules::state::{self, Status};
use crate::modules::stats::{self, RequestStats};
use crate::modules::transport::Transport;
use crate::modules::travel::{TravelMode, travel_to};

/// Name of the collectible fetched from the warped dimension.
const SNITCH_ITEM: &str = "golden snitch";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Wander to random rooms collecting items while there is room to carry them.
    Forage,
    /// One-shot unlocks: name change, then the dash, flight and warp shrines.
    Milestones,
    /// Sell treasure at the shop once full.
    Liquidate,
    /// Well clue, travel to the mine, proof of work.
    MineCoin,
    /// Fetch a snitch from the warped dimension.
    HuntSnitch,
}

impl Rule {
    pub const DEFAULT_ORDER: [Rule; 5] = [
        Rule::Forage,
        Rule::Milestones,
        Rule::Liquidate,
        Rule::MineCoin,
        Rule::HuntSnitch,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Rule::Forage => "forage",
            Rule::Milestones => "milestones",
            Rule::Liquidate => "liquidate",
            Rule::MineCoin => "mine_coin",
            Rule::HuntSnitch => "hunt_snitch",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Rule::DEFAULT_ORDER
            .into_iter()
            .find(|r| r.label() == s.trim().to_lowercase().replace('-', "_"))
            .ok_or_else(|| format!("unknown rule '{}'", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    Forage,
    Milestone(Milestone),
    Liquidate,
    MineCoin,
    HuntSnitch,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Forage => write!(f, "forage"),
            Task::Milestone(m) => write!(f, "milestone {}", m),
            Task::Liquidate => write!(f, "liquidate"),
            Task::MineCoin => write!(f, "mine coin"),
            Task::HuntSnitch => write!(f, "hunt snitch"),
        }
    }
}

/// Where a milestone is unlocked.
pub fn milestone_place(milestone: Milestone) -> Place {
    match milestone {
        Milestone::NameChange => Place::Pirate,
        Milestone::Dash => Place::DashShrine,
        Milestone::Flight => Place::FlightShrine,
        Milestone::Warp => Place::WarpShrine,
    }
}

fn milestone_ready(milestone: Milestone, player: &PlayerState, config: &Config) -> bool {
    match milestone {
        Milestone::NameChange => player.gold >= config.name_change_gold,
        _ => player.milestones.is_met(Milestone::NameChange),
    }
}

/// First eligible task, or forage when nothing else applies; `None` if even that is dead.
pub fn next_task(
    player: &PlayerState,
    places: &Places,
    config: &Config,
    dead: &HashSet<Task>,
) -> Option<Task> {
    let alive = |task: Task| (!dead.contains(&task)).then_some(task);
    let full = player.is_full();

    for rule in &config.task_order {
        let task = match rule {
            Rule::Forage => (!full).then_some(Task::Forage).and_then(alive),
            Rule::Milestones => Milestone::ALL
                .into_iter()
                .filter(|m| !player.milestones.is_met(*m))
                .filter(|m| places.get(milestone_place(*m)).is_some())
                .filter(|m| milestone_ready(*m, player, config))
                .map(Task::Milestone)
                .find_map(alive),
            Rule::Liquidate => (full && places.get(Place::Shop).is_some())
                .then_some(Task::Liquidate)
                .and_then(alive),
            Rule::MineCoin => (full
                && places.get(Place::Well).is_some()
                && player.milestones.is_met(Milestone::NameChange))
            .then_some(Task::MineCoin)
            .and_then(alive),
            Rule::HuntSnitch => (config.hunt_snitches
                && full
                && player.milestones.is_met(Milestone::Warp))
            .then_some(Task::HuntSnitch)
            .and_then(alive),
        };
        if task.is_some() {
            return task;
        }
    }
    alive(Task::Forage)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The remote world declined; the task is set aside.
    Refused,
}

/// Carry out one task.
pub fn perform<T: Transport>(
    session: &mut Session<T>,
    task: Task,
    snapshot_dir: Option<&Path>,
) -> Result<Outcome> {
    match task {
        Task::Forage => forage(session),
        Task::Milestone(milestone) => unlock(session, milestone),
        Task::Liquidate => liquidate(session),
        Task::MineCoin => mine_coin(session),
        Task::HuntSnitch => hunt_snitch(session, snapshot_dir),
    }
}

fn forage<T: Transport>(session: &mut Session<T>) -> Result<Outcome> {
    let Some(target) = session.forage_target() else {
        return Ok(Outcome::Refused);
    };
    info!("foraging towards room {}", target);
    travel_to(session, target, TravelMode::Collect)?;
    Ok(Outcome::Done)
}

fn place_or_refuse<T: Transport>(session: &Session<T>, place: Place) -> Option<RoomId> {
    let room = session.place(place);
    if room.is_none() {
        warn!("{} location unknown", place);
    }
    room
}

fn unlock<T: Transport>(session: &mut Session<T>, milestone: Milestone) -> Result<Outcome> {
    let Some(room) = place_or_refuse(session, milestone_place(milestone)) else {
        return Ok(Outcome::Refused);
    };
    travel_to(session, room, TravelMode::Fast)?;
    let accepted = match milestone {
        Milestone::NameChange => {
            let name = session.config.player_name.clone();
            session.change_name(&name)?
        }
        _ => session.pray()?,
    };
    session.refresh_status()?;
    if !accepted {
        return Ok(Outcome::Refused);
    }
    session.player.milestones.mark(milestone);
    info!("milestone reached: {}", milestone);
    Ok(Outcome::Done)
}

fn liquidate<T: Transport>(session: &mut Session<T>) -> Result<Outcome> {
    let Some(shop) = place_or_refuse(session, Place::Shop) else {
        return Ok(Outcome::Refused);
    };
    travel_to(session, shop, TravelMode::Fast)?;
    let sold = session.sell_treasures()?;
    session.refresh_status()?;
    info!("sold {} items, gold now {}", sold, session.player.gold);
    if sold == 0 {
        return Ok(Outcome::Refused);
    }
    Ok(Outcome::Done)
}

fn mine_coin<T: Transport>(session: &mut Session<T>) -> Result<Outcome> {
    let Some(well) = place_or_refuse(session, Place::Well) else {
        return Ok(Outcome::Refused);
    };
    travel_to(session, well, TravelMode::Fast)?;
    let mine = session.read_well()?;
    session.places.set(Place::Mine, mine);
    travel_to(session, mine, TravelMode::Fast)?;
    if !session.mine_round()? {
        return Ok(Outcome::Refused);
    }
    info!("mined a coin, balance {}", session.player.coins);
    Ok(Outcome::Done)
}

fn hunt_snitch<T: Transport>(
    session: &mut Session<T>,
    snapshot_dir: Option<&Path>,
) -> Result<Outcome> {
    if !session.player.warped {
        if !session.warp()? {
            return Ok(Outcome::Refused);
        }
        session.init()?;
    }
    let outcome = fetch_snitch(session, snapshot_dir);
    if session.player.warped && !matches!(outcome, Err(AgentError::Stopped)) {
        session.warp()?;
        session.init()?;
    }
    outcome
}

fn fetch_snitch<T: Transport>(
    session: &mut Session<T>,
    snapshot_dir: Option<&Path>,
) -> Result<Outcome> {
    if session.place(Place::WarpWell).is_none() || !session.graph.is_complete() {
        let report = explorer::explore(session)?;
        if report.rooms_found > 0 {
            if let Some(dir) = snapshot_dir {
                snapshot::save_graph(dir, &session.graph)?;
            }
        }
    }
    let Some(well) = place_or_refuse(session, Place::WarpWell) else {
        return Ok(Outcome::Refused);
    };
    travel_to(session, well, TravelMode::Fast)?;
    let target = session.read_well()?;
    travel_to(session, target, TravelMode::Fast)?;
    let before = session.player.snitches;
    session.take(SNITCH_ITEM)?;
    session.refresh_status()?;
    if session.player.snitches <= before {
        return Ok(Outcome::Refused);
    }
    info!("snitches held: {}", session.player.snitches);
    Ok(Outcome::Done)
}

/// Tasks set aside after failing; cleared once the map has grown.
#[derive(Debug, Default)]
pub struct DeadTasks {
    tasks: HashSet<Task>,
    map_size: usize,
}

impl DeadTasks {
    pub fn mark(&mut self, task: Task, map_size: usize) {
        self.tasks.insert(task);
        self.map_size = map_size;
    }

    /// Current dead set, forgetting it if the map has grown since the last failure.
    pub fn current(&mut self, map_size: usize) -> &HashSet<Task> {
        if map_size > self.map_size && !self.tasks.is_empty() {
            info!("map grew; retrying {} set-aside tasks", self.tasks.len());
            self.tasks.clear();
        }
        &self.tasks
    }
}

/// Options for a scheduler run.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Stop after this many tasks; run until stopped otherwise.
    pub max_tasks: Option<u64>,
    /// Where runtime state, request stats and the map are persisted.
    pub state_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks_completed: u64,
    pub stopped: bool,
}

/// Run the rule loop until stopped, out of tasks, or `max_tasks` is reached.
pub fn run<T: Transport>(session: &mut Session<T>, options: &RunOptions) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut dead = DeadTasks::default();
    let baseline = match &options.state_dir {
        Some(dir) => stats::load_request_stats(dir)?,
        None => RequestStats::default(),
    };

    loop {
        if options.max_tasks.is_some_and(|max| summary.tasks_completed >= max) {
            break;
        }
        let map_size = session.graph.len();
        let Some(task) = next_task(
            &session.player,
            &session.places,
            &session.config,
            dead.current(map_size),
        ) else {
            warn!("no task left to perform");
            break;
        };

        info!("task {}: {}", summary.tasks_completed + 1, task);
        match perform(session, task, options.state_dir.as_deref()) {
            Ok(Outcome::Done) => {}
            Ok(Outcome::Refused) => {
                warn!("{} refused; setting it aside", task);
                dead.mark(task, session.graph.len());
            }
            Err(AgentError::NoRoute { from, to }) => {
                warn!("{}: no route from room {} to room {}", task, from, to);
                dead.mark(task, session.graph.len());
            }
            Err(AgentError::Stopped) => {
                info!("stop requested");
                summary.stopped = true;
                break;
            }
            Err(err) => return Err(err),
        }
        summary.tasks_completed += 1;

        // a stop raised during the task's last request must not be overwritten
        let stop = session.dispatcher.stop_requested();
        if let Some(dir) = &options.state_dir {
            let mut totals = baseline.clone();
            totals.merge(session.dispatcher.stats());
            stats::save_request_stats(dir, &totals)?;
        }
        if stop {
            info!("stop requested");
            summary.stopped = true;
            break;
        }
        if let Some(dir) = &options.state_dir {
            state::set_status(
                dir,
                Status::Running,
                summary.tasks_completed,
                Some(session.room()),
                Some(format!("last task: {}", task)),
            )?;
        }
    }
    Ok(summary)
}
