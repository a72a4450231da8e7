//! Turns a path into the fewest remote round-trips.

use crate::modules::graph::{Direction, RoomGraph, RoomId};
use crate::modules::pathfinder::Step;

/// A straight stretch of rooms entered by repeating one direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub direction: Direction,
    pub rooms: Vec<RoomId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveAction {
    /// One request crossing every room of the run.
    Dash { direction: Direction, rooms: Vec<RoomId> },
    Fly { direction: Direction, next: RoomId },
    Walk { direction: Direction, next: RoomId },
}

impl MoveAction {
    pub fn direction(&self) -> Direction {
        match self {
            MoveAction::Dash { direction, .. }
            | MoveAction::Fly { direction, .. }
            | MoveAction::Walk { direction, .. } => *direction,
        }
    }

    /// Rooms entered by this action, in order.
    pub fn rooms(&self) -> &[RoomId] {
        match self {
            MoveAction::Dash { rooms, .. } => rooms,
            MoveAction::Fly { next, .. } | MoveAction::Walk { next, .. } => {
                std::slice::from_ref(next)
            }
        }
    }

    pub fn destination(&self) -> Option<RoomId> {
        self.rooms().last().copied()
    }
}

/// Movement abilities unlocked for the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub dash: bool,
    pub flight: bool,
}

/// Group consecutive steps sharing a direction.
pub fn compress(path: &[Step]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for step in path {
        match runs.last_mut() {
            Some(run) if run.direction == step.direction => run.rooms.push(step.room),
            _ => runs.push(Run {
                direction: step.direction,
                rooms: vec![step.room],
            }),
        }
    }
    runs
}

/// Build the action list for a path.
///
/// With dash unlocked every run becomes one request. Otherwise each step is its own move,
/// flying when unlocked and the destination is not a cave. Single moves always carry the
/// expected destination id for the reduced cooldown.
pub fn plan(path: &[Step], caps: Capabilities, graph: &RoomGraph) -> Vec<MoveAction> {
    if caps.dash {
        return compress(path)
            .into_iter()
            .map(|run| MoveAction::Dash {
                direction: run.direction,
                rooms: run.rooms,
            })
            .collect();
    }

    path.iter()
        .map(|step| single_move(step.direction, step.room, caps, graph))
        .collect()
}

/// Step-by-step plan regardless of dash, so every room on the way is visited.
pub fn plan_stepwise(path: &[Step], caps: Capabilities, graph: &RoomGraph) -> Vec<MoveAction> {
    let caps = Capabilities { dash: false, ..caps };
    plan(path, caps, graph)
}

fn single_move(
    direction: Direction,
    next: RoomId,
    caps: Capabilities,
    graph: &RoomGraph,
) -> MoveAction {
    let can_fly = graph
        .room(next)
        .map(|r| r.terrain.allows_flight())
        .unwrap_or(false);
    if caps.flight && can_fly {
        MoveAction::Fly { direction, next }
    } else {
        MoveAction::Walk { direction, next }
    }
}
