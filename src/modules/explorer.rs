//! Maze mapping: walk to a dead end through unexplored exits, then backtrack over known
//! edges to the nearest room that still has one, until none is left.

use log::{debug, info};

use crate::modules::error::{AgentError, Result};
use crate::modules::pathfinder::nearest_frontier;
use crate::modules::session::Session;
use crate::modules::transport::Transport;
use crate::modules::travel::{TravelMode, follow_path};

/// Outcome of a full exploration pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExploreReport {
    pub rooms_found: usize,
    pub moves: usize,
}

/// Resolve every exit reachable from the current room.
pub fn explore<T: Transport>(session: &mut Session<T>) -> Result<ExploreReport> {
    let rooms_before = session.graph.len();
    let mut report = ExploreReport::default();

    loop {
        report.moves += dead_end_walk(session)?;
        let Some(path) = nearest_frontier(&session.graph, session.room()) else {
            break;
        };
        debug!(
            "backtracking {} steps to frontier room {}",
            path.len(),
            path.last().map(|s| s.room).unwrap_or(session.room())
        );
        follow_path(session, &path, TravelMode::Fast)?;
        report.moves += path.len();
    }

    report.rooms_found = session.graph.len() - rooms_before;
    info!(
        "map complete: {} rooms ({} new), {} edges",
        session.graph.len(),
        report.rooms_found,
        session.graph.resolved_edge_count() / 2
    );
    Ok(report)
}

/// Keep taking the first unexplored exit until the current room has none.
pub fn dead_end_walk<T: Transport>(session: &mut Session<T>) -> Result<usize> {
    let mut moves = 0;
    loop {
        let here = session.room();
        let room = session
            .graph
            .room(here)
            .ok_or(AgentError::UnknownRoom(here))?;
        let Some(direction) = room.first_unresolved() else {
            return Ok(moves);
        };
        session.explore_step(direction)?;
        moves += 1;
    }
}
