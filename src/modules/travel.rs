use log::{debug, warn};

use crate::modules::error::{AgentError, Result};
use crate::modules::graph::RoomId;
use crate::modules::pathfinder::{Step, find_path};
use crate::modules::planner::{self, MoveAction};
use crate::modules::session::Session;
use crate::modules::transport::Transport;

/// Re-plans allowed when a move lands somewhere unexpected.
const MAX_REPLANS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelMode {
    /// Walk or fly every step so each room on the way is searched for items.
    Collect,
    /// Dash along straight runs once dashing is unlocked.
    Fast,
}

/// Go to `target` over known edges, re-planning from wherever we actually land.
pub fn travel_to<T: Transport>(
    session: &mut Session<T>,
    target: RoomId,
    mode: TravelMode,
) -> Result<()> {
    for attempt in 0..=MAX_REPLANS {
        let from = session.room();
        if from == target {
            return Ok(());
        }
        let path = find_path(&session.graph, from, target)
            .ok_or(AgentError::NoRoute { from, to: target })?;
        if attempt > 0 {
            debug!("re-planning from room {} to room {}", from, target);
        }
        follow_path(session, &path, mode)?;
    }
    if session.room() == target {
        return Ok(());
    }
    warn!("gave up reaching room {} from room {}", target, session.room());
    Err(AgentError::NoRoute {
        from: session.room(),
        to: target,
    })
}

/// Execute `path` from the current room; stops early if a move goes astray.
pub fn follow_path<T: Transport>(
    session: &mut Session<T>,
    path: &[Step],
    mode: TravelMode,
) -> Result<RoomId> {
    let caps = session.player.capabilities();
    let actions: Vec<MoveAction> = match mode {
        TravelMode::Collect => planner::plan_stepwise(path, caps, &session.graph),
        TravelMode::Fast => planner::plan(path, caps, &session.graph),
    };
    for action in &actions {
        let landed = session.perform_move(action)?;
        if Some(landed) != action.destination() {
            break;
        }
    }
    Ok(session.room())
}
