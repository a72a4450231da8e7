pub mod modules;

pub use modules::api::{
    ApiRequest, Endpoint, ItemResponse, ProofResponse, Response, ResponseMeta, RoomResponse,
    StatusResponse,
};
pub use modules::config::{self, Config, Overrides};
pub use modules::dispatcher::{DEFAULT_GUARD, Dispatcher, StopSignal};
pub use modules::error::{AgentError, Result};
pub use modules::explorer::{ExploreReport, dead_end_walk, explore};
pub use modules::graph::{Direction, Neighbor, Room, RoomGraph, RoomId, Terrain};
pub use modules::pathfinder::{Path, Step, find_path, nearest_frontier, reachable_rooms};
pub use modules::places::{Place, Places};
pub use modules::planner::{Capabilities, MoveAction, Run, compress, plan};
pub use modules::player::{Item, ItemKind, Milestone, PlayerState, Slot};
pub use modules::policy::{Decision, decide};
pub use modules::pow::{digest_hex, pow_solve, pow_solve_from, pow_valid};
pub use modules::puzzle::{CommandDecoder, DigitsDecoder, PuzzleDecoder};
pub use modules::scheduler::{Rule, RunOptions, RunSummary, Task};
pub use modules::session::Session;
pub use modules::snapshot::{load_graph, map_file_path, save_graph};
pub use modules::state::{self, RuntimeState, Status};
pub use modules::stats::{RequestStats, load_request_stats, reset_request_stats, save_request_stats};
pub use modules::transport::{HttpTransport, Transport};
pub use modules::travel::{TravelMode, travel_to};
