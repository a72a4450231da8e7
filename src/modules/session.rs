//! The agent context threaded through every component.
//!
//! A `Session` owns the dispatcher together with everything learned from its responses:
//! the room graph, the player, and the known landmarks. Every remote action lives here so
//! local state is updated from the same response that changed the remote world.

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::json;

use crate::modules::api::{
    ApiRequest, Endpoint, ItemResponse, ProofResponse, Response, RoomResponse, StatusResponse,
    parse_balance,
};
use crate::modules::config::Config;
use crate::modules::dispatcher::Dispatcher;
use crate::modules::error::{AgentError, Result};
use crate::modules::graph::{Direction, RoomGraph, RoomId};
use crate::modules::pathfinder::reachable_rooms;
use crate::modules::places::{Place, Places};
use crate::modules::planner::MoveAction;
use crate::modules::player::{Item, PlayerState, is_snitch};
use crate::modules::policy::{self, Decision};
use crate::modules::pow;
use crate::modules::puzzle::PuzzleDecoder;
use crate::modules::transport::Transport;

/// Name the well answers to when examined.
const WELL_ITEM: &str = "WELL";

pub struct Session<T: Transport> {
    pub dispatcher: Dispatcher<T>,
    pub graph: RoomGraph,
    pub player: PlayerState,
    pub places: Places,
    pub config: Config,
    decoder: Box<dyn PuzzleDecoder>,
    rng: StdRng,
    /// Item names reported in the current room.
    room_items: Vec<String>,
}

impl<T: Transport> Session<T> {
    pub fn new(dispatcher: Dispatcher<T>, config: Config, decoder: Box<dyn PuzzleDecoder>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            dispatcher,
            graph: RoomGraph::new(),
            player: PlayerState::default(),
            places: Places::default(),
            config,
            decoder,
            rng,
            room_items: Vec::new(),
        }
    }

    /// Start from a previously saved map; landmarks are recovered from room titles.
    pub fn with_graph(mut self, graph: RoomGraph) -> Self {
        self.places = Places::from_graph(&graph);
        self.graph = graph;
        self
    }

    pub fn room(&self) -> RoomId {
        self.player.room
    }

    pub fn room_items(&self) -> &[String] {
        &self.room_items
    }

    fn execute(&mut self, request: ApiRequest) -> Result<Response> {
        self.dispatcher.execute(&request)
    }

    /// Ask where we are, refresh the player and pick up what lies in the starting room.
    pub fn bootstrap(&mut self) -> Result<RoomId> {
        let room = self.init()?;
        self.refresh_status()?;
        self.collect_here()?;
        info!(
            "session ready in room {} (strength {}, encumbrance {}, gold {})",
            room, self.player.strength, self.player.encumbrance, self.player.gold
        );
        Ok(room)
    }

    pub fn init(&mut self) -> Result<RoomId> {
        let response = self.execute(ApiRequest::new(Endpoint::Init))?;
        let room: RoomResponse = response.parse()?;
        Ok(self.observe(None, &room))
    }

    pub fn refresh_status(&mut self) -> Result<StatusResponse> {
        let response = self.execute(ApiRequest::new(Endpoint::Status))?;
        let status: StatusResponse = response.parse()?;
        self.player.apply_status(&status);
        for (name, worn) in self.player.unknown_holdings(&status) {
            match self.examine(&name)? {
                Some(found) => {
                    let mut item = Item::from_response(&found);
                    item.name = name;
                    info!("already holding {} (weight {})", item.name, item.weight);
                    self.player.adopt(item, worn);
                }
                None => warn!("cannot examine held item {}", name),
            }
        }
        Ok(status)
    }

    /// Record a room the remote world says we are in.
    ///
    /// `came_by` is the room we left and the direction taken, linking both edges.
    fn observe(&mut self, came_by: Option<(RoomId, Direction)>, reply: &RoomResponse) -> RoomId {
        let room = reply.to_room();
        let id = room.id;
        self.places.note(&room);
        self.graph.record(room);
        self.graph.seal_non_exits(id);
        if let Some((from, direction)) = came_by {
            if let Err(err) = self.graph.link(from, direction, id) {
                warn!("could not link room {} {} to {}: {}", from, direction, id, err);
            }
        }
        self.player.room = id;
        self.room_items = reply.items.clone();
        id
    }

    /// Move through an exit whose destination is not known yet.
    pub fn explore_step(&mut self, direction: Direction) -> Result<RoomId> {
        let from = self.player.room;
        let fly = self.player.capabilities().flight
            && self
                .graph
                .room(from)
                .map(|r| r.terrain.allows_flight())
                .unwrap_or(false);
        let endpoint = if fly { Endpoint::Fly } else { Endpoint::Move };
        let response = self.execute(ApiRequest::step(endpoint, direction, None))?;
        let reply: RoomResponse = response.parse()?;

        if reply.room_id == from {
            warn!("move {} from room {} went nowhere", direction, from);
            self.observe(None, &reply);
            self.graph.refuse_exit(from, direction);
            return Ok(from);
        }
        let id = self.observe(Some((from, direction)), &reply);
        debug!("explored {} from room {} into room {}", direction, from, id);
        self.collect_here()?;
        Ok(id)
    }

    /// Perform one planned movement and return the room we ended up in.
    pub fn perform_move(&mut self, action: &MoveAction) -> Result<RoomId> {
        let from = self.player.room;
        let request = match action {
            MoveAction::Walk { direction, next } => {
                ApiRequest::step(Endpoint::Move, *direction, Some(*next))
            }
            MoveAction::Fly { direction, next } => {
                ApiRequest::step(Endpoint::Fly, *direction, Some(*next))
            }
            MoveAction::Dash { direction, rooms } => ApiRequest::dash(*direction, rooms),
        };
        let response = self.execute(request)?;

        let landed = match action {
            MoveAction::Dash { rooms, .. } => match response.parse::<RoomResponse>() {
                Ok(reply) => self.observe(None, &reply),
                Err(_) if !response.meta.has_errors() => {
                    let last = rooms.last().copied().unwrap_or(from);
                    self.player.room = last;
                    self.room_items.clear();
                    last
                }
                Err(_) => from,
            },
            _ => {
                let reply: RoomResponse = response.parse()?;
                let came_by = (reply.room_id != from).then_some((from, action.direction()));
                let id = self.observe(came_by, &reply);
                if id != from {
                    self.collect_here()?;
                }
                id
            }
        };

        if let Some(expected) = action.destination() {
            if landed != expected {
                warn!(
                    "{} from room {} landed in room {} instead of {}",
                    action.direction(),
                    from,
                    landed,
                    expected
                );
            }
        }
        Ok(landed)
    }

    /// Offer every item in the current room to the policy.
    pub fn collect_here(&mut self) -> Result<()> {
        let items = self.room_items.clone();
        for name in items {
            if self.player.warped {
                if is_snitch(&name) && self.take(&name)? {
                    info!("took {} in room {}", name, self.player.room);
                }
                continue;
            }
            if self.player.is_full() {
                debug!("full; leaving {} behind", name);
                break;
            }
            let Some(found) = self.examine(&name)? else {
                continue;
            };
            let item = Item::from_response(&found);
            let decision = policy::decide(&item, &self.player);
            self.apply_decision(item, decision)?;
        }
        Ok(())
    }

    pub fn apply_decision(&mut self, item: Item, decision: Decision) -> Result<()> {
        match decision {
            Decision::Ignore => {
                debug!("ignoring {}", item.name);
                Ok(())
            }
            Decision::Carry => {
                if self.take(&item.name)? {
                    info!("carrying {} (weight {})", item.name, item.weight);
                    self.player.carry(item);
                }
                Ok(())
            }
            Decision::Equip { replaces } => {
                if !self.take(&item.name)? {
                    return Ok(());
                }
                if let (Some(old), Some(slot)) = (replaces, item.slot()) {
                    if !self.undress(&old.name)? {
                        warn!("could not take off {}; carrying {}", old.name, item.name);
                        self.player.carry(item);
                        return Ok(());
                    }
                    let shed = self.player.shed(slot);
                    if self.drop_item(&old.name)? {
                        info!("dropped {} for {}", old.name, item.name);
                    } else if let Some(old) = shed {
                        warn!("could not drop {}; keeping it", old.name);
                        self.player.carry(old);
                    }
                }
                if self.wear(&item.name)? {
                    info!("wearing {} (level {})", item.name, item.level);
                    self.player.wear(item);
                } else {
                    self.player.carry(item);
                }
                Ok(())
            }
        }
    }

    pub fn examine(&mut self, name: &str) -> Result<Option<ItemResponse>> {
        let response = self.execute(ApiRequest::named(Endpoint::Examine, name))?;
        if response.meta.has_errors() {
            return Ok(None);
        }
        Ok(Some(response.parse()?))
    }

    fn named_action(&mut self, endpoint: Endpoint, name: &str) -> Result<bool> {
        let response = self.execute(ApiRequest::named(endpoint, name))?;
        Ok(!response.meta.has_errors())
    }

    pub fn take(&mut self, name: &str) -> Result<bool> {
        self.named_action(Endpoint::Take, name)
    }

    pub fn drop_item(&mut self, name: &str) -> Result<bool> {
        self.named_action(Endpoint::Drop, name)
    }

    pub fn wear(&mut self, name: &str) -> Result<bool> {
        self.named_action(Endpoint::Wear, name)
    }

    pub fn undress(&mut self, name: &str) -> Result<bool> {
        self.named_action(Endpoint::Undress, name)
    }

    /// Sell every carried treasure; the shop wants each sale confirmed.
    pub fn sell_treasures(&mut self) -> Result<usize> {
        let mut sold = 0;
        for item in self.player.treasures() {
            self.execute(ApiRequest::named(Endpoint::Sell, &item.name))?;
            let confirmed = self.execute(ApiRequest::with_body(
                Endpoint::Sell,
                json!({ "name": item.name, "confirm": "yes" }),
            ))?;
            if confirmed.meta.has_errors() {
                continue;
            }
            self.player.discard(&item.name);
            sold += 1;
        }
        Ok(sold)
    }

    pub fn pray(&mut self) -> Result<bool> {
        let response = self.execute(ApiRequest::new(Endpoint::Pray))?;
        Ok(!response.meta.has_errors())
    }

    pub fn change_name(&mut self, name: &str) -> Result<bool> {
        let response = self.execute(ApiRequest::with_body(
            Endpoint::ChangeName,
            json!({ "name": name, "confirm": "aye" }),
        ))?;
        Ok(!response.meta.has_errors())
    }

    /// Cross between dimensions; the caller re-inits to learn the arrival room.
    pub fn warp(&mut self) -> Result<bool> {
        let response = self.execute(ApiRequest::new(Endpoint::Warp))?;
        if response.meta.has_errors() {
            return Ok(false);
        }
        self.player.warped = !self.player.warped;
        self.room_items.clear();
        Ok(true)
    }

    /// Ask the well for a clue and decode it into a room id.
    pub fn read_well(&mut self) -> Result<RoomId> {
        let found = self
            .examine(WELL_ITEM)?
            .ok_or_else(|| AgentError::Puzzle(format!("no well in room {}", self.player.room)))?;
        let room = self.decoder.decode(&found.description)?;
        info!("well clue points to room {}", room);
        Ok(room)
    }

    pub fn last_proof(&mut self) -> Result<ProofResponse> {
        self.execute(ApiRequest::new(Endpoint::LastProof))?.parse()
    }

    pub fn submit_proof(&mut self, proof: u64) -> Result<bool> {
        let response = self.execute(ApiRequest::with_body(
            Endpoint::Mine,
            json!({ "proof": proof }),
        ))?;
        Ok(!response.meta.has_errors())
    }

    pub fn balance(&mut self) -> Result<Option<u64>> {
        let response = self.execute(ApiRequest::new(Endpoint::Balance))?;
        let coins = parse_balance(&response.meta.messages);
        if let Some(coins) = coins {
            self.player.coins = coins;
        }
        Ok(coins)
    }

    /// Fetch the last proof, solve it and submit; returns whether the block was accepted.
    pub fn mine_round(&mut self) -> Result<bool> {
        let last = self.last_proof()?;
        info!(
            "solving proof for {} at difficulty {}",
            last.proof, last.difficulty
        );
        let nonce = pow::pow_solve(&last.proof.to_string(), last.difficulty);
        let accepted = self.submit_proof(nonce)?;
        if accepted {
            info!("proof {} accepted", nonce);
        }
        self.balance()?;
        Ok(accepted)
    }

    /// A random known room other than the current one, on our side of the warp.
    pub fn forage_target(&mut self) -> Option<RoomId> {
        let here = self.player.room;
        let warped = self.player.warped;
        let candidates: Vec<RoomId> = reachable_rooms(&self.graph, here)
            .into_iter()
            .filter(|id| *id != here)
            .filter(|id| self.graph.room(*id).map(|r| r.in_warp_dimension()) == Some(warped))
            .collect();
        candidates.choose(&mut self.rng).copied()
    }

    pub fn place(&self, place: Place) -> Option<RoomId> {
        self.places.get(place)
    }
}
