//! In-memory remote world for tests: a hand-built maze answering every endpoint with
//! zero cooldown.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use serde_json::{Value, json};

use crate::modules::api::{ApiRequest, Endpoint};
use crate::modules::config::Config;
use crate::modules::dispatcher::Dispatcher;
use crate::modules::error::Result;
use crate::modules::graph::{Direction, RoomId, Terrain, WARP_ROOM_OFFSET};
use crate::modules::player::Slot;
use crate::modules::pow;
use crate::modules::puzzle::DigitsDecoder;
use crate::modules::session::Session;
use crate::modules::transport::Transport;

const SALE_PRICE: u64 = 100;
const NAME_CHANGE_PRICE: u64 = 1000;

struct FakeRoom {
    title: String,
    terrain: Terrain,
    exits: BTreeMap<Direction, RoomId>,
    blocked: BTreeSet<Direction>,
    items: Vec<String>,
    description: String,
}

#[derive(Clone)]
struct FakeItem {
    weight: u32,
    itemtype: String,
    level: u32,
}

pub struct FakeWorld {
    rooms: BTreeMap<RoomId, FakeRoom>,
    catalog: HashMap<String, FakeItem>,
    current: RoomId,
    strength: u32,
    inventory: Vec<String>,
    footwear: Option<String>,
    bodywear: Option<String>,
    gold: u64,
    name: String,
    coins: u64,
    snitches: u64,
    mine_room: Option<RoomId>,
    last_proof: u64,
    difficulty: u32,
    accepted: Vec<u64>,
    prayers: Vec<RoomId>,
    requests: Vec<ApiRequest>,
}

impl FakeWorld {
    pub fn new(start: RoomId) -> Self {
        Self {
            rooms: BTreeMap::new(),
            catalog: HashMap::new(),
            current: start,
            strength: 10,
            inventory: Vec::new(),
            footwear: None,
            bodywear: None,
            gold: 0,
            name: "player".into(),
            coins: 0,
            snitches: 0,
            mine_room: None,
            last_proof: 0,
            difficulty: 0,
            accepted: Vec::new(),
            prayers: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn room(mut self, id: RoomId, title: &str, terrain: Terrain) -> Self {
        self.rooms.insert(
            id,
            FakeRoom {
                title: title.into(),
                terrain,
                exits: BTreeMap::new(),
                blocked: BTreeSet::new(),
                items: Vec::new(),
                description: String::new(),
            },
        );
        self
    }

    pub fn connect(mut self, from: RoomId, direction: Direction, to: RoomId) -> Self {
        if let Some(room) = self.rooms.get_mut(&from) {
            room.exits.insert(direction, to);
        }
        if let Some(room) = self.rooms.get_mut(&to) {
            room.exits.insert(direction.opposite(), from);
        }
        self
    }

    /// The exit stays listed but moving through it fails.
    pub fn block(mut self, room: RoomId, direction: Direction) -> Self {
        if let Some(r) = self.rooms.get_mut(&room) {
            r.blocked.insert(direction);
        }
        self
    }

    pub fn item(mut self, room: RoomId, name: &str, weight: u32, itemtype: &str, level: u32) -> Self {
        self.catalog.insert(
            name.to_string(),
            FakeItem {
                weight,
                itemtype: itemtype.into(),
                level,
            },
        );
        if let Some(r) = self.rooms.get_mut(&room) {
            r.items.push(name.to_string());
        }
        self
    }

    /// Already in the pack when the session starts.
    pub fn carrying(mut self, name: &str, weight: u32, itemtype: &str, level: u32) -> Self {
        self.catalog.insert(
            name.to_string(),
            FakeItem {
                weight,
                itemtype: itemtype.into(),
                level,
            },
        );
        self.inventory.push(name.to_string());
        self
    }

    /// Already worn when the session starts.
    pub fn wearing(mut self, name: &str, weight: u32, itemtype: &str, level: u32) -> Self {
        self.catalog.insert(
            name.to_string(),
            FakeItem {
                weight,
                itemtype: itemtype.into(),
                level,
            },
        );
        match itemtype {
            "FOOTWEAR" => self.footwear = Some(name.to_string()),
            "BODYWEAR" => self.bodywear = Some(name.to_string()),
            _ => {}
        }
        self
    }

    /// Well clue text shown when examining `WELL` in `room`.
    pub fn clue(mut self, room: RoomId, description: &str) -> Self {
        if let Some(r) = self.rooms.get_mut(&room) {
            r.description = description.into();
        }
        self
    }

    pub fn strength(mut self, strength: u32) -> Self {
        self.strength = strength;
        self
    }

    pub fn gold(mut self, gold: u64) -> Self {
        self.gold = gold;
        self
    }

    pub fn mine_at(mut self, room: RoomId) -> Self {
        self.mine_room = Some(room);
        self
    }

    pub fn proof(mut self, last_proof: u64, difficulty: u32) -> Self {
        self.last_proof = last_proof;
        self.difficulty = difficulty;
        self
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.requests.iter().map(|r| r.endpoint).collect()
    }

    pub fn requests(&self) -> &[ApiRequest] {
        &self.requests
    }

    pub fn current(&self) -> RoomId {
        self.current
    }

    pub fn inventory(&self) -> Vec<String> {
        self.inventory.clone()
    }

    pub fn worn(&self, slot: Slot) -> Option<String> {
        match slot {
            Slot::Footwear => self.footwear.clone(),
            Slot::Bodywear => self.bodywear.clone(),
        }
    }

    pub fn room_items(&self, room: RoomId) -> Vec<String> {
        self.rooms
            .get(&room)
            .map(|r| r.items.clone())
            .unwrap_or_default()
    }

    pub fn accepted_proofs(&self) -> Vec<u64> {
        self.accepted.clone()
    }

    pub fn prayers(&self) -> Vec<RoomId> {
        self.prayers.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gold_held(&self) -> u64 {
        self.gold
    }

    pub fn snitches(&self) -> u64 {
        self.snitches
    }

    fn weight_of(&self, name: &str) -> u32 {
        self.catalog.get(name).map(|i| i.weight).unwrap_or(0)
    }

    fn encumbrance(&self) -> u32 {
        self.inventory
            .iter()
            .chain(self.footwear.iter())
            .chain(self.bodywear.iter())
            .map(|n| self.weight_of(n))
            .sum()
    }

    fn title(&self) -> String {
        self.rooms
            .get(&self.current)
            .map(|r| r.title.to_lowercase())
            .unwrap_or_default()
    }

    fn room_reply(&self, errors: Vec<String>) -> Value {
        let Some(room) = self.rooms.get(&self.current) else {
            return reply(json!({}), vec![format!("no room {}", self.current)], vec![]);
        };
        let terrain = match room.terrain {
            Terrain::Normal => "NORMAL",
            Terrain::Cave => "CAVE",
            Terrain::Mountain => "MOUNTAIN",
            Terrain::Trap => "TRAP",
            Terrain::Other => "OTHER",
        };
        let exits: Vec<&str> = room.exits.keys().map(|d| d.short()).collect();
        reply(
            json!({
                "room_id": self.current,
                "title": room.title,
                "description": "",
                "terrain": terrain,
                "elevation": 0,
                "items": room.items,
                "exits": exits,
            }),
            errors,
            vec![],
        )
    }

    fn step(&mut self, direction: Direction) -> std::result::Result<(), String> {
        let room = self
            .rooms
            .get(&self.current)
            .ok_or_else(|| "lost".to_string())?;
        if room.blocked.contains(&direction) {
            return Err("You cannot move that way".into());
        }
        let next = room
            .exits
            .get(&direction)
            .copied()
            .ok_or_else(|| "You cannot move that way".to_string())?;
        self.current = next;
        Ok(())
    }

    fn handle(&mut self, request: &ApiRequest) -> Value {
        let field = |key: &str| -> String {
            match request.field(key) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        };
        match request.endpoint {
            Endpoint::Init => self.room_reply(vec![]),
            Endpoint::Move | Endpoint::Fly => {
                let errors = match field("direction").parse::<Direction>() {
                    Ok(direction) => self.step(direction).err().into_iter().collect(),
                    Err(e) => vec![e],
                };
                self.room_reply(errors)
            }
            Endpoint::Dash => {
                let mut errors = Vec::new();
                if let Ok(direction) = field("direction").parse::<Direction>() {
                    let expected: Vec<RoomId> = field("next_room_ids")
                        .split(',')
                        .filter_map(|s| s.trim().parse().ok())
                        .collect();
                    for room in expected {
                        if let Err(e) = self.step(direction) {
                            errors.push(e);
                            break;
                        }
                        if self.current != room {
                            errors.push(format!("dash went off course at {}", self.current));
                            break;
                        }
                    }
                }
                self.room_reply(errors)
            }
            Endpoint::Examine => {
                let name = field("name");
                if name == "WELL" && self.title().contains("well") {
                    let description = self
                        .rooms
                        .get(&self.current)
                        .map(|r| r.description.clone())
                        .unwrap_or_default();
                    return reply(json!({ "name": "Wishing Well", "description": description }), vec![], vec![]);
                }
                let here = self.room_items(self.current).contains(&name)
                    || self.inventory.contains(&name)
                    || self.footwear.as_deref() == Some(name.as_str())
                    || self.bodywear.as_deref() == Some(name.as_str());
                match (here, self.catalog.get(&name)) {
                    (true, Some(item)) => reply(
                        json!({
                            "name": name,
                            "description": "",
                            "weight": item.weight,
                            "itemtype": item.itemtype,
                            "level": item.level,
                        }),
                        vec![],
                        vec![],
                    ),
                    _ => reply(json!({}), vec!["Item not found".into()], vec![]),
                }
            }
            Endpoint::Take => {
                let name = field("name");
                let weight = self.weight_of(&name);
                let current = self.current;
                let fits = self.encumbrance() + weight <= self.strength;
                let Some(room) = self.rooms.get_mut(&current) else {
                    return reply(json!({}), vec!["lost".into()], vec![]);
                };
                let Some(pos) = room.items.iter().position(|i| *i == name) else {
                    return reply(json!({}), vec!["Item not found".into()], vec![]);
                };
                if !fits {
                    return reply(json!({}), vec!["Too heavy".into()], vec![]);
                }
                room.items.remove(pos);
                if name.contains("snitch") {
                    self.snitches += 1;
                } else {
                    self.inventory.push(name.clone());
                }
                reply(json!({}), vec![], vec![format!("You have picked up {}", name)])
            }
            Endpoint::Drop => {
                let name = field("name");
                let Some(pos) = self.inventory.iter().position(|i| *i == name) else {
                    return reply(json!({}), vec!["You don't have that".into()], vec![]);
                };
                self.inventory.remove(pos);
                let current = self.current;
                if let Some(room) = self.rooms.get_mut(&current) {
                    room.items.push(name);
                }
                reply(json!({}), vec![], vec![])
            }
            Endpoint::Wear => {
                let name = field("name");
                let slot = match self.catalog.get(&name).map(|i| i.itemtype.as_str()) {
                    Some("FOOTWEAR") => &mut self.footwear,
                    Some("BODYWEAR") => &mut self.bodywear,
                    _ => return reply(json!({}), vec!["Cannot wear that".into()], vec![]),
                };
                if slot.is_some() {
                    return reply(json!({}), vec!["Already wearing something".into()], vec![]);
                }
                let Some(pos) = self.inventory.iter().position(|i| *i == name) else {
                    return reply(json!({}), vec!["You don't have that".into()], vec![]);
                };
                *slot = Some(name);
                self.inventory.remove(pos);
                reply(json!({}), vec![], vec![])
            }
            Endpoint::Undress => {
                let name = field("name");
                let removed = if self.footwear.as_deref() == Some(name.as_str()) {
                    self.footwear.take()
                } else if self.bodywear.as_deref() == Some(name.as_str()) {
                    self.bodywear.take()
                } else {
                    None
                };
                match removed {
                    Some(item) => {
                        self.inventory.push(item);
                        reply(json!({}), vec![], vec![])
                    }
                    None => reply(json!({}), vec!["Not wearing that".into()], vec![]),
                }
            }
            Endpoint::Sell => {
                let name = field("name");
                if !self.title().contains("shop") {
                    return reply(json!({}), vec!["No shop here".into()], vec![]);
                }
                let Some(pos) = self.inventory.iter().position(|i| *i == name) else {
                    return reply(json!({}), vec!["You don't have that".into()], vec![]);
                };
                if field("confirm") != "yes" {
                    return reply(json!({}), vec![], vec![format!("I'll give you {} gold", SALE_PRICE)]);
                }
                self.inventory.remove(pos);
                self.gold += SALE_PRICE;
                reply(json!({}), vec![], vec![format!("Sold {}", name)])
            }
            Endpoint::Pray => {
                if !self.title().contains("shrine") {
                    return reply(json!({}), vec!["Nothing to pray to".into()], vec![]);
                }
                self.prayers.push(self.current);
                reply(json!({}), vec![], vec!["You feel lighter".into()])
            }
            Endpoint::Status => reply(
                json!({
                    "name": self.name,
                    "encumbrance": self.encumbrance(),
                    "strength": self.strength,
                    "speed": 10,
                    "gold": self.gold,
                    "bodywear": self.bodywear,
                    "footwear": self.footwear,
                    "inventory": self.inventory,
                    "status": [],
                    "snitches": self.snitches,
                }),
                vec![],
                vec![],
            ),
            Endpoint::ChangeName => {
                if !self.title().contains("pirate") || field("confirm") != "aye" {
                    return reply(json!({}), vec!["Nobody to rename you".into()], vec![]);
                }
                if self.gold < NAME_CHANGE_PRICE {
                    return reply(json!({}), vec!["Not enough gold".into()], vec![]);
                }
                self.gold -= NAME_CHANGE_PRICE;
                self.name = field("name");
                reply(json!({}), vec![], vec![format!("You are now {}", self.name)])
            }
            Endpoint::Warp => {
                self.current = if self.current >= WARP_ROOM_OFFSET {
                    self.current - WARP_ROOM_OFFSET
                } else {
                    self.current + WARP_ROOM_OFFSET
                };
                reply(json!({}), vec![], vec!["You have warped".into()])
            }
            Endpoint::LastProof => reply(
                json!({ "proof": self.last_proof, "difficulty": self.difficulty }),
                vec![],
                vec![],
            ),
            Endpoint::Mine => {
                let proof = request
                    .field("proof")
                    .and_then(Value::as_u64)
                    .unwrap_or(u64::MAX);
                let valid = pow::pow_valid(&self.last_proof.to_string(), proof, self.difficulty);
                if self.mine_room != Some(self.current) || !valid {
                    return reply(json!({}), vec!["Proof rejected".into()], vec![]);
                }
                self.accepted.push(proof);
                self.coins += 1;
                self.last_proof = proof;
                reply(json!({}), vec![], vec!["New block forged".into()])
            }
            Endpoint::Balance => reply(
                json!({}),
                vec![],
                vec![format!("You have a balance of {}.0 Lambda Coins", self.coins)],
            ),
        }
    }
}

fn reply(mut body: Value, errors: Vec<String>, messages: Vec<String>) -> Value {
    if let Value::Object(map) = &mut body {
        map.insert("cooldown".into(), json!(0.0));
        map.insert("errors".into(), json!(errors));
        map.insert("messages".into(), json!(messages));
    }
    body
}

impl Transport for FakeWorld {
    fn send(&mut self, request: &ApiRequest) -> Result<Value> {
        self.requests.push(request.clone());
        Ok(self.handle(request))
    }
}

/// Session over `world` with no cooldown guard, a fixed seed and a digits decoder.
pub fn session_for(world: FakeWorld) -> Session<FakeWorld> {
    session_over(world)
}

/// Same as [`session_for`] for a transport wrapping the fake world.
pub fn session_over<T: Transport>(transport: T) -> Session<T> {
    let config = Config {
        seed: Some(7),
        cooldown_guard_ms: 0,
        ..Config::default()
    };
    Session::new(
        Dispatcher::new(transport, Duration::ZERO),
        config,
        Box::new(DigitsDecoder),
    )
}
