use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::modules::error::Result;
use crate::modules::graph::{Direction, Room, RoomId, Terrain};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Named operations of the remote world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Init,
    Move,
    Fly,
    Dash,
    Examine,
    Take,
    Drop,
    Wear,
    Undress,
    Sell,
    Pray,
    Status,
    ChangeName,
    Warp,
    LastProof,
    Mine,
    Balance,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Init => "api/adv/init/",
            Endpoint::Move => "api/adv/move/",
            Endpoint::Fly => "api/adv/fly/",
            Endpoint::Dash => "api/adv/dash/",
            Endpoint::Examine => "api/adv/examine/",
            Endpoint::Take => "api/adv/take/",
            Endpoint::Drop => "api/adv/drop/",
            Endpoint::Wear => "api/adv/wear/",
            Endpoint::Undress => "api/adv/undress/",
            Endpoint::Sell => "api/adv/sell/",
            Endpoint::Pray => "api/adv/pray/",
            Endpoint::Status => "api/adv/status/",
            Endpoint::ChangeName => "api/adv/change_name/",
            Endpoint::Warp => "api/adv/warp/",
            Endpoint::LastProof => "api/bc/last_proof/",
            Endpoint::Mine => "api/bc/mine/",
            Endpoint::Balance => "api/bc/get_balance/",
        }
    }

    pub const fn method(self) -> Method {
        match self {
            Endpoint::Init | Endpoint::LastProof | Endpoint::Balance => Method::Get,
            _ => Method::Post,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Endpoint::Init => "init",
            Endpoint::Move => "move",
            Endpoint::Fly => "fly",
            Endpoint::Dash => "dash",
            Endpoint::Examine => "examine",
            Endpoint::Take => "take",
            Endpoint::Drop => "drop",
            Endpoint::Wear => "wear",
            Endpoint::Undress => "undress",
            Endpoint::Sell => "sell",
            Endpoint::Pray => "pray",
            Endpoint::Status => "status",
            Endpoint::ChangeName => "change_name",
            Endpoint::Warp => "warp",
            Endpoint::LastProof => "last_proof",
            Endpoint::Mine => "mine",
            Endpoint::Balance => "balance",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            body: None,
        }
    }

    pub fn with_body(endpoint: Endpoint, body: Value) -> Self {
        Self {
            endpoint,
            body: Some(body),
        }
    }

    pub fn named(endpoint: Endpoint, name: &str) -> Self {
        Self::with_body(endpoint, json!({ "name": name }))
    }

    /// Single-room move; `next` earns the reduced cooldown.
    pub fn step(endpoint: Endpoint, direction: Direction, next: Option<RoomId>) -> Self {
        let body = match next {
            Some(room) => json!({
                "direction": direction.short(),
                "next_room_id": room.to_string(),
            }),
            None => json!({ "direction": direction.short() }),
        };
        Self::with_body(endpoint, body)
    }

    pub fn dash(direction: Direction, rooms: &[RoomId]) -> Self {
        let ids: Vec<String> = rooms.iter().map(|r| r.to_string()).collect();
        Self::with_body(
            Endpoint::Dash,
            json!({
                "direction": direction.short(),
                "num_rooms": rooms.len().to_string(),
                "next_room_ids": ids.join(","),
            }),
        )
    }

    /// Field value for logging, if present.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|b| b.get(key))
    }
}

/// Fields every response may carry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseMeta {
    /// Seconds to wait before the next request.
    pub cooldown: Option<f64>,
    pub errors: Vec<String>,
    pub messages: Vec<String>,
}

impl ResponseMeta {
    pub fn from_value(value: &Value) -> Self {
        Self {
            cooldown: value.get("cooldown").and_then(lenient_f64),
            errors: string_list(value.get("errors")),
            messages: string_list(value.get("messages")),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A parsed remote response.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub meta: ResponseMeta,
    pub body: Value,
}

impl Response {
    pub fn new(body: Value) -> Self {
        Self {
            meta: ResponseMeta::from_value(&body),
            body,
        }
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomResponse {
    pub room_id: RoomId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub coordinates: Option<String>,
    #[serde(default)]
    pub elevation: i32,
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub exits: Vec<Direction>,
}

impl RoomResponse {
    pub fn to_room(&self) -> Room {
        let mut room = Room::observed(
            self.room_id,
            self.title.clone(),
            self.terrain,
            self.exits.iter().copied(),
        );
        room.elevation = self.elevation;
        room.coordinates = self.coordinates.clone();
        room
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub itemtype: String,
    #[serde(default)]
    pub level: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub encumbrance: u32,
    #[serde(default)]
    pub strength: u32,
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub bodywear: Option<String>,
    #[serde(default)]
    pub footwear: Option<String>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub snitches: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofResponse {
    pub proof: u64,
    pub difficulty: u32,
}

/// First run of digits in the balance message, e.g. "You have a balance of 35.0 Lambda Coins".
pub fn parse_balance(messages: &[String]) -> Option<u64> {
    messages.iter().find_map(|m| first_number(m))
}

/// First unsigned integer embedded in `text`.
pub fn first_number(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_reads_cooldown_errors_and_messages() {
        let body = json!({
            "cooldown": 7.5,
            "errors": ["You cannot move that way: +5s CD"],
            "messages": ["You have walked north."],
        });
        let meta = ResponseMeta::from_value(&body);
        assert_eq!(meta.cooldown, Some(7.5));
        assert!(meta.has_errors());
        assert_eq!(meta.messages, vec!["You have walked north.".to_string()]);

        let meta = ResponseMeta::from_value(&json!({ "cooldown": "2" }));
        assert_eq!(meta.cooldown, Some(2.0));
        assert!(meta.errors.is_empty());
    }

    #[test]
    fn room_response_builds_room() {
        let body = json!({
            "room_id": 10,
            "title": "A misty room",
            "terrain": "CAVE",
            "coordinates": "(60,61)",
            "elevation": 0,
            "items": ["tiny treasure"],
            "exits": ["n", "s"],
            "cooldown": 1.0,
            "errors": [],
            "messages": [],
        });
        let room: RoomResponse = Response::new(body).parse().unwrap();
        assert_eq!(room.items, vec!["tiny treasure".to_string()]);
        let room = room.to_room();
        assert_eq!(room.id, 10);
        assert_eq!(room.terrain, Terrain::Cave);
        assert_eq!(room.first_unresolved(), Some(Direction::North));
        assert_eq!(room.coordinates.as_deref(), Some("(60,61)"));
    }

    #[test]
    fn move_bodies_carry_expected_rooms() {
        let req = ApiRequest::step(Endpoint::Move, Direction::North, Some(12));
        assert_eq!(
            req.body,
            Some(json!({ "direction": "n", "next_room_id": "12" }))
        );

        let req = ApiRequest::dash(Direction::East, &[3, 4, 5]);
        assert_eq!(
            req.body,
            Some(json!({ "direction": "e", "num_rooms": "3", "next_room_ids": "3,4,5" }))
        );
        assert_eq!(req.endpoint.method(), Method::Post);
        assert_eq!(Endpoint::LastProof.method(), Method::Get);
    }

    #[test]
    fn balance_digits_are_extracted() {
        let msgs = vec!["You have a balance of 35.0 Lambda Coins".to_string()];
        assert_eq!(parse_balance(&msgs), Some(35));
        assert_eq!(parse_balance(&[]), None);
        assert_eq!(first_number("go to room 467 now"), Some(467));
        assert_eq!(first_number("nothing"), None);
    }
}
