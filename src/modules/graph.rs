use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::modules::error::{AgentError, Result};

/// Room id assigned by the remote world.
pub type RoomId = u32;

/// Rooms at or above this id belong to the warped dimension.
pub const WARP_ROOM_OFFSET: RoomId = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "n")]
    North,
    #[serde(rename = "w")]
    West,
    #[serde(rename = "s")]
    South,
    #[serde(rename = "e")]
    East,
}

impl Direction {
    /// Fixed scan order used by exploration and path search.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::South,
        Direction::East,
    ];

    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
        }
    }

    pub const fn short(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::West => "w",
            Direction::South => "s",
            Direction::East => "e",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "n" | "north" => Ok(Direction::North),
            "w" | "west" => Ok(Direction::West),
            "s" | "south" => Ok(Direction::South),
            "e" | "east" => Ok(Direction::East),
            other => Err(format!("unknown direction '{}'; use n|w|s|e", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Terrain {
    #[default]
    Normal,
    /// No flying in caves.
    Cave,
    Mountain,
    Trap,
    #[serde(other)]
    Other,
}

impl Terrain {
    pub const fn allows_flight(self) -> bool {
        !matches!(self, Terrain::Cave)
    }
}

/// State of one direction of one room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Neighbor {
    /// Exit exists but nobody has walked through it yet.
    Unresolved,
    NoExit,
    Room(RoomId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub title: String,
    #[serde(default)]
    pub terrain: Terrain,
    pub exits: BTreeSet<Direction>,
    pub neighbors: BTreeMap<Direction, Neighbor>,
    #[serde(default)]
    pub elevation: i32,
    #[serde(default)]
    pub coordinates: Option<String>,
    /// Reported exits the remote world refused to let us through.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub refused: BTreeSet<Direction>,
}

impl Room {
    /// A freshly observed room: reported exits start unresolved, the rest are walls.
    pub fn observed(
        id: RoomId,
        title: impl Into<String>,
        terrain: Terrain,
        exits: impl IntoIterator<Item = Direction>,
    ) -> Self {
        let exits: BTreeSet<Direction> = exits.into_iter().collect();
        let neighbors = Direction::ALL
            .iter()
            .map(|d| {
                let state = if exits.contains(d) {
                    Neighbor::Unresolved
                } else {
                    Neighbor::NoExit
                };
                (*d, state)
            })
            .collect();
        Self {
            id,
            title: title.into(),
            terrain,
            exits,
            neighbors,
            elevation: 0,
            coordinates: None,
            refused: BTreeSet::new(),
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Neighbor {
        self.neighbors
            .get(&direction)
            .copied()
            .unwrap_or(Neighbor::Unresolved)
    }

    pub fn first_unresolved(&self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.neighbor(*d) == Neighbor::Unresolved)
    }

    pub fn is_frontier(&self) -> bool {
        self.first_unresolved().is_some()
    }

    /// Confirmed edges in scan order.
    pub fn resolved(&self) -> impl Iterator<Item = (Direction, RoomId)> + '_ {
        Direction::ALL.into_iter().filter_map(|d| match self.neighbor(d) {
            Neighbor::Room(id) => Some((d, id)),
            _ => None,
        })
    }

    pub fn in_warp_dimension(&self) -> bool {
        self.id >= WARP_ROOM_OFFSET
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recorded {
    New,
    Known,
}

/// Discovered topology. Rooms and edges are only ever added.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, Room>,
}

impl RoomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, id: RoomId) -> bool {
        self.rooms.contains_key(&id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn neighbor(&self, id: RoomId, direction: Direction) -> Option<Neighbor> {
        self.rooms.get(&id).map(|r| r.neighbor(direction))
    }

    /// Insert a newly observed room or refresh the metadata of a known one.
    ///
    /// Edge knowledge of a known room is kept. An exit reported where a wall was recorded
    /// is reopened as unresolved since the remote world is authoritative.
    pub fn record(&mut self, observed: Room) -> Recorded {
        let Some(known) = self.rooms.get_mut(&observed.id) else {
            self.rooms.insert(observed.id, observed);
            return Recorded::New;
        };

        for direction in &observed.exits {
            if known.neighbor(*direction) == Neighbor::NoExit && !known.refused.contains(direction) {
                warn!(
                    "room {} now reports exit {} previously recorded as absent",
                    known.id, direction
                );
                known.neighbors.insert(*direction, Neighbor::Unresolved);
            }
        }
        for direction in Direction::ALL {
            if let Neighbor::Room(other) = known.neighbor(direction) {
                if !observed.exits.contains(&direction) {
                    warn!(
                        "room {} no longer reports exit {} to room {}; keeping traversed edge",
                        known.id, direction, other
                    );
                }
            }
        }

        known.exits.extend(observed.exits.iter().copied());
        known.title = observed.title;
        known.terrain = observed.terrain;
        known.elevation = observed.elevation;
        if observed.coordinates.is_some() {
            known.coordinates = observed.coordinates;
        }
        Recorded::Known
    }

    /// Record that moving `direction` from `from` lands in `to`, and the reverse edge.
    pub fn link(&mut self, from: RoomId, direction: Direction, to: RoomId) -> Result<()> {
        if !self.rooms.contains_key(&to) {
            return Err(AgentError::UnknownRoom(to));
        }
        let origin = self
            .rooms
            .get_mut(&from)
            .ok_or(AgentError::UnknownRoom(from))?;
        set_edge(origin, direction, to);

        let target = self.rooms.get_mut(&to).ok_or(AgentError::UnknownRoom(to))?;
        set_edge(target, direction.opposite(), from);
        Ok(())
    }

    /// Mark every direction of `id` missing from its exit list as a wall.
    pub fn seal_non_exits(&mut self, id: RoomId) {
        if let Some(room) = self.rooms.get_mut(&id) {
            for direction in Direction::ALL {
                if !room.exits.contains(&direction)
                    && room.neighbor(direction) == Neighbor::Unresolved
                {
                    room.neighbors.insert(direction, Neighbor::NoExit);
                }
            }
        }
    }

    /// An unresolved exit the remote world would not let us take becomes a wall for good.
    pub fn refuse_exit(&mut self, id: RoomId, direction: Direction) {
        if let Some(room) = self.rooms.get_mut(&id) {
            if room.neighbor(direction) == Neighbor::Unresolved {
                warn!("room {} refused exit {}; marking it absent", id, direction);
                room.refused.insert(direction);
                room.neighbors.insert(direction, Neighbor::NoExit);
            }
        }
    }

    pub fn frontier_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values().filter(|r| r.is_frontier())
    }

    pub fn unresolved_count(&self) -> usize {
        self.rooms
            .values()
            .flat_map(|r| r.neighbors.values())
            .filter(|n| **n == Neighbor::Unresolved)
            .count()
    }

    /// Directed count of confirmed edges.
    pub fn resolved_edge_count(&self) -> usize {
        self.rooms.values().map(|r| r.resolved().count()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved_count() == 0
    }
}

fn set_edge(room: &mut Room, direction: Direction, to: RoomId) {
    match room.neighbor(direction) {
        Neighbor::Room(existing) if existing != to => warn!(
            "room {} exit {} moved from room {} to room {}",
            room.id, direction, existing, to
        ),
        Neighbor::NoExit => warn!(
            "room {} exit {} was recorded as absent; now leads to room {}",
            room.id, direction, to
        ),
        _ => {}
    }
    room.exits.insert(direction);
    room.neighbors.insert(direction, Neighbor::Room(to));
}
