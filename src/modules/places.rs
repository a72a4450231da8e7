use std::collections::BTreeMap;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::modules::graph::{Room, RoomGraph, RoomId};

/// Landmarks the scheduler travels to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Place {
    Shop,
    Pirate,
    DashShrine,
    FlightShrine,
    WarpShrine,
    Well,
    /// The wishing well on the warped side.
    WarpWell,
    /// Named by the decoded well clue, never by a title.
    Mine,
    Transmogrifier,
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Place::Shop => "shop",
            Place::Pirate => "pirate",
            Place::DashShrine => "dash shrine",
            Place::FlightShrine => "flight shrine",
            Place::WarpShrine => "warp shrine",
            Place::Well => "well",
            Place::WarpWell => "warp well",
            Place::Mine => "mine",
            Place::Transmogrifier => "transmogrifier",
        };
        write!(f, "{}", label)
    }
}

const TITLE_KEYWORDS: [(&str, Place); 7] = [
    ("shop", Place::Shop),
    ("pirate", Place::Pirate),
    ("dash", Place::DashShrine),
    ("flight", Place::FlightShrine),
    ("warp", Place::WarpShrine),
    ("well", Place::Well),
    ("transmog", Place::Transmogrifier),
];

/// Landmark a room title names, if any.
///
/// On the warped side only the well counts; every other landmark lives at home.
pub fn classify(room: &Room) -> Option<Place> {
    let title = room.title.to_lowercase();
    let place = TITLE_KEYWORDS
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map(|(_, place)| *place)?;
    match (place, room.in_warp_dimension()) {
        (Place::Well, true) => Some(Place::WarpWell),
        (_, true) => None,
        (place, false) => Some(place),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Places {
    known: BTreeMap<Place, RoomId>,
}

impl Places {
    pub fn from_graph(graph: &RoomGraph) -> Self {
        let mut places = Self::default();
        for room in graph.rooms() {
            if let Some(place) = classify(room) {
                places.known.insert(place, room.id);
            }
        }
        places
    }

    /// Remember the landmark in `room`; returns it when newly found.
    pub fn note(&mut self, room: &Room) -> Option<Place> {
        let place = classify(room)?;
        let previous = self.known.insert(place, room.id);
        if previous == Some(room.id) {
            return None;
        }
        info!("found {} at room {}", place, room.id);
        Some(place)
    }

    pub fn set(&mut self, place: Place, room: RoomId) {
        self.known.insert(place, room);
    }

    pub fn get(&self, place: Place) -> Option<RoomId> {
        self.known.get(&place).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Place, RoomId)> + '_ {
        self.known.iter().map(|(p, r)| (*p, *r))
    }
}
