use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::modules::api::{ItemResponse, StatusResponse};
use crate::modules::graph::RoomId;
use crate::modules::planner::Capabilities;

/// Equipment slot; one worn item each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Footwear,
    Bodywear,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Footwear => write!(f, "footwear"),
            Slot::Bodywear => write!(f, "bodywear"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Treasure,
    Equippable(Slot),
    Other,
}

impl ItemKind {
    /// Classify the remote `itemtype` string once, at examine time.
    pub fn classify(itemtype: &str) -> Self {
        match itemtype.trim().to_uppercase().as_str() {
            "TREASURE" => ItemKind::Treasure,
            "FOOTWEAR" => ItemKind::Equippable(Slot::Footwear),
            "BODYWEAR" => ItemKind::Equippable(Slot::Bodywear),
            _ => ItemKind::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub weight: u32,
    pub kind: ItemKind,
    /// Power level; only meaningful for equippables.
    pub level: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, weight: u32, kind: ItemKind, level: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            kind,
            level,
        }
    }

    pub fn from_response(resp: &ItemResponse) -> Self {
        Self::new(
            resp.name.clone(),
            resp.weight,
            ItemKind::classify(&resp.itemtype),
            resp.level,
        )
    }

    pub fn slot(&self) -> Option<Slot> {
        match self.kind {
            ItemKind::Equippable(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn is_treasure(&self) -> bool {
        self.kind == ItemKind::Treasure
    }
}

/// Name check for the collectible hunted in the warped dimension.
pub fn is_snitch(name: &str) -> bool {
    name.to_lowercase().contains("snitch")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub footwear: Option<Item>,
    pub bodywear: Option<Item>,
}

impl Equipment {
    pub fn get(&self, slot: Slot) -> Option<&Item> {
        match slot {
            Slot::Footwear => self.footwear.as_ref(),
            Slot::Bodywear => self.bodywear.as_ref(),
        }
    }

    /// Put `item` in its slot and hand back whatever was there.
    pub fn replace(&mut self, slot: Slot, item: Item) -> Option<Item> {
        let cell = match slot {
            Slot::Footwear => &mut self.footwear,
            Slot::Bodywear => &mut self.bodywear,
        };
        cell.replace(item)
    }

    pub fn clear(&mut self, slot: Slot) -> Option<Item> {
        match slot {
            Slot::Footwear => self.footwear.take(),
            Slot::Bodywear => self.bodywear.take(),
        }
    }

    pub fn worn(&self) -> impl Iterator<Item = &Item> {
        self.footwear.iter().chain(self.bodywear.iter())
    }
}

/// One-shot unlocks, in the order they are pursued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Milestone {
    NameChange,
    Dash,
    Flight,
    Warp,
}

impl Milestone {
    pub const ALL: [Milestone; 4] = [
        Milestone::NameChange,
        Milestone::Dash,
        Milestone::Flight,
        Milestone::Warp,
    ];
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::NameChange => write!(f, "name change"),
            Milestone::Dash => write!(f, "dash"),
            Milestone::Flight => write!(f, "flight"),
            Milestone::Warp => write!(f, "warp"),
        }
    }
}

/// Flags are set once and never cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    name_changed: bool,
    dash: bool,
    flight: bool,
    warp: bool,
}

impl Milestones {
    pub fn is_met(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::NameChange => self.name_changed,
            Milestone::Dash => self.dash,
            Milestone::Flight => self.flight,
            Milestone::Warp => self.warp,
        }
    }

    pub fn mark(&mut self, milestone: Milestone) {
        match milestone {
            Milestone::NameChange => self.name_changed = true,
            Milestone::Dash => self.dash = true,
            Milestone::Flight => self.flight = true,
            Milestone::Warp => self.warp = true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub room: RoomId,
    pub strength: u32,
    pub encumbrance: u32,
    pub equipment: Equipment,
    /// Carried, unworn items.
    pub inventory: Vec<Item>,
    pub milestones: Milestones,
    pub gold: u64,
    pub coins: u64,
    pub snitches: u64,
    pub warped: bool,
}

impl PlayerState {
    /// Weight of the heaviest carried item, 1 with an empty inventory.
    pub fn heaviest_carried(&self) -> u32 {
        self.inventory
            .iter()
            .map(|i| i.weight)
            .max()
            .unwrap_or(1)
    }

    /// Full once there is no longer room for the heaviest carried item.
    pub fn is_full(&self) -> bool {
        let threshold = i64::from(self.strength) - i64::from(self.heaviest_carried());
        i64::from(self.encumbrance) >= threshold
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            dash: self.milestones.is_met(Milestone::Dash),
            flight: self.milestones.is_met(Milestone::Flight),
        }
    }

    pub fn carry(&mut self, item: Item) {
        self.encumbrance = self.encumbrance.saturating_add(item.weight);
        self.inventory.push(item);
    }

    /// Remove one carried item called `name`.
    pub fn discard(&mut self, name: &str) -> Option<Item> {
        let index = self.inventory.iter().position(|i| i.name == name)?;
        let item = self.inventory.remove(index);
        self.encumbrance = self.encumbrance.saturating_sub(item.weight);
        Some(item)
    }

    /// Wear a freshly taken item; its weight joins the load.
    pub fn wear(&mut self, item: Item) -> Option<Item> {
        let slot = item.slot()?;
        self.encumbrance = self.encumbrance.saturating_add(item.weight);
        self.equipment.replace(slot, item)
    }

    /// Forget a worn item that was taken off and dropped.
    pub fn shed(&mut self, slot: Slot) -> Option<Item> {
        let item = self.equipment.clear(slot)?;
        self.encumbrance = self.encumbrance.saturating_sub(item.weight);
        Some(item)
    }

    pub fn treasures(&self) -> Vec<Item> {
        self.inventory
            .iter()
            .filter(|i| i.is_treasure())
            .cloned()
            .collect()
    }

    /// Refresh counters from a status reply and drop local items the server no longer lists.
    pub fn apply_status(&mut self, status: &StatusResponse) {
        if !status.name.is_empty() {
            self.name = status.name.clone();
        }
        self.strength = status.strength;
        self.encumbrance = status.encumbrance;
        self.gold = status.gold;
        self.snitches = status.snitches;

        let mut listed: HashMap<&str, usize> = HashMap::new();
        for name in &status.inventory {
            *listed.entry(name.as_str()).or_default() += 1;
        }
        self.inventory.retain(|item| match listed.get_mut(item.name.as_str()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => {
                debug!("{} no longer carried", item.name);
                false
            }
        });

        for (slot, listed) in [
            (Slot::Footwear, &status.footwear),
            (Slot::Bodywear, &status.bodywear),
        ] {
            let worn = self.equipment.get(slot).map(|i| i.name.as_str());
            if worn.is_some() && worn != listed.as_deref() {
                debug!("{} no longer worn", slot);
                self.equipment.clear(slot);
            }
        }
    }

    /// Names a status reply lists that local state does not hold, flagged when worn.
    pub fn unknown_holdings(&self, status: &StatusResponse) -> Vec<(String, bool)> {
        let mut held: HashMap<&str, usize> = HashMap::new();
        for item in &self.inventory {
            *held.entry(item.name.as_str()).or_default() += 1;
        }
        let mut unknown = Vec::new();
        for name in &status.inventory {
            match held.get_mut(name.as_str()) {
                Some(count) if *count > 0 => *count -= 1,
                _ => unknown.push((name.clone(), false)),
            }
        }
        for (slot, listed) in [
            (Slot::Footwear, &status.footwear),
            (Slot::Bodywear, &status.bodywear),
        ] {
            let Some(name) = listed else { continue };
            if self.equipment.get(slot).map(|i| i.name.as_str()) != Some(name.as_str()) {
                unknown.push((name.clone(), true));
            }
        }
        unknown
    }

    /// Take on an item the server already counts in the encumbrance.
    pub fn adopt(&mut self, item: Item, worn: bool) {
        match item.slot() {
            Some(slot) if worn => {
                self.equipment.replace(slot, item);
            }
            _ => self.inventory.push(item),
        }
    }
}
