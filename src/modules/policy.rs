//! Take / wear / ignore decisions for an examined item.

use crate::modules::player::{Item, ItemKind, PlayerState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Ignore,
    /// Take and keep in the inventory.
    Carry,
    /// Take and wear, discarding the item currently in that slot.
    Equip { replaces: Option<Item> },
}

impl Decision {
    pub fn takes(&self) -> bool {
        !matches!(self, Decision::Ignore)
    }
}

/// Capacity check with a strict margin: `encumbrance + added - removed < strength`.
pub fn fits(player: &PlayerState, added: u32, removed: u32) -> bool {
    u64::from(player.encumbrance) + u64::from(added)
        < u64::from(player.strength) + u64::from(removed)
}

pub fn decide(item: &Item, player: &PlayerState) -> Decision {
    match item.kind {
        ItemKind::Treasure => {
            if fits(player, item.weight, 0) {
                Decision::Carry
            } else {
                Decision::Ignore
            }
        }
        ItemKind::Equippable(slot) => match player.equipment.get(slot) {
            None => {
                if fits(player, item.weight, 0) {
                    Decision::Equip { replaces: None }
                } else {
                    Decision::Ignore
                }
            }
            Some(worn) => {
                if item.level > worn.level && fits(player, item.weight, worn.weight) {
                    Decision::Equip {
                        replaces: Some(worn.clone()),
                    }
                } else {
                    Decision::Ignore
                }
            }
        },
        ItemKind::Other => Decision::Ignore,
    }
}
