//! Item components: tools, protections, the winning item and teleport devices.
//!
//! Items are a closed set of kinds with capability flags instead of a class
//! hierarchy. A decoy is an ordinary item with `decoy` set; its passive hook
//! always fails (protections) or always admits pickup (winning item).

use super::ids::{ActorId, ItemId, RoomId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Charge value for items that are never used up.
pub const UNLIMITED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Clears the toxic flag of the holder's room.
    AirFreshener,
    /// Makes the student drunk and forces it to drop another item.
    Beer,
    /// Makes the holder's room toxic.
    MoldCheese,
    /// Makes the holder's room wet.
    WetSponge,
    /// Passive protection against toxic rooms.
    Respirator,
    /// Passive protection against professors.
    ConductPass,
    /// Picking it up as a student wins the game.
    WinningItem,
    /// Paired teleport device.
    Teleport,
}

impl ItemKind {
    pub const ALL: [ItemKind; 8] = [
        ItemKind::AirFreshener,
        ItemKind::Beer,
        ItemKind::MoldCheese,
        ItemKind::WetSponge,
        ItemKind::Respirator,
        ItemKind::ConductPass,
        ItemKind::WinningItem,
        ItemKind::Teleport,
    ];

    /// Resolve a registry token into a kind and its decoy flag.
    pub fn from_token(token: &str) -> Option<(ItemKind, bool)> {
        let (name, decoy) = match token.strip_prefix("Fake") {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        let kind = ItemKind::ALL.into_iter().find(|k| k.name() == name)?;
        if decoy && !kind.has_decoy() {
            return None;
        }
        Some((kind, decoy))
    }

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::AirFreshener => "AirFreshener",
            ItemKind::Beer => "Beer",
            ItemKind::MoldCheese => "MoldCheese",
            ItemKind::WetSponge => "WetSponge",
            ItemKind::Respirator => "Respirator",
            ItemKind::ConductPass => "ConductPass",
            ItemKind::WinningItem => "WinningItem",
            ItemKind::Teleport => "Teleport",
        }
    }

    /// Whether a decoy variant of this kind exists.
    pub fn has_decoy(self) -> bool {
        matches!(
            self,
            ItemKind::Respirator | ItemKind::ConductPass | ItemKind::WinningItem
        )
    }

    pub fn initial_charges(self) -> i32 {
        match self {
            ItemKind::Respirator => 3,
            ItemKind::WinningItem | ItemKind::Teleport => UNLIMITED,
            _ => 1,
        }
    }

    pub fn protects_against_toxic(self) -> bool {
        self == ItemKind::Respirator
    }

    pub fn protects_against_professor(self) -> bool {
        self == ItemKind::ConductPass
    }
}

/// Who currently owns an item. Exactly one owner at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Room(RoomId),
    Actor(ActorId),
}

/// Item component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) kind: ItemKind,
    pub(crate) decoy: bool,
    /// Remaining uses. `UNLIMITED` for items without a use counter.
    pub(crate) charges: i32,
    /// Mutual pairing, only ever set between two teleport devices.
    pub(crate) pair: Option<ItemId>,
    pub(crate) owner: Owner,
    /// Teleport only: set while the device sits in a room as a destination.
    pub(crate) deployed: bool,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind, decoy: bool, owner: Owner) -> Self {
        Self {
            id,
            kind,
            decoy: decoy && kind.has_decoy(),
            charges: kind.initial_charges(),
            pair: None,
            owner,
            deployed: false,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn is_decoy(&self) -> bool {
        self.decoy
    }

    pub fn charges(&self) -> i32 {
        self.charges
    }

    pub fn pair(&self) -> Option<ItemId> {
        self.pair
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    pub fn is_winning_item(&self) -> bool {
        self.kind == ItemKind::WinningItem && !self.decoy
    }

    /// Registry token, e.g. `FakeRespirator`.
    pub fn token(&self) -> String {
        if self.decoy {
            format!("Fake{}", self.kind.name())
        } else {
            self.kind.name().to_string()
        }
    }

    /// Use one charge if any is left.
    pub(crate) fn spend_charge(&mut self) -> bool {
        if self.charges <= 0 {
            return false;
        }
        self.charges -= 1;
        true
    }

    /// Passive hook consulted when a toxic room poisons the holder.
    pub(crate) fn protect_against_toxic(&mut self) -> bool {
        self.kind.protects_against_toxic() && !self.decoy && self.spend_charge()
    }

    /// Passive hook consulted when a professor tries to kill the holder.
    pub(crate) fn protect_against_professor(&mut self) -> bool {
        self.kind.protects_against_professor() && !self.decoy && self.spend_charge()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.token(), self.id.0)
    }
}
