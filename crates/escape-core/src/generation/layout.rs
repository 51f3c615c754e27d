//! World layouts - declarative JSON descriptions of a campus

use serde::{Deserialize, Serialize};

use crate::components::Hazard;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    /// Name other entries use to refer to this room.
    pub key: String,
    pub capacity: u32,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub from: String,
    pub to: String,
    /// If set, the door only opens from `from` to `to`.
    #[serde(default)]
    pub one_way: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSpec {
    pub name: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliarySpec {
    /// `Professor` or `CleaningLady`.
    pub kind: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Item token, e.g. `Beer` or `FakeRespirator`.
    pub kind: String,
    /// A room key or a student name.
    pub owner: String,
}

/// A complete campus description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    pub rooms: Vec<RoomSpec>,
    pub doors: Vec<DoorSpec>,
    pub students: Vec<StudentSpec>,
    pub auxiliaries: Vec<AuxiliarySpec>,
    pub items: Vec<ItemSpec>,
}

impl WorldLayout {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn room(key: &str, capacity: u32, hazards: &[Hazard]) -> RoomSpec {
    RoomSpec {
        key: key.to_string(),
        capacity,
        hazards: hazards.to_vec(),
    }
}

fn door(from: &str, to: &str, one_way: bool) -> DoorSpec {
    DoorSpec {
        from: from.to_string(),
        to: to.to_string(),
        one_way,
    }
}

fn item(kind: &str, owner: &str) -> ItemSpec {
    ItemSpec {
        kind: kind.to_string(),
        owner: owner.to_string(),
    }
}

/// Built-in seven-room campus with two students, a professor and a
/// cleaning lady.
pub fn demo_layout() -> WorldLayout {
    WorldLayout {
        rooms: vec![
            room("lobby", 4, &[]),
            room("corridor", 3, &[]),
            room("library", 3, &[Hazard::Sticky]),
            room("lab", 2, &[Hazard::Toxic]),
            room("cellar", 2, &[Hazard::Wet, Hazard::Cursed]),
            room("lecture_hall", 5, &[]),
            room("office", 2, &[]),
        ],
        doors: vec![
            door("lobby", "corridor", false),
            door("corridor", "library", false),
            door("corridor", "lab", false),
            door("lab", "cellar", true),
            door("cellar", "lecture_hall", false),
            door("corridor", "lecture_hall", false),
            door("lecture_hall", "office", false),
        ],
        students: vec![
            StudentSpec {
                name: "anna".to_string(),
                room: "lobby".to_string(),
            },
            StudentSpec {
                name: "bela".to_string(),
                room: "lobby".to_string(),
            },
        ],
        auxiliaries: vec![
            AuxiliarySpec {
                kind: "Professor".to_string(),
                room: "lecture_hall".to_string(),
            },
            AuxiliarySpec {
                kind: "CleaningLady".to_string(),
                room: "library".to_string(),
            },
        ],
        items: vec![
            item("Respirator", "anna"),
            item("Beer", "bela"),
            item("Teleport", "lobby"),
            item("Teleport", "lobby"),
            item("AirFreshener", "corridor"),
            item("FakeConductPass", "library"),
            item("ConductPass", "lab"),
            item("WetSponge", "cellar"),
            item("MoldCheese", "lecture_hall"),
            item("FakeWinningItem", "lecture_hall"),
            item("FakeRespirator", "office"),
            item("WinningItem", "office"),
        ],
    }
}
