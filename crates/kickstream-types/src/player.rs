//! Player reference data.
//!
//! The player table is a static lookup that the display layer joins
//! against `Event::player_id`. It is loaded once, never mutated, and shared
//! by reference ([`std::sync::Arc`]) with whatever needs it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::PlayerId;

/// Descriptive record for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Player identifier referenced by events.
    pub id: PlayerId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Shirt number, kept as text (`"7"`).
    pub number: String,
}

impl Player {
    /// `"First Last"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Roster shipped with the server: `(id, first, last, number)`.
const BUILTIN_ROSTER: [(&str, &str, &str, &str); 15] = [
    ("player-1", "Cristiano", "Ronaldo", "7"),
    ("player-2", "Lionel", "Messi", "10"),
    ("player-3", "Neymar", "Jr", "11"),
    ("player-4", "Kevin", "De Bruyne", "17"),
    ("player-5", "Kylian", "Mbappé", "9"),
    ("player-6", "Mohamed", "Salah", "11"),
    ("player-7", "Robert", "Lewandowski", "9"),
    ("player-8", "Virgil", "van Dijk", "4"),
    ("player-9", "Luka", "Modrić", "10"),
    ("player-10", "Harry", "Kane", "9"),
    ("player-11", "Erling", "Haaland", "9"),
    ("player-12", "Bruno", "Fernandes", "8"),
    ("player-13", "Raheem", "Sterling", "7"),
    ("player-14", "Sadio", "Mané", "10"),
    ("player-15", "Joshua", "Kimmich", "6"),
];

/// Immutable, ordered player lookup table.
///
/// Preserves the order players were supplied in (that is the order
/// `GET /players` returns) and indexes them by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerDirectory {
    players: Vec<Player>,
    index: BTreeMap<PlayerId, usize>,
}

impl PlayerDirectory {
    /// Build a directory from a list of players.
    ///
    /// If an id appears more than once, the first occurrence wins for
    /// lookups; every record is still listed by [`all`](Self::all).
    pub fn new(players: Vec<Player>) -> Self {
        let mut index = BTreeMap::new();
        for (pos, player) in players.iter().enumerate() {
            index.entry(player.id.clone()).or_insert(pos);
        }
        Self { players, index }
    }

    /// The fifteen-player roster served by default.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ROSTER
                .iter()
                .map(|&(id, first, last, number)| Player {
                    id: PlayerId::new(id),
                    first_name: first.to_owned(),
                    last_name: last.to_owned(),
                    number: number.to_owned(),
                })
                .collect(),
        )
    }

    /// All players in table order.
    pub fn all(&self) -> &[Player] {
        &self.players
    }

    /// Look up a player by id.
    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.index.get(id).and_then(|&pos| self.players.get(pos))
    }

    /// Whether the table has a record for `id`.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterate over the player ids in table order.
    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.iter().map(|p| &p.id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl From<Vec<Player>> for PlayerDirectory {
    fn from(players: Vec<Player>) -> Self {
        Self::new(players)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roster_is_complete() {
        let dir = PlayerDirectory::builtin();
        assert_eq!(dir.len(), 15);
        assert_eq!(dir.all().first().unwrap().id.as_str(), "player-1");
        assert_eq!(dir.all().last().unwrap().id.as_str(), "player-15");
    }

    #[test]
    fn lookup_by_id() {
        let dir = PlayerDirectory::builtin();
        let messi = dir.get(&PlayerId::new("player-2")).unwrap();
        assert_eq!(messi.full_name(), "Lionel Messi");
        assert_eq!(messi.number, "10");
        assert!(dir.get(&PlayerId::new("player-99")).is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let a = Player {
            id: PlayerId::new("p"),
            first_name: "A".to_owned(),
            last_name: "One".to_owned(),
            number: "1".to_owned(),
        };
        let b = Player {
            first_name: "B".to_owned(),
            ..a.clone()
        };
        let dir = PlayerDirectory::new(vec![a, b]);
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get(&PlayerId::new("p")).unwrap().first_name, "A");
    }

    #[test]
    fn player_wire_shape() {
        let dir = PlayerDirectory::builtin();
        let value = serde_json::to_value(dir.all().first().unwrap()).unwrap();
        assert_eq!(value["id"], "player-1");
        assert_eq!(value["firstName"], "Cristiano");
        assert_eq!(value["lastName"], "Ronaldo");
        assert_eq!(value["number"], "7");
    }
}
