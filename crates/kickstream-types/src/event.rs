//! The kick/pass event record.
//!
//! An [`Event`] is created once by the event source and never mutated
//! afterwards. It is the unit that is appended to the log, served in
//! snapshots, and pushed over the live feed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{BallId, EventId, PlayerId};

/// The kind of ball contact an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventType {
    /// A kick.
    Kick,
    /// A pass to another player.
    Pass,
}

impl EventType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 2] = [Self::Kick, Self::Pass];

    /// The wire name of this variant.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kick => "Kick",
            Self::Pass => "Pass",
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable kick or pass with its measurements.
///
/// Wire shape (JSON, keys fixed):
///
/// ```json
/// {"id":"…","ballId":"ball-a","playerId":"player-7","type":"Kick",
///  "speed":88.12,"maxHeight":12.5,"spin":1520.0}
/// ```
///
/// The measurement fields carry no validity constraint beyond being
/// present. `playerId` is an unchecked reference into the player table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Unique event identifier, assigned at creation.
    pub id: EventId,
    /// The ball that was played.
    pub ball_id: BallId,
    /// The player who played it.
    pub player_id: PlayerId,
    /// Kick or pass.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Ball speed in km/h.
    pub speed: f64,
    /// Peak height of the ball in meters.
    pub max_height: f64,
    /// Spin in RPM.
    pub spin: f64,
}
