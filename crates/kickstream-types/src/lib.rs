//! Shared wire types for the kickstream event feed.
//!
//! Everything that crosses the network lives here: the [`Event`] record
//! pushed to clients, the static [`Player`] reference table, and the
//! [`HealthReport`] served by the liveness probe. Field names are fixed by
//! existing consumers, so every struct pins its serde representation.
//!
//! Types flow downstream to `TypeScript` via `ts-rs` for the viewer
//! frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for events, balls, and players
//! - [`event`] -- The kick/pass [`Event`] record and [`EventType`]
//! - [`player`] -- [`Player`] records and the immutable [`PlayerDirectory`]
//! - [`health`] -- [`HealthReport`] for `GET /health`

pub mod event;
pub mod health;
pub mod ids;
pub mod player;

pub use event::{Event, EventType};
pub use health::HealthReport;
pub use ids::{BallId, EventId, PlayerId};
pub use player::{Player, PlayerDirectory};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::BallId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::event::EventType::export_all();
        let _ = crate::event::Event::export_all();
        let _ = crate::player::Player::export_all();
        let _ = crate::health::HealthReport::export_all();
    }
}
