//! Synthetic event generation.
//!
//! [`EventSource`] is the seam through which the ticker obtains new
//! events. [`RandomEventSource`] is the default implementation: uniformly
//! random balls, players, and contact types with measurements drawn from
//! fixed ranges and rounded to two decimals.

use std::ops::Range;

use kickstream_types::{BallId, Event, EventId, EventType, PlayerDirectory, PlayerId};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Balls in play.
pub const BALL_IDS: [&str; 3] = ["ball-a", "ball-b", "ball-c"];

/// Ball speed range in km/h.
pub const SPEED_RANGE: Range<f64> = 20.0..120.0;

/// Peak height range in meters.
pub const MAX_HEIGHT_RANGE: Range<f64> = 1.0..31.0;

/// Spin range in RPM.
pub const SPIN_RANGE: Range<f64> = 500.0..3500.0;

/// Errors that can occur while producing an event.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source has no players to attribute events to.
    #[error("no players available to generate events for")]
    NoPlayers,

    /// Any other generation failure.
    #[error("event generation failed: {message}")]
    Generation {
        /// Description of the failure.
        message: String,
    },
}

/// A producer of new events.
///
/// Called once per tick by the [`Ticker`](crate::ticker::Ticker). A
/// failure skips that tick only.
pub trait EventSource: Send {
    /// Produce the next event.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if no event could be produced this time.
    fn next_event(&mut self) -> Result<Event, SourceError>;
}

/// Uniformly random kick/pass generator.
#[derive(Debug)]
pub struct RandomEventSource {
    rng: StdRng,
    players: Vec<PlayerId>,
    balls: Vec<BallId>,
}

impl RandomEventSource {
    /// Create a source drawing players from `directory`, seeded from the OS.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NoPlayers`] if the directory is empty.
    pub fn new(directory: &PlayerDirectory) -> Result<Self, SourceError> {
        Self::from_rng(directory, StdRng::from_os_rng())
    }

    /// Create a reproducible source from a fixed seed.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NoPlayers`] if the directory is empty.
    pub fn with_seed(directory: &PlayerDirectory, seed: u64) -> Result<Self, SourceError> {
        Self::from_rng(directory, StdRng::seed_from_u64(seed))
    }

    fn from_rng(directory: &PlayerDirectory, rng: StdRng) -> Result<Self, SourceError> {
        if directory.is_empty() {
            return Err(SourceError::NoPlayers);
        }
        Ok(Self {
            rng,
            players: directory.ids().cloned().collect(),
            balls: BALL_IDS.iter().map(|&b| BallId::new(b)).collect(),
        })
    }

    fn measurement(&mut self, range: Range<f64>) -> f64 {
        round_2dp(self.rng.random_range(range))
    }
}

impl EventSource for RandomEventSource {
    fn next_event(&mut self) -> Result<Event, SourceError> {
        let player_id = self
            .players
            .choose(&mut self.rng)
            .cloned()
            .ok_or(SourceError::NoPlayers)?;
        let ball_id = self
            .balls
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| SourceError::Generation {
                message: "no balls configured".to_owned(),
            })?;
        let event_type = if self.rng.random_bool(0.5) {
            EventType::Kick
        } else {
            EventType::Pass
        };

        Ok(Event {
            id: EventId::generate(),
            ball_id,
            player_id,
            event_type,
            speed: self.measurement(SPEED_RANGE),
            max_height: self.measurement(MAX_HEIGHT_RANGE),
            spin: self.measurement(SPIN_RANGE),
        })
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn empty_directory_is_rejected() {
        let result = RandomEventSource::new(&PlayerDirectory::default());
        assert!(matches!(result, Err(SourceError::NoPlayers)));
    }

    #[test]
    fn generated_events_stay_in_range() {
        let directory = PlayerDirectory::builtin();
        let mut source = RandomEventSource::with_seed(&directory, 7).unwrap();
        for _ in 0..500 {
            let e = source.next_event().unwrap();
            // Rounding can land exactly on the upper bound.
            assert!((SPEED_RANGE.start..=SPEED_RANGE.end).contains(&e.speed));
            assert!((MAX_HEIGHT_RANGE.start..=MAX_HEIGHT_RANGE.end).contains(&e.max_height));
            assert!((SPIN_RANGE.start..=SPIN_RANGE.end).contains(&e.spin));
            assert!(directory.contains(&e.player_id));
            assert!(BALL_IDS.contains(&e.ball_id.as_str()));
        }
    }

    #[test]
    fn measurements_have_two_decimals() {
        let directory = PlayerDirectory::builtin();
        let mut source = RandomEventSource::with_seed(&directory, 11).unwrap();
        for _ in 0..100 {
            let e = source.next_event().unwrap();
            for v in [e.speed, e.max_height, e.spin] {
                assert!((v * 100.0 - (v * 100.0).round()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn ids_are_unique_and_both_types_appear() {
        let directory = PlayerDirectory::builtin();
        let mut source = RandomEventSource::with_seed(&directory, 3).unwrap();
        let events: Vec<Event> = (0..200).map(|_| source.next_event().unwrap()).collect();

        let ids: HashSet<EventId> = events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), events.len());
        assert!(events.iter().any(|e| e.event_type == EventType::Kick));
        assert!(events.iter().any(|e| e.event_type == EventType::Pass));
    }

    #[test]
    fn same_seed_same_measurements() {
        let directory = PlayerDirectory::builtin();
        let mut a = RandomEventSource::with_seed(&directory, 99).unwrap();
        let mut b = RandomEventSource::with_seed(&directory, 99).unwrap();
        for _ in 0..10 {
            let (ea, eb) = (a.next_event().unwrap(), b.next_event().unwrap());
            assert_eq!(ea.player_id, eb.player_id);
            assert_eq!(ea.ball_id, eb.ball_id);
            assert_eq!(ea.speed.to_bits(), eb.speed.to_bits());
        }
    }
}
