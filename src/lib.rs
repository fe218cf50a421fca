//! This crate coordinates a live rotation of players waiting to play on a
//! limited number of physical courts: who plays next, which court is in
//! which match, and how outcomes (wins, losses, cancellations, post-hoc
//! corrections) feed back into the queue and player stats.
//!
//! ## Example usage
//! ```
//! use openplay::{MatchType, Rotation, Team};
//! use uuid::Uuid;
//!
//! let mut rotation = Rotation::new(Uuid::new_v4(), &[Uuid::new_v4()], true);
//!
//! let ann = Uuid::new_v4();
//! let ben = Uuid::new_v4();
//! let cam = Uuid::new_v4();
//! let dee = Uuid::new_v4();
//! for player in [ann, ben, cam, dee] {
//!     rotation.check_in(player, None);
//! }
//!
//! rotation.enqueue(MatchType::Doubles, &[ann, ben]).unwrap();
//! rotation.enqueue(MatchType::Doubles, &[cam, dee]).unwrap();
//!
//! let suggestion = rotation.suggest(MatchType::Doubles).unwrap();
//! let court_occupancy_id = rotation.courts[0].id;
//! let match_id = rotation
//!     .start_match(
//!         court_occupancy_id,
//!         suggestion.match_type,
//!         suggestion.teams.clone(),
//!         Some(&suggestion.entry_ids),
//!     )
//!     .unwrap();
//!
//! rotation.end_match(match_id, None, Some(Team::One)).unwrap();
//!
//! let rankings = rotation.rankings();
//! assert_eq!(rankings[0].wins, 1);
//! assert_eq!(rankings[0].rank, 1);
//! ```

mod court;
mod error;
mod fairness;
mod lifecycle;
mod queue;
mod rotation;
mod rotation_manager;
mod share;
mod suggest;

#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "server")]
mod sqlite_store;
#[cfg(feature = "server")]
pub mod validation;

#[cfg(test)]
mod tests;

pub use court::*;
pub use error::*;
pub use fairness::{NEVER_PLAYED_REST_MINUTES, fairness_score};
pub use lifecycle::*;
pub use queue::*;
pub use rotation::*;
pub use rotation_manager::*;
pub use share::{share_code_to_uuid, uuid_to_share_code};
pub use suggest::*;
