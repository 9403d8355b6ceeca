//! Draws gift exchange partners.
//!
//! Every participant gives exactly one gift and receives exactly one gift, nobody draws
//! themselves and nobody draws someone they share an exclusion with. In other words this
//! searches for a derangement of the participants that avoids a set of forbidden pairs.
//!
//! The pieces are used in this order:
//!
//! 1. [`EligibilityGraph::build`] turns a roster and an [`ExclusionSet`] into the receivers
//!    each giver may draw.
//! 2. [`Assigner::assign`] searches that graph with randomized backtracking.
//! 3. [`validate`] checks a finished [`Assignment`] without knowing how it was produced.
//!
//! ```
//! use std::collections::BTreeSet;
//!
//! use gift_exchange_optimizer::{validate, Assigner, EligibilityGraph, Exclusion, ExclusionSet};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng as _;
//!
//! let participants: BTreeSet<&str> = ["ana", "ben", "cleo", "dan"].into_iter().collect();
//! let exclusions: ExclusionSet<&str> = [Exclusion::new("ana", "ben").unwrap()].into_iter().collect();
//!
//! let graph = EligibilityGraph::build(&participants, &exclusions);
//! let roster: Vec<&str> = participants.iter().copied().collect();
//! let assignment = Assigner::default()
//!     .assign(&roster, &graph, &mut StdRng::seed_from_u64(7))
//!     .unwrap();
//!
//! assert!(validate(&assignment, &participants, &exclusions));
//! assert_ne!(assignment.receiver_of(&"ana"), Some(&"ben"));
//! ```

extern crate alloc;

pub mod assigner;
pub mod assignment;
pub mod eligibility;
pub mod error;
pub mod exclusion;

pub use assigner::Assigner;
pub use assignment::{validate, Assignment, Pairing, Violation};
pub use eligibility::EligibilityGraph;
pub use error::{DrawError, ExclusionError};
pub use exclusion::{Exclusion, ExclusionSet};
