//! The narrow- and broad-phase collision detection stack: support mapping,
//! GJK, EPA, contact-manifold clipping, and pair pruning with simulation
//! islands.

pub mod broad_phase;
pub mod epa;
pub mod gjk;
pub mod manifold;
pub mod support;

pub use broad_phase::{broad_phase_pairs, SimulationIslands};
pub use epa::epa;
pub use gjk::gjk_intersect;
pub use manifold::{contact_manifold, Contact};
