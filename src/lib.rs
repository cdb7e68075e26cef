//! `rigid3d`: a real-time 3D rigid-body simulator built on Extended
//! Position-Based Dynamics (XPBD).
//!
//! The simulation loop lives on [`World`]: register bodies and colliders,
//! optionally wire up [`constraints::Constraint`]s between them, then call
//! [`World::step`] once per frame. Collision constraints are rebuilt every
//! substep from the broad/narrow phase; everything else persists until
//! removed.
//!
//! ```
//! use rigid3d::prelude::*;
//!
//! let mut world = World::new();
//! let ground = world.add_fixed_body(
//!     Vector::new(0.0, 0.0, 0.0),
//!     Quaternion::IDENTITY,
//!     vec![Collider::sphere(Vector::ZERO, 50.0)],
//! );
//! let ball = world.add_body(
//!     Vector::new(0.0, 52.0, 0.0),
//!     Quaternion::IDENTITY,
//!     1.0,
//!     vec![Collider::sphere(Vector::ZERO, 1.0)],
//!     0.5,
//!     0.3,
//!     0.2,
//! );
//! let _ = ground;
//! let _ = world.step(1.0 / 60.0);
//! assert!(world.get(ball).is_some());
//! ```

pub mod body;
pub mod collider;
pub mod collision;
pub mod constraints;
pub mod error;
pub mod math;
pub mod solver;
pub mod world;

pub mod prelude {
    //! The common import set for building and stepping a [`super::World`].
    pub use crate::body::{AppliedForce, Body, BodyId, SleepState};
    pub use crate::collider::{build_convex_hull, Collider};
    pub use crate::constraints::{
        AngularConstraint, CollisionConstraint, Constraint, HingeJoint, HingeLimit, PositionalConstraint,
        SphericalJoint, SphericalLimit,
    };
    pub use crate::error::{PhysicsError, PhysicsResult};
    pub use crate::math::{Quaternion, Scalar, Vector};
    pub use crate::solver::{SolverConfig, StepDiagnostics};
    pub use crate::world::{ConstraintId, World};
}

pub use prelude::*;
