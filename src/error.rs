//! Error types returned from fallible constructors and configuration entry
//! points. Per-step numerical issues (GJK/EPA non-convergence) are not
//! represented here — they are logged and recovered locally, see
//! [`crate::solver`].

use thiserror::Error;

/// The five error kinds a caller of this crate can observe.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// GJK or EPA failed to converge within its iteration cap. Callers never
    /// see this as an `Err` from [`crate::World::step`] — it is logged via
    /// `tracing::warn!` and the offending pair is skipped for that step —
    /// but collider-construction paths that run the same algorithms
    /// (degenerate hull checks) surface it here.
    #[error("collision algorithm failed to converge after {iterations} iterations")]
    CollisionAlgorithmDivergence { iterations: u32 },

    /// A matrix that was required to be invertible (an inertia tensor, a
    /// constraint gradient system) was numerically singular.
    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// A [`crate::SolverConfig`] field was outside its valid range (e.g. zero
    /// substeps, a negative compliance).
    #[error("invalid solver configuration: {0}")]
    InvalidConfiguration(String),

    /// A [`crate::BodyId`] or constraint handle did not refer to a body or
    /// constraint currently registered in the `World`.
    #[error("identity does not refer to a live body or constraint")]
    UnknownIdentity,

    /// A collider's input geometry could not produce a valid convex hull
    /// (fewer than four non-coplanar vertices, zero-volume, duplicate-only
    /// points).
    #[error("collider geometry is degenerate: {0}")]
    DegenerateGeometry(String),
}

/// `Result` alias used throughout the crate's public API.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
