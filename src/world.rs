//! The registry and public library API (§6): the only entry point a caller
//! outside this crate uses.

use crate::body::{Body, BodyId, SleepState};
use crate::collider::Collider;
use crate::collision::broad_phase::{broad_phase_pairs, build_islands};
use crate::collision::gjk::gjk_intersect;
use crate::collision::manifold::contact_manifold;
use crate::constraints::{Constraint, CollisionConstraint};
use crate::error::{PhysicsError, PhysicsResult};
use crate::math::{Quaternion, Scalar, Vector};
use crate::solver::{self, sleeping, SolverConfig, StepDiagnostics};

/// Opaque handle to a registered constraint, returned by [`World::add_constraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId {
    index: u32,
    generation: u32,
}

/// The rigid-body registry and XPBD driver (§5: single-threaded, not
/// re-entrant; `step` runs to completion before returning).
pub struct World {
    bodies: Vec<Option<Body>>,
    body_generations: Vec<u32>,
    constraints: Vec<Option<Constraint>>,
    constraint_generations: Vec<u32>,
    pub config: SolverConfig,
    pub gravity: Vector,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        World {
            bodies: Vec::new(),
            body_generations: Vec::new(),
            constraints: Vec::new(),
            constraint_generations: Vec::new(),
            config: SolverConfig::default(),
            gravity: Vector::new(0.0, -9.81, 0.0),
        }
    }

    fn insert_body(&mut self, mut body: Body) -> BodyId {
        let index = self.bodies.len() as u32;
        let generation = 0;
        body.id = BodyId { index, generation };
        self.bodies.push(Some(body));
        self.body_generations.push(generation);
        BodyId { index, generation }
    }

    /// Registers a dynamic body (§6).
    pub fn add_body(
        &mut self,
        position: Vector,
        orientation: Quaternion,
        mass: Scalar,
        colliders: Vec<Collider>,
        static_friction: Scalar,
        dynamic_friction: Scalar,
        restitution: Scalar,
    ) -> BodyId {
        let body = Body::new_dynamic(
            position,
            orientation,
            mass,
            colliders,
            static_friction,
            dynamic_friction,
            restitution,
        );
        self.insert_body(body)
    }

    /// Registers a world-pinned body (§6).
    pub fn add_fixed_body(&mut self, position: Vector, orientation: Quaternion, colliders: Vec<Collider>) -> BodyId {
        let body = Body::new_fixed(position, orientation, colliders);
        self.insert_body(body)
    }

    fn resolve(&self, id: BodyId) -> Option<usize> {
        let index = id.index as usize;
        if self.body_generations.get(index) == Some(&id.generation) && self.bodies[index].is_some() {
            Some(index)
        } else {
            None
        }
    }

    /// Destroys a body; its `BodyId` becomes stale (§3's lifecycle).
    pub fn remove_body(&mut self, id: BodyId) -> PhysicsResult<()> {
        let index = self.resolve(id).ok_or(PhysicsError::UnknownIdentity)?;
        self.bodies[index] = None;
        self.body_generations[index] = self.body_generations[index].wrapping_add(1);
        Ok(())
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.resolve(id).and_then(|i| self.bodies[i].as_ref())
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        match self.resolve(id) {
            Some(i) => self.bodies[i].as_mut(),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter_map(|b| b.as_ref())
    }

    /// The current simulation islands (§3, §4.7c), recomputed from each live
    /// body's present bounding sphere. A caller-owned renderer can use this
    /// to color bodies by island/active-state without this crate depending
    /// on any color type (see SPEC_FULL.md's islands-vs-`Entity::color`
    /// supplement note).
    pub fn islands(&self) -> Vec<Vec<BodyId>> {
        let body_count = self.bodies.len();
        let mut positions = Vec::with_capacity(body_count);
        let mut radii = Vec::with_capacity(body_count);
        let mut fixed_flags = Vec::with_capacity(body_count);
        for body_opt in &self.bodies {
            match body_opt {
                Some(body) => {
                    positions.push(body.position);
                    radii.push(body.bounding_sphere_radius);
                    fixed_flags.push(body.fixed);
                }
                None => {
                    positions.push(Vector::ZERO);
                    radii.push(0.0);
                    fixed_flags.push(true);
                }
            }
        }
        let pairs = broad_phase_pairs(&positions, &radii, self.config.broad_phase_margin);
        let islands = build_islands(&pairs, &fixed_flags, body_count);
        islands
            .islands
            .into_iter()
            .map(|island| island.into_iter().map(|index| self.bodies[index].as_ref().unwrap().id).collect())
            .collect()
    }

    /// Registers a constraint; fails with `UnknownIdentity` if either
    /// referenced body is not live (§6, §7).
    pub fn add_constraint(&mut self, constraint: Constraint) -> PhysicsResult<ConstraintId> {
        let (id1, id2) = constraint.body_ids();
        if self.resolve(id1).is_none() || self.resolve(id2).is_none() {
            return Err(PhysicsError::UnknownIdentity);
        }
        let index = self.constraints.len() as u32;
        let generation = 0;
        self.constraints.push(Some(constraint));
        self.constraint_generations.push(generation);
        Ok(ConstraintId { index, generation })
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> PhysicsResult<()> {
        let index = id.index as usize;
        if self.constraint_generations.get(index) != Some(&id.generation) || self.constraints[index].is_none() {
            return Err(PhysicsError::UnknownIdentity);
        }
        self.constraints[index] = None;
        self.constraint_generations[index] = self.constraint_generations[index].wrapping_add(1);
        Ok(())
    }

    /// Enqueues a force for the next `step`; cleared at step end (§6).
    pub fn apply_force(&mut self, id: BodyId, point: Vector, force: Vector, world_space: bool) -> PhysicsResult<()> {
        let index = self.resolve(id).ok_or(PhysicsError::UnknownIdentity)?;
        let body = self.bodies[index].as_mut().unwrap();
        body.forces.push(crate::body::AppliedForce { point, force, world_space });
        body.wake();
        Ok(())
    }

    /// Wakes `id`'s island (§6, §4.9).
    pub fn activate(&mut self, id: BodyId) -> PhysicsResult<()> {
        let index = self.resolve(id).ok_or(PhysicsError::UnknownIdentity)?;
        self.bodies[index].as_mut().unwrap().wake();
        Ok(())
    }

    fn accumulate_external_force_torque(body: &Body, gravity: Vector) -> (Vector, Vector) {
        let mut force = body.mass * gravity;
        let mut torque = Vector::ZERO;
        for applied in &body.forces {
            force += applied.force;
            let r_world = if applied.world_space {
                applied.point - body.position
            } else {
                body.orientation * applied.point
            };
            torque += r_world.cross(applied.force);
        }
        (force, torque)
    }

    /// Advances the simulation by `dt`, running [`SolverConfig::substep_count`]
    /// substeps in the exact order of §4.7/§5. `dt == 0.0` is a no-op (§8).
    pub fn step(&mut self, dt: Scalar) -> StepDiagnostics {
        let mut diagnostics = StepDiagnostics::default();
        if dt == 0.0 {
            return diagnostics;
        }

        let h = dt / self.config.substep_count as Scalar;
        let body_count = self.bodies.len();

        for _ in 0..self.config.substep_count {
            diagnostics.substeps_run += 1;

            // Clear persistent user-constraint lambda accumulators (§3): each
            // substep solves a fresh XPBD problem, so `-alpha_tilde * lambda`
            // must not carry compliance state from the previous substep.
            for constraint in self.constraints.iter_mut().flatten() {
                constraint.reset_lambda();
            }

            // a. integrate predicted state for every non-fixed, non-sleeping body.
            for body_opt in self.bodies.iter_mut() {
                let Some(body) = body_opt else { continue };
                if body.fixed || body.sleep_state == SleepState::Sleeping {
                    continue;
                }
                let (force, torque) = Self::accumulate_external_force_torque(body, self.gravity);
                solver::integrate_body(body, force, torque, h);
            }

            // b. broad phase over every live body's current bounding sphere.
            let mut positions = Vec::with_capacity(body_count);
            let mut radii = Vec::with_capacity(body_count);
            let mut fixed_flags = Vec::with_capacity(body_count);
            let mut live = Vec::with_capacity(body_count);
            for body_opt in &self.bodies {
                match body_opt {
                    Some(body) => {
                        positions.push(body.position);
                        radii.push(body.bounding_sphere_radius);
                        fixed_flags.push(body.fixed);
                        live.push(true);
                    }
                    None => {
                        positions.push(Vector::ZERO);
                        radii.push(0.0);
                        fixed_flags.push(true);
                        live.push(false);
                    }
                }
            }
            let pairs: Vec<(usize, usize)> = broad_phase_pairs(&positions, &radii, self.config.broad_phase_margin)
                .into_iter()
                .filter(|&(i, j)| live[i] && live[j])
                .collect();
            diagnostics.broad_phase_pairs += pairs.len();

            // c. islands over non-fixed bodies.
            let islands = if self.config.enable_islands {
                build_islands(&pairs, &fixed_flags, body_count)
            } else {
                crate::collision::broad_phase::SimulationIslands {
                    islands: (0..body_count).filter(|&i| live[i] && !fixed_flags[i]).map(|i| vec![i]).collect(),
                }
            };
            diagnostics.islands = islands.islands.len();

            // d. sleeping update, per island.
            if self.config.enable_sleeping {
                for island in &islands.islands {
                    sleeping::update_island(
                        &mut self.bodies,
                        island,
                        h,
                        self.config.linear_sleep_threshold,
                        self.config.angular_sleep_threshold,
                        self.config.deactivation_time,
                    );
                }
            }

            // e. refresh every live body's collider world-cache.
            for body_opt in self.bodies.iter_mut() {
                if let Some(body) = body_opt {
                    body.refresh_collider_world_cache();
                }
            }

            // f. narrow phase, building one Collision constraint per contact point.
            let mut collision_constraints: Vec<CollisionConstraint> = Vec::new();
            for &(i, j) in &pairs {
                if fixed_flags[i] && fixed_flags[j] {
                    continue;
                }
                let both_sleeping = {
                    let bi = self.bodies[i].as_ref().unwrap();
                    let bj = self.bodies[j].as_ref().unwrap();
                    bi.sleep_state == SleepState::Sleeping && bj.sleep_state == SleepState::Sleeping
                };
                if both_sleeping {
                    continue;
                }

                let mut pair_contacts = Vec::new();
                {
                    let (body_i, body_j) = crate::constraints::two_mut(&mut self.bodies, i, j);
                    for collider_i in &body_i.colliders {
                        for collider_j in &body_j.colliders {
                            if gjk_intersect(collider_i, collider_j).is_none() {
                                continue;
                            }
                            for contact in contact_manifold(collider_i, collider_j) {
                                pair_contacts.push(contact);
                            }
                        }
                    }
                }
                if pair_contacts.is_empty() {
                    continue;
                }

                // Wake-on-collision: an active body touching a sleeping one
                // wakes that body's whole island (§4.9). Reset its "previous"
                // scratch to the current pose so velocity derivation below
                // treats this substep as the wake baseline rather than
                // replaying however many substeps it was asleep for.
                for &idx in &[i, j] {
                    let body = self.bodies[idx].as_mut().unwrap();
                    if body.sleep_state == SleepState::Sleeping {
                        body.wake();
                        body.previous_position = body.position;
                        body.previous_orientation = body.orientation;
                        body.previous_linear_velocity = body.linear_velocity;
                        body.previous_angular_velocity = body.angular_velocity;
                    }
                }

                let id_i = self.bodies[i].as_ref().unwrap().id;
                let id_j = self.bodies[j].as_ref().unwrap().id;
                let body_i = self.bodies[i].as_ref().unwrap();
                let body_j = self.bodies[j].as_ref().unwrap();
                for contact in pair_contacts {
                    let r1_local = body_i.orientation.inverse() * (contact.point_a - body_i.position);
                    let r2_local = body_j.orientation.inverse() * (contact.point_b - body_j.position);
                    collision_constraints.push(CollisionConstraint {
                        body1: id_i,
                        body2: id_j,
                        r1_local,
                        r2_local,
                        normal: contact.normal,
                        lambda_normal: 0.0,
                        lambda_tangent: 0.0,
                    });
                }
            }
            diagnostics.contacts_generated += collision_constraints.len();

            // g. positional solver: user constraints first, then collisions.
            let index_of = |id: BodyId| -> Option<usize> {
                let index = id.index as usize;
                if self.body_generations.get(index) == Some(&id.generation) {
                    Some(index)
                } else {
                    None
                }
            };
            for _ in 0..self.config.position_iterations {
                for constraint in self.constraints.iter_mut().flatten() {
                    constraint.solve(&mut self.bodies, index_of, h);
                    diagnostics.constraints_solved += 1;
                }
                for collision in collision_constraints.iter_mut() {
                    let (Some(i1), Some(i2)) = (index_of(collision.body1), index_of(collision.body2)) else {
                        continue;
                    };
                    let (body1, body2) = crate::constraints::two_mut(&mut self.bodies, i1, i2);
                    crate::constraints::solve_collision_normal(collision, body1, body2, h);
                    let static_friction = 0.5 * (body1.static_friction + body2.static_friction);
                    crate::constraints::solve_collision_static_friction(collision, body1, body2, static_friction, h);
                    diagnostics.constraints_solved += 1;
                }
            }

            // i. derive velocities for every non-fixed, non-sleeping body.
            for body_opt in self.bodies.iter_mut() {
                let Some(body) = body_opt else { continue };
                if body.fixed || body.sleep_state == SleepState::Sleeping {
                    continue;
                }
                solver::derive_velocities(body, h);
            }

            // j. velocity post-solve per collision constraint.
            for collision in &collision_constraints {
                let (Some(i1), Some(i2)) = (index_of(collision.body1), index_of(collision.body2)) else {
                    continue;
                };
                let (body1, body2) = crate::constraints::two_mut(&mut self.bodies, i1, i2);
                solver::velocity_post_solve(collision, body1, body2, &self.config, h);
            }
        }

        for body_opt in self.bodies.iter_mut() {
            if let Some(body) = body_opt {
                body.forces.clear();
            }
        }

        diagnostics
    }
}

