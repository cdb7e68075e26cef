//! The sleeping/deactivation state machine (§4.9): ACTIVE -> CANDIDATE ->
//! SLEEPING per island, with wake triggers handled by the caller
//! ([`crate::world::World::activate`], `apply_force`, pose mutation, or a
//! fresh collision against an active body).

use crate::body::{Body, SleepState};
use crate::math::Scalar;

/// Updates one island's sleep state in place, per §4.7d/§4.9. `bodies` is
/// indexed by the registry's dense storage index; `island` lists the
/// indices belonging to this island.
pub fn update_island(
    bodies: &mut [Option<Body>],
    island: &[usize],
    h: Scalar,
    linear_threshold: Scalar,
    angular_threshold: Scalar,
    deactivation_time_threshold: Scalar,
) {
    let all_below_threshold = island.iter().all(|&i| {
        let body = bodies[i].as_ref().expect("island references a live body");
        body.linear_velocity.length() < linear_threshold && body.angular_velocity.length() < angular_threshold
    });

    if !all_below_threshold {
        for &i in island {
            let body = bodies[i].as_mut().unwrap();
            body.deactivation_time = 0.0;
            body.sleep_state = SleepState::Active;
        }
        return;
    }

    for &i in island {
        let body = bodies[i].as_mut().unwrap();
        body.deactivation_time += h;
        if body.sleep_state == SleepState::Active {
            body.sleep_state = SleepState::Candidate;
        }
    }

    let all_ready = island
        .iter()
        .all(|&i| bodies[i].as_ref().unwrap().deactivation_time >= deactivation_time_threshold);
    if all_ready {
        for &i in island {
            bodies[i].as_mut().unwrap().sleep_state = SleepState::Sleeping;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::math::{Quaternion, Vector};

    fn still_body() -> Body {
        Body::new_dynamic(Vector::ZERO, Quaternion::IDENTITY, 1.0, Vec::new(), 0.5, 0.5, 0.0)
    }

    #[test]
    fn island_sleeps_after_deactivation_time_elapses() {
        let mut bodies = vec![Some(still_body())];
        for _ in 0..11 {
            update_island(&mut bodies, &[0], 0.1, 0.15, 0.15, 1.0);
        }
        assert_eq!(bodies[0].as_ref().unwrap().sleep_state, SleepState::Sleeping);
    }

    #[test]
    fn motion_resets_deactivation_timer() {
        let mut bodies = vec![Some(still_body())];
        update_island(&mut bodies, &[0], 0.5, 0.15, 0.15, 1.0);
        bodies[0].as_mut().unwrap().linear_velocity = Vector::new(5.0, 0.0, 0.0);
        update_island(&mut bodies, &[0], 0.5, 0.15, 0.15, 1.0);
        assert_eq!(bodies[0].as_ref().unwrap().deactivation_time, 0.0);
        assert_eq!(bodies[0].as_ref().unwrap().sleep_state, SleepState::Active);
    }
}
