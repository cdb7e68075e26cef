//! End-to-end scenarios, run purely through the public `World` API.

use rigid3d::prelude::*;

const DT: Scalar = 1.0 / 60.0;

fn box_collider(half_extents: Vector) -> Collider {
    let e = half_extents;
    let vertices = vec![
        Vector::new(-e.x, -e.y, -e.z), // 0
        Vector::new(e.x, -e.y, -e.z),  // 1
        Vector::new(e.x, e.y, -e.z),   // 2
        Vector::new(-e.x, e.y, -e.z),  // 3
        Vector::new(-e.x, -e.y, e.z),  // 4
        Vector::new(e.x, -e.y, e.z),   // 5
        Vector::new(e.x, e.y, e.z),    // 6
        Vector::new(-e.x, e.y, e.z),   // 7
    ];
    let triangles: Vec<[u32; 3]> = vec![
        [0, 2, 1],
        [0, 3, 2], // -z
        [4, 5, 6],
        [4, 6, 7], // +z
        [0, 7, 3],
        [0, 4, 7], // -x
        [1, 2, 6],
        [1, 6, 5], // +x
        [0, 1, 5],
        [0, 5, 4], // -y
        [3, 7, 6],
        [3, 6, 2], // +y
    ];
    let hull = build_convex_hull(&vertices, &triangles).expect("box vertices/triangles are well formed");
    Collider::convex_hull(hull)
}

fn ground_world() -> (World, BodyId) {
    let mut world = World::new();
    world.gravity = Vector::new(0.0, -10.0, 0.0);
    let ground = world.add_fixed_body(
        Vector::new(0.0, -2.0, 0.0),
        Quaternion::IDENTITY,
        vec![box_collider(Vector::new(25.0, 0.5, 25.0))],
    );
    (world, ground)
}

#[test]
fn resting_cube_settles_on_ground() {
    let (mut world, _ground) = ground_world();
    let cube = world.add_body(
        Vector::new(0.0, 2.0, 0.0),
        Quaternion::IDENTITY,
        1.0,
        vec![box_collider(Vector::new(0.5, 0.5, 0.5))],
        0.5,
        0.5,
        0.0,
    );

    for _ in 0..(2.0 / DT) as u32 {
        world.step(DT);
    }

    let body = world.get(cube).unwrap();
    assert!(
        body.position.y >= -1.1 && body.position.y <= -0.9,
        "cube settled at y = {}",
        body.position.y
    );
    assert!(body.linear_velocity.length() < 0.2, "‖v‖ = {}", body.linear_velocity.length());
    assert!(body.orientation.x.abs() < 0.05 && body.orientation.y.abs() < 0.05 && body.orientation.z.abs() < 0.05);
}

#[test]
fn sphere_rebounds_after_bouncing() {
    let (mut world, _ground) = ground_world();
    let sphere = world.add_body(
        Vector::new(0.0, 5.0, 0.0),
        Quaternion::IDENTITY,
        1.0,
        vec![Collider::sphere(Vector::ZERO, 1.0)],
        0.0,
        0.0,
        0.8,
    );

    let contact_height = -0.5; // ground top (-1.5) + sphere radius (1.0)
    let mut was_falling = false;
    let mut rebounded = false;
    let mut peak_after_bounce = contact_height;
    let mut prev_y = world.get(sphere).unwrap().position.y;

    for _ in 0..(3.0 / DT) as u32 {
        world.step(DT);
        let y = world.get(sphere).unwrap().position.y;
        if y < prev_y {
            was_falling = true;
        }
        if was_falling && y > prev_y && y > contact_height + 0.05 {
            rebounded = true;
        }
        if rebounded {
            peak_after_bounce = peak_after_bounce.max(y);
        }
        prev_y = y;
    }

    assert!(rebounded, "sphere never left the ground after falling");
    assert!(
        peak_after_bounce > contact_height + 1.0 && peak_after_bounce < 5.0,
        "first rebound peak y = {peak_after_bounce}"
    );
}

#[test]
fn brick_wall_stack_is_stable() {
    let (mut world, _ground) = ground_world();
    let half = Vector::new(1.0, 0.5, 0.5);
    let xs = [-3.0, -1.0, 1.0, 3.0];
    let mut bricks = Vec::new();
    for row in 0..6u32 {
        let y = -1.0 + row as f64;
        for &x in &xs {
            let id = world.add_body(Vector::new(x, y, 0.0), Quaternion::IDENTITY, 1.0, vec![box_collider(half)], 0.5, 0.4, 0.0);
            bricks.push((id, y));
        }
    }

    for _ in 0..(3.0 / DT) as u32 {
        world.step(DT);
    }

    for (id, initial_y) in bricks {
        let y = world.get(id).unwrap().position.y;
        assert!((y - initial_y).abs() < 0.05, "brick drifted from {initial_y} to {y}");
    }
}

#[test]
fn hinge_lever_never_passes_its_angular_limit() {
    let mut world = World::new();
    world.gravity = Vector::new(0.0, -10.0, 0.0);

    let support = world.add_fixed_body(Vector::ZERO, Quaternion::IDENTITY, vec![Collider::sphere(Vector::ZERO, 0.1)]);
    let lever = world.add_body(
        Vector::new(1.0, 0.0, 0.0),
        Quaternion::IDENTITY,
        1.0,
        vec![Collider::sphere(Vector::new(1.0, 0.0, 0.0), 0.2)],
        0.0,
        0.0,
        0.0,
    );

    let limit = 0.9 * std::f64::consts::PI;
    let joint = HingeJoint::new(
        support,
        lever,
        Vector::ZERO,
        Vector::new(-1.0, 0.0, 0.0),
        Vector::Z,
        Vector::Z,
        0.0,
    )
    .with_limit(HingeLimit {
        limit_axis1_local: Vector::X,
        limit_axis2_local: Vector::X,
        lower: -limit,
        upper: limit,
    });
    world.add_constraint(Constraint::Hinge(joint)).unwrap();

    fn signed_angle(axis: Vector, from: Vector, to: Vector) -> Scalar {
        axis.dot(from.cross(to)).atan2(from.dot(to))
    }

    let mut max_abs_angle: Scalar = 0.0;
    for _ in 0..(4.0 / DT) as u32 {
        world.step(DT);
        let orientation = world.get(lever).unwrap().orientation;
        let current = orientation * Vector::X;
        let angle = signed_angle(Vector::Z, Vector::X, current);
        max_abs_angle = max_abs_angle.max(angle.abs());
        assert!(angle.abs() <= limit + 0.1, "swing angle {angle} exceeded the limit {limit}");
    }

    assert!(max_abs_angle > limit - 0.5, "lever never approached its limit (max = {max_abs_angle})");
}

#[test]
fn positional_spring_oscillation_decays() {
    let mut world = World::new();
    world.gravity = Vector::new(0.0, -10.0, 0.0);

    let anchor = world.add_fixed_body(Vector::new(0.0, 5.0, 0.0), Quaternion::IDENTITY, vec![]);
    let hanging = world.add_body(
        Vector::new(0.0, 5.0, 0.0),
        Quaternion::IDENTITY,
        1.0,
        vec![Collider::sphere(Vector::ZERO, 0.1)],
        0.0,
        0.0,
        0.0,
    );

    let constraint = PositionalConstraint::new(hanging, anchor, Vector::ZERO, Vector::ZERO, 0.001)
        .with_target_offset(Vector::new(0.0, -3.0, 0.0));
    world.add_constraint(Constraint::Positional(constraint)).unwrap();

    let mut early_max_deviation: Scalar = 0.0;
    let mut late_max_deviation: Scalar = 0.0;
    for step in 0..50u32 {
        world.step(DT);
        let y = world.get(hanging).unwrap().position.y;
        let deviation = (y - (5.0 - 3.0)).abs();
        if step < 10 {
            early_max_deviation = early_max_deviation.max(deviation);
        } else if step >= 40 {
            late_max_deviation = late_max_deviation.max(deviation);
        }
    }

    assert!(
        late_max_deviation < early_max_deviation,
        "oscillation did not decay: early = {early_max_deviation}, late = {late_max_deviation}"
    );
}

#[test]
fn stack_sleeps_and_reactivates() {
    let (mut world, _ground) = ground_world();
    world.config.linear_sleep_threshold = 0.15;
    world.config.angular_sleep_threshold = 0.15;
    world.config.deactivation_time = 1.0;

    let half = Vector::new(0.5, 0.5, 0.5);
    let bottom = world.add_body(Vector::new(0.0, -1.0, 0.0), Quaternion::IDENTITY, 1.0, vec![box_collider(half)], 0.5, 0.5, 0.0);
    let middle = world.add_body(Vector::new(0.0, 0.0, 0.0), Quaternion::IDENTITY, 1.0, vec![box_collider(half)], 0.5, 0.5, 0.0);
    let top = world.add_body(Vector::new(0.0, 1.0, 0.0), Quaternion::IDENTITY, 1.0, vec![box_collider(half)], 0.5, 0.5, 0.0);

    for _ in 0..(4.0 / DT) as u32 {
        world.step(DT);
    }

    for id in [bottom, middle, top] {
        let body = world.get(id).unwrap();
        assert_eq!(body.sleep_state, SleepState::Sleeping, "body never fell asleep");
        // Sleeping only guarantees the velocity was below the sleep threshold
        // for a full `deactivation_time`, not that it's exactly zero.
        assert!(body.linear_velocity.length() < world.config.linear_sleep_threshold);
        assert!(body.angular_velocity.length() < world.config.angular_sleep_threshold);
    }

    world.activate(top).unwrap();
    world.step(DT);

    for id in [bottom, middle, top] {
        let body = world.get(id).unwrap();
        assert!(body.is_active(), "body stayed asleep after activating the stack");
    }
}
