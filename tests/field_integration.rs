//! Integration tests for the motion field and its collision routines.

use glam::DVec2;
use rdk::collision::{resolve_pair, resolve_population};
use rdk::config::{FieldConfig, PatchGeometry};
use rdk::spatial::{QuadTree, Rect, SpatialConfig};
use rdk::spawn::PlacementConfig;
use rdk::{Agent, FieldError, Lifecycle, MotionField, MotionMode, Side};

fn random_dot(x: f64, y: f64, vx: f64, vy: f64, radius: f64) -> Agent {
    Agent::new(
        DVec2::new(x, y),
        DVec2::new(vx, vy),
        radius,
        MotionMode::Random,
        250.0,
        1000.0,
    )
}

/// Two 100 x 100 patches without outline, four random dots each.
fn sparse_config() -> FieldConfig {
    FieldConfig::new()
        .with_population(4)
        .with_dot_radius(5.0)
        .with_coherence(0.0)
        .with_geometry(PatchGeometry {
            width: 100.0,
            height: 100.0,
            gap: 10.0,
            outline_thickness: 0.0,
            ..Default::default()
        })
        .with_placement(PlacementConfig::Rejection {
            spacing: 2.0,
            max_attempts: 1000,
        })
}

// ============================================================================
// Containment
// ============================================================================

#[test]
fn test_four_dots_stay_in_patch_for_1000_frames() {
    let mut field = MotionField::with_seed(sparse_config(), 2024).unwrap();
    let eps = 1e-9;

    for _ in 0..1000 {
        field.update_dots(16.0).unwrap();
        for side in Side::ALL {
            let inner = field.patch(side).inner();
            for dot in field.agents(side) {
                let p = dot.position;
                assert!(p.x >= inner.min_x() + 5.0 - eps && p.x <= inner.max_x() - 5.0 + eps);
                assert!(p.y >= inner.min_y() + 5.0 - eps && p.y <= inner.max_y() - 5.0 + eps);
            }
        }
    }

    // Left patch sits at the origin, so its centres live in [5, 95].
    for dot in field.agents(Side::Left) {
        assert!((5.0 - 1e-9..=95.0 + 1e-9).contains(&dot.position.x));
        assert!((5.0 - 1e-9..=95.0 + 1e-9).contains(&dot.position.y));
    }
}

#[test]
fn test_containment_with_lattice_and_many_dots() {
    let config = FieldConfig::new()
        .with_population(80)
        .with_dot_radius(3.0)
        .with_speed(0.2)
        .with_coherence(0.0)
        .with_placement(PlacementConfig::Lattice {
            separation_multiplier: 1.5,
        })
        .with_lifecycle(Lifecycle::new().lifetime_range(200.0, 400.0));
    let mut field = MotionField::with_seed(config, 77).unwrap();

    for _ in 0..300 {
        field.update_dots(16.0).unwrap();
        for side in Side::ALL {
            let patch = *field.patch(side);
            for dot in field.agents(side) {
                assert!(patch.contains_circle(dot.position, dot.radius() - 1e-9));
            }
        }
    }
}

#[test]
fn test_modes_survive_respawns() {
    let config = FieldConfig::new()
        .with_population(30)
        .with_coherence(100.0)
        .with_lifecycle(Lifecycle::new().lifetime_range(100.0, 200.0));
    let mut field = MotionField::with_seed(config, 5).unwrap();
    let side = field.coherent_side();
    let direction = field.coherent_direction();

    for _ in 0..100 {
        field.update_dots(16.0).unwrap();
    }

    assert!(field
        .agents(side)
        .iter()
        .all(|a| a.mode() == MotionMode::Fixed(direction)));
    assert!(field.agents(side.other()).iter().all(|a| a.mode().is_random()));
}

// ============================================================================
// Collisions
// ============================================================================

#[test]
fn test_head_on_collision_swaps_velocities() {
    let mut a = random_dot(0.0, 0.0, 1.0, 0.0, 5.0);
    let mut b = random_dot(8.0, 0.0, -1.0, 0.0, 5.0);

    assert!(resolve_pair(&mut a, &mut b));
    assert_eq!(a.velocity, DVec2::new(-1.0, 0.0));
    assert_eq!(b.velocity, DVec2::new(1.0, 0.0));
    assert!((a.position.distance(b.position) - 10.0).abs() < 1e-9);
}

#[test]
fn test_resolved_pairs_no_longer_overlap() {
    let mut agents = vec![
        random_dot(10.0, 10.0, 0.1, 0.0, 4.0),
        random_dot(15.0, 12.0, -0.1, 0.05, 4.0),
        random_dot(60.0, 60.0, 0.0, 0.1, 4.0),
        random_dot(65.0, 58.0, 0.0, -0.1, 4.0),
    ];
    let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), SpatialConfig::default());
    tree.rebuild(
        agents
            .iter()
            .enumerate()
            .map(|(i, a)| (i, Rect::around(a.position, a.radius()))),
    );

    let mut scratch = Vec::new();
    assert_eq!(resolve_population(&mut agents, &tree, &mut scratch), 2);
    assert!(agents[0].position.distance(agents[1].position) >= 8.0 - 1e-9);
    assert!(agents[2].position.distance(agents[3].position) >= 8.0 - 1e-9);
}

#[test]
fn test_fixed_dot_is_not_pushed_by_random_dot() {
    let mut fixed = Agent::new(
        DVec2::new(50.0, 50.0),
        DVec2::new(0.1, 0.0),
        3.0,
        MotionMode::Fixed(rdk::Direction::Right),
        2000.0,
        1000.0,
    );
    let mut random = random_dot(54.0, 50.0, -0.1, 0.0, 3.0);
    let before = (fixed.position, fixed.velocity);

    assert!(resolve_pair(&mut fixed, &mut random));
    assert_eq!((fixed.position, fixed.velocity), before);
    assert!((random.position.x - 56.0).abs() < 1e-9);
    assert!((random.velocity.x - 0.1).abs() < 1e-12);
}

// ============================================================================
// Determinism and setup failures
// ============================================================================

#[test]
fn test_same_seed_same_run() {
    let config = FieldConfig::new().with_population(25);
    let mut a = MotionField::with_seed(config.clone(), 9).unwrap();
    let mut b = MotionField::with_seed(config, 9).unwrap();

    for frame in 0..200 {
        a.update_dots(16.0).unwrap();
        b.update_dots(16.0).unwrap();
        if frame == 100 {
            a.reset(30.0).unwrap();
            b.reset(30.0).unwrap();
        }
    }
    assert_eq!(a.coherent_side(), b.coherent_side());
    assert_eq!(a.coherent_direction(), b.coherent_direction());
    for side in Side::ALL {
        assert_eq!(a.agents(side), b.agents(side));
    }
}

#[test]
fn test_infeasible_lattice_is_rejected() {
    let config = sparse_config()
        .with_population(50)
        .with_placement(PlacementConfig::Lattice {
            separation_multiplier: 1.0,
        });
    // Pitch 10 in a 100 patch holds exactly 100 points; 50 fits.
    assert!(MotionField::with_seed(config.clone(), 0).is_ok());

    let err = MotionField::with_seed(config.with_population(101), 0).unwrap_err();
    assert_eq!(
        err,
        FieldError::InfeasibleLattice {
            capacity: 100,
            population: 101
        }
    );
}

#[test]
fn test_overcrowded_patch_is_reported() {
    let config = sparse_config()
        .with_population(60)
        .with_placement(PlacementConfig::Rejection {
            spacing: 2.0,
            max_attempts: 20,
        });
    let err = MotionField::with_seed(config, 3).unwrap_err();
    assert!(matches!(err, FieldError::OvercrowdedPatch { attempts: 20, .. }));
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = MotionField::with_seed(FieldConfig::new().with_population(0), 0).unwrap_err();
    assert!(matches!(err, FieldError::InvalidConfig(_)));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_recreate_lifecycle_resets_population() {
    let config = sparse_config().with_lifecycle(Lifecycle::tutorial());
    let mut field = MotionField::with_seed(config, 4).unwrap();
    for _ in 0..30 {
        field.update_dots(16.0).unwrap();
    }
    field.reset(100.0).unwrap();

    let side = field.coherent_side();
    assert_eq!(field.agents(side).len(), 4);
    assert!(field.agents(side).iter().all(|a| a.mode().is_fixed()));
    assert!(field.agents(side.other()).iter().all(|a| a.mode().is_random()));
    for dot in field.agents(side) {
        assert_eq!(dot.heading_timer(), 0.0);
    }
}

#[test]
fn test_staggered_lifetimes_differ() {
    let config = FieldConfig::new()
        .with_population(20)
        .with_lifecycle(Lifecycle::new().lifetime(1000.0).stagger(1.0));
    let field = MotionField::with_seed(config, 6).unwrap();
    let lifetimes: Vec<f64> = field.agents(Side::Left).iter().map(|a| a.max_lifetime()).collect();
    assert_eq!(lifetimes[0], 1000.0);
    assert!(lifetimes.windows(2).all(|w| w[1] > w[0]));
    assert!(lifetimes[19] < 2000.0);
}
