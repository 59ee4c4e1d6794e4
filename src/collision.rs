//! Wall and dot-dot collision resolution.
//!
//! Both routines are shared by every field style. Dots are treated as
//! equal-mass circles; coherent (fixed-mode) dots are never disturbed by
//! random ones, so the coherent signal stays clean.

use crate::agent::Agent;
use crate::spatial::{QuadTree, Rect};
use glam::DVec2;

/// Push a random-mode dot back inside `bounds` and reflect its velocity off
/// every wall it crossed. Fixed-mode dots are left alone.
///
/// Returns `true` if any wall was hit.
pub fn resolve_walls(agent: &mut Agent, bounds: &Rect) -> bool {
    if !agent.mode().is_random() {
        return false;
    }

    let r = agent.radius();
    let p = agent.position;
    // (inward normal, penetration depth)
    let walls = [
        (DVec2::X, bounds.min_x() - (p.x - r)),
        (DVec2::NEG_X, (p.x + r) - bounds.max_x()),
        (DVec2::Y, bounds.min_y() - (p.y - r)),
        (DVec2::NEG_Y, (p.y + r) - bounds.max_y()),
    ];

    let mut hit = false;
    for (normal, penetration) in walls {
        if penetration <= 0.0 {
            continue;
        }
        // The wall does not move, so the dot takes the whole correction.
        agent.position += normal * penetration;
        let vn = agent.velocity.dot(normal);
        if vn < 0.0 {
            agent.velocity -= normal * (2.0 * vn);
        }
        hit = true;
    }
    hit
}

/// Resolve one overlapping pair as an elastic collision.
///
/// Normal velocity components are exchanged and tangential ones kept. A
/// random dot hitting a fixed dot takes the whole positional correction and
/// is the only one whose velocity changes; otherwise both move half the
/// overlap.
///
/// Returns `false` without touching either dot if they do not overlap.
pub fn resolve_pair(a: &mut Agent, b: &mut Agent) -> bool {
    let offset = b.position - a.position;
    let min_dist = a.radius() + b.radius();
    let dist_sq = offset.length_squared();
    if dist_sq > min_dist * min_dist {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f64::EPSILON {
        offset / dist
    } else {
        DVec2::X
    };
    let tangent = normal.perp();
    let overlap = min_dist - dist;

    let (a_n, a_t) = (a.velocity.dot(normal), a.velocity.dot(tangent));
    let (b_n, b_t) = (b.velocity.dot(normal), b.velocity.dot(tangent));

    match (a.mode().is_random(), b.mode().is_random()) {
        (true, false) => {
            a.position -= normal * overlap;
            a.velocity = normal * b_n + tangent * a_t;
        }
        (false, true) => {
            b.position += normal * overlap;
            b.velocity = normal * a_n + tangent * b_t;
        }
        _ => {
            let half = normal * (overlap * 0.5);
            a.position -= half;
            b.position += half;
            a.velocity = normal * b_n + tangent * a_t;
            b.velocity = normal * a_n + tangent * b_t;
        }
    }
    true
}

/// Resolve all overlapping pairs in one population.
///
/// `index` must already hold every dot of `agents`, keyed by slice
/// position. Each unordered pair is visited once. Returns the number of
/// collisions resolved.
pub fn resolve_population(
    agents: &mut [Agent],
    index: &QuadTree,
    candidates: &mut Vec<usize>,
) -> usize {
    let mut resolved = 0;
    for i in 0..agents.len() {
        let query = Rect::around(agents[i].position, agents[i].radius());
        index.retrieve(&query, candidates);
        for &j in candidates.iter() {
            if j <= i || j >= agents.len() {
                continue;
            }
            let (a, b) = pair_mut(agents, i, j);
            if resolve_pair(a, b) {
                resolved += 1;
            }
        }
    }
    resolved
}

/// Two distinct mutable elements, `i < j`.
fn pair_mut(agents: &mut [Agent], i: usize, j: usize) -> (&mut Agent, &mut Agent) {
    let (head, tail) = agents.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MotionMode;
    use crate::patch::Direction;
    use crate::spatial::SpatialConfig;

    fn dot(x: f64, y: f64, vx: f64, vy: f64, mode: MotionMode) -> Agent {
        Agent::new(DVec2::new(x, y), DVec2::new(vx, vy), 5.0, mode, 1e9, 1e9)
    }

    #[test]
    fn test_head_on_random_pair_swaps_normal_velocity() {
        let mut a = dot(0.0, 0.0, 1.0, 0.0, MotionMode::Random);
        let mut b = dot(8.0, 0.0, -1.0, 0.0, MotionMode::Random);
        assert!(resolve_pair(&mut a, &mut b));
        assert_eq!(a.velocity, DVec2::new(-1.0, 0.0));
        assert_eq!(b.velocity, DVec2::new(1.0, 0.0));
        assert_eq!(a.position, DVec2::new(-1.0, 0.0));
        assert_eq!(b.position, DVec2::new(9.0, 0.0));
    }

    #[test]
    fn test_tangential_component_kept() {
        let mut a = dot(0.0, 0.0, 1.0, 0.5, MotionMode::Random);
        let mut b = dot(6.0, 0.0, 0.0, -0.25, MotionMode::Random);
        resolve_pair(&mut a, &mut b);
        assert!((a.velocity.x - 0.0).abs() < 1e-12);
        assert!((a.velocity.y - 0.5).abs() < 1e-12);
        assert!((b.velocity.x - 1.0).abs() < 1e-12);
        assert!((b.velocity.y + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_dot_untouched_by_random_dot() {
        let mut fixed = dot(0.0, 0.0, 1.0, 0.0, MotionMode::Fixed(Direction::Right));
        let mut random = dot(7.0, 0.0, -2.0, 0.0, MotionMode::Random);
        let before = fixed.clone();

        assert!(resolve_pair(&mut fixed, &mut random));
        assert_eq!(fixed, before);
        assert_eq!(random.position, DVec2::new(10.0, 0.0));
        assert_eq!(random.velocity.x, 1.0);
    }

    #[test]
    fn test_fixed_pair_splits_overlap() {
        let mut a = dot(0.0, 0.0, 1.0, 0.0, MotionMode::Fixed(Direction::Right));
        let mut b = dot(0.0, 6.0, 1.0, 0.0, MotionMode::Fixed(Direction::Right));
        resolve_pair(&mut a, &mut b);
        assert!((a.position.y + 2.0).abs() < 1e-12);
        assert!((b.position.y - 8.0).abs() < 1e-12);
        assert!(((b.position - a.position).length() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_separated_pair_ignored() {
        let mut a = dot(0.0, 0.0, 1.0, 0.0, MotionMode::Random);
        let mut b = dot(10.5, 0.0, -1.0, 0.0, MotionMode::Random);
        assert!(!resolve_pair(&mut a, &mut b));
        assert_eq!(a.velocity, DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_coincident_centres_separate_along_x() {
        let mut a = dot(5.0, 5.0, 0.0, 0.0, MotionMode::Random);
        let mut b = dot(5.0, 5.0, 0.0, 0.0, MotionMode::Random);
        resolve_pair(&mut a, &mut b);
        assert_eq!(a.position, DVec2::new(0.0, 5.0));
        assert_eq!(b.position, DVec2::new(10.0, 5.0));
    }

    #[test]
    fn test_wall_push_and_reflect() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut a = dot(3.0, 50.0, -1.0, 0.5, MotionMode::Random);
        assert!(resolve_walls(&mut a, &bounds));
        assert_eq!(a.position, DVec2::new(5.0, 50.0));
        assert_eq!(a.velocity, DVec2::new(1.0, 0.5));

        let mut corner = dot(97.0, 98.0, 1.0, 2.0, MotionMode::Random);
        resolve_walls(&mut corner, &bounds);
        assert_eq!(corner.position, DVec2::new(95.0, 95.0));
        assert_eq!(corner.velocity, DVec2::new(-1.0, -2.0));
    }

    #[test]
    fn test_wall_keeps_inward_velocity() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut a = dot(4.0, 50.0, 1.0, 0.0, MotionMode::Random);
        resolve_walls(&mut a, &bounds);
        assert_eq!(a.velocity, DVec2::new(1.0, 0.0));
        assert_eq!(a.position.x, 5.0);
    }

    #[test]
    fn test_fixed_dot_not_wall_checked() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut a = dot(-20.0, 50.0, -1.0, 0.0, MotionMode::Fixed(Direction::Left));
        assert!(!resolve_walls(&mut a, &bounds));
        assert_eq!(a.position.x, -20.0);
    }

    #[test]
    fn test_population_pairs_resolved_once() {
        let mut agents = vec![
            dot(0.0, 0.0, 1.0, 0.0, MotionMode::Random),
            dot(8.0, 0.0, -1.0, 0.0, MotionMode::Random),
            dot(60.0, 60.0, 0.0, 1.0, MotionMode::Random),
        ];
        let mut index = QuadTree::new(Rect::new(-50.0, -50.0, 150.0, 150.0), SpatialConfig::new(1, 6));
        index.rebuild(
            agents
                .iter()
                .enumerate()
                .map(|(i, a)| (i, Rect::around(a.position, a.radius()))),
        );
        let mut scratch = Vec::new();
        let resolved = resolve_population(&mut agents, &index, &mut scratch);
        assert_eq!(resolved, 1);
        // A second visit would have swapped the velocities back.
        assert_eq!(agents[0].velocity, DVec2::new(-1.0, 0.0));
        assert_eq!(agents[1].velocity, DVec2::new(1.0, 0.0));
        assert_eq!(agents[2].velocity, DVec2::new(0.0, 1.0));
    }
}
