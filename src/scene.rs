use crate::particle::{hsl_to_rgb, Particle, Rgb, Variant, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

pub(crate) const TREE_SHARE: f32 = 0.75;
pub(crate) const STAR_SHARE: f32 = 0.10;
pub(crate) const RIPPLE_SHARE: f32 = 0.15;

pub(crate) const TREE_BASE_Y: f32 = -200.0;
pub(crate) const TREE_HEIGHT: f32 = 450.0;
pub(crate) const TREE_BASE_RADIUS: f32 = 220.0;
const TREE_TAPER: f32 = 0.85;

pub(crate) const STAR_CENTER_Y: f32 = 260.0;
pub(crate) const STAR_RADIUS: f32 = 30.0;

pub(crate) const RIPPLE_Y: f32 = -210.0;
pub(crate) const RIPPLE_LAYERS: u32 = 4;
const RIPPLE_FIRST_RADIUS: f32 = 120.0;
const RIPPLE_LAYER_GAP: f32 = 90.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Partition {
    pub(crate) tree: usize,
    pub(crate) star: usize,
    pub(crate) ripple: usize,
}

impl Partition {
    pub(crate) fn for_budget(n: usize) -> Self {
        let share = |f: f32| (n as f32 * f).round() as usize;
        Self {
            tree: share(TREE_SHARE),
            star: share(STAR_SHARE),
            ripple: share(RIPPLE_SHARE),
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.tree + self.star + self.ripple
    }
}

/// Tree radius at `progress` (0 = base, 1 = apex) before the random jitter.
pub(crate) fn cone_radius(progress: f32) -> f32 {
    TREE_BASE_RADIUS * (1.0 - progress).max(0.0).powf(TREE_TAPER)
}

pub(crate) fn ripple_base_radius(layer: u32) -> f32 {
    RIPPLE_FIRST_RADIUS + layer as f32 * RIPPLE_LAYER_GAP
}

/// Builds the whole particle set once. Targets live in tree space, so the
/// surface size only decides where particles start their flight.
pub(crate) fn create_scene<R: Rng>(n: usize, surface: (f32, f32), rng: &mut R) -> Vec<Particle> {
    let parts = Partition::for_budget(n);
    let mut pts = Vec::with_capacity(parts.total());

    for i in 0..parts.tree {
        pts.push(tree_particle(i, parts.tree, surface, rng));
    }
    for _ in 0..parts.star {
        pts.push(star_particle(surface, rng));
    }
    for _ in 0..parts.ripple {
        pts.push(ripple_particle(surface, rng));
    }

    log::debug!(
        "scene: {} tree, {} star, {} ripple",
        parts.tree,
        parts.star,
        parts.ripple
    );
    pts
}

fn scatter<R: Rng>(surface: (f32, f32), depth: f32, rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.gen::<f32>() * surface.0.max(1.0),
        rng.gen::<f32>() * surface.1.max(1.0),
        (rng.gen::<f32>() - 0.5) * depth,
    )
}

fn tree_particle<R: Rng>(i: usize, count: usize, surface: (f32, f32), rng: &mut R) -> Particle {
    let progress = i as f32 / count as f32;
    let y = TREE_BASE_Y + progress * TREE_HEIGHT;
    let radius = cone_radius(progress) * (0.9 + rng.gen::<f32>() * 0.2);
    let angle = rng.gen::<f32>() * TAU;
    let target = Vec3::new(angle.cos() * radius, y, angle.sin() * radius);

    let pick = rng.gen::<f32>();
    let color = if pick > 0.85 {
        hsl_to_rgb(0.0, 0.0, 1.0)
    } else if pick > 0.45 {
        hsl_to_rgb(335.0 + rng.gen::<f32>() * 20.0, 0.85, 0.70)
    } else {
        hsl_to_rgb(45.0 + rng.gen::<f32>() * 10.0, 0.95, 0.65)
    };

    let start = scatter(surface, 1000.0, rng);
    Particle::new(Variant::Tree, target, start, color)
        .with_size(rng.gen::<f32>() * 1.8 + 1.0)
        .with_opacity(rng.gen::<f32>() * 0.6 + 0.4)
        .with_phase(rng.gen::<f32>() * TAU)
}

fn star_particle<R: Rng>(surface: (f32, f32), rng: &mut R) -> Particle {
    // acos of a uniform cosine gives even density over the sphere
    let theta = rng.gen::<f32>() * TAU;
    let phi = (rng.gen::<f32>() * 2.0 - 1.0).clamp(-1.0, 1.0).acos();
    let r = rng.gen::<f32>() * STAR_RADIUS;
    let target = Vec3::new(
        r * phi.sin() * theta.cos(),
        STAR_CENTER_Y + r * phi.cos(),
        r * phi.sin() * theta.sin(),
    );

    let start = scatter(surface, 500.0, rng);
    Particle::new(Variant::Star, target, start, Rgb::WHITE)
        .with_size(rng.gen::<f32>() * 2.5 + 1.5)
        .with_opacity(1.0)
        .with_phase(rng.gen::<f32>() * TAU)
}

fn ripple_particle<R: Rng>(surface: (f32, f32), rng: &mut R) -> Particle {
    let layer = rng.gen_range(0..RIPPLE_LAYERS);
    let base_radius = ripple_base_radius(layer);
    let angle = rng.gen::<f32>() * TAU;
    let target = Vec3::new(angle.cos() * base_radius, RIPPLE_Y, angle.sin() * base_radius);

    let start = scatter(surface, 500.0, rng);
    Particle::new(Variant::Ripple { base_radius }, target, start, Rgb::WHITE)
        .with_size(rng.gen::<f32>() * 1.5 + 0.5)
        .with_opacity(0.5)
        .with_phase(rng.gen::<f32>() * TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn scene(n: usize, seed: u64) -> Vec<Particle> {
        let mut rng = StdRng::seed_from_u64(seed);
        create_scene(n, (320.0, 180.0), &mut rng)
    }

    fn count(pts: &[Particle], f: impl Fn(&Variant) -> bool) -> usize {
        pts.iter().filter(|p| f(&p.variant)).count()
    }

    #[test]
    fn partition_sizes_follow_shares() {
        for n in [0usize, 1, 7, 10, 99, 1000, 4500] {
            let pts = scene(n, n as u64);
            let parts = Partition::for_budget(n);
            assert_eq!(pts.len(), parts.total());
            assert_eq!(count(&pts, |v| matches!(v, Variant::Tree)), parts.tree);
            assert_eq!(count(&pts, |v| matches!(v, Variant::Star)), parts.star);
            assert_eq!(
                count(&pts, |v| matches!(v, Variant::Ripple { .. })),
                parts.ripple
            );
            assert_eq!(count(&pts, |v| matches!(v, Variant::Snow)), 0);
            // rounding never drifts by more than one per share
            assert!((pts.len() as i64 - n as i64).abs() <= 2);
        }
    }

    #[test]
    fn default_budget_partition() {
        let parts = Partition::for_budget(4500);
        assert_eq!(parts, Partition { tree: 3375, star: 450, ripple: 675 });
    }

    #[test]
    fn repeated_generation_keeps_partition() {
        let a = scene(1234, 1);
        let b = scene(1234, 2);
        assert_eq!(a.len(), b.len());
        for v in [Variant::Tree, Variant::Star] {
            assert_eq!(count(&a, |x| *x == v), count(&b, |x| *x == v));
        }
    }

    #[test]
    fn tree_targets_stay_inside_the_cone() {
        let pts = scene(4500, 7);
        let trees: Vec<_> = pts
            .iter()
            .filter(|p| p.variant == Variant::Tree)
            .collect();
        for (i, p) in trees.iter().enumerate() {
            let progress = i as f32 / trees.len() as f32;
            let r = (p.target.x * p.target.x + p.target.z * p.target.z).sqrt();
            assert!(p.target.y >= TREE_BASE_Y && p.target.y <= TREE_BASE_Y + TREE_HEIGHT);
            assert!(r <= cone_radius(progress) * 1.1 + 1e-3);
            assert!(r <= TREE_BASE_RADIUS * 1.1 + 1e-3);
        }
    }

    #[test]
    fn star_targets_cluster_on_apex() {
        let center = Vec3::new(0.0, STAR_CENTER_Y, 0.0);
        for p in scene(4500, 11).iter().filter(|p| p.variant == Variant::Star) {
            assert!(p.target.distance(center) <= STAR_RADIUS + 1e-3);
            assert_eq!(p.color, Rgb::WHITE);
            assert_eq!(p.opacity, 1.0);
        }
    }

    #[test]
    fn ripples_sit_on_their_rings() {
        let rings: Vec<f32> = (0..RIPPLE_LAYERS).map(ripple_base_radius).collect();
        assert_eq!(rings, vec![120.0, 210.0, 300.0, 390.0]);
        for p in scene(2000, 3) {
            if let Variant::Ripple { base_radius } = p.variant {
                assert!(rings.contains(&base_radius));
                let r = (p.target.x * p.target.x + p.target.z * p.target.z).sqrt();
                assert!((r - base_radius).abs() < 1e-2);
                assert_eq!(p.target.y, RIPPLE_Y);
            }
        }
    }

    #[test]
    fn particles_start_inside_the_surface() {
        for p in scene(500, 5) {
            assert!(p.pos.x >= 0.0 && p.pos.x <= 320.0);
            assert!(p.pos.y >= 0.0 && p.pos.y <= 180.0);
            assert!(p.pos.z.abs() <= 500.0);
            assert_eq!(p.vel, Vec3::ZERO);
        }
    }
}
