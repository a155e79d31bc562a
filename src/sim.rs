use crate::mode::Mode;
use crate::particle::{Particle, Rgb, Variant, Vec3};
use crate::scene::create_scene;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::TAU;

pub(crate) const SPRING: f32 = 0.04;
pub(crate) const DAMPING: f32 = 0.86;
pub(crate) const SPIN_PER_FRAME: f32 = 0.012;
pub(crate) const FOCAL: f32 = 1000.0;
pub(crate) const RIPPLE_SPAN: f32 = 180.0;

const SNOW_GRAVITY: f32 = 0.03;
const SNOW_MAX_FALL: f32 = 1.5;
const SNOW_SWAY: f32 = 0.3;
const SNOW_ALPHA: f32 = 0.15;
const SNOW_RESPAWN_Y: f32 = -20.0;
const SPARKLE_CHANCE: f64 = 0.015;
const GLOW_RADIUS: f32 = 18.0;

// Tree space spans y -210..290; leave some sky around it.
const VIEW_HEIGHT: f32 = 560.0;

/// Anything the loop can paint on. Coordinates are surface pixels.
pub(crate) trait Surface {
    fn size(&self) -> (f32, f32);
    fn clear(&mut self, color: Rgb);
    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgb, alpha: f32);
    fn glow(&mut self, x: f32, y: f32, r: f32, color: Rgb, alpha: f32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Spin {
    /// Fixed increment per rendered frame; speed follows the frame rate.
    PerFrame,
    /// Increment scaled by frame time against a 60 fps reference.
    TimeScaled,
}

/// Per-frame constants shared by every particle.
#[derive(Clone, Copy, Debug)]
struct Frame {
    time: f32,
    cx: f32,
    cy: f32,
    height: f32,
    scale: f32,
    cos: f32,
    sin: f32,
}

/// Object units to surface pixels. Never magnifies.
pub(crate) fn view_scale(surface_h: f32) -> f32 {
    (surface_h / VIEW_HEIGHT).clamp(0.05, 1.0)
}

pub(crate) fn perspective(z: f32) -> f32 {
    FOCAL / (FOCAL + z).max(1.0)
}

pub(crate) fn ripple_expansion(time: f32, phase: f32) -> f32 {
    (time * 60.0 + phase * 25.0).rem_euclid(RIPPLE_SPAN)
}

/// Where a ripple particle sits `expansion` units past its ring, and how
/// faded it is there.
pub(crate) fn ripple_at(target: Vec3, base_radius: f32, expansion: f32) -> (Vec3, f32) {
    let angle = target.z.atan2(target.x);
    let r = base_radius + expansion;
    let at = Vec3::new(angle.cos() * r, target.y, angle.sin() * r);
    (at, 1.0 - expansion / RIPPLE_SPAN)
}

pub(crate) fn spring_step(p: &mut Particle, goal: Vec3) {
    p.vel.x = (p.vel.x + (goal.x - p.pos.x) * SPRING) * DAMPING;
    p.vel.y = (p.vel.y + (goal.y - p.pos.y) * SPRING) * DAMPING;
    p.vel.z = (p.vel.z + (goal.z - p.pos.z) * SPRING) * DAMPING;
    p.pos.x += p.vel.x;
    p.pos.y += p.vel.y;
    p.pos.z += p.vel.z;
}

pub(crate) struct Simulation {
    particles: Vec<Particle>,
    budget: usize,
    rotation_y: f32,
    frames: u64,
    spin: Spin,
    rng: StdRng,
}

impl Simulation {
    pub(crate) fn new(budget: usize, surface: (f32, f32), seed: u64, spin: Spin) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = create_scene(budget, surface, &mut rng);
        Self {
            particles,
            budget,
            rotation_y: 0.0,
            frames: 0,
            spin,
            rng,
        }
    }

    /// Fresh particle set for a new session. The random stream carries on.
    pub(crate) fn restart(&mut self, surface: (f32, f32)) {
        self.particles = create_scene(self.budget, surface, &mut self.rng);
        self.rotation_y = 0.0;
        self.frames = 0;
    }

    pub(crate) fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }

    #[cfg(test)]
    pub(crate) fn rotation(&self) -> f32 {
        self.rotation_y
    }

    /// Advances one frame and paints it. `time` is seconds since the session
    /// began, `dt` the seconds since the previous frame.
    pub(crate) fn step<S: Surface>(&mut self, mode: Mode, time: f32, dt: f32, surface: &mut S) {
        surface.clear(Rgb::NIGHT);

        self.rotation_y += match self.spin {
            Spin::PerFrame => SPIN_PER_FRAME,
            Spin::TimeScaled => SPIN_PER_FRAME * (dt * 60.0).clamp(0.0, 6.0),
        };
        self.rotation_y = self.rotation_y.rem_euclid(TAU);
        self.frames += 1;

        let (w, h) = surface.size();
        let frame = Frame {
            time,
            cx: w / 2.0,
            cy: h / 2.0,
            height: h,
            scale: view_scale(h),
            cos: self.rotation_y.cos(),
            sin: self.rotation_y.sin(),
        };

        let rng = &mut self.rng;
        for p in &mut self.particles {
            let behaves_as = match mode {
                Mode::Input => Variant::Snow,
                Mode::Transition | Mode::Display => p.variant,
            };
            match behaves_as {
                Variant::Snow => step_snow(p, &frame, surface),
                Variant::Tree => step_tree(p, &frame, surface, rng),
                Variant::Star => step_star(p, &frame, surface),
                Variant::Ripple { base_radius } => step_ripple(p, base_radius, &frame, surface),
            }
        }
    }
}

fn step_snow<S: Surface>(p: &mut Particle, f: &Frame, surface: &mut S) {
    p.vel.y = (p.vel.y + SNOW_GRAVITY).min(SNOW_MAX_FALL);
    p.pos.y += p.vel.y;
    if p.pos.y > f.height {
        p.pos.y = SNOW_RESPAWN_Y * f.scale;
    }
    p.pos.x += (f.time + p.phase).sin() * SNOW_SWAY;

    surface.fill_circle(p.pos.x, p.pos.y, p.size * 0.6 * f.scale, Rgb::WHITE, SNOW_ALPHA);
}

/// Spins `target` about the trunk and pulls the particle toward its screen
/// position. Returns the perspective factor at the new depth.
fn settle(p: &mut Particle, target: Vec3, f: &Frame) -> f32 {
    let rx = target.x * f.cos - target.z * f.sin;
    let rz = target.x * f.sin + target.z * f.cos;
    let goal = Vec3::new(f.cx + rx * f.scale, f.cy - target.y * f.scale, rz);
    spring_step(p, goal);
    perspective(p.pos.z)
}

fn step_tree<S: Surface, R: Rng>(p: &mut Particle, f: &Frame, surface: &mut S, rng: &mut R) {
    let target = p.target;
    let persp = settle(p, target, f);
    let flicker = 0.55 + (f.time * 4.0 + p.phase).sin() * 0.45;
    let alpha = p.opacity * flicker;
    surface.fill_circle(p.pos.x, p.pos.y, p.size * persp * f.scale, p.color, alpha);
    if rng.gen_bool(SPARKLE_CHANCE) {
        surface.glow(p.pos.x, p.pos.y, GLOW_RADIUS * persp * f.scale, p.color, alpha);
    }
}

fn step_star<S: Surface>(p: &mut Particle, f: &Frame, surface: &mut S) {
    let target = p.target;
    let persp = settle(p, target, f);
    let pulse = 1.3 + (f.time * 6.0 + p.phase).sin() * 0.3;
    let r = p.size * persp * pulse * f.scale;
    surface.fill_circle(p.pos.x, p.pos.y, r, p.color, p.opacity);
    surface.glow(p.pos.x, p.pos.y, GLOW_RADIUS * persp * f.scale, p.color, p.opacity);
}

fn step_ripple<S: Surface>(p: &mut Particle, base_radius: f32, f: &Frame, surface: &mut S) {
    let (at, opacity) = ripple_at(p.target, base_radius, ripple_expansion(f.time, p.phase));
    p.opacity = opacity;
    let persp = settle(p, at, f);
    surface.fill_circle(p.pos.x, p.pos.y, p.size * persp * f.scale, p.color, p.opacity);
}
