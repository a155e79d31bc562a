use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// `#020617`, the night sky behind everything.
    pub(crate) const NIGHT: Rgb = Rgb { r: 2, g: 6, b: 23 };
}

/// h in degrees, s and l in 0..=1.
pub(crate) fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s <= 0.0 {
        let v = (l * 255.0 + 0.5) as u8;
        return Rgb { r: v, g: v, b: v };
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| -> u8 {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    };
    Rgb {
        r: channel(h + 1.0 / 3.0),
        g: channel(h),
        b: channel(h - 1.0 / 3.0),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec3 {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
}

impl Vec3 {
    pub(crate) const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub(crate) fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[cfg(test)]
    pub(crate) fn distance(self, other: Vec3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Variant {
    Tree,
    Star,
    Ripple { base_radius: f32 },
    /// Ambient snowfall. Never allocated: on the idle screen every particle
    /// behaves as snow regardless of its own variant.
    Snow,
}

#[derive(Clone, Debug)]
pub(crate) struct Particle {
    /// x/y in surface pixels, z is depth.
    pub(crate) pos: Vec3,
    /// Resting point in tree space: +y is up, origin on the trunk axis.
    pub(crate) target: Vec3,
    pub(crate) vel: Vec3,
    pub(crate) size: f32,
    pub(crate) color: Rgb,
    pub(crate) opacity: f32,
    /// Offset into the shared oscillators, 0..TAU.
    pub(crate) phase: f32,
    pub(crate) variant: Variant,
}

impl Particle {
    pub(crate) fn new(variant: Variant, target: Vec3, start: Vec3, color: Rgb) -> Self {
        Self {
            pos: start,
            target,
            vel: Vec3::ZERO,
            size: 1.0,
            color,
            opacity: 1.0,
            phase: 0.0,
            variant,
        }
    }

    pub(crate) fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub(crate) fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub(crate) fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase.rem_euclid(TAU);
        self
    }
}
