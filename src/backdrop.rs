// Copyright (C) 2025  Tom Waddington
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Decorative backdrops drawn behind the session

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;

use crate::render::Sprite;

pub trait Backdrop: Send {
    /// Whether the engine should redraw on a frame timer.
    fn animated(&self) -> bool;

    fn sprites(&self, elapsed: Duration, cols: u16, rows: u16) -> Vec<Sprite>;
}

pub struct NoBackdrop;

impl Backdrop for NoBackdrop {
    fn animated(&self) -> bool {
        false
    }

    fn sprites(&self, _elapsed: Duration, _cols: u16, _rows: u16) -> Vec<Sprite> {
        Vec::new()
    }
}

// Positions are fractions of the screen so a resize keeps the layout
struct Particle {
    x: f64,
    y: f64,
    rise: f64,
    phase: f64,
}

struct Container {
    x: f64,
    y: f64,
    speed: f64,
    phase: f64,
}

/// Particles drifting upward with a sideways sway, plus a few bobbing containers.
pub struct Starfield {
    particles: Vec<Particle>,
    containers: Vec<Container>,
}

const PARTICLE_GLYPHS: [char; 3] = ['·', '∙', '•'];
const CONTAINER_GLYPH: char = '▣';

impl Starfield {
    pub fn new(particles: usize, containers: usize) -> Self {
        Self::seeded(particles, containers, rand::rng().random())
    }

    pub fn seeded(particles: usize, containers: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = (0..particles)
            .map(|_| Particle {
                x: rng.random(),
                y: rng.random(),
                rise: rng.random_range(0.01..0.05),
                phase: rng.random_range(0.0..std::f64::consts::TAU),
            })
            .collect();
        let containers = (0..containers)
            .map(|_| Container {
                x: rng.random_range(0.05..0.95),
                y: rng.random_range(0.15..0.85),
                speed: rng.random_range(0.5..1.5),
                phase: rng.random_range(0.0..std::f64::consts::TAU),
            })
            .collect();
        Self { particles, containers }
    }
}

fn to_cell(fraction: f64, extent: u16) -> u16 {
    let max = extent.saturating_sub(1) as f64;
    (fraction.clamp(0.0, 1.0) * max).round() as u16
}

impl Backdrop for Starfield {
    fn animated(&self) -> bool {
        true
    }

    fn sprites(&self, elapsed: Duration, cols: u16, rows: u16) -> Vec<Sprite> {
        if cols == 0 || rows == 0 {
            return Vec::new();
        }
        let t = elapsed.as_secs_f64();
        let mut sprites = Vec::with_capacity(self.particles.len() + self.containers.len());

        for (i, p) in self.particles.iter().enumerate() {
            let y = (p.y - p.rise * t).rem_euclid(1.0);
            let x = (p.x + (t * 0.5 + p.phase).sin() * 0.01).rem_euclid(1.0);
            sprites.push(Sprite {
                col: to_cell(x, cols),
                row: to_cell(y, rows),
                glyph: PARTICLE_GLYPHS[i % PARTICLE_GLYPHS.len()],
            });
        }

        for c in &self.containers {
            let y = c.y + (t * c.speed * 0.5 + c.phase).sin() * 0.03;
            sprites.push(Sprite {
                col: to_cell(c.x, cols),
                row: to_cell(y, rows),
                glyph: CONTAINER_GLYPH,
            });
        }

        sprites
    }
}
