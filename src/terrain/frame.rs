use std::time::{Duration, Instant};

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::terrain::mesh::{DisplacedPoint, SurfacePoint};
use crate::terrain::shading::{ShaderParameters, compute_color, compute_displacement};

/// Elapsed scene time. Paused intervals do not count.
pub struct FrameClock {
    started: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl FrameClock {
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(now: Instant) -> Self {
        Self {
            started: now,
            paused_at: None,
            paused_total: Duration::ZERO,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> f32 {
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(self.started)
            .saturating_sub(self.paused_total)
            .as_secs_f32()
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn pause_at(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn resume_at(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShadedVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Displaces every point with the same `t`. Lazy so the CPU backend can
/// shade while it displaces.
pub fn displace_grid<'a>(
    points: &'a [SurfacePoint],
    t: f32,
    params: &ShaderParameters,
) -> impl Iterator<Item = DisplacedPoint> + 'a {
    let distort = params.distort_amount;
    points.iter().map(move |&p| DisplacedPoint {
        x: p.position.x,
        y: p.position.y,
        z: compute_displacement(p, t, distort),
    })
}

/// Displaces and colors a whole grid into `out`, reusing its allocation.
pub fn shade_into(
    points: &[SurfacePoint],
    uvs: &[Vec2],
    t: f32,
    params: &ShaderParameters,
    out: &mut Vec<ShadedVertex>,
) {
    out.clear();
    out.reserve(points.len());
    out.extend(displace_grid(points, t, params).zip(uvs).map(|(p, &uv)| {
        let color = compute_color(uv, t, params.color_a, params.color_b, params.mix_mode);
        ShadedVertex {
            position: p.to_array(),
            color: color.to_array(),
        }
    }));
}
