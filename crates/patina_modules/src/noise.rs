// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value-noise basis shared by the pattern modules.
//!
//! A single octave interpolates hashed lattice values with a quintic fade,
//! giving a C2-continuous field in `[-1, 1]` with an analytic gradient.
//! The pattern modules stack octaves on top of this; keeping the basis
//! separate lets them agree on one lattice and makes the gradient testable
//! against finite differences.

use glam::DVec3;

/// Quintic fade with zero first and second derivatives at 0 and 1
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn fade_derivative(t: f64) -> f64 {
    30.0 * t * t * (t - 1.0) * (t - 1.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hashed lattice value in `[-1, 1]`
fn lattice(i: i64, j: i64, k: i64) -> f64 {
    // splitmix-style mixing; the exact constants only need to decorrelate
    // neighboring lattice points.
    let mut h = (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (j as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (k as u64).wrapping_mul(0x1656_67B1_9E37_79F9);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    (h >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
}

/// One octave of value noise at `p`
pub fn noise(p: DVec3) -> f64 {
    let cell = p.floor();
    let f = p - cell;
    let (i, j, k) = (cell.x as i64, cell.y as i64, cell.z as i64);
    // The casts saturate on huge coordinates; the corner offsets must wrap.
    let (i1, j1, k1) = (i.wrapping_add(1), j.wrapping_add(1), k.wrapping_add(1));

    let u = fade(f.x);
    let v = fade(f.y);
    let w = fade(f.z);

    let x00 = lerp(lattice(i, j, k), lattice(i1, j, k), u);
    let x10 = lerp(lattice(i, j1, k), lattice(i1, j1, k), u);
    let x01 = lerp(lattice(i, j, k1), lattice(i1, j, k1), u);
    let x11 = lerp(lattice(i, j1, k1), lattice(i1, j1, k1), u);

    let y0 = lerp(x00, x10, v);
    let y1 = lerp(x01, x11, v);
    lerp(y0, y1, w)
}

/// One octave of value noise plus its spatial gradient
pub fn noise_with_gradient(p: DVec3) -> (f64, DVec3) {
    let cell = p.floor();
    let f = p - cell;
    let (i, j, k) = (cell.x as i64, cell.y as i64, cell.z as i64);
    let (i1, j1, k1) = (i.wrapping_add(1), j.wrapping_add(1), k.wrapping_add(1));

    let c000 = lattice(i, j, k);
    let c100 = lattice(i1, j, k);
    let c010 = lattice(i, j1, k);
    let c110 = lattice(i1, j1, k);
    let c001 = lattice(i, j, k1);
    let c101 = lattice(i1, j, k1);
    let c011 = lattice(i, j1, k1);
    let c111 = lattice(i1, j1, k1);

    let u = fade(f.x);
    let v = fade(f.y);
    let w = fade(f.z);

    let x00 = lerp(c000, c100, u);
    let x10 = lerp(c010, c110, u);
    let x01 = lerp(c001, c101, u);
    let x11 = lerp(c011, c111, u);
    let y0 = lerp(x00, x10, v);
    let y1 = lerp(x01, x11, v);
    let value = lerp(y0, y1, w);

    let dx = fade_derivative(f.x)
        * lerp(
            lerp(c100 - c000, c110 - c010, v),
            lerp(c101 - c001, c111 - c011, v),
            w,
        );
    let dy = fade_derivative(f.y)
        * lerp(
            lerp(c010 - c000, c110 - c100, u),
            lerp(c011 - c001, c111 - c101, u),
            w,
        );
    let dz = fade_derivative(f.z) * (y1 - y0);

    (value, DVec3::new(dx, dy, dz))
}
