// SPDX-License-Identifier: MIT OR Apache-2.0
//! RGB color values for the color channel.

use serde::{Deserialize, Serialize};

/// An RGB color with `f32` components, nominally in `[0, 1]`
///
/// Components are not clamped; module chains may transiently produce
/// out-of-range values and hosts decide how to tone-map them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
}

impl Rgb {
    /// Black (all components zero)
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    /// White (all components one)
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a gray color with all components equal to `value`
    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Set all three components
    pub fn set(&mut self, r: f32, g: f32, b: f32) {
        self.r = r;
        self.g = g;
        self.b = b;
    }

    /// Set from hue/saturation/value, with hue in degrees
    pub fn set_hsv(&mut self, hue: f32, saturation: f32, value: f32) {
        if saturation <= 0.0 {
            self.set(value, value, value);
            return;
        }
        let hue = hue.rem_euclid(360.0) / 60.0;
        let sector = hue.floor();
        let frac = hue - sector;
        let p = value * (1.0 - saturation);
        let q = value * (1.0 - saturation * frac);
        let t = value * (1.0 - saturation * (1.0 - frac));
        match sector as i32 {
            0 => self.set(value, t, p),
            1 => self.set(q, value, p),
            2 => self.set(p, value, t),
            3 => self.set(p, q, value),
            4 => self.set(t, p, value),
            _ => self.set(value, p, q),
        }
    }

    /// Scale all components by `factor`
    pub fn scale(&mut self, factor: f32) {
        self.r *= factor;
        self.g *= factor;
        self.b *= factor;
    }

    /// Add another color componentwise
    pub fn add(&mut self, other: Rgb) {
        self.r += other.r;
        self.g += other.g;
        self.b += other.b;
    }

    /// Linear interpolation between two colors, `t` unclamped
    pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
        Rgb::new(
            a.r + (b.r - a.r) * t,
            a.g + (b.g - a.g) * t,
            a.b + (b.b - a.b) * t,
        )
    }

    /// Perceptual brightness (Rec. 601 luma weights)
    pub fn brightness(&self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }
}
