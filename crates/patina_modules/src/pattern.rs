// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pattern kinds: spatial fields built on the noise basis.
//!
//! Each pattern has X/Y/Z inputs that default to the sample position, so a
//! bare module patterns texture space directly while wired ones can be
//! warped by upstream math.

use std::any::Any;

use glam::DVec3;
use patina_graph::{
    EvalContext, Module, Port, ReadError, SceneContext, StreamError, StreamReader, StreamWriter,
    ValueKind,
};

use crate::noise;

const PATTERN_INPUTS: [Port; 3] = [
    Port::input(ValueKind::Number, "X"),
    Port::input(ValueKind::Number, "Y"),
    Port::input(ValueKind::Number, "Z"),
];
const VALUE_OUTPUT: [Port; 1] = [Port::output(ValueKind::Number, "Value")];

/// Octave count ceiling enforced when reading payloads
const MAX_OCTAVES: i32 = 16;

fn input_position(ctx: &mut EvalContext<'_>, blur: f64) -> DVec3 {
    let p = ctx.point().position;
    DVec3::new(
        ctx.input_value_or(0, blur, p.x),
        ctx.input_value_or(1, blur, p.y),
        ctx.input_value_or(2, blur, p.z),
    )
}

/// Chain rule helper: gradients of the X/Y/Z inputs, unit axes when unlinked
fn input_jacobian(ctx: &mut EvalContext<'_>, blur: f64) -> [DVec3; 3] {
    let mut jacobian = [DVec3::X, DVec3::Y, DVec3::Z];
    for (input, row) in jacobian.iter_mut().enumerate() {
        let mut grad = DVec3::ZERO;
        if ctx.input_gradient(input, blur, &mut grad) {
            *row = grad;
        }
    }
    jacobian
}

fn read_fractal_payload(r: &mut StreamReader<'_>) -> Result<(u32, f64), ReadError> {
    let octaves = r.read_i32()?;
    if !(0..=MAX_OCTAVES).contains(&octaves) {
        return Err(ReadError::Malformed(format!("octave count {octaves}")));
    }
    let amplitude = r.read_f64()?;
    Ok((octaves as u32, amplitude))
}

/// Fractal value noise in `[0, 1]`
///
/// Octaves stack at doubling frequencies with `amplitude` as the per-octave
/// gain; octaves finer than the blur footprint are skipped, which is what
/// keeps distant noise from shimmering.
#[derive(Debug, Clone, Copy)]
pub struct NoiseModule {
    octaves: u32,
    amplitude: f64,
}

impl Default for NoiseModule {
    fn default() -> Self {
        Self {
            octaves: 4,
            amplitude: 0.5,
        }
    }
}

impl NoiseModule {
    /// Create a fractal noise with `octaves` layers and per-octave `amplitude`
    pub fn new(octaves: u32, amplitude: f64) -> Self {
        Self { octaves, amplitude }
    }

    /// Number of octaves
    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Per-octave amplitude
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl Module for NoiseModule {
    fn kind(&self) -> &str {
        "noise"
    }

    fn input_ports(&self) -> &[Port] {
        &PATTERN_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &VALUE_OUTPUT
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        let p = input_position(ctx, blur);
        let mut sum = 0.0;
        let mut norm = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        for _ in 0..self.octaves {
            norm += amp;
            // Octaves finer than the footprint average out to zero.
            if blur * freq <= 0.5 {
                sum += amp * noise::noise(p * freq);
            }
            amp *= self.amplitude;
            freq *= 2.0;
        }
        if norm == 0.0 {
            return 0.5;
        }
        0.5 + 0.5 * sum / norm
    }

    fn value_gradient(
        &self,
        _which: usize,
        blur: f64,
        grad: &mut DVec3,
        ctx: &mut EvalContext<'_>,
    ) {
        let p = input_position(ctx, blur);
        let jacobian = input_jacobian(ctx, blur);
        let mut total = DVec3::ZERO;
        let mut norm = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        for _ in 0..self.octaves {
            norm += amp;
            if blur * freq <= 0.5 {
                let (_, g) = noise::noise_with_gradient(p * freq);
                total += amp * freq * g;
            }
            amp *= self.amplitude;
            freq *= 2.0;
        }
        if norm == 0.0 {
            *grad = DVec3::ZERO;
            return;
        }
        total *= 0.5 / norm;
        *grad = total.x * jacobian[0] + total.y * jacobian[1] + total.z * jacobian[2];
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_i32(self.octaves as i32)?;
        w.write_f64(self.amplitude)
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        let (octaves, amplitude) = read_fractal_payload(r)?;
        self.octaves = octaves;
        self.amplitude = amplitude;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fractal sum of absolute noise, the classic marble/smoke driver
///
/// Unlike [`NoiseModule`] the folded octaves never cancel, giving creased
/// ridges instead of smooth hills.
#[derive(Debug, Clone, Copy)]
pub struct TurbulenceModule {
    octaves: u32,
    amplitude: f64,
}

impl Default for TurbulenceModule {
    fn default() -> Self {
        Self {
            octaves: 4,
            amplitude: 0.5,
        }
    }
}

impl TurbulenceModule {
    /// Create a turbulence with `octaves` layers and per-octave `amplitude`
    pub fn new(octaves: u32, amplitude: f64) -> Self {
        Self { octaves, amplitude }
    }

    /// Number of octaves
    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Per-octave amplitude
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl Module for TurbulenceModule {
    fn kind(&self) -> &str {
        "turbulence"
    }

    fn input_ports(&self) -> &[Port] {
        &PATTERN_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &VALUE_OUTPUT
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        let p = input_position(ctx, blur);
        let mut sum = 0.0;
        let mut norm = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        for _ in 0..self.octaves {
            norm += amp;
            if blur * freq <= 0.5 {
                sum += amp * noise::noise(p * freq).abs();
            }
            amp *= self.amplitude;
            freq *= 2.0;
        }
        if norm == 0.0 {
            return 0.0;
        }
        sum / norm
    }

    fn value_gradient(
        &self,
        _which: usize,
        blur: f64,
        grad: &mut DVec3,
        ctx: &mut EvalContext<'_>,
    ) {
        let p = input_position(ctx, blur);
        let jacobian = input_jacobian(ctx, blur);
        let mut total = DVec3::ZERO;
        let mut norm = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        for _ in 0..self.octaves {
            norm += amp;
            if blur * freq <= 0.5 {
                let (value, g) = noise::noise_with_gradient(p * freq);
                let sign = if value < 0.0 { -1.0 } else { 1.0 };
                total += amp * freq * sign * g;
            }
            amp *= self.amplitude;
            freq *= 2.0;
        }
        if norm == 0.0 {
            *grad = DVec3::ZERO;
            return;
        }
        total /= norm;
        *grad = total.x * jacobian[0] + total.y * jacobian[1] + total.z * jacobian[2];
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_i32(self.octaves as i32)?;
        w.write_f64(self.amplitude)
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        let (octaves, amplitude) = read_fractal_payload(r)?;
        self.octaves = octaves;
        self.amplitude = amplitude;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Unit checkerboard: 1 in even cells, 0 in odd ones
///
/// The blur footprint fades the pattern toward its 0.5 mean instead of
/// aliasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckerModule;

impl Module for CheckerModule {
    fn kind(&self) -> &str {
        "checker"
    }

    fn input_ports(&self) -> &[Port] {
        &PATTERN_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &VALUE_OUTPUT
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        let p = input_position(ctx, blur);
        let parity = (p.x.floor() + p.y.floor() + p.z.floor()) as i64 & 1;
        let value = if parity == 0 { 1.0 } else { 0.0 };
        let fade = (2.0 * blur).min(1.0);
        value + (0.5 - value) * fade
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
