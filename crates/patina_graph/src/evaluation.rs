// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazy per-point evaluation with memoization.
//!
//! Values are pulled backwards from the procedure outputs: each module asks
//! its [`EvalContext`] for input values, and the context resolves them
//! through the destination ports' cached sources, recursing into upstream
//! modules on demand. Every (module, output, channel) result is memoized
//! for the current point and blur, so diamond-shaped graphs evaluate each
//! shared module once per point rather than once per path.
//!
//! Memos are invalidated by bumping an epoch counter instead of clearing,
//! which keeps `init_for_point` allocation-free on the hot path.

use glam::DVec3;

use crate::color::Rgb;
use crate::link::Source;
use crate::point::PointInfo;
use crate::procedure::ModuleSlot;

/// Memoized number-channel result for one output port
#[derive(Clone, Copy, Default)]
struct NumberMemo {
    epoch: u64,
    blur: f64,
    value: f64,
}

/// Memoized gradient-channel result for one output port
#[derive(Clone, Copy, Default)]
struct GradientMemo {
    epoch: u64,
    blur: f64,
    value: DVec3,
}

/// Memoized color-channel result for one output port
#[derive(Clone, Copy, Default)]
struct ColorMemo {
    epoch: u64,
    blur: f64,
    value: Rgb,
}

/// Per-module memo storage, one entry per output port and channel
#[derive(Default)]
pub(crate) struct ModuleCache {
    number: Vec<NumberMemo>,
    gradient: Vec<GradientMemo>,
    color: Vec<ColorMemo>,
}

impl ModuleCache {
    fn for_slot(slot: &ModuleSlot) -> Self {
        let outputs = slot.module.output_ports().len();
        Self {
            number: vec![NumberMemo::default(); outputs],
            gradient: vec![GradientMemo::default(); outputs],
            color: vec![ColorMemo::default(); outputs],
        }
    }

    fn ensure_shape(&mut self, slot: &ModuleSlot) {
        if self.number.len() != slot.module.output_ports().len() {
            *self = Self::for_slot(slot);
        }
    }
}

/// Evaluation state owned by a procedure: the current point plus all memos
///
/// Stale memos are never cleared; they are skipped because their epoch no
/// longer matches.
#[derive(Default)]
pub(crate) struct EvalState {
    epoch: u64,
    point: PointInfo,
    caches: Vec<ModuleCache>,
}

impl EvalState {
    /// Start evaluating a new point, invalidating all memos
    pub(crate) fn begin(&mut self, point: PointInfo, slots: &[ModuleSlot]) {
        self.point = point;
        self.epoch += 1;
        if self.caches.len() == slots.len() {
            for (cache, slot) in self.caches.iter_mut().zip(slots) {
                cache.ensure_shape(slot);
            }
        } else {
            self.caches = slots.iter().map(ModuleCache::for_slot).collect();
        }
    }

    fn split(&mut self) -> (&PointInfo, u64, &mut [ModuleCache]) {
        (&self.point, self.epoch, &mut self.caches)
    }
}

/// Input resolver handed to a module while one of its outputs is evaluated
///
/// Input indices refer to positions in the module's own
/// [`input_ports`](crate::Module::input_ports) slice. Unlinked inputs
/// resolve to `None`/`false` so each kind can apply its own defaults.
pub struct EvalContext<'a> {
    slots: &'a [ModuleSlot],
    caches: &'a mut [ModuleCache],
    point: &'a PointInfo,
    epoch: u64,
    sources: &'a [Option<Source>],
}

impl<'a> EvalContext<'a> {
    /// The point being evaluated
    pub fn point(&self) -> &'a PointInfo {
        self.point
    }

    /// Number value of input `input`, or `None` if it is unlinked
    pub fn input_value(&mut self, input: usize, blur: f64) -> Option<f64> {
        let source = self.sources.get(input).copied().flatten()?;
        Some(module_value(
            self.slots,
            self.caches,
            self.point,
            self.epoch,
            source,
            blur,
        ))
    }

    /// Number value of input `input`, or `default` if it is unlinked
    pub fn input_value_or(&mut self, input: usize, blur: f64, default: f64) -> f64 {
        self.input_value(input, blur).unwrap_or(default)
    }

    /// Gradient of input `input`; returns false and zeroes `grad` if unlinked
    pub fn input_gradient(&mut self, input: usize, blur: f64, grad: &mut DVec3) -> bool {
        let Some(source) = self.sources.get(input).copied().flatten() else {
            *grad = DVec3::ZERO;
            return false;
        };
        module_gradient(
            self.slots,
            self.caches,
            self.point,
            self.epoch,
            source,
            blur,
            grad,
        );
        true
    }

    /// Color of input `input`; returns false and sets black if unlinked
    pub fn input_color(&mut self, input: usize, blur: f64, out: &mut Rgb) -> bool {
        let Some(source) = self.sources.get(input).copied().flatten() else {
            *out = Rgb::BLACK;
            return false;
        };
        module_color(
            self.slots,
            self.caches,
            self.point,
            self.epoch,
            source,
            blur,
            out,
        );
        true
    }
}

/// Pull the number channel of `source` for the procedure's current point
pub(crate) fn pull_value(
    slots: &[ModuleSlot],
    state: &mut EvalState,
    source: Source,
    blur: f64,
) -> f64 {
    let (point, epoch, caches) = state.split();
    module_value(slots, caches, point, epoch, source, blur)
}

/// Pull the gradient channel of `source` for the procedure's current point
pub(crate) fn pull_gradient(
    slots: &[ModuleSlot],
    state: &mut EvalState,
    source: Source,
    blur: f64,
    grad: &mut DVec3,
) {
    let (point, epoch, caches) = state.split();
    module_gradient(slots, caches, point, epoch, source, blur, grad);
}

/// Pull the color channel of `source` for the procedure's current point
pub(crate) fn pull_color(
    slots: &[ModuleSlot],
    state: &mut EvalState,
    source: Source,
    blur: f64,
    out: &mut Rgb,
) {
    let (point, epoch, caches) = state.split();
    module_color(slots, caches, point, epoch, source, blur, out);
}

fn module_value(
    slots: &[ModuleSlot],
    caches: &mut [ModuleCache],
    point: &PointInfo,
    epoch: u64,
    source: Source,
    blur: f64,
) -> f64 {
    let memo = caches[source.module].number[source.output];
    if memo.epoch == epoch && memo.blur == blur {
        return memo.value;
    }
    let slot = &slots[source.module];
    let value = {
        let mut ctx = EvalContext {
            slots,
            caches: &mut *caches,
            point,
            epoch,
            sources: &slot.sources,
        };
        slot.module.average_value(source.output, blur, &mut ctx)
    };
    caches[source.module].number[source.output] = NumberMemo { epoch, blur, value };
    value
}

fn module_gradient(
    slots: &[ModuleSlot],
    caches: &mut [ModuleCache],
    point: &PointInfo,
    epoch: u64,
    source: Source,
    blur: f64,
    grad: &mut DVec3,
) {
    let memo = caches[source.module].gradient[source.output];
    if memo.epoch == epoch && memo.blur == blur {
        *grad = memo.value;
        return;
    }
    let slot = &slots[source.module];
    {
        let mut ctx = EvalContext {
            slots,
            caches: &mut *caches,
            point,
            epoch,
            sources: &slot.sources,
        };
        slot.module.value_gradient(source.output, blur, grad, &mut ctx);
    }
    caches[source.module].gradient[source.output] = GradientMemo {
        epoch,
        blur,
        value: *grad,
    };
}

fn module_color(
    slots: &[ModuleSlot],
    caches: &mut [ModuleCache],
    point: &PointInfo,
    epoch: u64,
    source: Source,
    blur: f64,
    out: &mut Rgb,
) {
    let memo = caches[source.module].color[source.output];
    if memo.epoch == epoch && memo.blur == blur {
        *out = memo.value;
        return;
    }
    let slot = &slots[source.module];
    {
        let mut ctx = EvalContext {
            slots,
            caches: &mut *caches,
            point,
            epoch,
            sources: &slot.sources,
        };
        slot.module.color(source.output, blur, out, &mut ctx);
    }
    caches[source.module].color[source.output] = ColorMemo {
        epoch,
        blur,
        value: *out,
    };
}
