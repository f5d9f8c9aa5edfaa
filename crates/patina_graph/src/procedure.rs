// SPDX-License-Identifier: MIT OR Apache-2.0
//! The procedure: a module graph computing a set of named outputs.

use std::fmt;
use std::io::{Read, Write};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::evaluation::{self, EvalState};
use crate::link::{Destination, Link, Source};
use crate::module::Module;
use crate::output::OutputModule;
use crate::point::PointInfo;
use crate::registry::KindRegistry;
use crate::stream::{ReadError, SceneContext, StreamError, StreamReader, StreamWriter};

/// Stream format version understood by this implementation
pub const FORMAT_VERSION: i16 = 0;

/// 2D layout position of a module, opaque to evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate in editor space
    pub x: i32,
    /// Vertical coordinate in editor space
    pub y: i32,
}

impl Position {
    /// Create a position
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Arena slot holding one module and its graph-side state
pub(crate) struct ModuleSlot {
    pub(crate) module: Box<dyn Module>,
    pub(crate) position: Position,
    /// Resolved source per input port
    pub(crate) sources: Vec<Option<Source>>,
}

/// A graph of modules computing named output values
///
/// Modules and links are addressed by their positions in the respective
/// lists; deleting a module renumbers everything after it. The output list
/// is fixed at construction, which is what lets hosts bind procedure
/// outputs to material channels once and keep evaluating across edits.
///
/// Evaluation is single-threaded by design: the memo state lives inside the
/// procedure, so the evaluation methods take `&mut self`. Renderers clone
/// the procedure per worker instead of sharing one behind a lock.
///
/// # Example
///
/// ```
/// use glam::DVec3;
/// use patina_graph::{OutputModule, PointInfo, Procedure, Rgb, ValueKind};
///
/// let output = OutputModule::new("Height", ValueKind::Number, 0.0, Rgb::BLACK);
/// let mut proc = Procedure::new(vec![output]);
///
/// proc.init_for_point(PointInfo::at(DVec3::ZERO));
/// assert_eq!(proc.output_value(0), 0.0);
/// ```
pub struct Procedure {
    outputs: Vec<OutputModule>,
    modules: Vec<ModuleSlot>,
    links: Vec<Link>,
    state: EvalState,
}

impl Procedure {
    /// Create a procedure with a fixed set of outputs and no modules
    pub fn new(outputs: Vec<OutputModule>) -> Self {
        Self {
            outputs,
            modules: Vec::new(),
            links: Vec::new(),
            state: EvalState::default(),
        }
    }

    /// The procedure's outputs
    pub fn outputs(&self) -> &[OutputModule] {
        &self.outputs
    }

    /// Get an output by index
    pub fn output(&self, index: usize) -> Option<&OutputModule> {
        self.outputs.get(index)
    }

    /// Number of outputs
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// All modules, in index order
    pub fn modules(&self) -> impl Iterator<Item = &dyn Module> {
        self.modules.iter().map(|slot| slot.module.as_ref())
    }

    /// Get a module by index
    pub fn module(&self, index: usize) -> Option<&dyn Module> {
        self.modules.get(index).map(|slot| slot.module.as_ref())
    }

    /// Get a mutable module by index, for editing its parameters
    pub fn module_mut(&mut self, index: usize) -> Option<&mut dyn Module> {
        // Not `Option::map`: the unsized borrow must coerce here, a closure
        // would pin the object lifetime to 'static.
        match self.modules.get_mut(index) {
            Some(slot) => Some(slot.module.as_mut()),
            None => None,
        }
    }

    /// Number of modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Layout position of the module at `index`
    pub fn position(&self, index: usize) -> Option<Position> {
        self.modules.get(index).map(|slot| slot.position)
    }

    /// Mutable layout position of the module at `index`
    pub fn position_mut(&mut self, index: usize) -> Option<&mut Position> {
        self.modules.get_mut(index).map(|slot| &mut slot.position)
    }

    /// Find the index of a module by identity, not by value
    ///
    /// Two modules with equal parameters are still distinct; this only
    /// matches the exact instance passed in.
    pub fn module_index(&self, module: &dyn Module) -> Option<usize> {
        self.modules
            .iter()
            .position(|slot| std::ptr::addr_eq(slot.module.as_ref(), module))
    }

    /// Find the index of an output by identity
    pub fn output_index(&self, output: &OutputModule) -> Option<usize> {
        self.outputs
            .iter()
            .position(|candidate| std::ptr::eq(candidate, output))
    }

    /// All links, in creation order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links whose source or destination is the module at `index`
    ///
    /// Yields `(link_index, link)` pairs so callers can delete what they
    /// find; delete in descending index order to keep indices valid.
    pub fn links_touching(&self, module: usize) -> impl Iterator<Item = (usize, &Link)> {
        self.links
            .iter()
            .enumerate()
            .filter(move |(_, link)| link.touches_module(module))
    }

    /// The resolved source currently feeding one module input, if any
    pub fn input_source(&self, module: usize, input: usize) -> Option<Source> {
        self.modules.get(module)?.sources.get(input).copied().flatten()
    }

    /// Add a module, returning its index
    pub fn add_module(&mut self, module: Box<dyn Module>, position: Position) -> usize {
        let inputs = module.input_ports().len();
        self.modules.push(ModuleSlot {
            module,
            position,
            sources: vec![None; inputs],
        });
        self.modules.len() - 1
    }

    /// Remove the module at `index` and renumber everything after it
    ///
    /// Callers must delete the links touching the module first (see
    /// [`Procedure::links_touching`]); references left behind by a skipped
    /// cleanup are not repaired and later operations on them misbehave.
    /// Panics if `index` is out of bounds.
    pub fn delete_module(&mut self, index: usize) -> Box<dyn Module> {
        let slot = self.modules.remove(index);

        // Renumber references to the modules that shifted down.
        let shift = |source: &mut Source| {
            if source.module > index {
                source.module -= 1;
            }
        };
        for link in &mut self.links {
            shift(&mut link.from);
            if let Destination::Module { module, .. } = &mut link.to {
                if *module > index {
                    *module -= 1;
                }
            }
        }
        for remaining in &mut self.modules {
            for source in remaining.sources.iter_mut().flatten() {
                shift(source);
            }
        }
        for output in &mut self.outputs {
            if let Some(source) = &mut output.source {
                shift(source);
            }
        }
        slot.module
    }

    /// Add a link and resolve its destination port's source
    ///
    /// No validation is performed: endpoints must be in range, and linking
    /// an already-sourced input is allowed. The input simply resolves to
    /// the most recently added source while both links stay in the list.
    /// Creating a cycle is also allowed here; run
    /// [`Procedure::check_feedback`] before evaluating.
    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
        match link.to {
            Destination::Module { module, input } => {
                self.modules[module].sources[input] = Some(link.from);
            }
            Destination::Output { output } => {
                self.outputs[output].source = Some(link.from);
            }
        }
    }

    /// Remove the link at `index` and clear its destination port's source
    ///
    /// The clear is unconditional: if two links target the same input,
    /// deleting either one leaves that input unlinked even though the other
    /// link remains in the list. Panics if `index` is out of bounds.
    pub fn delete_link(&mut self, index: usize) -> Link {
        let link = self.links.remove(index);
        match link.to {
            Destination::Module { module, input } => {
                if let Some(slot) = self.modules.get_mut(module) {
                    if let Some(source) = slot.sources.get_mut(input) {
                        *source = None;
                    }
                }
            }
            Destination::Output { output } => {
                if let Some(out) = self.outputs.get_mut(output) {
                    out.source = None;
                }
            }
        }
        link
    }

    /// Check whether any output depends on a feedback loop
    ///
    /// Walks upstream from each output; a module found on its own upstream
    /// path is a loop. Modules feeding no output are not checked, matching
    /// what evaluation can actually reach.
    pub fn check_feedback(&self) -> bool {
        for output in &self.outputs {
            let Some(source) = output.source else { continue };
            let mut marks = vec![Mark::White; self.modules.len()];
            if self.feedback_from(source.module, &mut marks) {
                return true;
            }
        }
        false
    }

    fn feedback_from(&self, index: usize, marks: &mut [Mark]) -> bool {
        match marks[index] {
            Mark::Gray => return true,
            Mark::Black => return false,
            Mark::White => {}
        }
        marks[index] = Mark::Gray;
        for source in self.modules[index].sources.iter().flatten() {
            if self.feedback_from(source.module, marks) {
                return true;
            }
        }
        marks[index] = Mark::Black;
        false
    }

    /// Begin evaluating a new point, invalidating all memoized values
    ///
    /// Must be called before pulling output values; the procedure keeps
    /// answering for this point until the next call.
    pub fn init_for_point(&mut self, point: PointInfo) {
        self.state.begin(point, &self.modules);
    }

    /// Number value of output `which` at the current point
    ///
    /// Unlinked outputs report their default value. Panics if `which` is
    /// out of bounds.
    pub fn output_value(&mut self, which: usize) -> f64 {
        match self.outputs[which].source {
            None => self.outputs[which].default_value(),
            Some(source) => evaluation::pull_value(&self.modules, &mut self.state, source, 0.0),
        }
    }

    /// Gradient of output `which` at the current point
    ///
    /// Unlinked outputs report a zero gradient.
    pub fn output_gradient(&mut self, which: usize, grad: &mut DVec3) {
        match self.outputs[which].source {
            None => *grad = DVec3::ZERO,
            Some(source) => {
                evaluation::pull_gradient(&self.modules, &mut self.state, source, 0.0, grad);
            }
        }
    }

    /// Color of output `which` at the current point
    ///
    /// Unlinked outputs report their default color.
    pub fn output_color(&mut self, which: usize, out: &mut Rgb) {
        match self.outputs[which].source {
            None => *out = self.outputs[which].default_color(),
            Some(source) => {
                evaluation::pull_color(&self.modules, &mut self.state, source, 0.0, out);
            }
        }
    }

    /// Replace this procedure's graph with a deep copy of another's
    ///
    /// Outputs are matched by position, so both procedures must have the
    /// same output shape; the copied modules are fresh instances that share
    /// no state with the source.
    pub fn copy_from(&mut self, source: &Procedure) {
        debug_assert_eq!(
            self.outputs.len(),
            source.outputs.len(),
            "procedures must have matching output shapes"
        );
        self.modules = source
            .modules
            .iter()
            .map(|slot| ModuleSlot {
                module: slot.module.duplicate(),
                position: slot.position,
                sources: vec![None; slot.sources.len()],
            })
            .collect();
        for output in &mut self.outputs {
            output.source = None;
        }
        self.links.clear();
        for link in &source.links {
            self.add_link(*link);
        }
    }

    /// Write the graph to a binary stream
    ///
    /// The layout is versioned and position-based: module references are
    /// stored as list indices, and a link into a procedure output is tagged
    /// by the negative value `-(output index) - 1` where a destination
    /// module index would otherwise appear.
    pub fn write_to_stream<W: Write>(
        &self,
        out: &mut W,
        scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        let mut w = StreamWriter::new(out);

        w.write_i16(FORMAT_VERSION)?;
        w.write_i32(self.modules.len() as i32)?;
        for slot in &self.modules {
            w.write_string(slot.module.kind())?;
            w.write_i32(slot.position.x)?;
            w.write_i32(slot.position.y)?;
            slot.module.write_payload(&mut w, scene)?;
        }
        w.write_i32(self.links.len() as i32)?;
        for link in &self.links {
            w.write_i32(link.from.module as i32)?;
            w.write_i32(link.from.output as i32)?;
            match link.to {
                Destination::Output { output } => {
                    w.write_i32(-(output as i32) - 1)?;
                }
                Destination::Module { module, input } => {
                    w.write_i32(module as i32)?;
                    w.write_i32(input as i32)?;
                }
            }
        }
        Ok(())
    }

    /// Replace the graph with one read from a binary stream
    ///
    /// Module kinds are instantiated through `registry` and restore their
    /// parameters from their payloads. The read is all-or-nothing: on any
    /// error the procedure is left exactly as it was.
    pub fn read_from_stream<R: Read>(
        &mut self,
        input: &mut R,
        scene: &dyn SceneContext,
        registry: &KindRegistry,
    ) -> Result<(), ReadError> {
        let mut r = StreamReader::new(input);

        let version = r.read_i16()?;
        if version != FORMAT_VERSION {
            return Err(ReadError::InvalidFormat(version));
        }

        let module_count = r.read_i32()?;
        if module_count < 0 {
            return Err(ReadError::Malformed(format!(
                "module count {module_count}"
            )));
        }
        let mut modules = Vec::new();
        for _ in 0..module_count {
            let kind = r.read_string()?;
            let x = r.read_i32()?;
            let y = r.read_i32()?;
            let Some(mut module) = registry.instantiate(&kind) else {
                return Err(ReadError::UnknownKind(kind));
            };
            module.read_payload(&mut r, scene)?;
            let inputs = module.input_ports().len();
            modules.push(ModuleSlot {
                module,
                position: Position::new(x, y),
                sources: vec![None; inputs],
            });
        }

        let link_count = r.read_i32()?;
        if link_count < 0 {
            return Err(ReadError::Malformed(format!("link count {link_count}")));
        }
        let mut links = Vec::new();
        for _ in 0..link_count {
            let from_module = checked_index(r.read_i32()?.into(), modules.len(), "source module")?;
            let from_output = checked_index(
                r.read_i32()?.into(),
                modules[from_module].module.output_ports().len(),
                "source output",
            )?;
            let from = Source::new(from_module, from_output);

            let to_tag = i64::from(r.read_i32()?);
            let to = if to_tag < 0 {
                let output = checked_index(-to_tag - 1, self.outputs.len(), "output")?;
                Destination::Output { output }
            } else {
                let module = checked_index(to_tag, modules.len(), "target module")?;
                let input = checked_index(
                    r.read_i32()?.into(),
                    modules[module].module.input_ports().len(),
                    "target input",
                )?;
                Destination::Module { module, input }
            };
            links.push(Link::new(from, to));
        }

        // Everything decoded, commit.
        for output in &mut self.outputs {
            output.source = None;
        }
        self.modules = modules;
        self.links.clear();
        for link in links {
            self.add_link(link);
        }
        tracing::debug!(
            modules = self.modules.len(),
            links = self.links.len(),
            "procedure restored from stream"
        );
        Ok(())
    }
}

impl Clone for Procedure {
    fn clone(&self) -> Self {
        let mut copy = Self {
            outputs: self.outputs.clone(),
            modules: Vec::new(),
            links: Vec::new(),
            state: EvalState::default(),
        };
        copy.copy_from(self);
        copy
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outputs: Vec<&str> = self.outputs.iter().map(OutputModule::name).collect();
        let modules: Vec<&str> = self.modules.iter().map(|slot| slot.module.kind()).collect();
        f.debug_struct("Procedure")
            .field("outputs", &outputs)
            .field("modules", &modules)
            .field("links", &self.links)
            .finish()
    }
}

/// DFS state used by feedback checking
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    White,
    Gray,
    Black,
}

fn checked_index(value: i64, len: usize, what: &str) -> Result<usize, ReadError> {
    match usize::try_from(value) {
        Ok(index) if index < len => Ok(index),
        _ => Err(ReadError::Malformed(format!(
            "{what} index {value} out of range"
        ))),
    }
}
