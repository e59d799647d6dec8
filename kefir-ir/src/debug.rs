//! The debug-info sidecar: instruction-ref → source-location and
//! instruction-ref → live-locals maps, plus the construction/rewrite
//! cursor (`spec.md` §4.5).

use hashbrown::{
    HashMap,
    HashSet,
};
use kefir_diagnostics::SourceLocation;

use crate::{
    container::CodeContainer,
    refs::{
        InstructionRef,
        LocalIndex,
    },
};

/// The sidecar maps kept alongside a function's [`CodeContainer`].
#[derive(Debug, Default)]
pub struct DebugInfo {
    locations: HashMap<InstructionRef, SourceLocation>,
    locals: HashMap<InstructionRef, HashSet<LocalIndex>>,
}

impl DebugInfo {
    /// An empty sidecar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `instr`'s source location.
    pub fn record_location(&mut self, instr: InstructionRef, location: SourceLocation) {
        self.locations.insert(instr, location);
    }

    /// `instr`'s recorded source location, if any.
    pub fn location_of(&self, instr: InstructionRef) -> Option<&SourceLocation> {
        self.locations.get(&instr)
    }

    /// Record that `instr` materializes or clobbers `local`'s storage.
    pub fn add_live_local(&mut self, instr: InstructionRef, local: LocalIndex) {
        self.locals.entry(instr).or_default().insert(local);
    }

    /// The set of locals live at `instr`, if any were recorded.
    pub fn locals_of(&self, instr: InstructionRef) -> Option<&HashSet<LocalIndex>> {
        self.locals.get(&instr)
    }

    /// Transfer `from`'s sidecar entries to `to`, used by rewrite helpers
    /// that replace one instruction with another so the replacement keeps
    /// the original's debug coverage (`spec.md` §4.5, "a rewrite helper
    /// performs this transfer atomically").
    pub fn transfer(&mut self, from: InstructionRef, to: InstructionRef) {
        if let Some(loc) = self.locations.remove(&from) {
            self.locations.insert(to, loc);
        }
        if let Some(locals) = self.locals.remove(&from) {
            self.locals.insert(to, locals);
        }
    }

    /// Drop every entry whose instruction-ref is no longer live in
    /// `container`, restoring invariant 5 after a pass removes instructions
    /// without transferring their entries (`spec.md` §8).
    pub fn retain_live(&mut self, container: &CodeContainer) {
        self.locations
            .retain(|&r, _| container.instruction(r).is_ok_and(|i| !i.is_tombstone()));
        self.locals
            .retain(|&r, _| container.instruction(r).is_ok_and(|i| !i.is_tombstone()));
    }

    /// Whether every instruction-ref mentioned in either map is live in
    /// `container` (`spec.md` §8 invariant: "∀ instruction-ref r in the
    /// debug-info tables: r is live").
    pub fn check_invariant(&self, container: &CodeContainer) -> bool {
        self.locations
            .keys()
            .chain(self.locals.keys())
            .all(|&r| container.instruction(r).is_ok_and(|i| !i.is_tombstone()))
    }
}

/// The "currently active source location" tracked during construction and
/// during any pass that inserts instructions; inserted instructions inherit
/// the cursor's location until it is re-set (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct DebugCursor {
    current: SourceLocation,
}

impl Default for DebugCursor {
    fn default() -> Self {
        Self {
            current: SourceLocation::unknown(),
        }
    }
}

impl DebugCursor {
    /// A cursor pointing at an unknown location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the cursor to `location`.
    pub fn set(&mut self, location: SourceLocation) {
        self.current = location;
    }

    /// The cursor's current location.
    pub fn current(&self) -> SourceLocation {
        self.current.clone()
    }
}
