//! Boolean I/O lines exchanged with a PLC.
//!
//! Wire-level encoding is out of scope; a line is a symbol plus its current
//! level. Inputs report the edge produced by each level change so the owner
//! can react to switch-on without polling.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transition produced by changing a line's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

/// Persisted description of an input line.
///
/// Only the symbol is saved. The level is transient plant state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputInfo {
    /// PLC symbol of the line.
    pub symbol: String,
}

impl InputInfo {
    /// Creates an input description with the given symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// A digital input line driven from outside (PLC or operator).
///
/// # Example
///
/// ```
/// use conveyor_types::{DigitalInput, Edge};
///
/// let mut release = DigitalInput::new("Release");
/// assert_eq!(release.set(true), Some(Edge::Rising));
/// assert_eq!(release.set(true), None);
/// assert_eq!(release.set(false), Some(Edge::Falling));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalInput {
    symbol: String,
    active: bool,
}

impl DigitalInput {
    /// Creates an inactive input with the given symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            active: false,
        }
    }

    /// Creates an inactive input from its persisted description.
    #[must_use]
    pub fn from_info(info: &InputInfo) -> Self {
        Self::new(info.symbol.clone())
    }

    /// Returns the persisted description of this input.
    #[must_use]
    pub fn info(&self) -> InputInfo {
        InputInfo::new(self.symbol.clone())
    }

    /// PLC symbol of the line.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current level.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Drives the line and returns the edge, if the level changed.
    pub fn set(&mut self, active: bool) -> Option<Edge> {
        if self.active == active {
            return None;
        }
        self.active = active;
        Some(if active { Edge::Rising } else { Edge::Falling })
    }
}

/// A digital output line written by the model and read by a PLC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalOutput {
    symbol: String,
    active: bool,
}

impl DigitalOutput {
    /// Creates a low output with the given symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            active: false,
        }
    }

    /// PLC symbol of the line.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current level.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Drives the output high.
    pub fn on(&mut self) {
        self.active = true;
    }

    /// Drives the output low.
    pub fn off(&mut self) {
        self.active = false;
    }
}
