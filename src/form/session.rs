//! Per-user session state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::address::AddressDraft;

/// A stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Normalized text value.
    Text(String),
    /// Deliberately left blank (skip sentinel, skip rule, or skipped address).
    Blank,
    /// Ordered items of a list field.
    List(Vec<String>),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Answers keyed by field (or auxiliary) key.
pub type Answers = BTreeMap<String, Answer>;

/// Position in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Valid index into the schema.
    At(usize),
    /// All fields consumed; awaiting a post-completion action.
    Done,
}

/// In-progress multi-phase collection for the current field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubFlow {
    Address(AddressDraft),
    List(Vec<String>),
}

/// Mutable state for one user.
///
/// `step` is `None` when no session is active. Otherwise it is always a
/// valid schema index or [`Step::Done`]; [`SessionState::move_to`] is the
/// only way to point it somewhere, and it clamps past-the-end to `Done`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Bumped on every start and reset; events from older generations are
    /// ignored.
    pub generation: u64,
    step: Option<Step>,
    pub answers: Answers,
    /// Whether the inline widget for the current field has been shown.
    pub pending_choice_shown: bool,
    pub sub_flow: Option<SubFlow>,
    /// Whether `Complete` has been emitted for the current pass.
    pub completion_signaled: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Option<Step> {
        self.step
    }

    pub fn is_active(&self) -> bool {
        self.step.is_some()
    }

    /// Current schema index, if pointing at a field.
    pub fn current_index(&self) -> Option<usize> {
        match self.step {
            Some(Step::At(i)) => Some(i),
            _ => None,
        }
    }

    /// Begin a fresh pass over the schema in a new generation.
    pub fn start(&mut self, schema_len: usize) {
        self.reset();
        self.move_to(0, schema_len);
    }

    /// Atomically discard everything and bump the generation.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    /// Point at `index`, or at `Done` when it runs past the schema.
    ///
    /// Every step change drops the widget guard and any sub-flow.
    pub fn move_to(&mut self, index: usize, schema_len: usize) {
        self.step = Some(if index < schema_len {
            Step::At(index)
        } else {
            Step::Done
        });
        self.pending_choice_shown = false;
        self.sub_flow = None;
    }
}
