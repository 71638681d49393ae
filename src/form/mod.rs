//! Lease form — schema, wizard engine, and everything between a user's
//! answers and a rendered document.
//!
//! The engine is a pure state machine over [`SessionState`]; the
//! [`FormService`] wraps it with session storage, per-user ordering,
//! the session menu and rendering.

pub mod address;
pub mod assemble;
pub mod command;
pub mod engine;
pub mod layout;
pub mod list;
pub mod navigation;
pub mod numerals;
pub mod prompts;
pub mod render;
pub mod schema;
pub mod service;
pub mod session;
pub mod skip;
pub mod store;
pub mod validators;

pub use assemble::{Context, ContextAssembler};
pub use engine::{Action, Prompt, WizardEngine, WizardEvent};
pub use numerals::{NumberSpeller, RussianSpeller};
pub use render::{Renderer, SnapshotRenderer, TemplateId};
pub use schema::{FieldKind, FieldSpec, FormSchema};
pub use service::FormService;
pub use session::{Answer, Answers, SessionState, Step};
pub use skip::{SkipPolicy, SkipRule, SkipSet};
pub use store::{InMemorySessionStore, SessionStore};
