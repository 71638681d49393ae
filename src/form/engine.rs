//! Wizard engine — advances a session through the schema one event at a time.
//!
//! The engine owns no state. Every call takes the session by `&mut`, mutates
//! it, and returns the outbound actions for the transport. Invalid input and
//! stale events never escape as errors: they become `Reject` or nothing.

use std::sync::Arc;

use tracing::debug;

use super::address::{
    AddressCollector, AddressDraft, AddressStep, SKIP_ADDRESS_LABEL, SKIP_ADDRESS_TAG,
};
use super::list::{ListCollector, ListStep};
use super::schema::{ChoiceOption, FieldKind, FieldSpec, FormSchema};
use super::session::{Answer, Answers, SessionState, Step, SubFlow};
use super::skip::{SkipPolicy, SkipSet};
use super::validators::is_skip_sentinel;

/// Inbound event shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// Free-form text.
    Text(String),
    /// A tagged discrete choice.
    Choice(String),
}

/// A question to show, optionally with a choice widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub key: String,
    pub text: String,
    pub choices: Vec<ChoiceOption>,
}

impl Prompt {
    fn plain(key: &str, text: &str) -> Self {
        Self {
            key: key.to_string(),
            text: text.to_string(),
            choices: Vec::new(),
        }
    }
}

/// Outbound action produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Prompt(Prompt),
    /// Input failed validation; the step did not move.
    Reject { key: String, reason: String },
    /// A skipped field was blanked without asking.
    Advance { key: String },
    /// Short acknowledgement of an accepted answer.
    Notice(String),
    /// Every field consumed. Emitted once per pass.
    Complete(Answers),
}

/// Orchestrates step advancement over an immutable schema and skip policy.
#[derive(Clone)]
pub struct WizardEngine {
    schema: Arc<FormSchema>,
    policy: Arc<SkipPolicy>,
}

impl WizardEngine {
    pub fn new(schema: Arc<FormSchema>, policy: Arc<SkipPolicy>) -> Self {
        Self { schema, policy }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn skip_set(&self, session: &SessionState) -> SkipSet {
        self.policy.skip_set(&session.answers)
    }

    /// Field the session is pointing at, if any.
    pub fn current_field(&self, session: &SessionState) -> Option<&FieldSpec> {
        session.current_index().and_then(|i| self.schema.get(i))
    }

    /// Begin a new pass in a fresh generation and prompt the first question.
    pub fn start(&self, session: &mut SessionState) -> Vec<Action> {
        session.start(self.schema.len());
        self.prompt(session)
    }

    /// Run the prompt step for the current position.
    ///
    /// Skipped fields are blanked and passed with a silent `Advance` until a
    /// visible field or completion is reached.
    pub fn prompt(&self, session: &mut SessionState) -> Vec<Action> {
        let mut actions = Vec::new();
        loop {
            match session.step() {
                None => return actions,
                Some(Step::Done) => {
                    if !session.completion_signaled {
                        session.completion_signaled = true;
                        actions.push(Action::Complete(session.answers.clone()));
                    }
                    return actions;
                }
                Some(Step::At(index)) => {
                    let field = &self.schema.fields()[index];
                    if self.policy.is_skipped(&session.answers, &field.key) {
                        debug!(field = %field.key, step = index, "Skipping field");
                        for key in std::iter::once(field.key.clone()).chain(field.aux_keys()) {
                            session.answers.insert(key, Answer::Blank);
                        }
                        session.move_to(index + 1, self.schema.len());
                        actions.push(Action::Advance {
                            key: field.key.clone(),
                        });
                        continue;
                    }
                    actions.extend(self.field_prompt(session, field).map(Action::Prompt));
                    return actions;
                }
            }
        }
    }

    /// The prompt for `field` given the session's sub-flow state.
    ///
    /// Choice widgets are shown once per step; a repeat returns `None`.
    fn field_prompt(&self, session: &mut SessionState, field: &FieldSpec) -> Option<Prompt> {
        match &field.kind {
            FieldKind::PlainText => Some(Prompt::plain(&field.key, &field.prompt)),
            FieldKind::InlineChoice(variant) => {
                if session.pending_choice_shown {
                    return None;
                }
                session.pending_choice_shown = true;
                Some(Prompt {
                    key: field.key.clone(),
                    text: field.prompt.clone(),
                    choices: variant.options().to_vec(),
                })
            }
            FieldKind::MultiPhaseAddress(variant) => {
                let collector = AddressCollector::new(&field.key, variant);
                match &session.sub_flow {
                    Some(SubFlow::Address(draft)) if draft.phase_index() > 0 => Some(
                        Prompt::plain(&field.key, collector.current_phase(draft).prompt()),
                    ),
                    _ => {
                        if session.pending_choice_shown {
                            return None;
                        }
                        session.pending_choice_shown = true;
                        Some(Prompt {
                            key: field.key.clone(),
                            text: field.prompt.clone(),
                            choices: vec![ChoiceOption {
                                tag: SKIP_ADDRESS_TAG,
                                label: SKIP_ADDRESS_LABEL,
                                value: "",
                            }],
                        })
                    }
                }
            }
            FieldKind::MultiValueList(variant) => match &session.sub_flow {
                Some(SubFlow::List(buffer)) if !buffer.is_empty() => Some(Prompt::plain(
                    &field.key,
                    ListCollector::new(*variant).next_item_prompt(),
                )),
                _ => Some(Prompt::plain(&field.key, &field.prompt)),
            },
        }
    }

    /// Apply one inbound event to the session.
    ///
    /// Events that do not fit the current field are ignored.
    pub fn advance(&self, session: &mut SessionState, event: WizardEvent) -> Vec<Action> {
        let Some(index) = session.current_index() else {
            debug!(?event, "Event outside an active step ignored");
            return Vec::new();
        };
        let field = &self.schema.fields()[index];

        match (&field.kind, event) {
            (FieldKind::PlainText, WizardEvent::Text(raw)) => {
                let answer = if is_skip_sentinel(&raw) {
                    Answer::Blank
                } else {
                    let validated = match field.validator {
                        Some(validator) => validator.apply(&raw),
                        None => Ok(raw.trim().to_string()),
                    };
                    match validated {
                        Ok(value) => Answer::Text(value),
                        Err(rejected) => return self.reject(session, field, rejected.reason),
                    }
                };
                session.answers.insert(field.key.clone(), answer);
                self.next(session, index, None)
            }

            (FieldKind::InlineChoice(variant), WizardEvent::Text(raw)) => {
                if is_skip_sentinel(&raw) {
                    let answer = variant
                        .sentinel_value()
                        .map_or(Answer::Blank, Answer::text);
                    session.answers.insert(field.key.clone(), answer);
                    return self.next(session, index, Some("Пропущено.".to_string()));
                }
                if variant.accepts_free_text() && !raw.trim().is_empty() {
                    session
                        .answers
                        .insert(field.key.clone(), Answer::text(raw.trim()));
                    return self.next(session, index, None);
                }
                self.ignored(field, "text for a choice field")
            }

            (FieldKind::InlineChoice(variant), WizardEvent::Choice(tag)) => {
                match variant.option(&tag) {
                    Some(option) => {
                        session
                            .answers
                            .insert(field.key.clone(), Answer::text(option.value));
                        self.next(session, index, Some(format!("✅ Вы выбрали: {}", option.label)))
                    }
                    None => self.ignored(field, "unknown choice tag"),
                }
            }

            (FieldKind::MultiPhaseAddress(variant), WizardEvent::Choice(tag)) => {
                if tag != SKIP_ADDRESS_TAG {
                    return self.ignored(field, "unknown choice tag");
                }
                let collector = AddressCollector::new(&field.key, variant);
                session.answers.extend(collector.skipped());
                self.next(session, index, Some("Адрес пропущен.".to_string()))
            }

            (FieldKind::MultiPhaseAddress(variant), WizardEvent::Text(raw)) => {
                let collector = AddressCollector::new(&field.key, variant);
                let mut draft = match session.sub_flow.take() {
                    Some(SubFlow::Address(draft)) => draft,
                    _ => AddressDraft::default(),
                };
                if draft.phase_index() == 0 && is_skip_sentinel(&raw) {
                    session.answers.extend(collector.skipped());
                    return self.next(session, index, Some("Адрес пропущен.".to_string()));
                }
                let outcome = collector.accept(&mut draft, &raw);
                match outcome {
                    Ok(AddressStep::Next(phase)) => {
                        session.sub_flow = Some(SubFlow::Address(draft));
                        vec![Action::Prompt(Prompt::plain(&field.key, phase.prompt()))]
                    }
                    Ok(AddressStep::Finished(values)) => {
                        session.answers.extend(values);
                        self.next(session, index, None)
                    }
                    Err(rejected) => {
                        session.sub_flow = Some(SubFlow::Address(draft));
                        self.reject(session, field, rejected.reason)
                    }
                }
            }

            (FieldKind::MultiValueList(variant), WizardEvent::Text(raw)) => {
                let collector = ListCollector::new(*variant);
                let mut buffer = match session.sub_flow.take() {
                    Some(SubFlow::List(buffer)) => buffer,
                    _ => Vec::new(),
                };
                let outcome = collector.accept(&mut buffer, &raw);
                session.sub_flow = Some(SubFlow::List(buffer));
                match outcome {
                    Ok(ListStep::Added(count)) => {
                        debug!(field = %field.key, count, "List item buffered");
                        vec![Action::Prompt(Prompt::plain(
                            &field.key,
                            collector.next_item_prompt(),
                        ))]
                    }
                    Ok(ListStep::Finished(answer)) => {
                        session.answers.insert(field.key.clone(), answer);
                        self.next(session, index, None)
                    }
                    Err(rejected) => self.reject(session, field, rejected.reason),
                }
            }

            (FieldKind::PlainText | FieldKind::MultiValueList(_), WizardEvent::Choice(_)) => {
                self.ignored(field, "choice for a text field")
            }
        }
    }

    /// Move past `index` and prompt whatever comes next.
    fn next(
        &self,
        session: &mut SessionState,
        index: usize,
        notice: Option<String>,
    ) -> Vec<Action> {
        session.move_to(index + 1, self.schema.len());
        let mut actions: Vec<Action> = notice.into_iter().map(Action::Notice).collect();
        actions.extend(self.prompt(session));
        actions
    }

    fn reject(&self, session: &mut SessionState, field: &FieldSpec, reason: String) -> Vec<Action> {
        debug!(field = %field.key, %reason, "Input rejected");
        // a rejection always repeats the question, even once the widget was shown
        let prompt = self
            .field_prompt(session, field)
            .unwrap_or_else(|| Prompt::plain(&field.key, &field.prompt));
        vec![
            Action::Reject {
                key: field.key.clone(),
                reason,
            },
            Action::Prompt(prompt),
        ]
    }

    fn ignored(&self, field: &FieldSpec, why: &str) -> Vec<Action> {
        debug!(field = %field.key, why, "Event ignored");
        Vec::new()
    }
}
