//! Back-navigation over the schema.

use super::address::AddressCollector;
use super::engine::{Action, WizardEngine};
use super::list::ListCollector;
use super::schema::{FieldKind, FieldSpec};
use super::session::{SessionState, Step, SubFlow};

pub const ALREADY_AT_FIRST: &str = "Вы уже на первом вопросе.";

impl WizardEngine {
    /// Step back one question, or one phase inside a sub-flow.
    ///
    /// Address phases and list items are reverted in place. Otherwise the
    /// current answer is discarded and the pointer moves to the previous
    /// field the forward pass would have asked, whose answer is discarded
    /// too. Skipped fields passed over lose their blank answers.
    pub fn go_back(&self, session: &mut SessionState) -> Vec<Action> {
        let len = self.schema().len();
        let index = match session.step() {
            None => return Vec::new(),
            Some(Step::Done) => len,
            Some(Step::At(i)) => i,
        };

        if let Some(field) = self.schema().get(index) {
            if self.revert_sub_flow(session, field) {
                tracing::debug!(field = %field.key, "Reverted sub-flow phase");
                return self.prompt(session);
            }
        }

        if index == 0 {
            return vec![Action::Notice(ALREADY_AT_FIRST.to_string())];
        }

        if let Some(field) = self.schema().get(index) {
            clear_answer(session, field);
        }

        let skip = self.skip_set(session);
        let mut target = index - 1;
        while target > 0 && skip.contains(&self.schema().fields()[target].key) {
            clear_answer(session, &self.schema().fields()[target]);
            target -= 1;
        }
        clear_answer(session, &self.schema().fields()[target]);

        tracing::debug!(from = index, to = target, "Stepped back");
        session.completion_signaled = false;
        session.move_to(target, len);
        self.prompt(session)
    }

    /// Undo one phase or item of the current field's sub-flow.
    fn revert_sub_flow(&self, session: &mut SessionState, field: &FieldSpec) -> bool {
        let reverted = match (&field.kind, session.sub_flow.as_mut()) {
            (FieldKind::MultiPhaseAddress(variant), Some(SubFlow::Address(draft))) => {
                AddressCollector::new(&field.key, variant).revert(draft)
            }
            (FieldKind::MultiValueList(variant), Some(SubFlow::List(buffer))) => {
                ListCollector::new(*variant).revert(buffer)
            }
            _ => false,
        };
        if reverted {
            // back at the initial phase the skip widget must be offered again
            session.pending_choice_shown = false;
        }
        reverted
    }
}

fn clear_answer(session: &mut SessionState, field: &FieldSpec) {
    session.answers.remove(&field.key);
    for key in field.aux_keys() {
        session.answers.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::form::engine::WizardEvent;
    use crate::form::schema::FormSchema;
    use crate::form::session::Answer;
    use crate::form::skip::SkipPolicy;

    fn engine() -> WizardEngine {
        WizardEngine::new(Arc::new(FormSchema::lease()), Arc::new(SkipPolicy::lease()))
    }

    fn text(s: &str) -> WizardEvent {
        WizardEvent::Text(s.to_string())
    }

    fn jump_to(engine: &WizardEngine, session: &mut SessionState, key: &str) {
        let index = engine.schema().index_of(key).unwrap();
        session.move_to(index, engine.schema().len());
        engine.prompt(session);
    }

    fn current_key(engine: &WizardEngine, session: &SessionState) -> String {
        engine.current_field(session).unwrap().key.clone()
    }

    #[test]
    fn back_at_first_question_is_a_no_op() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        let before = session.clone();
        assert_eq!(
            engine.go_back(&mut session),
            vec![Action::Notice(ALREADY_AT_FIRST.to_string())]
        );
        assert_eq!(session, before);
    }

    #[test]
    fn back_then_forward_restores_state() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        engine.advance(&mut session, text("А123"));
        let answered = {
            engine.advance(&mut session, text("20.03.25"));
            session.clone()
        };

        engine.go_back(&mut session);
        assert_eq!(current_key(&engine, &session), "date");
        assert!(!session.answers.contains_key("date"));

        engine.advance(&mut session, text("20.03.25"));
        assert_eq!(session, answered);
    }

    #[test]
    fn back_then_forward_on_choice_field() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        jump_to(&engine, &mut session, "obj_animals");
        engine.advance(&mut session, WizardEvent::Choice("запрещено".into()));
        let answered = session.clone();

        let actions = engine.go_back(&mut session);
        assert!(matches!(
            &actions[..],
            [Action::Prompt(p)] if p.key == "obj_animals" && !p.choices.is_empty()
        ));
        engine.advance(&mut session, WizardEvent::Choice("запрещено".into()));
        assert_eq!(session, answered);
    }

    #[test]
    fn back_never_lands_on_skipped_field() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        jump_to(&engine, &mut session, "doc_choice");
        engine.advance(&mut session, WizardEvent::Choice("doc_egrn".into()));
        engine.advance(&mut session, text("78:12:0000000:1234"));
        assert_eq!(current_key(&engine, &session), "obj_tenants");
        assert_eq!(session.answers["cert_series"], Answer::Blank);

        engine.go_back(&mut session);
        assert_eq!(current_key(&engine, &session), "obj_kadastr");
        assert!(!session.answers.contains_key("obj_kadastr"));
        assert!(!session.answers.contains_key("cert_series"));
        assert!(!session.answers.contains_key("cert_number"));
        assert_eq!(session.answers["doc_choice"], Answer::text("egrn"));
    }

    #[test]
    fn back_inside_address_reverts_one_phase() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        jump_to(&engine, &mut session, "naim_address");
        let step = session.step();
        engine.advance(&mut session, text("москва"));
        engine.advance(&mut session, text("тверская"));

        let actions = engine.go_back(&mut session);
        assert_eq!(session.step(), step);
        assert!(matches!(&actions[..], [Action::Prompt(p)] if p.text.starts_with("Улица")));

        // back to the initial phase offers the skip widget again
        let actions = engine.go_back(&mut session);
        assert!(matches!(&actions[..], [Action::Prompt(p)] if p.choices.len() == 1));
        assert_eq!(session.step(), step);
    }

    #[test]
    fn back_inside_list_pops_last_item() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        jump_to(&engine, &mut session, "additional_conditions");
        engine.advance(&mut session, text("Первый пункт"));
        engine.advance(&mut session, text("Второй пункт"));
        engine.go_back(&mut session);
        assert_eq!(session.sub_flow, Some(SubFlow::List(vec!["Первый пункт".into()])));
        assert_eq!(current_key(&engine, &session), "additional_conditions");
    }

    #[test]
    fn back_from_completion_reopens_last_asked_field() {
        let engine = engine();
        let mut session = SessionState::new();
        engine.start(&mut session);
        jump_to(&engine, &mut session, "act_make");
        engine.advance(&mut session, WizardEvent::Choice("act_no".into()));
        assert_eq!(session.step(), Some(Step::Done));

        engine.go_back(&mut session);
        assert_eq!(current_key(&engine, &session), "act_make");
        assert!(!session.completion_signaled);
        assert!(!session.answers.contains_key("act_cold_water"));

        let actions = engine.advance(&mut session, WizardEvent::Choice("act_no".into()));
        assert!(matches!(actions.last(), Some(Action::Complete(_))));
    }
}
