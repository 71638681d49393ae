//! FormService — per-user session handling around the wizard engine.
//!
//! Loads the user's session, applies one inbound message, persists the
//! session and returns the responses. Messages for the same user are
//! processed one at a time; different users proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::channels::{IncomingMessage, MessageContent, OutgoingResponse, ResponseChoice};
use crate::config::SchemaOverrides;
use crate::error::Error;

use super::assemble::ContextAssembler;
use super::command::{Command, CommandParser, MenuAction};
use super::engine::{Action, WizardEngine};
use super::numerals::RussianSpeller;
use super::prompts;
use super::render::{Renderer, TemplateId, file_stem};
use super::schema::FormSchema;
use super::session::{SessionState, Step};
use super::skip::SkipPolicy;
use super::store::SessionStore;

pub struct FormService {
    engine: WizardEngine,
    assembler: ContextAssembler,
    renderer: Arc<dyn Renderer>,
    store: Arc<dyn SessionStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FormService {
    pub fn new(
        engine: WizardEngine,
        assembler: ContextAssembler,
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            engine,
            assembler,
            renderer,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The lease form with deployment overrides applied.
    pub fn lease(
        overrides: SchemaOverrides,
        renderer: Arc<dyn Renderer>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let schema = Arc::new(FormSchema::lease());
        let policy = Arc::new(SkipPolicy::lease().with_rules(overrides.skip_rules));
        let engine = WizardEngine::new(Arc::clone(&schema), policy);
        let assembler =
            ContextAssembler::new(schema, Arc::new(RussianSpeller)).with_renames(overrides.renames);
        Self::new(engine, assembler, renderer, store)
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    /// Apply one inbound message to its user's session.
    pub async fn handle(&self, msg: &IncomingMessage) -> Result<Vec<OutgoingResponse>, Error> {
        let user_id = msg.user_id.as_str();
        let lock = self.user_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply(user_id, &msg.content).await
        };
        self.release_lock(user_id, lock).await;
        result
    }

    async fn apply(
        &self,
        user_id: &str,
        content: &MessageContent,
    ) -> Result<Vec<OutgoingResponse>, Error> {
        let mut session = self.store.get(user_id).await?.unwrap_or_default();
        let mut replies = self.dispatch(user_id, &mut session, content).await;
        for reply in &mut replies {
            reply.generation = session.generation;
        }
        self.store.put(user_id, session).await?;
        Ok(replies)
    }

    /// Drop a user's session entirely.
    pub async fn forget(&self, user_id: &str) -> Result<(), Error> {
        let lock = self.user_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.store.delete(user_id).await
        };
        self.release_lock(user_id, lock).await;
        result.map_err(Error::from)
    }

    /// Remove the user's lock entry unless another task still holds a handle.
    ///
    /// Handles are only cloned under the map mutex, so the count is stable here.
    async fn release_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // one reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
    }

    async fn dispatch(
        &self,
        user_id: &str,
        session: &mut SessionState,
        content: &MessageContent,
    ) -> Vec<OutgoingResponse> {
        let command = match content {
            MessageContent::Text { text } => CommandParser::parse_text(text),
            MessageContent::Choice { tag, generation } => {
                if generation.is_some_and(|g| g != session.generation) {
                    warn!(
                        user_id,
                        %tag,
                        stale = ?generation,
                        generation = session.generation,
                        "Ignoring choice from an earlier session"
                    );
                    return Vec::new();
                }
                CommandParser::parse_choice(tag)
            }
        };

        match command {
            Command::Start if session.is_active() => {
                vec![
                    OutgoingResponse::text(prompts::UNFINISHED_SESSION)
                        .with_choices(prompts::restart_buttons()),
                ]
            }
            Command::Start => menu(),
            Command::Menu(MenuAction::Instruction) => {
                vec![
                    OutgoingResponse::text(prompts::INSTRUCTION)
                        .with_choices(prompts::menu_buttons()),
                ]
            }
            Command::Menu(MenuAction::StartLease) => {
                self.begin(user_id, session, prompts::STARTED).await
            }
            Command::Menu(MenuAction::ConfirmRestart) => {
                self.begin(user_id, session, prompts::RESTARTED).await
            }
            Command::Menu(MenuAction::Continue) => self.resume(user_id, session).await,
            Command::Menu(MenuAction::CommissionTenant) => {
                self.follow_up(user_id, session, TemplateId::CommissionTenant)
                    .await
            }
            Command::Menu(MenuAction::CommissionLandlord) => {
                self.follow_up(user_id, session, TemplateId::CommissionLandlord)
                    .await
            }
            Command::Menu(MenuAction::SkipFollowUps) => {
                if session.step() != Some(Step::Done) {
                    debug!(user_id, "Follow-up skip outside completion ignored");
                    return Vec::new();
                }
                session.reset();
                info!(user_id, generation = session.generation, "Session closed");
                let mut out = vec![OutgoingResponse::text(prompts::FOLLOW_UPS_SKIPPED)];
                out.extend(menu());
                out
            }
            _ if !session.is_active() => menu(),
            Command::Back => {
                let actions = self.engine.go_back(session);
                self.replies(user_id, session, actions).await
            }
            Command::Download => self.deliver_lease(user_id, session).await,
            Command::Input(event) => {
                let actions = self.engine.advance(session, event);
                self.replies(user_id, session, actions).await
            }
        }
    }

    async fn begin(
        &self,
        user_id: &str,
        session: &mut SessionState,
        greeting: &str,
    ) -> Vec<OutgoingResponse> {
        let actions = self.engine.start(session);
        info!(user_id, generation = session.generation, "Session started");
        let mut out = vec![OutgoingResponse::text(greeting)];
        out.extend(self.replies(user_id, session, actions).await);
        out
    }

    async fn resume(&self, user_id: &str, session: &mut SessionState) -> Vec<OutgoingResponse> {
        match session.step() {
            None => menu(),
            Some(Step::Done) => vec![follow_up_offer()],
            Some(Step::At(_)) => {
                // the previous widget may be gone; show it again
                session.pending_choice_shown = false;
                let actions = self.engine.prompt(session);
                let mut out = vec![OutgoingResponse::text(prompts::CONTINUED)];
                out.extend(self.replies(user_id, session, actions).await);
                out
            }
        }
    }

    /// Translate engine actions into responses, rendering on completion.
    async fn replies(
        &self,
        user_id: &str,
        session: &mut SessionState,
        actions: Vec<Action>,
    ) -> Vec<OutgoingResponse> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                Action::Prompt(prompt) => {
                    debug!(user_id, field = %prompt.key, "Prompting");
                    let choices = prompt.choices.iter().map(ResponseChoice::from).collect();
                    out.push(OutgoingResponse::text(prompt.text).with_choices(choices));
                }
                Action::Reject { key, reason } => {
                    debug!(user_id, field = %key, "Answer rejected");
                    out.push(OutgoingResponse::text(reason));
                }
                Action::Advance { key } => {
                    debug!(user_id, field = %key, "Field skipped");
                }
                Action::Notice(text) => out.push(OutgoingResponse::text(text)),
                Action::Complete(answers) => {
                    info!(user_id, answers = answers.len(), "Form completed");
                    out.push(OutgoingResponse::text(prompts::ALL_COLLECTED));
                    out.extend(self.deliver_lease(user_id, session).await);
                }
            }
        }
        out
    }

    /// Render the lease from the current answers and offer follow-ups.
    ///
    /// On failure the session is left as it was so the user can retry.
    async fn deliver_lease(
        &self,
        user_id: &str,
        session: &mut SessionState,
    ) -> Vec<OutgoingResponse> {
        let context = self.assembler.assemble(&session.answers);
        let stem = file_stem(TemplateId::Lease, &session.answers);
        match self.renderer.render(&context, TemplateId::Lease, &stem).await {
            Ok(path) => {
                info!(user_id, path = %path.display(), "Lease delivered");
                let len = self.engine.schema().len();
                session.move_to(len, len);
                session.completion_signaled = true;
                vec![
                    OutgoingResponse::text(prompts::LEASE_READY).with_attachment(path),
                    follow_up_offer(),
                ]
            }
            Err(e) => {
                warn!(user_id, error = %e, "Lease rendering failed");
                vec![OutgoingResponse::text(prompts::render_failed(&e.to_string()))]
            }
        }
    }

    async fn follow_up(
        &self,
        user_id: &str,
        session: &mut SessionState,
        template: TemplateId,
    ) -> Vec<OutgoingResponse> {
        if session.step() != Some(Step::Done) {
            debug!(user_id, ?template, "Follow-up outside completion ignored");
            return Vec::new();
        }

        let context = self.assembler.assemble(&session.answers);
        let stem = file_stem(template, &session.answers);
        match self.renderer.render(&context, template, &stem).await {
            Ok(path) => {
                info!(user_id, ?template, path = %path.display(), "Follow-up delivered");
                let sent = match template {
                    TemplateId::CommissionLandlord => prompts::SENT_LANDLORD_COMMISSION,
                    _ => prompts::SENT_TENANT_COMMISSION,
                };
                session.reset();
                let mut out = vec![OutgoingResponse::text(sent).with_attachment(path)];
                out.extend(menu());
                out
            }
            Err(e) => {
                warn!(user_id, ?template, error = %e, "Follow-up rendering failed");
                vec![OutgoingResponse::text(prompts::render_failed(&e.to_string()))]
            }
        }
    }
}

fn menu() -> Vec<OutgoingResponse> {
    vec![OutgoingResponse::text(prompts::MENU).with_choices(prompts::menu_buttons())]
}

fn follow_up_offer() -> OutgoingResponse {
    OutgoingResponse::text(prompts::FOLLOW_UP_QUESTION).with_choices(prompts::follow_up_buttons())
}
