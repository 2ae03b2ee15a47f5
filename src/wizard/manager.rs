//! WizardManager: coordinates sessions, step persistence and gateway writes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, GatewayError, WizardError};
use crate::gateway::SubmissionGateway;

use super::model::{OnboardingForm, upload_path};
use super::render::{Screen, render};
use super::session::WizardSession;
use super::step::Step;
use super::store::StepStore;

/// A user action on the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    /// "Get Started" on the welcome screen.
    Begin,
    SetName { name: String },
    /// "Next" on the name screen: partial write, then on to the request.
    SubmitName,
    SetRequest { request: String },
    SubmitRequest,
    RemoveFile { url: String },
    /// "Next" on the files screen: final write, then thanks.
    Finish,
}

impl WizardAction {
    fn label(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::SetName { .. } => "set_name",
            Self::SubmitName => "submit_name",
            Self::SetRequest { .. } => "set_request",
            Self::SubmitRequest => "submit_request",
            Self::RemoveFile { .. } => "remove_file",
            Self::Finish => "finish",
        }
    }
}

/// What happened to the gateway call an action triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GatewayOutcome {
    Sent,
    /// The final write was not attempted because the form is incomplete.
    Skipped,
    Failed { reason: String },
}

/// The state of a session as the page sees it.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub session_id: Uuid,
    pub step: Step,
    pub form: OnboardingForm,
    pub screen: Screen,
    /// Outcome of the gateway call made by the request that produced this view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewayOutcome>,
}

type SessionHandle = Arc<Mutex<WizardSession>>;

/// Owns every live wizard session.
pub struct WizardManager {
    steps: StepStore,
    gateway: Arc<dyn SubmissionGateway>,
    upload_prefix: String,
    home_url: String,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl WizardManager {
    pub fn new(
        steps: StepStore,
        gateway: Arc<dyn SubmissionGateway>,
        upload_prefix: impl Into<String>,
        home_url: impl Into<String>,
    ) -> Self {
        Self {
            steps,
            gateway,
            upload_prefix: upload_prefix.into(),
            home_url: home_url.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Begin a brand-new session.
    pub async fn start(&self) -> Result<WizardView, Error> {
        self.load(Uuid::new_v4()).await
    }

    /// Page load: restore the step from the store and start with an empty
    /// form, replacing whatever was held in memory for this session.
    pub async fn load(&self, session_id: Uuid) -> Result<WizardView, Error> {
        let (_handle, view) = self.restore(session_id).await?;
        Ok(view)
    }

    /// Current view of a session. A session that is not in memory is shown
    /// at its stored step without being loaded or persisted.
    pub async fn view(&self, session_id: Uuid) -> Result<WizardView, Error> {
        let handle = self.sessions.read().await.get(&session_id).cloned();
        match handle {
            Some(handle) => {
                let mut session = handle.lock().await;
                session.touch();
                Ok(self.project(&session, None))
            }
            None => {
                let step = self.steps.peek(session_id).await?;
                Ok(self.project(&WizardSession::new(session_id, step), None))
            }
        }
    }

    /// Forget the in-memory session. The persisted step is left alone.
    pub async fn close(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            debug!(session_id = %session_id, "Wizard session closed");
        }
        removed
    }

    /// Apply a user action to a session.
    pub async fn apply(&self, session_id: Uuid, action: WizardAction) -> Result<WizardView, Error> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;
        session.touch();
        let label = action.label();

        let outcome = match action {
            WizardAction::Begin => {
                session.require(Step::Welcome, label)?;
                self.transition(&mut session, Step::Name).await?;
                None
            }
            WizardAction::SetName { name } => {
                session.set_name(name)?;
                None
            }
            WizardAction::SubmitName => {
                session.require(Step::Name, label)?;
                let result = self
                    .gateway
                    .submit_partial(session_id, &session.form().name)
                    .await
                    .map(|()| true);
                let outcome = self.report(session_id, "partial", result);
                self.transition(&mut session, Step::Request).await?;
                Some(outcome)
            }
            WizardAction::SetRequest { request } => {
                session.set_request(request)?;
                None
            }
            WizardAction::SubmitRequest => {
                session.require(Step::Request, label)?;
                self.transition(&mut session, Step::Files).await?;
                None
            }
            WizardAction::RemoveFile { url } => {
                if !session.remove_file(&url)? {
                    debug!(session_id = %session_id, url = %url, "No file entry to remove");
                }
                None
            }
            WizardAction::Finish => {
                session.require(Step::Files, label)?;
                let result = self.gateway.submit_final(session_id, session.form()).await;
                let outcome = self.report(session_id, "final", result);
                self.transition(&mut session, Step::Thanks).await?;
                Some(outcome)
            }
        };

        let view = self.project(&session, outcome);
        let finished = session.step().is_terminal();
        drop(session);
        if finished {
            self.sessions.write().await.remove(&session_id);
            debug!(session_id = %session_id, "Finished wizard session released");
        }
        Ok(view)
    }

    /// Upload a file for the files step and add its URL to the form.
    ///
    /// The session is not held while the upload runs. A failed upload is
    /// logged and leaves the file list as it was.
    pub async fn upload(
        &self,
        session_id: Uuid,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<WizardView, Error> {
        let handle = self.handle(session_id).await?;
        {
            let mut session = handle.lock().await;
            session.require(Step::Files, "upload")?;
            session.touch();
        }

        let path = upload_path(&self.upload_prefix, file_name)?;
        let size = bytes.len();
        let outcome = match self.gateway.upload_file(&path, bytes, content_type).await {
            Ok(url) => {
                let mut session = handle.lock().await;
                match session.add_file(url.clone()) {
                    Ok(()) => {
                        info!(session_id = %session_id, path = %path, size, url = %url, "File uploaded");
                        GatewayOutcome::Sent
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, url = %url, error = %e, "Upload finished after leaving the files step");
                        GatewayOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                error!(session_id = %session_id, gateway = self.gateway.name(), error = %e, "File upload failed");
                GatewayOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let session = handle.lock().await;
        Ok(self.project(&session, Some(outcome)))
    }

    /// Drop in-memory sessions unused for at least `idle`. Sessions busy with
    /// a request are kept. Returns how many were dropped.
    pub async fn prune_stale_sessions(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for() < idle,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(pruned, remaining = sessions.len(), "Pruned idle wizard sessions");
        }
        pruned
    }

    /// Number of sessions held in memory.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn handle(&self, session_id: Uuid) -> Result<SessionHandle, Error> {
        if let Some(handle) = self.sessions.read().await.get(&session_id) {
            return Ok(Arc::clone(handle));
        }
        let (handle, _view) = self.restore(session_id).await?;
        Ok(handle)
    }

    async fn restore(&self, session_id: Uuid) -> Result<(SessionHandle, WizardView), Error> {
        let step = self.steps.resolve(session_id).await?;
        let session = WizardSession::new(session_id, step);
        let view = self.project(&session, None);
        let handle = Arc::new(Mutex::new(session));

        self.sessions
            .write()
            .await
            .insert(session_id, Arc::clone(&handle));
        info!(session_id = %session_id, step = %step, "Wizard session loaded");
        Ok((handle, view))
    }

    /// Persist `next`, then move the session there. Entering the terminal
    /// step removes the persisted slot instead.
    async fn transition(&self, session: &mut WizardSession, next: Step) -> Result<(), Error> {
        let from = session.step();
        if !from.can_transition_to(next) {
            return Err(WizardError::InvalidTransition { from, to: next }.into());
        }

        if next.is_terminal() {
            self.steps.clear(session.id()).await?;
        } else {
            self.steps.save(session.id(), next).await?;
        }
        session.transition(next)?;

        info!(session_id = %session.id(), from = %from, to = %next, "Wizard step changed");
        Ok(())
    }

    /// Log a gateway write result and turn it into an outcome.
    fn report(
        &self,
        session_id: Uuid,
        write: &str,
        result: Result<bool, GatewayError>,
    ) -> GatewayOutcome {
        match result {
            Ok(true) => {
                info!(session_id = %session_id, gateway = self.gateway.name(), write, "Project record submitted");
                GatewayOutcome::Sent
            }
            Ok(false) => {
                debug!(session_id = %session_id, write, "Form incomplete, submission skipped");
                GatewayOutcome::Skipped
            }
            Err(e) => {
                error!(session_id = %session_id, gateway = self.gateway.name(), write, error = %e, "Project submission failed");
                GatewayOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn project(&self, session: &WizardSession, gateway: Option<GatewayOutcome>) -> WizardView {
        WizardView {
            session_id: session.id(),
            step: session.step(),
            form: session.form().clone(),
            screen: render(session.step(), session.form(), &self.home_url),
            gateway,
        }
    }
}
