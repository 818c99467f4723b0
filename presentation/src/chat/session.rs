//! Chat session state shared by the REPL and single-shot mode

use crate::output::EventSink;
use crate::progress::WaitingSpinner;
use ledger_application::{
    ApprovalOutcome, AssistantEngine, AssistantError, AssistantReply, LlmProvider, ToolExecutorPort,
};
use ledger_domain::{ChatEvent, Conversation, ConversationId, PendingAction, UserId};
use std::io;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("No conversation yet. Send a message first.")]
    NoConversation,

    #[error("No pending action matches '{0}'")]
    NoSuchAction(String),

    #[error("'{0}' matches more than one pending action")]
    AmbiguousSelector(String),

    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// Find a pending action by 1-based list position or id prefix.
pub fn select_action<'a>(
    actions: &'a [PendingAction],
    selector: &str,
) -> Result<&'a PendingAction, SessionError> {
    if let Ok(n) = selector.parse::<usize>()
        && n >= 1
        && n <= actions.len()
    {
        return Ok(&actions[n - 1]);
    }
    let mut matches = actions.iter().filter(|a| a.id.as_str().starts_with(selector));
    match (matches.next(), matches.next()) {
        (Some(action), None) => Ok(action),
        (Some(_), Some(_)) => Err(SessionError::AmbiguousSelector(selector.to_string())),
        (None, _) => Err(SessionError::NoSuchAction(selector.to_string())),
    }
}

/// One user's view of the engine: who is talking and in which conversation.
pub struct ChatSession<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> {
    engine: AssistantEngine<P, T>,
    user_id: UserId,
    current: Option<ConversationId>,
}

impl<P: LlmProvider + 'static, T: ToolExecutorPort + 'static> ChatSession<P, T> {
    pub fn new(engine: AssistantEngine<P, T>, user_id: UserId) -> Self {
        Self {
            engine,
            user_id,
            current: None,
        }
    }

    pub fn engine(&self) -> &AssistantEngine<P, T> {
        &self.engine
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn current(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    /// The next message opens a fresh conversation.
    pub fn new_conversation(&mut self) {
        self.current = None;
    }

    /// Run a turn-based exchange.
    pub async fn send(&mut self, text: &str) -> Result<AssistantReply, SessionError> {
        let reply = self
            .engine
            .process_message(&self.user_id, self.current.as_ref(), text)
            .await?;
        self.current = Some(reply.conversation_id.clone());
        Ok(reply)
    }

    /// Run a streamed turn, forwarding every event to `sink`.
    ///
    /// The spinner is cleared on the first event. Returns the number of
    /// actions deferred during the turn.
    pub async fn stream(
        &mut self,
        text: &str,
        sink: &mut dyn EventSink,
        spinner: &mut WaitingSpinner,
    ) -> Result<usize, SessionError> {
        let mut stream = self
            .engine
            .stream_message(&self.user_id, self.current.as_ref(), text)
            .await?;
        self.current = Some(stream.conversation_id().clone());

        let mut deferred = 0;
        while let Some(event) = stream.recv().await {
            spinner.stop();
            if let ChatEvent::ToolResult {
                pending_action: Some(_),
                ..
            } = &event
            {
                deferred += 1;
            }
            sink.emit(&event)?;
        }
        spinner.stop();
        debug!(conversation_id = ?self.current, deferred, "Streamed turn finished");
        Ok(deferred)
    }

    fn require_current(&self) -> Result<&ConversationId, SessionError> {
        self.current.as_ref().ok_or(SessionError::NoConversation)
    }

    /// Live actions of the current conversation, oldest first.
    pub async fn pending(&self) -> Result<Vec<PendingAction>, SessionError> {
        match &self.current {
            Some(id) => Ok(self.engine.pending_actions().list_pending_actions(id).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn approve(
        &self,
        selector: &str,
    ) -> Result<(PendingAction, ApprovalOutcome), SessionError> {
        let conversation_id = self.require_current()?;
        let actions = self.pending().await?;
        let action = select_action(&actions, selector)?.clone();
        let outcome = self
            .engine
            .execute_approved_action(&self.user_id, conversation_id, &action.id)
            .await?;
        Ok((action, outcome))
    }

    pub async fn reject(&self, selector: &str) -> Result<PendingAction, SessionError> {
        let conversation_id = self.require_current()?;
        let actions = self.pending().await?;
        let action = select_action(&actions, selector)?.clone();
        self.engine.reject_action(&action.id, conversation_id).await?;
        Ok(action)
    }

    pub async fn rename(&self, title: &str) -> Result<Conversation, SessionError> {
        let conversation_id = self.require_current()?;
        Ok(self
            .engine
            .conversation_log()
            .rename_conversation(conversation_id, &self.user_id, title)
            .await?)
    }

    /// Archive the current conversation; the next message starts a new one.
    pub async fn archive(&mut self) -> Result<(), SessionError> {
        let conversation_id = self.require_current()?;
        self.engine
            .conversation_log()
            .archive_conversation(conversation_id, &self.user_id)
            .await?;
        self.current = None;
        Ok(())
    }

    /// Delete the current conversation; the next message starts a new one.
    pub async fn delete(&mut self) -> Result<(), SessionError> {
        let conversation_id = self.require_current()?;
        self.engine
            .conversation_log()
            .delete_conversation(conversation_id, &self.user_id)
            .await?;
        self.current = None;
        Ok(())
    }

    pub async fn conversations(&self) -> Result<Vec<Conversation>, SessionError> {
        Ok(self
            .engine
            .conversation_log()
            .list_conversations(&self.user_id)
            .await?)
    }
}
