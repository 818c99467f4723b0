//! Test doubles for the engine: scripted provider, counting tools and
//! in-memory stores.

use super::AssistantEngine;
use crate::config::EngineParams;
use crate::ports::clock::{Clock, ManualClock};
use crate::ports::conversation_store::ConversationRepository;
use crate::ports::entity_resolver::EntityResolver;
use crate::ports::llm_provider::{LlmProvider, ProviderError, ProviderStream};
use crate::ports::pending_action_store::PendingActionRepository;
use crate::ports::settings::SettingsSource;
use crate::ports::store_error::StoreError;
use crate::ports::tool_executor::{ToolContext, ToolExecutorPort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledger_domain::{
    ActionId, ActionStatus, ChatMessage, Conversation, ConversationId, Message, PendingAction,
    ProviderConfig, ProviderEvent, ToolArguments, ToolCall, ToolCatalog, ToolDefinition,
    ToolError, ToolParameter, UserId,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn user() -> UserId {
    UserId::new("user-1")
}

// ==================== Provider ====================

pub enum Script {
    Events(Vec<ProviderEvent>),
    Fail(ProviderError),
}

pub fn reply(message: ChatMessage) -> Script {
    let mut events = Vec::new();
    if !message.content.is_empty() {
        events.push(ProviderEvent::TextDelta(message.content));
    }
    events.extend(message.tool_calls.into_iter().map(ProviderEvent::ToolCall));
    events.push(ProviderEvent::done());
    Script::Events(events)
}

pub fn events(events: Vec<ProviderEvent>) -> Script {
    Script::Events(events)
}

pub fn fail(error: ProviderError) -> Script {
    Script::Fail(error)
}

/// Replays scripted turns in order; records every request.
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    always_tool: Option<String>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    counter: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            always_tool: None,
            requests: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    /// A provider that requests `tool` on every turn, forever.
    pub fn always_tool(tool: &str) -> Self {
        Self {
            always_tool: Some(tool.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> Vec<ChatMessage> {
        self.requests.lock().unwrap()[index].clone()
    }

    fn next(&self, messages: &[ChatMessage]) -> Script {
        self.requests.lock().unwrap().push(messages.to_vec());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        if let Some(tool) = &self.always_tool {
            return reply(ChatMessage::assistant_with_tools(
                "",
                vec![ToolCall::new(format!("toolu_{}", n), tool)],
            ));
        }
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Script::Fail(ProviderError::RequestFailed("script exhausted".into()))
            })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _tools: &ToolCatalog,
        _config: &ProviderConfig,
    ) -> Result<ChatMessage, ProviderError> {
        match self.next(messages) {
            Script::Events(events) => ProviderStream::from_events(events).collect_message().await,
            Script::Fail(error) => Err(error),
        }
    }

    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        _tools: &ToolCatalog,
        _config: &ProviderConfig,
    ) -> Result<ProviderStream, ProviderError> {
        match self.next(messages) {
            Script::Events(events) => Ok(ProviderStream::from_events(events)),
            Script::Fail(error) => Err(error),
        }
    }

    async fn validate_config(&self, config: &ProviderConfig) -> bool {
        config.api_key == "sk-valid"
    }
}

// ==================== Tools ====================

/// Business tools that count their invocations.
pub struct CountingTools {
    catalog: ToolCatalog,
    counts: Mutex<HashMap<String, usize>>,
    invoices_fail: AtomicBool,
    invoice_delay_ms: AtomicU64,
}

impl CountingTools {
    pub fn new() -> Self {
        let mut catalog = ToolCatalog::new();
        catalog.insert(ToolDefinition::new("listTasks", "List tasks"));
        catalog.insert(
            ToolDefinition::new("getTask", "Get one task")
                .with_parameter(ToolParameter::new("taskId", "Task id", true)),
        );
        catalog.insert(
            ToolDefinition::new("createInvoice", "Create an invoice")
                .with_parameter(ToolParameter::new("taskId", "Task id", true))
                .confirmed(),
        );
        catalog.insert(ToolDefinition::new("explode", "Always fails"));
        Self {
            catalog,
            counts: Mutex::new(HashMap::new()),
            invoices_fail: AtomicBool::new(false),
            invoice_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn fail_invoices(&self) {
        self.invoices_fail.store(true, Ordering::SeqCst);
    }

    /// Make `createInvoice` take `delay` before answering.
    pub fn slow_invoices(&self, delay: Duration) {
        self.invoice_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl ToolExecutorPort for CountingTools {
    fn definitions(&self) -> &ToolCatalog {
        &self.catalog
    }

    async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
        _context: &ToolContext,
    ) -> Result<Value, ToolError> {
        if !self.catalog.contains(name) {
            return Err(ToolError::tool_not_found(name));
        }
        *self.counts.lock().unwrap().entry(name.to_string()).or_default() += 1;
        let delay_ms = self.invoice_delay_ms.load(Ordering::SeqCst);
        if name == "createInvoice" && delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        match name {
            "listTasks" => Ok(json!([{"id": "t1", "name": "Website redesign"}])),
            "getTask" => Ok(json!({"id": args.get("taskId"), "name": "Website redesign"})),
            "createInvoice" if self.invoices_fail.load(Ordering::SeqCst) => {
                Err(ToolError::execution_failed("invoice service unavailable"))
            }
            "createInvoice" => Ok(json!({"invoiceId": "inv-1", "taskId": args.get("taskId")})),
            _ => Err(ToolError::execution_failed("kaboom")),
        }
    }
}

pub struct TaskNames;

#[async_trait]
impl EntityResolver for TaskNames {
    async fn task_name(&self, _user_id: &UserId, task_id: &str) -> Option<String> {
        (task_id == "t1").then(|| "Website redesign".to_string())
    }
}

// ==================== Stores ====================

#[derive(Default)]
pub struct MemoryConversations {
    conversations: Mutex<HashMap<ConversationId, Conversation>>,
    messages: Mutex<HashMap<ConversationId, Vec<Message>>>,
}

#[async_trait]
impl ConversationRepository for MemoryConversations {
    async fn create(&self, conversation: Conversation) -> Result<(), StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation);
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.lock().unwrap().get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Conversation>, StoreError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn update(&self, conversation: Conversation) -> Result<(), StoreError> {
        self.create(conversation).await
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, StoreError> {
        self.messages.lock().unwrap().remove(id);
        Ok(self.conversations.lock().unwrap().remove(id).is_some())
    }

    async fn append_message(&self, message: Message) -> Result<Conversation, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| StoreError::NotFound(message.conversation_id.to_string()))?;
        conversation.touch(message.role, &message.content, message.created_at);
        let updated = conversation.clone();
        self.messages
            .lock()
            .unwrap()
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
        Ok(updated)
    }

    async fn messages(&self, id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.lock().unwrap().get(id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryActions {
    actions: Mutex<HashMap<ActionId, PendingAction>>,
}

impl MemoryActions {
    pub fn all(&self) -> Vec<PendingAction> {
        let mut all: Vec<PendingAction> = self.actions.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        all
    }
}

#[async_trait]
impl PendingActionRepository for MemoryActions {
    async fn insert(&self, action: PendingAction) -> Result<(), StoreError> {
        self.actions.lock().unwrap().insert(action.id.clone(), action);
        Ok(())
    }

    async fn get(&self, id: &ActionId) -> Result<Option<PendingAction>, StoreError> {
        Ok(self.actions.lock().unwrap().get(id).cloned())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PendingAction>, StoreError> {
        Ok(self
            .actions
            .lock()
            .unwrap()
            .values()
            .filter(|a| &a.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn resolve_if_pending(
        &self,
        id: &ActionId,
        status: ActionStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut actions = self.actions.lock().unwrap();
        match actions.get_mut(id) {
            Some(action) => Ok(action.resolve(status, resolved_at).is_ok()),
            None => Ok(false),
        }
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut actions = self.actions.lock().unwrap();
        let mut expired = 0;
        for action in actions.values_mut() {
            if action.status == ActionStatus::Pending
                && action.is_expired_at(now)
                && action.resolve(ActionStatus::Expired, now).is_ok()
            {
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<usize, StoreError> {
        let mut actions = self.actions.lock().unwrap();
        let before = actions.len();
        actions.retain(|_, a| &a.conversation_id != conversation_id);
        Ok(before - actions.len())
    }
}

// ==================== Settings ====================

pub struct MutableSettings(Mutex<ProviderConfig>);

impl MutableSettings {
    pub fn set(&self, config: ProviderConfig) {
        *self.0.lock().unwrap() = config;
    }
}

#[async_trait]
impl SettingsSource for MutableSettings {
    async fn provider_config(&self) -> Result<ProviderConfig, ProviderError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

// ==================== Harness ====================

pub struct Harness {
    pub engine: AssistantEngine<ScriptedProvider, CountingTools>,
    pub provider: Arc<ScriptedProvider>,
    pub tools: Arc<CountingTools>,
    pub conversations: Arc<MemoryConversations>,
    pub actions: Arc<MemoryActions>,
    pub settings: Arc<MutableSettings>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(provider: ScriptedProvider) -> Self {
        Self::with_params(provider, EngineParams::default())
    }

    pub fn with_params(provider: ScriptedProvider, params: EngineParams) -> Self {
        let provider = Arc::new(provider);
        let tools = Arc::new(CountingTools::new());
        let conversations = Arc::new(MemoryConversations::default());
        let actions = Arc::new(MemoryActions::default());
        let settings = Arc::new(MutableSettings(Mutex::new(ProviderConfig::new("sk-test"))));
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let engine = AssistantEngine::new(
            provider.clone(),
            tools.clone(),
            conversations.clone(),
            actions.clone(),
            settings.clone(),
        )
        .with_params(params)
        .with_clock(clock.clone())
        .with_entity_resolver(Arc::new(TaskNames));

        Self {
            engine,
            provider,
            tools,
            conversations,
            actions,
            settings,
            clock,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn messages(&self, id: &ConversationId) -> Vec<Message> {
        self.conversations.messages(id).await.unwrap()
    }

    pub async fn conversation(&self, id: &ConversationId) -> Conversation {
        self.conversations.get(id).await.unwrap().unwrap()
    }
}
