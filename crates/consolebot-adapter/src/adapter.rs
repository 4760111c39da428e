//! The console adapter.
//!
//! [`ConsoleAdapter`] owns the bot identity table, the API dispatch table and
//! the front-end's background task.
//!
//! # Lifecycle
//!
//! ```text
//! start(frontend)                        shutdown()
//!   1. add_client(frontend)                1. frontend.exit()
//!   2. spawn frontend.run(backend)         2. join task (bounded, then abort)
//!   3. connect(config.bot)                 3. disconnect_all()
//! ```
//!
//! Step 3 of shutdown runs whatever happened to the front-end task.
//!
//! # Connection Policy
//!
//! Bot IDs are unique. Connecting an ID that is already connected fails with
//! [`AdapterError::BotAlreadyConnected`] and leaves the first identity in
//! place; disconnecting an unknown ID does nothing.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use consolebot_core::{
    AdapterError, AdapterResult, Addressing, ApiError, ApiResult, ConsoleEvent, InboundEvent,
    LogSink, Message, Robot,
};

use crate::api::{ApiRequest, ApiResponse, MessageInfo};
use crate::backend::{Backend, ConsoleBackend};
use crate::bot::ConsoleBot;
use crate::config::ConsoleConfig;
use crate::dispatch::BoxedDispatcher;
use crate::frontend::{BoxedFrontend, ChatRecord, FrontendResult};

type EventSender = mpsc::UnboundedSender<(ConsoleBot, ConsoleEvent)>;

pub(crate) struct AdapterInner {
    config: ConsoleConfig,
    /// Connected bots by ID.
    bots: RwLock<HashMap<String, ConsoleBot>>,
    dispatcher: BoxedDispatcher,
    frontend: RwLock<Option<BoxedFrontend>>,
    /// The front-end's run loop.
    task: Mutex<Option<JoinHandle<FrontendResult<()>>>>,
    /// Feeds the event pump; created on first use.
    pump: Mutex<Option<EventSender>>,
    /// Cancelled when the front-end task ends.
    closed: CancellationToken,
    log_sink: LogSink,
}

/// The console adapter. Cheap to clone.
#[derive(Clone)]
pub struct ConsoleAdapter {
    inner: Arc<AdapterInner>,
}

impl ConsoleAdapter {
    /// Creates an adapter that redirects the process-wide log sink.
    pub fn new(config: ConsoleConfig, dispatcher: BoxedDispatcher) -> Self {
        Self::with_log_sink(config, dispatcher, LogSink::global().clone())
    }

    pub fn with_log_sink(
        config: ConsoleConfig,
        dispatcher: BoxedDispatcher,
        log_sink: LogSink,
    ) -> Self {
        Self {
            inner: Arc::new(AdapterInner {
                config,
                bots: RwLock::new(HashMap::new()),
                dispatcher,
                frontend: RwLock::new(None),
                task: Mutex::new(None),
                pump: Mutex::new(None),
                closed: CancellationToken::new(),
                log_sink,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<AdapterInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn dispatcher(&self) -> &BoxedDispatcher {
        &self.inner.dispatcher
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn log_sink(&self) -> &LogSink {
        &self.inner.log_sink
    }

    // =========================================================================
    // Connection table
    // =========================================================================

    /// Registers a bot identity.
    pub fn connect(&self, robot: Robot) -> AdapterResult<ConsoleBot> {
        let mut bots = self.inner.bots.write();
        check_vacant(&bots, &robot)?;
        Ok(self.insert_bot(&mut bots, robot))
    }

    fn insert_bot(&self, bots: &mut HashMap<String, ConsoleBot>, robot: Robot) -> ConsoleBot {
        let addressing = Addressing::new(&robot)
            .nicknames(&self.inner.config.nicknames)
            .force_to_me(self.inner.config.force_to_me);
        let bot_id = robot.id.clone();
        let bot = ConsoleBot::new(robot, addressing, Arc::downgrade(&self.inner));
        bots.insert(bot_id.clone(), bot.clone());
        info!(bot_id = %bot_id, "Bot connected");
        bot
    }

    /// Removes a bot identity. Unknown IDs are ignored.
    pub fn disconnect(&self, bot_id: &str) -> Option<ConsoleBot> {
        let bot = self.inner.bots.write().remove(bot_id);
        if bot.is_some() {
            info!(bot_id = %bot_id, "Bot disconnected");
        }
        bot
    }

    /// Removes every bot identity and returns how many were connected.
    pub fn disconnect_all(&self) -> usize {
        let bots: Vec<_> = self.inner.bots.write().drain().collect();
        for (bot_id, _) in &bots {
            info!(bot_id = %bot_id, "Bot disconnected");
        }
        bots.len()
    }

    pub fn bot(&self, bot_id: &str) -> Option<ConsoleBot> {
        self.inner.bots.read().get(bot_id).cloned()
    }

    pub fn bot_ids(&self) -> Vec<String> {
        self.inner.bots.read().keys().cloned().collect()
    }

    pub fn bot_count(&self) -> usize {
        self.inner.bots.read().len()
    }

    // =========================================================================
    // Front-end binding
    // =========================================================================

    /// Binds a front-end as the target of outbound API calls.
    pub fn add_client(&self, frontend: BoxedFrontend) {
        frontend.storage().set_robot(self.inner.config.bot.to_robot());
        *self.inner.frontend.write() = Some(frontend);
        debug!("Frontend bound");
    }

    /// The bound front-end, if any.
    pub fn client(&self) -> Option<BoxedFrontend> {
        self.inner.frontend.read().clone()
    }

    // =========================================================================
    // Inbound events
    // =========================================================================

    /// Classifies an event and queues it for its bot.
    ///
    /// Returns `false` if no bot with the event's `self_id` is connected; the
    /// event is then dropped.
    pub fn post_event(&self, event: InboundEvent) -> bool {
        let Some(bot) = self.bot(event.self_id()) else {
            warn!(bot_id = %event.self_id(), "Event for unknown bot, dropped");
            return false;
        };

        let event = bot.addressing().classify(event);
        match event.get_message() {
            Some(message) => {
                info!(bot_id = %bot.id(), event = %event.event_name(), text = %message, "Received message event")
            }
            None => info!(bot_id = %bot.id(), event = %event.event_name(), "Received event"),
        }

        let mut pump = self.inner.pump.lock();
        if pump.is_none() {
            let Ok(handle) = Handle::try_current() else {
                warn!(bot_id = %bot.id(), "No async runtime to run the event pump, event dropped");
                return false;
            };
            *pump = Some(spawn_pump(&handle));
        }
        let Some(sender) = pump.as_ref() else {
            return false;
        };
        if let Err(mpsc::error::SendError((bot, _))) = sender.send((bot, event)) {
            warn!(bot_id = %bot.id(), "Event pump closed, event dropped");
            *pump = None;
            return false;
        }
        true
    }

    // =========================================================================
    // Outbound API
    // =========================================================================

    /// Executes an API call on behalf of `bot`.
    pub async fn call_api(&self, bot: &ConsoleBot, api: &str, params: Value) -> ApiResult<Value> {
        let request = ApiRequest::parse(api, params)?;
        self.request(bot, request).await?.into_value()
    }

    /// Executes an already parsed request on behalf of `bot`.
    pub async fn request(&self, bot: &ConsoleBot, request: ApiRequest) -> ApiResult<ApiResponse> {
        let api = request.name();
        debug!(bot_id = %bot.id(), api, "Calling API");

        let frontend = self.client().ok_or(ApiError::NotConnected)?;
        let response = execute(bot, &frontend, request).await;
        if let Err(e) = &response {
            warn!(bot_id = %bot.id(), api, error = %e, "API call failed");
        }
        response
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Binds the front-end, starts its run loop and connects the configured
    /// bot.
    ///
    /// The adapter can be started once. Must be called from within a Tokio
    /// runtime. If the configured bot ID is already taken nothing is spawned
    /// and the adapter can still be started later.
    pub fn start(&self, frontend: BoxedFrontend) -> AdapterResult<ConsoleBot> {
        let mut task = self.inner.task.lock();
        if task.is_some() || self.inner.closed.is_cancelled() {
            return Err(AdapterError::AlreadyStarted);
        }
        let handle = Handle::try_current().map_err(|_| AdapterError::NoRuntime)?;

        // held until the bot is in the table, so the front-end never runs
        // without it
        let mut bots = self.inner.bots.write();
        let robot = self.inner.config.bot.to_robot();
        check_vacant(&bots, &robot)?;

        self.add_client(frontend.clone());
        let backend: Arc<dyn Backend> = Arc::new(ConsoleBackend::new(
            self.clone(),
            frontend.clone(),
            self.inner.log_sink.clone(),
        ));
        let guard = self.inner.closed.clone().drop_guard();
        *task = Some(handle.spawn(async move {
            let _guard = guard;
            frontend.run(backend).await
        }));
        debug!("Frontend task started");

        let bot = self.insert_bot(&mut bots, robot);
        info!(bot_id = %bot.id(), "Console adapter started");
        Ok(bot)
    }

    /// Stops the front-end and disconnects every bot.
    pub async fn shutdown(&self) {
        if let Some(frontend) = self.client() {
            frontend.exit();
        }

        let task = self.inner.task.lock().take();
        if let Some(mut task) = task {
            let timeout = self.inner.config.shutdown_timeout();
            match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(Ok(()))) => debug!("Frontend task finished"),
                Ok(Ok(Err(e))) => error!(error = %e, "Frontend exited with error"),
                Ok(Err(e)) => error!(error = %e, "Frontend task failed"),
                Err(_) => {
                    warn!(timeout_ms = timeout.as_millis() as u64, "Frontend did not exit in time, aborting");
                    task.abort();
                    // dropping the run future releases the sink redirect
                    let _ = task.await;
                }
            }
        }

        self.inner.pump.lock().take();
        let count = self.disconnect_all();
        info!(bots = count, "Console adapter shut down");
    }

    /// Resolves once the front-end task has ended.
    pub async fn closed(&self) {
        self.inner.closed.cancelled().await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }
}

fn check_vacant(bots: &HashMap<String, ConsoleBot>, robot: &Robot) -> AdapterResult<()> {
    if bots.contains_key(&robot.id) {
        warn!(bot_id = %robot.id, "Bot already connected, not registering");
        return Err(AdapterError::BotAlreadyConnected {
            id: robot.id.clone(),
        });
    }
    Ok(())
}

/// Spawns the task that hands events to bots in arrival order.
///
/// A panicking handler is logged and the pump moves on to the next event.
fn spawn_pump(handle: &Handle) -> EventSender {
    let (tx, mut rx) = mpsc::unbounded_channel::<(ConsoleBot, ConsoleEvent)>();
    handle.spawn(async move {
        while let Some((bot, event)) = rx.recv().await {
            let name = event.event_name().to_string();
            if AssertUnwindSafe(bot.handle_event(event))
                .catch_unwind()
                .await
                .is_err()
            {
                error!(bot_id = %bot.id(), event = %name, "Event handler panicked");
            }
        }
        debug!("Event pump stopped");
    });
    tx
}

async fn execute(
    bot: &ConsoleBot,
    frontend: &BoxedFrontend,
    request: ApiRequest,
) -> ApiResult<ApiResponse> {
    Ok(match request {
        ApiRequest::SendMsg(params) => {
            let record = frontend
                .send_message(bot.as_user(), params.channel, params.message.to_console_message())
                .await?;
            ApiResponse::MessageId {
                message_id: record.id,
            }
        }
        ApiRequest::Bell => {
            frontend.bell().await?;
            ApiResponse::None
        }
        ApiRequest::GetUser(params) => ApiResponse::User(frontend.get_user(&params.user_id).await?),
        ApiRequest::GetChannel(params) => {
            ApiResponse::Channel(frontend.get_channel(&params.channel_id).await?)
        }
        ApiRequest::ListUsers => ApiResponse::Users(frontend.list_users().await?),
        ApiRequest::ListChannels => ApiResponse::Channels(frontend.list_channels().await?),
        ApiRequest::CreateDm(params) => {
            ApiResponse::Channel(frontend.create_dm(&params.user_id).await?)
        }
        ApiRequest::GetMsg(params) => {
            ApiResponse::Message(message_info(frontend.get_msg(&params.message_id).await?)?)
        }
        ApiRequest::RecallMsg(params) => {
            frontend.recall_msg(&params.message_id).await?;
            ApiResponse::None
        }
        ApiRequest::EditMsg(params) => {
            let record = frontend
                .edit_msg(&params.message_id, params.message.to_console_message())
                .await?;
            ApiResponse::Message(message_info(record)?)
        }
    })
}

fn message_info(record: ChatRecord) -> ApiResult<MessageInfo> {
    Ok(MessageInfo {
        message: Message::from_console_message(&record.content)?,
        message_id: record.id,
        time: record.time,
        user: record.sender,
        channel: record.channel,
        edited: record.edited,
    })
}

#[cfg(test)]
mod tests {
    use consolebot_core::{Channel, Event, MessageEvent, User};
    use serde_json::json;

    use super::*;
    use crate::dispatch::dispatcher_fn;

    fn adapter() -> ConsoleAdapter {
        ConsoleAdapter::with_log_sink(
            ConsoleConfig::default(),
            dispatcher_fn(|_, _| async {}),
            LogSink::with_target(Box::new(std::io::sink())),
        )
    }

    #[test]
    fn test_connect_rejects_duplicate() {
        let adapter = adapter();
        let first = adapter.connect(Robot::new("robot", "Bot")).unwrap();

        let err = adapter.connect(Robot::new("robot", "Other")).unwrap_err();
        assert!(matches!(err, AdapterError::BotAlreadyConnected { ref id } if id == "robot"));
        assert_eq!(adapter.bot_count(), 1);
        assert_eq!(adapter.bot("robot").unwrap().robot().nickname, "Bot");
        assert!(first.is_connected());

        // one disconnect empties the table
        assert!(adapter.disconnect("robot").is_some());
        assert_eq!(adapter.bot_count(), 0);
        assert!(!first.is_connected());
    }

    #[test]
    fn test_disconnect_unknown_is_noop() {
        let adapter = adapter();
        assert!(adapter.disconnect("ghost").is_none());
        adapter.connect(Robot::new("a", "A")).unwrap();
        adapter.connect(Robot::new("b", "B")).unwrap();

        let mut ids = adapter.bot_ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(adapter.disconnect_all(), 2);
        assert_eq!(adapter.disconnect_all(), 0);
    }

    #[tokio::test]
    async fn test_post_event_unknown_bot() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let adapter = ConsoleAdapter::with_log_sink(
            ConsoleConfig::default(),
            dispatcher_fn(move |_, event| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(event);
                }
            }),
            LogSink::with_target(Box::new(std::io::sink())),
        );

        let event = MessageEvent::new("robot", User::new("user", "User"), Channel::direct(), "hi".into());
        assert!(!adapter.post_event(event.into()));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_post_event_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let adapter = ConsoleAdapter::with_log_sink(
            ConsoleConfig::default(),
            dispatcher_fn(move |bot: ConsoleBot, event: ConsoleEvent| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send((bot.id().to_string(), event.get_plain_text()));
                }
            }),
            LogSink::with_target(Box::new(std::io::sink())),
        );
        adapter.connect(Robot::new("robot", "Bot")).unwrap();

        let user = User::new("user", "User");
        for text in ["one", "two", "three"] {
            let event = MessageEvent::new("robot", user.clone(), Channel::direct(), text.into());
            assert!(adapter.post_event(event.into()));
        }
        let notice = Event::new("robot", "enter_channel", user, Channel::direct());
        assert!(adapter.post_event(notice.into()));

        let mut received = Vec::new();
        for _ in 0..4 {
            received.push(rx.recv().await.unwrap());
        }
        let texts: Vec<_> = received.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three", ""]);
        assert!(received.iter().all(|(id, _)| id == "robot"));
    }

    #[tokio::test]
    async fn test_pump_survives_panicking_handler() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let adapter = ConsoleAdapter::with_log_sink(
            ConsoleConfig::default(),
            dispatcher_fn(move |_: ConsoleBot, event: ConsoleEvent| {
                let tx = tx.clone();
                async move {
                    if event.get_plain_text() == "boom" {
                        panic!("handler failure");
                    }
                    let _ = tx.send(event.get_plain_text());
                }
            }),
            LogSink::with_target(Box::new(std::io::sink())),
        );
        adapter.connect(Robot::new("robot", "Bot")).unwrap();

        let user = User::new("user", "User");
        for text in ["boom", "after"] {
            let event = MessageEvent::new("robot", user.clone(), Channel::direct(), text.into());
            adapter.post_event(event.into());
        }
        assert_eq!(rx.recv().await.unwrap(), "after");
    }

    #[test]
    fn test_post_event_outside_runtime_drops() {
        let adapter = adapter();
        adapter.connect(Robot::new("robot", "Bot")).unwrap();

        let event = MessageEvent::new("robot", User::new("user", "User"), Channel::direct(), "hi".into());
        assert!(!adapter.post_event(event.into()));
        assert!(adapter.inner.pump.lock().is_none());
    }

    #[test]
    fn test_start_outside_runtime() {
        let adapter = adapter();
        let frontend: BoxedFrontend = Arc::new(crate::frontend::StdioFrontend::with_io(
            crate::config::FrontendConfig::default(),
            tokio::io::empty(),
            tokio::io::sink(),
        ));
        let err = adapter.start(frontend).unwrap_err();
        assert!(matches!(err, AdapterError::NoRuntime));
        assert_eq!(adapter.bot_count(), 0);
        assert!(!adapter.is_closed());
    }

    #[tokio::test]
    async fn test_call_api_without_frontend() {
        let adapter = adapter();
        let bot = adapter.connect(Robot::new("robot", "Bot")).unwrap();

        let err = adapter.call_api(&bot, "bell", Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::NotConnected));

        let err = bot.call_api("nonexistent", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAvailable { ref api, .. } if api == "nonexistent"));
        assert_eq!(
            err.to_string(),
            "API 'nonexistent' is not available in adapter 'Console'"
        );
    }

    #[tokio::test]
    async fn test_bot_outlives_adapter() {
        let bot = {
            let adapter = adapter();
            adapter.connect(Robot::new("robot", "Bot")).unwrap()
        };
        let err = bot.bell().await.unwrap_err();
        assert!(matches!(err, ApiError::NotConnected));
        assert!(!bot.is_connected());
    }
}
