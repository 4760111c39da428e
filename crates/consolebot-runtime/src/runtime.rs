//! Process-level orchestration around the console adapter.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use consolebot_runtime::ConsoleRuntime;
//! use consolebot_adapter::dispatcher_fn;
//!
//! let runtime = ConsoleRuntime::builder()
//!     .config_file("consolebot.toml")
//!     .dispatcher(dispatcher_fn(|bot, event| async move {
//!         if event.get_plain_text() == "ping" {
//!             let _ = bot.send(&event, "pong").await;
//!         }
//!     }))
//!     .build()?;
//!
//! // Runs until `:exit`, end of input, Ctrl+C or SIGTERM
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, trace, warn};

use consolebot_adapter::{
    BoxedDispatcher, BoxedFrontend, ConsoleAdapter, ConsoleBot, StdioFrontend, dispatcher_fn,
};
use consolebot_core::LogSink;

use crate::config::{ConfigLoader, ConfigResult, RuntimeConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging::LoggingBuilder;

/// Owns the configuration and the console adapter for one process.
pub struct ConsoleRuntime {
    config: RuntimeConfig,
    adapter: ConsoleAdapter,
}

impl ConsoleRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory, falling back to defaults if it is missing or invalid.
    pub fn new(dispatcher: BoxedDispatcher) -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .and_then(|config| validate_config(&config).map(|_| config))
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                RuntimeConfig::default()
            });

        Self::from_config(&config, dispatcher)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime logging through the process-wide [`LogSink`].
    ///
    /// Installs the global tracing subscriber unless one is already set.
    pub fn from_config(config: &RuntimeConfig, dispatcher: BoxedDispatcher) -> Self {
        Self::with_log_sink(config, dispatcher, LogSink::global().clone())
    }

    /// Like [`from_config`](Self::from_config), with console log output and
    /// front-end capture going through `sink`.
    pub fn with_log_sink(
        config: &RuntimeConfig,
        dispatcher: BoxedDispatcher,
        sink: LogSink,
    ) -> Self {
        let _ = LoggingBuilder::from_config(&config.logging)
            .log_sink(sink.clone())
            .try_init();

        info!(
            log_level = %config.logging.level,
            log_output = ?config.logging.output,
            bot = %config.console.bot.id,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            adapter: ConsoleAdapter::with_log_sink(config.console.clone(), dispatcher, sink),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn adapter(&self) -> &ConsoleAdapter {
        &self.adapter
    }

    /// Starts the adapter on `frontend` and returns the connected bot.
    pub fn start(&self, frontend: BoxedFrontend) -> RuntimeResult<ConsoleBot> {
        let bot = self.adapter.start(frontend)?;
        info!(bot = %bot.id(), "Console runtime started");
        Ok(bot)
    }

    /// Shuts the adapter down. Safe to call more than once.
    pub async fn stop(&self) {
        info!("Stopping console runtime");
        self.adapter.shutdown().await;
        info!("Console runtime stopped");
    }

    /// Runs on the process's terminal until the user leaves or a shutdown
    /// signal arrives.
    pub async fn run(&self) -> RuntimeResult<()> {
        let frontend = StdioFrontend::new(self.config.console.frontend.clone());
        self.run_with(Arc::new(frontend)).await
    }

    /// Runs on `frontend` until it exits or a shutdown signal arrives.
    pub async fn run_with(&self, frontend: BoxedFrontend) -> RuntimeResult<()> {
        self.run_until(frontend, wait_for_shutdown()).await
    }

    /// Runs on `frontend` until it exits or `shutdown` completes.
    pub async fn run_until<F>(&self, frontend: BoxedFrontend, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start(frontend)?;

        tokio::select! {
            _ = shutdown => {}
            _ = self.adapter.closed() => {
                info!("Front-end exited, shutting down");
            }
        }

        self.stop().await;
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            // only the front-end can end the run now
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`ConsoleRuntime`] with custom configuration.
///
/// ```rust,ignore
/// let runtime = ConsoleRuntime::builder()
///     .config_file("config/consolebot.toml")
///     .profile("production")
///     .dispatcher(my_dispatcher)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    dispatcher: Option<BoxedDispatcher>,
    log_sink: Option<LogSink>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            dispatcher: None,
            log_sink: None,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables `CONSOLEBOT_*` environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration on top of files and environment.
    pub fn merge(mut self, config: RuntimeConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Sets where events go. Without one, events are logged and dropped.
    pub fn dispatcher(mut self, dispatcher: BoxedDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Loads and validates the configuration, then builds the runtime.
    pub fn build(self) -> ConfigResult<ConsoleRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;

        let dispatcher = self.dispatcher.unwrap_or_else(|| {
            dispatcher_fn(|_bot, event| async move {
                trace!(event = %event.event_name(), "No dispatcher set, dropping event");
            })
        });
        let sink = self
            .log_sink
            .unwrap_or_else(|| LogSink::global().clone());
        Ok(ConsoleRuntime::with_log_sink(&config, dispatcher, sink))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::ConfigError;

    fn quiet_sink() -> LogSink {
        LogSink::with_target(Box::new(io::sink()))
    }

    fn test_runtime(dispatcher: BoxedDispatcher) -> ConsoleRuntime {
        ConsoleRuntime::builder()
            .search_path(std::env::temp_dir().join("consolebot-runtime-tests-empty"))
            .without_env()
            .dispatcher(dispatcher)
            .log_sink(quiet_sink())
            .build()
            .unwrap()
    }

    fn stdio(runtime: &ConsoleRuntime, input: tokio_test::io::Mock) -> BoxedFrontend {
        Arc::new(StdioFrontend::with_io(
            runtime.config().console.frontend.clone(),
            input,
            tokio::io::sink(),
        ))
    }

    #[tokio::test]
    async fn test_run_ends_when_user_exits() {
        let runtime = test_runtime(dispatcher_fn(|_, _| async {}));
        let input = tokio_test::io::Builder::new().read(b":exit\n").build();
        let frontend = stdio(&runtime, input);

        tokio::time::timeout(
            Duration::from_secs(5),
            runtime.run_until(frontend, std::future::pending()),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(runtime.adapter().is_closed());
        assert_eq!(runtime.adapter().bot_count(), 0);
    }

    #[tokio::test]
    async fn test_run_until_shutdown_future() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runtime = test_runtime(dispatcher_fn(move |_, event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event.get_plain_text());
            }
        }));

        // keep the write half open so input never ends
        let (mut client, server) = tokio::io::duplex(1024);
        let frontend: BoxedFrontend = Arc::new(StdioFrontend::with_io(
            runtime.config().console.frontend.clone(),
            server,
            tokio::io::sink(),
        ));
        client.write_all(b"hello\n").await.unwrap();

        let mut received = None;
        let shutdown = async {
            received = rx.recv().await;
        };

        tokio::time::timeout(Duration::from_secs(5), runtime.run_until(frontend, shutdown))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(received.as_deref(), Some("hello"));
        assert_eq!(runtime.adapter().bot_count(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_is_an_error() {
        let runtime = test_runtime(dispatcher_fn(|_, _| async {}));
        let first = stdio(&runtime, tokio_test::io::Builder::new().build());
        let second = stdio(&runtime, tokio_test::io::Builder::new().build());

        runtime.start(first).unwrap();
        assert!(runtime.start(second).is_err());
        runtime.stop().await;
        runtime.stop().await;
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = RuntimeConfig::default();
        config.console.frontend.chat_history_limit = 0;

        let result = ConsoleRuntime::builder()
            .search_path(std::env::temp_dir().join("consolebot-runtime-tests-empty"))
            .without_env()
            .merge(config)
            .log_sink(quiet_sink())
            .build();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
