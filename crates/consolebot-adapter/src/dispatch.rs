//! The hand-off point to the bot framework.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use consolebot_core::ConsoleEvent;

use crate::bot::ConsoleBot;

/// Event dispatcher. Receives classified events and distributes them to
/// handlers.
///
/// The adapter awaits `dispatch` on its own pump task, one event at a time and
/// in arrival order. Implementations that run handlers for long should spawn
/// them and return.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, bot: ConsoleBot, event: ConsoleEvent);
}

#[async_trait]
impl<F, Fut> Dispatcher for F
where
    F: Fn(ConsoleBot, ConsoleEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn dispatch(&self, bot: ConsoleBot, event: ConsoleEvent) {
        (self)(bot, event).await
    }
}

/// Boxed dispatcher trait object.
pub type BoxedDispatcher = Arc<dyn Dispatcher>;

/// Wraps an async closure as a [`BoxedDispatcher`].
pub fn dispatcher_fn<F, Fut>(f: F) -> BoxedDispatcher
where
    F: Fn(ConsoleBot, ConsoleEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(f)
}
