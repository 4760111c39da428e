//! Backend bridge between a front-end and the adapter.
//!
//! The front-end drives the bridge through the [`Backend`] hooks:
//!
//! | Hook | Effect |
//! |---|---|
//! | `on_console_load` | redirect the log sink into the front-end |
//! | `on_console_mount` | nothing beyond logging |
//! | `on_console_unmount` | restore the log sink, disconnect all bots |
//! | `post_event` | translate and hand the event to the adapter |
//!
//! The sink redirect is an RAII guard held by the bridge, so it is released
//! exactly once even when unmount runs twice or never runs at all.

use parking_lot::Mutex;
use tracing::{debug, info};

use consolebot_core::{
    CodecResult, Event, InboundEvent, LogSink, Message, MessageEvent, SinkRedirect,
};

use crate::adapter::ConsoleAdapter;
use crate::frontend::{BoxedFrontend, FrontendEvent, FrontendResult};

/// Callbacks a front-end makes into the adapter side.
pub trait Backend: Send + Sync {
    /// Called once before the front-end starts drawing.
    fn on_console_load(&self) -> FrontendResult<()>;

    fn on_console_mount(&self);

    /// Called on every exit path of the front-end's run loop.
    fn on_console_unmount(&self);

    /// Translates a raw front-end event and posts it to the adapter.
    ///
    /// Returns once the event is queued; bot processing is not awaited.
    fn post_event(&self, event: FrontendEvent) -> CodecResult<()>;
}

/// The adapter's [`Backend`] implementation.
pub struct ConsoleBackend {
    adapter: ConsoleAdapter,
    frontend: BoxedFrontend,
    sink: LogSink,
    redirect: Mutex<Option<SinkRedirect>>,
}

impl ConsoleBackend {
    pub fn new(adapter: ConsoleAdapter, frontend: BoxedFrontend, sink: LogSink) -> Self {
        Self {
            adapter,
            frontend,
            sink,
            redirect: Mutex::new(None),
        }
    }

    /// Returns `true` while the log sink is redirected by this bridge.
    pub fn is_loaded(&self) -> bool {
        self.redirect.lock().is_some()
    }

    /// Translates a front-end event into an inbound domain event.
    pub fn translate(event: FrontendEvent) -> CodecResult<InboundEvent> {
        Ok(match event {
            FrontendEvent::Message {
                time,
                self_id,
                user,
                channel,
                message,
            } => {
                let message = Message::from_console_message(&message)?;
                let base = Event::new(self_id, consolebot_core::POST_TYPE_MESSAGE, user, channel)
                    .with_time(time);
                MessageEvent::from_event(base, message).into()
            }
            FrontendEvent::Notice {
                time,
                self_id,
                user,
                channel,
                kind,
            } => Event::new(self_id, kind, user, channel).with_time(time).into(),
        })
    }
}

impl Backend for ConsoleBackend {
    fn on_console_load(&self) -> FrontendResult<()> {
        let mut redirect = self.redirect.lock();
        if redirect.is_some() {
            return Ok(());
        }
        *redirect = Some(self.sink.redirect(self.frontend.log_writer())?);
        drop(redirect);
        debug!("Console loaded");
        Ok(())
    }

    fn on_console_mount(&self) {
        info!("Console mounted");
    }

    fn on_console_unmount(&self) {
        let redirect = self.redirect.lock().take();
        if let Some(redirect) = redirect {
            redirect.release();
        }
        self.adapter.disconnect_all();
        info!("Console unmounted");
    }

    fn post_event(&self, event: FrontendEvent) -> CodecResult<()> {
        let event = Self::translate(event)?;
        self.adapter.post_event(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use consolebot_core::{Channel, ConsoleElement, ConsoleMessage, SinkError, User};
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_translate_message() {
        let time = datetime!(2024-01-01 12:00 UTC);
        let event = ConsoleBackend::translate(FrontendEvent::Message {
            time,
            self_id: "robot".into(),
            user: User::new("user", "User"),
            channel: Channel::direct(),
            message: ConsoleMessage::plain("hello"),
        })
        .unwrap();

        let InboundEvent::Message(event) = event else {
            panic!("expected message event");
        };
        assert_eq!(event.time, time);
        assert_eq!(event.self_id, "robot");
        assert_eq!(event.get_plain_text(), "hello");
        assert!(!event.to_me);
    }

    #[test]
    fn test_translate_notice() {
        let event = ConsoleBackend::translate(FrontendEvent::Notice {
            time: datetime!(2024-01-01 12:00 UTC),
            self_id: "robot".into(),
            user: User::new("user", "User"),
            channel: Channel::new("general", "General"),
            kind: "enter_channel".into(),
        })
        .unwrap();

        let InboundEvent::Notice(event) = event else {
            panic!("expected notice");
        };
        assert_eq!(event.get_type(), "enter_channel");
        assert_eq!(event.channel.id, "general");
    }

    #[test]
    fn test_translate_unmapped_element() {
        let message = ConsoleMessage::new(vec![ConsoleElement::Other {
            kind: "image".into(),
            data: serde_json::Value::Null,
        }]);
        let err = ConsoleBackend::translate(FrontendEvent::Message {
            time: datetime!(2024-01-01 12:00 UTC),
            self_id: "robot".into(),
            user: User::new("user", "User"),
            channel: Channel::direct(),
            message,
        })
        .unwrap_err();
        assert!(err.to_string().contains("image"));
    }

    #[test]
    fn test_sink_error_maps_to_frontend_error() {
        let err: crate::frontend::FrontendError = SinkError::AlreadyRedirected.into();
        assert!(matches!(
            err,
            crate::frontend::FrontendError::Sink(SinkError::AlreadyRedirected)
        ));
    }
}
