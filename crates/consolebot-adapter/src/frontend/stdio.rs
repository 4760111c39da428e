//! Line-based front-end on stdin/stdout.
//!
//! Each input line is either a message in the current channel or a command
//! starting with `:`:
//!
//! | Command | Effect |
//! |---|---|
//! | `:help` | list commands |
//! | `:channel <id>` | switch to (or create) a channel |
//! | `:dm <user>` | switch to the private channel with a user |
//! | `:logs` | print captured log lines |
//! | `:clear` | clear the chat history |
//! | `:exit` | leave |
//!
//! Messages from other senders are printed as
//! `[HH:MM:SS] nick @ channel: text`, with a date line whenever more than a
//! minute has passed since the previous one.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use consolebot_core::{ApiError, ApiResult, Channel, ConsoleMessage, User};

use super::{ChatRecord, Frontend, FrontendError, FrontendEvent, FrontendResult, Storage};
use crate::backend::Backend;
use crate::config::FrontendConfig;

type BoxedReader = Box<dyn AsyncBufRead + Send + Unpin>;
type BoxedOutput = Box<dyn AsyncWrite + Send + Unpin>;

/// Gap after which a date line is printed.
const TIME_HEADER_GAP: Duration = Duration::minutes(1);

const HELP: &str = "\
Commands:
  :help             show this help
  :channel <id>     switch to a channel
  :dm <user>        switch to the private channel with a user
  :logs             print captured logs
  :clear            clear the chat history
  :exit             quit";

/// Configured input, opened when the loop starts.
enum Input {
    Stdin,
    Reader(BoxedReader),
}

impl Input {
    fn open(self) -> LineSource {
        match self {
            Self::Stdin => LineSource::Thread(spawn_stdin_reader()),
            Self::Reader(reader) => LineSource::Reader(reader.lines()),
        }
    }
}

enum LineSource {
    Thread(mpsc::UnboundedReceiver<io::Result<String>>),
    Reader(Lines<BoxedReader>),
}

impl LineSource {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        match self {
            Self::Thread(rx) => rx.recv().await.transpose(),
            Self::Reader(lines) => lines.next_line().await,
        }
    }
}

/// Blocking stdin reads live on their own thread so a pending read never
/// holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// A plain terminal front-end.
pub struct StdioFrontend {
    config: FrontendConfig,
    storage: Arc<Storage>,
    exit: CancellationToken,
    input: tokio::sync::Mutex<Option<Input>>,
    output: tokio::sync::Mutex<BoxedOutput>,
    last_time: Mutex<Option<OffsetDateTime>>,
    offset: UtcOffset,
}

impl StdioFrontend {
    /// Creates a front-end on the process's stdin and stdout.
    pub fn new(config: FrontendConfig) -> Self {
        Self::build(config, Input::Stdin, Box::new(tokio::io::stdout()))
    }

    /// Creates a front-end on arbitrary streams.
    pub fn with_io<R, W>(config: FrontendConfig, reader: R, writer: W) -> Self
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(BufReader::new(reader));
        Self::build(config, Input::Reader(reader), Box::new(writer))
    }

    fn build(config: FrontendConfig, input: Input, output: BoxedOutput) -> Self {
        let storage = Arc::new(Storage::new(
            config.user.to_user(),
            config.chat_history_limit,
            config.log_history_limit,
        ));
        Self {
            config,
            storage,
            exit: CancellationToken::new(),
            input: tokio::sync::Mutex::new(Some(input)),
            output: tokio::sync::Mutex::new(output),
            last_time: Mutex::new(None),
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    }

    /// Formats a record, prefixed by a date line when due.
    fn format_record(&self, record: &ChatRecord) -> String {
        let time = record.time.to_offset(self.offset);
        let mut out = String::new();

        let mut last = self.last_time.lock();
        if last.is_none_or(|last| time - last > TIME_HEADER_GAP) {
            let date = time
                .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .unwrap_or_default();
            out.push_str(&format!("-- {date} --\n"));
        }
        *last = Some(time);

        let clock = time
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default();
        let origin = if record.channel.is_direct() {
            record.sender.nickname.clone()
        } else {
            format!("{} @ {}", record.sender.nickname, record.channel.name)
        };
        out.push_str(&format!("[{clock}] {origin}: {}", record.content.render_plain()));
        out
    }

    async fn render(&self, records: Vec<ChatRecord>) -> io::Result<()> {
        let me = self.storage.current_user().id;
        for record in records.iter().filter(|r| r.sender.id != me) {
            self.write_line(&self.format_record(record)).await?;
        }
        Ok(())
    }

    async fn session(&self, input: &mut LineSource, backend: &dyn Backend) -> FrontendResult<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<ChatRecord>>();
        let watcher = self.storage.add_chat_watcher(Arc::new(move |records: &[ChatRecord]| {
            let _ = tx.send(records.to_vec());
        }));

        let result = self.event_loop(input, &mut rx, backend).await;
        self.storage.remove_chat_watcher(watcher);
        while let Ok(records) = rx.try_recv() {
            self.render(records).await?;
        }
        result
    }

    async fn event_loop(
        &self,
        input: &mut LineSource,
        rendered: &mut mpsc::UnboundedReceiver<Vec<ChatRecord>>,
        backend: &dyn Backend,
    ) -> FrontendResult<()> {
        loop {
            tokio::select! {
                biased;
                _ = self.exit.cancelled() => return Ok(()),
                Some(records) = rendered.recv() => self.render(records).await?,
                line = input.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line, backend).await? {
                            return Ok(());
                        }
                    }
                    None => {
                        debug!("Input closed");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Returns `false` when the user asked to leave.
    async fn handle_line(&self, line: &str, backend: &dyn Backend) -> FrontendResult<bool> {
        let line = line.trim_end();
        if let Some(command) = line.strip_prefix(':') {
            return self.run_command(command, backend).await;
        }
        if line.is_empty() {
            return Ok(true);
        }

        let user = self.storage.current_user();
        let channel = self.storage.current_channel();
        let content = ConsoleMessage::plain(line);
        let record = ChatRecord::new(user.clone(), channel.clone(), content.clone());
        let time = record.time;
        self.storage.write_chat(vec![record]);

        let Some(robot) = self.storage.robot() else {
            warn!("No bot bound to the console, input not delivered");
            return Ok(true);
        };
        let event = FrontendEvent::Message {
            time,
            self_id: robot.id,
            user,
            channel,
            message: content,
        };
        if let Err(e) = backend.post_event(event) {
            warn!(error = %e, "Input could not be delivered");
        }
        Ok(true)
    }

    async fn run_command(&self, command: &str, backend: &dyn Backend) -> FrontendResult<bool> {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match (name, arg) {
            ("exit" | "quit", _) => return Ok(false),
            ("help", _) => self.write_line(HELP).await?,
            ("channel", "") | ("dm", "") => {
                self.write_line(&format!("Usage: :{name} <id>")).await?
            }
            ("channel", id) => {
                let channel = self
                    .storage
                    .find_channel(id)
                    .unwrap_or_else(|| Channel::new(id, id));
                self.enter_channel(channel, backend).await?;
            }
            ("dm", id) => match self.storage.find_user(id) {
                Some(user) => self.enter_channel(Channel::private_with(&user), backend).await?,
                None => self.write_line(&format!("Unknown user '{id}'")).await?,
            },
            ("logs", _) => {
                for line in self.storage.log_history() {
                    self.write_line(&line).await?;
                }
            }
            ("clear", _) => {
                self.storage.clear_chat_history();
                *self.last_time.lock() = None;
                self.write_line("Chat history cleared").await?;
            }
            (other, _) => {
                self.write_line(&format!("Unknown command ':{other}', try :help"))
                    .await?
            }
        }
        Ok(true)
    }

    async fn enter_channel(&self, channel: Channel, backend: &dyn Backend) -> io::Result<()> {
        self.storage.set_current_channel(channel.clone());
        self.write_line(&format!("Now in {}", channel.name)).await?;

        if let Some(robot) = self.storage.robot() {
            let event = FrontendEvent::Notice {
                time: OffsetDateTime::now_utc(),
                self_id: robot.id,
                user: self.storage.current_user(),
                channel,
                kind: "enter_channel".to_string(),
            };
            if let Err(e) = backend.post_event(event) {
                warn!(error = %e, "Notice could not be delivered");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Frontend for StdioFrontend {
    fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    async fn run(&self, backend: Arc<dyn Backend>) -> FrontendResult<()> {
        let mut input = self
            .input
            .lock()
            .await
            .take()
            .ok_or(FrontendError::Closed)?
            .open();

        let result = match backend.on_console_load() {
            Ok(()) => {
                backend.on_console_mount();
                let banner = format!(
                    "{} - {}\nType :help for commands.",
                    self.config.title, self.config.sub_title
                );
                match self.write_line(&banner).await {
                    Ok(()) => self.session(&mut input, backend.as_ref()).await,
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e),
        };

        backend.on_console_unmount();
        result
    }

    fn exit(&self) {
        self.exit.cancel();
    }

    async fn bell(&self) -> ApiResult<()> {
        let mut output = self.output.lock().await;
        output
            .write_all(b"\x07")
            .await
            .map_err(|e| ApiError::Frontend(e.to_string()))?;
        output
            .flush()
            .await
            .map_err(|e| ApiError::Frontend(e.to_string()))
    }

    async fn send_message(
        &self,
        sender: User,
        channel: Channel,
        content: ConsoleMessage,
    ) -> ApiResult<ChatRecord> {
        if self.storage.find_channel(&channel.id).is_none() {
            self.storage.add_channel(channel.clone());
        }
        let record = ChatRecord::new(sender, channel, content);
        self.storage.write_chat(vec![record.clone()]);
        Ok(record)
    }
}
