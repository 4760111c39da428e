//! In-memory state shared by a front-end and the adapter.
//!
//! Chat and log history are ring buffers: once full, the oldest entries are
//! dropped. Watchers are called with each batch of new entries after it has
//! been stored, outside the storage lock, so a watcher may read the storage.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;

use consolebot_core::{Channel, ConsoleMessage, Robot, User};

/// Callback for new chat records.
pub type ChatWatcher = Arc<dyn Fn(&[ChatRecord]) + Send + Sync>;

/// Callback for new log lines.
pub type LogWatcher = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Handle returned when registering a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

/// One message in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRecord {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub sender: User,
    pub channel: Channel,
    pub content: ConsoleMessage,
    pub edited: bool,
}

impl ChatRecord {
    /// Creates a record with a fresh ID, stamped now.
    pub fn new(sender: User, channel: Channel, content: ConsoleMessage) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            time: OffsetDateTime::now_utc(),
            sender,
            channel,
            content,
            edited: false,
        }
    }
}

struct State {
    current_user: User,
    current_channel: Channel,
    robot: Option<Robot>,
    users: Vec<User>,
    channels: Vec<Channel>,
    chat_history: VecDeque<ChatRecord>,
    log_history: VecDeque<String>,
    chat_watchers: Vec<(WatcherId, ChatWatcher)>,
    log_watchers: Vec<(WatcherId, LogWatcher)>,
    next_watcher: u64,
}

/// Front-end storage.
pub struct Storage {
    state: Mutex<State>,
    chat_limit: usize,
    log_limit: usize,
}

impl Storage {
    /// Creates storage for `current_user`, starting in the DIRECT channel.
    pub fn new(current_user: User, chat_limit: usize, log_limit: usize) -> Self {
        let direct = Channel::direct();
        Self {
            state: Mutex::new(State {
                users: vec![current_user.clone()],
                channels: vec![direct.clone()],
                current_user,
                current_channel: direct,
                robot: None,
                chat_history: VecDeque::new(),
                log_history: VecDeque::new(),
                chat_watchers: Vec::new(),
                log_watchers: Vec::new(),
                next_watcher: 0,
            }),
            chat_limit: chat_limit.max(1),
            log_limit: log_limit.max(1),
        }
    }

    // =========================================================================
    // Identities
    // =========================================================================

    pub fn current_user(&self) -> User {
        self.state.lock().current_user.clone()
    }

    pub fn set_current_user(&self, user: User) {
        self.add_user(user.clone());
        self.state.lock().current_user = user;
    }

    pub fn current_channel(&self) -> Channel {
        self.state.lock().current_channel.clone()
    }

    pub fn set_current_channel(&self, channel: Channel) {
        self.add_channel(channel.clone());
        self.state.lock().current_channel = channel;
    }

    /// The bot identity bound to this front-end.
    pub fn robot(&self) -> Option<Robot> {
        self.state.lock().robot.clone()
    }

    pub fn set_robot(&self, robot: Robot) {
        self.add_user(robot.as_user());
        self.state.lock().robot = Some(robot);
    }

    /// Adds or replaces a user by ID.
    pub fn add_user(&self, user: User) {
        let mut state = self.state.lock();
        match state.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => state.users.push(user),
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.state.lock().users.clone()
    }

    pub fn find_user(&self, id: &str) -> Option<User> {
        self.state.lock().users.iter().find(|u| u.id == id).cloned()
    }

    /// Adds or replaces a channel by ID.
    pub fn add_channel(&self, channel: Channel) {
        let mut state = self.state.lock();
        match state.channels.iter_mut().find(|c| c.id == channel.id) {
            Some(existing) => *existing = channel,
            None => state.channels.push(channel),
        }
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.state.lock().channels.clone()
    }

    pub fn find_channel(&self, id: &str) -> Option<Channel> {
        self.state
            .lock()
            .channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    // =========================================================================
    // Chat history
    // =========================================================================

    /// Appends chat records and notifies chat watchers.
    pub fn write_chat(&self, records: Vec<ChatRecord>) {
        if records.is_empty() {
            return;
        }
        let watchers: Vec<ChatWatcher> = {
            let mut state = self.state.lock();
            state.chat_history.extend(records.iter().cloned());
            while state.chat_history.len() > self.chat_limit {
                state.chat_history.pop_front();
            }
            state.chat_watchers.iter().map(|(_, w)| w.clone()).collect()
        };
        for watcher in watchers {
            watcher(&records);
        }
    }

    pub fn chat_history(&self) -> Vec<ChatRecord> {
        self.state.lock().chat_history.iter().cloned().collect()
    }

    pub fn find_message(&self, id: &str) -> Option<ChatRecord> {
        self.state
            .lock()
            .chat_history
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Replaces the content of a stored message. Returns the updated record.
    pub fn edit_message(&self, id: &str, content: ConsoleMessage) -> Option<ChatRecord> {
        let mut state = self.state.lock();
        let record = state.chat_history.iter_mut().find(|r| r.id == id)?;
        record.content = content;
        record.edited = true;
        Some(record.clone())
    }

    /// Removes a stored message.
    pub fn remove_message(&self, id: &str) -> Option<ChatRecord> {
        let mut state = self.state.lock();
        let index = state.chat_history.iter().position(|r| r.id == id)?;
        state.chat_history.remove(index)
    }

    pub fn clear_chat_history(&self) {
        self.state.lock().chat_history.clear();
    }

    pub fn add_chat_watcher(&self, watcher: ChatWatcher) -> WatcherId {
        let mut state = self.state.lock();
        let id = WatcherId(state.next_watcher);
        state.next_watcher += 1;
        state.chat_watchers.push((id, watcher));
        id
    }

    /// Returns `false` if the watcher was not registered.
    pub fn remove_chat_watcher(&self, id: WatcherId) -> bool {
        let mut state = self.state.lock();
        let before = state.chat_watchers.len();
        state.chat_watchers.retain(|(wid, _)| *wid != id);
        state.chat_watchers.len() != before
    }

    // =========================================================================
    // Log history
    // =========================================================================

    /// Appends log lines and notifies log watchers.
    pub fn write_log(&self, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        let watchers: Vec<LogWatcher> = {
            let mut state = self.state.lock();
            state.log_history.extend(lines.iter().cloned());
            while state.log_history.len() > self.log_limit {
                state.log_history.pop_front();
            }
            state.log_watchers.iter().map(|(_, w)| w.clone()).collect()
        };
        for watcher in watchers {
            watcher(&lines);
        }
    }

    pub fn log_history(&self) -> Vec<String> {
        self.state.lock().log_history.iter().cloned().collect()
    }

    pub fn clear_log_history(&self) {
        self.state.lock().log_history.clear();
    }

    pub fn add_log_watcher(&self, watcher: LogWatcher) -> WatcherId {
        let mut state = self.state.lock();
        let id = WatcherId(state.next_watcher);
        state.next_watcher += 1;
        state.log_watchers.push((id, watcher));
        id
    }

    pub fn remove_log_watcher(&self, id: WatcherId) -> bool {
        let mut state = self.state.lock();
        let before = state.log_watchers.len();
        state.log_watchers.retain(|(wid, _)| *wid != id);
        state.log_watchers.len() != before
    }

    /// A writer that appends complete lines to the log history.
    pub fn log_writer(self: &Arc<Self>) -> LogWriter {
        LogWriter {
            storage: self.clone(),
            pending: Vec::new(),
        }
    }
}

// =============================================================================
// LogWriter
// =============================================================================

/// Line-buffered writer into [`Storage`]'s log history.
///
/// Partial lines are kept until a newline arrives or the writer is flushed.
pub struct LogWriter {
    storage: Arc<Storage>,
    pending: Vec<u8>,
}

impl LogWriter {
    fn take_lines(&mut self, include_partial: bool) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        if include_partial && !self.pending.is_empty() {
            lines.push(decode_line(&self.pending));
            self.pending.clear();
        }
        lines
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let lines = self.take_lines(false);
        self.storage.write_log(lines);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let lines = self.take_lines(true);
        self.storage.write_log(lines);
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let lines = self.take_lines(true);
        self.storage.write_log(lines);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn storage(limit: usize) -> Arc<Storage> {
        Arc::new(Storage::new(User::new("user", "User"), limit, limit))
    }

    fn record(text: &str) -> ChatRecord {
        ChatRecord::new(
            User::new("user", "User"),
            Channel::direct(),
            ConsoleMessage::plain(text),
        )
    }

    #[test]
    fn test_chat_history_is_bounded() {
        let storage = storage(3);
        for i in 0..5 {
            storage.write_chat(vec![record(&i.to_string())]);
        }
        let texts: Vec<String> = storage
            .chat_history()
            .iter()
            .map(|r| r.content.render_plain())
            .collect();
        assert_eq!(texts, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_log_history_is_bounded() {
        let storage = storage(2);
        storage.write_log(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(storage.log_history(), vec!["b", "c"]);
    }

    #[test]
    fn test_watchers() {
        let storage = storage(10);
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        let id = storage.add_chat_watcher(Arc::new(move |records: &[ChatRecord]| {
            counter.fetch_add(records.len(), Ordering::SeqCst);
        }));
        storage.write_chat(vec![record("a"), record("b")]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(storage.remove_chat_watcher(id));
        assert!(!storage.remove_chat_watcher(id));
        storage.write_chat(vec![record("c")]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_watcher_may_read_storage() {
        let storage = storage(10);
        let inner = storage.clone();
        let lengths = Arc::new(Mutex::new(Vec::new()));
        let out = lengths.clone();
        storage.add_log_watcher(Arc::new(move |_: &[String]| {
            out.lock().push(inner.log_history().len());
        }));
        storage.write_log(vec!["x".into()]);
        storage.write_log(vec!["y".into()]);
        assert_eq!(*lengths.lock(), vec![1, 2]);
    }

    #[test]
    fn test_edit_and_remove() {
        let storage = storage(10);
        let rec = record("old");
        let id = rec.id.clone();
        storage.write_chat(vec![rec]);

        let edited = storage
            .edit_message(&id, ConsoleMessage::plain("new"))
            .unwrap();
        assert!(edited.edited);
        assert_eq!(
            storage.find_message(&id).unwrap().content.render_plain(),
            "new"
        );

        assert!(storage.remove_message(&id).is_some());
        assert!(storage.remove_message(&id).is_none());
        assert!(storage.edit_message(&id, ConsoleMessage::plain("x")).is_none());
    }

    #[test]
    fn test_directory() {
        let storage = storage(10);
        assert_eq!(storage.current_channel(), Channel::direct());
        assert!(storage.find_user("user").is_some());

        storage.set_robot(Robot::new("robot", "Bot"));
        assert!(storage.find_user("robot").is_some());

        storage.add_channel(Channel::new("general", "General"));
        storage.add_channel(Channel::new("general", "Renamed"));
        assert_eq!(storage.channels().len(), 2);
        assert_eq!(storage.find_channel("general").unwrap().name, "Renamed");
    }

    #[test]
    fn test_log_writer_splits_lines() {
        let storage = storage(10);
        {
            let mut writer = storage.log_writer();
            writer.write_all(b"first\nsec").unwrap();
            assert_eq!(storage.log_history(), vec!["first"]);
            writer.write_all(b"ond\r\nthird").unwrap();
            assert_eq!(storage.log_history(), vec!["first", "second"]);
        }
        assert_eq!(storage.log_history(), vec!["first", "second", "third"]);
    }
}
