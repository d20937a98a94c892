//! In-memory IMAP-like mail store for testing purpose.
//!
//! The [`MemoryTransport`] implements the
//! [`Transport`](mailbox::transport::Transport) trait on top of
//! mailboxes kept in memory. Identifiers exchanged with the library
//! are UIDs, which keeps them stable across expunges.
//!
//! The transport is cheap to clone: all clones share the same store,
//! so a test can give one clone to the library and keep another one
//! to seed mailboxes, inspect the commands the library issued, or
//! simulate server failures.

mod error;
mod message;
mod search;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use mailbox::{
    flag::{Flag, Flags},
    message::{Id, MessageSummary},
    sort::{SortProgram, Sorter},
    thread::{ThreadItem, ThreadOrder, ThreadTree, Threader},
    transport::{
        FetchItem, FetchedMessage, ListedMailbox, SelectResponse, StatusItem, StatusResponse,
        StoreOp, StoreResponse, ThreadAlgorithm, Transport, TransportConfig,
    },
    AnyResult,
};
use tokio::sync::Mutex;
use tracing::debug;

#[doc(inline)]
pub use self::error::{Error, Result};
use self::{message::StoredMessage, search::Query};

/// The flags every mailbox of the store accepts.
const SYSTEM_FLAGS: [Flag; 5] = [
    Flag::Answered,
    Flag::Flagged,
    Flag::Deleted,
    Flag::Seen,
    Flag::Draft,
];

#[derive(Debug)]
struct Mailbox {
    segments: Vec<String>,
    selectable: bool,
    messages: Vec<StoredMessage>,
    uid_next: u32,
    uid_validity: u32,
}

impl Mailbox {
    fn new(segments: Vec<String>, selectable: bool, uid_validity: u32) -> Self {
        Self {
            segments,
            selectable,
            messages: Vec::new(),
            uid_next: 1,
            uid_validity,
        }
    }

    /// Iterate over messages with their sequence number.
    fn iter(&self) -> impl Iterator<Item = (u32, &StoredMessage)> {
        (1..).zip(self.messages.iter())
    }

    fn search(&self, query: &Query) -> Vec<Id> {
        self.iter()
            .filter(|(_, msg)| query.matches(msg))
            .map(|(_, msg)| msg.uid)
            .collect()
    }

    fn summaries(&self, ids: &[Id]) -> HashMap<Id, MessageSummary> {
        self.iter()
            .filter(|(_, msg)| ids.contains(&msg.uid))
            .map(|(seq, msg)| (msg.uid, msg.summary(seq)))
            .collect()
    }

    /// Remove messages flagged `\Deleted`, returning their sequence
    /// numbers as announced by successive EXPUNGE responses.
    fn expunge(&mut self) -> Vec<u32> {
        let mut expunged = Vec::new();
        let mut seq = 1;

        self.messages.retain(|msg| {
            if msg.flags.is_deleted() {
                // sequence numbers shift after each EXPUNGE response
                expunged.push(seq);
                false
            } else {
                seq += 1;
                true
            }
        });

        expunged
    }
}

#[derive(Debug)]
struct State {
    mailboxes: BTreeMap<String, Mailbox>,
    subscribed: BTreeSet<String>,
    selected: Option<String>,
    clock: DateTime<FixedOffset>,
    next_uid_validity: u32,
    commands: Vec<String>,
    failures: HashSet<String>,
}

impl State {
    /// Log the given command, then fail if a failure was planned for
    /// it.
    fn exec(&mut self, config: &TransportConfig, name: &str, args: String) -> Result<()> {
        let cmd = if args.is_empty() {
            name.to_owned()
        } else {
            format!("{name} {args}")
        };

        if config.log_commands() {
            debug!("C: {cmd}");
        }

        self.commands.push(cmd);

        if self.failures.remove(name) {
            return Err(Error::SimulatedError(name.to_owned()));
        }

        Ok(())
    }

    fn mailbox(&self, path: &str) -> Result<&Mailbox> {
        self.mailboxes
            .get(canonical(path))
            .ok_or_else(|| Error::MailboxNotFoundError(path.to_owned()))
    }

    fn mailbox_mut(&mut self, path: &str) -> Result<&mut Mailbox> {
        self.mailboxes
            .get_mut(canonical(path))
            .ok_or_else(|| Error::MailboxNotFoundError(path.to_owned()))
    }

    fn selected(&self, cmd: &'static str) -> Result<&Mailbox> {
        let path = self
            .selected
            .as_deref()
            .ok_or(Error::NoMailboxSelectedError(cmd))?;
        self.mailbox(path)
    }

    fn selected_mut(&mut self, cmd: &'static str) -> Result<&mut Mailbox> {
        let path = self
            .selected
            .clone()
            .ok_or(Error::NoMailboxSelectedError(cmd))?;
        self.mailbox_mut(&path)
    }

    fn append(&mut self, path: &str, raw: Vec<u8>, flags: Flags) -> Result<u32> {
        let date = self.clock;
        let mailbox = self.mailbox_mut(path)?;
        let uid = mailbox.uid_next;

        let msg = StoredMessage::parse(uid, raw, flags, date)
            .ok_or_else(|| Error::ParseMessageError(path.to_owned()))?;

        mailbox.messages.push(msg);
        mailbox.uid_next += 1;
        self.clock += Duration::minutes(1);

        Ok(uid)
    }
}

/// The in-memory mail store.
#[derive(Clone, Debug)]
pub struct MemoryTransport {
    capabilities: HashSet<String>,
    delimiter: Option<char>,
    auto_expunge: bool,
    config: TransportConfig,
    state: Arc<Mutex<State>>,
}

impl MemoryTransport {
    /// Create a store containing an empty, subscribed INBOX.
    ///
    /// The store announces no capability, uses `/` as hierarchy
    /// delimiter, and gives internal dates starting at
    /// 2024-01-01T00:00:00Z, one minute apart.
    pub fn new() -> Self {
        let clock = FixedOffset::east_opt(0)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single())
            .unwrap_or_default();

        let inbox = Mailbox::new(vec![String::from("INBOX")], true, 1);

        let state = State {
            mailboxes: BTreeMap::from_iter([(String::from("INBOX"), inbox)]),
            subscribed: BTreeSet::from_iter([String::from("INBOX")]),
            selected: None,
            clock,
            next_uid_validity: 2,
            commands: Vec::new(),
            failures: HashSet::new(),
        };

        Self {
            capabilities: HashSet::new(),
            delimiter: Some('/'),
            auto_expunge: false,
            config: TransportConfig::default(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Announce the given capabilities, like `SORT` or
    /// `THREAD=REFERENCES`.
    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = impl ToString>) -> Self {
        self.capabilities = caps.into_iter().map(|cap| cap.to_string()).collect();
        self
    }

    /// Change the hierarchy delimiter. `None` makes the namespace
    /// flat.
    pub fn with_delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Expunge messages as soon as they get flagged `\Deleted`, like
    /// some servers do.
    pub fn with_auto_expunge(mut self, auto_expunge: bool) -> Self {
        self.auto_expunge = auto_expunge;
        self
    }

    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    fn segments(&self, path: &str) -> Vec<String> {
        match self.delimiter {
            Some(delim) => path.split(delim).map(ToOwned::to_owned).collect(),
            None => vec![path.to_owned()],
        }
    }

    /// Create a mailbox at the given path. Missing ancestors are not
    /// created.
    pub async fn add_mailbox(&self, path: &str, selectable: bool) {
        let segments = self.segments(path);
        let mut state = self.state.lock().await;
        let uid_validity = state.next_uid_validity;
        state.next_uid_validity += 1;
        state
            .mailboxes
            .entry(canonical(path).to_owned())
            .or_insert_with(|| Mailbox::new(segments, selectable, uid_validity));
    }

    pub async fn subscribe(&self, path: &str) {
        let mut state = self.state.lock().await;
        state.subscribed.insert(canonical(path).to_owned());
    }

    pub async fn unsubscribe(&self, path: &str) {
        let mut state = self.state.lock().await;
        state.subscribed.remove(canonical(path));
    }

    /// Append a raw message to the given mailbox, returning its UID.
    pub async fn add_message(
        &self,
        path: &str,
        raw: impl AsRef<[u8]>,
        flags: &[Flag],
    ) -> Result<u32> {
        let mut state = self.state.lock().await;
        state.append(path, raw.as_ref().to_vec(), flags.iter().cloned().collect())
    }

    /// Make the server fail to build the envelope of the given
    /// message.
    pub async fn corrupt_message(&self, path: &str, uid: u32) -> Result<()> {
        self.update_message(path, uid, |msg| msg.corrupted = true)
            .await
    }

    /// Make the given message disappear from FETCH responses while
    /// it is still listed by SEARCH, SORT and THREAD, as if another
    /// session expunged it in between.
    pub async fn vanish_message(&self, path: &str, uid: u32) -> Result<()> {
        self.update_message(path, uid, |msg| msg.vanishing = true)
            .await
    }

    async fn update_message(
        &self,
        path: &str,
        uid: u32,
        update: impl FnOnce(&mut StoredMessage),
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let mailbox = state.mailbox_mut(path)?;

        if let Some(msg) = mailbox.messages.iter_mut().find(|msg| msg.uid == uid) {
            update(msg);
        }

        Ok(())
    }

    /// The flags of the given message, `None` if it does not exist.
    pub async fn message_flags(&self, path: &str, uid: u32) -> Option<Flags> {
        let state = self.state.lock().await;
        let mailbox = state.mailbox(path).ok()?;
        mailbox
            .messages
            .iter()
            .find(|msg| msg.uid == uid)
            .map(|msg| msg.flags.clone())
    }

    /// The UIDs of the given mailbox, in mailbox order.
    pub async fn message_uids(&self, path: &str) -> Result<Vec<u32>> {
        let state = self.state.lock().await;
        Ok(state.mailbox(path)?.messages.iter().map(|msg| msg.uid).collect())
    }

    /// Make the next command with the given name fail.
    pub async fn fail_next(&self, cmd: &str) {
        let mut state = self.state.lock().await;
        state.failures.insert(cmd.to_ascii_uppercase());
    }

    /// The commands received so far, in order.
    pub async fn commands(&self) -> Vec<String> {
        self.state.lock().await.commands.clone()
    }

    /// The names of the commands received so far, in order.
    pub async fn command_names(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .commands
            .iter()
            .filter_map(|cmd| cmd.split_whitespace().next())
            .map(ToOwned::to_owned)
            .collect()
    }

    pub async fn clear_commands(&self) {
        self.state.lock().await.commands.clear();
    }

    /// The path of the selected mailbox.
    pub async fn selected(&self) -> Option<String> {
        self.state.lock().await.selected.clone()
    }

    fn listed(&self, mailbox: &Mailbox) -> ListedMailbox {
        ListedMailbox::new(&mailbox.segments, self.delimiter, mailbox.selectable)
    }

    fn log_response(&self, summary: impl AsRef<str>) {
        if self.config.log_responses() {
            debug!("S: {}", summary.as_ref());
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|cap| cap.eq_ignore_ascii_case(name))
    }

    async fn list(&mut self, reference: &str, pattern: &str) -> AnyResult<Vec<ListedMailbox>> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "LIST", format!("{reference:?} {pattern:?}"))?;

        let pattern = format!("{reference}{pattern}");
        let listed: Vec<_> = state
            .mailboxes
            .iter()
            .filter(|(path, _)| glob_match(&pattern, path, self.delimiter))
            .map(|(_, mailbox)| self.listed(mailbox))
            .collect();

        self.log_response(format!("{} mailboxes listed", listed.len()));
        Ok(listed)
    }

    async fn lsub(&mut self, reference: &str, pattern: &str) -> AnyResult<Vec<ListedMailbox>> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "LSUB", format!("{reference:?} {pattern:?}"))?;

        let pattern = format!("{reference}{pattern}");
        let listed: Vec<_> = state
            .subscribed
            .iter()
            .filter(|path| glob_match(&pattern, path, self.delimiter))
            .filter_map(|path| state.mailboxes.get(path))
            .map(|mailbox| self.listed(mailbox))
            .collect();

        self.log_response(format!("{} subscribed mailboxes listed", listed.len()));
        Ok(listed)
    }

    async fn select(&mut self, path: &str) -> AnyResult<SelectResponse> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "SELECT", path.to_owned())?;

        let mailbox = state.mailbox(path)?;
        if !mailbox.selectable {
            return Err(Error::MailboxNotSelectableError(path.to_owned()).into());
        }

        let mut flags: Flags = SYSTEM_FLAGS.into_iter().collect();
        for msg in &mailbox.messages {
            flags.extend(msg.flags.keywords().cloned());
        }

        let mut permanent_flags: Vec<_> = SYSTEM_FLAGS.iter().map(ToString::to_string).collect();
        permanent_flags.push(String::from("\\*"));

        let res = SelectResponse {
            flags,
            permanent_flags,
            exists: mailbox.messages.len() as u32,
            recent: Some(count(mailbox, Flags::is_recent)),
            unseen: Some(count(mailbox, |flags| !flags.is_seen())),
            uid_next: Some(mailbox.uid_next),
            uid_validity: Some(mailbox.uid_validity),
        };

        state.selected = Some(canonical(path).to_owned());
        self.log_response(format!("{} EXISTS", res.exists));
        Ok(res)
    }

    async fn status(&mut self, path: &str, items: &[StatusItem]) -> AnyResult<StatusResponse> {
        let mut state = self.state.lock().await;
        let names: Vec<_> = items.iter().map(|item| format!("{item:?}")).collect();
        state.exec(&self.config, "STATUS", format!("{path} ({})", names.join(" ")))?;

        let mailbox = state.mailbox(path)?;
        let mut res = StatusResponse::default();

        for item in items {
            match item {
                StatusItem::Messages => res.messages = Some(mailbox.messages.len() as u32),
                StatusItem::Recent => res.recent = Some(count(mailbox, Flags::is_recent)),
                StatusItem::UidNext => res.uid_next = Some(mailbox.uid_next),
                StatusItem::UidValidity => res.uid_validity = Some(mailbox.uid_validity),
                StatusItem::Unseen => res.unseen = Some(count(mailbox, |flags| !flags.is_seen())),
            }
        }

        Ok(res)
    }

    async fn search(&mut self, expr: &str) -> AnyResult<Vec<Id>> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "SEARCH", expr.to_owned())?;

        let query = Query::parse(expr)?;
        let ids = state.selected("SEARCH")?.search(&query);

        self.log_response(format!("SEARCH {ids:?}"));
        Ok(ids)
    }

    async fn sort(
        &mut self,
        program: &SortProgram,
        charset: &str,
        expr: &str,
    ) -> AnyResult<Vec<Id>> {
        let mut state = self.state.lock().await;
        let args = format!("{} {charset} {expr}", program.to_imap_string());
        state.exec(&self.config, "SORT", args)?;

        let query = Query::parse(expr)?;
        let mailbox = state.selected("SORT")?;
        let mut ids = mailbox.search(&query);
        let summaries = mailbox.summaries(&ids);
        Sorter::new(program).sort(&mut ids, &summaries);

        self.log_response(format!("SORT {ids:?}"));
        Ok(ids)
    }

    async fn thread(
        &mut self,
        algorithm: ThreadAlgorithm,
        charset: &str,
        expr: &str,
    ) -> AnyResult<ThreadTree> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "THREAD", format!("{algorithm} {charset} {expr}"))?;

        let query = Query::parse(expr)?;
        let mailbox = state.selected("THREAD")?;
        let ids = mailbox.search(&query);
        let summaries = mailbox.summaries(&ids);

        let tree = match algorithm {
            ThreadAlgorithm::References => {
                Threader::new(ThreadOrder::Ascending).thread(&ids, &summaries)
            }
            ThreadAlgorithm::OrderedSubject => ordered_subject(&ids, &summaries),
        };

        self.log_response(format!("THREAD {:?}", tree.items()));
        Ok(tree)
    }

    async fn fetch(
        &mut self,
        ids: &[Id],
        items: &[FetchItem],
    ) -> AnyResult<HashMap<Id, FetchedMessage>> {
        let mut state = self.state.lock().await;
        let ids_str: Vec<_> = ids.iter().map(ToString::to_string).collect();
        let items_str: Vec<_> = items.iter().map(|item| format!("{item:?}")).collect();
        let args = format!("{} ({})", ids_str.join(","), items_str.join(" "));
        state.exec(&self.config, "FETCH", args)?;

        let fetched: HashMap<_, _> = state
            .selected("FETCH")?
            .iter()
            .filter(|(_, msg)| ids.contains(&msg.uid) && !msg.vanishing)
            .map(|(seq, msg)| (msg.uid, msg.fetch(seq, items)))
            .collect();

        self.log_response(format!("{} messages fetched", fetched.len()));
        Ok(fetched)
    }

    async fn store(
        &mut self,
        ids: &[Id],
        op: StoreOp,
        flags: &[Flag],
    ) -> AnyResult<StoreResponse> {
        let mut state = self.state.lock().await;
        let ids_str: Vec<_> = ids.iter().map(ToString::to_string).collect();
        let flags_str = Flags::from_iter(flags.iter().cloned()).to_string();
        let args = format!("{} {op} {flags_str}", ids_str.join(","));
        state.exec(&self.config, "STORE", args)?;

        let auto_expunge = self.auto_expunge;
        let mailbox = state.selected_mut("STORE")?;
        let mut res = StoreResponse::default();

        for msg in mailbox.messages.iter_mut() {
            if !ids.contains(&msg.uid) {
                continue;
            }

            match op {
                StoreOp::Add { .. } => msg.flags.extend(flags.iter().cloned()),
                StoreOp::Remove { .. } => msg.flags.retain(|flag| !flags.contains(flag)),
                StoreOp::Replace { .. } => msg.flags = flags.iter().cloned().collect(),
            }

            if !op.is_silent() {
                res.flags.insert(msg.uid, msg.flags.clone());
            }
        }

        if auto_expunge {
            res.expunged = mailbox.expunge();
        }

        self.log_response(format!("{} messages stored", res.flags.len()));
        Ok(res)
    }

    async fn copy(&mut self, ids: &[Id], target: &str) -> AnyResult<()> {
        let mut state = self.state.lock().await;
        let ids_str: Vec<_> = ids.iter().map(ToString::to_string).collect();
        state.exec(&self.config, "COPY", format!("{} {target}", ids_str.join(",")))?;

        // the target must exist before anything gets copied
        state.mailbox(target)?;

        let copies: Vec<_> = state
            .selected("COPY")?
            .messages
            .iter()
            .filter(|msg| ids.contains(&msg.uid))
            .map(|msg| (msg.raw.clone(), msg.flags.clone()))
            .collect();

        for (raw, flags) in copies {
            state.append(target, raw, flags)?;
        }

        Ok(())
    }

    async fn append(&mut self, path: &str, message: &[u8], flags: &[Flag]) -> AnyResult<()> {
        let mut state = self.state.lock().await;
        let flags: Flags = flags.iter().cloned().collect();
        state.exec(&self.config, "APPEND", format!("{path} {flags}"))?;

        let uid = state.append(path, message.to_vec(), flags)?;
        self.log_response(format!("APPENDUID {uid}"));
        Ok(())
    }

    async fn expunge(&mut self) -> AnyResult<Vec<u32>> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "EXPUNGE", String::new())?;

        let expunged = state.selected_mut("EXPUNGE")?.expunge();
        self.log_response(format!("{} messages expunged", expunged.len()));
        Ok(expunged)
    }

    async fn unselect(&mut self) -> AnyResult<()> {
        let mut state = self.state.lock().await;
        state.exec(&self.config, "UNSELECT", String::new())?;
        state.selected = None;
        Ok(())
    }
}

/// The INBOX name is case-insensitive.
fn canonical(path: &str) -> &str {
    if path.eq_ignore_ascii_case("INBOX") {
        "INBOX"
    } else {
        path
    }
}

fn count(mailbox: &Mailbox, pred: impl Fn(&Flags) -> bool) -> u32 {
    mailbox.messages.iter().filter(|msg| pred(&msg.flags)).count() as u32
}

/// Match a mailbox path against a LIST pattern.
///
/// `*` matches any sequence of characters, while `%` does not match
/// the hierarchy delimiter.
fn glob_match(pattern: &str, path: &str, delimiter: Option<char>) -> bool {
    fn matches(pattern: &[char], path: &[char], delimiter: Option<char>) -> bool {
        match pattern.split_first() {
            None => path.is_empty(),
            Some(('*', rest)) => (0..=path.len()).any(|i| matches(rest, &path[i..], delimiter)),
            Some(('%', rest)) => (0..=path.len())
                .take_while(|&i| i == 0 || Some(path[i - 1]) != delimiter)
                .any(|i| matches(rest, &path[i..], delimiter)),
            Some((c, rest)) => path.first() == Some(c) && matches(rest, &path[1..], delimiter),
        }
    }

    let path: Vec<char> = path.chars().collect();
    let pattern: Vec<char> = if path.iter().collect::<String>() == "INBOX" {
        pattern.to_ascii_uppercase().chars().collect()
    } else {
        pattern.chars().collect()
    };

    matches(&pattern, &path, delimiter)
}

/// Thread messages by subject, as the ORDEREDSUBJECT algorithm does.
///
/// Messages sharing the same base subject form a thread whose first
/// message, by date, is the parent of all the others.
fn ordered_subject(ids: &[Id], messages: &HashMap<Id, MessageSummary>) -> ThreadTree {
    let mut threads: Vec<(String, Vec<&MessageSummary>)> = Vec::new();

    let mut sorted: Vec<_> = ids.iter().filter_map(|id| messages.get(id)).collect();
    sorted.sort_by_key(|msg| (msg.date().copied(), msg.id));

    for msg in sorted {
        let subject = base_subject(msg.subject());
        match threads.iter_mut().find(|(s, _)| *s == subject) {
            Some((_, msgs)) => msgs.push(msg),
            None => threads.push((subject, vec![msg])),
        }
    }

    let mut items: Vec<_> = threads
        .into_iter()
        .map(|(_, msgs)| {
            let mut items = Vec::new();
            let (first, replies) = msgs.split_at(1);
            items.extend(first.iter().map(|msg| ThreadItem::Message(msg.id)));

            match replies {
                [reply] => items.push(ThreadItem::Message(reply.id)),
                replies => items.extend(
                    replies
                        .iter()
                        .map(|msg| ThreadItem::Branch(vec![ThreadItem::Message(msg.id)])),
                ),
            }

            items
        })
        .collect();

    match items.len() {
        1 => ThreadTree::new(items.remove(0)),
        _ => ThreadTree::new(items.into_iter().map(ThreadItem::Branch).collect()),
    }
}

/// Strip reply and forward prefixes from the given subject.
fn base_subject(subject: &str) -> String {
    let mut subject = subject.trim();

    loop {
        let lower = subject.to_ascii_lowercase();
        let prefix = ["re:", "fw:", "fwd:"]
            .into_iter()
            .find(|prefix| lower.starts_with(prefix));

        match prefix {
            Some(prefix) => subject = subject[prefix.len()..].trim_start(),
            None => break,
        }
    }

    subject.to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mailbox::{
        message::{Envelope, MessageSummary},
        thread::ThreadItem::{Branch, Message},
    };

    use super::{base_subject, glob_match, ordered_subject};

    #[test]
    fn glob_wildcards() {
        let delim = Some('/');

        assert!(glob_match("*", "Work/Projects", delim));
        assert!(glob_match("Work/*", "Work/Projects/2024", delim));
        assert!(glob_match("%", "Work", delim));
        assert!(!glob_match("%", "Work/Projects", delim));
        assert!(glob_match("Work/%", "Work/Projects", delim));
        assert!(glob_match("inbox", "INBOX", delim));
        assert!(!glob_match("Inbox", "Inbox2", delim));
    }

    #[test]
    fn strip_reply_prefixes() {
        assert_eq!("hello", base_subject("Re: FWD: re:Hello"));
        assert_eq!("hello", base_subject("hello"));
    }

    #[test]
    fn thread_by_subject() {
        let msgs: HashMap<_, _> = [(1, "hello"), (2, "other"), (3, "Re: hello"), (4, "re: hello")]
            .into_iter()
            .map(|(id, subject)| {
                let msg = MessageSummary {
                    id,
                    envelope: Envelope {
                        subject: subject.into(),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                (id, msg)
            })
            .collect();

        let tree = ordered_subject(&[1, 2, 3, 4], &msgs);

        assert_eq!(
            &[
                Branch(vec![
                    Message(1),
                    Branch(vec![Message(3)]),
                    Branch(vec![Message(4)]),
                ]),
                Branch(vec![Message(2)]),
            ],
            tree.items()
        );
    }
}
