//! # Transport module
//!
//! The transport is the external collaborator speaking the actual
//! protocol with the mail store. This library only consumes it
//! through the typed operations of the [`Transport`] trait: command
//! encoding and response parsing are the transport's business.
//!
//! Since the underlying connection serializes one request at a time,
//! the transport is shared between the folder tree, its folders and
//! their message lists through [`TransportSync`].

pub mod capability;
pub mod config;

use std::{collections::HashMap, fmt, ops::Deref, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::sync::Mutex;

#[doc(inline)]
pub use self::{
    capability::{ServerCapabilities, ThreadAlgorithm},
    config::TransportConfig,
};
use crate::{
    flag::{Flag, Flags},
    message::{Envelope, Id},
    sort::SortProgram,
    thread::ThreadTree,
    AnyResult,
};

/// The typed IMAP-like operations the library relies on.
///
/// Every operation returns an [`AnyResult`]: the library never
/// retries nor wraps transport errors, it only propagates them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Return `true` if the server announced the given capability.
    fn has_capability(&self, name: &str) -> bool;

    /// List mailboxes matching the given reference and pattern.
    async fn list(&mut self, reference: &str, pattern: &str) -> AnyResult<Vec<ListedMailbox>>;

    /// List subscribed mailboxes matching the given reference and
    /// pattern.
    async fn lsub(&mut self, reference: &str, pattern: &str) -> AnyResult<Vec<ListedMailbox>>;

    /// Select the given mailbox.
    async fn select(&mut self, path: &str) -> AnyResult<SelectResponse>;

    /// Query the status of the given mailbox.
    async fn status(&mut self, path: &str, items: &[StatusItem]) -> AnyResult<StatusResponse>;

    /// Search the selected mailbox, in mailbox order.
    async fn search(&mut self, expr: &str) -> AnyResult<Vec<Id>>;

    /// Search and sort the selected mailbox on the server side.
    async fn sort(
        &mut self,
        program: &SortProgram,
        charset: &str,
        expr: &str,
    ) -> AnyResult<Vec<Id>>;

    /// Search and thread the selected mailbox on the server side.
    async fn thread(
        &mut self,
        algorithm: ThreadAlgorithm,
        charset: &str,
        expr: &str,
    ) -> AnyResult<ThreadTree>;

    /// Fetch the given items of the given messages.
    ///
    /// Messages that do not exist anymore are simply missing from
    /// the returned map.
    async fn fetch(
        &mut self,
        ids: &[Id],
        items: &[FetchItem],
    ) -> AnyResult<HashMap<Id, FetchedMessage>>;

    /// Change flags of the given messages.
    async fn store(&mut self, ids: &[Id], op: StoreOp, flags: &[Flag])
        -> AnyResult<StoreResponse>;

    /// Copy the given messages to the given mailbox.
    async fn copy(&mut self, ids: &[Id], target: &str) -> AnyResult<()>;

    /// Append a raw message to the given mailbox.
    async fn append(&mut self, path: &str, message: &[u8], flags: &[Flag]) -> AnyResult<()>;

    /// Expunge the selected mailbox, returning the sequence numbers
    /// of the expunged messages.
    async fn expunge(&mut self) -> AnyResult<Vec<u32>>;

    /// Unselect the selected mailbox without expunging it.
    async fn unselect(&mut self) -> AnyResult<()>;
}

/// The sync version of the transport.
///
/// This is just a transport wrapped into a mutex, so the same
/// connection can be shared across the folder tree, the folders and
/// the message lists.
#[derive(Clone)]
pub struct TransportSync {
    inner: Arc<Mutex<Box<dyn Transport>>>,
}

impl TransportSync {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    pub fn from_boxed(transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }
}

impl Deref for TransportSync {
    type Target = Arc<Mutex<Box<dyn Transport>>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for TransportSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSync").finish_non_exhaustive()
    }
}

/// A mailbox as announced by a LIST or LSUB response.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListedMailbox {
    /// The mailbox path split by the hierarchy delimiter.
    pub segments: Vec<String>,

    /// The hierarchy delimiter. `None` means the namespace is flat.
    pub delimiter: Option<char>,

    /// Whether the mailbox can be selected (no `\Noselect`
    /// attribute).
    pub selectable: bool,
}

impl ListedMailbox {
    pub fn new(
        segments: impl IntoIterator<Item = impl ToString>,
        delimiter: Option<char>,
        selectable: bool,
    ) -> Self {
        Self {
            segments: segments.into_iter().map(|s| s.to_string()).collect(),
            delimiter,
            selectable,
        }
    }

    /// Return `true` if the mailbox is the INBOX.
    pub fn is_inbox(&self) -> bool {
        matches!(self.segments.as_slice(), [name] if name.eq_ignore_ascii_case("INBOX"))
    }
}

/// The response of a SELECT command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SelectResponse {
    /// The flags applicable in the mailbox.
    pub flags: Flags,

    /// The flags that can be changed permanently, as raw strings
    /// since it may contain the `\*` wildcard.
    pub permanent_flags: Vec<String>,

    pub exists: u32,
    pub recent: Option<u32>,
    pub unseen: Option<u32>,
    pub uid_next: Option<u32>,
    pub uid_validity: Option<u32>,
}

/// The items that can be requested by a STATUS command.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StatusItem {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
}

impl StatusItem {
    /// All the status items.
    pub const ALL: [StatusItem; 5] = [
        StatusItem::Messages,
        StatusItem::Recent,
        StatusItem::UidNext,
        StatusItem::UidValidity,
        StatusItem::Unseen,
    ];
}

/// The response of a STATUS command.
///
/// Items not requested or not announced by the server are `None`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusResponse {
    pub messages: Option<u32>,
    pub recent: Option<u32>,
    pub uid_next: Option<u32>,
    pub uid_validity: Option<u32>,
    pub unseen: Option<u32>,
}

/// The items that can be requested by a FETCH command.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FetchItem {
    Uid,
    Envelope,
    Size,
    Flags,
    InternalDate,

    /// The References header, fetched without setting `\Seen`.
    References,
}

impl FetchItem {
    /// The items needed to build a
    /// [`MessageSummary`](crate::message::MessageSummary).
    pub const SUMMARY: [FetchItem; 6] = [
        FetchItem::Uid,
        FetchItem::Envelope,
        FetchItem::Size,
        FetchItem::Flags,
        FetchItem::InternalDate,
        FetchItem::References,
    ];
}

/// The metadata of a single message, as returned by a FETCH command.
///
/// Every item is optional, since a server may omit or fail to parse
/// any of them for a given message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FetchedMessage {
    pub seq: u32,
    pub uid: Option<u32>,
    pub envelope: Option<Envelope>,
    pub size: Option<u32>,
    pub flags: Flags,
    pub internal_date: Option<DateTime<FixedOffset>>,

    /// The raw References header.
    pub references: Option<String>,
}

/// The flag operation of a STORE command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreOp {
    /// `+FLAGS`
    Add { silent: bool },
    /// `-FLAGS`
    Remove { silent: bool },
    /// `FLAGS`
    Replace { silent: bool },
}

impl StoreOp {
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Add { silent } | Self::Remove { silent } | Self::Replace { silent } => *silent,
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Add { .. } => "+FLAGS",
            Self::Remove { .. } => "-FLAGS",
            Self::Replace { .. } => "FLAGS",
        };

        if self.is_silent() {
            write!(f, "{op}.SILENT")
        } else {
            write!(f, "{op}")
        }
    }
}

/// The response of a STORE command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StoreResponse {
    /// Sequence numbers of messages the server expunged while
    /// processing the command. Some servers expunge messages as soon
    /// as they are flagged `\Deleted`.
    pub expunged: Vec<u32>,

    /// The updated flags, for non-silent operations.
    pub flags: HashMap<Id, Flags>,
}

impl StoreResponse {
    /// Return `true` if the server expunged messages while processing
    /// the command.
    pub fn has_expunged(&self) -> bool {
        !self.expunged.is_empty()
    }
}
