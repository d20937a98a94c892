//! # Folder module
//!
//! Module dedicated to the mailbox hierarchy. The main entities are
//! [`FolderTree`], built from the flat listing announced by the
//! server, and [`Folder`], a node of this tree.
//!
//! Nodes are stored in a flat map keyed by their full path. Parent and
//! children are referenced by path, never by pointer.

pub mod config;
mod error;
pub mod status;
pub mod tree;

use std::{fmt, str::FromStr};

use tracing::{debug, info, instrument};
use utf7_imap::decode_utf7_imap as decode_utf7;

#[doc(inline)]
pub use self::{
    config::FolderConfig,
    error::{Error, Result},
    status::FolderStatus,
    tree::FolderTree,
};
use crate::{
    flag::{Flag, SessionFlags},
    message::{Id, MessageSummary},
    message_list::{MessageList, MessageListConfig},
    transport::{StatusItem, StoreOp, TransportSync},
};

pub const INBOX: &str = "INBOX";
pub const SENT: &str = "Sent";
pub const DRAFT: &str = "Draft";
pub const DRAFTS: &str = "Drafts";
pub const TRASH: &str = "Trash";

/// The folder kind.
///
/// Well-known top-level folders get a kind. Sent, Drafts and Trash
/// folders are special: they are listed first.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FolderKind {
    Inbox,
    Sent,
    Drafts,
    Trash,
}

impl FolderKind {
    pub fn is_special(&self) -> bool {
        !matches!(self, Self::Inbox)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => INBOX,
            Self::Sent => SENT,
            Self::Drafts => DRAFTS,
            Self::Trash => TRASH,
        }
    }
}

impl FromStr for FolderKind {
    type Err = ();

    fn from_str(kind: &str) -> std::result::Result<Self, Self::Err> {
        match kind {
            kind if kind.eq_ignore_ascii_case(INBOX) => Ok(Self::Inbox),
            kind if kind.eq_ignore_ascii_case(SENT) => Ok(Self::Sent),
            kind if kind.eq_ignore_ascii_case(DRAFT) => Ok(Self::Drafts),
            kind if kind.eq_ignore_ascii_case(DRAFTS) => Ok(Self::Drafts),
            kind if kind.eq_ignore_ascii_case(TRASH) => Ok(Self::Trash),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mailbox path.
///
/// The canonical key of a path is its segments joined by the server
/// delimiter.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct MailboxPath {
    segments: Vec<String>,
    delimiter: Option<char>,
}

impl MailboxPath {
    pub fn new(segments: impl IntoIterator<Item = impl ToString>, delimiter: Option<char>) -> Self {
        Self {
            segments: segments.into_iter().map(|s| s.to_string()).collect(),
            delimiter,
        }
    }

    /// Split the given key using the given delimiter.
    pub fn from_key(key: &str, delimiter: Option<char>) -> Self {
        match delimiter {
            Some(delim) => Self::new(key.split(delim), delimiter),
            None => Self::new([key], delimiter),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    /// The canonical key of the path.
    pub fn key(&self) -> String {
        match self.delimiter {
            Some(delim) => self.segments.join(&delim.to_string()),
            None => self.segments.concat(),
        }
    }

    /// The last segment of the path.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The depth of the path, 0 for top-level folders.
    pub fn level(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// The path of the parent folder, if any.
    pub fn parent(&self) -> Option<MailboxPath> {
        match self.segments.as_slice() {
            [] | [_] => None,
            [parent @ .., _] => Some(Self::new(parent, self.delimiter)),
        }
    }

    /// The kind of the folder, only detected for top-level folders.
    pub fn kind(&self) -> Option<FolderKind> {
        match self.segments.as_slice() {
            [name] => name.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for MailboxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The folder, node of the [`FolderTree`].
pub struct Folder {
    transport: TransportSync,
    path: MailboxPath,
    key: String,
    parent: Option<String>,
    children: Vec<String>,
    kind: Option<FolderKind>,

    /// Whether the folder was synthesized as an ancestor placeholder
    /// rather than announced by the server.
    synthesized: bool,

    pub subscribed: bool,
    pub noselect: bool,
    pub special: bool,
    pub expanded: bool,

    status: Option<FolderStatus>,
    session_flags: Option<SessionFlags>,
    message_list: Option<MessageList>,
    list_config: MessageListConfig,
}

impl Folder {
    pub fn new(
        transport: TransportSync,
        path: MailboxPath,
        subscribed: bool,
        noselect: bool,
        list_config: MessageListConfig,
    ) -> Self {
        let kind = path.kind();

        Self {
            transport,
            key: path.key(),
            parent: path.parent().map(|parent| parent.key()),
            children: Vec::new(),
            special: kind.map(|kind| kind.is_special()).unwrap_or_default(),
            kind,
            path,
            synthesized: false,
            subscribed,
            noselect,
            expanded: false,
            status: None,
            session_flags: None,
            message_list: None,
            list_config,
        }
    }

    pub(crate) fn new_placeholder(
        transport: TransportSync,
        path: MailboxPath,
        list_config: MessageListConfig,
    ) -> Self {
        Self {
            synthesized: true,
            ..Self::new(transport, path, false, true, list_config)
        }
    }

    /// Upgrade a placeholder with the attributes announced by the
    /// server.
    pub(crate) fn upgrade(&mut self, subscribed: bool, noselect: bool) {
        if self.synthesized {
            self.synthesized = false;
            self.subscribed = subscribed;
            self.noselect = noselect;
        }
    }

    pub(crate) fn add_child(&mut self, key: &str) {
        if !self.children.iter().any(|child| child == key) {
            self.children.push(key.to_owned());
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<String> {
        &mut self.children
    }

    pub fn path(&self) -> &MailboxPath {
        &self.path
    }

    /// The canonical key of the folder path.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The name of the folder, decoded from modified UTF-7.
    pub fn display_name(&self) -> String {
        decode_utf7(self.name().to_owned())
    }

    pub fn level(&self) -> usize {
        self.path.level()
    }

    pub fn kind(&self) -> Option<FolderKind> {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// The flags of the current session, known once selected.
    pub fn session_flags(&self) -> Option<&SessionFlags> {
        self.session_flags.as_ref()
    }

    /// The folder status, queried on first access.
    ///
    /// Noselect folders always have an empty status.
    pub async fn status(&mut self) -> Result<&FolderStatus> {
        if self.status.is_none() {
            self.refresh_status().await?;
        }

        Ok(self.status.get_or_insert_with(Default::default))
    }

    #[instrument(skip_all, fields(folder = %self.key))]
    pub async fn refresh_status(&mut self) -> Result<()> {
        if self.noselect {
            self.status = Some(FolderStatus::default());
            return Ok(());
        }

        info!("refreshing folder status");

        let res = {
            let mut transport = self.transport.lock().await;
            transport.status(&self.key, &StatusItem::ALL).await?
        };

        self.status = Some(res.into());
        Ok(())
    }

    /// Select the folder.
    ///
    /// Captures the session flags, and reconciles the status with the
    /// counters announced by the server.
    #[instrument(skip_all, fields(folder = %self.key))]
    pub async fn select(&mut self) -> Result<()> {
        if self.noselect {
            return Err(Error::FolderNotSelectableError(self.key.clone()));
        }

        info!("selecting folder");

        let res = {
            let mut transport = self.transport.lock().await;
            transport.select(&self.key).await?
        };

        self.session_flags = Some(SessionFlags::new(
            res.flags.clone(),
            res.permanent_flags.clone(),
        ));
        self.status
            .get_or_insert_with(Default::default)
            .merge_select(&res);

        debug!("folder status after select: {:?}", self.status);
        Ok(())
    }

    /// Add flags to the given messages.
    pub async fn set_flags(&mut self, ids: &[Id], flags: &[Flag]) -> Result<()> {
        self.store_flags(ids, StoreOp::Add { silent: true }, flags)
            .await
    }

    /// Remove flags from the given messages.
    pub async fn reset_flags(&mut self, ids: &[Id], flags: &[Flag]) -> Result<()> {
        self.store_flags(ids, StoreOp::Remove { silent: true }, flags)
            .await
    }

    #[instrument(skip_all, fields(folder = %self.key))]
    async fn store_flags(&mut self, ids: &[Id], op: StoreOp, flags: &[Flag]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        info!("storing {op} on {} messages", ids.len());

        let res = {
            let mut transport = self.transport.lock().await;
            transport.store(ids, op, flags).await?
        };

        // unseen counters may have changed
        self.status = None;

        if let Some(list) = &mut self.message_list {
            if res.has_expunged() {
                debug!("server expunged messages {:?} while storing flags", res.expunged);
            }
            list.invalidate();
        }

        Ok(())
    }

    /// Expunge the folder.
    #[instrument(skip_all, fields(folder = %self.key))]
    pub async fn expunge(&mut self) -> Result<Vec<u32>> {
        info!("expunging folder");

        let expunged = {
            let mut transport = self.transport.lock().await;
            transport.expunge().await?
        };
        debug!("expunged messages: {expunged:?}");

        self.status = None;

        if let Some(list) = &mut self.message_list {
            list.invalidate();
        }

        Ok(expunged)
    }

    /// Append the given raw message to the folder.
    #[instrument(skip_all, fields(folder = %self.key))]
    pub async fn append(&mut self, message: &[u8], flags: &[Flag]) -> Result<()> {
        info!("appending message of {} bytes", message.len());

        {
            let mut transport = self.transport.lock().await;
            transport.append(&self.key, message, flags).await?;
        }

        self.status = None;

        if let Some(list) = &mut self.message_list {
            list.invalidate();
        }

        Ok(())
    }

    /// Copy the given messages to the given target folder.
    #[instrument(skip_all, fields(folder = %self.key))]
    pub async fn copy(&mut self, ids: &[Id], target: &str) -> Result<()> {
        info!("copying {} messages to {target}", ids.len());

        let mut transport = self.transport.lock().await;
        transport.copy(ids, target).await?;

        Ok(())
    }

    /// The message list of the folder, created on first access.
    pub fn message_list(&mut self) -> Result<&mut MessageList> {
        let list = match self.message_list.take() {
            Some(list) => list,
            None => MessageList::new(self.transport.clone(), &self.key, &self.list_config)?,
        };

        Ok(self.message_list.insert(list))
    }

    /// The messages of the current page, in display order.
    pub async fn messages(&mut self) -> Result<Vec<MessageSummary>> {
        let page = self.message_list()?.page().await?;
        Ok(page.into_iter().cloned().collect())
    }

    /// Fetch a single message.
    pub async fn message(&mut self, id: Id) -> Result<MessageSummary> {
        Ok(self.message_list()?.message(id).await?)
    }

    /// Return `true` if the current search matches messages.
    pub async fn has_messages(&mut self) -> Result<bool> {
        Ok(self.message_list()?.has_messages().await?)
    }
}

impl fmt::Debug for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder")
            .field("key", &self.key)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("kind", &self.kind)
            .field("subscribed", &self.subscribed)
            .field("noselect", &self.noselect)
            .field("special", &self.special)
            .field("expanded", &self.expanded)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{FolderKind, MailboxPath};

    #[test]
    fn mailbox_path() {
        let path = MailboxPath::from_key("Archives/2024/Q1", Some('/'));

        assert_eq!("Archives/2024/Q1", path.key());
        assert_eq!("Q1", path.name());
        assert_eq!(2, path.level());
        assert_eq!(Some("Archives/2024".into()), path.parent().map(|p| p.key()));
        assert_eq!(None, MailboxPath::from_key("INBOX", Some('.')).parent());
    }

    #[test]
    fn flat_namespace() {
        let path = MailboxPath::from_key("Work/Clients", None);

        assert_eq!(1, path.segments().len());
        assert_eq!("Work/Clients", path.key());
        assert_eq!(0, path.level());
    }

    #[test]
    fn folder_kind_of_top_level_folders_only() {
        assert_eq!(Some(FolderKind::Inbox), MailboxPath::from_key("inbox", Some('/')).kind());
        assert_eq!(Some(FolderKind::Drafts), MailboxPath::from_key("Draft", Some('/')).kind());
        assert_eq!(None, MailboxPath::from_key("Archives/Trash", Some('/')).kind());
        assert!(FolderKind::Trash.is_special());
        assert!(!FolderKind::Inbox.is_special());
    }
}
