//! Rust library to browse mailboxes and list messages.
//!
//! The main purpose of this library is to turn the raw capabilities
//! of an IMAP-like mail store into a browsable folder tree and a
//! correctly ordered, paginated message list, without caring about
//! which extensions the server actually supports.
//!
//! The wire protocol is not part of this library: everything goes
//! through the [`Transport`](crate::transport::Transport) trait,
//! shared between components via
//! [`TransportSync`](crate::transport::TransportSync).
//!
//! ## Folders
//!
//! - [`FolderTree`](crate::folder::FolderTree) builds the mailbox
//!   hierarchy from a flat listing.
//! - [`Folder`](crate::folder::Folder) exposes status, selection,
//!   flags and expunge for a single mailbox.
//!
//! ## Messages
//!
//! - [`MessageList`](crate::message_list::MessageList) retrieves the
//!   ordered message identifiers using SEARCH, SORT or THREAD
//!   depending on server capabilities.
//! - [`Threader`](crate::thread::Threader) and
//!   [`Sorter`](crate::sort::Sorter) reproduce THREAD and SORT on the
//!   client side when the server lacks them.
//! - [`Paginator`](crate::message_list::paginator::Paginator) slices
//!   the ordered identifiers into pages.
//!
//! See integration tests in the `mailbox-tests` crate.

pub mod config;
mod error;
pub mod flag;
pub mod folder;
pub mod message;
pub mod message_list;
pub mod sort;
pub mod thread;
pub mod transport;

#[doc(inline)]
pub use self::{
    config::MailboxConfig,
    error::{AnyBoxedError, AnyError, AnyResult},
};
