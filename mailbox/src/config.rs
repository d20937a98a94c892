//! # Configuration
//!
//! Module dedicated to the library configuration. The
//! [`MailboxConfig`] gathers the configuration of every component:
//! the folder tree, the message lists and the transport.

use crate::{
    folder::FolderConfig, message_list::MessageListConfig, transport::TransportConfig,
};

/// The mailbox configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct MailboxConfig {
    /// The folder tree configuration.
    pub folder: Option<FolderConfig>,

    /// The default configuration of message lists.
    pub message_list: Option<MessageListConfig>,

    /// The configuration given to the transport at construction
    /// time.
    pub transport: Option<TransportConfig>,
}

impl MailboxConfig {
    pub fn folder(&self) -> FolderConfig {
        self.folder.clone().unwrap_or_default()
    }

    pub fn message_list(&self) -> MessageListConfig {
        self.message_list.clone().unwrap_or_default()
    }

    pub fn transport(&self) -> TransportConfig {
        self.transport.clone().unwrap_or_default()
    }
}
