//! # Message module
//!
//! Module dedicated to message metadata: the [`Envelope`] announced
//! by the server, and the [`MessageSummary`] displayed in message
//! lists.

pub mod envelope;
mod error;

use chrono::{DateTime, FixedOffset};

#[doc(inline)]
pub use self::{
    envelope::{Address, Envelope},
    error::{Error, Result},
};
use crate::{flag::Flags, transport::FetchedMessage};

/// The message identifier.
///
/// Depending on the transport, it is either a sequence number or a
/// UID. The library never mixes both for a given transport.
pub type Id = u32;

/// The message summary.
///
/// A summary gathers the metadata needed to display a message in a
/// list. The thread-related fields (`depth`, `parent`, `children`)
/// are only set when the list is displayed threaded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageSummary {
    /// The identifier used by the message list.
    pub id: Id,

    /// The sequence number of the message in the selected mailbox.
    pub seq: u32,

    /// The message UID, if announced by the server.
    pub uid: Option<u32>,

    /// The message envelope.
    pub envelope: Envelope,

    /// The message size, in bytes.
    pub size: u32,

    /// The message flags.
    pub flags: Flags,

    /// The date the message arrived in the mailbox.
    pub arrival: Option<DateTime<FixedOffset>>,

    /// The raw list of message identifiers from the References
    /// header, in header order.
    pub references: Vec<String>,

    /// The depth of the message in its thread.
    pub depth: usize,

    /// The parent message in its thread.
    pub parent: Option<Id>,

    /// The children messages in its thread.
    pub children: Vec<Id>,
}

impl MessageSummary {
    /// Build a summary from the metadata fetched for the given id.
    ///
    /// Fails if the metadata misses the envelope or the size, which
    /// are mandatory to display and order the message.
    pub fn from_fetched(id: Id, fetched: FetchedMessage) -> Result<Self> {
        let envelope = fetched.envelope.ok_or(Error::MissingEnvelopeError(id))?;
        let size = fetched.size.ok_or(Error::MissingSizeError(id))?;
        let references = fetched
            .references
            .as_deref()
            .map(envelope::parse_references)
            .unwrap_or_default();

        Ok(Self {
            id,
            seq: fetched.seq,
            uid: fetched.uid,
            envelope,
            size,
            flags: fetched.flags,
            arrival: fetched.internal_date,
            references,
            ..Default::default()
        })
    }

    /// The sent date from the envelope.
    pub fn date(&self) -> Option<&DateTime<FixedOffset>> {
        self.envelope.date.as_ref()
    }

    /// The subject from the envelope.
    pub fn subject(&self) -> &str {
        &self.envelope.subject
    }

    /// The references used to link the message in a thread.
    ///
    /// Falls back to the In-Reply-To message identifier when the
    /// message has no References header.
    pub fn thread_references(&self) -> Vec<&str> {
        if !self.references.is_empty() {
            return self.references.iter().map(String::as_str).collect();
        }

        self.envelope
            .in_reply_to
            .as_deref()
            .map(|id| vec![id])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::{flag::Flag, transport::FetchedMessage};

    use super::{Envelope, Error, MessageSummary};

    #[test]
    fn summary_from_complete_fetch() {
        let fetched = FetchedMessage {
            seq: 3,
            uid: Some(42),
            envelope: Some(Envelope {
                subject: "hello".into(),
                ..Default::default()
            }),
            size: Some(1024),
            flags: [Flag::Seen].into_iter().collect(),
            internal_date: None,
            references: Some("References: <a@x> <b@x>\r\n".into()),
        };

        let summary = MessageSummary::from_fetched(42, fetched).unwrap();

        assert_eq!(3, summary.seq);
        assert_eq!("hello", summary.subject());
        assert!(summary.flags.is_seen());
        assert_eq!(vec!["<a@x>", "<b@x>"], summary.thread_references());
    }

    #[test]
    fn summary_without_envelope_is_malformed() {
        let fetched = FetchedMessage {
            seq: 1,
            size: Some(10),
            ..Default::default()
        };

        assert!(matches!(
            MessageSummary::from_fetched(7, fetched),
            Err(Error::MissingEnvelopeError(7))
        ));
    }

    #[test]
    fn thread_references_fall_back_to_in_reply_to() {
        let summary = MessageSummary {
            envelope: Envelope {
                in_reply_to: Some("<parent@x>".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(vec!["<parent@x>"], summary.thread_references());
    }
}
