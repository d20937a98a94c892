//! Module dedicated to message envelopes.
//!
//! The envelope is the structured summary of the message headers, as
//! announced by the server.

use std::fmt;

use chrono::{DateTime, FixedOffset};

/// The envelope address.
#[derive(Clone, Debug, Default, Eq, Hash)]
pub struct Address {
    /// The optional display name.
    pub name: Option<String>,

    /// The address itself, in the form `mailbox@host`.
    pub addr: String,
}

impl Address {
    pub fn new(name: Option<impl ToString>, addr: impl ToString) -> Self {
        Self {
            name: name.map(|name| name.to_string()),
            addr: addr.to_string(),
        }
    }

    pub fn new_nameless(addr: impl ToString) -> Self {
        Self {
            name: None,
            addr: addr.to_string(),
        }
    }

    /// Return the display name if any, otherwise the address.
    pub fn short(&self) -> &str {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.as_str(),
            _ => self.addr.as_str(),
        }
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.addr),
            None => write!(f, "{}", self.addr),
        }
    }
}

/// The message envelope.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Envelope {
    /// The Date header.
    pub date: Option<DateTime<FixedOffset>>,

    /// The Subject header.
    pub subject: String,

    /// The From header.
    pub from: Vec<Address>,

    /// The To header.
    pub to: Vec<Address>,

    /// The Cc header.
    pub cc: Vec<Address>,

    /// The Bcc header.
    pub bcc: Vec<Address>,

    /// The Message-ID header, as found in the message.
    pub message_id: Option<String>,

    /// The In-Reply-To header, as found in the message.
    pub in_reply_to: Option<String>,
}

impl Envelope {
    /// The short form of the senders, joined by commas.
    pub fn from_short(&self) -> String {
        join_short(&self.from)
    }

    /// The short form of the recipients, joined by commas.
    pub fn to_short(&self) -> String {
        join_short(&self.to)
    }

    /// The short form of the carbon copy recipients, joined by commas.
    pub fn cc_short(&self) -> String {
        join_short(&self.cc)
    }
}

fn join_short(addrs: &[Address]) -> String {
    addrs
        .iter()
        .map(Address::short)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize a message identifier.
///
/// Angle brackets and quotes are stripped, so that
/// `<"01KF8JCEOCBS0045PS"@xxx.yyy.com>` and
/// `<01KF8JCEOCBS0045PS@xxx.yyy.com>` are considered the same.
pub fn normalize_message_id(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, '<' | '>' | '"'))
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Parse the raw References header into a list of message
/// identifiers.
///
/// The header name is optional, folded lines are supported.
pub fn parse_references(raw: &str) -> Vec<String> {
    let raw = raw.trim_start();
    let value = match raw.split_once(':') {
        Some((name, value)) if name.trim().eq_ignore_ascii_case("references") => value,
        _ => raw,
    };

    value
        .split_whitespace()
        .map(|id| id.trim_matches(|c: char| c == ',' || c.is_whitespace()))
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_message_id, parse_references, Address, Envelope};

    #[test]
    fn normalize_quoted_message_id() {
        assert_eq!(
            normalize_message_id("<\"01KF8JCEOCBS0045PS\"@xxx.yyy.com>"),
            normalize_message_id("<01KF8JCEOCBS0045PS@xxx.yyy.com>"),
        );
        assert_eq!("a@b", normalize_message_id(" <a@b> "));
    }

    #[test]
    fn parse_folded_references_header() {
        let raw = "References: <a@x>\r\n <b@x>\r\n\t<c@x>\r\n\r\n";
        assert_eq!(vec!["<a@x>", "<b@x>", "<c@x>"], parse_references(raw));
    }

    #[test]
    fn parse_references_without_header_name() {
        assert_eq!(vec!["<a@x>", "<b@x>"], parse_references("<a@x> <b@x>"));
        assert!(parse_references("References:\r\n").is_empty());
        assert!(parse_references("").is_empty());
    }

    #[test]
    fn short_addresses() {
        let envelope = Envelope {
            from: vec![
                Address::new(Some("Alice"), "alice@localhost"),
                Address::new_nameless("bob@localhost"),
            ],
            ..Default::default()
        };

        assert_eq!("Alice, bob@localhost", envelope.from_short());
        assert_eq!("", envelope.to_short());
    }
}
