//! Module dedicated to message flags.
//!
//! This module contains the message [`Flag`], the set of [`Flags`]
//! attached to a message, and the [`SessionFlags`] a mailbox
//! announces when it gets selected.

mod error;

use std::{
    collections::BTreeSet,
    fmt,
    ops::{Deref, DerefMut},
    str::FromStr,
};

use tracing::debug;

#[doc(inline)]
pub use self::error::{Error, Result};

/// The message flag.
///
/// A flag is like a tag that can be attached to a message. System
/// flags are prefixed by a backslash on the wire (`\Seen`), keywords
/// are not.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum Flag {
    /// Flag used when the message has been read.
    Seen,

    /// Flag used when the message has been answered.
    Answered,

    /// Flag used as a bookmark. The meaning is specific to the user:
    /// it could be important, starred, to check etc.
    Flagged,

    /// Flag used when the message is marked for deletion.
    Deleted,

    /// Flag used when the message is a draft and is therefore not
    /// complete.
    Draft,

    /// Flag used when the message arrived in the current session.
    ///
    /// This flag is managed by the server and can never be changed
    /// by a client.
    Recent,

    /// Flag used for all other use cases (keywords).
    Custom(String),
}

impl Flag {
    /// Creates a custom flag.
    pub fn custom(flag: impl ToString) -> Self {
        Self::Custom(flag.to_string())
    }

    /// Return `true` if the flag is a keyword rather than a system
    /// flag.
    pub fn is_keyword(&self) -> bool {
        match self {
            Self::Custom(flag) => !flag.starts_with('\\'),
            _ => false,
        }
    }
}

/// Parse a flag from its wire representation. If the string does not
/// match any system flag, it is considered as custom.
impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        match s.trim() {
            seen if seen.eq_ignore_ascii_case("\\Seen") => Flag::Seen,
            answered if answered.eq_ignore_ascii_case("\\Answered") => Flag::Answered,
            flagged if flagged.eq_ignore_ascii_case("\\Flagged") => Flag::Flagged,
            deleted if deleted.eq_ignore_ascii_case("\\Deleted") => Flag::Deleted,
            draft if draft.eq_ignore_ascii_case("\\Draft") => Flag::Draft,
            recent if recent.eq_ignore_ascii_case("\\Recent") => Flag::Recent,
            flag => Flag::Custom(flag.into()),
        }
    }
}

/// Parse a flag from its wire representation. Unlike the [`From`]
/// implementation, an empty string or a string containing whitespace
/// returns an error.
impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(Error::ParseFlagError(s.to_owned()));
        }

        Ok(Flag::from(s))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Recent => write!(f, "\\Recent"),
            Flag::Custom(flag) => write!(f, "{flag}"),
        }
    }
}

/// The set of message flags.
///
/// It uses a [`BTreeSet`] to prevent duplicates and to keep a stable
/// order when displayed.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Flags(BTreeSet<Flag>);

impl Flags {
    pub fn is_seen(&self) -> bool {
        self.contains(&Flag::Seen)
    }

    pub fn is_answered(&self) -> bool {
        self.contains(&Flag::Answered)
    }

    pub fn is_flagged(&self) -> bool {
        self.contains(&Flag::Flagged)
    }

    pub fn is_deleted(&self) -> bool {
        self.contains(&Flag::Deleted)
    }

    pub fn is_draft(&self) -> bool {
        self.contains(&Flag::Draft)
    }

    pub fn is_recent(&self) -> bool {
        self.contains(&Flag::Recent)
    }

    /// Iterate over keywords, which are flags that do not start with
    /// a backslash.
    pub fn keywords(&self) -> impl Iterator<Item = &Flag> {
        self.iter().filter(|flag| flag.is_keyword())
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{flag}")?;
        }
        write!(f, ")")
    }
}

impl Deref for Flags {
    type Target = BTreeSet<Flag>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Flags {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<&str> for Flags {
    fn from(s: &str) -> Self {
        s.trim_matches(|c| c == '(' || c == ')')
            .split_whitespace()
            .filter_map(|flag| match flag.parse() {
                Ok(flag) => Some(flag),
                Err(err) => {
                    debug!("cannot parse flag {flag}, skipping it: {err}");
                    None
                }
            })
            .collect()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        Flags(iter.into_iter().collect())
    }
}

impl IntoIterator for Flags {
    type Item = Flag;
    type IntoIter = std::collections::btree_set::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Flags {
    type Item = &'a Flag;
    type IntoIter = std::collections::btree_set::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The flags announced by a mailbox when it gets selected.
///
/// The `flags` set lists the flags applicable in the mailbox, while
/// the `permanent` set lists the ones the client can change
/// permanently. A permanent set containing `\*` means arbitrary
/// keywords can be created.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionFlags {
    pub flags: Flags,
    pub permanent: Vec<String>,
}

impl SessionFlags {
    pub fn new(flags: Flags, permanent: Vec<String>) -> Self {
        Self { flags, permanent }
    }

    /// Return `true` if the given flag can be changed permanently.
    ///
    /// `\Recent` can never be changed.
    pub fn permanent_ok(&self, flag: &Flag) -> bool {
        if let Flag::Recent = flag {
            return false;
        }

        if self.permanent.iter().any(|f| f == "\\*") {
            return true;
        }

        let flag = flag.to_string();
        self.permanent.iter().any(|f| f.eq_ignore_ascii_case(&flag))
    }

    /// Return `true` if the given flag is applicable in the mailbox.
    pub fn flag_ok(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Iterate over the keywords applicable in the mailbox.
    pub fn keywords(&self) -> impl Iterator<Item = &Flag> {
        self.flags.keywords()
    }
}

#[cfg(test)]
mod tests {
    use super::{Flag, Flags, SessionFlags};

    #[test]
    fn parse_system_and_custom_flags() {
        let flags = Flags::from("(\\Seen \\deleted $Forwarded)");

        assert!(flags.is_seen());
        assert!(flags.is_deleted());
        assert!(!flags.is_flagged());
        assert_eq!(
            vec![&Flag::custom("$Forwarded")],
            flags.keywords().collect::<Vec<_>>()
        );
    }

    #[test]
    fn display_flags_as_wire_list() {
        let flags = Flags::from_iter([Flag::Seen, Flag::Answered]);
        assert_eq!("(\\Seen \\Answered)", flags.to_string());
    }

    #[test]
    fn recent_is_never_permanent() {
        let session = SessionFlags::new(Flags::default(), vec!["\\*".into()]);

        assert!(!session.permanent_ok(&Flag::Recent));
        assert!(session.permanent_ok(&Flag::Seen));
        assert!(session.permanent_ok(&Flag::custom("todo")));
    }

    #[test]
    fn permanent_flags_without_wildcard() {
        let session = SessionFlags::new(
            Flags::from("\\Seen \\Deleted"),
            vec!["\\Seen".into(), "\\Deleted".into()],
        );

        assert!(session.permanent_ok(&Flag::Seen));
        assert!(!session.permanent_ok(&Flag::Flagged));
        assert!(!session.permanent_ok(&Flag::custom("todo")));
        assert!(session.flag_ok(&Flag::Deleted));
        assert!(!session.flag_ok(&Flag::Draft));
    }
}
