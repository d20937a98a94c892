//! # Sort module
//!
//! This module exposes [`SortProgram`], the ordered list of criteria
//! a message list is sorted by, and [`Sorter`], which applies a sort
//! program on the client side when the server lacks the SORT
//! capability.
//!
//! A sort program can be parsed from a string like `"SUBJECT -DATE"`:
//! keys are separated by spaces or commas, and a leading `-` reverses
//! the order of the key.

mod error;

use std::{borrow::Cow, cmp::Ordering, collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, FixedOffset};
use tracing::debug;

#[doc(inline)]
pub use self::error::{Error, Result};
use crate::message::{Id, MessageSummary};

/// The sort key.
///
/// Represents the message property a sort criterion orders messages
/// by.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortKey {
    /// Sort messages by internal arrival date.
    Arrival,

    /// Sort messages by carbon copy recipients.
    Cc,

    /// Sort messages by header `Date`.
    Date,

    /// Sort messages by senders.
    From,

    /// Sort messages by size.
    Size,

    /// Sort messages by header `Subject`.
    Subject,

    /// Sort messages by recipients.
    To,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arrival => "ARRIVAL",
            Self::Cc => "CC",
            Self::Date => "DATE",
            Self::From => "FROM",
            Self::Size => "SIZE",
            Self::Subject => "SUBJECT",
            Self::To => "TO",
        }
    }

    /// Extract the value this key orders the given message by.
    pub fn extract<'a>(&self, msg: &'a MessageSummary) -> SortValue<'a> {
        match self {
            Self::Arrival => SortValue::Date(msg.arrival),
            Self::Cc => SortValue::Text(Cow::Owned(msg.envelope.cc_short())),
            Self::Date => SortValue::Date(msg.envelope.date),
            Self::From => SortValue::Text(Cow::Owned(msg.envelope.from_short())),
            Self::Size => SortValue::Size(msg.size),
            Self::Subject => SortValue::Text(Cow::Borrowed(msg.subject())),
            Self::To => SortValue::Text(Cow::Owned(msg.envelope.to_short())),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        match key.trim() {
            key if key.eq_ignore_ascii_case("ARRIVAL") => Ok(Self::Arrival),
            key if key.eq_ignore_ascii_case("CC") => Ok(Self::Cc),
            key if key.eq_ignore_ascii_case("DATE") => Ok(Self::Date),
            key if key.eq_ignore_ascii_case("FROM") => Ok(Self::From),
            key if key.eq_ignore_ascii_case("SIZE") => Ok(Self::Size),
            key if key.eq_ignore_ascii_case("SUBJECT") => Ok(Self::Subject),
            key if key.eq_ignore_ascii_case("TO") => Ok(Self::To),
            key => Err(Error::SortProgError(key.to_owned())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The value extracted by a [`SortKey`].
///
/// Values extracted by the same key always share the same variant.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum SortValue<'a> {
    Date(Option<DateTime<FixedOffset>>),
    Size(u32),
    Text(Cow<'a, str>),
}

/// The sort criterion: a key and its direction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SortCriterion {
    pub key: SortKey,
    pub reverse: bool,
}

impl SortCriterion {
    pub fn new(key: SortKey, reverse: bool) -> Self {
        Self { key, reverse }
    }

    /// Compare two messages according to this criterion.
    pub fn compare(&self, a: &MessageSummary, b: &MessageSummary) -> Ordering {
        let ord = self.key.extract(a).cmp(&self.key.extract(b));

        if self.reverse {
            ord.reverse()
        } else {
            ord
        }
    }
}

impl FromStr for SortCriterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        match s.strip_prefix('-') {
            Some(key) => Ok(Self::new(key.parse()?, true)),
            None => Ok(Self::new(s.parse()?, false)),
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reverse {
            write!(f, "-")?;
        }
        write!(f, "{}", self.key)
    }
}

/// The sort program.
///
/// The first criterion dominates the final order, the following ones
/// break ties.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SortProgram(Vec<SortCriterion>);

impl SortProgram {
    /// Build a sort program from a list of keys, each of them
    /// optionally prefixed by `-`.
    ///
    /// Unknown keys are rejected right away.
    pub fn from_keys(keys: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        let criteria = keys
            .into_iter()
            .map(|key| key.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;

        if criteria.is_empty() {
            return Err(Error::EmptySortProgError);
        }

        Ok(Self(criteria))
    }

    pub fn criteria(&self) -> &[SortCriterion] {
        &self.0
    }

    /// The most significant criterion.
    pub fn primary(&self) -> Option<&SortCriterion> {
        self.0.first()
    }

    /// Render the program the way the SORT command expects it, for
    /// example `(REVERSE DATE SUBJECT)`.
    pub fn to_imap_string(&self) -> String {
        let keys = self
            .0
            .iter()
            .map(|criterion| {
                if criterion.reverse {
                    format!("REVERSE {}", criterion.key)
                } else {
                    criterion.key.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        format!("({keys})")
    }

    /// Whether threads should be ordered by descending date.
    ///
    /// This is the case when the program starts with a reversed date
    /// key (`-DATE` or `-ARRIVAL`).
    pub fn reverse_date(&self) -> bool {
        matches!(
            self.primary(),
            Some(SortCriterion {
                key: SortKey::Date | SortKey::Arrival,
                reverse: true,
            })
        )
    }
}

impl Default for SortProgram {
    /// The default program sorts messages by date, most recent first.
    fn default() -> Self {
        Self(vec![SortCriterion::new(SortKey::Date, true)])
    }
}

impl FromStr for SortProgram {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_keys(
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|key| !key.is_empty()),
        )
    }
}

impl fmt::Display for SortProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, criterion) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{criterion}")?;
        }
        Ok(())
    }
}

/// The client-side sorter.
///
/// The composite order is obtained by applying one stable sort per
/// criterion, from the least significant to the most significant
/// one: each pass keeps the relative order of the ties left by the
/// previous passes.
#[derive(Clone, Debug)]
pub struct Sorter<'a> {
    program: &'a SortProgram,
}

impl<'a> Sorter<'a> {
    pub fn new(program: &'a SortProgram) -> Self {
        Self { program }
    }

    /// Sort the given ids in place, using metadata from the given
    /// messages.
    ///
    /// Ids without metadata are dropped.
    pub fn sort(&self, ids: &mut Vec<Id>, messages: &HashMap<Id, MessageSummary>) {
        let count = ids.len();
        ids.retain(|id| messages.contains_key(id));

        if ids.len() < count {
            debug!("dropped {} ids without metadata", count - ids.len());
        }

        for criterion in self.program.criteria().iter().rev() {
            ids.sort_by(|a, b| match (messages.get(a), messages.get(b)) {
                (Some(a), Some(b)) => criterion.compare(a, b),
                _ => Ordering::Equal,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, FixedOffset, TimeZone};

    use crate::message::{Address, Envelope, MessageSummary};

    use super::{Error, SortCriterion, SortKey, SortProgram, Sorter};

    fn date(ts: i64) -> Option<DateTime<FixedOffset>> {
        FixedOffset::east_opt(0).and_then(|tz| tz.timestamp_opt(ts, 0).single())
    }

    fn msg(id: u32, subject: &str, ts: i64) -> (u32, MessageSummary) {
        let msg = MessageSummary {
            id,
            envelope: Envelope {
                subject: subject.into(),
                date: date(ts),
                ..Default::default()
            },
            ..Default::default()
        };
        (id, msg)
    }

    #[test]
    fn parse_sort_program() {
        let program: SortProgram = "subject, -DATE".parse().unwrap();

        assert_eq!(
            &[
                SortCriterion::new(SortKey::Subject, false),
                SortCriterion::new(SortKey::Date, true),
            ],
            program.criteria()
        );
        assert_eq!("(SUBJECT REVERSE DATE)", program.to_imap_string());
        assert_eq!("SUBJECT -DATE", program.to_string());
    }

    #[test]
    fn reject_unknown_sort_key() {
        assert!(matches!(
            SortProgram::from_keys(["DATE", "-COLOR"]),
            Err(Error::SortProgError(key)) if key == "COLOR"
        ));
        assert!(matches!(
            "".parse::<SortProgram>(),
            Err(Error::EmptySortProgError)
        ));
    }

    #[test]
    fn subject_ascending_then_date_descending() {
        let messages: HashMap<_, _> = [msg(1, "b", 5), msg(2, "a", 3), msg(3, "a", 2)]
            .into_iter()
            .collect();
        let program = SortProgram::from_keys(["SUBJECT", "-DATE"]).unwrap();

        let mut ids = vec![1, 3, 2];
        Sorter::new(&program).sort(&mut ids, &messages);

        assert_eq!(vec![2, 3, 1], ids);
    }

    #[test]
    fn reversed_pass_keeps_ties_stable() {
        let messages: HashMap<_, _> = [msg(1, "a", 1), msg(2, "a", 1), msg(3, "b", 1)]
            .into_iter()
            .collect();
        let program = SortProgram::from_keys(["-SUBJECT"]).unwrap();

        let mut ids = vec![1, 2, 3];
        Sorter::new(&program).sort(&mut ids, &messages);

        assert_eq!(vec![3, 1, 2], ids);
    }

    #[test]
    fn sort_by_size_and_senders() {
        let mut messages: HashMap<_, _> = [msg(1, "", 0), msg(2, "", 0), msg(3, "", 0)]
            .into_iter()
            .collect();

        for (id, size, from) in [(1, 30, "carol"), (2, 10, "alice"), (3, 20, "bob")] {
            if let Some(msg) = messages.get_mut(&id) {
                msg.size = size;
                msg.envelope.from = vec![Address::new(Some(from), format!("{from}@localhost"))];
            }
        }

        let mut ids = vec![1, 2, 3];
        Sorter::new(&"SIZE".parse().unwrap()).sort(&mut ids, &messages);
        assert_eq!(vec![2, 3, 1], ids);

        let mut ids = vec![1, 2, 3];
        Sorter::new(&"-FROM".parse().unwrap()).sort(&mut ids, &messages);
        assert_eq!(vec![1, 3, 2], ids);
    }

    #[test]
    fn drop_ids_without_metadata() {
        let messages: HashMap<_, _> = [msg(1, "a", 1)].into_iter().collect();

        let mut ids = vec![4, 1];
        Sorter::new(&SortProgram::default()).sort(&mut ids, &messages);

        assert_eq!(vec![1], ids);
    }

    #[test]
    fn reverse_date_program() {
        assert!(SortProgram::default().reverse_date());
        assert!("-ARRIVAL SUBJECT".parse::<SortProgram>().unwrap().reverse_date());
        assert!(!"DATE".parse::<SortProgram>().unwrap().reverse_date());
        assert!(!"-SUBJECT".parse::<SortProgram>().unwrap().reverse_date());
    }
}
