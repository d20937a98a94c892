use chrono::{DateTime, FixedOffset, TimeZone};
use mail_parser::{Address as ParsedAddress, HeaderValue, MessageParser};
use mailbox::{
    flag::Flags,
    message::{envelope::parse_references, Address, Envelope, MessageSummary},
    transport::{FetchItem, FetchedMessage},
};

/// A message stored in a mailbox of the memory store.
#[derive(Clone, Debug)]
pub(crate) struct StoredMessage {
    pub uid: u32,
    pub raw: Vec<u8>,
    pub flags: Flags,
    pub internal_date: DateTime<FixedOffset>,
    pub envelope: Envelope,

    /// The References header, as it would be fetched with
    /// `BODY.PEEK[HEADER.FIELDS (REFERENCES)]`.
    pub references: Option<String>,

    /// The server fails to build the envelope of this message.
    pub corrupted: bool,

    /// The message is listed by SEARCH, SORT and THREAD but has
    /// already gone when fetched.
    pub vanishing: bool,
}

impl StoredMessage {
    /// Parse the given raw message. Returns `None` if the message has
    /// no header at all.
    pub fn parse(
        uid: u32,
        raw: Vec<u8>,
        flags: Flags,
        internal_date: DateTime<FixedOffset>,
    ) -> Option<Self> {
        let (envelope, references) = {
            let msg = MessageParser::default().parse(&raw)?;

            let envelope = Envelope {
                date: msg.date().and_then(to_chrono_datetime),
                subject: msg.subject().unwrap_or_default().to_owned(),
                from: addresses(msg.header("From")),
                to: addresses(msg.header("To")),
                cc: addresses(msg.header("Cc")),
                bcc: addresses(msg.header("Bcc")),
                message_id: msg.message_id().map(|id| format!("<{id}>")),
                in_reply_to: message_ids(msg.header("In-Reply-To")).into_iter().next(),
            };

            let references = message_ids(msg.header("References"));
            let references = if references.is_empty() {
                None
            } else {
                Some(format!("References: {}\r\n", references.join(" ")))
            };

            (envelope, references)
        };

        Some(Self {
            uid,
            raw,
            flags,
            internal_date,
            envelope,
            references,
            corrupted: false,
            vanishing: false,
        })
    }

    pub fn size(&self) -> u32 {
        u32::try_from(self.raw.len()).unwrap_or(u32::MAX)
    }

    /// Build the FETCH response of the message for the given items.
    pub fn fetch(&self, seq: u32, items: &[FetchItem]) -> FetchedMessage {
        let mut fetched = FetchedMessage {
            seq,
            ..Default::default()
        };

        for item in items {
            match item {
                FetchItem::Uid => fetched.uid = Some(self.uid),
                FetchItem::Envelope if !self.corrupted => {
                    fetched.envelope = Some(self.envelope.clone())
                }
                FetchItem::Envelope => (),
                FetchItem::Size => fetched.size = Some(self.size()),
                FetchItem::Flags => fetched.flags = self.flags.clone(),
                FetchItem::InternalDate => fetched.internal_date = Some(self.internal_date),
                FetchItem::References => fetched.references = self.references.clone(),
            }
        }

        fetched
    }

    /// The summary the server orders and threads the message with.
    pub fn summary(&self, seq: u32) -> MessageSummary {
        MessageSummary {
            id: self.uid,
            seq,
            uid: Some(self.uid),
            envelope: self.envelope.clone(),
            size: self.size(),
            flags: self.flags.clone(),
            arrival: Some(self.internal_date),
            references: self
                .references
                .as_deref()
                .map(parse_references)
                .unwrap_or_default(),
            ..Default::default()
        }
    }
}

fn to_chrono_datetime(dt: &mail_parser::DateTime) -> Option<DateTime<FixedOffset>> {
    let tz_secs = (dt.tz_hour as i32) * 3600 + (dt.tz_minute as i32) * 60;
    let tz_sign = if dt.tz_before_gmt { -1 } else { 1 };

    FixedOffset::east_opt(tz_sign * tz_secs)?
        .with_ymd_and_hms(
            dt.year as i32,
            dt.month as u32,
            dt.day as u32,
            dt.hour as u32,
            dt.minute as u32,
            dt.second as u32,
        )
        .earliest()
}

fn addresses(header: Option<&HeaderValue>) -> Vec<Address> {
    let mut addrs = Vec::new();

    match header {
        Some(HeaderValue::Address(ParsedAddress::List(list))) => {
            for addr in list {
                if let Some(email) = addr.address.as_deref() {
                    addrs.push(Address::new(addr.name.as_deref(), email));
                }
            }
        }
        Some(HeaderValue::Address(ParsedAddress::Group(groups))) => {
            for addr in groups.iter().flat_map(|group| &group.addresses) {
                if let Some(email) = addr.address.as_deref() {
                    addrs.push(Address::new(addr.name.as_deref(), email));
                }
            }
        }
        _ => (),
    }

    addrs
}

fn message_ids(header: Option<&HeaderValue>) -> Vec<String> {
    match header {
        Some(HeaderValue::Text(id)) => vec![format!("<{id}>")],
        Some(HeaderValue::TextList(ids)) => ids.iter().map(|id| format!("<{id}>")).collect(),
        _ => Vec::new(),
    }
}
