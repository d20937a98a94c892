#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use mailbox::{
    config::MailboxConfig, folder::FolderTree, message_list::MessageListConfig,
    transport::TransportSync,
};
use mailbox_testing::MemoryTransport;

/// Build a raw message sent on the given day of January 2024.
pub fn raw_message(message_id: &str, subject: &str, day: u32, refs: &[&str]) -> String {
    let date = Utc
        .with_ymd_and_hms(2024, 1, day, 10, 0, 0)
        .unwrap()
        .to_rfc2822();

    let mut raw = format!(
        "From: Alice <alice@localhost>\r\n\
         To: Bob <bob@localhost>\r\n\
         Subject: {subject}\r\n\
         Date: {date}\r\n\
         Message-ID: <{message_id}>\r\n"
    );

    if !refs.is_empty() {
        let refs: Vec<_> = refs.iter().map(|r| format!("<{r}>")).collect();
        raw.push_str(&format!("References: {}\r\n", refs.join(" ")));
    }

    raw.push_str("\r\nHello!\r\n");
    raw
}

/// Build a folder tree on top of the given store, with the given
/// message list configuration.
pub fn tree(store: &MemoryTransport, config: MessageListConfig) -> FolderTree {
    let config = MailboxConfig {
        message_list: Some(config),
        ..Default::default()
    };

    FolderTree::new(TransportSync::new(store.clone()), &config)
}
