mod common;

use concat_with::concat_line;
use mailbox::{
    flag::Flag,
    message::Id,
    message_list::{Error, MessageListConfig},
};
use mailbox_testing::MemoryTransport;

use self::common::{raw_message, tree};

async fn seed(store: &MemoryTransport) {
    for (id, day) in [("a@x", 1), ("b@x", 2), ("c@x", 3)] {
        let raw = raw_message(id, "flags", day, &[]);
        store.add_message("INBOX", raw, &[]).await.unwrap();
    }
}

#[test_log::test(tokio::test)]
async fn test_store_flags_on_message() {
    let store = MemoryTransport::new();
    seed(&store).await;

    let mut tree = tree(&store, MessageListConfig::default());
    let list = tree.get("INBOX").await.unwrap().message_list().unwrap();
    list.refresh().await.unwrap();

    list.set_message_flags(3, &[Flag::Seen, Flag::custom("$Todo")])
        .await
        .unwrap();
    let flags = store.message_flags("INBOX", 3).await.unwrap();
    assert!(flags.is_seen());
    assert!(flags.contains(&Flag::custom("$Todo")));

    // the list is refreshed from scratch after any flag change
    assert!(list.is_stale());
    let msg = list.page().await.unwrap()[0].clone();
    assert_eq!(3, msg.id);
    assert!(msg.flags.is_seen());

    list.reset_message_flags(3, &[Flag::Seen]).await.unwrap();
    let flags = store.message_flags("INBOX", 3).await.unwrap();
    assert!(!flags.is_seen());
    assert!(flags.contains(&Flag::custom("$Todo")));
}

#[test_log::test(tokio::test)]
async fn test_message_expunged_while_storing_flags() {
    let store = MemoryTransport::new().with_auto_expunge(true);
    seed(&store).await;

    let mut tree = tree(&store, MessageListConfig::default());
    let list = tree.get("INBOX").await.unwrap().message_list().unwrap();

    let ids: Vec<Id> = list.page().await.unwrap().iter().map(|m| m.id).collect();
    assert_eq!(vec![3, 2, 1], ids);

    // flags not triggering any expunge go through
    list.set_message_flags(1, &[Flag::Seen]).await.unwrap();

    let err = list.set_message_flags(2, &[Flag::Deleted]).await.unwrap_err();
    assert!(matches!(err, Error::MessageNotFoundError(2)));
    assert!(list.is_stale());

    let ids: Vec<Id> = list.page().await.unwrap().iter().map(|m| m.id).collect();
    assert_eq!(vec![3, 1], ids);
    assert_eq!(vec![1, 3], store.message_uids("INBOX").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_folder_flags_and_expunge() {
    let store = MemoryTransport::new();
    seed(&store).await;

    let mut tree = tree(&store, MessageListConfig::default());
    let folder = tree.get("INBOX").await.unwrap();
    assert_eq!(3, folder.messages().await.unwrap().len());

    // flags are stored silently
    store.clear_commands().await;
    folder.set_flags(&[1, 2], &[Flag::Deleted]).await.unwrap();
    assert_eq!(
        vec!["STORE 1,2 +FLAGS.SILENT (\\Deleted)"],
        store.commands().await
    );
    assert!(folder.message_list().unwrap().is_stale());

    // sequence numbers shift after each expunged message
    assert_eq!(vec![1, 1], folder.expunge().await.unwrap());

    let ids: Vec<Id> = folder.messages().await.unwrap().iter().map(|m| m.id).collect();
    assert_eq!(vec![3], ids);

    // an empty set of messages is a no-op
    store.clear_commands().await;
    folder.reset_flags(&[], &[Flag::Seen]).await.unwrap();
    assert!(store.commands().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_folder_copy_and_append() {
    let store = MemoryTransport::new();
    store.add_mailbox("Archive", true).await;
    seed(&store).await;

    let mut tree = tree(&store, MessageListConfig::default());
    let folder = tree.get("INBOX").await.unwrap();

    folder.set_flags(&[2], &[Flag::Flagged]).await.unwrap();
    folder.copy(&[2], "Archive").await.unwrap();

    assert_eq!(vec![1], store.message_uids("Archive").await.unwrap());
    let flags = store.message_flags("Archive", 1).await.unwrap();
    assert!(flags.is_flagged());

    let err = folder.copy(&[2], "Missing").await.unwrap_err();
    assert!(matches!(err, mailbox::folder::Error::TransportError(_)));

    let raw = concat_line!(
        "From: alice@localhost",
        "To: bob@localhost",
        "Subject: appended",
        "Date: Fri, 5 Jan 2024 10:00:00 +0000",
        "",
        "Hello, world!",
    );
    folder.append(raw.as_bytes(), &[Flag::Draft]).await.unwrap();

    let page = folder.messages().await.unwrap();
    assert_eq!(4, page.len());

    // the appended message is the most recent one
    let appended = &page[0];
    assert_eq!(4, appended.id);
    assert_eq!("appended", appended.subject());
    assert!(appended.flags.is_draft());
}
