//! Module dedicated to the folder tree.

use std::{collections::HashMap, fmt, mem};

use regex::Regex;
use tracing::{debug, info, instrument};

use super::{Error, Folder, FolderConfig, MailboxPath, Result};
use crate::{
    config::MailboxConfig,
    message_list::MessageListConfig,
    transport::{capability::UNSELECT, ListedMailbox, TransportSync},
};

/// The folder tree.
///
/// Folders are stored in a flat map keyed by canonical path. Every
/// non-root folder has its parent in the tree: ancestors the server
/// did not announce are synthesized as noselect placeholders.
pub struct FolderTree {
    transport: TransportSync,
    config: FolderConfig,
    list_config: MessageListConfig,
    folders: HashMap<String, Folder>,
    roots: Vec<String>,
    selected: Option<String>,
    delimiter: Option<char>,
}

impl FolderTree {
    pub fn new(transport: TransportSync, config: &MailboxConfig) -> Self {
        Self {
            transport,
            config: config.folder(),
            list_config: config.message_list(),
            folders: HashMap::new(),
            roots: Vec::new(),
            selected: None,
            delimiter: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// The hierarchy delimiter announced by the server.
    pub fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    /// The key of the selected folder.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Get a known folder, without querying the server.
    pub fn folder(&self, path: &str) -> Option<&Folder> {
        self.folders.get(path)
    }

    pub fn folder_mut(&mut self, path: &str) -> Option<&mut Folder> {
        self.folders.get_mut(path)
    }

    /// Rebuild the tree from the subscribed listing, or from the full
    /// listing.
    ///
    /// The INBOX is always part of the tree unless disabled by
    /// [`FolderConfig::list_inbox`].
    #[instrument(skip(self))]
    pub async fn refresh(&mut self, subscribed: bool) -> Result<()> {
        info!("refreshing folder tree");

        let mut inbox_added = false;

        let listed = {
            let mut transport = self.transport.lock().await;

            let mut listed = if subscribed {
                transport.lsub("", "*").await?
            } else {
                transport.list("", "*").await?
            };

            if self.config.list_inbox() && !listed.iter().any(ListedMailbox::is_inbox) {
                debug!("inbox not listed, adding it from the full listing");
                if let Some(inbox) = transport.list("", "INBOX").await?.into_iter().next() {
                    listed.insert(0, inbox);
                    inbox_added = true;
                }
            }

            listed
        };

        if listed.is_empty() {
            return Err(Error::NoFolderListError);
        }

        self.folders.clear();
        self.roots.clear();
        self.delimiter = listed[0].delimiter;

        for mailbox in listed {
            // an inbox coming from the full listing is not subscribed
            let subscribed = subscribed && !(inbox_added && mailbox.is_inbox());
            self.add_folder(mailbox.segments, subscribed, !mailbox.selectable);
        }

        let (expanded, special) = (
            self.config.expanded().to_vec(),
            self.config.special().to_vec(),
        );
        self.set_properties(&expanded, &special);
        self.sort();

        if let Some(selected) = &self.selected {
            if !self.folders.contains_key(selected) {
                self.selected = None;
            }
        }

        debug!("folder tree built with {} folders", self.folders.len());
        Ok(())
    }

    /// Insert the folder at the given path, unless it already exists.
    ///
    /// Missing ancestors are synthesized as noselect, unsubscribed
    /// placeholders. A placeholder already in the tree is upgraded with
    /// the given attributes. Returns the canonical key of the folder.
    pub fn add_folder(
        &mut self,
        segments: Vec<String>,
        subscribed: bool,
        noselect: bool,
    ) -> String {
        let path = MailboxPath::new(segments, self.delimiter);
        let key = path.key();

        match self.folders.get_mut(&key) {
            Some(folder) => folder.upgrade(subscribed, noselect),
            None => {
                let folder = Folder::new(
                    self.transport.clone(),
                    path.clone(),
                    subscribed,
                    noselect,
                    self.list_config.clone(),
                );
                self.insert(key.clone(), folder);
            }
        }

        let mut child = path;

        while let Some(parent) = child.parent() {
            let parent_key = parent.key();
            let child_key = child.key();
            let exists = self.folders.contains_key(&parent_key);

            if !exists {
                debug!("synthesizing missing folder {parent_key}");
                let folder = Folder::new_placeholder(
                    self.transport.clone(),
                    parent.clone(),
                    self.list_config.clone(),
                );
                self.insert(parent_key.clone(), folder);
            }

            if let Some(folder) = self.folders.get_mut(&parent_key) {
                folder.add_child(&child_key);
            }

            if exists {
                break;
            }

            child = parent;
        }

        key
    }

    fn insert(&mut self, key: String, folder: Folder) {
        if folder.level() == 0 && !self.roots.contains(&key) {
            self.roots.push(key.clone());
        }
        self.folders.insert(key, folder);
    }

    /// Sort every level of the tree: special folders first, then by
    /// case-sensitive name.
    pub fn sort(&mut self) {
        let mut roots = mem::take(&mut self.roots);
        sort_keys(&self.folders, &mut roots);
        self.roots = roots;

        let keys: Vec<String> = self.folders.keys().cloned().collect();

        for key in keys {
            let Some(mut children) = self
                .folders
                .get_mut(&key)
                .map(|folder| mem::take(folder.children_mut()))
            else {
                continue;
            };

            sort_keys(&self.folders, &mut children);

            if let Some(folder) = self.folders.get_mut(&key) {
                *folder.children_mut() = children;
            }
        }
    }

    /// Mark the given folders expanded and special.
    ///
    /// Unknown paths are ignored. The tree needs to be sorted again
    /// after changing special folders.
    pub fn set_properties(&mut self, expanded: &[String], special: &[String]) {
        for key in expanded {
            if let Some(folder) = self.folders.get_mut(key) {
                folder.expanded = true;
            }
        }

        for key in special {
            if let Some(folder) = self.folders.get_mut(key) {
                folder.special = true;
            }
        }
    }

    /// Get the folder at the given path, then select it.
    ///
    /// If the folder is not in the tree yet, it is queried from the
    /// server and inserted. The previously selected folder is
    /// unselected first when the server supports it.
    #[instrument(skip(self))]
    pub async fn get(&mut self, path: &str) -> Result<&mut Folder> {
        let key = if self.folders.contains_key(path) {
            path.to_owned()
        } else {
            info!("folder not in tree, querying server");

            let listed = {
                let mut transport = self.transport.lock().await;
                if self.config.list_inbox() && path.eq_ignore_ascii_case("INBOX") {
                    transport.list("", path).await?
                } else {
                    transport.lsub("", path).await?
                }
            };

            let mailbox = listed
                .into_iter()
                .next()
                .ok_or_else(|| Error::NoSuchFolderError(path.to_owned()))?;

            if mailbox.delimiter.is_some() {
                self.delimiter = mailbox.delimiter;
            }

            let key = self.add_folder(mailbox.segments, true, !mailbox.selectable);
            self.sort();
            key
        };

        if self.folders.get(&key).is_some_and(|folder| folder.noselect) {
            return Err(Error::FolderNotSelectableError(key));
        }

        if self.selected.is_some() {
            let mut transport = self.transport.lock().await;
            if transport.has_capability(UNSELECT) {
                transport.unselect().await?;
            }
            self.selected = None;
        }

        let folder = self
            .folders
            .get_mut(&key)
            .ok_or_else(|| Error::NoSuchFolderError(key.clone()))?;

        folder.select().await?;
        self.selected = Some(key);

        Ok(folder)
    }

    /// Refresh the status of every folder of the tree.
    pub async fn refresh_status(&mut self) -> Result<()> {
        let keys: Vec<String> = self.iter_all().map(|folder| folder.key().to_owned()).collect();

        for key in keys {
            if let Some(folder) = self.folders.get_mut(&key) {
                folder.refresh_status().await?;
            }
        }

        Ok(())
    }

    /// Iterate over all the folders, in sorted pre-order.
    pub fn iter_all(&self) -> Iter<'_> {
        Iter::new(self, false)
    }

    /// Iterate over the folders in sorted pre-order, without
    /// descending into collapsed folders.
    pub fn iter_expanded(&self) -> Iter<'_> {
        Iter::new(self, true)
    }

    /// Collect the folders whose path matches the given regular
    /// expression, in sorted pre-order.
    ///
    /// The tree is built from the full listing if it is empty.
    pub async fn iter_match(&mut self, pattern: &str) -> Result<Vec<&Folder>> {
        let regex =
            Regex::new(pattern).map_err(|err| Error::InvalidPatternError(err, pattern.to_owned()))?;

        if self.folders.is_empty() {
            self.refresh(false).await?;
        }

        Ok(self
            .iter_all()
            .filter(|folder| regex.is_match(folder.key()))
            .collect())
    }
}

impl fmt::Debug for FolderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderTree")
            .field("roots", &self.roots)
            .field("selected", &self.selected)
            .field("delimiter", &self.delimiter)
            .field("folders", &self.folders.len())
            .finish_non_exhaustive()
    }
}

fn sort_keys(folders: &HashMap<String, Folder>, keys: &mut [String]) {
    keys.sort_by(|a, b| match (folders.get(a), folders.get(b)) {
        (Some(a), Some(b)) => b
            .special
            .cmp(&a.special)
            .then_with(|| a.name().cmp(b.name())),
        _ => a.cmp(b),
    });
}

/// The pre-order folder iterator.
pub struct Iter<'a> {
    tree: &'a FolderTree,
    stack: Vec<&'a str>,
    expanded_only: bool,
}

impl<'a> Iter<'a> {
    fn new(tree: &'a FolderTree, expanded_only: bool) -> Self {
        Self {
            tree,
            stack: tree.roots.iter().rev().map(String::as_str).collect(),
            expanded_only,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Folder;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = self.stack.pop()?;
            let Some(folder) = self.tree.folders.get(key) else {
                continue;
            };

            if !self.expanded_only || folder.expanded {
                self.stack
                    .extend(folder.children().iter().rev().map(String::as_str));
            }

            return Some(folder);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::{
        config::MailboxConfig,
        flag::Flag,
        folder::FolderConfig,
        message::Id,
        sort::SortProgram,
        thread::ThreadTree,
        transport::{
            FetchItem, FetchedMessage, ListedMailbox, SelectResponse, StatusItem,
            StatusResponse, StoreOp, StoreResponse, ThreadAlgorithm, Transport, TransportSync,
        },
        AnyResult,
    };

    use super::FolderTree;

    // Building the tree never reaches the transport.
    struct NoTransport;

    #[async_trait]
    impl Transport for NoTransport {
        fn has_capability(&self, _: &str) -> bool {
            false
        }

        async fn list(&mut self, _: &str, _: &str) -> AnyResult<Vec<ListedMailbox>> {
            Ok(Vec::new())
        }

        async fn lsub(&mut self, _: &str, _: &str) -> AnyResult<Vec<ListedMailbox>> {
            Ok(Vec::new())
        }

        async fn select(&mut self, _: &str) -> AnyResult<SelectResponse> {
            Ok(Default::default())
        }

        async fn status(&mut self, _: &str, _: &[StatusItem]) -> AnyResult<StatusResponse> {
            Ok(Default::default())
        }

        async fn search(&mut self, _: &str) -> AnyResult<Vec<Id>> {
            Ok(Vec::new())
        }

        async fn sort(&mut self, _: &SortProgram, _: &str, _: &str) -> AnyResult<Vec<Id>> {
            Ok(Vec::new())
        }

        async fn thread(&mut self, _: ThreadAlgorithm, _: &str, _: &str) -> AnyResult<ThreadTree> {
            Ok(Default::default())
        }

        async fn fetch(
            &mut self,
            _: &[Id],
            _: &[FetchItem],
        ) -> AnyResult<HashMap<Id, FetchedMessage>> {
            Ok(Default::default())
        }

        async fn store(&mut self, _: &[Id], _: StoreOp, _: &[Flag]) -> AnyResult<StoreResponse> {
            Ok(Default::default())
        }

        async fn copy(&mut self, _: &[Id], _: &str) -> AnyResult<()> {
            Ok(())
        }

        async fn append(&mut self, _: &str, _: &[u8], _: &[Flag]) -> AnyResult<()> {
            Ok(())
        }

        async fn expunge(&mut self) -> AnyResult<Vec<u32>> {
            Ok(Vec::new())
        }

        async fn unselect(&mut self) -> AnyResult<()> {
            Ok(())
        }
    }

    fn tree(delimiter: char) -> FolderTree {
        let mut tree = FolderTree::new(TransportSync::new(NoTransport), &MailboxConfig::default());
        tree.delimiter = Some(delimiter);
        tree
    }

    fn segments(path: &str) -> Vec<String> {
        path.split('/').map(ToOwned::to_owned).collect()
    }

    fn keys(tree: &FolderTree) -> Vec<&str> {
        tree.iter_all().map(|folder| folder.key()).collect()
    }

    #[test]
    fn synthesize_missing_ancestors() {
        let mut tree = tree('/');
        tree.add_folder(segments("a/b/c"), true, false);

        assert_eq!(3, tree.len());
        assert_eq!(vec!["a", "a/b", "a/b/c"], keys(&tree));

        let a = tree.folder("a").unwrap();
        assert!(a.noselect);
        assert!(!a.subscribed);
        assert!(a.is_synthesized());
        assert_eq!(["a/b".to_owned()], a.children());

        let c = tree.folder("a/b/c").unwrap();
        assert!(!c.noselect);
        assert!(c.subscribed);
        assert_eq!(Some("a/b"), c.parent());
        assert_eq!(2, c.level());
    }

    #[test]
    fn never_duplicate_nodes() {
        let mut tree = tree('/');
        tree.add_folder(segments("a/b"), true, false);
        tree.add_folder(segments("a/c"), true, false);
        tree.add_folder(segments("a/b"), true, false);
        tree.add_folder(segments("a"), true, false);

        assert_eq!(3, tree.len());
        assert_eq!(["a".to_owned()], tree.roots());

        let a = tree.folder("a").unwrap();
        assert_eq!(["a/b".to_owned(), "a/c".to_owned()], a.children());

        // placeholder upgraded once listed
        assert!(!a.noselect);
        assert!(a.subscribed);
        assert!(!a.is_synthesized());
    }

    #[test]
    fn sort_special_folders_first() {
        let mut tree = tree('/');
        for path in ["Work", "INBOX", "archive", "Trash", "Sent", "Work/b", "Work/B", "Work/a"] {
            tree.add_folder(segments(path), true, false);
        }
        tree.set_properties(&[], &["Work/b".to_owned()]);
        tree.sort();

        assert_eq!(
            vec!["Sent", "Trash", "INBOX", "Work", "Work/b", "Work/B", "Work/a", "archive"],
            keys(&tree)
        );
    }

    #[test]
    fn iterate_expanded_folders_only() {
        let mut tree = tree('.');
        for path in ["a.b.c", "d.e"] {
            tree.add_folder(path.split('.').map(ToOwned::to_owned).collect(), true, false);
        }
        tree.set_properties(&["a".to_owned()], &[]);
        tree.sort();

        let keys: Vec<_> = tree.iter_expanded().map(|f| f.key()).collect();
        assert_eq!(vec!["a", "a.b", "d"], keys);

        let levels: Vec<_> = tree.iter_all().map(|f| f.level()).collect();
        assert_eq!(vec![0, 1, 2, 0, 1], levels);
    }

    #[test]
    fn config_properties() {
        let config = FolderConfig {
            special: Some(vec!["Archives".into()]),
            ..Default::default()
        };

        assert!(config.list_inbox());
        assert_eq!(["Archives".to_owned()], config.special());
        assert!(config.expanded().is_empty());
    }
}
