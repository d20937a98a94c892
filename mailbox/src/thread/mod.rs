//! # Thread module
//!
//! This module contains the nested thread structure returned by the
//! THREAD command ([`ThreadTree`]), as well as [`Threader`], the
//! client-side implementation of the REFERENCES threading algorithm
//! described in [RFC 5256], used when the server lacks the THREAD
//! capability.
//!
//! A thread tree is a list of items, each of them being either a
//! message or a nested list (a branch). A message followed by other
//! items in the same list is the parent of the next message, while
//! nested lists start sibling branches. For example, the tree
//! `2 (3 6 (4 23) (44 7 96))` reads as:
//!
//! ```text
//! 2
//! 3
//! \-- 6
//!     |-- 4
//!     |   \-- 23
//!     \-- 44
//!         \-- 7
//!             \-- 96
//! ```
//!
//! [RFC 5256]: https://www.rfc-editor.org/rfc/rfc5256

use std::{
    collections::{HashMap, HashSet},
    mem,
};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    message::{envelope::normalize_message_id, Id, MessageSummary},
    sort::SortProgram,
};

/// The thread item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ThreadItem {
    /// A message, parent of the next message of the same list.
    Message(Id),

    /// A nested list, starting a new branch.
    Branch(Vec<ThreadItem>),
}

/// The position of a message in a thread tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThreadPosition {
    pub id: Id,

    /// The depth of the message in its thread, starting at 0.
    pub depth: usize,

    /// The parent message, if any.
    pub parent: Option<Id>,
}

/// The nested thread structure.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ThreadTree(Vec<ThreadItem>);

impl ThreadTree {
    pub fn new(items: Vec<ThreadItem>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[ThreadItem] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten the tree into the list of its message identifiers, in
    /// display order.
    pub fn flatten(&self) -> Vec<Id> {
        fn walk(items: &[ThreadItem], ids: &mut Vec<Id>) {
            for item in items {
                match item {
                    ThreadItem::Message(id) => ids.push(*id),
                    ThreadItem::Branch(items) => walk(items, ids),
                }
            }
        }

        let mut ids = Vec::new();
        walk(&self.0, &mut ids);
        ids
    }

    /// Compute the position of every message of the tree, in display
    /// order.
    pub fn positions(&self) -> Vec<ThreadPosition> {
        fn walk(
            items: &[ThreadItem],
            mut depth: usize,
            mut parent: Option<Id>,
            positions: &mut Vec<ThreadPosition>,
        ) {
            for item in items {
                match item {
                    ThreadItem::Message(id) => {
                        positions.push(ThreadPosition {
                            id: *id,
                            depth,
                            parent,
                        });
                        depth += 1;
                        parent = Some(*id);
                    }
                    ThreadItem::Branch(items) => walk(items, depth, parent, positions),
                }
            }
        }

        let mut positions = Vec::new();
        walk(&self.0, 0, None, &mut positions);
        positions
    }

    /// Set depth, parent and children of the given messages according
    /// to their position in the tree.
    ///
    /// Messages of the tree missing from the map are ignored.
    pub fn annotate(&self, messages: &mut HashMap<Id, MessageSummary>) {
        for pos in self.positions() {
            if !messages.contains_key(&pos.id) {
                continue;
            }

            if pos.depth > 0 {
                if let Some(parent) = pos.parent.and_then(|id| messages.get_mut(&id)) {
                    if !parent.children.contains(&pos.id) {
                        parent.children.push(pos.id);
                    }
                }
            }

            if let Some(msg) = messages.get_mut(&pos.id) {
                msg.depth = pos.depth;
                msg.parent = if pos.depth > 0 { pos.parent } else { None };
            }
        }
    }
}

impl From<Vec<ThreadItem>> for ThreadTree {
    fn from(items: Vec<ThreadItem>) -> Self {
        Self(items)
    }
}

/// The order threads and their messages are sorted by.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ThreadOrder {
    /// Oldest messages first.
    #[default]
    Ascending,

    /// Most recent messages first.
    Descending,
}

impl From<&SortProgram> for ThreadOrder {
    fn from(program: &SortProgram) -> Self {
        if program.reverse_date() {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ThreadNode {
    /// The message identifier, `None` for dummy nodes.
    id: Option<Id>,
    parent: Option<String>,
    children: Vec<String>,
    date: Option<DateTime<FixedOffset>>,
}

impl ThreadNode {
    fn is_dummy(&self) -> bool {
        self.id.is_none()
    }
}

/// The client-side threader.
///
/// Nodes live in an arena keyed by normalized message identifier.
/// The arena is rebuilt on every pass and discarded once the tree is
/// flattened.
#[derive(Debug, Default)]
pub struct Threader {
    order: ThreadOrder,
    nodes: IndexMap<String, ThreadNode>,
    root: Vec<String>,
}

impl Threader {
    pub fn new(order: ThreadOrder) -> Self {
        Self {
            order,
            ..Default::default()
        }
    }

    /// Thread the given messages.
    ///
    /// Messages are collected by ascending identifier. Ids without
    /// metadata in the given map are ignored.
    pub fn thread(mut self, ids: &[Id], messages: &HashMap<Id, MessageSummary>) -> ThreadTree {
        let refs = self.collect(ids, messages);
        self.link(refs);
        self.collect_root();
        self.prune();
        self.sort();

        let tree = self.flatten();
        debug!("built {} threads out of {} messages", tree.0.len(), ids.len());
        tree
    }

    fn collect(
        &mut self,
        ids: &[Id],
        messages: &HashMap<Id, MessageSummary>,
    ) -> Vec<(String, Vec<String>)> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut seen = HashSet::new();
        let mut refs = Vec::with_capacity(ids.len());

        for msg in ids.iter().filter_map(|id| messages.get(id)) {
            let message_id = msg
                .envelope
                .message_id
                .as_deref()
                .map(normalize_message_id)
                .unwrap_or_default();

            let key = if message_id.is_empty() || seen.contains(&message_id) {
                let key = format!("{}+{message_id}", Uuid::new_v4());
                trace!("message {} gets synthetic key {key}", msg.id);
                key
            } else {
                message_id
            };

            seen.insert(key.clone());

            self.nodes.insert(
                key.clone(),
                ThreadNode {
                    id: Some(msg.id),
                    date: msg.envelope.date,
                    ..Default::default()
                },
            );

            let msg_refs = msg
                .thread_references()
                .into_iter()
                .map(normalize_message_id)
                .filter(|r| !r.is_empty())
                .collect();

            refs.push((key, msg_refs));
        }

        refs
    }

    fn link(&mut self, refs: Vec<(String, Vec<String>)>) {
        for (key, refs) in refs {
            for r in &refs {
                self.nodes.entry(r.clone()).or_default();
            }

            for pair in refs.windows(2) {
                let (parent, child) = (&pair[0], &pair[1]);
                let orphan = self.nodes.get(child).is_some_and(|n| n.parent.is_none());

                if orphan && !self.would_loop(parent, child) {
                    self.attach(parent, child);
                }
            }

            self.detach(&key);

            if let Some(last) = refs.last() {
                if self.would_loop(last, &key) {
                    trace!("skip link {last} -> {key}: it would introduce a loop");
                } else {
                    self.attach(last, &key);
                }
            }
        }
    }

    /// Return `true` if making `parent` the parent of `child` would
    /// introduce a loop, that is if `child` is `parent` itself or one
    /// of its ancestors.
    fn would_loop(&self, parent: &str, child: &str) -> bool {
        let mut cursor = Some(parent);
        let mut steps = 0;

        while let Some(key) = cursor {
            if key == child || steps > self.nodes.len() {
                return true;
            }
            cursor = self.nodes.get(key).and_then(|n| n.parent.as_deref());
            steps += 1;
        }

        false
    }

    fn attach(&mut self, parent: &str, child: &str) {
        if let Some(node) = self.nodes.get_mut(parent) {
            if !node.children.iter().any(|c| c == child) {
                node.children.push(child.to_owned());
            }
        }

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent.to_owned());
        }
    }

    fn detach(&mut self, child: &str) {
        let parent = self.nodes.get_mut(child).and_then(|n| n.parent.take());

        if let Some(node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            node.children.retain(|c| c != child);
        }
    }

    fn collect_root(&mut self) {
        self.root = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(key, _)| key.clone())
            .collect();
    }

    fn prune(&mut self) {
        let root = mem::take(&mut self.root);
        self.root = self.prune_children(None, root);
    }

    /// Prune dummy nodes among the given children of the given parent
    /// (`None` stands for the root), in post-order.
    fn prune_children(&mut self, parent: Option<&str>, children: Vec<String>) -> Vec<String> {
        let mut pruned = Vec::with_capacity(children.len());

        for key in children {
            let grandchildren = match self.nodes.get_mut(&key) {
                Some(node) => mem::take(&mut node.children),
                None => continue,
            };
            let grandchildren = self.prune_children(Some(&key), grandchildren);

            let Some(node) = self.nodes.get_mut(&key) else {
                continue;
            };

            if !node.is_dummy() {
                node.children = grandchildren;
                pruned.push(key);
                continue;
            }

            if grandchildren.is_empty() {
                trace!("delete childless dummy {key}");
                self.nodes.shift_remove(&key);
                continue;
            }

            if parent.is_some() || grandchildren.len() == 1 {
                trace!("splice {} children of dummy {key}", grandchildren.len());
                for child in &grandchildren {
                    if let Some(node) = self.nodes.get_mut(child) {
                        node.parent = parent.map(ToOwned::to_owned);
                    }
                }
                self.nodes.shift_remove(&key);
                pruned.extend(grandchildren);
            } else {
                node.children = grandchildren;
                pruned.push(key);
            }
        }

        pruned
    }

    fn sort(&mut self) {
        let mut root = mem::take(&mut self.root);
        self.sort_children(&mut root);
        self.root = root;
    }

    fn sort_children(&mut self, children: &mut Vec<String>) {
        let mut keyed = mem::take(children)
            .into_iter()
            .map(|key| (self.sort_key(&key), key))
            .collect::<Vec<_>>();

        match self.order {
            ThreadOrder::Ascending => keyed.sort_by(|(a, _), (b, _)| a.cmp(b)),
            ThreadOrder::Descending => keyed.sort_by(|(a, _), (b, _)| b.cmp(a)),
        }

        *children = keyed.into_iter().map(|(_, key)| key).collect();
    }

    /// Sort the children of the given node, then return the date the
    /// node is sorted by among its siblings.
    ///
    /// A dummy node is sorted by the earliest date of its children.
    fn sort_key(&mut self, key: &str) -> Option<DateTime<FixedOffset>> {
        let mut children = match self.nodes.get_mut(key) {
            Some(node) => mem::take(&mut node.children),
            None => return None,
        };

        self.sort_children(&mut children);

        let earliest = children
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .filter_map(|child| child.date)
            .min();

        let node = self.nodes.get_mut(key)?;
        node.children = children;

        if node.is_dummy() {
            node.date = earliest;
        }

        node.date
    }

    fn flatten(&self) -> ThreadTree {
        match self.root.as_slice() {
            [key] => ThreadTree(self.flatten_node(key)),
            keys => ThreadTree(
                keys.iter()
                    .map(|key| ThreadItem::Branch(self.flatten_node(key)))
                    .collect(),
            ),
        }
    }

    fn flatten_node(&self, key: &str) -> Vec<ThreadItem> {
        let Some(node) = self.nodes.get(key) else {
            return Vec::new();
        };

        let mut items = Vec::new();

        if let Some(id) = node.id {
            items.push(ThreadItem::Message(id));
        }

        match node.children.as_slice() {
            [child] => items.extend(self.flatten_node(child)),
            children => {
                for child in children {
                    items.push(ThreadItem::Branch(self.flatten_node(child)));
                }
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{FixedOffset, TimeZone};

    use crate::message::{Envelope, Id, MessageSummary};

    use super::{
        ThreadItem::{Branch, Message},
        ThreadOrder, ThreadPosition, ThreadTree, Threader,
    };

    fn msg(id: Id, message_id: &str, refs: &[&str], ts: i64) -> (Id, MessageSummary) {
        let msg = MessageSummary {
            id,
            envelope: Envelope {
                message_id: Some(message_id.into()),
                date: FixedOffset::east_opt(0).and_then(|tz| tz.timestamp_opt(ts, 0).single()),
                ..Default::default()
            },
            references: refs.iter().map(ToString::to_string).collect(),
            ..Default::default()
        };
        (id, msg)
    }

    fn thread(order: ThreadOrder, msgs: Vec<(Id, MessageSummary)>) -> ThreadTree {
        let ids: Vec<_> = msgs.iter().map(|(id, _)| *id).collect();
        let messages: HashMap<_, _> = msgs.into_iter().collect();
        Threader::new(order).thread(&ids, &messages)
    }

    #[test]
    fn positions_of_nested_tree() {
        // 2 (3 6 (4 23) (44 7 96))
        let tree = ThreadTree::new(vec![
            Branch(vec![Message(2)]),
            Branch(vec![
                Message(3),
                Message(6),
                Branch(vec![Message(4), Message(23)]),
                Branch(vec![Message(44), Message(7), Message(96)]),
            ]),
        ]);

        assert_eq!(vec![2, 3, 6, 4, 23, 44, 7, 96], tree.flatten());

        let positions = tree.positions();
        let pos = |id| {
            positions
                .iter()
                .find(|p: &&ThreadPosition| p.id == id)
                .map(|p| (p.depth, p.parent))
        };

        assert_eq!(Some((0, None)), pos(2));
        assert_eq!(Some((0, None)), pos(3));
        assert_eq!(Some((3, Some(4))), pos(23));
        assert_eq!(Some((2, Some(6))), pos(44));
        assert_eq!(Some((4, Some(7))), pos(96));
    }

    #[test]
    fn annotate_messages() {
        let tree = ThreadTree::new(vec![
            Message(1),
            Branch(vec![Message(2)]),
            Branch(vec![Message(3)]),
        ]);
        let mut messages: HashMap<_, _> = [
            msg(1, "a@x", &[], 1),
            msg(2, "b@x", &[], 2),
            msg(3, "c@x", &[], 3),
        ]
        .into_iter()
        .collect();

        tree.annotate(&mut messages);

        assert_eq!(vec![2, 3], messages[&1].children);
        assert_eq!(Some(1), messages[&3].parent);
        assert_eq!(1, messages[&3].depth);
        assert_eq!(None, messages[&1].parent);
    }

    #[test]
    fn thread_simple_chain() {
        let tree = thread(
            ThreadOrder::Ascending,
            vec![
                msg(3, "<c@x>", &["<a@x>", "<b@x>"], 3),
                msg(1, "<a@x>", &[], 1),
                msg(2, "<b@x>", &["<a@x>"], 2),
            ],
        );

        assert_eq!(ThreadTree::new(vec![Message(1), Message(2), Message(3)]), tree);
    }

    #[test]
    fn thread_disconnected_messages() {
        let tree = thread(
            ThreadOrder::Ascending,
            vec![
                msg(1, "a@x", &[], 20),
                msg(2, "b@x", &[], 10),
                msg(3, "c@x", &[], 30),
            ],
        );

        assert_eq!(
            ThreadTree::new(vec![
                Branch(vec![Message(2)]),
                Branch(vec![Message(1)]),
                Branch(vec![Message(3)]),
            ]),
            tree
        );

        let tree = thread(
            ThreadOrder::Descending,
            vec![
                msg(1, "a@x", &[], 20),
                msg(2, "b@x", &[], 10),
                msg(3, "c@x", &[], 30),
            ],
        );

        assert_eq!(vec![3, 1, 2], tree.flatten());
    }

    #[test]
    fn keep_duplicate_message_ids() {
        let tree = thread(
            ThreadOrder::Ascending,
            vec![msg(1, "<same@x>", &[], 1), msg(2, "<\"same\"@x>", &[], 2)],
        );

        let mut ids = tree.flatten();
        ids.sort();
        assert_eq!(vec![1, 2], ids);
    }

    #[test]
    fn survive_reference_cycles() {
        // a claims to follow b, b claims to follow a
        let tree = thread(
            ThreadOrder::Ascending,
            vec![
                msg(1, "a@x", &["b@x"], 1),
                msg(2, "b@x", &["a@x"], 2),
                msg(3, "c@x", &["a@x", "b@x", "a@x"], 3),
            ],
        );

        let mut ids = tree.flatten();
        ids.sort();
        assert_eq!(vec![1, 2, 3], ids);
        assert!(tree.positions().iter().all(|p| p.depth < 3));
    }

    #[test]
    fn sort_dummy_by_earliest_known_date() {
        // a and b reply to the missing message m, a has no date
        let (id, mut undated) = msg(1, "a@x", &["m@x"], 0);
        undated.envelope.date = None;

        let tree = thread(
            ThreadOrder::Ascending,
            vec![
                (id, undated),
                msg(2, "b@x", &["m@x"], 5),
                msg(3, "c@x", &[], 3),
            ],
        );

        assert_eq!(
            ThreadTree::new(vec![
                Branch(vec![Message(3)]),
                Branch(vec![Branch(vec![Message(1)]), Branch(vec![Message(2)])]),
            ]),
            tree
        );
    }

    #[test]
    fn prune_dummies() {
        // a and b both reply to the missing message m, c replies to a
        // message n missing as well
        let tree = thread(
            ThreadOrder::Ascending,
            vec![
                msg(1, "a@x", &["m@x"], 1),
                msg(2, "b@x", &["m@x"], 2),
                msg(3, "c@x", &["n@x"], 3),
            ],
        );

        // the dummy m is kept since it would flood the root with two
        // children, while the dummy n is spliced
        assert_eq!(
            ThreadTree::new(vec![
                Branch(vec![Branch(vec![Message(1)]), Branch(vec![Message(2)])]),
                Branch(vec![Message(3)]),
            ]),
            tree
        );
    }

    #[test]
    fn splice_dummy_under_real_message() {
        // b replies to a through the missing message m
        let tree = thread(
            ThreadOrder::Ascending,
            vec![msg(1, "a@x", &[], 1), msg(2, "b@x", &["a@x", "m@x"], 2)],
        );

        assert_eq!(ThreadTree::new(vec![Message(1), Message(2)]), tree);
    }

    #[test]
    fn fall_back_to_in_reply_to() {
        let (id, mut reply) = msg(2, "b@x", &[], 2);
        reply.envelope.in_reply_to = Some("<a@x>".into());

        let tree = thread(ThreadOrder::Ascending, vec![msg(1, "a@x", &[], 1), (id, reply)]);

        assert_eq!(ThreadTree::new(vec![Message(1), Message(2)]), tree);
    }
}
