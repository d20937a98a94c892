//! # Message list module
//!
//! The [`MessageList`] turns the capabilities of the server and the
//! display options of the user into an ordered, paginated list of
//! [`MessageSummary`]. The ordering command is chosen by
//! [`RetrievalStrategy::select`]: when the server cannot order
//! messages the way the user wants, the ordering is reproduced on the
//! client side with [`Threader`] or [`Sorter`].
//!
//! The list is lazy: changing the search expression, the sort
//! program, the display mode or the page only marks the list stale.
//! The next read recomputes a new snapshot, which replaces the
//! previous one only if the whole computation succeeds.

pub mod config;
mod error;
pub mod paginator;
pub mod strategy;

use std::{collections::HashMap, fmt};

use tracing::{debug, info, instrument, warn};

#[doc(inline)]
pub use self::{
    config::MessageListConfig,
    error::{Error, Result},
    paginator::Paginator,
    strategy::RetrievalStrategy,
};
use crate::{
    flag::Flag,
    message::{Id, MessageSummary},
    sort::{SortProgram, Sorter},
    thread::{ThreadOrder, ThreadTree, Threader},
    transport::{FetchItem, ServerCapabilities, StoreOp, Transport, TransportSync},
};

/// The display mode of a message list.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum DisplayMode {
    /// Messages in mailbox order.
    Unsorted,

    /// Messages ordered by the sort program.
    #[default]
    Sorted,

    /// Messages grouped by conversation.
    Threaded,
}

/// The search expression, given as is to the SEARCH, SORT and THREAD
/// commands.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SearchExpression(String);

impl SearchExpression {
    pub fn new(expr: impl ToString) -> Self {
        let expr = expr.to_string();
        let expr = expr.trim();

        if expr.is_empty() {
            Self::default()
        } else {
            Self(expr.to_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` if the expression matches all messages.
    pub fn is_all(&self) -> bool {
        self.0.eq_ignore_ascii_case("ALL")
    }
}

impl Default for SearchExpression {
    fn default() -> Self {
        Self(String::from("ALL"))
    }
}

impl fmt::Display for SearchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What needs to be recomputed on the next read.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
enum Staleness {
    Fresh,
    /// Only the page window changed.
    Page,
    /// The ordered identifiers need to be retrieved again.
    #[default]
    Full,
}

/// The consistent state exposed by a message list.
#[derive(Clone, Debug, Default)]
struct Snapshot {
    /// All the identifiers matching the search, in display order.
    ordered: Vec<Id>,

    /// The identifiers of the current page with metadata available.
    page: Vec<Id>,

    messages: HashMap<Id, MessageSummary>,
    threads: Option<ThreadTree>,

    /// Whether `messages` holds metadata of all `ordered`.
    complete: bool,
}

/// The message list of a folder.
pub struct MessageList {
    transport: TransportSync,
    folder: String,
    capabilities: Option<ServerCapabilities>,
    charset: String,
    display: DisplayMode,
    sort_program: SortProgram,
    search: SearchExpression,
    paginator: Paginator,
    staleness: Staleness,
    snapshot: Snapshot,
}

impl MessageList {
    /// Build a stale message list for the given folder.
    ///
    /// Fails if the configured sort program is invalid.
    pub fn new(
        transport: TransportSync,
        folder: impl ToString,
        config: &MessageListConfig,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            folder: folder.to_string(),
            capabilities: None,
            charset: config.charset().to_owned(),
            display: config.display(),
            sort_program: config.sort_program().parse()?,
            search: SearchExpression::new(config.search()),
            paginator: Paginator::new(config.page_size()),
            staleness: Staleness::Full,
            snapshot: Snapshot::default(),
        })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn display(&self) -> DisplayMode {
        self.display
    }

    pub fn set_display(&mut self, display: DisplayMode) {
        if self.display != display {
            self.display = display;
            self.invalidate();
        }
    }

    pub fn sort_program(&self) -> &SortProgram {
        &self.sort_program
    }

    /// Parse then set the sort program.
    ///
    /// The program is validated before anything else: the list is
    /// left untouched when it is invalid.
    pub fn set_sort_program(&mut self, program: &str) -> Result<()> {
        let program = program.parse()?;
        if self.sort_program != program {
            self.sort_program = program;
            self.invalidate();
        }
        Ok(())
    }

    pub fn search(&self) -> &SearchExpression {
        &self.search
    }

    pub fn set_search(&mut self, expr: impl ToString) {
        let search = SearchExpression::new(expr);
        if self.search != search {
            self.search = search;
            self.invalidate();
        }
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Change the current page.
    ///
    /// The page is clamped to the pages available in the last
    /// snapshot. A list never read yet keeps the requested page, which
    /// gets clamped by the first refresh. Returns `true` if the page
    /// changed, in which case the list needs to be recomputed on the
    /// next read.
    pub fn set_page(&mut self, page: usize) -> bool {
        let changed = self.paginator.set_page(page);
        if changed {
            self.mark(Staleness::Page);
        }
        changed
    }

    /// Change the page size, a negative size meaning unbounded.
    pub fn set_per_page(&mut self, per_page: isize) -> bool {
        let changed = self.paginator.set_per_page(per_page);
        if changed {
            self.mark(Staleness::Page);
        }
        changed
    }

    /// Mark the list stale, so the ordered identifiers are retrieved
    /// again on the next read.
    pub fn invalidate(&mut self) {
        self.mark(Staleness::Full);
    }

    pub fn is_stale(&self) -> bool {
        self.staleness != Staleness::Fresh
    }

    fn mark(&mut self, staleness: Staleness) {
        self.staleness = self.staleness.max(staleness);
    }

    /// The capabilities of the server, detected once.
    pub async fn capabilities(&mut self) -> ServerCapabilities {
        if let Some(caps) = self.capabilities {
            return caps;
        }

        let caps = ServerCapabilities::detect(&**self.transport.lock().await);
        debug!("detected server capabilities: {caps:?}");
        self.capabilities = Some(caps);
        caps
    }

    /// The strategy the next refresh will use.
    pub async fn strategy(&mut self) -> RetrievalStrategy {
        let caps = self.capabilities().await;
        RetrievalStrategy::select(self.display, &caps)
    }

    /// Retrieve the ordered identifiers, then the metadata needed to
    /// display the current page.
    ///
    /// On error, the previous snapshot stays untouched and the list
    /// stays stale.
    #[instrument(skip_all, fields(folder = %self.folder))]
    pub async fn refresh(&mut self) -> Result<()> {
        info!("refreshing message list");

        let strategy = self.strategy().await;
        debug!("retrieval strategy: {strategy}");

        let sync = self.transport.clone();
        let mut transport = sync.lock().await;
        let transport: &mut dyn Transport = &mut **transport;

        let mut paginator = self.paginator.clone();
        let expr = self.search.as_str();
        let charset = self.charset.as_str();

        let snapshot = match strategy {
            RetrievalStrategy::ServerThread(algorithm) => {
                let threads = transport.thread(algorithm, charset, expr).await?;
                let ordered = threads.flatten();
                paginator.set_total(ordered.len());

                let ids = paginator.slice(&ordered).to_vec();
                let mut messages = fetch_summaries(transport, &ids).await?;
                threads.annotate(&mut messages);

                Snapshot {
                    page: page_ids(&ids, &messages),
                    ordered,
                    messages,
                    threads: Some(threads),
                    complete: strategy.is_client_ordered(),
                }
            }
            RetrievalStrategy::ServerSort | RetrievalStrategy::Search => {
                let ordered = if strategy == RetrievalStrategy::ServerSort {
                    transport.sort(&self.sort_program, charset, expr).await?
                } else {
                    transport.search(expr).await?
                };
                paginator.set_total(ordered.len());

                let ids = paginator.slice(&ordered).to_vec();
                let messages = fetch_summaries(transport, &ids).await?;

                Snapshot {
                    page: page_ids(&ids, &messages),
                    ordered,
                    messages,
                    threads: None,
                    complete: strategy.is_client_ordered(),
                }
            }
            RetrievalStrategy::ClientSort => {
                let mut ordered = transport.search(expr).await?;
                let messages = fetch_summaries(transport, &ordered).await?;

                Sorter::new(&self.sort_program).sort(&mut ordered, &messages);
                paginator.set_total(ordered.len());

                Snapshot {
                    page: page_ids(paginator.slice(&ordered), &messages),
                    ordered,
                    messages,
                    threads: None,
                    complete: strategy.is_client_ordered(),
                }
            }
            RetrievalStrategy::ClientThread => {
                let ids = transport.search(expr).await?;
                let mut messages = fetch_summaries(transport, &ids).await?;

                let order = ThreadOrder::from(&self.sort_program);
                let threads = Threader::new(order).thread(&ids, &messages);
                threads.annotate(&mut messages);

                let ordered = threads.flatten();
                paginator.set_total(ordered.len());

                Snapshot {
                    page: page_ids(paginator.slice(&ordered), &messages),
                    ordered,
                    messages,
                    threads: Some(threads),
                    complete: strategy.is_client_ordered(),
                }
            }
        };

        debug!(
            "{} messages, page {}/{}",
            snapshot.ordered.len(),
            paginator.page(),
            paginator.max_page(),
        );

        self.paginator = paginator;
        self.snapshot = snapshot;
        self.staleness = Staleness::Fresh;

        Ok(())
    }

    /// Recompute the current page without retrieving the ordered
    /// identifiers again.
    async fn refresh_page(&mut self) -> Result<()> {
        self.paginator.set_total(self.snapshot.ordered.len());
        let ids = self.paginator.slice(&self.snapshot.ordered).to_vec();
        debug!("page {} window: {:?}", self.paginator.page(), self.paginator.range());

        if self.snapshot.complete {
            self.snapshot.page = page_ids(&ids, &self.snapshot.messages);
            self.staleness = Staleness::Fresh;
            return Ok(());
        }

        let mut messages = {
            let mut transport = self.transport.lock().await;
            fetch_summaries(&mut **transport, &ids).await?
        };

        if let Some(threads) = &self.snapshot.threads {
            threads.annotate(&mut messages);
        }

        self.snapshot = Snapshot {
            page: page_ids(&ids, &messages),
            ordered: self.snapshot.ordered.clone(),
            messages,
            threads: self.snapshot.threads.clone(),
            complete: false,
        };
        self.staleness = Staleness::Fresh;

        Ok(())
    }

    async fn ensure_fresh(&mut self) -> Result<()> {
        match self.staleness {
            Staleness::Fresh => Ok(()),
            Staleness::Page => self.refresh_page().await,
            Staleness::Full => self.refresh().await,
        }
    }

    /// The messages of the current page, in display order.
    pub async fn page(&mut self) -> Result<Vec<&MessageSummary>> {
        self.ensure_fresh().await?;

        let snapshot = &self.snapshot;
        Ok(snapshot
            .page
            .iter()
            .filter_map(|id| snapshot.messages.get(id))
            .collect())
    }

    /// All the identifiers matching the search, in display order.
    pub async fn ids(&mut self) -> Result<&[Id]> {
        self.ensure_fresh().await?;
        Ok(&self.snapshot.ordered)
    }

    /// The thread tree of the last threaded snapshot.
    pub async fn threads(&mut self) -> Result<Option<&ThreadTree>> {
        self.ensure_fresh().await?;
        Ok(self.snapshot.threads.as_ref())
    }

    /// The number of messages matching the search.
    pub async fn total(&mut self) -> Result<usize> {
        self.ensure_fresh().await?;
        Ok(self.snapshot.ordered.len())
    }

    pub async fn has_messages(&mut self) -> Result<bool> {
        Ok(self.total().await? > 0)
    }

    /// Fetch a single message from the server.
    #[instrument(skip_all, fields(folder = %self.folder, id = id))]
    pub async fn message(&mut self, id: Id) -> Result<MessageSummary> {
        info!("fetching message");

        let mut transport = self.transport.lock().await;
        let fetched = transport
            .fetch(&[id], &FetchItem::SUMMARY)
            .await?
            .remove(&id)
            .ok_or(Error::MessageNotFoundError(id))?;

        Ok(MessageSummary::from_fetched(id, fetched)?)
    }

    /// Add flags to the given message.
    ///
    /// Fails with [`Error::MessageNotFoundError`] when the server
    /// expunged the message while storing flags, in which case the
    /// list needs to be refreshed before any further action.
    pub async fn set_message_flags(&mut self, id: Id, flags: &[Flag]) -> Result<()> {
        self.store_message_flags(id, StoreOp::Add { silent: false }, flags)
            .await
    }

    /// Remove flags from the given message.
    pub async fn reset_message_flags(&mut self, id: Id, flags: &[Flag]) -> Result<()> {
        self.store_message_flags(id, StoreOp::Remove { silent: false }, flags)
            .await
    }

    #[instrument(skip_all, fields(folder = %self.folder, id = id))]
    async fn store_message_flags(&mut self, id: Id, op: StoreOp, flags: &[Flag]) -> Result<()> {
        info!("storing {op} on message");

        let mut transport = self.transport.lock().await;
        let res = transport.store(&[id], op, flags).await?;

        // the snapshot is never patched in place
        self.staleness = Staleness::Full;

        if res.has_expunged() {
            debug!("server expunged messages {:?} while storing flags", res.expunged);

            let still_exists = transport
                .fetch(&[id], &[FetchItem::Uid])
                .await?
                .contains_key(&id);

            if !still_exists {
                return Err(Error::MessageNotFoundError(id));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for MessageList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageList")
            .field("folder", &self.folder)
            .field("display", &self.display)
            .field("sort_program", &self.sort_program)
            .field("search", &self.search)
            .field("paginator", &self.paginator)
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

/// Fetch summaries of the given messages.
///
/// Missing messages are silently dropped, malformed ones are logged
/// then dropped.
async fn fetch_summaries(
    transport: &mut dyn Transport,
    ids: &[Id],
) -> Result<HashMap<Id, MessageSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let fetched = transport.fetch(ids, &FetchItem::SUMMARY).await?;
    let mut messages = HashMap::with_capacity(fetched.len());

    for (id, fetched) in fetched {
        match MessageSummary::from_fetched(id, fetched) {
            Ok(msg) => {
                messages.insert(id, msg);
            }
            Err(err) => {
                warn!("skipping malformed message {id}: {err}");
                debug!("{err:?}");
            }
        }
    }

    if messages.len() < ids.len() {
        debug!("dropped {} messages without metadata", ids.len() - messages.len());
    }

    Ok(messages)
}

/// Keep the given identifiers that have metadata, in order.
fn page_ids(ids: &[Id], messages: &HashMap<Id, MessageSummary>) -> Vec<Id> {
    ids.iter()
        .copied()
        .filter(|id| messages.contains_key(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{SearchExpression, Staleness};

    #[test]
    fn search_expression_defaults_to_all() {
        assert!(SearchExpression::new("  ").is_all());
        assert!(SearchExpression::new("all").is_all());
        assert_eq!("UNSEEN", SearchExpression::new(" UNSEEN ").as_str());
    }

    #[test]
    fn staleness_only_grows() {
        assert!(Staleness::Full > Staleness::Page);
        assert!(Staleness::Page > Staleness::Fresh);
        assert_eq!(Staleness::Full, Staleness::Page.max(Staleness::Full));
    }
}
