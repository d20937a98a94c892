//! Module dedicated to message list pagination.

use std::ops::Range;

/// The default number of messages per page.
pub const DEFAULT_PER_PAGE: usize = 50;

/// The paginator.
///
/// Tracks the page window over an ordered sequence of message
/// identifiers. Pages are 1-based. Once the total is known, the
/// current page is always clamped to `[1, max_page]`. Before that,
/// the requested page is kept as is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Paginator {
    /// The number of messages per page, `None` meaning unbounded
    /// (everything fits in a single page).
    per_page: Option<usize>,
    page: usize,
    total: Option<usize>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            per_page: Some(DEFAULT_PER_PAGE),
            page: 1,
            total: None,
        }
    }
}

impl Paginator {
    /// Build a paginator from a raw page size, where a negative or
    /// null size means unbounded.
    pub fn new(per_page: isize) -> Self {
        Self {
            per_page: per_page_from_isize(per_page),
            ..Default::default()
        }
    }

    pub fn unbounded() -> Self {
        Self::new(-1)
    }

    pub fn per_page(&self) -> Option<usize> {
        self.per_page
    }

    /// Change the page size, then clamp the current page.
    ///
    /// Returns `true` if the visible window changed.
    pub fn set_per_page(&mut self, per_page: isize) -> bool {
        let per_page = per_page_from_isize(per_page);

        if per_page == self.per_page {
            return false;
        }

        self.per_page = per_page;
        self.page = self.clamp(self.page);
        true
    }

    pub fn total(&self) -> usize {
        self.total.unwrap_or_default()
    }

    /// Return `true` once a total has been set.
    pub fn has_total(&self) -> bool {
        self.total.is_some()
    }

    /// Change the total number of items, then clamp the current
    /// page.
    pub fn set_total(&mut self, total: usize) {
        self.total = Some(total);
        self.page = self.clamp(self.page);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Change the current page, clamped to `[1, max_page]` when the
    /// total is known.
    ///
    /// Returns `true` if the clamped page differs from the previous
    /// one.
    pub fn set_page(&mut self, page: usize) -> bool {
        let page = self.clamp(page);
        let changed = page != self.page;
        self.page = page;
        changed
    }

    pub fn max_page(&self) -> usize {
        match self.per_page {
            Some(per_page) => self.total().div_ceil(per_page).max(1),
            None => 1,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.max_page()
    }

    /// The next page, wrapping to the first one.
    pub fn next(&self) -> usize {
        if self.has_next() {
            self.page + 1
        } else {
            1
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// The previous page, wrapping to the last one.
    pub fn previous(&self) -> usize {
        if self.has_previous() {
            self.page - 1
        } else {
            self.max_page()
        }
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    pub fn is_last(&self) -> bool {
        self.page == self.max_page()
    }

    pub fn last(&self) -> usize {
        self.max_page()
    }

    /// The range of the current page within the total.
    pub fn range(&self) -> Range<usize> {
        match self.per_page {
            Some(per_page) => {
                let start = ((self.page - 1) * per_page).min(self.total());
                let end = (start + per_page).min(self.total());
                start..end
            }
            None => 0..self.total(),
        }
    }

    /// The items of the current page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let start = range.start.min(items.len());
        let end = range.end.min(items.len());
        &items[start..end]
    }

    fn clamp(&self, page: usize) -> usize {
        if self.has_total() {
            page.clamp(1, self.max_page())
        } else {
            page.max(1)
        }
    }
}

fn per_page_from_isize(per_page: isize) -> Option<usize> {
    usize::try_from(per_page).ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::Paginator;

    #[test]
    fn unbounded() {
        let mut p = Paginator::new(-1);
        p.set_total(1000);

        assert_eq!(None, p.per_page());
        assert_eq!(1, p.max_page());
        assert!(!p.set_page(7));
        assert_eq!(1, p.page());
        assert_eq!(0..1000, p.range());
    }

    #[test]
    fn clamp_page() {
        let mut p = Paginator::new(50);
        p.set_total(101);

        assert_eq!(3, p.max_page());
        assert!(p.set_page(4));
        assert_eq!(3, p.page());
        assert!(!p.set_page(4));
        assert!(!p.set_page(3));
        assert!(p.set_page(0));
        assert_eq!(1, p.page());
    }

    #[test]
    fn keep_page_until_total_is_known() {
        let mut p = Paginator::new(2);

        assert!(!p.has_total());
        assert!(p.set_page(2));
        assert_eq!(2, p.page());

        p.set_total(5);
        assert_eq!(2, p.page());
        assert_eq!(2..4, p.range());

        let mut p = Paginator::new(2);
        p.set_page(9);
        p.set_total(5);
        assert_eq!(3, p.page());
    }

    #[test]
    fn empty_list_has_one_page() {
        let p = Paginator::default();

        assert_eq!(1, p.max_page());
        assert!(p.is_first());
        assert!(p.is_last());
        assert_eq!(0..0, p.range());
    }

    #[test]
    fn navigate() {
        let mut p = Paginator::new(2);
        p.set_total(5);

        assert_eq!(3, p.last());
        assert!(p.has_next());
        assert!(!p.has_previous());
        assert_eq!(2, p.next());
        assert_eq!(3, p.previous());

        p.set_page(3);
        assert!(p.is_last());
        assert_eq!(1, p.next());
        assert_eq!(2, p.previous());
        assert_eq!(&[5], p.slice(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn shrink_total_clamps_page() {
        let mut p = Paginator::new(10);
        p.set_total(35);
        p.set_page(4);

        p.set_total(12);
        assert_eq!(2, p.page());
        assert_eq!(10..12, p.range());
    }

    #[test]
    fn change_page_size() {
        let mut p = Paginator::new(10);
        p.set_total(35);
        p.set_page(4);

        assert!(p.set_per_page(20));
        assert_eq!(2, p.page());
        assert!(!p.set_per_page(20));
        assert!(p.set_per_page(0));
        assert_eq!(None, p.per_page());
        assert_eq!(1, p.page());
    }
}
