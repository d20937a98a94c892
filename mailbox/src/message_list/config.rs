use super::{paginator::DEFAULT_PER_PAGE, DisplayMode};

/// The message list configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct MessageListConfig {
    /// The number of messages per page.
    ///
    /// A negative value shows all messages in a single page. Defaults
    /// to 50.
    pub page_size: Option<isize>,

    /// The sort program, for example `"SUBJECT -DATE"`.
    ///
    /// Defaults to `"-DATE"`.
    pub sort_program: Option<String>,

    /// The display mode.
    ///
    /// Defaults to sorted.
    pub display: Option<DisplayMode>,

    /// The search expression.
    ///
    /// Defaults to `"ALL"`.
    pub search: Option<String>,

    /// The charset given to SORT and THREAD commands.
    ///
    /// Defaults to `"utf-8"`.
    pub charset: Option<String>,
}

impl MessageListConfig {
    pub fn page_size(&self) -> isize {
        self.page_size.unwrap_or(DEFAULT_PER_PAGE as isize)
    }

    pub fn sort_program(&self) -> &str {
        self.sort_program.as_deref().unwrap_or("-DATE")
    }

    pub fn display(&self) -> DisplayMode {
        self.display.unwrap_or_default()
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or("ALL")
    }

    pub fn charset(&self) -> &str {
        self.charset.as_deref().unwrap_or("utf-8")
    }
}
