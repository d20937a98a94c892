/// The folder configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct FolderConfig {
    /// Show the INBOX even if it is not subscribed.
    ///
    /// Defaults to `true`.
    pub list_inbox: Option<bool>,

    /// Paths of folders to mark as special, in addition to the
    /// well-known Sent, Drafts and Trash folders.
    ///
    /// Special folders are listed before the others.
    pub special: Option<Vec<String>>,

    /// Paths of folders to expand.
    pub expanded: Option<Vec<String>>,
}

impl FolderConfig {
    pub fn list_inbox(&self) -> bool {
        self.list_inbox.unwrap_or(true)
    }

    pub fn special(&self) -> &[String] {
        self.special.as_deref().unwrap_or_default()
    }

    pub fn expanded(&self) -> &[String] {
        self.expanded.as_deref().unwrap_or_default()
    }
}
