use crate::transport::{SelectResponse, StatusResponse};

/// The cached status of a folder.
///
/// Counters are `None` when the server did not announce them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FolderStatus {
    pub messages: Option<u32>,
    pub recent: Option<u32>,
    pub unseen: Option<u32>,
    pub uid_next: Option<u32>,
    pub uid_validity: Option<u32>,
}

impl FolderStatus {
    /// The number of messages, 0 if unknown.
    pub fn total(&self) -> u32 {
        self.messages.unwrap_or_default()
    }

    /// Reconcile the status with the untagged data of a SELECT
    /// response.
    ///
    /// Counters announced by SELECT may differ from the ones returned
    /// by a former STATUS, the freshest ones win.
    pub fn merge_select(&mut self, res: &SelectResponse) {
        self.messages = Some(res.exists);

        if res.recent.is_some() {
            self.recent = res.recent;
        }
        if res.unseen.is_some() {
            self.unseen = res.unseen;
        }
        if res.uid_next.is_some() {
            self.uid_next = res.uid_next;
        }
        if res.uid_validity.is_some() {
            self.uid_validity = res.uid_validity;
        }
    }
}

impl From<StatusResponse> for FolderStatus {
    fn from(res: StatusResponse) -> Self {
        Self {
            messages: res.messages,
            recent: res.recent,
            unseen: res.unseen,
            uid_next: res.uid_next,
            uid_validity: res.uid_validity,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::transport::SelectResponse;

    use super::FolderStatus;

    #[test]
    fn merge_select_keeps_unannounced_counters() {
        let mut status = FolderStatus {
            messages: Some(3),
            unseen: Some(2),
            uid_validity: Some(7),
            ..Default::default()
        };

        status.merge_select(&SelectResponse {
            exists: 4,
            recent: Some(1),
            ..Default::default()
        });

        assert_eq!(Some(4), status.messages);
        assert_eq!(Some(1), status.recent);
        assert_eq!(Some(2), status.unseen);
        assert_eq!(Some(7), status.uid_validity);
        assert_eq!(None, status.uid_next);
    }
}
