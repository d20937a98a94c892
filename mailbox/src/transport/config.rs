/// The transport configuration.
///
/// It is given to transports at construction time, so they know how
/// verbose they should be.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct TransportConfig {
    /// Log every command sent to the server.
    ///
    /// Defaults to `false`.
    pub log_commands: Option<bool>,

    /// Log a summary of every response received from the server.
    ///
    /// Defaults to `false`.
    pub log_responses: Option<bool>,
}

impl TransportConfig {
    pub fn log_commands(&self) -> bool {
        self.log_commands.unwrap_or_default()
    }

    pub fn log_responses(&self) -> bool {
        self.log_responses.unwrap_or_default()
    }
}
