//! Connection configuration types.

/// Default LIST pattern: every mailbox at every level.
pub const DEFAULT_LIST_PATTERN: &str = "*";

/// Default marker ending the namespace part of a fully-qualified name.
pub const DEFAULT_NAMESPACE_DELIMITER: char = '}';

/// Connection security mode, as rendered into a server namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Security {
    /// No encryption (port 143). **Not recommended for production.**
    None,
    /// Start with plaintext, upgrade with STARTTLS (port 143).
    StartTls,
    /// TLS from the start (port 993). **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Implicit => 993,
        }
    }

    const fn namespace_flag(self) -> &'static str {
        match self {
            Self::None => "/notls",
            Self::StartTls => "/tls",
            Self::Implicit => "/ssl",
        }
    }
}

/// Mailbox directory configuration for a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionConfig {
    /// Prefix prepended to every short mailbox name, e.g. `{imap.example.com}`.
    pub namespace: String,
    /// Marker after which a fully-qualified name holds the short name.
    pub namespace_delimiter: char,
    /// Pattern used when listing mailboxes.
    pub list_pattern: String,
}

impl ConnectionConfig {
    /// Creates a configuration for the given namespace prefix.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            namespace_delimiter: DEFAULT_NAMESPACE_DELIMITER,
            list_pattern: DEFAULT_LIST_PATTERN.to_string(),
        }
    }

    /// Creates a configuration whose namespace addresses a server, as in
    /// `{imap.example.com:993/imap/ssl}`.
    ///
    /// Without a port the default port of `security` is used.
    #[must_use]
    pub fn for_server(host: &str, port: Option<u16>, security: Security) -> Self {
        let port = port.unwrap_or(security.default_port());
        Self::new(server_namespace(host, port, security))
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(namespace: impl Into<String>) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new(namespace)
    }
}

/// Renders the namespace token for a server.
#[must_use]
pub fn server_namespace(host: &str, port: u16, security: Security) -> String {
    format!("{{{host}:{port}/imap{}}}", security.namespace_flag())
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    namespace: String,
    namespace_delimiter: char,
    list_pattern: String,
}

impl ConnectionConfigBuilder {
    /// Creates a new builder with the given namespace prefix.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            namespace_delimiter: DEFAULT_NAMESPACE_DELIMITER,
            list_pattern: DEFAULT_LIST_PATTERN.to_string(),
        }
    }

    /// Sets the namespace delimiter.
    #[must_use]
    pub const fn namespace_delimiter(mut self, delimiter: char) -> Self {
        self.namespace_delimiter = delimiter;
        self
    }

    /// Sets the LIST pattern.
    #[must_use]
    pub fn list_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.list_pattern = pattern.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ConnectionConfig {
        ConnectionConfig {
            namespace: self.namespace,
            namespace_delimiter: self.namespace_delimiter,
            list_pattern: self.list_pattern,
        }
    }
}
