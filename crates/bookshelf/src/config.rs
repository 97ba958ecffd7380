//! Configuration constants for bookshelf

/// Application metadata
pub mod app {
    /// Application name (used for config and data directories)
    pub const NAME: &str = "bookshelf";
}

/// Provider-related configuration
pub mod providers {
    /// Default Google Books API base URL
    pub const GOOGLE_BOOKS_DEFAULT_SERVER: &str = "https://www.googleapis.com/books/v1";
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("Bookshelf/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds
    pub const READ_TIMEOUT_SECS: u64 = 30;
}

/// Persistence configuration
pub mod storage {
    /// Storage key holding the favorites collection
    pub const FAVORITES_KEY: &str = "favoritos";

    /// Settings file name (in the config directory)
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Log file name used while the terminal UI owns the screen
    pub const LOG_FILE: &str = "bookshelf.log";
}

/// Controller configuration
pub mod controller {
    /// Capacity of the command channel
    pub const COMMAND_CHANNEL_CAPACITY: usize = 64;
}
