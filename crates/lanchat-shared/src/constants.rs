/// Application name
pub const APP_NAME: &str = "LanChat";

/// Messages requested per history page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Per-attempt timeout for a backend command, in milliseconds
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

/// Extra attempts after the first failed one
pub const DEFAULT_COMMAND_RETRIES: u32 = 0;

/// Base delay of the exponential backoff, in milliseconds
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 300;

/// Buffered view events per subscriber before lagging ones drop events
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Text body used when a file is announced as a plain chat message
pub const FILE_MESSAGE_PREFIX: &str = "[File]";
