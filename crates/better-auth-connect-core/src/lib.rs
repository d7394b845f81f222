#![doc = include_str!("../README.md")]

pub mod account;
pub mod cache;
pub mod devto;
pub mod env;
pub mod error;
pub mod expiry;
pub mod options;
pub mod permission;
pub mod platform;
pub mod schema;

// Re-exports for convenience
pub use account::{mask_access_token, mask_refresh_token, Account, TokenInfo, MASKED_SECRET, PRESENT_SECRET};
pub use cache::{
    is_cache_valid, AccountCache, AccountCacheStore, CachedAccountSet, FileCacheStore,
    MemoryCacheStore, ACCOUNT_CACHE_TTL,
};
pub use devto::{AddedAccount, DevToProfile};
pub use error::{CacheError, ConnectError, ErrorCode};
pub use expiry::{is_expired, is_expiring_soon, time_remaining, token_status, TokenStatus, DEFAULT_EXPIRY_WARNING_HOURS};
pub use options::ConnectOptions;
pub use permission::{Permission, PermissionSelection};
pub use platform::{AuthType, Platform, PlatformConfig, UnknownPlatform};
