//! Novel site scrapers.

pub mod batch;
pub mod browser;
pub mod cache;
pub mod config;
pub mod decoder;
pub mod extract;
pub mod http_client;
pub mod limiter;
pub mod page;
pub mod registry;
pub mod source;

pub use batch::BatchOrchestrator;
pub use browser::{BrowserEngineConfig, BrowserPageAccess, BrowserSession, SessionStatus};
pub use cache::{CacheStats, ContentCache};
pub use config::ScraperOptions;
pub use decoder::{DecoderTable, SearchRoute, SiteDecoder};
pub use http_client::RetryingFetcher;
pub use limiter::ConcurrencyLimiter;
pub use page::{PageAccess, PageHandle, StaticPageAccess};
pub use registry::{SourceInfo, SourceRegistry};
pub use source::Source;
