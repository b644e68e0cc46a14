//! Feedpost engine: feed polling, article extraction, platform session and
//! the background publish loop.
mod bridge;
mod control_loop;
mod decode;
mod engine;
mod extract;
mod feed;
mod fetch;
mod persist;
mod platform;
mod publisher;
mod session;
mod source;
mod store;
mod types;

pub use bridge::{BridgeSettings, HttpPlatformClient};
pub use control_loop::{
    ControlLoop, CycleError, CycleOutcome, LoopConfig, LoopDeps, LoopExit, StopSignal,
};
pub use decode::decode_page;
pub use engine::{EngineConfig, EngineError, EngineHandle, StartOutcome, StartRequest};
pub use extract::{clean_text, ArticleExtractor, ExtractSettings, HtmlArticleExtractor};
pub use feed::{parse_latest_entry, FeedError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use persist::{ensure_dir, remove_if_exists, write_atomic, PersistError};
pub use platform::{PlatformClient, PlatformError, PlatformFailure};
pub use publisher::{is_token_invalidation, PublishError, Publisher};
pub use session::{AuthError, SessionManager};
pub use source::{ContentSource, SourceError, WebContentSource};
pub use store::{StateStore, StoreError, StorePaths, UserConfig};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
