//! Feedpost core: pure data model, caption formatting and loop decisions.
mod caption;
mod credentials;
mod cycle;
mod device;
mod model;
mod run_state;

pub use caption::{
    clamp_caption, collapse_whitespace, compose_caption, hashtags_from_title, truncate_excerpt,
    CaptionSettings, CAPTION_MAX_CHARS, EXCERPT_MAX_CHARS,
};
pub use credentials::{Credentials, LoginStrategy};
pub use cycle::{poll_decision, LoopPhase, PollDecision, PublishAttempt, PublishOutcome, PublishStep};
pub use device::DeviceIdentity;
pub use model::{ArticleContent, FeedEntry, SessionBlob};
pub use run_state::{RunState, SharedRunState};
