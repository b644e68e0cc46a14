use serde::Serialize;

use crate::FeedEntry;

/// Where the worker currently is in its poll/act/sleep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopPhase {
    LoggingIn,
    Polling,
    Fetching,
    Publishing,
    Recovering,
    Recording,
    #[default]
    Stopped,
}

/// Verdict on the newest feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision<'a> {
    EmptyFeed,
    IncompleteEntry,
    /// Identifier equals the last-published marker.
    AlreadyPublished,
    New(&'a FeedEntry),
}

/// Decides whether `entry` should be published, given the stored marker.
///
/// Only the identifier matters for de-duplication; a retitled or edited
/// entry with a published identifier is still skipped.
pub fn poll_decision<'a>(entry: Option<&'a FeedEntry>, last_published: &str) -> PollDecision<'a> {
    let Some(entry) = entry else {
        return PollDecision::EmptyFeed;
    };
    if !entry.is_complete() {
        return PollDecision::IncompleteEntry;
    }
    if entry.id.trim() == last_published.trim() {
        return PollDecision::AlreadyPublished;
    }
    PollDecision::New(entry)
}

/// Which publish call of the current cycle is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAttempt {
    First,
    /// Made once, after the session was reset.
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// The session artifact was rejected mid-request.
    RecoverableAuth,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Record,
    /// Reset the session and move to [`PublishAttempt::Retry`].
    Recover,
    GiveUp,
}

impl PublishAttempt {
    /// Session recovery is granted to the first attempt only.
    pub fn next_step(self, outcome: PublishOutcome) -> PublishStep {
        match (self, outcome) {
            (_, PublishOutcome::Published) => PublishStep::Record,
            (PublishAttempt::First, PublishOutcome::RecoverableAuth) => PublishStep::Recover,
            (PublishAttempt::Retry, PublishOutcome::RecoverableAuth)
            | (_, PublishOutcome::Failed) => PublishStep::GiveUp,
        }
    }
}
