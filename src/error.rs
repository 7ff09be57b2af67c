//! Failure classification for process exit codes.

use crate::content::NotesError;
use crate::feed::FeedError;
use crate::output::OutputError;

/// Why a run failed. Each kind has its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No input feed was given.
    ArgumentMissing,
    /// The feed file could not be opened or read.
    FileOpen,
    /// The feed is not a decodable appcast.
    Parse,
    /// A release-notes fetch failed.
    Network,
    /// The JSON output could not be written.
    Write,
    /// Anything not covered above.
    Other,
}

impl FailureKind {
    /// Classifies an error by the typed error at the bottom of its context
    /// chain.
    pub fn of(err: &anyhow::Error) -> Self {
        if let Some(feed) = err.downcast_ref::<FeedError>() {
            return if feed.is_parse_error() {
                FailureKind::Parse
            } else {
                FailureKind::FileOpen
            };
        }
        if err.downcast_ref::<NotesError>().is_some() {
            return FailureKind::Network;
        }
        if err.downcast_ref::<reqwest::Error>().is_some() {
            return FailureKind::Network;
        }
        if err.downcast_ref::<OutputError>().is_some() {
            return FailureKind::Write;
        }
        FailureKind::Other
    }

    pub fn exit_code(self) -> u8 {
        match self {
            FailureKind::Other => 1,
            FailureKind::ArgumentMissing => 2,
            FailureKind::FileOpen => 3,
            FailureKind::Parse => 4,
            FailureKind::Network => 5,
            FailureKind::Write => 6,
        }
    }
}
