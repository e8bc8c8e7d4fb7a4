use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

/// Pipeline stage a failed publish stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Upload,
    Persist,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Upload => "upload",
            FailureKind::Persist => "persist",
        }
    }
}

/// Lifecycle of one draft's publish attempts.
///
/// `Draft -> Validating -> ResolvingMedia -> Persisting -> Published`, with any
/// non-terminal state able to fall into `Failed`. Both terminal states may go
/// back to `Draft` for the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    #[default]
    Draft,
    Validating,
    ResolvingMedia,
    Persisting,
    Published,
    Failed(FailureKind),
}

impl PublishState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishState::Published | PublishState::Failed(_))
    }

    pub fn can_enter(&self, next: PublishState) -> bool {
        use PublishState::*;
        match (*self, next) {
            (Draft, Validating)
            | (Validating, ResolvingMedia)
            | (ResolvingMedia, Persisting)
            | (Persisting, Published) => true,
            (Published | Failed(_), Draft) => true,
            (current, Failed(_)) => !current.is_terminal(),
            _ => false,
        }
    }

    pub(crate) fn enter(&mut self, next: PublishState) {
        debug_assert!(self.can_enter(next), "illegal transition {self} -> {next}");
        trace!(from = %self, to = %next, "publish state");
        *self = next;
    }

    /// Back to `Draft` before a new attempt or a cancel.
    ///
    /// A mid-pipeline state here means the previous attempt was dropped
    /// before it finished, so it is abandoned rather than resumed.
    pub(crate) fn restart(&mut self) {
        match *self {
            PublishState::Draft => {}
            current if current.is_terminal() => self.enter(PublishState::Draft),
            abandoned => {
                debug!(state = %abandoned, "abandoning interrupted publish attempt");
                *self = PublishState::Draft;
            }
        }
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishState::Draft => f.write_str("draft"),
            PublishState::Validating => f.write_str("validating"),
            PublishState::ResolvingMedia => f.write_str("resolving_media"),
            PublishState::Persisting => f.write_str("persisting"),
            PublishState::Published => f.write_str("published"),
            PublishState::Failed(kind) => write!(f, "failed({})", kind.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_linear() {
        let mut state = PublishState::Draft;
        for next in [
            PublishState::Validating,
            PublishState::ResolvingMedia,
            PublishState::Persisting,
            PublishState::Published,
        ] {
            assert!(state.can_enter(next), "{state} -> {next}");
            state.enter(next);
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn stages_cannot_be_skipped() {
        assert!(!PublishState::Draft.can_enter(PublishState::Persisting));
        assert!(!PublishState::Validating.can_enter(PublishState::Published));
        assert!(!PublishState::Published.can_enter(PublishState::Validating));
    }

    #[test]
    fn terminal_states_only_restart() {
        let failed = PublishState::Failed(FailureKind::Upload);
        assert!(failed.can_enter(PublishState::Draft));
        assert!(!failed.can_enter(PublishState::Failed(FailureKind::Persist)));

        let mut state = failed;
        state.restart();
        assert_eq!(state, PublishState::Draft);
    }

    #[test]
    fn restart_abandons_an_interrupted_attempt() {
        for stuck in [
            PublishState::Validating,
            PublishState::ResolvingMedia,
            PublishState::Persisting,
        ] {
            let mut state = stuck;
            state.restart();
            assert_eq!(state, PublishState::Draft, "{stuck}");
            state.enter(PublishState::Validating);
        }

        let mut state = PublishState::Draft;
        state.restart();
        assert_eq!(state, PublishState::Draft);
    }

    #[test]
    fn serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_value(PublishState::ResolvingMedia).unwrap(),
            serde_json::json!("resolving_media")
        );
        assert_eq!(
            serde_json::to_value(PublishState::Failed(FailureKind::Persist)).unwrap(),
            serde_json::json!({ "failed": "persist" })
        );
    }
}
