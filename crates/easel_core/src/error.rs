use std::fmt;

/// Stable handle for an entity. Handles are never reused within a process,
/// so a stale handle can only ever resolve to "missing", never to a
/// different entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which half of the frame an entity fault happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Step,
    Draw,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Step => "step",
            Self::Draw => "draw",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EaselError {
    /// Malformed geometry or another caller precondition violation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A resource (usually an image) has not finished loading. Draw calls
    /// absorb this; it only surfaces from explicit queries.
    #[error("resource not ready: {0}")]
    ResourceNotReady(String),

    #[error("entity {id} faulted during {phase}: {reason}")]
    EntityFault {
        id: EntityId,
        phase: FramePhase,
        reason: String,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl EaselError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
