//! Shader pipeline stages.

use std::fmt;

use thiserror::Error;

/// Pipeline stage a program was declared for.
///
/// The two variants compiled from one program always share the stage tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

impl Stage {
    /// Short tag used in diagnostics.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Vertex => "VERT",
            Self::Fragment => "FRAG",
            Self::Compute => "COMP",
        }
    }

    /// Whether inputs arrive through declared per-slot placements.
    ///
    /// Fragment and compute programs receive their inputs through a fixed
    /// leading-register convention instead (built-in coordinates rather than
    /// user-declared attributes).
    #[must_use]
    pub const fn has_declared_inputs(self) -> bool {
        matches!(self, Self::Vertex)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Raised when decoding a stage tag from an external collaborator.
#[derive(Debug, Error)]
#[error("unknown stage tag: {0}")]
pub struct StageError(pub u32);

impl TryFrom<u32> for Stage {
    type Error = StageError;

    fn try_from(raw: u32) -> Result<Self, StageError> {
        match raw {
            0 => Ok(Self::Vertex),
            1 => Ok(Self::Fragment),
            2 => Ok(Self::Compute),
            other => Err(StageError(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_roundtrip() {
        for (raw, stage) in [(0, Stage::Vertex), (1, Stage::Fragment), (2, Stage::Compute)] {
            assert_eq!(Stage::try_from(raw).unwrap(), stage);
        }
        assert!(Stage::try_from(3).is_err());
    }

    #[test]
    fn unknown_stage_tag_is_named() {
        assert_eq!(StageError(7).to_string(), "unknown stage tag: 7");
    }

    #[test]
    fn declared_inputs_only_for_vertex() {
        assert!(Stage::Vertex.has_declared_inputs());
        assert!(!Stage::Fragment.has_declared_inputs());
        assert!(!Stage::Compute.has_declared_inputs());
    }
}
