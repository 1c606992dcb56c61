//! binder/stage.rs
//!
//! Pipeline stages, in execution order.

use std::fmt;

/// Phase of a bind run. The derived ordering is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Configuration only (visitor installation); never announced.
    Init,
    Bind,
    CopyMetadata,
    ApplyMetadata,
    BuildChapters,
    WriteMetadata,
    CombineAudioAndMetadata,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Init,
        Stage::Bind,
        Stage::CopyMetadata,
        Stage::ApplyMetadata,
        Stage::BuildChapters,
        Stage::WriteMetadata,
        Stage::CombineAudioAndMetadata,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Init => "Init",
            Stage::Bind => "Bind",
            Stage::CopyMetadata => "CopyMetadata",
            Stage::ApplyMetadata => "ApplyMetadata",
            Stage::BuildChapters => "BuildChapters",
            Stage::WriteMetadata => "WriteMetadata",
            Stage::CombineAudioAndMetadata => "CombineAudioAndMetadata",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_sorted() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
    }

    #[test]
    fn chapters_run_after_bind() {
        assert!(Stage::Bind < Stage::BuildChapters);
        assert!(Stage::BuildChapters < Stage::WriteMetadata);
    }
}
