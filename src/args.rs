use std::fmt;

/// How an import is merged into the records already present at the provider.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Delete every existing record, then create every imported record
    Clear,
    /// Update existing records that match an imported record, never create or delete
    Replace,
    /// Create imported records that have no existing match, never touch existing ones
    Keep,
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreMode::Clear => "clear",
            RestoreMode::Replace => "replace",
            RestoreMode::Keep => "keep",
        };
        f.write_str(name)
    }
}
