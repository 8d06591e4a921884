use serde::{Deserialize, Serialize};

/// Length of a generated release code.
pub const RELEASE_CODE_LEN: usize = 32;

/// Opaque per-acquisition token proving ownership of a lock record.
///
/// Compared by value so that ownership survives serialization across
/// process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseCode(String);

impl ReleaseCode {
    /// Draws a fresh random code.
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(RELEASE_CODE_LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReleaseCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ReleaseCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ReleaseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
