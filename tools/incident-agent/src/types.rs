use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity bucket assigned to a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Critical,
    High,
    Medium,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Critical,
        Category::High,
        Category::Medium,
        Category::Unknown,
    ];

    /// Strict lookup by display name, ignoring case and surrounding whitespace.
    pub fn from_name(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }

    /// Lenient parse used for labels returned by a remote service.
    pub fn parse_label(value: &str) -> Self {
        Self::from_name(value).unwrap_or(Self::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Granite,
    Inference,
    Structured,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granite => "granite",
            Self::Inference => "inference",
            Self::Structured => "structured",
        }
    }
}
