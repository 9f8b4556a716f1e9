//! Product category.

use serde::{Deserialize, Serialize};

/// Category a product is filed under.
///
/// The wire value is the lowercase name (`"electronics"`); [`Category::label`]
/// gives the human-readable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Other,
    Books,
    Sports,
    Clothing,
    Home,
    Electronics,
}

impl Category {
    /// Every category, in form display order.
    pub const ALL: [Self; 6] = [
        Self::Other,
        Self::Books,
        Self::Sports,
        Self::Clothing,
        Self::Home,
        Self::Electronics,
    ];

    /// Wire value, as sent to and received from the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Books => "books",
            Self::Sports => "sports",
            Self::Clothing => "clothing",
            Self::Home => "home",
            Self::Electronics => "electronics",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Other => "Other",
            Self::Books => "Books",
            Self::Sports => "Sports",
            Self::Clothing => "Clothing",
            Self::Home => "Home & Garden",
            Self::Electronics => "Electronics",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("\"{}\" is not a valid choice", s.trim()))
    }
}
