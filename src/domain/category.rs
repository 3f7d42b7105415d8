use serde::{Deserialize, Serialize};

/// The closed set of categories an expense can belong to.
///
/// Persisted by symbolic name ("FOOD", "TRANSPORT", ...). Decoding is
/// strict: a stored value outside this set is a corruption fault at the
/// storage layer, never a silent fallback to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Groceries, restaurants, coffee, snacks.
    Food,
    /// Public transit, fuel, taxi, tolls.
    Transport,
    /// Recurring bills: electricity, water, internet, phone.
    Bills,
    /// Movies, games, concerts, subscriptions.
    Entertainment,
    /// Anything that doesn't fit the categories above.
    Other,
}

impl Category {
    /// All categories, in declaration order. Used for CLI help and tests.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Transport,
        Category::Bills,
        Category::Entertainment,
        Category::Other,
    ];

    /// The symbolic name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "FOOD",
            Category::Transport => "TRANSPORT",
            Category::Bills => "BILLS",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Other => "OTHER",
        }
    }

    /// Decode a stored symbolic name. Exact match only: persistence
    /// decoding must not paper over unknown values.
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "FOOD" => Some(Category::Food),
            "TRANSPORT" => Some(Category::Transport),
            "BILLS" => Some(Category::Bills),
            "ENTERTAINMENT" => Some(Category::Entertainment),
            "OTHER" => Some(Category::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Case-insensitive parse for user input (CLI arguments).
impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_symbol(&s.to_uppercase()).ok_or_else(|| {
            format!(
                "unknown category '{}'. Valid categories: food, transport, bills, entertainment, other",
                s
            )
        })
    }
}

/// Aggregated spending for a single category (only categories with at
/// least one recorded expense appear in a summary).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}
