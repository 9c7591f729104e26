use serde::{Deserialize, Serialize};

/// A search-result card before its detail page has been visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStub {
    pub title: String,
    pub price: String,
    pub thumbnail_url: String,
    pub item_url: String,
}
