use serde::Serialize;

/// User-selected search criteria. Replaced wholesale, never merged; replacing
/// the filter is the only way to invalidate a cached feed page and reset
/// pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub keywords: String,
    pub category_ids: Vec<String>,
    pub locations: Vec<String>,
    pub min_budget: Option<u32>,
    pub max_budget: Option<u32>,
}

impl Filter {
    /// A filter with no keyword, category, or location carries zero effective
    /// criteria; the feed query short-circuits instead of hitting the backend.
    /// Budget bounds alone do not make a filter searchable.
    pub fn is_empty(&self) -> bool {
        self.keywords.trim().is_empty()
            && self.category_ids.is_empty()
            && self.locations.is_empty()
    }

    pub fn to_payload(&self, after: Option<&str>) -> SearchPayload {
        SearchPayload {
            query: if self.keywords.trim().is_empty() {
                None
            } else {
                Some(self.keywords.trim().to_string())
            },
            category_ids: self.category_ids.clone(),
            locations: self.locations.clone(),
            min_budget: self.min_budget,
            max_budget: self.max_budget,
            after: after.map(str::to_string),
        }
    }
}

/// Request body for POST /jobs/fetch. Locations are always sent as the
/// multi-value `locations` field.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_budget: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}
