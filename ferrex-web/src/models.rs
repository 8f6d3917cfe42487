//! Response models shared by the resolver and the bundled pages

use serde::{Deserialize, Serialize};

/// Instance metadata. Fetched for every page so that guest-visible pages
/// know what the server allows without asking for it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    /// Whether unauthenticated visitors may browse libraries
    #[serde(default)]
    pub guest_access: bool,
    #[serde(default)]
    pub registration_open: bool,
}

/// Library listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub media_count: u64,
}

/// Media entry inside a library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}
