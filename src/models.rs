//! Request and response shapes of the memory API

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Health {
    pub status: String,
}

/// One memory returned by `/v1/retrieve`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryItem {
    pub id: String,
    pub content: String,
    pub layer: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrieveResult {
    pub results: Vec<MemoryItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::str::FromStr for Role {
    type Err = eyre::Error;

    fn from_str(s: &str) -> eyre::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => eyre::bail!("Unknown role: {}. Supported: user, assistant", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreRequest<'a> {
    pub user_id: &'a str,
    pub history: &'a [Turn],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreResponse {
    pub memories_created: u64,
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates_avoided: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates_made: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_memories_checked: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructuredRequest<'a> {
    pub user_id: &'a str,
    pub query: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StructuredItem {
    pub id: String,
    pub content: String,
}

/// Category name to items, in server order
pub type StructuredResponse = IndexMap<String, Vec<StructuredItem>>;

/// Categories shown by `structured`, in display order
pub const STRUCTURED_CATEGORIES: [&str; 10] = [
    "emotions",
    "behaviors",
    "personal",
    "professional",
    "habits",
    "skills_tools",
    "projects",
    "relationships",
    "learning_journal",
    "other",
];
