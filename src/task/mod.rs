use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

mod document;
mod file;

pub use document::DocumentTaskCatalog;
pub use file::{FileTaskCatalog, DEFAULT_TASKS_FILE};

/// Internal identifier field removed from every descriptor before it is served
pub const ID_FIELD: &str = "_id";

/// Platform flags clients may filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Field name (and query key) for this platform
    pub fn field(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            _ => None,
        }
    }
}

/// Task lookup filter.
///
/// Every platform in the filter must be exactly boolean `true` on a descriptor
/// for it to match. An empty filter matches the whole catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    platforms: Vec<Platform>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required platform flag.
    pub fn require(mut self, platform: Platform) -> Self {
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
            self.platforms.sort();
        }
        self
    }

    /// Builds a filter from a raw query string.
    ///
    /// Only the keys `ios` and `android` are recognized. Presence is what
    /// matters: `?ios`, `?ios=1` and `?ios=false` all require `ios == true`.
    /// Keys are form-decoded; unknown keys are ignored and a query that
    /// cannot be decoded yields an empty filter.
    pub fn from_query(query: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(query.unwrap_or("")).unwrap_or_default();
        Self::from_keys(pairs.iter().map(|(key, _)| key.as_str()))
    }

    /// Builds a filter from already-decoded query keys.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        keys.into_iter()
            .filter_map(Platform::from_key)
            .fold(Self::new(), Self::require)
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Returns true if `descriptor` satisfies every required flag.
    pub fn matches(&self, descriptor: &Value) -> bool {
        self.platforms
            .iter()
            .all(|p| descriptor.get(p.field()) == Some(&Value::Bool(true)))
    }
}

/// Source of task descriptors served by `/tasks`.
#[async_trait]
pub trait TaskCatalog: Send + Sync {
    /// Returns descriptors matching `filter`, with [`ID_FIELD`] projected out.
    async fn lookup(&self, filter: &TaskFilter) -> Result<Vec<Value>>;
}

/// Removes the internal identifier from a descriptor.
pub(crate) fn project(mut descriptor: Value) -> Value {
    if let Value::Object(map) = &mut descriptor {
        map.remove(ID_FIELD);
    }
    descriptor
}
