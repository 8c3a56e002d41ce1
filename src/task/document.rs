//! Task catalog backed by the `tasks` collection of the document store.

use super::{project, TaskCatalog, TaskFilter};
use crate::store::DocumentStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::params_from_iter;
use serde_json::Value;

/// Queries task descriptors stored as JSON documents.
///
/// Platform filters compile to `json_type(doc, '$.<field>') = 'true'`, which
/// matches boolean `true` only (not `1` or `"true"`).
#[derive(Clone)]
pub struct DocumentTaskCatalog {
    store: DocumentStore,
}

impl DocumentTaskCatalog {
    pub fn new(store: DocumentStore) -> Result<Self> {
        store.blocking(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS tasks (
                    _id INTEGER PRIMARY KEY,
                    doc TEXT NOT NULL
                );",
            )
            .context("Failed to create tasks table")
        })?;
        Ok(Self { store })
    }

    /// Adds a descriptor to the catalog. Used for seeding; requests never write tasks.
    pub async fn insert_task(&self, descriptor: Value) -> Result<()> {
        let doc = serde_json::to_string(&descriptor).context("Failed to encode task")?;
        self.store
            .run(move |conn| {
                conn.execute("INSERT INTO tasks (doc) VALUES (?1)", [doc])
                    .context("Failed to insert task")?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl TaskCatalog for DocumentTaskCatalog {
    async fn lookup(&self, filter: &TaskFilter) -> Result<Vec<Value>> {
        let mut sql = String::from("SELECT doc FROM tasks");
        let mut paths = Vec::new();
        for (i, platform) in filter.platforms().iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("json_type(doc, ?{}) = 'true'", i + 1));
            paths.push(format!("$.{}", platform.field()));
        }
        sql.push_str(" ORDER BY _id ASC");

        self.store
            .run(move |conn| {
                let mut stmt = conn.prepare(&sql).context("Failed to prepare task query")?;
                let rows = stmt
                    .query_map(params_from_iter(paths.iter()), |row| row.get::<_, String>(0))
                    .context("Failed to query tasks")?;

                let mut tasks = Vec::new();
                for row in rows {
                    let doc = row.context("Failed to read task row")?;
                    let descriptor: Value =
                        serde_json::from_str(&doc).context("Stored task is not valid JSON")?;
                    tasks.push(project(descriptor));
                }
                Ok(tasks)
            })
            .await
    }
}
