use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::app::ports::TableStore;
use crate::domain::HarmonizedTable;
use crate::error::Result;

/// In-memory table store for development/testing.
#[derive(Default)]
pub struct InMemoryTableStore {
    table: Arc<Mutex<Option<HarmonizedTable>>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an existing table, bypassing the pipeline.
    pub fn with_table(table: HarmonizedTable) -> Self {
        Self {
            table: Arc::new(Mutex::new(Some(table))),
        }
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn load(&self) -> Result<Option<HarmonizedTable>> {
        Ok(self.table.lock().unwrap().clone())
    }

    async fn replace(&self, table: HarmonizedTable) -> Result<()> {
        debug!(
            countries = table.country_count(),
            rows = table.row_count(),
            "replacing persisted table"
        );
        *self.table.lock().unwrap() = Some(table);
        Ok(())
    }
}
