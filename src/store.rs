//! Thin typed facade over the request executor
//!
//! Every operation goes through `RequestExecutor::execute`; nothing
//! here touches the network directly. Document ids for new documents
//! come from the hilo generator.

use std::sync::Arc;

use crate::common::{ClientConfig, Error, ErrorCategory, Result};
use crate::executor::command::{self, DatabaseStatistics, PutResult};
use crate::executor::RequestExecutor;
use crate::hilo::MultiTagHiLoGenerator;

pub struct DocumentStore {
    executor: Arc<RequestExecutor>,
    hilo: MultiTagHiLoGenerator,
}

impl DocumentStore {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_executor(RequestExecutor::new(config)?))
    }

    pub fn with_executor(executor: Arc<RequestExecutor>) -> Self {
        let hilo = MultiTagHiLoGenerator::new(executor.clone());
        Self { executor, hilo }
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    // === Database lifecycle ===

    pub async fn create_database(&self, name: &str, replication_factor: usize) -> Result<()> {
        let cmd = command::create_database(name, replication_factor);
        self.executor.execute(&cmd).await?;
        Ok(())
    }

    pub async fn delete_database(&self, name: &str, hard_delete: bool) -> Result<()> {
        let cmd = command::delete_database(name, hard_delete);
        self.executor.execute(&cmd).await?;
        Ok(())
    }

    pub async fn get_statistics(&self) -> Result<DatabaseStatistics> {
        let cmd = command::get_statistics(self.executor.database());
        self.executor.execute_json(&cmd).await
    }

    // === Documents ===

    pub async fn put_document(&self, id: &str, document: serde_json::Value) -> Result<PutResult> {
        let cmd = command::put_document(self.executor.database(), id, document);
        self.executor.execute_json(&cmd).await
    }

    /// `Ok(None)` when the document does not exist.
    pub async fn get_document(&self, id: &str) -> Result<Option<serde_json::Value>> {
        let cmd = command::get_document(self.executor.database(), id);
        match self.executor.execute(&cmd).await {
            Ok(response) => Ok(Some(response.json()?)),
            Err(Error::Application {
                category: ErrorCategory::NotFound,
                ..
            }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let cmd = command::delete_document(self.executor.database(), id);
        self.executor.execute(&cmd).await?;
        Ok(())
    }

    /// Store a document under a hilo-generated id for `tag`. Returns
    /// the assigned id.
    pub async fn store_new(&self, tag: &str, document: serde_json::Value) -> Result<String> {
        let id = self.hilo.next_document_id(tag).await?;
        self.put_document(&id, document).await?;
        Ok(id)
    }

    pub fn hilo(&self) -> &MultiTagHiLoGenerator {
        &self.hilo
    }

    /// Return unused hilo ranges. Call before dropping the store.
    pub async fn close(&self) {
        self.hilo.return_unused_ranges().await;
    }
}
