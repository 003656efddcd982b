//! HiLo id generation
//!
//! One `HiLoIdGenerator` owns the range state for a single tag. All of
//! it lives behind one async mutex, so concurrent callers of the same
//! tag are serialized while different tags proceed independently.
//! Replacement ranges are fetched through the shared request executor;
//! the server decides batch sizing from the history we report.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::executor::command::{self, NextHiLoResult};
use crate::executor::RequestExecutor;
use crate::hilo::range::HiLoRange;
use crate::common::{Error, Result};

struct GeneratorState {
    range: Option<HiLoRange>,
    /// Highest id this instance has issued; a fetched range must start
    /// above it or ids could repeat
    floor: i64,
    prefix: String,
    server_tag: String,
    last_batch_size: i64,
    last_range_at: Option<DateTime<Utc>>,
    /// High bound of the most recent range, reported back to the server
    last_max: i64,
}

pub struct HiLoIdGenerator {
    tag: String,
    executor: Arc<RequestExecutor>,
    separator: String,
    state: tokio::sync::Mutex<GeneratorState>,
}

impl HiLoIdGenerator {
    pub fn new(executor: Arc<RequestExecutor>, tag: impl Into<String>) -> Self {
        let separator = executor.config().identity_parts_separator.clone();
        Self {
            tag: tag.into(),
            executor,
            separator,
            state: tokio::sync::Mutex::new(GeneratorState {
                range: None,
                floor: 0,
                prefix: String::new(),
                server_tag: String::new(),
                last_batch_size: 0,
                last_range_at: None,
                last_max: 0,
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Next unique id for this tag. Fetches a fresh range from the
    /// cluster when the local one is missing or exhausted.
    pub async fn next_id(&self) -> Result<i64> {
        Ok(self.allocate().await?.0)
    }

    /// Next document id, `{prefix}{id}-{server_tag}`. Falls back to
    /// `{tag}{separator}{id}` when the server supplies no prefix.
    pub async fn next_document_id(&self) -> Result<String> {
        let (id, prefix, server_tag) = self.allocate().await?;
        let prefix = if prefix.is_empty() {
            format!("{}{}", self.tag, self.separator)
        } else {
            prefix
        };
        if server_tag.is_empty() {
            Ok(format!("{}{}", prefix, id))
        } else {
            Ok(format!("{}{}-{}", prefix, id, server_tag))
        }
    }

    /// Issue one id together with the prefix and server tag of the
    /// range it came from, under a single lock acquisition. Reading
    /// them separately could pair an id with metadata of a range a
    /// concurrent caller fetched in between.
    async fn allocate(&self) -> Result<(i64, String, String)> {
        let mut state = self.state.lock().await;
        loop {
            let issued = state.range.as_mut().and_then(HiLoRange::try_next);
            if let Some(id) = issued {
                state.floor = id;
                return Ok((id, state.prefix.clone(), state.server_tag.clone()));
            }
            self.fetch_next_range(&mut state).await?;
        }
    }

    /// Report the unused tail of the current range back to the server
    /// so another instance can use those values. Best-effort: a failed
    /// report only leaves a gap in the key space, never a duplicate.
    pub async fn return_unused_range(&self) {
        let mut state = self.state.lock().await;
        let Some(range) = state.range.take() else {
            return;
        };
        let Some((last, end)) = range.unused() else {
            return;
        };

        let cmd = command::hilo_return(self.executor.database(), &self.tag, last, end);
        if let Err(error) = self.executor.execute(&cmd).await {
            tracing::warn!(
                tag = %self.tag,
                last,
                end,
                %error,
                "failed to return unused hilo range, abandoning it"
            );
        }
    }

    async fn fetch_next_range(&self, state: &mut GeneratorState) -> Result<()> {
        let cmd = command::next_hilo(
            self.executor.database(),
            &self.tag,
            state.last_batch_size,
            state.last_range_at,
            &self.separator,
            state.last_max,
        );
        let result: NextHiLoResult = self.executor.execute_json(&cmd).await?;

        if result.high < result.low {
            return Err(Error::UnexpectedResponse(format!(
                "hilo range for tag '{}' is inverted: low {} > high {}",
                self.tag, result.low, result.high
            )));
        }
        // a range at or below what we already issued means duplicate risk
        if state.floor > 0 && result.low <= state.floor {
            return Err(Error::KeyRangeInconsistency {
                tag: self.tag.clone(),
                low: result.low,
                floor: state.floor,
            });
        }

        tracing::debug!(
            tag = %self.tag,
            low = result.low,
            high = result.high,
            "installed hilo range"
        );

        state.prefix = result.prefix;
        state.server_tag = result.server_tag;
        state.last_batch_size = result.last_size;
        state.last_range_at = result.last_range_at;
        state.last_max = result.high;
        state.range = Some(HiLoRange::new(result.low, result.high));
        Ok(())
    }
}

/// One generator per tag, created lazily. Ranges for different tags
/// never interact.
pub struct MultiTagHiLoGenerator {
    executor: Arc<RequestExecutor>,
    generators: Mutex<HashMap<String, Arc<HiLoIdGenerator>>>,
}

impl MultiTagHiLoGenerator {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            generators: Mutex::new(HashMap::new()),
        }
    }

    /// The generator for a tag, creating it on first use.
    pub fn generator_for(&self, tag: &str) -> Arc<HiLoIdGenerator> {
        let mut generators = self.generators.lock().unwrap();
        generators
            .entry(tag.to_string())
            .or_insert_with(|| Arc::new(HiLoIdGenerator::new(self.executor.clone(), tag)))
            .clone()
    }

    pub async fn next_id(&self, tag: &str) -> Result<i64> {
        self.generator_for(tag).next_id().await
    }

    pub async fn next_document_id(&self, tag: &str) -> Result<String> {
        self.generator_for(tag).next_document_id().await
    }

    /// Return every tag's unused range, best-effort.
    pub async fn return_unused_ranges(&self) {
        let generators: Vec<Arc<HiLoIdGenerator>> =
            self.generators.lock().unwrap().values().cloned().collect();
        for generator in generators {
            generator.return_unused_range().await;
        }
    }
}
