//! 遥测模块：Best-of-N 运行事件的可插拔接收端。
//!
//! Run telemetry.
//!
//! The orchestrator reports a [`RunEvent::Started`] before fanning out and a
//! [`RunEvent::Completed`] once synthesis resolved. Where those go is up to the
//! application: the default sink drops them.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RunSink`] | Trait for event destinations |
//! | [`NoopRunSink`] | Default sink (no collection) |
//! | [`TracingRunSink`] | Logs events through `tracing` |
//! | [`InMemoryRunSink`] | Bounded in-memory sink for tests and inspection |
//! | [`CompositeRunSink`] | Fan events out to several sinks |

mod events;

pub use events::{RunCompleted, RunEvent, RunStarted};

use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::info;
use uuid::Uuid;

/// Destination for run events. Errors are logged by the caller, never propagated.
#[async_trait]
pub trait RunSink: Send + Sync {
    async fn report(&self, event: RunEvent) -> Result<()>;
}

/// Drops every event.
pub struct NoopRunSink;

#[async_trait]
impl RunSink for NoopRunSink {
    async fn report(&self, _event: RunEvent) -> Result<()> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn RunSink> {
    Arc::new(NoopRunSink)
}

/// Logs events at `info` level.
pub struct TracingRunSink;

#[async_trait]
impl RunSink for TracingRunSink {
    async fn report(&self, event: RunEvent) -> Result<()> {
        match &event {
            RunEvent::Started(e) => info!(
                run_id = %e.run_id,
                candidate_count = e.candidate_count,
                model = %e.model,
                "best-of-n run started"
            ),
            RunEvent::Completed(e) => info!(
                run_id = %e.run_id,
                elapsed_ms = e.elapsed_ms,
                candidates_generated = e.candidates_generated,
                candidates_succeeded = e.candidates_succeeded,
                synthesized = e.synthesized,
                "best-of-n run completed"
            ),
        }
        Ok(())
    }
}

/// In-memory sink for testing.
pub struct InMemoryRunSink {
    events: RwLock<Vec<RunEvent>>,
    max_events: usize,
}

impl InMemoryRunSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max.max(1),
        }
    }

    pub fn get_events(&self) -> Vec<RunEvent> {
        self.events
            .read()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn get_events_by_run(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.get_events()
            .into_iter()
            .filter(|e| e.run_id() == run_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

#[async_trait]
impl RunSink for InMemoryRunSink {
    async fn report(&self, event: RunEvent) -> Result<()> {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
            if events.len() > self.max_events {
                events.remove(0);
            }
        }
        Ok(())
    }
}

/// Composite sink for multiple destinations.
#[derive(Default)]
pub struct CompositeRunSink {
    sinks: Vec<Arc<dyn RunSink>>,
}

impl CompositeRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(mut self, sink: Arc<dyn RunSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl RunSink for CompositeRunSink {
    async fn report(&self, event: RunEvent) -> Result<()> {
        for s in &self.sinks {
            let _ = s.report(event.clone()).await;
        }
        Ok(())
    }
}
