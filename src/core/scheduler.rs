use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{EmitMode, ErrorPolicy, Settings};
use super::emitter::EventSink;
use super::error::CollectError;
use super::materialize::collect;
use super::query::QueryTable;
use super::result::CycleEvent;
use super::session::Provider;

pub const SOURCE_TYPE: &str = "wmibeat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Raises the stop signal from anywhere (e.g. a Ctrl+C handler). The loop
/// only observes it between cycles.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct Scheduler<P: Provider> {
    state: SchedulerState,
    period: Duration,
    emit: EmitMode,
    on_error: ErrorPolicy,
    provider: Arc<P>,
    queries: Arc<QueryTable>,
    sink: Arc<dyn EventSink>,
    stop: StopHandle,
    cycles: u64,
}

impl<P: Provider> Scheduler<P> {
    pub fn new(
        provider: P,
        queries: QueryTable,
        sink: Arc<dyn EventSink>,
        settings: &Settings,
    ) -> Self {
        Self {
            state: SchedulerState::Idle,
            period: settings.period,
            emit: settings.emit,
            on_error: settings.on_error,
            provider: Arc::new(provider),
            queries: Arc::new(queries),
            sink,
            stop: StopHandle::default(),
            cycles: 0,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Ticks every `period` until stopped. The first cycle runs one period
    /// after start. A failed cycle ends the loop under [`ErrorPolicy::Stop`].
    pub async fn run(&mut self) -> Result<(), CollectError> {
        if self.state != SchedulerState::Idle {
            warn!("Scheduler already started (state {:?})", self.state);
            return Ok(());
        }
        self.state = SchedulerState::Running;
        info!(
            "wmibeat is running every {:?} over {} class(es). Hit CTRL-C to stop it.",
            self.period,
            self.queries.len()
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        // A slow cycle pushes the next tick back rather than bursting to catch up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.stop.token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if self.stop.is_stopped() {
                break;
            }

            match self.run_cycle().await {
                Ok(events) => debug!("Cycle {} published {} event(s)", self.cycles, events),
                Err(e) => {
                    error!("Poll cycle {} failed: {}", self.cycles, e);
                    if self.on_error == ErrorPolicy::Stop {
                        self.state = SchedulerState::Stopped;
                        return Err(e);
                    }
                }
            }
        }

        self.state = SchedulerState::Stopped;
        info!("wmibeat stopped after {} cycle(s)", self.cycles);
        Ok(())
    }

    /// One full cycle: open a session on a blocking thread, materialize every
    /// class, release the session, then publish. Nothing is published if any
    /// step before publishing fails. Returns the number of events handed over.
    pub async fn run_cycle(&mut self) -> Result<usize, CollectError> {
        self.cycles += 1;
        let provider = self.provider.clone();
        let queries = self.queries.clone();

        let cycle = tokio::task::spawn_blocking(move || collect(provider.as_ref(), &queries))
            .await
            .map_err(|e| CollectError::Worker(e.to_string()))??;

        let event = CycleEvent::new(SOURCE_TYPE, cycle);
        let (published, count) = match self.emit {
            EmitMode::Cycle => (self.sink.publish(event.to_json()).await, 1),
            EmitMode::Row => {
                let rows = event.to_row_json();
                let count = rows.len();
                (self.sink.publish_batch(rows).await, count)
            }
        };

        match published {
            Ok(()) => {
                debug!("Event sent");
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to publish cycle {}: {}", self.cycles, e);
                Ok(0)
            }
        }
    }
}
