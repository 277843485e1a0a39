//! Capture loop - owns the flow table and handlers and drives both from one task
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace};

use pktswarm_capture::{CaptureError, FrameSource};
use pktswarm_core::{CoreError, FlowTable, IngestOutcome};
use pktswarm_handlers::{Message, Pipeline};
use pktswarm_protocols::DecodedPacket;
use pktswarm_telemetry::MetricsRecorder;

use crate::error::EngineError;

/// Frames buffered between the blocking reader and the loop.
pub const FRAME_CHANNEL_CAPACITY: usize = 1024;
/// Published messages wait for the consumer one at a time.
///
/// tokio's bounded channel has no zero-capacity (rendezvous) mode, so at most one
/// message sits ready ahead of the consumer and the next `send` waits for it.
pub const MESSAGE_CHANNEL_CAPACITY: usize = 1;

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    /// Frames the flow table had no flow for (non-IP, ICMP, truncated).
    pub skipped: u64,
    pub messages: u64,
    pub flows_expired: u64,
}

/// Handle to a swarm running on the tokio runtime.
pub struct SwarmHandle {
    pub messages: mpsc::Receiver<Message>,
    pub task: JoinHandle<Result<RunSummary, EngineError>>,
}

pub struct Swarm<S> {
    source: S,
    pipeline: Pipeline,
    flows: Option<FlowTable>,
    interval: Duration,
    metrics: MetricsRecorder,
}

impl<S: FrameSource + 'static> Swarm<S> {
    /// `flows` is `None` when flow tracking is disabled.
    pub fn new(
        source: S,
        pipeline: Pipeline,
        flows: Option<FlowTable>,
        interval: Duration,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            source,
            pipeline,
            flows,
            interval,
            metrics,
        }
    }

    /// Spawns [`Swarm::run`] and returns the message stream alongside the task.
    pub fn start(self) -> SwarmHandle {
        let (tx, messages) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        let task = tokio::spawn(self.run(tx));
        SwarmHandle { messages, task }
    }

    /// Runs until the source is exhausted, the source fails, or `tx` is closed.
    ///
    /// Exhaustion publishes one last message before `tx` is dropped. A capture failure
    /// drops `tx` without one. A zero `interval` fails before the source is touched.
    #[instrument(skip_all, fields(interval = ?self.interval, flows = self.flows.is_some()))]
    pub async fn run(self, tx: mpsc::Sender<Message>) -> Result<RunSummary, EngineError> {
        let Swarm {
            mut source,
            pipeline,
            flows,
            interval,
            metrics,
        } = self;
        if interval.is_zero() {
            return Err(EngineError::ZeroInterval);
        }

        let (frame_tx, mut frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let reader = spawn_blocking(move || read_frames(&mut source, &frame_tx));

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = LoopState {
            pipeline,
            flows,
            metrics,
            summary: RunSummary::default(),
        };
        let mut exhausted = false;
        info!("Swarm started");

        let outcome = loop {
            tokio::select! {
                frame = frame_rx.recv() => match frame {
                    Some(Ok(packet)) => {
                        if let Err(e) = state.on_frame(&packet) {
                            error!("Flow table rejected frame: {e}");
                            break Err(EngineError::Core(e));
                        }
                    }
                    Some(Err(e)) => {
                        error!("Capture source failed: {e}");
                        break Err(EngineError::Capture(e));
                    }
                    None => {
                        info!("Capture source exhausted");
                        exhausted = true;
                        state.publish(&tx).await;
                        break Ok(());
                    }
                },
                _ = ticker.tick() => {
                    if !state.publish(&tx).await {
                        info!("Message consumer closed");
                        break Ok(());
                    }
                }
            }
        };

        // A reader blocked on a live source only notices the closed channel on its next frame.
        drop(frame_rx);
        if exhausted {
            reader.await?;
        }
        outcome?;

        let summary = state.finish();
        info!(
            frames = summary.frames,
            messages = summary.messages,
            flows_expired = summary.flows_expired,
            "Swarm finished"
        );
        Ok(summary)
    }
}

/// Pulls frames until the source ends, fails, or the loop stops listening.
fn read_frames<S: FrameSource>(
    source: &mut S,
    frames: &mpsc::Sender<Result<DecodedPacket, CaptureError>>,
) {
    loop {
        match source.next_frame() {
            Ok(Some(packet)) => {
                if frames.blocking_send(Ok(packet)).is_err() {
                    debug!("Frame receiver dropped, stopping reader");
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                let _ = frames.blocking_send(Err(e));
                return;
            }
        }
    }
}

struct LoopState {
    pipeline: Pipeline,
    flows: Option<FlowTable>,
    metrics: MetricsRecorder,
    summary: RunSummary,
}

impl LoopState {
    fn on_frame(&mut self, packet: &DecodedPacket) -> Result<(), CoreError> {
        self.summary.frames += 1;
        self.metrics.record_packet(packet.len());

        if let Some(table) = self.flows.as_mut() {
            let expired_before = table.expired_total();
            let outcome = table.ingest(packet)?;
            trace!(?outcome, "Frame ingested");
            if outcome == IngestOutcome::Skipped {
                self.summary.skipped += 1;
            }

            let expired = table.expired_total() - expired_before;
            if expired > 0 {
                self.metrics.add_expired_flows(expired as usize);
            }
            self.metrics.set_active_flows(table.len());
        }

        self.pipeline.read_packet(packet);
        Ok(())
    }

    /// Aggregates and sends one message. Returns false once the consumer is gone.
    async fn publish(&mut self, tx: &mpsc::Sender<Message>) -> bool {
        let mut message = self.pipeline.aggregate();
        if let Some(table) = &self.flows {
            message = message.with_active_flows(table.len());
        }

        if tx.send(message).await.is_err() {
            return false;
        }
        self.summary.messages += 1;
        self.metrics.inc_messages();
        debug!(published = self.summary.messages, "Message published");
        true
    }

    fn finish(mut self) -> RunSummary {
        if let Some(table) = &self.flows {
            self.summary.flows_expired = table.expired_total();
        }
        self.summary
    }
}
