//! Tokio node driver
//!
//! One task owns the [`BenchmarkEngine`]. It ticks the state machine on a fixed
//! interval, drains the transport on every tick, and executes requests sent
//! through [`NodeDriver`]. Engine events come back over an unbounded channel so
//! the callback never blocks the engine.

use crate::engine::{BenchmarkEngine, EventCallback};
use crate::logging::Logger;
use crate::models::{BenchmarkEvent, TestConfiguration};
use crate::platform::NodePlatform;
use crate::transport::Transport;
use crate::types::{BenchmarkError, Result};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Operations a driver performs on its engine
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCommand {
    Discover,
    SelectPeer(usize),
    Init(TestConfiguration),
    Start,
    Stop,
    Abort,
}

struct DriverRequest {
    command: DriverCommand,
    reply: oneshot::Sender<Result<()>>,
}

/// Handle to a running node task
pub struct NodeDriver<T: Transport + Send + 'static> {
    requests: mpsc::Sender<DriverRequest>,
    events: mpsc::UnboundedReceiver<BenchmarkEvent>,
    task: JoinHandle<BenchmarkEngine<T, NodePlatform>>,
}

fn channel_sink(events: &mpsc::UnboundedSender<BenchmarkEvent>) -> EventCallback {
    let events = events.clone();
    Box::new(move |event| {
        // The receiver may already be gone during shutdown
        let _ = events.send(event.clone());
    })
}

impl<T: Transport + Send + 'static> NodeDriver<T> {
    /// Move `engine` into a new task ticking every `tick`
    pub fn spawn(mut engine: BenchmarkEngine<T, NodePlatform>, tick: Duration, logger: Logger) -> Self {
        let (request_tx, mut request_rx) = mpsc::channel::<DriverRequest>(16);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        engine.set_event_callback(channel_sink(&event_tx));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            logger
                .debug("Node driver started")
                .field("tick_us", tick.as_micros() as u64)
                .log();

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let started = Instant::now();
                        if let Err(e) = engine.poll() {
                            logger.warn("Transport poll failed").error_info(&e).log();
                        }
                        engine.process();
                        engine.platform_mut().record_busy(started.elapsed());
                    }
                    request = request_rx.recv() => {
                        let Some(DriverRequest { command, reply }) = request else {
                            break;
                        };
                        let result = match command {
                            DriverCommand::Discover => engine.peer_discover(),
                            DriverCommand::SelectPeer(index) => engine.select_peer(index),
                            DriverCommand::Init(configuration) => {
                                engine.test_init(configuration, channel_sink(&event_tx))
                            }
                            DriverCommand::Start => engine.test_start(),
                            DriverCommand::Stop => engine.test_stop(),
                            DriverCommand::Abort => {
                                engine.test_abort();
                                Ok(())
                            }
                        };
                        let _ = reply.send(result);
                    }
                }
            }

            logger.debug("Node driver stopped").field("state", engine.state()).log();
            engine
        });

        Self {
            requests: request_tx,
            events: event_rx,
            task,
        }
    }

    /// Execute `command` on the engine and return its outcome
    pub async fn request(&self, command: DriverCommand) -> Result<()> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(DriverRequest { command, reply })
            .await
            .map_err(|_| BenchmarkError::internal("Node driver is not running"))?;
        outcome
            .await
            .map_err(|_| BenchmarkError::internal("Node driver dropped the request"))?
    }

    /// Next engine event; `None` once the driver has stopped
    pub async fn next_event(&mut self) -> Option<BenchmarkEvent> {
        self.events.recv().await
    }

    /// Wait for the first event `accept` returns a value for
    pub async fn wait_for<R, F>(&mut self, limit: Duration, mut accept: F) -> Result<R>
    where
        F: FnMut(BenchmarkEvent) -> Option<R>,
    {
        let wait = async {
            while let Some(event) = self.events.recv().await {
                if let Some(result) = accept(event) {
                    return Ok(result);
                }
            }
            Err(BenchmarkError::internal("Node driver stopped"))
        };
        tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| BenchmarkError::timeout(format!("No matching event within {:?}", limit)))?
    }

    /// Stop the task and take the engine back
    pub async fn shutdown(self) -> Result<BenchmarkEngine<T, NodePlatform>> {
        drop(self.requests);
        self.task
            .await
            .map_err(|e| BenchmarkError::internal(format!("Node driver task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSettings;
    use crate::platform::SharedClock;
    use crate::transport::{Link, LinkStack, LoopbackHub, LoopbackLink};
    use crate::types::{NetworkAddress, TestMode, TestState};

    fn node(hub: &LoopbackHub, address: u16) -> NodeDriver<LinkStack<LoopbackLink>> {
        let settings = EngineSettings {
            address: NetworkAddress(address),
            discovery_timeout: Duration::from_millis(50),
            ..EngineSettings::default()
        };
        let link = hub.attach(settings.address);
        let platform = NodePlatform::with_clock(hub.clock().clone(), Some(link.mac_stats()));
        let stack = LinkStack::new(link, &settings, hub.clock().clone(), Logger::silent("stack"));
        let engine = BenchmarkEngine::new(settings, stack, platform, Logger::silent("node"));
        NodeDriver::spawn(engine, Duration::from_millis(1), Logger::silent("driver"))
    }

    #[tokio::test]
    async fn test_driven_ack_run() {
        let hub = LoopbackHub::new(SharedClock::monotonic(), Duration::ZERO);
        let slave = node(&hub, 2);
        let mut master = node(&hub, 1);

        master.request(DriverCommand::Discover).await.unwrap();
        let peers = master
            .wait_for(Duration::from_secs(5), |event| match event {
                BenchmarkEvent::DiscoveryCompleted { peer_count } => Some(peer_count),
                _ => None,
            })
            .await
            .unwrap();
        assert_eq!(peers, 1);

        let configuration = TestConfiguration {
            payload_length: 8,
            ack_timeout_ms: 500,
            packet_count: 10,
            mode: TestMode::Ack,
        };
        master.request(DriverCommand::Init(configuration)).await.unwrap();
        master.request(DriverCommand::Start).await.unwrap();

        let results = master
            .wait_for(Duration::from_secs(10), |event| match event {
                BenchmarkEvent::TestCompleted(result) => Some(result),
                _ => None,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(results.status.packets_left, 0);
        assert_eq!(results.remote.map(|r| r.rx_counters.packets_received), Some(10));

        let engine = master.shutdown().await.unwrap();
        assert_eq!(engine.state(), TestState::Idle);
        slave.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_requests_report_engine_errors() {
        let hub = LoopbackHub::new(SharedClock::monotonic(), Duration::ZERO);
        let master = node(&hub, 1);
        assert!(matches!(
            master.request(DriverCommand::Start).await,
            Err(BenchmarkError::InvalidArgument(_))
        ));
        assert!(matches!(
            master.request(DriverCommand::SelectPeer(0)).await,
            Err(BenchmarkError::InvalidArgument(_))
        ));
    }
}
