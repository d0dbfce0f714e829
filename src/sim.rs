//! Deterministic two-node benchmark over the loopback medium
//!
//! Both engines share one virtual clock that advances by one tick per step,
//! so a simulated run takes as long as the CPU needs, not as long as the test.

use crate::engine::{BenchmarkEngine, EngineSettings, EventCallback};
use crate::logging::Logger;
use crate::models::{BenchmarkEvent, Config, TestConfiguration, TestResults};
use crate::peers::PeerEntry;
use crate::platform::{NodePlatform, SharedClock};
use crate::stats::TestSummary;
use crate::transport::{Link, LinkStack, LoopbackHub, LoopbackLink, LossPolicy};
use crate::types::{BenchmarkError, DeviceId, NetworkAddress, Result};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type SimEngine = BenchmarkEngine<LinkStack<LoopbackLink>, NodePlatform>;
type EventLog = Arc<Mutex<Vec<BenchmarkEvent>>>;

/// Knobs of a simulated run
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub test: TestConfiguration,
    /// One-way delivery delay of the medium
    pub latency: Duration,
    pub loss: LossPolicy,
    /// Give up once this much virtual time has passed
    pub time_limit: Duration,
}

impl SimulationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            test: config.test,
            latency: Duration::from_millis(1),
            loss: LossPolicy::none(),
            time_limit: Duration::from_secs(600),
        }
    }
}

/// Outcome of a simulated run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub peers: Vec<PeerEntry>,
    /// Directory index the test ran against
    pub selected: Option<usize>,
    /// Results as seen by the master, including the slave's record
    pub master: TestResults,
    /// The slave's own completion record
    pub slave: Option<TestResults>,
    pub summary: TestSummary,
    /// Virtual time the run took
    pub elapsed: Duration,
}

struct Node {
    engine: SimEngine,
    events: EventLog,
}

impl Node {
    fn new(settings: EngineSettings, hub: &LoopbackHub, logger: Logger) -> Self {
        let link = hub.attach(settings.address);
        let platform = NodePlatform::with_clock(hub.clock().clone(), Some(link.mac_stats()));
        let stack = LinkStack::new(link, &settings, hub.clock().clone(), logger.named("stack"));
        let events: EventLog = Arc::default();
        let mut engine = BenchmarkEngine::new(settings, stack, platform, logger);
        engine.set_event_callback(sink(&events));
        Self { engine, events }
    }

    /// Poll and tick once, charging the real time spent to the node's CPU sampler
    fn step(&mut self) -> Result<()> {
        let started = Instant::now();
        self.engine.poll()?;
        self.engine.process();
        self.engine.platform_mut().record_busy(started.elapsed());
        Ok(())
    }

    fn take_events(&self) -> Vec<BenchmarkEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

fn sink(events: &EventLog) -> EventCallback {
    let events = Arc::clone(events);
    Box::new(move |event| {
        if let Ok(mut events) = events.lock() {
            events.push(event.clone());
        }
    })
}

/// Settings of the simulated peer: the address right after the master's
fn slave_settings(master: &EngineSettings) -> EngineSettings {
    let mut address = master.address.0.wrapping_add(1);
    if NetworkAddress(address).is_broadcast() {
        address = 1;
    }
    EngineSettings {
        address: NetworkAddress(address),
        device_id: DeviceId(master.device_id.0 ^ 0xFFFF),
        ..master.clone()
    }
}

/// Run discovery and one complete test between two simulated nodes
pub fn run_simulation(config: &Config, options: &SimulationOptions, logger: &Logger) -> Result<SimulationReport> {
    options.test.validate()?;

    let clock = SharedClock::virtual_clock();
    let hub = LoopbackHub::new(clock.clone(), options.latency).with_loss(options.loss.clone());
    let tick = config.tick_interval();
    let deadline_us = options.time_limit.as_micros() as u64;

    let master_settings = EngineSettings::from_config(config);
    let mut slave = Node::new(slave_settings(&master_settings), &hub, logger.named("slave"));
    let mut master = Node::new(master_settings, &hub, logger.named("master"));

    let operation = logger.start_operation("simulation");
    logger
        .info("Simulation started")
        .field("mode", options.test.mode)
        .field("packets", options.test.packet_count)
        .field("latency_us", options.latency.as_micros() as u64)
        .log();

    master.engine.peer_discover()?;

    let mut slave_result = None;
    let mut started = false;
    let outcome = loop {
        if clock.now_us() > deadline_us {
            break Err(BenchmarkError::timeout(format!(
                "Simulation did not finish within {:?} of virtual time",
                options.time_limit
            )));
        }
        clock.advance(tick);
        slave.step()?;
        master.step()?;

        for event in slave.take_events() {
            if let BenchmarkEvent::TestCompleted(Ok(results)) = event {
                slave_result = Some(*results);
            }
        }

        let mut finished = None;
        for event in master.take_events() {
            match event {
                BenchmarkEvent::DiscoveryCompleted { peer_count: 0 } => {
                    finished = Some(Err(BenchmarkError::invalid_state("No peer answered the discovery")));
                }
                BenchmarkEvent::DiscoveryCompleted { .. } if !started => {
                    master.engine.test_init(options.test, sink(&master.events))?;
                    master.engine.test_start()?;
                    started = true;
                }
                BenchmarkEvent::TestStarted(Err(e)) | BenchmarkEvent::TestStopped(Err(e)) => {
                    finished = Some(Err(e));
                }
                BenchmarkEvent::TestCompleted(result) => finished = Some(result),
                _ => {}
            }
        }
        if let Some(result) = finished {
            break result;
        }
    };

    logger.end_operation(&operation, "simulation", outcome.is_ok());
    let results = *outcome?;

    // The slave completes before the master asks for its results
    for _ in 0..4 {
        clock.advance(tick);
        slave.step()?;
    }
    for event in slave.take_events() {
        if let BenchmarkEvent::TestCompleted(Ok(results)) = event {
            slave_result = Some(*results);
        }
    }

    let summary = TestSummary::from_results(&results)?;
    Ok(SimulationReport {
        peers: master.engine.peer_table().entries().to_vec(),
        selected: master.engine.peer_table().selected_index(),
        master: results,
        slave: slave_result,
        summary,
        elapsed: Duration::from_micros(clock.now_us()),
    })
}
