//! Benchmark engine: test coordinator, discovery and ping driver
//!
//! One [`BenchmarkEngine`] owns all protocol state of a node. It never blocks:
//! requests go out through the [`Transport`], and everything that comes back
//! (ping events, discovery responses, control messages) is fed in through
//! [`BenchmarkEngine::handle_inbound`], usually by [`BenchmarkEngine::poll`].
//! A periodic [`BenchmarkEngine::process`] call advances the state machine.
//!
//! The same engine acts as master (it started the test with
//! [`BenchmarkEngine::test_start`]) or slave (a peer sent it a start request).

pub mod state;

use crate::control::{ControlCommand, ControlMessage, PendingCommands};
use crate::logging::Logger;
use crate::models::{
    BenchmarkEvent, BenchmarkResult, Config, MacCounters, TestConfiguration, TestResults, TestStatus,
};
use crate::peers::{PeerDirectory, PeerEntry};
use crate::ping::{PingEvent, PingRequest, SequenceCounter};
use crate::platform::Platform;
use crate::transport::{Inbound, Transport};
use crate::types::{
    BenchmarkError, DeviceId, NetworkAddress, ProfileId, RemoteStatus, Result, TestState,
};
use state::{PingEffect, TickAction};
use std::time::Duration;

/// Receiver of engine lifecycle events
pub type EventCallback = Box<dyn FnMut(&BenchmarkEvent) + Send>;

/// Node-level settings the engine runs with
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub address: NetworkAddress,
    pub device_id: DeviceId,
    pub profile: ProfileId,
    pub max_peers: usize,
    pub discovery_timeout: Duration,
    /// Consecutive failed transmissions tolerated before the test is aborted
    pub tx_retry_limit: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            address: config.address(),
            device_id: config.device(),
            profile: config.profile(),
            max_peers: config.max_peers,
            discovery_timeout: config.discovery_timeout(),
            tx_retry_limit: config.tx_retry_limit,
        }
    }
}

pub struct BenchmarkEngine<T: Transport, P: Platform> {
    settings: EngineSettings,
    transport: T,
    platform: P,
    logger: Logger,
    callback: Option<EventCallback>,

    state: TestState,
    configuration: Option<TestConfiguration>,
    status: TestStatus,
    local_result: BenchmarkResult,
    remote_result: Option<BenchmarkResult>,

    peers: PeerDirectory,
    discovery_deadline_us: Option<u64>,

    /// Peer the current master test runs against
    test_peer: Option<NetworkAddress>,
    pending: PendingCommands,
    awaiting_results: bool,

    mac_baseline: MacCounters,
    start_time_ms: u64,
    sequence: SequenceCounter,
    /// Sequence number of the last ping handed to the transport
    in_flight: u16,
    /// The transport reported the in-flight frame as scheduled
    in_flight_scheduled: bool,
    tx_failures: u32,
    correlation_id: Option<String>,
}

impl<T: Transport, P: Platform> BenchmarkEngine<T, P> {
    pub fn new(settings: EngineSettings, transport: T, platform: P, logger: Logger) -> Self {
        logger.add_context_field("node", settings.address.to_string());
        Self {
            peers: PeerDirectory::new(settings.max_peers),
            settings,
            transport,
            platform,
            logger,
            callback: None,
            state: TestState::Idle,
            configuration: None,
            status: TestStatus::default(),
            local_result: cleared_result(),
            remote_result: None,
            discovery_deadline_us: None,
            test_peer: None,
            pending: PendingCommands::default(),
            awaiting_results: false,
            mac_baseline: MacCounters::UNSUPPORTED,
            start_time_ms: 0,
            sequence: SequenceCounter::default(),
            in_flight: 0,
            in_flight_scheduled: false,
            tx_failures: 0,
            correlation_id: None,
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn status(&self) -> &TestStatus {
        &self.status
    }

    pub fn local_result(&self) -> &BenchmarkResult {
        &self.local_result
    }

    pub fn remote_result(&self) -> Option<&BenchmarkResult> {
        self.remote_result.as_ref()
    }

    pub fn configuration(&self) -> Option<&TestConfiguration> {
        self.configuration.as_ref()
    }

    pub fn peer_table(&self) -> &PeerDirectory {
        &self.peers
    }

    pub fn selected_peer(&self) -> Option<&PeerEntry> {
        self.peers.selected()
    }

    pub fn local_device_id(&self) -> DeviceId {
        self.settings.device_id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery_deadline_us.is_some()
    }

    /// Whether a test is running, waiting for its start acknowledgment or
    /// waiting for the peer's results
    pub fn is_busy(&self) -> bool {
        !self.state.is_idle()
            || self.status.test_in_progress
            || self.pending.is_pending(ControlCommand::StartRequest)
            || self.awaiting_results
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Install the event receiver without configuring a test (slave nodes)
    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }

    /// Store the test configuration and event receiver
    pub fn test_init(&mut self, configuration: TestConfiguration, callback: EventCallback) -> Result<()> {
        if self.is_busy() {
            self.logger
                .warn("Stop current test in order to modify test settings")
                .field("state", self.state)
                .log();
            return Err(BenchmarkError::AlreadyRunning);
        }
        configuration.validate()?;

        self.configuration = Some(configuration);
        self.callback = Some(callback);
        self.status.packets_left = configuration.packet_count;
        self.status.waiting_for_ack = 0;
        self.status.frame_number = 0;

        self.logger
            .debug("Test configured")
            .field("configuration", configuration)
            .log();
        Ok(())
    }

    /// Ask the selected peer to start; the local test begins once it agrees
    pub fn test_start(&mut self) -> Result<()> {
        if self.is_busy() {
            self.logger.warn("Stop current test in order to start a new one").log();
            return Err(BenchmarkError::AlreadyRunning);
        }
        let configuration = self
            .configuration
            .ok_or_else(|| BenchmarkError::invalid_argument("Provide a test configuration before starting a test"))?;
        if self.is_discovering() {
            return Err(BenchmarkError::invalid_state("Peer discovery is in progress"));
        }
        let peer = self
            .peers
            .selected()
            .map(|entry| entry.address)
            .ok_or_else(|| BenchmarkError::invalid_state("No peer selected"))?;

        self.status.clear();
        self.status.packets_left = configuration.packet_count;
        self.result_clear();
        self.pending.clear();
        self.awaiting_results = false;
        self.test_peer = Some(peer);

        self.logger
            .info("Send start request to the remote peer")
            .field("peer", peer)
            .field("mode", configuration.mode)
            .field("packets", configuration.packet_count)
            .log();
        self.send_request(peer, ControlCommand::StartRequest)
    }

    /// Stop the running test
    ///
    /// On a slave this finishes the slave test. On a master the local results
    /// are frozen and the peer is asked to stop; `TestStopped` follows its answer.
    /// A start or results request still waiting for its answer is cancelled,
    /// and the late answer is dropped.
    pub fn test_stop(&mut self) -> Result<()> {
        if self.state == TestState::WaitingForStopCmd {
            return self.stop_slave();
        }
        if self.configuration.is_none() {
            return Err(BenchmarkError::invalid_argument("No test configuration"));
        }
        if self.state.is_idle() && self.cancel_outstanding_requests() {
            return Ok(());
        }
        if self.state.is_idle() {
            self.logger.debug("There is no ongoing test").log();
            return Err(BenchmarkError::invalid_state("There is no ongoing test"));
        }

        self.logger
            .info("Reset benchmark state")
            .field("state", self.state)
            .field("packets_left", self.status.packets_left)
            .field("acks_lost", self.status.acks_lost)
            .log();
        self.state = TestState::Idle;
        self.finalize_local_result();

        if self.status.test_in_progress {
            self.status.test_in_progress = false;
            if let Some(peer) = self.test_peer {
                return self.send_request(peer, ControlCommand::StopRequest);
            }
        }
        Ok(())
    }

    /// Force the test to stop, ignoring the outcome
    pub fn test_abort(&mut self) {
        self.logger.warn("Abort benchmark execution").log();
        if let Err(e) = self.test_stop() {
            self.logger.debug("Nothing to abort").error_info(&e).log();
        }
    }

    /// Rebuild the peer directory from a fresh broadcast discovery
    pub fn peer_discover(&mut self) -> Result<()> {
        if self.is_busy() {
            self.logger.warn("Stop current test in order to start peer discovery").log();
            return Err(BenchmarkError::AlreadyRunning);
        }

        self.peers.clear();
        self.transport.send_discovery(self.settings.profile)?;
        self.discovery_deadline_us =
            Some(self.platform.now_us() + self.settings.discovery_timeout.as_micros() as u64);

        self.logger
            .info("Peer discovery started")
            .field("profile", self.settings.profile)
            .field("timeout_ms", self.settings.discovery_timeout.as_millis() as u64)
            .log();
        Ok(())
    }

    pub fn select_peer(&mut self, index: usize) -> Result<()> {
        if self.is_busy() {
            return Err(BenchmarkError::AlreadyRunning);
        }
        self.peers.select(index)
    }

    /// Ask the peer of the last test for its results
    pub fn peer_results_request_send(&mut self) -> Result<()> {
        let peer = self
            .test_peer
            .or_else(|| self.peers.selected().map(|entry| entry.address))
            .ok_or_else(|| BenchmarkError::invalid_state("No peer selected"))?;

        self.logger
            .info("Send a request for benchmark results to the remote peer")
            .field("peer", peer)
            .log();
        self.awaiting_results = true;
        self.send_request(peer, ControlCommand::ResultsRequest)
            .inspect_err(|_| self.awaiting_results = false)
    }

    /// Drain the transport and handle everything it reported
    pub fn poll(&mut self) -> Result<()> {
        for inbound in self.transport.poll()? {
            self.handle_inbound(inbound);
        }
        Ok(())
    }

    pub fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Ping(event) => self.on_ping_event(event),
            Inbound::DiscoveryResponse { address, profile } => self.on_discovery_response(address, profile),
            Inbound::AddressResolved { address, device_id } => {
                if self.peers.resolve(address, device_id) {
                    self.logger
                        .debug("Peer device identifier resolved")
                        .field("peer", address)
                        .field("device_id", device_id.to_string())
                        .log();
                }
            }
            Inbound::Control { source, message } => match message {
                ControlMessage::Request(command) => self.on_control_request(source, command),
                ControlMessage::Response { command, status } => {
                    self.command_response_handler(source, command, status)
                }
                ControlMessage::Results(result) => self.results_received(source, result),
            },
        }
    }

    /// Advance the state machine; call every tick
    pub fn process(&mut self) {
        self.check_discovery_timeout();

        let (next, action) = state::on_tick(self.state, self.status.packets_left);
        if next != self.state {
            self.logger
                .trace("State transition")
                .field("from", self.state)
                .field("to", next)
                .log();
            self.state = next;
        }

        match action {
            TickAction::Wait => {}
            TickAction::SendPing => self.send_ping(),
            TickAction::Stop => {
                self.logger.info("Benchmark test finished, proceed with the tear down").log();
                if let Err(e) = self.test_stop() {
                    self.logger.error("Failed to stop the test").error_info(&e).log();
                }
            }
            TickAction::Abort => self.abort_on_error(),
        }
    }

    /// Apply one ping event; events that do not fit the current state are dropped
    pub fn on_ping_event(&mut self, event: PingEvent) {
        let mode = self.configuration.map(|c| c.mode).unwrap_or_default();
        let Some(transition) = state::on_ping_event(self.state, event.kind, mode) else {
            self.logger
                .trace("Stale ping event dropped")
                .field("event", event.kind)
                .field("state", self.state)
                .field("sequence", event.sequence)
                .log();
            return;
        };

        if transition.settles_exchange() && event.sequence != self.in_flight {
            self.logger
                .trace("Confirmation for another frame dropped")
                .field("event", event.kind)
                .field("sequence", event.sequence)
                .field("expected", self.in_flight)
                .log();
            return;
        }

        self.state = transition.next;

        match transition.effect {
            PingEffect::Advance => self.tx_failures = 0,
            PingEffect::RecordLatency => {
                self.tx_failures = 0;
                self.status.waiting_for_ack = 0;
                self.status.latency.update(event.delay_us / 2);
            }
            PingEffect::CountLost => {
                self.tx_failures = 0;
                self.status.waiting_for_ack = 0;
                self.status.acks_lost += 1;
                self.logger
                    .debug("Transmission timed out")
                    .field("sequence", event.sequence)
                    .log();
            }
            PingEffect::Scheduled { await_confirmation } => {
                self.status.packets_left = self.status.packets_left.saturating_sub(1);
                self.status.frame_number = event.sequence;
                self.in_flight_scheduled = true;
                if await_confirmation {
                    self.status.waiting_for_ack = event.sequence;
                }
            }
            PingEffect::TxFailure => {
                // The frame never left; it is sent again
                if std::mem::take(&mut self.in_flight_scheduled) {
                    self.status.packets_left += 1;
                }
                self.register_tx_failure();
            }
            PingEffect::CountReceived => {
                if self.status.reset_counters_pending {
                    // First test frame: drop what the control exchange cost
                    self.platform.cpu_clear();
                    self.mac_baseline = self.platform.mac_tx_counters();
                    self.status.reset_counters_pending = false;
                }
                let rx = &mut self.local_result.rx_counters;
                rx.bytes_received = rx.bytes_received.wrapping_add(u32::from(event.length));
                rx.packets_received = rx.packets_received.wrapping_add(1);
            }
        }
    }

    /// Handle the answer to one of our control requests
    pub fn command_response_handler(&mut self, source: NetworkAddress, command: ControlCommand, status: RemoteStatus) {
        if self.test_peer != Some(source) || !self.pending.take(command) {
            self.logger
                .debug("Unexpected control response dropped")
                .field("command", command)
                .field("source", source)
                .field("status", status.to_string())
                .log();
            return;
        }

        if !status.is_success() {
            let error = BenchmarkError::remote_failure(command, status);
            self.logger
                .warn("Remote peer rejected a control command")
                .error_info(&error)
                .log();
            match command {
                ControlCommand::StartRequest => self.emit(BenchmarkEvent::TestStarted(Err(error))),
                ControlCommand::StopRequest => self.emit(BenchmarkEvent::TestStopped(Err(error))),
                // No event for a rejected results request
                ControlCommand::ResultsRequest => self.awaiting_results = false,
            }
            self.test_abort();
            return;
        }

        match command {
            ControlCommand::StartRequest => {
                self.logger.info("Remote peer successfully started benchmark execution").log();
                self.start_master();
            }
            ControlCommand::StopRequest => {
                self.logger.info("Remote peer successfully finished benchmark execution").log();
                self.stop_master();
            }
            ControlCommand::ResultsRequest => {
                self.logger.debug("Remote peer accepted the results request").log();
            }
        }
    }

    /// Store the peer's result and complete the test
    pub fn results_received(&mut self, source: NetworkAddress, result: BenchmarkResult) {
        if !self.state.is_idle() || !self.awaiting_results || self.test_peer != Some(source) {
            self.logger
                .debug("Unsolicited results dropped")
                .field("source", source)
                .log();
            return;
        }

        self.logger
            .info("Benchmark results received from the remote peer")
            .field("duration_ms", result.duration_ms)
            .log();
        self.awaiting_results = false;
        self.remote_result = Some(result);
        if let Some(id) = self.correlation_id.take() {
            self.logger.end_operation(&id, "benchmark test", true);
        }
        let results = self.results_bundle();
        self.emit(BenchmarkEvent::TestCompleted(Ok(results)));
    }

    /// Enter slave mode on a peer's start request
    pub fn start_slave(&mut self) -> Result<()> {
        if !self.state.is_idle() || self.is_discovering() {
            self.logger.warn("Stop current test in order to start a remote test").log();
            return Err(BenchmarkError::AlreadyRunning);
        }

        self.state = TestState::WaitingForStopCmd;
        self.status.clear();
        self.start_time_ms = self.platform.now_ms();
        self.result_clear();
        self.mac_baseline = self.platform.mac_tx_counters();
        self.platform.cpu_start();
        self.status.test_in_progress = true;
        self.status.reset_counters_pending = true;
        self.correlation_id = Some(self.logger.start_operation("remote benchmark test"));

        self.emit(BenchmarkEvent::TestStarted(Ok(())));
        Ok(())
    }

    /// Leave slave mode on a peer's stop request
    pub fn stop_slave(&mut self) -> Result<()> {
        if self.state != TestState::WaitingForStopCmd {
            return Err(BenchmarkError::invalid_state("No remote test is running"));
        }

        self.finalize_local_result();
        self.state = TestState::Idle;
        self.status.test_in_progress = false;
        if let Some(id) = self.correlation_id.take() {
            self.logger.end_operation(&id, "remote benchmark test", true);
        }

        self.logger
            .info("Benchmark finished on the remote peer")
            .field("packets_received", self.local_result.rx_counters.packets_received)
            .field("bytes_received", self.local_result.rx_counters.bytes_received)
            .log();

        let results = Box::new(TestResults {
            configuration: None,
            status: self.status,
            local: self.local_result,
            remote: None,
        });
        self.emit(BenchmarkEvent::TestCompleted(Ok(results)));
        Ok(())
    }

    fn on_discovery_response(&mut self, address: NetworkAddress, profile: ProfileId) {
        if !self.is_discovering() || profile != self.settings.profile {
            self.logger
                .trace("Discovery response ignored")
                .field("peer", address)
                .field("profile", profile)
                .log();
            return;
        }

        if !self.peers.insert(PeerEntry::new(address)) {
            self.logger
                .debug("Peer not added to the directory")
                .field("peer", address)
                .field("peer_count", self.peers.len())
                .log();
            return;
        }

        self.logger.info("Peer found").field("peer", address).log();
        // Best effort: the identifier stays zero if nobody answers
        if let Err(e) = self.transport.resolve_address(address) {
            self.logger
                .debug("Failed to request the peer device identifier")
                .error_info(&e)
                .log();
        }
    }

    fn check_discovery_timeout(&mut self) {
        let Some(deadline) = self.discovery_deadline_us else {
            return;
        };
        if self.platform.now_us() < deadline {
            return;
        }

        self.discovery_deadline_us = None;
        self.peers.select_last();
        let peer_count = self.peers.len();
        self.logger
            .info("Discovery timeout")
            .field("peer_count", peer_count)
            .log();
        self.emit(BenchmarkEvent::DiscoveryCompleted { peer_count });
    }

    fn on_control_request(&mut self, source: NetworkAddress, command: ControlCommand) {
        self.logger
            .debug("Control request received")
            .field("command", command)
            .field("source", source)
            .log();

        let status = match command {
            ControlCommand::StartRequest => self.start_slave().map_or_else(|e| e.remote_status(), |_| RemoteStatus::SUCCESS),
            ControlCommand::StopRequest => self.stop_slave().map_or_else(|e| e.remote_status(), |_| RemoteStatus::SUCCESS),
            ControlCommand::ResultsRequest if self.state == TestState::WaitingForStopCmd => RemoteStatus::FAILURE,
            ControlCommand::ResultsRequest => RemoteStatus::SUCCESS,
        };

        self.send_control(source, ControlMessage::Response { command, status });
        if command == ControlCommand::ResultsRequest && status.is_success() {
            self.send_control(source, ControlMessage::Results(self.local_result));
        }
    }

    fn start_master(&mut self) {
        if !self.state.is_idle() {
            self.logger.error("Start acknowledged while a test is running").log();
            return;
        }

        self.mac_baseline = self.platform.mac_tx_counters();
        self.platform.cpu_start();
        self.status.test_in_progress = true;
        self.start_time_ms = self.platform.now_ms();
        self.tx_failures = 0;
        self.correlation_id = Some(self.logger.start_operation("benchmark test"));

        self.state = TestState::WaitingForTxBuffer;
        self.send_ping();

        self.emit(BenchmarkEvent::TestStarted(Ok(())));
    }

    fn stop_master(&mut self) {
        if !self.state.is_idle() {
            self.logger
                .error("Requested remote results, but the device is in an incorrect state")
                .field("state", self.state)
                .log();
            return;
        }

        let outcome = self.peer_results_request_send();
        self.emit(BenchmarkEvent::TestStopped(outcome));
    }

    /// Hand the next exchange to the transport
    fn send_ping(&mut self) {
        if self.status.packets_left == 0 || self.state != TestState::WaitingForTxBuffer {
            return;
        }
        let (Some(configuration), Some(peer)) = (self.configuration, self.test_peer) else {
            self.state = TestState::Error;
            return;
        };

        let request = PingRequest::new(
            peer,
            self.sequence.next(),
            configuration.payload_length,
            configuration.mode,
            configuration.ack_timeout_ms,
        );
        self.state = state::on_ping_sent(configuration.mode);
        self.in_flight = request.sequence;
        self.in_flight_scheduled = false;

        if let Err(e) = self.transport.send_ping(request) {
            self.logger
                .debug("Ping not scheduled, retrying on the next tick")
                .error_info(&e)
                .log();
            self.state = TestState::WaitingForTxBuffer;
            self.register_tx_failure();
        }
    }

    /// Forget control requests whose answers no longer matter
    fn cancel_outstanding_requests(&mut self) -> bool {
        let start = self.pending.is_pending(ControlCommand::StartRequest);
        if !start && !self.awaiting_results {
            return false;
        }

        self.logger
            .info("Outstanding control requests cancelled")
            .field("start_pending", start)
            .field("awaiting_results", self.awaiting_results)
            .log();
        self.pending.clear();
        self.awaiting_results = false;
        if let Some(id) = self.correlation_id.take() {
            self.logger.end_operation(&id, "benchmark test", false);
        }
        true
    }

    fn register_tx_failure(&mut self) {
        self.tx_failures += 1;
        if self.tx_failures > self.settings.tx_retry_limit {
            self.logger
                .error("Transmit retry limit exceeded")
                .field("attempts", self.tx_failures)
                .log();
            self.state = TestState::Error;
        }
    }

    fn abort_on_error(&mut self) {
        let sent = self
            .configuration
            .map(|c| c.packet_count.saturating_sub(self.status.packets_left))
            .unwrap_or_default();
        let attempts = self.tx_failures;
        self.logger
            .error("Error occurred during the test transmission")
            .field("packets_sent", sent)
            .log();

        self.state = TestState::Idle;
        self.finalize_local_result();
        if self.status.test_in_progress {
            self.status.test_in_progress = false;
            // Release the peer; its answer no longer matters
            if let Some(peer) = self.test_peer {
                self.send_control(peer, ControlMessage::Request(ControlCommand::StopRequest));
            }
        }
        if let Some(id) = self.correlation_id.take() {
            self.logger.end_operation(&id, "benchmark test", false);
        }

        self.emit(BenchmarkEvent::TestStopped(Err(BenchmarkError::transport(format!(
            "Test aborted after {} failed transmissions, {} packet(s) sent",
            attempts, sent
        )))));
    }

    fn send_request(&mut self, peer: NetworkAddress, command: ControlCommand) -> Result<()> {
        self.pending.mark(command);
        self.transport
            .send_control(peer, ControlMessage::Request(command))
            .inspect_err(|e| {
                self.pending.take(command);
                self.logger
                    .warn("Failed to send control request")
                    .field("command", command)
                    .error_info(e)
                    .log();
            })
    }

    fn send_control(&mut self, peer: NetworkAddress, message: ControlMessage) {
        if let Err(e) = self.transport.send_control(peer, message) {
            self.logger
                .warn("Failed to send control message")
                .field("peer", peer)
                .error_info(&e)
                .log();
        }
    }

    fn result_clear(&mut self) {
        self.local_result = cleared_result();
        self.remote_result = None;
        self.status.latency.clear();
        self.platform.cpu_clear();
        self.mac_baseline = self.platform.mac_tx_counters();
    }

    /// Duration, MAC delta and CPU load of the test window
    fn finalize_local_result(&mut self) {
        self.local_result.duration_ms = self.platform.now_ms().saturating_sub(self.start_time_ms) as u32;
        self.local_result.mac_tx_counters = self.platform.mac_tx_counters().delta_since(&self.mac_baseline);
        self.local_result.cpu_utilization = self.platform.cpu_utilization();
        self.platform.cpu_stop();
    }

    fn results_bundle(&self) -> Box<TestResults> {
        Box::new(TestResults {
            configuration: self.configuration,
            status: self.status,
            local: self.local_result,
            remote: self.remote_result,
        })
    }

    fn emit(&mut self, event: BenchmarkEvent) {
        self.logger
            .debug("Benchmark event")
            .field("event", event.name())
            .field("error", event.is_error())
            .log();
        if let Some(callback) = self.callback.as_mut() {
            callback(&event);
        }
    }
}

fn cleared_result() -> BenchmarkResult {
    BenchmarkResult {
        rx_counters: crate::models::RxCounters {
            rx_error: None,
            rx_total: None,
            ..Default::default()
        },
        ..Default::default()
    }
}
