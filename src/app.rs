//! Main application orchestration and execution

use crate::{
    cli::{Cli, Command, Role, RunArgs, SimulateArgs},
    config::{display_config_summary, load_config},
    driver::{DriverCommand, NodeDriver},
    engine::{BenchmarkEngine, EngineSettings},
    error::{BenchmarkError, Result},
    logging::Logger,
    models::{BenchmarkEvent, Config, TestConfiguration, TestResults},
    output::{OutputCoordinator, OutputFormatterFactory},
    platform::{NodePlatform, SharedClock},
    sim::{run_simulation, SimulationOptions},
    transport::{LinkStack, LossPolicy, UdpLink},
    types::TestMode,
};
use std::time::Duration;

type UdpDriver = NodeDriver<LinkStack<UdpLink>>;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(BenchmarkError::invalid_argument)?;
        Ok(Self { cli })
    }

    /// Run the selected subcommand
    pub async fn run(self) -> Result<()> {
        let mut config = load_config(self.cli.clone())?;
        config.enable_color = config.enable_color && self.cli.use_colors();

        let logger = Logger::with_config("lbm", &config);

        if config.debug {
            println!("{} v{} ({}, built {})", crate::PKG_NAME, crate::VERSION, crate::GIT_COMMIT, crate::BUILD_TIME);
            if let Some(session) = logger.session_id() {
                println!("Session: {}", session);
            }
            println!("\nConfiguration Summary:");
            println!("{}\n", display_config_summary(&config));
        }
        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_formatter(
            config.enable_color,
            config.verbose,
        ));

        match &self.cli.command {
            Command::Simulate(args) => simulate(&config, args, &coordinator, &logger),
            Command::Run(args) => match args.role {
                Role::Master => run_master(&config, args, &coordinator, &logger).await,
                Role::Slave => run_slave(&config, args, &coordinator, &logger).await,
            },
            Command::Config { json } => {
                if *json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    println!("{}", display_config_summary(&config));
                }
                Ok(())
            }
        }
    }
}

fn simulate(config: &Config, args: &SimulateArgs, coordinator: &OutputCoordinator, logger: &Logger) -> Result<()> {
    let options = SimulationOptions {
        latency: Duration::from_millis(args.latency_ms),
        loss: LossPolicy {
            drop_every_nth_ping: args.drop_every,
            drop_sequences: args.drop_seq.clone(),
        },
        ..SimulationOptions::from_config(config)
    };

    let report = run_simulation(config, &options, &logger.named("sim"))?;
    println!(
        "{}",
        coordinator.display_report(&report.master, &report.peers, report.selected, args.raw)?
    );

    if config.verbose {
        if let Some(slave) = &report.slave {
            println!("\n{}", coordinator.display_slave_report(slave, false)?);
        }
        println!(
            "\n{}",
            coordinator
                .formatter()
                .format_success(&format!("Simulated {:.3} s of link time", report.elapsed.as_secs_f64()))?
        );
    }
    Ok(())
}

async fn spawn_udp_node(config: &Config, logger: &Logger, role: &str) -> Result<UdpDriver> {
    let settings = EngineSettings::from_config(config);
    let link = UdpLink::bind(config.listen, settings.address, config.peers.clone(), logger.named("udp")).await?;
    let clock = SharedClock::monotonic();
    let stack = LinkStack::new(link, &settings, clock.clone(), logger.named("stack"));
    let platform = NodePlatform::with_clock(clock, Some(stack.mac_stats()));
    let engine = BenchmarkEngine::new(settings, stack, platform, logger.named(role));
    Ok(NodeDriver::spawn(engine, config.tick_interval(), logger.named("driver")))
}

/// Upper bound on how long a test over a real link may take
fn test_time_limit(test: &TestConfiguration, tick: Duration) -> Duration {
    let per_exchange = match test.mode {
        TestMode::Unidirectional => tick * 2,
        _ => test.ack_timeout() + tick * 2,
    };
    per_exchange * test.packet_count + Duration::from_secs(10)
}

async fn run_master(config: &Config, args: &RunArgs, coordinator: &OutputCoordinator, logger: &Logger) -> Result<()> {
    let mut driver = spawn_udp_node(config, logger, "master").await?;

    driver.request(DriverCommand::Discover).await?;
    let peer_count = driver
        .wait_for(config.discovery_timeout() + Duration::from_secs(1), |event| match event {
            BenchmarkEvent::DiscoveryCompleted { peer_count } => Some(peer_count),
            _ => None,
        })
        .await?;
    if peer_count == 0 {
        driver.shutdown().await?;
        return Err(BenchmarkError::invalid_state("No peer answered the discovery"));
    }

    if let Some(index) = args.peer_index {
        driver.request(DriverCommand::SelectPeer(index)).await?;
    }
    driver.request(DriverCommand::Init(config.test)).await?;
    driver.request(DriverCommand::Start).await?;

    let limit = test_time_limit(&config.test, config.tick_interval());
    let outcome = tokio::select! {
        outcome = driver.wait_for(limit, |event| match event {
            BenchmarkEvent::TestStarted(Err(e)) | BenchmarkEvent::TestStopped(Err(e)) => Some(Err(e)),
            BenchmarkEvent::TestCompleted(result) => Some(result),
            _ => None,
        }) => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(outcome) = outcome else {
        logger.warn("Interrupted, aborting the test").log();
        driver.request(DriverCommand::Abort).await?;
        driver.shutdown().await?;
        return Err(BenchmarkError::invalid_state("Test interrupted"));
    };

    let results = match outcome.and_then(|result| result) {
        Ok(results) => results,
        Err(e) => {
            driver.request(DriverCommand::Abort).await?;
            driver.shutdown().await?;
            return Err(e);
        }
    };

    let engine = driver.shutdown().await?;
    println!(
        "{}",
        coordinator.display_report(
            &results,
            engine.peer_table().entries(),
            engine.peer_table().selected_index(),
            args.raw
        )?
    );
    Ok(())
}

async fn run_slave(config: &Config, args: &RunArgs, coordinator: &OutputCoordinator, logger: &Logger) -> Result<()> {
    let mut driver = spawn_udp_node(config, logger, "slave").await?;
    logger
        .info("Waiting for a master")
        .field("address", config.address().to_string())
        .log();

    loop {
        let event = tokio::select! {
            event = driver.next_event() => event,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(event) = event else {
            break;
        };

        match event {
            BenchmarkEvent::TestStarted(Ok(())) => logger.info("Test started by master").log(),
            BenchmarkEvent::TestCompleted(Ok(results)) => {
                print_slave_results(coordinator, &results, args.raw)?;
                if args.once {
                    break;
                }
            }
            other if other.is_error() => logger.warn("Test failed").field("event", other.name()).log(),
            _ => {}
        }
    }

    driver.shutdown().await?;
    Ok(())
}

fn print_slave_results(coordinator: &OutputCoordinator, results: &TestResults, raw: bool) -> Result<()> {
    println!("{}", coordinator.display_slave_report(results, raw)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_time_limit_scales_with_exchanges() {
        let tick = Duration::from_millis(2);
        let mut test = TestConfiguration {
            mode: TestMode::Ack,
            payload_length: 10,
            ack_timeout_ms: 100,
            packet_count: 10,
        };
        assert_eq!(test_time_limit(&test, tick), Duration::from_millis(10 * 104 + 10_000));

        test.mode = TestMode::Unidirectional;
        assert_eq!(test_time_limit(&test, tick), Duration::from_millis(10 * 4 + 10_000));
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        let cli = Cli::parse_from(["lbm", "--color", "--no-color", "config"]);
        assert!(matches!(App::new(cli), Err(BenchmarkError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_simulate_command_runs() {
        let cli = Cli::parse_from(["lbm", "--no-color", "--log-level", "error", "simulate", "-n", "5", "-l", "8"]);
        assert!(App::new(cli).unwrap().run().await.is_ok());
    }
}
