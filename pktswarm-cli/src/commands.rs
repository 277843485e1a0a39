use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pktswarm_capture::PcapSource;
use pktswarm_config::PktswarmConfig;
use pktswarm_core::FlowTable;
use pktswarm_engine::Swarm;
use pktswarm_handlers::HandlerRegistry;
use pktswarm_telemetry::logging::EventLogger;
use pktswarm_telemetry::metrics::MetricsRecorder;

/// Lines printed before the column header is repeated.
const HEADER_EVERY: u64 = 20;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pktswarm", version, about)]
pub struct Cli {
    /// Read frames from a pcap file
    #[arg(short = 'r', long = "read", value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Capture live from a network interface
    #[arg(short, long, value_name = "DEVICE")]
    pub interface: Option<String>,

    /// BPF filter applied to the capture
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Seconds between summary lines
    #[arg(short = 'd', long, value_name = "SECS")]
    pub interval: Option<f64>,

    /// Monitoring module, repeatable (BasicStats, DistPktSize, SessionCount)
    #[arg(short, long = "module", value_name = "NAME")]
    pub modules: Vec<String>,

    /// Track flows and report how many are live
    #[arg(long)]
    pub flows: bool,

    /// Seconds a flow may idle before it is evicted
    #[arg(long, value_name = "SECS")]
    pub flow_timeout: Option<u64>,

    /// Print report lines only, without column headers
    #[arg(short, long)]
    pub quiet: bool,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Print Prometheus metrics on exit
    #[arg(long)]
    pub metrics: bool,
}

impl Cli {
    /// Layers command-line values over the loaded configuration.
    pub fn apply(&self, config: &mut PktswarmConfig) {
        if let Some(file) = &self.read {
            config.capture.file = Some(file.clone());
        }
        if let Some(device) = &self.interface {
            config.capture.device = Some(device.clone());
        }
        if let Some(filter) = &self.filter {
            config.capture.filter = Some(filter.clone());
        }
        if let Some(interval) = self.interval {
            config.report.interval_secs = interval;
        }
        if !self.modules.is_empty() {
            config.report.handlers = self.modules.clone();
        }
        if self.flows {
            config.flow.enabled = true;
        }
        if let Some(timeout) = self.flow_timeout {
            config.flow.timeout_secs = timeout;
        }
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = PktswarmConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.check()?;

    if cli.print_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let source = config.capture.source()?;
    EventLogger::init(&config.telemetry.log_level)?;

    let pipeline = HandlerRegistry::new().build(&config.report.handlers)?;
    let flows = if config.flow.enabled {
        Some(FlowTable::new(
            config.flow.timeout(),
            config.flow.slot_count,
            config.flow.slot_duration(),
        )?)
    } else {
        None
    };
    let metrics = MetricsRecorder::new().context("registering metrics")?;
    let frames = PcapSource::open(&source, &config.capture.options())?;
    info!(%source, handlers = ?pipeline.names(), "Capture opened");

    let swarm = Swarm::new(
        frames,
        pipeline,
        flows,
        config.report.interval(),
        metrics.clone(),
    );
    let mut handle = swarm.start();

    let mut out = std::io::stdout();
    let mut printed = 0u64;
    while let Some(message) = handle.messages.recv().await {
        if !cli.quiet && printed % HEADER_EVERY == 0 {
            writeln!(out, "{}", message.header())?;
        }
        writeln!(out, "{}", message.line())?;
        printed += 1;
    }

    let summary = handle.task.await??;
    info!(
        frames = summary.frames,
        skipped = summary.skipped,
        messages = summary.messages,
        "exit"
    );
    EventLogger::log_metrics(&metrics);
    if cli.metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_modules_are_collected() {
        let cli = Cli::try_parse_from([
            "pktswarm", "-r", "trace.pcap", "-m", "BasicStats", "-m", "SessionCount", "-d", "0.5",
        ])
        .unwrap();
        assert_eq!(cli.read, Some(PathBuf::from("trace.pcap")));
        assert_eq!(cli.modules, ["BasicStats", "SessionCount"]);
        assert_eq!(cli.interval, Some(0.5));
        assert!(!cli.quiet);
    }

    #[test]
    fn flags_override_loaded_config() {
        let cli = Cli::try_parse_from([
            "pktswarm",
            "-i",
            "eth0",
            "-f",
            "tcp port 443",
            "--flows",
            "--flow-timeout",
            "30",
            "-q",
        ])
        .unwrap();
        let mut config = PktswarmConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.capture.device.as_deref(), Some("eth0"));
        assert_eq!(config.capture.filter.as_deref(), Some("tcp port 443"));
        assert!(config.flow.enabled);
        assert_eq!(config.flow.timeout_secs, 30);
        assert_eq!(config.report.handlers, ["BasicStats"]);
        assert!(cli.quiet);
        config.check().unwrap();
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let mut config = PktswarmConfig::default();
        config.report.interval_secs = 2.0;
        Cli::default().apply(&mut config);
        assert_eq!(config.report.interval_secs, 2.0);
        assert!(!config.flow.enabled);
    }
}
