//! ## pktswarm-cli
//! **Columnar traffic summaries from a pcap file or a live interface**
//!
//! Reports go to stdout, one line per interval. Logs go to stderr.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
