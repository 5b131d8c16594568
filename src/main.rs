use anyhow::{bail, Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::runtime::Builder;
use tracing::{error, info};

use dv_routing_sim::logging::init_tracing;
use dv_routing_sim::{Network, SimulationConfig, TopologyConfig};

#[derive(Parser)]
#[command(name = "dvr-sim", about = "Distance Vector Routing simulation")]
struct Cli {
    /// Built-in topology: five-node, six-node or pair
    #[arg(long, default_value = "five-node", conflicts_with = "topology")]
    scenario: String,

    /// JSON topology file ({"routers": [...], "costs": [...]})
    #[arg(long)]
    topology: Option<String>,

    /// Milliseconds per unit of link cost
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,

    /// Give up if the network has not gone quiet after this many seconds
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Check converged costs against an offline shortest-path computation
    #[arg(long)]
    verify: bool,

    /// Write the topology in use to this file
    #[arg(long)]
    export: Option<String>,

    /// Write every recorded table change to this file as JSON
    #[arg(long)]
    journal: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let topology_config = match &cli.topology {
        Some(path) => TopologyConfig::load(path)
            .with_context(|| format!("failed to read topology from {}", path))?,
        None => match TopologyConfig::scenario(&cli.scenario) {
            Some(config) => config,
            None => bail!(
                "unknown scenario {:?}, expected one of {:?}",
                cli.scenario,
                TopologyConfig::SCENARIOS
            ),
        },
    };

    if let Some(path) = &cli.export {
        topology_config.save(path)?;
        info!("Topology written to {}", path);
    }

    let config = SimulationConfig {
        time_unit: Duration::from_millis(cli.time_unit_ms),
    };
    let topology = topology_config.to_topology()?;

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let network = Network::from_topology(topology, &config)?;
        let stats = network.run(Duration::from_secs(cli.timeout_secs)).await?;

        println!("\n=== Converged tables ===");
        for (router, table) in network.tables().await {
            println!("DV of router {}:", router);
            for (node, entry) in table.iter() {
                println!("Node: {}, {}", node, entry);
            }
            println!();
        }
        println!(
            "{} datagrams sent, {} delivered, {} table updates",
            stats.datagrams_sent, stats.datagrams_delivered, stats.table_updates
        );

        if let Some(path) = &cli.journal {
            network.journal().save(path)?;
            info!("Table history written to {}", path);
        }

        if cli.verify {
            let discrepancies = network.verify().await;
            if !discrepancies.is_empty() {
                for d in &discrepancies {
                    error!(
                        "{} -> {}: expected {:?}, converged to {:?}",
                        d.router, d.destination, d.expected, d.actual
                    );
                }
                bail!("{} routes disagree with shortest paths", discrepancies.len());
            }
            println!("All tables match shortest paths");
        }

        Ok(())
    })
}
