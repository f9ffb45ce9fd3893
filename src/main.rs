use std::path::Path;
use std::time::Instant;
use topocut::algorithms::RecursiveBisection;
use topocut::assignment::partition_topology;
use topocut::imbalance::imbalance;
use topocut::io::{read_matrix_market_as_graph, read_topology, write_partition_data_to_file, write_report};
use topocut::topology::NodeId;
use topocut::Partition;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the topology (.json) or graph (.mtx) file
    input: String,

    /// Number of Partitions
    num_of_partitions: usize,

    /// Filename where the partition mapping can be stored
    partition_file: String,

    /// Seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop coarsening at this many vertices
    #[arg(short, long, default_value_t = 20)]
    coarsen_to: usize,

    /// Write the full JSON report of a topology run to this file
    #[arg(short, long)]
    report: Option<String>,
}


fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let input = Path::new(&args.input);
    let mut partitioner = RecursiveBisection {
        num_of_partitions: args.num_of_partitions,
        seed: args.seed,
        coarsen_to: args.coarsen_to,
        ..Default::default()
    };
    let start = Instant::now();

    if input.extension().is_some_and(|extension| extension == "mtx") {
        let graph = read_matrix_market_as_graph(input)?;
        let weights = vec![1.0; graph.len()];
        let mut partition = vec![0; graph.len()];
        let metadata = partitioner.partition(&mut partition, (&graph, weights.as_slice()))?;
        let elapsed_time = start.elapsed();
        let node_ids: Vec<NodeId> = (0..graph.len()).map(NodeId::try_from).collect::<Result<_, _>>()?;
        write_partition_data_to_file(&node_ids, &partition, &args.partition_file)?;
        println!("Edge cut {:?}", metadata.edge_cut);
        println!("Imbalance {:?}", imbalance(args.num_of_partitions, &partition, &weights));
        println!("Execution time {:?}", elapsed_time);
        return Ok(());
    }

    let topology = read_topology(input)?;
    let report = partition_topology(&topology, &mut partitioner)?;
    let elapsed_time = start.elapsed();
    let node_ids: Vec<NodeId> = report.assignments.keys().copied().collect();
    let partition: Vec<usize> = report.assignments.values().copied().collect();
    write_partition_data_to_file(&node_ids, &partition, &args.partition_file)?;
    if let Some(report_file) = &args.report {
        write_report(&report, Path::new(report_file))?;
    }
    println!("Edge cut {:?}", report.edge_cut);
    println!("Imbalance {:?}", report.imbalance);
    println!("Boundary links {:?}", report.boundary_links.len());
    println!("Execution time {:?}", elapsed_time);
    Ok(())
}
