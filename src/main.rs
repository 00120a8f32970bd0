use anyhow::Result;
use clap::Parser;

use spectral_cluster_tree::cluster::postprocessing::Postprocessing;
use spectral_cluster_tree::data::{filter_by_degree, load_edge_list};
use spectral_cluster_tree::{storage, ClusteringSettings, PostprocessingSettings, RecursiveClustering, Traversal};

#[derive(Parser, Debug)]
#[clap(
    name = "spectral-cluster-tree",
    about = "Hierarchical clustering of weighted graphs by recursive spectral bisection"
)]
struct Cli {
    /// Path to a tab-separated edge list (label_u, label_v, optional weight)
    #[clap(long)]
    input: String,

    /// Output directory for results
    #[clap(long, default_value = "cluster_results")]
    output_dir: String,

    /// Drop vertices with fewer neighbours before clustering
    #[clap(long, default_value = "0")]
    min_degree: usize,

    /// Clusters at or below this size are not split any further
    #[clap(long, default_value = "50")]
    min_cluster_size: usize,

    /// Minimum affiliation score of a vertex with its cluster
    #[clap(long, default_value = "0.2")]
    min_affiliation: f64,

    /// Power iteration cap per bisection
    #[clap(long, default_value = "540")]
    max_iterations: usize,

    /// Number of rounds a sign must hold to count as stable
    #[clap(long, default_value = "20")]
    trail_size: usize,

    /// Fraction of stable signs needed for convergence
    #[clap(long, default_value = "0.95")]
    convergence_threshold: f64,

    /// Seed for the random initial vectors
    #[clap(long, default_value = "42133742")]
    seed: u64,

    /// Pull clusters up to their grandparent while it has fewer children than this
    #[clap(long, default_value = "0")]
    min_children: usize,

    /// Relocate clusters by normalized-cut similarity to their ancestors
    #[clap(long, num_args = 3, value_names = ["MIN", "MAX", "TARGET"])]
    parent_similarity: Option<Vec<f64>>,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);

    // 1. Load data
    let (graph, labels) = load_edge_list(&args.input)?;

    // 2. Drop weakly connected vertices
    let graph = if args.min_degree > 0 {
        filter_by_degree(&graph, args.min_degree)
    } else {
        graph
    };

    // 3. Cluster and postprocess
    let settings = ClusteringSettings::default()
        .with_min_cluster_size(args.min_cluster_size)
        .with_min_affiliation(args.min_affiliation)
        .with_max_iterations(args.max_iterations)
        .with_sign_trail(args.trail_size, args.convergence_threshold)
        .with_random_seed(args.seed)
        .with_min_children(args.min_children);
    let mut postprocessing = PostprocessingSettings::from(&settings);
    if let Some(&[min, max, target]) = args.parent_similarity.as_deref() {
        postprocessing = postprocessing.with_parent_similarity(min, max, target);
    }
    let mut tree = RecursiveClustering::new(&graph, &settings, Traversal::default()).run()?;
    Postprocessing::new(&postprocessing).apply(&mut tree)?;

    log::info!("Found {} clusters", tree.len());

    // 4. Save results
    storage::save_results(
        &tree,
        Some(labels.as_slice()),
        settings.affiliation_metric.as_ref(),
        &args.output_dir,
    )?;

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
