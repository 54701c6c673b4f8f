use tracing_subscriber::EnvFilter;

pub const DEFAULT_DATA_PATH: &str = "new_tracer_alumni_elektro_unsika.csv";

pub const SKEW_THRESHOLD: f64 = 0.2;
pub const SKEW_EPSILON: f64 = 1e-9;
pub const DOMINANCE_SHARE: f64 = 0.6;
pub const STRONG_CORRELATION: f64 = 0.5;
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const IQR_FENCE: f64 = 1.5;

pub const CLUSTER_SEED: u64 = 42;
pub const DEFAULT_CLUSTER_COUNT: u8 = 4;
pub const MIN_CLUSTER_COUNT: usize = 2;
pub const MAX_CLUSTER_COUNT: usize = 8;
pub const KMEANS_RESTARTS: usize = 10;
pub const KMEANS_MAX_ITERATIONS: usize = 300;
pub const KMEANS_TOLERANCE: f64 = 1e-4;

pub const TOP_N: usize = 10;
pub const FEEDBACK_SAMPLE_SIZE: usize = 8;
pub const FEEDBACK_SAMPLE_SEED: u64 = 42;

/// Views go to stdout, so diagnostics are written to stderr. `RUST_LOG` wins
/// over the verbosity flag.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
