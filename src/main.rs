use labelfit::{pipeline::Config, run};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const DATA_FILEPATH: &str = "data/all-[vision7]-new.csv";
    const FEATURE_DIVISOR: f64 = 100.0;
    const TEST_FRACTION: f64 = 0.3;
    const NEIGHBORS: usize = 2;

    init_logging();

    let config = Config::new(DATA_FILEPATH)
        .with_feature_divisor(FEATURE_DIVISOR)
        .with_test_fraction(TEST_FRACTION)
        .with_neighbors(NEIGHBORS);

    let report = run(&config)?;

    println!("{}", report.table);
    println!("{report}");

    Ok(())
}
