use anyhow::Context;
use clap::Parser;
use fixture_gen::FixtureGenerator;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Generate synthetic snapshot/rule-chain fixtures as a JSON array
#[derive(Debug, Parser)]
#[command(name = "fixture-gen", version)]
struct Args {
    /// Number of fixtures to generate
    #[arg(long, default_value_t = 100)]
    count: usize,

    /// RNG seed for reproducible output
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output file path
    #[arg(long, default_value = "fixtures.json")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut generator = FixtureGenerator::new(args.seed);
    let fixtures = generator.generate_batch(args.count);

    let file = File::create(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &fixtures)
        .context("failed to serialize fixtures")?;

    println!(
        "Wrote {} fixtures (seed {}) to {}",
        fixtures.len(),
        args.seed,
        args.out.display()
    );
    Ok(())
}
