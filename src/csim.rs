use std::process;

use clap::Parser;
use csim_lib::error::SimulatorResult;
use csim_lib::flags::CsimArgs;
use csim_lib::run_wrapper;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CsimArgs::parse();
    if let Err(e) = run_csim(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_csim(args: &CsimArgs) -> SimulatorResult<()> {
    let policy = args.policy()?;
    let counters = run_wrapper::run(&args.trace_file, policy)?;
    println!("{}", counters);
    Ok(())
}
