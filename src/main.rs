//! damaged-dispatch entry point: CLI wiring for the solve and profile tools.

use std::process;

use clap::Parser;
use tracing::info;

use damaged_dispatch::cli::{Cli, Command, SolveArgs, SynthArgs};
use damaged_dispatch::error::DispatchResult;
use damaged_dispatch::logging::init_logging;
use damaged_dispatch::network::io::read_network;
use damaged_dispatch::profile::apply::DAMAGED_CARRIER;
use damaged_dispatch::profile::export_profile_csv;
use damaged_dispatch::profile::synth::SyntheticWind;
use damaged_dispatch::runner;

fn solve(args: SolveArgs) -> DispatchResult<()> {
    let ctx = args.into_context()?;
    init_logging(&ctx.config.logging.level, ctx.logs.solver.as_deref())?;

    let outcome = runner::run(&ctx)?;
    println!("{}", outcome.summary);
    println!("Exported to {}", ctx.outputs.network.display());
    Ok(())
}

fn synth_profile(args: SynthArgs) -> DispatchResult<()> {
    init_logging("info", None)?;

    let buses = match &args.network {
        Some(path) => {
            let network = read_network(path)?;
            let mut buses: Vec<String> = network
                .generators
                .iter()
                .filter(|g| g.carrier == DAMAGED_CARRIER)
                .map(|g| g.bus.clone())
                .collect();
            buses.sort();
            buses.dedup();
            buses
        }
        None => args.buses,
    };

    let synth = SyntheticWind {
        damage_factor: args.damage_factor,
        seed: args.seed,
        ..SyntheticWind::default()
    };
    let profile = synth.generate(&buses, args.start, args.hours)?;
    export_profile_csv(&profile, &args.output)?;
    info!(
        buses = buses.len(),
        hours = args.hours,
        path = %args.output.display(),
        "wrote synthetic damaged profile"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Solve(args) => solve(args),
        Command::SynthProfile(args) => synth_profile(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
