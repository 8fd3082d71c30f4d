use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::Read;
use tracing_subscriber::EnvFilter;

use clipsnet::document::Strategy;
use clipsnet::options::Options;
use clipsnet::target::{Ears, Gal};
use clipsnet::Context;

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Depth,
    Breadth,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Depth => Strategy::Depth,
            StrategyArg::Breadth => Strategy::Breadth,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source file, or pass "-" to read from stdin
    #[clap(short, long, value_parser)]
    file: clio::Input,

    /// EARS output file, or "-" for stdout. Defaults to stdout when no
    /// output is given
    #[clap(long, value_parser)]
    ears: Option<clio::Output>,

    /// GAL output file, or "-" for stdout
    #[clap(long, value_parser)]
    gal: Option<clio::Output>,

    /// Override the strategy declared by the source
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Do not emit reachability properties
    #[arg(long)]
    no_properties: bool,

    /// Do not emit input transitions for external facts
    #[arg(long)]
    no_environment: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let mut args = Cli::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(args.verbose)
        .with_writer(std::io::stderr)
        .init();

    let mut source = String::new();
    args.file.read_to_string(&mut source)?;
    let filename = args.file.path().to_string_lossy().into_owned();

    let options = Options {
        strategy: args.strategy.map(Strategy::from),
        properties: !args.no_properties,
        environment: !args.no_environment,
        ..Options::default()
    };

    let document = Context::new()
        .set_options(options.clone())
        .add_file(&filename, &source)?
        .build();

    if args.ears.is_none() && args.gal.is_none() {
        args.ears = Some(clio::Output::std());
    }
    if let Some(output) = args.ears {
        document.write::<Ears>(output, &options)?;
    }
    if let Some(output) = args.gal {
        document.write::<Gal>(output, &options)?;
    }

    if !document.diagnostics.is_empty() {
        eprintln!("{} warning(s) emitted", document.diagnostics.len());
    }

    Ok(())
}
