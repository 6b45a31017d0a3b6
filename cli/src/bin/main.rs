use anyhow::Result;
use clap::Parser;
use console_cli::Opts;

fn main() -> Result<()> {
    let opts = Opts::parse();
    console_cli::init_logging(opts.verbose)?;
    console_cli::entry(opts)
}
