use clap::Parser;
use trbait::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{export, filter, init, resolve, stats, validate},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Init(_) => "init",
        Command::Filter(_) => "filter",
        Command::Resolve(_) => "resolve",
        Command::Stats(_) => "stats",
        Command::Export(_) => "export",
        Command::Validate(_) => "validate",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Init(args) => init::init(args)?,
        Command::Filter(args) => filter::filter(args)?,
        Command::Resolve(args) => resolve::resolve(args)?,
        Command::Stats(args) => stats::stats(args)?,
        Command::Export(args) => export::export(args)?,
        Command::Validate(args) => validate::validate(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
