use std::process::ExitCode;

use clap::Parser;

use peeble_link::cli::{Cli, Command};
use peeble_link::error::PeebleLinkError;
use peeble_link::{commands, config, output};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(value) => match output::emit(cli.output, &value) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                let e = PeebleLinkError::Io(e);
                output::emit_error(cli.output, e.exit_code_num(), &e.to_string());
                e.exit_code()
            }
        },
        Err(e) => {
            output::emit_error(cli.output, e.exit_code_num(), &e.to_string());
            e.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<serde_json::Value, PeebleLinkError> {
    let config = config::load_config(cli.config.as_deref())?;

    let value = match &cli.command {
        Command::Encode(args) => serde_json::to_value(commands::encode(&config, args)?)?,
        Command::Decode(args) => serde_json::to_value(commands::decode(&args.url)?)?,
        Command::Validate(args) => serde_json::to_value(commands::validate(args)?)?,
        Command::Capacity(args) => serde_json::to_value(commands::capacity(&args.url))?,
        Command::Manifest => serde_json::to_value(commands::manifest(&config)?)?,
    };
    Ok(value)
}
