//! deploy-check CLI entry point
//!
//! Post-deployment validation for web applications.

use clap::Parser;
use deploy_check::cli::args::{Cli, Command, ValidateArgs};
use deploy_check::cli::check_list;
use deploy_check::cli::output::get_formatter;
use deploy_check::version::BuildInfo;
use deploy_check::{DeployCheckError, Settings, Validator};

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported through clap's error path
            let code = if e.use_stderr() { 3 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);

    match cli.command {
        Command::Version { json } => {
            let info = BuildInfo::current();
            if json {
                println!("{}", info.to_json());
            } else {
                println!("{}", info);
            }
            ExitCode::SUCCESS
        }
        Command::List => {
            print!("{}", check_list());
            ExitCode::SUCCESS
        }
        Command::Validate(ref args) => match run_validate(args, cli.verbose) {
            Ok(code) => ExitCode::from(code),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Run 'deploy-check --help' for usage information.");
                ExitCode::from(3)
            }
        },
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with --verbose.
fn init_logging(verbose: bool) {
    let default = if verbose { "deploy_check=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_validate(args: &ValidateArgs, verbose: bool) -> Result<u8, DeployCheckError> {
    let cwd = std::env::current_dir().map_err(|e| DeployCheckError::Io {
        context: "current directory".to_string(),
        message: e.to_string(),
    })?;
    let settings = Settings::load_or_default(args.config.as_deref(), &cwd)?;
    let settings = args.apply_overrides(settings)?;
    let config = args.deployment_config()?;

    let mut validator = Validator::with_http(settings)?;
    if !args.phases.is_empty() {
        validator = validator.with_phases(&args.phases);
    }

    let result = validator.validate_deployment(&config);

    let formatter = get_formatter(args.format, args.no_color, verbose, args.quiet);
    println!("{}", formatter.format(&result));

    Ok(result.status.exit_code())
}
