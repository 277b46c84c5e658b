use anyhow::Result;
use std::process;
use log::error;

use tagtrend::{app, cli, logging};

fn main() {
    if let Err(e) = run() {
        let error_msg = e.to_string();

        // User errors are shown without logging noise
        let is_user_error = error_msg.contains("not a git repository")
            || error_msg.contains("Not a valid git repository")
            || error_msg.contains("Directory does not exist");

        if is_user_error {
            eprintln!("{:#}", e);
        } else {
            error!("Application error: {:#}", e);
            eprintln!("Error: {:#}", e);
        }

        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let repository = app::resolve_repository_path(args.repository.as_deref())?;
    let settings = app::resolve_run_settings(&args, &config_manager, repository)?;

    app::execute(&settings, args.list_tags)
}
