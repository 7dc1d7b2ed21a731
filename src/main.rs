use clap::Parser;
use log::{debug, error};

use mdnotes::{App, Cli, Config, NoteStore, Result};

fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir);
    debug!("Using data directory: {}", config.data_dir.display());

    let store = NoteStore::open(config)?;
    let mut app = App::new(store);
    app.run(cli.command)
}

fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
