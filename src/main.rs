use clap::Parser;
use climpack::app::{handle_fatal_error, init_logging, AppConfig};
use climpack::cli::{execute_command, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app = AppConfig::new(cli.verbose)
        .with_config_file(cli.config.clone())
        .with_working_dir(cli.working_dir.clone());
    init_logging(&app);

    if let Err(e) = execute_command(cli.command, &app).await {
        handle_fatal_error(e, app.verbose);
    }
}
