use crate::prelude::*;
use clap::Parser;

mod analyze;
mod error;
mod inspect;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Find the fillable form fields of PDF documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "FORMSCAN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Detect and list the form fields of one or more PDF files
    Analyze(crate::analyze::AnalyzeOptions),

    /// Dump the widgets, drawings and text spans the detectors see
    Inspect(crate::inspect::InspectOptions),
}

fn main() -> Result<()> {
    let app = App::parse();

    let default_filter = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Analyze(options) => crate::analyze::run(options, app.global),
        SubCommands::Inspect(options) => crate::inspect::run(options, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
