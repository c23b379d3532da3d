use clap::Parser;
use status_agent::commands;

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(flatten)]
    catalog: commands::CatalogArgs,
    #[clap(subcommand)]
    mode: Mode,
}

#[derive(clap::Subcommand, Debug)]
enum Mode {
    /// Poll every service once, notify of priority changes, and persist statuses.
    Run(commands::RunArgs),
    /// Fetch and print the current observation of one service.
    Check(commands::CheckArgs),
    /// List the services of the catalog. Trigger services are marked with `*`.
    Services,
}

fn main() -> Result<(), anyhow::Error> {
    // Use reasonable defaults for printing structured logs to stderr.
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(!matches!(std::env::var("NO_COLOR"), Ok(v) if v == "1"))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(runtime.spawn(async move {
        match cli.mode {
            Mode::Run(args) => commands::run_job(cli.catalog, args).await,
            Mode::Check(args) => commands::check_service(cli.catalog, args).await,
            Mode::Services => commands::list_services(cli.catalog),
        }
    }));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    result?
}
