use clap::Parser;
use condense::cli::{self, Cli, Command, ModelAction};
use condense::{config, daemon};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "condense=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::Config::load()?;

    match cli.command {
        Command::Summarize(args) => cli::summarize::run(&cfg, args).await,
        Command::Score { reference, generated, metrics } => {
            cli::score::run(&reference, &generated, metrics.as_deref())
        }
        Command::Start { port } => daemon::start(&cfg, port.unwrap_or(cfg.port)).await,
        Command::Stop => daemon::stop(&cfg).await,
        Command::Status => cli::status::run(&cfg).await,
        Command::Model { action } => match action {
            ModelAction::List => cli::model::list(&cfg),
            ModelAction::Current => cli::model::current(&cfg),
            ModelAction::Download { id } => cli::model::download(&cfg, id.as_deref()).await,
            ModelAction::Use { id } => cli::model::switch(&cfg, &id).await,
        },
    }
}
