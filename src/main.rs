use carousel_agent::args::{Cli, Command};
use carousel_agent::job::Job;
use carousel_agent::publish::Published;
use carousel_agent::{Stage, web};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carousel_agent=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => web::serve(&cli.config, &args).await?,
        Command::Agent { dry_run } => {
            let job = Job::from_config(&cli.config);
            match job.run(dry_run).await? {
                Stage::Done(report) => match report.published {
                    Stage::Done(Published::Graph { post_id }) => {
                        info!("Carousel live as post {}", post_id)
                    }
                    Stage::Done(Published::Legacy { media_id }) => {
                        info!("Album uploaded as media {}", media_id)
                    }
                    Stage::Done(Published::DryRun) => info!("Dry run complete"),
                    Stage::Skipped(reason) => warn!("Nothing was posted: {}", reason),
                },
                Stage::Skipped(reason) => warn!("Run aborted: {}", reason),
            }
        }
    }

    info!("Process complete.");
    Ok(())
}
