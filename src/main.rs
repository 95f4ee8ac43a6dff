use anyhow::Result;
use tracing::{error, info, warn};
use uuid::Uuid;

use judge_core::config::JudgeConfig;
use judge_core::orchestrator::Orchestrator;
use judge_core::queue::{RedisQueue, SubmissionQueue};
use judge_core::sandbox::SandboxRunner;
use judge_core::store::RedisStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("judge_core=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = JudgeConfig::from_env();
    info!(workspace_root = %config.workspace_root.display(), "loaded configuration");

    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());

    let mut queue = RedisQueue::connect(&redis_url).await?;
    let store = RedisStore::connect(&redis_url).await?;
    let runner = SandboxRunner::new(&config);

    let mut orchestrator = Orchestrator::new(config, runner, store);

    info!("waiting for submissions...");
    loop {
        let submission_id = match queue.dequeue().await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "failed to dequeue submission, retrying");
                continue;
            }
        };

        match fetch_problem_for(submission_id).await {
            Ok(problem) => {
                if let Err(e) = orchestrator.judge(submission_id, &problem).await {
                    error!(%submission_id, error = %e, "judging failed");
                }
            }
            Err(e) => {
                warn!(%submission_id, error = %e, "could not load problem, dropping submission");
            }
        }
    }
}

/// Problem lookup is owned by the surrounding service (see the Submission
/// Store contract); this worker only knows how to ask for one by the
/// submission it's attached to.
async fn fetch_problem_for(_submission_id: Uuid) -> Result<judge_core::core::Problem> {
    anyhow::bail!("problem lookup is provided by the surrounding service, not the judging core")
}
