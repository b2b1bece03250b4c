use clap::{Parser, Subcommand};
use compass::traits::store::SubmissionProvider;
use compass::{CompassConfig, CompassError, CompassResult, DbStore, SuggestionService};
use migration::{Migrator, MigratorTrait};
use tracing::{error, info};
use util::config;

#[derive(Parser, Debug)]
#[command(version, about = "Clusters modeling submissions and suggests feedback")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cluster the submissions of an exercise, unless already done
    Build {
        #[arg(long)]
        exercise: i64,
    },
    /// Drop existing clusters and cluster again
    Rebuild {
        #[arg(long)]
        exercise: i64,
    },
    /// Suggest a semi-automatic result for a submission
    Suggest {
        #[arg(long)]
        submission: i64,
    },
    /// Print cluster statistics of an exercise as JSON
    Stats {
        #[arg(long)]
        exercise: i64,
    },
    /// Print the model similarity of two submissions in percent
    Compare {
        #[arg(long)]
        first: i64,
        #[arg(long)]
        second: i64,
        /// Element matches below this similarity count as zero
        #[arg(long, default_value_t = 0.0)]
        min_similarity: f64,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let _log_guard = util::logging::init_logging("logs", &config::log_file());

    if let Err(e) = run(args).await {
        error!(error = %e, "Compass failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> CompassResult<()> {
    let db = db::connect().await?;
    Migrator::up(&db, None).await?;

    let service = SuggestionService::new(DbStore::new(db), CompassConfig::from_app_config());
    info!(project = %config::project_name(), env = %config::env(), "Compass started");

    match args.command {
        Command::Build { exercise } => {
            let exercise = find_exercise(&service, exercise).await?;
            let outcome = service.build(&exercise).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Rebuild { exercise } => {
            let exercise = find_exercise(&service, exercise).await?;
            let outcome = service.rebuild(&exercise).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Suggest { submission } => {
            let submission = find_submission(&service, submission).await?;
            let exercise = find_exercise(&service, submission.exercise_id).await?;

            match service.get_suggestion_result(&submission, &exercise).await? {
                Some(suggested) => println!(
                    "result {}: {} feedback, score {}",
                    suggested.result.id,
                    suggested.feedback.len(),
                    suggested.result.score
                ),
                None => println!("no suggestion for submission {}", submission.id),
            }
        }
        Command::Stats { exercise } => {
            let statistics = service.cluster_statistics(exercise).await?;
            println!("{}", serde_json::to_string_pretty(&statistics)?);
        }
        Command::Compare {
            first,
            second,
            min_similarity,
        } => {
            let first = find_submission(&service, first).await?;
            let second = find_submission(&service, second).await?;
            match service.compare_submissions(&first, &second, min_similarity)? {
                Some(similarity) => println!("{:.2}%", similarity * 100.0),
                None => println!("submissions {} and {} cannot be compared", first.id, second.id),
            }
        }
    }

    Ok(())
}

async fn find_exercise(
    service: &SuggestionService<DbStore>,
    exercise_id: i64,
) -> CompassResult<db::models::modeling_exercise::Model> {
    service
        .store()
        .exercise(exercise_id)
        .await?
        .ok_or_else(|| CompassError::NotFound(format!("exercise {exercise_id}")))
}

async fn find_submission(
    service: &SuggestionService<DbStore>,
    submission_id: i64,
) -> CompassResult<db::models::modeling_submission::Model> {
    service
        .store()
        .submission(submission_id)
        .await?
        .ok_or_else(|| CompassError::NotFound(format!("submission {submission_id}")))
}
