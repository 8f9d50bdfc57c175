use answergrid::application::engine::{AnswerEngine, EngineConfig};
use answergrid::domain::answer::Stakeholder;
use answergrid::domain::combination::Locale;
use answergrid::domain::ports::{FeatureApiBox, ValidationApiBox};
use answergrid::infrastructure::http::HttpBackend;
use answergrid::infrastructure::in_memory::InMemoryBackend;
use answergrid::interfaces::csv::grid_writer::GridWriter;
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the questionnaire backend
    #[arg(long, conflicts_with = "fixture")]
    api_url: Option<String>,

    /// JSON fixture file served from an in-memory backend instead of HTTP
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Display locale for derived labels (en or et)
    #[arg(long, default_value = "en")]
    locale: Locale,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GridScope {
    #[arg(long)]
    questionnaire_id: i64,

    #[arg(long)]
    feature_group_id: i64,
}

#[derive(Subcommand)]
enum Command {
    /// List, add or delete questionnaires
    Questionnaires {
        #[command(subcommand)]
        action: QuestionnaireAction,
    },
    /// Print the resolved grid as CSV
    Table {
        #[command(flatten)]
        scope: GridScope,
    },
    /// Print the weight-ordered validation summaries
    Summaries {
        #[command(flatten)]
        scope: GridScope,
    },
    /// Append a new row and print the grid
    AddRow {
        #[command(flatten)]
        scope: GridScope,

        #[arg(long, requires = "stakeholder_name")]
        stakeholder_id: Option<i64>,

        #[arg(long, requires = "stakeholder_id")]
        stakeholder_name: Option<String>,
    },
    /// Set one cell's value and print the grid after resolution
    Set {
        #[command(flatten)]
        scope: GridScope,

        #[arg(long)]
        row: i64,

        #[arg(long)]
        validation: i64,

        value: String,
    },
    /// Assign a stakeholder to a cell and print the grid after resolution
    SetStakeholder {
        #[command(flatten)]
        scope: GridScope,

        #[arg(long)]
        row: i64,

        #[arg(long)]
        validation: i64,

        #[arg(long)]
        stakeholder_id: i64,

        #[arg(long)]
        stakeholder_name: String,
    },
    /// Delete a row and print the grid
    DeleteRow {
        #[command(flatten)]
        scope: GridScope,

        #[arg(long)]
        row: i64,
    },
}

#[derive(Subcommand)]
enum QuestionnaireAction {
    List,
    Add { name: String },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let (api, features): (ValidationApiBox, FeatureApiBox) = if let Some(path) = &cli.fixture {
        let backend = InMemoryBackend::from_fixture_file(path).into_diagnostic()?;
        (Box::new(backend.clone()), Box::new(backend))
    } else if let Some(url) = &cli.api_url {
        let backend = HttpBackend::new(url.clone());
        (Box::new(backend.clone()), Box::new(backend))
    } else {
        miette::bail!("either --api-url or --fixture is required");
    };

    let command = match cli.command {
        Command::Questionnaires { action } => {
            handle_questionnaires(&api, action).await?;
            return Ok(());
        }
        other => other,
    };
    let scope = match &command {
        Command::Table { scope }
        | Command::Summaries { scope }
        | Command::AddRow { scope, .. }
        | Command::Set { scope, .. }
        | Command::SetStakeholder { scope, .. }
        | Command::DeleteRow { scope, .. } => scope,
        Command::Questionnaires { .. } => unreachable!(),
    };
    let config = EngineConfig::new(scope.questionnaire_id, scope.feature_group_id)
        .with_locale(cli.locale);
    let engine = AnswerEngine::new(api, features, config);
    engine.load().await.into_diagnostic()?;

    match command {
        Command::Table { .. } => {}
        Command::Summaries { .. } => {
            for summary in engine.summaries().await {
                let name = match cli.locale {
                    Locale::Et => summary.name_et.or(summary.name_en),
                    Locale::En => summary.name_en.or(summary.name_et),
                };
                println!("{}\t{}", summary.weight, name.unwrap_or_default());
            }
            return Ok(());
        }
        Command::AddRow {
            stakeholder_id,
            stakeholder_name,
            ..
        } => {
            let stakeholder = stakeholder_id.zip(stakeholder_name).map(|(id, name)| {
                Stakeholder { id, name }
            });
            engine.add_row(None, None, stakeholder).await.into_diagnostic()?;
        }
        Command::Set {
            row,
            validation,
            value,
            ..
        } => {
            let answer_id = engine.answer_id(row, validation).await.into_diagnostic()?;
            engine.set_answer(answer_id, &value).await.into_diagnostic()?;
        }
        Command::SetStakeholder {
            row,
            validation,
            stakeholder_id,
            stakeholder_name,
            ..
        } => {
            let answer_id = engine.answer_id(row, validation).await.into_diagnostic()?;
            let stakeholder = Stakeholder {
                id: stakeholder_id,
                name: stakeholder_name,
            };
            engine
                .set_stakeholder(answer_id, stakeholder)
                .await
                .into_diagnostic()?;
        }
        Command::DeleteRow { row, .. } => {
            engine.delete_row(row).await.into_diagnostic()?;
        }
        Command::Questionnaires { .. } => unreachable!(),
    }

    // Wait out pending debounced saves so the printed grid is quiescent.
    engine.flush().await;
    let snapshot = engine.snapshot().await;
    let stdout = io::stdout();
    let mut writer = GridWriter::new(stdout.lock());
    writer.write_grid(&snapshot).into_diagnostic()?;

    Ok(())
}

async fn handle_questionnaires(api: &ValidationApiBox, action: QuestionnaireAction) -> Result<()> {
    match action {
        QuestionnaireAction::List => {
            for questionnaire in api.list_questionnaires().await.into_diagnostic()? {
                println!(
                    "{}\t{}",
                    questionnaire.id.unwrap_or_default(),
                    questionnaire.name
                );
            }
        }
        QuestionnaireAction::Add { name } => {
            let questionnaire = api.save_questionnaire(&name).await.into_diagnostic()?;
            println!(
                "created questionnaire {} ({})",
                questionnaire.id.unwrap_or_default(),
                questionnaire.name
            );
        }
        QuestionnaireAction::Delete { id } => {
            api.delete_questionnaire(id).await.into_diagnostic()?;
            println!("deleted questionnaire {}", id);
        }
    }
    Ok(())
}
