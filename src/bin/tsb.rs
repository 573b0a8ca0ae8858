use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use template_scene_bridge::app::{App, ProgressSinkKind};
use template_scene_bridge::config::ConfigLoader;
use template_scene_bridge::domain::TemplateId;
use template_scene_bridge::error::BridgeError;
use template_scene_bridge::fetch::HttpArchiveClient;
use template_scene_bridge::output::{HumanOutput, JsonOutput, OutputMode};
use template_scene_bridge::registry::SqliteRegistry;
use template_scene_bridge::store::Store;
use template_scene_bridge::sync::{BulkSyncReport, MetadataDocument};

#[derive(Parser)]
#[command(name = "tsb")]
#[command(about = "Fetch design-template bundles and convert them to editor scene documents")]
#[command(version, author)]
struct Cli {
    /// Print JSON instead of a colored summary.
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Storage root (downloads/, assets/, converted/, raw_json/, db/).
    #[arg(long, global = true)]
    root: Option<String>,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Manage downloaded templates")]
    Templates(TemplatesArgs),
    #[command(about = "Convert an extracted template to a scene document")]
    Convert(ConvertArgs),
}

#[derive(Args)]
struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    #[command(about = "Sync every metadata document, then list known templates")]
    List,
    #[command(about = "List registered templates without syncing")]
    Known,
    #[command(about = "Download templates listed in metadata documents")]
    Sync(SyncArgs),
}

#[derive(Args)]
struct SyncArgs {
    /// Metadata documents to sync; defaults to every *.json in raw_json/.
    #[arg(long = "metadata")]
    metadata: Vec<String>,
}

#[derive(Args)]
struct ConvertArgs {
    template_id: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<BridgeError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BridgeError) -> u8 {
    match error {
        BridgeError::TemplateNotFound(_) | BridgeError::InvalidTemplateId(_) => 2,
        BridgeError::Http(_) | BridgeError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref(), cli.root.as_deref())?;
    let store = Store::new(config.clone());
    store.ensure_layout()?;
    let registry = SqliteRegistry::open(config.registry_path.as_std_path())?;
    let client = HttpArchiveClient::new(config.http_timeout)?;
    let app = App::new(store, client, registry);

    match cli.command {
        Commands::Templates(args) => match args.command {
            TemplatesCommand::List => run_list(&app, output_mode),
            TemplatesCommand::Known => run_known(&app, output_mode),
            TemplatesCommand::Sync(args) => run_sync(&app, args, output_mode),
        },
        Commands::Convert(args) => run_convert(&app, args, output_mode),
    }
}

type CliApp = App<HttpArchiveClient, SqliteRegistry>;

fn run_list(app: &CliApp, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.list(&JsonOutput)?;
            JsonOutput::print_list(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.list(&HumanOutput::new(ProgressSinkKind::List))?;
            HumanOutput::print_list(&result);
            Ok(())
        }
    }
}

fn run_known(app: &CliApp, output_mode: OutputMode) -> miette::Result<()> {
    let ids = app.list_known_template_ids()?;
    match output_mode {
        OutputMode::NonInteractive => {
            let json = serde_json::to_string_pretty(&ids).into_diagnostic()?;
            println!("{json}");
        }
        OutputMode::Interactive => {
            for id in ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn run_sync(app: &CliApp, args: SyncArgs, output_mode: OutputMode) -> miette::Result<()> {
    let interactive = HumanOutput::new(ProgressSinkKind::Sync);
    let sink: &dyn template_scene_bridge::app::ProgressSink = match output_mode {
        OutputMode::NonInteractive => &JsonOutput,
        OutputMode::Interactive => &interactive,
    };

    let report = if args.metadata.is_empty() {
        app.sync_all(sink)?
    } else {
        let mut report = BulkSyncReport::default();
        for path in &args.metadata {
            let document = MetadataDocument::load(camino::Utf8Path::new(path))?;
            report.merge(app.sync_document(&document, sink)?);
        }
        report
    };

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_sync(&report).into_diagnostic(),
        OutputMode::Interactive => {
            HumanOutput::print_sync(&report);
            Ok(())
        }
    }
}

fn run_convert(app: &CliApp, args: ConvertArgs, output_mode: OutputMode) -> miette::Result<()> {
    let id = args.template_id.parse::<TemplateId>()?;
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.convert_template(&id, &JsonOutput)?;
            JsonOutput::print_convert(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.convert_template(&id, &HumanOutput::new(ProgressSinkKind::Convert))?;
            HumanOutput::print_convert(&result);
            Ok(())
        }
    }
}
