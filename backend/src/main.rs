//! Vista CLI - bulk import spreadsheets into the Vista Explorer portal
//!
//! # Main Commands
//!
//! ```bash
//! vista serve                              # Start HTTP server (port 3000)
//! vista import pois.xlsx --kind poi        # Validate then import every row
//! vista validate events.csv --kind event   # Pre-flight check only
//! vista template poi --format csv          # Write an import template
//! ```
//!
//! # Category Commands
//!
//! ```bash
//! vista categories list
//! vista categories create "Museum"
//! vista categories update 4 "Museums"
//! vista categories delete 4
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vista::api::logs::RunLog;
use vista::import::summary_message;
use vista::template::file_name;
use vista::{
    decode_path, emit_template, validate, ApiClient, AppConfig, ExternalRefs, Importer, RecordKind,
    TemplateFormat,
};

#[derive(Parser)]
#[command(name = "vista")]
#[command(about = "Bulk import POIs and events into Vista Explorer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an import template (header row + example row)
    Template {
        /// Record kind: poi or event
        kind: RecordKind,

        /// Template format: xlsx or csv
        #[arg(short, long, default_value = "xlsx")]
        format: TemplateFormat,

        /// Output file (default: <kind>_import_template.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode and validate a file without importing
    Validate {
        /// Input spreadsheet or CSV file
        input: PathBuf,

        /// Record kind: poi or event
        #[arg(short, long)]
        kind: RecordKind,
    },

    /// Validate a file, then submit every row to the backend
    Import {
        /// Input spreadsheet or CSV file
        input: PathBuf,

        /// Record kind: poi or event
        #[arg(short, long)]
        kind: RecordKind,
    },

    /// Manage POI categories on the backend
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: VISTA_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List all categories
    List,

    /// Create a category
    Create {
        /// Category name
        name: String,
    },

    /// Rename a category
    Update {
        /// Category ID
        id: i64,
        /// New name
        name: String,
    },

    /// Delete a category
    Delete {
        /// Category ID
        id: i64,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match AppConfig::from_env() {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: AppConfig) -> CliResult {
    match command {
        Commands::Template { kind, format, output } => cmd_template(kind, format, output.as_deref()),

        Commands::Validate { input, kind } => cmd_validate(&input, kind, &config).await,

        Commands::Import { input, kind } => cmd_import(&input, kind, &config).await,

        Commands::Categories { action } => cmd_categories(action, &config).await,

        Commands::Serve { port } => cmd_serve(port, config).await,
    }
}

fn cmd_template(kind: RecordKind, format: TemplateFormat, output: Option<&Path>) -> CliResult {
    let bytes = emit_template(kind, format)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(file_name(kind, format)));

    fs::write(&path, bytes)?;
    eprintln!("📄 {} template written to: {}", kind, path.display());
    Ok(())
}

async fn cmd_validate(input: &Path, kind: RecordKind, config: &AppConfig) -> CliResult {
    eprintln!("✔️  Validating {}: {}", kind.plural(), input.display());

    let rows = decode_path(input)?;
    eprintln!("   Rows: {}", rows.len());

    let refs = load_refs(kind, config).await?;
    let errors = validate(&rows, kind, &refs);

    if errors.is_empty() {
        eprintln!("   ✅ All {} rows valid!", rows.len());
        return Ok(());
    }

    eprintln!("   ❌ {} validation error(s):", errors.len());
    for error in &errors {
        println!("{}", error);
    }
    std::process::exit(1);
}

async fn cmd_import(input: &Path, kind: RecordKind, config: &AppConfig) -> CliResult {
    eprintln!("📄 Importing {}: {}", kind.plural(), input.display());

    let rows = decode_path(input)?;
    let client = ApiClient::new(&config.api)?;
    let refs = if kind.needs_categories() {
        client.category_refs().await?
    } else {
        ExternalRefs::default()
    };

    let log = RunLog::new(Uuid::new_v4().to_string());
    let result = match Importer::new().run_logged(&rows, kind, &refs, &client, &log).await {
        Ok(result) => result,
        Err(vista::ImportError::Blocked(errors)) => {
            eprintln!("   ❌ Please fix validation errors before importing:");
            for error in &errors {
                eprintln!("     - {}", error);
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    for message in &result.failure_messages {
        eprintln!("   ⚠️  {}", message);
    }
    eprintln!("\n📊 {}", summary_message(kind, &result));

    if !result.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_categories(action: CategoryAction, config: &AppConfig) -> CliResult {
    let client = ApiClient::new(&config.api)?;

    match action {
        CategoryAction::List => {
            let categories = client.list_categories().await?;
            if categories.is_empty() {
                eprintln!("📋 No categories yet.");
                eprintln!("   Use 'vista categories create <name>' to add one.");
                return Ok(());
            }

            eprintln!("📋 Categories ({}):\n", categories.len());
            for category in categories {
                println!("  {:>4}  {}", category.id, category.name);
            }
        }

        CategoryAction::Create { name } => {
            let category = client.create_category(&name).await?;
            eprintln!("✅ Category created: {} ({})", category.name, category.id);
        }

        CategoryAction::Update { id, name } => {
            let category = client.update_category(id, &name).await?;
            eprintln!("✅ Category updated: {} ({})", category.name, category.id);
        }

        CategoryAction::Delete { id } => {
            client.delete_category(id).await?;
            eprintln!("🗑️  Category deleted: {}", id);
        }
    }

    Ok(())
}

async fn cmd_serve(port: Option<u16>, mut config: AppConfig) -> CliResult {
    if let Some(port) = port {
        config.server.port = port;
    }
    vista::server::start_server(config).await?;
    Ok(())
}

/// Category snapshot for POI files; events need no reference data.
async fn load_refs(kind: RecordKind, config: &AppConfig) -> Result<ExternalRefs, Box<dyn std::error::Error>> {
    if !kind.needs_categories() {
        return Ok(ExternalRefs::default());
    }
    let client = ApiClient::new(&config.api)?;
    Ok(client.category_refs().await?)
}
