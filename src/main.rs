use std::path::PathBuf;

use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use sqlflow_lessons::{migrate::Migrator, names, BatchConfig, Defaults, Operations};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill missing lesson fields with placeholders.
    Normalize(DirArgs),
    /// Derive practice, quiz and challenge ids from the lesson id.
    Namespace(DirArgs),
    /// Report structural problems without changing any file.
    Validate(DirArgs),
    /// Rebuild each lesson's sample database.
    Materialize(DirArgs),
    /// Run several passes over each lesson in one go.
    Run {
        #[command(flatten)]
        dirs: DirArgs,
        #[arg(long)]
        normalize: bool,
        #[arg(long)]
        namespace: bool,
        #[arg(long)]
        validate: bool,
        #[arg(long)]
        materialize: bool,
    },
    /// Copy lesson content and databases into the monorepo layout.
    Migrate {
        /// Root of the existing project.
        source: PathBuf,
        /// Root of the new project.
        target: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DirArgs {
    /// Directory holding the lesson JSON files.
    #[arg(long, default_value = names::DEFAULT_CONTENT_DIR)]
    content_dir: PathBuf,

    /// Directory the sample databases are written to.
    #[arg(long, default_value = names::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Only process files whose name starts with this prefix.
    #[arg(long, default_value = names::LESSON_FILE_PREFIX)]
    prefix: String,

    /// Process every .json file, ignoring the prefix.
    #[arg(long)]
    all: bool,

    /// Write changed lessons here instead of in place.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Report what would change without writing anything.
    #[arg(long)]
    dry_run: bool,
}

impl DirArgs {
    fn config(self, operations: Operations) -> BatchConfig {
        BatchConfig {
            content_dir: self.content_dir,
            data_dir: self.data_dir,
            output_dir: self.output_dir,
            file_prefix: (!self.all).then_some(self.prefix),
            operations,
            dry_run: self.dry_run,
        }
    }
}

/// Exit status of `migrate` when the source directory does not exist.
const MISSING_SOURCE_STATUS: i32 = 1;

fn migrator(source: PathBuf, target: PathBuf) -> Result<Migrator, clap::Error> {
    Migrator::new(source, target).map_err(|e| Cli::command().error(ErrorKind::ValueValidation, e))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "sqlflow_lessons=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.command {
        Command::Normalize(dirs) => dirs.config(Operations {
            normalize: true,
            ..Operations::default()
        }),
        Command::Namespace(dirs) => dirs.config(Operations {
            namespace: true,
            ..Operations::default()
        }),
        Command::Validate(dirs) => dirs.config(Operations {
            validate: true,
            ..Operations::default()
        }),
        Command::Materialize(dirs) => dirs.config(Operations {
            materialize: true,
            ..Operations::default()
        }),
        Command::Run {
            dirs,
            normalize,
            namespace,
            validate,
            materialize,
        } => {
            let operations = Operations {
                normalize,
                namespace,
                validate,
                materialize,
            };
            if operations == Operations::default() {
                dirs.config(Operations::all())
            } else {
                dirs.config(operations)
            }
        }
        Command::Migrate { source, target } => {
            let migrator = match migrator(source, target) {
                Ok(migrator) => migrator,
                Err(e) => {
                    e.print()?;
                    std::process::exit(MISSING_SOURCE_STATUS);
                }
            };
            println!("{}", migrator.run()?);
            return Ok(());
        }
    };

    let report = sqlflow_lessons::run(&config, &Defaults::default()).await?;
    println!("{report}");

    Ok(())
}
