mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use commands::{CommandError, EXIT_FAILURE};
use irongantry_core::{Engine, EngineConfig};
use irongantry_runtime::{Backend, MockBackend};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "irongantry",
    version,
    about = "Declare, build, run, and ship small Python application projects"
)]
struct Cli {
    /// Project root directory containing the IronGantryfile.
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the IronGantry version.
    Version,
    /// Create an IronGantryfile for a new project.
    Init {
        /// Project name (letters, digits, '_' and '-').
        #[arg(default_value = "my_app")]
        name: String,
    },
    /// Rebuild the project environment from scratch and install packages.
    Build,
    /// Run the entrypoint inside the project environment.
    Run,
    /// Package the project into a self-bootstrapping <project>_shipped.zip.
    Ship,
}

fn make_backend() -> Result<Backend, CommandError> {
    let name = std::env::var("IRONGANTRY_BACKEND").unwrap_or_else(|_| "system".to_owned());
    if name != "mock" {
        return irongantry_runtime::select_backend(&name)
            .map_err(|e| CommandError::failure(e.to_string()));
    }
    let mut mock = MockBackend::new().echoing();
    if let Ok(raw) = std::env::var("IRONGANTRY_MOCK_EXIT") {
        let code = raw.trim().parse::<i32>().map_err(|_| {
            CommandError::failure(format!(
                "IRONGANTRY_MOCK_EXIT must be an integer, got '{raw}'"
            ))
        })?;
        mock = mock.with_exit_code(code);
    }
    Ok(Backend::mock(&mock))
}

fn make_engine(project: PathBuf) -> Result<Engine, CommandError> {
    let mut config = EngineConfig::new(project);
    match std::env::current_exe() {
        Ok(exe) => config = config.with_engine_binary(exe),
        Err(e) => tracing::warn!("cannot locate own executable, ship will not bundle it: {e}"),
    }
    Ok(Engine::new(config, make_backend()?))
}

/// Fails early when the host cannot create environments, before `build`
/// deletes the existing one.
fn check_prereqs(engine: &Engine) -> Result<(), CommandError> {
    if engine.backend_name() == "mock"
        || std::env::var("IRONGANTRY_SKIP_PREREQS").as_deref() == Ok("1")
    {
        return Ok(());
    }
    let missing = irongantry_runtime::check_python_prereqs();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CommandError::failure(irongantry_runtime::format_missing(
            &missing,
        )))
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("IRONGANTRY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let Some(command) = cli.command else {
        // Help goes to stderr: a bare invocation is a usage error.
        eprintln!("{}", Cli::command().render_help());
        return ExitCode::from(EXIT_FAILURE);
    };

    let result = dispatch(command, cli.project, cli.json);
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.exit_code)
        }
    }
}

fn dispatch(command: Commands, project: PathBuf, json: bool) -> Result<u8, CommandError> {
    match command {
        Commands::Version => commands::version::run(json),
        Commands::Init { name } => commands::init::run(&make_engine(project)?, &name, json),
        Commands::Build => {
            let engine = make_engine(project)?;
            check_prereqs(&engine)?;
            commands::build::run(&engine, json)
        }
        Commands::Run => commands::run::run(&make_engine(project)?, json),
        Commands::Ship => commands::ship::run(&make_engine(project)?, json),
    }
}
