mod error_formatter;
mod formatter;
mod server;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use formatter::Formatter;
use purelogic::{Context, Engine, LogicRule, ResourceLimits, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "purelogic")]
#[command(about = "Rules that can check themselves.")]
#[command(
    long_about = "PureLogic evaluates side-effect-free logic rules over facts you provide.\nRules are JSON documents carrying a formula, an optional self-validation and unit tests.\nThe CLI evaluates expressions, runs and tests rules from a directory, or serves the engine over HTTP."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single expression
    ///
    /// Bindings use name=value, where value is itself an expression
    /// (files=[1,2], name="x"). Anything that does not parse is bound as a string.
    Eval {
        /// Expression in the textual syntax
        expression: String,
        /// Variable bindings (format: name=value)
        bindings: Vec<String>,
        /// JSON object whose fields become variable bindings
        #[arg(short = 'f', long = "facts")]
        facts_file: Option<PathBuf>,
        /// Print every evaluated node after the result
        #[arg(long)]
        trace: bool,
        /// Memoize sub-expression results during evaluation
        #[arg(long)]
        cache: bool,
        /// Resource limits as JSON, e.g. '{"max_fixpoint_iterations": 100}'
        #[arg(long)]
        limits: Option<String>,
        /// Output the raw value only (for piping to other tools)
        #[arg(short = 'r', long)]
        raw: bool,
    },
    /// Run rules against facts
    ///
    /// Loads every .json rule document under the workspace, self-validates each
    /// rule and evaluates the trusted ones. Exits with status 1 unless every
    /// rule that ran evaluated to true.
    Run {
        /// Rule to run (default: all rules)
        rule_id: Option<String>,
        /// JSON object whose fields become the facts
        #[arg(short = 'f', long = "facts")]
        facts_file: Option<PathBuf>,
        /// Only run rules belonging to one of these philosophies
        #[arg(short = 'p', long = "philosophy")]
        philosophies: Vec<String>,
        /// Workspace root directory containing rule documents
        #[arg(short = 'd', long = "dir", default_value = ".")]
        workdir: PathBuf,
        /// Resource limits as JSON
        #[arg(long)]
        limits: Option<String>,
    },
    /// Run rules' self-validation and unit tests
    Test {
        /// Rule to test (default: all rules)
        rule_id: Option<String>,
        /// Workspace root directory containing rule documents
        #[arg(short = 'd', long = "dir", default_value = ".")]
        workdir: PathBuf,
    },
    /// Show a rule's structure
    Show {
        /// Id of the rule to show
        rule_id: String,
        /// Workspace root directory containing rule documents
        #[arg(short = 'd', long = "dir", default_value = ".")]
        workdir: PathBuf,
    },
    /// List registered functions with their signatures
    Functions,
    /// Start HTTP server (default: localhost:3000)
    ///
    /// Each request gets a fresh evaluator over the loaded rules.
    /// API: POST /evaluate with {expression, bindings}
    Server {
        /// Workspace root directory containing rule documents
        #[arg(short = 'd', long = "dir", default_value = ".")]
        workdir: PathBuf,
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port number to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Resource limits as JSON
        #[arg(long)]
        limits: Option<String>,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Eval {
            expression,
            bindings,
            facts_file,
            trace,
            cache,
            limits,
            raw,
        } => eval_command(
            expression,
            bindings,
            facts_file.as_deref(),
            *trace,
            *cache,
            limits.as_deref(),
            *raw,
        ),
        Commands::Run {
            rule_id,
            facts_file,
            philosophies,
            workdir,
            limits,
        } => run_command(
            workdir,
            rule_id.as_deref(),
            facts_file.as_deref(),
            philosophies,
            limits.as_deref(),
        ),
        Commands::Test { rule_id, workdir } => test_command(workdir, rule_id.as_deref()),
        Commands::Show { rule_id, workdir } => show_command(workdir, rule_id),
        Commands::Functions => functions_command(),
        Commands::Server {
            workdir,
            host,
            port,
            limits,
        } => server_command(workdir, host, *port, limits.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if let Some(logic_err) = e.downcast_ref::<purelogic::LogicError>() {
                eprintln!("{}", error_formatter::format_error(logic_err));
            } else {
                eprintln!("Error: {:#}", e);
            }
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "purelogic=info,tower_http=info".into()),
        )
        .init();
}

fn eval_command(
    expression: &str,
    bindings: &[String],
    facts_file: Option<&Path>,
    trace: bool,
    cache: bool,
    limits: Option<&str>,
    raw: bool,
) -> Result<bool> {
    let mut engine = Engine::with_limits(parse_limits(limits)?);
    let mut context = load_facts(facts_file)?;
    for binding in bindings {
        let (name, value) = parse_binding(&mut engine, binding)?;
        context.bind_variable(name, value);
    }

    engine.evaluator_mut().enable_caching(cache);
    engine.evaluator_mut().enable_tracing(trace);

    let value = engine.evaluate_source(expression, &mut context)?;
    let formatter = Formatter::default();
    if raw {
        println!("{}", value);
    } else {
        print!("{}", formatter.format_value(&value));
    }
    if trace {
        print!("{}", formatter.format_trace(engine.evaluator().trace()));
    }

    Ok(true)
}

fn run_command(
    workdir: &Path,
    rule_id: Option<&str>,
    facts_file: Option<&Path>,
    philosophies: &[String],
    limits: Option<&str>,
) -> Result<bool> {
    let mut engine = Engine::with_limits(parse_limits(limits)?);
    load_workspace(&mut engine, workdir)?;
    let context = load_facts(facts_file)?;

    if !philosophies.is_empty() {
        let wanted = philosophies.to_vec();
        engine.set_eligibility(move |rule: &LogicRule| {
            rule.philosophies.iter().any(|p| wanted.contains(p))
        });
    }

    let reports = match rule_id {
        Some(id) => {
            engine.get_rule(id)?;
            vec![engine.run_rule(id, &context)]
        }
        None => engine.run_all(&context),
    };

    let formatter = Formatter::default();
    print!("{}", formatter.format_rule_reports(&reports));

    Ok(reports.iter().all(|report| {
        report.outcome.holds() || report.outcome == purelogic::RuleOutcome::Skipped
    }))
}

fn test_command(workdir: &Path, rule_id: Option<&str>) -> Result<bool> {
    let mut engine = Engine::new();
    load_workspace(&mut engine, workdir)?;

    let ids = match rule_id {
        Some(id) => vec![id.to_string()],
        None => engine.rules().iter().map(|rule| rule.id.clone()).collect(),
    };

    let mut results = Vec::with_capacity(ids.len());
    for id in &ids {
        let validation = engine.validate_rule(id)?;
        let tests = engine.test_rule(id)?;
        results.push((validation, tests));
    }

    let formatter = Formatter::default();
    print!("{}", formatter.format_test_reports(&results));

    Ok(results
        .iter()
        .all(|(validation, tests)| validation.trusted() && tests.passed()))
}

fn show_command(workdir: &Path, rule_id: &str) -> Result<bool> {
    let mut engine = Engine::new();
    load_workspace(&mut engine, workdir)?;

    let rule = engine.get_rule(rule_id)?;
    let formatter = Formatter::default();
    print!("{}", formatter.format_rule(&rule));

    Ok(true)
}

fn functions_command() -> Result<bool> {
    let engine = Engine::new();
    let formatter = Formatter::default();
    print!("{}", formatter.format_functions(engine.evaluator().registry()));
    Ok(true)
}

#[cfg(feature = "server")]
fn server_command(workdir: &Path, host: &str, port: u16, limits: Option<&str>) -> Result<bool> {
    use tokio::runtime::Runtime;
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut engine = Engine::with_limits(parse_limits(limits)?);
        load_workspace(&mut engine, workdir)?;

        println!(
            "Starting HTTP server with {} rule(s) loaded",
            engine.rules().len()
        );
        server::http::start_server(engine, host, port).await
    })?;

    Ok(true)
}

#[cfg(not(feature = "server"))]
fn server_command(_workdir: &Path, _host: &str, _port: u16, _limits: Option<&str>) -> Result<bool> {
    eprintln!("Error: Server feature not enabled");
    eprintln!("Recompile with: cargo build --features server");
    Ok(false)
}

/// Load all .json rule documents under the workspace directory
fn load_workspace(engine: &mut Engine, workdir: &Path) -> Result<()> {
    if !workdir.is_dir() {
        anyhow::bail!("Workspace directory '{}' not found", workdir.display());
    }

    for entry in WalkDir::new(workdir).sort_by_file_name() {
        let entry = entry?;
        if entry.path().extension().and_then(|s| s.to_str()) == Some("json") {
            let path = entry.path();
            let source_id = path.to_string_lossy().to_string();
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            engine.load_rules(&text, &source_id)?;
        }
    }

    Ok(())
}

fn load_facts(facts_file: Option<&Path>) -> Result<Context> {
    let Some(path) = facts_file else {
        return Ok(Context::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read facts file {}", path.display()))?;
    let facts: Value = serde_json::from_str(&text)
        .with_context(|| format!("Facts file {} is not valid JSON", path.display()))?;
    Context::from_object(&facts)
        .with_context(|| format!("Facts file {} must contain a JSON object", path.display()))
}

fn parse_limits(limits: Option<&str>) -> Result<ResourceLimits> {
    match limits {
        Some(json) => serde_json::from_str(json).context("Invalid --limits JSON"),
        None => Ok(ResourceLimits::default()),
    }
}

/// Parse "name=value", evaluating the value as a closed expression
fn parse_binding(engine: &mut Engine, binding: &str) -> Result<(String, Value)> {
    let (name, source) = binding
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid binding '{}' (expected name=value)", binding))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Invalid binding '{}' (empty name)", binding);
    }

    let value = match engine.evaluate_source(source, &mut Context::new()) {
        Ok(value) => value,
        Err(_) => Value::String(source.to_string()),
    };
    Ok((name.to_string(), value))
}
