//! `stormod` — inspect and exercise a JSON module declaration.
//!
//! ```text
//! stormod --module notes.json describe
//! stormod --module notes.json render createNote --context '{"title": "Hello"}'
//! stormod --module notes.json execute createNote --context '{"title": "Hello"}' --debug
//! stormod --module notes.json collections --as-of 1700000000000
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stormod_core::template::placeholders;
use stormod_core::{ModuleError, RenderContext, SchemaVersion, Value};
use stormod_runtime::backends::MemoryBackend;
use stormod_runtime::{
    register_module_collections, DebugConfig, DefaultOperationExecutor, InMemoryCollectionRegistry,
    JsonDeclaration, StorageModule,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Inspect and exercise declarative storage modules.
#[derive(Parser)]
#[command(name = "stormod", version)]
struct Cli {
    /// Path to the module declaration (JSON).
    #[arg(short, long, env = "STORMOD_MODULE")]
    module: PathBuf,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, env = "STORMOD_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List operations with their kind, collection and required context keys.
    Describe,
    /// Render an operation to its backend call without executing it.
    Render {
        operation: String,
        /// Render context as a JSON object.
        #[arg(short, long, default_value = "{}")]
        context: String,
    },
    /// Execute an operation against a fresh in-memory backend.
    Execute {
        operation: String,
        /// Render context as a JSON object.
        #[arg(short, long, default_value = "{}")]
        context: String,
        /// Trace backend calls.
        #[arg(long)]
        debug: bool,
        /// Also trace backend results (implies --debug).
        #[arg(long)]
        include_return_values: bool,
        /// Print nested structures in full.
        #[arg(long)]
        deep: bool,
    },
    /// Show the collection revisions effective at a point in time.
    Collections {
        /// Resolution time in milliseconds since Unix epoch. Defaults to now.
        #[arg(long)]
        as_of: Option<u64>,
    },
}

fn init_logging(json: bool, debug: bool) {
    let default_filter = if debug { "warn,stormod_runtime=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

fn parse_context(text: &str) -> anyhow::Result<RenderContext> {
    let value: Value = serde_json::from_str(text).context("context is not valid JSON")?;
    match value {
        Value::Map(entries) => Ok(entries),
        other => anyhow::bail!("context must be a JSON object, got {other}"),
    }
}

fn print_json(value: impl Into<serde_json::Value>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value.into())?);
    Ok(())
}

fn describe(module: &StorageModule) -> anyhow::Result<()> {
    let operations = module.operations()?;
    let described: serde_json::Map<String, serde_json::Value> = operations
        .iter()
        .map(|(name, definition)| {
            let required: Vec<String> = definition
                .args
                .as_ref()
                .map(|args| placeholders(args).into_iter().collect())
                .unwrap_or_default();
            let entry = serde_json::json!({
                "operation": definition.operation.as_str(),
                "collection": definition.collection,
                "context": required,
            });
            (name.clone(), entry)
        })
        .collect();
    print_json(serde_json::Value::Object(described))
}

fn render(module: &StorageModule, operation: &str, context: &RenderContext) -> anyhow::Result<()> {
    let operations = module.operations()?;
    let definition = operations
        .get(operation)
        .ok_or_else(|| ModuleError::UnknownOperation {
            name: operation.to_string(),
        })?;
    let call = stormod_core::render_operation(definition, context)?;
    print_json(Value::Array(call.to_values()))
}

fn collections(module: &StorageModule, as_of: Option<SchemaVersion>) -> anyhow::Result<()> {
    let registry = InMemoryCollectionRegistry::new();
    register_module_collections(&registry, module, as_of)?;
    let resolved: serde_json::Map<String, serde_json::Value> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let collection = registry.get(&name)?;
            let snapshots = serde_json::to_value(&collection.snapshots).ok()?;
            Some((name, snapshots))
        })
        .collect();
    print_json(serde_json::Value::Object(resolved))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let tracing_debug = matches!(
        cli.command,
        Command::Execute { debug: true, .. } | Command::Execute { include_return_values: true, .. }
    );
    init_logging(cli.log_json, tracing_debug);

    let declaration = JsonDeclaration::from_path(&cli.module);

    match cli.command {
        Command::Describe => describe(&StorageModule::new("cli", declaration)),
        Command::Render { operation, context } => {
            let context = parse_context(&context)?;
            render(&StorageModule::new("cli", declaration), &operation, &context)
        }
        Command::Execute {
            operation,
            context,
            debug,
            include_return_values,
            deep,
        } => {
            let context = parse_context(&context)?;
            let backend = Arc::new(MemoryBackend::new());
            let mut builder = StorageModule::builder("cli", declaration)
                .executor(Arc::new(DefaultOperationExecutor::new(backend)));
            if debug || include_return_values {
                let mut config = DebugConfig::enabled();
                config.include_return_values = include_return_values;
                config.print_deep_objects = deep;
                builder = builder.debug(config);
            }
            let module = builder.build();
            let result = module.operation(&operation, &context, None).await?;
            print_json(result.unwrap_or(Value::Null))
        }
        Command::Collections { as_of } => {
            collections(
                &StorageModule::new("cli", declaration),
                as_of.map(SchemaVersion),
            )
        }
    }
}
