use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use onm_model::{Model, ModelDeclaration, Store};
use onm_registry::{traverse_root, ModelRegistry};
use onm_server::{OnmServer, ServerConfig};
use tracing::Level;

use crate::cli::{CheckArgs, Cli, Command, ModelsArgs, ServeArgs};

pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Models(args) => cmd_models(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn serve_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(models) = args.models {
        config.models_dir = models;
    }
    if let Some(prefix) = args.prefix {
        config.route_prefix = prefix;
    }
    if args.enable_bulk_delete {
        config.enable_bulk_delete = true;
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(args)?;
    let server = OnmServer::from_config(config).context("failed to load data models")?;
    println!(
        "{} onm host on {} ({} models)",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold(),
        server.state().models.len()
    );
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_models(args: ModelsArgs) -> anyhow::Result<()> {
    let registry = ModelRegistry::load_dir(&args.models)
        .with_context(|| format!("failed to load models from {}", args.models.display()))?;
    if registry.is_empty() {
        println!("No models in {}.", args.models.display());
        return Ok(());
    }
    for summary in registry.list_models() {
        let version = summary.model_package["version"].as_str().unwrap_or("-");
        println!("{}  {}", summary.model_name.yellow().bold(), version.dimmed());
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let model = compile_file(&args.file)?;
    println!("{} {} compiles", "✓".green().bold(), model.name().yellow().bold());
    println!("  Root: {}", model.root_tag().cyan());
    println!("  Namespaces: {}", model.len());

    let store = Store::new(Arc::new(model));
    for hash in traverse_root(&store)? {
        println!("  {}", hash);
    }
    Ok(())
}

fn compile_file(path: &Path) -> anyhow::Result<Model> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let model = ModelDeclaration::from_json_str(&text)
        .and_then(ModelDeclaration::compile)
        .with_context(|| format!("invalid model file {}", path.display()))?;
    Ok(model)
}
