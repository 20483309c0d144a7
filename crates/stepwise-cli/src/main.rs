//! `stepwise` command line
//!
//! - `stepwise inspect <dir>`: list every workspace with its scenarios and
//!   step order
//! - `stepwise walk <dir>`: walk a scenario from its first step, printing
//!   interpolated messages and template references

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use stepwise_core::{Engine, EngineConfig, EngineError, FsConfigSource, RenderView};
use stepwise_template::{FsLoader, Slot};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("stepwise")
        .version(stepwise_core::VERSION)
        .about("Inspect stepwise configuration and walk scenarios")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("inspect")
                .about("List workspaces, scenarios and step order")
                .arg(config_dir_arg()),
        )
        .subcommand(
            Command::new("walk")
                .about("Walk a scenario step by step")
                .arg(config_dir_arg())
                .arg(
                    Arg::new("workspace")
                        .long("workspace")
                        .help("Workspace to open (default: app defaultWorkspace)"),
                )
                .arg(
                    Arg::new("scenario")
                        .long("scenario")
                        .help("Scenario to walk (default: app defaultScenario)"),
                )
                .arg(
                    Arg::new("templates")
                        .long("templates")
                        .value_parser(value_parser!(PathBuf))
                        .help("Template root (default: <dir>/templates)"),
                ),
        )
}

fn config_dir_arg() -> Arg {
    Arg::new("dir")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Config directory holding app.json, workspaces/ and scenarios/")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let Some((command, args)) = matches.subcommand() else {
        return Ok(());
    };
    tracing::info!(command, version = stepwise_core::VERSION, "stepwise starting");
    let outcome = match command {
        "inspect" => inspect(args).await,
        "walk" => walk(args).await,
        _ => Ok(()),
    };
    if let Err(err) = &outcome {
        tracing::error!(command, error = %err, "command failed");
    }
    outcome
}

fn config_dir(args: &ArgMatches) -> Result<PathBuf> {
    args.get_one::<PathBuf>("dir")
        .cloned()
        .context("missing config directory")
}

fn engine_for(dir: PathBuf, templates: PathBuf) -> Engine {
    Engine::new(
        EngineConfig::default(),
        Arc::new(FsConfigSource::new(dir)),
        Arc::new(FsLoader::new(templates)),
    )
}

async fn inspect(args: &ArgMatches) -> Result<()> {
    let dir = config_dir(args)?;
    let engine = engine_for(dir.clone(), dir.join("templates"));

    match engine.load_app().await {
        Ok(app) => println!(
            "app: {} (templates: {}, default: {}/{})",
            app.name,
            app.tpl_dir,
            app.default_workspace.as_deref().unwrap_or("-"),
            app.default_scenario.as_deref().unwrap_or("-"),
        ),
        Err(EngineError::ConfigNotFound { .. }) => println!("app: <no app.json>"),
        Err(err) => return Err(err).context("loading app.json"),
    }

    let slugs = engine.discover_workspaces().await?;
    tracing::info!(dir = %dir.display(), workspaces = slugs.len(), "inspecting config");
    for slug in slugs {
        let workspace = engine
            .load_workspace(&slug)
            .await
            .with_context(|| format!("loading workspace {slug}"))?;
        println!("workspace {} ({})", workspace.slug, workspace.name);
        for scenario in &workspace.scenarios {
            println!("  scenario {} ({})", scenario.slug, scenario.name);
            for step in &scenario.nodes {
                let kind = step.step_type.as_deref().unwrap_or("-");
                println!("    {:>4}  {:<20} {:<12} {}", step.order, step.slug, kind, step.tpl_file);
            }
        }
    }
    Ok(())
}

async fn walk(args: &ArgMatches) -> Result<()> {
    let dir = config_dir(args)?;
    let templates = args
        .get_one::<PathBuf>("templates")
        .cloned()
        .unwrap_or_else(|| dir.join("templates"));
    let engine = engine_for(dir, templates);

    let app = match engine.load_app().await {
        Ok(app) => Some(app),
        Err(EngineError::ConfigNotFound { .. }) => None,
        Err(err) => return Err(err).context("loading app.json"),
    };
    let workspace = args
        .get_one::<String>("workspace")
        .cloned()
        .or_else(|| app.as_ref().and_then(|a| a.default_workspace.clone()))
        .context("no --workspace given and app.json names no defaultWorkspace")?;
    let scenario = args
        .get_one::<String>("scenario")
        .cloned()
        .or_else(|| app.as_ref().and_then(|a| a.default_scenario.clone()))
        .context("no --scenario given and app.json names no defaultScenario")?;

    engine
        .go_workspace(&workspace)
        .await
        .with_context(|| format!("opening workspace {workspace}"))?;
    engine.go_scenario(&scenario)?;
    tracing::info!(%workspace, %scenario, "walking scenario");
    if !engine.current_triple().has_step() {
        anyhow::bail!("scenario {scenario} is unknown or has no steps");
    }

    let first = engine.render_view().await?;
    if let Some(layout) = &first.layout {
        println!("layout: {}", describe(layout));
    }
    for widget in &first.widgets {
        println!("widget: {}", describe(widget));
    }
    if let Some(system) = &first.system_message {
        println!("system: {system}");
    }

    let mut view = first;
    loop {
        print_step(&view);
        if engine.next().is_none() {
            break;
        }
        view = engine.render_view().await?;
    }
    let stats = engine.resolver().stats();
    tracing::info!(
        loads = stats.loads,
        hits = stats.hits,
        failures = stats.failures,
        "walk finished"
    );
    Ok(())
}

fn print_step(view: &RenderView) {
    let Some(step) = &view.step else {
        println!("- {} <missing step>", view.triple);
        return;
    };
    println!("- [{}] {} ({})", step.order, step.slug, step.label);
    if let Some(content) = &view.content {
        println!("    template:  {}", describe(content));
    }
    if let Some(message) = &view.assistant_message {
        println!("    assistant: {message}");
    }
    if let Some(message) = &view.initial_user_message {
        println!("    user:      {message}");
    }
}

fn describe(slot: &Slot) -> String {
    match slot.placeholder_label() {
        Some(label) => format!("{} [unresolved: {label}]", slot.reference()),
        None => slot.reference().to_string(),
    }
}
