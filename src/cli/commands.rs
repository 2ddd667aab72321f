use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use raidionics_catalog::backend::{BackendRequest, ConfigGenerator, TargetSpace};
use raidionics_catalog::catalog::{matches_terms, refresh_catalog, CatalogRefresh, ReconcilePolicy};
use raidionics_catalog::cloud::{available, install_manifest, load_listing};
use raidionics_catalog::config::Settings;
use raidionics_catalog::inventory::{resolve, RuntimeInventory};
use raidionics_catalog::manifest::{ManifestLoader, ModelDescriptor, TaskKind};
use raidionics_catalog::selection::{
    select_postop_variant, SelectionContext, FLAIR_POSTOP, T1WCE_PREOP, T1W_POSTOP,
};

use super::display::{
    display_cloud_table, display_details, display_inventory, display_models_table,
    display_refresh_warnings,
};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Model to run; chosen from the post-operative variants when omitted
    #[arg(long)]
    model: Option<String>,
    /// Task kind: segmentation, diagnosis or reporting
    #[arg(long, default_value = "segmentation")]
    task: String,
    /// Target space, e.g. neuro or mediastinum
    #[arg(long, default_value = "neuro")]
    target_space: String,
    #[arg(long, default_value = "")]
    caller: String,
    /// Available optional input used for variant selection (repeatable)
    #[arg(long = "present", value_name = "INPUT")]
    present: Vec<String>,
    /// Overrides backend.working_directory
    #[arg(long)]
    working_dir: Option<PathBuf>,
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{prefix:.bold.dim} {spinner} {wide_msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message);
    Ok(pb)
}

async fn refresh(settings: &Settings) -> anyhow::Result<CatalogRefresh> {
    let pb = spinner("Querying image inventory and scanning manifests...")?;
    let loader = ManifestLoader::new(&settings.models.directory);
    let inventory = RuntimeInventory::from_config(&settings.runtime);
    let result = refresh_catalog(&loader, &inventory, ReconcilePolicy::from_config(&settings.models))
        .await
        .with_context(|| {
            format!(
                "Failed to read manifest directory {}",
                settings.models.directory.display()
            )
        });
    pb.finish_and_clear();
    result
}

pub(super) async fn handle_models(
    settings: &Settings,
    task: Option<String>,
    terms: &[String],
) -> anyhow::Result<()> {
    let refresh = refresh(settings).await?;
    let models: Vec<&ModelDescriptor> = match task {
        Some(task) => refresh.catalog.search(&TaskKind::parse(&task), terms),
        None => refresh
            .catalog
            .all()
            .iter()
            .filter(|model| matches_terms(&model.name, terms))
            .collect(),
    };
    display_models_table(&models);
    display_refresh_warnings(&refresh);
    Ok(())
}

pub(super) async fn handle_details(settings: &Settings, name: &str) -> anyhow::Result<()> {
    let refresh = refresh(settings).await?;
    let fields = refresh.catalog.get_detail_fields(name)?;
    display_details(name, &fields);
    Ok(())
}

pub(super) async fn handle_inventory(settings: &Settings) -> anyhow::Result<()> {
    let pb = spinner("Querying image inventory...")?;
    let snapshot = resolve(&RuntimeInventory::from_config(&settings.runtime)).await;
    pb.finish_and_clear();
    display_inventory(&snapshot);
    Ok(())
}

pub(super) async fn handle_cloud(settings: &Settings, terms: &[String]) -> anyhow::Result<()> {
    let location = settings
        .cloud
        .listing
        .as_deref()
        .context("No cloud listing configured (set cloud.listing)")?;
    let entries = load_listing(location).await?;
    let refresh = refresh(settings).await?;
    display_cloud_table(&available(&refresh.catalog, &entries, terms));
    Ok(())
}

pub(super) fn handle_install(settings: &Settings, manifest: &Path) -> anyhow::Result<()> {
    let installed = install_manifest(&settings.models.directory, manifest)?;
    println!("{} {}", "Installed".green(), installed.display());
    Ok(())
}

fn selection_context(present: &[String]) -> SelectionContext {
    present.iter().map(|input| (input.as_str(), true)).collect()
}

pub(super) fn handle_select(present: &[String]) {
    let context = selection_context(present);
    for input in [T1W_POSTOP, FLAIR_POSTOP, T1WCE_PREOP] {
        let mark = if context.is_present(input) { "present".green() } else { "absent".bright_black() };
        println!("{:<14} {}", input, mark);
    }
    let variant = select_postop_variant(&context);
    println!(
        "{} {} ({})",
        "Selected:".bright_cyan(),
        variant.model_name().bold(),
        variant.label()
    );
}

pub(super) async fn handle_generate(settings: &Settings, args: GenerateArgs) -> anyhow::Result<()> {
    let task = TaskKind::parse(&args.task);
    let model_name = match args.model {
        Some(model) => model,
        None => select_postop_variant(&selection_context(&args.present))
            .model_name()
            .to_string(),
    };

    // Reporting runs a document template, not a catalog model
    if task != TaskKind::Reporting {
        let refresh = refresh(settings).await?;
        refresh.catalog.get(&model_name)?;
    }

    let request = BackendRequest::new(model_name, task, TargetSpace::parse(&args.target_space))
        .with_caller(args.caller);
    let working_dir = args
        .working_dir
        .unwrap_or_else(|| settings.backend.working_directory.clone());

    let path = ConfigGenerator::from_settings(&settings.backend)
        .write(&request, &settings.user, &working_dir)
        .context("Backend configuration was not written; processing must not start")?;
    println!("{} {}", "Backend configuration written to".green(), path.display());
    Ok(())
}
