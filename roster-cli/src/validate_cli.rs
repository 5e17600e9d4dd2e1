//! Asset repository validation command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use roster_core::asset::Category;
use roster_core::catalog::{AssetIndex, INDEX_FILE};
use roster_core::validate::{
    GitCli, ValidateModuleResult, ValidateOptions, ValidationReport, Validator,
};

use crate::resolve_cli::Environment;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Asset repository root
    #[clap(long, default_value = ".")]
    repo: PathBuf,

    /// Index file, relative to the repository root unless absolute
    #[clap(long, default_value = "index/index.yaml")]
    index: PathBuf,

    /// Only validate these categories (repeatable)
    #[clap(long = "category")]
    categories: Vec<Category>,

    /// Only validate assets whose name contains this text
    #[clap(long)]
    filter: Option<String>,

    /// Branch the checkout must be on (defaults to the configured branch)
    #[clap(long)]
    branch: Option<String>,

    /// Do not fetch or compare with the upstream branch
    #[clap(long)]
    offline: bool,

    /// Output the report as JSON
    #[clap(long)]
    json: bool,
}

pub async fn validate_command(env: &Environment, args: ValidateArgs) -> Result<()> {
    let index_path = args.repo.join(&args.index);
    let index_dir = index_path
        .parent()
        .context("Index path has no parent directory")?;
    if index_path.file_name().and_then(|n| n.to_str()) != Some(INDEX_FILE) {
        anyhow::bail!("Index file must be named {INDEX_FILE}: {}", index_path.display());
    }
    let index = AssetIndex::from_dir(index_dir)?;
    info!(
        "Validating {} indexed assets in {}",
        index.asset_count(),
        args.repo.display()
    );

    let options = ValidateOptions {
        branch: args
            .branch
            .unwrap_or_else(|| env.settings.validate.branch.clone()),
        offline: args.offline,
        categories: args.categories,
        name_filter: args.filter,
    };

    let client = env.catalog_client()?;
    let git = GitCli::new(args.repo.clone());
    let validator = Validator::new(&args.repo, &client, &git, options);

    let json = args.json;
    let report = validator
        .run(&index, |category, result| {
            if !json {
                print_progress(category, result);
            }
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_progress(category: Category, result: &ValidateModuleResult) {
    let mark = if result.passed { "ok  " } else { "FAIL" };
    let version = result.version.as_deref().unwrap_or("-");
    eprintln!(
        "  {mark} {}/{} ({version})",
        category.dir_name(),
        result.name
    );
}

fn print_summary(report: &ValidationReport) {
    for category in &report.categories {
        for module in category.modules.iter().filter(|m| !m.passed) {
            println!("{}/{}:", category.category.dir_name(), module.name);
            for issue in &module.issues {
                println!("  - {issue}");
            }
        }
    }

    if !report.orphans.is_empty() {
        println!("\nOrphaned modules (not in index):");
        for orphan in &report.orphans {
            println!("  - {}/{}", orphan.category.dir_name(), orphan.name);
        }
    }

    println!(
        "\n{} assets checked: {} passed, {} failed, {} orphans",
        report.module_count(),
        report.passed_count(),
        report.failed_count(),
        report.orphans.len()
    );
}
