//! Command handlers.

use crate::config::OutputFormat;
use console::style;
use ironbot_agent::{BuildAgent, CiConfig};
use ironbot_core::manifest::Manifest;
use ironbot_core::pipeline::Step;
use ironbot_core::run::{RunStatus, RunSummary, StepStatus};
use ironbot_scheduler::{PackageExpander, TagFilter};
use schemars::JsonSchema;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Print `value` as JSON or YAML, or hand it to `table` for the default view.
fn emit<T: Serialize>(value: &T, format: OutputFormat, table: impl FnOnce(&T)) -> CliResult {
    match format {
        OutputFormat::Table => table(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// One-line summary of what a step does.
fn describe(step: &Step) -> String {
    match step {
        Step::Checkout(checkout) => {
            format!("checkout {} ({})", checkout.repository, checkout.branch)
        }
        Step::Shell(shell) => match &shell.workdir {
            Some(dir) => format!("{}  [in {}]", shell.display_command(), dir.display()),
            None => shell.display_command(),
        },
        Step::Notify(request) => format!("POST {}", request.url),
        Step::ExpandPackages(expand) => format!(
            "build the packages listed in {} under {}",
            expand.manifest,
            expand.workdir.display()
        ),
    }
}

fn print_steps(steps: &[Step]) {
    for (i, step) in steps.iter().enumerate() {
        let halt = if step.halt_on_failure() {
            style("halt").red().to_string()
        } else {
            style("continue").dim().to_string()
        };
        println!(
            "{:>3}. {} {} {}",
            i + 1,
            style(step.name()).bold(),
            style(format!("({})", step.kind())).dim(),
            halt
        );
        println!("     {}", describe(step));
    }
}

/// Show the steps a builder starts with.
pub fn plan(
    config: &CiConfig,
    builder: &str,
    branch: Option<String>,
    format: OutputFormat,
) -> CliResult {
    let agent = BuildAgent::new(config.clone());
    let props = config.builder(builder)?.properties(None, branch, None);
    let steps = agent.plan(builder, &props)?;

    emit(&steps, format, |steps| {
        println!(
            "{} {} on {}",
            style("▶").cyan(),
            style(builder).bold(),
            style(&props.branch).dim()
        );
        print_steps(steps);
    })
}

/// Run a builder on this worker.
pub async fn run(
    config: CiConfig,
    builder: &str,
    repository: Option<String>,
    branch: Option<String>,
    codebase: Option<String>,
    format: OutputFormat,
) -> CliResult {
    let props = config
        .builder(builder)?
        .properties(repository, branch, codebase);
    if props.repository.is_empty() {
        return Err(format!("builder {} has no repository; pass --repository", builder).into());
    }

    if matches!(format, OutputFormat::Table) {
        println!(
            "{} Running {} on {}",
            style("▶").cyan(),
            style(builder).bold(),
            style(&props.branch).dim()
        );
    }

    let agent = BuildAgent::new(config);
    let summary = agent.run_builder(builder, props).await?;
    emit(&summary, format, print_summary)?;

    if summary.status.is_success() {
        Ok(())
    } else {
        Err(format!("run {} failed", summary.run_id).into())
    }
}

fn print_summary(summary: &RunSummary) {
    for step in &summary.steps {
        let marker = match step.status {
            StepStatus::Success => style("✓").green(),
            StepStatus::Warnings => style("!").yellow(),
            StepStatus::Failure => style("✗").red(),
            StepStatus::Skipped => style("-").dim(),
        };
        let timing = step
            .duration_ms
            .map(|ms| format!(" {}ms", ms))
            .unwrap_or_default();
        println!("  {} {}{}", marker, step.name, style(timing).dim());
        if let Some(error) = &step.error {
            println!("      {}", style(error).dim());
        }
    }

    let status = match summary.status {
        RunStatus::Success if summary.warnings() > 0 => style("succeeded with warnings").yellow(),
        RunStatus::Success => style("succeeded").green(),
        RunStatus::Failure => style("failed").red(),
    };
    println!(
        "Run {} {} in {}ms",
        style(summary.run_id).bold(),
        status,
        summary.duration_ms
    );
}

/// Show the package builds a manifest produces.
pub fn expand(manifest: &Path, workdir: &Path, format: OutputFormat) -> CliResult {
    let content = match std::fs::read(manifest) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    let manifest = Manifest::from_content(content.as_deref())?;
    let steps: Vec<Step> = PackageExpander::new()
        .expand(&manifest, workdir)
        .into_iter()
        .map(Step::from)
        .collect();

    emit(&steps, format, |steps| {
        if steps.is_empty() {
            println!("{} Nothing to build", style("i").blue());
        } else {
            print_steps(steps);
        }
    })
}

/// Show the rebuild triggers a tag filter selects.
pub fn triggers(
    config: &CiConfig,
    any_of: Vec<String>,
    contains: Option<String>,
    format: OutputFormat,
) -> CliResult {
    let filter = match contains {
        Some(tag) => TagFilter::contains(tag),
        None => TagFilter::any_of(any_of),
    };
    let requests = config.dispatcher().dispatch(&config.triggers, &filter);

    emit(&requests, format, |requests| {
        if requests.is_empty() {
            println!("{} No trigger matches", style("i").blue());
        }
        for request in requests {
            println!("  {} {}", style(&request.target).bold(), style(&request.url).dim());
        }
    })
}

/// Validate a worker configuration file.
pub fn validate(path: &Path) -> CliResult {
    let config = CiConfig::from_file(path)?;
    config.validate()?;

    println!(
        "{} {} is valid",
        style("✓").green(),
        style(path.display()).bold()
    );
    println!("  Triggers: {}", config.triggers.len());
    println!("  Builders: {}", config.builders.len());
    let catalog = config.catalog();
    for builder in &config.builders {
        let factory = config.factory(builder, catalog.clone());
        println!("    - {} ({})", builder.name, factory.kind());
    }
    Ok(())
}

/// Print the JSON Schema of `T`.
pub fn schema<T: JsonSchema>() -> CliResult {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
