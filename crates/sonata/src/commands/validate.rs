//! Validate command

use anyhow::{Context, Result};
use camino::Utf8Path;
use sonata_core::{DescriptorKind, EventLevel, Workspace};
use sonata_validate::{TopologyLevel, ValidationReport, Validator, ValidatorConfig};
use tracing::debug;

use crate::cli::ValidateArgs;
use crate::output;

/// Validate one object and print its report. Returns the process exit code.
pub async fn run(
    kind: DescriptorKind,
    args: ValidateArgs,
    workspace: Option<&Utf8Path>,
    quiet: bool,
) -> Result<u8> {
    let workspace = match workspace {
        Some(dir) => Workspace::with_root(dir.as_std_path()),
        None => Workspace::locate()?,
    };
    let mut validator = Validator::from_workspace(&workspace)
        .with_context(|| format!("Failed to load workspace {:?}", workspace.root()))?;

    let (syntax, integrity, topology) = args.layers();
    let level = TopologyLevel::try_from(args.level).map_err(anyhow::Error::msg)?;
    let mut config = ValidatorConfig::layers(syntax, integrity, topology).with_topology_level(level);
    if let Some(dpath) = &args.dpath {
        config = config.with_function_path(dpath.as_std_path());
    }
    debug!(
        "Validating {} {} in workspace {:?} (syntax={}, integrity={}, topology={}, level={:?}, dpath={:?})",
        kind,
        args.path,
        workspace.root(),
        syntax,
        integrity,
        topology,
        level,
        args.dpath
    );

    // Ctrl-C cancels the run at its next suspension point
    let token = config.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    validator.configure(config);

    let spinner = (!args.json && !quiet)
        .then(|| output::spinner(&format!("Validating {} {}", kind, args.path)));

    let path = args.path.as_std_path();
    let result = match kind {
        DescriptorKind::Package => validator.validate_package(path).await,
        DescriptorKind::Service => validator.validate_service(path).await,
        DescriptorKind::Function => validator.validate_function(path).await,
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result.with_context(|| format!("Failed to validate {}", args.path))?;

    if let Some(graph_out) = &args.graph_out {
        write_graph(&report, graph_out, quiet)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_report(&report);
    }

    Ok(report.exit_code())
}

fn write_graph(report: &ValidationReport, path: &Utf8Path, quiet: bool) -> Result<()> {
    let Some(graph) = &report.topology else {
        output::warning(&format!(
            "No topology graph was built for {}, {} not written",
            report.object_id, path
        ));
        return Ok(());
    };

    std::fs::write(path, graph.to_graphml())
        .with_context(|| format!("Failed to write graph to {}", path))?;
    if !quiet {
        output::info(&format!(
            "Wrote {} node(s) and {} edge(s) to {}",
            graph.node_count(),
            graph.edge_count(),
            path
        ));
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    output::header(&format!("{} {}", report.kind, report.object_id));

    for event in report.errors.iter().chain(report.warnings.iter()) {
        for message in &event.messages {
            let line = format!("[{}] {}: {}", event.event_code, event.object_id, message);
            match event.level {
                EventLevel::Error => output::error(&line),
                _ => output::warning(&line),
            }
        }
    }

    for trace in &report.traces {
        let steps: Vec<String> = trace.steps.iter().map(|s| s.to_string()).collect();
        output::kv(
            &format!("{}/{}", trace.graph_id, trace.path_id),
            &steps.join(" -> "),
        );
    }

    output::kv("Errors", &report.error_count.to_string());
    output::kv("Warnings", &report.warning_count.to_string());

    if report.is_valid() {
        output::success(&format!("{} is valid", report.object_id));
    } else {
        output::error(&format!("{} is invalid", report.object_id));
    }
}
