//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::Measurement;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{DiameterMethod, WeightedGraph};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::{SimplifiedView, ToTermTree};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `arborist --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => {
            let project_dir = project_dir(cli)?;
            let settings = Settings::load(Some(project_dir.as_path()))?;
            _config(command, &settings, &project_dir)
        }
        Commands::Diameter {
            file,
            method,
            compartments,
            export,
        } => {
            let mut settings = load_settings(cli)?;
            override_method(&mut settings, *method);
            override_compartments(&mut settings, compartments);
            let container = ServiceContainer::new(settings)?;
            _diameter(&container, file, export.as_deref())
        }
        Commands::Leaves { file, compartments } => {
            let mut settings = load_settings(cli)?;
            override_compartments(&mut settings, compartments);
            let container = ServiceContainer::new(settings)?;
            _leaves(&container, file)
        }
        Commands::Measure {
            dir,
            filter,
            recursive,
            method,
        } => {
            let mut settings = load_settings(cli)?;
            override_method(&mut settings, *method);
            if filter.is_some() {
                settings.name_filter = filter.clone();
            }
            settings.recursive |= *recursive;
            let container = ServiceContainer::new(settings)?;
            _measure(&container, dir)
        }
        Commands::Tree { file, full } => {
            let container = ServiceContainer::new(load_settings(cli)?)?;
            _tree(&container, file, *full)
        }
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("current directory", e))),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = project_dir(cli)?;
    let settings = Settings::load(Some(dir.as_path()))?;
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn override_method(settings: &mut Settings, method: Option<DiameterMethod>) {
    if let Some(method) = method {
        settings.method = method;
    }
}

/// Command-line compartments replace configured ones.
fn override_compartments(settings: &mut Settings, compartments: &[String]) {
    if !compartments.is_empty() {
        settings.compartments = compartments.to_vec();
    }
}

fn method_summary(measurement: &Measurement) -> String {
    measurement
        .methods
        .iter()
        .map(|r| format!("{}={:.6}", r.method, r.diameter))
        .join(", ")
}

#[instrument(skip(container))]
fn _diameter(container: &ServiceContainer, file: &Path, export: Option<&Path>) -> CliResult<()> {
    let analysis = &container.analysis;
    let source = container.source(file);

    let out = export
        .map(Path::to_path_buf)
        .or_else(|| analysis.export_path_for(file, None));
    let measurement = match &out {
        Some(out) => {
            let sink = container.sink(out.clone());
            analysis.measure_and_export(source.as_ref(), sink.as_ref())?
        }
        None => analysis.measure(source.as_ref())?,
    };

    output::info(&format!("{:.6}", measurement.diameter));
    if measurement.methods.len() > 1 {
        output::detail(&method_summary(&measurement));
    }
    if let Some(out) = out {
        output::action(
            "Exported",
            &format!("{} nodes to {}", measurement.longest_path.len(), out.display()),
        );
    }
    Ok(())
}

#[instrument(skip(container))]
fn _leaves(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let source = container.source(file);
    for leaf in container.analysis.leaves(source.as_ref())? {
        output::info(&leaf);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _measure(container: &ServiceContainer, dir: &Path) -> CliResult<()> {
    let entries = container.analysis.measure_directory(dir)?;

    output::header(&format!(
        "{:<40} {:>8} {:>6} {:>6} {:>12} {:>12}",
        "file", "nodes", "tips", "bps", "cable", "diameter"
    ));
    let mut failed = 0;
    for entry in &entries {
        let shown = pathdiff::diff_paths(&entry.path, dir).unwrap_or_else(|| entry.path.clone());
        match &entry.result {
            Ok(m) => output::info(&format!(
                "{:<40} {:>8} {:>6} {:>6} {:>12.3} {:>12.3}",
                shown.display(),
                m.morphometry.nodes,
                m.morphometry.tips,
                m.morphometry.branch_points,
                m.morphometry.cable_length,
                m.diameter
            )),
            Err(e) => {
                failed += 1;
                output::failure(&format!("{}: {}", shown.display(), e));
            }
        }
    }

    let measured = entries.len() - failed;
    if failed == 0 {
        output::success(&format!("{measured} reconstructions measured"));
    } else {
        output::warning(&format!("{measured} measured, {failed} failed"));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer, file: &Path, full: bool) -> CliResult<()> {
    let source = container.source(file);
    let tree = container.analysis.load_tree(source.as_ref())?;

    let rendered = if full {
        tree.to_term_tree()
    } else {
        let graph = WeightedGraph::simplified(&tree).map_err(ApplicationError::from)?;
        SimplifiedView {
            tree: &tree,
            graph: &graph,
        }
        .to_term_tree()
    };
    output::info(&rendered);
    Ok(())
}

fn _config(command: &ConfigCommands, settings: &Settings, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &status_of(&path)),
                None => output::warning("no home directory, global config unavailable"),
            }
            output::action("local", &status_of(&local_config_path(project_dir)));
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
    }
    Ok(())
}

fn status_of(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
