//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{RegistryService, ToggleReport};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, RootCommands};
use crate::cli::output;
use crate::cli::tree_view::TreeRender;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{DomainError, FontTree};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{Editor, EnvironmentEditor, SelectionItem, Selector, SkimSelector};
use crate::infrastructure::InfraError;
use crate::util::path::PathExt;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see `fontreg --help`".to_string()));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => run_config(cli, command),
        _ => {
            let container = ServiceContainer::new(load_settings(cli)?);
            match command {
                Commands::Tree { all } => run_tree(&container, *all),
                Commands::Check { paths } => run_toggle(&container, paths, true),
                Commands::Uncheck { paths } => run_toggle(&container, paths, false),
                Commands::Pick => run_pick(&container, &SkimSelector),
                Commands::Status => run_status(&container),
                Commands::Root { command } => run_root(cli, &container, command),
                Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
            }
        }
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(path.as_path()))?,
        None => Settings::load()?,
    };
    if let Some(root) = &cli.root {
        settings.override_font_root(root)?;
    }
    debug!("font_root: {}", settings.font_root.display());
    Ok(settings)
}

fn absolute(path: &Path) -> CliResult<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    Ok(path.resolve_under(&cwd))
}

fn load_tree(container: &ServiceContainer) -> CliResult<(RegistryService, FontTree)> {
    let service = container.registry_service()?;
    let tree = service.refresh(container.settings.font_root())?;
    Ok((service, tree))
}

#[instrument(skip(container))]
fn run_tree(container: &ServiceContainer, all: bool) -> CliResult<()> {
    let (_, tree) = load_tree(container)?;
    output::info(&tree.to_tree(all));
    Ok(())
}

#[instrument(skip(container))]
fn run_toggle(container: &ServiceContainer, paths: &[PathBuf], checked: bool) -> CliResult<()> {
    let (service, mut tree) = load_tree(container)?;
    let root = container.settings.font_root();

    for path in paths {
        let target = path.resolve_under(root);
        if !target.starts_with(root) {
            return Err(CliError::InvalidArgs(format!(
                "{} is outside the font root {}",
                target.display(),
                root.display()
            )));
        }
        let report = service.toggle_path(&mut tree, &target, checked)?;
        print_report(&target.display_relative_to(root), checked, &report);
    }
    Ok(())
}

fn print_report(label: &str, checked: bool, report: &ToggleReport) {
    for name in &report.inserted {
        output::diff_add(name);
    }
    for name in &report.deleted {
        output::diff_remove(name);
    }
    for failure in &report.failures {
        output::warning(&format!("{}: {}", failure.name, failure.message));
    }
    if report.store_calls() == 0 {
        output::detail(&format!("{label}: already {}", state_word(checked)));
    } else {
        output::action(state_word(checked), label);
    }
}

fn state_word(checked: bool) -> &'static str {
    if checked {
        "registered"
    } else {
        "unregistered"
    }
}

fn run_pick(container: &ServiceContainer, selector: &dyn Selector) -> CliResult<()> {
    let (service, mut tree) = load_tree(container)?;
    let root = container.settings.font_root();

    let items: Vec<SelectionItem> = tree
        .iter()
        .map(|(_, node)| SelectionItem {
            display: format!(
                "{} {}",
                if node.is_checked() { "[x]" } else { "[ ]" },
                node.data.path.display_relative_to(root)
            ),
            value: node.data.path.to_string_lossy().into_owned(),
        })
        .collect();

    let Some(selected) = selector
        .select_one(&items, "toggle> ")
        .map_err(CliError::Usage)?
    else {
        output::detail("nothing selected");
        return Ok(());
    };

    let path = PathBuf::from(&selected.value);
    let node = tree
        .find(&path)
        .ok_or_else(|| not_found(DomainError::NodeNotFound(path.clone())))?;
    let checked = !tree.is_checked(node);
    let report = service.toggle(&mut tree, node, checked);
    print_report(&path.display_relative_to(root), checked, &report);
    Ok(())
}

fn run_status(container: &ServiceContainer) -> CliResult<()> {
    let (service, tree) = load_tree(container)?;
    let status = service.status(&tree)?;

    output::header(&format!("Font root: {}", status.root.display()));
    output::info(&format!(
        "{} of {} fonts registered",
        status.fonts_registered, status.fonts_total
    ));
    if !status.outside_tree.is_empty() {
        output::warning(&format!(
            "{} registrations point outside the font root:",
            status.outside_tree.len()
        ));
        for entry in &status.outside_tree {
            output::detail(&format!("{} -> {}", entry.name, entry.path.display()));
        }
    }
    Ok(())
}

fn run_root(cli: &Cli, container: &ServiceContainer, command: &RootCommands) -> CliResult<()> {
    match command {
        RootCommands::Show => {
            output::info(&container.settings.font_root().display());
            Ok(())
        }
        RootCommands::Set { dir } => {
            let dir = absolute(dir)?;
            if !container.fs.is_dir(&dir) {
                return Err(not_found(DomainError::RootNotFound(dir)));
            }
            let saved_to = match &cli.config {
                Some(path) => {
                    let path = absolute(path)?;
                    Settings::save_font_root_to(&path, &dir)?;
                    path
                }
                None => Settings::save_font_root(&dir)?,
            };
            output::action(
                "Saved font root",
                &format!("{} ({})", dir.display(), saved_to.display()),
            );

            // Rebuild immediately from the new root
            let service = container.registry_service()?;
            let tree = service.refresh(&dir)?;
            output::info(&tree.to_tree(false));
            Ok(())
        }
    }
}

fn run_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    let config_path = match &cli.config {
        Some(path) => Some(absolute(path)?),
        None => global_config_path(),
    };

    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let settings = load_settings(cli)?;
            match &config_path {
                Some(p) => output::info(&format!("config: {}", p.display())),
                None => output::warning("cannot determine config directory"),
            }
            output::info(&format!("store:  {}", settings.store_file.display()));
            Ok(())
        }
        ConfigCommands::Init => {
            let path = require_config_path(config_path)?;
            let container = ServiceContainer::new(Settings::default());
            if container.fs.exists(&path) {
                output::warning(&format!("config already exists: {}", path.display()));
                return Ok(());
            }
            write_template(&container, &path)?;
            output::action("Created", &path.display());
            Ok(())
        }
        ConfigCommands::Edit => {
            let path = require_config_path(config_path)?;
            let settings = load_settings(cli)?;
            let editor = EnvironmentEditor::with_command(settings.editor.clone());
            let container = ServiceContainer::new(settings);
            if !container.fs.exists(&path) {
                write_template(&container, &path)?;
            }
            editor.open(&path).map_err(|e| InfraError::Editor {
                message: e.to_string(),
            })?;
            Ok(())
        }
    }
}

fn not_found(e: DomainError) -> CliError {
    ApplicationError::from(e).into()
}

fn require_config_path(path: Option<PathBuf>) -> CliResult<PathBuf> {
    path.ok_or_else(|| CliError::Usage("cannot determine config directory".to_string()))
}

fn write_template(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    container
        .fs
        .ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
    container
        .fs
        .write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}
