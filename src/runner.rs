use crate::archive;
use crate::crypto::verify_sha256;
use crate::download::http;
use crate::install::executable::{install_binary, install_subtree, select_executable};
use crate::install::merge::merge_package;
use crate::manifest::{Plan, load_manifest, resolve_plan};
use crate::models::{InstallMode, PackageSpec};
use crate::scratch::ScratchDir;
use crate::shell::{self, ShellEnv, ShellKind};
use crate::utils::is_directory_in_path;
use crate::vars::VarContext;
use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Options for a full setup run
#[derive(Debug, Default)]
pub struct SetupOptions {
    pub manifest: Option<PathBuf>,
    pub dest: Option<String>,
    pub scratch: Option<PathBuf>,
    pub shell: Option<String>,
    pub var_overrides: Vec<String>,
    pub keep_scratch: bool,
    pub dry_run: bool,
}

/// Fetch, extract and install one package into `dest`
pub fn install_package(package: &PackageSpec, scratch: &ScratchDir, dest: &Path) -> Result<()> {
    println!("Installing {} from {}", package.name, package.url);

    let archive_path = http::fetch(&package.url, &scratch.downloads_dir())?;

    if let Some(expected) = &package.sha256 {
        verify_sha256(&archive_path, expected)?;
    }

    let tree = scratch.package_dir(&package.name);
    archive::extract(&archive_path, package.format, &tree)?;

    match &package.install {
        InstallMode::Merge { root } => {
            let src = tree.join(root);
            if !src.is_dir() {
                return Err(crate::error::SetupError::ExtractFailed {
                    archive: archive_path.clone(),
                    reason: format!("package has no '{root}' directory"),
                }
                .into());
            }
            let report = merge_package(&src, dest)?;
            debug!("{}: {report:?}", package.name);
            for link in &report.dangling {
                eprintln!("Warning: dangling symlink {}", link.display());
            }
        }
        InstallMode::Subtree { into } => {
            install_subtree(&tree, dest, into)?;
        }
        InstallMode::Binary { file } => {
            let source = select_executable(&tree, file.as_deref())?;
            install_binary(&source, dest)?;
        }
    }

    Ok(())
}

/// Pick the shell: command line, then manifest, then `$SHELL`, then zsh
fn choose_shell(cli: Option<&str>, plan: &Plan) -> ShellKind {
    cli.or(plan.shell.as_deref())
        .map(ShellKind::parse)
        .or_else(ShellKind::from_env)
        .unwrap_or(ShellKind::Zsh)
}

fn print_plan(plan: &Plan, shell_kind: &ShellKind, env: &ShellEnv) {
    println!("Dry run - nothing will be downloaded or written\n");
    println!("Destination: {}", plan.dest.display());
    for package in &plan.packages {
        println!("[{}]", package.name);
        println!("  url = \"{}\"", package.url);
        if let Some(format) = package.format {
            println!("  format = \"{format}\"");
        }
        if let Some(sha) = &package.sha256 {
            println!("  sha256 = \"{sha}\"");
        }
        match &package.install {
            InstallMode::Merge { root } => println!("  merge {root}/ into {}", plan.dest.display()),
            InstallMode::Subtree { into } => {
                println!("  copy tree into {}", plan.dest.join(into).display())
            }
            InstallMode::Binary { file } => println!(
                "  copy {} into {}",
                file.as_deref().unwrap_or("<single executable>"),
                plan.dest.join("bin").display()
            ),
        }
    }
    println!("\nShell ({shell_kind}):");
    for line in shell::describe(shell_kind, env) {
        println!("  {line}");
    }
}

/// Run the whole setup: every package, then shell integration.
///
/// The scratch directory is removed when this returns, on success or error.
pub fn run_setup(opts: &SetupOptions) -> Result<()> {
    let manifest = load_manifest(opts.manifest.as_deref())?;
    let mut var_ctx = VarContext::new(
        &manifest.vars,
        &opts.var_overrides,
        opts.manifest.as_deref(),
    )
    .with_context(|| "Failed to create variable context")?;
    let plan = resolve_plan(&manifest, opts.dest.as_deref(), &mut var_ctx)?;

    let shell_kind = choose_shell(opts.shell.as_deref(), &plan);
    let shell_env = ShellEnv::detect(&plan.dest)?;

    if opts.dry_run {
        print_plan(&plan, &shell_kind, &shell_env);
        return Ok(());
    }

    let mut scratch = ScratchDir::create(opts.scratch.as_deref())?;
    if opts.keep_scratch {
        scratch.keep();
    }

    for package in &plan.packages {
        install_package(package, &scratch, &plan.dest)
            .with_context(|| format!("Failed to install {}", package.name))?;
    }

    shell::integrate(&shell_kind, &shell_env)?;

    let bin_dir = plan.dest.join("bin");
    if !is_directory_in_path(&bin_dir) {
        println!(
            "Warning: {} is not in your PATH. Add it with: export PATH=\"$PATH:{}\"",
            bin_dir.display(),
            bin_dir.display()
        );
    }

    println!("Setup complete");
    Ok(())
}
