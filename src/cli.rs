use crate::download::http;
use crate::install::merge::merge_package;
use crate::models::{Args, Commands};
use crate::runner::{SetupOptions, run_setup};
use crate::shell::{self, ShellEnv, ShellKind};
use crate::vars::VarContext;
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;

/// Main CLI entry point
pub fn run(args: Args) -> Result<()> {
    let command = args.command.unwrap_or(Commands::Setup {
        manifest: None,
        dest: None,
        scratch: None,
        shell: None,
        var_overrides: Vec::new(),
        keep_scratch: false,
        dry_run: false,
    });

    match command {
        Commands::Setup {
            manifest,
            dest,
            scratch,
            shell,
            var_overrides,
            keep_scratch,
            dry_run,
        } => {
            run_setup(&SetupOptions {
                manifest,
                dest,
                scratch,
                shell,
                var_overrides,
                keep_scratch,
                dry_run,
            })?;
        }
        Commands::Fetch { url, dir } => {
            http::fetch(&url, &dir)?;
        }
        Commands::Merge { src, dst } => {
            let report = merge_package(&src, &dst)?;
            println!(
                "Merged {}: {} symlinks created, {} unchanged, {} failed",
                src.display(),
                report.created.len(),
                report.unchanged.len(),
                report.failed.len()
            );
        }
        Commands::Shell { name, dest } => {
            let ctx = VarContext::new(&HashMap::new(), &[], None)?;
            let dest = PathBuf::from(ctx.substitute(dest.as_deref().unwrap_or("~/.local"))?);
            let env = ShellEnv::detect(&dest)?;
            shell::integrate(&ShellKind::parse(&name), &env)?;
        }
    }

    Ok(())
}
