use crate::models::{InstallMode, Manifest, PackageSpec};
use crate::vars::VarContext;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Packages installed when no manifest is given
pub const DEFAULT_MANIFEST: &str = r#"
dest = "~/.local"

[[package]]
name = "ripgrep"
url = "https://github.com/BurntSushi/ripgrep/releases/download/14.1.1/ripgrep_14.1.1-1_amd64.deb"
install = { mode = "merge", root = "usr" }

[[package]]
name = "fd"
url = "https://github.com/sharkdp/fd/releases/download/v10.2.0/fd_10.2.0_amd64.deb"
install = { mode = "merge", root = "usr" }

[[package]]
name = "fzf"
url = "https://github.com/junegunn/fzf/releases/download/v0.64.0/fzf-0.64.0-linux_amd64.tar.gz"
install = { mode = "subtree", into = "bin" }

[[package]]
name = "lazygit"
url = "https://github.com/jesseduffield/lazygit/releases/download/v0.53.0/lazygit_0.53.0_Linux_x86_64.tar.gz"
install = { mode = "binary", file = "lazygit" }
"#;

const DEFAULT_DEST: &str = "~/.local";

/// A manifest with every string substituted and the destination fixed
#[derive(Debug)]
pub struct Plan {
    pub dest: PathBuf,
    pub shell: Option<String>,
    pub packages: Vec<PackageSpec>,
}

/// Read a manifest file, or the built-in one when `path` is `None`
pub fn load_manifest(path: Option<&Path>) -> Result<Manifest> {
    let (content, origin) = match path {
        Some(p) => (
            fs::read_to_string(p)
                .with_context(|| format!("Failed to read manifest file: {}", p.display()))?,
            p.display().to_string(),
        ),
        None => (DEFAULT_MANIFEST.to_string(), "built-in manifest".to_string()),
    };

    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest TOML ({origin})"))?;
    validate(&manifest)?;
    Ok(manifest)
}

fn validate(manifest: &Manifest) -> Result<()> {
    let mut seen = HashSet::new();
    for package in &manifest.packages {
        let name = package.name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(anyhow::anyhow!("Invalid package name: '{name}'"));
        }
        if !seen.insert(name) {
            return Err(anyhow::anyhow!("Duplicate package name: '{name}'"));
        }
    }
    Ok(())
}

/// Apply variable substitution and pick the destination.
///
/// `dest_override` (from the command line) beats the manifest's `dest`. The
/// chosen destination is exposed to later strings as `${dest}`.
pub fn resolve_plan(
    manifest: &Manifest,
    dest_override: Option<&str>,
    var_ctx: &mut VarContext,
) -> Result<Plan> {
    let dest_raw = dest_override
        .or(manifest.dest.as_deref())
        .unwrap_or(DEFAULT_DEST);
    let dest = var_ctx
        .substitute(dest_raw)
        .with_context(|| "Failed to substitute variables in dest")?;
    var_ctx.set("dest", dest.clone());

    let shell = manifest
        .shell
        .as_deref()
        .map(|s| var_ctx.substitute(s))
        .transpose()?;

    let mut packages = Vec::with_capacity(manifest.packages.len());
    for package in &manifest.packages {
        let substituted = substitute_package(package, var_ctx)
            .with_context(|| format!("Failed to substitute variables in {}", package.name))?;
        packages.push(substituted);
    }

    Ok(Plan {
        dest: PathBuf::from(dest),
        shell,
        packages,
    })
}

fn substitute_package(package: &PackageSpec, var_ctx: &VarContext) -> Result<PackageSpec> {
    let install = match &package.install {
        InstallMode::Merge { root } => InstallMode::Merge {
            root: var_ctx.substitute(root)?,
        },
        InstallMode::Subtree { into } => InstallMode::Subtree {
            into: var_ctx.substitute(into)?,
        },
        InstallMode::Binary { file } => InstallMode::Binary {
            file: file.as_deref().map(|f| var_ctx.substitute(f)).transpose()?,
        },
    };

    Ok(PackageSpec {
        name: package.name.clone(),
        url: var_ctx.substitute(&package.url)?,
        format: package.format,
        sha256: package.sha256.clone(),
        install,
    })
}
