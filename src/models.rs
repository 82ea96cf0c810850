use crate::archive::ArchiveFormat;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// TOML manifest listing the packages to install
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Manifest {
    /// Variable definitions for substitution
    #[serde(default)]
    pub vars: HashMap<String, String>,
    /// Installation prefix, `~/.local` when unset
    pub dest: Option<String>,
    /// Shell family to integrate with
    pub shell: Option<String>,
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageSpec>,
}

/// One downloadable package
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PackageSpec {
    pub name: String,
    pub url: String,
    /// Archive format, inferred from the downloaded filename when unset
    pub format: Option<ArchiveFormat>,
    /// Expected SHA-256 of the download (hex string)
    pub sha256: Option<String>,
    pub install: InstallMode,
}

/// How an extracted package reaches the destination
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InstallMode {
    /// Symlink-repairing merge of `<extracted>/<root>` into the destination root
    Merge {
        #[serde(default = "default_merge_root")]
        root: String,
    },
    /// Copy the whole extracted tree into `<dest>/<into>`
    Subtree { into: String },
    /// Copy one executable into `<dest>/bin`
    Binary { file: Option<String> },
}

fn default_merge_root() -> String {
    "usr".to_string()
}

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Print debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Download, install and integrate every package (the default)
    Setup {
        /// TOML manifest listing packages (built-in list if not specified)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Installation prefix (defaults to ~/.local)
        #[arg(short, long)]
        dest: Option<String>,
        /// Directory to create the run's scratch space in (defaults to the system temp dir)
        #[arg(long)]
        scratch: Option<PathBuf>,
        /// Shell to integrate with: zsh, bash or fish
        #[arg(short, long)]
        shell: Option<String>,
        /// Set variable overrides (format: key=value), can be specified multiple times
        #[arg(long = "set", value_name = "KEY=VALUE")]
        var_overrides: Vec<String>,
        /// Leave the scratch directory in place after the run
        #[arg(long)]
        keep_scratch: bool,
        /// Show the resolved plan without downloading or writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Download a single URL
    Fetch {
        /// Direct URL to download
        url: String,
        /// Directory to save into (defaults to the current directory)
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Merge an extracted package tree into a prefix, repairing symlinks
    Merge {
        /// Extracted tree (e.g. the `usr` directory of an unpacked .deb)
        src: PathBuf,
        /// Destination prefix
        dst: PathBuf,
    },
    /// Only write the shell integration for already installed tools
    Shell {
        /// Shell family: zsh, bash or fish
        name: String,
        /// Installation prefix holding the tools (defaults to ~/.local)
        #[arg(short, long)]
        dest: Option<String>,
    },
}
