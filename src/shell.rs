//! Shell integration: completion scripts and startup-file lines.
//!
//! The set of shells is closed. Each family gets a fixed list of completion
//! scripts to generate and lines to add to its startup file; anything else is
//! reported and skipped.

use crate::error::SetupError;
use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Supported shell families
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellKind {
    Zsh,
    Bash,
    Fish,
    Unsupported(String),
}

impl ShellKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "zsh" => ShellKind::Zsh,
            "bash" => ShellKind::Bash,
            "fish" => ShellKind::Fish,
            _ => ShellKind::Unsupported(name.to_string()),
        }
    }

    /// Shell named by `$SHELL`, if any
    pub fn from_env() -> Option<Self> {
        let shell = std::env::var_os("SHELL")?;
        let name = Path::new(&shell).file_name()?.to_str()?;
        Some(Self::parse(name))
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellKind::Zsh => write!(f, "zsh"),
            ShellKind::Bash => write!(f, "bash"),
            ShellKind::Fish => write!(f, "fish"),
            ShellKind::Unsupported(name) => write!(f, "{name}"),
        }
    }
}

/// Locations the integration writes to
#[derive(Debug, Clone)]
pub struct ShellEnv {
    pub home: PathBuf,
    /// `$XDG_CONFIG_HOME`, or the platform config directory
    pub config_dir: PathBuf,
    /// Installation prefix holding the tools
    pub dest: PathBuf,
}

impl ShellEnv {
    pub fn detect(dest: &Path) -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let config_dir = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .unwrap_or_else(|| home.join(".config"));

        Ok(Self {
            home,
            config_dir,
            dest: dest.to_path_buf(),
        })
    }
}

/// A completion file produced by running an installed tool
#[derive(Debug, Clone, Copy)]
struct CompletionScript {
    tool: &'static str,
    args: &'static [&'static str],
    /// Directory under the config dir
    dir: &'static [&'static str],
    file_name: &'static str,
}

/// What one shell family needs
#[derive(Debug)]
struct ShellIntegration {
    completions: &'static [CompletionScript],
    rc_file: PathBuf,
    rc_lines: &'static [&'static str],
}

fn integration_for(kind: &ShellKind, env: &ShellEnv) -> Option<ShellIntegration> {
    match kind {
        ShellKind::Zsh => Some(ShellIntegration {
            completions: &[],
            rc_file: env.home.join(".zshrc"),
            rc_lines: &["source <(rg --generate complete-zsh)", "source <(fzf --zsh)"],
        }),
        ShellKind::Bash => Some(ShellIntegration {
            completions: &[CompletionScript {
                tool: "rg",
                args: &["--generate", "complete-bash"],
                dir: &["bash_completion"],
                file_name: "rg.bash",
            }],
            rc_file: env.home.join(".bashrc"),
            rc_lines: &["source <(fzf --bash)"],
        }),
        ShellKind::Fish => Some(ShellIntegration {
            completions: &[CompletionScript {
                tool: "rg",
                args: &["--generate", "complete-fish"],
                dir: &["fish", "completions"],
                file_name: "rg.fish",
            }],
            rc_file: env.config_dir.join("fish").join("config.fish"),
            rc_lines: &["fzf --fish | source"],
        }),
        ShellKind::Unsupported(_) => None,
    }
}

/// Outcome of one integration run
#[derive(Debug, Default)]
pub struct ShellReport {
    pub completion_files: Vec<PathBuf>,
    pub lines_added: usize,
    /// Non-fatal problems, already printed
    pub warnings: Vec<String>,
}

/// Append `lines` to the file at `path`, skipping any already present.
///
/// The file is read in full and appended through the same handle. A blank
/// line separates the new block from existing content. Returns the number of
/// lines written; when nothing is missing the file is not modified.
pub fn append_lines(path: &Path, lines: &[&str]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut existing = String::new();
    file.read_to_string(&mut existing)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut present: HashSet<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && present.insert(*l))
        .collect();

    if missing.is_empty() {
        debug!("{} already up to date", path.display());
        return Ok(0);
    }

    let mut block = String::new();
    if !existing.is_empty() {
        if !existing.ends_with('\n') {
            block.push('\n');
        }
        block.push('\n');
    }
    for line in &missing {
        block.push_str(line);
        block.push('\n');
    }

    file.write_all(block.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(missing.len())
}

/// Run `<dest>/bin/<tool> <args>` and save its stdout as a completion file
fn generate_completion(script: &CompletionScript, env: &ShellEnv) -> Result<PathBuf> {
    let tool_path = env.dest.join("bin").join(script.tool);
    let output = Command::new(&tool_path)
        .args(script.args)
        .output()
        .with_context(|| format!("Failed to run {}", tool_path.display()))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} exited with {}: {}",
            tool_path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let dir = script
        .dir
        .iter()
        .fold(env.config_dir.clone(), |acc, part| acc.join(part));
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let target = dir.join(script.file_name);
    fs::write(&target, &output.stdout)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(target)
}

/// Write completion files and startup lines for `kind`.
///
/// An unsupported shell is a warning, not an error. So is a completion
/// generator that fails; startup-file writes are fatal.
pub fn integrate(kind: &ShellKind, env: &ShellEnv) -> Result<ShellReport> {
    let mut report = ShellReport::default();

    let Some(integration) = integration_for(kind, env) else {
        let warning = SetupError::UnsupportedShell(kind.to_string()).to_string();
        eprintln!("Warning: {warning}");
        report.warnings.push(warning);
        return Ok(report);
    };

    println!("Adding {kind} shell integration...");

    for script in integration.completions {
        match generate_completion(script, env) {
            Ok(path) => {
                println!("Wrote completion script: {}", path.display());
                report.completion_files.push(path);
            }
            Err(err) => {
                let warning = format!("Skipped {} completion: {err:#}", script.tool);
                eprintln!("Warning: {warning}");
                report.warnings.push(warning);
            }
        }
    }

    report.lines_added = append_lines(&integration.rc_file, integration.rc_lines)?;
    if report.lines_added > 0 {
        println!(
            "Added {} line(s) to {}",
            report.lines_added,
            integration.rc_file.display()
        );
    } else {
        println!("{} already configured", integration.rc_file.display());
    }

    Ok(report)
}

/// Describe what `integrate` would do, for dry runs
pub fn describe(kind: &ShellKind, env: &ShellEnv) -> Vec<String> {
    let Some(integration) = integration_for(kind, env) else {
        return vec![SetupError::UnsupportedShell(kind.to_string()).to_string()];
    };

    let mut out = Vec::new();
    for script in integration.completions {
        let dir = script
            .dir
            .iter()
            .fold(env.config_dir.clone(), |acc, part| acc.join(part));
        out.push(format!(
            "{} {} > {}",
            env.dest.join("bin").join(script.tool).display(),
            script.args.join(" "),
            dir.join(script.file_name).display()
        ));
    }
    for line in integration.rc_lines {
        out.push(format!("{} << {line}", integration.rc_file.display()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ZSH_LINES: [&str; 2] = ["source <(rg --generate complete-zsh)", "source <(fzf --zsh)"];

    fn test_env(temp: &TempDir) -> ShellEnv {
        ShellEnv {
            home: temp.path().join("home"),
            config_dir: temp.path().join("home/.config"),
            dest: temp.path().join("home/.local"),
        }
    }

    #[test]
    fn test_parse_shell_kind() {
        assert_eq!(ShellKind::parse("zsh"), ShellKind::Zsh);
        assert_eq!(ShellKind::parse("BASH"), ShellKind::Bash);
        assert_eq!(ShellKind::parse("fish"), ShellKind::Fish);
        assert_eq!(
            ShellKind::parse("tcsh"),
            ShellKind::Unsupported("tcsh".to_string())
        );
    }

    #[test]
    fn test_append_twice_does_not_duplicate() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".zshrc");
        fs::write(&rc, "").unwrap();

        assert_eq!(append_lines(&rc, &ZSH_LINES).unwrap(), 2);
        assert_eq!(append_lines(&rc, &ZSH_LINES).unwrap(), 0);

        let content = fs::read_to_string(&rc).unwrap();
        for line in ZSH_LINES {
            assert_eq!(content.matches(line).count(), 1);
        }
    }

    #[test]
    fn test_append_separates_from_existing_content() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".zshrc");
        fs::write(&rc, "export EDITOR=vim").unwrap();

        append_lines(&rc, &ZSH_LINES).unwrap();

        assert_eq!(
            fs::read_to_string(&rc).unwrap(),
            "export EDITOR=vim\n\nsource <(rg --generate complete-zsh)\nsource <(fzf --zsh)\n"
        );
    }

    #[test]
    fn test_append_only_missing_lines() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".zshrc");
        fs::write(&rc, "  source <(fzf --zsh)  \n").unwrap();

        assert_eq!(append_lines(&rc, &ZSH_LINES).unwrap(), 1);
        let content = fs::read_to_string(&rc).unwrap();
        assert_eq!(content.matches("source <(fzf --zsh)").count(), 1);
        assert!(content.contains("source <(rg --generate complete-zsh)"));
    }

    #[test]
    fn test_append_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join("fish").join("config.fish");

        append_lines(&rc, &["fzf --fish | source"]).unwrap();

        assert_eq!(fs::read_to_string(&rc).unwrap(), "fzf --fish | source\n");
    }

    #[test]
    fn test_integrate_zsh() {
        let temp = TempDir::new().unwrap();
        let env = test_env(&temp);

        let report = integrate(&ShellKind::Zsh, &env).unwrap();
        assert_eq!(report.lines_added, 2);
        let report = integrate(&ShellKind::Zsh, &env).unwrap();
        assert_eq!(report.lines_added, 0);

        let content = fs::read_to_string(env.home.join(".zshrc")).unwrap();
        assert_eq!(content.matches("source <(fzf --zsh)").count(), 1);
    }

    #[test]
    fn test_integrate_unsupported_is_noop() {
        let temp = TempDir::new().unwrap();
        let env = test_env(&temp);

        let report = integrate(&ShellKind::parse("nushell"), &env).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("nushell"));
        assert!(!env.home.exists());
    }

    #[test]
    fn test_integrate_bash_without_rg_still_writes_rc() {
        let temp = TempDir::new().unwrap();
        let env = test_env(&temp);

        let report = integrate(&ShellKind::Bash, &env).unwrap();

        assert!(report.completion_files.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            fs::read_to_string(env.home.join(".bashrc")).unwrap(),
            "source <(fzf --bash)\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_integrate_fish_generates_completion() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let env = test_env(&temp);
        let bin = env.dest.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let rg = bin.join("rg");
        fs::write(&rg, "#!/bin/sh\necho \"complete -c rg $2\"\n").unwrap();
        fs::set_permissions(&rg, fs::Permissions::from_mode(0o755)).unwrap();

        let report = integrate(&ShellKind::Fish, &env).unwrap();

        let completion = env.config_dir.join("fish/completions/rg.fish");
        assert_eq!(report.completion_files, vec![completion.clone()]);
        assert_eq!(
            fs::read_to_string(&completion).unwrap(),
            "complete -c rg complete-fish\n"
        );
        assert_eq!(
            fs::read_to_string(env.config_dir.join("fish/config.fish")).unwrap(),
            "fzf --fish | source\n"
        );
    }

    #[test]
    fn test_describe_lists_actions() {
        let temp = TempDir::new().unwrap();
        let env = test_env(&temp);

        let lines = describe(&ShellKind::Bash, &env);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("complete-bash"));
        assert!(lines[1].contains("source <(fzf --bash)"));
    }
}
