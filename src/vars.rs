use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Variables available to manifest strings
#[derive(Debug, Default)]
pub struct VarContext {
    /// Variables from all sources, already resolved by priority
    vars: HashMap<String, String>,
}

impl VarContext {
    /// Build the context.
    ///
    /// Resolution order (highest to lowest priority):
    /// 1. CLI overrides (--set key=value)
    /// 2. Manifest [vars] section
    /// 3. Built-in variables (os, arch, home, manifest_dir)
    pub fn new(
        manifest_vars: &HashMap<String, String>,
        cli_overrides: &[String],
        manifest_path: Option<&Path>,
    ) -> Result<Self> {
        let mut vars = HashMap::new();

        vars.insert("os".to_string(), std::env::consts::OS.to_string());
        vars.insert("arch".to_string(), std::env::consts::ARCH.to_string());

        if let Some(home) = dirs::home_dir() {
            vars.insert("home".to_string(), home.to_string_lossy().to_string());
        }

        if let Some(path) = manifest_path
            && let Some(parent) = path.parent()
        {
            let manifest_dir = if parent.as_os_str().is_empty() {
                ".".to_string()
            } else {
                parent.to_string_lossy().to_string()
            };
            vars.insert("manifest_dir".to_string(), manifest_dir);
        }

        vars.extend(manifest_vars.iter().map(|(k, v)| (k.clone(), v.clone())));

        for override_str in cli_overrides {
            let (key, value) = parse_key_value(override_str)
                .with_context(|| format!("Invalid --set format: {override_str}"))?;
            vars.insert(key, value);
        }

        Ok(Self { vars })
    }

    /// Add or replace one variable after construction
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }

    /// Substitute variables in a string
    ///
    /// Supports:
    /// - ${var} - substitute with variable value
    /// - $${literal} - escape to produce ${literal}
    /// - ${env.VAR} - substitute with environment variable
    /// - ~/path - expands to home directory
    pub fn substitute(&self, input: &str) -> Result<String> {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let mut var_name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        var_name.push(c);
                    }

                    if !closed {
                        return Err(anyhow::anyhow!("Unterminated variable in: {input}"));
                    }
                    if var_name.is_empty() {
                        return Err(anyhow::anyhow!("Empty variable name in: {input}"));
                    }

                    let value = self.resolve_var(&var_name).with_context(|| {
                        format!("Failed to resolve variable '${{{var_name}}}' in: {input}")
                    })?;
                    result.push_str(&value);
                }
                _ => result.push(c),
            }
        }

        Ok(self.expand_tilde(&result))
    }

    /// Expand tilde at start of string to home directory
    fn expand_tilde(&self, input: &str) -> String {
        match self.vars.get("home") {
            Some(home) if input == "~" => home.clone(),
            Some(home) if input.starts_with("~/") => format!("{}{}", home, &input[1..]),
            _ => input.to_string(),
        }
    }

    fn resolve_var(&self, name: &str) -> Result<String> {
        if let Some(env_var) = name.strip_prefix("env.") {
            return std::env::var(env_var)
                .with_context(|| format!("Environment variable '{env_var}' not set"));
        }

        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Undefined variable: {name}"))
    }

    /// Get a reference to all resolved variables
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}

/// Parse a key=value string
fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(anyhow::anyhow!("Expected format 'key=value', got: {s}")),
    }
}
