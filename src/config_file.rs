//! `.bulkmtrc` configuration file
//!
//! ```ini
//! # prepended to every command line
//! defaults = --file-threads 4 --stats-format json
//!
//! [aliases]
//! quiet = --no-screen --no-stats
//! ```
//!
//! Precedence: command line > project `.bulkmtrc` > user config.

use anyhow::{anyhow, Context, Result};
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = ".bulkmtrc";
const MAX_ALIAS_DEPTH: usize = 10;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub defaults: Option<String>,
    pub aliases: HashMap<String, String>,
}

impl ConfigFile {
    /// Find a project-level `.bulkmtrc` by walking up from `start`
    pub fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_FILE))
            .find(|candidate| candidate.is_file())
    }

    pub fn find_project_config() -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        Self::find_project_config_from(&cwd)
    }

    /// User config locations in order of preference
    pub fn user_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if cfg!(windows) {
            if let Ok(appdata) = env::var("APPDATA") {
                paths.push(PathBuf::from(appdata).join("bulkmt").join("config.ini"));
            }
            if let Ok(profile) = env::var("USERPROFILE") {
                paths.push(PathBuf::from(profile).join(PROJECT_FILE));
            }
        } else {
            let xdg_config = env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    env::var("HOME")
                        .map(|h| PathBuf::from(h).join(".config"))
                        .unwrap_or_else(|_| PathBuf::from(".config"))
                });
            paths.push(xdg_config.join("bulkmt").join("config.ini"));

            if let Ok(home) = env::var("HOME") {
                paths.push(PathBuf::from(home).join(PROJECT_FILE));
            }
        }

        paths
    }

    /// Load the first user config, then overlay the project config
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_paths().into_iter().find(|p| p.is_file()) {
            config = config.merge(Self::load_from_path(&path)?);
        }

        if let Some(path) = Self::find_project_config() {
            config = config.merge(Self::load_from_path(&path)?);
        }

        Ok(config)
    }

    pub fn load_with_custom_path(custom_path: Option<&str>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(Path::new(path)),
            None => Self::load(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parse INI-style content. Unknown keys and sections are ignored.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        let mut section = String::new();

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim().to_string());

            match section.as_str() {
                "" if key == "defaults" => config.defaults = Some(value),
                "aliases" => {
                    config.aliases.insert(key.to_string(), value);
                }
                _ => {}
            }
        }

        config
    }

    /// Overlay `other` on top of `self`
    fn merge(mut self, other: Self) -> Self {
        if other.defaults.is_some() {
            self.defaults = other.defaults;
        }
        self.aliases.extend(other.aliases);
        self
    }

    /// Expand one alias, following `-a name` references inside it
    pub fn resolve_alias(&self, name: &str, seen: &mut HashSet<String>) -> Result<Vec<String>> {
        if seen.len() >= MAX_ALIAS_DEPTH {
            return Err(anyhow!("Alias chain too deep: {} levels", seen.len()));
        }
        if !seen.insert(name.to_string()) {
            return Err(anyhow!("Circular dependency detected in alias: {}", name));
        }

        let value = self
            .aliases
            .get(name)
            .ok_or_else(|| anyhow!("Unknown alias: {}", name))?;
        let args = shell_words::split(value)
            .with_context(|| format!("Invalid alias '{}': failed to parse arguments", name))?;

        let expanded = self.expand_aliases(args, seen)?;
        seen.remove(name);
        Ok(expanded)
    }

    fn expand_aliases(&self, args: Vec<String>, seen: &mut HashSet<String>) -> Result<Vec<String>> {
        let mut result = Vec::with_capacity(args.len());
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            if arg == "-a" || arg == "--alias" {
                match iter.next() {
                    Some(name) => result.extend(self.resolve_alias(&name, seen)?),
                    None => result.push(arg),
                }
            } else {
                result.push(arg);
            }
        }

        Ok(result)
    }

    /// Insert defaults after the program name, then expand aliases
    pub fn process_args(&self, args: Vec<String>) -> Result<Vec<String>> {
        let mut iter = args.into_iter();
        let mut combined: Vec<String> = iter.next().into_iter().collect();

        if let Some(defaults) = &self.defaults {
            let default_args = shell_words::split(defaults)
                .context("Invalid defaults: failed to parse arguments")?;
            combined.extend(default_args);
        }
        combined.extend(iter);

        self.expand_aliases(combined, &mut HashSet::new())
    }

    /// Print where configuration is searched for and what is active
    pub fn show_config() {
        println!("Configuration precedence: CLI > project .bulkmtrc > user config > defaults\n");

        let project = Self::find_project_config();
        let user_paths = Self::user_config_paths();

        match Self::load() {
            Ok(config) => {
                match &config.defaults {
                    Some(defaults) => println!("Active defaults:\n  defaults = {}", defaults),
                    None => println!("No defaults configured."),
                }
                if !config.aliases.is_empty() {
                    println!("\nActive aliases:");
                    let mut aliases: Vec<_> = config.aliases.iter().collect();
                    aliases.sort();
                    for (key, value) in aliases {
                        println!("  {} = {}", key, value);
                    }
                }
            }
            Err(e) => eprintln!("Error loading configuration: {}", e),
        }

        println!("\nConfiguration search locations (in precedence order):");
        match &project {
            Some(path) => println!("  1. Project: {} (found)", path.display()),
            None => println!("  1. Project: {} (searched up directory tree, not found)", PROJECT_FILE),
        }
        for (i, path) in user_paths.iter().enumerate() {
            let status = if path.is_file() { "(found)" } else { "(not found)" };
            println!("  {}. User: {} {}", i + 2, path.display(), status);
        }
    }
}
