//! Environment variable configuration
//!
//! `NESTRUN_*` variables override values from the config file.

use std::env;

use super::EngineConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "NESTRUN";

/// Overrides read from the environment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// NESTRUN_AUTOSTOP
    pub autostop: Option<bool>,
    /// NESTRUN_SORT
    pub sort: Option<bool>,
    /// NESTRUN_LOG
    pub log_level: Option<String>,
    /// NESTRUN_FORMAT
    pub format: Option<String>,
    /// NESTRUN_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            autostop: get_env_bool("AUTOSTOP"),
            sort: get_env_bool("SORT"),
            log_level: get_env("LOG"),
            format: get_env("FORMAT"),
            config_file: get_env("CONFIG"),
        }
    }

    pub fn has_any(&self) -> bool {
        self.autostop.is_some()
            || self.sort.is_some()
            || self.log_level.is_some()
            || self.format.is_some()
            || self.config_file.is_some()
    }

    /// Overwrite the settings this environment specifies
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(autostop) = self.autostop {
            config.autostop = autostop;
        }
        if let Some(sort) = self.sort {
            config.sort = sort;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
    }

    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_AUTOSTOP:  {:?}", ENV_PREFIX, self.autostop);
        println!("  {}_SORT:      {:?}", ENV_PREFIX, self.sort);
        println!("  {}_LOG:       {:?}", ENV_PREFIX, self.log_level);
        println!("  {}_FORMAT:    {:?}", ENV_PREFIX, self.format);
        println!("  {}_CONFIG:    {:?}", ENV_PREFIX, self.config_file);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Print all NESTRUN environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_AUTOSTOP   Stop the event pump when all started tests finished (true/false)");
    println!("  {ENV_PREFIX}_SORT       Sort tests by name before running (true/false)");
    println!("  {ENV_PREFIX}_LOG        Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_FORMAT     Output format (progress, jsonl, quiet)");
    println!("  {ENV_PREFIX}_CONFIG     Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_FORMAT=jsonl");
    println!("  nestrun run plan.yaml");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(!config.has_any());
    }

    #[test]
    fn test_apply_overrides() {
        let env = EnvConfig {
            sort: Some(true),
            format: Some("jsonl".to_string()),
            ..Default::default()
        };
        assert!(env.has_any());

        let mut config = EngineConfig::default();
        env.apply(&mut config);
        assert!(config.sort);
        assert!(!config.autostop);
        assert_eq!(config.format, "jsonl");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("nope"));
    }

    #[test]
    fn test_load_reads_prefixed_variable() {
        // a variable no other test touches
        env::set_var("NESTRUN_LOG", "debug");
        let config = EnvConfig::load();
        env::remove_var("NESTRUN_LOG");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }
}
