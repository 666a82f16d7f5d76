use clap::{Args, Subcommand, ValueEnum};

use hevymirror::config::{Config, ConfigValue};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show resolved configuration values and where each came from
    Show {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let ConfigSubcommand::Show { format } = &self.command;
        match format {
            // The API key is never serialized
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Text => {
                for line in describe(config) {
                    println!("{}", line);
                }
            }
        }
        Ok(())
    }
}

fn describe(config: &Config) -> Vec<String> {
    let file = match &config.config_file {
        Some(path) => path.display().to_string(),
        None => format!("{} (not found)", Config::default_config_path().display()),
    };
    let api_key = match &config.api.api_key {
        Some(key) => format!("(set, from {})", key.source),
        None => "(not set)".to_string(),
    };

    vec![
        format!("config file:   {}", file),
        sourced(
            "database_path",
            &ConfigValue::new(
                config.database_path.value.display().to_string(),
                config.database_path.source.clone(),
            ),
        ),
        sourced("api.base_url", &config.api.base_url),
        format!("api.api_key:   {}", api_key),
    ]
}

fn sourced(key: &str, value: &ConfigValue<String>) -> String {
    format!("{:<14} {} [{}]", format!("{}:", key), value.value, value.source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hevymirror::config::{ApiConfig, ConfigSource};
    use std::path::PathBuf;

    #[test]
    fn test_describe_shows_sources_and_hides_key() {
        let config = Config {
            database_path: ConfigValue::new(PathBuf::from("/data/mirror.db"), ConfigSource::File),
            config_file: None,
            api: ApiConfig {
                base_url: ConfigValue::new(
                    "http://localhost:9000/v1/".to_string(),
                    ConfigSource::Environment,
                ),
                api_key: Some(ConfigValue::new("secret".to_string(), ConfigSource::Environment)),
            },
        };

        let lines = describe(&config);

        assert!(lines.contains(&"database_path: /data/mirror.db [file]".to_string()));
        assert!(lines.contains(&"api.base_url:  http://localhost:9000/v1/ [environment]".to_string()));
        assert!(lines.contains(&"api.api_key:   (set, from environment)".to_string()));
        assert!(lines.iter().all(|l| !l.contains("secret")));
    }
}
