use colored::Colorize;

use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{NotepubError, Result};

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli).await,
        ConfigCommands::Set { key, value } => set(cli, key, value).await,
        ConfigCommands::Get { key } => get(cli, key).await,
        ConfigCommands::Path => path(cli).await,
    }
}

async fn show(cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| NotepubError::ConfigError(e.to_string()))?;
        println!("{}", toml_str);
    }

    Ok(())
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| NotepubError::ConfigError(format!("Invalid value for {}: {}", key, value)))
}

async fn set(_cli: &Cli, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    match key {
        "browser.executable" => config.browser.executable = Some(value.to_string()),
        "browser.cdp_port" => config.browser.cdp_port = parse(key, value)?,
        "browser.user_data_dir" => config.browser.user_data_dir = Some(value.to_string()),
        "browser.headless" => config.browser.headless = parse(key, value)?,
        "site.draft_list_url" => config.site.draft_list_url = value.to_string(),
        "site.edit_label" => config.site.edit_label = value.to_string(),
        "site.publish_label" => config.site.publish_label = value.to_string(),
        "timing.settle_ms" => config.timing.settle_ms = parse(key, value)?,
        "timing.element_timeout_ms" => config.timing.element_timeout_ms = parse(key, value)?,
        "timing.editor_timeout_ms" => config.timing.editor_timeout_ms = parse(key, value)?,
        "timing.nav_timeout_ms" => config.timing.nav_timeout_ms = parse(key, value)?,
        "timing.poll_interval_ms" => config.timing.poll_interval_ms = parse(key, value)?,
        _ => {
            return Err(NotepubError::ConfigError(format!(
                "Unknown config key: {}",
                key
            )))
        }
    }

    config.save()?;
    println!("{} Set {} = {}", "✓".green(), key, value);

    Ok(())
}

async fn get(cli: &Cli, key: &str) -> Result<()> {
    let config = Config::load()?;

    let value = match key {
        "browser.executable" => config.browser.executable.clone(),
        "browser.cdp_port" => Some(config.browser.cdp_port.to_string()),
        "browser.user_data_dir" => config.browser.user_data_dir.clone(),
        "browser.headless" => Some(config.browser.headless.to_string()),
        "site.draft_list_url" => Some(config.site.draft_list_url.clone()),
        "site.edit_label" => Some(config.site.edit_label.clone()),
        "site.publish_label" => Some(config.site.publish_label.clone()),
        "timing.settle_ms" => Some(config.timing.settle_ms.to_string()),
        "timing.element_timeout_ms" => Some(config.timing.element_timeout_ms.to_string()),
        "timing.editor_timeout_ms" => Some(config.timing.editor_timeout_ms.to_string()),
        "timing.nav_timeout_ms" => Some(config.timing.nav_timeout_ms.to_string()),
        "timing.poll_interval_ms" => Some(config.timing.poll_interval_ms.to_string()),
        _ => {
            return Err(NotepubError::ConfigError(format!(
                "Unknown config key: {}",
                key
            )))
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "key": key,
                "value": value
            })
        );
    } else {
        match value {
            Some(v) => println!("{}", v),
            None => println!("{}", "(not set)".dimmed()),
        }
    }

    Ok(())
}

async fn path(cli: &Cli) -> Result<()> {
    let path = Config::config_path();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string()
            })
        );
    } else {
        println!("{}", path.display());
    }

    Ok(())
}
