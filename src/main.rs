//! `plan-my-trip` - voice-assistant skill handler
//!
//! Runs the skill either one event at a time (stdin/file in, JSON out) or as
//! an HTTP endpoint the host platform can call.

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::Style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ConfigCommand};
use plan_my_trip_core::config::ENV_OVERRIDES;
use plan_my_trip_core::{Config, PlanMyTripSkill, RequestEnvelope, Skill};

mod cli;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `invoke` output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Invoke { event, pretty } => {
            let config = load_config(cli.config.as_deref())?;
            let skill = PlanMyTripSkill::from_config(&config)
                .context("Failed to initialize skill")?;
            handle_invoke(&skill, event.as_deref(), *pretty).await?;
        }

        Commands::Serve { host, port } => {
            let config = load_config(cli.config.as_deref())?;
            let skill = PlanMyTripSkill::from_config(&config)
                .context("Failed to initialize skill")?;
            server::start_server(Arc::new(skill), host, *port).await?;
        }

        Commands::Config(cmd) => handle_config(cmd, cli.config.as_deref())?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load_with_env(path).context("Failed to load configuration")
}

/// Run one event through the skill and print the envelope
async fn handle_invoke(skill: &dyn Skill, event: Option<&Path>, pretty: bool) -> Result<()> {
    let raw = match event {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read event from stdin")?;
            buf
        }
    };

    let response = match RequestEnvelope::from_json(&raw) {
        Ok(envelope) => skill.execute(envelope).await,
        Err(err) => Err(err),
    };
    let response = match response {
        Ok(response) => response,
        Err(err) => bail!("[{}] {}", err.code(), err),
    };

    let out = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", out);
    Ok(())
}

fn handle_config(cmd: &ConfigCommand, path: Option<&Path>) -> Result<()> {
    let target: PathBuf = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_path().context("Could not determine config directory")?,
    };

    match cmd {
        ConfigCommand::Path => {
            println!("{}", target.display());
        }

        ConfigCommand::Show => {
            let config = load_config(path)?;
            let bold = Style::new().bold();
            let origin = if target.exists() { "" } else { " (not found, showing defaults)" };
            println!("{} {}{}", bold.apply_to("# config file:"), target.display(), origin);
            print!("{}", toml::to_string_pretty(&config.redacted())?);

            let status = match config.validate() {
                Ok(()) => Style::new().green().apply_to("valid".to_string()),
                Err(e) => Style::new().red().apply_to(format!("invalid: {}", e)),
            };
            println!("\n# status: {}", status);
            println!(
                "# messaging: {}",
                if config.messaging_ready() { "configured" } else { "not configured" }
            );
        }

        ConfigCommand::Init { force } => {
            if target.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }
            Config::default()
                .save(&target)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            println!("Wrote {}", target.display());
            println!("Set credentials in the file or via:");
            for (var, field) in ENV_OVERRIDES {
                println!("  {:<34} -> {}", var, field);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        handle_config(&ConfigCommand::Init { force: false }, Some(&path)).unwrap();
        assert!(path.exists());
        assert!(handle_config(&ConfigCommand::Init { force: false }, Some(&path)).is_err());
        assert!(handle_config(&ConfigCommand::Init { force: true }, Some(&path)).is_ok());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("bounding_box"));
        assert!(written.contains("levis stadium"));
    }

    #[tokio::test]
    async fn test_invoke_from_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.app_id = "amzn1.ask.skill.cli".to_string();
        config.traffic.api_key = "t".to_string();
        config.routing.api_key = "r".to_string();
        let skill = PlanMyTripSkill::from_config(&config).unwrap();

        let event = dir.path().join("help.json");
        std::fs::write(
            &event,
            r#"{
                "session": { "new": false, "sessionId": "s",
                             "application": { "applicationId": "amzn1.ask.skill.cli" } },
                "request": { "type": "IntentRequest", "requestId": "r",
                             "intent": { "name": "AMAZON.HelpIntent" } }
            }"#,
        )
        .unwrap();
        assert!(handle_invoke(&skill, Some(&event), true).await.is_ok());

        std::fs::write(&event, r#"{ "request": { "type": "LaunchRequest", "requestId": "r" } }"#)
            .unwrap();
        let err = handle_invoke(&skill, Some(&event), false).await.unwrap_err();
        assert!(err.to_string().contains("UNAUTHORIZED"));

        std::fs::write(&event, "not json").unwrap();
        let err = handle_invoke(&skill, Some(&event), false).await.unwrap_err();
        assert!(err.to_string().starts_with("[INVALID] malformed event"));
    }

    #[test]
    fn test_demo_events_parse() {
        for raw in [
            include_str!("../demos/launch.json"),
            include_str!("../demos/traffic.json"),
            include_str!("../demos/eta.json"),
        ] {
            let envelope: RequestEnvelope = serde_json::from_str(raw).unwrap();
            assert_eq!(envelope.application_id(), Some("amzn1.ask.skill.replace-me"));
        }
    }
}
