use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plume_core::ChatParams;
use plume_llm::{AnthropicConfig, AnthropicProvider, RelayService};
use plume_settings::PlumeSettings;
use plume_spellcheck::{GateOptions, RemoteConfig, RemoteGrammarClient, SpellCheckGate};
use plume_telemetry::{init_telemetry, TelemetryConfig};
use tokio_util::sync::CancellationToken;

mod repl;

#[derive(Parser)]
#[command(name = "plume")]
#[command(about = "Chat playground with a mandatory French spell-check", long_about = None)]
struct Cli {
    /// Settings file (default: ~/.plume/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay until Ctrl-C
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Spell-check a text once. Exits with status 1 when sending would be blocked.
    Check {
        text: String,

        /// Skip the remote grammar service
        #[arg(long, default_value_t = false)]
        no_remote: bool,

        /// Print the evaluation as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Interactive chat in the terminal
    Chat {
        /// Relay server URL (default from settings)
        #[arg(long)]
        server: Option<String>,

        /// Call the provider in-process instead of going through a server
        #[arg(long, default_value_t = false)]
        local: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => plume_settings::load_settings_from_path(path),
        None => plume_settings::load_settings(),
    }
    .context("failed to load settings")?;

    match cli.cmd {
        Commands::Serve { port } => {
            let _telemetry = init_telemetry(TelemetryConfig::default());
            serve(settings, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            text,
            no_remote,
            json,
        } => {
            let _telemetry = init_telemetry(TelemetryConfig::interactive());
            check(&settings, &text, !no_remote, json).await
        }
        Commands::Chat { server, local } => {
            let _telemetry = init_telemetry(TelemetryConfig::interactive());
            repl::run(&settings, server, local).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Gate from settings. `use_remote` is further gated by `remoteEnabled`.
pub(crate) fn build_gate(settings: &PlumeSettings, use_remote: bool) -> SpellCheckGate {
    let spell = &settings.spellcheck;
    let options = GateOptions {
        auto_confirm_delay: spell.auto_confirm_delay(),
    };
    if use_remote && spell.remote_enabled {
        let remote = RemoteGrammarClient::new(RemoteConfig {
            url: spell.remote_url.clone(),
            language: spell.language.clone(),
            timeout: spell.remote_timeout(),
            max_matches: spell.max_remote_matches,
        });
        SpellCheckGate::with_remote(remote, options)
    } else {
        SpellCheckGate::local(options)
    }
}

/// Relay backed by the Anthropic provider. Also reports whether a key is set.
pub(crate) fn build_relay(settings: &PlumeSettings) -> (RelayService, bool) {
    let relay = &settings.relay;
    let provider = AnthropicProvider::new(
        AnthropicConfig {
            api_url: relay.api_url.clone(),
            model: relay.model.clone(),
            api_version: relay.api_version.clone(),
            timeout: relay.timeout(),
        },
        plume_settings::anthropic_api_key(),
    );
    let has_key = provider.has_api_key();
    let service = RelayService::new(Arc::new(provider)).with_defaults(ChatParams {
        temperature: relay.default_temperature,
        max_tokens: relay.default_max_tokens,
    });
    (service, has_key)
}

async fn serve(settings: PlumeSettings, port: Option<u16>) -> Result<()> {
    let mut config = plume_server::ServerConfig::from(&settings.server);
    if let Some(port) = port {
        config.port = port;
    }

    let (relay, has_key) = build_relay(&settings);
    let state = plume_server::AppState::new(relay, build_gate(&settings, true))
        .with_api_key_configured(has_key);

    let handle = plume_server::start(config, state, CancellationToken::new())
        .await
        .context("failed to start server")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}

async fn check(settings: &PlumeSettings, text: &str, use_remote: bool, json: bool) -> Result<ExitCode> {
    let gate = build_gate(settings, use_remote);
    let result = gate.evaluate(text).await?;

    if json {
        let out = serde_json::json!({
            "findings": result.findings,
            "checkedAt": result.checked_at,
            "decision": result.decision(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if result.is_clear() {
        println!("✓ Aucun problème détecté");
    } else {
        repl::print_findings(&result.findings);
    }

    Ok(if result.is_clear() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
