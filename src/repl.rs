//! Terminal chat loop.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use plume_core::{ChatMessage, Finding};
use plume_session::{
    format_french_punctuation, ChatSession, HttpRelayClient, Preset, Relay, SessionError,
};
use plume_settings::PlumeSettings;
use plume_spellcheck::GateState;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const HELP: &str = "Commandes : /settings, /temp <valeur>, /tokens <nombre>, /preset <nom>, /lock, /unlock, /quit";

pub(crate) fn print_findings(findings: &[Finding]) {
    println!("✗ {} problème(s) détecté(s) :", findings.len());
    for finding in findings {
        println!(
            "  [{}] « {} » : {}",
            finding.severity, finding.matched_text, finding.message
        );
    }
}

fn print_entry(entry: &ChatMessage) {
    if entry.is_error {
        eprintln!("{}", entry.content);
    } else {
        println!("{}", format_french_punctuation(&entry.content));
    }
}

fn prompt(label: &str) {
    print!("{label}");
    let _ = std::io::stdout().flush();
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    Ok(lines.next_line().await?)
}

pub(crate) async fn run(settings: &PlumeSettings, server: Option<String>, local: bool) -> Result<()> {
    let relay: Arc<dyn Relay> = if local {
        let (service, has_key) = crate::build_relay(settings);
        if !has_key {
            eprintln!("ANTHROPIC_API_KEY n'est pas défini : les envois échoueront.");
        }
        Arc::new(service)
    } else {
        let url = server.unwrap_or_else(|| settings.session.server_url.clone());
        let client = HttpRelayClient::new(url);
        if !client.check_health().await {
            eprintln!("Serveur injoignable : {}", client.base_url());
        }
        Arc::new(client)
    };

    let mut session = ChatSession::new(crate::build_gate(settings, true), relay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        prompt("> ");
        let line = tokio::select! {
            line = read_line(&mut lines) => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&mut session, command) {
                break;
            }
            continue;
        }

        match session.submit(line) {
            Ok(_) => {}
            Err(SessionError::EmptyInput) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        }

        println!("Vérification orthographique…");
        let token = session.pending_cancellation_token();
        let watcher = tokio::spawn(async move {
            if let (Ok(()), Some(token)) = (tokio::signal::ctrl_c().await, token) {
                token.cancel();
            }
        });
        let state = session.resolve_pending().await;
        watcher.abort();

        match state? {
            GateState::Blocked => {
                if let Some(check) = session.pending() {
                    print_findings(check.findings());
                }
                println!("Envoi bloqué : corrigez le message puis renvoyez-le.");
                session.cancel_pending()?;
            }
            GateState::Clear => {
                println!("✓ Aucun problème détecté");
                prompt("Envoyer ? [o/N] ");
                let answer = read_line(&mut lines).await?.unwrap_or_default();
                if answer.trim().eq_ignore_ascii_case("o") {
                    let reply = session.confirm_pending().await?;
                    print_entry(reply);
                } else {
                    session.cancel_pending()?;
                    println!("Annulé.");
                }
            }
            GateState::Confirmed => {
                if let Some(reply) = session.transcript().last() {
                    print_entry(reply);
                }
            }
            GateState::Cancelled => println!("Annulé."),
            GateState::Checking => {}
        }
    }
    Ok(())
}

/// Returns false when the loop should stop.
fn handle_command(session: &mut ChatSession, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    let panel = session.panel_mut();

    match (name, arg) {
        ("quit" | "exit", _) => return false,
        ("settings", _) => {
            let params = panel.params();
            let t = panel.temperature_range();
            let n = panel.max_tokens_range();
            println!(
                "{} température {} ({}–{}), max tokens {} ({}–{})",
                if panel.is_locked() { "🔒 Mode limité :" } else { "🔓 Mode administrateur :" },
                params.temperature,
                t.min,
                t.max,
                params.max_tokens,
                n.min,
                n.max
            );
        }
        ("temp", Some(v)) => match v.replace(',', ".").parse::<f64>() {
            Ok(v) => println!("température = {}", panel.set_temperature(v)),
            Err(_) => eprintln!("valeur invalide : {v}"),
        },
        ("tokens", Some(v)) => match v.parse::<i64>() {
            Ok(v) => println!("max tokens = {}", panel.set_max_tokens(v)),
            Err(_) => eprintln!("valeur invalide : {v}"),
        },
        ("preset", Some(v)) => match v.parse::<Preset>() {
            Ok(preset) => match panel.apply_preset(preset) {
                Ok(params) => println!(
                    "{preset} : température {}, max tokens {}",
                    params.temperature, params.max_tokens
                ),
                Err(_) => eprintln!("Presets disponibles seulement après /unlock."),
            },
            Err(e) => eprintln!("{e}"),
        },
        ("preset", None) => {
            let names: Vec<_> = Preset::ALL.iter().map(|p| p.label()).collect();
            println!("Presets : {}", names.join(", "));
        }
        ("lock", _) => {
            panel.lock();
            println!("Paramètres verrouillés et réinitialisés.");
        }
        ("unlock", _) => {
            panel.unlock();
            println!("Paramètres avancés déverrouillés.");
        }
        _ => println!("{HELP}"),
    }
    true
}
