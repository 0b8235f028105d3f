//! Thin `reqwest`-based convenience commands that query a running agent's
//! operational surface from the operator's terminal.

use anyhow::{Context, Result};
use colored::*;

fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

pub async fn health(host: &str, port: u16) -> Result<()> {
    let url = format!("{}/health", base_url(host, port));
    let body: serde_json::Value = reqwest::get(&url)
        .await
        .with_context(|| format!("requesting {}", url))?
        .json()
        .await
        .context("parsing health response")?;

    let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("unknown");
    let colored_status = match status {
        "healthy" => status.green(),
        "degraded" => status.yellow(),
        _ => status.red(),
    };
    println!("{} Agent status: {}", "→".cyan(), colored_status);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub async fn version(host: &str, port: u16) -> Result<()> {
    let url = format!("{}/version", base_url(host, port));
    let body: serde_json::Value = reqwest::get(&url)
        .await
        .with_context(|| format!("requesting {}", url))?
        .json()
        .await
        .context("parsing version response")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub async fn reload(host: &str, port: u16, skill: &str, token: Option<&str>) -> Result<()> {
    let url = format!("{}/skills/{}/reload", base_url(host, port), skill);
    let client = reqwest::Client::new();
    let mut request = client.post(&url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.with_context(|| format!("requesting {}", url))?;
    let status = response.status();
    let body: serde_json::Value = response.json().await.context("parsing reload response")?;

    if status.is_success() && body.get("success").and_then(|v| v.as_bool()).unwrap_or(false) {
        println!("{} Skill '{}' reloaded", "✓".green().bold(), skill);
    } else {
        println!("{} Reload failed: {}", "✗".red().bold(), body);
    }
    Ok(())
}
