use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use libris_daemon::http_server::api::client::ApiError;
use libris_daemon::http_server::health::liveness::LivezRequest;
use libris_daemon::http_server::health::readiness::ReadyzRequest;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug)]
pub enum EndpointStatus {
    Ok,
    Unhealthy(String),
    NotReachable,
}

impl EndpointStatus {
    fn from_error(e: &ApiError) -> Self {
        match e.status() {
            Some(status) => EndpointStatus::Unhealthy(status.to_string()),
            None => EndpointStatus::NotReachable,
        }
    }
}

#[derive(Debug)]
pub struct HealthOutput {
    pub url: String,
    /// Storage mode reported by the daemon, when ready
    pub mode: Option<String>,
    pub livez: EndpointStatus,
    pub readyz: EndpointStatus,
}

impl fmt::Display for HealthOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}):", "Daemon".bold(), self.url)?;

        let status_str = |s: &EndpointStatus| -> String {
            match s {
                EndpointStatus::Ok => "OK".green().to_string(),
                EndpointStatus::Unhealthy(code) => format!("{} ({})", "UNHEALTHY".red(), code),
                EndpointStatus::NotReachable => "NOT REACHABLE".red().to_string(),
            }
        };

        writeln!(f, "  {} {}", "livez:".dimmed(), status_str(&self.livez))?;
        write!(f, "  {} {}", "readyz:".dimmed(), status_str(&self.readyz))?;
        if let Some(mode) = &self.mode {
            write!(f, "\n  {} {}", "mode:".dimmed(), mode)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    // unreachable endpoints are part of the report, not an error
    type Error = std::convert::Infallible;
    type Output = HealthOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let livez = match ctx.client.call(LivezRequest {}).await {
            Ok(_) => EndpointStatus::Ok,
            Err(e) => EndpointStatus::from_error(&e),
        };

        let (readyz, mode) = match ctx.client.call(ReadyzRequest {}).await {
            Ok(response) => (EndpointStatus::Ok, Some(response.mode)),
            Err(e) => (EndpointStatus::from_error(&e), None),
        };

        Ok(HealthOutput {
            url: ctx.client.base_url().to_string(),
            mode,
            livez,
            readyz,
        })
    }
}
