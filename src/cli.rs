//! Command line front end: one subcommand per page, plus a login lookup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::data_api::lookup_identity;
use crate::error::CollaboratorError;
use crate::services::{compute_page, Page, PageStatus};
use crate::state::{load_config, AppState};

#[derive(Debug, Parser)]
#[command(name = "sitepulse", version, about = "Compute the site dashboards as JSON")]
pub struct Cli {
    /// Config file (default: ~/.sitepulse/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Global dashboard, including partner lookups
    Dashboard,
    /// Staff headcount, states, heart rate
    Personnel,
    /// Packaging quality and collisions
    Articles,
    /// Purchases, sales and margins
    Operations,
    /// Fire, drones and audits per zone
    Surveillance,
    /// Temperature, humidity and air quality per zone
    Sanitaire,
    /// Show who a login belongs to
    Whois {
        login: String,
    },
}

impl Command {
    pub fn page(&self) -> Option<Page> {
        match self {
            Self::Dashboard => Some(Page::Dashboard),
            Self::Personnel => Some(Page::Personnel),
            Self::Articles => Some(Page::Articles),
            Self::Operations => Some(Page::Operations),
            Self::Surveillance => Some(Page::Surveillance),
            Self::Sanitaire => Some(Page::Sanitaire),
            Self::Whois { .. } => None,
        }
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn print<T: Serialize>(value: &T, pretty: bool) -> i32 {
    match render(value, pretty) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            log::error!("Failed to encode output: {}", e);
            1
        }
    }
}

/// Run one command and return the process exit code.
///
/// A degraded page still exits 0: the payload and its diagnostic are the
/// answer. Configuration errors and unknown logins exit 1.
pub fn execute(cli: Cli) -> i32 {
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return 1;
        }
    };
    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{}", e);
            return 1;
        }
    };

    if let Command::Whois { login } = &cli.command {
        return match lookup_identity(&state.data, login) {
            Ok(identity) => print(&identity, cli.pretty),
            Err(CollaboratorError::NotFound(what)) => {
                log::error!("Unknown {}", what);
                1
            }
            Err(e) => {
                log::error!("{} ({})", e, e.recovery_suggestion());
                1
            }
        };
    }

    let Some(page) = cli.command.page() else {
        return 1;
    };
    let report = compute_page(page, &state.data, &state.partners);
    if report.status == PageStatus::Degraded {
        log::warn!("{} page is degraded", page.as_str());
    }
    print(&report, cli.pretty)
}
