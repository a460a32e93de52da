//! Subcommand parsing
//!
//! Plain positional parsing: `keeper [--config PATH] <command> [args...]`.

use anyhow::{Context, Result, bail};
use serde_json::Value;

pub const USAGE: &str = "usage: keeper [--config PATH] <command>

commands:
  authorize-url [state]        print the URL to grant access
  exchange <code>              trade an authorization code for credentials
  refresh                      refresh the access token now
  profile                      show the current user's profile
  document get <id>
  document create <json>
  document update <id> <json>
  document delete <id>
  api-info                     show the API root document";

#[derive(Debug, PartialEq)]
pub enum Command {
    /// Needs only the endpoint: no client registration, no credentials.
    ApiInfo,
    /// Runs through an authenticated client.
    Session(SessionCommand),
}

#[derive(Debug, PartialEq)]
pub enum SessionCommand {
    AuthorizeUrl { state: Option<String> },
    Exchange { code: String },
    Refresh,
    Profile,
    DocumentGet { id: String },
    DocumentCreate { body: Value },
    DocumentUpdate { id: String, body: Value },
    DocumentDelete { id: String },
}

impl Command {
    /// Parse from the process args, program name excluded.
    pub fn parse(args: &[String]) -> Result<Self> {
        let positional = positional(args);
        let words: Vec<&str> = positional.iter().map(String::as_str).collect();

        let session = match words.as_slice() {
            ["api-info"] => return Ok(Command::ApiInfo),
            ["authorize-url"] => SessionCommand::AuthorizeUrl { state: None },
            ["authorize-url", state] => SessionCommand::AuthorizeUrl {
                state: Some((*state).to_owned()),
            },
            ["exchange", code] => SessionCommand::Exchange {
                code: (*code).to_owned(),
            },
            ["refresh"] => SessionCommand::Refresh,
            ["profile"] => SessionCommand::Profile,
            ["document", "get", id] => SessionCommand::DocumentGet { id: (*id).to_owned() },
            ["document", "delete", id] => SessionCommand::DocumentDelete { id: (*id).to_owned() },
            ["document", "create", json] => SessionCommand::DocumentCreate {
                body: parse_json(json)?,
            },
            ["document", "update", id, json] => SessionCommand::DocumentUpdate {
                id: (*id).to_owned(),
                body: parse_json(json)?,
            },
            [] => bail!("missing command\n\n{USAGE}"),
            _ => bail!("unrecognized command: {}\n\n{USAGE}", words.join(" ")),
        };
        Ok(Command::Session(session))
    }
}

/// Value of `--config`, if given.
pub fn config_flag(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            iter.next();
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("document body is not valid JSON: {raw}"))
}
