//! Config module.
//! Command-line options only; there is no config file. The server address
//! defaults to the fixed board server.

use crate::board::Position;
use crate::input::parse_square;
use crate::render::GlyphStyle;
use crate::source::DEFAULT_SERVER;
use crate::view::StalePolicy;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub server: String,
    pub style: GlyphStyle,
    pub stale: StalePolicy,
    /// Fetch once, print, exit.
    pub once: bool,
    pub select: Option<Position>,
}

pub fn command() -> Command {
    Command::new("chessboard-view")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal viewer for a remote chessboard server")
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("URL")
                .help("Board server base address")
                .default_value(DEFAULT_SERVER),
        )
        .arg(
            Arg::new("ascii")
                .long("ascii")
                .help("Draw pieces as letters instead of Unicode glyphs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stale")
                .long("stale")
                .value_name("POLICY")
                .help("Responses from superseded fetches: apply (last arrival wins) or discard")
                .default_value("apply")
                .value_parser(["apply", "discard"]),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Fetch and print the board once, then exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("select")
                .long("select")
                .value_name("SQUARE")
                .help("Square to select before the first fetch (e2 or 'row,col')"),
        )
}

impl Config {
    pub fn from_args() -> Result<Config> {
        Config::from_matches(&command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Config> {
        let server = matches
            .get_one::<String>("server")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());

        let stale = match matches.get_one::<String>("stale").map(String::as_str) {
            Some("discard") => StalePolicy::Discard,
            _ => StalePolicy::Apply,
        };

        let style = if matches.get_flag("ascii") { GlyphStyle::Ascii } else { GlyphStyle::Unicode };

        let select = matches
            .get_one::<String>("select")
            .map(|s| parse_square(s))
            .transpose()
            .context("Invalid --select")?;

        Ok(Config { server, style, stale, once: matches.get_flag("once"), select })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let matches = command().try_get_matches_from(args)?;
        Config::from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["chessboard-view"]).unwrap();
        assert_eq!(
            config,
            Config {
                server: DEFAULT_SERVER.to_string(),
                style: GlyphStyle::Unicode,
                stale: StalePolicy::Apply,
                once: false,
                select: None,
            }
        );
    }

    #[test]
    fn test_all_options() {
        let config = parse(&[
            "chessboard-view",
            "--server",
            "http://localhost:4545",
            "--ascii",
            "--stale",
            "discard",
            "--once",
            "--select",
            "e2",
        ])
        .unwrap();
        assert_eq!(config.server, "http://localhost:4545");
        assert_eq!(config.style, GlyphStyle::Ascii);
        assert_eq!(config.stale, StalePolicy::Discard);
        assert!(config.once);
        assert_eq!(config.select, Some(Position(1, 4)));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(parse(&["chessboard-view", "--stale", "newest"]).is_err());
    }

    #[test]
    fn test_rejects_bad_select() {
        let err = parse(&["chessboard-view", "--select", "z9"]).unwrap_err();
        assert!(err.to_string().contains("--select"));
    }
}
