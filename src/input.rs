//! Interactive input.
//! Typing a square stands in for clicking a cell. Runs on its own thread
//! because the prompt blocks; it only sends commands, never touches view state.

use crate::board::Position;
use anyhow::{Result, anyhow, bail};
use console::Term;
use dialoguer::Input;
use std::io::{self, BufRead, IsTerminal};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Select(Position),
    Refresh,
    Quit,
}

/// Parses `q`, `r`, an algebraic square (`e2`) or a `row col` pair (`1 4`, `1,4`).
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "q" | "quit" => Ok(Command::Quit),
        "r" | "refresh" => Ok(Command::Refresh),
        _ => parse_square(&line).map(Command::Select),
    }
}

pub fn parse_square(text: &str) -> Result<Position> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Expected a square, got nothing");
    }

    let parts: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() == 2 {
        let row: u8 = parts[0].parse().map_err(|_| anyhow!("Invalid row '{}'", parts[0]))?;
        let col: u8 = parts[1].parse().map_err(|_| anyhow!("Invalid column '{}'", parts[1]))?;
        return Position::new(row, col)
            .ok_or_else(|| anyhow!("Square ({}, {}) is off the board, use 0-7", row, col));
    }

    match text.as_bytes() {
        [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Ok(Position(rank - b'1', file - b'a')),
        [file @ b'A'..=b'H', rank @ b'1'..=b'8'] => Ok(Position(rank - b'1', file - b'A')),
        _ => bail!("Unrecognized square '{}', try e2 or '1 4'", text),
    }
}

pub const PROMPT: &str = "square (e2 | row col | r | q)";

/// Reads commands until quit or a closed channel. A terminal gets the
/// dialoguer prompt; pipes and files are read line by line. Running out of
/// input is not a quit, the view stays up until interrupted.
pub fn read_commands(commands: UnboundedSender<Command>) {
    if Term::stderr().is_term() && io::stdin().is_terminal() {
        prompt_commands(&commands);
    } else {
        debug!("stdin is not a terminal, reading plain lines");
        read_lines(io::stdin().lock(), &commands);
    }
}

fn prompt_commands(commands: &UnboundedSender<Command>) {
    loop {
        let line = match Input::<String>::new()
            .with_prompt(PROMPT)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                warn!("Prompt failed, no further input will be read: {}", e);
                return;
            }
        };

        if !dispatch(&line, commands) {
            return;
        }
    }
}

pub fn read_lines<R: BufRead>(reader: R, commands: &UnboundedSender<Command>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if !dispatch(&line, commands) {
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to read input: {}", e);
                return;
            }
        }
    }
    debug!("end of input");
}

/// Sends the command on `line`. False once reading should stop.
fn dispatch(line: &str, commands: &UnboundedSender<Command>) -> bool {
    if line.trim().is_empty() {
        return true;
    }

    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            warn!("{:#}", e);
            return true;
        }
    };

    debug!(?command, "input");
    commands.send(command).is_ok() && command != Command::Quit
}
