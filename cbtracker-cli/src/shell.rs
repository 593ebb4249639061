use anyhow::Result;
use cbtracker_game::{CatalogIndex, ChallengeTag, ProgressStore};
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::ReportFormat;
use crate::actions;

const HELP: &str = "\
Commands:
  complete <id>...     mark ids complete (alias: c)
  uncomplete <id>...   clear ids (alias: u)
  undo                 reverse the last completion of this session
  list [tag]           show visible challenges, optionally for one tag
  filter               print the grid filter
  sections             show section lock state and progress
  export               print progress as JSON
  help                 show this text
  quit                 leave the shell (alias: exit)";

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    Complete(Vec<&'a str>),
    Uncomplete(Vec<&'a str>),
    Undo,
    List(Option<ChallengeTag>),
    Filter,
    Sections,
    Export,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Option<ShellCommand<'_>>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let command = match head.to_ascii_lowercase().as_str() {
        "complete" | "c" if !rest.is_empty() => ShellCommand::Complete(rest),
        "uncomplete" | "u" if !rest.is_empty() => ShellCommand::Uncomplete(rest),
        "complete" | "c" | "uncomplete" | "u" => {
            return Err(format!("{head} needs at least one id"));
        }
        "undo" => ShellCommand::Undo,
        "list" | "ls" if rest.is_empty() => ShellCommand::List(None),
        "list" | "ls" => ShellCommand::List(Some(rest.join(" ").parse()?)),
        "filter" => ShellCommand::Filter,
        "sections" => ShellCommand::Sections,
        "export" => ShellCommand::Export,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => return Err(format!("unknown command: {head}")),
    };
    Ok(Some(command))
}

/// Read commands from `input` until it ends or the user quits.
///
/// Undo history lives as long as the session; every change is persisted
/// as it happens.
pub fn run_shell(
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    store: &mut ProgressStore,
    index: &CatalogIndex,
    report: ReportFormat,
) -> Result<()> {
    writeln!(
        out,
        "{}",
        "⚔️  CbTracker shell - type 'help' for commands".bright_cyan().bold()
    )?;
    let mut line = String::new();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{}", message.yellow())?;
                continue;
            }
        };
        log::debug!("shell command: {command:?}");

        match command {
            ShellCommand::Complete(ids) => {
                actions::complete_ids(out, store, index, ids)?;
            }
            ShellCommand::Uncomplete(ids) => {
                actions::uncomplete_ids(out, store, index, ids)?;
            }
            ShellCommand::Undo => actions::undo(out, store, index)?,
            ShellCommand::List(tag) => actions::list_challenges(out, store, index, tag, report)?,
            ShellCommand::Filter => actions::show_filter(out, store, index)?,
            ShellCommand::Sections => actions::show_sections(out, store, index, report)?,
            ShellCommand::Export => writeln!(out, "{}", store.export()?)?,
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Quit => break,
        }
    }
    Ok(())
}
