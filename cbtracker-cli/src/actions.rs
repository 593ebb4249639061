//! Operations shared by the one-shot subcommands and the interactive shell.
use anyhow::Result;
use cbtracker_game::{
    CatalogIndex, ChallengeTag, GridChallenge, Id, ProgressStore, SectionStatus, UndoOutcome,
    section_status,
};
use colored::Colorize;
use std::io::Write;

use crate::ReportFormat;
use crate::reports;

pub fn list_challenges(
    out: &mut dyn Write,
    store: &ProgressStore,
    index: &CatalogIndex,
    tag: Option<ChallengeTag>,
    report: ReportFormat,
) -> Result<()> {
    let mut filter = store.filter(index);
    if let Some(tag) = tag {
        filter = filter.with_tag(tag);
    }
    let rows: Vec<&GridChallenge> = filter.visible_rows(index).collect();
    match report {
        ReportFormat::Console => reports::write_challenges_console(out, &rows, index),
        ReportFormat::Json => reports::write_json(out, &rows),
    }
}

pub fn show_filter(out: &mut dyn Write, store: &ProgressStore, index: &CatalogIndex) -> Result<()> {
    reports::write_filter(out, &store.filter(index))
}

pub fn show_sections(
    out: &mut dyn Write,
    store: &ProgressStore,
    index: &CatalogIndex,
    report: ReportFormat,
) -> Result<()> {
    let statuses: Vec<SectionStatus> = index
        .sections()
        .map(|section| section_status(section, store.completed(), index))
        .collect();
    match report {
        ReportFormat::Console => reports::write_sections_console(out, &statuses),
        ReportFormat::Json => reports::write_json(out, &statuses),
    }
}

/// Display name of whatever `id` points at, if the catalog knows it.
pub fn describe(index: &CatalogIndex, id: Id) -> Option<String> {
    match id {
        Id::Season(season) => index.season(season).map(|season| season.name.clone()),
        Id::Section(section) => index.section(section).map(|section| section.name.clone()),
        Id::Stage(stage) => index.stage(stage).map(|stage| stage.name.clone()),
        Id::Challenge(challenge) => index
            .challenge(challenge)
            .map(|row| row.challenge.text.clone()),
    }
}

fn write_marked(out: &mut dyn Write, index: &CatalogIndex, mark: &str, id: Id) -> Result<()> {
    match describe(index, id) {
        Some(name) => writeln!(out, "{mark} {} {id} {name}", id.kind())?,
        None => writeln!(
            out,
            "{mark} {} {id} {}",
            id.kind(),
            "(not in catalog)".dimmed()
        )?,
    }
    Ok(())
}

/// Mark every id complete. Returns the ids that could not be parsed.
pub fn complete_ids<'a>(
    out: &mut dyn Write,
    store: &mut ProgressStore,
    index: &CatalogIndex,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<String>> {
    let mut rejected = Vec::new();
    for raw in ids {
        match store.complete(raw) {
            Some(id) => write_marked(out, index, &"✔".green().to_string(), id)?,
            None => {
                eprintln!("⚠️  {} is not a challenge id", raw.yellow());
                rejected.push(raw.to_string());
            }
        }
    }
    Ok(rejected)
}

/// Clear every id. Returns the ids that could not be parsed.
pub fn uncomplete_ids<'a>(
    out: &mut dyn Write,
    store: &mut ProgressStore,
    index: &CatalogIndex,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<String>> {
    let mut rejected = Vec::new();
    for raw in ids {
        let Ok(id) = Id::classify(raw) else {
            eprintln!("⚠️  {} is not a challenge id", raw.yellow());
            rejected.push(raw.to_string());
            continue;
        };
        if store.uncomplete_id(id) {
            write_marked(out, index, &"✘".red().to_string(), id)?;
        } else {
            writeln!(out, "{id} was not marked complete")?;
        }
    }
    Ok(rejected)
}

pub fn undo(out: &mut dyn Write, store: &mut ProgressStore, index: &CatalogIndex) -> Result<()> {
    match store.undo() {
        Some(UndoOutcome::Removed(id)) => write_marked(out, index, &"↶".cyan().to_string(), id),
        Some(UndoOutcome::AlreadyClear(id)) => {
            writeln!(out, "{} {id} was already cleared", id.kind())?;
            Ok(())
        }
        None => {
            writeln!(out, "Nothing to undo")?;
            Ok(())
        }
    }
}
