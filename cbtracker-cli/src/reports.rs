use anyhow::Result;
use cbtracker_game::{CatalogIndex, ChallengeFilter, CompletedChallenges, GridChallenge, SectionStatus};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

pub fn write_json<T>(out: &mut dyn Write, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_challenges_console(
    out: &mut dyn Write,
    rows: &[&GridChallenge],
    index: &CatalogIndex,
) -> Result<()> {
    if rows.is_empty() {
        writeln!(out, "{}", "Nothing left to show. 🎉".green())?;
        return Ok(());
    }

    let mut current_stage = None;
    for row in rows {
        if current_stage != Some(row.stage_id) {
            current_stage = Some(row.stage_id);
            writeln!(out)?;
            writeln!(out, "{}", stage_heading(row, index).bright_cyan().bold())?;
        }
        let tags = row
            .challenge
            .tags
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if tags.is_empty() {
            writeln!(out, "  {:<10} {}", row.id().to_string().yellow(), row.challenge.text)?;
        } else {
            writeln!(
                out,
                "  {:<10} {} {}",
                row.id().to_string().yellow(),
                row.challenge.text,
                format!("[{tags}]").dimmed()
            )?;
        }
    }
    writeln!(out)?;
    writeln!(out, "{} challenges shown", rows.len())?;
    Ok(())
}

fn stage_heading(row: &GridChallenge, index: &CatalogIndex) -> String {
    let season = index
        .season(row.season_id)
        .map_or_else(|| row.season_id.to_string(), |season| season.name.clone());
    let section = index
        .section(row.section_id)
        .map_or_else(|| row.section_id.to_string(), |section| section.name.clone());
    match index.stage(row.stage_id) {
        Some(stage) => format!(
            "{season} › {section} › {} ({} of {} required)",
            stage.name, stage.required, stage.total
        ),
        None => format!("{season} › {section} › {}", row.stage_id),
    }
}

pub fn write_sections_console(out: &mut dyn Write, statuses: &[SectionStatus]) -> Result<()> {
    writeln!(out, "{}", "📜 Sections".bright_cyan().bold())?;
    writeln!(out, "{}", "===========".cyan())?;
    for status in statuses {
        let lock = if status.is_complete() {
            "✅".normal()
        } else if status.unlocked {
            "🔓".normal()
        } else {
            "🔒".normal()
        };
        let progress = format!("{}/{}", status.stages_done, status.stages_total);
        let progress = if status.is_complete() {
            progress.green()
        } else {
            progress.yellow()
        };
        let next = status
            .next_stage
            .map(|stage| format!(" next {stage}"))
            .unwrap_or_default();
        writeln!(
            out,
            "{lock} {:<6} {:<28} {progress}{next}",
            status.section_id.to_string(),
            status.name
        )?;
    }
    Ok(())
}

pub fn write_filter(out: &mut dyn Write, filter: &ChallengeFilter) -> Result<()> {
    write_json(out, &filter.to_wire())
}

pub fn write_progress_console(out: &mut dyn Write, completed: &CompletedChallenges) -> Result<()> {
    writeln!(
        out,
        "Progress: {} seasons, {} sections, {} stages, {} challenges marked complete",
        completed.season_ids().count(),
        completed.section_ids().count(),
        completed.stage_ids().count(),
        completed.challenge_ids().count()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbtracker_game::{Catalog, SectionId, StageId, UnlockConfig};

    fn index() -> CatalogIndex {
        let catalog = Catalog::from_json(
            r#"[{ "id": 1, "name": "Season I", "sections": [
                { "id": "1.1", "name": "Opening", "stages": [
                    { "id": "1.1.1", "name": "Stage 1", "required": 1, "total": 2, "challenges": [
                        { "id": "1.1.1.1", "text": "Win a siege", "tags": ["Siege"] },
                        { "id": "1.1.1.2", "text": "Log in" }
                    ] }
                ] }
            ] }]"#,
        )
        .unwrap();
        CatalogIndex::build(catalog, &UnlockConfig::empty())
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_list_groups_rows_under_stage_heading() {
        let index = index();
        let rows: Vec<&GridChallenge> = index.rows().iter().collect();
        let text = render(|out| write_challenges_console(out, &rows, &index));
        assert!(text.contains("Season I › Opening › Stage 1 (1 of 2 required)"));
        assert!(text.contains("Win a siege"));
        assert!(text.contains("[Siege]"));
        assert!(text.contains("2 challenges shown"));
    }

    #[test]
    fn console_list_celebrates_empty_result() {
        let index = index();
        let text = render(|out| write_challenges_console(out, &[], &index));
        assert!(text.contains("Nothing left to show"));
    }

    #[test]
    fn sections_render_progress_and_next_stage() {
        let status = SectionStatus {
            section_id: SectionId::new(1, 1),
            name: "Opening".to_string(),
            unlocked: true,
            stages_done: 0,
            stages_total: 1,
            next_stage: Some(StageId::new(1, 1, 1)),
        };
        let text = render(|out| write_sections_console(out, &[status]));
        assert!(text.contains("Opening"));
        assert!(text.contains("0/1"));
        assert!(text.contains("next 1.1.1"));
    }

    #[test]
    fn empty_filter_renders_as_empty_array() {
        let text = render(|out| write_filter(out, &ChallengeFilter::empty()));
        assert_eq!(text.trim(), "[]");
    }
}
