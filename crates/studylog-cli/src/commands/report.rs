use anyhow::Result;
use colored::Colorize;
use std::collections::HashMap;
use studylog_core::assignment::AssignmentCatalog;
use studylog_core::dialogue::messages::format_hours;
use studylog_core::progress::{AssignmentProgress, ProgressStatus, ProgressStore, StudySessionRecord};

use super::AppContext;

pub async fn progress(ctx: &AppContext, user_id: &str) -> Result<()> {
    let store = ctx.progress_store();
    let titles = assignment_titles(ctx, user_id).await;

    let mut all = store.list_progress(user_id).await?;
    if all.is_empty() {
        println!("{}", "No progress logged yet.".bright_black());
        return Ok(());
    }
    all.sort_by(|a, b| b.last_worked_at.cmp(&a.last_worked_at));

    println!("{}", format!("Progress for {}", user_id).bright_magenta().bold());
    for item in &all {
        println!("{}", progress_line(item, &titles));
    }
    Ok(())
}

pub async fn history(ctx: &AppContext, user_id: &str, limit: usize) -> Result<()> {
    let store = ctx.progress_store();
    let titles = assignment_titles(ctx, user_id).await;

    let records = store.list_records(user_id).await?;
    if records.is_empty() {
        println!("{}", "No study sessions logged yet.".bright_black());
        return Ok(());
    }

    println!("{}", format!("Recent sessions for {}", user_id).bright_magenta().bold());
    for record in records.iter().rev().take(limit) {
        println!("{}", record_line(record, &titles));
    }
    Ok(())
}

pub async fn assignments(ctx: &AppContext, user_id: &str) -> Result<()> {
    let open = ctx.catalog().open_assignments(user_id).await?;
    if open.is_empty() {
        println!("{}", "No open assignments.".bright_black());
        return Ok(());
    }

    for assignment in open {
        let course = assignment.course_id.as_deref().unwrap_or("-");
        let estimate = assignment
            .estimated_hours
            .map(|h| format!("~{}h", format_hours(h)))
            .unwrap_or_default();
        println!(
            "  {:<12} {:<36} {:<10} {}",
            assignment.id.bright_black(),
            assignment.title,
            course,
            estimate
        );
    }
    Ok(())
}

/// Titles by assignment id; a catalog failure only costs the pretty names.
async fn assignment_titles(ctx: &AppContext, user_id: &str) -> HashMap<String, String> {
    match ctx.catalog().open_assignments(user_id).await {
        Ok(open) => open.into_iter().map(|a| (a.id, a.title)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read the assignment catalog");
            HashMap::new()
        }
    }
}

fn progress_line(item: &AssignmentProgress, titles: &HashMap<String, String>) -> String {
    let name = titles.get(&item.assignment_id).unwrap_or(&item.assignment_id);
    let remaining = match item.hours_remaining {
        Some(h) => format!("{}h left", format_hours(h)),
        None => "no estimate".to_string(),
    };
    let status = match item.status {
        ProgressStatus::Done => item.status.to_string().green(),
        ProgressStatus::InProgress => item.status.to_string().yellow(),
        _ => item.status.to_string().bright_black(),
    };
    format!(
        "  {:<36} {:>7}h done  {:<12} {}",
        name,
        format_hours(item.hours_done),
        remaining,
        status
    )
}

fn record_line(record: &StudySessionRecord, titles: &HashMap<String, String>) -> String {
    let target = record
        .assignment_id
        .as_ref()
        .map(|id| titles.get(id).unwrap_or(id).clone())
        .or_else(|| record.course_id.clone())
        .unwrap_or_else(|| "-".to_string());
    let rating = |r: Option<u8>| r.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());

    let mut line = format!(
        "  {}  {:>4} min  {:<32} focus {} quality {}",
        record.recorded_at.format("%Y-%m-%d %H:%M"),
        record.minutes,
        target,
        rating(record.focus),
        rating(record.quality)
    );
    if !record.notes.is_empty() {
        line.push_str(&format!("\n      {}", record.notes.bright_black()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_prefers_title() {
        let mut item = AssignmentProgress::new("u1", "a1").with_estimate(2.0);
        item.hours_done = 1.5;
        item.hours_remaining = Some(0.5);
        let titles = HashMap::from([("a1".to_string(), "RL Project".to_string())]);

        let line = progress_line(&item, &titles);
        assert!(line.contains("RL Project"));
        assert!(line.contains("1.5h done"));
        assert!(line.contains("0.5h left"));
    }

    #[test]
    fn test_record_line_falls_back_to_course() {
        let record = StudySessionRecord {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            assignment_id: None,
            course_id: Some("cs285".to_string()),
            recorded_at: chrono::Utc::now(),
            minutes: 45,
            focus: Some(4),
            quality: None,
            notes: String::new(),
            study_block_id: None,
            provenance: studylog_core::progress::Provenance::Interactive,
        };

        let line = record_line(&record, &HashMap::new());
        assert!(line.contains("cs285"));
        assert!(line.contains("focus 4 quality -"));
    }
}
