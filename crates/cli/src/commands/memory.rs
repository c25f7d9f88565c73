//! `symposium memory`: Stored transcript management.

use symposium_core::session::SessionId;

use super::ConfigPaths;

const PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() { format!("{head}…") } else { head }
}

pub async fn list(paths: &ConfigPaths) -> Result<(), Box<dyn std::error::Error>> {
    let api = paths.api()?;
    let sessions = api.memory().list().await?;

    if sessions.is_empty() {
        println!("  No stored sessions.");
        return Ok(());
    }

    println!("  {} stored session(s) in {}", sessions.len(), api.memory().name());
    println!();
    for s in &sessions {
        println!(
            "  {}  {}  {:>3} turns  {}",
            s.session_id,
            s.created_at.format("%Y-%m-%d %H:%M"),
            s.turn_count,
            preview(&s.topic)
        );
    }
    Ok(())
}

pub async fn show(paths: &ConfigPaths, session_id: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let api = paths.api()?;
    let id = SessionId::from(session_id);
    let record = api
        .memory()
        .record(&id)
        .await?
        .ok_or_else(|| format!("No stored session with id {session_id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("  Topic:    {}", record.topic);
    println!("  Created:  {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Rounds:   {}", record.rounds);
    println!();
    for turn in &record.turns {
        let content = if turn.is_failed() { "(no response)" } else { turn.content.as_str() };
        println!("  [round {} · {}] {}", turn.round_index, turn.speaker, content);
        for invocation in &turn.tool_invocations {
            let outcome = invocation
                .value
                .as_deref()
                .or(invocation.error.as_deref())
                .unwrap_or_default();
            println!("      {} \"{}\" → {}", invocation.tool, invocation.query, preview(outcome));
        }
    }
    Ok(())
}

pub async fn search(paths: &ConfigPaths, query: &str, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let api = paths.api()?;

    println!("  Searching transcripts for: \"{query}\"");
    println!();

    let hits = api.search_memory(query, limit).await?;
    if hits.is_empty() {
        println!("  No matching turns.");
    } else {
        for (i, hit) in hits.iter().enumerate() {
            println!(
                "  {:>2}. {} [round {} · {}] {}",
                i + 1,
                hit.session_id,
                hit.turn.round_index,
                hit.turn.speaker,
                preview(&hit.turn.content)
            );
            println!("      topic: {}", preview(&hit.topic));
        }
    }
    Ok(())
}

pub async fn clear(
    paths: &ConfigPaths,
    session_id: Option<&str>,
    confirm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = paths.api()?;

    if let Some(id) = session_id {
        if api.memory().delete(&SessionId::from(id)).await? {
            println!("  Deleted session {id}.");
        } else {
            println!("  No stored session with id {id}.");
        }
        return Ok(());
    }

    if !confirm {
        println!("  This will delete ALL stored sessions permanently.");
        println!("  Run with --confirm to proceed:");
        println!("  symposium memory clear --confirm");
        return Ok(());
    }

    let removed = api.clear_memory().await?;
    println!("  Deleted {removed} session(s).");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(100);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
    }
}
