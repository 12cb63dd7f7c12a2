//! CLI presentation: text, json and table formatters.

use crate::bridge::HookEvent;
use crate::cli::parse::OutputFormat;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::profiler::ProfilingData;
use crate::protocol::{decode_message, TreeReplayer};
use crate::strings::StringTable;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::fmt::Write as _;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, BridgeError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BridgeError::ConfigError(format!("Failed to serialize output: {}", e)))
}

fn best_match_text(best: Option<&crate::selection::BestMatch>) -> String {
    match best {
        Some(m) if m.is_full_match => format!("{}", m.id),
        Some(m) => format!("{} (partial)", m.id),
        None => "-".to_string(),
    }
}

/// Format the hook events of a run.
///
/// Text and table output decode each message with a consumer-side string
/// table so operations read by name.
pub fn format_events(events: &[HookEvent], format: OutputFormat) -> Result<String, BridgeError> {
    if format == OutputFormat::Json {
        return to_json(&events);
    }

    let mut strings = StringTable::new();
    let mut rows = Vec::new();
    for (index, event) in events.iter().enumerate() {
        match event {
            HookEvent::Operations(message) => {
                let decoded = decode_message(&message.payload, &mut strings)?;
                let ops: Vec<String> = decoded.operations.iter().map(|op| op.to_string()).collect();
                rows.push((
                    index,
                    format!("root {}", decoded.root_id),
                    message.payload.len().to_string(),
                    ops.join("\n"),
                ));
            }
            HookEvent::BestMatch(best) => {
                rows.push((
                    index,
                    "best match".to_string(),
                    "-".to_string(),
                    best_match_text(best.as_ref()),
                ));
            }
        }
    }

    if format == OutputFormat::Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "Event", "Words", "Operations"]);
        for (index, event, words, ops) in &rows {
            table.add_row(vec![index.to_string(), event.clone(), words.clone(), ops.clone()]);
        }
        return Ok(table.to_string());
    }

    let mut out = String::new();
    for (index, event, words, ops) in rows {
        let _ = writeln!(out, "[{}] {} ({} words)", index, event, words);
        for line in ops.lines() {
            let _ = writeln!(out, "    {}", line);
        }
    }
    Ok(out)
}

/// Replay `messages` through a fresh consumer and render the resulting tree.
pub fn format_replayed_tree(messages: &[Vec<u32>]) -> Result<String, BridgeError> {
    let mut replayer = TreeReplayer::new();
    for message in messages {
        replayer.apply(message)?;
    }
    if replayer.is_empty() {
        return Ok("(empty tree)\n".to_string());
    }
    Ok(replayer.render())
}

pub fn format_profiling(data: &ProfilingData, format: OutputFormat) -> Result<String, BridgeError> {
    match format {
        OutputFormat::Json => to_json(data),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Root", "Commit", "At (us)", "Node", "Self (us)", "Total (us)", "Changed"]);
            for root in &data.roots {
                for (index, commit) in root.commits.iter().enumerate() {
                    for timing in &commit.timings {
                        let changed = commit
                            .changed
                            .get(&timing.id)
                            .map(|keys| keys.iter().cloned().collect::<Vec<_>>().join(", "))
                            .unwrap_or_default();
                        table.add_row(vec![
                            root.root_id.to_string(),
                            index.to_string(),
                            commit.commit_time_micros.to_string(),
                            timing.id.to_string(),
                            timing.self_duration.to_string(),
                            timing.total_duration.to_string(),
                            changed,
                        ]);
                    }
                }
            }
            Ok(table.to_string())
        }
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(
                out,
                "Profiling ({}) for renderer {} captured {}",
                data.status.as_str(),
                data.renderer_id,
                data.captured_at.to_rfc3339()
            );
            for root in &data.roots {
                let _ = writeln!(out, "root {}: {} commits", root.root_id, root.commits.len());
                for (index, commit) in root.commits.iter().enumerate() {
                    let _ = writeln!(out, "  commit {} at {}us", index, commit.commit_time_micros);
                    for timing in &commit.timings {
                        let _ = writeln!(
                            out,
                            "    node {} self {}us total {}us",
                            timing.id, timing.self_duration, timing.total_duration
                        );
                    }
                }
            }
            Ok(out)
        }
    }
}

pub fn format_config(
    config: &BridgeConfig,
    problems: &[String],
    format: OutputFormat,
) -> Result<String, BridgeError> {
    if format == OutputFormat::Json {
        return to_json(&serde_json::json!({
            "config": config,
            "valid": problems.is_empty(),
            "problems": problems,
        }));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["renderer_id".to_string(), config.renderer_id.to_string()]);
    table.add_row(vec!["filters".to_string(), config.filters.len().to_string()]);
    table.add_row(vec![
        "profiling.start_on_attach".to_string(),
        config.profiling.start_on_attach.to_string(),
    ]);
    table.add_row(vec![
        "profiling.record_change_descriptions".to_string(),
        config.profiling.record_change_descriptions.to_string(),
    ]);
    table.add_row(vec!["queue.warn_after".to_string(), config.queue.warn_after.to_string()]);
    table.add_row(vec!["logging.level".to_string(), config.logging.level.clone()]);

    let mut out = table.to_string();
    out.push('\n');
    if problems.is_empty() {
        out.push_str("Configuration is valid\n");
    } else {
        for problem in problems {
            let _ = writeln!(out, "error: {}", problem);
        }
    }
    Ok(out)
}
