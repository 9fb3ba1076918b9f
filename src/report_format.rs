use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Cell;
use comfy_table::Table;
use miette::Context;
use miette::IntoDiagnostic;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use serde::Serialize;

use crate::change::ChangeSummary;
use crate::change::TimestampFormat;
use crate::change_id::ChangeId;
use crate::crd::CrdReport;
use crate::error::CrdError;
use crate::error::ErrorStatus;
use crate::format_bulleted_list;

/// A table of changes, one per row.
pub fn changes_table(
    changes: &[ChangeSummary],
    timestamp_format: TimestampFormat,
) -> miette::Result<Table> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_header(vec!["Change", "Status", "Project", "Branch", "Subject", "Updated"]);
    for change in changes {
        table.add_row(vec![
            Cell::new(change.number),
            change.status.cell(),
            Cell::new(&change.project),
            Cell::new(&change.branch),
            Cell::new(change.subject.as_deref().unwrap_or("")),
            change.last_updated_cell(timestamp_format)?,
        ]);
    }
    Ok(table)
}

/// The `Depends-On` half of a report.
pub fn format_depends_on(
    found: &[ChangeSummary],
    missing: &[ChangeId],
    timestamp_format: TimestampFormat,
) -> miette::Result<String> {
    let mut sections = Vec::new();

    if found.is_empty() {
        sections.push("Depends on: nothing on this server".to_owned());
    } else {
        sections.push(format!(
            "Depends on:\n{}",
            changes_table(found, timestamp_format)?
        ));
    }

    if !missing.is_empty() {
        sections.push(format!(
            "Depends on, but not found on this server:\n{}",
            format_bulleted_list(missing)
        ));
    }

    Ok(sections.join("\n\n"))
}

pub fn format_needed_by(
    needed_by: &[ChangeSummary],
    timestamp_format: TimestampFormat,
) -> miette::Result<String> {
    if needed_by.is_empty() {
        Ok("Needed by: nothing".to_owned())
    } else {
        Ok(format!(
            "Needed by:\n{}",
            changes_table(needed_by, timestamp_format)?
        ))
    }
}

/// Render a report for humans.
pub fn format_report(report: &CrdReport, timestamp_format: TimestampFormat) -> miette::Result<String> {
    let mut sections = vec![
        format_depends_on(
            &report.depends_on_found,
            &report.depends_on_missing,
            timestamp_format,
        )?,
        format_needed_by(&report.needed_by, timestamp_format)?,
    ];

    if report.cycle {
        sections.push(format!(
            "{}",
            "This change is part of a dependency cycle"
                .if_supports_color(Stream::Stdout, |text| text.red())
        ));
    }

    Ok(sections.join("\n\n"))
}

/// Render a report, or either half of one, as JSON.
pub fn format_json(value: &impl Serialize) -> miette::Result<String> {
    serde_json::to_string_pretty(value)
        .into_diagnostic()
        .wrap_err("Failed to serialize report")
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    status: ErrorStatus,
    code: u16,
    message: &'a str,
}

/// Render a failed report as JSON, with a status clients can act on.
pub fn format_error_json(error: &CrdError) -> miette::Result<String> {
    let status = error.status();
    format_json(&ErrorReport {
        status,
        code: status.http_code(),
        message: &error.to_string(),
    })
}
