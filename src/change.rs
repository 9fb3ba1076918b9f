use comfy_table::Cell;
use serde_with::serde_as;
use serde_with::TimestampSeconds;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::change_id::ChangeId;
use crate::change_number::ChangeNumber;
use crate::change_status::ChangeStatus;
use crate::error::CrdError;
use crate::patch_set_info::PatchSetInfo;

/// A shallow summary of a change on the Gerrit server.
///
/// This is deserialized from `gerrit query --format json` rows and serialized into reports.
/// Only the fields we actually use are modeled, so unknown fields in Gerrit's output are
/// ignored.
#[serde_as]
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub id: ChangeId,
    pub number: ChangeNumber,
    pub project: String,
    pub branch: String,
    pub subject: Option<String>,
    pub status: ChangeStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    pub last_updated: Option<OffsetDateTime>,
    /// Present when the query asked for `--commit-message`.
    #[serde(default, skip_serializing)]
    pub commit_message: Option<String>,
    /// Present when the query asked for `--current-patch-set`.
    #[serde(default, skip_serializing)]
    pub current_patch_set: Option<PatchSetInfo>,
    /// Present when the query asked for `--patch-sets`.
    #[serde(default, skip_serializing)]
    pub patch_sets: Vec<PatchSetInfo>,
}

impl ChangeSummary {
    /// The current patch set, or an error if the query didn't include it.
    pub fn require_current_patch_set(&self) -> Result<&PatchSetInfo, CrdError> {
        self.current_patch_set.as_ref().ok_or_else(|| {
            CrdError::transport(format!(
                "Gerrit didn't report a current patch set for change {}",
                self.number
            ))
        })
    }

    pub fn last_updated_cell(&self, timestamp_format: TimestampFormat) -> miette::Result<Cell> {
        let last_updated = match self.last_updated {
            Some(last_updated) => last_updated,
            None => return Ok(Cell::new("")),
        };
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let now_date = now.date();
        let date = last_updated.date();
        let formatted = {
            if now_date == date {
                // Today.
                let format = match timestamp_format {
                    TimestampFormat::TwelveHour => {
                        format_description!(
                            "[hour padding:none repr:12]:[minute] [period case:lower]"
                        )
                    }
                    TimestampFormat::TwentyFourHour => {
                        format_description!("[hour padding:none repr:24]:[minute]")
                    }
                };
                last_updated.format(format)
            } else if now_date.year() == date.year() {
                last_updated.format(format_description!("[month]-[day]"))
            } else {
                last_updated.format(format_description!("[year]-[month]-[day]"))
            }
        }
        .map_err(|error| miette::miette!("Failed to format timestamp: {error}"))?;
        Ok(Cell::new(formatted))
    }
}

/// Support for Europeans.
#[derive(Debug, Clone, Copy)]
pub enum TimestampFormat {
    /// 12-hour time.
    TwelveHour,
    /// 24-hour time.
    TwentyFourHour,
}
