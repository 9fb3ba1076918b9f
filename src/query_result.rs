use serde::de::DeserializeOwned;

use crate::error::CrdError;

/// The rows of a `gerrit query --format json` response.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub changes: Vec<T>,
    pub stats: Option<QueryStatistics>,
}

impl<T> QueryResult<T>
where
    T: DeserializeOwned,
{
    /// Parse `gerrit query` output, one JSON object per line.
    ///
    /// Gerrit reports a rejected query as an `{"type": "error"}` row rather than a failed exit
    /// status.
    pub fn from_stdout(query: &str, stdout: &str) -> Result<Self, CrdError> {
        let mut ret = Self {
            changes: Vec::new(),
            stats: None,
        };

        for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
            let row = serde_json::from_str::<serde_json::Value>(line).map_err(|error| {
                CrdError::transport(format!("Failed to parse `gerrit query` output: {error}"))
            })?;
            let row_type = row
                .as_object()
                .and_then(|object| object.get("type"))
                .and_then(|type_value| type_value.as_str());

            match row_type {
                Some("stats") => {
                    ret.stats = Some(serde_json::from_value::<QueryStatistics>(row).map_err(
                        |error| CrdError::transport(format!("Malformed query statistics: {error}")),
                    )?);
                }
                Some("error") => {
                    let message = row
                        .get("message")
                        .and_then(|message| message.as_str())
                        .unwrap_or("unknown error")
                        .to_owned();
                    return Err(CrdError::BadQuery {
                        query: query.to_owned(),
                        message,
                    });
                }
                _ => {
                    ret.changes
                        .push(serde_json::from_value::<T>(row).map_err(|error| {
                            CrdError::transport(format!("Malformed change in query result: {error}"))
                        })?);
                }
            }
        }

        Ok(ret)
    }
}

#[derive(serde::Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatistics {
    pub row_count: usize,
    #[serde(default)]
    pub more_changes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSummary;
    use crate::change_number::ChangeNumber;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_stdout() {
        let stdout = indoc! {r#"
            {"project":"zuul","branch":"master","id":"I0123456789abcdef000000000000000000010001","number":1,"subject":"One","status":"NEW","lastUpdated":1700000000}
            {"project":"nova","branch":"stable","id":"I0123456789abcdef000000000000000000010002","number":2,"subject":"Two","status":"MERGED","lastUpdated":1700000000}
            {"type":"stats","rowCount":2,"runTimeMilliseconds":5,"moreChanges":false}
        "#};
        let result = QueryResult::<ChangeSummary>::from_stdout("change:x", stdout).unwrap();
        assert_eq!(
            result
                .changes
                .iter()
                .map(|change| change.number)
                .collect::<Vec<_>>(),
            vec![ChangeNumber::from(1), ChangeNumber::from(2)]
        );
        assert_eq!(result.stats.unwrap().row_count, 2);
    }

    #[test]
    fn test_from_stdout_empty() {
        let stdout = r#"{"type":"stats","rowCount":0,"runTimeMilliseconds":1,"moreChanges":false}"#;
        let result = QueryResult::<ChangeSummary>::from_stdout("change:x", stdout).unwrap();
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_from_stdout_error_row() {
        let stdout = r#"{"type":"error","message":"line 1:8 no viable alternative at input 'OR'"}"#;
        let error = QueryResult::<ChangeSummary>::from_stdout("message: OR", stdout).unwrap_err();
        match error {
            CrdError::BadQuery { query, message } => {
                assert_eq!(query, "message: OR");
                assert_eq!(message, "line 1:8 no viable alternative at input 'OR'");
            }
            other => panic!("Expected a bad query error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_stdout_garbage() {
        assert!(matches!(
            QueryResult::<ChangeSummary>::from_stdout("change:x", "ssh: connect to host"),
            Err(CrdError::Transport(_))
        ));
    }
}
