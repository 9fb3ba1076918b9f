use std::str::FromStr;

use clap::builder::StringValueParser;
use clap::builder::TypedValueParser;
use clap::builder::ValueParserFactory;
use derive_more::{AsRef, Deref, Display, Into};

use crate::error::CrdError;

/// The number of hex digits after the leading `I` in a [`ChangeId`].
pub const CHANGE_ID_HEX_LEN: usize = 40;

/// A Gerrit change ID.
///
/// This is a string starting with `I` and followed by 40 hex characters. Two change IDs are
/// only equal if they're the exact same string.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Into,
    AsRef,
    Deref,
)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Wrap a string that's already known to be a well-formed change ID, like one captured by
    /// the `Depends-On` extractor or returned from Gerrit.
    pub(crate) fn new_unchecked(change_id: impl Into<String>) -> Self {
        Self(change_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChangeId {
    type Err = CrdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('I').ok_or_else(|| {
            CrdError::BadRequest(format!("Change-Id `{s}` doesn't start with `I`"))
        })?;
        if hex.len() != CHANGE_ID_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CrdError::BadRequest(format!(
                "Change-Id `{s}` should be `I` followed by {CHANGE_ID_HEX_LEN} hex digits"
            )));
        }
        Ok(Self(s.to_owned()))
    }
}

#[derive(Clone)]
pub struct ChangeIdParser;

impl ValueParserFactory for ChangeId {
    type Parser = ChangeIdParser;

    fn value_parser() -> Self::Parser {
        ChangeIdParser
    }
}

impl TypedValueParser for ChangeIdParser {
    type Value = ChangeId;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        StringValueParser::new()
            .parse_ref(cmd, arg, value)?
            .parse()
            .map_err(|error: CrdError| {
                clap::Error::raw(clap::error::ErrorKind::ValueValidation, error).with_cmd(cmd)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_change_id_parse() {
        let change_id = "I0123456789abcdef000000000000000000010001"
            .parse::<ChangeId>()
            .unwrap();
        assert_eq!(change_id.as_str(), "I0123456789abcdef000000000000000000010001");
    }

    #[test]
    fn test_change_id_parse_wrong_length() {
        assert!("I012345678".parse::<ChangeId>().is_err());
        assert!("I0123456789abcdef0000000000000000000100011"
            .parse::<ChangeId>()
            .is_err());
    }

    #[test]
    fn test_change_id_parse_marker_is_case_sensitive() {
        assert!("i0123456789abcdef000000000000000000010001"
            .parse::<ChangeId>()
            .is_err());
    }

    #[test]
    fn test_change_id_parse_not_hex() {
        let error = "I0123456789abcdefg00000000000000000010001"
            .parse::<ChangeId>()
            .unwrap_err();
        assert!(matches!(error, CrdError::BadRequest(_)));
    }
}
