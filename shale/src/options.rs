use crate::error::{ErrorKind, Result};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_MAX_DEPTH: usize = 64;

/// Codec policies, shared by [`Serializer`](crate::Serializer) and
/// [`Deserializer`](crate::Deserializer).
///
/// Missing keys take their default when loaded from RON:
/// ```
/// let options = shale::Options::from_ron_str("(ignore_unknown_fields: true)").unwrap();
/// assert!(options.ignore_unknown_fields);
/// assert_eq!(options.preallocation_limit, 4096);
/// assert_eq!(options.max_depth, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Skip fields present in the stream but absent from the receiving type instead of failing.
    pub ignore_unknown_fields: bool,
    /// Attach to errors the offset reached by the failing call, counted from where it started.
    pub report_error_position: bool,
    /// Upper bound on capacity reserved up front from a length prefix.
    pub preallocation_limit: usize,
    /// Deepest nesting of tags, untyped values and records accepted while reading.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            ignore_unknown_fields: false,
            report_error_position: false,
            preallocation_limit: 4096,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn from_ron_str(s: &str) -> Result<Options> {
        ron::de::from_str(s).map_err(|e| ErrorKind::Config(format!("{e:?}")).into())
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(|e| ErrorKind::Config(format!("{e:?}")).into())
    }

    pub fn ignore_unknown_fields(mut self, ignore: bool) -> Self {
        self.ignore_unknown_fields = ignore;
        self
    }

    pub fn report_error_position(mut self, report: bool) -> Self {
        self.report_error_position = report;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ron_round_trip() {
        let options = Options::default()
            .ignore_unknown_fields(true)
            .report_error_position(true)
            .max_depth(8);
        let s = options.to_ron_string().unwrap();
        assert_eq!(Options::from_ron_str(&s).unwrap(), options);
    }

    #[test]
    fn bad_ron() {
        let e = Options::from_ron_str("(preallocation_limit: \"many\")").unwrap_err();
        assert!(matches!(e.kind(), ErrorKind::Config(_)));
    }
}
