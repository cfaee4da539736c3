//! FHIR search parameters.

use std::fmt;

/// Ordered search parameters for a FHIR search request.
///
/// Order is preserved so requests are reproducible in logs and tests. Values are
/// kept raw; percent-encoding happens when the request URL is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// `_count`: page size.
    pub fn count(self, count: u32) -> Self {
        self.param("_count", count.to_string())
    }

    /// `_offset`: number of matches to skip.
    pub fn offset(self, offset: u64) -> Self {
        self.param("_offset", offset.to_string())
    }

    /// `_include`: pull referenced resources into the same Bundle.
    pub fn include(self, directive: impl Into<String>) -> Self {
        self.param("_include", directive)
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.pairs {
            if !first {
                f.write_str("&")?;
            }
            first = false;
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
