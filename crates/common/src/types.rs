use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a compilation unit: the file or resource that, once loaded,
/// provides one or more namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a dependency specifier participates in scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepKind {
    /// Must reach Loaded before the dependent's unit dispatches.
    Normal,
    /// Loads after the current chain; breaks ordering cycles. Sigil `>`.
    Deferred,
    /// Resource outside the namespace system, fetched directly and never
    /// expanded. Sigil `@`.
    External,
}

/// A dependency specifier with its scheduling annotation.
///
/// Raw specifiers carry the annotation as a leading sigil on the name.
/// They are parsed exactly once, at registration; the rest of the resolver
/// only ever sees the tagged form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepSpec {
    pub kind: DepKind,
    pub name: String,
}

impl DepSpec {
    /// Parse a raw specifier, stripping a leading `>` or `@` sigil.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix('>') {
            Self {
                kind: DepKind::Deferred,
                name: rest.to_string(),
            }
        } else if let Some(rest) = raw.strip_prefix('@') {
            Self {
                kind: DepKind::External,
                name: rest.to_string(),
            }
        } else {
            Self {
                kind: DepKind::Normal,
                name: raw.to_string(),
            }
        }
    }
}

impl fmt::Display for DepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DepKind::Normal => f.write_str(&self.name),
            DepKind::Deferred => write!(f, ">{}", self.name),
            DepKind::External => write!(f, "@{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_specifier() {
        let spec = DepSpec::parse("engine.input");
        assert_eq!(spec.kind, DepKind::Normal);
        assert_eq!(spec.name, "engine.input");
    }

    #[test]
    fn parse_deferred_sigil() {
        let spec = DepSpec::parse(">engine.rooms");
        assert_eq!(spec.kind, DepKind::Deferred);
        assert_eq!(spec.name, "engine.rooms");
    }

    #[test]
    fn parse_external_sigil() {
        let spec = DepSpec::parse("@http://host/lib.js");
        assert_eq!(spec.kind, DepKind::External);
        assert_eq!(spec.name, "http://host/lib.js");
    }

    #[test]
    fn display_round_trips_sigils() {
        for raw in ["engine.core", ">engine.rooms", "@http://host/lib.js"] {
            assert_eq!(DepSpec::parse(raw).to_string(), raw);
        }
    }
}
