use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend kinds recognized by configuration.
///
/// This enum covers the backends the registry knows how to construct. Stored
/// asset references carry the backend id as an opaque string so corrupt data
/// surfaces at resolution time instead of at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    S3,
    Memory,
}

impl BackendKind {
    /// Canonical id recorded on asset references produced by this backend.
    pub fn id(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::S3 => "s3",
            BackendKind::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!("S3".parse::<BackendKind>().unwrap(), BackendKind::S3);
        assert_eq!(
            "memory".parse::<BackendKind>().unwrap(),
            BackendKind::Memory
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!("ghost".parse::<BackendKind>().is_err());
    }

    #[test]
    fn display_matches_id() {
        assert_eq!(BackendKind::Local.to_string(), "local");
        assert_eq!(BackendKind::S3.to_string(), "s3");
    }
}
