use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThesisVersion {
    pub id: String,
    pub version_number: u32,
    pub changes: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("version at position {position} has number {found}, expected {expected}")]
    OutOfSequence {
        position: usize,
        expected: u32,
        found: u32,
    },

    #[error("version {version_number} points back to {found:?}, expected {expected:?}")]
    BrokenLink {
        version_number: u32,
        expected: Option<String>,
        found: Option<String>,
    },
}

/// Append-only thesis history. Numbers run 1..=n and each entry links to its
/// predecessor; the only way to grow it is [`VersionHistory::append`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ThesisVersion>", into = "Vec<ThesisVersion>")]
pub struct VersionHistory(Vec<ThesisVersion>);

impl VersionHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(mut self, changes: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let previous_version_id = self.0.last().map(|v| v.id.clone());
        self.0.push(ThesisVersion {
            id: Uuid::new_v4().to_string(),
            version_number: self.0.len() as u32 + 1,
            changes: changes.into(),
            timestamp,
            previous_version_id,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn latest(&self) -> Option<&ThesisVersion> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ThesisVersion> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ThesisVersion] {
        &self.0
    }
}

impl TryFrom<Vec<ThesisVersion>> for VersionHistory {
    type Error = HistoryError;

    fn try_from(versions: Vec<ThesisVersion>) -> Result<Self, Self::Error> {
        let mut previous: Option<&ThesisVersion> = None;
        for (position, version) in versions.iter().enumerate() {
            let expected = position as u32 + 1;
            if version.version_number != expected {
                return Err(HistoryError::OutOfSequence {
                    position,
                    expected,
                    found: version.version_number,
                });
            }
            let expected_link = previous.map(|p| p.id.clone());
            if version.previous_version_id != expected_link {
                return Err(HistoryError::BrokenLink {
                    version_number: version.version_number,
                    expected: expected_link,
                    found: version.previous_version_id.clone(),
                });
            }
            previous = Some(version);
        }
        Ok(Self(versions))
    }
}

impl From<VersionHistory> for Vec<ThesisVersion> {
    fn from(history: VersionHistory) -> Self {
        history.0
    }
}

impl<'a> IntoIterator for &'a VersionHistory {
    type Item = &'a ThesisVersion;
    type IntoIter = std::slice::Iter<'a, ThesisVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
