//! Keyset pagination cursors and their token codec.
//!
//! Listing operations page with keyset comparisons rather than offsets: a
//! cursor holds the sort key of the last row a client has seen, and the next
//! query only returns rows strictly before it. Pages stay stable as new rows
//! arrive and deep pages cost the same as the first one, at the price of not
//! supporting random page jumps.
//!
//! # Encoding
//!
//! Tokens are URL-safe base64 (no padding) of the cursor's compact JSON
//! form. An empty cursor encodes to the empty string, which clients read as
//! "no further pages"; decoding the empty string yields the empty cursor.
//!
//! ```
//! use auditum_persistence::types::{Id, PageCursor, RecordCursor};
//! use chrono::{TimeZone, Utc};
//!
//! let cursor = RecordCursor {
//!     last_operation_time: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 2, 0).unwrap()),
//!     last_id: Some(Id::from_u128(2)),
//! };
//! let token = cursor.encode();
//! assert_eq!(RecordCursor::decode(&token).unwrap(), cursor);
//!
//! assert_eq!(RecordCursor::default().encode(), "");
//! assert!(RecordCursor::decode("").unwrap().is_empty());
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::SearchError;

use super::{Id, Project, Record};

/// A position marker that can travel as an opaque token.
pub trait PageCursor: Serialize + DeserializeOwned + Default {
    /// Returns `true` when no field is set.
    fn is_empty(&self) -> bool;

    /// Returns `false` when only some of the fields are set.
    fn is_complete(&self) -> bool {
        true
    }

    /// Encodes the cursor to an opaque string, or `""` for the empty cursor.
    fn encode(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a cursor from an opaque string.
    fn decode(token: &str) -> Result<Self, SearchError> {
        if token.is_empty() {
            return Ok(Self::default());
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| SearchError::InvalidCursor {
                cursor: token.to_string(),
            })?;

        let cursor: Self =
            serde_json::from_slice(&bytes).map_err(|_| SearchError::InvalidCursor {
                cursor: token.to_string(),
            })?;
        if !cursor.is_complete() {
            return Err(SearchError::InvalidCursor {
                cursor: token.to_string(),
            });
        }
        Ok(cursor)
    }
}

/// Position in a project listing, ordered by id descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCursor {
    /// Id of the last project returned.
    #[serde(rename = "lid", default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<Id>,
}

impl ProjectCursor {
    /// Builds the cursor following a page of projects.
    ///
    /// A page shorter than `limit` is the last one and yields the empty
    /// cursor. A full page yields a cursor at its last project even if no
    /// rows remain; the client then fetches one extra, empty page.
    pub fn next_page(projects: &[Project], limit: u32) -> Self {
        if projects.len() < limit as usize {
            return Self::default();
        }
        Self {
            last_id: projects.last().map(|project| project.id),
        }
    }
}

impl PageCursor for ProjectCursor {
    fn is_empty(&self) -> bool {
        self.last_id.is_none()
    }
}

/// Position in a record listing, ordered by operation time then id, both
/// descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCursor {
    /// Operation time of the last record returned.
    #[serde(rename = "lot", default, skip_serializing_if = "Option::is_none")]
    pub last_operation_time: Option<DateTime<Utc>>,
    /// Id of the last record returned.
    #[serde(rename = "lid", default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<Id>,
}

impl RecordCursor {
    /// Builds the cursor following a page of records.
    ///
    /// Same page-full rule as [`ProjectCursor::next_page`].
    pub fn next_page(records: &[Record], limit: u32) -> Self {
        if records.len() < limit as usize {
            return Self::default();
        }
        match records.last() {
            Some(record) => Self {
                last_operation_time: Some(record.operation.time),
                last_id: Some(record.id),
            },
            None => Self::default(),
        }
    }
}

impl RecordCursor {
    /// Returns the `(operation_time, id)` keyset bound, or `None` for the
    /// empty cursor.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidCursor`] when only one field is set.
    pub fn keyset(&self) -> Result<Option<(DateTime<Utc>, Id)>, SearchError> {
        match (self.last_operation_time, self.last_id) {
            (Some(time), Some(id)) => Ok(Some((time, id))),
            (None, None) => Ok(None),
            _ => Err(SearchError::InvalidCursor {
                cursor: self.encode(),
            }),
        }
    }
}

impl PageCursor for RecordCursor {
    fn is_empty(&self) -> bool {
        self.last_operation_time.is_none() && self.last_id.is_none()
    }

    fn is_complete(&self) -> bool {
        self.last_operation_time.is_some() == self.last_id.is_some()
    }
}
