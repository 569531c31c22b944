//! Index descriptors and the physical naming convention.
//!
//! Physical names must stay bit-exact for interoperability with existing
//! indices: `{alias}-v{version}`, with a trailing `-{period}` for
//! time-partitioned types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel for "the alias version could not be determined". An unknown
/// version is treated as already current and never triggers a reindex.
pub const UNKNOWN_VERSION: i32 = -1;

/// A sub-type stored in the same index with a parent/child relationship.
/// The parent field must survive migration so routing is preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChildTypeDescriptor {
    pub name: String,
    pub parent_field: String,
}

/// Static description of one entity type's index: logical name, alias,
/// schema version, partitioning and field mapping. Immutable after
/// construction; owned by configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Logical entity type name (also the cache scope)
    pub name: String,

    /// Alias applications address data through
    pub alias: String,

    /// Integer schema version
    pub version: i32,

    /// One alias spanning many physical indices keyed by period
    pub time_partitioned: bool,

    /// Chrono format for the period key of partitioned indices
    pub period_format: String,

    /// Child sub-types sharing the index
    pub children: Vec<ChildTypeDescriptor>,

    /// Field mapping applied at index/template creation
    pub mapping: Value,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, alias: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            version,
            time_partitioned: false,
            period_format: "%Y.%m".to_string(),
            children: Vec::new(),
            mapping: Value::Object(Default::default()),
        }
    }

    /// Mark the index as time-partitioned (monthly by default)
    pub fn time_partitioned(mut self) -> Self {
        self.time_partitioned = true;
        self
    }

    /// Override the partition period format (chrono format string)
    pub fn with_period_format(mut self, format: impl Into<String>) -> Self {
        self.period_format = format.into();
        self
    }

    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, parent_field: impl Into<String>) -> Self {
        self.children.push(ChildTypeDescriptor {
            name: name.into(),
            parent_field: parent_field.into(),
        });
        self
    }

    /// `{alias}-v{version}`: the concrete index name, or the template name
    /// and partition prefix for time-partitioned types
    pub fn versioned_name(&self) -> String {
        format!("{}-v{}", self.alias, self.version)
    }

    /// Physical index for one partition period: `{alias}-v{version}-{period}`
    pub fn partition_index(&self, utc: DateTime<Utc>) -> String {
        format!("{}-{}", self.versioned_name(), utc.format(&self.period_format))
    }
}

/// Parse the schema version out of a physical index name: the substring
/// after the final `-v`, up to the next `-` or end of string. Anything
/// unparsable yields [`UNKNOWN_VERSION`].
pub fn parse_index_version(index_name: &str) -> i32 {
    let Some(pos) = index_name.rfind("-v") else {
        return UNKNOWN_VERSION;
    };

    let rest = &index_name[pos + 2..];
    let digits = match rest.find('-') {
        Some(end) => &rest[..end],
        None => rest,
    };

    digits.parse().unwrap_or(UNKNOWN_VERSION)
}
