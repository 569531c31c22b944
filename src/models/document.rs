//! Per-type document capability descriptor.
//!
//! Capabilities are a static, per-type property declared once at
//! registration, not runtime probing: the repository takes the descriptor
//! as a constructor parameter and changes behavior on what is present.

use serde_json::Value;
use std::collections::HashMap;

/// Capability descriptor for one document type.
///
/// Each accessor is optional; its presence declares the capability. A type
/// with an id accessor supports `get_by_id`/`get_by_ids` and per-document
/// caching; a soft-delete accessor enables "active only" filtering; version
/// accessors let the mapper copy the store's optimistic-concurrency token
/// onto documents.
pub struct DocumentType<T> {
    name: String,
    id: Option<fn(&T) -> String>,
    is_deleted: Option<fn(&T) -> bool>,
    soft_delete_field: Option<String>,
    set_version: Option<fn(&mut T, i64)>,
    sort_accessors: HashMap<String, fn(&T) -> Value>,
    default_excludes: Vec<String>,
    has_created: bool,
    has_dates: bool,
}

impl<T> DocumentType<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            is_deleted: None,
            soft_delete_field: None,
            set_version: None,
            sort_accessors: HashMap::new(),
            default_excludes: Vec::new(),
            has_created: false,
            has_dates: false,
        }
    }

    /// Declare the identity capability
    pub fn with_id(mut self, accessor: fn(&T) -> String) -> Self {
        self.id = Some(accessor);
        self
    }

    /// Declare the soft-delete capability: the indexed flag field and an
    /// accessor reading it off the document
    pub fn with_soft_delete(mut self, field: impl Into<String>, accessor: fn(&T) -> bool) -> Self {
        self.soft_delete_field = Some(field.into());
        self.is_deleted = Some(accessor);
        self
    }

    /// Declare the optimistic-concurrency version capability
    pub fn with_version(mut self, setter: fn(&mut T, i64)) -> Self {
        self.set_version = Some(setter);
        self
    }

    /// Declare a typed accessor for a sort field, used by cursor paging
    /// before falling back to name lookup against the serialized document
    pub fn with_sort_accessor(mut self, field: impl Into<String>, accessor: fn(&T) -> Value) -> Self {
        self.sort_accessors.insert(field.into(), accessor);
        self
    }

    /// Exclude a source field from every find unless the query overrides it
    pub fn with_default_exclude(mut self, field: impl Into<String>) -> Self {
        self.default_excludes.push(field.into());
        self
    }

    /// Declare a creation timestamp field
    pub fn with_created_date(mut self) -> Self {
        self.has_created = true;
        self
    }

    /// Declare creation and update timestamp fields
    pub fn with_dates(mut self) -> Self {
        self.has_created = true;
        self.has_dates = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_identity(&self) -> bool {
        self.id.is_some()
    }

    pub fn supports_soft_deletes(&self) -> bool {
        self.is_deleted.is_some()
    }

    pub fn soft_delete_field(&self) -> Option<&str> {
        self.soft_delete_field.as_deref()
    }

    pub fn has_version(&self) -> bool {
        self.set_version.is_some()
    }

    pub fn has_created_date(&self) -> bool {
        self.has_created
    }

    pub fn has_dates(&self) -> bool {
        self.has_dates
    }

    pub fn id_of(&self, document: &T) -> Option<String> {
        self.id.map(|f| f(document))
    }

    pub fn is_deleted(&self, document: &T) -> Option<bool> {
        self.is_deleted.map(|f| f(document))
    }

    pub fn apply_version(&self, document: &mut T, version: i64) {
        if let Some(setter) = self.set_version {
            setter(document, version);
        }
    }

    pub fn sort_value(&self, field: &str, document: &T) -> Option<Value> {
        self.sort_accessors.get(field).map(|f| f(document))
    }

    pub fn default_excludes(&self) -> &[String] {
        &self.default_excludes
    }
}

// Manual impl: `T` itself need not be Clone, the descriptor only holds fn
// pointers and flags.
impl<T> Clone for DocumentType<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            id: self.id,
            is_deleted: self.is_deleted,
            soft_delete_field: self.soft_delete_field.clone(),
            set_version: self.set_version,
            sort_accessors: self.sort_accessors.clone(),
            default_excludes: self.default_excludes.clone(),
            has_created: self.has_created,
            has_dates: self.has_dates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Employee {
        id: String,
        age: i64,
        deleted: bool,
        version: i64,
    }

    fn employee_type() -> DocumentType<Employee> {
        DocumentType::<Employee>::new("Employee")
            .with_id(|e| e.id.clone())
            .with_soft_delete("deleted", |e| e.deleted)
            .with_version(|e, v| e.version = v)
            .with_sort_accessor("age", |e| json!(e.age))
    }

    #[test]
    fn test_capability_flags() {
        let doc_type = employee_type();
        assert!(doc_type.has_identity());
        assert!(doc_type.supports_soft_deletes());
        assert!(doc_type.has_version());
        assert!(!doc_type.has_created_date());

        let bare: DocumentType<Employee> = DocumentType::new("Bare");
        assert!(!bare.has_identity());
        assert!(!bare.supports_soft_deletes());
    }

    #[test]
    fn test_accessors() {
        let doc_type = employee_type();
        let mut employee = Employee {
            id: "e1".to_string(),
            age: 42,
            deleted: false,
            version: 0,
        };

        assert_eq!(doc_type.id_of(&employee), Some("e1".to_string()));
        assert_eq!(doc_type.is_deleted(&employee), Some(false));
        assert_eq!(doc_type.sort_value("age", &employee), Some(json!(42)));
        assert_eq!(doc_type.sort_value("name", &employee), None);

        doc_type.apply_version(&mut employee, 7);
        assert_eq!(employee.version, 7);
    }
}
