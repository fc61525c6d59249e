//! Services layer
//!
//! Coordinates the backend client and the cache for the dashboard handlers.

pub mod content;

pub use content::{
    build_update_payload, editable_fields, fields_from_form, ContentError, ContentService,
    EditableField, FieldKind,
};
