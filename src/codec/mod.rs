mod config;
mod decode;
mod desc;
mod encode;
mod error;
mod fallback;
/// JSON text codec.
pub mod json;
mod path;
mod registry;
mod schema;
mod slot;
mod table;
#[cfg(test)]
mod test_support;
/// Textual export/import of slots.
pub mod text;
/// Programmatic helpers for building and querying JSON trees.
pub mod value;
mod walker;
/// XML text codec.
pub mod xml;

/// INI-style config file model and property read/write.
pub use config::ConfigFile;
/// Type descriptors for scalars, containers, structs and classes.
pub use desc::{ClassDesc, EnumDesc, FieldDesc, ScalarKind, StructDesc, TypeDesc};
/// Error and result aliases.
pub use error::{CodecError, Result};
/// Leaf conversion trait and its default implementation.
pub use fallback::{DefaultFallback, PropertyFallback};
/// JSON text layout switch.
pub use json::JsonStyle;
/// Property path used in diagnostics.
pub use path::{PathStep, PropPath};
/// Named descriptor lookup.
pub use registry::{TypeRegistry, TypeEntry};
/// Schema document model.
pub use schema::{ClassDecl, EnumDecl, FieldDecl, SchemaDoc, StructDecl, TypeExpr, VariantDecl};
/// Slot storage types.
pub use slot::{ObjectData, ObjectRef, ScriptArray, ScriptMap, ScriptSet, Slot, StructData};
/// Keyed data table of struct rows.
pub use table::{DataTable, TableRow};
/// Walker entry points and document decode outcome.
pub use walker::{Applied, CLASS_NAME_FIELD, Codec};
