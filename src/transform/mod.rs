mod patch;
mod prune;
mod rewrite;
mod split;
mod unique;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    graph::SchemaGraph,
    parse::{Document, SchemaNode, SchemaPointer},
};

pub use patch::{
    MetaPatch, ParameterPatch, RequestBodyPatch, ResponsePatch, SchemaPatch, SpecPatch,
    VersionPatch, patch_spec,
};
pub use prune::prune_schema;
pub use rewrite::rewrite_refs;
pub use split::{
    NameCase, ReadWriteConfig, SplitEntry, SplitSchemas, VariantNaming, split_schemas,
};
pub use unique::UniqueNames;

/// Splits every schema that's used by both requests and responses into a
/// read variant and a write variant, repoints every reference at the side
/// its context calls for, and drops the split originals.
///
/// The transform is idempotent: a transformed document has no dual-scope
/// schemas left, so a second run changes nothing.
pub fn split_read_write(doc: &mut Document, config: &ReadWriteConfig) {
    let graph = SchemaGraph::build(doc);
    let originals = capture_original_schemas(doc);
    let split = split_schemas(&graph, config);
    if split.is_empty() {
        return;
    }
    insert_split_schemas(doc, &split);
    rewrite_refs(doc, &graph, &split);
    remove_original_schemas(doc, &split, &originals);
    debug!(schemas = split.len(), "Split read/write schema variants.");
}

/// Captures each named schema's handle by pointer, before any variant is
/// inserted. The final sweep deletes an entry only while it still holds
/// the captured handle, so a variant that took over a name survives.
fn capture_original_schemas(doc: &Document) -> IndexMap<SchemaPointer, SchemaNode> {
    let mut originals = IndexMap::new();
    if let (Some(namespace), Some(schemas)) = (doc.schema_namespace(), doc.schemas()) {
        for (name, node) in schemas {
            originals.insert(SchemaPointer::schema(namespace, name), node.clone());
        }
    }
    originals
}

/// Inserts the variant schemas into the document's collection. Inserting
/// over an existing name replaces the entry without moving it.
fn insert_split_schemas(doc: &mut Document, split: &SplitSchemas) {
    let Some(schemas) = doc.schemas_mut() else {
        return;
    };
    for (name, node) in split.schemas() {
        schemas.insert(name.clone(), node.clone());
    }
}

/// Deletes the split originals from the collection, comparing handles so
/// that only a captured original goes, never a variant that reused its
/// name.
fn remove_original_schemas(
    doc: &mut Document,
    split: &SplitSchemas,
    originals: &IndexMap<SchemaPointer, SchemaNode>,
) {
    let Some(schemas) = doc.schemas_mut() else {
        return;
    };
    for (pointer, _) in split.originals() {
        let Some(original) = originals.get(pointer) else {
            continue;
        };
        let name = pointer.name();
        if schemas.get(name.as_ref()) == Some(original) {
            schemas.shift_remove(name.as_ref());
        }
    }
}
