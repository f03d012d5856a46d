use crate::{
    graph::{Scope, SchemaGraph},
    parse::{ChildrenMut, Schema, SchemaKeyword, Ty},
};

/// Strips everything in `schema` that belongs only to the `excluded`
/// scope. Pruning with [`Scope::Write`] excluded yields the read variant,
/// and the other way around.
///
/// Returns true when the pruned schema is an empty shell that the caller
/// should drop from its parent.
pub fn prune_schema(graph: &SchemaGraph, schema: &mut Schema, excluded: Scope) -> bool {
    // A reference to a schema used only in the excluded scope is deleted.
    // Sibling keywords survive on their own; without siblings, the whole
    // node goes.
    if let Some(reference) = &schema.reference {
        let excludes_target = graph
            .scopes(reference)
            .is_some_and(|scopes| scopes.is_exactly(excluded));
        if excludes_target {
            schema.reference = None;
            if !schema.has_structural_keywords() {
                return true;
            }
        }
    }

    for keyword in SchemaKeyword::ALL {
        let Some(children) = schema.children_mut(keyword) else {
            continue;
        };
        let emptied = match children {
            ChildrenMut::List(children) => {
                children.retain_mut(|child| {
                    !(flagged(child, excluded) || prune_schema(graph, child, excluded))
                });
                children.is_empty()
            }
            ChildrenMut::Map(children) => {
                children.retain(|_, child| {
                    !(flagged(child, excluded) || prune_schema(graph, child, excluded))
                });
                children.is_empty()
            }
            ChildrenMut::Single(child) => {
                flagged(child, excluded) || prune_schema(graph, child, excluded)
            }
        };
        if emptied {
            schema.remove_children(keyword);
        }
    }

    // A plain object with nothing left under it carries no information,
    // so the parent drops it. Anything else, even an empty `{}`, stays.
    matches!(schema.ty[..], [Ty::Object]) && !schema.has_structural_keywords()
}

/// True when the schema is marked as belonging only to the excluded
/// scope. A flagged child is dropped whole, without recursing into it.
fn flagged(schema: &Schema, excluded: Scope) -> bool {
    match excluded {
        Scope::Read => schema.read_only,
        Scope::Write => schema.write_only,
    }
}
