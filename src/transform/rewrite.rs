use tracing::debug;

use crate::{
    graph::{Scope, SchemaGraph},
    parse::{
        ChildrenMut, Document, Header, Parameter, PathItem, RefOr, RequestBody, Response, Schema,
        SchemaKeyword, SchemaPointer,
    },
    transform::split::SplitSchemas,
};

/// Repoints every `$ref` to a split schema at the variant the reference's
/// context calls for: the write variant under a request, the read variant
/// under a response.
///
/// A named schema's subtree takes the context its own collection entry
/// implies. A split variant uses its side; an untouched schema uses its
/// usage scope when that's unambiguous; anything else is neutral, and a
/// neutral reference to a split schema takes the write side so that it
/// never dangles once the original is gone.
pub fn rewrite_refs(doc: &mut Document, graph: &SchemaGraph, split: &SplitSchemas) {
    if split.is_empty() {
        return;
    }
    let rewriter = RefRewriter { graph, split };

    if let (Some(namespace), Some(schemas)) = (graph.namespace(), doc.schemas()) {
        for (name, node) in schemas {
            let pointer = SchemaPointer::schema(namespace, name);
            // An original that neither variant replaced is about to be
            // deleted; leave its contents be.
            if rewriter.is_doomed_original(&pointer) {
                continue;
            }
            let context = rewriter.entry_context(&pointer);
            let mut schema = node.borrow_mut();
            rewriter.rewrite_schema(&mut schema, context);
        }
    }

    // Inline request and response surfaces carry their positional
    // contexts, mirroring how the graph classified them.
    if let Some(components) = &mut doc.components {
        for parameter in components.parameters.iter_mut().flat_map(|p| p.values_mut()) {
            if let RefOr::Other(parameter) = parameter {
                rewriter.rewrite_parameter(parameter);
            }
        }
        for body in components.request_bodies.iter_mut().flat_map(|b| b.values_mut()) {
            if let RefOr::Other(body) = body {
                rewriter.rewrite_request_body(body);
            }
        }
        for response in components.responses.iter_mut().flat_map(|r| r.values_mut()) {
            if let RefOr::Other(response) = response {
                rewriter.rewrite_response(response);
            }
        }
        for header in components.headers.iter_mut().flat_map(|h| h.values_mut()) {
            if let RefOr::Other(header) = header {
                rewriter.rewrite_header(header);
            }
        }
    }
    for parameter in doc.parameters.iter_mut().flat_map(|p| p.values_mut()) {
        rewriter.rewrite_parameter(parameter);
    }
    for response in doc.responses.iter_mut().flat_map(|r| r.values_mut()) {
        rewriter.rewrite_response(response);
    }
    for item in doc.paths.values_mut() {
        rewriter.rewrite_path_item(item);
    }
}

struct RefRewriter<'a> {
    graph: &'a SchemaGraph,
    split: &'a SplitSchemas,
}

impl RefRewriter<'_> {
    /// True for a split original that no variant replaced in the
    /// collection.
    fn is_doomed_original(&self, pointer: &SchemaPointer) -> bool {
        self.split.original_of(pointer).is_none() && self.split.entry(pointer).is_some()
    }

    /// The context a named schema's subtree is rewritten under.
    fn entry_context(&self, pointer: &SchemaPointer) -> Option<Scope> {
        // A variant takes the context of its side.
        if let Some(original) = self.split.original_of(pointer) {
            let entry = self.split.entry(original)?;
            return Some(if entry.read == *pointer {
                Scope::Read
            } else {
                Scope::Write
            });
        }
        // An untouched schema takes the context its usage implies, when
        // the usage is unambiguous.
        let scopes = self.graph.scopes(pointer)?;
        if scopes.is_exactly(Scope::Read) {
            Some(Scope::Read)
        } else if scopes.is_exactly(Scope::Write) {
            Some(Scope::Write)
        } else {
            None
        }
    }

    fn rewrite_path_item(&self, item: &mut PathItem) {
        for parameter in &mut item.parameters {
            if let RefOr::Other(parameter) = parameter {
                self.rewrite_parameter(parameter);
            }
        }
        for (_, operation) in item.operations_mut() {
            for parameter in &mut operation.parameters {
                if let RefOr::Other(parameter) = parameter {
                    self.rewrite_parameter(parameter);
                }
            }
            if let Some(RefOr::Other(body)) = &mut operation.request_body {
                self.rewrite_request_body(body);
            }
            for response in operation.responses.values_mut() {
                if let RefOr::Other(response) = response {
                    self.rewrite_response(response);
                }
            }
            for callback in operation.callbacks.iter_mut().flat_map(|c| c.values_mut()) {
                if let RefOr::Other(callback) = callback {
                    for item in callback.values_mut() {
                        self.rewrite_path_item(item);
                    }
                }
            }
        }
    }

    fn rewrite_parameter(&self, parameter: &mut Parameter) {
        if let Some(schema) = &mut parameter.schema {
            self.rewrite_schema(schema, Some(Scope::Write));
        }
        for media_type in parameter.content.iter_mut().flat_map(|c| c.values_mut()) {
            if let Some(schema) = &mut media_type.schema {
                self.rewrite_schema(schema, Some(Scope::Write));
            }
        }
    }

    fn rewrite_request_body(&self, body: &mut RequestBody) {
        for media_type in body.content.iter_mut().flat_map(|c| c.values_mut()) {
            if let Some(schema) = &mut media_type.schema {
                self.rewrite_schema(schema, Some(Scope::Write));
            }
        }
    }

    fn rewrite_response(&self, response: &mut Response) {
        if let Some(schema) = &mut response.schema {
            self.rewrite_schema(schema, Some(Scope::Read));
        }
        for media_type in response.content.iter_mut().flat_map(|c| c.values_mut()) {
            if let Some(schema) = &mut media_type.schema {
                self.rewrite_schema(schema, Some(Scope::Read));
            }
        }
        for header in response.headers.iter_mut().flat_map(|h| h.values_mut()) {
            if let RefOr::Other(header) = header {
                self.rewrite_header(header);
            }
        }
    }

    fn rewrite_header(&self, header: &mut Header) {
        if let Some(schema) = &mut header.schema {
            self.rewrite_schema(schema, Some(Scope::Read));
        }
        for media_type in header.content.iter_mut().flat_map(|c| c.values_mut()) {
            if let Some(schema) = &mut media_type.schema {
                self.rewrite_schema(schema, Some(Scope::Read));
            }
        }
    }

    fn rewrite_schema(&self, schema: &mut Schema, context: Option<Scope>) {
        if let Some(reference) = &schema.reference {
            if let Some(entry) = self.split.entry(reference) {
                let side = match context {
                    Some(scope) => scope,
                    None => {
                        debug!(
                            reference = %reference,
                            "Neutral reference to a split schema, taking the write side."
                        );
                        Scope::Write
                    }
                };
                schema.reference = Some(entry.side(side).clone());
            }
        }
        for keyword in SchemaKeyword::ALL {
            match schema.children_mut(keyword) {
                Some(ChildrenMut::List(children)) => {
                    for child in children {
                        self.rewrite_schema(child, context);
                    }
                }
                Some(ChildrenMut::Map(children)) => {
                    for child in children.values_mut() {
                        self.rewrite_schema(child, context);
                    }
                }
                Some(ChildrenMut::Single(child)) => self.rewrite_schema(child, context),
                None => {}
            }
        }
    }
}
