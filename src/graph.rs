use std::fmt;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use tracing::warn;

use crate::parse::{
    Children, Document, Header, Parameter, PathItem, RefOr, RequestBody, Response, Schema,
    SchemaKeyword, SchemaNamespace, SchemaNode, SchemaPointer,
};

/// The direction a schema flows in: to the server or from it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Scope {
    /// Reachable from a response surface.
    Read,
    /// Reachable from a request surface.
    Write,
}

impl Scope {
    fn bit(self) -> u8 {
        match self {
            Scope::Read => 1 << 0,
            Scope::Write => 1 << 1,
        }
    }
}

/// The set of scopes a schema is used under.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct ScopeSet(u8);

impl ScopeSet {
    pub const EMPTY: ScopeSet = ScopeSet(0);

    pub fn insert(&mut self, scope: Scope) {
        self.0 |= scope.bit();
    }

    pub fn contains(self, scope: Scope) -> bool {
        self.0 & scope.bit() != 0
    }

    /// True when no request or response reaches the schema.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when the schema is used under `scope` and nothing else.
    pub fn is_exactly(self, scope: Scope) -> bool {
        self.0 == scope.bit()
    }

    /// True when the schema is used under both scopes, making it a
    /// candidate for splitting.
    pub fn is_dual(self) -> bool {
        self.contains(Scope::Read) && self.contains(Scope::Write)
    }
}

impl fmt::Debug for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries([Scope::Read, Scope::Write].into_iter().filter(|&s| self.contains(s)))
            .finish()
    }
}

/// A named schema and the scopes it's used under.
#[derive(Debug)]
pub struct GraphNode {
    pub node: SchemaNode,
    pub scopes: ScopeSet,
}

/// How every named schema in a document is used.
///
/// Built by walking each request and response surface and propagating the
/// surface's scope through `$ref`s: a schema reachable from a request gets
/// [`Scope::Write`], one reachable from a response gets [`Scope::Read`],
/// and one reachable from both gets both.
#[derive(Debug)]
pub struct SchemaGraph {
    namespace: Option<SchemaNamespace>,
    nodes: IndexMap<SchemaPointer, GraphNode>,
    dangling: IndexSet<SchemaPointer>,
}

impl SchemaGraph {
    pub fn build(doc: &Document) -> Self {
        let namespace = doc.schema_namespace();
        let mut nodes = IndexMap::new();
        if let (Some(namespace), Some(schemas)) = (namespace, doc.schemas()) {
            for (name, node) in schemas {
                nodes.insert(
                    SchemaPointer::schema(namespace, name),
                    GraphNode {
                        node: node.clone(),
                        scopes: ScopeSet::EMPTY,
                    },
                );
            }
        }
        let mut builder = GraphBuilder {
            doc,
            nodes,
            visited: FxHashSet::default(),
            dangling: IndexSet::new(),
        };
        builder.walk_roots();
        Self {
            namespace,
            nodes: builder.nodes,
            dangling: builder.dangling,
        }
    }

    /// The section the named schemas live in, if the document has one.
    pub fn namespace(&self) -> Option<SchemaNamespace> {
        self.namespace
    }

    #[inline]
    pub fn get(&self, pointer: &SchemaPointer) -> Option<&GraphNode> {
        self.nodes.get(pointer)
    }

    /// Looks up the usage scopes for a named schema.
    #[inline]
    pub fn scopes(&self, pointer: &SchemaPointer) -> Option<ScopeSet> {
        self.nodes.get(pointer).map(|node| node.scopes)
    }

    /// Returns an iterator over all named schemas, in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&SchemaPointer, &GraphNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// References that point to schemas the document doesn't define.
    pub fn dangling(&self) -> impl Iterator<Item = &SchemaPointer> {
        self.dangling.iter()
    }
}

struct GraphBuilder<'a> {
    doc: &'a Document,
    nodes: IndexMap<SchemaPointer, GraphNode>,
    /// (pointer, scope) pairs whose referents have already been walked,
    /// so that reference cycles terminate.
    visited: FxHashSet<(SchemaPointer, Scope)>,
    dangling: IndexSet<SchemaPointer>,
}

impl GraphBuilder<'_> {
    fn walk_roots(&mut self) {
        let doc = self.doc;

        // Named schema trees first, without a scope. This pass classifies
        // nothing; it surfaces references to undefined schemas even when
        // no operation reaches them.
        if let Some(schemas) = doc.schemas() {
            for node in schemas.values() {
                let schema = node.borrow();
                self.walk_schema(&schema, None);
            }
        }

        // Reusable components carry their natural scope: parameters and
        // request bodies are written by the client, responses and headers
        // are read back.
        if let Some(components) = &doc.components {
            for parameter in components.parameters.iter().flat_map(|p| p.values()) {
                if let RefOr::Other(parameter) = parameter {
                    self.walk_parameter(parameter);
                }
            }
            for body in components.request_bodies.iter().flat_map(|b| b.values()) {
                if let RefOr::Other(body) = body {
                    self.walk_request_body(body);
                }
            }
            for response in components.responses.iter().flat_map(|r| r.values()) {
                if let RefOr::Other(response) = response {
                    self.walk_response(response);
                }
            }
            for header in components.headers.iter().flat_map(|h| h.values()) {
                if let RefOr::Other(header) = header {
                    self.walk_header(header);
                }
            }
        }

        // The 2.x reusable sections.
        for parameter in doc.parameters.iter().flat_map(|p| p.values()) {
            self.walk_parameter(parameter);
        }
        for response in doc.responses.iter().flat_map(|r| r.values()) {
            self.walk_response(response);
        }

        for item in doc.paths.values() {
            self.walk_path_item(item);
        }
    }

    fn walk_path_item(&mut self, item: &PathItem) {
        // A `Ref` in a component position points at a reusable component,
        // and every reusable component is already walked as a root.
        for parameter in item.parameters.iter().filter_map(inline) {
            self.walk_parameter(parameter);
        }
        for (_, operation) in item.operations() {
            for parameter in operation.parameters.iter().filter_map(inline) {
                self.walk_parameter(parameter);
            }
            if let Some(body) = operation.request_body.as_ref().and_then(inline) {
                self.walk_request_body(body);
            }
            for response in operation.responses.values().filter_map(inline) {
                self.walk_response(response);
            }
            for callback in operation.callbacks.iter().flat_map(|c| c.values()) {
                if let RefOr::Other(callback) = callback {
                    for item in callback.values() {
                        self.walk_path_item(item);
                    }
                }
            }
        }
    }

    fn walk_parameter(&mut self, parameter: &Parameter) {
        if let Some(schema) = &parameter.schema {
            self.walk_schema(schema, Some(Scope::Write));
        }
        if let Some(content) = &parameter.content {
            for media_type in content.values() {
                if let Some(schema) = &media_type.schema {
                    self.walk_schema(schema, Some(Scope::Write));
                }
            }
        }
    }

    fn walk_request_body(&mut self, body: &RequestBody) {
        for media_type in body.content.iter().flat_map(|c| c.values()) {
            if let Some(schema) = &media_type.schema {
                self.walk_schema(schema, Some(Scope::Write));
            }
        }
    }

    fn walk_response(&mut self, response: &Response) {
        if let Some(schema) = &response.schema {
            self.walk_schema(schema, Some(Scope::Read));
        }
        for media_type in response.content.iter().flat_map(|c| c.values()) {
            if let Some(schema) = &media_type.schema {
                self.walk_schema(schema, Some(Scope::Read));
            }
        }
        for header in response.headers.iter().flat_map(|h| h.values()) {
            if let RefOr::Other(header) = header {
                self.walk_header(header);
            }
        }
    }

    fn walk_header(&mut self, header: &Header) {
        if let Some(schema) = &header.schema {
            self.walk_schema(schema, Some(Scope::Read));
        }
        for media_type in header.content.iter().flat_map(|c| c.values()) {
            if let Some(schema) = &media_type.schema {
                self.walk_schema(schema, Some(Scope::Read));
            }
        }
    }

    fn walk_schema(&mut self, schema: &Schema, context: Option<Scope>) {
        if let Some(reference) = &schema.reference {
            self.walk_reference(reference, context);
        }
        for keyword in SchemaKeyword::ALL {
            match schema.children(keyword) {
                Some(Children::List(children)) => {
                    for child in children {
                        self.walk_schema(child, context);
                    }
                }
                Some(Children::Map(children)) => {
                    for child in children.values() {
                        self.walk_schema(child, context);
                    }
                }
                Some(Children::Single(child)) => self.walk_schema(child, context),
                None => {}
            }
        }
    }

    fn walk_reference(&mut self, reference: &SchemaPointer, context: Option<Scope>) {
        let Some(target) = self.nodes.get_mut(reference) else {
            if self.dangling.insert(reference.clone()) {
                warn!(reference = %reference, "Reference to an undefined schema.");
            }
            return;
        };
        let Some(scope) = context else { return };
        target.scopes.insert(scope);
        // The referent picks up this scope transitively. Clone the handle
        // first so the walk doesn't hold a borrow of the node table.
        let node = target.node.clone();
        if self.visited.insert((reference.clone(), scope)) {
            let referent = node.borrow();
            self.walk_schema(&referent, context);
        }
    }
}

/// Extracts the inline definition from a component entry, if it is one.
fn inline<T>(entry: &RefOr<T>) -> Option<&T> {
    match entry {
        RefOr::Ref(_) => None,
        RefOr::Other(value) => Some(value),
    }
}
