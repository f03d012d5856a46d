use std::{fmt, sync::Arc};

use atomic_refcell::{AtomicRef, AtomicRefCell, AtomicRefMut};
use by_address::ByAddress;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::SerdeError,
    parse::pointer::{SchemaNamespace, SchemaPointer},
};

/// A dereferenced OpenAPI document, either 2.x or 3.x.
///
/// Every struct in this tree carries a flattened `extensions` map, so keys
/// the engine doesn't interpret survive a parse/serialize round trip
/// untouched. The engine types only what it reads: version markers, the
/// schema collections, and the request/response surfaces that establish
/// read/write context.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    /// The OpenAPI 2.x version marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// OpenAPI 2.x named schemas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<IndexMap<String, SchemaNode>>,
    /// OpenAPI 2.x reusable parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, Parameter>>,
    /// OpenAPI 2.x reusable responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<IndexMap<String, Response>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Document {
    /// Parses an OpenAPI document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SerdeError> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml);
        let result = serde_path_to_error::deserialize(deserializer)?;
        Ok(result)
    }

    /// Parses an OpenAPI document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SerdeError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let result = serde_path_to_error::deserialize(&mut deserializer)?;
        Ok(result)
    }

    /// True when the document declares an OpenAPI 2.x (`swagger`) version.
    pub fn is_v2(&self) -> bool {
        self.swagger.is_some()
    }

    /// The section that holds named schemas, if either is present.
    /// `components.schemas` wins when a degenerate document has both.
    pub fn schema_namespace(&self) -> Option<SchemaNamespace> {
        if self.components.as_ref().is_some_and(|c| c.schemas.is_some()) {
            Some(SchemaNamespace::Components)
        } else if self.definitions.is_some() {
            Some(SchemaNamespace::Definitions)
        } else {
            None
        }
    }

    /// The named-schema collection for the active namespace.
    pub fn schemas(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match self.schema_namespace()? {
            SchemaNamespace::Components => self.components.as_ref()?.schemas.as_ref(),
            SchemaNamespace::Definitions => self.definitions.as_ref(),
        }
    }

    pub fn schemas_mut(&mut self) -> Option<&mut IndexMap<String, SchemaNode>> {
        let namespace = self.schema_namespace()?;
        match namespace {
            SchemaNamespace::Components => self.components.as_mut()?.schemas.as_mut(),
            SchemaNamespace::Definitions => self.definitions.as_mut(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// Operation definitions for a single path.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Parameters shared by every operation on this path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOrParameter>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl PathItem {
    /// Returns an iterator over the operations for each HTTP method.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        [
            (Method::Get, self.get.as_ref()),
            (Method::Put, self.put.as_ref()),
            (Method::Post, self.post.as_ref()),
            (Method::Delete, self.delete.as_ref()),
            (Method::Options, self.options.as_ref()),
            (Method::Head, self.head.as_ref()),
            (Method::Patch, self.patch.as_ref()),
            (Method::Trace, self.trace.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|o| (method, o)))
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = (Method, &mut Operation)> {
        [
            (Method::Get, self.get.as_mut()),
            (Method::Put, self.put.as_mut()),
            (Method::Post, self.post.as_mut()),
            (Method::Delete, self.delete.as_mut()),
            (Method::Options, self.options.as_mut()),
            (Method::Head, self.head.as_mut()),
            (Method::Patch, self.patch.as_mut()),
            (Method::Trace, self.trace.as_mut()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|o| (method, o)))
    }
}

/// An HTTP operation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOrParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOrRequestBody>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, RefOrResponse>,
    /// Out-of-band requests this operation may trigger, keyed by callback
    /// name, then by runtime expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<IndexMap<String, RefOrCallback>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// A request parameter. Covers both styles: 3.x `schema`/`content`
/// parameters, and 2.x body parameters (`in: body` with a `schema`).
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Parameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// A request body definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// A response definition. 2.x puts the body schema directly on the
/// response; 3.x nests schemas under `content` media types.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, RefOrHeader>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// A response header definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// Media type content.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// Reusable component definitions (OpenAPI 3.x).
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<IndexMap<String, SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, RefOrParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_bodies: Option<IndexMap<String, RefOrRequestBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<IndexMap<String, RefOrResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, RefOrHeader>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// Either a reference to a component or an inline definition.
///
/// The `Ref` variant is listed first so that untagged deserialization
/// claims any map with a `$ref` key before the inline variant's flattened
/// extensions can swallow it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref(Ref),
    Other(T),
}

/// Either a reference or a parameter definition.
pub type RefOrParameter = RefOr<Parameter>;

/// Either a reference or a request body definition.
pub type RefOrRequestBody = RefOr<RequestBody>;

/// Either a reference or a response definition.
pub type RefOrResponse = RefOr<Response>;

/// Either a reference or a header definition.
pub type RefOrHeader = RefOr<Header>;

/// Either a reference or a callback definition.
pub type RefOrCallback = RefOr<Callback>;

/// A callback definition: path items keyed by runtime expression.
pub type Callback = IndexMap<String, PathItem>;

/// A reference to a component definition. Sibling keys (3.1
/// `summary`/`description` overrides, vendor extensions) are preserved
/// alongside the `$ref`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ref {
    #[serde(rename = "$ref")]
    pub path: SchemaPointer,
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

/// A shared handle to a named top-level schema.
///
/// The document, the usage graph, and the split tables all hold the same
/// allocation, so a mutation through any handle is visible everywhere.
/// Equality and hashing compare the allocation address, not the contents:
/// two structurally identical schemas are still distinct nodes, which is
/// what lets the original-schema sweep tell a replaced collection entry
/// apart from the entry it replaced.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct SchemaNode(ByAddress<Arc<AtomicRefCell<Schema>>>);

impl SchemaNode {
    pub fn new(schema: Schema) -> Self {
        Self(ByAddress(Arc::new(AtomicRefCell::new(schema))))
    }

    pub fn borrow(&self) -> AtomicRef<'_, Schema> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> AtomicRefMut<'_, Schema> {
        self.0.borrow_mut()
    }

    /// Deep-copies the contents into a fresh, unaliased node.
    pub fn detached(&self) -> SchemaNode {
        Self::new(self.borrow().clone())
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaNode").field(&*self.borrow()).finish()
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.borrow().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Schema::deserialize(deserializer).map(Self::new)
    }
}

/// An OpenAPI schema definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    /// A same-document reference. Kept inline rather than behind a wrapper
    /// enum because a `$ref` can sit alongside other keywords, and pruning
    /// can delete the reference while keeping its siblings.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SchemaPointer>,
    #[serde(
        rename = "type",
        deserialize_with = "deserialize_type",
        serialize_with = "serialize_type",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ty: Vec<Ty>,
    #[serde(skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub write_only: bool,

    // Structural keywords: the keywords that can hold child schemas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Schema {
    /// Returns the children stored under `keyword`, if any. `items`
    /// resolves its runtime shape here; a boolean `additionalProperties`
    /// has no children.
    pub fn children(&self, keyword: SchemaKeyword) -> Option<Children<'_>> {
        match keyword {
            SchemaKeyword::AllOf => self.all_of.as_deref().map(Children::List),
            SchemaKeyword::AnyOf => self.any_of.as_deref().map(Children::List),
            SchemaKeyword::OneOf => self.one_of.as_deref().map(Children::List),
            SchemaKeyword::Properties => self.properties.as_ref().map(Children::Map),
            SchemaKeyword::PatternProperties => {
                self.pattern_properties.as_ref().map(Children::Map)
            }
            SchemaKeyword::Not => self.not.as_deref().map(Children::Single),
            SchemaKeyword::AdditionalProperties => match self.additional_properties.as_ref()? {
                AdditionalProperties::Bool(_) => None,
                AdditionalProperties::Schema(schema) => Some(Children::Single(schema)),
            },
            SchemaKeyword::Items => match self.items.as_ref()? {
                Items::One(schema) => Some(Children::Single(schema)),
                Items::Many(items) => Some(Children::List(items)),
            },
        }
    }

    pub fn children_mut(&mut self, keyword: SchemaKeyword) -> Option<ChildrenMut<'_>> {
        match keyword {
            SchemaKeyword::AllOf => self.all_of.as_mut().map(ChildrenMut::List),
            SchemaKeyword::AnyOf => self.any_of.as_mut().map(ChildrenMut::List),
            SchemaKeyword::OneOf => self.one_of.as_mut().map(ChildrenMut::List),
            SchemaKeyword::Properties => self.properties.as_mut().map(ChildrenMut::Map),
            SchemaKeyword::PatternProperties => {
                self.pattern_properties.as_mut().map(ChildrenMut::Map)
            }
            SchemaKeyword::Not => self.not.as_deref_mut().map(ChildrenMut::Single),
            SchemaKeyword::AdditionalProperties => match self.additional_properties.as_mut()? {
                AdditionalProperties::Bool(_) => None,
                AdditionalProperties::Schema(schema) => Some(ChildrenMut::Single(schema)),
            },
            SchemaKeyword::Items => match self.items.as_mut()? {
                Items::One(schema) => Some(ChildrenMut::Single(schema)),
                Items::Many(items) => Some(ChildrenMut::List(items)),
            },
        }
    }

    /// Deletes the keyword and everything under it.
    pub fn remove_children(&mut self, keyword: SchemaKeyword) {
        match keyword {
            SchemaKeyword::AdditionalProperties => self.additional_properties = None,
            SchemaKeyword::AllOf => self.all_of = None,
            SchemaKeyword::AnyOf => self.any_of = None,
            SchemaKeyword::Items => self.items = None,
            SchemaKeyword::Not => self.not = None,
            SchemaKeyword::OneOf => self.one_of = None,
            SchemaKeyword::PatternProperties => self.pattern_properties = None,
            SchemaKeyword::Properties => self.properties = None,
        }
    }

    /// True when any structural keyword is present, including an emptied or
    /// boolean-valued one.
    pub fn has_structural_keywords(&self) -> bool {
        self.properties.is_some()
            || self.pattern_properties.is_some()
            || self.additional_properties.is_some()
            || self.items.is_some()
            || self.all_of.is_some()
            || self.any_of.is_some()
            || self.one_of.is_some()
            || self.not.is_some()
    }
}

/// A structural keyword: a schema keyword whose value holds child schemas.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaKeyword {
    AdditionalProperties,
    AllOf,
    AnyOf,
    Items,
    Not,
    OneOf,
    PatternProperties,
    Properties,
}

impl SchemaKeyword {
    pub const ALL: [SchemaKeyword; 8] = [
        SchemaKeyword::AdditionalProperties,
        SchemaKeyword::AllOf,
        SchemaKeyword::AnyOf,
        SchemaKeyword::Items,
        SchemaKeyword::Not,
        SchemaKeyword::OneOf,
        SchemaKeyword::PatternProperties,
        SchemaKeyword::Properties,
    ];
}

/// A view of the child schemas under one structural keyword.
pub enum Children<'a> {
    List(&'a [Schema]),
    Map(&'a IndexMap<String, Schema>),
    Single(&'a Schema),
}

pub enum ChildrenMut<'a> {
    List(&'a mut Vec<Schema>),
    Map(&'a mut IndexMap<String, Schema>),
    Single(&'a mut Schema),
}

/// A declared schema type.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ty {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    /// OpenAPI 2.x file uploads.
    File,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// `items` takes either a single schema or, in older documents, a list.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Items {
    One(Box<Schema>),
    Many(Vec<Schema>),
}

fn deserialize_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Ty>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TypesOr {
        /// An OpenAPI 3.1-style `type` array.
        Types(Vec<Ty>),
        /// A single `type`.
        Type(Ty),
    }
    Ok(match TypesOr::deserialize(deserializer)? {
        TypesOr::Types(types) => types,
        TypesOr::Type(ty) => vec![ty],
    })
}

/// A single `type` serializes back to the string form it was parsed from.
fn serialize_type<S: Serializer>(types: &[Ty], serializer: S) -> Result<S::Ok, S::Error> {
    match types {
        [ty] => ty.serialize(serializer),
        types => types.serialize(serializer),
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
