use std::borrow::Cow;

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToTitleCase, ToTrainCase,
    ToUpperCamelCase,
};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    graph::{Scope, SchemaGraph},
    parse::{SchemaNode, SchemaPointer},
    transform::{prune::prune_schema, unique::UniqueNames},
};

/// Naming for the read and write variants of a split schema.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReadWriteConfig {
    /// Names for the variants that responses see.
    pub responses: VariantNaming,
    /// Names for the variants that requests send.
    pub requests: VariantNaming,
}

impl Default for ReadWriteConfig {
    fn default() -> Self {
        Self {
            responses: VariantNaming::default(),
            requests: VariantNaming {
                name: "{name}Writable".into(),
                case: None,
            },
        }
    }
}

/// A naming template for one variant side. The template's `{name}`
/// placeholder expands to the original schema name.
///
/// # Examples
///
/// ```
/// # use dimorph::transform::{NameCase, VariantNaming};
/// let naming = VariantNaming {
///     name: "{name}Writable".into(),
///     case: Some(NameCase::Pascal),
/// };
/// assert_eq!(naming.build("user_profile"), "UserProfileWritable");
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VariantNaming {
    pub name: String,
    pub case: Option<NameCase>,
}

impl VariantNaming {
    /// Expands the template for `name`, then applies the case
    /// transformation, if there is one.
    pub fn build(&self, name: &str) -> String {
        let built = self.name.replace("{name}", name);
        match self.case {
            Some(case) => case.apply(&built),
            None => built,
        }
    }
}

impl Default for VariantNaming {
    fn default() -> Self {
        Self {
            name: "{name}".into(),
            case: None,
        }
    }
}

/// A case convention for generated schema names.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum NameCase {
    Camel,
    Kebab,
    Pascal,
    ShoutySnake,
    Snake,
    Title,
    Train,
}

impl NameCase {
    fn apply(self, name: &str) -> String {
        match self {
            NameCase::Camel => name.to_lower_camel_case(),
            NameCase::Kebab => name.to_kebab_case(),
            NameCase::Pascal => name.to_upper_camel_case(),
            NameCase::ShoutySnake => name.to_shouty_snake_case(),
            NameCase::Snake => name.to_snake_case(),
            NameCase::Title => name.to_title_case(),
            NameCase::Train => name.to_train_case(),
        }
    }
}

/// Where the variants of one split schema live.
#[derive(Debug)]
pub struct SplitEntry {
    pub read: SchemaPointer,
    pub write: SchemaPointer,
}

impl SplitEntry {
    /// The variant pointer for one side.
    pub fn side(&self, scope: Scope) -> &SchemaPointer {
        match scope {
            Scope::Read => &self.read,
            Scope::Write => &self.write,
        }
    }
}

/// The outcome of splitting every dual-scope schema in a document.
#[derive(Debug, Default)]
pub struct SplitSchemas {
    /// Each split original, mapped to the pointers of its variants.
    mapping: IndexMap<SchemaPointer, SplitEntry>,
    /// Each variant pointer, mapped back to the original it came from.
    reverse_mapping: IndexMap<SchemaPointer, SchemaPointer>,
    /// The variant schemas, by name, in allocation order.
    schemas: IndexMap<String, SchemaNode>,
}

impl SplitSchemas {
    /// Looks up the variants of a split original.
    #[inline]
    pub fn entry(&self, original: &SchemaPointer) -> Option<&SplitEntry> {
        self.mapping.get(original)
    }

    /// Looks up the original a variant was split from.
    #[inline]
    pub fn original_of(&self, variant: &SchemaPointer) -> Option<&SchemaPointer> {
        self.reverse_mapping.get(variant)
    }

    /// Returns an iterator over the split originals and their variants.
    pub fn originals(&self) -> impl Iterator<Item = (&SchemaPointer, &SplitEntry)> {
        self.mapping.iter()
    }

    /// Returns an iterator over the variant schemas, in allocation order.
    pub fn schemas(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Splits every schema that both requests and responses use into a read
/// variant and a write variant.
///
/// Variant names come from the `config` templates; a name that's already
/// taken gets a numeric suffix. With the default templates, the read
/// variant keeps the original name and replaces the original in the
/// collection, so purely-read consumers are untouched.
pub fn split_schemas(graph: &SchemaGraph, config: &ReadWriteConfig) -> SplitSchemas {
    let Some(namespace) = graph.namespace() else {
        return SplitSchemas::default();
    };
    let mut names = UniqueNames::with_reserved(
        graph
            .iter()
            .filter_map(|(pointer, _)| pointer.schema_name(namespace))
            .map(Cow::into_owned),
    );

    let mut split = SplitSchemas::default();
    for (pointer, node) in graph.iter() {
        if !node.scopes.is_dual() {
            continue;
        }
        let Some(name) = pointer.schema_name(namespace) else {
            continue;
        };

        // The read variant prunes write-only content, and the write
        // variant prunes read-only content.
        let mut read_schema = node.node.borrow().clone();
        prune_schema(graph, &mut read_schema, Scope::Write);
        let mut write_schema = node.node.borrow().clone();
        prune_schema(graph, &mut write_schema, Scope::Read);

        // A variant whose template yields the original name takes that
        // name over, replacing the original in the collection. Anything
        // else allocates a fresh name.
        let read_base = config.responses.build(&name);
        let write_base = config.requests.build(&name);
        let read_name = if read_base == *name {
            read_base
        } else {
            names.allocate(&read_base)
        };
        let write_name = if write_base == *name && write_base != read_name {
            write_base
        } else {
            names.allocate(&write_base)
        };

        let read_pointer = SchemaPointer::schema(namespace, &read_name);
        let write_pointer = SchemaPointer::schema(namespace, &write_name);
        split
            .reverse_mapping
            .insert(read_pointer.clone(), pointer.clone());
        split
            .reverse_mapping
            .insert(write_pointer.clone(), pointer.clone());
        split.schemas.insert(read_name, SchemaNode::new(read_schema));
        split
            .schemas
            .insert(write_name, SchemaNode::new(write_schema));
        split.mapping.insert(
            pointer.clone(),
            SplitEntry {
                read: read_pointer,
                write: write_pointer,
            },
        );
    }
    split
}
