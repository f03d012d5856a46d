//! Tests for splitting dual-scope schemas into variants.

use itertools::Itertools;

use crate::{
    graph::SchemaGraph,
    parse::Document,
    tests::assert_matches,
    transform::{ReadWriteConfig, VariantNaming, split_schemas},
};

// MARK: Naming

#[test]
fn test_default_naming() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/Pet'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let split = split_schemas(&graph, &ReadWriteConfig::default());

    assert_eq!(split.len(), 1);
    let entry = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    // The read side keeps the original name; the write side gets the
    // default suffix.
    assert_eq!(entry.read.as_str(), "#/components/schemas/Pet");
    assert_eq!(entry.write.as_str(), "#/components/schemas/PetWritable");
    assert_eq!(
        split.schemas().map(|(name, _)| name.as_str()).collect_vec(),
        ["Pet", "PetWritable"]
    );
}

#[test]
fn test_taken_name_gets_a_suffix() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/Pet'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
            PetWritable:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let split = split_schemas(&graph, &ReadWriteConfig::default());

    let entry = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    assert_eq!(entry.write.as_str(), "#/components/schemas/PetWritable2");
}

#[test]
fn test_name_collisions_ignore_case() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/Pet'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
            petwritable:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let split = split_schemas(&graph, &ReadWriteConfig::default());

    // `petwritable` already folds to the same name, so the variant moves
    // on to the numbered form.
    let entry = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    assert_eq!(entry.write.as_str(), "#/components/schemas/PetWritable2");
}

#[test]
fn test_custom_templates_rename_both_sides() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/Pet'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let config = ReadWriteConfig {
        responses: VariantNaming {
            name: "{name}Output".into(),
            case: None,
        },
        requests: VariantNaming {
            name: "{name}Input".into(),
            case: None,
        },
    };
    let split = split_schemas(&graph, &config);

    let entry = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    assert_eq!(entry.read.as_str(), "#/components/schemas/PetOutput");
    assert_eq!(entry.write.as_str(), "#/components/schemas/PetInput");
    // Neither template yields the original name, so `Pet` isn't replaced
    // and its variants both allocate fresh names.
    assert!(split.entry(&"#/components/schemas/PetOutput".into()).is_none());
}

#[test]
fn test_coinciding_variant_names_stay_unique() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /io:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      allOf:
                        - $ref: '#/components/schemas/Pet'
                        - $ref: '#/components/schemas/Toy'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        anyOf:
                          - $ref: '#/components/schemas/Pet'
                          - $ref: '#/components/schemas/Toy'
        components:
          schemas:
            Pet:
              type: object
            Toy:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    // A static template gives every write variant the same base name.
    let config = ReadWriteConfig {
        responses: VariantNaming::default(),
        requests: VariantNaming {
            name: "Payload".into(),
            case: None,
        },
    };
    let split = split_schemas(&graph, &config);

    let pet = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    let toy = split.entry(&"#/components/schemas/Toy".into()).unwrap();
    assert_eq!(pet.write.as_str(), "#/components/schemas/Payload");
    assert_eq!(toy.write.as_str(), "#/components/schemas/Payload2");
}

#[test]
fn test_identical_templates_still_split() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/Pet'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let config = ReadWriteConfig {
        responses: VariantNaming::default(),
        requests: VariantNaming::default(),
    };
    let split = split_schemas(&graph, &config);

    // Both sides want `Pet`. The read side takes it; the write side can't
    // shadow it, so it numbers off.
    let entry = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    assert_eq!(entry.read.as_str(), "#/components/schemas/Pet");
    assert_eq!(entry.write.as_str(), "#/components/schemas/Pet2");
}

#[test]
fn test_matching_rename_templates_stay_unique() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/Pet'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    // Both sides render to `PetPayload`, and neither matches the original.
    let naming = VariantNaming {
        name: "{name}Payload".into(),
        case: None,
    };
    let config = ReadWriteConfig {
        responses: naming.clone(),
        requests: naming,
    };
    let split = split_schemas(&graph, &config);

    // The read side allocates first; the write side numbers off it.
    let entry = split.entry(&"#/components/schemas/Pet".into()).unwrap();
    assert_eq!(entry.read.as_str(), "#/components/schemas/PetPayload");
    assert_eq!(entry.write.as_str(), "#/components/schemas/PetPayload2");
    assert_eq!(
        split.schemas().map(|(name, _)| name.as_str()).collect_vec(),
        ["PetPayload", "PetPayload2"]
    );
}

// MARK: Variant contents

#[test]
fn test_variants_are_pruned_per_side() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /users:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      $ref: '#/components/schemas/User'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/User'
        components:
          schemas:
            User:
              type: object
              properties:
                id:
                  type: integer
                  readOnly: true
                name:
                  type: string
                password:
                  type: string
                  writeOnly: true
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let split = split_schemas(&graph, &ReadWriteConfig::default());

    let variants: Vec<_> = split
        .schemas()
        .map(|(name, node)| {
            let schema = node.borrow();
            let properties = schema.properties.as_ref().unwrap();
            (name.as_str(), properties.keys().cloned().collect_vec())
        })
        .collect();
    assert_matches!(
        &*variants,
        [("User", read), ("UserWritable", write)]
            if *read == ["id", "name"] && *write == ["name", "password"]
    );
}

#[test]
fn test_single_scope_schemas_are_not_split() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /pets:
            get:
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/Pet'
        components:
          schemas:
            Pet:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let split = split_schemas(&graph, &ReadWriteConfig::default());
    assert!(split.is_empty());
}

#[test]
fn test_reverse_mapping_inverts_the_split() {
    let doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        paths:
          /io:
            post:
              requestBody:
                content:
                  application/json:
                    schema:
                      allOf:
                        - $ref: '#/components/schemas/Pet'
                        - $ref: '#/components/schemas/Toy'
              responses:
                '200':
                  content:
                    application/json:
                      schema:
                        anyOf:
                          - $ref: '#/components/schemas/Pet'
                          - $ref: '#/components/schemas/Toy'
        components:
          schemas:
            Pet:
              type: object
            Toy:
              type: object
    "})
    .unwrap();

    let graph = SchemaGraph::build(&doc);
    let split = split_schemas(&graph, &ReadWriteConfig::default());

    assert_eq!(split.len(), 2);
    for (original, entry) in split.originals() {
        assert_eq!(split.original_of(&entry.read), Some(original));
        assert_eq!(split.original_of(&entry.write), Some(original));
    }
}
