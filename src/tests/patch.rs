//! Tests for user-supplied document patches.

use crate::{
    parse::{Document, RefOr},
    transform::{SpecPatch, patch_spec},
};

// MARK: 3.x documents

#[test]
fn test_v3_patches_apply() {
    let mut doc = Document::from_yaml(indoc::indoc! {"
        openapi: 3.0.0
        info:
          title: Test
          version: 1.0.0
        components:
          parameters:
            Filter:
              name: filter
              in: query
          requestBodies:
            CreatePet:
              content:
                application/json:
                  schema:
                    type: object
          responses:
            PetResponse:
              content:
                application/json:
                  schema:
                    type: object
          schemas:
            Pet:
              type: object
    "})
    .unwrap();

    let mut patch = SpecPatch {
        version: Some(Box::new(|version| format!("{version}+patched"))),
        meta: Some(Box::new(|info| info.title = Some("Patched".into()))),
        ..SpecPatch::default()
    };
    patch
        .schemas
        .insert("Pet".into(), Box::new(|schema| schema.read_only = true));
    patch.schemas.insert(
        "Missing".into(),
        Box::new(|_| panic!("patched a schema that doesn't exist")),
    );
    patch.parameters.insert(
        "Filter".into(),
        Box::new(|parameter| parameter.name = Some("renamed".into())),
    );
    patch
        .request_bodies
        .insert("CreatePet".into(), Box::new(|body| body.content = None));
    patch
        .responses
        .insert("PetResponse".into(), Box::new(|response| response.content = None));

    patch_spec(&mut doc, &mut patch);

    assert_eq!(doc.openapi.as_deref(), Some("3.0.0+patched"));
    assert_eq!(
        doc.info.as_ref().unwrap().title.as_deref(),
        Some("Patched")
    );
    assert!(doc.schemas().unwrap()["Pet"].borrow().read_only);

    let components = doc.components.as_ref().unwrap();
    let Some(RefOr::Other(parameter)) = components.parameters.as_ref().unwrap().get("Filter")
    else {
        panic!("expected an inline parameter");
    };
    assert_eq!(parameter.name.as_deref(), Some("renamed"));
    let Some(RefOr::Other(body)) = components.request_bodies.as_ref().unwrap().get("CreatePet")
    else {
        panic!("expected an inline request body");
    };
    assert!(body.content.is_none());
    let Some(RefOr::Other(response)) = components.responses.as_ref().unwrap().get("PetResponse")
    else {
        panic!("expected an inline response");
    };
    assert!(response.content.is_none());
}

// MARK: 2.x documents

#[test]
fn test_v2_patches_apply_to_definitions() {
    let mut doc = Document::from_yaml(indoc::indoc! {"
        swagger: '2.0'
        info:
          title: Test
          version: 1.0.0
        definitions:
          Pet:
            type: object
    "})
    .unwrap();

    let mut patch = SpecPatch {
        version: Some(Box::new(|version| format!("{version}+patched"))),
        ..SpecPatch::default()
    };
    patch
        .schemas
        .insert("Pet".into(), Box::new(|schema| schema.read_only = true));

    patch_spec(&mut doc, &mut patch);

    assert_eq!(doc.swagger.as_deref(), Some("2.0+patched"));
    assert!(doc.schemas().unwrap()["Pet"].borrow().read_only);
}

#[test]
fn test_v2_ignores_component_patches() {
    let mut doc = Document::from_yaml(indoc::indoc! {"
        swagger: '2.0'
        info:
          title: Test
          version: 1.0.0
        parameters:
          Body:
            name: payload
            in: body
    "})
    .unwrap();

    let mut patch = SpecPatch::default();
    patch.parameters.insert(
        "Body".into(),
        Box::new(|_| panic!("component patches shouldn't reach a 2.x document")),
    );

    patch_spec(&mut doc, &mut patch);

    let parameter = &doc.parameters.as_ref().unwrap()["Body"];
    assert_eq!(parameter.name.as_deref(), Some("payload"));
}
