use indexmap::IndexMap;

use crate::parse::{Document, Info, Parameter, RefOr, RequestBody, Response, Schema};

/// Rewrites the declared OpenAPI version string.
pub type VersionPatch = Box<dyn FnMut(&str) -> String>;

/// Edits the document's `info` block.
pub type MetaPatch = Box<dyn FnMut(&mut Info)>;

/// Edits one named schema in place.
pub type SchemaPatch = Box<dyn FnMut(&mut Schema)>;

/// Edits one reusable parameter in place.
pub type ParameterPatch = Box<dyn FnMut(&mut Parameter)>;

/// Edits one reusable request body in place.
pub type RequestBodyPatch = Box<dyn FnMut(&mut RequestBody)>;

/// Edits one reusable response in place.
pub type ResponsePatch = Box<dyn FnMut(&mut Response)>;

/// Targeted edits to apply to a document before transforming it, for
/// specs that are broken or awkward at the source.
///
/// Component patches are keyed by name and apply only where the document
/// defines that name inline; a name the document doesn't define is
/// skipped.
#[derive(Default)]
pub struct SpecPatch {
    pub version: Option<VersionPatch>,
    pub meta: Option<MetaPatch>,
    pub schemas: IndexMap<String, SchemaPatch>,
    /// 3.x only; a 2.x document ignores these.
    pub parameters: IndexMap<String, ParameterPatch>,
    /// 3.x only; a 2.x document ignores these.
    pub request_bodies: IndexMap<String, RequestBodyPatch>,
    /// 3.x only; a 2.x document ignores these.
    pub responses: IndexMap<String, ResponsePatch>,
}

/// Applies `patch` to a parsed document.
pub fn patch_spec(doc: &mut Document, patch: &mut SpecPatch) {
    if doc.is_v2() {
        if let Some(version) = &mut patch.version {
            if let Some(swagger) = &doc.swagger {
                let patched = version(swagger);
                doc.swagger = Some(patched);
            }
        }
        if let Some(meta) = &mut patch.meta {
            if let Some(info) = &mut doc.info {
                meta(info);
            }
        }
        if let Some(definitions) = &doc.definitions {
            for (name, patcher) in &mut patch.schemas {
                if let Some(node) = definitions.get(name) {
                    patcher(&mut node.borrow_mut());
                }
            }
        }
        return;
    }

    if let Some(version) = &mut patch.version {
        if let Some(openapi) = &doc.openapi {
            let patched = version(openapi);
            doc.openapi = Some(patched);
        }
    }
    if let Some(meta) = &mut patch.meta {
        if let Some(info) = &mut doc.info {
            meta(info);
        }
    }
    let Some(components) = &mut doc.components else {
        return;
    };
    if let Some(schemas) = &components.schemas {
        for (name, patcher) in &mut patch.schemas {
            if let Some(node) = schemas.get(name) {
                patcher(&mut node.borrow_mut());
            }
        }
    }
    if let Some(parameters) = &mut components.parameters {
        for (name, patcher) in &mut patch.parameters {
            if let Some(RefOr::Other(parameter)) = parameters.get_mut(name) {
                patcher(parameter);
            }
        }
    }
    if let Some(request_bodies) = &mut components.request_bodies {
        for (name, patcher) in &mut patch.request_bodies {
            if let Some(RefOr::Other(body)) = request_bodies.get_mut(name) {
                patcher(body);
            }
        }
    }
    if let Some(responses) = &mut components.responses {
        for (name, patcher) in &mut patch.responses {
            if let Some(RefOr::Other(response)) = responses.get_mut(name) {
                patcher(response);
            }
        }
    }
}
