//! Resource dictionaries and indirect-object resolution.
//!
//! Content streams name their fonts, XObjects, colour spaces and so on
//! through a resource dictionary. Nested streams (forms, Type 3 glyphs)
//! bring their own dictionary, which is searched before the parent's.

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::model::objects::{PDFDict, PDFObjRef, PDFObject};

/// Deepest chain of references followed before giving up.
const MAX_REF_CHAIN: usize = 16;

/// Capability for turning an indirect reference into its object.
///
/// Supplied by the document layer; the interpreter never parses file
/// structure itself.
pub trait ObjectResolver: Send + Sync {
    fn resolve(&self, objref: &PDFObjRef) -> Option<PDFObject>;
}

impl<S: BuildHasher + Send + Sync> ObjectResolver for HashMap<PDFObjRef, PDFObject, S> {
    fn resolve(&self, objref: &PDFObjRef) -> Option<PDFObject> {
        self.get(objref).cloned()
    }
}

/// Follow references until a direct object. Unresolvable references
/// become `Null`.
pub fn resolve_object(obj: &PDFObject, resolver: Option<&dyn ObjectResolver>) -> PDFObject {
    let mut current = obj.clone();
    for _ in 0..MAX_REF_CHAIN {
        let PDFObject::Ref(r) = current else {
            return current;
        };
        current = resolver.and_then(|res| res.resolve(&r)).unwrap_or(PDFObject::Null);
    }
    PDFObject::Null
}

/// A located resource: the object plus the reference it was reached
/// through, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub objref: Option<PDFObjRef>,
    pub object: PDFObject,
}

/// Resource dictionaries in scope, innermost last.
#[derive(Debug, Clone, Default)]
pub struct ResourceChain {
    scopes: Vec<PDFDict>,
}

impl ResourceChain {
    pub fn new(root: PDFDict) -> Self {
        Self { scopes: vec![root] }
    }

    pub fn push(&mut self, scope: PDFDict) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<PDFDict> {
        self.scopes.pop()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Find `name` in the `category` subdictionary, innermost scope first.
    pub fn lookup(
        &self,
        category: &str,
        name: &str,
        resolver: Option<&dyn ObjectResolver>,
    ) -> Option<ResourceEntry> {
        self.scopes.iter().rev().find_map(|scope| {
            let sub = resolve_object(scope.get(category)?, resolver);
            let entry = sub.as_dict().ok()?.get(name)?;
            let objref = match entry {
                PDFObject::Ref(r) => Some(*r),
                _ => None,
            };
            let object = resolve_object(entry, resolver);
            if object.is_null() {
                return None;
            }
            Some(ResourceEntry { objref, object })
        })
    }
}
