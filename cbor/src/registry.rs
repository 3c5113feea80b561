/*!
The encoder's handler registry.

Handlers are looked up in three phases: an exact match on the value's
[`TypeId`], then an insertion-order walk that lazily resolves deferred
`(module, name)` entries through the caller's [`TypeLoader`] and tests each
resolved entry's instance predicate, and finally the encoder's default
handler. A fall-through hit is memoized as a direct entry so the next value
of the same concrete type matches in the first phase.

Deferred entries exist so that a handler for a type can be registered
without pulling in the library that defines it; the loader is only invoked
once a value actually needs the entry.
*/

use std::any::TypeId;
use std::rc::Rc;

use crate::value::{CustomValue, Kind};

/// How a handler entry is keyed.
#[derive(Clone)]
pub enum TypeKey {
    /// One of the built-in value kinds. Only consulted in the custom
    /// encoding style, where built-in emission rules may be overridden.
    Kind(Kind),
    /// A concrete custom value type.
    Id(TypeId),
    /// A type named by module and name, resolved through the loader on
    /// first use.
    Named { module: String, name: String },
}

/// The result of resolving a named type: its identity plus a predicate that
/// answers whether a value belongs to the type (or a subtype of it).
pub struct ResolvedType {
    pub id: TypeId,
    pub is_instance: InstancePredicate,
}

pub type InstancePredicate = Rc<dyn Fn(&dyn CustomValue) -> bool>;

/// Resolves a `(module, name)` pair to a type descriptor.
pub type TypeLoader = Rc<dyn Fn(&str, &str) -> Option<ResolvedType>>;

/// A deferred entry whose type could not be resolved.
#[derive(Debug)]
pub struct UnresolvedType {
    pub module: String,
    pub name: String,
}

struct Entry<H> {
    key: TypeKey,
    is_instance: Option<InstancePredicate>,
    handler: H,
}

/// An ordered type-to-handler mapping.
pub struct Registry<H> {
    entries: Vec<Entry<H>>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }
}

impl<H: Clone> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override the built-in handler for a value kind (custom style only).
    pub fn register_kind(&mut self, kind: Kind, handler: H) {
        self.entries.push(Entry {
            key: TypeKey::Kind(kind),
            is_instance: None,
            handler,
        });
    }

    /// Register a handler for a concrete custom value type.
    pub fn register_type(&mut self, id: TypeId, handler: H) {
        self.entries.push(Entry {
            key: TypeKey::Id(id),
            is_instance: None,
            handler,
        });
    }

    /// Register a handler for a type named by module and name, to be
    /// resolved through the loader when first needed.
    pub fn register_named(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        handler: H,
    ) {
        self.entries.push(Entry {
            key: TypeKey::Named {
                module: module.into(),
                name: name.into(),
            },
            is_instance: None,
            handler,
        });
    }

    pub fn for_kind(&self, kind: Kind) -> Option<&H> {
        self.entries
            .iter()
            .find(|e| matches!(e.key, TypeKey::Kind(k) if k == kind))
            .map(|e| &e.handler)
    }

    /// Find the handler for a custom value, resolving deferred entries as
    /// they are encountered.
    pub fn find_custom(
        &mut self,
        value: &dyn CustomValue,
        loader: Option<&TypeLoader>,
    ) -> Result<Option<H>, UnresolvedType> {
        let id = value.as_any().type_id();

        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| matches!(e.key, TypeKey::Id(i) if i == id))
        {
            return Ok(Some(entry.handler.clone()));
        }

        for index in 0..self.entries.len() {
            if let TypeKey::Named { module, name } = &self.entries[index].key {
                let (module, name) = (module.clone(), name.clone());
                let Some(resolved) = loader.and_then(|load| load(&module, &name)) else {
                    return Err(UnresolvedType { module, name });
                };
                self.entries[index].key = TypeKey::Id(resolved.id);
                self.entries[index].is_instance = Some(resolved.is_instance);
            }

            let entry = &self.entries[index];
            if let Some(is_instance) = &entry.is_instance {
                if is_instance(value) {
                    let handler = entry.handler.clone();
                    // Memoize so the next value of this concrete type hits
                    // the exact-match phase.
                    self.entries.push(Entry {
                        key: TypeKey::Id(id),
                        is_instance: None,
                        handler: handler.clone(),
                    });
                    return Ok(Some(handler));
                }
            }
        }

        Ok(None)
    }
}
