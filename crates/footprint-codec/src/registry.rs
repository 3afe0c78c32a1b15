//! Caller-supplied reconstruction capabilities, consulted only while decoding.
//!
//! A [`Registry`] maps a record type name or extension class name to the
//! means of rebuilding it. It is passed explicitly to the decoder for the
//! duration of one call and never stored globally, so two threads can decode
//! with different registries side by side.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{FootprintError, Result};
use crate::value::{ExtensionValue, Record, Value};

/// User object encoded through an explicit state-capture capability.
pub trait Extension: Any + Send + Sync + fmt::Debug {
    /// Name under which the class is registered for decoding.
    fn class_name(&self) -> &str;

    /// State that fully describes the object.
    fn capture_state(&self) -> Value;

    /// Upcast used for downcasting decoded objects.
    fn as_any(&self) -> &dyn Any;
}

/// Extension types that can rebuild themselves from captured state.
pub trait RestoreState: Extension + Sized {
    /// Registered class name; must match [`Extension::class_name`].
    const CLASS_NAME: &'static str;

    /// Rebuilds an object from state produced by [`Extension::capture_state`].
    fn restore_state(state: Value) -> Result<Self>;
}

/// Positional constructor for records decoded from the legacy format.
pub type RecordConstructor = Arc<dyn Fn(Vec<Value>) -> Result<Record> + Send + Sync>;

/// Factory that turns captured state back into an extension object.
pub type StateFactory = Arc<dyn Fn(Value) -> Result<ExtensionValue> + Send + Sync>;

/// How a registered name is reconstructed.
#[derive(Clone)]
pub enum Reconstructor {
    /// Positional record constructor.
    Record(RecordConstructor),
    /// State-accepting factory.
    State(StateFactory),
}

/// Name to reconstruction capability mapping.
#[derive(Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Reconstructor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registers a record type by its field names.
    pub fn register_record<S: AsRef<str>>(
        &mut self,
        type_name: impl Into<String>,
        field_names: &[S],
    ) -> &mut Self {
        let type_name = type_name.into();
        let names: Vec<String> = field_names.iter().map(|n| n.as_ref().to_string()).collect();
        let owner = type_name.clone();
        let constructor: RecordConstructor = Arc::new(move |values: Vec<Value>| {
            Record::from_positional(owner.clone(), names.as_slice(), values).map_err(|e| {
                FootprintError::Reconstruct {
                    name: owner.clone(),
                    reason: e.to_string(),
                }
            })
        });
        self.entries
            .insert(type_name, Reconstructor::Record(constructor));
        self
    }

    /// Registers a record type with a custom positional constructor.
    pub fn register_record_with<F>(&mut self, type_name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> Result<Record> + Send + Sync + 'static,
    {
        self.entries
            .insert(type_name.into(), Reconstructor::Record(Arc::new(constructor)));
        self
    }

    /// Registers a state factory for an extension class.
    pub fn register_state<F>(&mut self, class_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Value) -> Result<ExtensionValue> + Send + Sync + 'static,
    {
        self.entries
            .insert(class_name.into(), Reconstructor::State(Arc::new(factory)));
        self
    }

    /// Registers an extension type under its [`RestoreState::CLASS_NAME`].
    pub fn register_extension<T: RestoreState + 'static>(&mut self) -> &mut Self {
        self.register_state(T::CLASS_NAME, |state| {
            T::restore_state(state).map(ExtensionValue::new)
        })
    }

    /// Registers a class whose objects are kept as [`OpaqueExtension`] carriers.
    pub fn register_opaque(&mut self, class_name: impl Into<String>) -> &mut Self {
        let class_name = class_name.into();
        let owner = class_name.clone();
        self.register_state(class_name, move |state| {
            Ok(ExtensionValue::new(OpaqueExtension {
                class_name: owner.clone(),
                state,
            }))
        })
    }

    /// Looks up a record constructor.
    pub fn record_constructor(&self, type_name: &str) -> Result<&RecordConstructor> {
        match self.entries.get(type_name) {
            Some(Reconstructor::Record(constructor)) => Ok(constructor),
            _ => Err(FootprintError::UnknownClass {
                name: type_name.to_string(),
            }),
        }
    }

    /// Looks up an extension state factory.
    pub fn state_factory(&self, class_name: &str) -> Result<&StateFactory> {
        match self.entries.get(class_name) {
            Some(Reconstructor::State(factory)) => Ok(factory),
            _ => Err(FootprintError::UnknownClass {
                name: class_name.to_string(),
            }),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for (name, entry) in &self.entries {
            let kind = match entry {
                Reconstructor::Record(_) => "record",
                Reconstructor::State(_) => "state",
            };
            list.entry(name, &kind);
        }
        list.finish()
    }
}

/// Extension carrier that keeps a class name and its raw state.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueExtension {
    class_name: String,
    state: Value,
}

impl OpaqueExtension {
    /// Creates a carrier for `class_name` holding `state`.
    pub fn new(class_name: impl Into<String>, state: Value) -> Self {
        Self {
            class_name: class_name.into(),
            state,
        }
    }

    /// Captured state.
    pub fn state(&self) -> &Value {
        &self.state
    }
}

impl Extension for OpaqueExtension {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn capture_state(&self) -> Value {
        self.state.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
