//! App plugin interface
//!
//! Domain logic plugs into the ledger by implementing [`App`]. Each app owns
//! a typed state container that the ledger creates (empty) at construction
//! and lends out for exactly one call at a time:
//!
//! - `validate` receives `&State` and must not depend on pending transactions
//! - `apply` receives `&mut State` and runs only for committed transactions
//!
//! Apps are collected by name in an [`AppRegistry`] before the ledger is
//! built; dispatch is a map lookup.

use crate::{types::Transaction, Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// State-transition plugin for one named application domain
pub trait App: Send + 'static {
    /// Per-app state container
    type State: Default + Serialize + Send + 'static;

    /// Registry name; transactions address the app through `tx.app`
    fn name(&self) -> &str;

    /// Check `tx` against the committed state. `Err` carries the rejection
    /// reason shown to the submitter.
    fn validate(&self, tx: &Transaction, state: &Self::State) -> std::result::Result<(), String>;

    /// Apply a committed `tx`.
    ///
    /// The state may have moved on since `validate` ran (earlier transactions
    /// in the same block, or earlier blocks). Implementations must not fault
    /// on that drift; missing entities are a silent no-op.
    ///
    /// A panic here is contained: the block stays committed, the remaining
    /// transactions still apply, and this app's state keeps whatever the
    /// panicking call had already written.
    fn apply(&self, tx: &Transaction, state: &mut Self::State);
}

/// Rejection reason reported when `validate` panics
pub const APP_FAULT: &str = "app fault";

/// Object-safe view of an app together with its state
///
/// Panics raised by the app are caught here and surface as `Err`.
pub(crate) trait HostedApp: Send {
    fn validate(&self, tx: &Transaction) -> std::result::Result<(), String>;
    fn apply(&mut self, tx: &Transaction) -> std::result::Result<(), String>;
    fn state_any(&self) -> &dyn Any;
    fn state_json(&self) -> Result<Value>;
}

struct Hosted<A: App> {
    app: A,
    state: A::State,
}

impl<A: App> HostedApp for Hosted<A> {
    fn validate(&self, tx: &Transaction) -> std::result::Result<(), String> {
        panic::catch_unwind(AssertUnwindSafe(|| self.app.validate(tx, &self.state)))
            .unwrap_or_else(|_| Err(APP_FAULT.to_string()))
    }

    fn apply(&mut self, tx: &Transaction) -> std::result::Result<(), String> {
        let Self { app, state } = self;
        panic::catch_unwind(AssertUnwindSafe(|| app.apply(tx, state)))
            .map_err(|payload| panic_message(payload.as_ref()))
    }

    fn state_any(&self) -> &dyn Any {
        &self.state
    }

    fn state_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.state)?)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        APP_FAULT.to_string()
    }
}

/// Apps keyed by name
#[derive(Default)]
pub struct AppRegistry {
    apps: BTreeMap<String, Box<dyn HostedApp>>,
}

impl AppRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `app` under its name with a fresh, empty state
    pub fn register<A: App>(mut self, app: A) -> Result<Self> {
        let name = app.name().to_string();
        if self.apps.contains_key(&name) {
            return Err(Error::DuplicateApp(name));
        }

        self.apps.insert(
            name,
            Box::new(Hosted {
                app,
                state: A::State::default(),
            }),
        );
        Ok(self)
    }

    /// Registered app names (sorted)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    /// Is `name` registered
    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    /// Number of registered apps
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// No apps registered
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&dyn HostedApp> {
        self.apps.get(name).map(|app| app.as_ref())
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut (dyn HostedApp + 'static)> {
        self.apps.get_mut(name).map(|app| app.as_mut())
    }
}

impl fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.apps.keys()).finish()
    }
}
