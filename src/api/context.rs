use std::sync::Arc;

use super::Store;


/// The context that is accessible to every resolver in our API.
///
/// It is created once at startup and shared by all requests. It does not hold
/// any per-request state.
pub(crate) struct Context {
    pub(crate) db: Arc<dyn Store>,
}

impl juniper::Context for Context {}

impl Context {
    pub(crate) fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }
}
