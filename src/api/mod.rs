//! Definition of the GraphQL API.

use juniper::{EmptyMutation, EmptySubscription};

use self::query::Query;

pub(crate) mod err;
pub(crate) mod model;

mod context;
mod id;
mod query;
mod store;


pub(crate) use self::{
    id::Id,
    context::Context,
    store::Store,
};


/// Creates and returns the API root node. The API is read-only: there are no
/// mutations and no subscriptions.
pub(crate) fn root_node() -> RootNode {
    RootNode::new(Query, EmptyMutation::new(), EmptySubscription::new())
}

/// Type of our API root node.
pub(crate) type RootNode = juniper::RootNode<
    'static,
    Query,
    EmptyMutation<Context>,
    EmptySubscription<Context>,
>;
