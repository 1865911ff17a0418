//! Items that define the domain data model and are shared between the `db`,
//! `api` and `cmd` modules.

mod key;

pub(crate) use self::key::Key;
