//! Database layer - one pool per write target
//!
//! - `pool`: connect and ping a target
//! - `schema`: create-if-absent for the `users` table
//! - `users`: the insert used by the submit handler

pub mod pool;
pub mod schema;
pub mod users;

pub use pool::{connect, DualPools};
pub use schema::ensure_users_table;
pub use users::{DbError, NewUser, PgUserStore, UserStore};
