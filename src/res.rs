//! Static resources bundled into the binary from `res/`.

#[macro_export]
macro_rules! include_res {
    ($p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// DDL for the `users` and `complaints` tables. Every statement is idempotent.
pub const SCHEMA: &str = include_res!("/schema.sql");

/// Starter classes and courses, inserted only where the name or code is new.
pub const CATALOGUE: &str = include_res!("/catalogue.sql");
