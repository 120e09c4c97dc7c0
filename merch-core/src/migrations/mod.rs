//! Schema migrations, embedded with include_str!
//!
//! `000_migrations.sql` bootstraps the tracking table; the rest are applied
//! in name order by [`crate::services::MigrationService`].

/// (file name, SQL) pairs in application order.
///
/// New migrations get the next NNN_ prefix and are appended here.
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
    ("002_seed_catalog.sql", include_str!("002_seed_catalog.sql")),
];
