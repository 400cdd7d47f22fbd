// Database schema definitions
// The SQL lives under migrations/ and is embedded at compile time

pub const INITIAL_SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");
