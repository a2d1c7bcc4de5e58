pub mod kv;
pub mod repositories;
