pub mod db;
mod sqlite_impl;

pub use db::db_url;
pub use sqlite_impl::SqliteDatabase;
