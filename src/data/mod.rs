//! Match data types and the sources that produce them.

pub mod http_feed;
pub mod models;
pub mod source;
