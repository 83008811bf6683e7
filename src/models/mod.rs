//! Feed data models.

mod feed;
mod ids;
mod match_record;

pub use feed::*;
pub use ids::*;
pub use match_record::*;
