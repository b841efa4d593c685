pub mod address_hash;
pub mod builders;
pub mod calendar;
pub mod etl;
pub mod ids;
pub mod manifest;
pub mod partition;
pub mod pipeline;

pub use crate::domain::model::{GeneratedResources, Manifest};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
