//! Core data models for publications and listing pages.

mod page;
mod publication;

pub use page::{PublicationPage, PAGE_SIZE};
pub use publication::Publication;
