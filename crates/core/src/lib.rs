//! Core domain types, facet filtering, pagination, and slide insertion
//! for reusing PowerPoint slides across a Microsoft 365 tenant.

pub mod error;
pub mod filter;
pub mod insert;
pub mod paginate;
pub mod types;
pub mod view;

pub use error::{Error, Result};
pub use filter::{filter_by_facet, FilterSelection};
pub use insert::{
    host_slide_ref, insert_and_go_to_last, navigation_id, new_slide_ids, Formatting,
    InsertOutcome, InsertRequest, SlideHost,
};
pub use paginate::{Paginator, PAGE_SIZE};
pub use types::{AddinConfig, FacetDefinition, FacetValue, FileRecord, SlideReference};
pub use view::ResultsView;
