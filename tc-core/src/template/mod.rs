//! Cover-sheet templates: which one a role gets, how the form is flattened
//! into placeholder values, and how those values are substituted.

mod mapper;
mod render;
mod selector;
mod source;

pub use mapper::{extract_zip, flatten, format_currency, format_percentage};
pub use render::render;
pub use selector::{CoverSheetTemplate, TemplateError};
pub use source::{DirTemplateSource, TemplateSource};
