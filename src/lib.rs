pub mod autofill;
pub mod bridge;
pub mod core;
pub mod extraction;
pub mod intake;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::{load_config, JobflowConfig};

pub use autofill::{autofill, AutofillError, AutofillOptions, FormDocument, HtmlFormDocument};
pub use extraction::{extract, extract_from_html, Extractor, SelectorRegistry, SelectorRule};
