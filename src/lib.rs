//! # cleaner-invoice – invoice preview and PDF export for a cleaning business
//!
//! The crate turns the raw values of an invoice form into a rendered view and
//! exports that view as a paginated A4 PDF. The stages are:
//!
//! 1. **Form** – raw field values ([`form`])
//! 2. **View** – pure recomputation of rows, badge and totals ([`view`], [`session`])
//! 3. **Layout** – position the invoice region with Taffy ([`layout`])
//! 4. **Raster** – paint the region to a JPEG at 2x ([`raster`])
//! 5. **Paginate** – slice the raster across A4 pages ([`pagination`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! [`export::export_pdf`] runs stages 2–6. A C-compatible FFI surface is
//! exposed via the [`ffi`] module.

pub mod currency;
pub mod error;
pub mod export;
pub mod ffi;
pub mod fonts;
pub mod form;
pub mod layout;
pub mod pagination;
pub mod preview;
pub mod raster;
pub mod region;
pub mod render;
pub mod samples;
pub mod session;
pub mod view;

// Re-exports for convenience
pub use error::{ExportError, FormError};
pub use export::{export_filename, export_pdf, ExportConfig, ExportedPdf};
pub use form::InvoiceFormState;
pub use session::InvoiceSession;
pub use view::{render_view, InvoiceView};
