//! Route handlers
//!
//! - form_page: static form served on GET (also the catch-all)
//! - submit: dual write of a posted form

pub mod form_page;
pub mod submit;

pub use form_page::form_page;
pub use submit::submit;
