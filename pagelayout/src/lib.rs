//! # pagelayout
//!
//! Editor core for landing page layouts described in YAML.
//!
//! A page is a title and a list of sections (`hero`, `feature`, `parallax`,
//! `footer`). The document is edited at the same time as raw text and as a
//! schema-generated form; [`formsync`] keeps both views synchronized.
//!
//! ## Modules
//!
//! - [`config`] - `.pagelayout.toml` editor configuration
//! - [`editor`] - Editing context: session, typed view and export
//! - [`layout`] - Typed page structures and the initial document
//! - [`schema`] - The page JSON Schema
//!
//! ## Example
//!
//! ```rust,no_run
//! use pagelayout::EditorContext;
//!
//! let ctx = EditorContext::open(".").unwrap();
//! let _ = ctx.session().text_changed("title: Launch\nsections: []\n");
//! ctx.export().unwrap();
//! ```

/// Editor configuration file handling.
pub mod config;

/// Editing context of a page document.
pub mod editor;

/// Typed page structures.
pub mod layout;

/// The page JSON Schema.
pub mod schema;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub use config::EditorConfig;
pub use editor::EditorContext;
pub use formsync;
pub use layout::{FeatureItem, INITIAL_DOCUMENT, PageLayout, Section, SectionKind};
pub use schema::page_schema;
