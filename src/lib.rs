//! Parser, multi-locale model and exporter for CV dialog resource files.
//!
//! A dialog is described by one `.dlg` file per locale (or a single master
//! file shared by every language) plus one string table per language. The
//! crate tokenizes and parses those files into a [`DialogResource`] per locale,
//! assembles them into a [`DialogResourceSet`], moves localized texts between
//! inline properties and the string tables, checks resources against a
//! property [`Schema`] and writes everything back out.
//!
//! ```rust
//! use cvdialog::{Locale, parse, tokenize};
//!
//! let source = r#"#include "shared.dlg""#;
//! let tokens = tokenize(source)?;
//! assert!(parse(&tokens, Locale::German)?.is_none());
//! # Ok::<(), cvdialog::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod builder;
pub mod error;
pub mod ids;
pub mod lexer;
pub mod locale;
pub mod normalize;
pub mod parser;
pub mod resource_set;
pub mod schema;
pub mod source;
pub mod string_map;
pub mod table;
pub mod types;
pub mod verify;
pub mod writer;

// Re-export most used types for easy consumption
pub use crate::{
    builder::DialogResourceSetBuilder,
    error::Error,
    lexer::{Token, tokenize},
    locale::{Language, Locale},
    parser::{ParseOptions, parse, parse_strings, parse_with_options},
    resource_set::DialogResourceSet,
    schema::{FlagResolver, LogicalType, PropertySpec, Schema, SchemaProvider},
    string_map::StringMap,
    types::{
        AddPolicy, ControlDefinition, DialogDefinition, DialogResource, Flags, Layer,
        PropertyDefinition, PropertyTarget, PropertyValue, Record,
    },
    verify::verify,
    writer::{write_dialog, write_strings},
};
