//! Builder for assembling a [`DialogResourceSet`] with a fluent interface.
//!
//! Resources and string tables are collected first; the consistency rules of
//! the set are only checked by [`DialogResourceSetBuilder::build`].
//!
//! # Example
//!
//! ```rust,no_run
//! use cvdialog::{DialogResourceSetBuilder, Language, Locale};
//!
//! let set = DialogResourceSetBuilder::new()
//!     .add_dialog_file("main.dlg", Locale::Any)?
//!     .add_dialog_file("main_jp.dlg", Locale::Japanese)?
//!     .add_strings_file("main_us.str", Language::English, None)?
//!     .build()?;
//! # Ok::<(), cvdialog::Error>(())
//! ```

use std::{collections::BTreeMap, path::Path};

use tracing::debug;

use crate::{
    error::Error,
    lexer::tokenize,
    locale::{Language, Locale},
    parser::{self, ParseOptions, parse_strings},
    resource_set::DialogResourceSet,
    source,
    string_map::StringMap,
    types::DialogResource,
};

#[derive(Debug, Default)]
pub struct DialogResourceSetBuilder {
    resources: BTreeMap<Locale, DialogResource>,
    import_logs: BTreeMap<Locale, Vec<String>>,
    strings: StringMap,
}

impl DialogResourceSetBuilder {
    /// Creates a new builder with no resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed resource under its own locale, together with the log
    /// collected while importing it.
    ///
    /// A second resource for the same locale replaces the first.
    pub fn add_resource(mut self, resource: DialogResource, import_log: Vec<String>) -> Self {
        let locale = resource.locale;
        if self.resources.insert(locale, resource).is_some() {
            debug!("replacing the {} dialog resource", locale);
        }
        self.import_logs.insert(locale, import_log);
        self
    }

    /// Adds one language's string table and the encoding it was read from.
    pub fn add_strings(
        mut self,
        language: Language,
        strings: StringMap,
        encoding: impl Into<String>,
    ) -> Self {
        self.strings.merge(strings);
        self.strings.set_encoding(language, encoding);
        self
    }

    /// Reads and parses a dialog file for `locale`.
    ///
    /// A file that only includes another dialog file adds nothing, leaving the
    /// locale linked to the master.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.dlg` file
    /// * `locale` - Locale the file belongs to
    ///
    /// # Returns
    ///
    /// Returns `self` for method chaining, or an `Error` if the file cannot be
    /// read or parsed.
    pub fn add_dialog_file<P: AsRef<Path>>(self, path: P, locale: Locale) -> Result<Self, Error> {
        self.add_dialog_file_with_options(path, locale, ParseOptions::default())
    }

    pub fn add_dialog_file_with_options<P: AsRef<Path>>(
        self,
        path: P,
        locale: Locale,
        options: ParseOptions<'_>,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let label = locale
            .language()
            .map_or(Language::English.default_encoding(), Language::default_encoding);
        let text = source::read_file(path, label)?;
        let tokens = tokenize(&text)?;

        match parser::parse_with_options(&tokens, locale, options)? {
            Some(resource) => {
                let log = vec![format!("Imported {} from {}", locale, path.display())];
                Ok(self.add_resource(resource, log))
            }
            None => {
                debug!("{} only forwards to another dialog file", path.display());
                Ok(self)
            }
        }
    }

    /// Reads and parses one language's string table.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the string file
    /// * `language` - Language of the file
    /// * `encoding` - Encoding label; the language default when `None`
    pub fn add_strings_file<P: AsRef<Path>>(
        self,
        path: P,
        language: Language,
        encoding: Option<&str>,
    ) -> Result<Self, Error> {
        let label = encoding.unwrap_or(language.default_encoding());
        let text = source::read_file(path, label)?;
        let strings = parse_strings(&tokenize(&text)?, language)?;
        Ok(self.add_strings(language, strings, label))
    }

    /// Checks the collected resources and builds the set.
    ///
    /// Fails when no dialog id can be derived, when linked languages have no
    /// master, when a master exists although every language is explicit, or
    /// when two resources disagree on the dialog id.
    pub fn build(self) -> Result<DialogResourceSet, Error> {
        let dialog_id = check_consistency(&self.resources)?;

        let mut import_logs = self.import_logs;
        for locale in Locale::ALL {
            import_logs.entry(locale).or_default();
        }

        debug!(
            "built dialog set `{}` with {} explicit resources",
            dialog_id,
            self.resources.len()
        );
        Ok(DialogResourceSet::from_parts(
            dialog_id,
            self.resources,
            import_logs,
            self.strings,
        ))
    }
}

/// Validates the explicit resources of a set and returns its dialog id.
pub(crate) fn check_consistency(
    resources: &BTreeMap<Locale, DialogResource>,
) -> Result<String, Error> {
    let reference = resources
        .get(&Locale::Any)
        .or_else(|| resources.values().next())
        .ok_or_else(|| Error::consistency("no dialog resource to take the dialog id from"))?;
    let dialog_id = reference.dialog_id()?;

    let has_master = resources.contains_key(&Locale::Any);
    let all_explicit = Locale::languages().all(|locale| resources.contains_key(&locale));
    if !has_master && !all_explicit {
        return Err(Error::consistency("missing master for linked resources"));
    }
    if has_master && all_explicit {
        return Err(Error::consistency(
            "unnecessary master for fully unlinked resources",
        ));
    }

    for resource in resources.values() {
        let id = resource.dialog_id()?;
        if id != dialog_id {
            return Err(Error::consistency(format!(
                "mismatched dialog id: {} has `{}`, expected `{}`",
                resource.locale, id, dialog_id
            )));
        }
    }

    Ok(dialog_id)
}
