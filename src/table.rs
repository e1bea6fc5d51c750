//! CSV string tables: one row per string id, one column per language.
//!
//! Used to hand strings to translators and read their work back.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::{error::Error, locale::Language, string_map::StringMap};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StringRow {
    pub id: String,
    #[serde(rename = "en-US", default)]
    pub english: String,
    #[serde(rename = "de-DE", default)]
    pub german: String,
    #[serde(rename = "ja-JP", default)]
    pub japanese: String,
}

impl StringRow {
    fn text(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::German => &self.german,
            Language::Japanese => &self.japanese,
        }
    }
}

/// Flattens a string map into rows, in id order. Missing translations are
/// empty cells.
pub fn rows(strings: &StringMap) -> Vec<StringRow> {
    strings
        .ids()
        .map(|id| {
            let text = |language| strings.get(language, id).unwrap_or_default().to_string();
            StringRow {
                id: id.to_string(),
                english: text(Language::English),
                german: text(Language::German),
                japanese: text(Language::Japanese),
            }
        })
        .collect()
}

/// Writes `id,en-US,de-DE,ja-JP` rows.
pub fn write_csv<W: Write>(strings: &StringMap, writer: W) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for row in rows(strings) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads rows written by [`write_csv`]. Every cell becomes an entry, empty
/// ones included; encodings are left at their defaults.
pub fn read_csv<R: Read>(reader: R) -> Result<StringMap, Error> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut strings = StringMap::new();
    for result in rdr.deserialize() {
        let row: StringRow = result?;
        for language in Language::ALL {
            strings.insert(language, row.id.clone(), row.text(language));
        }
    }
    Ok(strings)
}
