//! Byte-level handling of dialog and string-table files.
//!
//! String tables are saved in each language's legacy code page, so every
//! entry point takes an encoding label (`windows-1252`, `shift_jis`, ...).

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use encoding_rs::Encoding;

use crate::error::Error;

/// Looks up an encoding by its WHATWG label.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, Error> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::Encoding(format!("unknown encoding `{}`", label)))
}

/// Decodes bytes in the given encoding. A BOM, if present, wins over the label.
pub fn decode(bytes: &[u8], label: &str) -> Result<String, Error> {
    let encoding = encoding_for_label(label)?;
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(Error::Encoding(format!(
            "input is not valid {}",
            actual.name()
        )));
    }
    Ok(text.into_owned())
}

/// Reads a whole stream, sniffing a BOM before falling back to `label`.
pub fn read_to_string<R: Read>(reader: R, label: &str) -> Result<String, Error> {
    let encoding = encoding_for_label(label)?;
    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build(reader);

    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded).map_err(Error::Io)?;
    Ok(decoded)
}

pub fn read_file<P: AsRef<Path>>(path: P, label: &str) -> Result<String, Error> {
    let file = File::open(path).map_err(Error::Io)?;
    read_to_string(file, label)
}

/// Encodes text for writing. Characters the target encoding cannot represent
/// are an error rather than being replaced.
pub fn encode(text: &str, label: &str) -> Result<Vec<u8>, Error> {
    let encoding = encoding_for_label(label)?;
    let (bytes, actual, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(Error::Encoding(format!(
            "text cannot be represented in {}",
            actual.name()
        )));
    }
    Ok(bytes.into_owned())
}

pub fn write_file<P: AsRef<Path>>(path: P, text: &str, label: &str) -> Result<(), Error> {
    let bytes = encode(text, label)?;
    let mut file = File::create(path).map_err(Error::Io)?;
    file.write_all(&bytes).map_err(Error::Io)
}
