//! String-table id generation.
//!
//! While a dialog is being edited its strings carry internal ids that never
//! leave the session. On export they are renamed to the persistent
//! `DLGPROP_<dialog>_<n>_Text` scheme.

use lazy_static::lazy_static;
use regex::Regex;

/// Suffix marking ids minted during an editing session.
pub const INTERNAL_ID_SUFFIX: &str = "__internal";

lazy_static! {
    static ref PERSISTENT_ID_REGEX: Regex = Regex::new(r"^DLGPROP_(.+)_(\d+)_Text$").unwrap();
}

pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

impl<F> IdGenerator for F
where
    F: FnMut() -> String,
{
    fn next_id(&mut self) -> String {
        self()
    }
}

/// Mints `STR_<n>__internal` ids, counting from 1.
#[derive(Debug, Clone, Default)]
pub struct InternalIdGenerator {
    issued: usize,
}

impl InternalIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for InternalIdGenerator {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("STR_{}{}", self.issued, INTERNAL_ID_SUFFIX)
    }
}

/// Mints `DLGPROP_<dialog>_<n>_Text` ids, counting from 1.
#[derive(Debug, Clone)]
pub struct PersistentIdGenerator {
    dialog_name: String,
    issued: usize,
}

impl PersistentIdGenerator {
    pub fn new(dialog_name: impl Into<String>) -> Self {
        Self {
            dialog_name: dialog_name.into(),
            issued: 0,
        }
    }
}

impl IdGenerator for PersistentIdGenerator {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("DLGPROP_{}_{}_Text", self.dialog_name, self.issued)
    }
}

pub fn is_internal_id(id: &str) -> bool {
    id.ends_with(INTERNAL_ID_SUFFIX)
}

/// Splits a persistent id into its dialog name and sequence number.
pub fn parse_persistent_id(id: &str) -> Option<(String, usize)> {
    let captures = PERSISTENT_ID_REGEX.captures(id)?;
    let sequence = captures.get(2)?.as_str().parse().ok()?;
    Some((captures.get(1)?.as_str().to_string(), sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_ids() {
        let mut generator = InternalIdGenerator::new();
        assert_eq!(generator.next_id(), "STR_1__internal");
        assert_eq!(generator.next_id(), "STR_2__internal");
        assert!(is_internal_id("STR_2__internal"));
        assert!(!is_internal_id("DLGPROP_IDD_MAIN_1_Text"));
    }

    #[test]
    fn test_persistent_ids() {
        let mut generator = PersistentIdGenerator::new("IDD_MAIN");
        assert_eq!(generator.next_id(), "DLGPROP_IDD_MAIN_1_Text");
        assert_eq!(generator.next_id(), "DLGPROP_IDD_MAIN_2_Text");
    }

    #[test]
    fn test_parse_persistent_id() {
        assert_eq!(
            parse_persistent_id("DLGPROP_IDD_MAIN_12_Text"),
            Some(("IDD_MAIN".to_string(), 12))
        );
        assert_eq!(parse_persistent_id("STR_1__internal"), None);
    }

    #[test]
    fn test_closure_generator() {
        let mut n = 0;
        let mut generator = || {
            n += 10;
            format!("ID{}", n)
        };
        assert_eq!(generator.next_id(), "ID10");
        assert_eq!(generator.next_id(), "ID20");
    }
}
