//! String-table files: a flat list of `#define ID "text"` entries.

use tracing::debug;

use crate::{
    error::Error,
    lexer::{Directive, Token},
    locale::Language,
    schema::NoFlagValues,
    string_map::StringMap,
};

use super::Parser;

/// Parses one language's string table. A duplicate id is an error.
pub fn parse_strings(tokens: &[Token], language: Language) -> Result<StringMap, Error> {
    let resolver = NoFlagValues;
    let mut parser = Parser::new(tokens, &resolver);
    let mut strings = StringMap::new();

    while parser.peek().is_some() {
        parser.expect_directive(Directive::Define)?;
        let id = parser.expect_identifier()?;
        let text = parser.expect_string()?;
        if strings.insert(language, id, text).is_some() {
            return Err(Error::syntax(
                "a unique string id",
                format!("duplicate `{}`", id),
            ));
        }
    }

    debug!("parsed {} {} strings", strings.len(language), language);
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use indoc::indoc;

    #[test]
    fn test_parse_strings() {
        let source = indoc! {r#"
            // Generated
            #define IDS_TITLE "Main ""window"""
            #define IDS_EMPTY ""
            // trailing comment
        "#};
        let strings = parse_strings(&tokenize(source).unwrap(), Language::German).unwrap();
        assert_eq!(strings.len(Language::German), 2);
        assert_eq!(strings.get(Language::German, "IDS_TITLE"), Some("Main \"\"window\"\""));
        assert_eq!(strings.get(Language::German, "IDS_EMPTY"), Some(""));
        assert_eq!(strings.languages().collect::<Vec<_>>(), vec![Language::German]);
    }

    #[test]
    fn test_empty_file() {
        let strings = parse_strings(&[], Language::English).unwrap();
        assert!(strings.is_empty());
    }

    #[test]
    fn test_duplicate_id_fails() {
        let source = "#define IDS_A \"a\"\n#define IDS_A \"b\"\n";
        let error = parse_strings(&tokenize(source).unwrap(), Language::English).unwrap_err();
        assert!(error.to_string().contains("duplicate `IDS_A`"));
    }

    #[test]
    fn test_malformed_entry_fails() {
        let source = "#define IDS_A 12\n";
        assert!(parse_strings(&tokenize(source).unwrap(), Language::English).is_err());
    }
}
