//! The `{[label=value]...}Caption=""text""` mini-format packed into a single
//! string argument.
//!
//! The text handled here is the raw string token value, so quotes inside it
//! are still doubled.

use crate::{
    error::Error,
    types::{PropertyDefinition, PropertyValue, labels},
};

/// Marker introducing the caption suffix, in its escaped form.
pub const CAPTION_MARKER: &str = "Caption=\"\"";

const QUOTE: &str = "\"\"";

/// Parses a serialized property string into property definitions. An empty
/// string yields no properties.
pub fn parse_serialized(text: &str) -> Result<Vec<PropertyDefinition>, Error> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let well_formed = (text.starts_with('{') || text.starts_with(CAPTION_MARKER))
        && (text.ends_with('}') || text.ends_with('"'));
    if !well_formed {
        return Err(Error::syntax(
            "serialized properties `{[label=value]...}`",
            format!("string \"{}\"", text),
        ));
    }

    let (brackets, caption) = if text.starts_with(CAPTION_MARKER) {
        ("", text)
    } else {
        match text.split_once('}') {
            Some((brackets, caption)) => (brackets.trim_start_matches('{'), caption.trim()),
            None => {
                return Err(Error::syntax(
                    "`}` closing serialized properties",
                    format!("string \"{}\"", text),
                ));
            }
        }
    };

    let mut properties = Vec::new();
    for chunk in brackets.split('[') {
        if chunk.trim().is_empty() {
            continue;
        }
        let pair = chunk.trim_end().strip_suffix(']').ok_or_else(|| {
            Error::syntax("`]` closing serialized property", format!("`{}`", chunk))
        })?;
        let (label, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::syntax("`label=value`", format!("`{}`", pair)))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::syntax("property label", format!("`{}`", pair)));
        }
        properties.push(PropertyDefinition::new(label, typed_value(label, value)?));
    }

    if !caption.is_empty() {
        let text = caption
            .strip_prefix(CAPTION_MARKER)
            .and_then(|rest| rest.strip_suffix(QUOTE))
            .ok_or_else(|| {
                Error::syntax(
                    format!("`{}text\"\"` caption", CAPTION_MARKER),
                    format!("`{}`", caption),
                )
            })?;
        properties.push(PropertyDefinition::string(labels::TEXT, text));
    }

    Ok(properties)
}

/// Infers the type of a serialized value from its spelling.
fn typed_value(label: &str, raw: &str) -> Result<PropertyValue, Error> {
    if raw.is_empty() || raw == QUOTE {
        return Ok(PropertyValue::String(String::new()));
    }
    if let Some(inner) = raw
        .strip_prefix(QUOTE)
        .and_then(|rest| rest.strip_suffix(QUOTE))
    {
        return Ok(PropertyValue::String(inner.to_string()));
    }
    if raw
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return raw
            .parse::<f64>()
            .map(|value| PropertyValue::Number(Some(value)))
            .map_err(|_| Error::syntax(format!("number for `{}`", label), format!("`{}`", raw)));
    }
    if raw.contains('|') {
        return Err(Error::Unsupported(format!(
            "flags in serialized property `{}`",
            label
        )));
    }
    Ok(PropertyValue::Identifier(raw.to_string()))
}

/// Renders properties (and an optional caption) back into the mini-format.
/// Returns an empty string when there is nothing to write.
pub fn write_serialized(
    properties: &[&PropertyDefinition],
    caption: Option<&str>,
) -> Result<String, Error> {
    if properties.is_empty() && caption.is_none() {
        return Ok(String::new());
    }

    let mut out = String::from("{");
    for property in properties {
        let value = match &property.value {
            PropertyValue::String(text) => format!("{}{}{}", QUOTE, text, QUOTE),
            PropertyValue::Number(Some(value)) => value.to_string(),
            PropertyValue::Number(None) => String::new(),
            PropertyValue::Identifier(name) => name.clone(),
            PropertyValue::Flags(_) => {
                return Err(Error::Unsupported(format!(
                    "flags in serialized property `{}`",
                    property.label
                )));
            }
        };
        out.push_str(&format!("[{}={}]", property.label, value));
    }
    out.push('}');

    if let Some(caption) = caption {
        out.push_str(&format!("{}{}{}", CAPTION_MARKER, caption, QUOTE));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Flags;

    #[test]
    fn test_empty() {
        assert!(parse_serialized("").unwrap().is_empty());
        assert!(parse_serialized("  ").unwrap().is_empty());
        assert!(parse_serialized("{}").unwrap().is_empty());
    }

    #[test]
    fn test_labels_and_types() {
        let properties = parse_serialized("{[Tooltip=\"\"x\"\"][MinValue=10]}").unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0].label, "Tooltip");
        assert_eq!(properties[0].value, PropertyValue::String("x".to_string()));
        assert_eq!(properties[1].label, "MinValue");
        assert_eq!(properties[1].value, PropertyValue::Number(Some(10.0)));
    }

    #[test]
    fn test_identifier_and_empty_values() {
        let properties = parse_serialized("{[Icon=IDI_APP][Hint=][Blank=\"\"][Ratio=-0.5]}").unwrap();
        assert_eq!(properties[0].value, PropertyValue::Identifier("IDI_APP".to_string()));
        assert_eq!(properties[1].value, PropertyValue::String(String::new()));
        assert_eq!(properties[2].value, PropertyValue::String(String::new()));
        assert_eq!(properties[3].value, PropertyValue::Number(Some(-0.5)));
    }

    #[test]
    fn test_caption_only() {
        let properties = parse_serialized("{}Caption=\"\"hi\"\"").unwrap();
        assert_eq!(properties, vec![PropertyDefinition::string(labels::TEXT, "hi")]);

        let bare = parse_serialized("Caption=\"\"a}b\"\"").unwrap();
        assert_eq!(bare, vec![PropertyDefinition::string(labels::TEXT, "a}b")]);
    }

    #[test]
    fn test_properties_then_caption() {
        let properties = parse_serialized("{[MaxLength=5]}Caption=\"\"Name:\"\"").unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[1].label, labels::TEXT);
        assert_eq!(properties[1].value, PropertyValue::String("Name:".to_string()));
    }

    #[test]
    fn test_flags_are_unsupported() {
        let error = parse_serialized("{[Style=A|B]}").unwrap_err();
        assert!(matches!(error, Error::Unsupported(_)));
    }

    #[test]
    fn test_malformed() {
        assert!(parse_serialized("[A=1]").is_err());
        assert!(parse_serialized("{[A=1}").is_err());
        assert!(parse_serialized("{[A1]}").is_err());
        assert!(parse_serialized("{}Title=\"\"x\"\"").is_err());
        assert!(parse_serialized("{[A=1.2.3]}").is_err());
    }

    #[test]
    fn test_write_serialized() {
        let tooltip = PropertyDefinition::string("Tooltip", "x");
        let min = PropertyDefinition::number("MinValue", 10.0);
        let written = write_serialized(&[&tooltip, &min], Some("hi")).unwrap();
        assert_eq!(written, "{[Tooltip=\"\"x\"\"][MinValue=10]}Caption=\"\"hi\"\"");
        assert_eq!(parse_serialized(&written).unwrap().len(), 3);

        assert_eq!(write_serialized(&[], None).unwrap(), "");
        assert_eq!(write_serialized(&[], Some("")).unwrap(), "{}Caption=\"\"\"\"");

        let flags = PropertyDefinition::flags("Style", Flags::new(1));
        assert!(write_serialized(&[&flags], None).is_err());
    }
}
