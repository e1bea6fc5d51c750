//! Renders resources back into CV dialog and string-table text.
//!
//! Each property is written where it was read from: argument slots for the
//! positional labels, `define_dialog_property` for labeled dialog properties,
//! and the serialized string for everything else.

use std::fmt::Write as _;

use indoc::{formatdoc, indoc};

use crate::{
    error::Error,
    lexer::{Token, tokenize},
    locale::Language,
    parser::{control_positional_labels, dialog_positional_labels, write_serialized},
    string_map::StringMap,
    types::{
        AddPolicy, ControlDefinition, DialogDefinition, DialogResource, Layer, PropertyDefinition,
        PropertyMap, PropertyValue, labels,
    },
};

const DIALOG_TAIL: &str = indoc! {"
    end_control_definitions()
    end_dialog_definition_ex_()
"};

/// Renders a dialog file that parses back to an equal resource.
pub fn write_dialog(resource: &DialogResource) -> Result<String, Error> {
    if resource.headers().is_empty() {
        return Err(Error::invalid_resource(
            "a dialog file needs at least one header include",
        ));
    }

    let mut out = String::new();
    for header in resource.headers() {
        let _ = writeln!(out, "#include \"{}\"", header);
    }
    let _ = writeln!(out, "// Version [{}]", resource.version);
    out.push_str(&language_includes(resource)?);
    out.push('\n');

    write_dialog_definition(&mut out, &resource.dialog)?;
    if !resource.layers.is_empty() {
        out.push('\n');
        write_layers(&mut out, &resource.layers);
    }
    Ok(out)
}

/// Renders one language's string table.
pub fn write_strings(strings: &StringMap, language: Language) -> String {
    let mut out = String::new();
    for (id, text) in strings.entries_for(language) {
        let _ = writeln!(out, "#define {} \"{}\"", id, text);
    }
    out
}

fn language_includes(resource: &DialogResource) -> Result<String, Error> {
    let file = |language: Language| {
        resource.string_file(language).ok_or_else(|| {
            Error::invalid_resource(format!("no string file for {}", language.macro_name()))
        })
    };

    Ok(formatdoc! {r#"
        #ifdef {us_macro}
        #include "{us}"
        #elif defined {de_macro}
        #include "{de}"
        #elif defined {jp_macro}
        #include "{jp}"
        #else
        #error "Unsupported language"
        #endif
        "#,
        us_macro = Language::English.macro_name(),
        us = file(Language::English)?,
        de_macro = Language::German.macro_name(),
        de = file(Language::German)?,
        jp_macro = Language::Japanese.macro_name(),
        jp = file(Language::Japanese)?,
    })
}

fn write_dialog_definition(out: &mut String, dialog: &DialogDefinition) -> Result<(), Error> {
    let properties = dialog.properties();
    let positional: Vec<&str> = dialog_positional_labels().flatten().collect();

    let serialized: Vec<&PropertyDefinition> = properties
        .iter()
        .filter(|property| {
            !positional.contains(&property.label.as_str()) && property.source != AddPolicy::Labeled
        })
        .collect();
    let serialized = write_serialized(&serialized, None)?;

    let arguments = dialog_positional_labels()
        .map(|label| match label {
            Some(label) => slot_value(properties, label, "dialog"),
            None => Ok(quoted(&serialized)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let _ = writeln!(out, "begin_dialog_definition_ex_({})", arguments.join(", "));

    out.push_str("begin_dialog_properties()\n");
    for property in properties.iter().filter(|property| {
        !positional.contains(&property.label.as_str()) && property.source == AddPolicy::Labeled
    }) {
        let _ = writeln!(
            out,
            "    define_dialog_property({}, {})",
            labeled_label(&property.label),
            labeled_value(&property.value)
        );
    }
    out.push_str("end_dialog_properties()\n");

    for control in dialog.controls() {
        let _ = writeln!(out, "declare_control({}, {})", control.ctrl_type(), control.id());
    }

    out.push_str("begin_control_definitions()\n");
    for control in dialog.controls() {
        write_control(out, control)?;
    }
    out.push_str(DIALOG_TAIL);
    Ok(())
}

fn write_control(out: &mut String, control: &ControlDefinition) -> Result<(), Error> {
    let properties = control.properties();
    let positional: Vec<&str> = control_positional_labels().flatten().collect();

    // A plain-text caption goes after the brackets; a string reference stays
    // inside them.
    let caption = match properties.get(labels::TEXT).map(|property| &property.value) {
        Some(PropertyValue::String(text)) => Some(text.as_str()),
        _ => None,
    };
    let serialized: Vec<&PropertyDefinition> = properties
        .iter()
        .filter(|property| !positional.contains(&property.label.as_str()))
        .filter(|property| !(caption.is_some() && property.label == labels::TEXT))
        .collect();
    let serialized = write_serialized(&serialized, caption)?;

    let target = format!("control `{}`", control.key());
    let arguments = control_positional_labels()
        .map(|label| match label {
            Some(label) => slot_value(properties, label, &target),
            None => Ok(quoted(&serialized)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let _ = writeln!(out, "    begin_control_ex({})", arguments.join(", "));
    out.push_str("    end_control_ex()\n");
    Ok(())
}

/// The source text of one argument slot, or its neutral default when the
/// property is absent.
fn slot_value(properties: &PropertyMap, label: &str, owner: &str) -> Result<String, Error> {
    if let Some(property) = properties.get(label) {
        return Ok(property.value.to_string());
    }
    match label {
        labels::ID | labels::CTRL_TYPE => Err(Error::invalid_resource(format!(
            "{} has no `{}` property",
            owner, label
        ))),
        labels::TEXT | labels::RESOURCE_CLASS | labels::FONT => Ok(quoted("")),
        _ => Ok("0".to_string()),
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text)
}

/// Labels that do not lex back as a single identifier are written as strings.
fn labeled_label(label: &str) -> String {
    match tokenize(label).as_deref() {
        Ok([Token::Identifier(name)]) if name == label => label.to_string(),
        _ => quoted(label),
    }
}

/// Flags without names still need a `|`, or they read back as a number.
fn labeled_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Flags(flags) if flags.names().next().is_none() => {
            format!("{} | 0", flags.value())
        }
        value => value.to_string(),
    }
}

fn write_layers(out: &mut String, layers: &[Layer]) {
    out.push_str("#if 0\nBEGIN_LAYERS\n");
    for layer in layers {
        let _ = write!(out, "    BEGIN_LAYER \"{}\"", layer.name);
        for value in layer.values() {
            let _ = write!(out, " {}", value);
        }
        out.push_str(" END_LAYER\n");
    }
    out.push_str("END_LAYERS\n#endif\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{locale::Locale, parser::parse, types::Flags};

    const SOURCE: &str = indoc! {r#"
        #include "cvdialog.h"
        #include "resource.h"
        // Version [2.1]
        #ifdef RES_US
        #include "main_us.str"
        #elif defined RES_GERMAN
        #include "main_de.str"
        #elif defined RES_JAPAN
        #include "main_jp.str"
        #else
        #error "Unsupported language"
        #endif

        begin_dialog_definition_ex_(IDD_MAIN, "{[Tooltip=""Main""]}", 0, 0, 200, 120, IDS_TITLE, "CVDialog", WS_POPUP | 0, "MS Sans Serif", 8)
        begin_dialog_properties()
            define_dialog_property(HelpId, 42)
            define_dialog_property(Border, WS_BORDER | 1)
        end_dialog_properties()
        declare_control(Button, IDC_OK)
        declare_control(Edit, 1001)
        begin_control_definitions()
            begin_control_ex(Button, "CVButton", IDC_OK, "{[Tooltip=""Press""]}Caption=""OK""", 5, 30, 40, 12, WS_TABSTOP | 0, 0)
            end_control_ex()
            begin_control_ex(Edit, "CVEdit", 1001, "{[text=IDS_NAME][MaxLength=32]}", 5, 5, 80, 12, 0, 0)
            end_control_ex()
        end_control_definitions()
        end_dialog_definition_ex_()

        #if 0
        BEGIN_LAYERS
            BEGIN_LAYER "Buttons" 0 1 END_LAYER
        END_LAYERS
        #endif
    "#};

    fn parse_text(text: &str) -> DialogResource {
        parse(&tokenize(text).unwrap(), Locale::Any).unwrap().unwrap()
    }

    #[test]
    fn test_written_dialog_reparses_equal() {
        let resource = parse_text(SOURCE);
        let written = write_dialog(&resource).unwrap();
        assert_eq!(parse_text(&written), resource);
    }

    #[test]
    fn test_written_layout() {
        let written = write_dialog(&parse_text(SOURCE)).unwrap();
        assert!(written.starts_with("#include \"cvdialog.h\"\n#include \"resource.h\"\n// Version [2.1]\n#ifdef RES_US\n"));
        assert!(written.contains(
            "begin_dialog_definition_ex_(IDD_MAIN, \"{[Tooltip=\"\"Main\"\"]}\", 0, 0, 200, 120, IDS_TITLE, \"CVDialog\", WS_POPUP | 0, \"MS Sans Serif\", 8)\n"
        ));
        assert!(written.contains("    define_dialog_property(Border, WS_BORDER | 1)\n"));
        assert!(written.contains("declare_control(Edit, 1001)\n"));
        assert!(written.contains(
            "    begin_control_ex(Button, \"CVButton\", IDC_OK, \"{[Tooltip=\"\"Press\"\"]}Caption=\"\"OK\"\"\", 5, 30, 40, 12, WS_TABSTOP | 0, 0)\n"
        ));
        assert!(written.contains("    BEGIN_LAYER \"Buttons\" 0 1 END_LAYER\n"));
    }

    #[test]
    fn test_missing_slots_get_defaults() {
        let mut resource = DialogResource::new(Locale::Any, "1");
        resource.add_header("cvdialog.h");
        for language in Language::ALL {
            resource.string_files.insert(language, format!("{}.str", language.tag()));
        }
        resource.dialog.add_property(
            PropertyDefinition::identifier(labels::ID, "IDD_EMPTY"),
            AddPolicy::Positional,
        );

        let written = write_dialog(&resource).unwrap();
        assert!(written.contains("begin_dialog_definition_ex_(IDD_EMPTY, \"\", 0, 0, 0, 0, \"\", \"\", 0, \"\", 0)\n"));
        let reparsed = parse_text(&written);
        assert_eq!(reparsed.dialog_id().unwrap(), "IDD_EMPTY");
    }

    #[test]
    fn test_incomplete_resource_fails() {
        let resource = DialogResource::new(Locale::Any, "1");
        assert!(write_dialog(&resource).is_err());

        let mut resource = DialogResource::new(Locale::Any, "1");
        resource.add_header("cvdialog.h");
        let error = write_dialog(&resource).unwrap_err();
        assert!(error.to_string().contains("RES_US"));
    }

    #[test]
    fn test_write_strings() {
        let mut strings = StringMap::new();
        strings.insert(Language::English, "IDS_A", "Say \"\"hi\"\"");
        strings.insert(Language::English, "IDS_B", "");
        strings.insert(Language::German, "IDS_A", "Hallo");
        assert_eq!(
            write_strings(&strings, Language::English),
            "#define IDS_A \"Say \"\"hi\"\"\"\n#define IDS_B \"\"\n"
        );
        assert_eq!(write_strings(&strings, Language::Japanese), "");
    }

    #[test]
    fn test_labeled_properties_reparse_equal() {
        let source = SOURCE.replace(
            "define_dialog_property(HelpId, 42)",
            "define_dialog_property(\"Help Topic\", 3)\n    define_dialog_property(Frame, 0 | 0)",
        );
        let mut resource = parse_text(&source);
        assert_eq!(
            resource.dialog.property("Help Topic").unwrap().value,
            PropertyValue::Number(Some(3.0))
        );
        assert_eq!(
            resource.dialog.property("Frame").unwrap().value,
            PropertyValue::Flags(Flags::new(0))
        );

        // All names cleared from a labeled flags property.
        let mut edge = Flags::default();
        edge.insert("WS_EDGE", None);
        edge.remove("WS_EDGE", None);
        resource.dialog.add_property(
            PropertyDefinition::new("Edge", PropertyValue::Flags(edge)),
            AddPolicy::Labeled,
        );

        let written = write_dialog(&resource).unwrap();
        assert!(written.contains("    define_dialog_property(\"Help Topic\", 3)\n"));
        assert!(written.contains("    define_dialog_property(Edge, 0 | 0)\n"));
        assert_eq!(parse_text(&written), resource);
    }
}
