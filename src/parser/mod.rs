//! Recursive-descent parser turning CV dialog tokens into a [`DialogResource`].
//!
//! The grammar is fixed and shallow: an include prelude, one dialog
//! definition with its property, declaration and control sections, and an
//! optional layer block hidden in `#if 0`. Any mismatch aborts the parse with
//! an `expected X, got Y` error; there is no recovery.

pub mod serialized;
pub mod strings;

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    error::Error,
    lexer::{Directive, Keyword, Token, TokenKind},
    locale::{Language, Locale},
    schema::{FlagResolver, NoFlagValues},
    types::{
        AddPolicy, ControlDefinition, DialogResource, Flags, Layer, PhysicalType,
        PropertyDefinition, PropertyValue, labels,
    },
};

pub use serialized::{parse_serialized, write_serialized};
pub use strings::parse_strings;

lazy_static! {
    static ref VERSION_REGEX: Regex =
        Regex::new(r"Version\s*\[?\s*(\d+(?:\.\d+)*)\s*\]?").unwrap();
}

/// Distance from `begin_control_ex` to the id argument:
/// `begin_control_ex ( type , class , id`.
const CONTROL_ID_LOOKAHEAD: usize = 6;

/// What a positional argument slot accepts.
#[derive(Debug, Clone, Copy)]
enum SlotKind {
    Typed(&'static [PhysicalType]),
    /// The `{[label=value]...}` string, expanded into several properties.
    Serialized,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    label: &'static str,
    kind: SlotKind,
}

const NUMBER: &[PhysicalType] = &[PhysicalType::Number];
const STRING: &[PhysicalType] = &[PhysicalType::String];
const FLAGS: &[PhysicalType] = &[PhysicalType::Flags];
const ID: &[PhysicalType] = &[PhysicalType::Identifier, PhysicalType::Number];
const TEXT: &[PhysicalType] = &[PhysicalType::Identifier, PhysicalType::String];
const CTRL_TYPE: &[PhysicalType] = &[PhysicalType::Identifier];

const fn typed(label: &'static str, types: &'static [PhysicalType]) -> Slot {
    Slot {
        label,
        kind: SlotKind::Typed(types),
    }
}

const fn serialized(label: &'static str) -> Slot {
    Slot {
        label,
        kind: SlotKind::Serialized,
    }
}

/// Argument slots of `begin_dialog_definition_ex_`.
const DIALOG_SLOTS: &[Slot] = &[
    typed(labels::ID, ID),
    serialized("serialized"),
    typed(labels::LEFT, NUMBER),
    typed(labels::TOP, NUMBER),
    typed(labels::WIDTH, NUMBER),
    typed(labels::HEIGHT, NUMBER),
    typed(labels::TEXT, TEXT),
    typed(labels::RESOURCE_CLASS, STRING),
    typed(labels::STYLE_FLAGS, FLAGS),
    typed(labels::FONT, STRING),
    typed(labels::FONT_SIZE, NUMBER),
];

/// Argument slots of `begin_control_ex`.
const CONTROL_SLOTS: &[Slot] = &[
    typed(labels::CTRL_TYPE, CTRL_TYPE),
    typed(labels::RESOURCE_CLASS, STRING),
    typed(labels::ID, ID),
    serialized("caption"),
    typed(labels::LEFT, NUMBER),
    typed(labels::TOP, NUMBER),
    typed(labels::WIDTH, NUMBER),
    typed(labels::HEIGHT, NUMBER),
    typed(labels::STYLE_FLAGS, FLAGS),
    typed(labels::EXT_STYLE_FLAGS, FLAGS),
];

/// Labels written positionally for the dialog, in argument order.
pub(crate) fn dialog_positional_labels() -> impl Iterator<Item = Option<&'static str>> {
    positional_labels(DIALOG_SLOTS)
}

/// Labels written positionally for a control, in argument order.
pub(crate) fn control_positional_labels() -> impl Iterator<Item = Option<&'static str>> {
    positional_labels(CONTROL_SLOTS)
}

/// `None` marks the serialized slot.
fn positional_labels(slots: &'static [Slot]) -> impl Iterator<Item = Option<&'static str>> {
    slots.iter().map(|slot| match slot.kind {
        SlotKind::Typed(_) => Some(slot.label),
        SlotKind::Serialized => None,
    })
}

/// Options for [`parse_with_options`].
#[derive(Clone, Copy)]
pub struct ParseOptions<'a> {
    flag_resolver: &'a dyn FlagResolver,
}

static NO_FLAG_VALUES: NoFlagValues = NoFlagValues;

impl Default for ParseOptions<'_> {
    fn default() -> Self {
        Self {
            flag_resolver: &NO_FLAG_VALUES,
        }
    }
}

impl<'a> ParseOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves bit values of named flags while parsing.
    pub fn with_flag_resolver(mut self, flag_resolver: &'a dyn FlagResolver) -> Self {
        self.flag_resolver = flag_resolver;
        self
    }
}

/// Parses one locale's dialog file.
///
/// Returns `Ok(None)` when the file only includes another `.dlg` file, which
/// tells the caller the real content lives elsewhere.
pub fn parse(tokens: &[Token], locale: Locale) -> Result<Option<DialogResource>, Error> {
    parse_with_options(tokens, locale, ParseOptions::default())
}

pub fn parse_with_options(
    tokens: &[Token],
    locale: Locale,
    options: ParseOptions<'_>,
) -> Result<Option<DialogResource>, Error> {
    let mut parser = Parser::new(tokens, options.flag_resolver);

    let Some(prelude) = parser.prelude()? else {
        debug!("{} dialog file only includes another dialog file", locale);
        return Ok(None);
    };

    let mut resource = DialogResource::new(locale, prelude.version);
    for header in prelude.headers {
        resource.add_header(header);
    }
    resource.string_files = prelude.string_files;

    parser.dialog_definition(&mut resource)?;
    resource.layers = parser.layers()?;
    parser.end_of_input()?;

    debug!(
        "parsed dialog `{}` for {} with {} controls",
        resource.dialog_id().unwrap_or_default(),
        locale,
        resource.dialog.control_count()
    );
    Ok(Some(resource))
}

struct Prelude {
    headers: Vec<String>,
    version: String,
    string_files: BTreeMap<Language, String>,
}

/// `#ifdef`/`#elif defined` chain selecting one include per language.
struct GuardChain {
    includes: Vec<(Language, String)>,
    error_message: Option<String>,
}

fn is_dialog_file(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".dlg")
}

/// Cursor over a token slice. Comments are invisible to everything except the
/// raw accessors used for the version comment.
pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    flag_resolver: &'t dyn FlagResolver,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token], flag_resolver: &'t dyn FlagResolver) -> Self {
        Self {
            tokens,
            cursor: 0,
            flag_resolver,
        }
    }

    fn peek_raw(&self, offset: usize) -> Option<&'t Token> {
        self.tokens.get(self.cursor + offset)
    }

    /// The significant token `offset` places ahead, without consuming anything.
    fn peek_ahead(&self, offset: usize) -> Option<&'t Token> {
        let tokens: &'t [Token] = self.tokens;
        tokens
            .get(self.cursor..)?
            .iter()
            .filter(|token| !matches!(token, Token::Comment(_)))
            .nth(offset)
    }

    fn skip_comments(&mut self) {
        while let Some(Token::Comment(_)) = self.peek_raw(0) {
            self.cursor += 1;
        }
    }

    /// Next significant token, without consuming it.
    pub(crate) fn peek(&mut self) -> Option<&'t Token> {
        self.skip_comments();
        self.peek_raw(0)
    }

    pub(crate) fn next(&mut self) -> Option<&'t Token> {
        self.skip_comments();
        let token = self.peek_raw(0);
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    pub(crate) fn unexpected(expected: impl Into<String>, found: Option<&Token>) -> Error {
        let found = match found {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        };
        Error::syntax(expected, found)
    }

    fn expect_kind(&mut self, kind: TokenKind) -> Result<&'t Token, Error> {
        match self.next() {
            Some(token) if token.kind() == kind => Ok(token),
            other => Err(Self::unexpected(kind.to_string(), other)),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), Error> {
        match self.next() {
            Some(Token::Keyword(found)) if *found == keyword => Ok(()),
            other => Err(Self::unexpected(
                format!("keyword `{}`", keyword.as_str()),
                other,
            )),
        }
    }

    pub(crate) fn expect_directive(&mut self, directive: Directive) -> Result<(), Error> {
        match self.next() {
            Some(Token::Directive(found)) if *found == directive => Ok(()),
            other => Err(Self::unexpected(
                format!("directive `{}`", directive.as_str()),
                other,
            )),
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<&'t str, Error> {
        match self.next() {
            Some(Token::Identifier(name)) => Ok(name),
            other => Err(Self::unexpected("identifier", other)),
        }
    }

    pub(crate) fn expect_string(&mut self) -> Result<&'t str, Error> {
        match self.next() {
            Some(Token::String(value)) => Ok(value),
            other => Err(Self::unexpected("string", other)),
        }
    }

    fn expect_named_identifier(&mut self, name: &str) -> Result<(), Error> {
        match self.next() {
            Some(Token::Identifier(found)) if found == name => Ok(()),
            other => Err(Self::unexpected(format!("`{}`", name), other)),
        }
    }

    /// `keyword ( )`
    fn empty_call(&mut self, keyword: Keyword) -> Result<(), Error> {
        self.expect_keyword(keyword)?;
        self.expect_kind(TokenKind::OpenParen)?;
        self.expect_kind(TokenKind::CloseParen)?;
        Ok(())
    }

    fn peek_is_keyword(&mut self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(found)) if *found == keyword)
    }

    fn peek_is_directive(&mut self, directive: Directive) -> bool {
        matches!(self.peek(), Some(Token::Directive(found)) if *found == directive)
    }

    fn end_of_input(&mut self) -> Result<(), Error> {
        match self.peek() {
            None => Ok(()),
            other => Err(Self::unexpected("end of input", other)),
        }
    }

    fn include(&mut self) -> Result<&'t str, Error> {
        self.expect_directive(Directive::Include)?;
        self.expect_string()
    }

    fn prelude(&mut self) -> Result<Option<Prelude>, Error> {
        // A file that only forwards to another dialog file, per language or not.
        if self.peek_is_directive(Directive::Ifdef) || self.peek_is_directive(Directive::If) {
            let chain = self.guard_chain()?;
            if chain.includes.iter().all(|(_, file)| is_dialog_file(file)) {
                self.end_of_input()?;
                return Ok(None);
            }
            return Err(Error::syntax(
                "header `#include` before the language includes",
                "language guard",
            ));
        }

        let first = self.include()?;
        if is_dialog_file(first) {
            self.end_of_input()?;
            return Ok(None);
        }

        let mut headers = vec![first.to_string()];
        let mut version = None;
        loop {
            match self.peek_raw(0) {
                Some(Token::Directive(Directive::Include)) => {
                    headers.push(self.include()?.to_string());
                }
                Some(Token::Comment(text)) => {
                    self.cursor += 1;
                    if version.is_none() {
                        version = VERSION_REGEX
                            .captures(text)
                            .and_then(|captures| captures.get(1))
                            .map(|found| found.as_str().to_string());
                    }
                }
                _ => break,
            }
        }
        let version = version.ok_or_else(|| {
            Self::unexpected("`// Version [n.n]` comment", self.peek_raw(0))
        })?;

        let chain = self.guard_chain()?;
        if chain.error_message.is_none() {
            return Err(Error::syntax(
                "`#else` / `#error` closing the language includes",
                "`#endif`",
            ));
        }
        let mut string_files = BTreeMap::new();
        for (language, file) in chain.includes {
            string_files.insert(language, file);
        }
        if let Some(missing) = Language::ALL
            .into_iter()
            .find(|language| !string_files.contains_key(language))
        {
            return Err(Error::syntax(
                format!("string file include for `{}`", missing.macro_name()),
                "`#else`",
            ));
        }

        Ok(Some(Prelude {
            headers,
            version,
            string_files,
        }))
    }

    /// Parses `#ifdef M #include ... (#elif defined M #include ...)* [#else
    /// #error "..."] #endif`.
    fn guard_chain(&mut self) -> Result<GuardChain, Error> {
        let mut includes: Vec<(Language, String)> = Vec::new();

        match self.next() {
            Some(Token::Directive(Directive::Ifdef)) => {}
            Some(Token::Directive(Directive::If)) => self.expect_named_identifier("defined")?,
            other => return Err(Self::unexpected("`#ifdef`", other)),
        }
        loop {
            let name = self.expect_identifier()?;
            let language = Language::from_macro_name(name)
                .ok_or_else(|| Error::syntax("language macro", format!("identifier `{}`", name)))?;
            if includes.iter().any(|(existing, _)| *existing == language) {
                return Err(Error::syntax(
                    "a different language macro",
                    format!("duplicate `{}`", name),
                ));
            }
            let file = self.include()?;
            includes.push((language, file.to_string()));

            match self.next() {
                Some(Token::Directive(Directive::Elif)) => {
                    self.expect_named_identifier("defined")?;
                }
                Some(Token::Directive(Directive::Else)) => {
                    self.expect_directive(Directive::Error)?;
                    let message = self.expect_string()?;
                    self.expect_directive(Directive::Endif)?;
                    return Ok(GuardChain {
                        includes,
                        error_message: Some(message.to_string()),
                    });
                }
                Some(Token::Directive(Directive::Endif)) => {
                    return Ok(GuardChain {
                        includes,
                        error_message: None,
                    });
                }
                other => return Err(Self::unexpected("`#elif defined` or `#else`", other)),
            }
        }
    }

    fn dialog_definition(&mut self, resource: &mut DialogResource) -> Result<(), Error> {
        self.expect_keyword(Keyword::BeginDialogDefinition)?;
        self.expect_kind(TokenKind::OpenParen)?;
        for (property, policy) in self.positional(DIALOG_SLOTS)? {
            resource.dialog.add_property(property, policy);
        }

        self.empty_call(Keyword::BeginDialogProperties)?;
        while self.peek_is_keyword(Keyword::DefineDialogProperty) {
            let property = self.labeled_property()?;
            resource.dialog.add_property(property, AddPolicy::Labeled);
        }
        self.empty_call(Keyword::EndDialogProperties)?;

        while self.peek_is_keyword(Keyword::DeclareControl) {
            let control = self.control_declaration()?;
            resource.dialog.declare_control(control)?;
        }

        self.empty_call(Keyword::BeginControlDefinitions)?;
        while self.peek_is_keyword(Keyword::BeginControl) {
            self.control_definition(resource)?;
        }
        self.empty_call(Keyword::EndControlDefinitions)?;
        self.empty_call(Keyword::EndDialogDefinition)?;
        Ok(())
    }

    /// Parses the argument list after `(` against `slots`, consuming the
    /// closing `)`.
    fn positional(
        &mut self,
        slots: &[Slot],
    ) -> Result<Vec<(PropertyDefinition, AddPolicy)>, Error> {
        let mut properties = Vec::new();
        for (index, slot) in slots.iter().enumerate() {
            match slot.kind {
                SlotKind::Typed(types) => {
                    let value = self.typed_value(slot.label, types)?;
                    properties.push((PropertyDefinition::new(slot.label, value), AddPolicy::Positional));
                }
                SlotKind::Serialized => {
                    let text = self.expect_string()?;
                    for property in parse_serialized(text)? {
                        properties.push((property, AddPolicy::Serialized));
                    }
                }
            }

            let terminator = if index + 1 == slots.len() {
                TokenKind::CloseParen
            } else {
                TokenKind::Comma
            };
            self.expect_kind(terminator)?;
        }
        Ok(properties)
    }

    fn typed_value(
        &mut self,
        label: &str,
        types: &[PhysicalType],
    ) -> Result<PropertyValue, Error> {
        if types.contains(&PhysicalType::Flags) {
            return self.flags().map(PropertyValue::Flags);
        }

        let token = self.next();
        let value = match token {
            Some(Token::Number(value)) => PropertyValue::Number(Some(*value)),
            Some(Token::String(value)) => PropertyValue::String(value.clone()),
            Some(Token::Identifier(name)) => PropertyValue::Identifier(name.clone()),
            other => return Err(Self::unexpected(describe_types(label, types), other)),
        };
        if types.contains(&value.physical_type()) {
            Ok(value)
        } else {
            Err(Self::unexpected(describe_types(label, types), token))
        }
    }

    /// `NAME | NAME | ... number`
    fn flags(&mut self) -> Result<Flags, Error> {
        self.remaining_flags(Flags::default())
    }

    fn remaining_flags(&mut self, mut flags: Flags) -> Result<Flags, Error> {
        loop {
            match self.next() {
                Some(Token::Identifier(name)) => {
                    flags.insert(name.clone(), self.flag_resolver.flag_value(name));
                    self.expect_kind(TokenKind::BinaryOr)?;
                }
                Some(Token::Number(value)) => {
                    flags.or_value(*value as i64);
                    return Ok(flags);
                }
                other => return Err(Self::unexpected("flag name or number", other)),
            }
        }
    }

    /// `define_dialog_property ( label , value )`
    fn labeled_property(&mut self) -> Result<PropertyDefinition, Error> {
        self.expect_keyword(Keyword::DefineDialogProperty)?;
        self.expect_kind(TokenKind::OpenParen)?;
        let label = match self.next() {
            Some(Token::Identifier(label)) | Some(Token::String(label)) => label.clone(),
            other => return Err(Self::unexpected("property label", other)),
        };
        self.expect_kind(TokenKind::Comma)?;

        let value = match self.next() {
            Some(Token::Number(value)) => {
                if let Some(Token::BinaryOr) = self.peek() {
                    self.next();
                    let flags = Flags::new(*value as i64);
                    PropertyValue::Flags(self.remaining_flags(flags)?)
                } else {
                    PropertyValue::Number(Some(*value))
                }
            }
            Some(Token::String(value)) => PropertyValue::String(value.clone()),
            Some(Token::Identifier(name)) => {
                if let Some(Token::BinaryOr) = self.peek() {
                    self.next();
                    let mut flags = Flags::default();
                    flags.insert(name.clone(), self.flag_resolver.flag_value(name));
                    PropertyValue::Flags(self.remaining_flags(flags)?)
                } else {
                    PropertyValue::Identifier(name.clone())
                }
            }
            other => {
                return Err(Self::unexpected(
                    format!("value for `{}`", label),
                    other,
                ));
            }
        };
        self.expect_kind(TokenKind::CloseParen)?;
        Ok(PropertyDefinition::new(label, value))
    }

    /// `declare_control ( type , id )`
    fn control_declaration(&mut self) -> Result<ControlDefinition, Error> {
        self.expect_keyword(Keyword::DeclareControl)?;
        self.expect_kind(TokenKind::OpenParen)?;
        let ctrl_type = self.expect_identifier()?;
        self.expect_kind(TokenKind::Comma)?;
        let id = self.typed_value(labels::ID, ID)?;
        self.expect_kind(TokenKind::CloseParen)?;
        ControlDefinition::declare(ctrl_type, id)
    }

    /// `begin_control_ex ( ... ) end_control_ex ( )`
    fn control_definition(&mut self, resource: &mut DialogResource) -> Result<(), Error> {
        let key = match self.peek_ahead(CONTROL_ID_LOOKAHEAD) {
            Some(Token::Identifier(name)) => name.clone(),
            Some(Token::Number(value)) => value.to_string(),
            other => return Err(Self::unexpected("control id", other)),
        };

        self.expect_keyword(Keyword::BeginControl)?;
        self.expect_kind(TokenKind::OpenParen)?;
        let properties = self.positional(CONTROL_SLOTS)?;
        self.empty_call(Keyword::EndControl)?;

        let control = resource.dialog.control_mut(&key).ok_or_else(|| {
            Error::invalid_resource(format!("control `{}` is defined but not declared", key))
        })?;
        for (property, policy) in properties {
            control.add_property(property, policy)?;
        }
        Ok(())
    }

    /// `#if 0 BEGIN_LAYERS (BEGIN_LAYER "name" n* END_LAYER)* END_LAYERS #endif`
    fn layers(&mut self) -> Result<Vec<Layer>, Error> {
        let mut layers = Vec::new();
        if !self.peek_is_directive(Directive::If) {
            return Ok(layers);
        }

        self.expect_directive(Directive::If)?;
        match self.next() {
            Some(Token::Number(value)) if *value == 0.0 => {}
            other => return Err(Self::unexpected("`0`", other)),
        }
        self.expect_keyword(Keyword::BeginLayers)?;
        loop {
            match self.next() {
                Some(Token::Keyword(Keyword::BeginLayer)) => {
                    let mut layer = Layer::new(self.expect_string()?);
                    while let Some(Token::Number(value)) = self.peek() {
                        layer.insert(*value as i64);
                        self.next();
                    }
                    self.expect_keyword(Keyword::EndLayer)?;
                    layers.push(layer);
                }
                Some(Token::Keyword(Keyword::EndLayers)) => break,
                other => return Err(Self::unexpected("`BEGIN_LAYER` or `END_LAYERS`", other)),
            }
        }
        self.expect_directive(Directive::Endif)?;
        Ok(layers)
    }
}

fn describe_types(label: &str, types: &[PhysicalType]) -> String {
    let names: Vec<String> = types.iter().map(PhysicalType::to_string).collect();
    format!("{} for `{}`", names.join(" or "), label)
}
