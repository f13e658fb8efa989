//! Embedded code blocks made of `prefix:Verb_name( arg, arg )` calls.
//!
//! A [`CodeBlock`] holds a declared schema of methods. Parsing binds each
//! call's arguments positionally to the matching method, and serializing
//! writes back only the methods that carry a value.
//!
//! `Add` methods accumulate: assigning a parameter that was already assigned
//! inserts a fresh copy of the method right after it. `Set` methods are
//! overwritten in place.

use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, opt, recognize},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodeBlockError {
    #[error("{found} was unexpected, expected {expected}")]
    PrefixMismatch { expected: String, found: String },
    #[error("Unknown {prefix} method: {method}")]
    UnknownMethod { prefix: String, method: String },
    #[error("{parameter} is not a parameter of {prefix}:{method}")]
    UnknownParameter {
        prefix: String,
        method: String,
        parameter: String,
    },
    #[error("Invalid {kind:?} value for {parameter}: {value}")]
    InvalidValue {
        parameter: String,
        kind: ParameterKind,
        value: String,
    },
    #[error("{method} takes {expected} parameters, found {found}")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("Malformed call on line {line}: {text}")]
    Syntax { line: usize, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MethodKind {
    Add,
    Set,
}

impl MethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::Add => "Add",
            MethodKind::Set => "Set",
        }
    }

    /// Parses the three letter verb that starts a method token.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Add" => Some(MethodKind::Add),
            "Set" => Some(MethodKind::Set),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    String,
    Float,
    Int,
    Boolean,
}

impl ParameterKind {
    pub fn default_value(self) -> ParameterValue {
        match self {
            ParameterKind::String => ParameterValue::String(None),
            ParameterKind::Float => ParameterValue::Float(0.0),
            ParameterKind::Int => ParameterValue::Int(0),
            ParameterKind::Boolean => ParameterValue::Boolean(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParameterValue {
    String(Option<String>),
    Float(f32),
    Int(i32),
    Boolean(bool),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::String(_) => ParameterKind::String,
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::Int(_) => ParameterKind::Int,
            ParameterValue::Boolean(_) => ParameterKind::Boolean,
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::String(Some(v.to_string()))
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        ParameterValue::String(Some(v))
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        ParameterValue::Int(v)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Boolean(v)
    }
}

/// Floats keep up to four decimals; negative values print in full.
pub fn format_float(v: f32) -> String {
    if v < 0.0 {
        return v.to_string();
    }
    let fixed = format!("{:.4}", v);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// A typed, named method argument.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    kind: ParameterKind,
    name: String,
    pretty_name: Option<String>,
    description: Option<String>,
    value: ParameterValue,
    force_output: bool,
    #[serde(skip)]
    assigned: bool,
}

// `assigned` is bookkeeping for Add accumulation and does not take part in equality.
impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.pretty_name == other.pretty_name
            && self.description == other.description
            && self.value == other.value
            && self.force_output == other.force_output
    }
}

impl Parameter {
    pub fn new(kind: ParameterKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            pretty_name: None,
            description: None,
            value: kind.default_value(),
            force_output: false,
            assigned: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::String, name)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::Float, name)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::Int, name)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::Boolean, name)
    }

    pub fn with_pretty_name(mut self, pretty_name: impl Into<String>) -> Self {
        self.pretty_name = Some(pretty_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Always write this parameter's method, even when the value is the default.
    pub fn forced(mut self) -> Self {
        self.force_output = true;
        self
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pretty_name(&self) -> Option<&str> {
        self.pretty_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    pub fn force_output(&self) -> bool {
        self.force_output
    }

    /// True when the value differs from the type default or output is forced.
    pub fn has_been_set(&self) -> bool {
        self.force_output
            || match &self.value {
                ParameterValue::String(v) => v.is_some(),
                ParameterValue::Float(v) => *v != 0.0,
                ParameterValue::Int(v) => *v != 0,
                ParameterValue::Boolean(v) => *v,
            }
    }

    pub fn formatted_value(&self) -> String {
        match &self.value {
            ParameterValue::String(v) => format!("\"{}\"", v.as_deref().unwrap_or("")),
            ParameterValue::Float(v) => format_float(*v),
            ParameterValue::Int(v) => v.to_string(),
            ParameterValue::Boolean(v) => (if *v { "true" } else { "false" }).to_string(),
        }
    }

    fn invalid(&self, value: impl Into<String>) -> CodeBlockError {
        CodeBlockError::InvalidValue {
            parameter: self.name.clone(),
            kind: self.kind,
            value: value.into(),
        }
    }

    /// Checks a programmatic value against this parameter's type.
    fn coerce(&self, value: ParameterValue) -> Result<ParameterValue, CodeBlockError> {
        match (self.kind, value) {
            (ParameterKind::String, ParameterValue::String(v)) => {
                Ok(ParameterValue::String(v.map(|s| s.replace('"', ""))))
            }
            (ParameterKind::Float, ParameterValue::Float(v)) => Ok(ParameterValue::Float(v)),
            (ParameterKind::Float, ParameterValue::Int(v)) => Ok(ParameterValue::Float(v as f32)),
            (ParameterKind::Int, ParameterValue::Int(v)) => Ok(ParameterValue::Int(v)),
            (ParameterKind::Boolean, ParameterValue::Boolean(v)) => Ok(ParameterValue::Boolean(v)),
            (_, other) => Err(self.invalid(format!("{:?}", other))),
        }
    }

    /// Converts an argument token from call text.
    fn parse_argument(&self, text: &str) -> Result<ParameterValue, CodeBlockError> {
        match self.kind {
            ParameterKind::String => {
                let text = text
                    .strip_prefix('\'')
                    .and_then(|t| t.strip_suffix('\''))
                    .unwrap_or(text);
                Ok(ParameterValue::String(Some(text.replace('"', ""))))
            }
            ParameterKind::Float => text
                .parse::<f32>()
                .map(ParameterValue::Float)
                .map_err(|_| self.invalid(text)),
            ParameterKind::Int => text
                .parse::<i32>()
                .map(ParameterValue::Int)
                .map_err(|_| self.invalid(text)),
            ParameterKind::Boolean => Ok(ParameterValue::Boolean(text == "true")),
        }
    }

    pub fn set_value(&mut self, value: impl Into<ParameterValue>) -> Result<(), CodeBlockError> {
        let value = self.coerce(value.into())?;
        self.store(value);
        Ok(())
    }

    fn store(&mut self, value: ParameterValue) {
        self.value = value;
        self.assigned = true;
    }

    fn reset(&mut self) {
        self.value = self.kind.default_value();
        self.assigned = false;
    }
}

/// A declared method and its parameter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    kind: MethodKind,
    name: String,
    parameters: Vec<Parameter>,
    has_been_set: bool,
}

impl Method {
    pub fn new(kind: MethodKind, name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            kind,
            name: name.into(),
            parameters,
            has_been_set: false,
        }
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_been_set(&self) -> bool {
        self.has_been_set
    }

    pub fn mark_set(&mut self) {
        self.has_been_set = true;
    }

    pub fn should_write(&self) -> bool {
        self.has_been_set || self.parameters.iter().any(Parameter::has_been_set)
    }

    /// Copy of the schema with every value back at its default.
    pub fn clone_reset(&self) -> Method {
        let mut method = self.clone();
        method.has_been_set = false;
        for parameter in &mut method.parameters {
            parameter.reset();
        }
        method
    }

    fn call_name(&self, underscored: bool) -> String {
        let separator = if underscored { "_" } else { "" };
        format!("{}{}{}", self.kind.as_str(), separator, self.name)
    }
}

/// A schema of methods plus the values assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBlock {
    prefix: String,
    underscored: bool,
    methods: Vec<Method>,
}

/// A concrete block type that knows how to declare its own schema.
pub trait BlockSchema {
    fn declare() -> CodeBlock;

    fn parse(text: &str) -> Result<CodeBlock, CodeBlockError> {
        let mut block = Self::declare();
        block.parse_text(text)?;
        Ok(block)
    }
}

/// Parses `text` against the schema declared by `S`.
pub fn parse<S: BlockSchema>(text: &str) -> Result<CodeBlock, CodeBlockError> {
    S::parse(text)
}

impl CodeBlock {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            underscored: true,
            methods: Vec::new(),
        }
    }

    /// Whether verb and name are joined with `_` (`Set_mass` vs `Setmass`).
    pub fn with_underscored(mut self, underscored: bool) -> Self {
        self.underscored = underscored;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn underscored(&self) -> bool {
        self.underscored
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The last instance of the named method.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().rev().find(|m| m.name == name)
    }

    pub fn add_method(&mut self, kind: MethodKind, name: impl Into<String>, parameters: Vec<Parameter>) {
        self.methods.push(Method::new(kind, name, parameters));
    }

    /// Declares several methods sharing one parameter list.
    pub fn add_methods(&mut self, kind: MethodKind, names: &[&str], parameters: Vec<Parameter>) {
        for name in names {
            self.add_method(kind, *name, parameters.clone());
        }
    }

    fn unknown_method(&self, method: &str) -> CodeBlockError {
        CodeBlockError::UnknownMethod {
            prefix: self.prefix.clone(),
            method: method.to_string(),
        }
    }

    fn last_instance(&self, name: &str, kind: Option<MethodKind>) -> Option<usize> {
        self.methods
            .iter()
            .rposition(|m| m.name == name && kind.map_or(true, |k| m.kind == k))
    }

    /// Picks the instance that receives parameter `param` of the method at `index`.
    /// An Add method whose parameter is already assigned gets a fresh copy
    /// inserted right after it.
    fn receiving_instance(&mut self, index: usize, param: usize) -> usize {
        let method = &self.methods[index];
        if method.kind == MethodKind::Add && method.parameters[param].assigned {
            let copy = method.clone_reset();
            self.methods.insert(index + 1, copy);
            index + 1
        } else {
            index
        }
    }

    pub fn set_parameter(
        &mut self,
        method: &str,
        parameter: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<(), CodeBlockError> {
        let index = self
            .last_instance(method, None)
            .ok_or_else(|| self.unknown_method(method))?;
        let param = self.methods[index]
            .parameters
            .iter()
            .position(|p| p.name == parameter)
            .ok_or_else(|| CodeBlockError::UnknownParameter {
                prefix: self.prefix.clone(),
                method: method.to_string(),
                parameter: parameter.to_string(),
            })?;

        let value = self.methods[index].parameters[param].coerce(value.into())?;
        let index = self.receiving_instance(index, param);
        let target = &mut self.methods[index];
        target.parameters[param].store(value);
        target.has_been_set = true;
        Ok(())
    }

    /// Sets several parameters of one method, in order.
    pub fn set_parameters<'a, V, I>(&mut self, method: &str, values: I) -> Result<(), CodeBlockError>
    where
        V: Into<ParameterValue>,
        I: IntoIterator<Item = (&'a str, V)>,
    {
        for (parameter, value) in values {
            self.set_parameter(method, parameter, value)?;
        }
        Ok(())
    }

    fn split_method_token<'a>(&self, token: &'a str) -> Option<(MethodKind, &'a str)> {
        let kind = MethodKind::from_code(token.get(..3)?)?;
        let rest = &token[3..];
        let name = if self.underscored {
            rest.strip_prefix('_')?
        } else {
            rest
        };
        Some((kind, name))
    }

    /// Reads call text into this block's declared methods.
    pub fn parse_text(&mut self, text: &str) -> Result<(), CodeBlockError> {
        for (i, line) in join_lines(text).iter().enumerate() {
            let call = tokenize_call(line).ok_or_else(|| CodeBlockError::Syntax {
                line: i + 1,
                text: line.clone(),
            })?;

            if call.prefix != self.prefix {
                return Err(CodeBlockError::PrefixMismatch {
                    expected: self.prefix.clone(),
                    found: call.prefix.to_string(),
                });
            }

            let (kind, name) = self
                .split_method_token(call.method)
                .ok_or_else(|| self.unknown_method(call.method))?;
            let mut index = self
                .last_instance(name, Some(kind))
                .ok_or_else(|| self.unknown_method(call.method))?;

            let expected = self.methods[index].parameters.len();
            if call.args.len() > expected {
                return Err(CodeBlockError::ArgumentCount {
                    method: call.method.to_string(),
                    expected,
                    found: call.args.len(),
                });
            }
            debug!("{}:{} with {} argument(s)", call.prefix, call.method, call.args.len());

            if call.args.is_empty() {
                if kind == MethodKind::Add && self.methods[index].has_been_set {
                    let copy = self.methods[index].clone_reset();
                    self.methods.insert(index + 1, copy);
                    index += 1;
                }
                self.methods[index].has_been_set = true;
                continue;
            }

            let values = call
                .args
                .iter()
                .zip(&self.methods[index].parameters)
                .map(|(arg, p)| p.parse_argument(arg))
                .collect::<Result<Vec<_>, _>>()?;

            // Forced methods are written even when untouched; reading one back
            // with unchanged values must not mark it as set.
            let method = &self.methods[index];
            if !method.has_been_set
                && method.should_write()
                && values.iter().zip(&method.parameters).all(|(v, p)| *v == p.value)
            {
                continue;
            }

            for (param, value) in values.into_iter().enumerate() {
                index = self.receiving_instance(index, param);
                let target = &mut self.methods[index];
                target.parameters[param].store(value);
                target.has_been_set = true;
            }
        }

        Ok(())
    }

    /// One call per method that should be written, separated by newlines.
    pub fn to_text(&self) -> String {
        self.methods
            .iter()
            .filter(|m| m.should_write())
            .map(|m| {
                let args: Vec<String> = m.parameters.iter().map(Parameter::formatted_value).collect();
                format!(
                    "{}:{}( {} )",
                    self.prefix,
                    m.call_name(self.underscored),
                    args.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// ============================================================================
// Call tokenizer
// ============================================================================

type ParseResult<'a, T> = IResult<&'a str, T>;

/// Drops comments and blank lines and re-attaches dangling `)` lines.
fn join_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("--"))
        .map(str::to_string)
        .collect();

    let mut i = lines.len();
    while i > 1 {
        i -= 1;
        if lines[i] == ")" && !lines[i - 1].ends_with(')') {
            lines[i - 1].push_str(" )");
            lines.remove(i);
        }
    }

    lines
}

struct Call<'a> {
    prefix: &'a str,
    method: &'a str,
    args: Vec<&'a str>,
}

fn identifier(input: &str) -> ParseResult<&str> {
    delimited(
        multispace0,
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
        multispace0,
    )(input)
}

fn quoted(input: &str) -> ParseResult<&str> {
    alt((
        recognize(delimited(char('"'), opt(is_not("\"")), char('"'))),
        recognize(delimited(char('\''), opt(is_not("'")), char('\''))),
    ))(input)
}

fn bare(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| !c.is_whitespace() && !matches!(c, ',' | '(' | ')'))(input)
}

fn argument(input: &str) -> ParseResult<&str> {
    delimited(multispace0, alt((quoted, bare)), multispace0)(input)
}

fn call(input: &str) -> ParseResult<Call> {
    let (input, prefix) = identifier(input)?;
    let (input, _) = char(':')(input)?;
    let (input, method) = identifier(input)?;
    let (input, _) = char('(')(input)?;
    let (input, args) = separated_list0(char(','), argument)(input)?;
    let (input, _) = delimited(multispace0, char(')'), multispace0)(input)?;
    Ok((input, Call { prefix, method, args }))
}

fn tokenize_call(line: &str) -> Option<Call> {
    all_consuming(call)(line).ok().map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Accessory;

    impl BlockSchema for Accessory {
        fn declare() -> CodeBlock {
            let mut block = CodeBlock::new("accessory");
            block.add_method(MethodKind::Set, "mass", vec![Parameter::float("mass")]);
            block.add_method(
                MethodKind::Add,
                "part",
                vec![
                    Parameter::string("name").with_pretty_name("Part name"),
                    Parameter::float("scale"),
                ],
            );
            block.add_methods(
                MethodKind::Set,
                &["drivable", "breakable"],
                vec![Parameter::boolean("enabled")],
            );
            block.add_method(
                MethodKind::Set,
                "lod",
                vec![Parameter::int("level").forced().with_description("Lowest LOD")],
            );
            block
        }
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(-1.5), "-1.5");
        assert_eq!(format_float(1.23456), "1.2346");
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(10.5), "10.5");
    }

    #[test]
    fn test_untouched_block_writes_only_forced() {
        let block = Accessory::declare();
        assert_eq!(block.to_text(), "accessory:Set_lod( 0 )");
        assert!(!block.method("mass").unwrap().should_write());
        assert!(block.method("lod").unwrap().should_write());
    }

    #[test]
    fn test_add_method_accumulates() {
        let mut block = Accessory::declare();
        block.set_parameter("part", "name", "wing").unwrap();
        block.set_parameter("part", "scale", 1.5f32).unwrap();
        block.set_parameter("part", "name", "bumper").unwrap();
        block.set_parameter("part", "scale", -2.25f32).unwrap();

        let parts: Vec<_> = block.methods().iter().filter(|m| m.name() == "part").collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            block.to_text(),
            "accessory:Add_part( \"wing\", 1.5 )\naccessory:Add_part( \"bumper\", -2.25 )\naccessory:Set_lod( 0 )"
        );
    }

    #[test]
    fn test_set_method_overwrites() {
        let mut block = Accessory::declare();
        block.set_parameter("mass", "mass", 900.0f32).unwrap();
        block.set_parameter("mass", "mass", 1234.56789f32).unwrap();
        assert_eq!(block.methods().iter().filter(|m| m.name() == "mass").count(), 1);
        assert!(block.to_text().starts_with("accessory:Set_mass( 1234.5679 )"));
    }

    #[test]
    fn test_set_parameters_in_order() {
        let mut block = Accessory::declare();
        block
            .set_parameters("part", [("name", ParameterValue::from("door")), ("scale", 2i32.into())])
            .unwrap();
        let part = block.method("part").unwrap();
        assert_eq!(part.parameter("scale").unwrap().value(), &ParameterValue::Float(2.0));
        assert_eq!(part.parameter("name").unwrap().pretty_name(), Some("Part name"));
    }

    #[test]
    fn test_unknown_names() {
        let mut block = Accessory::declare();
        assert!(matches!(
            block.set_parameter("wheels", "count", 4i32),
            Err(CodeBlockError::UnknownMethod { .. })
        ));
        assert!(matches!(
            block.set_parameter("mass", "weight", 4.0f32),
            Err(CodeBlockError::UnknownParameter { .. })
        ));
        assert!(matches!(
            block.set_parameter("mass", "mass", true),
            Err(CodeBlockError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_call_text() {
        let text = "
-- generated
accessory:Set_mass( 950.5 )

accessory:Add_part( \"spoiler, rear\", 0.75 )
accessory:Add_part( \"skirt\", 1
)
accessory:Set_drivable( true )
";
        let block = Accessory::parse(text).unwrap();
        assert_eq!(
            block.method("mass").unwrap().parameter("mass").unwrap().value(),
            &ParameterValue::Float(950.5)
        );
        let names: Vec<_> = block
            .methods()
            .iter()
            .filter(|m| m.name() == "part")
            .map(|m| m.parameter("name").unwrap().value().clone())
            .collect();
        assert_eq!(
            names,
            vec![
                ParameterValue::String(Some("spoiler, rear".to_string())),
                ParameterValue::String(Some("skirt".to_string())),
            ]
        );
        assert_eq!(
            block.to_text(),
            "accessory:Set_mass( 950.5 )\naccessory:Add_part( \"spoiler, rear\", 0.75 )\naccessory:Add_part( \"skirt\", 1 )\naccessory:Set_drivable( true )\naccessory:Set_lod( 0 )"
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "accessory:Set_mass( 800 )\naccessory:Add_part( \"a\", 1.25 )\naccessory:Add_part( \"b\", -3.5 )\naccessory:Set_breakable( false )\naccessory:Set_lod( 2 )";
        let first = Accessory::parse(text).unwrap();
        let second = parse::<Accessory>(&first.to_text()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_is_idempotent_with_untouched_forced_method() {
        let first = Accessory::parse("accessory:Set_mass( 800 )").unwrap();
        let text = first.to_text();
        assert_eq!(text, "accessory:Set_mass( 800 )\naccessory:Set_lod( 0 )");

        let second = Accessory::parse(&text).unwrap();
        assert_eq!(first, second);
        assert!(!second.method("lod").unwrap().has_been_set());
        assert_eq!(second.to_text(), text);
    }

    #[test]
    fn test_parse_forced_method_with_new_value() {
        let block = Accessory::parse("accessory:Set_lod( 3 )").unwrap();
        let lod = block.method("lod").unwrap();
        assert!(lod.has_been_set());
        assert_eq!(lod.parameter("level").unwrap().value(), &ParameterValue::Int(3));
    }

    #[test]
    fn test_parse_repeated_set_keeps_latest() {
        let block = Accessory::parse("accessory:Set_mass( 1 )\naccessory:Set_mass( 2 )").unwrap();
        assert_eq!(block.to_text(), "accessory:Set_mass( 2 )\naccessory:Set_lod( 0 )");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Accessory::parse("vehicle:Set_mass( 1 )"),
            Err(CodeBlockError::PrefixMismatch { .. })
        ));
        assert!(matches!(
            Accessory::parse("accessory:Set_colour( 1 )"),
            Err(CodeBlockError::UnknownMethod { .. })
        ));
        assert!(matches!(
            Accessory::parse("accessory:Add_mass( 1 )"),
            Err(CodeBlockError::UnknownMethod { .. })
        ));
        assert!(matches!(
            Accessory::parse("accessory:Set_mass( heavy )"),
            Err(CodeBlockError::InvalidValue { .. })
        ));
        assert!(matches!(
            Accessory::parse("accessory:Set_mass( 1, 2 )"),
            Err(CodeBlockError::ArgumentCount { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            Accessory::parse("accessory Set_mass 1"),
            Err(CodeBlockError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_not_underscored_schema() {
        let mut block = CodeBlock::new("physics").with_underscored(false);
        block.add_method(MethodKind::Set, "Gravity", vec![Parameter::float("g")]);
        block.parse_text("physics:SetGravity( 9.81 )").unwrap();
        assert_eq!(block.to_text(), "physics:SetGravity( 9.81 )");
        assert!(block.parse_text("physics:Set_Gravity( 1 )").is_err());
    }

    #[test]
    fn test_empty_argument_list_marks_method() {
        let mut block = CodeBlock::new("fx");
        block.add_method(MethodKind::Set, "enabled", vec![]);
        block.parse_text("fx:Set_enabled(  )").unwrap();
        assert_eq!(block.to_text(), "fx:Set_enabled(  )");
    }

    #[test]
    fn test_clone_resets_values_not_schema() {
        let mut method = Method::new(
            MethodKind::Add,
            "part",
            vec![Parameter::string("name").with_description("mesh").forced()],
        );
        method.parameters[0].set_value("wing").unwrap();
        method.mark_set();
        let copy = method.clone_reset();
        assert!(!copy.has_been_set());
        assert_eq!(copy.parameters()[0].value(), &ParameterValue::String(None));
        assert_eq!(copy.parameters()[0].description(), Some("mesh"));
        assert!(copy.parameters()[0].force_output());
    }
}
