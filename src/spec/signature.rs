//! Parser for the compact signature notation
//! `Name(arg type, ...) (ret type, ...)`.

use std::collections::HashSet;
use std::fmt;

use super::argtype::{self, validate_type};
use crate::error::SpecError;
use crate::naming::{is_lower_case_identifier, is_upper_case_identifier, to_snake_case};

/// Raw request body marker, legal only as an input argument.
pub const HTTP_REQUEST_BODY: &str = "httpRequestBody";
/// Raw response body marker, legal only as the last output argument.
pub const HTTP_RESPONSE_BODY: &str = "httpResponseBody";
/// Status code marker, legal only as an output argument.
pub const HTTP_STATUS_CODE: &str = "httpStatusCode";

const RESERVED_PREFIXES: [&str; 2] = ["Mock", "Test"];

/// Methods every generated `Service` already has, in snake_case.
const RESERVED_NAMES: &[&str] = &[
    "new",
    "default",
    "connector",
    "dispatch",
    "on_startup",
    "on_shutdown",
    "on_config_changed",
    "on_observe_metrics",
];

/// A named, typed argument. `ty` is `None` for the untyped `any` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub ty: Option<String>,
}

impl Argument {
    /// The type as written, with `any` for the untyped marker.
    pub fn type_str(&self) -> &str {
        self.ty.as_deref().unwrap_or("any")
    }

    pub fn rust_type(&self) -> String {
        argtype::rust_type(self.ty.as_deref())
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.type_str())
    }
}

/// A handler name plus its ordered input and output arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub inputs: Vec<Argument>,
    pub outputs: Vec<Argument>,
}

fn join_args(args: &[Argument], with_types: bool) -> String {
    args.iter()
        .map(|a| {
            if with_types {
                a.to_string()
            } else {
                a.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `, a, b` for a non-empty list, nothing otherwise.
pub fn comma_leading(s: String) -> String {
    if s.is_empty() {
        s
    } else {
        format!(", {s}")
    }
}

/// `a, b, ` for a non-empty list, nothing otherwise.
pub fn comma_trailing(s: String) -> String {
    if s.is_empty() {
        s
    } else {
        format!("{s}, ")
    }
}

impl Signature {
    /// Parse a signature line.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Signature`] naming the malformed element.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let line = text.trim();
        let err = |reason: String| SpecError::signature(line, reason);
        if line.is_empty() {
            return Err(err("empty signature".to_string()));
        }

        let (name, in_text, out_text) = match line.find('(') {
            None => {
                if line.contains(')') {
                    return Err(err("unexpected closing parenthesis".to_string()));
                }
                (line, "", "")
            }
            Some(open) => {
                let name = line[..open].trim();
                let rest = &line[open + 1..];
                let close = rest
                    .find(')')
                    .ok_or_else(|| err("missing closing parenthesis in input arguments".to_string()))?;
                let in_text = &rest[..close];
                if in_text.contains('(') {
                    return Err(err("missing closing parenthesis in input arguments".to_string()));
                }
                let after = rest[close + 1..].trim();
                let out_text = if after.is_empty() {
                    ""
                } else {
                    let inner = after
                        .strip_prefix('(')
                        .ok_or_else(|| err(format!("unexpected text '{after}'")))?;
                    let inner = inner.strip_suffix(')').ok_or_else(|| {
                        err("missing closing parenthesis in output arguments".to_string())
                    })?;
                    if inner.contains('(') || inner.contains(')') {
                        return Err(err("unbalanced parenthesis in output arguments".to_string()));
                    }
                    inner
                };
                (name, in_text, out_text)
            }
        };

        if !is_upper_case_identifier(name) {
            return Err(err(format!(
                "handler name '{name}' must be an identifier starting with an upper-case letter"
            )));
        }
        if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| name.starts_with(**p)) {
            return Err(err(format!(
                "handler name '{name}' must not start with the reserved prefix '{prefix}'"
            )));
        }
        if RESERVED_NAMES.contains(&to_snake_case(name).as_str()) {
            return Err(err(format!(
                "handler name '{name}' is reserved for a generated method of the service"
            )));
        }

        let inputs = parse_args(in_text).map_err(&err)?;
        let outputs = parse_args(out_text).map_err(&err)?;
        let sig = Signature {
            name: name.to_string(),
            inputs,
            outputs,
        };
        sig.validate_args().map_err(err)?;
        Ok(sig)
    }

    fn validate_args(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for arg in self.inputs.iter().chain(self.outputs.iter()) {
            if !is_lower_case_identifier(&arg.name) {
                return Err(format!(
                    "argument '{}' must be an identifier starting with a lower-case letter",
                    arg.name
                ));
            }
            if !seen.insert(arg.name.as_str()) {
                return Err(format!("duplicate argument '{}'", arg.name));
            }
            if let Some(ty) = &arg.ty {
                validate_type(ty).map_err(|e| format!("argument '{}': {e}", arg.name))?;
            }
        }
        for arg in &self.inputs {
            if arg.name == HTTP_RESPONSE_BODY || arg.name == HTTP_STATUS_CODE {
                return Err(format!("'{}' can only be an output argument", arg.name));
            }
        }
        for (i, arg) in self.outputs.iter().enumerate() {
            if arg.name == HTTP_REQUEST_BODY {
                return Err(format!("'{}' can only be an input argument", arg.name));
            }
            if arg.name == HTTP_STATUS_CODE && arg.type_str() != "int" {
                return Err(format!("'{HTTP_STATUS_CODE}' must be of type int"));
            }
            if arg.name == HTTP_RESPONSE_BODY && i + 1 != self.outputs.len() {
                return Err(format!(
                    "'{HTTP_RESPONSE_BODY}' must be the last output argument"
                ));
            }
        }
        Ok(())
    }

    /// `x int, y string`
    pub fn input_args(&self) -> String {
        join_args(&self.inputs, true)
    }

    /// `x, y`
    pub fn input_arg_names(&self) -> String {
        join_args(&self.inputs, false)
    }

    /// `, x int, y string`
    pub fn input_args_comma_leading(&self) -> String {
        comma_leading(self.input_args())
    }

    /// `x int, y string, `
    pub fn input_args_comma_trailing(&self) -> String {
        comma_trailing(self.input_args())
    }

    pub fn input_arg_names_comma_leading(&self) -> String {
        comma_leading(self.input_arg_names())
    }

    pub fn input_arg_names_comma_trailing(&self) -> String {
        comma_trailing(self.input_arg_names())
    }

    pub fn output_args(&self) -> String {
        join_args(&self.outputs, true)
    }

    pub fn output_arg_names(&self) -> String {
        join_args(&self.outputs, false)
    }

    pub fn output_args_comma_leading(&self) -> String {
        comma_leading(self.output_args())
    }

    pub fn output_args_comma_trailing(&self) -> String {
        comma_trailing(self.output_args())
    }

    pub fn output_arg_names_comma_leading(&self) -> String {
        comma_leading(self.output_arg_names())
    }

    pub fn output_arg_names_comma_trailing(&self) -> String {
        comma_trailing(self.output_arg_names())
    }

    pub fn input(&self, name: &str) -> Option<&Argument> {
        self.inputs.iter().find(|a| a.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&Argument> {
        self.outputs.iter().find(|a| a.name == name)
    }

    /// Whether the raw request body marker is among the inputs.
    pub fn takes_request_body(&self) -> bool {
        self.input(HTTP_REQUEST_BODY).is_some()
    }

    /// Apply `f` to every declared argument type.
    pub(crate) fn map_types(&mut self, f: impl Fn(&str) -> String) {
        for arg in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            if let Some(ty) = arg.ty.as_mut() {
                *ty = f(ty);
            }
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.input_args())?;
        if !self.outputs.is_empty() {
            write!(f, " ({})", self.output_args())?;
        }
        Ok(())
    }
}

fn parse_args(text: &str) -> Result<Vec<Argument>, String> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|part| {
            let tokens: Vec<&str> = part.split_whitespace().collect();
            match tokens.as_slice() {
                [] => Err("empty argument".to_string()),
                [name] => Err(format!("argument '{name}' is missing its type")),
                [name, ty] => Ok(Argument {
                    name: (*name).to_string(),
                    ty: if *ty == "any" { None } else { Some((*ty).to_string()) },
                }),
                _ => Err(format!("invalid argument '{}'", part.trim())),
            }
        })
        .collect()
}
