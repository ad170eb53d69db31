//! Route derivation and path-argument validation.

use std::fmt;

use crate::naming::{is_hostname, is_lower_case_identifier, to_kebab_case};

/// Default port of handlers reachable over the request/response channel.
pub const DEFAULT_PORT: u16 = 443;
/// Default port of events and the sinks listening to them.
pub const EVENT_PORT: u16 = 417;

/// A normalised route: optional host override, port and absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Set only for host-relative routes (`//host/path`, `https://host/path`)
    pub host: Option<String>,
    pub port: u16,
    /// Always starts with `/`
    pub path: String,
}

impl Route {
    /// Derive a route from the `path` text of a handler.
    ///
    /// An empty route defaults to the kebab-cased handler name; an ellipsis
    /// is replaced by it.
    pub fn derive(text: &str, handler_name: &str, default_port: u16) -> Result<Self, String> {
        if text.contains('`') {
            return Err("backquotes are not allowed in the path".to_string());
        }
        let kebab = to_kebab_case(handler_name);
        let text = text.trim();
        let text = if text.is_empty() {
            format!("/{kebab}")
        } else {
            text.replace("...", &kebab)
        };

        let (host, port, path) = if let Some(rest) = text
            .strip_prefix("https://")
            .or_else(|| text.strip_prefix("//"))
        {
            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };
            let (host, port) = split_port(authority, default_port)?;
            if !is_hostname(host) {
                return Err(format!("invalid host '{host}' in path"));
            }
            (Some(host.to_lowercase()), port, path.to_string())
        } else if let Some(rest) = text.strip_prefix(':') {
            let (port, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };
            (None, parse_port(port)?, path.to_string())
        } else if text.starts_with('/') {
            (None, default_port, text)
        } else if text.contains("://") {
            return Err(format!("unsupported scheme in path '{text}'"));
        } else {
            (None, default_port, format!("/{text}"))
        };

        validate_path_arguments(&path)?;
        Ok(Route { host, port, path })
    }

    /// Names of the path arguments in order. Positional arguments (`{}`,
    /// `{+}`) are named `path1`, `path2`, ...
    pub fn path_arguments(&self) -> Vec<String> {
        let mut names = Vec::new();
        for segment in self.path.split('/') {
            if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let name = inner.trim_end_matches('+');
                if name.is_empty() {
                    names.push(format!("path{}", names.len() + 1));
                } else {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "https://{host}:{}{}", self.port, self.path),
            None => write!(f, ":{}{}", self.port, self.path),
        }
    }
}

fn parse_port(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(format!("invalid port '{s}'")),
    }
}

fn split_port(authority: &str, default_port: u16) -> Result<(&str, u16), String> {
    match authority.rsplit_once(':') {
        Some((host, port)) => Ok((host, parse_port(port)?)),
        None => Ok((authority, default_port)),
    }
}

/// Path arguments are `{name}` or `{name+}` spanning a whole segment. Names
/// are empty or lower-case identifiers; the greedy form ends the path.
pub fn validate_path_arguments(path: &str) -> Result<(), String> {
    let segments: Vec<&str> = path.split('/').collect();
    for (i, segment) in segments.iter().enumerate() {
        if !segment.contains('{') && !segment.contains('}') {
            continue;
        }
        let inner = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .filter(|s| !s.contains('{') && !s.contains('}'))
            .ok_or_else(|| format!("path argument must span an entire path segment in '{segment}'"))?;
        let (name, greedy) = match inner.strip_suffix('+') {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if !name.is_empty() && !is_lower_case_identifier(name) {
            return Err(format!(
                "path argument must be an identifier in '{segment}'"
            ));
        }
        if greedy && i + 1 != segments.len() {
            return Err(format!("greedy path argument must end path in '{segment}'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_route() {
        let r = Route::derive("", "SquareRoot", DEFAULT_PORT).unwrap();
        assert_eq!(r.to_string(), ":443/square-root");
        let r = Route::derive("", "OnDiscovered", EVENT_PORT).unwrap();
        assert_eq!(r.to_string(), ":417/on-discovered");
    }

    #[test]
    fn test_ellipsis_and_ports() {
        let r = Route::derive("/api/...", "SquareRoot", DEFAULT_PORT).unwrap();
        assert_eq!(r.path, "/api/square-root");
        let r = Route::derive(":1080/...", "Hello", DEFAULT_PORT).unwrap();
        assert_eq!(r.to_string(), ":1080/hello");
        let r = Route::derive("hello", "Hello", DEFAULT_PORT).unwrap();
        assert_eq!(r.to_string(), ":443/hello");
        assert!(Route::derive(":0/x", "Hello", DEFAULT_PORT).is_err());
        assert!(Route::derive(":99999/x", "Hello", DEFAULT_PORT).is_err());
    }

    #[test]
    fn test_host_relative() {
        let r = Route::derive("//Other.Example:8080/x", "Hello", DEFAULT_PORT).unwrap();
        assert_eq!(r.host.as_deref(), Some("other.example"));
        assert_eq!(r.to_string(), "https://other.example:8080/x");
        let r = Route::derive("https://other.example/y", "Hello", DEFAULT_PORT).unwrap();
        assert_eq!(r.port, 443);
        assert!(Route::derive("//bad_host/x", "Hello", DEFAULT_PORT).is_err());
    }

    #[test]
    fn test_path_arguments() {
        for bad in ["/{ }", "/{p$}", "/{p +}", "/{$+}"] {
            let err = validate_path_arguments(bad).unwrap_err();
            assert!(err.contains("must be an identifier"), "{bad}: {err}");
        }
        let err = validate_path_arguments("/{+}/hello").unwrap_err();
        assert!(err.contains("must end path"), "{err}");
        let err = validate_path_arguments("/x{id}").unwrap_err();
        assert!(err.contains("entire path segment"), "{err}");
        assert!(validate_path_arguments("/{id}/{}/{rest+}").is_ok());
        assert!(validate_path_arguments("/hello/{+}").is_ok());
    }

    #[test]
    fn test_path_argument_names() {
        let r = Route::derive("/{id}/{}/{rest+}", "Hello", DEFAULT_PORT).unwrap();
        assert_eq!(r.path_arguments(), vec!["id", "path2", "rest"]);
    }

    #[test]
    fn test_backquote_rejected() {
        assert!(Route::derive("/`x`", "Hello", DEFAULT_PORT).is_err());
    }
}
