//! Validation rules of configuration properties, e.g. `int [0,100]`,
//! `str ^[a-z]+$`, `set red|green|blue`, and the duration literal grammar
//! they share with tickers.

use std::fmt;
use std::time::Duration;

use regex::Regex;

/// Parse a duration literal such as `1m30s`, `250ms` or `1.5h`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }
    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }
    Some(Duration::from_nanos(total.round() as u64))
}

/// One bound of a numeric or duration range.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bound {
    value: f64,
    inclusive: bool,
}

/// A `[min,max]` range; either bound may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range {
    min: Option<Bound>,
    max: Option<Bound>,
}

impl Range {
    fn parse(s: &str, parse_value: impl Fn(&str) -> Option<f64>) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Range::default());
        }
        let invalid = || format!("invalid range '{s}'");
        let min_inclusive = match s.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid()),
        };
        let max_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };
        let inner = &s[1..s.len() - 1];
        let (lo, hi) = inner.split_once(',').ok_or_else(invalid)?;
        let bound = |text: &str, inclusive: bool| -> Result<Option<Bound>, String> {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let value = parse_value(text).ok_or_else(invalid)?;
            Ok(Some(Bound { value, inclusive }))
        };
        Ok(Range {
            min: bound(lo, min_inclusive)?,
            max: bound(hi, max_inclusive)?,
        })
    }

    fn contains(&self, v: f64) -> bool {
        let above = match self.min {
            Some(b) if b.inclusive => v >= b.value,
            Some(b) => v > b.value,
            None => true,
        };
        let below = match self.max {
            Some(b) if b.inclusive => v <= b.value,
            Some(b) => v < b.value,
            None => true,
        };
        above && below
    }

    /// Write the range as ` [min,max]` with `value` rendering each bound.
    /// An unbounded range writes nothing.
    fn write(&self, f: &mut fmt::Formatter<'_>, value: impl Fn(f64) -> String) -> fmt::Result {
        if *self == Range::default() {
            return Ok(());
        }
        let open = match self.min {
            Some(b) if !b.inclusive => '(',
            _ => '[',
        };
        let close = match self.max {
            Some(b) if !b.inclusive => ')',
            _ => ']',
        };
        let lo = self.min.map(|b| value(b.value)).unwrap_or_default();
        let hi = self.max.map(|b| value(b.value)).unwrap_or_default();
        write!(f, " {open}{lo},{hi}{close}")
    }
}

/// A parsed validation rule.
#[derive(Debug, Clone)]
pub enum ConfigRule {
    Str(Option<Regex>),
    Bool,
    Int(Range),
    Float(Range),
    Dur(Range),
    Set(Vec<String>),
    Url,
    Email,
    Json,
}

impl ConfigRule {
    /// Parse a rule such as `int [6,7]`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let (kind, arg) = match text.split_once(char::is_whitespace) {
            Some((k, a)) => (k, a.trim()),
            None => (text, ""),
        };
        let no_arg = |rule: ConfigRule| {
            if arg.is_empty() {
                Ok(rule)
            } else {
                Err(format!("validation rule '{kind}' takes no argument"))
            }
        };
        match kind {
            "str" | "string" => {
                if arg.is_empty() {
                    Ok(ConfigRule::Str(None))
                } else {
                    Regex::new(arg)
                        .map(|re| ConfigRule::Str(Some(re)))
                        .map_err(|e| format!("invalid regular expression '{arg}': {e}"))
                }
            }
            "bool" => no_arg(ConfigRule::Bool),
            "int" => Range::parse(arg, |v| v.parse::<i64>().ok().map(|n| n as f64)).map(ConfigRule::Int),
            "float" => Range::parse(arg, |v| v.parse::<f64>().ok()).map(ConfigRule::Float),
            "dur" | "duration" => {
                Range::parse(arg, |v| parse_duration(v).map(|d| d.as_secs_f64())).map(ConfigRule::Dur)
            }
            "set" => {
                let options: Vec<String> = arg
                    .split('|')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if options.is_empty() {
                    Err("validation rule 'set' requires options".to_string())
                } else {
                    Ok(ConfigRule::Set(options))
                }
            }
            "url" => no_arg(ConfigRule::Url),
            "email" => no_arg(ConfigRule::Email),
            "json" => no_arg(ConfigRule::Json),
            "" => Err("empty validation rule".to_string()),
            other => Err(format!("unknown validation rule '{other}'")),
        }
    }

    /// The plain rule for a config output type.
    pub fn for_type(ty: &str) -> Option<Self> {
        match ty {
            "string" => Some(ConfigRule::Str(None)),
            "int" => Some(ConfigRule::Int(Range::default())),
            "float" => Some(ConfigRule::Float(Range::default())),
            "duration" => Some(ConfigRule::Dur(Range::default())),
            "bool" => Some(ConfigRule::Bool),
            _ => None,
        }
    }

    /// Whether this rule can validate values of the config output type.
    pub fn fits_type(&self, ty: &str) -> bool {
        matches!(
            (self, ty),
            (
                ConfigRule::Str(_) | ConfigRule::Set(_) | ConfigRule::Url | ConfigRule::Email | ConfigRule::Json,
                "string"
            ) | (ConfigRule::Int(_), "int")
                | (ConfigRule::Float(_), "float")
                | (ConfigRule::Dur(_), "duration")
                | (ConfigRule::Bool, "bool")
        )
    }

    /// Check a value against the rule.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let fail = || format!("value '{value}' does not satisfy rule '{self}'");
        let ok = match self {
            ConfigRule::Str(None) => true,
            ConfigRule::Str(Some(re)) => re.is_match(value),
            ConfigRule::Bool => matches!(value, "true" | "false"),
            ConfigRule::Int(range) => value
                .trim()
                .parse::<i64>()
                .is_ok_and(|n| range.contains(n as f64)),
            ConfigRule::Float(range) => value.trim().parse::<f64>().is_ok_and(|n| range.contains(n)),
            ConfigRule::Dur(range) => {
                parse_duration(value).is_some_and(|d| range.contains(d.as_secs_f64()))
            }
            ConfigRule::Set(options) => options.iter().any(|o| o == value),
            ConfigRule::Url => url::Url::parse(value).is_ok(),
            ConfigRule::Email => is_email(value),
            ConfigRule::Json => serde_json::from_str::<serde_json::Value>(value).is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(fail())
        }
    }
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !local.contains(char::is_whitespace)
                && domain.contains('.')
                && crate::naming::is_hostname(domain)
        }
        None => false,
    }
}

impl fmt::Display for ConfigRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigRule::Str(None) => write!(f, "str"),
            ConfigRule::Str(Some(re)) => write!(f, "str {}", re.as_str()),
            ConfigRule::Bool => write!(f, "bool"),
            ConfigRule::Int(range) => {
                write!(f, "int")?;
                range.write(f, |v| format!("{v}"))
            }
            ConfigRule::Float(range) => {
                write!(f, "float")?;
                range.write(f, |v| format!("{v}"))
            }
            ConfigRule::Dur(range) => {
                write!(f, "dur")?;
                range.write(f, |v| format!("{:?}", Duration::from_secs_f64(v)))
            }
            ConfigRule::Set(options) => write!(f, "set {}", options.join("|")),
            ConfigRule::Url => write!(f, "url"),
            ConfigRule::Email => write!(f, "email"),
            ConfigRule::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("5 minutes"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_int_range() {
        let rule = ConfigRule::parse("int [6,7]").unwrap();
        assert!(rule.check("6").is_ok());
        assert!(rule.check("7").is_ok());
        assert!(rule.check("8").is_err());
        assert!(rule.check("x").is_err());
        let rule = ConfigRule::parse("int (0,]").unwrap();
        assert!(rule.check("0").is_err());
        assert!(rule.check("1000000").is_ok());
    }

    #[test]
    fn test_other_rules() {
        assert!(ConfigRule::parse("str ^[a-z]+$").unwrap().check("abc").is_ok());
        assert!(ConfigRule::parse("str ^[a-z]+$").unwrap().check("ABC").is_err());
        assert!(ConfigRule::parse("set a|b").unwrap().check("b").is_ok());
        assert!(ConfigRule::parse("set a|b").unwrap().check("c").is_err());
        assert!(ConfigRule::parse("dur [1s,1m]").unwrap().check("30s").is_ok());
        assert!(ConfigRule::parse("dur [1s,1m]").unwrap().check("2m").is_err());
        assert!(ConfigRule::parse("url").unwrap().check("https://example.com").is_ok());
        assert!(ConfigRule::parse("email").unwrap().check("a@b.example").is_ok());
        assert!(ConfigRule::parse("email").unwrap().check("nope").is_err());
        assert!(ConfigRule::parse("json").unwrap().check("{\"a\":1}").is_ok());
        assert!(ConfigRule::parse("float [0.5,1.5)").unwrap().check("1.5").is_err());
    }

    #[test]
    fn test_rule_display_keeps_range() {
        let rule = ConfigRule::parse("int [6,7]").unwrap();
        assert_eq!(rule.to_string(), "int [6,7]");
        let err = rule.check("8").unwrap_err();
        assert!(err.contains("int [6,7]"), "{err}");

        assert_eq!(ConfigRule::parse("int (0,]").unwrap().to_string(), "int (0,]");
        assert_eq!(ConfigRule::parse("float [0.5,1.5)").unwrap().to_string(), "float [0.5,1.5)");
        assert_eq!(ConfigRule::parse("dur [1s,1m]").unwrap().to_string(), "dur [1s,60s]");
        assert_eq!(ConfigRule::parse("int").unwrap().to_string(), "int");
    }

    #[test]
    fn test_invalid_rules() {
        assert!(ConfigRule::parse("int 6,7").is_err());
        assert!(ConfigRule::parse("bogus").is_err());
        assert!(ConfigRule::parse("bool yes").is_err());
        assert!(ConfigRule::parse("set").is_err());
        assert!(ConfigRule::parse("str [").is_err());
    }

    #[test]
    fn test_fits_type() {
        assert!(ConfigRule::parse("set a|b").unwrap().fits_type("string"));
        assert!(!ConfigRule::parse("int").unwrap().fits_type("string"));
        assert!(ConfigRule::for_type("duration").unwrap().fits_type("duration"));
    }
}
