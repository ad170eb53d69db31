//! Handler records: the untyped [`HandlerDraft`] read from `service.yaml`
//! and the per-category [`Handler`] it elaborates into.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::actor::validate_actor;
use super::argtype::{is_numeric_like, is_primitive};
use super::config_rule::{parse_duration, ConfigRule};
use super::route::{Route, DEFAULT_PORT, EVENT_PORT};
use super::signature::Signature;
use crate::error::SpecError;
use crate::naming::{is_hostname, is_lower_case_identifier, rust_ident, to_snake_case};

const METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE", "CONNECT", "ANY",
];
const BODY_METHODS: &[&str] = &["POST", "PUT", "PATCH", "ANY"];

/// One handler entry exactly as written in the spec file. All
/// category-specific fields are optional here; [`HandlerDraft::elaborate`]
/// decides which ones apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HandlerDraft {
    pub signature: String,
    #[serde(default)]
    pub description: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub queue: Option<String>,
    pub actor: Option<String>,
    pub source: Option<String>,
    pub for_host: Option<String>,
    pub default: Option<serde_yaml::Value>,
    pub validation: Option<String>,
    #[serde(default)]
    pub secret: bool,
    #[serde(default)]
    pub callback: bool,
    pub kind: Option<String>,
    #[serde(default)]
    pub buckets: Vec<f64>,
    pub alias: Option<String>,
    #[serde(default)]
    pub observable: bool,
    pub interval: Option<String>,
}

/// The seven handler categories, in the order they appear in the spec file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Config,
    Metric,
    Function,
    Event,
    Sink,
    Web,
    Ticker,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Config,
        Category::Metric,
        Category::Function,
        Category::Event,
        Category::Sink,
        Category::Web,
        Category::Ticker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Config => "config",
            Category::Metric => "metric",
            Category::Function => "function",
            Category::Event => "event",
            Category::Sink => "sink",
            Category::Web => "web",
            Category::Ticker => "ticker",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription queue mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Queue {
    /// Load-balanced: one of the replicas receives the request
    #[default]
    Default,
    /// Pervasive: every replica receives the request
    None,
}

impl Queue {
    fn parse(s: &str) -> Result<Self, String> {
        match s.trim() {
            "" | "default" => Ok(Queue::Default),
            "none" => Ok(Queue::None),
            other => Err(format!("invalid queue '{other}', expected 'default' or 'none'")),
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Queue::Default => f.write_str("default"),
            Queue::None => f.write_str("none"),
        }
    }
}

/// Shared shape of functions, events, sinks and webs.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub signature: Signature,
    pub description: String,
    /// Upper-case HTTP method, `ANY` for any verb
    pub method: String,
    pub route: Route,
    pub queue: Queue,
    pub actor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkHandler {
    pub endpoint: Endpoint,
    /// Path of the event's service, e.g. `services/eventsource`
    pub source: String,
    pub for_host: Option<String>,
}

impl SinkHandler {
    /// Rust module path of the source service: `services::eventsource`
    pub fn source_module(&self) -> String {
        self.source.replace('/', "::")
    }

    /// Last segment of the source path, used to alias its API module.
    pub fn source_name(&self) -> &str {
        self.source
            .rsplit(['/', ':'])
            .next()
            .unwrap_or(self.source.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigHandler {
    pub signature: Signature,
    pub description: String,
    /// Default value as text, already checked against `rule`
    pub default: Option<String>,
    pub rule: ConfigRule,
    /// The rule as written, or the plain rule of the type
    pub validation: String,
    pub secret: bool,
    pub callback: bool,
}

impl ConfigHandler {
    /// The single output argument's type.
    pub fn value_type(&self) -> &str {
        self.signature
            .outputs
            .first()
            .map(|a| a.type_str())
            .unwrap_or("string")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            "histogram" => Ok(MetricKind::Histogram),
            other => Err(format!(
                "invalid metric kind '{other}', expected counter, gauge or histogram"
            )),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Counter => f.write_str("counter"),
            MetricKind::Gauge => f.write_str("gauge"),
            MetricKind::Histogram => f.write_str("histogram"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricHandler {
    pub signature: Signature,
    pub description: String,
    pub kind: MetricKind,
    pub buckets: Vec<f64>,
    pub alias: String,
    pub observable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerHandler {
    pub signature: Signature,
    pub description: String,
    pub interval: Duration,
}

/// A fully validated handler. Each category carries only the fields that
/// apply to it.
#[derive(Debug, Clone)]
pub enum Handler {
    Config(ConfigHandler),
    Metric(MetricHandler),
    Function(Endpoint),
    Event(Endpoint),
    Sink(SinkHandler),
    Web(Endpoint),
    Ticker(TickerHandler),
}

impl Handler {
    pub fn category(&self) -> Category {
        match self {
            Handler::Config(_) => Category::Config,
            Handler::Metric(_) => Category::Metric,
            Handler::Function(_) => Category::Function,
            Handler::Event(_) => Category::Event,
            Handler::Sink(_) => Category::Sink,
            Handler::Web(_) => Category::Web,
            Handler::Ticker(_) => Category::Ticker,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Handler::Config(h) => &h.signature,
            Handler::Metric(h) => &h.signature,
            Handler::Function(e) | Handler::Event(e) | Handler::Web(e) => &e.signature,
            Handler::Sink(s) => &s.endpoint.signature,
            Handler::Ticker(h) => &h.signature,
        }
    }

    pub(crate) fn signature_mut(&mut self) -> &mut Signature {
        match self {
            Handler::Config(h) => &mut h.signature,
            Handler::Metric(h) => &mut h.signature,
            Handler::Function(e) | Handler::Event(e) | Handler::Web(e) => &mut e.signature,
            Handler::Sink(s) => &mut s.endpoint.signature,
            Handler::Ticker(h) => &mut h.signature,
        }
    }

    pub fn name(&self) -> &str {
        &self.signature().name
    }

    pub fn description(&self) -> &str {
        match self {
            Handler::Config(h) => &h.description,
            Handler::Metric(h) => &h.description,
            Handler::Function(e) | Handler::Event(e) | Handler::Web(e) => &e.description,
            Handler::Sink(s) => &s.endpoint.description,
            Handler::Ticker(h) => &h.description,
        }
    }

    /// Routing details, for the categories reachable over the network.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Handler::Function(e) | Handler::Event(e) | Handler::Web(e) => Some(e),
            Handler::Sink(s) => Some(&s.endpoint),
            _ => None,
        }
    }

    /// Plain snake_case name of the developer-implemented method.
    fn stub_base(&self) -> Option<String> {
        let snake = to_snake_case(self.name());
        match self {
            Handler::Function(_) | Handler::Sink(_) | Handler::Web(_) | Handler::Ticker(_) => {
                Some(snake)
            }
            Handler::Config(h) if h.callback => Some(format!("on_changed_{snake}")),
            Handler::Metric(h) if h.observable => Some(format!("on_observe_{snake}")),
            _ => None,
        }
    }

    /// Name of the method a developer implements in `service.rs`, if any.
    pub fn implementation_fn(&self) -> Option<String> {
        self.stub_base().map(|base| rust_ident(&base))
    }

    /// Name of the integration test generated for this handler, if any.
    pub fn test_fn(&self) -> Option<String> {
        match self {
            Handler::Event(_) => Some(format!("test_{}", to_snake_case(self.name()))),
            _ => self.stub_base().map(|base| format!("test_{base}")),
        }
    }
}

impl HandlerDraft {
    /// Parse the signature and apply the semantic rules of `category`.
    ///
    /// # Errors
    ///
    /// [`SpecError::Signature`] for grammar errors, [`SpecError::Handler`]
    /// for rule violations.
    pub fn elaborate(&self, category: Category) -> Result<Handler, SpecError> {
        let signature = Signature::parse(&self.signature)?;
        let name = signature.name.clone();
        let fail = |reason: String| SpecError::handler(&name, reason);

        let handler = match category {
            Category::Config => Handler::Config(self.config(signature).map_err(fail)?),
            Category::Metric => Handler::Metric(self.metric(signature).map_err(fail)?),
            Category::Function => Handler::Function(self.endpoint(signature, category).map_err(fail)?),
            Category::Event => Handler::Event(self.endpoint(signature, category).map_err(fail)?),
            Category::Web => {
                if !signature.inputs.is_empty() || !signature.outputs.is_empty() {
                    return Err(fail("web handlers take no arguments".to_string()));
                }
                Handler::Web(self.endpoint(signature, category).map_err(fail)?)
            }
            Category::Sink => {
                let endpoint = self.endpoint(signature, category).map_err(fail)?;
                let (source, for_host) = self.sink_source().map_err(fail)?;
                Handler::Sink(SinkHandler {
                    endpoint,
                    source,
                    for_host,
                })
            }
            Category::Ticker => Handler::Ticker(self.ticker(signature).map_err(fail)?),
        };
        Ok(handler)
    }

    fn endpoint(&self, signature: Signature, category: Category) -> Result<Endpoint, String> {
        let is_event = matches!(category, Category::Event | Category::Sink);
        if is_event && !signature.name.starts_with("On") {
            return Err(format!("{category} name must start with 'On'"));
        }

        let method = match self.method.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m.to_ascii_uppercase(),
            _ if category == Category::Event => "POST".to_string(),
            _ => "ANY".to_string(),
        };
        if !METHODS.contains(&method.as_str()) {
            return Err(format!("invalid method '{method}'"));
        }
        if category == Category::Event && method == "ANY" {
            return Err("method 'ANY' is not allowed for events".to_string());
        }
        if signature.takes_request_body() && !BODY_METHODS.contains(&method.as_str()) {
            return Err(format!(
                "method '{method}' does not accept a request body"
            ));
        }

        let default_port = if is_event { EVENT_PORT } else { DEFAULT_PORT };
        let route = Route::derive(
            self.path.as_deref().unwrap_or_default(),
            &signature.name,
            default_port,
        )?;
        let queue = Queue::parse(self.queue.as_deref().unwrap_or_default())?;

        let actor = match self.actor.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => {
                validate_actor(a).map_err(|e| format!("invalid actor '{a}': {e}"))?;
                Some(a.to_string())
            }
            _ => None,
        };

        Ok(Endpoint {
            signature,
            description: self.description.trim().to_string(),
            method,
            route,
            queue,
            actor,
        })
    }

    fn sink_source(&self) -> Result<(String, Option<String>), String> {
        let source = self
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "sink requires an event source".to_string())?;
        let valid = source
            .split(|c| c == '/')
            .flat_map(|s| s.split("::"))
            .all(is_lower_case_identifier);
        if !valid {
            return Err(format!("invalid event source '{source}'"));
        }
        let for_host = match self.for_host.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => {
                if !is_hostname(h) {
                    return Err(format!("invalid host '{h}'"));
                }
                Some(h.to_lowercase())
            }
            _ => None,
        };
        Ok((source.trim_end_matches('/').to_string(), for_host))
    }

    fn config(&self, signature: Signature) -> Result<ConfigHandler, String> {
        if !signature.inputs.is_empty() {
            return Err("config properties take no input arguments".to_string());
        }
        if signature.outputs.len() != 1 {
            return Err("config properties must have exactly one output argument".to_string());
        }
        let ty = signature.outputs[0].type_str();
        let plain = ConfigRule::for_type(ty).ok_or_else(|| {
            format!("config output type '{ty}' must be string, int, bool, duration or float")
        })?;
        let (rule, validation) = match self.validation.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => {
                let rule = ConfigRule::parse(v)?;
                if !rule.fits_type(ty) {
                    return Err(format!(
                        "validation rule '{v}' does not apply to type '{ty}'"
                    ));
                }
                (rule, v.to_string())
            }
            _ => {
                let text = plain.to_string();
                (plain, text)
            }
        };
        let default = match &self.default {
            None | Some(serde_yaml::Value::Null) => None,
            Some(value) => {
                let text = scalar_text(value)?;
                rule.check(&text)
                    .map_err(|e| format!("invalid default value: {e}"))?;
                Some(text)
            }
        };
        Ok(ConfigHandler {
            signature,
            description: self.description.trim().to_string(),
            default,
            rule,
            validation,
            secret: self.secret,
            callback: self.callback,
        })
    }

    fn metric(&self, signature: Signature) -> Result<MetricHandler, String> {
        if !signature.outputs.is_empty() {
            return Err("metrics take no output arguments".to_string());
        }
        let Some((value, labels)) = signature.inputs.split_first() else {
            return Err("metrics require at least one input argument".to_string());
        };
        if !value.ty.as_deref().is_some_and(is_numeric_like) {
            return Err(format!(
                "metric value '{}' must be of a numeric or duration type",
                value.name
            ));
        }
        for label in labels {
            if !label.ty.as_deref().is_some_and(is_primitive) {
                return Err(format!(
                    "metric label '{}' must be of a primitive type",
                    label.name
                ));
            }
        }
        let kind = MetricKind::parse(self.kind.as_deref().unwrap_or_default())?;
        if kind == MetricKind::Histogram {
            if self.buckets.is_empty() {
                return Err("histogram requires at least one bucket".to_string());
            }
            if self.buckets.windows(2).any(|w| w[0] >= w[1]) {
                return Err("histogram buckets must be strictly increasing".to_string());
            }
        }
        let alias = match self.alias.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => a.to_string(),
            _ => to_snake_case(&signature.name),
        };
        if !is_metric_alias(&alias) {
            return Err(format!("invalid metric alias '{alias}'"));
        }
        Ok(MetricHandler {
            signature,
            description: self.description.trim().to_string(),
            kind,
            buckets: if kind == MetricKind::Histogram {
                self.buckets.clone()
            } else {
                Vec::new()
            },
            alias,
            observable: self.observable,
        })
    }

    fn ticker(&self, signature: Signature) -> Result<TickerHandler, String> {
        if !signature.inputs.is_empty() || !signature.outputs.is_empty() {
            return Err("tickers take no arguments".to_string());
        }
        let text = self.interval.as_deref().unwrap_or_default().trim();
        if text.is_empty() {
            return Err("ticker requires an interval".to_string());
        }
        let interval =
            parse_duration(text).ok_or_else(|| format!("invalid interval '{text}'"))?;
        if interval.is_zero() {
            return Err("ticker interval must be positive".to_string());
        }
        Ok(TickerHandler {
            signature,
            description: self.description.trim().to_string(),
            interval,
        })
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        _ => Err("default value must be a scalar".to_string()),
    }
}

fn is_metric_alias(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(signature: &str) -> HandlerDraft {
        HandlerDraft {
            signature: signature.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_function_defaults() {
        let h = draft("Add(x int, y int) (sum int)")
            .elaborate(Category::Function)
            .unwrap();
        let e = h.endpoint().unwrap();
        assert_eq!(e.method, "ANY");
        assert_eq!(e.route.to_string(), ":443/add");
        assert_eq!(e.queue, Queue::Default);
        assert_eq!(h.implementation_fn().as_deref(), Some("add"));
        assert_eq!(h.test_fn().as_deref(), Some("test_add"));

        let h = draft("Match()").elaborate(Category::Function).unwrap();
        assert_eq!(h.implementation_fn().as_deref(), Some("r#match"));
        assert_eq!(h.test_fn().as_deref(), Some("test_match"));
    }

    #[test]
    fn test_event_rules() {
        let h = draft("OnDiscovered(p Point)").elaborate(Category::Event).unwrap();
        let e = h.endpoint().unwrap();
        assert_eq!(e.method, "POST");
        assert_eq!(e.route.port, EVENT_PORT);
        assert!(h.implementation_fn().is_none());
        assert_eq!(h.test_fn().as_deref(), Some("test_on_discovered"));

        let err = draft("Discovered()").elaborate(Category::Event).unwrap_err();
        assert!(err.to_string().contains("must start with 'On'"));

        let mut d = draft("OnX()");
        d.method = Some("any".to_string());
        assert!(d.elaborate(Category::Event).is_err());
    }

    #[test]
    fn test_method_and_body() {
        let mut d = draft("Upload(httpRequestBody []byte)");
        d.method = Some("get".to_string());
        let err = d.elaborate(Category::Function).unwrap_err().to_string();
        assert!(err.contains("does not accept a request body"), "{err}");
        d.method = Some("put".to_string());
        let h = d.elaborate(Category::Function).unwrap();
        assert_eq!(h.endpoint().unwrap().method, "PUT");
        d.method = Some("FETCH".to_string());
        assert!(d.elaborate(Category::Function).is_err());
    }

    #[test]
    fn test_queue() {
        let mut d = draft("Hello()");
        d.queue = Some("none".to_string());
        let h = d.elaborate(Category::Function).unwrap();
        assert_eq!(h.endpoint().unwrap().queue, Queue::None);
        d.queue = Some("broadcast".to_string());
        assert!(d.elaborate(Category::Function).is_err());
    }

    #[test]
    fn test_actor() {
        let mut d = draft("Hello()");
        d.actor = Some("roles.admin && !roles.guest".to_string());
        assert!(d.elaborate(Category::Function).is_ok());
        d.actor = Some("roles.admin &&".to_string());
        assert!(d.elaborate(Category::Function).is_err());
    }

    #[test]
    fn test_web_and_ticker_take_no_args() {
        assert!(draft("Page()").elaborate(Category::Web).is_ok());
        assert!(draft("Page(x int)").elaborate(Category::Web).is_err());
        let mut t = draft("Tick");
        assert!(t.elaborate(Category::Ticker).is_err());
        t.interval = Some("1m".to_string());
        let h = t.elaborate(Category::Ticker).unwrap();
        match h {
            Handler::Ticker(t) => assert_eq!(t.interval, Duration::from_secs(60)),
            other => panic!("unexpected {other:?}"),
        }
        t.signature = "Tick(x int)".to_string();
        assert!(t.elaborate(Category::Ticker).is_err());
        t.signature = "Tick".to_string();
        t.interval = Some("0".to_string());
        assert!(t.elaborate(Category::Ticker).is_err());
    }

    #[test]
    fn test_config_shape() {
        assert!(draft("MaxNum() (max int)").elaborate(Category::Config).is_ok());
        assert!(draft("MaxNum(x int) (max int)").elaborate(Category::Config).is_err());
        assert!(draft("MaxNum() (a int, b int)").elaborate(Category::Config).is_err());
        assert!(draft("MaxNum() (p Point)").elaborate(Category::Config).is_err());
        let mut d = draft("Color() (c string)");
        d.validation = Some("int".to_string());
        assert!(d.elaborate(Category::Config).is_err());
    }

    #[test]
    fn test_config_default_checked_against_plain_rule() {
        let mut d = draft("Timeout() (t duration)");
        d.default = Some(serde_yaml::Value::String("30s".to_string()));
        assert!(d.elaborate(Category::Config).is_ok());
        d.default = Some(serde_yaml::Value::String("soon".to_string()));
        assert!(d.elaborate(Category::Config).is_err());
    }

    #[test]
    fn test_config_callback_stub() {
        let mut d = draft("MaxNum() (max int)");
        d.callback = true;
        let h = d.elaborate(Category::Config).unwrap();
        assert_eq!(h.implementation_fn().as_deref(), Some("on_changed_max_num"));
    }

    #[test]
    fn test_metric_rules() {
        let mut d = draft("UsedOperators(count int, op string)");
        d.kind = Some("counter".to_string());
        let h = d.elaborate(Category::Metric).unwrap();
        assert!(h.implementation_fn().is_none());
        match &h {
            Handler::Metric(m) => assert_eq!(m.alias, "used_operators"),
            other => panic!("unexpected {other:?}"),
        }

        d.observable = true;
        let h = d.elaborate(Category::Metric).unwrap();
        assert_eq!(h.implementation_fn().as_deref(), Some("on_observe_used_operators"));

        d.signature = "UsedOperators(op string)".to_string();
        assert!(d.elaborate(Category::Metric).is_err());
        d.signature = "UsedOperators()".to_string();
        assert!(d.elaborate(Category::Metric).is_err());
        d.signature = "UsedOperators(n int, p Point)".to_string();
        assert!(d.elaborate(Category::Metric).is_err());
        d.signature = "UsedOperators(n int) (x int)".to_string();
        assert!(d.elaborate(Category::Metric).is_err());

        d.signature = "Latency(d duration)".to_string();
        d.kind = Some("histogram".to_string());
        assert!(d.elaborate(Category::Metric).is_err());
        d.buckets = vec![1.0, 5.0, 10.0];
        assert!(d.elaborate(Category::Metric).is_ok());
        d.buckets = vec![5.0, 1.0];
        assert!(d.elaborate(Category::Metric).is_err());

        d.buckets = vec![1.0];
        d.alias = Some("Bad-Alias".to_string());
        assert!(d.elaborate(Category::Metric).is_err());
        d.alias = None;
        d.kind = Some("summary".to_string());
        assert!(d.elaborate(Category::Metric).is_err());
    }

    #[test]
    fn test_sink_rules() {
        let mut d = draft("OnDiscovered(p Point)");
        assert!(d.elaborate(Category::Sink).is_err());
        d.source = Some("services/eventsource".to_string());
        let h = d.elaborate(Category::Sink).unwrap();
        match &h {
            Handler::Sink(s) => {
                assert_eq!(s.source_module(), "services::eventsource");
                assert_eq!(s.source_name(), "eventsource");
                assert_eq!(s.endpoint.route.port, EVENT_PORT);
            }
            other => panic!("unexpected {other:?}"),
        }
        d.for_host = Some("bad_host".to_string());
        assert!(d.elaborate(Category::Sink).is_err());
        d.for_host = Some("EventSource.Example".to_string());
        assert!(d.elaborate(Category::Sink).is_ok());
        d.source = Some("Services/Bad".to_string());
        assert!(d.elaborate(Category::Sink).is_err());
    }
}
