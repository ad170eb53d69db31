//! Serializable views of a [`ServiceSpec`] handed to the templates.
//!
//! Every Rust fragment a template needs (parameter lists, return types,
//! literals) is computed here so the templates stay free of logic beyond
//! loops and conditionals. The views reflect the service's current type-name
//! mode: build them after `qualify_types` for code outside the `api`
//! module and after `shorthand_types` for code inside it.

use serde::Serialize;

use super::merge::{render_doc, DocStyle};
use crate::naming::{rust_ident, to_snake_case, to_upper_snake_case};
use crate::spec::{
    comma_leading, Argument, Category, ConfigHandler, Endpoint, Handler, MetricHandler,
    MetricKind, Queue, ServiceSpec, SinkHandler, TickerHandler,
};
use crate::version::MOCK_VERSION_SENTINEL;

/// A Rust string literal for `s`.
pub fn rust_str(s: &str) -> String {
    format!("{s:?}")
}

/// Doc text of a handler: its description, or a line naming its signature.
pub fn handler_doc_text(h: &Handler) -> String {
    let description = h.description().trim();
    if description.is_empty() {
        format!("{} handles `{}`.", h.name(), h.signature())
    } else {
        description.to_string()
    }
}

/// Doc text of the service module.
pub fn service_doc_text(spec: &ServiceSpec) -> String {
    if spec.general.description.trim().is_empty() {
        format!("The {} microservice.", spec.general.host)
    } else {
        spec.general.description.trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    /// Rust field or binding name
    pub name: String,
    /// Name on the wire, as written in the signature
    pub wire: String,
    pub ty: String,
}

fn field_views(args: &[Argument]) -> Vec<FieldView> {
    args.iter()
        .map(|a| FieldView {
            name: rust_ident(&a.name),
            wire: a.name.clone(),
            ty: a.rust_type(),
        })
        .collect()
}

fn join(items: impl IntoIterator<Item = String>, sep: &str) -> String {
    items.into_iter().collect::<Vec<_>>().join(sep)
}

/// `()`, `T` or `(T, U)` for a list of types.
fn tuple_type(fields: &[FieldView]) -> String {
    match fields {
        [] => "()".to_string(),
        [only] => only.ty.clone(),
        many => format!("({})", join(many.iter().map(|f| f.ty.clone()), ", ")),
    }
}

/// `()`, `x` or `(x, y)` binding or value expression over `prefix` + name.
fn tuple_expr(fields: &[FieldView], prefix: &str) -> String {
    match fields {
        [] => "()".to_string(),
        [only] => format!("{prefix}{}", only.name),
        many => format!(
            "({})",
            join(many.iter().map(|f| format!("{prefix}{}", f.name)), ", ")
        ),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointView {
    pub name: String,
    /// Method name, keyword-escaped
    pub snake: String,
    /// Plain snake_case name for use inside longer identifiers
    pub snake_plain: String,
    pub upper: String,
    pub category: &'static str,
    pub doc: Vec<String>,
    pub method: String,
    pub route_lit: String,
    pub queue: &'static str,
    pub actor_lit: String,
    /// Host the subscription listens on, as an `Option<&str>` expression
    pub host_expr: String,
    pub inputs: Vec<FieldView>,
    pub outputs: Vec<FieldView>,
    /// `, x: i64, op: String`
    pub params: String,
    /// `, i64, String`
    pub param_types: String,
    /// `x, op`
    pub arg_names: String,
    /// `, input.x, input.op`
    pub call_args: String,
    pub ret: String,
    /// Binding of the returned value: `()`, `sum` or `(a, b)`
    pub out_pattern: String,
    /// `a, b` for struct shorthand initialisation
    pub out_names: String,
    /// `out` or `_out`, the name the decoded output struct is bound to
    pub out_binding: String,
    /// Returned value built from the output struct: `(out.a, out.b)`
    pub out_from: String,
    /// Alias of the source service's `api` module, for sinks
    pub source_alias: Option<String>,
}

impl EndpointView {
    fn new(h: &Handler, e: &Endpoint, sink: Option<&SinkHandler>) -> Self {
        let inputs = field_views(&e.signature.inputs);
        let outputs = field_views(&e.signature.outputs);
        let host_expr = match sink {
            Some(s) => match &s.for_host {
                Some(host) => format!("Some({})", rust_str(host)),
                None => format!("Some(crate::{}::api::HOSTNAME)", s.source_module()),
            },
            None => match &e.route.host {
                Some(host) => format!("Some({})", rust_str(host)),
                None => "None".to_string(),
            },
        };
        EndpointView {
            name: e.signature.name.clone(),
            snake: rust_ident(&e.signature.name),
            snake_plain: to_snake_case(&e.signature.name),
            upper: to_upper_snake_case(&e.signature.name),
            category: h.category().as_str(),
            doc: render_doc(&handler_doc_text(h), false, DocStyle::Line),
            method: e.method.clone(),
            route_lit: rust_str(&e.route.to_string()),
            queue: match e.queue {
                Queue::Default => "Default",
                Queue::None => "None",
            },
            actor_lit: match &e.actor {
                Some(a) => format!("Some({})", rust_str(a)),
                None => "None".to_string(),
            },
            host_expr,
            params: comma_leading(join(
                inputs.iter().map(|f| format!("{}: {}", f.name, f.ty)),
                ", ",
            )),
            param_types: comma_leading(join(inputs.iter().map(|f| f.ty.clone()), ", ")),
            arg_names: join(inputs.iter().map(|f| f.name.clone()), ", "),
            call_args: comma_leading(join(
                inputs.iter().map(|f| format!("input.{}", f.name)),
                ", ",
            )),
            ret: tuple_type(&outputs),
            out_pattern: tuple_expr(&outputs, ""),
            out_names: join(outputs.iter().map(|f| f.name.clone()), ", "),
            out_binding: if outputs.is_empty() { "_out" } else { "out" }.to_string(),
            out_from: tuple_expr(&outputs, "out."),
            source_alias: sink.map(|s| format!("{}api", s.source_name())),
            inputs,
            outputs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    pub name: String,
    pub snake: String,
    pub doc: Vec<String>,
    pub ty: String,
    pub rule_lit: String,
    pub default_lit: String,
    pub secret: bool,
    pub callback: bool,
    pub callback_fn: String,
}

impl ConfigView {
    fn new(h: &Handler, c: &ConfigHandler) -> Self {
        ConfigView {
            name: c.signature.name.clone(),
            snake: rust_ident(&c.signature.name),
            doc: render_doc(&handler_doc_text(h), false, DocStyle::Line),
            ty: crate::spec::argtype::rust_type(Some(c.value_type())),
            rule_lit: rust_str(&c.validation),
            default_lit: match &c.default {
                Some(d) => format!("Some({})", rust_str(d)),
                None => "None".to_string(),
            },
            secret: c.secret,
            callback: c.callback,
            callback_fn: h.implementation_fn().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricView {
    pub name: String,
    pub alias: String,
    pub alias_lit: String,
    pub help_lit: String,
    pub kind: &'static str,
    pub buckets: String,
    pub label_names: String,
    pub params: String,
    pub value_expr: String,
    pub label_values: String,
    /// Recording method generated in the intermediate layer
    pub recorder: String,
    pub observable: bool,
    pub observe_fn: String,
}

fn metric_value_expr(arg: &FieldView, ty: &str) -> String {
    match ty {
        "duration" => format!("{}.as_secs_f64()", arg.name),
        _ => format!("{} as f64", arg.name),
    }
}

fn label_expr(arg: &FieldView, ty: &str) -> String {
    match ty {
        "duration" | "time" => format!("format!(\"{{:?}}\", {})", arg.name),
        _ => format!("{}.to_string()", arg.name),
    }
}

impl MetricView {
    fn new(h: &Handler, m: &MetricHandler) -> Self {
        let fields = field_views(&m.signature.inputs);
        let types: Vec<&str> = m.signature.inputs.iter().map(Argument::type_str).collect();
        let snake = to_snake_case(&m.signature.name);
        let recorder = match m.kind {
            MetricKind::Counter => format!("increment_{snake}"),
            MetricKind::Gauge => format!("record_{snake}"),
            MetricKind::Histogram => format!("observe_{snake}"),
        };
        let (value, labels) = match fields.split_first() {
            Some((value, labels)) => (
                metric_value_expr(value, types[0]),
                join(
                    labels
                        .iter()
                        .zip(types.iter().skip(1))
                        .map(|(f, ty)| label_expr(f, ty)),
                    ", ",
                ),
            ),
            None => ("0.0".to_string(), String::new()),
        };
        MetricView {
            name: m.signature.name.clone(),
            alias: m.alias.clone(),
            alias_lit: rust_str(&m.alias),
            help_lit: rust_str(&handler_doc_text(h)),
            kind: match m.kind {
                MetricKind::Counter => "Counter",
                MetricKind::Gauge => "Gauge",
                MetricKind::Histogram => "Histogram",
            },
            buckets: join(m.buckets.iter().map(|b| format!("{b:?}")), ", "),
            label_names: join(
                m.signature.inputs.iter().skip(1).map(|a| rust_str(&a.name)),
                ", ",
            ),
            params: comma_leading(join(
                fields.iter().map(|f| format!("{}: {}", f.name, f.ty)),
                ", ",
            )),
            value_expr: value,
            label_values: labels,
            recorder,
            observable: m.observable,
            observe_fn: h.implementation_fn().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerView {
    pub name: String,
    pub snake: String,
    pub nanos: String,
}

impl TickerView {
    fn new(t: &TickerHandler) -> Self {
        TickerView {
            name: t.signature.name.clone(),
            snake: rust_ident(&t.signature.name),
            nanos: t.interval.as_nanos().to_string(),
        }
    }
}

/// A method skeleton appended to `service.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct StubView {
    pub name: String,
    pub fn_name: String,
    pub doc: Vec<String>,
    pub params: String,
    pub ret: String,
}

impl StubView {
    pub fn new(h: &Handler) -> Option<Self> {
        let fn_name = h.implementation_fn()?;
        let (params, ret) = match h {
            Handler::Function(e) => {
                let v = EndpointView::new(h, e, None);
                (v.params, v.ret)
            }
            Handler::Sink(s) => {
                let v = EndpointView::new(h, &s.endpoint, Some(s));
                (v.params, v.ret)
            }
            Handler::Web(_) => (
                ", req: &fabric::HttpRequest".to_string(),
                "fabric::HttpResponse".to_string(),
            ),
            _ => (String::new(), "()".to_string()),
        };
        Some(StubView {
            name: h.name().to_string(),
            fn_name,
            doc: render_doc(&handler_doc_text(h), false, DocStyle::Line),
            params,
            ret,
        })
    }
}

/// An integration test skeleton appended to `service_test.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct TestView {
    pub fn_name: String,
    pub name: String,
    pub hint: String,
}

impl TestView {
    pub fn new(h: &Handler) -> Option<Self> {
        let fn_name = h.test_fn()?;
        let snake = rust_ident(h.name());
        let hint = match h.category() {
            Category::Function => format!(
                "// let out = api::Client::new(h.connector()).{snake}(&ctx, ...);"
            ),
            Category::Web => format!(
                "// let res = api::Client::new(h.connector()).{snake}(&ctx, fabric::HttpRequest::get(\"\"));"
            ),
            Category::Event => format!(
                "// let results = api::MulticastTrigger::new(h.connector()).{snake}(&ctx, ...);"
            ),
            Category::Sink => format!("// h.service().{snake}(&ctx, ...);"),
            Category::Ticker => format!("// h.service().{snake}(&ctx);"),
            Category::Config | Category::Metric => match h.implementation_fn() {
                Some(f) => format!("// h.service().{f}(&ctx);"),
                None => String::new(),
            },
        };
        Some(TestView {
            fn_name,
            name: h.name().to_string(),
            hint,
        })
    }
}

/// A complex type to define or re-export in `api/types.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct TypeView {
    pub name: String,
    /// Full path when the type is re-exported from elsewhere in the crate
    pub reexport: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub name_lit: String,
}

/// Everything the templates of one service render from.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    pub package: String,
    pub host: String,
    pub host_lit: String,
    pub description_lit: String,
    pub doc: Vec<String>,
    pub integration_tests: bool,
    pub functions: Vec<EndpointView>,
    pub events: Vec<EndpointView>,
    pub sinks: Vec<EndpointView>,
    pub webs: Vec<EndpointView>,
    pub configs: Vec<ConfigView>,
    pub metrics: Vec<MetricView>,
    pub tickers: Vec<TickerView>,
    pub sink_imports: Vec<String>,
    pub mock_version: u32,
    pub stubs: Vec<StubView>,
    pub tests: Vec<TestView>,
    pub types: Vec<TypeView>,
    pub resources: Vec<ResourceView>,
}

/// `use crate::services::eventsource::api as eventsourceapi;` for each
/// distinct sink source.
pub fn sink_imports(spec: &ServiceSpec) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for h in spec.sinks() {
        if let Handler::Sink(s) = h {
            let line = format!(
                "use crate::{}::api as {}api;",
                s.source_module(),
                s.source_name()
            );
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
    }
    lines
}

impl ServiceView {
    pub fn new(spec: &ServiceSpec) -> Self {
        let mut view = ServiceView {
            package: spec.package.clone(),
            host: spec.general.host.clone(),
            host_lit: rust_str(&spec.general.host),
            description_lit: rust_str(&spec.general.description),
            doc: render_doc(&service_doc_text(spec), true, DocStyle::Line),
            integration_tests: spec.general.integration_tests,
            functions: Vec::new(),
            events: Vec::new(),
            sinks: Vec::new(),
            webs: Vec::new(),
            configs: Vec::new(),
            metrics: Vec::new(),
            tickers: Vec::new(),
            sink_imports: sink_imports(spec),
            mock_version: MOCK_VERSION_SENTINEL,
            stubs: Vec::new(),
            tests: Vec::new(),
            types: Vec::new(),
            resources: Vec::new(),
        };
        for h in &spec.handlers {
            match h {
                Handler::Function(e) => view.functions.push(EndpointView::new(h, e, None)),
                Handler::Event(e) => view.events.push(EndpointView::new(h, e, None)),
                Handler::Web(e) => view.webs.push(EndpointView::new(h, e, None)),
                Handler::Sink(s) => view.sinks.push(EndpointView::new(h, &s.endpoint, Some(s))),
                Handler::Config(c) => view.configs.push(ConfigView::new(h, c)),
                Handler::Metric(m) => view.metrics.push(MetricView::new(h, m)),
                Handler::Ticker(t) => view.tickers.push(TickerView::new(t)),
            }
        }
        view
    }

    pub fn with_stubs<'a>(mut self, handlers: impl IntoIterator<Item = &'a Handler>) -> Self {
        self.stubs = handlers.into_iter().filter_map(StubView::new).collect();
        self
    }

    pub fn with_tests<'a>(mut self, handlers: impl IntoIterator<Item = &'a Handler>) -> Self {
        self.tests = handlers.into_iter().filter_map(TestView::new).collect();
        self
    }

    pub fn with_types(mut self, types: Vec<TypeView>) -> Self {
        self.types = types;
        self
    }

    pub fn with_resources(mut self, names: &[String]) -> Self {
        self.resources = names
            .iter()
            .map(|n| ResourceView { name_lit: rust_str(n) })
            .collect();
        self
    }
}
