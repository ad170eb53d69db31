//! The service model: `general` metadata plus the elaborated handlers of all
//! seven categories.

use std::collections::HashSet;

use serde::Deserialize;

use super::argtype::{self, end_type, split_end_type};
use super::handler::{Category, Handler, HandlerDraft};
use crate::error::SpecError;
use crate::naming::{is_hostname, is_upper_case_identifier};

/// Top-level layout of `service.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceDocument {
    pub general: GeneralDraft,
    #[serde(default)]
    pub configs: Vec<HandlerDraft>,
    #[serde(default)]
    pub metrics: Vec<HandlerDraft>,
    #[serde(default)]
    pub functions: Vec<HandlerDraft>,
    #[serde(default)]
    pub events: Vec<HandlerDraft>,
    #[serde(default)]
    pub sinks: Vec<HandlerDraft>,
    #[serde(default)]
    pub webs: Vec<HandlerDraft>,
    #[serde(default)]
    pub tickers: Vec<HandlerDraft>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneralDraft {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub description: String,
    pub integration_tests: Option<bool>,
}

impl ServiceDocument {
    fn drafts(&self, category: Category) -> &[HandlerDraft] {
        match category {
            Category::Config => &self.configs,
            Category::Metric => &self.metrics,
            Category::Function => &self.functions,
            Category::Event => &self.events,
            Category::Sink => &self.sinks,
            Category::Web => &self.webs,
            Category::Ticker => &self.tickers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct General {
    /// Lower-cased host name of the service
    pub host: String,
    pub description: String,
    pub integration_tests: bool,
}

/// A non-primitive type referenced by function, event or sink arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    /// Already defined in the service's own `api` module
    pub exists: bool,
    /// Module path that defines it elsewhere in the project, if unambiguous
    pub package: Option<String>,
}

/// Whether complex type names currently carry the `api.` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNames {
    Shorthand,
    Qualified,
}

#[derive(Debug, Clone)]
pub struct ServiceSpec {
    /// Module path of the service, e.g. `services::calculator`
    pub package: String,
    pub general: General,
    /// Handlers of all categories, grouped by category in file order
    pub handlers: Vec<Handler>,
    pub complex_types: Vec<ComplexType>,
    type_names: TypeNames,
}

impl ServiceSpec {
    /// Elaborate a parsed document into a validated service.
    ///
    /// # Errors
    ///
    /// Returns the first grammar or rule violation found.
    pub fn from_document(doc: &ServiceDocument, package: &str) -> Result<Self, SpecError> {
        let host = doc.general.host.trim().to_lowercase();
        if host.is_empty() {
            return Err(SpecError::general("missing host"));
        }
        if !is_hostname(&host) {
            return Err(SpecError::general(format!("invalid host '{host}'")));
        }
        let general = General {
            host,
            description: doc.general.description.trim().to_string(),
            integration_tests: doc.general.integration_tests.unwrap_or(true),
        };

        let mut handlers = Vec::new();
        let mut seen = HashSet::new();
        for category in Category::ALL {
            for draft in doc.drafts(category) {
                let handler = draft.elaborate(category)?;
                if !seen.insert(handler.name().to_lowercase()) {
                    return Err(SpecError::DuplicateName {
                        name: handler.name().to_string(),
                    });
                }
                handlers.push(handler);
            }
        }

        let complex_types = collect_complex_types(&handlers);
        Ok(ServiceSpec {
            package: package.to_string(),
            general,
            handlers,
            complex_types,
            type_names: TypeNames::Shorthand,
        })
    }

    /// Parse and validate `service.yaml` text.
    pub fn parse_yaml(text: &str, package: &str) -> anyhow::Result<Self> {
        let doc: ServiceDocument = serde_yaml::from_str(text)?;
        Ok(Self::from_document(&doc, package)?)
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Handler> {
        self.handlers
            .iter()
            .filter(move |h| h.category() == category)
    }

    pub fn configs(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Config)
    }

    pub fn metrics(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Metric)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Function)
    }

    pub fn events(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Event)
    }

    pub fn sinks(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Sink)
    }

    pub fn webs(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Web)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Handler> {
        self.by_category(Category::Ticker)
    }

    pub fn type_names(&self) -> TypeNames {
        self.type_names
    }

    /// Prefix every local complex type with the API package. Used before
    /// emitting code outside the `api` module. Idempotent.
    pub fn qualify_types(&mut self) {
        for h in &mut self.handlers {
            h.signature_mut().map_types(argtype::qualify);
        }
        self.type_names = TypeNames::Qualified;
    }

    /// Inverse of [`ServiceSpec::qualify_types`].
    pub fn shorthand_types(&mut self) {
        for h in &mut self.handlers {
            h.signature_mut().map_types(argtype::shorthand);
        }
        self.type_names = TypeNames::Shorthand;
    }

    /// Complex types that need a definition or re-export in `api/types.rs`.
    pub fn missing_types(&self) -> impl Iterator<Item = &ComplexType> {
        self.complex_types.iter().filter(|t| !t.exists)
    }
}

/// Local complex types of function, event and sink arguments, deduplicated
/// in order of first use.
fn collect_complex_types(handlers: &[Handler]) -> Vec<ComplexType> {
    let mut names: Vec<String> = Vec::new();
    for h in handlers {
        if !matches!(
            h.category(),
            Category::Function | Category::Event | Category::Sink
        ) {
            continue;
        }
        let sig = h.signature();
        for arg in sig.inputs.iter().chain(sig.outputs.iter()) {
            let Some(ty) = arg.ty.as_deref() else {
                continue;
            };
            let shorthand = argtype::shorthand(ty);
            let end = end_type(&shorthand);
            if !end.contains('.') && is_upper_case_identifier(end) && !names.iter().any(|n| n == end) {
                names.push(end.to_string());
            }
        }
    }
    names
        .into_iter()
        .map(|name| ComplexType {
            name,
            exists: false,
            package: None,
        })
        .collect()
}

/// Whether `ty` has a local complex type at its end, ignoring compounds.
pub fn references_complex(ty: &str) -> bool {
    let (_, end) = split_end_type(ty);
    let end = end.strip_prefix("api.").unwrap_or(end);
    !end.contains('.') && is_upper_case_identifier(end)
}
