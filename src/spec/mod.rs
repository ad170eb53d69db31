//! Service specification: the signature grammar, the handler model and its
//! validation rules.
//!
//! A `service.yaml` is first deserialised into drafts ([`HandlerDraft`]),
//! then each draft is elaborated into a [`Handler`] of its category. The
//! resulting [`ServiceSpec`] is immutable apart from the reversible
//! qualify/shorthand type-name transform used by the generator.

mod actor;
pub mod argtype;
mod config_rule;
mod handler;
mod load;
mod route;
mod service;
mod signature;

pub use actor::validate_actor;
pub use config_rule::{parse_duration, ConfigRule};
pub use handler::{
    Category, ConfigHandler, Endpoint, Handler, HandlerDraft, MetricHandler, MetricKind, Queue,
    SinkHandler, TickerHandler,
};
pub use load::{load_service_spec, SPEC_FILE_NAME};
pub use route::{validate_path_arguments, Route, DEFAULT_PORT, EVENT_PORT};
pub use service::{
    references_complex, ComplexType, General, GeneralDraft, ServiceDocument, ServiceSpec,
    TypeNames,
};
pub use signature::{
    comma_leading, comma_trailing, Argument, Signature, HTTP_REQUEST_BODY, HTTP_RESPONSE_BODY,
    HTTP_STATUS_CODE,
};
