use minijinja::{AutoEscape, Environment};
use serde::Serialize;

/// Template sources embedded at compile time, keyed by the name the
/// pipeline renders them under.
const TEMPLATES: &[(&str, &str)] = &[
    ("mod.rs.j2", include_str!("../../templates/mod.rs.j2")),
    ("service.rs.j2", include_str!("../../templates/service.rs.j2")),
    (
        "service.stubs.rs.j2",
        include_str!("../../templates/service.stubs.rs.j2"),
    ),
    (
        "service_test.rs.j2",
        include_str!("../../templates/service_test.rs.j2"),
    ),
    (
        "service_test.stubs.rs.j2",
        include_str!("../../templates/service_test.stubs.rs.j2"),
    ),
    ("api_mod.rs.j2", include_str!("../../templates/api_mod.rs.j2")),
    (
        "api_client_gen.rs.j2",
        include_str!("../../templates/api_client_gen.rs.j2"),
    ),
    ("api_types.rs.j2", include_str!("../../templates/api_types.rs.j2")),
    (
        "api_types.stubs.rs.j2",
        include_str!("../../templates/api_types.stubs.rs.j2"),
    ),
    (
        "intermediate_mod.rs.j2",
        include_str!("../../templates/intermediate_mod.rs.j2"),
    ),
    (
        "intermediate_gen.rs.j2",
        include_str!("../../templates/intermediate_gen.rs.j2"),
    ),
    ("mock_gen.rs.j2", include_str!("../../templates/mock_gen.rs.j2")),
    (
        "resources_mod.rs.j2",
        include_str!("../../templates/resources_mod.rs.j2"),
    ),
    ("embed_gen.rs.j2", include_str!("../../templates/embed_gen.rs.j2")),
    (
        "version_gen.rs.j2",
        include_str!("../../templates/version_gen.rs.j2"),
    ),
];

/// The named templates of the generator, compiled once per run.
pub struct TemplateSet {
    env: Environment<'static>,
}

impl TemplateSet {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        for (name, source) in TEMPLATES {
            env.add_template(*name, *source)?;
        }
        Ok(TemplateSet { env })
    }

    /// Render the template `name` against `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> anyhow::Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}
