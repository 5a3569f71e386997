//! HTML templates, compiled into the binary.

use std::sync::OnceLock;

use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("join.html", include_str!("../templates/join.html")),
    ("todos.html", include_str!("../templates/todos.html")),
    ("todo.html", include_str!("../templates/todo.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
    ("error.html", include_str!("../templates/error.html")),
];

static ENVIRONMENT: OnceLock<Environment<'static>> = OnceLock::new();

/// The shared template environment. `.html` templates are auto-escaped.
pub fn environment() -> Result<&'static Environment<'static>, minijinja::Error> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(ENVIRONMENT.get_or_init(|| env))
}

pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String, minijinja::Error> {
    environment()?.get_template(name)?.render(ctx)
}
