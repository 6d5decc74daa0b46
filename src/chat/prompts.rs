//! System prompt templates per command.
//!
//! Substitution is a literal replacement of the first placeholder. Catalog
//! content is inserted unescaped; it is treated as trusted input.

use crate::catalog::SpecificationRecord;

use super::command::Command;

/// Placeholder replaced by the rendered page of specifications.
pub const SPECIFICATIONS_PLACEHOLDER: &str = "<SPECIFICATIONS>";

/// Marker the model is asked to end its answer with; stripped before relay.
pub const RESPONSE_END: &str = "[RESPONSE END]";

pub const LIST_TEMPLATE: &str = r#"You are an expert in API design and the Azure API Center catalog.
The user wants to know which APIs are available to them.

Below are API specifications taken from the catalog, each under a `## Spec N:` heading:

<SPECIFICATIONS>

For every specification give its title, version, and a one or two sentence summary of
what the API does.
Present the APIs as a Markdown list. Only use information contained in the specifications above.
When you have finished, write [RESPONSE END] on its own line."#;

pub const FIND_TEMPLATE: &str = r#"You are an expert in API design and the Azure API Center catalog.
The user is searching the catalog for an API that matches their query.

Below are API specifications taken from the catalog, each under a `## Spec N:` heading:

<SPECIFICATIONS>

Pick the specifications that best match the user's query and explain, per API, why it
matches and which operations are relevant.
If none of them match, say so plainly and suggest asking for more APIs.
Only use information contained in the specifications above.
When you have finished, write [RESPONSE END] on its own line."#;

pub const DESCRIBE_TEMPLATE: &str = r#"You are an expert in API design.
The user will give you an API specification, usually OpenAPI in JSON or YAML.

Describe the API for a developer who has never used it: its purpose, authentication,
the main resources and operations, and anything unusual about request or response shapes.
Use Markdown headings and keep the description concise.
When you have finished, write [RESPONSE END] on its own line."#;

/// Template for a command, if it has one.
pub fn template_for(command: &Command) -> Option<&'static str> {
    match command {
        Command::List => Some(LIST_TEMPLATE),
        Command::Find => Some(FIND_TEMPLATE),
        Command::Describe => Some(DESCRIBE_TEMPLATE),
        Command::Generate | Command::Other(_) => None,
    }
}

/// Replace the first placeholder in `template` with `content`.
pub fn substitute(template: &str, content: &str) -> String {
    template.replacen(SPECIFICATIONS_PLACEHOLDER, content, 1)
}

/// Render one page of specifications, numbered from 1 within the page.
pub fn render_page(page: &[SpecificationRecord]) -> String {
    page.iter()
        .enumerate()
        .map(|(i, spec)| format!("## Spec {}:\n{}\n", i + 1, spec.value))
        .collect::<Vec<_>>()
        .join("\n")
}
