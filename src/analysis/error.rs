use thiserror::Error;

use super::header::HeaderVerdict;
use super::schema::FieldRole;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(
        "required columns could not be resolved after {verdict}: width {width}, labels [{}], resolved [{}], missing [{}]",
        .labels.join(", "),
        describe_resolved(.resolved),
        describe_roles(.missing)
    )]
    SchemaMapping {
        verdict: HeaderVerdict,
        width: usize,
        labels: Vec<String>,
        resolved: Vec<(FieldRole, usize)>,
        missing: Vec<FieldRole>,
    },

    #[error(
        "headerless table has {width} columns; positional fallback needs at least {minimum}"
    )]
    InsufficientWidth { width: usize, minimum: usize },

    #[error("failed to compile label pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn describe_resolved(resolved: &[(FieldRole, usize)]) -> String {
    resolved
        .iter()
        .map(|(role, index)| format!("{}={index}", role.as_str()))
        .collect::<Vec<String>>()
        .join(", ")
}

fn describe_roles(roles: &[FieldRole]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<&str>>()
        .join(", ")
}
