//! Resource naming rules.
//!
//! Provisioning (through the generated workflow), teardown and the status
//! check all derive names from these functions, so a resource created by one
//! is always found by the others.

/// Repository variables written by the provisioning workflow or the
/// orchestrator itself.
pub mod vars {
    pub const POSTMAN_WORKSPACE_ID: &str = "POSTMAN_WORKSPACE_ID";
    pub const BASELINE_COLLECTION_UID: &str = "POSTMAN_BASELINE_COLLECTION_UID";
    pub const SMOKE_COLLECTION_UID: &str = "POSTMAN_SMOKE_COLLECTION_UID";
    pub const CONTRACT_COLLECTION_UID: &str = "POSTMAN_CONTRACT_COLLECTION_UID";
    pub const FUNCTION_NAME: &str = "FUNCTION_NAME";
    pub const LINT_ERRORS: &str = "LINT_ERRORS";
    pub const LINT_WARNINGS: &str = "LINT_WARNINGS";
    pub const ENVIRONMENTS: &str = "ENVIRONMENTS";
}

/// Lowercase `[a-z0-9-]` slug; runs of other characters become one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Short uppercase code for a domain slug.
///
/// Multi-word domains use their initials, single words their first three
/// characters.
pub fn domain_code(domain_slug: &str) -> String {
    let words: Vec<&str> = domain_slug.split('-').filter(|w| !w.is_empty()).collect();
    if words.len() >= 2 {
        words
            .iter()
            .filter_map(|w| w.chars().next())
            .collect::<String>()
            .to_uppercase()
    } else {
        domain_slug.chars().take(3).collect::<String>().to_uppercase()
    }
}

pub fn function_name(base: &str, environment: &str) -> String {
    format!("{}-{}", base, environment)
}

pub fn gateway_name(function: &str) -> String {
    format!("{}-api", function)
}

pub fn role_name(base: &str) -> String {
    format!("{}-lambda-role", base)
}

pub fn log_group_name(function: &str) -> String {
    format!("/aws/lambda/{}", function)
}

/// Variable-safe form of an environment name (`pre-prod` -> `PRE_PROD`).
pub fn environment_key(environment: &str) -> String {
    environment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Suffix of the per-environment gateway URL variable.
pub const GATEWAY_URL_SUFFIX: &str = "_GW_URL";

/// Repository variable holding an environment's gateway URL.
pub fn gateway_url_variable(environment: &str) -> String {
    format!("{}{}", environment_key(environment), GATEWAY_URL_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_collapses() {
        assert_eq!(slugify("Advisor Portfolio API"), "advisor-portfolio-api");
        assert_eq!(slugify("  my__project!!v2 "), "my-project-v2");
        assert_eq!(slugify("--Lead-Trail--"), "lead-trail");
    }

    #[test]
    fn test_slugify_empty_for_symbols_only() {
        assert_eq!(slugify("!!! ***"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_domain_code() {
        assert_eq!(domain_code("wealth-management"), "WM");
        assert_eq!(domain_code("payments"), "PAY");
        assert_eq!(domain_code("ab"), "AB");
        assert_eq!(domain_code("retail-core-banking"), "RCB");
    }

    #[test]
    fn test_aws_names() {
        let function = function_name("advisor-api", "dev");
        assert_eq!(function, "advisor-api-dev");
        assert_eq!(gateway_name(&function), "advisor-api-dev-api");
        assert_eq!(role_name("advisor-api"), "advisor-api-lambda-role");
        assert_eq!(log_group_name(&function), "/aws/lambda/advisor-api-dev");
    }

    #[test]
    fn test_gateway_url_variable() {
        assert_eq!(gateway_url_variable("prod"), "PROD_GW_URL");
        assert_eq!(gateway_url_variable("pre-prod"), "PRE_PROD_GW_URL");
    }
}
