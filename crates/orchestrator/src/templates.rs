//! Application scaffold committed into every new repository.

use github::FileChange;
use lifecycle_core::ProvisionJob;

use crate::settings::WORKFLOW_FILE;
use crate::workflow::render_workflow;

struct Template {
    path: &'static str,
    content: &'static str,
}

const TEMPLATES: &[Template] = &[
    Template {
        path: "app/__init__.py",
        content: include_str!("../templates/app/__init__.py"),
    },
    Template {
        path: "app/routes.py",
        content: include_str!("../templates/app/routes.py"),
    },
    Template {
        path: "app/wsgi.py",
        content: include_str!("../templates/app/wsgi.py"),
    },
    Template {
        path: "tests/test_health.py",
        content: include_str!("../templates/tests/test_health.py"),
    },
    Template {
        path: "requirements.txt",
        content: include_str!("../templates/requirements.txt"),
    },
    Template {
        path: "openapi.yaml",
        content: include_str!("../templates/openapi.yaml"),
    },
    Template {
        path: "README.md",
        content: include_str!("../templates/README.md"),
    },
];

pub fn workflow_path() -> String {
    format!(".github/workflows/{}", WORKFLOW_FILE)
}

/// Scaffold files plus the generated workflow, ready for one commit.
pub fn scaffold_files(job: &ProvisionJob, aws_region: &str) -> Vec<FileChange> {
    let mut files: Vec<FileChange> = TEMPLATES
        .iter()
        .map(|template| FileChange::new(template.path, render(template.content, job)))
        .collect();
    files.push(FileChange::new(workflow_path(), render_workflow(aws_region)));
    files
}

fn render(content: &str, job: &ProvisionJob) -> String {
    content
        .replace("{{project}}", &job.project)
        .replace("{{display_name}}", &job.display_name)
        .replace("{{domain_code}}", &job.domain_code)
        .replace("{{domain}}", &job.domain)
        .replace("{{environments}}", &job.environments.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_core::ProvisionRequest;

    fn job() -> ProvisionJob {
        ProvisionRequest {
            project_name: Some("Advisor Portfolio API".to_string()),
            domain: Some("Wealth Management".to_string()),
            requester_email: Some("dev@example.com".to_string()),
            environments: Some(vec!["dev".to_string(), "prod".to_string()]),
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_scaffold_includes_workflow_last() {
        let files = scaffold_files(&job(), "us-east-1");
        assert_eq!(files.len(), TEMPLATES.len() + 1);
        let workflow = files.last().unwrap();
        assert_eq!(workflow.path, ".github/workflows/provision.yml");
        assert!(workflow.content.contains("workflow_dispatch"));
    }

    #[test]
    fn test_placeholders_are_filled() {
        let files = scaffold_files(&job(), "us-east-1");
        for file in &files {
            assert!(!file.content.contains("{{project}}"), "{}", file.path);
            assert!(!file.content.contains("{{domain"), "{}", file.path);
        }

        let readme = files.iter().find(|f| f.path == "README.md").unwrap();
        assert!(readme.content.starts_with("# Advisor Portfolio API"));
        assert!(readme.content.contains("`wealth-management` (WM)"));
        assert!(readme.content.contains("(dev, prod)"));

        let routes = files.iter().find(|f| f.path == "app/routes.py").unwrap();
        assert!(routes.content.contains("SERVICE_NAME = \"advisor-portfolio-api\""));
    }

    #[test]
    fn test_paths_are_unique() {
        let files = scaffold_files(&job(), "us-east-1");
        let mut paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), files.len());
    }
}
