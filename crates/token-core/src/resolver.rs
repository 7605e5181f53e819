//! Package resolution
//!
//! Turns an optional (project name, package name) pair into a validated
//! [`PackageRef`] or a typed not-found failure. The registry itself is
//! an external collaborator; [`PackageLookup`] is the seam, and
//! [`PackageDirectory`] is the in-process implementation the service
//! loads from configuration.
//!
//! Names echoed back in error messages pass through [`elide`] first so
//! a hostile project name can't inject markup or control characters
//! into a rendered surface.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, FieldError, Result};
use crate::model::{PackageRef, TokenKind};

/// Why a (project, package) pair failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    UnknownProject,
    UnknownPackage,
}

/// Lookup-by-name against the project/package registry.
pub trait PackageLookup: Send + Sync {
    fn find(&self, project: &str, package: &str) -> std::result::Result<PackageRef, LookupFailure>;
}

/// In-memory registry: project name to its set of package names.
#[derive(Debug, Default)]
pub struct PackageDirectory {
    projects: HashMap<String, BTreeSet<String>>,
}

impl PackageDirectory {
    pub fn new(projects: HashMap<String, BTreeSet<String>>) -> Self {
        Self { projects }
    }

    /// Build from the config shape (project -> list of packages).
    pub fn from_config(projects: &HashMap<String, Vec<String>>) -> Self {
        let projects = projects
            .iter()
            .map(|(project, packages)| (project.clone(), packages.iter().cloned().collect()))
            .collect();
        Self { projects }
    }
}

impl PackageLookup for PackageDirectory {
    fn find(&self, project: &str, package: &str) -> std::result::Result<PackageRef, LookupFailure> {
        let packages = self
            .projects
            .get(project)
            .ok_or(LookupFailure::UnknownProject)?;
        if !packages.contains(package) {
            return Err(LookupFailure::UnknownPackage);
        }
        Ok(PackageRef {
            project: project.to_string(),
            package: package.to_string(),
        })
    }
}

/// Maximum length of a caller-supplied name echoed into an error message.
const ELIDE_MAX: usize = 40;

/// Sanitize a caller-supplied name for inclusion in an error message:
/// strips control characters and truncates long names.
pub fn elide(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !c.is_control()).collect();
    if cleaned.chars().count() <= ELIDE_MAX {
        return cleaned;
    }
    let truncated: String = cleaned.chars().take(ELIDE_MAX).collect();
    format!("{truncated}...")
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve an optional package scope for token creation.
///
/// - both names absent: no package scoping;
/// - exactly one present: validation failure naming both fields as
///   jointly required (this check runs for every kind);
/// - both present for a workflow kind: validation failure — workflow
///   tokens may never be package-scoped, and no lookup is performed;
/// - both present otherwise: registry lookup, with the failing names
///   echoed (elided) in the not-found error.
pub fn resolve(
    lookup: &dyn PackageLookup,
    kind: &TokenKind,
    project_name: Option<&str>,
    package_name: Option<&str>,
) -> Result<Option<PackageRef>> {
    let (project, package) = match (present(project_name), present(package_name)) {
        (None, None) => return Ok(None),
        (Some(project), Some(package)) => (project, package),
        _ => {
            let message =
                "when providing an optional package, both project name and package name \
                 must be provided";
            return Err(Error::Validation(vec![
                FieldError::new("project_name", message),
                FieldError::new("package_name", message),
            ]));
        }
    };

    if kind.is_workflow() {
        return Err(Error::field(
            "package_name",
            "workflow tokens may not be package-scoped",
        ));
    }

    match lookup.find(project, package) {
        Ok(reference) => Ok(Some(reference)),
        Err(LookupFailure::UnknownProject) => Err(Error::UnknownProject(elide(project))),
        Err(LookupFailure::UnknownPackage) => {
            Err(Error::UnknownPackage(elide(project), elide(package)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> PackageDirectory {
        let mut projects = HashMap::new();
        projects.insert(
            "devel:tools".to_string(),
            ["hello", "world"].iter().map(|s| s.to_string()).collect(),
        );
        PackageDirectory::new(projects)
    }

    #[test]
    fn both_absent_resolves_to_none() {
        let result = resolve(&directory(), &TokenKind::Generic, None, None).unwrap();
        assert!(result.is_none());

        // Empty and whitespace-only names count as absent
        let result = resolve(&directory(), &TokenKind::Generic, Some(""), Some("  ")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn exactly_one_name_is_a_validation_error() {
        let err = resolve(&directory(), &TokenKind::Generic, Some("devel:tools"), None)
            .unwrap_err();
        match err {
            Error::Validation(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["project_name", "package_name"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert!(matches!(
            resolve(&directory(), &TokenKind::Generic, None, Some("hello")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn pairing_check_applies_to_workflow_too() {
        // A workflow request with only a project name still gets the
        // pairing error, not a silent skip.
        let kind = TokenKind::Workflow { scm_token: None };
        let err = resolve(&directory(), &kind, Some("devel:tools"), None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("both project name and package name"));
    }

    #[test]
    fn workflow_with_both_names_is_rejected_without_lookup() {
        // The project doesn't even exist in the directory; the scoping
        // rule fires before any lookup, so we get a validation error
        // rather than a not-found.
        let kind = TokenKind::Workflow { scm_token: None };
        let err = resolve(&directory(), &kind, Some("ghost"), Some("x")).unwrap_err();
        match err {
            Error::Validation(fields) => {
                assert_eq!(fields[0].field, "package_name");
                assert!(fields[0].message.contains("may not be package-scoped"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn both_present_resolves_existing_package() {
        let reference = resolve(
            &directory(),
            &TokenKind::Generic,
            Some("devel:tools"),
            Some("hello"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(reference.project, "devel:tools");
        assert_eq!(reference.package, "hello");
    }

    #[test]
    fn unknown_project_names_the_project() {
        let err = resolve(&directory(), &TokenKind::Generic, Some("ghost"), Some("x"))
            .unwrap_err();
        assert!(err.to_string().contains("'ghost'"), "got: {err}");
        assert!(matches!(err, Error::UnknownProject(_)));
    }

    #[test]
    fn unknown_package_names_project_and_package() {
        let err = resolve(
            &directory(),
            &TokenKind::Generic,
            Some("devel:tools"),
            Some("ghost"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("'devel:tools/ghost'"), "got: {err}");
        assert!(matches!(err, Error::UnknownPackage(_, _)));
    }

    #[test]
    fn elide_strips_control_chars_and_truncates() {
        assert_eq!(elide("plain-name"), "plain-name");
        assert_eq!(elide("evil\r\nname"), "evilname");

        let long = "p".repeat(60);
        let elided = elide(&long);
        assert_eq!(elided.len(), ELIDE_MAX + 3);
        assert!(elided.ends_with("..."));
    }

    #[test]
    fn hostile_name_is_sanitized_in_error() {
        let err = resolve(
            &directory(),
            &TokenKind::Generic,
            Some("bad\x1b[31mname"),
            Some("x"),
        )
        .unwrap_err();
        assert!(
            !err.to_string().contains('\x1b'),
            "control characters must not survive into error text: {err}"
        );
    }
}
