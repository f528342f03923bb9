//! Front-end options for a session.

use jbridge_checker::{CheckerOptions, DocLint};
use jbridge_common::CompilerOptions;

use crate::project::Project;
use crate::request::ResolveFlags;

/// Lint spec that enables no category.
pub const RAW_LINT: &str = "raw";

/// Derive the front-end options of a session.
///
/// A focal point or a request without forced diagnostics narrows lint to
/// [`RAW_LINT`]. Doc comments are not attributed around a focal point, only
/// for references without forced diagnostics, and fully when diagnostics
/// are forced and doc comment support is enabled.
pub fn session_options(
    options: &CompilerOptions,
    flags: ResolveFlags,
    focal_point: Option<u32>,
    project: Option<&Project>,
) -> CheckerOptions {
    let forced = flags.contains(ResolveFlags::FORCE_DIAGNOSTICS);
    let lint = if focal_point.is_some() || !forced {
        RAW_LINT
    } else {
        options.lint()
    };
    let doclint = if focal_point.is_some() {
        DocLint::None
    } else if !forced {
        DocLint::Reference
    } else if options.doc_comment_support() {
        DocLint::All
    } else {
        DocLint::None
    };
    let mut checker = CheckerOptions::default().with_lint(lint).with_doclint(doclint);
    checker.annotation_processing = project.is_some_and(Project::annotation_processing);
    checker
}

#[cfg(test)]
mod tests {
    use jbridge_checker::LintFlags;
    use jbridge_common::options::{DOC_COMMENT_SUPPORT, ENABLED, LINT};

    use super::*;

    #[test]
    fn test_focal_point_narrows_options() {
        let options = CompilerOptions::new().with(DOC_COMMENT_SUPPORT, ENABLED);
        let focal = session_options(&options, ResolveFlags::FORCE_DIAGNOSTICS, Some(3), None);
        assert_eq!(focal.lint, LintFlags::empty());
        assert_eq!(focal.doclint, DocLint::None);

        let forced = session_options(&options, ResolveFlags::FORCE_DIAGNOSTICS, None, None);
        assert!(forced.lint.contains(LintFlags::ALL));
        assert_eq!(forced.doclint, DocLint::All);

        let quiet = session_options(&options, ResolveFlags::empty(), None, None);
        assert_eq!(quiet.doclint, DocLint::Reference);
    }

    #[test]
    fn test_configured_lint_and_processing() {
        let options = CompilerOptions::new().with(LINT, "deprecation");
        let project = Project::new("app").with_annotation_processing(true);
        let checker = session_options(&options, ResolveFlags::FORCE_DIAGNOSTICS, None, Some(&project));
        assert_eq!(checker.lint, LintFlags::DEPRECATION);
        assert!(checker.annotation_processing);
        assert!(!session_options(&options, ResolveFlags::FORCE_DIAGNOSTICS, None, None).annotation_processing);
    }
}
