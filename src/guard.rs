//! Pre-execution denylist scan.
//!
//! First line of defense: a lexical pass over the fixture and submission that
//! rejects any identifier on the denylist before the sandbox is even built.
//! Aliasing (`let d = document;`) is caught for free, since the forbidden
//! name itself must appear as an identifier token at the point of aliasing.
//! The executor enforces the same denylist a second time at the binding
//! level, so this guard is defense-in-depth rather than the sole barrier.

use crate::config::Denylist;
use crate::errors::{GradeError, Result};
use tracing::debug;

pub struct DenylistGuard<'a> {
    denylist: &'a Denylist,
}

impl<'a> DenylistGuard<'a> {
    pub fn new(denylist: &'a Denylist) -> Self {
        Self { denylist }
    }

    /// Scan both texts; the fixture is checked first so authoring mistakes
    /// surface before learner mistakes.
    pub fn check(&self, fixture_code: &str, submission_code: &str) -> Result<()> {
        for source in [fixture_code, submission_code] {
            if let Some(name) = self.first_denylisted_identifier(source) {
                debug!(global = %name, "denylist guard rejected source");
                return Err(GradeError::ForbiddenGlobal(name));
            }
        }
        Ok(())
    }

    /// Walk the source skipping comments and string literals, and return the
    /// first identifier token found on the denylist.
    fn first_denylisted_identifier(&self, source: &str) -> Option<String> {
        if self.denylist.is_empty() {
            return None;
        }

        let mut chars = source.chars().peekable();
        let mut ident = String::new();

        while let Some(c) = chars.next() {
            // Comments.
            if c == '/' {
                match chars.peek() {
                    Some('/') => {
                        for c in chars.by_ref() {
                            if c == '\n' {
                                break;
                            }
                        }
                        continue;
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = '\0';
                        for c in chars.by_ref() {
                            if prev == '*' && c == '/' {
                                break;
                            }
                            prev = c;
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            // String literals; backslash escapes the next character.
            if c == '"' || c == '\'' || c == '`' {
                let quote = c;
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        break;
                    }
                }
                continue;
            }

            if is_ident_start(c) {
                ident.clear();
                ident.push(c);
                while let Some(&c) = chars.peek() {
                    if is_ident_continue(c) {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if self.denylist.contains(&ident) {
                    return Some(std::mem::take(&mut ident));
                }
            }
        }

        None
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard_err(fixture: &str, submission: &str) -> Option<GradeError> {
        let denylist = Denylist::default();
        DenylistGuard::new(&denylist).check(fixture, submission).err()
    }

    #[test]
    fn clean_code_passes() {
        assert_eq!(guard_err("let xs = [1, 2, 3];", "xs.len()"), None);
    }

    #[test]
    fn direct_reference_is_rejected() {
        assert_eq!(
            guard_err("", "document.title"),
            Some(GradeError::ForbiddenGlobal("document".into()))
        );
    }

    #[test]
    fn aliasing_is_rejected_at_the_assignment() {
        assert_eq!(
            guard_err("", "let d = document; d.title"),
            Some(GradeError::ForbiddenGlobal("document".into()))
        );
    }

    #[test]
    fn fixture_is_scanned_too() {
        assert_eq!(
            guard_err("let f = fetch;", "f(\"https://example.com\")"),
            Some(GradeError::ForbiddenGlobal("fetch".into()))
        );
    }

    #[test]
    fn names_inside_strings_and_comments_are_ignored() {
        assert_eq!(guard_err("", "\"document\" + \"!\""), None);
        assert_eq!(guard_err("", "// document\n1 + 1"), None);
        assert_eq!(guard_err("", "/* fetch(window) */ 2"), None);
    }

    #[test]
    fn longer_identifiers_containing_a_forbidden_name_pass() {
        assert_eq!(guard_err("", "let documentation = 1; documentation"), None);
        assert_eq!(guard_err("", "let refetch = 2; refetch"), None);
    }

    #[test]
    fn custom_denylist_is_honored() {
        let denylist = Denylist::new(["process"]);
        let guard = DenylistGuard::new(&denylist);
        assert!(guard.check("", "process.exit()").is_err());
        assert!(guard.check("", "document.title").is_ok());
    }
}
