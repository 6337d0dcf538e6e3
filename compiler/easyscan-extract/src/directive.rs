//! Directive comments.
//!
//! A directive is a comment line starting with one of the fixed prefixes below. Directives decide
//! whether the next type declaration takes part in extraction:
//!
//! - `easyscan:explicit` includes the declaration even when not every type is extracted.
//! - `easyscan:skip` excludes the declaration, no matter what else applies to it.
//!
//! Both are matched after trimming each line of the comment, and are case-sensitive.

use easyscan_syntax::AstCommentGroup;

pub const SKIP_DIRECTIVE: &str = "easyscan:skip";
pub const EXPLICIT_DIRECTIVE: &str = "easyscan:explicit";

/// The directives collected since the last type declaration.
///
/// Flags only ever go from `false` to `true` while comments are absorbed. The visitor resets the
/// state once the type declaration it applies to has been handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveState {
    pub skip: bool,
    pub explicit: bool,
}

impl DirectiveState {
    /// Absorb every comment of a comment group.
    pub fn absorb_group(&mut self, group: &AstCommentGroup) {
        for comment in &group.comments {
            self.absorb_comment(&comment.text);
        }
    }

    /// Absorb the raw text of a single comment, markers included.
    ///
    /// Comments shorter than three characters cannot hold a directive and are ignored.
    pub fn absorb_comment(&mut self, text: &str) {
        if text.len() < 3 {
            return;
        }
        for line in comment_body(text).lines() {
            let line = line.trim();
            self.skip |= line.starts_with(SKIP_DIRECTIVE);
            self.explicit |= line.starts_with(EXPLICIT_DIRECTIVE);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Strip the comment markers off a comment.
fn comment_body(text: &str) -> &str {
    if let Some(body) = text.strip_prefix("//") {
        body
    } else if let Some(body) = text.strip_prefix("/*") {
        body.strip_suffix("*/").unwrap_or(body)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use crate::directive::DirectiveState;
    use easyscan_span::Span;
    use easyscan_syntax::{AstComment, AstCommentGroup};

    fn absorb(comments: &[&str]) -> DirectiveState {
        let mut state = DirectiveState::default();
        for comment in comments {
            state.absorb_comment(comment);
        }
        state
    }

    #[test]
    fn test_line_comment_directives() {
        assert_eq!(
            absorb(&["// easyscan:skip"]),
            DirectiveState {
                skip: true,
                explicit: false
            }
        );
        assert_eq!(
            absorb(&["//easyscan:explicit"]),
            DirectiveState {
                skip: false,
                explicit: true
            }
        );
    }

    #[test]
    fn test_block_comment_directives() {
        let state = absorb(&["/*\n  some text\n  easyscan:explicit\n*/"]);
        assert!(state.explicit);
        assert!(!state.skip);
        let state = absorb(&["/* easyscan:skip */"]);
        assert!(state.skip);
    }

    #[test]
    fn test_directive_must_start_the_line() {
        let state = absorb(&["// see easyscan:skip", "// Easyscan:explicit"]);
        assert_eq!(state, DirectiveState::default());
        let state = absorb(&["// easyscan:skipped for now"]);
        assert!(state.skip);
    }

    #[test]
    fn test_short_comments_are_ignored() {
        let state = absorb(&["//", "/**/", "// easyscan:explicit"]);
        assert!(state.explicit);
    }

    #[test]
    fn test_directives_accumulate_until_reset() {
        let mut state = absorb(&["// easyscan:skip", "// unrelated", "// easyscan:explicit"]);
        assert!(state.skip && state.explicit);
        state.absorb_comment("// unrelated");
        assert!(state.skip && state.explicit);
        state.reset();
        assert_eq!(state, DirectiveState::default());
    }

    #[test]
    fn test_absorb_group() {
        let comment = |text: &str| AstComment {
            span: Span::empty(),
            text: text.to_owned(),
        };
        let group = AstCommentGroup {
            span: Span::empty(),
            comments: vec![comment("// User is a row."), comment("// easyscan:explicit")],
        };
        let mut state = DirectiveState::default();
        state.absorb_group(&group);
        assert!(state.explicit);
        assert!(!state.skip);
    }
}
