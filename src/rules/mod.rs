//! Rule representation and compilation.
//!
//! # Data Flow
//! ```text
//! rules.txt / rules.json / rules.yml
//!     → source.rs (read file, pick format)
//!     → compiler.rs (tokenize lines / validate records)
//!         → pattern.rs (enhance + compile regex, memoized)
//!         → template.rs (parse replacement placeholders)
//!     → RuleSet (ordered, immutable)
//!     + Vec<RuleCompilationError> (dropped rules)
//! ```
//!
//! # Design Decisions
//! - A malformed rule is reported and dropped; it never aborts the compile
//! - Action is a tagged enum checked once at compile time
//! - Declaration order is preserved; the router relies on it

pub mod cases;
pub mod compiler;
pub mod error;
pub mod lint;
pub mod pattern;
pub mod source;
pub mod template;

pub use compiler::{CompileOutcome, RuleCompiler};
pub use error::{CompileErrorReason, LoadError, RuleCompilationError, SourceRef};
pub use pattern::{enhance_pattern, PatternCache};
pub use source::{RuleSource, SourceFormat};
pub use template::Template;

use crate::routing::matcher::Matcher;

/// What a matched rule does.
#[derive(Debug, Clone)]
pub enum Action {
    /// Answer with a 3xx response pointing at `location`.
    Redirect { status: u16, location: Template },

    /// Forward the request with a new path, optionally to another origin.
    ///
    /// `status` is the code declared by the rule source (200 for
    /// structured records); it does not affect routing.
    Rewrite {
        status: u16,
        path: Template,
        origin: Option<Template>,
    },
}

impl Action {
    /// Every template carried by the action.
    pub fn templates(&self) -> Vec<&Template> {
        match self {
            Action::Redirect { location, .. } => vec![location],
            Action::Rewrite { path, origin, .. } => {
                let mut templates = vec![path];
                templates.extend(origin.as_ref());
                templates
            }
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Action::Redirect { status, .. } | Action::Rewrite { status, .. } => *status,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Action::Redirect { .. })
    }
}

/// A compiled routing rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Where the rule was declared.
    pub source: SourceRef,
    pub matcher: Matcher,
    pub action: Action,
}

/// An ordered, immutable list of compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
