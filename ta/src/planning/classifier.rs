//! Heuristic step classifier
//!
//! Assigns a tool, a theme, a deliverable and a duration estimate to one step by
//! case-insensitive keyword matching. Each dimension has its own ordered rule
//! table; the first rule with a matching keyword wins, otherwise the table's
//! default applies.

use std::fmt;

use tracing::debug;

/// One keyword rule: any keyword found in the content selects `category`
#[derive(Debug, Clone, Copy)]
pub struct Rule<C> {
    pub keywords: &'static [&'static str],
    pub category: C,
}

impl<C: Copy> Rule<C> {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw))
    }
}

/// First matching category in `rules`, or `default`
fn first_match<C: Copy>(rules: &[Rule<C>], lowered: &str, default: C) -> C {
    rules
        .iter()
        .find(|rule| rule.matches(lowered))
        .map(|rule| rule.category)
        .unwrap_or(default)
}

/// Tool used to carry out a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    SearchTool,
    TextEditor,
    CodeEditor,
    TestTool,
    SystemTool,
    ManualExecution,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::SearchTool,
        Tool::TextEditor,
        Tool::CodeEditor,
        Tool::TestTool,
        Tool::SystemTool,
        Tool::ManualExecution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::SearchTool => "search tool",
            Tool::TextEditor => "text editor",
            Tool::CodeEditor => "code editor",
            Tool::TestTool => "test tool",
            Tool::SystemTool => "system tool",
            Tool::ManualExecution => "manual execution",
        }
    }
}

/// Phase of work a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Planning,
    Research,
    Verification,
    Execution,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Planning, Theme::Research, Theme::Verification, Theme::Execution];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Planning => "planning",
            Theme::Research => "research",
            Theme::Verification => "verification",
            Theme::Execution => "execution",
        }
    }
}

/// What a step produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deliverable {
    Document,
    CodeFeature,
    TestResult,
    IntermediateResult,
}

impl Deliverable {
    pub const ALL: [Deliverable; 4] = [
        Deliverable::Document,
        Deliverable::CodeFeature,
        Deliverable::TestResult,
        Deliverable::IntermediateResult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Deliverable::Document => "document",
            Deliverable::CodeFeature => "code/feature",
            Deliverable::TestResult => "test result",
            Deliverable::IntermediateResult => "intermediate result",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Tool, Theme, Deliverable);

pub const TOOL_RULES: &[Rule<Tool>] = &[
    Rule {
        keywords: &["search", "look up", "lookup", "find", "research", "investigate", "learn about"],
        category: Tool::SearchTool,
    },
    Rule {
        keywords: &["write", "document", "report", "record", "draft"],
        category: Tool::TextEditor,
    },
    Rule {
        keywords: &["code", "program", "develop", "implement"],
        category: Tool::CodeEditor,
    },
    Rule {
        keywords: &["test", "verify", "check"],
        category: Tool::TestTool,
    },
    Rule {
        keywords: &["install", "configure", "config", "set up", "setup"],
        category: Tool::SystemTool,
    },
];

pub const THEME_RULES: &[Rule<Theme>] = &[
    Rule {
        keywords: &["search", "look up", "lookup", "research", "investigate", "learn about"],
        category: Theme::Research,
    },
    Rule {
        keywords: &["test", "verify", "check"],
        category: Theme::Verification,
    },
];

pub const DELIVERABLE_RULES: &[Rule<Deliverable>] = &[
    Rule {
        keywords: &["document", "report", "proposal"],
        category: Deliverable::Document,
    },
    Rule {
        keywords: &["code", "program", "feature"],
        category: Deliverable::CodeFeature,
    },
    Rule {
        keywords: &["test", "verify"],
        category: Deliverable::TestResult,
    },
];

pub const ESTIMATE_RULES: &[Rule<u32>] = &[
    Rule {
        keywords: &["simple", "quick", "preliminary"],
        category: 15,
    },
    Rule {
        keywords: &["complex", "detailed", "in-depth", "deep"],
        category: 60,
    },
];

pub const DEFAULT_ESTIMATE_MINUTES: u32 = 30;

/// Result of classifying one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tool: Tool,
    pub theme: Theme,
    pub deliverable: Deliverable,
    pub estimate_minutes: u32,
}

/// Classify a step by its content and 1-based position in the plan
///
/// The first step is always themed as planning, whatever its keywords say.
pub fn classify(content: &str, position: usize) -> Classification {
    let lowered = content.to_lowercase();

    let theme = if position == 1 {
        Theme::Planning
    } else {
        first_match(THEME_RULES, &lowered, Theme::Execution)
    };

    let classification = Classification {
        tool: first_match(TOOL_RULES, &lowered, Tool::ManualExecution),
        theme,
        deliverable: first_match(DELIVERABLE_RULES, &lowered, Deliverable::IntermediateResult),
        estimate_minutes: first_match(ESTIMATE_RULES, &lowered, DEFAULT_ESTIMATE_MINUTES),
    };
    debug!(%position, ?classification, "classify: done");
    classification
}
