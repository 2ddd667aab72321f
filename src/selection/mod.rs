//! Variant selection from the optional clinical inputs of a request.
//!
//! Some logical tasks are served by several models that differ only in
//! which inputs they consume. A rule table maps the inputs available for a
//! request to one variant. Rules are tried in order and the first one whose
//! conditions all hold wins.

use std::collections::BTreeMap;
use std::fmt;

/// Which optional inputs a request has.
///
/// Inputs never mentioned count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    inputs: BTreeMap<String, bool>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, input: impl Into<String>, present: bool) -> Self {
        self.set(input, present);
        self
    }

    pub fn set(&mut self, input: impl Into<String>, present: bool) {
        self.inputs.insert(input.into(), present);
    }

    pub fn is_present(&self, input: &str) -> bool {
        self.inputs.get(input).copied().unwrap_or(false)
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for SelectionContext {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut context = SelectionContext::new();
        for (input, present) in iter {
            context.set(input, present);
        }
        context
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Present,
    Absent,
}

/// One row of a selection table. A rule without conditions always matches.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRule<V> {
    pub conditions: &'static [(&'static str, Requirement)],
    pub variant: V,
}

impl<V> SelectionRule<V> {
    pub fn matches(&self, context: &SelectionContext) -> bool {
        self.conditions
            .iter()
            .all(|(input, requirement)| match requirement {
                Requirement::Present => context.is_present(input),
                Requirement::Absent => !context.is_present(input),
            })
    }
}

/// First variant whose rule matches, if any.
pub fn select_variant<V: Copy>(rules: &[SelectionRule<V>], context: &SelectionContext) -> Option<V> {
    rules
        .iter()
        .find(|rule| rule.matches(context))
        .map(|rule| rule.variant)
}

/// Post-operative T1-weighted scan.
pub const T1W_POSTOP: &str = "T1w postop";
/// Post-operative FLAIR scan.
pub const FLAIR_POSTOP: &str = "FLAIR postop";
/// Pre-operative contrast-enhanced T1-weighted scan.
pub const T1WCE_PREOP: &str = "T1wCE preop";

/// Post-operative glioblastoma segmentation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostopVariant {
    OneInput,
    TwoInput,
    ThreeInput,
    FourInput,
    FiveInput,
}

impl PostopVariant {
    pub fn label(self) -> &'static str {
        match self {
            PostopVariant::OneInput => "1-input",
            PostopVariant::TwoInput => "2-input",
            PostopVariant::ThreeInput => "3-input",
            PostopVariant::FourInput => "4-input",
            PostopVariant::FiveInput => "5-input",
        }
    }

    /// Catalog name of the model implementing the variant.
    pub fn model_name(self) -> &'static str {
        match self {
            PostopVariant::OneInput => "MRI_GBM_Postop_FV_1p",
            PostopVariant::TwoInput => "MRI_GBM_Postop_FV_2p",
            PostopVariant::ThreeInput => "MRI_GBM_Postop_FV_3p",
            PostopVariant::FourInput => "MRI_GBM_Postop_FV_4p",
            PostopVariant::FiveInput => "MRI_GBM_Postop_FV_5p",
        }
    }
}

impl fmt::Display for PostopVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule table for post-operative segmentation.
///
/// When the post-operative T1w scan is absent the FLAIR-absent and
/// preop-absent rows overlap; the row order below settles which one
/// applies and is kept as is.
pub const POSTOP_RULES: [SelectionRule<PostopVariant>; 5] = [
    SelectionRule {
        conditions: &[
            (T1W_POSTOP, Requirement::Absent),
            (FLAIR_POSTOP, Requirement::Absent),
            (T1WCE_PREOP, Requirement::Absent),
        ],
        variant: PostopVariant::OneInput,
    },
    SelectionRule {
        conditions: &[
            (FLAIR_POSTOP, Requirement::Absent),
            (T1WCE_PREOP, Requirement::Absent),
        ],
        variant: PostopVariant::TwoInput,
    },
    SelectionRule {
        conditions: &[(T1WCE_PREOP, Requirement::Absent)],
        variant: PostopVariant::ThreeInput,
    },
    SelectionRule {
        conditions: &[
            (FLAIR_POSTOP, Requirement::Absent),
            (T1WCE_PREOP, Requirement::Present),
        ],
        variant: PostopVariant::FourInput,
    },
    SelectionRule {
        conditions: &[],
        variant: PostopVariant::FiveInput,
    },
];

/// Picks the post-operative segmentation variant for the available inputs.
pub fn select_postop_variant(context: &SelectionContext) -> PostopVariant {
    select_variant(&POSTOP_RULES, context).unwrap_or(PostopVariant::FiveInput)
}
