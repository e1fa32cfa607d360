//! Style dispatch table.
//!
//! Each `(style, explode, kind)` cell maps to one [`RulePlan`]. Cells the table does
//! not list are unsupported and fail route compilation.

use crate::deserializer::ContainerStyle;
use crate::spec::{ParameterStyle, SchemaKind};

/// How the raw key for an exploded object field is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// `R=100` (form, matrix, label)
    Plain,
    /// `color[R]=100`
    DeepObject,
}

impl FieldKey {
    pub fn key(&self, parameter: &str, field: &str) -> String {
        match self {
            FieldKey::Plain => field.to_string(),
            FieldKey::DeepObject => format!("{parameter}[{field}]"),
        }
    }
}

/// How one parameter turns into validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulePlan {
    /// One rule; containers are split with the given style
    Single(ContainerStyle),
    /// One rule fed with every occurrence of the key
    ExplodedList,
    /// One path rule whose group holds repeated `;name=value` segments
    MatrixExplodedArray,
    /// One rule per declared object field, merged back under the parameter name
    ExplodedFields(FieldKey),
}

pub fn plan(style: ParameterStyle, explode: bool, kind: SchemaKind) -> Option<RulePlan> {
    use ParameterStyle as S;
    use SchemaKind as K;

    let plan = match (style, explode, kind) {
        // deepObject is only defined exploded; a missing `explode` still means `color[R]=`
        (S::DeepObject, _, K::Object) => RulePlan::ExplodedFields(FieldKey::DeepObject),
        (S::DeepObject, _, _) => return None,

        // explode has no effect on scalars
        (_, _, K::Primitive(_)) => RulePlan::Single(ContainerStyle::Comma),

        (S::Simple, true, K::Object) => RulePlan::Single(ContainerStyle::KeyValuePairs),
        (S::Simple, _, _) => RulePlan::Single(ContainerStyle::Comma),

        (S::Label, true, K::Object) => RulePlan::ExplodedFields(FieldKey::Plain),
        (S::Label, true, _) => RulePlan::Single(ContainerStyle::Dot),
        (S::Label, false, _) => RulePlan::Single(ContainerStyle::Comma),

        (S::Matrix, true, K::Object) => RulePlan::ExplodedFields(FieldKey::Plain),
        (S::Matrix, true, K::Array) => RulePlan::MatrixExplodedArray,
        (S::Matrix, true, _) => return None,
        (S::Matrix, false, _) => RulePlan::Single(ContainerStyle::Comma),

        (S::Form, true, K::Object) => RulePlan::ExplodedFields(FieldKey::Plain),
        (S::Form, true, _) => RulePlan::ExplodedList,
        (S::Form, false, _) => RulePlan::Single(ContainerStyle::Comma),

        (S::SpaceDelimited | S::PipeDelimited, true, K::Array) => RulePlan::ExplodedList,
        (S::SpaceDelimited | S::PipeDelimited, false, K::Array | K::Object) => {
            RulePlan::Single(ContainerStyle::for_style(style))
        }
        (S::SpaceDelimited | S::PipeDelimited, _, _) => return None,
    };
    Some(plan)
}
