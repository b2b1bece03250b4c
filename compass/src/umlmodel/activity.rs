//! Activity diagram nodes. Activities themselves and control flows use the shared
//! nested-name and link helpers.

use strum::{Display, EnumString};

use super::similarity::nested_name_similarity;
use super::{ElementKind, ElementRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ActivityNodeType {
    #[strum(serialize = "ActivityInitialNode")]
    Initial,
    #[strum(serialize = "ActivityFinalNode")]
    Final,
    #[strum(serialize = "ActivityActionNode")]
    Action,
    #[strum(serialize = "ActivityObjectNode")]
    Object,
    #[strum(serialize = "ActivityForkNode")]
    Fork,
    #[strum(serialize = "ActivityForkNodeHorizontal")]
    ForkHorizontal,
    #[strum(serialize = "ActivityMergeNode")]
    Merge,
    #[strum(serialize = "ActivityDecisionNode")]
    Decision,
}

/// Nodes of a different node type never match; otherwise name plus enclosing activity.
pub fn activity_node_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    match (a.kind(), b.kind()) {
        (ElementKind::ActivityNode { node_type: ta }, ElementKind::ActivityNode { node_type: tb })
            if ta == tb =>
        {
            nested_name_similarity(a, b)
        }
        _ => 0.0,
    }
}
