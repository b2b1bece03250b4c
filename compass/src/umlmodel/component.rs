//! Component and deployment diagram elements.

use strum::{Display, EnumString};

use super::similarity::{self, Depth, endpoint_similarity, parent_similarity};
use super::{ElementKind, ElementRef};

pub const NODE_NAME_WEIGHT: f64 = 0.6;
pub const NODE_STEREOTYPE_WEIGHT: f64 = 0.2;
pub const NODE_PARENT_WEIGHT: f64 = 0.2;

pub const RELATIONSHIP_TYPE_WEIGHT: f64 = 0.3;
pub const RELATIONSHIP_ENDPOINT_WEIGHT: f64 = 0.35;

/// Relationship kinds shared by component and deployment diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ComponentRelationshipType {
    #[strum(serialize = "ComponentInterfaceProvided", serialize = "DeploymentInterfaceProvided")]
    InterfaceProvided,
    #[strum(serialize = "ComponentInterfaceRequired", serialize = "DeploymentInterfaceRequired")]
    InterfaceRequired,
    #[strum(serialize = "ComponentDependency", serialize = "DeploymentDependency")]
    Dependency,
    #[strum(serialize = "DeploymentAssociation")]
    Association,
}

pub fn deployment_node_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (ElementKind::DeploymentNode { stereotype: sa }, ElementKind::DeploymentNode { stereotype: sb }) =
        (a.kind(), b.kind())
    else {
        return 0.0;
    };

    NODE_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name())
        + NODE_STEREOTYPE_WEIGHT * similarity::equality(sa, sb)
        + NODE_PARENT_WEIGHT * parent_similarity(a, b)
}

pub fn relationship_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    let (
        ElementKind::ComponentRelationship {
            relationship_type: ta,
            ..
        },
        ElementKind::ComponentRelationship {
            relationship_type: tb,
            ..
        },
    ) = (a.kind(), b.kind())
    else {
        return 0.0;
    };

    let type_score = if ta == tb { RELATIONSHIP_TYPE_WEIGHT } else { 0.0 };
    let ends = similarity::best_orientation(a, b, |a_source, a_target, b_first, b_second, _| {
        RELATIONSHIP_ENDPOINT_WEIGHT * endpoint_similarity(a, a_source, b, b_first, depth)
            + RELATIONSHIP_ENDPOINT_WEIGHT * endpoint_similarity(a, a_target, b, b_second, depth)
    });

    type_score + ends
}
