//! Use case diagram associations. Actors, use cases and system boundaries compare
//! through the shared name helpers.

use strum::{Display, EnumString};

use super::similarity::{self, Depth, endpoint_similarity};
use super::{ElementKind, ElementRef};

pub const ASSOCIATION_TYPE_WEIGHT: f64 = 0.2;
pub const ASSOCIATION_NAME_WEIGHT: f64 = 0.1;
pub const ASSOCIATION_ENDPOINT_WEIGHT: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum UseCaseAssociationType {
    #[strum(serialize = "UseCaseAssociation")]
    Association,
    #[strum(serialize = "UseCaseGeneralization")]
    Generalization,
    #[strum(serialize = "UseCaseInclude")]
    Include,
    #[strum(serialize = "UseCaseExtend")]
    Extend,
}

pub fn association_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    let (
        ElementKind::UseCaseAssociation {
            association_type: ta,
            ..
        },
        ElementKind::UseCaseAssociation {
            association_type: tb,
            ..
        },
    ) = (a.kind(), b.kind())
    else {
        return 0.0;
    };

    let type_score = if ta == tb { ASSOCIATION_TYPE_WEIGHT } else { 0.0 };
    let name_score = ASSOCIATION_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name());

    let ends = similarity::best_orientation(a, b, |a_source, a_target, b_first, b_second, _| {
        ASSOCIATION_ENDPOINT_WEIGHT * endpoint_similarity(a, a_source, b, b_first, depth)
            + ASSOCIATION_ENDPOINT_WEIGHT * endpoint_similarity(a, a_target, b, b_second, depth)
    });

    type_score + name_score + ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umlmodel::test_support::named;
    use crate::umlmodel::{Endpoint, UmlDiagram, UmlElement};
    use db::models::modeling_exercise::DiagramType;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_include_versus_extend() {
        let mut diagram = UmlDiagram::new(DiagramType::UseCaseDiagram);
        let checkout = named(&mut diagram, "u1", "UseCase", "Checkout", ElementKind::UseCase);
        let login = named(&mut diagram, "u2", "UseCase", "Login", ElementKind::UseCase);

        let mut association = |id: &str, association_type: UseCaseAssociationType| {
            diagram.push(UmlElement::new(
                id,
                association_type.to_string(),
                "",
                ElementKind::UseCaseAssociation {
                    association_type,
                    source: Endpoint::new(checkout),
                    target: Endpoint::new(login),
                },
            ))
        };
        let include = association("r1", UseCaseAssociationType::Include);
        let extend = association("r2", UseCaseAssociationType::Extend);

        let include = diagram.get(include).unwrap();
        let extend = diagram.get(extend).unwrap();
        assert!(approx(include.local_similarity(&extend), 0.8));
        assert!(approx(include.overall_similarity(&include), 1.0));
    }

    #[test]
    fn test_actor_and_use_case_names() {
        let mut diagram = UmlDiagram::new(DiagramType::UseCaseDiagram);
        let system = named(&mut diagram, "s", "UseCaseSystem", "Shop", ElementKind::SystemBoundary);
        let inside = diagram.push(
            UmlElement::new("u1", "UseCase", "Login", ElementKind::UseCase).with_parent(system),
        );
        let other = diagram.push(
            UmlElement::new("u2", "UseCase", "Logout", ElementKind::UseCase).with_parent(system),
        );

        let inside = diagram.get(inside).unwrap();
        let other = diagram.get(other).unwrap();
        assert!(approx(inside.local_similarity(&other), 0.8 * 0.5 + 0.2));
    }
}
