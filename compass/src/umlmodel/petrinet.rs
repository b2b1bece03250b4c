//! Petri net places and arcs. Transitions compare by name only.

use super::similarity::{self, Depth, endpoint_similarity};
use super::{ElementKind, ElementRef};

pub const PLACE_NAME_WEIGHT: f64 = 0.6;
pub const PLACE_TOKENS_WEIGHT: f64 = 0.2;
pub const PLACE_CAPACITY_WEIGHT: f64 = 0.2;

pub const ARC_MULTIPLICITY_WEIGHT: f64 = 0.2;
pub const ARC_ENDPOINT_WEIGHT: f64 = 0.4;

pub fn place_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (
        ElementKind::Place {
            tokens: ta,
            capacity: ca,
        },
        ElementKind::Place {
            tokens: tb,
            capacity: cb,
        },
    ) = (a.kind(), b.kind())
    else {
        return 0.0;
    };

    PLACE_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name())
        + PLACE_TOKENS_WEIGHT * similarity::equality(ta, tb)
        + PLACE_CAPACITY_WEIGHT * similarity::equality(ca, cb)
}

pub fn arc_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    let (ElementKind::Arc { multiplicity: ma, .. }, ElementKind::Arc { multiplicity: mb, .. }) =
        (a.kind(), b.kind())
    else {
        return 0.0;
    };

    let multiplicity = ARC_MULTIPLICITY_WEIGHT * similarity::equality(ma, mb);
    let ends = similarity::best_orientation(a, b, |a_source, a_target, b_first, b_second, _| {
        ARC_ENDPOINT_WEIGHT * endpoint_similarity(a, a_source, b, b_first, depth)
            + ARC_ENDPOINT_WEIGHT * endpoint_similarity(a, a_target, b, b_second, depth)
    });

    multiplicity + ends
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
    fn test_place_token_and_capacity() {
        let mut diagram = UmlDiagram::new(DiagramType::PetriNet);
        let a = named(&mut diagram, "p1", "PetriNetPlace", "buffer", ElementKind::Place {
            tokens: "1".into(),
            capacity: "Infinity".into(),
        });
        let b = named(&mut diagram, "p2", "PetriNetPlace", "Buffer", ElementKind::Place {
            tokens: "0".into(),
            capacity: "infinity".into(),
        });
        let a = diagram.get(a).unwrap();
        let b = diagram.get(b).unwrap();
        assert!(approx(a.local_similarity(&b), 0.8));
    }

    #[test]
    fn test_arc_multiplicity_and_endpoints() {
        let mut diagram = UmlDiagram::new(DiagramType::PetriNet);
        let place = named(&mut diagram, "p", "PetriNetPlace", "ready", ElementKind::Place {
            tokens: "1".into(),
            capacity: "1".into(),
        });
        let transition = named(&mut diagram, "t", "PetriNetTransition", "start", ElementKind::Transition);

        let mut arc = |id: &str, multiplicity: &str| {
            diagram.push(UmlElement::new(
                id,
                "PetriNetArc",
                multiplicity,
                ElementKind::Arc {
                    multiplicity: multiplicity.to_string(),
                    source: Endpoint::new(place),
                    target: Endpoint::new(transition),
                },
            ))
        };
        let one = arc("a1", "1");
        let two = arc("a2", "2");

        let one = diagram.get(one).unwrap();
        let two = diagram.get(two).unwrap();
        assert!(approx(one.local_similarity(&two), 0.8));
        assert!(approx(one.overall_similarity(&one), 1.0));
    }
}
