//! Class diagram elements: classes (including abstract classes, interfaces and
//! enumerations), their attributes and methods, packages, and class relationships.

use strum::{Display, EnumString};

use super::similarity::{self, Depth, endpoint_similarity};
use super::{ElementKind, ElementRef};

pub const CLASS_NAME_WEIGHT: f64 = 0.7;
pub const CLASS_TYPE_WEIGHT: f64 = 0.3;

pub const ATTRIBUTE_NAME_WEIGHT: f64 = 0.7;
pub const ATTRIBUTE_TYPE_WEIGHT: f64 = 0.3;

pub const METHOD_NAME_WEIGHT: f64 = 0.25;
pub const METHOD_RETURN_TYPE_WEIGHT: f64 = 0.25;
pub const METHOD_PARAMETERS_WEIGHT: f64 = 0.5;

pub const RELATIONSHIP_TYPE_WEIGHT: f64 = 0.3;
pub const RELATIONSHIP_ENDPOINT_WEIGHT: f64 = 0.25;
pub const RELATIONSHIP_ROLE_WEIGHT: f64 = 0.05;
pub const RELATIONSHIP_MULTIPLICITY_WEIGHT: f64 = 0.05;

/// Flavour of a class; all flavours share one element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ClassType {
    Class,
    AbstractClass,
    Interface,
    Enumeration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ClassRelationshipType {
    #[strum(serialize = "ClassBidirectional")]
    Bidirectional,
    #[strum(serialize = "ClassUnidirectional")]
    Unidirectional,
    #[strum(serialize = "ClassInheritance")]
    Inheritance,
    #[strum(serialize = "ClassRealization")]
    Realization,
    #[strum(serialize = "ClassDependency")]
    Dependency,
    #[strum(serialize = "ClassAggregation")]
    Aggregation,
    #[strum(serialize = "ClassComposition")]
    Composition,
}

pub fn class_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (ElementKind::Class { class_type: ta, .. }, ElementKind::Class { class_type: tb, .. }) =
        (a.kind(), b.kind())
    else {
        return 0.0;
    };

    let type_score = if ta == tb { 1.0 } else { 0.0 };
    CLASS_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name()) + CLASS_TYPE_WEIGHT * type_score
}

/// Attributes and methods are shared with object diagrams.
pub fn attribute_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (ElementKind::Attribute { attribute_type: ta }, ElementKind::Attribute { attribute_type: tb }) =
        (a.kind(), b.kind())
    else {
        return 0.0;
    };

    ATTRIBUTE_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name())
        + ATTRIBUTE_TYPE_WEIGHT * similarity::equality(ta, tb)
}

pub fn method_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (
        ElementKind::Method {
            parameters: pa,
            return_type: ra,
        },
        ElementKind::Method {
            parameters: pb,
            return_type: rb,
        },
    ) = (a.kind(), b.kind())
    else {
        return 0.0;
    };

    METHOD_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name())
        + METHOD_RETURN_TYPE_WEIGHT * similarity::equality(ra, rb)
        + METHOD_PARAMETERS_WEIGHT * parameter_overlap(pa, pb)
}

/// Share of parameters present on both sides, matched one-to-one ignoring case.
fn parameter_overlap(a: &[String], b: &[String]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let mut unmatched: Vec<&String> = b.iter().collect();
    let mut matched = 0;
    for parameter in a {
        if let Some(pos) = unmatched
            .iter()
            .position(|candidate| similarity::equals_ignore_case(parameter, candidate))
        {
            unmatched.swap_remove(pos);
            matched += 1;
        }
    }

    matched as f64 / longest as f64
}

pub fn relationship_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    let (
        ElementKind::ClassRelationship {
            relationship_type: ta,
            ..
        },
        ElementKind::ClassRelationship {
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
            + RELATIONSHIP_ROLE_WEIGHT * similarity::name_similarity(&a_source.role, &b_first.role)
            + RELATIONSHIP_ROLE_WEIGHT * similarity::name_similarity(&a_target.role, &b_second.role)
            + RELATIONSHIP_MULTIPLICITY_WEIGHT
                * similarity::equality(&a_source.multiplicity, &b_first.multiplicity)
            + RELATIONSHIP_MULTIPLICITY_WEIGHT
                * similarity::equality(&a_target.multiplicity, &b_second.multiplicity)
    });

    type_score + ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umlmodel::test_support::*;
    use crate::umlmodel::{Endpoint, UmlDiagram, UmlElement};
    use db::models::modeling_exercise::DiagramType;
    use std::str::FromStr;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn method(diagram: &mut UmlDiagram, id: &str, name: &str, params: &[&str], ret: &str) -> usize {
        diagram
            .push(UmlElement::new(
                id,
                "ClassMethod",
                name,
                ElementKind::Method {
                    parameters: params.iter().map(|p| p.to_string()).collect(),
                    return_type: ret.to_string(),
                },
            ))
            .get()
    }

    fn association(
        diagram: &mut UmlDiagram,
        id: &str,
        relationship_type: ClassRelationshipType,
        source: Endpoint,
        target: Endpoint,
    ) -> crate::umlmodel::ElementIndex {
        diagram.push(UmlElement::new(
            id,
            relationship_type.to_string(),
            "",
            ElementKind::ClassRelationship {
                relationship_type,
                source,
                target,
            },
        ))
    }

    #[test]
    fn test_class_type_counts_for_thirty_percent() {
        let mut diagram = UmlDiagram::new(DiagramType::ClassDiagram);
        let a = class(&mut diagram, "a", "Shape", &[], &[]);
        let b = named(
            &mut diagram,
            "b",
            "AbstractClass",
            "Shape",
            ElementKind::Class {
                class_type: ClassType::AbstractClass,
                attributes: vec![],
                methods: vec![],
            },
        );
        let a = diagram.get(a).unwrap();
        let b = diagram.get(b).unwrap();
        assert!(approx(a.local_similarity(&b), 0.7));
    }

    #[test]
    fn test_login_and_logout_classes_fall_below_threshold() {
        let mut diagram = UmlDiagram::new(DiagramType::ClassDiagram);
        let login = class(&mut diagram, "a", "Login", &[], &[]);
        let logout = class(&mut diagram, "b", "Logout", &[], &[]);
        let login = diagram.get(login).unwrap();
        let logout = diagram.get(logout).unwrap();
        let score = login.overall_similarity(&logout);
        assert!(approx(score, 0.65));
        assert!(score < 0.8);
    }

    #[test]
    fn test_method_similarity_weights() {
        let mut diagram = UmlDiagram::new(DiagramType::ClassDiagram);
        let a = method(&mut diagram, "m1", "save", &["String", "int"], "void");
        let b = method(&mut diagram, "m2", "save", &["int"], "boolean");
        let c = method(&mut diagram, "m3", "SAVE", &["INT", "string"], "Void");

        let (a, b, c) = (
            diagram.elements().nth(a).unwrap(),
            diagram.elements().nth(b).unwrap(),
            diagram.elements().nth(c).unwrap(),
        );
        // name 0.25 + return 0 + 0.5 * 1/2
        assert!(approx(a.local_similarity(&b), 0.5));
        assert!(approx(a.local_similarity(&c), 1.0));
        assert!(approx(b.local_similarity(&a), a.local_similarity(&b)));
    }

    #[test]
    fn test_relationship_is_orientation_invariant() {
        let mut left = UmlDiagram::new(DiagramType::ClassDiagram);
        let customer = class(&mut left, "c", "Customer", &[], &[]);
        let order = class(&mut left, "o", "Order", &[], &[]);
        let forward = association(
            &mut left,
            "r",
            ClassRelationshipType::Bidirectional,
            Endpoint {
                element: customer,
                role: "buyer".into(),
                multiplicity: "1".into(),
            },
            Endpoint {
                element: order,
                role: "orders".into(),
                multiplicity: "*".into(),
            },
        );

        let mut right = UmlDiagram::new(DiagramType::ClassDiagram);
        let order2 = class(&mut right, "o2", "Order", &[], &[]);
        let customer2 = class(&mut right, "c2", "Customer", &[], &[]);
        let backward = association(
            &mut right,
            "r2",
            ClassRelationshipType::Bidirectional,
            Endpoint {
                element: order2,
                role: "orders".into(),
                multiplicity: "*".into(),
            },
            Endpoint {
                element: customer2,
                role: "buyer".into(),
                multiplicity: "1".into(),
            },
        );

        let forward = left.get(forward).unwrap();
        let backward = right.get(backward).unwrap();
        assert!(approx(forward.local_similarity(&backward), 1.0));
        assert!(approx(forward.overall_similarity(&backward), 1.0));
        assert!(approx(backward.overall_similarity(&forward), 1.0));
    }

    #[test]
    fn test_relationship_type_mismatch_costs_type_weight() {
        let mut diagram = UmlDiagram::new(DiagramType::ClassDiagram);
        let a = class(&mut diagram, "a", "Animal", &[], &[]);
        let b = class(&mut diagram, "b", "Dog", &[], &[]);
        let inheritance = association(
            &mut diagram,
            "r1",
            ClassRelationshipType::Inheritance,
            Endpoint::new(b),
            Endpoint::new(a),
        );
        let realization = association(
            &mut diagram,
            "r2",
            ClassRelationshipType::Realization,
            Endpoint::new(b),
            Endpoint::new(a),
        );

        let inheritance = diagram.get(inheritance).unwrap();
        let realization = diagram.get(realization).unwrap();
        assert!(approx(inheritance.local_similarity(&realization), 0.7));
    }

    #[test]
    fn test_relationship_tags_parse() {
        assert_eq!(
            ClassRelationshipType::from_str("ClassComposition").unwrap(),
            ClassRelationshipType::Composition
        );
        assert!(ClassRelationshipType::from_str("Composition").is_err());
        assert_eq!(ClassType::from_str("Enumeration").unwrap(), ClassType::Enumeration);
    }
}
