//! # Element Model
//!
//! In-memory representation of one parsed diagram. All elements of a submission live in a
//! flat arena ([`UmlDiagram`]) and point at each other through [`ElementIndex`] values:
//! parents, owned attributes and methods, and relationship endpoints are indices, never
//! references. Similarity is evaluated on [`ElementRef`], a cheap `Copy` handle made of the
//! diagram and an index, so two elements from different submissions can be compared while
//! each still resolves its own neighbours.
//!
//! ## Similarity contract
//! - [`ElementRef::local_similarity`] compares only the element's own attributes and is `0`
//!   whenever the two elements are of a different [`ElementKind`] variant.
//! - [`ElementRef::overall_similarity`] additionally folds in substructure: owned children
//!   for containers (classes, objects) and endpoint structure for relationships. For leaf
//!   elements it equals the local similarity.
//! - Both are symmetric and always lie in `[0, 1]`.
//! - [`UmlDiagram::similarity`] lifts the overall similarity to whole diagrams.

pub mod activity;
pub mod bpmn;
pub mod classdiagram;
pub mod component;
pub mod flowchart;
pub mod object;
pub mod petrinet;
pub mod similarity;
pub mod usecase;

use std::mem::Discriminant;

use db::models::modeling_exercise::DiagramType;

pub use activity::ActivityNodeType;
pub use bpmn::BpmnFlowType;
pub use classdiagram::{ClassRelationshipType, ClassType};
pub use component::ComponentRelationshipType;
pub use flowchart::FlowchartNodeType;
pub use object::{Message, MessageDirection};
pub use similarity::Depth;
pub use usecase::UseCaseAssociationType;

/// Position of an element inside its [`UmlDiagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ElementIndex(usize);

impl ElementIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// One end of a relationship.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Endpoint {
    pub element: ElementIndex,
    /// Role name; only class relationships carry one.
    pub role: String,
    /// Multiplicity, e.g. `0..*`; only class relationships carry one.
    pub multiplicity: String,
}

impl Endpoint {
    pub fn new(element: ElementIndex) -> Self {
        Self {
            element,
            ..Default::default()
        }
    }
}

/// The closed set of element kinds, with the attributes each kind is compared on.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Class {
        class_type: ClassType,
        attributes: Vec<ElementIndex>,
        methods: Vec<ElementIndex>,
    },
    Attribute {
        attribute_type: String,
    },
    Method {
        parameters: Vec<String>,
        return_type: String,
    },
    Package,
    ClassRelationship {
        relationship_type: ClassRelationshipType,
        source: Endpoint,
        target: Endpoint,
    },

    Object {
        attributes: Vec<ElementIndex>,
        methods: Vec<ElementIndex>,
    },
    ObjectLink {
        source: Endpoint,
        target: Endpoint,
    },
    CommunicationLink {
        source: Endpoint,
        target: Endpoint,
        messages: Vec<Message>,
    },

    Activity,
    ActivityNode {
        node_type: ActivityNodeType,
    },
    ControlFlow {
        source: Endpoint,
        target: Endpoint,
    },

    SystemBoundary,
    Actor,
    UseCase,
    UseCaseAssociation {
        association_type: UseCaseAssociationType,
        source: Endpoint,
        target: Endpoint,
    },

    Component,
    ComponentInterface,
    DeploymentNode {
        stereotype: String,
    },
    Artifact,
    ComponentRelationship {
        relationship_type: ComponentRelationshipType,
        source: Endpoint,
        target: Endpoint,
    },

    Place {
        tokens: String,
        capacity: String,
    },
    Transition,
    Arc {
        multiplicity: String,
        source: Endpoint,
        target: Endpoint,
    },

    SyntaxTreeTerminal,
    SyntaxTreeNonterminal,
    SyntaxTreeLink {
        source: Endpoint,
        target: Endpoint,
    },

    FlowchartNode {
        node_type: FlowchartNodeType,
    },
    Flowline {
        source: Endpoint,
        target: Endpoint,
    },

    BpmnTask {
        task_type: String,
        marker: String,
    },
    BpmnSubprocess,
    BpmnTransaction,
    BpmnCallActivity,
    BpmnStartEvent {
        event_type: String,
    },
    BpmnIntermediateEvent {
        event_type: String,
    },
    BpmnEndEvent {
        event_type: String,
    },
    BpmnGateway {
        gateway_type: String,
    },
    BpmnPool,
    BpmnSwimlane,
    BpmnGroup,
    BpmnAnnotation,
    BpmnDataObject,
    BpmnDataStore,
    BpmnFlow {
        flow_type: BpmnFlowType,
        source: Endpoint,
        target: Endpoint,
    },
}

impl ElementKind {
    /// `(source, target)` for relationship kinds.
    pub fn endpoints(&self) -> Option<(&Endpoint, &Endpoint)> {
        match self {
            ElementKind::ClassRelationship { source, target, .. }
            | ElementKind::ObjectLink { source, target }
            | ElementKind::CommunicationLink { source, target, .. }
            | ElementKind::ControlFlow { source, target }
            | ElementKind::UseCaseAssociation { source, target, .. }
            | ElementKind::ComponentRelationship { source, target, .. }
            | ElementKind::Arc { source, target, .. }
            | ElementKind::SyntaxTreeLink { source, target }
            | ElementKind::Flowline { source, target }
            | ElementKind::BpmnFlow { source, target, .. } => Some((source, target)),
            _ => None,
        }
    }

    pub fn is_relationship(&self) -> bool {
        self.endpoints().is_some()
    }

    /// Owned attributes followed by owned methods, for container kinds.
    pub fn children(&self) -> Vec<ElementIndex> {
        match self {
            ElementKind::Class {
                attributes,
                methods,
                ..
            }
            | ElementKind::Object {
                attributes, methods,
            } => attributes.iter().chain(methods.iter()).copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ElementKind::Class { .. } | ElementKind::Object { .. })
    }
}

/// A parsed diagram element.
#[derive(Debug, Clone, PartialEq)]
pub struct UmlElement {
    /// Id from the diagram JSON; unique within one submission only.
    pub json_id: String,
    /// Type tag from the diagram JSON, e.g. `AbstractClass`.
    pub json_type: String,
    /// Empty for unnamed elements.
    pub name: String,
    pub parent: Option<ElementIndex>,
    pub kind: ElementKind,
}

impl UmlElement {
    pub fn new(
        json_id: impl Into<String>,
        json_type: impl Into<String>,
        name: impl Into<String>,
        kind: ElementKind,
    ) -> Self {
        Self {
            json_id: json_id.into(),
            json_type: json_type.into(),
            name: name.into(),
            parent: None,
            kind,
        }
    }

    pub fn with_parent(mut self, parent: ElementIndex) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Arena of all elements of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct UmlDiagram {
    diagram_type: DiagramType,
    elements: Vec<UmlElement>,
}

impl UmlDiagram {
    pub fn new(diagram_type: DiagramType) -> Self {
        Self {
            diagram_type,
            elements: Vec::new(),
        }
    }

    pub fn diagram_type(&self) -> DiagramType {
        self.diagram_type
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends an element and returns its index.
    pub fn push(&mut self, element: UmlElement) -> ElementIndex {
        self.elements.push(element);
        ElementIndex(self.elements.len() - 1)
    }

    pub fn get(&self, index: ElementIndex) -> Option<ElementRef<'_>> {
        (index.0 < self.elements.len()).then_some(ElementRef {
            diagram: self,
            index,
        })
    }

    pub fn find(&self, json_id: &str) -> Option<ElementRef<'_>> {
        self.elements
            .iter()
            .position(|e| e.json_id == json_id)
            .map(|i| ElementRef {
                diagram: self,
                index: ElementIndex(i),
            })
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        (0..self.elements.len()).map(move |i| ElementRef {
            diagram: self,
            index: ElementIndex(i),
        })
    }

    /// Elements ordered by their JSON id, the iteration order used for clustering.
    pub fn sorted_elements(&self) -> Vec<ElementRef<'_>> {
        let mut sorted: Vec<ElementRef<'_>> = self.elements().collect();
        sorted.sort_by(|a, b| a.json_id().cmp(b.json_id()));
        sorted
    }

    /// Similarity of two whole diagrams, in `[0, 1]`.
    ///
    /// Each element scores its best overall match in the other diagram, and matches below
    /// `min_similarity` count as zero. Both directions are summed and divided by twice the
    /// larger element count, which keeps the score symmetric. Two empty diagrams are identical.
    pub fn similarity(&self, other: &UmlDiagram, min_similarity: f64) -> f64 {
        if self.is_empty() && other.is_empty() {
            return 1.0;
        }

        let largest = self.len().max(other.len()) as f64;
        let forward = best_match_sum(self, other, min_similarity);
        let backward = best_match_sum(other, self, min_similarity);
        similarity::clamp_unit((forward + backward) / (2.0 * largest))
    }

    pub(crate) fn element_mut(&mut self, index: ElementIndex) -> &mut UmlElement {
        &mut self.elements[index.0]
    }
}

fn best_match_sum(from: &UmlDiagram, to: &UmlDiagram, min_similarity: f64) -> f64 {
    from.elements()
        .map(|element| {
            let best = to
                .elements()
                .map(|candidate| element.overall_similarity(&candidate))
                .fold(0.0, f64::max);
            if best >= min_similarity { best } else { 0.0 }
        })
        .sum()
}

/// Handle to one element of a diagram.
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    diagram: &'a UmlDiagram,
    index: ElementIndex,
}

impl<'a> ElementRef<'a> {
    pub fn index(&self) -> ElementIndex {
        self.index
    }

    pub fn diagram(&self) -> &'a UmlDiagram {
        self.diagram
    }

    pub fn element(&self) -> &'a UmlElement {
        &self.diagram.elements[self.index.0]
    }

    pub fn kind(&self) -> &'a ElementKind {
        &self.element().kind
    }

    /// Grouping key: elements are only ever clustered with elements of the same variant.
    pub fn kind_key(&self) -> Discriminant<ElementKind> {
        std::mem::discriminant(self.kind())
    }

    pub fn same_kind(&self, other: &ElementRef<'_>) -> bool {
        self.kind_key() == other.kind_key()
    }

    pub fn name(&self) -> &'a str {
        &self.element().name
    }

    pub fn json_id(&self) -> &'a str {
        &self.element().json_id
    }

    pub fn json_type(&self) -> &'a str {
        &self.element().json_type
    }

    /// `"{type}:{id}"`, the key feedback uses to address this element.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.json_type(), self.json_id())
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.element().parent.map(|p| self.resolve(p))
    }

    pub fn children(&self) -> Vec<ElementRef<'a>> {
        self.kind()
            .children()
            .into_iter()
            .map(|c| self.resolve(c))
            .collect()
    }

    /// Resolves another index of the same diagram.
    pub fn resolve(&self, index: ElementIndex) -> ElementRef<'a> {
        ElementRef {
            diagram: self.diagram,
            index,
        }
    }

    /// Similarity of the element's own attributes, in `[0, 1]`.
    pub fn local_similarity(&self, other: &ElementRef<'_>) -> f64 {
        if !self.same_kind(other) {
            return 0.0;
        }

        let score = match self.kind() {
            ElementKind::Class { .. } => classdiagram::class_similarity(self, other),
            ElementKind::Attribute { .. } => classdiagram::attribute_similarity(self, other),
            ElementKind::Method { .. } => classdiagram::method_similarity(self, other),
            ElementKind::ClassRelationship { .. } => {
                classdiagram::relationship_similarity(self, other, Depth::Local)
            }
            ElementKind::Package
            | ElementKind::Object { .. }
            | ElementKind::SystemBoundary
            | ElementKind::Transition
            | ElementKind::SyntaxTreeTerminal
            | ElementKind::SyntaxTreeNonterminal
            | ElementKind::BpmnSubprocess
            | ElementKind::BpmnTransaction
            | ElementKind::BpmnCallActivity
            | ElementKind::BpmnPool
            | ElementKind::BpmnSwimlane
            | ElementKind::BpmnGroup
            | ElementKind::BpmnAnnotation
            | ElementKind::BpmnDataObject
            | ElementKind::BpmnDataStore => similarity::name_similarity(self.name(), other.name()),
            ElementKind::ObjectLink { .. }
            | ElementKind::ControlFlow { .. }
            | ElementKind::SyntaxTreeLink { .. }
            | ElementKind::Flowline { .. } => similarity::link_similarity(self, other, Depth::Local),
            ElementKind::CommunicationLink { .. } => {
                object::communication_link_similarity(self, other, Depth::Local)
            }
            ElementKind::Activity
            | ElementKind::Actor
            | ElementKind::UseCase
            | ElementKind::Component
            | ElementKind::ComponentInterface
            | ElementKind::Artifact => similarity::nested_name_similarity(self, other),
            ElementKind::ActivityNode { .. } => activity::activity_node_similarity(self, other),
            ElementKind::UseCaseAssociation { .. } => {
                usecase::association_similarity(self, other, Depth::Local)
            }
            ElementKind::DeploymentNode { .. } => component::deployment_node_similarity(self, other),
            ElementKind::ComponentRelationship { .. } => {
                component::relationship_similarity(self, other, Depth::Local)
            }
            ElementKind::Place { .. } => petrinet::place_similarity(self, other),
            ElementKind::Arc { .. } => petrinet::arc_similarity(self, other, Depth::Local),
            ElementKind::FlowchartNode { .. } => flowchart::node_similarity(self, other),
            ElementKind::BpmnTask { .. } => bpmn::task_similarity(self, other),
            ElementKind::BpmnStartEvent { .. }
            | ElementKind::BpmnIntermediateEvent { .. }
            | ElementKind::BpmnEndEvent { .. }
            | ElementKind::BpmnGateway { .. } => bpmn::typed_node_similarity(self, other),
            ElementKind::BpmnFlow { .. } => bpmn::flow_similarity(self, other, Depth::Local),
        };

        similarity::clamp_unit(score)
    }

    /// Similarity including substructure, in `[0, 1]`.
    pub fn overall_similarity(&self, other: &ElementRef<'_>) -> f64 {
        if !self.same_kind(other) {
            return 0.0;
        }

        let score = match self.kind() {
            ElementKind::Class { .. } | ElementKind::Object { .. } => {
                similarity::container_similarity(self, other)
            }
            ElementKind::ClassRelationship { .. } => {
                classdiagram::relationship_similarity(self, other, Depth::Overall)
            }
            ElementKind::ObjectLink { .. }
            | ElementKind::ControlFlow { .. }
            | ElementKind::SyntaxTreeLink { .. }
            | ElementKind::Flowline { .. } => similarity::link_similarity(self, other, Depth::Overall),
            ElementKind::CommunicationLink { .. } => {
                object::communication_link_similarity(self, other, Depth::Overall)
            }
            ElementKind::UseCaseAssociation { .. } => {
                usecase::association_similarity(self, other, Depth::Overall)
            }
            ElementKind::ComponentRelationship { .. } => {
                component::relationship_similarity(self, other, Depth::Overall)
            }
            ElementKind::Arc { .. } => petrinet::arc_similarity(self, other, Depth::Overall),
            ElementKind::BpmnFlow { .. } => bpmn::flow_similarity(self, other, Depth::Overall),
            _ => return self.local_similarity(other),
        };

        similarity::clamp_unit(score)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Small builders for hand-made diagrams.

    use super::*;

    pub fn named(diagram: &mut UmlDiagram, id: &str, json_type: &str, name: &str, kind: ElementKind) -> ElementIndex {
        diagram.push(UmlElement::new(id, json_type, name, kind))
    }

    pub fn class(diagram: &mut UmlDiagram, id: &str, name: &str, attributes: &[(&str, &str)], methods: &[&str]) -> ElementIndex {
        let class = named(
            diagram,
            id,
            "Class",
            name,
            ElementKind::Class {
                class_type: ClassType::Class,
                attributes: Vec::new(),
                methods: Vec::new(),
            },
        );

        let mut attribute_ids = Vec::new();
        for (i, (attr_name, attr_type)) in attributes.iter().enumerate() {
            let idx = diagram.push(
                UmlElement::new(
                    format!("{id}-a{i}"),
                    "ClassAttribute",
                    *attr_name,
                    ElementKind::Attribute {
                        attribute_type: attr_type.to_string(),
                    },
                )
                .with_parent(class),
            );
            attribute_ids.push(idx);
        }

        let mut method_ids = Vec::new();
        for (i, method_name) in methods.iter().enumerate() {
            let idx = diagram.push(
                UmlElement::new(
                    format!("{id}-m{i}"),
                    "ClassMethod",
                    *method_name,
                    ElementKind::Method {
                        parameters: Vec::new(),
                        return_type: String::new(),
                    },
                )
                .with_parent(class),
            );
            method_ids.push(idx);
        }

        if let ElementKind::Class {
            attributes, methods, ..
        } = &mut diagram.element_mut(class).kind
        {
            *attributes = attribute_ids;
            *methods = method_ids;
        }
        class
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::parsers::model_parser::UmlModelParser;
    use crate::traits::parser::Parser;

    const FIXTURES: [&str; 10] = [
        include_str!("../test_files/class_diagram.json"),
        include_str!("../test_files/object_diagram.json"),
        include_str!("../test_files/communication_diagram.json"),
        include_str!("../test_files/activity_diagram.json"),
        include_str!("../test_files/use_case_diagram.json"),
        include_str!("../test_files/deployment_diagram.json"),
        include_str!("../test_files/petri_net.json"),
        include_str!("../test_files/syntax_tree.json"),
        include_str!("../test_files/flowchart.json"),
        include_str!("../test_files/bpmn_diagram.json"),
    ];

    fn fixtures() -> Vec<UmlDiagram> {
        FIXTURES
            .iter()
            .map(|text| UmlModelParser.parse(*text).expect("fixture should parse"))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_type_gate_returns_zero_across_kinds() {
        let mut diagram = UmlDiagram::new(DiagramType::UseCaseDiagram);
        let actor = named(&mut diagram, "a", "UseCaseActor", "Login", ElementKind::Actor);
        let use_case = named(&mut diagram, "u", "UseCase", "Login", ElementKind::UseCase);

        let actor = diagram.get(actor).unwrap();
        let use_case = diagram.get(use_case).unwrap();
        assert_eq!(actor.local_similarity(&use_case), 0.0);
        assert_eq!(actor.overall_similarity(&use_case), 0.0);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let mut diagram = UmlDiagram::new(DiagramType::ClassDiagram);
        let class = class(&mut diagram, "c", "Account", &[("balance", "int"), ("owner", "String")], &["deposit"]);
        let class = diagram.get(class).unwrap();

        assert!((class.overall_similarity(&class) - 1.0).abs() < 1e-9);
        for element in diagram.elements() {
            assert!((element.local_similarity(&element) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_metric_properties_hold_for_every_fixture_pair() {
        let diagrams = fixtures();
        let elements: Vec<ElementRef<'_>> = diagrams.iter().flat_map(|d| d.elements()).collect();
        assert!(elements.len() > 50);

        for a in &elements {
            assert!(approx(a.local_similarity(a), 1.0), "local self {}", a.reference());
            assert!(approx(a.overall_similarity(a), 1.0), "overall self {}", a.reference());

            for b in &elements {
                let local = a.local_similarity(b);
                let overall = a.overall_similarity(b);
                assert!((0.0..=1.0).contains(&local), "{} ~ {}", a.reference(), b.reference());
                assert!((0.0..=1.0).contains(&overall), "{} ~ {}", a.reference(), b.reference());
                assert!(approx(local, b.local_similarity(a)), "{} ~ {}", a.reference(), b.reference());
                assert!(approx(overall, b.overall_similarity(a)), "{} ~ {}", a.reference(), b.reference());
                if !a.same_kind(b) {
                    assert_eq!(local, 0.0);
                    assert_eq!(overall, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_diagram_similarity() {
        let diagrams = fixtures();
        for diagram in &diagrams {
            assert!(approx(diagram.similarity(diagram, 0.8), 1.0));
        }

        let class_diagram = &diagrams[0];
        let petri_net = &diagrams[6];
        assert_eq!(class_diagram.similarity(petri_net, 0.0), 0.0);

        let mut edited = UmlModelParser
            .parse(FIXTURES[6])
            .expect("fixture should parse");
        named(&mut edited, "t9", "PetriNetTransition", "rollback", ElementKind::Transition);
        let forward = petri_net.similarity(&edited, 0.0);
        assert!(forward > 0.5 && forward < 1.0);
        assert!(approx(forward, edited.similarity(petri_net, 0.0)));
        assert!(petri_net.similarity(&edited, 1.0) <= forward);

        let empty = UmlDiagram::new(DiagramType::PetriNet);
        assert_eq!(empty.similarity(&empty, 0.5), 1.0);
        assert_eq!(empty.similarity(petri_net, 0.0), 0.0);
    }

    #[test]
    fn test_sorted_elements_follow_json_ids() {
        let mut diagram = UmlDiagram::new(DiagramType::PetriNet);
        named(&mut diagram, "t2", "PetriNetTransition", "fire", ElementKind::Transition);
        named(&mut diagram, "p1", "PetriNetPlace", "ready", ElementKind::Place {
            tokens: "1".into(),
            capacity: "Infinity".into(),
        });

        let ids: Vec<&str> = diagram.sorted_elements().iter().map(|e| e.json_id()).collect();
        assert_eq!(ids, vec!["p1", "t2"]);
        assert_eq!(diagram.find("t2").unwrap().reference(), "PetriNetTransition:t2");
        assert!(diagram.find("missing").is_none());
    }

    #[test]
    fn test_children_and_parent_resolution() {
        let mut diagram = UmlDiagram::new(DiagramType::ClassDiagram);
        let idx = class(&mut diagram, "c", "Book", &[("title", "String")], &["read"]);
        let book = diagram.get(idx).unwrap();

        let children = book.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), "title");
        assert_eq!(children[1].parent().unwrap().index(), idx);
        assert!(book.parent().is_none());
    }
}
