//! # Diagram Parser
//!
//! Decodes the diagram JSON produced by the modeling editor into a [`UmlDiagram`].
//!
//! The payload has the shape `{ "type": "<DiagramType>", "elements": [...], "relationships": [...] }`,
//! where `elements` and `relationships` may be arrays or objects keyed by element id.
//!
//! ## Rules
//! - Unknown element and relationship types are ignored.
//! - Attributes and methods are parsed as members of the class or object that lists
//!   them; their names are split into `name: Type` and `name(params): ReturnType`.
//! - Owners are resolved once every element is known. Owners that do not exist, or
//!   that would make an element its own ancestor, are dropped.
//! - A relationship whose endpoint is not part of the model is an error, except for
//!   class relationships attached to a package, which are skipped.
//! - Ids must be unique across elements, members and relationships.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use db::models::modeling_exercise::DiagramType;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CompassError, CompassResult};
use crate::traits::parser::Parser;
use crate::umlmodel::bpmn::{
    DEFAULT_EVENT_TYPE, DEFAULT_GATEWAY_TYPE, DEFAULT_MARKER, DEFAULT_TASK_TYPE,
};
use crate::umlmodel::{
    ActivityNodeType, BpmnFlowType, ClassRelationshipType, ClassType, ComponentRelationshipType, ElementIndex,
    ElementKind, Endpoint, FlowchartNodeType, Message, MessageDirection, UmlDiagram, UmlElement,
    UseCaseAssociationType,
};

/// Whether the engine can parse diagrams of this type at all.
pub fn is_diagram_type_supported(diagram_type: DiagramType) -> bool {
    match diagram_type {
        DiagramType::ClassDiagram
        | DiagramType::ObjectDiagram
        | DiagramType::ActivityDiagram
        | DiagramType::UseCaseDiagram
        | DiagramType::CommunicationDiagram
        | DiagramType::ComponentDiagram
        | DiagramType::DeploymentDiagram
        | DiagramType::PetriNet
        | DiagramType::SyntaxTree
        | DiagramType::Flowchart
        | DiagramType::Bpmn => true,
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCollection<T> {
    List(Vec<T>),
    Map(BTreeMap<String, T>),
}

impl<T> Default for RawCollection<T> {
    fn default() -> Self {
        RawCollection::List(Vec::new())
    }
}

impl<T> RawCollection<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            RawCollection::List(items) => items,
            RawCollection::Map(items) => items.into_values().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(rename = "type")]
    diagram_type: Option<String>,
    #[serde(default)]
    elements: RawCollection<RawElement>,
    #[serde(default)]
    relationships: RawCollection<RawRelationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    id: String,
    #[serde(rename = "type")]
    element_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    attributes: Option<Vec<String>>,
    #[serde(default)]
    methods: Option<Vec<String>>,
    #[serde(default)]
    stereotype: Option<String>,
    #[serde(default)]
    amount_of_tokens: Option<Value>,
    #[serde(default)]
    capacity: Option<Value>,
    #[serde(default)]
    task_type: Option<String>,
    #[serde(default)]
    marker: Option<String>,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    gateway_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationship {
    id: String,
    #[serde(rename = "type")]
    relationship_type: String,
    #[serde(default)]
    name: Option<String>,
    source: RawEndpoint,
    target: RawEndpoint,
    #[serde(default)]
    messages: Option<Vec<RawMessage>>,
    #[serde(default)]
    flow_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEndpoint {
    element: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    multiplicity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    direction: Option<String>,
}

/// Relationship tags the parser understands.
enum RelationshipTag {
    Class(ClassRelationshipType),
    ObjectLink,
    CommunicationLink,
    ControlFlow,
    UseCase(UseCaseAssociationType),
    Component(ComponentRelationshipType),
    Arc,
    SyntaxTreeLink,
    Flowline,
    BpmnFlow,
}

impl RelationshipTag {
    fn classify(tag: &str) -> Option<Self> {
        if let Ok(t) = ClassRelationshipType::from_str(tag) {
            return Some(RelationshipTag::Class(t));
        }
        if let Ok(t) = UseCaseAssociationType::from_str(tag) {
            return Some(RelationshipTag::UseCase(t));
        }
        if let Ok(t) = ComponentRelationshipType::from_str(tag) {
            return Some(RelationshipTag::Component(t));
        }
        match tag {
            "ObjectLink" => Some(RelationshipTag::ObjectLink),
            "CommunicationLink" => Some(RelationshipTag::CommunicationLink),
            "ActivityControlFlow" => Some(RelationshipTag::ControlFlow),
            "PetriNetArc" => Some(RelationshipTag::Arc),
            "SyntaxTreeLink" => Some(RelationshipTag::SyntaxTreeLink),
            "FlowchartFlowline" => Some(RelationshipTag::Flowline),
            "BPMNFlow" => Some(RelationshipTag::BpmnFlow),
            _ => None,
        }
    }
}

/// Parser for the editor's diagram JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct UmlModelParser;

impl<'a> Parser<&'a str, UmlDiagram> for UmlModelParser {
    fn parse(&self, input: &'a str) -> CompassResult<UmlDiagram> {
        let raw: RawModel = serde_json::from_str(input)?;
        build_diagram(raw)
    }
}

impl<'a> Parser<&'a Value, UmlDiagram> for UmlModelParser {
    fn parse(&self, input: &'a Value) -> CompassResult<UmlDiagram> {
        let raw = RawModel::deserialize(input)?;
        build_diagram(raw)
    }
}

impl UmlModelParser {
    /// Parses the stored model of a submission; an absent or blank model is an error.
    pub fn parse_submission(&self, model: Option<&str>) -> CompassResult<UmlDiagram> {
        match model.map(str::trim) {
            Some(text) if !text.is_empty() => self.parse(text),
            _ => Err(CompassError::MissingField("model".to_string())),
        }
    }
}

fn build_diagram(raw: RawModel) -> CompassResult<UmlDiagram> {
    let type_tag = raw
        .diagram_type
        .ok_or_else(|| CompassError::MissingField("type".to_string()))?;
    let diagram_type = DiagramType::from_str(&type_tag)
        .ok()
        .filter(|t| is_diagram_type_supported(*t))
        .ok_or(CompassError::UnsupportedDiagramType(type_tag))?;

    let elements = raw.elements.into_vec();
    let relationships = raw.relationships.into_vec();

    let by_id: HashMap<&str, &RawElement> = elements.iter().map(|e| (e.id.as_str(), e)).collect();
    let member_ids: HashSet<&str> = elements
        .iter()
        .filter(|e| is_container_tag(&e.element_type))
        .flat_map(|e| {
            e.attributes
                .iter()
                .flatten()
                .chain(e.methods.iter().flatten())
                .map(String::as_str)
        })
        .collect();

    let mut diagram = UmlDiagram::new(diagram_type);
    let mut index_of: HashMap<&str, ElementIndex> = HashMap::new();

    for element in &elements {
        if member_ids.contains(element.id.as_str()) {
            continue;
        }
        let Some(kind) = element_kind(element) else {
            debug!(element_type = %element.element_type, id = %element.id, "Ignoring unknown element type");
            continue;
        };

        let name = element.name.clone().unwrap_or_default();
        let index = diagram.push(UmlElement::new(&element.id, &element.element_type, name, kind));
        index_of.insert(element.id.as_str(), index);

        if is_container_tag(&element.element_type) {
            attach_members(&mut diagram, &by_id, &mut index_of, element, index)?;
        }
    }

    for element in &elements {
        if member_ids.contains(element.id.as_str()) {
            continue;
        }
        let (Some(owner), Some(&index)) = (element.owner.as_deref(), index_of.get(element.id.as_str())) else {
            continue;
        };
        match index_of.get(owner) {
            Some(&owner_index) if !is_ancestor(&diagram, index, owner_index) => {
                diagram.element_mut(index).parent = Some(owner_index);
            }
            _ => debug!(id = %element.id, owner, "Dropping unresolvable owner"),
        }
    }

    for relationship in &relationships {
        let Some(tag) = RelationshipTag::classify(&relationship.relationship_type) else {
            debug!(relationship_type = %relationship.relationship_type, id = %relationship.id, "Ignoring unknown relationship type");
            continue;
        };
        if let Some(element) = relationship_element(&diagram, &index_of, relationship, tag)? {
            let index = diagram.push(element);
            index_of.insert(relationship.id.as_str(), index);
        }
    }

    ensure_unique_ids(&diagram)?;
    Ok(diagram)
}

/// Every parsed element must be addressable by its id alone.
fn ensure_unique_ids(diagram: &UmlDiagram) -> CompassResult<()> {
    let mut seen = HashSet::with_capacity(diagram.len());
    for element in diagram.elements() {
        if !seen.insert(element.json_id()) {
            return Err(CompassError::InvalidModel(format!(
                "id {} is used by more than one element",
                element.json_id()
            )));
        }
    }
    Ok(())
}

fn is_container_tag(tag: &str) -> bool {
    ClassType::from_str(tag).is_ok() || tag == "ObjectName"
}

fn element_kind(element: &RawElement) -> Option<ElementKind> {
    let tag = element.element_type.as_str();

    if let Ok(class_type) = ClassType::from_str(tag) {
        return Some(ElementKind::Class {
            class_type,
            attributes: Vec::new(),
            methods: Vec::new(),
        });
    }
    if let Ok(node_type) = ActivityNodeType::from_str(tag) {
        return Some(ElementKind::ActivityNode { node_type });
    }
    if let Ok(node_type) = FlowchartNodeType::from_str(tag) {
        return Some(ElementKind::FlowchartNode { node_type });
    }

    let kind = match tag {
        "ObjectName" => ElementKind::Object {
            attributes: Vec::new(),
            methods: Vec::new(),
        },
        "Package" => ElementKind::Package,
        "Activity" => ElementKind::Activity,
        "UseCaseSystem" => ElementKind::SystemBoundary,
        "UseCaseActor" => ElementKind::Actor,
        "UseCase" => ElementKind::UseCase,
        "Component" | "DeploymentComponent" => ElementKind::Component,
        "ComponentInterface" | "DeploymentInterface" => ElementKind::ComponentInterface,
        "DeploymentNode" => ElementKind::DeploymentNode {
            stereotype: element.stereotype.clone().unwrap_or_default(),
        },
        "DeploymentArtifact" => ElementKind::Artifact,
        "PetriNetPlace" => ElementKind::Place {
            tokens: value_text(element.amount_of_tokens.as_ref()),
            capacity: value_text(element.capacity.as_ref()),
        },
        "PetriNetTransition" => ElementKind::Transition,
        "SyntaxTreeTerminal" => ElementKind::SyntaxTreeTerminal,
        "SyntaxTreeNonterminal" => ElementKind::SyntaxTreeNonterminal,
        "BPMNTask" => ElementKind::BpmnTask {
            task_type: text_or(element.task_type.as_deref(), DEFAULT_TASK_TYPE),
            marker: text_or(element.marker.as_deref(), DEFAULT_MARKER),
        },
        "BPMNSubprocess" => ElementKind::BpmnSubprocess,
        "BPMNTransaction" => ElementKind::BpmnTransaction,
        "BPMNCallActivity" => ElementKind::BpmnCallActivity,
        "BPMNStartEvent" => ElementKind::BpmnStartEvent {
            event_type: text_or(element.event_type.as_deref(), DEFAULT_EVENT_TYPE),
        },
        "BPMNIntermediateEvent" => ElementKind::BpmnIntermediateEvent {
            event_type: text_or(element.event_type.as_deref(), DEFAULT_EVENT_TYPE),
        },
        "BPMNEndEvent" => ElementKind::BpmnEndEvent {
            event_type: text_or(element.event_type.as_deref(), DEFAULT_EVENT_TYPE),
        },
        "BPMNGateway" => ElementKind::BpmnGateway {
            gateway_type: text_or(element.gateway_type.as_deref(), DEFAULT_GATEWAY_TYPE),
        },
        "BPMNPool" => ElementKind::BpmnPool,
        "BPMNSwimlane" => ElementKind::BpmnSwimlane,
        "BPMNGroup" => ElementKind::BpmnGroup,
        "BPMNAnnotation" => ElementKind::BpmnAnnotation,
        "BPMNDataObject" => ElementKind::BpmnDataObject,
        "BPMNDataStore" => ElementKind::BpmnDataStore,
        _ => return None,
    };
    Some(kind)
}

/// Trimmed text, or `default` when absent or blank.
fn text_or(text: Option<&str>, default: &str) -> String {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => default.to_string(),
    }
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Parses the attributes and methods a class or object lists and links them to it.
fn attach_members<'a>(
    diagram: &mut UmlDiagram,
    by_id: &HashMap<&'a str, &'a RawElement>,
    index_of: &mut HashMap<&'a str, ElementIndex>,
    container: &RawElement,
    container_index: ElementIndex,
) -> CompassResult<()> {
    let mut attributes = Vec::new();
    for id in container.attributes.iter().flatten() {
        let raw = lookup_member(by_id, id, container)?;
        let (name, attribute_type) = split_attribute(raw.name.as_deref().unwrap_or_default());
        let index = diagram.push(
            UmlElement::new(
                &raw.id,
                &raw.element_type,
                name,
                ElementKind::Attribute { attribute_type },
            )
            .with_parent(container_index),
        );
        index_of.insert(raw.id.as_str(), index);
        attributes.push(index);
    }

    let mut methods = Vec::new();
    for id in container.methods.iter().flatten() {
        let raw = lookup_member(by_id, id, container)?;
        let (name, parameters, return_type) = split_method(raw.name.as_deref().unwrap_or_default());
        let index = diagram.push(
            UmlElement::new(
                &raw.id,
                &raw.element_type,
                name,
                ElementKind::Method {
                    parameters,
                    return_type,
                },
            )
            .with_parent(container_index),
        );
        index_of.insert(raw.id.as_str(), index);
        methods.push(index);
    }

    match &mut diagram.element_mut(container_index).kind {
        ElementKind::Class {
            attributes: a,
            methods: m,
            ..
        }
        | ElementKind::Object {
            attributes: a,
            methods: m,
        } => {
            *a = attributes;
            *m = methods;
        }
        _ => {}
    }
    Ok(())
}

fn lookup_member<'a>(
    by_id: &HashMap<&'a str, &'a RawElement>,
    id: &str,
    container: &RawElement,
) -> CompassResult<&'a RawElement> {
    by_id.get(id).copied().ok_or_else(|| {
        CompassError::InvalidModel(format!(
            "member {} of {} is not part of the model",
            id, container.id
        ))
    })
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// `"name : Type"` into `("name", "Type")`; anything but exactly one colon yields no type.
fn split_attribute(text: &str) -> (String, String) {
    let compacted = compact(text);
    let parts: Vec<&str> = compacted.split(':').collect();
    match parts.as_slice() {
        [name, attribute_type] => (name.to_string(), attribute_type.to_string()),
        _ => (parts.first().copied().unwrap_or_default().to_string(), String::new()),
    }
}

/// `"name(a: A, b): Ret"` into `("name", ["a:A", "b"], "Ret")`.
fn split_method(text: &str) -> (String, Vec<String>, String) {
    let compacted = compact(text);

    let (Some(open), Some(close)) = (compacted.find('('), compacted.rfind(')')) else {
        let mut parts = compacted.splitn(2, ':');
        let name = parts.next().unwrap_or_default().to_string();
        let return_type = parts.next().unwrap_or_default().to_string();
        return (name, Vec::new(), return_type);
    };
    if close < open {
        return (compacted, Vec::new(), String::new());
    }

    let name = compacted[..open].to_string();
    let parameters = compacted[open + 1..close]
        .split(',')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let return_type = compacted[close + 1..].trim_start_matches(':').to_string();
    (name, parameters, return_type)
}

/// True when `candidate` is `index` itself or one of its descendants via `parent` links.
fn is_ancestor(diagram: &UmlDiagram, index: ElementIndex, candidate: ElementIndex) -> bool {
    let mut current = Some(candidate);
    let mut steps = 0;
    while let Some(at) = current {
        if at == index || steps > diagram.len() {
            return true;
        }
        current = diagram.get(at).and_then(|e| e.element().parent);
        steps += 1;
    }
    false
}

fn relationship_element(
    diagram: &UmlDiagram,
    index_of: &HashMap<&str, ElementIndex>,
    relationship: &RawRelationship,
    tag: RelationshipTag,
) -> CompassResult<Option<UmlElement>> {
    let source = index_of.get(relationship.source.element.as_str()).copied();
    let target = index_of.get(relationship.target.element.as_str()).copied();

    if let RelationshipTag::Class(_) = tag {
        let is_class = |k: &ElementKind| matches!(k, ElementKind::Class { .. });
        let is_package = |k: &ElementKind| matches!(k, ElementKind::Package);
        if !(kind_matches(diagram, source, is_class) && kind_matches(diagram, target, is_class)) {
            if kind_matches(diagram, source, is_package) || kind_matches(diagram, target, is_package) {
                debug!(id = %relationship.id, "Skipping class relationship attached to a package");
                return Ok(None);
            }
            return Err(missing_endpoint(relationship));
        }
    }

    let (Some(source), Some(target)) = (source, target) else {
        return Err(missing_endpoint(relationship));
    };

    let source = Endpoint {
        element: source,
        role: relationship.source.role.clone().unwrap_or_default(),
        multiplicity: relationship.source.multiplicity.clone().unwrap_or_default(),
    };
    let target = Endpoint {
        element: target,
        role: relationship.target.role.clone().unwrap_or_default(),
        multiplicity: relationship.target.multiplicity.clone().unwrap_or_default(),
    };
    let name = relationship.name.clone().unwrap_or_default();

    let kind = match tag {
        RelationshipTag::Class(relationship_type) => ElementKind::ClassRelationship {
            relationship_type,
            source,
            target,
        },
        RelationshipTag::ObjectLink => ElementKind::ObjectLink { source, target },
        RelationshipTag::CommunicationLink => ElementKind::CommunicationLink {
            source,
            target,
            messages: relationship
                .messages
                .iter()
                .flatten()
                .map(|m| {
                    let direction = match m.direction.as_deref() {
                        Some("source") => MessageDirection::Backward,
                        _ => MessageDirection::Forward,
                    };
                    Message::new(m.name.clone().unwrap_or_default(), direction)
                })
                .collect(),
        },
        RelationshipTag::ControlFlow => ElementKind::ControlFlow { source, target },
        RelationshipTag::UseCase(association_type) => ElementKind::UseCaseAssociation {
            association_type,
            source,
            target,
        },
        RelationshipTag::Component(relationship_type) => ElementKind::ComponentRelationship {
            relationship_type,
            source,
            target,
        },
        RelationshipTag::Arc => ElementKind::Arc {
            multiplicity: name.clone(),
            source,
            target,
        },
        RelationshipTag::SyntaxTreeLink => ElementKind::SyntaxTreeLink { source, target },
        RelationshipTag::Flowline => ElementKind::Flowline { source, target },
        RelationshipTag::BpmnFlow => ElementKind::BpmnFlow {
            flow_type: flow_type(relationship),
            source,
            target,
        },
    };

    Ok(Some(UmlElement::new(
        &relationship.id,
        &relationship.relationship_type,
        name,
        kind,
    )))
}

fn flow_type(relationship: &RawRelationship) -> BpmnFlowType {
    match relationship.flow_type.as_deref().map(BpmnFlowType::from_str) {
        Some(Ok(flow_type)) => flow_type,
        Some(Err(_)) => {
            debug!(id = %relationship.id, flow_type = ?relationship.flow_type, "Unknown flow type, using sequence");
            BpmnFlowType::default()
        }
        None => BpmnFlowType::default(),
    }
}

fn kind_matches(diagram: &UmlDiagram, index: Option<ElementIndex>, check: impl Fn(&ElementKind) -> bool) -> bool {
    index
        .and_then(|i| diagram.get(i))
        .is_some_and(|e| check(e.kind()))
}

fn missing_endpoint(relationship: &RawRelationship) -> CompassError {
    CompassError::InvalidModel(format!(
        "source or target of relationship {} is not part of the model",
        relationship.id
    ))
}
