//! BPMN process diagrams.
//!
//! Tasks, events and gateways carry a subtype from the editor (`taskType`, `eventType`,
//! `gatewayType`) that is compared by equality. Pools, swimlanes, groups, annotations,
//! data objects, data stores, subprocesses, transactions and call activities compare by
//! name only.

use strum::{Display, EnumString};

use super::similarity::{self, Depth, endpoint_similarity};
use super::{ElementKind, ElementRef};

pub const TASK_NAME_WEIGHT: f64 = 0.6;
pub const TASK_TYPE_WEIGHT: f64 = 0.2;
pub const TASK_MARKER_WEIGHT: f64 = 0.2;

/// Events and gateways.
pub const TYPED_NAME_WEIGHT: f64 = 0.7;
pub const TYPED_SUBTYPE_WEIGHT: f64 = 0.3;

pub const FLOW_TYPE_WEIGHT: f64 = 0.2;
pub const FLOW_NAME_WEIGHT: f64 = 0.2;
pub const FLOW_ENDPOINT_WEIGHT: f64 = 0.3;

pub const DEFAULT_TASK_TYPE: &str = "default";
pub const DEFAULT_MARKER: &str = "none";
pub const DEFAULT_EVENT_TYPE: &str = "default";
pub const DEFAULT_GATEWAY_TYPE: &str = "exclusive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum BpmnFlowType {
    #[default]
    #[strum(serialize = "sequence")]
    Sequence,
    #[strum(serialize = "message")]
    Message,
    #[strum(serialize = "association")]
    Association,
    #[strum(serialize = "data association")]
    DataAssociation,
}

pub fn task_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (
        ElementKind::BpmnTask {
            task_type: ta,
            marker: ma,
        },
        ElementKind::BpmnTask {
            task_type: tb,
            marker: mb,
        },
    ) = (a.kind(), b.kind())
    else {
        return 0.0;
    };

    TASK_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name())
        + TASK_TYPE_WEIGHT * similarity::equality(ta, tb)
        + TASK_MARKER_WEIGHT * similarity::equality(ma, mb)
}

/// Start, intermediate and end events and gateways: name plus subtype.
pub fn typed_node_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    let (Some(sa), Some(sb)) = (subtype(a.kind()), subtype(b.kind())) else {
        return 0.0;
    };

    TYPED_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name())
        + TYPED_SUBTYPE_WEIGHT * similarity::equality(sa, sb)
}

fn subtype(kind: &ElementKind) -> Option<&str> {
    match kind {
        ElementKind::BpmnStartEvent { event_type }
        | ElementKind::BpmnIntermediateEvent { event_type }
        | ElementKind::BpmnEndEvent { event_type } => Some(event_type.as_str()),
        ElementKind::BpmnGateway { gateway_type } => Some(gateway_type.as_str()),
        _ => None,
    }
}

pub fn flow_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    let (ElementKind::BpmnFlow { flow_type: ta, .. }, ElementKind::BpmnFlow { flow_type: tb, .. }) =
        (a.kind(), b.kind())
    else {
        return 0.0;
    };

    let type_score = if ta == tb { FLOW_TYPE_WEIGHT } else { 0.0 };
    let name_score = FLOW_NAME_WEIGHT * similarity::name_similarity(a.name(), b.name());
    let ends = similarity::best_orientation(a, b, |a_source, a_target, b_first, b_second, _| {
        FLOW_ENDPOINT_WEIGHT * endpoint_similarity(a, a_source, b, b_first, depth)
            + FLOW_ENDPOINT_WEIGHT * endpoint_similarity(a, a_target, b, b_second, depth)
    });

    type_score + name_score + ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umlmodel::test_support::named;
    use crate::umlmodel::{Endpoint, UmlDiagram, UmlElement};
    use db::models::modeling_exercise::DiagramType;
    use std::str::FromStr;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn task(diagram: &mut UmlDiagram, id: &str, name: &str, task_type: &str) -> crate::umlmodel::ElementIndex {
        named(diagram, id, "BPMNTask", name, ElementKind::BpmnTask {
            task_type: task_type.into(),
            marker: DEFAULT_MARKER.into(),
        })
    }

    #[test]
    fn test_flow_type_tags() {
        assert_eq!(BpmnFlowType::from_str("data association").unwrap(), BpmnFlowType::DataAssociation);
        assert_eq!(BpmnFlowType::from_str("message").unwrap(), BpmnFlowType::Message);
        assert!(BpmnFlowType::from_str("telepathy").is_err());
    }

    #[test]
    fn test_swimlanes_compare_by_name() {
        let mut diagram = UmlDiagram::new(DiagramType::Bpmn);
        let pool = named(&mut diagram, "p", "BPMNPool", "Pool", ElementKind::BpmnPool);
        let first = diagram.push(UmlElement::new("l1", "BPMNSwimlane", "Lane 1", ElementKind::BpmnSwimlane).with_parent(pool));
        let second = diagram.push(UmlElement::new("l2", "BPMNSwimlane", "Lane 2", ElementKind::BpmnSwimlane).with_parent(pool));

        let first = diagram.get(first).unwrap();
        let second = diagram.get(second).unwrap();
        assert!(approx(first.local_similarity(&second), 5.0 / 6.0));
        assert!(approx(first.local_similarity(&first), 1.0));
    }

    #[test]
    fn test_task_type_and_marker_weights() {
        let mut diagram = UmlDiagram::new(DiagramType::Bpmn);
        let review = task(&mut diagram, "t1", "Review", "user");
        let other = task(&mut diagram, "t2", "review", "script");

        let review = diagram.get(review).unwrap();
        let other = diagram.get(other).unwrap();
        assert!(approx(review.local_similarity(&other), 0.8));
    }

    #[test]
    fn test_events_of_different_position_never_match() {
        let mut diagram = UmlDiagram::new(DiagramType::Bpmn);
        let start = named(&mut diagram, "s", "BPMNStartEvent", "", ElementKind::BpmnStartEvent {
            event_type: "message".into(),
        });
        let end = named(&mut diagram, "e", "BPMNEndEvent", "", ElementKind::BpmnEndEvent {
            event_type: "message".into(),
        });
        let timer = named(&mut diagram, "s2", "BPMNStartEvent", "", ElementKind::BpmnStartEvent {
            event_type: "timer".into(),
        });

        let start = diagram.get(start).unwrap();
        let end = diagram.get(end).unwrap();
        let timer = diagram.get(timer).unwrap();
        assert_eq!(start.local_similarity(&end), 0.0);
        assert!(approx(start.local_similarity(&timer), TYPED_NAME_WEIGHT));
    }

    #[test]
    fn test_flows_weigh_type_name_and_endpoints() {
        let mut diagram = UmlDiagram::new(DiagramType::Bpmn);
        let check = task(&mut diagram, "t1", "Check", DEFAULT_TASK_TYPE);
        let approve = task(&mut diagram, "t2", "Approve", DEFAULT_TASK_TYPE);
        let flow = |diagram: &mut UmlDiagram, id: &str, name: &str, flow_type: BpmnFlowType| {
            diagram.push(UmlElement::new(id, "BPMNFlow", name, ElementKind::BpmnFlow {
                flow_type,
                source: Endpoint::new(check),
                target: Endpoint::new(approve),
            }))
        };
        let yes = flow(&mut diagram, "f1", "Yes", BpmnFlowType::Sequence);
        let message = flow(&mut diagram, "f2", "Yes", BpmnFlowType::Message);

        let yes = diagram.get(yes).unwrap();
        let message = diagram.get(message).unwrap();
        assert!(approx(yes.overall_similarity(&yes), 1.0));
        assert!(approx(yes.overall_similarity(&message), 1.0 - FLOW_TYPE_WEIGHT));
    }
}
