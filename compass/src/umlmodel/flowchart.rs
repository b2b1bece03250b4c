//! Flowchart nodes. Flowlines use the shared link helper.

use strum::{Display, EnumString};

use super::similarity::name_similarity;
use super::{ElementKind, ElementRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum FlowchartNodeType {
    #[strum(serialize = "FlowchartTerminal")]
    Terminal,
    #[strum(serialize = "FlowchartProcess")]
    Process,
    #[strum(serialize = "FlowchartDecision")]
    Decision,
    #[strum(serialize = "FlowchartInputOutput")]
    InputOutput,
    #[strum(serialize = "FlowchartFunctionCall")]
    FunctionCall,
}

/// Nodes of a different shape never match; otherwise by name.
pub fn node_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> f64 {
    match (a.kind(), b.kind()) {
        (ElementKind::FlowchartNode { node_type: ta }, ElementKind::FlowchartNode { node_type: tb })
            if ta == tb =>
        {
            name_similarity(a.name(), b.name())
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umlmodel::test_support::named;
    use crate::umlmodel::UmlDiagram;
    use db::models::modeling_exercise::DiagramType;

    #[test]
    fn test_shape_must_match() {
        let mut diagram = UmlDiagram::new(DiagramType::Flowchart);
        let process = named(&mut diagram, "a", "FlowchartProcess", "x = x + 1", ElementKind::FlowchartNode {
            node_type: FlowchartNodeType::Process,
        });
        let decision = named(&mut diagram, "b", "FlowchartDecision", "x = x + 1", ElementKind::FlowchartNode {
            node_type: FlowchartNodeType::Decision,
        });
        let again = named(&mut diagram, "c", "FlowchartProcess", "X = X + 1", ElementKind::FlowchartNode {
            node_type: FlowchartNodeType::Process,
        });

        let process = diagram.get(process).unwrap();
        let decision = diagram.get(decision).unwrap();
        let again = diagram.get(again).unwrap();
        assert_eq!(process.local_similarity(&decision), 0.0);
        assert_eq!(process.local_similarity(&again), 1.0);
    }
}
