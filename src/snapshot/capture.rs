//! Freeze the current graph into historic records.
//!
//! Run at release time; the written file becomes next release's "previous"
//! snapshot.

use crate::hierarchy::HierarchyAttributor;
use crate::integrity::{check_datum, IntegrityError};
use crate::store::TerminologyGraph;
use crate::types::{CharacteristicView, Concept};
use super::datum::HistoricDatum;
use super::index::SnapshotIndex;

/// Build the historic record of one concept.
pub fn capture_concept<G: TerminologyGraph + ?Sized>(
    attributor: &HierarchyAttributor<'_, G>,
    concept: &Concept,
) -> Result<HistoricDatum, IntegrityError> {
    let status = attributor.ip_status(concept, CharacteristicView::Inferred);

    let mut datum = HistoricDatum::new(concept.id, concept.fsn.clone(), concept.module_id);
    datum.active = concept.active;
    datum.definition_status = concept.definition_status;
    datum.hierarchy = attributor.hierarchy_of(concept)?;
    datum.is_intermediate_primitive = status.is_intermediate_primitive;
    datum.has_sd_ancestor = status.has_sd_ancestor;
    datum.has_sd_descendant = status.has_sd_descendant;
    datum.has_attributes = concept.has_attributes();
    for component in &concept.components {
        datum.record(component);
    }

    check_datum(&datum)?;
    Ok(datum)
}

/// Build the historic record of every concept in the graph.
pub fn capture<G: TerminologyGraph + ?Sized>(
    attributor: &HierarchyAttributor<'_, G>,
) -> Result<SnapshotIndex, IntegrityError> {
    let index = attributor
        .graph()
        .all_concepts()
        .into_iter()
        .map(|concept| capture_concept(attributor, concept))
        .collect::<Result<SnapshotIndex, _>>()
        .map_err(|e| {
            e.log();
            e
        })?;

    tracing::info!(concepts = index.len(), "snapshot captured from current graph");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBucket;
    use crate::store::InMemoryTerminologyGraph;
    use crate::types::{
        Component, ComponentId, ComponentType, DefinitionStatus, SctId, ROOT_CONCEPT,
    };

    const MODULE: SctId = SctId::new(900000000000207008);

    fn cid(s: &str) -> ComponentId {
        ComponentId::new(s).unwrap()
    }

    #[test]
    fn test_capture_records_every_field() {
        let root = Concept::new(ROOT_CONCEPT, "SNOMED CT Concept (SNOMED RT+CTV3)", MODULE);
        let view = CharacteristicView::Inferred;
        let top_is_a = Component::is_a(cid("r1"), SctId::new(0), MODULE, ROOT_CONCEPT, view);
        let top = Concept::new(SctId::new(404684003), "Clinical finding (finding)", MODULE)
            .with_component(top_is_a);
        let child = Concept::new(SctId::new(22298006), "Myocardial infarction (disorder)", MODULE)
            .with_definition_status(DefinitionStatus::FullyDefined)
            .with_component(Component::is_a(
                cid("r2"),
                SctId::new(0),
                MODULE,
                SctId::new(404684003),
                CharacteristicView::Inferred,
            ))
            .with_component(Component::relationship(
                cid("r3"),
                SctId::new(0),
                MODULE,
                SctId::new(363698007),
                SctId::new(74281007),
                CharacteristicView::Inferred,
            ))
            .with_component(Component::description(cid("d1"), SctId::new(0), MODULE, "en", false))
            .with_component(
                Component::description(cid("d2"), SctId::new(0), MODULE, "en", false)
                    .with_active(false),
            );

        let graph: InMemoryTerminologyGraph = [root, top, child].into_iter().collect();
        let attributor = HierarchyAttributor::new(&graph);
        let index = capture(&attributor).unwrap();

        assert_eq!(index.len(), 3);
        let datum = index.get(SctId::new(22298006)).unwrap();
        assert_eq!(datum.hierarchy, HierarchyBucket::Known(SctId::new(404684003)));
        assert_eq!(datum.definition_status, DefinitionStatus::FullyDefined);
        assert!(datum.has_attributes);
        assert!(!datum.is_intermediate_primitive);

        let descriptions = datum.ids(ComponentType::Description).unwrap();
        assert!(descriptions.active().contains(&cid("d1")));
        assert!(descriptions.inactive().contains(&cid("d2")));
        assert_eq!(datum.ids(ComponentType::Relationship).unwrap().active().len(), 2);
    }
}
