use super::build_facet_predicate;
use super::Facet;
use super::Predicate;

/// Criteria of one facet: the value list of the latest call, and the AND of
/// one facet predicate per call
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FacetFilter {
    pub(crate) values: Vec<String>,
    pub(crate) predicate: Predicate,
}

/// Filter state of a watch.
///
/// Fragments of different facets are ORed: a record passes when it matches
/// the fragment of its own kind. With no fragment at all, nothing passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Filters {
    types: Option<FacetFilter>,
    tags: Option<FacetFilter>,
    groups: Option<FacetFilter>,
    properties: Option<FacetFilter>,
    compound: Option<Predicate>,
}

impl Filters {
    fn slot(
        &mut self,
        facet: Facet,
    ) -> &mut Option<FacetFilter> {
        match facet {
            Facet::Type => &mut self.types,
            Facet::Tag => &mut self.tags,
            Facet::Group => &mut self.groups,
            Facet::Property => &mut self.properties,
        }
    }

    pub(crate) fn facet(
        &self,
        facet: Facet,
    ) -> Option<&FacetFilter> {
        match facet {
            Facet::Type => self.types.as_ref(),
            Facet::Tag => self.tags.as_ref(),
            Facet::Group => self.groups.as_ref(),
            Facet::Property => self.properties.as_ref(),
        }
    }

    /// Adds a facet criterion. An empty value list changes nothing.
    pub(crate) fn narrow<S: AsRef<str>>(
        &mut self,
        facet: Facet,
        values: &[S],
    ) {
        if values.is_empty() {
            return;
        }
        let predicate = build_facet_predicate(facet.kind(), facet.key(), values);
        match self.slot(facet) {
            Some(existing) => {
                existing.values = values.iter().map(|v| v.as_ref().to_string()).collect();
                let previous = std::mem::replace(&mut existing.predicate, Predicate::And(Vec::new()));
                existing.predicate = previous.and(predicate);
            }
            empty => {
                *empty = Some(FacetFilter {
                    values: values.iter().map(|v| v.as_ref().to_string()).collect(),
                    predicate,
                });
            }
        }
        self.recompose();
    }

    pub(crate) fn clear(&mut self) {
        *self = Filters::default();
    }

    /// OR of the present fragments
    pub(crate) fn compound(&self) -> Option<&Predicate> {
        self.compound.as_ref()
    }

    fn recompose(&mut self) {
        let fragments: Vec<Predicate> = [&self.types, &self.tags, &self.groups, &self.properties]
            .into_iter()
            .flatten()
            .map(|filter| filter.predicate.clone())
            .collect();
        self.compound = match fragments.len() {
            0 => None,
            _ => Some(Predicate::Or(fragments)),
        };
    }
}
