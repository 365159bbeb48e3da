/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Polymorphic matching predicates over component-declared interests.

use crate::message::TypeTag;
use std::collections::HashSet;

/// Evaluation mode for filter comparison.
///
/// With `self` as the source side and the probed filter as the target:
/// `Any` intersects the two sets, `Exact` requires target ⊆ source, `All`
/// requires source ⊆ target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchType {
    Any,
    Exact,
    All,
}

/// Matches by payload runtime type, covariantly: a filter entry accepts a
/// probe of the same type or of any type declaring it as a supertype.
#[derive(Clone, Debug)]
pub struct TypeFilter {
    match_type: MatchType,
    tags: Vec<TypeTag>,
}

impl TypeFilter {
    pub fn new(match_type: MatchType) -> Self {
        Self {
            match_type,
            tags: Vec::new(),
        }
    }

    pub fn with<T: 'static>(self) -> Self {
        self.with_tag(TypeTag::of::<T>())
    }

    pub fn with_tag(mut self, tag: TypeTag) -> Self {
        if !self.tags.iter().any(|seen| seen.key() == tag.key()) {
            self.tags.push(tag);
        }
        self
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Set membership with assignability: `probe` is in the set when some
    /// member is its exact type or a declared supertype.
    fn contains(set: &[TypeTag], probe: &TypeTag) -> bool {
        set.iter().any(|member| member.is_assignable_from(probe))
    }

    /// Evaluates this filter's mode against a target tag set: another type
    /// filter's set, or a message's cached runtime types.
    ///
    /// The worst case scans both sets; filter sets are small and fixed at
    /// configuration time.
    pub fn matches_tags(&self, target: &[TypeTag]) -> bool {
        match self.match_type {
            MatchType::Any => target.iter().any(|tag| Self::contains(&self.tags, tag)),
            MatchType::Exact => target.iter().all(|tag| Self::contains(&self.tags, tag)),
            MatchType::All => self.tags.iter().all(|tag| Self::contains(target, tag)),
        }
    }
}

/// Matches by string tag set.
#[derive(Clone, Debug)]
pub struct NameFilter {
    match_type: MatchType,
    names: HashSet<String>,
}

impl NameFilter {
    pub fn new(match_type: MatchType) -> Self {
        Self {
            match_type,
            names: HashSet::new(),
        }
    }

    pub fn with(mut self, name: &str) -> Self {
        self.names.insert(name.to_string());
        self
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }

    pub fn matches_names(&self, target: &HashSet<String>) -> bool {
        match self.match_type {
            MatchType::Any => !self.names.is_disjoint(target),
            MatchType::Exact => target.is_subset(&self.names),
            MatchType::All => self.names.is_subset(target),
        }
    }
}

/// Matches a single data-source identity, by equality only; its own
/// [`MatchType`] never widens the comparison.
#[derive(Clone, Debug)]
pub struct SourceFilter {
    match_type: MatchType,
    source: String,
}

impl SourceFilter {
    pub fn new(match_type: MatchType, source: &str) -> Self {
        Self {
            match_type,
            source: source.to_string(),
        }
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Content filter: a single request-kind tag plus a secondary property test.
#[derive(Clone, Debug)]
pub struct RequestFilter {
    match_type: MatchType,
    request_kind: String,
    required_properties: HashSet<String>,
}

impl RequestFilter {
    pub fn new(match_type: MatchType, request_kind: &str) -> Self {
        Self {
            match_type,
            request_kind: request_kind.to_string(),
            required_properties: HashSet::new(),
        }
    }

    pub fn with_property(mut self, property: &str) -> Self {
        self.required_properties.insert(property.to_string());
        self
    }

    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    pub fn request_kind(&self) -> &str {
        &self.request_kind
    }

    /// Secondary test against a caller-supplied property list: true when
    /// every required property name is present. Extra properties are ignored.
    pub fn supports_object(&self, properties: &[&str]) -> bool {
        self.required_properties
            .iter()
            .all(|required| properties.iter().any(|supplied| supplied == required))
    }
}

/// A component-declared matching predicate. Two filters of different
/// variants never match.
#[derive(Clone, Debug)]
pub enum Filter {
    Type(TypeFilter),
    Name(NameFilter),
    Source(SourceFilter),
    Request(RequestFilter),
}

impl Filter {
    /// Pure, side-effect-free match of this (source) filter against a target
    /// filter, per the variant's set semantics.
    pub fn matches(&self, other: &Filter) -> bool {
        match (self, other) {
            (Filter::Type(source), Filter::Type(target)) => source.matches_tags(target.tags()),
            (Filter::Name(source), Filter::Name(target)) => source.matches_names(target.names()),
            (Filter::Source(source), Filter::Source(target)) => source.source == target.source,
            (Filter::Request(source), Filter::Request(target)) => {
                source.request_kind == target.request_kind
            }
            _ => false,
        }
    }
}

impl From<TypeFilter> for Filter {
    fn from(filter: TypeFilter) -> Self {
        Filter::Type(filter)
    }
}

impl From<NameFilter> for Filter {
    fn from(filter: NameFilter) -> Self {
        Filter::Name(filter)
    }
}

impl From<SourceFilter> for Filter {
    fn from(filter: SourceFilter) -> Self {
        Filter::Source(filter)
    }
}

impl From<RequestFilter> for Filter {
    fn from(filter: RequestFilter) -> Self {
        Filter::Request(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::{Filter, MatchType, NameFilter, RequestFilter, SourceFilter, TypeFilter};
    use crate::message::{TypeKey, TypeTag};

    struct Base;
    struct Derived;

    fn derived_tag() -> TypeTag {
        TypeTag::of::<Derived>().with_supertypes(vec![TypeKey::of::<Base>()])
    }

    #[test]
    fn any_intersects_type_sets() {
        let source = TypeFilter::new(MatchType::Any).with::<String>().with::<i64>();
        let target = TypeFilter::new(MatchType::Any).with::<i64>().with::<f64>();
        assert!(source.matches_tags(target.tags()));

        let disjoint = TypeFilter::new(MatchType::Any).with::<f64>();
        let other = TypeFilter::new(MatchType::Any).with::<String>();
        assert!(!disjoint.matches_tags(other.tags()));
    }

    #[test]
    fn exact_requires_target_subset_of_source() {
        let source = TypeFilter::new(MatchType::Exact)
            .with::<String>()
            .with::<i64>();
        let smaller = TypeFilter::new(MatchType::Any).with::<String>();
        let wider = TypeFilter::new(MatchType::Any)
            .with::<String>()
            .with::<f64>();

        assert!(source.matches_tags(smaller.tags()));
        assert!(!source.matches_tags(wider.tags()));
    }

    #[test]
    fn all_requires_source_subset_of_target() {
        let source = TypeFilter::new(MatchType::All).with::<String>();
        let wider = TypeFilter::new(MatchType::Any)
            .with::<String>()
            .with::<i64>();
        let disjoint = TypeFilter::new(MatchType::Any).with::<f64>();

        assert!(source.matches_tags(wider.tags()));
        assert!(!source.matches_tags(disjoint.tags()));
    }

    #[test]
    fn supertype_entries_accept_derived_probes() {
        let source = TypeFilter::new(MatchType::Any).with::<Base>();
        assert!(source.matches_tags(&[derived_tag()]));

        let narrowed = TypeFilter::new(MatchType::Any).with::<Derived>();
        assert!(!narrowed.matches_tags(&[TypeTag::of::<Base>()]));
    }

    #[test]
    fn empty_sets_follow_vacuous_truth() {
        let empty_any = TypeFilter::new(MatchType::Any);
        let empty_exact = TypeFilter::new(MatchType::Exact);
        let empty_all = TypeFilter::new(MatchType::All);
        let populated = TypeFilter::new(MatchType::Any).with::<String>();

        // Empty source matches nothing under Any.
        assert!(!empty_any.matches_tags(populated.tags()));
        // Empty target is a vacuous subset under Exact.
        assert!(empty_exact.matches_tags(&[]));
        assert!(!empty_exact.matches_tags(populated.tags()));
        // Empty source is a vacuous subset under All.
        assert!(empty_all.matches_tags(populated.tags()));
        assert!(empty_all.matches_tags(&[]));
    }

    #[test]
    fn name_filter_set_semantics() {
        let source = NameFilter::new(MatchType::Any).with("alerts").with("trades");
        let target = NameFilter::new(MatchType::Any).with("trades");
        assert!(source.matches_names(target.names()));

        let exact = NameFilter::new(MatchType::Exact).with("alerts").with("trades");
        assert!(exact.matches_names(target.names()));

        let all = NameFilter::new(MatchType::All).with("alerts").with("trades");
        assert!(!all.matches_names(target.names()));
    }

    #[test]
    fn source_filters_match_only_on_equal_identity() {
        for match_type in [MatchType::Any, MatchType::Exact, MatchType::All] {
            let s1 = Filter::from(SourceFilter::new(match_type, "source-1"));
            let s2 = Filter::from(SourceFilter::new(match_type, "source-2"));
            let s1_again = Filter::from(SourceFilter::new(MatchType::Any, "source-1"));

            assert!(!s1.matches(&s2));
            assert!(s1.matches(&s1_again));
        }
    }

    #[test]
    fn request_filter_supports_object_requires_all_properties() {
        let filter = RequestFilter::new(MatchType::Exact, "series-window")
            .with_property("from")
            .with_property("to");

        assert!(filter.supports_object(&["from", "to", "limit"]));
        assert!(!filter.supports_object(&["from"]));
    }

    #[test]
    fn different_variants_never_match() {
        let type_filter = Filter::from(TypeFilter::new(MatchType::Any).with::<String>());
        let name_filter = Filter::from(NameFilter::new(MatchType::Any).with("String"));
        let request_filter = Filter::from(RequestFilter::new(MatchType::Any, "String"));

        assert!(!type_filter.matches(&name_filter));
        assert!(!name_filter.matches(&type_filter));
        assert!(!name_filter.matches(&request_filter));
    }
}
