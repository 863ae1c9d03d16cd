use log::debug;
use oxc_span::Span;
use serde::Serialize;

use crate::classifier::Analysis;
use crate::names::has_default_comment;
use crate::options::Style;
use crate::sites::{ExportShape, ExportSite, ObjectEntry};
use crate::style::StyleResolver;

/// Export sites grouped by exported name, in source order.
#[derive(Debug, Default)]
pub struct Buckets<'s, 'a> {
    pub default: Vec<&'s ExportSite<'a>>,
    pub named: Vec<(&'a str, Vec<&'s ExportSite<'a>>)>,
    pub bare: Vec<&'s ExportSite<'a>>,
}

impl<'s, 'a> Buckets<'s, 'a> {
    pub fn new(analysis: &'s Analysis<'a>) -> Self {
        let mut sites: Vec<&ExportSite<'a>> =
            analysis.module_sites.iter().chain(&analysis.exports_sites).collect();
        sites.sort_by_key(|s| s.leftmost.start);

        let mut buckets = Buckets::default();
        for site in sites {
            if site.is_bare() {
                buckets.bare.push(site);
                continue;
            }
            match site.name() {
                None => buckets.default.push(site),
                Some(name) => match buckets.named.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, group)) => group.push(site),
                    None => buckets.named.push((name, vec![site])),
                },
            }
        }
        buckets
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.named.is_empty() && self.bare.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapperReason {
    /// `module` or `exports` is used as a plain value.
    BareReference,
    /// `module.exports = exports = ...`
    ChainedAssignment,
    /// Both a default and named exports are produced.
    MixedBuckets,
    /// Named exports only, but the export style asks for a default export.
    DefaultStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedStrategy {
    /// One initializer ahead of every other reference.
    Direct,
    /// A hoisted `let` assigned wherever the export is written.
    Mutable,
}

/// How the exports of a module are rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ExportPlan {
    None,
    Wrapper { reason: WrapperReason },
    ObjectSplit,
    DefaultDirect,
    DefaultMutable { init_in_place: bool },
    Named { strategies: Vec<NamedStrategy> },
}

/// An object literal assigned to `module.exports`, exported one property at a
/// time.
#[derive(Debug)]
pub struct ObjectSplit<'s, 'a> {
    /// Start of the `module` identifier.
    pub start: u32,
    pub entries: &'s [ObjectEntry<'a>],
    pub statement: Span,
}

/// The chosen plan together with the sites its writer works on.
#[derive(Debug)]
pub enum ExportStrategy<'s, 'a> {
    None,
    Wrapper(WrapperReason),
    ObjectSplit(ObjectSplit<'s, 'a>),
    DefaultDirect(&'s ExportSite<'a>),
    DefaultMutable {
        /// References to `module.exports` itself.
        sites: Vec<&'s ExportSite<'a>>,
        /// `module.exports.name` references, kept as members of the default
        /// binding.
        members: Vec<&'s ExportSite<'a>>,
        init_in_place: bool,
    },
    /// One strategy per entry of `Buckets::named`.
    Named(Vec<NamedStrategy>),
}

impl ExportStrategy<'_, '_> {
    pub fn plan(&self) -> ExportPlan {
        match self {
            ExportStrategy::None => ExportPlan::None,
            ExportStrategy::Wrapper(reason) => ExportPlan::Wrapper { reason: *reason },
            ExportStrategy::ObjectSplit(_) => ExportPlan::ObjectSplit,
            ExportStrategy::DefaultDirect(_) => ExportPlan::DefaultDirect,
            ExportStrategy::DefaultMutable { init_in_place, .. } => {
                ExportPlan::DefaultMutable { init_in_place: *init_in_place }
            }
            ExportStrategy::Named(strategies) => {
                ExportPlan::Named { strategies: strategies.clone() }
            }
        }
    }
}

/// Decides the export strategy once for the whole module.
pub fn plan_exports<'s, 'a>(
    buckets: &Buckets<'s, 'a>,
    analysis: &Analysis<'_>,
    source: &str,
    resolver: &mut StyleResolver<'_>,
) -> ExportStrategy<'s, 'a> {
    let strategy = decide(buckets, analysis, source, resolver);
    debug!("Export plan: {:?}", strategy.plan());
    strategy
}

fn object_split<'s, 'a>(site: &'s ExportSite<'a>) -> Option<ObjectSplit<'s, 'a>> {
    let ExportShape::Assign { value, statement, .. } = &site.shape else { return None };
    Some(ObjectSplit {
        start: site.leftmost.start,
        entries: value.entries.as_deref()?,
        statement: *statement,
    })
}

fn decide<'s, 'a>(
    buckets: &Buckets<'s, 'a>,
    analysis: &Analysis<'_>,
    source: &str,
    resolver: &mut StyleResolver<'_>,
) -> ExportStrategy<'s, 'a> {
    if buckets.is_empty() {
        return ExportStrategy::None;
    }
    if !buckets.bare.is_empty() {
        return ExportStrategy::Wrapper(WrapperReason::BareReference);
    }
    let chained = buckets
        .default
        .iter()
        .any(|s| matches!(s.shape, ExportShape::Assign { chained: true, .. }));
    if chained {
        return ExportStrategy::Wrapper(WrapperReason::ChainedAssignment);
    }
    if !buckets.default.is_empty() && !buckets.named.is_empty() {
        if !analysis.exports_sites.is_empty() {
            return ExportStrategy::Wrapper(WrapperReason::MixedBuckets);
        }
        // only `module.exports` and its members are used
        let members: Vec<&'s ExportSite<'a>> =
            buckets.named.iter().flat_map(|(_, sites)| sites.iter().copied()).collect();
        let init_in_place =
            init_in_place(&buckets.default, &members, analysis.need_default_object);
        return ExportStrategy::DefaultMutable {
            sites: buckets.default.clone(),
            members,
            init_in_place,
        };
    }

    if let &[site] = buckets.default.as_slice() {
        return match &site.shape {
            ExportShape::Assign { .. } => {
                if let Some(split) = object_split(site)
                    && !has_default_comment(source, site.leftmost.end)
                    && resolver.export_style() == Style::Named
                {
                    ExportStrategy::ObjectSplit(split)
                } else {
                    ExportStrategy::DefaultDirect(site)
                }
            }
            ExportShape::Declare { .. } => ExportStrategy::DefaultDirect(site),
            _ => ExportStrategy::DefaultMutable {
                sites: vec![site],
                members: Vec::new(),
                init_in_place: false,
            },
        };
    }
    if !buckets.default.is_empty() {
        return ExportStrategy::DefaultMutable {
            sites: buckets.default.clone(),
            members: Vec::new(),
            init_in_place: init_in_place(&buckets.default, &[], analysis.need_default_object),
        };
    }

    if resolver.export_style() == Style::Default {
        return ExportStrategy::Wrapper(WrapperReason::DefaultStyle);
    }
    ExportStrategy::Named(buckets.named.iter().map(|(_, sites)| named_strategy(sites)).collect())
}

/// A lone assignment that runs before any other reference can initialize
/// the binding itself.
fn init_in_place(
    sites: &[&ExportSite<'_>],
    members: &[&ExportSite<'_>],
    need_default_object: bool,
) -> bool {
    if need_default_object {
        return false;
    }
    let mut assigns = sites.iter().filter(|s| matches!(s.shape, ExportShape::Assign { .. }));
    let (Some(init), None) = (assigns.next(), assigns.next()) else { return false };
    let defaults_follow = sites.iter().all(|s| match s.shape {
        ExportShape::Assign { .. } => true,
        ExportShape::Nested { .. } => s.root > init.root,
        _ => false,
    });
    defaults_follow && members.iter().all(|s| s.root > init.root)
}

pub fn named_strategy(sites: &[&ExportSite<'_>]) -> NamedStrategy {
    let mut inits = sites.iter().filter(|s| s.is_init());
    let (Some(init), None) = (inits.next(), inits.next()) else {
        return NamedStrategy::Mutable;
    };
    if matches!(init.shape, ExportShape::Declare { .. }) && sites.len() > 1 {
        return NamedStrategy::Mutable;
    }
    if sites.iter().any(|s| !s.is_init() && s.root <= init.root) {
        return NamedStrategy::Mutable;
    }
    NamedStrategy::Direct
}
