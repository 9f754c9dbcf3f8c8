//! Shape validation over a subset of ShExJ (the JSON form of ShEx).
//!
//! Supported: shape declarations, `Shape` with `closed`/`extra`, `NodeConstraint`
//! (node kind, datatype, value sets with stems, ranges and language tags, string and
//! numeric facets), `ShapeAnd`, `ShapeOr`, `ShapeNot`, shape references, and the triple
//! expressions `TripleConstraint`, `EachOf` and `OneOf`. Triple constraints are
//! matched independently per predicate rather than by full partition semantics.

use crate::errors::LdoError;
use anyhow::{Error, Result};
use log::debug;
use oxigraph::model::{NamedOrBlankNodeRef, Quad, Term, TermRef};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub shapes: Vec<ShapeExpr>,
}

impl Schema {
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Finds the shape expression declared with the given label.
    pub fn shape(&self, label: &str) -> Option<&ShapeExpr> {
        self.shapes.iter().find(|s| s.id() == Some(label))
    }
}

/// A shape expression, either inline or by reference to a declared label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShapeExprRef {
    Label(String),
    Expr(Box<ShapeExpr>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeExpr {
    ShapeDecl(ShapeDecl),
    Shape(Shape),
    NodeConstraint(NodeConstraint),
    ShapeAnd(ShapeJunction),
    ShapeOr(ShapeJunction),
    ShapeNot(ShapeNot),
    ShapeExternal(ShapeExternal),
}

impl ShapeExpr {
    pub fn id(&self) -> Option<&str> {
        match self {
            ShapeExpr::ShapeDecl(d) => Some(d.id.as_str()),
            ShapeExpr::Shape(s) => s.id.as_deref(),
            ShapeExpr::NodeConstraint(n) => n.id.as_deref(),
            ShapeExpr::ShapeAnd(j) | ShapeExpr::ShapeOr(j) => j.id.as_deref(),
            ShapeExpr::ShapeNot(n) => n.id.as_deref(),
            ShapeExpr::ShapeExternal(e) => e.id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeDecl {
    pub id: String,
    #[serde(rename = "shapeExpr")]
    pub shape_expr: ShapeExprRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Shape {
    pub id: Option<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub extra: Vec<String>,
    pub expression: Option<TripleExpr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeJunction {
    pub id: Option<String>,
    #[serde(rename = "shapeExprs")]
    pub shape_exprs: Vec<ShapeExprRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeNot {
    pub id: Option<String>,
    #[serde(rename = "shapeExpr")]
    pub shape_expr: ShapeExprRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeExternal {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Iri,
    Bnode,
    Nonliteral,
    Literal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConstraint {
    pub id: Option<String>,
    #[serde(rename = "nodeKind")]
    pub node_kind: Option<NodeKind>,
    pub datatype: Option<String>,
    pub values: Option<Vec<ValueSetValue>>,
    pub pattern: Option<String>,
    pub flags: Option<String>,
    pub length: Option<usize>,
    pub minlength: Option<usize>,
    pub maxlength: Option<usize>,
    pub mininclusive: Option<f64>,
    pub maxinclusive: Option<f64>,
    pub minexclusive: Option<f64>,
    pub maxexclusive: Option<f64>,
}

/// One entry of a `NodeConstraint` value set. Entries of a kind this module does not
/// know are kept as `Unsupported` and fail validation rather than schema loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueSetValue {
    Iri(String),
    Literal {
        value: String,
        #[serde(rename = "type")]
        datatype: Option<String>,
        language: Option<String>,
    },
    Typed(TypedValue),
    Unsupported(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TypedValue {
    IriStem {
        stem: String,
    },
    IriStemRange(StemRange),
    LiteralStem {
        stem: String,
    },
    LiteralStemRange(StemRange),
    Language {
        #[serde(rename = "languageTag")]
        language_tag: String,
    },
    LanguageStem {
        stem: String,
    },
    LanguageStemRange(StemRange),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StemRange {
    pub stem: RangeStem,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

/// The stem of a range: a string, or a `Wildcard` object matching everything.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RangeStem {
    Stem(String),
    Wildcard {},
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Exclusion {
    Value(String),
    Stem { stem: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TripleExpr {
    TripleConstraint(TripleConstraint),
    EachOf(TripleJunction),
    OneOf(TripleJunction),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripleConstraint {
    pub predicate: String,
    #[serde(rename = "valueExpr")]
    pub value_expr: Option<ShapeExprRef>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    #[serde(default)]
    pub inverse: bool,
}

impl TripleConstraint {
    fn min(&self) -> usize {
        self.min.unwrap_or(1).max(0) as usize
    }

    /// `None` is unbounded
    fn max(&self) -> Option<usize> {
        match self.max {
            Some(m) if m < 0 => None,
            Some(m) => Some(m as usize),
            None => Some(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripleJunction {
    pub expressions: Vec<TripleExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub focus: String,
    pub shape: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} @ <{}>: {}", self.focus, self.shape, self.message)
    }
}

/// The outcome of validating one node against one shape.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates nodes of a quad snapshot against the shapes of a schema.
pub struct ShexValidator<'a> {
    schema: &'a Schema,
    quads: &'a [Quad],
}

impl<'a> ShexValidator<'a> {
    pub fn new(schema: &'a Schema, quads: &'a [Quad]) -> Self {
        Self { schema, quads }
    }

    pub fn validate(&self, node: TermRef<'_>, shape: &str) -> Result<ValidationReport> {
        let expr = self
            .schema
            .shape(shape)
            .ok_or_else(|| Error::new(LdoError::ShapeNotFound(shape.to_string())))?;
        let node = node.into_owned();
        let mut errors = vec![];
        let mut visiting = HashSet::new();
        visiting.insert((node.clone(), shape.to_string()));
        self.check_expr(&node, expr, shape, &mut errors, &mut visiting);
        debug!(
            "Validated {} against <{}>: {} error(s)",
            node,
            shape,
            errors.len()
        );
        Ok(ValidationReport { errors })
    }

    fn error(&self, errors: &mut Vec<ValidationError>, node: &Term, shape: &str, msg: String) {
        errors.push(ValidationError {
            focus: node.to_string(),
            shape: shape.to_string(),
            message: msg,
        });
    }

    fn check_ref(
        &self,
        node: &Term,
        expr: &ShapeExprRef,
        shape: &str,
        errors: &mut Vec<ValidationError>,
        visiting: &mut HashSet<(Term, String)>,
    ) -> bool {
        match expr {
            ShapeExprRef::Expr(inner) => self.check_expr(node, inner, shape, errors, visiting),
            ShapeExprRef::Label(label) => {
                let key = (node.clone(), label.clone());
                if visiting.contains(&key) {
                    // assume conformance on recursive re-entry
                    return true;
                }
                let Some(target) = self.schema.shape(label) else {
                    self.error(errors, node, shape, format!("unknown shape reference <{}>", label));
                    return false;
                };
                visiting.insert(key.clone());
                let ok = self.check_expr(node, target, label, errors, visiting);
                visiting.remove(&key);
                ok
            }
        }
    }

    fn check_expr(
        &self,
        node: &Term,
        expr: &ShapeExpr,
        shape: &str,
        errors: &mut Vec<ValidationError>,
        visiting: &mut HashSet<(Term, String)>,
    ) -> bool {
        match expr {
            ShapeExpr::ShapeDecl(decl) => self.check_ref(node, &decl.shape_expr, shape, errors, visiting),
            ShapeExpr::Shape(s) => self.check_shape(node, s, shape, errors, visiting),
            ShapeExpr::NodeConstraint(nc) => self.check_node_constraint(node, nc, shape, errors),
            ShapeExpr::ShapeAnd(j) => {
                let mut ok = true;
                for e in &j.shape_exprs {
                    ok &= self.check_ref(node, e, shape, errors, visiting);
                }
                ok
            }
            ShapeExpr::ShapeOr(j) => {
                let mut scratch = vec![];
                let ok = j
                    .shape_exprs
                    .iter()
                    .any(|e| self.check_ref(node, e, shape, &mut scratch, visiting));
                if !ok {
                    self.error(errors, node, shape, "matches none of the alternatives".to_string());
                }
                ok
            }
            ShapeExpr::ShapeNot(n) => {
                let mut scratch = vec![];
                let ok = !self.check_ref(node, &n.shape_expr, shape, &mut scratch, visiting);
                if !ok {
                    self.error(errors, node, shape, "matches a negated shape".to_string());
                }
                ok
            }
            ShapeExpr::ShapeExternal(_) => {
                self.error(errors, node, shape, "external shapes are not supported".to_string());
                false
            }
        }
    }

    /// Values reached from `node` over `predicate`, or the reverse for inverse constraints.
    fn neighbours(&self, node: &Term, predicate: &str, inverse: bool) -> Vec<Term> {
        self.quads
            .iter()
            .filter(|q| q.predicate.as_str() == predicate)
            .filter_map(|q| {
                if inverse {
                    (q.object == *node).then(|| q.subject.clone().into())
                } else {
                    (Term::from(q.subject.clone()) == *node).then(|| q.object.clone())
                }
            })
            .collect()
    }

    fn check_shape(
        &self,
        node: &Term,
        s: &Shape,
        shape: &str,
        errors: &mut Vec<ValidationError>,
        visiting: &mut HashSet<(Term, String)>,
    ) -> bool {
        let mut ok = match &s.expression {
            Some(expr) => self.check_triple_expr(node, expr, &s.extra, shape, errors, visiting),
            None => true,
        };
        if s.closed {
            let mut allowed: HashSet<&str> = s.extra.iter().map(String::as_str).collect();
            if let Some(expr) = &s.expression {
                collect_predicates(expr, &mut allowed);
            }
            let subject = match node {
                Term::NamedNode(n) => Some(NamedOrBlankNodeRef::NamedNode(n.as_ref())),
                Term::BlankNode(b) => Some(NamedOrBlankNodeRef::BlankNode(b.as_ref())),
                _ => None,
            };
            if let Some(subject) = subject {
                for q in self.quads.iter().filter(|q| q.subject.as_ref() == subject) {
                    if !allowed.contains(q.predicate.as_str()) {
                        self.error(
                            errors,
                            node,
                            shape,
                            format!("closed shape does not allow {}", q.predicate),
                        );
                        ok = false;
                    }
                }
            }
        }
        ok
    }

    fn check_triple_expr(
        &self,
        node: &Term,
        expr: &TripleExpr,
        extra: &[String],
        shape: &str,
        errors: &mut Vec<ValidationError>,
        visiting: &mut HashSet<(Term, String)>,
    ) -> bool {
        match expr {
            TripleExpr::EachOf(j) => {
                let mut ok = true;
                for e in &j.expressions {
                    ok &= self.check_triple_expr(node, e, extra, shape, errors, visiting);
                }
                ok
            }
            TripleExpr::OneOf(j) => {
                let mut scratch = vec![];
                let ok = j
                    .expressions
                    .iter()
                    .any(|e| self.check_triple_expr(node, e, extra, shape, &mut scratch, visiting));
                if !ok {
                    self.error(errors, node, shape, "matches none of the OneOf branches".to_string());
                }
                ok
            }
            TripleExpr::TripleConstraint(tc) => {
                self.check_triple_constraint(node, tc, extra, shape, errors, visiting)
            }
        }
    }

    fn check_triple_constraint(
        &self,
        node: &Term,
        tc: &TripleConstraint,
        extra: &[String],
        shape: &str,
        errors: &mut Vec<ValidationError>,
        visiting: &mut HashSet<(Term, String)>,
    ) -> bool {
        let values = self.neighbours(node, &tc.predicate, tc.inverse);
        let mut ok = true;
        let mut matching = 0;
        for value in &values {
            let conforms = match &tc.value_expr {
                Some(value_expr) => {
                    let mut scratch = vec![];
                    let conforms = self.check_ref(value, value_expr, shape, &mut scratch, visiting);
                    if !conforms && !extra.iter().any(|p| p == &tc.predicate) {
                        errors.extend(scratch);
                        ok = false;
                    }
                    conforms
                }
                None => true,
            };
            if conforms {
                matching += 1;
            }
        }
        let min = tc.min();
        if matching < min {
            self.error(
                errors,
                node,
                shape,
                format!(
                    "expected at least {} value(s) for <{}>, found {}",
                    min, tc.predicate, matching
                ),
            );
            ok = false;
        }
        if let Some(max) = tc.max() {
            if matching > max {
                self.error(
                    errors,
                    node,
                    shape,
                    format!(
                        "expected at most {} value(s) for <{}>, found {}",
                        max, tc.predicate, matching
                    ),
                );
                ok = false;
            }
        }
        ok
    }

    fn check_node_constraint(
        &self,
        node: &Term,
        nc: &NodeConstraint,
        shape: &str,
        errors: &mut Vec<ValidationError>,
    ) -> bool {
        let before = errors.len();
        if let Some(kind) = nc.node_kind {
            let matches = match kind {
                NodeKind::Iri => matches!(node, Term::NamedNode(_)),
                NodeKind::Bnode => matches!(node, Term::BlankNode(_)),
                NodeKind::Nonliteral => matches!(node, Term::NamedNode(_) | Term::BlankNode(_)),
                NodeKind::Literal => matches!(node, Term::Literal(_)),
            };
            if !matches {
                self.error(errors, node, shape, format!("expected node kind {:?}", kind));
            }
        }
        if let Some(datatype) = &nc.datatype {
            let matches = match node {
                Term::Literal(l) => l.datatype().as_str() == datatype,
                _ => false,
            };
            if !matches {
                self.error(errors, node, shape, format!("expected datatype <{}>", datatype));
            }
        }
        if let Some(values) = &nc.values {
            if !values.iter().any(|v| value_matches(node, v)) {
                let unsupported: Vec<String> = values
                    .iter()
                    .filter_map(|v| match v {
                        ValueSetValue::Unsupported(raw) => Some(raw.to_string()),
                        _ => None,
                    })
                    .collect();
                let message = if unsupported.is_empty() {
                    "not in the allowed value set".to_string()
                } else {
                    format!(
                        "not in the allowed value set (unsupported entries: {})",
                        unsupported.join(", ")
                    )
                };
                self.error(errors, node, shape, message);
            }
        }

        let lexical = match node {
            Term::NamedNode(n) => n.as_str().to_string(),
            Term::BlankNode(b) => b.as_str().to_string(),
            Term::Literal(l) => l.value().to_string(),
            #[allow(unreachable_patterns)]
            _ => node.to_string(),
        };
        let len = lexical.chars().count();
        if nc.length.is_some_and(|l| len != l)
            || nc.minlength.is_some_and(|l| len < l)
            || nc.maxlength.is_some_and(|l| len > l)
        {
            self.error(errors, node, shape, format!("length {} out of bounds", len));
        }
        if let Some(pattern) = &nc.pattern {
            let pattern = match &nc.flags {
                Some(flags) if !flags.is_empty() => format!("(?{}){}", flags, pattern),
                _ => pattern.clone(),
            };
            match Regex::new(&pattern) {
                Ok(re) if re.is_match(&lexical) => {}
                Ok(_) => self.error(errors, node, shape, format!("does not match /{}/", pattern)),
                Err(e) => self.error(errors, node, shape, format!("invalid pattern: {}", e)),
            }
        }
        let numeric = [nc.mininclusive, nc.maxinclusive, nc.minexclusive, nc.maxexclusive];
        if numeric.iter().any(Option::is_some) {
            match (node, lexical.parse::<f64>()) {
                (Term::Literal(_), Ok(n)) => {
                    if nc.mininclusive.is_some_and(|m| n < m)
                        || nc.maxinclusive.is_some_and(|m| n > m)
                        || nc.minexclusive.is_some_and(|m| n <= m)
                        || nc.maxexclusive.is_some_and(|m| n >= m)
                    {
                        self.error(errors, node, shape, format!("{} out of numeric range", n));
                    }
                }
                _ => self.error(errors, node, shape, "expected a numeric literal".to_string()),
            }
        }
        errors.len() == before
    }
}

fn value_matches(node: &Term, value: &ValueSetValue) -> bool {
    match (node, value) {
        (Term::NamedNode(n), ValueSetValue::Iri(iri)) => n.as_str() == iri,
        (
            Term::Literal(l),
            ValueSetValue::Literal {
                value,
                datatype,
                language,
            },
        ) => {
            l.value() == value
                && language.as_deref().map_or(true, |lang| {
                    l.language().is_some_and(|tag| tag.eq_ignore_ascii_case(lang))
                })
                && datatype
                    .as_deref()
                    .map_or(true, |dt| l.datatype().as_str() == dt)
        }
        (_, ValueSetValue::Typed(typed)) => typed_matches(node, typed),
        _ => false,
    }
}

fn typed_matches(node: &Term, value: &TypedValue) -> bool {
    match (node, value) {
        (Term::NamedNode(n), TypedValue::IriStem { stem }) => n.as_str().starts_with(stem.as_str()),
        (Term::NamedNode(n), TypedValue::IriStemRange(range)) => {
            range_matches(n.as_str(), range, |v, stem| v.starts_with(stem))
        }
        (Term::Literal(l), TypedValue::LiteralStem { stem }) => l.value().starts_with(stem.as_str()),
        (Term::Literal(l), TypedValue::LiteralStemRange(range)) => {
            range_matches(l.value(), range, |v, stem| v.starts_with(stem))
        }
        (Term::Literal(l), TypedValue::Language { language_tag }) => l
            .language()
            .is_some_and(|tag| tag.eq_ignore_ascii_case(language_tag)),
        (Term::Literal(l), TypedValue::LanguageStem { stem }) => {
            l.language().is_some_and(|lang| language_stem_matches(lang, stem))
        }
        (Term::Literal(l), TypedValue::LanguageStemRange(range)) => l
            .language()
            .is_some_and(|lang| range_matches(lang, range, language_stem_matches)),
        _ => false,
    }
}

fn range_matches(value: &str, range: &StemRange, stem_matches: impl Fn(&str, &str) -> bool) -> bool {
    let in_stem = match &range.stem {
        RangeStem::Stem(stem) => stem_matches(value, stem),
        RangeStem::Wildcard {} => true,
    };
    in_stem
        && !range.exclusions.iter().any(|e| match e {
            Exclusion::Value(v) => value == v,
            Exclusion::Stem { stem } => stem_matches(value, stem),
        })
}

/// An empty stem matches any tag; otherwise the tag must equal the stem or extend it
/// with a `-` subtag.
fn language_stem_matches(lang: &str, stem: &str) -> bool {
    if stem.is_empty() {
        return true;
    }
    let lang = lang.to_ascii_lowercase();
    let stem = stem.to_ascii_lowercase();
    lang == stem || lang.strip_prefix(stem.as_str()).is_some_and(|rest| rest.starts_with('-'))
}

fn collect_predicates<'e>(expr: &'e TripleExpr, out: &mut HashSet<&'e str>) {
    match expr {
        TripleExpr::TripleConstraint(tc) if !tc.inverse => {
            out.insert(tc.predicate.as_str());
        }
        TripleExpr::TripleConstraint(_) => {}
        TripleExpr::EachOf(j) | TripleExpr::OneOf(j) => {
            for e in &j.expressions {
                collect_predicates(e, out);
            }
        }
    }
}
