//! Namespace summaries of Linked Data vocabularies
//!
//! Scans a Turtle (or N-Triples) or RDF/XML document without building a
//! graph and reports:
//!
//! - `statements`: number of triples the document asserts
//! - `prefixes`: declared prefix -> namespace IRI
//! - `stats`: per-prefix term usage and full IRIs outside every declared
//!   namespace
//!
//! The scanners are lexical. They count what the syntax asserts and do not
//! validate it, so a malformed Turtle document still yields a best-effort
//! summary. Malformed XML is an error.

pub mod rdfxml;
pub mod turtle;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Result;

/// Serialization the summary was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    Turtle,
    RdfXml,
}

impl RdfFormat {
    /// Guess the format of `body` from its first markup
    pub fn detect(body: &str) -> Self {
        let head = body.trim_start_matches('\u{feff}').trim_start();
        let xml = ["<?xml", "<!--", "<!DOCTYPE", "<rdf:RDF"]
            .iter()
            .any(|marker| head.starts_with(marker));
        if xml {
            RdfFormat::RdfXml
        } else {
            RdfFormat::Turtle
        }
    }
}

/// Namespace statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub format: RdfFormat,
    /// Number of declared prefixes
    pub namespaces: usize,
    /// prefix -> number of terms in that namespace
    pub usage: BTreeMap<String, usize>,
    /// namespace IRI -> number of full IRIs under no declared prefix
    pub undeclared: BTreeMap<String, usize>,
}

/// Result of summarizing one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub statements: usize,
    pub prefixes: BTreeMap<String, String>,
    pub stats: NamespaceStats,
}

/// A term occurrence seen by a scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `prefix:local`, or an XML qualified name
    Prefixed(String),
    /// `<http://...>`, or an IRI-valued XML attribute
    Iri(String),
}

/// Raw scanner output
#[derive(Debug, Default)]
pub struct Scan {
    pub statements: usize,
    pub prefixes: BTreeMap<String, String>,
    pub references: Vec<Reference>,
}

/// Summarize a document of unknown format
pub fn summarize(body: &str) -> Result<Summary> {
    let format = RdfFormat::detect(body);
    let scan = match format {
        RdfFormat::Turtle => turtle::scan(body),
        RdfFormat::RdfXml => rdfxml::scan(body)?,
    };
    Ok(scan.into_summary(format))
}

impl Scan {
    pub fn into_summary(self, format: RdfFormat) -> Summary {
        let mut usage: BTreeMap<String, usize> = BTreeMap::new();
        let mut undeclared: BTreeMap<String, usize> = BTreeMap::new();

        for reference in &self.references {
            match reference {
                Reference::Prefixed(prefix) => {
                    *usage.entry(prefix.clone()).or_default() += 1;
                }
                Reference::Iri(iri) => match declared_prefix(&self.prefixes, iri) {
                    Some(prefix) => *usage.entry(prefix.to_string()).or_default() += 1,
                    None => {
                        if let Some(namespace) = namespace_of(iri) {
                            *undeclared.entry(namespace.to_string()).or_default() += 1;
                        }
                    }
                },
            }
        }

        Summary {
            statements: self.statements,
            stats: NamespaceStats {
                format,
                namespaces: self.prefixes.len(),
                usage,
                undeclared,
            },
            prefixes: self.prefixes,
        }
    }
}

/// Longest declared namespace that `iri` falls under
fn declared_prefix<'a>(prefixes: &'a BTreeMap<String, String>, iri: &str) -> Option<&'a str> {
    prefixes
        .iter()
        .filter(|(_, ns)| !ns.is_empty() && iri.starts_with(ns.as_str()))
        .max_by_key(|(_, ns)| ns.len())
        .map(|(prefix, _)| prefix.as_str())
}

/// Namespace part of an absolute IRI: everything up to the last `#` or `/`
pub fn namespace_of(iri: &str) -> Option<&str> {
    if !iri.contains(':') {
        return None;
    }
    let cut = iri.rfind(['#', '/'])?;
    Some(&iri[..=cut])
}
