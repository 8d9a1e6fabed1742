//! RDF/XML scanner
//!
//! Walks the element tree with alternating node/property roles. Statements
//! are property elements, property attributes, and one `rdf:type` per typed
//! node element. Contents of `rdf:parseType="Literal"` are opaque.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{Reference, Scan};
use crate::types::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Role {
    /// `rdf:RDF`
    Container,
    Node,
    Property,
    /// Inside an XML literal
    Literal,
}

/// Scan an RDF/XML document
pub fn scan(body: &str) -> Result<Scan> {
    let mut scan = Scan::default();
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Role> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => {
                let role = role_for(stack.last().copied(), &element);
                let child = visit(&mut scan, &element, role)?;
                stack.push(child);
            }
            Event::Empty(element) => {
                let role = role_for(stack.last().copied(), &element);
                visit(&mut scan, &element, role)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!(
        statements = scan.statements,
        prefixes = scan.prefixes.len(),
        "RDF/XML document scanned"
    );
    Ok(scan)
}

fn xml_error(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::MalformedUpstreamResponse(format!("invalid RDF/XML: {}", e))
}

/// Role of a new element given what its parent expects of its children
fn role_for(expected: Option<Role>, element: &BytesStart<'_>) -> Role {
    match expected {
        Some(role) => role,
        None if element.name().as_ref() == b"rdf:RDF" => Role::Container,
        None => Role::Node,
    }
}

fn prefix_of(name: &str) -> &str {
    name.split_once(':').map(|(prefix, _)| prefix).unwrap_or("")
}

fn push_iri(scan: &mut Scan, value: &str) {
    if value.contains(':') {
        scan.references.push(Reference::Iri(value.to_string()));
    }
}

/// Record one element; returns the role of its children
fn visit(scan: &mut Scan, element: &BytesStart<'_>, role: Role) -> Result<Role> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    let mut child_role = match role {
        Role::Container => Role::Node,
        Role::Node => Role::Property,
        Role::Property => Role::Node,
        Role::Literal => Role::Literal,
    };

    if role == Role::Literal {
        return Ok(child_role);
    }

    match role {
        Role::Node => {
            scan.references.push(Reference::Prefixed(prefix_of(&name).to_string()));
            if name != "rdf:Description" {
                scan.statements += 1;
            }
        }
        Role::Property => {
            scan.references.push(Reference::Prefixed(prefix_of(&name).to_string()));
            scan.statements += 1;
        }
        _ => {}
    }

    for attribute in element.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(xml_error)?;

        if key == "xmlns" {
            scan.prefixes.insert(String::new(), value.into_owned());
            continue;
        }
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            scan.prefixes.insert(prefix.to_string(), value.into_owned());
            continue;
        }
        if key.starts_with("xml:") || role == Role::Container {
            continue;
        }

        match key.as_str() {
            "rdf:about" | "rdf:resource" | "rdf:datatype" => push_iri(scan, &value),
            "rdf:ID" | "rdf:nodeID" | "rdf:bagID" => {}
            "rdf:parseType" => {
                child_role = match value.as_ref() {
                    "Literal" => Role::Literal,
                    "Resource" => Role::Property,
                    _ => child_role,
                };
            }
            "rdf:type" => {
                scan.statements += 1;
                scan.references.push(Reference::Prefixed("rdf".to_string()));
                push_iri(scan, &value);
            }
            _ => {
                scan.statements += 1;
                scan.references.push(Reference::Prefixed(prefix_of(&key).to_string()));
            }
        }
    }

    Ok(child_role)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:skos="http://www.w3.org/2004/02/skos/core#"
         xmlns="http://example.org/vocab#">
  <skos:Concept rdf:about="http://example.org/vocab#a" skos:notation="A">
    <skos:prefLabel xml:lang="en">A</skos:prefLabel>
    <skos:broader rdf:resource="http://other.example/ns#top"/>
  </skos:Concept>
  <rdf:Description rdf:about="http://example.org/vocab#b">
    <rdfs:label>B</rdfs:label>
    <related>
      <Thing rdf:about="http://example.org/vocab#c"/>
    </related>
    <rdfs:comment rdf:parseType="Literal"><b xmlns="http://www.w3.org/1999/xhtml">bold</b></rdfs:comment>
  </rdf:Description>
</rdf:RDF>
"#;

    #[test]
    fn test_declarations() {
        let scan = scan(DOC).unwrap();
        assert_eq!(scan.prefixes.len(), 4);
        assert_eq!(scan.prefixes["skos"], "http://www.w3.org/2004/02/skos/core#");
        assert_eq!(scan.prefixes[""], "http://example.org/vocab#");
    }

    #[test]
    fn test_statement_counting() {
        // skos:Concept: type + notation + prefLabel + broader = 4
        // rdf:Description: label + related + comment = 3
        // Thing: type = 1
        let scan = scan(DOC).unwrap();
        assert_eq!(scan.statements, 8);
    }

    #[test]
    fn test_references() {
        let scan = scan(DOC).unwrap();
        assert!(scan
            .references
            .contains(&Reference::Iri("http://other.example/ns#top".into())));
        let skos = scan
            .references
            .iter()
            .filter(|r| **r == Reference::Prefixed("skos".into()))
            .count();
        assert_eq!(skos, 4);
        // The XHTML inside the literal is not a term
        let default_ns = scan
            .references
            .iter()
            .filter(|r| **r == Reference::Prefixed(String::new()))
            .count();
        assert_eq!(default_ns, 2);
    }

    #[test]
    fn test_malformed_xml() {
        let err = scan("<rdf:RDF><a></b></rdf:RDF>").unwrap_err();
        assert!(matches!(err, ServiceError::MalformedUpstreamResponse(_)));
    }
}
