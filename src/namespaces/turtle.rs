//! Turtle / N-Triples scanner
//!
//! Tokenizes the document, records `@prefix` / `PREFIX` declarations and
//! counts triples from the punctuation structure:
//!
//! - one per subject block (`s p o .`)
//! - one per `;`-continued predicate
//! - one per `,`-continued object
//! - one per non-empty `[ ... ]` blank-node property list
//!
//! Collections `( ... )` count as a single term.

use super::{Reference, Scan};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Any RDF term (IRI, prefixed name, literal, `a`, number, blank node)
    Term,
    Dot,
    Semicolon,
    Comma,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameKind {
    Top,
    Bracket,
    Paren,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    terms: usize,
    pending_predicate: bool,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            terms: 0,
            pending_predicate: false,
        }
    }
}

/// Scan a Turtle document
pub fn scan(body: &str) -> Scan {
    let mut scan = Scan::default();
    let tokens = Lexer::new(body, &mut scan).run();
    scan.statements = count_statements(&tokens);
    scan
}

fn count_statements(tokens: &[Token]) -> usize {
    let mut count = 0;
    let mut stack = vec![Frame::new(FrameKind::Top)];

    fn term(frame: &mut Frame, count: &mut usize) {
        if frame.kind == FrameKind::Paren {
            return;
        }
        if frame.pending_predicate {
            *count += 1;
            frame.pending_predicate = false;
        }
        frame.terms += 1;
    }

    fn close_block(frame: &mut Frame, count: &mut usize) {
        if frame.terms >= 3 {
            *count += 1;
        }
        frame.terms = 0;
        frame.pending_predicate = false;
    }

    for token in tokens {
        match token {
            Token::Term => {
                if let Some(frame) = stack.last_mut() {
                    term(frame, &mut count);
                }
            }
            Token::OpenBracket => stack.push(Frame::new(FrameKind::Bracket)),
            Token::OpenParen => stack.push(Frame::new(FrameKind::Paren)),
            Token::CloseBracket | Token::CloseParen => {
                if stack.len() > 1 {
                    if let Some(closed) = stack.pop() {
                        if closed.kind == FrameKind::Bracket && closed.terms > 0 {
                            count += 1;
                        }
                    }
                }
                if let Some(frame) = stack.last_mut() {
                    term(frame, &mut count);
                }
            }
            Token::Semicolon => {
                if let Some(frame) = stack.last_mut() {
                    if frame.kind != FrameKind::Paren {
                        frame.pending_predicate = true;
                    }
                }
            }
            Token::Comma => {
                if stack.last().is_some_and(|f| f.kind != FrameKind::Paren) {
                    count += 1;
                }
            }
            Token::Dot => {
                // Unbalanced brackets end at the statement terminator
                stack.truncate(1);
                close_block(&mut stack[0], &mut count);
            }
        }
    }

    stack.truncate(1);
    close_block(&mut stack[0], &mut count);
    count
}

struct Lexer<'s> {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    scan: &'s mut Scan,
}

impl<'s> Lexer<'s> {
    fn new(body: &str, scan: &'s mut Scan) -> Self {
        Self {
            chars: body.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            scan,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => self.pos += 1,
                '#' => self.skip_comment(),
                '<' => {
                    let iri = self.read_iri();
                    self.scan.references.push(Reference::Iri(iri));
                    self.tokens.push(Token::Term);
                }
                '"' | '\'' => {
                    self.skip_literal(c);
                    self.tokens.push(Token::Term);
                }
                '^' if self.peek_at(1) == Some('^') => {
                    // Datatype: a reference, not a separate term
                    self.pos += 2;
                    self.read_datatype();
                }
                '.' if !self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => {
                    self.pos += 1;
                    self.tokens.push(Token::Dot);
                }
                ';' => {
                    self.pos += 1;
                    self.tokens.push(Token::Semicolon);
                }
                ',' => {
                    self.pos += 1;
                    self.tokens.push(Token::Comma);
                }
                '[' => {
                    self.pos += 1;
                    self.tokens.push(Token::OpenBracket);
                }
                ']' => {
                    self.pos += 1;
                    self.tokens.push(Token::CloseBracket);
                }
                '(' => {
                    self.pos += 1;
                    self.tokens.push(Token::OpenParen);
                }
                ')' => {
                    self.pos += 1;
                    self.tokens.push(Token::CloseParen);
                }
                '{' | '}' => self.pos += 1,
                _ => self.read_word(),
            }
        }
        self.tokens
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                break;
            }
        }
    }

    /// Read `<...>` and return its content
    fn read_iri(&mut self) -> String {
        self.pos += 1;
        let mut iri = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '>' => break,
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        iri.push(escaped);
                        self.pos += 1;
                    }
                }
                _ => iri.push(c),
            }
        }
        iri
    }

    fn skip_literal(&mut self, quote: char) {
        let long = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if long { 3 } else { 1 };

        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 2;
                continue;
            }
            if c == quote {
                if !long {
                    self.pos += 1;
                    return;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return;
                }
            }
            if c == '\n' && !long {
                // Unterminated short literal
                return;
            }
            self.pos += 1;
        }
    }

    fn read_datatype(&mut self) {
        match self.peek() {
            Some('<') => {
                let iri = self.read_iri();
                self.scan.references.push(Reference::Iri(iri));
            }
            Some(_) => {
                let word = self.take_word();
                if let Some((prefix, _)) = word.split_once(':') {
                    self.scan.references.push(Reference::Prefixed(prefix.to_string()));
                }
            }
            None => {}
        }
    }

    /// Consume a bare word, leaving a trailing statement `.` in place
    fn take_word(&mut self) -> String {
        if self.peek().is_none() {
            return String::new();
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '<' | '"' | ';' | ',' | '[' | ']' | '(' | ')' | '{' | '}' | '#') {
                break;
            }
            if c == '^' && self.peek_at(1) == Some('^') {
                break;
            }
            self.pos += 1;
        }
        while self.pos > start + 1 && self.chars[self.pos - 1] == '.' {
            self.pos -= 1;
        }
        if self.pos == start {
            // Lone character the lexer has no rule for
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_word(&mut self) {
        let word = self.take_word();

        if word.eq_ignore_ascii_case("@prefix") || word.eq_ignore_ascii_case("prefix") {
            self.read_prefix_declaration();
            return;
        }
        if word.eq_ignore_ascii_case("@base") || word.eq_ignore_ascii_case("base") {
            self.skip_whitespace();
            if self.peek() == Some('<') {
                self.read_iri();
            }
            self.skip_directive_dot(word.starts_with('@'));
            return;
        }
        if word.starts_with('@') {
            // Language tag
            return;
        }

        if let Some((prefix, _)) = word.split_once(':') {
            if prefix != "_" {
                self.scan.references.push(Reference::Prefixed(prefix.to_string()));
            }
        }
        self.tokens.push(Token::Term);
    }

    fn read_prefix_declaration(&mut self) {
        self.skip_whitespace();
        let name = self.take_word();
        if name.is_empty() {
            return;
        }
        self.skip_whitespace();
        if self.peek() != Some('<') {
            return;
        }
        let iri = self.read_iri();
        let prefix = name.strip_suffix(':').unwrap_or(&name).to_string();
        self.scan.prefixes.insert(prefix, iri);
        self.skip_directive_dot(true);
    }

    /// `@prefix`/`@base` end in `.`; SPARQL-style directives may not
    fn skip_directive_dot(&mut self, required: bool) {
        self.skip_whitespace();
        if self.peek() == Some('.') && (required || !self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(doc: &str) -> usize {
        scan(doc).statements
    }

    #[test]
    fn test_prefix_declarations() {
        let doc = r#"
            @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
            PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
            @prefix : <http://example.org/> .
            @base <http://example.org/base/> .
        "#;
        let scan = scan(doc);
        assert_eq!(scan.prefixes.len(), 3);
        assert_eq!(scan.prefixes["skos"], "http://www.w3.org/2004/02/skos/core#");
        assert_eq!(scan.prefixes[""], "http://example.org/");
        assert_eq!(scan.statements, 0);
        assert!(scan.references.is_empty());
    }

    #[test]
    fn test_statement_counting() {
        assert_eq!(statements("<http://a/s> <http://a/p> <http://a/o> ."), 1);
        assert_eq!(statements("ex:s ex:p ex:o ; ex:q ex:r ."), 2);
        assert_eq!(statements("ex:s ex:p ex:o , ex:o2 , ex:o3 ."), 3);
        assert_eq!(statements("ex:s ex:p ex:o ; ."), 1);
        assert_eq!(statements("ex:s ex:p [ ex:q ex:r ; ex:t ex:u ] ."), 3);
        assert_eq!(statements("ex:s ex:p [] ."), 1);
        assert_eq!(statements("[ ex:p ex:o ] ."), 1);
        assert_eq!(statements("ex:s ex:p ( ex:a ex:b ex:c ) ."), 1);
        assert_eq!(statements("ex:s a ex:Class"), 1);
    }

    #[test]
    fn test_ntriples_lines() {
        let doc = "<http://a/s> <http://a/p> \"one\" .\n\
                   <http://a/s> <http://a/p> \"two\"@en .\n\
                   <http://a/s> <http://a/q> \"3\"^^<http://www.w3.org/2001/XMLSchema#int> .\n";
        let scan = scan(doc);
        assert_eq!(scan.statements, 3);
        assert!(scan
            .references
            .contains(&Reference::Iri("http://www.w3.org/2001/XMLSchema#int".into())));
    }

    #[test]
    fn test_literals_and_comments_are_opaque() {
        let doc = r#"
            # ex:ignored ex:ignored ex:ignored .
            ex:s rdfs:comment """A long ; literal, with "quotes" . and ex:names""" ;
                 rdfs:label 'x ; y'@en ;
                 ex:n 1.5 ;
                 ex:m "2"^^xsd:integer .
        "#;
        let scan = scan(doc);
        assert_eq!(scan.statements, 4);

        let prefixed: Vec<_> = scan
            .references
            .iter()
            .filter_map(|r| match r {
                Reference::Prefixed(p) => Some(p.as_str()),
                Reference::Iri(_) => None,
            })
            .collect();
        assert_eq!(prefixed, vec!["ex", "rdfs", "rdfs", "ex", "ex", "xsd"]);
    }

    #[test]
    fn test_truncated_directives() {
        let scan = scan("ex:s ex:p ex:o .\n@prefix");
        assert_eq!(scan.statements, 1);
        assert!(scan.prefixes.is_empty());

        assert_eq!(statements("PREFIX   \n"), 0);
        assert_eq!(statements("@prefix ex:"), 0);
        assert_eq!(statements("@base"), 0);
        assert_eq!(statements("ex:s ex:p \"x\"^^"), 1);
    }

    #[test]
    fn test_blank_node_labels_not_counted_as_usage() {
        let scan = scan("_:b1 ex:p _:b2 .");
        assert_eq!(scan.statements, 1);
        assert_eq!(scan.references, vec![Reference::Prefixed("ex".into())]);
    }
}
