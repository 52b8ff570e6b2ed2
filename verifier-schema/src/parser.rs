//! Normalized schema model and the SDL parser that builds it.
//!
//! Normalization discards everything with no observable effect on the
//! interface: ordering, whitespace, comments and descriptions.

use crate::lexer::{tokenize, Token};
use crate::SchemaError;
use std::collections::{BTreeMap, BTreeSet};

/// Deepest list nesting accepted in a type reference.
pub const MAX_TYPE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Type,
    Interface,
    Input,
    Enum,
    Scalar,
    Union,
    Schema,
    Directive,
    /// Bare `{ field: Type }` document with no enclosing definition.
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSig {
    pub ty: String,
    pub default: Option<String>,
}

/// A field, input field or enum value. Enum values have an empty `ty`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    pub args: BTreeMap<String, ArgSig>,
    pub ty: String,
    pub default: Option<String>,
    pub directives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclKind,
    pub members: BTreeMap<String, Member>,
    pub implements: BTreeSet<String>,
    /// Union member types, or directive locations.
    pub variants: BTreeSet<String>,
    pub directives: Vec<String>,
}

impl Declaration {
    fn new(kind: DeclKind) -> Self {
        Self {
            kind,
            members: BTreeMap::new(),
            implements: BTreeSet::new(),
            variants: BTreeSet::new(),
            directives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSchema {
    pub decls: BTreeMap<String, Declaration>,
}

impl ParsedSchema {
    fn add(&mut self, name: String, decl: Declaration, extend: bool) -> Result<(), SchemaError> {
        match self.decls.get_mut(&name) {
            Some(existing) if extend && existing.kind == decl.kind => {
                for (member_name, member) in decl.members {
                    if existing.members.insert(member_name.clone(), member).is_some() {
                        return Err(SchemaError::Duplicate(format!("{}.{}", name, member_name)));
                    }
                }
                existing.implements.extend(decl.implements);
                existing.variants.extend(decl.variants);
                existing.directives.extend(decl.directives);
                Ok(())
            }
            Some(_) => Err(SchemaError::Duplicate(name)),
            None => {
                self.decls.insert(name, decl);
                Ok(())
            }
        }
    }
}

/// Parse SDL text into its normalized form.
pub fn parse(src: &str) -> Result<ParsedSchema, SchemaError> {
    let tokens = tokenize(src)?;
    Parser { tokens, pos: 0 }.document()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, SchemaError> {
        let tok = self.tokens.get(self.pos).cloned().ok_or(SchemaError::UnexpectedEof(expected))?;
        self.pos += 1;
        Ok(tok)
    }

    fn peek_punct(&self, c: char) -> bool {
        matches!(self.peek(), Some(Token::Punct(p)) if *p == c)
    }

    fn peek_name(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == name)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char, expected: &'static str) -> Result<(), SchemaError> {
        match self.next(expected)? {
            Token::Punct(p) if p == c => Ok(()),
            other => Err(SchemaError::Unexpected { found: other.to_string(), expected }),
        }
    }

    fn expect_name(&mut self, expected: &'static str) -> Result<String, SchemaError> {
        match self.next(expected)? {
            Token::Name(n) => Ok(n),
            other => Err(SchemaError::Unexpected { found: other.to_string(), expected }),
        }
    }

    fn skip_descriptions(&mut self) {
        while matches!(self.peek(), Some(Token::Str(_))) {
            self.pos += 1;
        }
    }

    fn document(mut self) -> Result<ParsedSchema, SchemaError> {
        let mut schema = ParsedSchema::default();
        self.skip_descriptions();

        if self.peek_punct('{') {
            let mut decl = Declaration::new(DeclKind::Anonymous);
            decl.members = self.fields_block()?;
            schema.add(String::new(), decl, false)?;
            self.skip_descriptions();
            if let Some(tok) = self.peek() {
                return Err(SchemaError::Unexpected { found: tok.to_string(), expected: "end of document" });
            }
            return Ok(schema);
        }

        loop {
            self.skip_descriptions();
            if self.peek().is_none() {
                break;
            }
            let mut keyword = self.expect_name("definition keyword")?;
            let extend = keyword == "extend";
            if extend {
                keyword = self.expect_name("definition keyword")?;
            }
            let (name, decl) = self.definition(&keyword)?;
            schema.add(name, decl, extend)?;
        }

        Ok(schema)
    }

    fn definition(&mut self, keyword: &str) -> Result<(String, Declaration), SchemaError> {
        match keyword {
            "type" | "interface" | "input" => {
                let kind = match keyword {
                    "type" => DeclKind::Type,
                    "interface" => DeclKind::Interface,
                    _ => DeclKind::Input,
                };
                let name = self.expect_name("type name")?;
                let mut decl = Declaration::new(kind);
                decl.implements = self.implements()?;
                decl.directives = self.directives()?;
                if self.peek_punct('{') {
                    decl.members = self.fields_block()?;
                }
                Ok((name, decl))
            }
            "enum" => {
                let name = self.expect_name("enum name")?;
                let mut decl = Declaration::new(DeclKind::Enum);
                decl.directives = self.directives()?;
                if self.eat_punct('{') {
                    loop {
                        self.skip_descriptions();
                        if self.eat_punct('}') {
                            break;
                        }
                        let value = self.expect_name("enum value")?;
                        let member = Member { directives: self.directives()?, ..Member::default() };
                        if decl.members.insert(value.clone(), member).is_some() {
                            return Err(SchemaError::Duplicate(format!("{}.{}", name, value)));
                        }
                    }
                }
                Ok((name, decl))
            }
            "scalar" => {
                let name = self.expect_name("scalar name")?;
                let mut decl = Declaration::new(DeclKind::Scalar);
                decl.directives = self.directives()?;
                Ok((name, decl))
            }
            "union" => {
                let name = self.expect_name("union name")?;
                let mut decl = Declaration::new(DeclKind::Union);
                decl.directives = self.directives()?;
                if self.eat_punct('=') {
                    self.eat_punct('|');
                    decl.variants.insert(self.expect_name("union member")?);
                    while self.eat_punct('|') {
                        decl.variants.insert(self.expect_name("union member")?);
                    }
                }
                Ok((name, decl))
            }
            "schema" => {
                let mut decl = Declaration::new(DeclKind::Schema);
                decl.directives = self.directives()?;
                decl.members = self.fields_block()?;
                Ok(("schema".to_string(), decl))
            }
            "directive" => {
                self.expect_punct('@', "'@'")?;
                let name = format!("@{}", self.expect_name("directive name")?);
                let mut decl = Declaration::new(DeclKind::Directive);
                if self.peek_punct('(') {
                    let args = self.arguments()?;
                    decl.members.insert(
                        String::new(),
                        Member { args, ..Member::default() },
                    );
                }
                if self.peek_name("repeatable") {
                    self.pos += 1;
                    decl.directives.push("repeatable".to_string());
                }
                match self.expect_name("'on'")? {
                    n if n == "on" => {}
                    n => return Err(SchemaError::Unexpected { found: format!("'{}'", n), expected: "'on'" }),
                }
                self.eat_punct('|');
                decl.variants.insert(self.expect_name("directive location")?);
                while self.eat_punct('|') {
                    decl.variants.insert(self.expect_name("directive location")?);
                }
                Ok((name, decl))
            }
            other => Err(SchemaError::Unexpected {
                found: format!("'{}'", other),
                expected: "definition keyword",
            }),
        }
    }

    fn implements(&mut self) -> Result<BTreeSet<String>, SchemaError> {
        let mut names = BTreeSet::new();
        if self.peek_name("implements") {
            self.pos += 1;
            self.eat_punct('&');
            names.insert(self.expect_name("interface name")?);
            while self.eat_punct('&') {
                names.insert(self.expect_name("interface name")?);
            }
        }
        Ok(names)
    }

    fn directives(&mut self) -> Result<Vec<String>, SchemaError> {
        let mut out = Vec::new();
        while self.eat_punct('@') {
            let name = self.expect_name("directive name")?;
            if self.peek_punct('(') {
                let args = self.balanced('(', ')')?;
                out.push(format!("@{}{}", name, args));
            } else {
                out.push(format!("@{}", name));
            }
        }
        Ok(out)
    }

    fn fields_block(&mut self) -> Result<BTreeMap<String, Member>, SchemaError> {
        self.expect_punct('{', "'{'")?;
        let mut members = BTreeMap::new();
        loop {
            self.skip_descriptions();
            if self.eat_punct('}') {
                break;
            }
            let name = self.expect_name("field name")?;
            let args = if self.peek_punct('(') { self.arguments()? } else { BTreeMap::new() };
            self.expect_punct(':', "':'")?;
            let ty = self.type_ref()?;
            let default = if self.eat_punct('=') { Some(self.value()?) } else { None };
            let directives = self.directives()?;
            let member = Member { args, ty, default, directives };
            if members.insert(name.clone(), member).is_some() {
                return Err(SchemaError::Duplicate(name));
            }
        }
        Ok(members)
    }

    fn arguments(&mut self) -> Result<BTreeMap<String, ArgSig>, SchemaError> {
        self.expect_punct('(', "'('")?;
        let mut args = BTreeMap::new();
        loop {
            self.skip_descriptions();
            if self.eat_punct(')') {
                break;
            }
            let name = self.expect_name("argument name")?;
            self.expect_punct(':', "':'")?;
            let ty = self.type_ref()?;
            let default = if self.eat_punct('=') { Some(self.value()?) } else { None };
            // Argument directives do not change the call signature
            self.directives()?;
            if args.insert(name.clone(), ArgSig { ty, default }).is_some() {
                return Err(SchemaError::Duplicate(name));
            }
        }
        Ok(args)
    }

    /// `Name`, `Name!`, `[T]`, `[T!]!` and so on. Iterative, with a depth budget.
    fn type_ref(&mut self) -> Result<String, SchemaError> {
        let mut depth = 0;
        while self.eat_punct('[') {
            depth += 1;
            if depth > MAX_TYPE_DEPTH {
                return Err(SchemaError::TooDeep(MAX_TYPE_DEPTH));
            }
        }
        let mut ty = self.expect_name("type name")?;
        if self.eat_punct('!') {
            ty.push('!');
        }
        for _ in 0..depth {
            self.expect_punct(']', "']'")?;
            ty = format!("[{}]", ty);
            if self.eat_punct('!') {
                ty.push('!');
            }
        }
        Ok(ty)
    }

    fn value(&mut self) -> Result<String, SchemaError> {
        if self.peek_punct('[') {
            return self.balanced('[', ']');
        }
        if self.peek_punct('{') {
            return self.balanced('{', '}');
        }
        match self.next("value")? {
            Token::Name(n) => Ok(n),
            Token::Str(s) => Ok(format!("\"{}\"", s)),
            other => Err(SchemaError::Unexpected { found: other.to_string(), expected: "value" }),
        }
    }

    /// Captures a bracketed token run verbatim (normalized spacing).
    fn balanced(&mut self, open: char, close: char) -> Result<String, SchemaError> {
        self.expect_punct(open, "opening bracket")?;
        let mut depth = 1usize;
        let mut parts = vec![open.to_string()];
        while depth > 0 {
            let tok = self.next("closing bracket")?;
            match &tok {
                Token::Punct(c) if *c == open => depth += 1,
                Token::Punct(c) if *c == close => depth -= 1,
                _ => {}
            }
            parts.push(match tok {
                Token::Name(n) => n,
                Token::Punct(c) => c.to_string(),
                Token::Str(s) => format!("\"{}\"", s),
            });
        }
        Ok(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_document() {
        let schema = parse("{a:Int, b:String}").unwrap();
        let decl = &schema.decls[""];
        assert_eq!(decl.kind, DeclKind::Anonymous);
        assert_eq!(decl.members["a"].ty, "Int");
        assert_eq!(decl.members["b"].ty, "String");
    }

    #[test]
    fn test_module_with_arguments_and_descriptions() {
        let src = r#"
            #import { Module } into Ipfs from "w3://ens/ipfs.web3api.eth"
            """
            The module
            """
            type Module implements Base & Other @imported(uri: "x") {
              "fetch a thing"
              get(id: ID!, limit: Int = 10): [Item!]!
              ping: Boolean
            }
        "#;
        let schema = parse(src).unwrap();
        let module = &schema.decls["Module"];
        assert_eq!(module.kind, DeclKind::Type);
        assert_eq!(module.implements.len(), 2);
        assert_eq!(module.directives, vec!["@imported( uri : \"x\" )".to_string()]);

        let get = &module.members["get"];
        assert_eq!(get.ty, "[Item!]!");
        assert_eq!(get.args["id"].ty, "ID!");
        assert_eq!(get.args["limit"].default.as_deref(), Some("10"));
    }

    #[test]
    fn test_enum_union_scalar_directive() {
        let src = r#"
            enum Color { RED GREEN, BLUE }
            union Shape = | Circle | Square
            scalar BigInt
            directive @cached(ttl: Int) repeatable on FIELD_DEFINITION | OBJECT
        "#;
        let schema = parse(src).unwrap();
        assert_eq!(schema.decls["Color"].members.len(), 3);
        assert_eq!(schema.decls["Shape"].variants.len(), 2);
        assert_eq!(schema.decls["BigInt"].kind, DeclKind::Scalar);
        assert_eq!(schema.decls["@cached"].variants.len(), 2);
    }

    #[test]
    fn test_extend_merges_members() {
        let schema = parse("type A { x: Int } extend type A { y: Int }").unwrap();
        assert_eq!(schema.decls["A"].members.len(), 2);
        assert!(matches!(parse("type A { x: Int } type A { y: Int }"), Err(SchemaError::Duplicate(_))));
    }

    #[test]
    fn test_ordering_and_comments_do_not_matter() {
        let a = parse("type T {\n a: Int # first\n b: String\n}").unwrap();
        let b = parse("\"\"\"doc\"\"\" type T { b: String a: Int }").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("type A { x Int }"), Err(SchemaError::Unexpected { .. })));
        assert!(matches!(parse("type A { x: "), Err(SchemaError::UnexpectedEof(_))));
        assert!(matches!(parse("query { x }"), Err(SchemaError::Unexpected { .. })));
        assert!(matches!(parse("{ a: Int } trailing"), Err(SchemaError::Unexpected { .. })));
    }

    #[test]
    fn test_list_types() {
        let schema = parse("type T { a: [[Int!]!]! b: [String] }").unwrap();
        assert_eq!(schema.decls["T"].members["a"].ty, "[[Int!]!]!");
        assert_eq!(schema.decls["T"].members["b"].ty, "[String]");
        assert!(matches!(parse("type T { a: [[Int] }"), Err(SchemaError::Unexpected { .. })));
    }

    #[test]
    fn test_list_nesting_is_bounded() {
        let nested = |depth: usize| format!("{{a: {}Int{}}}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse(&nested(MAX_TYPE_DEPTH)).is_ok());
        assert_eq!(parse(&nested(MAX_TYPE_DEPTH + 1)), Err(SchemaError::TooDeep(MAX_TYPE_DEPTH)));
    }
}
