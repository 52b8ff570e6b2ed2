//! Backward-compatibility and identity predicates over parsed schemas

use crate::parser::{parse, DeclKind, Declaration, Member, ParsedSchema};
use tracing::debug;
use verifier_model::{SchemaComparator, SchemaDocument};

/// Whether clients written against `old` keep working against `new`.
///
/// Every declaration of `old` must survive in `new` with the same kind, and
/// every member must keep its exact type. Additions are allowed unless they
/// impose a new requirement on callers (required arguments, required input
/// fields).
pub fn is_backward_compatible(old: &ParsedSchema, new: &ParsedSchema) -> bool {
    old.decls.iter().all(|(name, old_decl)| {
        new.decls
            .get(name)
            .is_some_and(|new_decl| decl_compatible(old_decl, new_decl))
    })
}

fn decl_compatible(old: &Declaration, new: &Declaration) -> bool {
    if old.kind != new.kind {
        return false;
    }
    if !old.variants.is_subset(&new.variants) || !old.implements.is_subset(&new.implements) {
        return false;
    }

    let kept = old.members.iter().all(|(name, old_member)| {
        new.members
            .get(name)
            .is_some_and(|new_member| member_compatible(old_member, new_member))
    });

    let additions_ok = old.kind != DeclKind::Input
        || new
            .members
            .iter()
            .filter(|(name, _)| !old.members.contains_key(*name))
            .all(|(_, m)| is_optional(&m.ty, m.default.as_ref()));

    kept && additions_ok
}

fn member_compatible(old: &Member, new: &Member) -> bool {
    old.ty == new.ty
        && old
            .args
            .iter()
            .all(|(name, arg)| new.args.get(name).is_some_and(|n| n.ty == arg.ty))
        && new
            .args
            .iter()
            .filter(|(name, _)| !old.args.contains_key(*name))
            .all(|(_, arg)| is_optional(&arg.ty, arg.default.as_ref()))
}

fn is_optional(ty: &str, default: Option<&String>) -> bool {
    !ty.ends_with('!') || default.is_some()
}

/// [`SchemaComparator`] over GraphQL-style SDL documents.
///
/// Documents that fail to parse satisfy neither predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdlComparator;

impl SdlComparator {
    pub fn new() -> Self {
        Self
    }

    fn parse_pair(&self, a: &SchemaDocument, b: &SchemaDocument) -> Option<(ParsedSchema, ParsedSchema)> {
        let parsed_a = parse(&a.text)
            .map_err(|e| debug!(location = %a.location, error = %e, "Schema parse failed"))
            .ok()?;
        let parsed_b = parse(&b.text)
            .map_err(|e| debug!(location = %b.location, error = %e, "Schema parse failed"))
            .ok()?;
        Some((parsed_a, parsed_b))
    }
}

impl SchemaComparator for SdlComparator {
    fn is_backward_compatible(&self, old: &SchemaDocument, new: &SchemaDocument) -> bool {
        self.parse_pair(old, new)
            .is_some_and(|(old, new)| is_backward_compatible(&old, &new))
    }

    fn is_functionally_identical(&self, a: &SchemaDocument, b: &SchemaDocument) -> bool {
        self.parse_pair(a, b).is_some_and(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verifier_model::PackageLocation;

    fn doc(text: &str) -> SchemaDocument {
        SchemaDocument::new(PackageLocation::new("QmTest").unwrap(), text)
    }

    fn compatible(old: &str, new: &str) -> bool {
        SdlComparator.is_backward_compatible(&doc(old), &doc(new))
    }

    #[test]
    fn test_added_field_is_compatible() {
        assert!(compatible("{a:Int}", "{a:Int, b:String}"));
    }

    #[test]
    fn test_removed_field_is_incompatible() {
        assert!(!compatible("{a:Int}", "{b:String}"));
    }

    #[test]
    fn test_changed_type_is_incompatible() {
        assert!(!compatible("type T { a: Int }", "type T { a: Int! }"));
        assert!(!compatible("type T { a: Int }", "interface T { a: Int }"));
    }

    #[test]
    fn test_removed_declaration_is_incompatible() {
        assert!(!compatible("type A { x: Int } type B { y: Int }", "type A { x: Int }"));
        assert!(compatible("type A { x: Int }", "type A { x: Int } type B { y: Int }"));
    }

    #[test]
    fn test_arguments() {
        let old = "type Module { get(id: ID!): String }";
        assert!(compatible(old, "type Module { get(id: ID!, verbose: Boolean): String }"));
        assert!(compatible(old, "type Module { get(id: ID!, limit: Int! = 5): String }"));
        assert!(!compatible(old, "type Module { get(id: ID!, limit: Int!): String }"));
        assert!(!compatible(old, "type Module { get(id: String!): String }"));
        assert!(!compatible(old, "type Module { get: String }"));
    }

    #[test]
    fn test_input_additions_must_be_optional() {
        let old = "input Args { a: Int! }";
        assert!(compatible(old, "input Args { a: Int! b: String }"));
        assert!(!compatible(old, "input Args { a: Int! b: String! }"));
    }

    #[test]
    fn test_enum_and_union_may_only_grow() {
        assert!(compatible("enum E { A B }", "enum E { A B C }"));
        assert!(!compatible("enum E { A B }", "enum E { A }"));
        assert!(compatible("union U = X", "union U = X | Y"));
        assert!(!compatible("union U = X | Y", "union U = X"));
    }

    #[test]
    fn test_identity_ignores_formatting() {
        let a = doc("type Object {\n  \"\"\"\n  comment\n  \"\"\"\n  prop1: Int!\n}\n");
        let b = doc("type Object { prop1: Int! }");
        assert!(SdlComparator.is_functionally_identical(&a, &b));

        let c = doc("type Object { prop1: Int! prop2: Int }");
        assert!(!SdlComparator.is_functionally_identical(&a, &c));
    }

    #[test]
    fn test_unparsable_documents_never_pass() {
        let good = doc("{a:Int}");
        let bad = doc("type {");
        assert!(!SdlComparator.is_backward_compatible(&good, &bad));
        assert!(!SdlComparator.is_backward_compatible(&bad, &good));
        assert!(!SdlComparator.is_functionally_identical(&bad, &bad));
    }

    #[test]
    fn test_pathologically_nested_schema_is_rejected() {
        // Default test-thread stack: must fail the predicates, not the process
        let outcome = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let depth = 100_000;
                let hostile = format!("{{a: {}Int{}}}", "[".repeat(depth), "]".repeat(depth));
                (
                    compatible("{a: Int}", &hostile),
                    compatible(&hostile, "{a: Int}"),
                    SdlComparator.is_functionally_identical(&doc(&hostile), &doc(&hostile)),
                )
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(outcome, (false, false, false));
    }
}
