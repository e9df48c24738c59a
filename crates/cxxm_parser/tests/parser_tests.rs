//! Parser integration tests.
//!
//! Drives whole translation units through [`ParseSession`] and checks the
//! model the actions build, the references they resolve and the state the
//! stacks are left in.

use cxxm_core::intern::StringInterner;
use cxxm_lexer::{Scanner, TokenStream};
use cxxm_model::{ClassKind, Declaration, FileContent, Friend, FunctionKind, Reference, Statement};
use cxxm_options::ParserOptions;
use cxxm_parser::{IdentifierKind, LeftoverFrames, NamePart, ParseSession, TokenCursor};

/// Helper: parse `source` as `test.cpp` with the given options.
fn parse_with(options: ParserOptions, source: &str) -> ParseSession {
    let mut session = ParseSession::new(options, StringInterner::new());
    session.parse_source("test.cpp", source);
    session
}

fn parse(source: &str) -> ParseSession {
    parse_with(ParserOptions::default(), source)
}

fn content(session: &ParseSession) -> &FileContent {
    let id = session.store().lookup_file("test.cpp").expect("main file registered");
    session.store().file(id).expect("main file content")
}

fn reference<'a>(session: &'a ParseSession, name: &str) -> &'a Reference {
    content(session)
        .references
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no reference to {name}"))
}

/// Helper: the stacks must be idle once a translation unit is done.
fn assert_idle(session: &ParseSession) {
    assert_eq!(session.builder_depth(), 0);
    assert_eq!(session.symtab().depth(), 1);
    assert_eq!(session.inclusion_depth(), 1);
}

fn assert_clean(session: &ParseSession) {
    assert!(
        session.recognition_errors().is_empty(),
        "{:?}",
        session.recognition_errors()
    );
    assert_eq!(session.leftover_frames(), LeftoverFrames::default());
    assert_idle(session);
}

// ============================================================================
// Deferred member bodies
// ============================================================================

const LATER_MEMBER: &str = "class A { int f() { return g(); } int g() { return 1; } };";

#[test]
fn test_deferred_body_sees_later_members() {
    let session = parse(LATER_MEMBER);
    assert_clean(&session);
    assert!(reference(&session, "g").resolved);
}

#[test]
fn test_inline_body_does_not_see_later_members() {
    let session = parse_with(ParserOptions::inline_bodies(), LATER_MEMBER);
    assert_clean(&session);
    assert!(!reference(&session, "g").resolved);
}

#[test]
fn test_deferred_members_keep_declaration_order() {
    let session = parse(LATER_MEMBER);
    let Some(Declaration::Class(class)) = content(&session).declarations.first() else {
        panic!("expected a class");
    };
    let names: Vec<&str> = class.members.iter().map(|m| m.declaration.name()).collect();
    assert_eq!(names, ["f", "g"]);
    assert!(class.members.iter().all(|m| match &m.declaration {
        Declaration::Function(f) => f.body.is_some(),
        _ => false,
    }));
}

// ============================================================================
// Namespaces
// ============================================================================

#[test]
fn test_nested_namespace_with_same_name() {
    let session = parse("namespace N { namespace N { int a; } } int z = N::N::a;");
    assert_clean(&session);
    assert!(session.store().namespace("N").is_some());
    assert!(session.store().namespace("N::N").is_some_and(|ns| ns.has_member("a")));
    assert!(content(&session).references.iter().all(|r| r.resolved));
}

#[test]
fn test_reopened_namespace_merges() {
    let session = parse("namespace M { int x; } namespace M { int y; } int z = M::x + M::y;");
    assert_clean(&session);
    let namespace = session.store().namespace("M").expect("namespace M");
    assert_eq!(namespace.definitions.len(), 2);
    assert!(namespace.has_member("x"));
    assert!(namespace.has_member("y"));
    assert!(content(&session).references.iter().all(|r| r.resolved));
}

#[test]
fn test_using_forms_and_aliases() {
    let session = parse(
        "namespace L { int v; }
         using namespace L;
         using L::v;
         namespace Q = L;
         typedef unsigned long size;
         using Ptr = int*;
         size s;",
    );
    assert_clean(&session);
    let kinds: Vec<_> = content(&session)
        .declarations
        .iter()
        .map(|d| d.kind().to_string())
        .collect();
    assert_eq!(
        kinds,
        [
            "namespace",
            "using directive",
            "using declaration",
            "namespace alias",
            "typedef",
            "typedef",
            "variable"
        ]
    );
}

#[test]
fn test_using_declaration_enters_a_type_name() {
    let session = parse("using std::string; namespace L { int v; } using L::v;");
    assert_clean(&session);
    let interner = session.interner();
    assert!(session.symtab().is_type(interner.intern("string")));
    assert!(session.symtab().is_type(interner.intern("v")));
}

#[test]
fn test_name_from_using_declaration_starts_a_declaration() {
    let session = parse("void f() { using std::string; string(s); s = 1; }");
    assert_clean(&session);
    let Some(Declaration::Function(function)) = content(&session).declarations.first() else {
        panic!("expected a function");
    };
    let Some(Statement::Compound { statements, .. }) = &function.body else {
        panic!("expected a body");
    };
    assert_eq!(statements.len(), 3);
    let Statement::Declaration { declarations, .. } = &statements[1] else {
        panic!("expected a declaration of s, got {:?}", statements[1]);
    };
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].name(), "s");
    let uses: Vec<&Reference> = content(&session).references.iter().filter(|r| r.name == "s").collect();
    assert_eq!(uses.len(), 1);
    assert!(uses[0].resolved);
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_constructors_and_destructors() {
    let session = parse(
        "class A { public: A(); ~A(); int v; };
         A::A() : v(1) {}
         A::~A() {}",
    );
    assert_clean(&session);
    let declarations = &content(&session).declarations;
    let Declaration::Class(class) = &declarations[0] else {
        panic!("expected a class");
    };
    let kinds: Vec<_> = class
        .members
        .iter()
        .filter_map(|m| match &m.declaration {
            Declaration::Function(f) => Some(f.function_kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, [FunctionKind::Constructor, FunctionKind::Destructor]);

    let out_of_line: Vec<_> = declarations[1..]
        .iter()
        .filter_map(|d| match d {
            Declaration::Function(f) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(out_of_line.len(), 2);
    assert_eq!(out_of_line[0].function_kind, FunctionKind::Constructor);
    assert_eq!(out_of_line[0].initializers.len(), 1);
    assert!(out_of_line[0].body.is_some());
    assert_eq!(out_of_line[1].function_kind, FunctionKind::Destructor);
}

#[test]
fn test_member_initializer_resolves_in_class_scope() {
    let session = parse("class A { A(); int v; }; A::A() : v(1) {}");
    assert_clean(&session);
    assert!(reference(&session, "v").resolved);
}

#[test]
fn test_friends_and_bitfields() {
    let session = parse(
        "class F { friend class G; friend void h(); unsigned flags : 3; int : 0; };",
    );
    assert_clean(&session);
    let Some(Declaration::Class(class)) = content(&session).declarations.first() else {
        panic!("expected a class");
    };
    assert_eq!(class.class_kind, ClassKind::Class);
    assert_eq!(class.friends.len(), 2);
    assert!(matches!(&class.friends[0], Friend::Class { name, .. } if name == "G"));
    assert!(matches!(&class.friends[1], Friend::Function(f) if f.function_kind == FunctionKind::Friend));
    match class.member("flags").map(|m| &m.declaration) {
        Some(Declaration::Variable(v)) => assert!(v.bit_width.is_some()),
        other => panic!("expected a bitfield, got {other:?}"),
    }
}

#[test]
fn test_base_members_are_visible_in_derived_bodies() {
    let session = parse("struct Base { int m; }; struct D : Base { int f() { return m; } };");
    assert_clean(&session);
    assert!(reference(&session, "m").resolved);
}

#[test]
fn test_class_template_and_specialization() {
    let session = parse(
        "template <typename T> class Box { T value; };
         template <> class Box<int> { int value; };
         Box<int> b;",
    );
    assert_clean(&session);
    let declarations = &content(&session).declarations;
    assert_eq!(declarations.len(), 3);
    let Declaration::Class(primary) = &declarations[0] else {
        panic!("expected the primary template");
    };
    assert!(primary.template.as_ref().is_some_and(|t| t.parameters.len() == 1));
    let Declaration::Class(special) = &declarations[1] else {
        panic!("expected the specialization");
    };
    assert_eq!(special.specialization, ["int"]);
    assert!(special.template.as_ref().is_some_and(|t| t.specialization));
    assert!(matches!(&declarations[2], Declaration::Variable(v) if v.name == "b"));
}

// ============================================================================
// Enumerations
// ============================================================================

#[test]
fn test_unscoped_enumerators_are_injected() {
    let session = parse(
        "enum Color { Red, Green = 2 };
         enum class Mode { On };
         int c = Green;
         int d = Mode::On;
         int e = On;",
    );
    assert!(reference(&session, "Green").resolved);
    assert!(content(&session).references.iter().any(|r| r.name.ends_with("On") && r.resolved));
    assert!(!reference(&session, "On").resolved);
    assert_idle(&session);
}

// ============================================================================
// Errors and recovery
// ============================================================================

#[test]
fn test_case_at_namespace_scope_is_a_hard_error() {
    let session = parse("case 1: ; int a;");
    assert_eq!(session.recognition_errors().len(), 1);
    assert!(session.recognition_errors()[0].hard);
    assert!(content(&session)
        .declarations
        .iter()
        .any(|d| matches!(d, Declaration::Variable(v) if v.name == "a")));
    assert_idle(&session);
}

#[test]
fn test_stacks_are_balanced_after_malformed_input() {
    let session = parse("class B { int f( ; }; int z;");
    assert!(!session.recognition_errors().is_empty());
    assert!(session.store().error_count() > 0);
    assert_idle(&session);
    assert!(content(&session)
        .declarations
        .iter()
        .any(|d| matches!(d, Declaration::Variable(v) if v.name == "z")));
}

#[test]
fn test_deep_nesting_is_cut_off() {
    let options = ParserOptions {
        max_recursion_depth: 8,
        ..ParserOptions::default()
    };
    let source = format!("int x = {}1{};", "(".repeat(20), ")".repeat(20));
    let session = parse_with(options, &source);
    assert!(!session.recognition_errors().is_empty());
    assert_idle(&session);
}

// ============================================================================
// Inclusions
// ============================================================================

#[test]
fn test_included_declarations_land_in_the_included_file() {
    let interner = StringInterner::new();
    let main = Scanner::new("#include \"h.h\"\nint a; int b = H::k;", interner.clone()).tokenize();
    let header = Scanner::new("struct H { static const int k = 1; };", interner.clone()).tokenize();
    assert_eq!(main.includes.len(), 1);

    let mut stream = TokenStream::from_tokens(main.tokens);
    stream.splice_include(
        main.includes[0].position,
        main.includes[0].path.clone(),
        TokenStream::from_tokens(header.tokens),
    );
    let mut session = ParseSession::new(ParserOptions::default(), interner);
    let main_id = session.parse_translation_unit("main.cpp", stream);
    assert_clean(&session);

    let store = session.store();
    let header_id = store.lookup_file("h.h").expect("header registered");
    let header = store.file(header_id).expect("header content");
    assert_eq!(header.declarations.len(), 1);
    assert_eq!(header.declarations[0].name(), "H");

    let main = store.file(main_id).expect("main content");
    assert_eq!(main.includes, [header_id]);
    let names: Vec<&str> = main.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, ["a", "b"]);
    assert!(main.references.iter().all(|r| r.resolved));
}

// ============================================================================
// Generated nesting
// ============================================================================

/// Helper: a deterministic generator of well-nested namespaces, classes,
/// functions and blocks. Every name it declares is numbered apart.
struct SourceGenerator {
    state: u64,
    serial: u32,
}

impl SourceGenerator {
    fn new(seed: u64) -> Self {
        Self { state: seed | 1, serial: 0 }
    }

    fn pick(&mut self, n: u64) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state % n
    }

    fn serial(&mut self) -> u32 {
        self.serial += 1;
        self.serial
    }

    fn repeat(&mut self, depth: u32, item: fn(&mut Self, u32) -> String) -> String {
        let count = 1 + self.pick(3);
        (0..count).map(|_| item(self, depth)).collect::<Vec<_>>().join(" ")
    }

    fn namespace_member(&mut self, depth: u32) -> String {
        let k = self.serial();
        let choice = if depth == 0 { 3 + self.pick(3) } else { self.pick(6) };
        match choice {
            0 => {
                let members = self.repeat(depth - 1, Self::namespace_member);
                format!("namespace N{k} {{ {members} }}")
            }
            1 => {
                let members = self.repeat(depth - 1, Self::class_member);
                format!("struct S{k} {{ {members} }};")
            }
            2 => {
                let body = self.repeat(depth - 1, Self::statement);
                format!("int f{k}(int p{k}) {{ {body} }}")
            }
            3 => format!("enum E{k} {{ A{k}, B{k} }};"),
            4 => format!("template <typename T{k}> class C{k} {{ T{k} value; T{k} get() {{ return value; }} }};"),
            _ => format!("int v{k} = {k};"),
        }
    }

    fn class_member(&mut self, depth: u32) -> String {
        let k = self.serial();
        let choice = if depth == 0 { 2 + self.pick(3) } else { self.pick(5) };
        match choice {
            0 => {
                let members = self.repeat(depth - 1, Self::class_member);
                format!("struct In{k} {{ {members} }};")
            }
            1 => {
                let body = self.repeat(depth - 1, Self::statement);
                format!("int g{k}(int a{k}) {{ {body} }}")
            }
            2 => format!("int m{k};"),
            3 => "private:".to_string(),
            _ => format!("static int h{k}(int x, int y);"),
        }
    }

    fn statement(&mut self, depth: u32) -> String {
        let k = self.serial();
        let choice = if depth == 0 { 4 + self.pick(3) } else { self.pick(7) };
        match choice {
            0 => {
                let body = self.repeat(depth - 1, Self::statement);
                format!("{{ {body} }}")
            }
            1 => {
                let then_branch = self.repeat(depth - 1, Self::statement);
                let else_branch = self.repeat(depth - 1, Self::statement);
                format!("if (1) {{ {then_branch} }} else {{ {else_branch} }}")
            }
            2 => {
                let body = self.repeat(depth - 1, Self::statement);
                format!("while (0) {{ {body} }}")
            }
            3 => {
                let body = self.repeat(depth - 1, Self::statement);
                format!("for (int i{k} = 0; i{k} < 3; ++i{k}) {{ {body} }}")
            }
            4 => format!("int l{k} = {k};"),
            5 => format!("switch ({k}) {{ case 1: break; default: break; }}"),
            _ => format!("return {k};"),
        }
    }
}

fn assert_balanced(source: &str) {
    let session = parse(source);
    assert!(
        session.recognition_errors().is_empty(),
        "{source}\n{:?}",
        session.recognition_errors()
    );
    assert_eq!(session.leftover_frames(), LeftoverFrames::default(), "{source}");
    assert_idle(&session);
}

#[test]
fn test_generated_declarations_leave_no_frames_open() {
    let mut generator = SourceGenerator::new(0x9e37_79b9_7f4a_7c15);
    let mut unit = Vec::new();
    for _ in 0..64 {
        let construct = generator.namespace_member(3);
        assert_balanced(&construct);
        assert_balanced(&format!("namespace W {{ {construct} }}"));
        unit.push(construct);
    }
    assert_balanced(&unit.join("\n"));
}

#[test]
fn test_generated_members_and_blocks_leave_no_frames_open() {
    let mut generator = SourceGenerator::new(0x2545_f491_4f6c_dd1d);
    for _ in 0..64 {
        let members = generator.repeat(3, SourceGenerator::class_member);
        assert_balanced(&format!("class Holder {{ {members} }};"));
        let body = generator.repeat(3, SourceGenerator::statement);
        assert_balanced(&format!("int run(int n) {{ {body} }}"));
    }
}

// ============================================================================
// Speculative queries
// ============================================================================

const KNOWN_TYPES: &str = "namespace A { struct B { typedef int T; }; template <class U> struct V { U u; }; } struct K { };";

const QUERY_TOKENS: &str = "::A::B::T x; A::V<int> v; K* k; ::K k2; A:: ; :: ; unknown u; A::V<int ; T t; V<K> w; K::";

/// Helper: check that every query at every position of every prefix of
/// `QUERY_TOKENS` leaves the cursor and the scope stack as it found them.
/// Returns how often each query answered yes.
fn assert_queries_are_pure(session: &mut ParseSession) -> [usize; 3] {
    let interner = session.interner().clone();
    let tokens = Scanner::new(QUERY_TOKENS, interner.clone()).tokenize().tokens;
    let mut answers = [0; 3];
    for end in 0..=tokens.len() {
        for start in 0..=end {
            let mut cursor = TokenCursor::from_tokens(tokens[..end].to_vec(), &interner);
            for _ in 0..start {
                cursor.consume();
            }
            let before = (cursor.index(), session.symtab().depth(), session.builder_depth());

            let present = session.type_specifier_already_present(&mut cursor);
            assert_eq!(before, (cursor.index(), session.symtab().depth(), session.builder_depth()));
            let token = cursor.lt(1);
            let is_type = session.identifier_is(IdentifierKind::Type, token, &mut cursor);
            assert_eq!(before, (cursor.index(), session.symtab().depth(), session.builder_depth()));
            let is_template = session.identifier_is(IdentifierKind::Template, token, &mut cursor);
            assert_eq!(before, (cursor.index(), session.symtab().depth(), session.builder_depth()));

            for (count, answer) in answers.iter_mut().zip([present, is_type, is_template]) {
                *count += usize::from(answer);
            }
        }
    }
    answers
}

fn query_cursor(session: &ParseSession, text: &str) -> TokenCursor {
    let interner = session.interner().clone();
    let tokens = Scanner::new(text, interner.clone()).tokenize().tokens;
    TokenCursor::from_tokens(tokens, &interner)
}

#[test]
fn test_queries_resolve_known_and_qualified_names() {
    let mut session = parse(KNOWN_TYPES);
    assert_clean(&session);

    let mut cursor = query_cursor(&session, "::A::B::T x;");
    assert!(session.type_specifier_already_present(&mut cursor));
    let mut cursor = query_cursor(&session, "A::V<int> v;");
    assert!(session.type_specifier_already_present(&mut cursor));
    let mut cursor = query_cursor(&session, "A::B::x y;");
    assert!(!session.type_specifier_already_present(&mut cursor));

    let mut cursor = query_cursor(&session, "K k;");
    let token = cursor.lt(1);
    assert!(session.identifier_is(IdentifierKind::Type, token, &mut cursor));
    assert!(!session.identifier_is(IdentifierKind::Template, token, &mut cursor));
    let mut cursor = query_cursor(&session, "V<int> v;");
    let token = cursor.lt(1);
    assert!(!session.identifier_is(IdentifierKind::Template, token, &mut cursor));
    assert_eq!(cursor.index(), 0);
    assert_eq!(session.symtab().depth(), 1);
}

#[test]
fn test_queries_see_the_scopes_of_a_qualifier_being_built() {
    let mut session = parse(KNOWN_TYPES);
    let prefix = query_cursor(&session, "A :: B ::");
    session.nested_name(prefix.lt(1)).unwrap();
    session.name_part(NamePart::Identifier, prefix.lt(1)).unwrap();
    session.name_part(NamePart::Scope, prefix.lt(2)).unwrap();

    let mut cursor = query_cursor(&session, "V<int> v;");
    let token = cursor.lt(1);
    assert!(session.identifier_is(IdentifierKind::Template, token, &mut cursor));

    session.name_part(NamePart::Identifier, prefix.lt(3)).unwrap();
    session.name_part(NamePart::Scope, prefix.lt(4)).unwrap();
    let mut cursor = query_cursor(&session, "T t;");
    let token = cursor.lt(1);
    assert!(session.identifier_is(IdentifierKind::Type, token, &mut cursor));
    assert!(session.starts_type_name(&mut cursor));
    assert_eq!(session.symtab().depth(), 1);

    session.end_nested_name(prefix.lt(4)).unwrap();
    assert_eq!(session.builder_depth(), 0);
}

#[test]
fn test_queries_are_pure_over_every_token_prefix() {
    let mut session = parse(KNOWN_TYPES);
    let [present, is_type, is_template] = assert_queries_are_pure(&mut session);
    assert!(present > 0);
    assert!(is_type > 0);
    assert_eq!(is_template, 0);

    // Again with `A::` on the builder stack, so `V` and `B` resolve.
    let prefix = query_cursor(&session, "A ::");
    session.nested_name(prefix.lt(1)).unwrap();
    session.name_part(NamePart::Identifier, prefix.lt(1)).unwrap();
    session.name_part(NamePart::Scope, prefix.lt(2)).unwrap();
    let [present, is_type, is_template] = assert_queries_are_pure(&mut session);
    assert!(present > 0);
    assert!(is_type > 0);
    assert!(is_template > 0);
    session.end_nested_name(prefix.lt(2)).unwrap();
    assert_idle(&session);
}
