//! Plain-text outline of a parsed file's declarations.

use cxxm_model::{Declaration, FileContent, Friend, Function, FunctionKind};
use std::fmt::Write;

pub fn render(content: &FileContent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", content.path);
    for declaration in &content.declarations {
        render_declaration(&mut out, declaration, None, 1);
    }
    out
}

fn render_declaration(out: &mut String, declaration: &Declaration, visibility: Option<String>, depth: usize) {
    let indent = "  ".repeat(depth);
    let prefix = visibility.map(|v| format!("{v} ")).unwrap_or_default();
    let _ = match declaration {
        Declaration::Namespace(ns) => writeln!(out, "{indent}{prefix}namespace {}", display_name(&ns.name)),
        Declaration::Class(class) => {
            let template = if class.template.is_some() { "template " } else { "" };
            let arguments = if class.specialization.is_empty() {
                String::new()
            } else {
                format!("<{}>", class.specialization.join(", "))
            };
            let bases = if class.bases.is_empty() {
                String::new()
            } else {
                let names: Vec<&str> = class.bases.iter().map(|b| b.name.as_str()).collect();
                format!(" : {}", names.join(", "))
            };
            writeln!(
                out,
                "{indent}{prefix}{template}{} {}{arguments}{bases}",
                class.class_kind,
                display_name(&class.name)
            )
        }
        Declaration::Enum(e) => {
            let names: Vec<&str> = e.enumerators.iter().map(|n| n.name.as_str()).collect();
            let key = if e.scoped { "enum class" } else { "enum" };
            writeln!(out, "{indent}{prefix}{key} {} {{ {} }}", display_name(&e.name), names.join(", "))
        }
        Declaration::Function(function) => writeln!(out, "{indent}{prefix}{}", function_line(function)),
        Declaration::Variable(v) => {
            let width = if v.bit_width.is_some() { " : bits" } else { "" };
            writeln!(out, "{indent}{prefix}variable {}: {}{width}", v.name, v.ty)
        }
        Declaration::Typedef(t) => writeln!(out, "{indent}{prefix}typedef {} = {}", t.name, t.ty),
        Declaration::ForwardClass(f) => writeln!(out, "{indent}{prefix}{} {};", f.class_kind, f.name),
        Declaration::UsingDirective(u) => writeln!(out, "{indent}{prefix}using namespace {}", u.namespace),
        Declaration::UsingDeclaration(u) => writeln!(out, "{indent}{prefix}using {}", u.name),
        Declaration::NamespaceAlias(a) => writeln!(out, "{indent}{prefix}namespace {} = {}", a.alias, a.target),
    };
    match declaration {
        Declaration::Class(class) => {
            for member in &class.members {
                render_declaration(out, &member.declaration, Some(member.visibility.to_string()), depth + 1);
            }
            for friend in &class.friends {
                let _ = match friend {
                    Friend::Class { name, .. } => writeln!(out, "{indent}  friend class {name}"),
                    Friend::Function(function) => writeln!(out, "{indent}  {}", function_line(function)),
                };
            }
        }
        _ => {
            for child in declaration.children() {
                render_declaration(out, child, None, depth + 1);
            }
        }
    }
}

fn function_line(function: &Function) -> String {
    let kind = match function.function_kind {
        FunctionKind::Function => "function",
        FunctionKind::Method => "method",
        FunctionKind::Constructor => "constructor",
        FunctionKind::Destructor => "destructor",
        FunctionKind::Friend => "friend function",
    };
    let parameters: Vec<String> = function
        .parameters
        .iter()
        .map(|p| match &p.name {
            Some(name) => format!("{name}: {}", p.ty),
            None => p.ty.to_string(),
        })
        .collect();
    let returns = function
        .return_type
        .as_ref()
        .map(|ty| format!(" -> {ty}"))
        .unwrap_or_default();
    let body = if function.body.is_some() { " {...}" } else { "" };
    format!("{kind} {}({}){returns}{body}", function.name, parameters.join(", "))
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "<anonymous>"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxm_core::intern::StringInterner;
    use cxxm_options::ParserOptions;
    use cxxm_parser::ParseSession;

    fn outline(source: &str) -> String {
        let mut session = ParseSession::new(ParserOptions::default(), StringInterner::new());
        let file = session.parse_source("outline.cpp", source);
        render(session.store().file(file).unwrap())
    }

    #[test]
    fn test_outline_nests_members() {
        let text = outline("namespace N { struct S { int f(); private: int x; }; }");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "outline.cpp");
        assert_eq!(lines[1], "  namespace N");
        assert!(lines[2].starts_with("    struct S"));
        assert!(lines[3].starts_with("      public method f("));
        assert!(lines[4].starts_with("      private variable x"));
    }

    #[test]
    fn test_outline_lists_enumerators_and_friends() {
        let text = outline("enum E { A, B }; class C { friend class D; };");
        assert!(text.contains("enum E { A, B }"));
        assert!(text.contains("friend class D"));
    }
}
