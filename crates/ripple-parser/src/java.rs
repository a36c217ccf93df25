//! Line-oriented Java structural extractor.
//!
//! Recovers packages, type declarations, annotations, injected fields and
//! method spans from Java source with a handful of anchored regexes and a
//! brace counter. It does not attempt full parsing; ambiguous constructs
//! fall out as missing edges rather than wrong ones, and the impact engine
//! treats missing data conservatively.

use regex::Regex;
use ripple_core::{DescriptorKind, EntityDescriptor, Marker, MethodDescriptor, SourceParser};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::ParserError;

static PACKAGE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*package\s+([\w.]+)\s*;").unwrap());

static IMPORT_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*import\s+(?:static\s+)?([\w.]+)\s*;").unwrap());

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|protected|private|abstract|final|static|strictfp)\s+)*(class|interface|enum|record)\s+(\w+)(?:<[^>]*>)?(?:\s+extends\s+([\w.\s,<>]+?))?(?:\s+implements\s+([\w.\s,<>]+?))?\s*(?:\{|$)",
    )
    .unwrap()
});

/// One leading annotation, optionally with a single-line argument list.
static ANNOTATION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*@([\w.]+)(?:\([^)]*\))?\s*").unwrap());

static FIELD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:private|protected|public|final|static|transient|volatile)\s+)*([A-Z][\w.]*)(?:<[^>]*>)?\s+(\w+)\s*[;=]")
        .unwrap()
});

static METHOD_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|protected|private|abstract|final|static|synchronized|native|default)\s+)*(?:<[^>]*>\s*)?([\w.<>\[\], ?]+?)\s+(\w+)\s*\(",
    )
    .unwrap()
});

static QUALIFIED_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s*\.\s*(\w+)\s*\(").unwrap());

static BARE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w.@])(\w+)\s*\(").unwrap());

const RESERVED: &[&str] = &[
    "if", "else", "for", "while", "switch", "catch", "return", "new", "throw", "do", "try",
    "assert", "synchronized", "super",
];

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "abstract", "final", "static", "synchronized", "native",
    "default", "strictfp",
];

const INJECTION_ANNOTATIONS: &[&str] = &["Autowired", "Inject", "Resource"];

/// Regex-driven parser for `.java` sources.
#[derive(Debug, Default)]
pub struct JavaParser;

impl JavaParser {
    pub fn new() -> Self {
        Self
    }

    /// Fallible variant of [`SourceParser::parse_file`].
    pub fn try_parse_file(&self, path: &Path) -> Result<Vec<EntityDescriptor>, ParserError> {
        let text = fs::read_to_string(path).map_err(|source| ParserError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(parse_source(&text))
    }
}

impl SourceParser for JavaParser {
    fn handles(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "java")
    }

    fn parse_file(&self, path: &Path) -> Vec<EntityDescriptor> {
        match self.try_parse_file(path) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable source file");
                Vec::new()
            }
        }
    }
}

/// Extracts every top-level type declared in `text`.
pub fn parse_source(text: &str) -> Vec<EntityDescriptor> {
    Extractor::default().run(text)
}

#[derive(Default)]
struct Extractor {
    package: String,
    /// Simple name to fully qualified name, from import statements.
    imports: HashMap<String, String>,
    /// Field name to qualified field type, for call-receiver resolution.
    field_types: HashMap<String, String>,
    pending_annotations: Vec<String>,
    done: Vec<EntityDescriptor>,
    current: Option<TypeCtx>,
    in_block_comment: bool,
}

struct TypeCtx {
    descriptor: EntityDescriptor,
    simple_name: String,
    /// Brace depth of the type body; members sit at exactly this depth.
    body_depth: i32,
    method: Option<MethodCtx>,
}

struct MethodCtx {
    descriptor: MethodDescriptor,
    /// Signature seen but the body brace (or `;`) has not arrived yet.
    awaiting_body: bool,
}

impl Extractor {
    fn run(mut self, text: &str) -> Vec<EntityDescriptor> {
        let mut depth = 0_i32;
        for (idx, raw) in text.lines().enumerate() {
            let line_no = (idx + 1) as i32;
            let code = self.strip_comments(raw);
            if code.trim().is_empty() {
                continue;
            }
            self.visit_line(&code, line_no, depth);
            depth += brace_delta(&code);
            self.close_scopes(line_no, depth);
        }
        // Unbalanced braces at EOF still flush whatever was open.
        if let Some(mut ctx) = self.current.take() {
            if let Some(method) = ctx.method.take() {
                ctx.descriptor.methods.push(method.descriptor);
            }
            self.done.push(ctx.descriptor);
        }
        self.done
    }

    fn visit_line(&mut self, code: &str, line_no: i32, depth: i32) {
        if self.step_active_method(code, line_no) {
            return;
        }

        if self.current.is_none() {
            if let Some(caps) = PACKAGE_DECL.captures(code) {
                self.package = caps[1].to_string();
                return;
            }
            if let Some(caps) = IMPORT_DECL.captures(code) {
                let qualified = caps[1].to_string();
                if let Some(simple) = qualified.rsplit('.').next() {
                    if simple != "*" {
                        self.imports.insert(simple.to_string(), qualified);
                    }
                }
                return;
            }
        }

        // Peel leading annotations; a declaration may follow on the same
        // line.
        let mut code = code;
        while let Some(caps) = ANNOTATION_PREFIX.captures(code) {
            self.pending_annotations.push(caps[1].to_string());
            let end = caps.get(0).map_or(0, |m| m.end());
            code = &code[end..];
        }
        if code.trim().is_empty() {
            return;
        }

        if self.current.is_none() {
            if let Some(caps) = TYPE_DECL.captures(code) {
                self.open_type(&caps, line_no, depth);
            }
            return;
        }

        let body_depth = self
            .current
            .as_ref()
            .map(|ctx| ctx.body_depth)
            .unwrap_or_default();
        if depth != body_depth {
            // Nested type bodies and initializer blocks are out of scope.
            self.pending_annotations.clear();
            return;
        }

        if let Some(caps) = METHOD_DECL.captures(code) {
            let return_type = caps[1].trim().to_string();
            let name = caps[2].to_string();
            let constructor = self
                .current
                .as_ref()
                .is_some_and(|ctx| ctx.simple_name == name);
            if !constructor
                && !RESERVED.contains(&name.as_str())
                && !RESERVED.contains(&return_type.as_str())
                && !MODIFIERS.contains(&return_type.as_str())
            {
                self.open_method(name, code, line_no);
                return;
            }
        }

        if let Some(caps) = FIELD_DECL.captures(code) {
            let field_type = self.qualify(&caps[1]);
            let field_name = caps[2].to_string();
            let injected = self
                .pending_annotations
                .iter()
                .any(|a| INJECTION_ANNOTATIONS.contains(&simple_name(a)));
            if injected {
                if let Some(ctx) = self.current.as_mut() {
                    ctx.descriptor.injected_types.push(field_type.clone());
                }
            }
            self.field_types.insert(field_name, field_type);
            self.pending_annotations.clear();
            return;
        }

        self.pending_annotations.clear();
    }

    /// Advances an in-progress method, collecting call names from its body.
    /// Returns true when the line belonged to that method.
    fn step_active_method(&mut self, code: &str, line_no: i32) -> bool {
        let Some(ctx) = self.current.as_mut() else {
            return false;
        };
        let Some(method) = ctx.method.as_mut() else {
            return false;
        };
        if method.awaiting_body {
            // Multi-line signature: keep scanning until the body opens or
            // the declaration turns out to be abstract.
            if code.contains('{') {
                method.awaiting_body = false;
            } else if code.contains(';') {
                if let Some(mut done) = ctx.method.take() {
                    done.descriptor.end_line = line_no;
                    ctx.descriptor.methods.push(done.descriptor);
                }
            }
            return true;
        }
        collect_calls(code, &self.imports, &self.field_types, &mut method.descriptor);
        true
    }

    fn open_type(&mut self, caps: &regex::Captures<'_>, line_no: i32, depth: i32) {
        let keyword = &caps[1];
        let simple = caps[2].to_string();
        let qualified = if self.package.is_empty() {
            simple.clone()
        } else {
            format!("{}.{}", self.package, simple)
        };
        let kind = if keyword == "interface" {
            DescriptorKind::Interface
        } else {
            DescriptorKind::Class
        };
        let markers = Marker::from_annotations(self.pending_annotations.drain(..));
        let mut supertypes = Vec::new();
        for group in [caps.get(3), caps.get(4)].into_iter().flatten() {
            for name in group.as_str().split(',') {
                let name = strip_generics(name.trim());
                if !name.is_empty() {
                    supertypes.push(self.qualify(name));
                }
            }
        }
        debug!(entity = %qualified, line = line_no, "found type declaration");
        self.current = Some(TypeCtx {
            descriptor: EntityDescriptor {
                name: qualified,
                kind,
                markers,
                supertypes,
                injected_types: Vec::new(),
                methods: Vec::new(),
            },
            simple_name: simple,
            body_depth: depth + 1,
            method: None,
        });
    }

    fn open_method(&mut self, name: String, code: &str, line_no: i32) {
        let markers = Marker::from_annotations(self.pending_annotations.drain(..));
        let Some(ctx) = self.current.as_mut() else {
            return;
        };
        let mut descriptor = MethodDescriptor {
            name,
            class_name: ctx.descriptor.name.clone(),
            called_names: Vec::new(),
            markers,
            start_line: line_no,
            end_line: line_no,
        };
        if !code.contains('{') && after_params(code).contains(';') {
            // Abstract or interface method: a declaration with no body.
            ctx.descriptor.methods.push(descriptor);
            return;
        }
        collect_calls(
            after_params(code),
            &self.imports,
            &self.field_types,
            &mut descriptor,
        );
        ctx.method = Some(MethodCtx {
            descriptor,
            awaiting_body: !code.contains('{'),
        });
    }

    /// Closes any method or type whose body brace was balanced by this line.
    fn close_scopes(&mut self, line_no: i32, depth_after: i32) {
        let Some(ctx) = self.current.as_mut() else {
            return;
        };
        let body_closed = ctx
            .method
            .as_ref()
            .is_some_and(|m| !m.awaiting_body && depth_after <= ctx.body_depth);
        if body_closed {
            if let Some(mut done) = ctx.method.take() {
                done.descriptor.end_line = line_no;
                ctx.descriptor.methods.push(done.descriptor);
            }
        }
        if depth_after < ctx.body_depth {
            if let Some(mut ctx) = self.current.take() {
                if let Some(method) = ctx.method.take() {
                    ctx.descriptor.methods.push(method.descriptor);
                }
                self.done.push(ctx.descriptor);
            }
        }
    }

    fn qualify(&self, simple: &str) -> String {
        if simple.contains('.') {
            return simple.to_string();
        }
        self.imports
            .get(simple)
            .cloned()
            .unwrap_or_else(|| simple.to_string())
    }

    /// Removes line and block comments, tracking open block comments across
    /// lines. String literals containing comment markers will confuse this,
    /// which at worst drops a call edge.
    fn strip_comments(&mut self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        loop {
            if self.in_block_comment {
                match rest.find("*/") {
                    Some(end) => {
                        self.in_block_comment = false;
                        rest = &rest[end + 2..];
                    }
                    None => return out,
                }
                continue;
            }
            let line_at = rest.find("//");
            let block_at = rest.find("/*");
            match (line_at, block_at) {
                (Some(l), Some(b)) if l < b => {
                    out.push_str(&rest[..l]);
                    return out;
                }
                (Some(l), None) => {
                    out.push_str(&rest[..l]);
                    return out;
                }
                (_, Some(b)) => {
                    out.push_str(&rest[..b]);
                    self.in_block_comment = true;
                    rest = &rest[b + 2..];
                }
                (None, None) => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

fn brace_delta(code: &str) -> i32 {
    let mut delta = 0;
    for c in code.chars() {
        match c {
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(at) => name[..at].trim_end(),
        None => name,
    }
}

fn simple_name(annotation: &str) -> &str {
    annotation.rsplit('.').next().unwrap_or(annotation)
}

/// The part of a declaration line after its parameter list, used to keep
/// parameter types out of the call scan and to spot abstract declarations.
fn after_params(code: &str) -> &str {
    match code.rfind(')') {
        Some(at) => &code[at + 1..],
        None => "",
    }
}

/// Records call names found in `code` onto `method`.
///
/// Qualified calls resolve the receiver through the field-type and import
/// maps, producing fully qualified `pkg.Type.method` names the graph can
/// match exactly. Unresolvable receivers fall back to the bare method name
/// and bare calls are treated as calls on the enclosing class.
fn collect_calls(
    code: &str,
    imports: &HashMap<String, String>,
    field_types: &HashMap<String, String>,
    method: &mut MethodDescriptor,
) {
    let mut qualified_spans: Vec<(usize, usize)> = Vec::new();
    for caps in QUALIFIED_CALL.captures_iter(code) {
        let receiver = &caps[1];
        let callee = &caps[2];
        if RESERVED.contains(&callee) {
            continue;
        }
        if let Some(whole) = caps.get(0) {
            qualified_spans.push((whole.start(), whole.end()));
        }
        let name = if receiver == "this" {
            format!("{}.{}", method.class_name, callee)
        } else if let Some(field_type) = field_types.get(receiver) {
            format!("{field_type}.{callee}")
        } else if let Some(import) = imports.get(receiver) {
            format!("{import}.{callee}")
        } else {
            callee.to_string()
        };
        push_call(method, name);
    }
    for caps in BARE_CALL.captures_iter(code) {
        let Some(m) = caps.get(1) else { continue };
        if qualified_spans
            .iter()
            .any(|&(start, end)| m.start() >= start && m.end() <= end)
        {
            continue;
        }
        let callee = m.as_str();
        if RESERVED.contains(&callee) {
            continue;
        }
        // A bare call inside a method body is a call on `this`.
        push_call(method, format!("{}.{}", method.class_name, callee));
    }
}

fn push_call(method: &mut MethodDescriptor, name: String) {
    if name != format!("{}.{}", method.class_name, method.name)
        && !method.called_names.contains(&name)
    {
        method.called_names.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = r#"
package shop;

import shop.data.OrderRepository;
import org.springframework.stereotype.Service;

@Service
public class OrderService {

    @Autowired
    private OrderRepository repository;

    @Transactional
    public Order place(Order order) {
        validate(order);
        return repository.save(order);
    }

    private void validate(Order order) {
        // no-op for now
    }
}
"#;

    #[test]
    fn extracts_class_and_methods() {
        let descriptors = parse_source(SERVICE);
        assert_eq!(descriptors.len(), 1);
        let class = &descriptors[0];
        assert_eq!(class.name, "shop.OrderService");
        assert_eq!(class.kind, DescriptorKind::Class);
        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["place", "validate"]);
    }

    #[test]
    fn annotations_become_markers() {
        let descriptors = parse_source(SERVICE);
        let place = &descriptors[0].methods[0];
        assert!(place.markers.contains(&Marker::Transactional));
    }

    #[test]
    fn injected_fields_are_qualified_through_imports() {
        let descriptors = parse_source(SERVICE);
        assert_eq!(
            descriptors[0].injected_types,
            vec!["shop.data.OrderRepository".to_string()]
        );
    }

    #[test]
    fn calls_resolve_through_field_types() {
        let descriptors = parse_source(SERVICE);
        let place = &descriptors[0].methods[0];
        assert!(place
            .called_names
            .contains(&"shop.data.OrderRepository.save".to_string()));
        assert!(place
            .called_names
            .contains(&"shop.OrderService.validate".to_string()));
    }

    #[test]
    fn method_spans_cover_declaration_to_closing_brace() {
        let descriptors = parse_source(SERVICE);
        let place = &descriptors[0].methods[0];
        assert!(place.start_line < place.end_line);
        let validate = &descriptors[0].methods[1];
        assert!(validate.start_line > place.end_line);
    }

    #[test]
    fn interfaces_and_supertypes() {
        let src = r#"
package shop;

import shop.audit.Auditable;

public interface OrderStore extends Auditable {
    Order save(Order order);
}
"#;
        let descriptors = parse_source(src);
        assert_eq!(descriptors.len(), 1);
        let iface = &descriptors[0];
        assert_eq!(iface.kind, DescriptorKind::Interface);
        assert_eq!(iface.supertypes, vec!["shop.audit.Auditable".to_string()]);
        assert_eq!(iface.methods.len(), 1);
        assert_eq!(iface.methods[0].name, "save");
    }

    #[test]
    fn constructors_are_not_methods() {
        let src = r#"
package shop;

public class Plain {
    public Plain(int seed) {
        this.seed = seed;
    }

    public int seed() {
        return seed;
    }
}
"#;
        let descriptors = parse_source(src);
        let names: Vec<&str> = descriptors[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["seed"]);
    }

    #[test]
    fn comments_do_not_produce_calls() {
        let src = r#"
package shop;

public class Quiet {
    public void run() {
        /* helper.dispatch(); */
        // other.call();
        real();
    }

    private void real() {
    }
}
"#;
        let descriptors = parse_source(src);
        let run = &descriptors[0].methods[0];
        assert_eq!(run.called_names, vec!["shop.Quiet.real".to_string()]);
    }

    #[test]
    fn missing_package_uses_simple_name() {
        let src = "public class Standalone {\n}\n";
        let descriptors = parse_source(src);
        assert_eq!(descriptors[0].name, "Standalone");
    }

    #[test]
    fn handles_only_java_files() {
        let parser = JavaParser::new();
        assert!(parser.handles(Path::new("src/Order.java")));
        assert!(!parser.handles(Path::new("src/order.rs")));
    }

    #[test]
    fn unreadable_file_degrades_to_empty() {
        let parser = JavaParser::new();
        let out = parser.parse_file(Path::new("/definitely/not/here/Order.java"));
        assert!(out.is_empty());
    }
}
