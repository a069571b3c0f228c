//! Drives the library the way a front end would: build a unit, desugar annotations,
//! optimize, and hand the result on as JSON.

use std::fs;
use treefold::build_system::build::{
    InputUnit, optimize_units, output_path, read_unit_files, write_unit_file,
};
use treefold::compiler_frontend::annotations::annotation_stack::AnnotationEntry;
use treefold::compiler_frontend::ast::ast_nodes::{
    AstNode, FunctionBody, Literal, MultipleMode, NodeKind, Operator, TextLocation,
};
use treefold::compiler_frontend::ast::node_ref::NodeRef;
use treefold::compiler_frontend::ast::scopes::ScopeId;
use treefold::compiler_frontend::compiler_warnings::WarningKind;
use treefold::compiler_frontend::string_interning::StringTable;
use treefold::{CancellationToken, Compilation, CompilationUnit, Config, ErrorType};

fn at(line: u32, kind: NodeKind) -> NodeRef {
    NodeRef::new(AstNode::new(
        kind,
        TextLocation::new_just_line(line),
        ScopeId::ROOT,
    ))
}

fn symbol(strings: &mut StringTable, line: u32, name: &str) -> NodeRef {
    at(line, NodeKind::Symbol(strings.intern(name)))
}

fn call(line: u32, callee: NodeRef, args: Vec<NodeRef>) -> NodeRef {
    let location = TextLocation::new_just_line(line);
    let args = NodeRef::new(AstNode::tuple(args, location, ScopeId::ROOT));
    NodeRef::new(AstNode::call(callee, args, location, ScopeId::ROOT))
}

fn int(line: u32, value: i64) -> NodeRef {
    NodeRef::new(AstNode::constant(
        Literal::Int(value),
        TextLocation::new_just_line(line),
        ScopeId::ROOT,
    ))
}

fn callee_name<'a>(node: &NodeRef, strings: &'a StringTable) -> &'a str {
    match &node.kind {
        NodeKind::Operator {
            op: Operator::Call,
            lhs,
            ..
        } => match lhs.kind {
            NodeKind::Symbol(name) => strings.resolve(name),
            _ => panic!("callee is not a symbol"),
        },
        other => panic!("expected a call, found {:?}", other.tag()),
    }
}

fn call_args(node: &NodeRef) -> &[NodeRef] {
    match &node.kind {
        NodeKind::Operator {
            op: Operator::Call,
            rhs: Some(args),
            ..
        } => match &args.kind {
            NodeKind::Multiple { items, .. } => items,
            _ => panic!("arguments are not a tuple"),
        },
        other => panic!("expected a call, found {:?}", other.tag()),
    }
}

fn statements(node: &NodeRef) -> &[NodeRef] {
    match &node.kind {
        NodeKind::Multiple { items, .. } => items,
        other => panic!("expected a block, found {:?}", other.tag()),
    }
}

// @memoize
// @trace(3)
// fib = fn() { 1; 2 }
// if bool(1) { fib() }
fn decorated_program(compilation: &mut Compilation) -> NodeRef {
    let strings = &mut compilation.unit.strings;
    let memoize = symbol(strings, 1, "memoize");
    let trace = symbol(strings, 2, "trace");
    let trace_call = call(2, trace, vec![int(2, 3)]);
    let fib_name = strings.intern("fib");
    let target = symbol(strings, 3, "fib");
    let callee = symbol(strings, 4, "fib");

    compilation
        .push_annotation(AnnotationEntry::new(memoize))
        .expect("push");
    compilation
        .push_annotation(AnnotationEntry::new(trace_call))
        .expect("push");
    compilation.append_documentation("Fibonacci numbers");
    compilation
        .record_compiler_tag("pure", TextLocation::new_just_line(3))
        .expect("tag");
    assert_eq!(compilation.pending_annotations(), 2);

    let function = at(
        3,
        NodeKind::Function(Box::new(FunctionBody {
            name: Some(fib_name),
            params: Vec::new(),
            body: at(
                3,
                NodeKind::Multiple {
                    items: vec![int(3, 1), int(3, 2)],
                    mode: MultipleMode::Block,
                },
            ),
        })),
    );
    let decorated = compilation.apply_annotations(function).expect("desugar");
    assert_eq!(compilation.pending_annotations(), 0);

    let definition = at(
        3,
        NodeKind::Operator {
            op: Operator::Assign,
            lhs: target,
            rhs: Some(decorated),
        },
    );
    let condition = at(
        4,
        NodeKind::Bool {
            inner: int(4, 1),
            negate: false,
        },
    );
    let branch = at(
        4,
        NodeKind::Conditional {
            condition,
            then_branch: call(4, callee, Vec::new()),
            else_branch: None,
        },
    );

    NodeRef::new(AstNode::block(
        vec![definition, branch],
        TextLocation::new_just_line(1),
        ScopeId::ROOT,
    ))
}

#[test]
fn decorated_definitions_are_desugared_and_optimized() {
    let mut compilation = Compilation::new(CompilationUnit::new("fib"), Config::default());
    let program = decorated_program(&mut compilation);
    compilation.unit.root = program;

    let report = compilation.optimize_all(false).expect("optimize");
    assert!(report.passes >= 2);
    assert!(!report.interrupted);
    assert!(compilation.warnings().is_empty());

    let strings = &compilation.unit.strings;
    let root = &compilation.unit.root;
    let body = statements(root);
    assert_eq!(body.len(), 2);

    // fib = memoize(trace(fn, 3))
    let NodeKind::Operator {
        op: Operator::Assign,
        rhs: Some(value),
        ..
    } = &body[0].kind
    else {
        panic!("expected the definition first");
    };
    assert_eq!(callee_name(value, strings), "memoize");
    let traced = &call_args(value)[0];
    assert_eq!(callee_name(traced, strings), "trace");
    assert!(matches!(call_args(traced)[0].kind, NodeKind::Function(_)));

    // The condition is always true, so only the call is left
    assert_eq!(callee_name(&body[1], strings), "fib");
}

#[test]
fn unused_annotations_are_reported_when_optimizing() {
    let mut compilation = Compilation::new(CompilationUnit::new("dangling"), Config::default());
    let decorator = symbol(&mut compilation.unit.strings, 1, "cached");
    compilation
        .push_annotation(AnnotationEntry::new(decorator))
        .expect("push");

    compilation.optimize_all(true).expect("optimize");

    let warnings = compilation.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].warning_kind, WarningKind::UnusedAnnotation);
    assert!(warnings[0].msg.contains("@cached"));
}

#[test]
fn fatal_unused_annotations_fail_the_compilation() {
    let config = Config::from_toml_str("[warnings]\nfatal = [\"unused_annotation\"]\n")
        .expect("config");
    let mut compilation = Compilation::new(CompilationUnit::new("dangling"), config);
    let decorator = symbol(&mut compilation.unit.strings, 1, "cached");
    compilation
        .push_annotation(AnnotationEntry::new(decorator))
        .expect("push");

    let error = compilation.optimize_all(true).expect_err("fatal warning");
    assert_eq!(error.error_type, ErrorType::Diagnostic);

    let (_, messages) = compilation.into_parts(Some(error));
    assert!(messages.has_errors());
    assert!(messages.warnings.is_empty());
}

#[test]
fn a_cancelled_compilation_is_interrupted() {
    let cancel = CancellationToken::new();
    let mut compilation = Compilation::new(CompilationUnit::new("stopped"), Config::default())
        .with_cancellation(cancel.clone());

    compilation.cancellation_token().cancel();
    assert!(cancel.is_cancelled());

    let error = compilation.optimize_all(true).expect_err("cancelled");
    assert_eq!(error.error_type, ErrorType::Interrupted);
    assert!(compilation.last_report().interrupted);
}

#[test]
fn units_are_optimized_from_and_written_back_to_json() {
    let dir = tempfile::tempdir().expect("temp dir");
    let source_path = dir.path().join("fib.json");

    let mut compilation = Compilation::new(CompilationUnit::new("fib"), Config::default());
    let program = decorated_program(&mut compilation);
    compilation.unit.root = program;
    compilation.finish_declaration().expect("declaration");
    let (unit, _) = compilation.into_parts(None);
    write_unit_file(&unit, &source_path).expect("write source unit");

    let units = read_unit_files(&[source_path.clone()]).unwrap_or_else(|messages| {
        panic!("reading failed with {} errors", messages.errors.len())
    });
    let outcomes = optimize_units(units, &Config::default(), &CancellationToken::new());
    assert_eq!(outcomes.len(), 1);

    let outcome = &outcomes[0];
    assert!(!outcome.messages.has_errors());
    assert!(outcome.report.is_some());

    let out_dir = dir.path().join("out");
    let destination = output_path(&outcome.source_path, Some(out_dir.as_path()));
    write_unit_file(&outcome.unit, &destination).expect("write optimized unit");

    let written = fs::read_to_string(&destination).expect("optimized unit on disk");
    let reloaded = CompilationUnit::from_json(&written, &destination).expect("valid json");
    assert_eq!(reloaded.name, "fib");
    assert_eq!(statements(&reloaded.root).len(), 2);
    assert_eq!(callee_name(&statements(&reloaded.root)[1], &reloaded.strings), "fib");
}

#[test]
fn independent_units_do_not_share_state() {
    let cancel = CancellationToken::new();
    let inputs = (0..8)
        .map(|index| {
            let mut unit = CompilationUnit::new(format!("unit_{index}"));
            let drop_x = at(1, NodeKind::Unbind(unit.strings.intern("x")));
            let read = symbol(&mut unit.strings, 2, "x");
            unit.root = NodeRef::new(AstNode::block(
                vec![drop_x, read],
                TextLocation::new_just_line(1),
                ScopeId::ROOT,
            ));

            InputUnit {
                source_path: format!("unit_{index}.json").into(),
                unit,
            }
        })
        .collect();

    let outcomes = optimize_units(inputs, &Config::default(), &cancel);

    for outcome in &outcomes {
        assert_eq!(outcome.messages.warnings.len(), 1);
        assert_eq!(
            outcome.messages.warnings[0].warning_kind,
            WarningKind::UnboundSymbolRead
        );
    }
}
