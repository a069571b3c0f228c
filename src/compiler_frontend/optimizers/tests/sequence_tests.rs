use super::Fixture;
use crate::compiler_frontend::ast::ast_nodes::{ActionKind, MultipleMode, NodeKind, Operator};
use crate::compiler_frontend::ast::scopes::{ScopeId, ScopeKind};
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::test_support::*;
use crate::projects::settings::WarningPolicy;

#[test]
fn an_unused_tuple_becomes_a_block_of_its_effects() {
    let mut fixture = Fixture::new();
    let f = effect(&mut fixture.strings, "f");
    let g = effect(&mut fixture.strings, "g");

    let result = fixture.optimize(tuple(vec![f, int(1), g]), false);

    assert!(matches!(
        result.kind,
        NodeKind::Multiple {
            mode: MultipleMode::Block,
            ..
        }
    ));
    let statements = items(&result);
    assert_eq!(statements.len(), 2);
    assert_eq!(symbol_name(call_parts(&statements[0]).0, &fixture.strings), "f");
    assert_eq!(symbol_name(call_parts(&statements[1]).0, &fixture.strings), "g");
}

#[test]
fn a_used_tuple_keeps_every_element() {
    let mut fixture = Fixture::new();

    let result = fixture.optimize(tuple(vec![int(1), int(2)]), true);

    assert!(result.is_tuple());
    assert_eq!(items(&result).len(), 2);
}

#[test]
fn nested_blocks_in_the_same_scope_are_spliced() {
    let mut fixture = Fixture::new();
    let f = effect(&mut fixture.strings, "f");
    let g = effect(&mut fixture.strings, "g");
    let h = effect(&mut fixture.strings, "h");

    let result = fixture.optimize(block(vec![f, block(vec![g, h]), int(3)]), true);

    let statements = items(&result);
    assert_eq!(statements.len(), 4);
    assert_eq!(symbol_name(call_parts(&statements[1]).0, &fixture.strings), "g");
    assert_eq!(int_value(&statements[3]), 3);
}

#[test]
fn nested_blocks_in_their_own_scope_are_kept() {
    let mut fixture = Fixture::new();
    let inner_scope = fixture.scopes.push_scope(ScopeId::ROOT, ScopeKind::Block);
    let f = effect(&mut fixture.strings, "f");
    let g = effect(&mut fixture.strings, "g");
    let h = effect(&mut fixture.strings, "h");

    let inner = in_scope(block(vec![g, h]), inner_scope);
    let result = fixture.optimize(block(vec![f, inner, int(3)]), true);

    let statements = items(&result);
    assert_eq!(statements.len(), 3);
    assert_eq!(items(&statements[1]).len(), 2);
}

#[test]
fn pure_statements_are_dropped_but_the_value_is_kept() {
    let mut fixture = Fixture::new();
    let set_a = assign(&mut fixture.strings, "a", int(1));
    let a = sym(&mut fixture.strings, "a");
    let f = effect(&mut fixture.strings, "f");

    let result = fixture.optimize(block(vec![set_a, int(1), a, f, int(2)]), true);

    let statements = items(&result);
    assert_eq!(statements.len(), 3);
    assert!(call_parts(&statements[1]).1.is_empty());
    assert_eq!(int_value(&statements[2]), 2);
}

#[test]
fn reads_of_symbols_that_may_be_unbound_are_kept() {
    let mut fixture = Fixture::new();
    let a = sym(&mut fixture.strings, "a");
    let del_b = unbind(&mut fixture.strings, "b");
    let b = sym(&mut fixture.strings, "b");

    let result = fixture.optimize(block(vec![a, del_b, b, int(2)]), true);

    let statements = items(&result);
    assert_eq!(statements.len(), 4);
    assert_eq!(symbol_name(&statements[0], &fixture.strings), "a");
    assert_eq!(symbol_name(&statements[2], &fixture.strings), "b");
    assert_eq!(fixture.warning_kinds(), vec![WarningKind::UnboundSymbolRead]);
}

#[test]
fn operators_that_may_fail_are_kept() {
    let mut fixture = Fixture::new();
    let a = sym(&mut fixture.strings, "a");

    let divide = binary(Operator::Divide, int(1), int(0));
    let negate = unary(Operator::Negate, string("text"));
    let sum = binary(Operator::Add, a, int(1));
    let result = fixture.optimize(block(vec![divide, negate, sum, int(5)]), true);

    let statements = items(&result);
    assert_eq!(statements.len(), 4);
    assert!(matches!(
        statements[0].kind,
        NodeKind::Operator {
            op: Operator::Divide,
            ..
        }
    ));
    assert_eq!(int_value(&statements[3]), 5);
}

#[test]
fn operators_that_fold_are_dropped() {
    let mut fixture = Fixture::new();

    let result = fixture.optimize(block(vec![binary(Operator::Divide, int(6), int(3)), int(5)]), true);

    assert_eq!(int_value(&result), 5);
}

#[test]
fn blocks_with_one_or_no_statements_collapse() {
    let mut fixture = Fixture::new();
    let f = effect(&mut fixture.strings, "f");

    let single = fixture.optimize(block(vec![f]), true);
    assert_eq!(symbol_name(call_parts(&single).0, &fixture.strings), "f");

    let empty = fixture.optimize(block(Vec::new()), true);
    assert!(empty.is_no_value());
}

#[test]
fn statements_after_a_return_are_dropped_up_to_the_next_label() {
    let mut fixture = Fixture::new();
    let f = effect(&mut fixture.strings, "f");
    let g = at_line(effect(&mut fixture.strings, "g"), 3);
    let h = effect(&mut fixture.strings, "h");

    let program = block(vec![f, ret(Some(int(1))), g, label(0, true, None), h]);
    let result = fixture.optimize(program, false);

    let statements = items(&result);
    assert_eq!(statements.len(), 4);
    assert!(matches!(statements[1].kind, NodeKind::Return(_)));
    assert!(matches!(statements[2].kind, NodeKind::Label { .. }));
    assert_eq!(symbol_name(call_parts(&statements[3]).0, &fixture.strings), "h");

    let warnings = fixture.diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].warning_kind, WarningKind::UnreachableCode);
    assert_eq!(warnings[0].location.line, 3);
}

#[test]
fn statements_after_a_break_are_dropped() {
    let mut fixture = Fixture::new();
    let f = effect(&mut fixture.strings, "f");
    let g = effect(&mut fixture.strings, "g");

    let result = fixture.optimize(block(vec![f, action(ActionKind::Break, None), g]), false);

    let statements = items(&result);
    assert_eq!(statements.len(), 2);
    assert!(matches!(
        statements[1].kind,
        NodeKind::Action {
            action: ActionKind::Break,
            ..
        }
    ));
    assert_eq!(fixture.warning_kinds(), vec![WarningKind::UnreachableCode]);
}

#[test]
fn pass_does_not_end_the_block() {
    let mut fixture = Fixture::new();
    let g = effect(&mut fixture.strings, "g");

    let result = fixture.optimize(block(vec![action(ActionKind::Pass, None), g]), false);

    assert_eq!(items(&result).len(), 2);
    assert!(fixture.warning_kinds().is_empty());
}

#[test]
fn fatal_unreachable_code_stops_the_optimizer() {
    let mut fixture = Fixture::with_policy(WarningPolicy {
        fatal: vec![WarningKind::UnreachableCode],
        ..WarningPolicy::default()
    });
    let g = effect(&mut fixture.strings, "g");

    let error = fixture
        .run(block(vec![throw(None), g]), false)
        .expect_err("fatal warning");

    assert_eq!(error.error_type, ErrorType::Diagnostic);
}

#[test]
fn disabled_warnings_are_not_recorded() {
    let mut fixture = Fixture::with_policy(WarningPolicy {
        disabled: vec![WarningKind::UnreachableCode],
        ..WarningPolicy::default()
    });
    let g = effect(&mut fixture.strings, "g");

    let result = fixture.optimize(block(vec![throw(None), g]), false);

    assert!(matches!(result.kind, NodeKind::Throw(None)));
    assert!(fixture.warning_kinds().is_empty());
}
