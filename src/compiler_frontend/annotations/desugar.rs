use crate::annotation_log;
use crate::compiler_frontend::annotations::annotation_stack::{
    AnnotationEntry, AnnotationList, AnnotationPool,
};
use crate::compiler_frontend::ast::ast_nodes::{
    AstNode, MultipleMode, NodeKind, Operator, TextLocation,
};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::ast::scopes::ScopeId;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::return_compiler_error;

/// Wraps `input` in every annotation of the list, most recently parsed first,
/// so `@a @b E` becomes `a(b(E))`.
///
/// The list's buffer always goes back to the pool, including when an allocation fails part way.
pub fn apply_annotations(
    input: NodeRef,
    mut annotations: AnnotationList,
    pool: &mut AnnotationPool,
) -> Result<NodeRef, CompilerError> {
    let mut result = input;

    while let Some(entry) = annotations.pop() {
        result = match wrap_in_annotation(result, entry) {
            Ok(wrapped) => wrapped,
            Err(error) => {
                annotations.release(pool);
                return Err(error);
            }
        };
    }

    annotations.release(pool);
    Ok(result)
}

fn wrap_in_annotation(input: NodeRef, entry: AnnotationEntry) -> Result<NodeRef, CompilerError> {
    let AnnotationEntry {
        decorator,
        force_plain_call,
    } = entry;

    if force_plain_call || !decorator.is_call() {
        annotation_log!("Plain annotation call at line ", {decorator.location.line});
        return plain_call(decorator, input);
    }

    annotation_log!("Merging annotation into its call at line ", {decorator.location.line});
    merge_into_call(decorator, input)
}

// decorator(input)
fn plain_call(decorator: NodeRef, input: NodeRef) -> Result<NodeRef, CompilerError> {
    let location = decorator.location;
    let scope = decorator.scope;

    let mut items = Vec::new();
    if let Err(e) = items.try_reserve_exact(1) {
        return Err(CompilerError::allocation(e, location));
    }
    items.push(input);

    let args = NodeRef::new(AstNode::tuple(items, location, scope));
    Ok(NodeRef::new(AstNode::call(decorator, args, location, scope)))
}

// deco(x, y) applied to input becomes deco(input, x, y)
fn merge_into_call(decorator: NodeRef, input: NodeRef) -> Result<NodeRef, CompilerError> {
    // Copies the call node itself only if something else still holds it
    let mut call = decorator.into_node();
    let location = call.location;
    let scope = call.scope;

    let NodeKind::Operator {
        op: Operator::Call,
        rhs,
        ..
    } = &mut call.kind
    else {
        return_compiler_error!("Annotation decorator was expected to be a call", {
            CompilationStage => "Annotation Desugaring",
        });
    };

    let merged_args = match rhs.take() {
        Some(mut args) => match args.get_mut() {
            // Nobody else can observe the argument tuple, so it is extended in place
            Some(AstNode {
                kind:
                    NodeKind::Multiple {
                        items,
                        mode: MultipleMode::Tuple,
                    },
                ..
            }) => {
                if let Err(e) = items.try_reserve(1) {
                    return Err(CompilerError::allocation(e, location));
                }
                items.insert(0, input);
                args
            }

            // Shared or not a tuple: spread the old arguments after the input
            _ => {
                let args_location = args.location;
                let spread =
                    NodeRef::new(AstNode::new(NodeKind::Expand(args), args_location, scope));
                two_item_tuple(input, spread, location, scope)?
            }
        },

        None => {
            let mut items = Vec::new();
            if let Err(e) = items.try_reserve_exact(1) {
                return Err(CompilerError::allocation(e, location));
            }
            items.push(input);
            NodeRef::new(AstNode::tuple(items, location, scope))
        }
    };

    *rhs = Some(merged_args);
    Ok(NodeRef::new(call))
}

fn two_item_tuple(
    first: NodeRef,
    second: NodeRef,
    location: TextLocation,
    scope: ScopeId,
) -> Result<NodeRef, CompilerError> {
    let mut items = Vec::new();
    if let Err(e) = items.try_reserve_exact(2) {
        return Err(CompilerError::allocation(e, location));
    }
    items.push(first);
    items.push(second);
    Ok(NodeRef::new(AstNode::tuple(items, location, scope)))
}
