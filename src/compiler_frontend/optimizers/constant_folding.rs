//! # Constant Folding
//!
//! Evaluates operators whose operands are already constants.
//! Anything that would fail at runtime (overflow, division by zero, mismatched types)
//! is left alone so the runtime reports it.
//!
//! `and`/`or` are folded from the left operand alone when its truth value is known,
//! which never skips a side effect the original would have run.

use crate::compiler_frontend::ast::ast_nodes::{AstNode, Literal, NodeKind, Operator};
use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::optimizers::assumptions::{Assumption, AssumptionSet, SymbolKey};
use crate::compiler_frontend::optimizers::node_facts::refine;
use crate::compiler_frontend::optimizers::optimizer::{Optimizer, RewriteRule, VisitFrame};
use std::cmp::Ordering;

impl Literal {
    /// Evaluates `self op rhs`, or `None` if it can't be decided at compile time
    pub fn evaluate_operator(&self, rhs: &Literal, op: Operator) -> Option<Literal> {
        match (self, rhs) {
            (Literal::Int(lhs), Literal::Int(rhs)) => match op {
                Operator::Add => lhs.checked_add(*rhs).map(Literal::Int),
                Operator::Subtract => lhs.checked_sub(*rhs).map(Literal::Int),
                Operator::Multiply => lhs.checked_mul(*rhs).map(Literal::Int),
                Operator::Divide => {
                    if *rhs == 0 {
                        None
                    } else {
                        Some(Literal::Float(*lhs as f64 / *rhs as f64))
                    }
                }
                Operator::Modulus => int_modulus(*lhs, *rhs).map(Literal::Int),
                _ => compare(op, lhs.cmp(rhs)),
            },

            (Literal::Float(_), Literal::Float(_))
            | (Literal::Int(_), Literal::Float(_))
            | (Literal::Float(_), Literal::Int(_)) => {
                let lhs = self.as_float()?;
                let rhs = rhs.as_float()?;

                match op {
                    Operator::Add => finite(lhs + rhs),
                    Operator::Subtract => finite(lhs - rhs),
                    Operator::Multiply => finite(lhs * rhs),
                    Operator::Divide if rhs != 0.0 => finite(lhs / rhs),
                    Operator::Modulus if rhs != 0.0 => {
                        let remainder = lhs % rhs;
                        if remainder != 0.0 && (remainder < 0.0) != (rhs < 0.0) {
                            finite(remainder + rhs)
                        } else {
                            finite(remainder)
                        }
                    }
                    Operator::Divide | Operator::Modulus => None,
                    _ => compare(op, lhs.partial_cmp(&rhs)?),
                }
            }

            (Literal::Str(lhs), Literal::Str(rhs)) => match op {
                Operator::Add => Some(Literal::Str(format!("{lhs}{rhs}"))),
                _ => compare(op, lhs.cmp(rhs)),
            },

            (Literal::Bool(lhs), Literal::Bool(rhs)) => match op {
                Operator::Equal => Some(Literal::Bool(lhs == rhs)),
                Operator::NotEqual => Some(Literal::Bool(lhs != rhs)),
                _ => None,
            },

            (Literal::NoValue, Literal::NoValue) => match op {
                Operator::Equal => Some(Literal::Bool(true)),
                Operator::NotEqual => Some(Literal::Bool(false)),
                _ => None,
            },

            // Values of different kinds are never equal
            _ => match op {
                Operator::Equal => Some(Literal::Bool(false)),
                Operator::NotEqual => Some(Literal::Bool(true)),
                _ => None,
            },
        }
    }

    pub fn evaluate_unary(&self, op: Operator) -> Option<Literal> {
        match op {
            Operator::Not => Some(Literal::Bool(!self.truthiness())),
            Operator::Negate => match self {
                Literal::Int(value) => value.checked_neg().map(Literal::Int),
                Literal::Float(value) => Some(Literal::Float(-value)),
                _ => None,
            },
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Int(value) => Some(*value as f64),
            Literal::Float(value) => Some(*value),
            _ => None,
        }
    }
}

// The result takes the sign of the divisor
fn int_modulus(lhs: i64, rhs: i64) -> Option<i64> {
    let remainder = lhs.checked_rem(rhs)?;
    if remainder != 0 && (remainder < 0) != (rhs < 0) {
        remainder.checked_add(rhs)
    } else {
        Some(remainder)
    }
}

fn finite(value: f64) -> Option<Literal> {
    if value.is_finite() {
        Some(Literal::Float(value))
    } else {
        None
    }
}

fn compare(op: Operator, ordering: Ordering) -> Option<Literal> {
    let result = match op {
        Operator::Equal => ordering == Ordering::Equal,
        Operator::NotEqual => ordering != Ordering::Equal,
        Operator::Less => ordering == Ordering::Less,
        Operator::LessEqual => ordering != Ordering::Greater,
        Operator::Greater => ordering == Ordering::Greater,
        Operator::GreaterEqual => ordering != Ordering::Less,
        _ => return None,
    };

    Some(Literal::Bool(result))
}

impl Optimizer<'_> {
    pub(crate) fn optimize_operator(
        &mut self,
        node: &mut AstNode,
        frame: &VisitFrame<'_>,
        assumptions: &mut AssumptionSet<'_>,
    ) -> Result<Option<NodeRef>, CompilerError> {
        let location = node.location;
        let scope = node.scope;

        let NodeKind::Operator { op, lhs, rhs } = &mut node.kind else {
            return Ok(None);
        };
        let op = *op;

        match op {
            Operator::Assign => {
                let Some(value) = rhs else {
                    return Ok(None);
                };

                // The value is evaluated before the target is bound
                self.optimize_slot(value, true, frame, assumptions)?;

                let target = match lhs.kind {
                    NodeKind::Symbol(name) => Some(name),
                    _ => None,
                };

                match target {
                    Some(name) => {
                        let key = SymbolKey::resolve(self.scopes, lhs.scope, name);
                        let truth = self.truth_value(value, assumptions);
                        assumptions.set(key, Assumption::from_truth(truth));
                    }

                    // Index targets still evaluate their operands
                    None => self.optimize_slot(lhs, true, frame, assumptions)?,
                }

                Ok(None)
            }

            Operator::And | Operator::Or => {
                let Some(right) = rhs else {
                    return Ok(None);
                };

                self.optimize_slot(lhs, true, frame, assumptions)?;
                let is_and = op == Operator::And;

                match self.truth_value(lhs, assumptions) {
                    // The right side never runs
                    Some(truth) if truth != is_and => {
                        self.record(RewriteRule::ShortCircuit, location);
                        return Ok(Some(lhs.share()));
                    }

                    // The right side always runs and decides the value
                    Some(_) => {
                        let keep_lhs = !self.is_discardable(lhs, assumptions);
                        self.optimize_slot(right, frame.result_used, frame, assumptions)?;
                        self.record(RewriteRule::ShortCircuit, location);

                        if keep_lhs {
                            return self
                                .pair_block(lhs.share(), right.share(), location, scope)
                                .map(Some);
                        }
                        return Ok(Some(right.share()));
                    }

                    None => {
                        let (evaluated, right_is_dead) = {
                            let mut branch = assumptions.fork();
                            refine(self.scopes, &mut branch, lhs, is_and);
                            self.optimize_slot(right, frame.result_used, frame, &mut branch)?;
                            let dead = !frame.result_used && self.is_discardable(right, &branch);
                            (branch.into_outcome(), dead)
                        };
                        let skipped = {
                            let mut branch = assumptions.fork();
                            refine(self.scopes, &mut branch, lhs, !is_and);
                            branch.into_outcome()
                        };
                        assumptions.join(vec![evaluated, skipped]);

                        // Nobody reads the value, so a right side that can't do anything is dead
                        if right_is_dead {
                            self.record(RewriteRule::ShortCircuit, location);
                            return Ok(Some(lhs.share()));
                        }
                    }
                }

                Ok(None)
            }

            Operator::Call => {
                self.optimize_slot(lhs, true, frame, assumptions)?;
                if let Some(args) = rhs {
                    self.optimize_slot(args, true, frame, assumptions)?;
                }

                // The callee may rebind anything it can see
                assumptions.forget_all();
                Ok(None)
            }

            _ => {
                self.optimize_slot(lhs, true, frame, assumptions)?;
                if let Some(right) = rhs {
                    self.optimize_slot(right, true, frame, assumptions)?;
                }

                let folded = match rhs {
                    Some(right) => match (lhs.literal(), right.literal()) {
                        (Some(lhs_value), Some(rhs_value)) => {
                            lhs_value.evaluate_operator(rhs_value, op)
                        }
                        _ => None,
                    },
                    None => match lhs.literal() {
                        Some(value) => value.evaluate_unary(op),
                        None if op == Operator::Not && self.is_discardable(lhs, assumptions) => self
                            .truth_value(lhs, assumptions)
                            .map(|truth| Literal::Bool(!truth)),
                        None => None,
                    },
                };

                match folded {
                    Some(value) => {
                        self.record(RewriteRule::ConstantFold, location);
                        Ok(Some(NodeRef::new(AstNode::constant(value, location, scope))))
                    }
                    None => Ok(None),
                }
            }
        }
    }
}
