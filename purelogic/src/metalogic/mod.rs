//! Meta-logic: formulas as data
//!
//! A formula is the quoted Value form of an expression (see
//! `Expression::to_value`). The structural helpers here are plain natives;
//! encoding, self-reference, evaluation of quoted formulas and the μ/ν
//! fixpoints need the evaluator and are registered as intrinsics.

pub mod formula;
pub mod proof;

pub use formula::FormulaTable;

use crate::builtins::{self, arg, collections};
use crate::evaluator::{fixpoint, Context, Evaluator};
use crate::registry::{FunctionDescriptor, FunctionRegistry, Intrinsic};
use crate::{Expression, LogicResult, Value};

use crate::value::ValueType::{Any, Collection, Integer, Object, String as Text};

/// Decode a quoted formula argument
pub(crate) fn formula(value: &Value) -> LogicResult<Expression> {
    Expression::from_value(value)
}

fn formulas(value: &Value) -> LogicResult<Vec<Expression>> {
    value.as_collection()?.iter().map(formula).collect()
}

fn names(set: impl IntoIterator<Item = String>) -> Value {
    Value::collection(set.into_iter().map(Value::String))
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    for name in ["metalogic.is_well_formed", "logic.is_well_formed"] {
        registry.register(
            FunctionDescriptor::native(name, vec![Any], |args| {
                Ok(Value::Boolean(formula(arg(args, 0)?).is_ok()))
            })
            .with_description("Whether the value is a structurally valid quoted formula"),
        );
    }
    registry.register(
        FunctionDescriptor::native("metalogic.free_variables", vec![Object], |args| {
            Ok(names(formula(arg(args, 0)?)?.free_variables()))
        })
        .with_description("Variables the formula uses without binding"),
    );
    registry.register(
        FunctionDescriptor::native("metalogic.called_functions", vec![Object], |args| {
            Ok(names(formula(arg(args, 0)?)?.called_functions()))
        })
        .with_description("Functions the formula calls"),
    );
    registry.register(
        FunctionDescriptor::native("metalogic.substitute", vec![Object, Text, Any], |args| {
            let target = formula(arg(args, 0)?)?;
            let replacement = Expression::literal(arg(args, 2)?.clone());
            target
                .substitute(arg(args, 1)?.as_str()?, &replacement)
                .to_value()
        })
        .with_description("Formula with a free variable replaced by a literal value"),
    );
    registry.register(
        FunctionDescriptor::native(
            "metalogic.verify_derivation",
            vec![Collection, Collection],
            |args| {
                Ok(Value::Boolean(proof::verify_derivation(
                    &formulas(arg(args, 0)?)?,
                    &formulas(arg(args, 1)?)?,
                )))
            },
        )
        .with_description("Whether each step is an axiom or follows from earlier steps by one inference"),
    );

    let intrinsics = [
        ("logic.has_function", vec![Text], Intrinsic::HasFunction, "Whether a function is registered"),
        (
            "logic.all_functions_exist",
            vec![Any],
            Intrinsic::AllFunctionsExist,
            "Whether every named function (or every function a formula calls) is registered",
        ),
        ("metalogic.encode_formula", vec![Object], Intrinsic::EncodeFormula, "Gödel code of a formula"),
        ("metalogic.decode_formula", vec![Integer], Intrinsic::DecodeFormula, "Formula with the given code"),
        (
            "metalogic.self_reference",
            vec![Object],
            Intrinsic::SelfReference,
            "Code of the formula with its own code substituted for 'self'",
        ),
        (
            "metalogic.diagonalization",
            vec![Object, Text],
            Intrinsic::Diagonalization,
            "Code of the formula with its own code substituted for the placeholder",
        ),
        (
            "metalogic.evaluate",
            vec![Object, Object],
            Intrinsic::Evaluate,
            "Evaluate a formula with the given bindings and nothing else in scope",
        ),
        (
            "metalogic.consistency_check",
            vec![Collection],
            Intrinsic::ConsistencyCheck,
            "Bounded check that the formulas do not contradict each other",
        ),
        (
            "metalogic.provability",
            vec![Object, Collection],
            Intrinsic::Provability,
            "Bounded check that the formula follows from the axioms",
        ),
        (
            "metalogic.refutability",
            vec![Object, Collection],
            Intrinsic::Refutability,
            "Bounded check that the negation of the formula follows from the axioms",
        ),
        (
            "metalogic.search_proof",
            vec![Object, Collection],
            Intrinsic::SearchProof,
            "Bounded forward search; {found, steps} with a derivation of the formula when found",
        ),
        (
            "mucalculus.mu",
            vec![Text, Object],
            Intrinsic::LeastFixpoint,
            "Least fixpoint of a set-valued step, starting from the empty set",
        ),
        (
            "mucalculus.nu",
            vec![Text, Object, Collection],
            Intrinsic::GreatestFixpoint,
            "Greatest fixpoint of a set-valued step, starting from the universe",
        ),
    ];
    for (name, params, intrinsic, description) in intrinsics {
        registry.register(
            FunctionDescriptor::intrinsic(name, params, intrinsic).with_description(description),
        );
    }
}

/// Run an intrinsic. `context` is the caller's context; only the fixpoint
/// intrinsics read it, and they leave it as they found it. The sized
/// generators of the standard library are dispatched here too, since they
/// need the evaluator's limits.
pub(crate) fn call_intrinsic(
    evaluator: &mut Evaluator,
    intrinsic: Intrinsic,
    args: &[Value],
    context: &mut Context,
) -> LogicResult<Value> {
    let max_rounds = evaluator.limits.max_proof_steps;
    match intrinsic {
        Intrinsic::HasFunction => Ok(Value::Boolean(
            evaluator.registry.has_function(arg(args, 0)?.as_str()?),
        )),
        Intrinsic::AllFunctionsExist => {
            let wanted: Vec<String> = match arg(args, 0)? {
                Value::Collection(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<LogicResult<_>>()?,
                quoted => formula(quoted)?.called_functions().into_iter().collect(),
            };
            Ok(Value::Boolean(
                wanted.iter().all(|name| evaluator.registry.has_function(name)),
            ))
        }
        Intrinsic::EncodeFormula => {
            let code = evaluator.formulas.encode(&formula(arg(args, 0)?)?)?;
            Ok(Value::Integer(code))
        }
        Intrinsic::DecodeFormula => {
            let decoded = evaluator.formulas.decode(arg(args, 0)?.as_integer()?)?;
            decoded.to_value()
        }
        Intrinsic::SelfReference => {
            let code = evaluator
                .formulas
                .diagonalize(&formula(arg(args, 0)?)?, "self")?;
            Ok(Value::Integer(code))
        }
        Intrinsic::Diagonalization => {
            let template = formula(arg(args, 0)?)?;
            let code = evaluator
                .formulas
                .diagonalize(&template, arg(args, 1)?.as_str()?)?;
            Ok(Value::Integer(code))
        }
        Intrinsic::Evaluate => {
            let target = formula(arg(args, 0)?)?;
            let mut fresh = Context::from_object(arg(args, 1)?)?;
            evaluator.eval(&target, &mut fresh)
        }
        Intrinsic::ConsistencyCheck => Ok(Value::Boolean(proof::consistency_check(
            &formulas(arg(args, 0)?)?,
            max_rounds,
        ))),
        Intrinsic::Provability => Ok(Value::Boolean(proof::provability(
            &formula(arg(args, 0)?)?,
            &formulas(arg(args, 1)?)?,
            max_rounds,
        ))),
        Intrinsic::Refutability => Ok(Value::Boolean(proof::refutability(
            &formula(arg(args, 0)?)?,
            &formulas(arg(args, 1)?)?,
            max_rounds,
        ))),
        Intrinsic::SearchProof => {
            let found = proof::search_proof(
                &formula(arg(args, 0)?)?,
                &formulas(arg(args, 1)?)?,
                max_rounds,
            );
            let steps = found
                .iter()
                .flatten()
                .map(Expression::to_value)
                .collect::<LogicResult<Vec<_>>>()?;
            Ok(Value::object([
                ("found", Value::Boolean(found.is_some())),
                ("steps", Value::Collection(steps)),
            ]))
        }
        Intrinsic::Range => collections::range(args, evaluator.limits.max_value_size),
        Intrinsic::MockCollection => builtins::mock_collection(
            arg(args, 0)?.as_str()?,
            arg(args, 1)?.as_integer()?,
            evaluator.limits.max_value_size,
        ),
        Intrinsic::LeastFixpoint => {
            let step = formula(arg(args, 1)?)?;
            fixpoint::least_fixpoint(evaluator, arg(args, 0)?.as_str()?, &step, context)
        }
        Intrinsic::GreatestFixpoint => {
            let step = formula(arg(args, 1)?)?;
            let universe = arg(args, 2)?.as_collection()?.to_vec();
            fixpoint::greatest_fixpoint(
                evaluator,
                arg(args, 0)?.as_str()?,
                &step,
                universe,
                context,
            )
        }
    }
}
