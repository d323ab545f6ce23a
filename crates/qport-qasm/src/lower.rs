//! Lowering of the AST into a [`Circuit`].

use rustc_hash::FxHashMap;

use qport_ir::{
    Circuit, ClassicalCondition, ClbitId, CustomGate, Gate, GateDefinition, Instruction,
    ParameterExpression, QubitId, StandardGate, UnaryFunc,
};

use crate::ast::{Argument, BinOp, Expression, GateCall, GateDef, Operation, Program, Statement};
use crate::error::{ParseError, ParseResult};
use crate::parser::{parse_program, parse_statements};

/// `qelib1.inc` gates that have no standard counterpart, as definitions.
pub(crate) const QELIB_DEFINITIONS: &str = r"
gate cu3(theta,phi,lambda) c,t { u1((lambda+phi)/2) c; u1((lambda-phi)/2) t; cx c,t; u3(-theta/2,0,-(phi+lambda)/2) t; cx c,t; u3(theta/2,phi,0) t; }
gate cu(theta,phi,lambda,gamma) c,t { p(gamma) c; p((lambda+phi)/2) c; p((lambda-phi)/2) t; cx c,t; u(-theta/2,0,-(phi+lambda)/2) t; cx c,t; u(theta/2,phi,0) t; }
gate crx(lambda) a,b { u1(pi/2) b; cx a,b; u3(-lambda/2,0,0) b; cx a,b; u3(lambda/2,-pi/2,0) b; }
gate cry(lambda) a,b { ry(lambda/2) b; cx a,b; ry(-lambda/2) b; cx a,b; }
gate cswap a,b,c { cx c,b; ccx a,b,c; cx c,b; }
gate csx a,b { h b; cu1(pi/2) a,b; h b; }
gate rccx a,b,c { u2(0,pi) c; u1(pi/4) c; cx b,c; u1(-pi/4) c; cx a,c; u1(pi/4) c; cx b,c; u1(-pi/4) c; u2(0,pi) c; }
";

/// Names defined by [`QELIB_DEFINITIONS`].
pub(crate) const QELIB_DEFINED: [&str; 7] = ["cu3", "cu", "crx", "cry", "cswap", "csx", "rccx"];

/// Read an OpenQASM 2.0 program into a circuit.
///
/// Registers keep their names. User `gate` definitions become boxes that
/// carry their definition. Identifiers outside any gate body that do not
/// name a register are read as free symbols.
pub fn circuit_from_qasm(source: &str) -> ParseResult<Circuit> {
    let program = parse_program(source)?;
    let mut lowerer = Lowerer::with_qelib()?;
    lowerer.lower(&program)?;
    Ok(lowerer.circuit)
}

/// Number of parameters of a built-in gate.
pub(crate) fn builtin_param_count(name: &str) -> Option<usize> {
    Some(match name {
        "id" | "x" | "y" | "z" | "h" | "s" | "sdg" | "t" | "tdg" | "sx" | "sxdg" | "cx" | "CX"
        | "cy" | "cz" | "ch" | "swap" | "ccx" => 0,
        "u0" | "rx" | "ry" | "rz" | "p" | "u1" | "crz" | "cp" | "cu1" | "rxx" | "ryy"
        | "rzz" => 1,
        "u2" => 2,
        "u3" | "u" | "U" => 3,
        _ => return None,
    })
}

fn builtin_gate(name: &str, params: &[ParameterExpression]) -> Option<StandardGate> {
    use StandardGate as G;
    let half_pi = || (ParameterExpression::Pi / ParameterExpression::constant(2.0)).simplify();
    Some(match (name, params) {
        ("id" | "u0", _) => G::I,
        ("x", []) => G::X,
        ("y", []) => G::Y,
        ("z", []) => G::Z,
        ("h", []) => G::H,
        ("s", []) => G::S,
        ("sdg", []) => G::Sdg,
        ("t", []) => G::T,
        ("tdg", []) => G::Tdg,
        ("sx", []) => G::SX,
        ("sxdg", []) => G::SXdg,
        ("cx" | "CX", []) => G::CX,
        ("cy", []) => G::CY,
        ("cz", []) => G::CZ,
        ("ch", []) => G::CH,
        ("swap", []) => G::Swap,
        ("ccx", []) => G::CCX,
        ("rx", [t]) => G::Rx(t.clone()),
        ("ry", [t]) => G::Ry(t.clone()),
        ("rz", [t]) => G::Rz(t.clone()),
        ("p" | "u1", [l]) => G::P(l.clone()),
        ("crz", [t]) => G::CRz(t.clone()),
        ("cp" | "cu1", [l]) => G::CP(l.clone()),
        ("rxx", [t]) => G::RXX(t.clone()),
        ("ryy", [t]) => G::RYY(t.clone()),
        ("rzz", [t]) => G::RZZ(t.clone()),
        ("u2", [phi, lambda]) => G::U(half_pi(), phi.clone(), lambda.clone()),
        ("u3" | "u" | "U", [t, phi, lambda]) => G::U(t.clone(), phi.clone(), lambda.clone()),
        _ => return None,
    })
}

/// Names visible in a parameter expression.
#[derive(Clone, Copy)]
enum Scope<'a> {
    /// Top level: unknown identifiers are free symbols.
    Global,
    /// Gate body: only the formal parameters.
    Body(&'a [String]),
}

fn lower_expression(expr: &Expression, scope: Scope<'_>) -> ParseResult<ParameterExpression> {
    let lower = |e: &Expression| lower_expression(e, scope);
    let lowered = match expr {
        Expression::Real(v) => ParameterExpression::constant(*v),
        #[allow(clippy::cast_precision_loss)]
        Expression::Integer(v) => ParameterExpression::constant(*v as f64),
        Expression::Pi => ParameterExpression::Pi,
        Expression::Identifier(name) => match scope {
            Scope::Body(formals) if !formals.contains(name) => {
                return Err(ParseError::UndefinedIdentifier(name.clone()));
            }
            _ => ParameterExpression::symbol(name),
        },
        Expression::Neg(e) => -lower(e)?,
        Expression::Binary(op, a, b) => {
            let (a, b) = (lower(a)?, lower(b)?);
            match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Pow => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => ParameterExpression::constant(x.powf(y)),
                    _ => {
                        return Err(ParseError::Unsupported(
                            "'^' with a symbolic operand".into(),
                        ));
                    }
                },
            }
        }
        Expression::Call(name, arg) => {
            let func = UnaryFunc::from_name(name)
                .ok_or_else(|| ParseError::UndefinedIdentifier(format!("{name}()")))?;
            ParameterExpression::Func(func, Box::new(lower(arg)?))
        }
    };
    if !lowered.is_symbolic() && !lowered.as_f64().is_some_and(f64::is_finite) {
        return Err(ParseError::Unsupported(format!(
            "non-finite parameter value {}",
            lowered.as_f64().unwrap_or(f64::NAN)
        )));
    }
    Ok(lowered)
}

struct Lowerer {
    circuit: Circuit,
    qregs: FxHashMap<String, Vec<QubitId>>,
    cregs: FxHashMap<String, Vec<ClbitId>>,
    definitions: FxHashMap<String, GateDefinition>,
}

impl Lowerer {
    fn with_qelib() -> ParseResult<Self> {
        let mut lowerer = Self {
            circuit: Circuit::default(),
            qregs: FxHashMap::default(),
            cregs: FxHashMap::default(),
            definitions: FxHashMap::default(),
        };
        for statement in parse_statements(QELIB_DEFINITIONS)? {
            if let Statement::GateDef(def) = statement {
                lowerer.define(&def)?;
            }
        }
        Ok(lowerer)
    }

    fn lower(&mut self, program: &Program) -> ParseResult<()> {
        for statement in &program.statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> ParseResult<()> {
        match statement {
            Statement::Include(file) if file == "qelib1.inc" => Ok(()),
            Statement::Include(file) => {
                Err(ParseError::Unsupported(format!("include of '{file}'")))
            }
            Statement::QReg { name, size } => {
                self.check_fresh(name)?;
                let ids = self.circuit.add_qreg(name, *size);
                self.qregs.insert(name.clone(), ids);
                Ok(())
            }
            Statement::CReg { name, size } => {
                self.check_fresh(name)?;
                let ids = self.circuit.add_creg(name, *size);
                self.cregs.insert(name.clone(), ids);
                Ok(())
            }
            Statement::GateDef(def) => self.define(def),
            Statement::Opaque { name } => {
                Err(ParseError::Unsupported(format!("opaque gate '{name}'")))
            }
            Statement::Op(op) => self.operation(op, None),
            Statement::If {
                register,
                value,
                op,
            } => {
                if !self.cregs.contains_key(register) {
                    return Err(ParseError::UndefinedIdentifier(register.clone()));
                }
                self.operation(op, Some(ClassicalCondition::new(register, *value)))
            }
        }
    }

    fn check_fresh(&self, name: &str) -> ParseResult<()> {
        if self.qregs.contains_key(name) || self.cregs.contains_key(name) {
            return Err(ParseError::Unsupported(format!(
                "register '{name}' declared twice"
            )));
        }
        Ok(())
    }

    /// Record a gate definition. Definitions of built-in names are ignored.
    fn define(&mut self, def: &GateDef) -> ParseResult<()> {
        if builtin_param_count(&def.name).is_some() {
            return Ok(());
        }
        let mut body = Vec::with_capacity(def.body.len());
        for op in &def.body {
            let local = |arg: &Argument| -> ParseResult<QubitId> {
                if arg.index.is_some() {
                    return Err(ParseError::Unsupported(format!(
                        "indexed argument in body of gate '{}'",
                        def.name
                    )));
                }
                def.qubits
                    .iter()
                    .position(|q| *q == arg.name)
                    .and_then(|i| u32::try_from(i).ok())
                    .map(QubitId)
                    .ok_or_else(|| ParseError::UndefinedIdentifier(arg.name.clone()))
            };
            match op {
                Operation::Call(call) => {
                    let gate = self.gate(call, Scope::Body(&def.params))?;
                    let qubits = call.args.iter().map(local).collect::<ParseResult<Vec<_>>>()?;
                    body.push(Instruction::gate(gate, qubits));
                }
                Operation::Barrier(args) => {
                    let qubits = args.iter().map(local).collect::<ParseResult<Vec<_>>>()?;
                    body.push(Instruction::barrier(qubits));
                }
                Operation::Measure { .. } | Operation::Reset(_) => {
                    return Err(ParseError::Unsupported(format!(
                        "non-unitary operation in body of gate '{}'",
                        def.name
                    )));
                }
            }
        }
        let n_qubits = u32::try_from(def.qubits.len())
            .map_err(|_| ParseError::Unsupported(format!("gate '{}' is too wide", def.name)))?;
        self.definitions.insert(
            def.name.clone(),
            GateDefinition::new(def.params.clone(), n_qubits, body),
        );
        Ok(())
    }

    /// Resolve a call to a standard gate or a box, checking arities.
    fn gate(&self, call: &GateCall, scope: Scope<'_>) -> ParseResult<Gate> {
        let params = call
            .params
            .iter()
            .map(|e| lower_expression(e, scope).map(|p| p.simplify()))
            .collect::<ParseResult<Vec<_>>>()?;

        let (expected_params, gate) = if let Some(n) = builtin_param_count(&call.name) {
            (n, builtin_gate(&call.name, &params).map(Gate::standard))
        } else if let Some(def) = self.definitions.get(&call.name) {
            let custom = CustomGate::new(&call.name, def.num_qubits)
                .with_params(params.clone())
                .with_definition(def.clone());
            (def.params.len(), Some(Gate::custom(custom)))
        } else {
            return Err(ParseError::UnknownGate(call.name.clone()));
        };

        if params.len() != expected_params {
            return Err(ParseError::WrongParameterCount {
                gate: call.name.clone(),
                expected: expected_params,
                got: params.len(),
            });
        }
        let gate = gate.ok_or_else(|| ParseError::UnknownGate(call.name.clone()))?;
        let expected_qubits = gate.num_qubits() as usize;
        if call.args.len() != expected_qubits {
            return Err(ParseError::WrongQubitCount {
                gate: call.name.clone(),
                expected: expected_qubits,
                got: call.args.len(),
            });
        }
        Ok(gate)
    }

    fn qubits(&self, arg: &Argument) -> ParseResult<Vec<QubitId>> {
        let reg = self
            .qregs
            .get(&arg.name)
            .ok_or_else(|| ParseError::UndefinedIdentifier(arg.name.clone()))?;
        select(&arg.name, reg, arg.index)
    }

    fn clbits(&self, arg: &Argument) -> ParseResult<Vec<ClbitId>> {
        let reg = self
            .cregs
            .get(&arg.name)
            .ok_or_else(|| ParseError::UndefinedIdentifier(arg.name.clone()))?;
        select(&arg.name, reg, arg.index)
    }

    fn operation(
        &mut self,
        op: &Operation,
        condition: Option<ClassicalCondition>,
    ) -> ParseResult<()> {
        if condition.is_some() && !matches!(op, Operation::Call(_)) {
            return Err(ParseError::Unsupported(
                "classical condition on a non-gate operation".into(),
            ));
        }
        match op {
            Operation::Call(call) => {
                let mut gate = self.gate(call, Scope::Global)?;
                gate.condition = condition;
                let operands = call
                    .args
                    .iter()
                    .map(|a| self.qubits(a))
                    .collect::<ParseResult<Vec<_>>>()?;
                for qubits in broadcast(&call.name, &operands)? {
                    self.circuit
                        .append(Instruction::gate(gate.clone(), qubits))?;
                }
            }
            Operation::Measure { qubit, bit } => {
                let qubits = self.qubits(qubit)?;
                let bits = self.clbits(bit)?;
                if qubits.len() != bits.len() {
                    return Err(ParseError::Unsupported(format!(
                        "measure of {} qubits into {} bits",
                        qubits.len(),
                        bits.len()
                    )));
                }
                for (q, c) in qubits.into_iter().zip(bits) {
                    self.circuit.measure(q, c)?;
                }
            }
            Operation::Reset(arg) => {
                for q in self.qubits(arg)? {
                    self.circuit.reset(q)?;
                }
            }
            Operation::Barrier(args) => {
                let mut qubits = vec![];
                for arg in args {
                    for q in self.qubits(arg)? {
                        if !qubits.contains(&q) {
                            qubits.push(q);
                        }
                    }
                }
                self.circuit.barrier(qubits)?;
            }
        }
        Ok(())
    }
}

fn select<T: Copy>(register: &str, bits: &[T], index: Option<u32>) -> ParseResult<Vec<T>> {
    match index {
        None => Ok(bits.to_vec()),
        Some(i) => bits
            .get(i as usize)
            .map(|b| vec![*b])
            .ok_or_else(|| ParseError::IndexOutOfBounds {
                register: register.to_string(),
                index: i as usize,
                size: bits.len(),
            }),
    }
}

/// Expand whole-register operands: `cx q, r;` applies pairwise.
fn broadcast(gate: &str, operands: &[Vec<QubitId>]) -> ParseResult<Vec<Vec<QubitId>>> {
    let width = operands.iter().map(Vec::len).filter(|&n| n != 1).max().unwrap_or(1);
    if operands.iter().any(|o| o.len() != 1 && o.len() != width) {
        return Err(ParseError::Unsupported(format!(
            "registers of different sizes in call to '{gate}'"
        )));
    }
    Ok((0..width)
        .map(|k| {
            operands
                .iter()
                .map(|o| if o.len() == 1 { o[0] } else { o[k] })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qport_ir::InstructionKind;

    const BELL: &str = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        creg c[2];
        h q[0];
        cx q[0], q[1];
        measure q -> c;
    "#;

    #[test]
    fn test_bell() {
        let circuit = circuit_from_qasm(BELL).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.n_gates_of("h"), 1);
        assert_eq!(circuit.n_gates_of("cx"), 1);
        assert_eq!(circuit.n_gates_of("measure"), 2);
        assert_eq!(circuit.qregs(), vec![("q".to_string(), 2)]);
    }

    #[test]
    fn test_registers_and_broadcast() {
        let circuit = circuit_from_qasm(
            "OPENQASM 2.0; qreg a[3]; qreg b[3]; creg m[3]; h a; cx a, b; cx a[0], b; measure b -> m;",
        )
        .unwrap();
        assert_eq!(circuit.num_qubits(), 6);
        assert_eq!(circuit.n_gates_of("h"), 3);
        assert_eq!(circuit.n_gates_of("cx"), 6);
        assert_eq!(
            circuit.qregs(),
            vec![("a".to_string(), 3), ("b".to_string(), 3)]
        );
    }

    #[test]
    fn test_parameters() {
        let circuit =
            circuit_from_qasm("OPENQASM 2.0; qreg q[1]; rz(-pi/2) q[0]; u2(0, pi) q[0]; rx(theta*2) q[0];")
                .unwrap();
        let ops = circuit.instructions();
        match ops[0].as_standard() {
            Some(StandardGate::Rz(p)) => {
                assert!((p.as_f64().unwrap() + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ops[1].name(), "u");
        assert!(circuit.is_symbolic());
    }

    #[test]
    fn test_gate_definition_becomes_box() {
        let circuit = circuit_from_qasm(
            "OPENQASM 2.0; gate bell a, b { h a; cx a, b; } qreg q[2]; bell q[0], q[1];",
        )
        .unwrap();
        let ops = circuit.instructions();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_box());
        let gate = ops[0].as_gate().unwrap();
        let qport_ir::GateKind::Custom(custom) = &gate.kind else {
            panic!("expected a box");
        };
        assert_eq!(custom.definition.as_ref().unwrap().body.len(), 2);
    }

    #[test]
    fn test_qelib_extras_are_boxes() {
        let circuit =
            circuit_from_qasm("OPENQASM 2.0; include \"qelib1.inc\"; qreg q[3]; cswap q[0], q[1], q[2];")
                .unwrap();
        assert_eq!(circuit.n_gates_of("cswap"), 1);
        assert!(circuit.instructions()[0].is_box());
    }

    #[test]
    fn test_condition() {
        let circuit = circuit_from_qasm(
            "OPENQASM 2.0; qreg q[1]; creg c[2]; measure q[0] -> c[0]; if(c==1) x q[0];",
        )
        .unwrap();
        let ops = circuit.instructions();
        let cond = ops[1].condition().unwrap();
        assert_eq!((cond.register.as_str(), cond.value), ("c", 1));
        assert!(matches!(ops[1].kind, InstructionKind::Gate(_)));
    }

    #[test]
    fn test_errors() {
        let err = circuit_from_qasm("OPENQASM 2.0; qreg q[1]; foo q[0];").unwrap_err();
        assert!(matches!(err, ParseError::UnknownGate(ref g) if g == "foo"));

        let err = circuit_from_qasm("OPENQASM 2.0; qreg q[2]; cx q[0];").unwrap_err();
        assert!(matches!(err, ParseError::WrongQubitCount { expected: 2, got: 1, .. }));

        let err = circuit_from_qasm("OPENQASM 2.0; qreg q[1]; rz q[0];").unwrap_err();
        assert!(matches!(err, ParseError::WrongParameterCount { expected: 1, got: 0, .. }));

        let err = circuit_from_qasm("OPENQASM 2.0; qreg q[1]; x q[4];").unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfBounds { index: 4, size: 1, .. }));

        let err = circuit_from_qasm("OPENQASM 2.0; qreg q[1]; x r[0];").unwrap_err();
        assert!(matches!(err, ParseError::UndefinedIdentifier(_)));

        for angle in ["1/0", "-1/0", "1e400", "0*1e400", "ln(0)"] {
            let err = circuit_from_qasm(&format!("OPENQASM 2.0; qreg q[1]; rz({angle}) q[0];"))
                .unwrap_err();
            assert!(matches!(err, ParseError::Unsupported(_)), "{angle}");
        }

        let err = circuit_from_qasm("OPENQASM 2.0; opaque magic q;").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported(_)));

        let err =
            circuit_from_qasm("OPENQASM 2.0; gate g(a) x { rz(b) x; } qreg q[1];").unwrap_err();
        assert!(matches!(err, ParseError::UndefinedIdentifier(ref n) if n == "b"));
    }
}
