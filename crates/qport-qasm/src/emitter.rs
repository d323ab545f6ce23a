//! `OpenQASM` 2.0 emitter.

use std::fmt::Write as _;

use rustc_hash::{FxHashMap, FxHashSet};

use qport_ir::{
    Circuit, ClbitId, CustomGate, Gate, GateDefinition, GateKind, Instruction, InstructionKind,
    ParameterExpression, QubitId, StandardGate,
};

use crate::error::{ParseError, ParseResult};
use crate::lower::QELIB_DEFINED;

const RYY_DEFINITION: &str = "gate ryy(theta) a,b { rx(pi/2) a; rx(pi/2) b; cx a,b; rz(theta) b; cx a,b; rx(-pi/2) a; rx(-pi/2) b; }";

/// Write a circuit as an `OpenQASM` 2.0 program.
///
/// Registers keep their names. Wires outside any register are gathered into
/// a fresh register. Boxes are written as `gate` definitions, which requires
/// every box outside `qelib1.inc` to carry its definition.
pub fn circuit_to_qasm(circuit: &Circuit) -> ParseResult<String> {
    let instructions = circuit.instructions();
    let mut out = String::from("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n\n");

    let mut definitions = Definitions::default();
    for inst in &instructions {
        definitions.collect(inst)?;
    }
    if definitions.uses_ryy {
        out.push_str(RYY_DEFINITION);
        out.push('\n');
    }
    for line in &definitions.lines {
        out.push_str(line);
        out.push('\n');
    }

    let wires = WireNames::new(circuit);
    for (name, size) in &wires.qregs {
        let _ = writeln!(out, "qreg {name}[{size}];");
    }
    for (name, size) in &wires.cregs {
        let _ = writeln!(out, "creg {name}[{size}];");
    }

    for inst in &instructions {
        emit_instruction(&mut out, inst, &wires)?;
    }
    Ok(out)
}

/// Format an angle, as a fraction of pi where it is one.
pub(crate) fn format_angle(value: f64) -> ParseResult<String> {
    if !value.is_finite() {
        return Err(ParseError::Unsupported(format!("parameter value {value}")));
    }
    if value == 0.0 {
        return Ok("0".into());
    }
    let pi = std::f64::consts::PI;
    for denominator in [1_i64, 2, 3, 4, 6, 8, 12, 16] {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let numerator = (value * denominator as f64 / pi).round() as i64;
        #[allow(clippy::cast_precision_loss)]
        let exact = numerator as f64 * pi / denominator as f64;
        if numerator != 0 && (exact - value).abs() < 1e-12 {
            let sign = if numerator < 0 { "-" } else { "" };
            let numerator = numerator.unsigned_abs();
            let head = if numerator == 1 {
                format!("{sign}pi")
            } else {
                format!("{sign}{numerator}*pi")
            };
            return Ok(if denominator == 1 {
                head
            } else {
                format!("{head}/{denominator}")
            });
        }
    }
    if value.abs() >= 1e15 {
        return Ok(format!("{value:e}"));
    }
    Ok(format!("{value}"))
}

fn format_parameter(param: &ParameterExpression) -> ParseResult<String> {
    use ParameterExpression as P;
    Ok(match param {
        P::Constant(v) => {
            let s = format_angle(*v)?;
            if s.starts_with('-') { format!("({s})") } else { s }
        }
        P::Symbol(name) => name.clone(),
        P::Pi => "pi".into(),
        P::Neg(e) => format!("-({})", format_parameter(e)?),
        P::Add(a, b) => format!("({} + {})", format_parameter(a)?, format_parameter(b)?),
        P::Sub(a, b) => format!("({} - {})", format_parameter(a)?, format_parameter(b)?),
        P::Mul(a, b) => format!("({} * {})", format_parameter(a)?, format_parameter(b)?),
        P::Div(a, b) => format!("({} / {})", format_parameter(a)?, format_parameter(b)?),
        P::Func(func, e) => format!("{}({})", func.name(), format_parameter(e)?),
    })
}

/// Top-level parameters print without the outer parentheses of a constant.
fn format_parameters(params: &[&ParameterExpression]) -> ParseResult<String> {
    if params.is_empty() {
        return Ok(String::new());
    }
    let formatted = params
        .iter()
        .map(|p| match p.as_f64() {
            Some(v) if !p.is_symbolic() => format_angle(v),
            _ => format_parameter(p),
        })
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(format!("({})", formatted.join(",")))
}

fn gate_call(gate: &Gate) -> ParseResult<String> {
    let params = format_parameters(&gate.kind.parameters())?;
    let name = match &gate.kind {
        GateKind::Standard(sg) => sg.name(),
        GateKind::Custom(cg) => cg.name.as_str(),
    };
    Ok(format!("{name}{params}"))
}

/// `gate` definitions needed by a circuit, in dependency order.
#[derive(Default)]
struct Definitions {
    seen: FxHashSet<String>,
    lines: Vec<String>,
    uses_ryy: bool,
}

impl Definitions {
    fn collect(&mut self, inst: &Instruction) -> ParseResult<()> {
        let Some(gate) = inst.as_gate() else {
            return Ok(());
        };
        match &gate.kind {
            GateKind::Standard(StandardGate::RYY(_)) => self.uses_ryy = true,
            GateKind::Standard(_) => {}
            GateKind::Custom(custom) => self.define(custom)?,
        }
        Ok(())
    }

    fn define(&mut self, custom: &CustomGate) -> ParseResult<()> {
        if QELIB_DEFINED.contains(&custom.name.as_str()) || self.seen.contains(&custom.name) {
            return Ok(());
        }
        let definition = custom.definition.as_deref().ok_or_else(|| {
            ParseError::Unsupported(format!("box '{}' has no definition", custom.name))
        })?;
        self.seen.insert(custom.name.clone());
        for inst in &definition.body {
            self.collect(inst)?;
        }
        let line = definition_line(&custom.name, definition)?;
        self.lines.push(line);
        Ok(())
    }
}

fn definition_line(name: &str, definition: &GateDefinition) -> ParseResult<String> {
    let formal = |q: &QubitId| format!("a{}", q.0);
    let qubits: Vec<String> = (0..definition.num_qubits)
        .map(|i| formal(&QubitId(i)))
        .collect();
    let mut line = format!("gate {name}");
    if !definition.params.is_empty() {
        let _ = write!(line, "({})", definition.params.join(","));
    }
    let _ = write!(line, " {} {{", qubits.join(","));
    for inst in &definition.body {
        let args: Vec<String> = inst.qubits.iter().map(formal).collect();
        match &inst.kind {
            InstructionKind::Gate(gate) if gate.condition.is_none() => {
                let _ = write!(line, " {} {};", gate_call(gate)?, args.join(","));
            }
            InstructionKind::Barrier => {
                let _ = write!(line, " barrier {};", args.join(","));
            }
            _ => {
                return Err(ParseError::Unsupported(format!(
                    "'{}' in the definition of '{name}'",
                    inst.name()
                )));
            }
        }
    }
    line.push_str(" }");
    Ok(line)
}

/// Register-qualified names of every wire.
struct WireNames {
    qubits: FxHashMap<QubitId, String>,
    clbits: FxHashMap<ClbitId, String>,
    qregs: Vec<(String, u32)>,
    cregs: Vec<(String, u32)>,
}

impl WireNames {
    fn new(circuit: &Circuit) -> Self {
        let mut qregs = circuit.qregs();
        let mut cregs = circuit.cregs();
        let taken: FxHashSet<String> = qregs
            .iter()
            .chain(cregs.iter())
            .map(|(name, _)| name.clone())
            .collect();

        let qubits = name_wires(
            circuit.qubits().iter().map(|q| (q.id, q.slot.as_ref())),
            fresh_name("q", &taken),
            &mut qregs,
        );
        let clbits = name_wires(
            circuit.clbits().iter().map(|c| (c.id, c.slot.as_ref())),
            fresh_name("c", &taken),
            &mut cregs,
        );
        Self {
            qubits,
            clbits,
            qregs,
            cregs,
        }
    }

    fn qubit(&self, id: QubitId) -> ParseResult<&str> {
        self.qubits
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| ParseError::UndefinedIdentifier(id.to_string()))
    }

    fn clbit(&self, id: ClbitId) -> ParseResult<&str> {
        self.clbits
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| ParseError::UndefinedIdentifier(id.to_string()))
    }
}

fn fresh_name(base: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (0..)
        .map(|i| format!("{base}_{i}"))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| base.to_string())
}

fn name_wires<'a, K: std::hash::Hash + Eq>(
    wires: impl Iterator<Item = (K, Option<&'a qport_ir::RegisterSlot>)>,
    spare_register: String,
    registers: &mut Vec<(String, u32)>,
) -> FxHashMap<K, String> {
    let mut names = FxHashMap::default();
    let mut spare = 0u32;
    for (id, slot) in wires {
        let name = match slot {
            Some(slot) => slot.to_string(),
            None => {
                spare += 1;
                format!("{spare_register}[{}]", spare - 1)
            }
        };
        names.insert(id, name);
    }
    if spare > 0 {
        registers.push((spare_register, spare));
    }
    names
}

fn emit_instruction(out: &mut String, inst: &Instruction, wires: &WireNames) -> ParseResult<()> {
    let qubits = inst
        .qubits
        .iter()
        .map(|q| wires.qubit(*q))
        .collect::<ParseResult<Vec<_>>>()?;
    match &inst.kind {
        InstructionKind::Gate(gate) => {
            if let Some(cond) = &gate.condition {
                let _ = write!(out, "if({}=={}) ", cond.register, cond.value);
            }
            let _ = writeln!(out, "{} {};", gate_call(gate)?, qubits.join(","));
        }
        InstructionKind::Measure => {
            for (q, c) in qubits.iter().zip(&inst.clbits) {
                let _ = writeln!(out, "measure {q} -> {};", wires.clbit(*c)?);
            }
        }
        InstructionKind::Reset => {
            for q in &qubits {
                let _ = writeln!(out, "reset {q};");
            }
        }
        InstructionKind::Barrier => {
            let _ = writeln!(out, "barrier {};", qubits.join(","));
        }
    }
    Ok(())
}
