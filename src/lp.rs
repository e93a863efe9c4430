//! CPLEX LP text for a [`Model`], for inspecting a model in external tools.
//!
//! Names come from the caller, who derives them from whatever structured keys it keeps; nothing here reads names back.

use itertools::Itertools;

use crate::model::{Comparison, ConstraintId, LinExpr, Model, Sense, VarId, VarKind};

fn expression(expr: &LinExpr, var_name: &impl Fn(VarId) -> String) -> String {
    let terms = expr.terms();
    if terms.is_empty() {
        return "0".to_string();
    }

    terms.iter()
        .map(|(var, coefficient)| format!("{:+} {}", coefficient, var_name(*var)))
        .join(" ")
}

/// Write `model` in LP format, naming variables with `var_name` and constraints with `constraint_name`.
pub fn write_lp(
    model: &Model,
    var_name: impl Fn(VarId) -> String,
    constraint_name: impl Fn(ConstraintId) -> String,
) -> String {
    let mut out = String::new();

    out.push_str(match model.sense() {
        Sense::Minimize => "Minimize\n",
        Sense::Maximize => "Maximize\n",
    });
    // constants do not affect the optimum and LP objectives cannot carry them
    out.push_str(&format!(" obj: {}\n", expression(model.objective(), &var_name)));

    out.push_str("Subject To\n");
    for (index, constraint) in model.constraints().iter().enumerate() {
        out.push_str(&format!(
            " {}: {} {} {:+}\n",
            constraint_name(ConstraintId(index)),
            expression(constraint.expr(), &var_name),
            match constraint.comparison() {
                Comparison::Le => "<=",
                Comparison::Ge => ">=",
                Comparison::Eq => "=",
            },
            constraint.rhs(),
        ));
    }

    let (binaries, generals): (Vec<_>, Vec<_>) = model.variables().iter()
        .enumerate()
        .map(|(index, kind)| (VarId(index), *kind))
        .partition(|(_, kind)| *kind == VarKind::Binary);

    out.push_str("Bounds\n");
    for (var, kind) in &generals {
        let (lower, upper) = kind.bounds();
        out.push_str(&format!(" {} <= {} <= {}\n", lower, var_name(*var), upper));
    }

    out.push_str("Generals\n");
    for (var, _) in &generals {
        out.push_str(&format!(" {}\n", var_name(*var)));
    }

    out.push_str("Binary\n");
    for (var, _) in &binaries {
        out.push_str(&format!(" {}\n", var_name(*var)));
    }

    out.push_str("End\n");
    out
}

#[cfg(test)]
mod tests {
    use crate::lp::write_lp;
    use crate::model::{LinExpr, Model, Sense, VarKind};

    #[test]
    fn writes_sections() {
        let mut model = Model::new(Sense::Maximize);
        let x = model.add_var(VarKind::Binary);
        let n = model.add_var(VarKind::Integer { lower: 0, upper: 4 });
        model.add_constraint((2 * x).leq(n));
        model.add_constraint(LinExpr::from(n).equals(1i64));
        model.set_objective(x.into());

        let text = write_lp(
            &model,
            |var| format!("v{}", var.index()),
            |constraint| format!("c{}", constraint.index()),
        );

        assert_eq!(text, "Maximize
 obj: +1 v0
Subject To
 c0: +2 v0 -1 v1 <= +0
 c1: +1 v1 = +1
Bounds
 0 <= v1 <= 4
Generals
 v1
Binary
 v0
End
");
    }
}
