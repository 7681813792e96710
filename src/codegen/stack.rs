use super::descriptor::parse_method_descriptor;
use super::jasmin_ast::{Instruction, MemberRef};
use super::labels::Label;
use crate::semantic_analysis::{Result, Type};
use std::collections::HashMap;

/// Largest operand-stack depth reached anywhere in `instructions`.
pub fn max_stack_depth(instructions: &[Instruction]) -> Result<usize> {
    let mut tracker = StackTracker::new();
    for inst in instructions {
        tracker.step(inst)?;
    }
    Ok(tracker.max)
}

struct StackTracker {
    // `None` right after an instruction that never falls through.
    depth: Option<usize>,
    max: usize,
    targets: HashMap<Label, usize>,
}

impl StackTracker {
    fn new() -> Self {
        Self {
            depth: Some(0),
            max: 0,
            targets: HashMap::new(),
        }
    }

    fn step(&mut self, inst: &Instruction) -> Result<()> {
        if let Instruction::Label(label) = inst {
            let incoming = self.targets.get(label).copied();
            self.depth = Some(match (self.depth, incoming) {
                (Some(depth), Some(incoming)) => depth.max(incoming),
                (depth, incoming) => depth.or(incoming).unwrap_or(0),
            });
            return Ok(());
        }

        let (pops, pushes) = stack_effect(inst)?;
        let depth = self.depth.unwrap_or(0).saturating_sub(pops) + pushes;
        self.max = self.max.max(depth);

        if let Some(target) = inst.jump_target() {
            let entry = self.targets.entry(target).or_insert(depth);
            *entry = (*entry).max(depth);
        }
        self.depth = (!inst.ends_flow()).then_some(depth);
        Ok(())
    }
}

fn invoke_effect(method: &MemberRef) -> Result<(usize, usize)> {
    let (formals, result) = parse_method_descriptor(&method.descriptor)?;
    let pushes = usize::from(result != Type::Void);
    Ok((formals.len() + 1, pushes))
}

/// Values popped and pushed by `inst`.
fn stack_effect(inst: &Instruction) -> Result<(usize, usize)> {
    use Instruction as I;

    let effect = match inst {
        I::Load(..) | I::IntConst(_) | I::New(_) | I::GetStatic(_) => (0, 1),
        I::Store(..) | I::IfEq(_) | I::IfNe(_) => (1, 0),
        I::ArrayLoad(_) | I::IAdd | I::ISub | I::IMul => (2, 1),
        I::ArrayStore(_) => (3, 0),
        I::ArrayLength | I::NewIntArray | I::GetField(_) => (1, 1),
        I::Dup => (1, 2),
        I::PutField(_) | I::IfICmpLt(_) | I::IfICmpGe(_) => (2, 0),
        I::InvokeVirtual(method) | I::InvokeSpecial(method) => return invoke_effect(method),
        I::Return(Some(_)) => (1, 0),
        I::Return(None) | I::Goto(_) | I::Label(_) => (0, 0),
    };
    Ok(effect)
}
