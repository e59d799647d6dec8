//! SSA construction from the stack IR (`spec.md` §4.2).
//!
//! This mirrors the seven construction steps literally: block-boundary
//! identification, a symbolic operand stack per block, merge validation,
//! block-input (phi) insertion at blocks with more than one control
//! predecessor (which, for a reducible control-flow graph, subsumes "live
//! across a merge"), locals-as-memory handling, and debug-cursor annotation.

use hashbrown::HashMap;
use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::{
    block::BlockFlags,
    call_node::{
        CallNode,
        Callee,
    },
    container::{
        BigIntConst,
        CodeContainer,
        SwitchTable,
    },
    debug::{
        DebugCursor,
        DebugInfo,
    },
    function::OptFunction,
    instruction::OperandData,
    ir_type::{
        IrType,
        IrTypeKind,
    },
    module::Module,
    opcode::Opcode,
    refs::{
        BlockId,
        FunctionId,
        InstructionRef,
        PhiId,
        TypeId,
    },
    stack_ir::{
        StackFunction,
        StackModule,
        StackOpcode,
    },
    target::TargetPlatform,
};

/// A symbolic operand-stack slot: the instruction producing the value, and
/// its type (needed to validate merge-point consistency, `spec.md` §4.2
/// step 4).
#[derive(Clone)]
struct StackSlot {
    value: InstructionRef,
    ty: TypeId,
}

/// Translate every function in `stack_module` into an [`OptFunction`] and
/// assemble the result into a [`Module`] (`spec.md` §4.2).
pub fn construct_module(stack_module: &StackModule, platform: &dyn TargetPlatform) -> KefirResult<Module> {
    let mut module = Module::new();
    *module.types_mut() = stack_module.types.clone();

    let signatures: Vec<TypeId> = stack_module.functions.iter().map(|f| f.signature).collect();
    for (index, stack_fn) in stack_module.functions.iter().enumerate() {
        let id = FunctionId::new(index as u32);
        let function = construct_function(&mut module, stack_fn, id, &signatures, platform)?;
        module.add_function(function);
    }
    Ok(module)
}

/// Translate one stack-IR function into SSA form.
pub fn construct_function(
    module: &mut Module,
    stack_fn: &StackFunction,
    id: FunctionId,
    callee_signatures: &[TypeId],
    _platform: &dyn TargetPlatform,
) -> KefirResult<OptFunction> {
    let body = &stack_fn.body;
    if body.is_empty() {
        return Err(KefirError::malformed_ir(
            "function body has no instructions",
            None,
        ));
    }

    let boundaries = identify_block_boundaries(body);
    let successors = compute_successors(body, &boundaries)?;

    let mut container = CodeContainer::new();
    let block_ids: Vec<BlockId> = (0..boundaries.len())
        .map(|i| container.new_block(format!("bb{i}")))
        .collect();
    for (from, targets) in successors.iter().enumerate() {
        for &to in targets {
            container.block_mut(block_ids[to])?.add_predecessor(block_ids[from]);
        }
    }

    let predecessors = invert_successors(&successors);
    let order = reverse_postorder(0, &successors);

    let mut exit_stacks: Vec<Option<Vec<StackSlot>>> = vec![None; boundaries.len()];
    let mut pending: HashMap<usize, Vec<(usize, Vec<PhiId>)>> = HashMap::new();
    let mut cursor = DebugCursor::new();
    let mut debug_info = DebugInfo::new();

    let bool_ty = intern_bool(module);

    for &block_idx in &order {
        let entry_stack = if block_idx == 0 {
            Vec::new()
        } else {
            build_entry_stack(
                &mut container,
                &mut pending,
                &block_ids,
                block_idx,
                &predecessors[block_idx],
                &exit_stacks,
            )?
        };

        let start = boundaries[block_idx];
        let end = boundaries.get(block_idx + 1).copied().unwrap_or(body.len());
        let mut stack = entry_stack;
        let mut terminated = false;

        for op in &body[start..end] {
            match op {
                StackOpcode::LandingPad => {
                    container.block_mut(block_ids[block_idx])?.flags_mut().insert(BlockFlags::LANDING_PAD);
                }
                StackOpcode::SetDebugLocation(location) => cursor.set(location.clone()),
                StackOpcode::Pop => {
                    stack.pop().ok_or_else(|| stack_underflow())?;
                }
                StackOpcode::PushConstInt(value) => {
                    let (opcode, width, signed) = narrowest_int(*value);
                    let ty = intern_int(module, width, signed);
                    let instr =
                        emit(&mut container, &mut debug_info, &cursor, block_ids[block_idx], opcode, OperandData::IntConst(*value))?;
                    stack.push(StackSlot { value: instr, ty });
                }
                StackOpcode::PushConstFloat32(bits) => {
                    let ty = intern_simple(module, IrTypeKind::Float32, 4);
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::ConstFloat32,
                        OperandData::Float32Const(*bits),
                    )?;
                    stack.push(StackSlot { value: instr, ty });
                }
                StackOpcode::PushConstFloat64(bits) => {
                    let ty = intern_simple(module, IrTypeKind::Float64, 8);
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::ConstFloat64,
                        OperandData::Float64Const(*bits),
                    )?;
                    stack.push(StackSlot { value: instr, ty });
                }
                StackOpcode::PushConstBigInt { digits, width, signed } => {
                    let ty = intern_simple(
                        module,
                        IrTypeKind::BitInt {
                            width: *width as u16,
                            signed: *signed,
                        },
                        (*width as u32).div_ceil(8).min(16).next_power_of_two(),
                    );
                    let const_id = container.push_bigint_const(BigIntConst::new(digits.clone(), *width, *signed));
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::ConstBitInt,
                        OperandData::BigIntConst(const_id),
                    )?;
                    stack.push(StackSlot { value: instr, ty });
                }
                StackOpcode::PushUndefined(ty) => {
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Undefined,
                        OperandData::TypeOnly(*ty),
                    )?;
                    stack.push(StackSlot { value: instr, ty: *ty });
                }
                StackOpcode::GetParam(index) => {
                    let ty = param_type(module, stack_fn.signature, *index)?;
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::FunctionArg,
                        OperandData::Argument(*index),
                    )?;
                    stack.push(StackSlot { value: instr, ty });
                }
                StackOpcode::AddressOfLocal(local) => {
                    let ty = intern_simple(module, IrTypeKind::Pointer, 8);
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::LocalAddr,
                        OperandData::Local(*local),
                    )?;
                    debug_info.add_live_local(instr, *local);
                    stack.push(StackSlot { value: instr, ty });
                }
                StackOpcode::Load(ty) => {
                    let addr = pop(&mut stack)?;
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Load,
                        OperandData::RefWithType(addr.value, *ty),
                    )?;
                    stack.push(StackSlot { value: instr, ty: *ty });
                }
                StackOpcode::Store => {
                    let value = pop(&mut stack)?;
                    let addr = pop(&mut stack)?;
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Store,
                        OperandData::Binary(addr.value, value.value),
                    )?;
                }
                StackOpcode::Add
                | StackOpcode::Sub
                | StackOpcode::Mul
                | StackOpcode::UDiv
                | StackOpcode::SDiv
                | StackOpcode::URem
                | StackOpcode::SRem
                | StackOpcode::And
                | StackOpcode::Or
                | StackOpcode::Xor
                | StackOpcode::Shl
                | StackOpcode::LShr
                | StackOpcode::AShr
                | StackOpcode::FAdd
                | StackOpcode::FSub
                | StackOpcode::FMul
                | StackOpcode::FDiv => {
                    let opcode = binary_opcode(op);
                    let rhs = pop(&mut stack)?;
                    let lhs = pop(&mut stack)?;
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        opcode,
                        OperandData::Binary(lhs.value, rhs.value),
                    )?;
                    stack.push(StackSlot { value: instr, ty: lhs.ty });
                }
                StackOpcode::Neg | StackOpcode::Not | StackOpcode::FNeg => {
                    let opcode = unary_opcode(op);
                    let operand = pop(&mut stack)?;
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        opcode,
                        OperandData::Unary(operand.value),
                    )?;
                    stack.push(StackSlot { value: instr, ty: operand.ty });
                }
                StackOpcode::Compare(kind) => {
                    let rhs = pop(&mut stack)?;
                    let lhs = pop(&mut stack)?;
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Compare,
                        OperandData::Compare(lhs.value, rhs.value, *kind),
                    )?;
                    stack.push(StackSlot { value: instr, ty: bool_ty });
                }
                StackOpcode::Trunc(ty) | StackOpcode::ZExt(ty) | StackOpcode::SExt(ty) | StackOpcode::Bitcast(ty) => {
                    let opcode = cast_opcode(op);
                    let operand = pop(&mut stack)?;
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        opcode,
                        OperandData::RefWithType(operand.value, *ty),
                    )?;
                    stack.push(StackSlot { value: instr, ty: *ty });
                }
                StackOpcode::Call { function, arg_count } => {
                    let args = pop_n(&mut stack, *arg_count as usize)?;
                    let signature = callee_signatures
                        .get(function.index() as usize)
                        .copied()
                        .unwrap_or(stack_fn.signature);
                    let return_ty = return_type(module, signature)?;
                    let node = CallNode::new(Callee::Direct(*function), args, signature);
                    let node_id = container.new_call_node(node);
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Call,
                        OperandData::Call(node_id),
                    )?;
                    if let Some(ty) = return_ty {
                        stack.push(StackSlot { value: instr, ty });
                    }
                }
                StackOpcode::CallIndirect { signature, arg_count } => {
                    let callee = pop(&mut stack)?;
                    let args = pop_n(&mut stack, *arg_count as usize)?;
                    let return_ty = return_type(module, *signature)?;
                    let node = CallNode::new(Callee::Indirect(callee.value), args, *signature);
                    let node_id = container.new_call_node(node);
                    let instr = emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::CallIndirect,
                        OperandData::Call(node_id),
                    )?;
                    if let Some(ty) = return_ty {
                        stack.push(StackSlot { value: instr, ty });
                    }
                }
                StackOpcode::Jump(target) => {
                    let target_block = block_ids[block_index_of(&boundaries, *target)?];
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Jump,
                        OperandData::Jump(target_block),
                    )?;
                    terminated = true;
                }
                StackOpcode::BranchNonzero(target) | StackOpcode::BranchZero(target) => {
                    let opcode = if matches!(op, StackOpcode::BranchNonzero(_)) {
                        Opcode::BranchNonzero
                    } else {
                        Opcode::BranchZero
                    };
                    let condition = pop(&mut stack)?;
                    let if_true = block_ids[block_index_of(&boundaries, *target)?];
                    let targets = &successors[block_idx];
                    if targets.len() != 2 {
                        return Err(KefirError::malformed_ir(
                            "conditional branch has no fallthrough successor",
                            None,
                        ));
                    }
                    let if_false_idx = targets
                        .iter()
                        .copied()
                        .find(|&s| block_ids[s] != if_true)
                        .unwrap_or(targets[0]);
                    let if_false = block_ids[if_false_idx];
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        opcode,
                        OperandData::Branch {
                            condition: condition.value,
                            if_true,
                            if_false,
                        },
                    )?;
                    terminated = true;
                }
                StackOpcode::Switch { cases, default } => {
                    let value = pop(&mut stack)?;
                    let table = SwitchTable::new(
                        cases
                            .iter()
                            .map(|&(case, target)| Ok((case, block_ids[block_index_of(&boundaries, target)?])))
                            .collect::<KefirResult<Vec<_>>>()?,
                    );
                    let table_id = container.push_switch_table(table);
                    let default_block = block_ids[block_index_of(&boundaries, *default)?];
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Switch,
                        OperandData::Switch {
                            value: value.value,
                            table: table_id,
                            default: default_block,
                        },
                    )?;
                    terminated = true;
                }
                StackOpcode::Return => {
                    let value = pop(&mut stack)?;
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Return,
                        OperandData::Return(value.value),
                    )?;
                    terminated = true;
                }
                StackOpcode::ReturnVoid => {
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::ReturnVoid,
                        OperandData::None,
                    )?;
                    terminated = true;
                }
                StackOpcode::Unreachable => {
                    emit(
                        &mut container,
                        &mut debug_info,
                        &cursor,
                        block_ids[block_idx],
                        Opcode::Unreachable,
                        OperandData::None,
                    )?;
                    terminated = true;
                }
            }
        }

        if !terminated {
            let &fallthrough = successors[block_idx]
                .first()
                .ok_or_else(|| KefirError::malformed_ir("block falls off the end with no successor", None))?;
            emit(
                &mut container,
                &mut debug_info,
                &cursor,
                block_ids[block_idx],
                Opcode::Jump,
                OperandData::Jump(block_ids[fallthrough]),
            )?;
        }

        resolve_pending(&mut container, &mut pending, &block_ids, block_idx, &stack)?;
        exit_stacks[block_idx] = Some(stack);
    }

    let mut function = OptFunction::new(id, stack_fn.name.clone(), stack_fn.signature, stack_fn.locals_type, block_ids[0], container);
    *function.debug_info_mut() = debug_info;
    Ok(function)
}

fn emit(
    container: &mut CodeContainer,
    debug_info: &mut DebugInfo,
    cursor: &DebugCursor,
    block: BlockId,
    opcode: Opcode,
    operands: OperandData,
) -> KefirResult<InstructionRef> {
    let instr = container.append_instruction(block, opcode, operands)?;
    debug_info.record_location(instr, cursor.current());
    Ok(instr)
}

fn pop(stack: &mut Vec<StackSlot>) -> KefirResult<StackSlot> {
    stack.pop().ok_or_else(stack_underflow)
}

fn pop_n(stack: &mut Vec<StackSlot>, count: usize) -> KefirResult<Vec<InstructionRef>> {
    if stack.len() < count {
        return Err(stack_underflow());
    }
    let start = stack.len() - count;
    Ok(stack.split_off(start).into_iter().map(|s| s.value).collect())
}

fn stack_underflow() -> KefirError {
    KefirError::malformed_ir("symbolic operand stack underflow during construction", None)
}

fn build_entry_stack(
    container: &mut CodeContainer,
    pending: &mut HashMap<usize, Vec<(usize, Vec<PhiId>)>>,
    block_ids: &[BlockId],
    block_idx: usize,
    predecessors: &[usize],
    exit_stacks: &[Option<Vec<StackSlot>>],
) -> KefirResult<Vec<StackSlot>> {
    let block = block_ids[block_idx];
    if predecessors.len() == 1 {
        if let Some(stack) = &exit_stacks[predecessors[0]] {
            return Ok(stack.clone());
        }
    }

    let known: Vec<&Vec<StackSlot>> = predecessors.iter().filter_map(|&p| exit_stacks[p].as_ref()).collect();
    let Some(reference) = known.first() else {
        // Unreachable block (no predecessor processed yet, including the
        // entry-less case): nothing to merge.
        return Ok(Vec::new());
    };
    let depth = reference.len();
    for stack in &known {
        if stack.len() != depth {
            return Err(KefirError::malformed_ir(
                "predecessor operand stacks have mismatched depth at a merge point",
                None,
            ));
        }
    }

    let mut phi_ids = Vec::with_capacity(depth);
    let mut entry_stack = Vec::with_capacity(depth);
    for slot in reference.iter() {
        let phi = container.new_phi(block);
        let instr = container.append_instruction(block, Opcode::GetBlockInput, OperandData::BlockInput(phi))?;
        container.block_mut(block)?.push_input(instr, phi);
        phi_ids.push(phi);
        entry_stack.push(StackSlot { value: instr, ty: slot.ty });
    }

    for &pred in predecessors {
        let pred_block = block_ids[pred];
        match &exit_stacks[pred] {
            Some(stack) if stack.len() == depth => {
                for (i, phi) in phi_ids.iter().enumerate() {
                    container.phi_mut(*phi)?.set_incoming(pred_block, stack[i].value);
                }
            }
            Some(_) => {
                return Err(KefirError::malformed_ir(
                    "predecessor operand stack depth mismatch resolving a block input",
                    None,
                ))
            }
            None => pending.entry(pred).or_default().push((block_idx, phi_ids.clone())),
        }
    }
    Ok(entry_stack)
}

fn resolve_pending(
    container: &mut CodeContainer,
    pending: &mut HashMap<usize, Vec<(usize, Vec<PhiId>)>>,
    block_ids: &[BlockId],
    finished_block: usize,
    exit_stack: &[StackSlot],
) -> KefirResult<()> {
    let Some(waiting) = pending.remove(&finished_block) else {
        return Ok(());
    };
    let pred_block = block_ids[finished_block];
    for (_waiting_block, phi_ids) in waiting {
        if exit_stack.len() != phi_ids.len() {
            return Err(KefirError::malformed_ir(
                "back-edge operand stack depth mismatch resolving a loop header's block inputs",
                None,
            ));
        }
        for (i, phi) in phi_ids.iter().enumerate() {
            container.phi_mut(*phi)?.set_incoming(pred_block, exit_stack[i].value);
        }
    }
    Ok(())
}

fn identify_block_boundaries(body: &[StackOpcode]) -> Vec<usize> {
    use std::collections::BTreeSet;
    let mut boundaries = BTreeSet::new();
    boundaries.insert(0);
    for (i, op) in body.iter().enumerate() {
        if matches!(op, StackOpcode::LandingPad) {
            boundaries.insert(i);
        }
        for target in explicit_targets(op) {
            boundaries.insert(target);
        }
        if is_terminator(op) && i + 1 < body.len() {
            boundaries.insert(i + 1);
        }
    }
    boundaries.into_iter().collect()
}

fn compute_successors(body: &[StackOpcode], boundaries: &[usize]) -> KefirResult<Vec<Vec<usize>>> {
    let mut successors = Vec::with_capacity(boundaries.len());
    for (idx, &start) in boundaries.iter().enumerate() {
        let end = boundaries.get(idx + 1).copied().unwrap_or(body.len());
        let last = &body[end - 1];
        let mut targets: Vec<usize> = if is_terminator(last) {
            explicit_targets(last)
        } else {
            Vec::new()
        };
        let falls_through = !is_terminator(last) || matches!(last, StackOpcode::BranchNonzero(_) | StackOpcode::BranchZero(_));
        if falls_through {
            if end < body.len() {
                targets.push(end);
            } else if !is_terminator(last) {
                return Err(KefirError::malformed_ir(
                    "function body falls off the end without a terminator",
                    None,
                ));
            }
        }
        let mapped = targets
            .into_iter()
            .map(|t| block_index_of(boundaries, t))
            .collect::<KefirResult<Vec<_>>>()?;
        successors.push(mapped);
    }
    Ok(successors)
}

fn invert_successors(successors: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut predecessors = vec![Vec::new(); successors.len()];
    for (from, targets) in successors.iter().enumerate() {
        for &to in targets {
            predecessors[to].push(from);
        }
    }
    predecessors
}

fn reverse_postorder(entry: usize, successors: &[Vec<usize>]) -> Vec<usize> {
    let mut visited = vec![false; successors.len()];
    let mut postorder = Vec::new();
    let mut stack = vec![(entry, 0usize)];
    visited[entry] = true;
    while let Some(&mut (node, ref mut next)) = stack.last_mut() {
        if *next < successors[node].len() {
            let candidate = successors[node][*next];
            *next += 1;
            if !visited[candidate] {
                visited[candidate] = true;
                stack.push((candidate, 0));
            }
        } else {
            postorder.push(node);
            stack.pop();
        }
    }
    postorder.reverse();
    for (idx, seen) in visited.iter().enumerate() {
        if !seen {
            postorder.push(idx);
        }
    }
    postorder
}

fn block_index_of(boundaries: &[usize], offset: usize) -> KefirResult<usize> {
    boundaries
        .binary_search(&offset)
        .map_err(|_| KefirError::malformed_ir(format!("branch target {offset} is not a block boundary"), None))
}

fn is_terminator(op: &StackOpcode) -> bool {
    matches!(
        op,
        StackOpcode::Jump(_)
            | StackOpcode::BranchNonzero(_)
            | StackOpcode::BranchZero(_)
            | StackOpcode::Switch { .. }
            | StackOpcode::Return
            | StackOpcode::ReturnVoid
            | StackOpcode::Unreachable
    )
}

fn explicit_targets(op: &StackOpcode) -> Vec<usize> {
    match op {
        StackOpcode::Jump(t) | StackOpcode::BranchNonzero(t) | StackOpcode::BranchZero(t) => vec![*t],
        StackOpcode::Switch { cases, default } => {
            let mut targets: Vec<usize> = cases.iter().map(|&(_, t)| t).collect();
            targets.push(*default);
            targets
        }
        _ => Vec::new(),
    }
}

fn binary_opcode(op: &StackOpcode) -> Opcode {
    match op {
        StackOpcode::Add => Opcode::Add,
        StackOpcode::Sub => Opcode::Sub,
        StackOpcode::Mul => Opcode::Mul,
        StackOpcode::UDiv => Opcode::UDiv,
        StackOpcode::SDiv => Opcode::SDiv,
        StackOpcode::URem => Opcode::URem,
        StackOpcode::SRem => Opcode::SRem,
        StackOpcode::And => Opcode::And,
        StackOpcode::Or => Opcode::Or,
        StackOpcode::Xor => Opcode::Xor,
        StackOpcode::Shl => Opcode::Shl,
        StackOpcode::LShr => Opcode::LShr,
        StackOpcode::AShr => Opcode::AShr,
        StackOpcode::FAdd => Opcode::FAdd,
        StackOpcode::FSub => Opcode::FSub,
        StackOpcode::FMul => Opcode::FMul,
        StackOpcode::FDiv => Opcode::FDiv,
        _ => unreachable!("binary_opcode called with a non-binary stack opcode"),
    }
}

fn unary_opcode(op: &StackOpcode) -> Opcode {
    match op {
        StackOpcode::Neg => Opcode::Neg,
        StackOpcode::Not => Opcode::Not,
        StackOpcode::FNeg => Opcode::FNeg,
        _ => unreachable!("unary_opcode called with a non-unary stack opcode"),
    }
}

fn cast_opcode(op: &StackOpcode) -> Opcode {
    match op {
        StackOpcode::Trunc(_) => Opcode::Trunc,
        StackOpcode::ZExt(_) => Opcode::ZExt,
        StackOpcode::SExt(_) => Opcode::SExt,
        StackOpcode::Bitcast(_) => Opcode::Bitcast,
        _ => unreachable!("cast_opcode called with a non-cast stack opcode"),
    }
}

fn narrowest_int(value: i64) -> (Opcode, u8, bool) {
    if i8::try_from(value).is_ok() {
        (Opcode::ConstInt8, 8, true)
    } else if i16::try_from(value).is_ok() {
        (Opcode::ConstInt16, 16, true)
    } else if i32::try_from(value).is_ok() {
        (Opcode::ConstInt32, 32, true)
    } else {
        (Opcode::ConstInt64, 64, true)
    }
}

fn intern_int(module: &mut Module, width: u8, signed: bool) -> TypeId {
    module
        .types_mut()
        .intern(IrType { kind: IrTypeKind::Int { width, signed }, alignment: (width as u32 / 8).max(1) })
}

fn intern_simple(module: &mut Module, kind: IrTypeKind, alignment: u32) -> TypeId {
    module.types_mut().intern(IrType { kind, alignment })
}

fn intern_bool(module: &mut Module) -> TypeId {
    module.types_mut().intern(IrType { kind: IrTypeKind::Bool, alignment: 1 })
}

fn param_type(module: &Module, signature: TypeId, index: u32) -> KefirResult<TypeId> {
    match module.types().get(signature).map(|t| &t.kind) {
        Some(IrTypeKind::Function { params, .. }) => params
            .get(index as usize)
            .copied()
            .ok_or_else(|| KefirError::out_of_bounds(index as usize, params.len())),
        _ => Err(KefirError::malformed_ir("signature type is not a function type", None)),
    }
}

fn return_type(module: &Module, signature: TypeId) -> KefirResult<Option<TypeId>> {
    match module.types().get(signature).map(|t| &t.kind) {
        Some(IrTypeKind::Function { return_type, .. }) => Ok(*return_type),
        _ => Err(KefirError::malformed_ir("signature type is not a function type", None)),
    }
}
