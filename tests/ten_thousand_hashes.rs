//! This module is an integration test that checks the analysis of a real
//! contract containing a single loop.
#![cfg(test)]

use bytecode_flow_analyzer::{
    flow::{
        cfg::{EdgeKind, EdgeTarget},
        loops::LoopDescriptor,
    },
    opcode::Opcode,
    query,
    query::stats::{jump_counts, JumpCounts},
};

mod common;

#[test]
fn finds_the_single_loop() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::TEN_THOUSAND_HASHES)?;
    let loops = query::loops(analyzer.program());

    // The back-edge is the `JUMP` at the end of the body, returning to the
    // `JUMPDEST` that begins the loop condition.
    assert_eq!(
        loops,
        vec![LoopDescriptor {
            source: 0x5d,
            target: 0x34,
            kind:   EdgeKind::Unconditional,
        }]
    );

    Ok(())
}

#[test]
fn loop_condition_branches_out_of_the_loop() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::TEN_THOUSAND_HASHES)?;
    let cfg = analyzer.program().control_flow();

    // PUSH2 0x4e20 is the bound of the loop.
    let head = cfg.block_at(0x34).expect("Loop head is a block");
    let bound = &analyzer.program().block_instructions(head)[1];
    assert_eq!(bound.immediate(), &[0x4e, 0x20]);

    // The JUMPI is taken to the exit, and otherwise falls into the body.
    let condition: Vec<_> = head.successors().to_vec();
    assert_eq!(condition.len(), 2);
    assert_eq!(condition[0].kind, EdgeKind::ConditionalTaken);
    assert_eq!(condition[0].source, 0x3d);
    assert_eq!(condition[0].target, EdgeTarget::Block(0x5e));
    assert_eq!(condition[1].kind, EdgeKind::ConditionalNotTaken);
    assert_eq!(condition[1].target, EdgeTarget::Block(0x3e));

    let body = cfg.block_containing(0x50).expect("Body is a block");
    assert_eq!(body.start(), 0x3e);
    assert_eq!(body.len(), 26);
    assert_eq!(body.successors()[0].target, EdgeTarget::Block(0x34));

    // The head is reached from before the loop and from the end of the body.
    let sources: Vec<u32> = cfg.predecessors(0x34).map(|e| e.source).collect();
    assert_eq!(sources, vec![0x33, 0x5d]);

    Ok(())
}

#[test]
fn partitions_the_runtime_into_blocks() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::TEN_THOUSAND_HASHES)?;
    let program = analyzer.program();
    let cfg = program.control_flow();

    let shape: Vec<(u32, usize)> = cfg.blocks().iter().map(|b| (b.start(), b.len())).collect();
    assert_eq!(
        shape,
        vec![
            (0x00, 8),
            (0x0b, 3),
            (0x0e, 7),
            (0x17, 9),
            (0x26, 4),
            (0x2a, 4),
            (0x30, 2),
            (0x32, 2),
            (0x34, 7),
            (0x3e, 26),
            (0x5e, 3),
            (0x61, 10),
        ]
    );
    assert_eq!(cfg.edges().count(), 12);

    // The return from the function is a jump to a value from the stack.
    let dynamic: Vec<u32> = cfg
        .edges()
        .filter(|e| e.target == EdgeTarget::Dynamic)
        .map(|e| e.source)
        .collect();
    assert_eq!(dynamic, vec![0x60]);

    // `JUMPDEST; STOP` has nowhere to go.
    assert!(cfg.block_at(0x30).map_or(false, |b| b.successors().is_empty()));

    Ok(())
}

#[test]
fn counts_jump_instructions() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::TEN_THOUSAND_HASHES)?;
    let program = analyzer.program();

    assert_eq!(
        jump_counts(program),
        JumpCounts {
            jump:     3,
            jumpi:    4,
            jumpdest: 7,
            total:    14,
        }
    );
    assert_eq!(
        program.jump_destinations().iter().collect::<Vec<_>>(),
        vec![14, 38, 42, 48, 50, 52, 94]
    );
    assert_eq!(query::count_opcode(program, Opcode::new(0x5b)), 7);

    Ok(())
}

#[test]
fn metadata_truncates_the_final_push() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::TEN_THOUSAND_HASHES)?;
    let program = analyzer.program();

    assert_eq!(program.len(), 151);
    assert_eq!(program.instructions().len(), 85);

    let last = program.instructions().last().expect("Program is not empty");
    assert_eq!(last.offset(), 143);
    assert_eq!(last.opcode(), Opcode::new(0x6c));
    assert_eq!(last.declared_immediate_size(), 13);
    assert_eq!(last.immediate().len(), 7);
    assert!(last.is_truncated());

    let report = analyzer.report();
    assert!(report.stats.truncated_tail);
    assert_eq!(report.stats.push_count, 27);

    Ok(())
}

#[test]
fn analyzes_the_runtime_without_metadata() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::ten_thousand_hashes_without_metadata())?;
    let report = analyzer.report();

    assert_eq!(report.stats.length, common::TEN_THOUSAND_HASHES_CODE_SIZE);
    assert_eq!(report.stats.instruction_count, 76);
    assert_eq!(report.stats.unique_opcodes, 28);
    assert_eq!(report.stats.push_count, 24);
    assert_eq!(report.stats.jump_count, 7);
    assert_eq!(report.stats.jumpdest_count, 7);
    assert_eq!(report.stats.invalid_opcode_count, 1);
    assert!(!report.stats.truncated_tail);

    // The same single loop is found.
    assert_eq!(report.loops.len(), 1);
    assert_eq!(report.loops[0].target, 0x34);

    assert_eq!(report.blocks.total_blocks, 12);
    assert_eq!(report.blocks.min_length, 1);
    assert_eq!(report.blocks.max_length, 26);
    assert_eq!(report.blocks.single_instruction_blocks.get("INVALID"), Some(&1));

    assert_eq!(report.sequences[0].sequence, vec!["PUSH1", "JUMPI"]);
    assert_eq!(report.sequences[0].count, 4);
    assert!(report.sequences.windows(2).all(|w| w[0].count >= w[1].count));

    Ok(())
}

#[test]
fn report_serializes_to_json() -> anyhow::Result<()> {
    let analyzer = common::analyze_hex(common::TEN_THOUSAND_HASHES)?;
    let json = serde_json::to_value(analyzer.report())?;

    assert_eq!(json["fork"], "Cancun");
    assert_eq!(json["loops"][0]["source"], 0x5d);
    assert_eq!(json["loops"][0]["target"], 0x34);
    assert_eq!(json["jumps"]["total"], 14);
    assert_eq!(json["histogram"]["JUMPDEST"], 7);

    Ok(())
}
