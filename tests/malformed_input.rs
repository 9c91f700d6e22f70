//! This module is an integration test that checks the handling of input that
//! is malformed, empty, or otherwise unusual.
#![cfg(test)]

use bytecode_flow_analyzer::{
    analyzer::chain::Chain,
    contract::Contract,
    error::{disassembly, Error},
    opcode::table::InstructionSet,
    Program,
};

mod common;

#[test]
fn rejects_odd_length_hex() {
    for input in ["0x6", "600", "0x60015"] {
        let error = Contract::from_hex(input, Chain::default()).expect_err("Odd hex was accepted");
        assert!(error.is_malformed_hex());

        let Error::Disassembly(located) = error else {
            panic!("Wrong error kind for {input}");
        };
        assert_eq!(located.payload, disassembly::Error::InvalidHexLength);
    }
}

#[test]
fn rejects_non_hex_characters() {
    let error = Program::from_hex("0x60zz", InstructionSet::default()).expect_err("Accepted");

    assert_eq!(error.payload, disassembly::Error::InvalidHexCharacter('z', 4));
    assert_eq!(error.location, 4);
    assert!(error.payload.is_malformed_hex());
}

#[test]
fn empty_input_is_an_empty_program() -> anyhow::Result<()> {
    for input in ["", "0x", "0X"] {
        let analyzer = common::analyze_hex(input)?;
        let program = analyzer.program();
        assert!(program.is_empty());
        assert!(program.instructions().is_empty());
        assert!(program.jump_destinations().is_empty());
        assert!(program.control_flow().blocks().is_empty());

        let report = analyzer.report();
        assert_eq!(report.stats.instruction_count, 0);
        assert_eq!(report.blocks.total_blocks, 0);
        assert!(report.loops.is_empty());
        assert!(report.sequences.is_empty());
    }

    Ok(())
}

#[test]
fn a_lone_push_opcode_is_truncated() -> anyhow::Result<()> {
    // PUSH32 with none of its immediate present.
    let analyzer = common::analyze_hex("0x7f")?;
    let program = analyzer.program();

    assert_eq!(program.instructions().len(), 1);
    let push = &program.instructions()[0];
    assert!(push.immediate().is_empty());
    assert_eq!(push.declared_immediate_size(), 32);
    assert!(push.is_truncated());
    assert_eq!(push.size(), 1);

    Ok(())
}

#[test]
fn markers_hidden_in_push_data_are_not_destinations() -> anyhow::Result<()> {
    // 0x00: PUSH2 0x5b5b
    // 0x03: PUSH1 0x01
    // 0x05: JUMP
    // 0x06: JUMPDEST
    let analyzer = common::analyze_hex("615b5b600156 5b".replace(' ', "").as_str())?;
    let program = analyzer.program();

    assert_eq!(program.jump_destinations().iter().collect::<Vec<_>>(), vec![6]);

    // The jump targets the middle of the push, which is not a destination.
    let cfg = program.control_flow();
    let jump = &cfg.blocks()[0].successors()[0];
    assert_eq!(
        jump.target,
        bytecode_flow_analyzer::flow::cfg::EdgeTarget::InvalidDestination(1)
    );
    assert!(analyzer.report().loops.is_empty());

    Ok(())
}
