//! End-to-end machine scenarios: program on the drum, step, inspect.

use lgp30::cpu::decode::encode;
use lgp30::{
    assemble, Address, Cpu, CpuConfig, Diagnostic, Drum, Instruction, InstructionSet, Opcode,
    Word,
};

fn order(opcode: Opcode, track: u8, sector: u8) -> Word {
    encode(&Instruction::new(opcode, Address::from_parts(track, sector).unwrap()))
}

#[test]
fn fresh_machine_is_zeroed() {
    let cpu = Cpu::new();
    assert_eq!(cpu.accumulator(), Word::ZERO);
    assert_eq!(cpu.instruction_counter().value(), 0);
    assert!(!cpu.is_halted());
    assert!(cpu.drum().words().iter().all(|w| w.is_zero()));
    assert_eq!(cpu.drum().words().len(), 4096);
}

#[test]
fn bring_loads_operand() {
    let mut cpu = Cpu::new();
    cpu.poke(3, 5, Word::new(0xABCD));
    cpu.poke(0, 0, Word::from_bits((0x1 << 16) | (197 << 2)));

    cpu.step();

    assert_eq!(cpu.accumulator(), Word::new(0xABCD));
    assert_eq!(cpu.instruction_counter().value(), 1);
}

#[test]
fn hold_persists_accumulator() {
    let mut cpu = Cpu::new();
    cpu.poke(2, 0, Word::new(0x1234));
    cpu.poke(0, 0, order(Opcode::Bring, 2, 0));
    cpu.poke(0, 1, order(Opcode::Hold, 1, 0));

    cpu.step();
    assert_eq!(cpu.accumulator(), Word::new(0x1234));
    cpu.step();

    let target = Address::from_parts(1, 0).unwrap();
    assert_eq!(cpu.drum().peek(target), Word::new(0x1234));
    assert_eq!(cpu.accumulator(), Word::new(0x1234));
}

#[test]
fn stop_halts_for_good() {
    let mut cpu = Cpu::new();
    cpu.poke(0, 0, order(Opcode::Stop, 0, 0));

    cpu.step();
    assert!(cpu.is_halted());

    let counter = cpu.instruction_counter();
    let acc = cpu.accumulator();
    let ticks = cpu.total_ticks();
    assert!(cpu.step().is_none());
    assert_eq!(cpu.instruction_counter(), counter);
    assert_eq!(cpu.accumulator(), acc);
    assert_eq!(cpu.total_ticks(), ticks);
}

#[test]
fn unimplemented_opcodes_are_reported_no_ops() {
    for code in (0u8..16).filter(|c| ![0x1, 0xE, 0xF].contains(c)) {
        let mut cpu = Cpu::new();
        let word = Word::instruction(code, 197);
        cpu.poke(0, 0, word);
        cpu.poke(3, 5, Word::new(99));
        let before = cpu.drum().words().to_vec();

        let report = cpu.step().expect("machine is running");

        assert_eq!(cpu.accumulator(), Word::ZERO, "opcode {code:X}");
        assert_eq!(cpu.drum().words(), &before[..], "opcode {code:X}");
        assert_eq!(cpu.instruction_counter().value(), 1);
        assert!(cpu.is_running());
        assert_eq!(
            report.diagnostic,
            Some(Diagnostic::UnimplementedInstruction {
                opcode: Opcode::from_code(code),
                location: Address::ZERO,
            })
        );
    }
}

#[test]
fn elapsed_ticks_match_reported_waits() {
    let mut cpu = Cpu::new();
    let program = [
        order(Opcode::Bring, 5, 40),
        order(Opcode::Hold, 6, 3),
        order(Opcode::Bring, 7, 63),
        order(Opcode::Subtract, 0, 0),
        order(Opcode::Hold, 5, 2),
        order(Opcode::Bring, 0, 0),
    ];
    for (sector, word) in program.iter().enumerate() {
        cpu.poke(0, sector as u8, *word);
    }

    let mut expected = 0;
    for _ in 0..program.len() {
        let head = cpu.drum().head();
        let counter = cpu.instruction_counter();
        let report = cpu.step().unwrap();

        let fetch_wait = lgp30::cpu::drum::rotational_latency(head, counter.sector()) as u64;
        assert_eq!(report.fetch_ticks, fetch_wait + 1);
        assert!(report.execute_ticks < 64);
        expected += report.fetch_ticks + report.execute_ticks;
    }
    assert_eq!(cpu.total_ticks(), expected);
    // Sector 2 is fetched just after the head passes it: a full revolution
    assert_eq!(expected, (1 + 39) + (26 + 1) + (64 + 60) + (5 + 0) + (1 + 61) + (4 + 58));
}

#[test]
fn fetch_waits_for_instruction_sector() {
    let mut cpu = Cpu::new();
    // Counter 0 fetched, head lands on 1; Bring operand sector 1 is immediate
    cpu.poke(0, 0, order(Opcode::Bring, 9, 1));

    let report = cpu.step().unwrap();
    assert_eq!(report.fetch_ticks, 1);
    assert_eq!(report.execute_ticks, 0);

    // Next order at sector 1 is already under the head
    let report = cpu.step().unwrap();
    assert_eq!(report.fetch_ticks, 1);
}

#[test]
fn assembled_loop_with_extended_set() {
    // Count down from 3 to 0, adding 10 to a total each pass
    let source = r#"
        LOOP:   B COUNT
                S ONE
                H COUNT
                T DONE
                B TOTAL
                A TEN
                H TOTAL
                U LOOP
        DONE:   Z

                ORG 2.0
        COUNT:  DAT 3
        ONE:    DAT 1
        TEN:    DAT 10
        TOTAL:  DAT 0
    "#;
    let image = assemble(source).unwrap();
    let mut drum = Drum::new();
    image.load_into(&mut drum);
    let config = CpuConfig {
        instruction_set: InstructionSet::Extended,
        ..CpuConfig::default()
    };
    let mut cpu = Cpu::with_drum(drum, config);

    cpu.run(1000);

    assert!(cpu.is_halted());
    let total = Address::from_parts(2, 3).unwrap();
    assert_eq!(cpu.drum().peek(total), Word::new(30));
    assert!(cpu.take_diagnostics().is_empty());
}
