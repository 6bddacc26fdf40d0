//! Property tests for drum rotation and order timing.

use lgp30::cpu::drum::{rotational_latency, SECTORS_PER_TRACK};
use lgp30::{Address, Cpu, CpuConfig, Drum, InstructionSet, Opcode, Word};
use proptest::prelude::*;

fn sector() -> impl Strategy<Value = u8> {
    0u8..SECTORS_PER_TRACK as u8
}

fn drum_at(head: u8) -> Drum {
    let mut drum = Drum::new();
    for _ in 0..head {
        drum.tick();
    }
    drum
}

proptest! {
    #[test]
    fn latency_stays_within_one_revolution(current in sector(), target in sector()) {
        let wait = rotational_latency(current, target);
        prop_assert!(wait < SECTORS_PER_TRACK as u32);
        prop_assert_eq!(wait == 0, current == target);
        // Rotating by the wait lands exactly on the target
        prop_assert_eq!((current as u32 + wait) % SECTORS_PER_TRACK as u32, target as u32);
    }

    #[test]
    fn drum_latency_matches_head(head in sector(), track in sector(), target in sector()) {
        let drum = drum_at(head);
        prop_assert_eq!(drum.head(), head);
        prop_assert_eq!(drum.calculate_latency(target), rotational_latency(head, target));
        prop_assert_eq!(drum.read(track, target).1, rotational_latency(head, target));
    }

    #[test]
    fn full_revolution_returns_head(head in sector()) {
        let mut drum = drum_at(head);
        for _ in 0..SECTORS_PER_TRACK {
            drum.tick();
        }
        prop_assert_eq!(drum.head(), head);
    }

    #[test]
    fn write_then_read_sees_value(head in sector(), track in sector(), target in sector(), value in any::<i32>()) {
        let mut drum = drum_at(head);
        let write_wait = drum.write(track, target, Word::new(value));
        let (read, read_wait) = drum.read(track, target);
        prop_assert_eq!(read, Word::new(value));
        prop_assert_eq!(write_wait, read_wait);
        prop_assert_eq!(drum.head(), head);
    }

    /// Whatever the program, the clock equals the sum of every order's
    /// reported costs and the head sits where that many ticks put it.
    #[test]
    fn clock_is_sum_of_step_costs(
        words in prop::collection::vec(any::<u32>(), 1..64),
        steps in 1usize..128,
    ) {
        let config = CpuConfig {
            instruction_set: InstructionSet::Extended,
            ..CpuConfig::default()
        };
        let mut drum = Drum::new();
        drum.load(Address::ZERO, &words.iter().map(|w| Word::from_bits(*w)).collect::<Vec<_>>())
            .unwrap();
        let mut cpu = Cpu::with_drum(drum, config);

        let mut expected = 0u64;
        for _ in 0..steps {
            let Some(report) = cpu.step() else { break };
            prop_assert!(report.fetch_ticks >= 1 && report.fetch_ticks <= SECTORS_PER_TRACK as u64);
            prop_assert!(report.execute_ticks < SECTORS_PER_TRACK as u64);
            if !report.instruction.opcode.touches_drum() {
                prop_assert_eq!(report.execute_ticks, 0);
            }
            expected += report.ticks();
        }

        prop_assert_eq!(cpu.total_ticks(), expected);
        prop_assert_eq!(cpu.drum().head() as u64, expected % SECTORS_PER_TRACK as u64);
    }

    #[test]
    fn halted_step_changes_nothing(acc in any::<i32>()) {
        let mut cpu = Cpu::new();
        cpu.poke(1, 0, Word::new(acc));
        cpu.poke(0, 0, Word::instruction(Opcode::Bring.code(), 64));
        cpu.poke(0, 1, Word::instruction(Opcode::Stop.code(), 0));
        cpu.run(10);
        prop_assert!(cpu.is_halted());

        let snapshot = (cpu.accumulator(), cpu.instruction_counter(), cpu.total_ticks(), cpu.drum().head());
        prop_assert!(cpu.step().is_none());
        prop_assert_eq!(
            snapshot,
            (cpu.accumulator(), cpu.instruction_counter(), cpu.total_ticks(), cpu.drum().head())
        );
        prop_assert_eq!(cpu.accumulator(), Word::new(acc));
    }
}
