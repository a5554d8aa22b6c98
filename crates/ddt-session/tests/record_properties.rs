use ddt_core::{BlockType, SubjectId};
use ddt_session::{decode_records, encode_records, Trial, TrialLog};
use proptest::prelude::*;

fn arb_trial() -> impl Strategy<Value = Trial> {
    (
        1001u16..=9999,
        1u32..4,
        prop::bool::ANY,
        (0.0f64..1.0, 0.43f64..520.0),
        (10.0f64..780.0, 0u8..2, 0.0f64..30.0),
        (1e-4f64..10.0, 0.0f64..5.0, 0.0f64..5.0, 0.0f64..2.5),
    )
        .prop_map(
            |(subject, block, ado, (t_ss, t_ll), (r_ss, resp_ss, rt), (mean_k, mean_tau, sd_k, sd_tau))| Trial {
                subject: SubjectId::new(subject).unwrap(),
                block,
                block_type: if ado { BlockType::Ado } else { BlockType::Fixed },
                trial: 0,
                t_ss,
                t_ll: t_ss + t_ll,
                r_ss,
                r_ll: 800.0,
                resp_ss,
                rt,
                mean_k,
                mean_tau,
                sd_k,
                sd_tau,
            },
        )
}

proptest! {
    // the codec must be lossless: floats are written in shortest round-trip
    // form, so decode(encode(log)) reproduces the log bit for bit
    #[test]
    fn tsv_round_trip_is_lossless(trials in prop::collection::vec(arb_trial(), 0..25)) {
        let mut log = TrialLog::new();
        for trial in trials {
            log.append(trial);
        }
        let encoded = encode_records(&log).unwrap();
        let decoded = decode_records(&encoded).unwrap();
        prop_assert_eq!(decoded, log);
    }
}
