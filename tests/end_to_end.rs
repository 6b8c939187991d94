//! End-to-end runs through the coordinator, the wire protocol, and the
//! executor, using the in-process launcher and the fixture test plugin.

use std::path::Path;

use tempfile::tempdir;

use mutmatrix::baseline::BaselineContext;
use mutmatrix::bytecode::insn::{ArithOp, ClassFile, CmpOp, Insn, LineEntry, Method, Ty, Value};
use mutmatrix::coverage::{BlockLocation, CoverageDb};
use mutmatrix::matrix::MatrixEmitter;
use mutmatrix::minion::{Fixture, FixtureConfig, FixtureTestPlugin};
use mutmatrix::model::{
    DetailedTestResult, ExceptionDetail, IndexedMutation, MethodLocation, MutationDetails,
    MutationId, MutationStatus, StatusTestPair, TestCaseMetadata,
};
use mutmatrix::{
    EngineConfig, InProcessLauncher, MutationCoordinator, ProgramImage, parse_selection,
};

fn lines(line: u32) -> Vec<LineEntry> {
    vec![LineEntry { start: 0, line }]
}

fn int_fixture(test: &str, target_method: &str, args: Vec<i32>, expected: i32) -> Fixture {
    Fixture {
        test_name: format!("demo.CalcTest::{test}"),
        test_class: "demo.CalcTest".to_string(),
        target_class: "demo.Calc".to_string(),
        target_method: target_method.to_string(),
        args: args.into_iter().map(Value::Int).collect(),
        expected: Some(Value::Int(expected)),
    }
}

fn block(method: &str, descriptor: &str, block: u32) -> BlockLocation {
    BlockLocation {
        class: "demo.Calc".to_string(),
        method: method.to_string(),
        descriptor: descriptor.to_string(),
        block,
    }
}

fn run_coordinator(
    config: EngineConfig,
    image: ProgramImage,
    coverage: CoverageDb,
) -> mutmatrix::RunReport {
    MutationCoordinator::with_launcher(config, image, coverage, Box::new(InProcessLauncher))
        .run()
        .expect("coordinator run should succeed")
}

fn matrix_rows(report_dir: &Path) -> Vec<String> {
    let text = std::fs::read_to_string(report_dir.join("full_mutation_matrix.csv"))
        .expect("matrix should exist");
    text.lines().skip(1).map(str::to_string).collect()
}

/// AOR_1 on `int add(int a, int b) { return a + b; }` with two passing
/// tests: the sum-checking test flips P→F, the zero test stays P→P.
#[test]
fn s1_aor_on_add_kills_with_a_single_transition() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "add".to_string(),
            args: vec![Ty::Int, Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 2,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Load { ty: Ty::Int, slot: 1 },
                Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(3),
        }],
    }]);

    let mut coverage = CoverageDb::new();
    coverage.record_block(
        block("add", "(II)I", 0),
        [3],
        [
            "demo.CalcTest::t0_add".to_string(),
            "demo.CalcTest::t1_zero".to_string(),
        ],
    );

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures: vec![
            int_fixture("t0_add", "add", vec![2, 3], 5),
            int_fixture("t1_zero", "add", vec![0, 0], 0),
        ],
        fuel: None,
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["AOR_1"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_research_mode(true)
        .with_timeouts(2.0, 5000);

    let report = run_coordinator(config, image, coverage);
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.killed, 1);

    let (mutation, pair) = &report.classes[0].results[0];
    assert_eq!(mutation.details.id.operator, "AOR_1");
    assert_eq!(pair.status, MutationStatus::Killed);
    assert_eq!(pair.killing_tests, vec!["demo.CalcTest::t0_add".to_string()]);
    assert_eq!(pair.num_tests_run(), 2);

    let rows = matrix_rows(report_dir.path());
    assert_eq!(rows.len(), 1);
    let fields: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(fields[0], "0");
    assert_eq!(fields[1], "demo.Calc");
    assert_eq!(fields[2], "add");
    assert_eq!(fields[3], "3");
    assert_eq!(fields[4], "AOR_1");
    assert_eq!(fields[5], "10", "result transition");
    assert_eq!(fields[9], "killed");
    assert_eq!(fields[10], "2");
}

/// CRCR_2 on the literal `5` of `max5(x) = x > 5 ? x : 5`: with a failing
/// baseline test expecting `max5(0) == 0`, zeroing the returned constant
/// flips the passing test P→F and the failing test F→P.
#[test]
fn s2_crcr_zero_detects_via_both_transitions() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "max5".to_string(),
            args: vec![Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 1,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Const(Value::Int(5)),
                Insn::IfCmp { op: CmpOp::Gt, target: 5 },
                Insn::Const(Value::Int(5)),
                Insn::Return(Some(Ty::Int)),
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(7),
        }],
    }]);

    let mut coverage = CoverageDb::new();
    for b in 0..=2 {
        coverage.record_block(
            block("max5", "(I)I", b),
            [7],
            [
                "demo.CalcTest::t0_max".to_string(),
                "demo.CalcTest::t1_zero".to_string(),
            ],
        );
    }
    coverage.record_failing(
        "demo.CalcTest::t1_zero",
        ExceptionDetail {
            type_name: Some("AssertionError".to_string()),
            message: Some("expected 0 but was 5".to_string()),
            stack: Some("\tat demo.CalcTest.t1_zero(CalcTest.test:1)".to_string()),
        },
    );

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures: vec![
            int_fixture("t0_max", "max5", vec![3], 5),
            int_fixture("t1_zero", "max5", vec![0], 0),
        ],
        fuel: None,
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["CRCR_2"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_research_mode(true)
        .with_timeouts(2.0, 5000);

    let report = run_coordinator(config, image, coverage);
    // Two constant sites, two mutants; the returned-constant one detects on
    // both tests.
    assert_eq!(report.summary.total, 2);

    let rows = matrix_rows(report_dir.path());
    let both = rows
        .iter()
        .map(|r| r.split(',').collect::<Vec<_>>())
        .find(|f| f[5] == "11")
        .expect("one mutant flips both tests");
    assert_eq!(both[4], "CRCR_2");
    assert_eq!(both[6], "11", "exception type changes on both tests");
    assert_eq!(both[9], "killed");
}

/// A unary insertion that exceeds the method's declared stack capacity is
/// rejected on redefinition: non-viable, all-zero transitions, zero tests.
#[test]
fn s3_rejected_redefinition_is_non_viable() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "tight".to_string(),
            args: vec![Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 1,
            max_stack: 1,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(2),
        }],
    }]);

    let mut coverage = CoverageDb::new();
    coverage.record_block(
        block("tight", "(I)I", 0),
        [2],
        ["demo.CalcTest::t0_id".to_string()],
    );

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures: vec![int_fixture("t0_id", "tight", vec![9], 9)],
        fuel: None,
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["UOI_1"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_research_mode(true)
        .with_timeouts(2.0, 5000);

    let report = run_coordinator(config, image, coverage);
    assert_eq!(report.summary.non_viable, 1);

    let (_, pair) = &report.classes[0].results[0];
    assert_eq!(pair.status, MutationStatus::NonViable);
    assert_eq!(pair.covered_tests, vec!["demo.CalcTest::t0_id".to_string()]);
    assert_eq!(pair.num_tests_run(), 0);

    let rows = matrix_rows(report_dir.path());
    let fields: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(fields[5], "0");
    assert_eq!(fields[6], "0");
    assert_eq!(fields[7], "0");
    assert_eq!(fields[8], "0");
    assert_eq!(fields[9], "non_viable");
    assert_eq!(fields[10], "0");
}

/// One mutant of a ten-mutant unit loops forever; the executor exits with
/// the timeout code, a second executor finishes the remaining nine.
#[test]
fn s4_timeout_splits_the_unit_across_two_executors() {
    let spin = Method {
        name: "spin".to_string(),
        args: vec![Ty::Int],
        ret: Some(Ty::Int),
        max_locals: 2,
        max_stack: 2,
        insns: vec![
            Insn::Const(Value::Int(0)),
            Insn::Store { ty: Ty::Int, slot: 1 },
            Insn::Load { ty: Ty::Int, slot: 1 },
            Insn::Load { ty: Ty::Int, slot: 0 },
            Insn::IfCmp { op: CmpOp::Eq, target: 10 },
            Insn::Load { ty: Ty::Int, slot: 1 },
            Insn::Const(Value::Int(1)),
            Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
            Insn::Store { ty: Ty::Int, slot: 1 },
            Insn::Goto { target: 2 },
            Insn::Load { ty: Ty::Int, slot: 1 },
            Insn::Return(Some(Ty::Int)),
        ],
        lines: lines(10),
    };

    let mut methods = vec![spin];
    let mut fixtures = vec![int_fixture("t_spin", "spin", vec![5], 5)];
    for n in 1..=8 {
        methods.push(Method {
            name: format!("h{n}"),
            args: vec![Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 1,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Const(Value::Int(n)),
                Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(20 + n as u32),
        });
        fixtures.push(int_fixture(&format!("t_h{n}"), &format!("h{n}"), vec![1], 1 + n));
    }

    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods,
    }]);

    let mut coverage = CoverageDb::new();
    for b in 0..=3 {
        coverage.record_block(block("spin", "(I)I", b), [10], ["demo.CalcTest::t_spin".to_string()]);
    }
    for n in 1..=8u32 {
        coverage.record_block(
            block(&format!("h{n}"), "(I)I", 0),
            [20 + n],
            [format!("demo.CalcTest::t_h{n}")],
        );
    }

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures,
        fuel: Some(30_000_000),
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(
            parse_selection(&["REMOVE_CONDITIONALS_EQUAL_ELSE", "RETURN_VALS"]).unwrap(),
        )
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_timeouts(1.0, 300);

    let report = run_coordinator(config, image, coverage);
    assert_eq!(report.summary.total, 10);
    assert_eq!(report.summary.timed_out, 1, "the looping mutant times out");
    assert_eq!(report.summary.killed, 9, "the rest complete in a fresh executor");

    let timed_out = report.classes[0]
        .results
        .iter()
        .find(|(_, pair)| pair.status == MutationStatus::TimedOut)
        .map(|(m, _)| m.details.id.operator.clone())
        .unwrap();
    assert_eq!(timed_out, "REMOVE_CONDITIONALS_EQUAL_ELSE");
}

/// ROR_5 turns `<` into `!=` in a boundary check; exactly one test's
/// column flips.
#[test]
fn s5_ror5_flips_a_single_column() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "atLeast".to_string(),
            args: vec![Ty::Int, Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 2,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Load { ty: Ty::Int, slot: 1 },
                Insn::IfCmp { op: CmpOp::Lt, target: 5 },
                Insn::Const(Value::Int(1)),
                Insn::Return(Some(Ty::Int)),
                Insn::Const(Value::Int(0)),
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(4),
        }],
    }]);

    let test_names = [
        "demo.CalcTest::tAbove",
        "demo.CalcTest::tBelow",
        "demo.CalcTest::tBoundary",
    ];
    let mut coverage = CoverageDb::new();
    for b in 0..=2 {
        coverage.record_block(
            block("atLeast", "(II)I", b),
            [4],
            test_names.iter().map(|s| s.to_string()),
        );
    }

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures: vec![
            int_fixture("tAbove", "atLeast", vec![7, 5], 1),
            int_fixture("tBelow", "atLeast", vec![3, 5], 0),
            int_fixture("tBoundary", "atLeast", vec![5, 5], 1),
        ],
        fuel: None,
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["ROR_5"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_research_mode(true)
        .with_timeouts(2.0, 5000);

    let report = run_coordinator(config, image, coverage);
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.killed, 1);

    let rows = matrix_rows(report_dir.path());
    let fields: Vec<&str> = rows[0].split(',').collect();
    // tAbove holds tcID 0: `7 < 5` is false but `7 != 5` is true.
    assert_eq!(fields[5], "100");
    assert_eq!(fields[9], "killed");
}

/// Full-matrix emission for 3 mutants × 4 tests, baseline [P,P,F,P].
#[test]
fn s6_matrix_bit_strings_follow_the_outcome_table() {
    fn meta(tc_id: u32, name: &str, passed: bool) -> (String, TestCaseMetadata) {
        (
            name.to_string(),
            TestCaseMetadata {
                tc_id,
                test_name: name.to_string(),
                passed,
                exception: ExceptionDetail::none(),
                duration_ms: 1,
            },
        )
    }

    let baseline = BaselineContext::from_metadata(
        [
            meta(0, "t0", true),
            meta(1, "t1", true),
            meta(2, "t2", false),
            meta(3, "t3", true),
        ]
        .into_iter()
        .collect(),
    );

    fn mutation(mutant_id: u64) -> IndexedMutation {
        IndexedMutation {
            mutant_id,
            details: MutationDetails {
                id: MutationId {
                    location: MethodLocation {
                        class: "demo.Calc".to_string(),
                        method: "m".to_string(),
                        descriptor: "()I".to_string(),
                        first_line: 1,
                        block: 0,
                    },
                    operator: "MATH".to_string(),
                    index: mutant_id as u32,
                    description: "replaced int + with -".to_string(),
                },
                source_file: "Calc.src".to_string(),
                line: 1,
                covering_tests: vec!["t0".into(), "t1".into(), "t2".into(), "t3".into()],
            },
        }
    }

    fn pair_for(outcomes: [bool; 4]) -> StatusTestPair {
        let baseline_passed = [true, true, false, true];
        let detailed: Vec<DetailedTestResult> = outcomes
            .iter()
            .enumerate()
            .map(|(i, &passed)| DetailedTestResult {
                test_name: format!("t{i}"),
                passed,
                exception: ExceptionDetail::none(),
                duration_ms: 1,
            })
            .collect();
        let mut killing = Vec::new();
        let mut surviving = Vec::new();
        for (i, &passed) in outcomes.iter().enumerate() {
            if passed != baseline_passed[i] {
                killing.push(format!("t{i}"));
            } else {
                surviving.push(format!("t{i}"));
            }
        }
        let status = if killing.is_empty() {
            MutationStatus::Survived
        } else {
            MutationStatus::Killed
        };
        StatusTestPair {
            status,
            killing_tests: killing,
            surviving_tests: surviving,
            covered_tests: (0..4).map(|i| format!("t{i}")).collect(),
            detailed,
        }
    }

    let report_dir = tempdir().unwrap();
    let mut emitter = MatrixEmitter::create(report_dir.path(), true, false).unwrap();
    let outcomes = [
        [true, false, false, true],
        [true, true, false, true],
        [false, true, true, true],
    ];
    for (i, outcome) in outcomes.iter().enumerate() {
        let pair = pair_for(*outcome);
        emitter.emit(&mutation(i as u64), &pair, &baseline);
    }

    let rows = matrix_rows(report_dir.path());
    let bits: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| {
            let f: Vec<&str> = r.split(',').collect();
            (f[5], f[9])
        })
        .collect();
    assert_eq!(bits[0], ("0100", "killed"));
    assert_eq!(bits[1], ("0000", "survived"));
    assert_eq!(bits[2], ("1010", "killed"));
}

/// Classical mode end to end: covering tests only, exit-on-first-failure,
/// killed and survived mutants side by side.
#[test]
fn classical_mode_scores_killed_and_survived() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "mul".to_string(),
            args: vec![Ty::Int, Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 2,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Load { ty: Ty::Int, slot: 1 },
                Insn::Arith { ty: Ty::Int, op: ArithOp::Mul },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(5),
        }],
    }]);

    let mut coverage = CoverageDb::new();
    coverage.record_block(
        block("mul", "(II)I", 0),
        [5],
        ["demo.CalcTest::t_mul".to_string()],
    );

    // mul(2, 2) == 4 cannot tell `*` from `+`: AOR_3 (* -> +) survives
    // while AOR_1 (* -> /) is killed.
    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures: vec![int_fixture("t_mul", "mul", vec![2, 2], 4)],
        fuel: None,
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["AOR_1", "AOR_3"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_timeouts(2.0, 5000);

    let report = run_coordinator(config, image, coverage);
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.killed, 1);
    assert_eq!(report.summary.survived, 1);
    assert!((report.summary.mutation_score - 50.0).abs() < 1e-9);

    for (mutation, pair) in &report.classes[0].results {
        match mutation.details.id.operator.as_str() {
            "AOR_1" => assert_eq!(pair.status, MutationStatus::Killed),
            "AOR_3" => assert_eq!(pair.status, MutationStatus::Survived),
            other => panic!("unexpected operator {other}"),
        }
    }
}

/// Mutants with no covering tests are settled coordinator-side in
/// classical mode.
#[test]
fn classical_mode_marks_uncovered_mutants_no_coverage() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "orphan".to_string(),
            args: vec![Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 1,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Const(Value::Int(1)),
                Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(8),
        }],
    }]);

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig::default());
    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["AOR_1"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_timeouts(2.0, 5000);

    let report = run_coordinator(config, image, CoverageDb::new());
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.no_coverage, 1);
}

/// Research-mode artifact tree: baseline results, line info, original and
/// mutated class bytes with sidecars, per-mutant JSON, and the summary.
#[test]
fn research_mode_emits_the_full_artifact_tree() {
    let image = ProgramImage::new([ClassFile {
        name: "demo.Calc".to_string(),
        source_file: "Calc.src".to_string(),
        methods: vec![Method {
            name: "add".to_string(),
            args: vec![Ty::Int, Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 2,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Load { ty: Ty::Int, slot: 1 },
                Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
                Insn::Return(Some(Ty::Int)),
            ],
            lines: lines(3),
        }],
    }]);

    let mut coverage = CoverageDb::new();
    coverage.record_block(
        block("add", "(II)I", 0),
        [3],
        ["demo.CalcTest::t0_add".to_string()],
    );

    let plugin_config = FixtureTestPlugin::config_json(&FixtureConfig {
        fixtures: vec![int_fixture("t0_add", "add", vec![2, 3], 5)],
        fuel: None,
    });

    let report_dir = tempdir().unwrap();
    let config = EngineConfig::default()
        .with_report_dir(report_dir.path())
        .with_operators(parse_selection(&["AOR_1"]).unwrap())
        .with_test_classes(["demo.CalcTest"])
        .with_test_plugin_config(plugin_config)
        .with_research_mode(true)
        .with_timeouts(2.0, 5000);

    run_coordinator(config, image, coverage);

    let root = report_dir.path();
    assert!(root.join("full_mutation_matrix.csv").exists());
    assert!(root.join("line_info.csv").exists());
    assert!(root.join("baselineTestResults/0_test_results.json").exists());
    assert!(root.join("baselineTestResults/tcs_outcome.csv").exists());
    assert!(root.join("original/demo/ORIGINAL_Calc.class").exists());
    assert!(root.join("original/demo/ORIGINAL_Calc.info").exists());
    assert!(root.join("mutationResults/0_mutation_test_results.json").exists());
    assert!(root.join("mutationResults/mutation_summary.csv").exists());
    assert!(root
        .join("mutants/demo/Calc/add/Line_3_Index_0_AOR_1.class")
        .exists());
    assert!(root
        .join("mutants/demo/Calc/add/Line_3_Index_0_AOR_1.info")
        .exists());
}
