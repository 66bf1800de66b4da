use pretty_assertions::assert_eq;

use calcshell::commands::{execute_line, Outcome};
use calcshell::{CalcError, CalculationRecord, Calculator, CalculatorConfig, HistoryFormat};

fn calculator() -> Calculator {
    Calculator::new(CalculatorConfig::default())
}

fn run(calc: &mut Calculator, line: &str) -> String {
    match execute_line(calc, line) {
        Outcome::Continue(text) | Outcome::Exit(text) => text,
    }
}

#[test]
fn total_operations_never_fail_in_range() {
    let mut calc = calculator();
    let values = [-1e15, -12.5, -1.0, 0.0, 0.5, 3.0, 1e15];
    for name in ["add", "subtract", "multiply", "abs_diff"] {
        for &a in &values {
            for &b in &values {
                let result = calc.calculate(name, a, b);
                assert!(result.is_ok(), "{name}({a}, {b}) failed: {result:?}");
            }
        }
    }
}

#[test]
fn zero_divisor_fails_for_every_dividing_operation() {
    let mut calc = calculator();
    for name in ["divide", "modulus", "int_divide", "percent"] {
        match calc.calculate(name, 9.0, 0.0) {
            Err(CalcError::DivisionByZero { operation, .. }) => assert_eq!(operation, name),
            other => panic!("{name}: expected division by zero, got {other:?}"),
        }
    }
    assert!(calc.history().is_empty());
}

#[test]
fn history_is_bounded_fifo() {
    let mut calc = Calculator::new(CalculatorConfig {
        max_history_size: 5,
        ..Default::default()
    });
    for i in 0..12 {
        calc.calculate("multiply", i as f64, 2.0).unwrap();
        assert!(calc.history().len() <= 5);
    }
    let kept: Vec<f64> = calc.history().iter().map(|r| r.operand_a).collect();
    assert_eq!(kept, vec![7.0, 8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn fresh_calculator_has_nothing_to_undo() {
    let mut calc = calculator();
    assert!(matches!(calc.undo(), Err(CalcError::NothingToUndo)));
}

#[test]
fn undo_then_redo_restores_the_record() {
    let mut calc = calculator();
    let record = calc.calculate("add", 5.0, 3.0).unwrap();
    assert_eq!(record.result, 8.0);

    calc.undo().unwrap();
    assert!(calc.history().is_empty());

    calc.redo().unwrap();
    let restored = calc.history().last().unwrap();
    assert_eq!(restored, &record);
}

#[test]
fn new_calculation_discards_redo() {
    let mut calc = calculator();
    calc.calculate("add", 1.0, 2.0).unwrap();
    calc.undo().unwrap();
    calc.calculate("subtract", 5.0, 1.0).unwrap();
    assert!(matches!(calc.redo(), Err(CalcError::NothingToRedo)));
}

#[test]
fn export_import_preserves_records_in_every_format() {
    let dir = tempfile::tempdir().unwrap();
    for (file, format) in [
        ("h.csv", HistoryFormat::Csv),
        ("h.json", HistoryFormat::Json),
        ("h.xlsx", HistoryFormat::Xlsx),
    ] {
        let mut calc = calculator();
        calc.calculate("add", 5.0, 3.0).unwrap();
        calc.calculate("divide", 1.0, 3.0).unwrap();
        calc.calculate("root", -8.0, 3.0).unwrap();
        calc.calculate("percent", 25.0, 200.0).unwrap();
        let before: Vec<CalculationRecord> = calc.history().iter().cloned().collect();

        let path = dir.path().join(file);
        calc.export_history(&path, None).unwrap();

        let mut other = calculator();
        let loaded = other.load_history(&path, Some(format)).unwrap();
        assert_eq!(loaded, before.len(), "{format}");
        let after: Vec<CalculationRecord> = other.history().iter().cloned().collect();
        assert_eq!(after, before, "{format}");
    }
}

#[test]
fn load_is_undoable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");

    let mut calc = calculator();
    calc.calculate("power", 2.0, 5.0).unwrap();
    calc.export_history(&path, None).unwrap();

    let mut other = calculator();
    other.calculate("add", 1.0, 1.0).unwrap();
    other.load_history(&path, None).unwrap();
    assert_eq!(other.history().last().unwrap().operation, "power");
    other.undo().unwrap();
    assert_eq!(other.history().last().unwrap().operation, "add");
}

#[test]
fn loading_a_missing_file_fails_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let mut calc = calculator();
    calc.calculate("add", 1.0, 1.0).unwrap();
    let err = calc
        .load_history(&dir.path().join("missing.csv"), None)
        .unwrap_err();
    assert!(matches!(err, CalcError::HistoryIo { action: "import", .. }));
    assert_eq!(calc.history().len(), 1);
    assert_eq!(calc.undo_depth(), 1);
}

#[test]
fn repl_session_script() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("session history.csv");
    let save = format!("save '{}'", saved.display());
    let load = format!("load '{}'", saved.display());
    let mut calc = calculator();

    let transcript: Vec<String> = [
        "add 5 3",
        "7 * 6",
        "divide 1 0",
        "undo",
        "redo",
        save.as_str(),
        "clear",
        "history",
        load.as_str(),
        "history 1",
    ]
    .iter()
    .map(|line| run(&mut calc, line))
    .collect();

    assert_eq!(transcript[0], "5 + 3 = 8");
    assert_eq!(transcript[1], "7 * 6 = 42");
    assert!(transcript[2].starts_with("Error: division by zero"));
    assert_eq!(transcript[3], "Undone. Last calculation: 5 + 3 = 8");
    assert_eq!(transcript[4], "Redone. Last calculation: 7 * 6 = 42");
    assert!(transcript[5].starts_with("Saved 2 calculation(s)"));
    assert_eq!(transcript[6], "History cleared.");
    assert_eq!(transcript[7], "History is empty.");
    assert!(transcript[8].starts_with("Loaded 2 calculation(s)"));
    assert_eq!(transcript[9], "    2  7 * 6 = 42");

    assert!(matches!(execute_line(&mut calc, "QUIT"), Outcome::Exit(_)));
}

#[test]
fn auto_save_follows_every_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auto").join("history.json");
    let mut calc = Calculator::from_config(CalculatorConfig {
        enable_auto_save: true,
        enable_logging: false,
        history_file: path.clone(),
        ..Default::default()
    })
    .unwrap();

    calc.calculate("add", 2.0, 2.0).unwrap();
    calc.calculate("add", 3.0, 3.0).unwrap();
    calc.undo().unwrap();

    let mut reader = calculator();
    reader.load_history(&path, None).unwrap();
    let results: Vec<f64> = reader.history().iter().map(|r| r.result).collect();
    assert_eq!(results, vec![4.0]);
}

#[test]
fn auto_save_carries_history_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = CalculatorConfig {
        enable_auto_save: true,
        enable_logging: false,
        history_file: dir.path().join("history.csv"),
        ..Default::default()
    };

    let mut first = Calculator::from_config(config.clone()).unwrap();
    first.calculate("add", 1.0, 1.0).unwrap();
    first.calculate("add", 2.0, 2.0).unwrap();
    drop(first);

    let mut second = Calculator::from_config(config.clone()).unwrap();
    assert_eq!(second.history().len(), 2);
    assert!(matches!(second.undo(), Err(CalcError::NothingToUndo)));
    second.calculate("add", 3.0, 3.0).unwrap();

    let third = Calculator::from_config(config).unwrap();
    let results: Vec<f64> = third.history().iter().map(|r| r.result).collect();
    assert_eq!(results, vec![2.0, 4.0, 6.0]);
}

#[test]
fn auto_save_without_a_known_extension_is_a_config_error() {
    let config = CalculatorConfig {
        enable_auto_save: true,
        history_file: "history/calculator_history".into(),
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("history_file"), "{err}");
}
