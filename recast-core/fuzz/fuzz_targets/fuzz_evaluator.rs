#![no_main]

use libfuzzer_sys::fuzz_target;
use recast_core::{Evaluator, Rule};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let cap = i64::from(data[0] % 8);
    let input = String::from_utf8_lossy(&data[1..]);
    let mut lines = input.lines();
    let Some(find) = lines.next().filter(|find| !find.is_empty()) else {
        return;
    };
    let replace = lines.next().unwrap_or_default();
    let units: Vec<&str> = lines.take(20).collect();

    for is_regex in [false, true] {
        let rule = Rule::new("fuzz", find, replace)
            .regex(is_regex)
            .max_occurrences(cap);
        let Ok(mut evaluator) = Evaluator::compile(&rule) else {
            continue;
        };

        for unit in &units {
            let _ = evaluator.transform(unit);
        }
        if let Some(budget) = rule.budget() {
            assert!(evaluator.replacements() <= budget);
        }
    }
});
