//! Cross-checks between the bundled tables and the bolting formulas.

use approx::assert_abs_diff_eq;
use flange_core::calculations::{
    bolt_sequence, evaluate_torque, generate_bolt_sequence, lookup_sy, tensile_stress_area, TorqueInput,
    TorqueMethod,
};
use flange_core::fasteners::{parse_diameter_inches, BoltGrade, Lubricant, ThreadSeries, DRY_NUT_FACTOR};
use flange_core::reference::ReferenceData;

fn data() -> &'static ReferenceData {
    ReferenceData::bundled().unwrap()
}

fn input(diameter: &str, grade: BoltGrade) -> TorqueInput {
    TorqueInput {
        diameter: diameter.to_string(),
        grade: Some(grade),
        ..Default::default()
    }
}

#[test]
fn published_areas_agree_with_formula() {
    let data = data();
    for series in [ThreadSeries::Unc, ThreadSeries::Unf, ThreadSeries::Un8] {
        for key in &data.fasteners.diameter_options {
            let (Some(tpi), Some(table)) = (data.tpi(series, key), data.table_tensile_area(series, key)) else {
                continue;
            };
            let formula = tensile_stress_area(parse_diameter_inches(key), Some(tpi)).unwrap();
            assert_abs_diff_eq!(formula, table, epsilon = 0.02);
        }
    }
}

#[test]
fn every_size_has_an_area_in_some_series() {
    let data = data();
    for key in &data.fasteners.diameter_options {
        let found = [ThreadSeries::Unc, ThreadSeries::Unf, ThreadSeries::Un8]
            .into_iter()
            .any(|s| data.table_tensile_area(s, key).is_some());
        assert!(found, "no tensile area for {key}");
    }
}

#[test]
fn sequence_table_matches_generated_order() {
    let data = data();
    for (count, seq) in &data.tightening.sequence_lookup.by_bolt_count {
        let count: u32 = count.parse().unwrap();
        assert_eq!(seq, &generate_bolt_sequence(count), "{count} bolts");
    }
}

#[test]
fn sequences_are_permutations() {
    for count in (4..=88).step_by(2) {
        let mut seq = bolt_sequence(data(), count);
        assert_eq!(seq.len(), count as usize);
        seq.sort_unstable();
        assert_eq!(seq, (1..=count).collect::<Vec<_>>());
    }
}

#[test]
fn every_covered_grade_and_size_gives_a_torque() {
    let data = data();
    for grade in BoltGrade::ALL {
        for key in &data.fasteners.diameter_options {
            let d = parse_diameter_inches(key);
            if lookup_sy(data, grade, d).is_none() {
                continue;
            }
            let eval = evaluate_torque(data, &input(key, grade));
            let torque = eval.effective_torque_ftlb;
            assert!(
                torque.is_some_and(|t| t.is_finite() && t > 0.0),
                "{grade} {key}: {:?}",
                eval.issue_messages()
            );
            assert_eq!(eval.method, TorqueMethod::YieldPercent);
        }
    }
}

#[test]
fn torque_grows_with_diameter() {
    let data = data();
    let torques: Vec<f64> = ["1/2", "3/4", "1", "1-1/2", "2"]
        .iter()
        .map(|d| evaluate_torque(data, &input(d, BoltGrade::A193_B7)).effective_torque_ftlb.unwrap())
        .collect();
    assert!(torques.windows(2).all(|w| w[0] < w[1]), "{torques:?}");
}

#[test]
fn lubricant_scales_torque_by_nut_factor() {
    let data = data();
    let dry = evaluate_torque(data, &input("1", BoltGrade::A193_B7));
    let wet = evaluate_torque(
        data,
        &TorqueInput {
            torque_wet: true,
            lubricant: Some(Lubricant::MolyPaste),
            ..input("1", BoltGrade::A193_B7)
        },
    );
    let ratio = wet.effective_torque_ftlb.unwrap() / dry.effective_torque_ftlb.unwrap();
    assert_abs_diff_eq!(ratio, Lubricant::MolyPaste.nut_factor() / DRY_NUT_FACTOR, epsilon = 1e-9);
}

#[test]
fn percent_yield_scales_linearly() {
    let data = data();
    let at = |pct: &str| {
        evaluate_torque(
            data,
            &TorqueInput {
                pct_yield: Some(pct.to_string()),
                ..input("7/8", BoltGrade::A193_B16)
            },
        )
        .effective_torque_ftlb
        .unwrap()
    };
    assert_abs_diff_eq!(at("60%") / at("30"), 2.0, epsilon = 1e-9);
}
