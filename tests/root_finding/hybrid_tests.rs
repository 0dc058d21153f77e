//! tests for the hybrid scan / bisection / newton search
use rootsweep::root_finding::errors::{RootFindingError, ToleranceError};
use rootsweep::root_finding::hybrid::{
    find_roots, hybrid, HybridCfg, HybridError, NonConvergedPolicy, RefineStage, RootOrigin
};
use rootsweep::root_finding::newton::NewtonFallback;
use rootsweep::root_finding::report::RefineState;
use rootsweep::root_finding::scan::EvaluationPolicy;
use std::f64::consts::PI;

type TestResult = Result<(), HybridError>;
type NoDerivative = fn(f64) -> f64;

fn cfg() -> Result<HybridCfg, HybridError> {
    Ok(HybridCfg::new(1e-6, 1e-12)?)
}

fn assert_ascending(roots: &[f64], threshold: f64) {
    for pair in roots.windows(2) {
        assert!(pair[1] - pair[0] >= threshold, "{roots:?} not separated by {threshold}");
    }
}


#[test]
fn finds_both_roots_of_x2_minus_4() -> TestResult {
    let roots = find_roots(|x: f64| x * x - 4.0, |x: f64| 2.0 * x, -3.0, 3.0, cfg()?)?;

    assert_eq!(roots.len(), 2);
    assert!((roots[0] + 2.0).abs() <= 1e-9);
    assert!((roots[1] - 2.0).abs() <= 1e-9);
    Ok(())
}

#[test]
fn cubic_with_exact_zero_on_the_grid() -> TestResult {
    let f  = |x: f64| x * x * x - x;
    let df = |x: f64| 3.0 * x * x - 1.0;

    let res = hybrid(f, Some(df), -2.0, 2.0, cfg()?)?;
    let roots = res.values();

    assert_eq!(roots.len(), 3);
    for (root, expected) in roots.iter().zip([-1.0, 0.0, 1.0]) {
        assert!((root - expected).abs() <= 1e-9);
    }
    assert_eq!(res.exact_zeros, vec![0.0]);
    assert_eq!(res.roots[1].origin, RootOrigin::ExactBoundary);
    assert_eq!(res.roots[1].value, 0.0);
    assert_eq!(res.candidates.len(), 2);
    Ok(())
}

#[test]
fn no_real_roots_is_empty_not_an_error() -> TestResult {
    let res = hybrid(|x: f64| x * x + 1.0, Some(|x: f64| 2.0 * x), -5.0, 5.0, cfg()?)?;

    assert!(res.roots.is_empty());
    assert!(res.candidates.is_empty());
    assert_eq!(res.evaluations, 51);
    Ok(())
}

#[test]
fn root_on_boundary_reported_once() -> TestResult {
    let cfg   = cfg()?.set_subdivisions(2)?;
    let roots = find_roots(|x: f64| x, |_x: f64| 1.0, -1.0, 1.0, cfg)?;

    assert_eq!(roots, vec![0.0]);
    Ok(())
}

#[test]
fn single_subdivision() -> TestResult {
    let cfg   = cfg()?.set_subdivisions(1)?;
    let roots = find_roots(|x: f64| x - 0.25, |_x: f64| 1.0, -1.0, 1.0, cfg)?;

    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 0.25).abs() <= 1e-9);
    Ok(())
}

#[test]
fn sine_roots_are_ordered_and_separated() -> TestResult {
    let cfg   = cfg()?;
    let roots = find_roots(f64::sin, f64::cos, -10.0, 10.0, cfg)?;

    assert_eq!(roots.len(), 7);
    assert_ascending(&roots, cfg.merge_threshold());
    for (root, k) in roots.iter().zip(-3..=3) {
        assert!((root - k as f64 * PI).abs() <= 1e-9);
    }
    Ok(())
}

#[test]
fn finite_difference_derivative() -> TestResult {
    let res = hybrid(|x: f64| x * x * x - x, None::<NoDerivative>, -2.0, 2.0, cfg()?)?;
    let roots = res.values();

    assert_eq!(roots.len(), 3);
    assert!((roots[0] + 1.0).abs() <= 1e-9);
    assert!((roots[2] - 1.0).abs() <= 1e-9);
    Ok(())
}

#[test]
fn repeated_calls_are_identical() -> TestResult {
    let f  = |x: f64| (3.0 * x).sin() - 0.5 * x;
    let df = |x: f64| 3.0 * (3.0 * x).cos() - 0.5;

    let first  = hybrid(f, Some(df), -4.0, 4.0, cfg()?)?;
    let second = hybrid(f, Some(df), -4.0, 4.0, cfg()?)?;

    assert_eq!(first, second);
    assert!(!first.roots.is_empty());
    Ok(())
}

#[test]
fn merge_threshold_collapses_close_roots() -> TestResult {
    let f  = |x: f64| x * x * x - x;
    let df = |x: f64| 3.0 * x * x - 1.0;

    let cfg   = cfg()?.set_merge_threshold(1.5)?;
    let roots = find_roots(f, df, -2.0, 2.0, cfg)?;

    assert_eq!(roots.len(), 2);
    assert!((roots[0] + 1.0).abs() <= 1e-9);
    assert!((roots[1] - 1.0).abs() <= 1e-9);
    Ok(())
}

#[test]
fn newton_cap_drops_candidate_by_default() -> TestResult {
    // newton on x^3 only shrinks the iterate by 2/3 per step
    let f  = |x: f64| x * x * x;
    let df = |x: f64| 3.0 * x * x;
    let cfg = cfg()?.set_subdivisions(1)?.set_max_iter2(20)?;

    let res = hybrid(f, Some(df), -1.0, 2.0, cfg)?;

    assert!(res.roots.is_empty());
    assert_eq!(res.candidates.len(), 1);
    assert_eq!(res.candidates[0].state, RefineState::MaxIterExceeded);
    assert_eq!(res.candidates[0].stage, RefineStage::Newton);
    assert_eq!(res.failures().count(), 1);
    Ok(())
}

#[test]
fn newton_cap_flags_candidate_on_request() -> TestResult {
    let f  = |x: f64| x * x * x;
    let df = |x: f64| 3.0 * x * x;
    let cfg = cfg()?
        .set_subdivisions(1)?
        .set_max_iter2(20)?
        .with_non_converged(NonConvergedPolicy::Flag);

    let res = hybrid(f, Some(df), -1.0, 2.0, cfg)?;

    assert_eq!(res.roots.len(), 1);
    assert!(!res.roots[0].converged);
    assert!(res.roots[0].value.abs() < 1e-6);
    Ok(())
}

#[test]
fn cubic_converges_with_default_caps() -> TestResult {
    let f  = |x: f64| x * x * x;
    let df = |x: f64| 3.0 * x * x;
    let cfg = cfg()?.set_subdivisions(1)?;

    let res = hybrid(f, Some(df), -1.0, 2.0, cfg)?;

    assert_eq!(res.roots.len(), 1);
    assert!(res.roots[0].converged);
    assert!(res.roots[0].value.abs() < 1e-9);
    Ok(())
}

#[test]
fn bisection_cap_drops_candidate() -> TestResult {
    let f  = |x: f64| x * x * x;
    let df = |x: f64| 3.0 * x * x;
    let cfg = cfg()?.set_subdivisions(1)?.set_max_iter1(3)?;

    let res = hybrid(f, Some(df), -1.0, 2.0, cfg)?;

    assert!(res.roots.is_empty());
    assert_eq!(res.candidates[0].state, RefineState::MaxIterExceeded);
    assert_eq!(res.candidates[0].stage, RefineStage::Bisection);
    Ok(())
}

#[test]
fn converged_root_replaces_flagged_neighbour() -> TestResult {
    // triple root at 0 stalls newton, simple root at 1 converges
    let f  = |x: f64| x * x * x * (x - 1.0);
    let df = |x: f64| 4.0 * x * x * x - 3.0 * x * x;
    let cfg = cfg()?
        .set_subdivisions(4)?
        .set_max_iter2(20)?
        .with_non_converged(NonConvergedPolicy::Flag);

    let apart = hybrid(f, Some(df), -0.9, 2.1, cfg)?;
    assert_eq!(apart.roots.len(), 2);
    assert!(!apart.roots[0].converged);
    assert!(apart.roots[1].converged);

    let merged = hybrid(f, Some(df), -0.9, 2.1, cfg.set_merge_threshold(2.0)?)?;
    assert_eq!(merged.candidates[0].state, RefineState::MaxIterExceeded);
    assert_eq!(merged.candidates[1].state, RefineState::Converged);
    assert_eq!(merged.roots.len(), 1);
    assert!(merged.roots[0].converged);
    assert_eq!(merged.roots[0].origin, RootOrigin::Refined);
    assert!((merged.roots[0].value - 1.0).abs() <= 1e-9);
    Ok(())
}

#[test]
fn estimate_past_xmax_is_clamped() -> TestResult {
    // a slope of 0.7 instead of 1 makes newton overshoot and stop just past the root
    let r   = 1.0 - 1e-13;
    let res = hybrid(|x: f64| x - r, Some(|_x: f64| 0.7), 0.0, 1.0, cfg()?)?;

    assert_eq!(res.roots.len(), 1);
    assert!(res.candidates[0].estimate().is_some_and(|x| x > 1.0));
    assert!(res.roots[0].value <= 1.0);
    assert!((res.roots[0].value - r).abs() <= 1e-9);
    Ok(())
}

#[test]
fn wide_interval_root() -> TestResult {
    let roots = find_roots(|x: f64| x - 1.1e307, |_x: f64| 1.0, 0.0, 1e308, cfg()?)?;

    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 1.1e307).abs() <= 1.1e307 * 1e-12);
    Ok(())
}

#[test]
fn zero_derivative_falls_back_to_bisection() -> TestResult {
    let f   = |x: f64| x * x - 2.0;
    let cfg = cfg()?.set_subdivisions(3)?;

    let roots = find_roots(f, |_x: f64| 0.0, 0.0, 3.0, cfg)?;

    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 2.0_f64.sqrt()).abs() <= 1e-9);
    Ok(())
}

#[test]
fn zero_derivative_rejected_on_request() -> TestResult {
    let f   = |x: f64| x * x - 2.0;
    let cfg = cfg()?
        .set_subdivisions(3)?
        .with_fallback(NewtonFallback::Reject);

    let res = hybrid(f, Some(|_x: f64| 0.0), 0.0, 3.0, cfg)?;

    assert!(res.roots.is_empty());
    assert_eq!(res.candidates[0].state, RefineState::DivergedOutOfBracket);
    assert!(res.candidates[0].estimate().is_some());
    Ok(())
}

#[test]
fn lenient_scan_skips_bad_boundary() -> TestResult {
    let f   = |x: f64| if x == 0.5 { f64::NAN } else { x - 0.9 };
    let cfg = cfg()?.set_subdivisions(4)?;

    let res = hybrid(f, Some(|_x: f64| 1.0), 0.0, 1.0, cfg)?;

    assert_eq!(res.skipped_boundaries, vec![0.5]);
    assert_eq!(res.roots.len(), 1);
    assert!((res.roots[0].value - 0.9).abs() <= 1e-9);
    Ok(())
}

#[test]
fn strict_scan_rejects_bad_boundary() -> TestResult {
    let f   = |x: f64| if x == 0.5 { f64::NAN } else { x - 0.9 };
    let cfg = cfg()?
        .set_subdivisions(4)?
        .with_evaluation(EvaluationPolicy::Strict);

    let err = hybrid(f, Some(|_x: f64| 1.0), 0.0, 1.0, cfg).unwrap_err();

    assert!(matches!(
        err,
        HybridError::RootFinding(RootFindingError::NonFiniteEvaluation { x, .. }) if x == 0.5
    ));
    Ok(())
}

#[test]
fn non_finite_endpoint_is_an_error() -> TestResult {
    let err = find_roots(f64::ln, |x: f64| 1.0 / x, 0.0, 2.0, cfg()?).unwrap_err();

    assert!(matches!(
        err,
        HybridError::RootFinding(RootFindingError::NonFiniteEvaluation { x, .. }) if x == 0.0
    ));
    Ok(())
}

#[test]
fn invalid_interval_evaluates_nothing() -> TestResult {
    for (xmin, xmax) in [(1.0, 1.0), (2.0, -2.0), (f64::NEG_INFINITY, 0.0), (0.0, f64::NAN)] {
        let mut calls = 0usize;
        let err = find_roots(|x: f64| { calls += 1; x }, |_x: f64| 1.0, xmin, xmax, cfg()?)
            .unwrap_err();

        assert!(matches!(err, HybridError::InvalidInterval { .. }));
        assert_eq!(calls, 0);
    }
    Ok(())
}

#[test]
fn invalid_settings() {
    assert!(matches!(HybridCfg::new(0.0, 1e-12), Err(ToleranceError::InvalidTol1 { .. })));
    assert!(matches!(HybridCfg::new(-1e-6, 1e-12), Err(ToleranceError::InvalidTol1 { .. })));
    assert!(matches!(HybridCfg::new(1e-6, f64::NAN), Err(ToleranceError::InvalidTol2 { .. })));

    let cfg = HybridCfg::new(1e-6, 1e-12).unwrap();
    assert_eq!(cfg.set_max_iter1(0).unwrap_err(), RootFindingError::InvalidMaxIter { got: 0 });
    assert_eq!(cfg.set_max_iter2(0).unwrap_err(), RootFindingError::InvalidMaxIter { got: 0 });
    assert_eq!(cfg.set_subdivisions(0).unwrap_err(), HybridError::InvalidSubdivisions { got: 0 });
    assert_eq!(
        cfg.set_subdivisions(usize::MAX).unwrap_err(),
        HybridError::InvalidSubdivisions { got: usize::MAX }
    );
    assert!(matches!(
        cfg.set_merge_threshold(-1.0).unwrap_err(),
        ToleranceError::InvalidMergeThreshold { .. }
    ));
}

#[test]
fn defaults() {
    let cfg = HybridCfg::new(1e-6, 1e-12).unwrap();

    assert_eq!(cfg.max_iter1(), 500);
    assert_eq!(cfg.max_iter2(), 500);
    assert_eq!(cfg.subdivisions(), 50);
    assert_eq!(cfg.fallback(), NewtonFallback::Bisect);
    assert_eq!(cfg.non_converged(), NonConvergedPolicy::Drop);
    assert_eq!(cfg.evaluation(), EvaluationPolicy::Lenient);
    approx::assert_relative_eq!(cfg.merge_threshold(), 1e-5);
}

#[test]
fn evaluation_count_covers_scan_and_refinement() -> TestResult {
    let res = hybrid(|x: f64| x * x - 4.0, Some(|x: f64| 2.0 * x), -3.0, 3.0, cfg()?)?;

    let refined: usize = res.candidates.iter().map(|c| c.evaluations()).sum();
    assert!(refined > 0);
    assert_eq!(res.evaluations, 51 + refined);
    Ok(())
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_matches_sequential() -> TestResult {
    use rootsweep::root_finding::hybrid::hybrid_par;

    let f  = |x: f64| (3.0 * x).sin() - 0.5 * x;
    let df = |x: f64| 3.0 * (3.0 * x).cos() - 0.5;

    let seq = hybrid(f, Some(df), -4.0, 4.0, cfg()?)?;
    let par = hybrid_par(f, Some(df), -4.0, 4.0, cfg()?)?;

    assert_eq!(seq, par);
    Ok(())
}
