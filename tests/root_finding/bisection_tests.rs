//! tests for the bisection root finding algorithm
use rootsweep::root_finding::bisection::{bisection, BisectionCfg, BisectionError};
use rootsweep::root_finding::errors::{RootFindingError, ToleranceError};
use rootsweep::root_finding::report::{Stencil, TerminationReason, ToleranceSatisfied};

type TestResult = Result<(), BisectionError>;

#[test]
fn finds_sqrt_2() -> TestResult {
    let f   = |x: f64| x * x - 2.0;
    let tol = 1e-10;

    let cfg = BisectionCfg::new()
        .set_abs_fx(tol)?
        .set_abs_x(tol)?
        .set_rel_x(0.0)?
        .set_max_iter(60)?;

    let res = bisection(f, 0.0, 2.0, cfg)?;

    assert_eq!(res.termination_reason, TerminationReason::ToleranceReached);
    assert!((res.root - 2.0_f64.sqrt()).abs() <= tol);
    assert!(res.iterations > 0);
    assert_eq!(res.algorithm_name, "bisection");
    Ok(())
}

#[test]
fn finds_3() -> TestResult {
    let f   = |x: f64| 2.0 * x - 6.0;
    let tol = 1e-10;

    let cfg = BisectionCfg::new()
        .set_abs_fx(tol)?
        .set_abs_x(tol)?
        .set_rel_x(0.0)?
        .set_max_iter(60)?;

    let res = bisection(f, 0.0, 10.0, cfg)?;

    assert_eq!(res.termination_reason, TerminationReason::ToleranceReached);
    assert!((res.root - 3.0).abs() <= tol);
    Ok(())
}

#[test]
fn final_bounds_keep_the_root() -> TestResult {
    let res = bisection(|x: f64| x.cos(), 0.0, 3.0, BisectionCfg::new())?;

    let (a, b) = res.stencil.bounds().ok_or(BisectionError::InvalidBounds { a: 0.0, b: 3.0 })?;
    assert!(a <= std::f64::consts::FRAC_PI_2 && std::f64::consts::FRAC_PI_2 <= b);
    assert!(res.termination_reason.is_converged());
    Ok(())
}

#[test]
fn endpoint_root_takes_no_iterations() -> TestResult {
    let res = bisection(|x: f64| x - 1.0, 1.0, 4.0, BisectionCfg::new())?;

    assert_eq!(res.root, 1.0);
    assert_eq!(res.iterations, 0);
    assert_eq!(res.evaluations, 2);
    assert_eq!(res.tolerance_satisfied, ToleranceSatisfied::AbsFxReached);
    Ok(())
}

#[test]
fn narrow_bracket_meets_width_immediately() -> TestResult {
    let cfg = BisectionCfg::new()
        .set_abs_fx(1e-20)?
        .set_abs_x(1e-12)?;

    let res = bisection(|x: f64| x, -3e-16, 1e-16, cfg)?;

    assert_eq!(res.iterations, 0);
    assert_eq!(res.tolerance_satisfied, ToleranceSatisfied::WidthTolReached);
    assert_eq!(res.stencil, Stencil::bracket(-3e-16, 1e-16));
    Ok(())
}

#[test]
fn stops_at_iteration_limit() -> TestResult {
    let cfg = BisectionCfg::new()
        .set_abs_fx(1e-30)?
        .set_rel_x(1e-12)?
        .set_max_iter(10)?;

    let res = bisection(|x: f64| x, -3.0, 2.0, cfg)?;

    assert_eq!(res.termination_reason, TerminationReason::IterationLimit);
    assert_eq!(res.tolerance_satisfied, ToleranceSatisfied::ToleranceNotReached);
    assert_eq!(res.iterations, 10);
    assert_eq!(res.evaluations, 12);
    Ok(())
}

#[test]
fn adjacent_floats_hit_machine_precision() -> TestResult {
    let a = 1.0;
    let b = 1.0 + f64::EPSILON;
    let step = |x: f64| if x > 1.0 { 1.0 } else { -1.0 };

    let cfg = BisectionCfg::new()
        .set_abs_x(1e-300)?
        .set_rel_x(0.0)?;

    let res = bisection(step, a, b, cfg)?;

    assert_eq!(res.termination_reason, TerminationReason::MachinePrecisionReached);
    assert_eq!(res.iterations, 1);
    Ok(())
}

#[test]
fn no_sign_change() {
    let f   = |x: f64| x * x + 1.0;
    let err = bisection(f, -1.0, 1.0, BisectionCfg::new()).unwrap_err();

    assert!(matches!(err, BisectionError::NoSignChange { a, b } if a == -1.0 && b == 1.0));
}

#[test]
fn non_finite_eval() {
    let f   = |x: f64| 1.0 / x;
    let err = bisection(f, -1.0, 1.0, BisectionCfg::new()).unwrap_err();

    assert!(matches!(
        err,
        BisectionError::RootFinding(RootFindingError::NonFiniteEvaluation { x, .. }) if x == 0.0
    ));
}

#[test]
fn invalid_bounds() {
    let f = |x: f64| x;

    for (a, b) in [(1.0, 1.0), (2.0, -2.0), (f64::NAN, 1.0), (0.0, f64::INFINITY)] {
        let err = bisection(f, a, b, BisectionCfg::new()).unwrap_err();
        assert!(matches!(err, BisectionError::InvalidBounds { .. }));
    }
}

#[test]
fn invalid_settings() {
    assert_eq!(
        BisectionCfg::new().set_max_iter(0).unwrap_err(),
        RootFindingError::InvalidMaxIter { got: 0 }
    );
    assert!(matches!(
        BisectionCfg::new().set_abs_fx(-1.0).unwrap_err(),
        ToleranceError::InvalidAbsFx { .. }
    ));
    assert!(matches!(
        BisectionCfg::new().set_rel_x(0.0).unwrap_err(),
        ToleranceError::InvalidAbsRelX { .. }
    ));
}
