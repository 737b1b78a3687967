use super::*;
use assert_float_eq::*;

#[test]
fn univariate_descent_sqrt() {
    let config = UnivariateDescentConfig {
        init_value: 0.0,
        init_step: 0.1,
        min_step: 0.00001,
        max_steps: 100,
        acceptable_residual: 0.0,
    };
    let outcome = univariate_descent(&config, |value| (81.0 - value.powi(2)).powi(2)).unwrap();
    assert_float_absolute_eq!(9.0, outcome.optimal_value, config.min_step);
}

#[test]
fn univariate_descent_invalid_config() {
    let config = UnivariateDescentConfig {
        init_value: 0.0,
        init_step: 0.1,
        min_step: 0.0,
        max_steps: 100,
        acceptable_residual: 0.0,
    };
    let err = univariate_descent(&config, |value| value).unwrap_err();
    assert_eq!("min step must be positive", err.to_string());
}

#[test]
fn grid_search_parabola() {
    let config = GridSearchConfig {
        bounds: 0.0..=10.0,
        resolution: 60,
        max_steps: 2,
        acceptable_residual: 0.0,
    };
    let outcome = grid_search(&config, |value| (value - 3.7).powi(2)).unwrap();
    assert_eq!(2, outcome.steps);
    assert_eq!(120, outcome.evaluations);
    assert!(outcome.evaluations <= config.max_evaluations());
    assert_float_absolute_eq!(3.7, outcome.optimal_value, 0.01);
}

#[test]
fn grid_search_optimum_on_hard_bound() {
    let config = GridSearchConfig {
        bounds: 1.0..=5.0,
        resolution: 10,
        max_steps: 3,
        acceptable_residual: 0.0,
    };
    let outcome = grid_search(&config, |value| value).unwrap();
    assert_eq!(1.0, outcome.optimal_value);
}

#[test]
fn grid_search_stops_at_acceptable_residual() {
    let config = GridSearchConfig {
        bounds: 0.0..=4.0,
        resolution: 5,
        max_steps: 10,
        acceptable_residual: 1e-9,
    };
    let outcome = grid_search(&config, |value| (value - 2.0).powi(2)).unwrap();
    assert_eq!(1, outcome.steps);
    assert_eq!(3, outcome.evaluations);
    assert_eq!(2.0, outcome.optimal_value);
}

#[test]
fn grid_search_skips_non_finite() {
    let config = GridSearchConfig {
        bounds: 0.0..=2.0,
        resolution: 3,
        max_steps: 1,
        acceptable_residual: 0.0,
    };
    let outcome = grid_search(&config, |value| if value < 0.5 { f64::NAN } else { value }).unwrap();
    assert_eq!(1.0, outcome.optimal_value);
}

#[test]
fn grid_search_invalid_config() {
    let config = GridSearchConfig {
        bounds: 2.0..=1.0,
        resolution: 10,
        max_steps: 1,
        acceptable_residual: 0.0,
    };
    assert!(grid_search(&config, |value| value).is_err());

    let config = GridSearchConfig {
        bounds: 0.0..=1.0,
        resolution: 2,
        max_steps: 1,
        acceptable_residual: 0.0,
    };
    assert_eq!(
        "search resolution must be at least 3",
        grid_search(&config, |value| value).unwrap_err().to_string()
    );
}
