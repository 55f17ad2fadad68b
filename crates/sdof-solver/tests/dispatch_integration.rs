//! End-to-end runs through the default solver table.
//!
//! These tests drive a yielding bilinear oscillator through `"auto"` and
//! check the response against closed-form limits:
//! 1. elastic free vibration keeps its amplitude
//! 2. a yielding run reports ductility above one and positive hysteretic work
//! 3. the stacked history has one row per recorded sample and twelve columns
//! 4. steps too coarse for the increment tolerance are recovered by halving

use std::f64::consts::PI;

use approx::assert_relative_eq;
use sdof_solver::{
    AUTO, CHANNELS, GRAVITY, MaterialDescription, NEWMARK_NEWTON, NEWMARK_SUBSTEP, NewmarkOptions,
    SolveRequest, SolverOptions, SolverRegistry, SpectralInterpolator, SubstepOptions,
    free_vibration_duration,
};

const MASS: f64 = 1000.0;
const PERIOD: f64 = 0.5;

fn elastic_stiffness() -> f64 {
    (2.0 * PI / PERIOD).powi(2) * MASS
}

/// Half-sine pulse followed by silence
fn pulse(amplitude: f64, dt: f64, steps: usize) -> Vec<f64> {
    (0..steps)
        .map(|i| {
            let t = i as f64 * dt;
            if t < PERIOD / 2.0 {
                amplitude * (2.0 * PI * t / PERIOD).sin()
            } else {
                0.0
            }
        })
        .collect()
}

#[test]
fn auto_solves_a_yielding_oscillator_with_the_first_backend() {
    // Cy = 0.5: Fy = 0.5 m g
    let fy = 0.5 * MASS * GRAVITY;
    let e = elastic_stiffness();
    let uy = fy / e;
    assert_relative_eq!(e, 157_913.67, epsilon = 0.01);
    assert_relative_eq!(uy, 31.03, epsilon = 0.01);

    let material = MaterialDescription::new().with("Steel01", [fy, e, 0.02]);
    let options = SolverOptions::default();
    let dt = 0.005;
    let trace = pulse(1.5, dt, 200);
    let fv = free_vibration_duration(1.0, 2.0, Some(PERIOD));
    let request = SolveRequest {
        period: Some(PERIOD),
        trace: &trace,
        dt,
        material: &material,
        yield_disp: uy,
        fv_duration: fv,
        scale: 1.0,
        axial_load: 0.0,
        height: 3000.0,
        damping_ratio: 0.05,
        damping_coefficient: None,
        mass: MASS,
        options: &options,
    };

    let registry = SolverRegistry::default();
    let dispatched = registry.resolve(AUTO).unwrap().run(&request).unwrap();
    let result = dispatched.result;

    assert!(result.converged);
    assert_eq!(dispatched.attempts, [NEWMARK_NEWTON]);
    assert_eq!(result.history.len(), 400);
    assert!(result.peaks.peak_ductility > 1.0, "{:?}", result.peaks);
    assert!(result.peaks.dissipated_energy > 0.0);
    assert!(result.peaks.residual_disp.abs() > 0.0);
    assert_relative_eq!(
        result.peaks.max_disp / uy,
        result.peaks.peak_ductility,
        max_relative = 1e-12
    );

    let matrix = result.history.to_matrix();
    assert_eq!(matrix.ncols(), CHANNELS.len());
    assert_eq!(matrix.nrows(), 400);
    assert_relative_eq!(matrix[(399, 0)], 399.0 * dt, epsilon = 1e-9);
}

#[test]
fn elastic_free_vibration_keeps_its_amplitude() {
    let e = elastic_stiffness();
    let material = MaterialDescription::new().with("Elastic", e);
    let options = SolverOptions::default();
    let dt = 0.002;
    let trace = pulse(0.3, dt, 125);
    let request = SolveRequest {
        period: Some(PERIOD),
        trace: &trace,
        dt,
        material: &material,
        yield_disp: 1.0e9,
        fv_duration: 4.0 * PERIOD,
        scale: 1.0,
        axial_load: 0.0,
        height: 0.0,
        damping_ratio: 0.0,
        damping_coefficient: None,
        mass: MASS,
        options: &options,
    };

    let result = SolverRegistry::default()
        .resolve(NEWMARK_NEWTON)
        .unwrap()
        .run(&request)
        .unwrap()
        .result;
    assert!(result.converged);

    // undamped after the pulse: amplitude of the first and last period agree
    let u = &result.history.displacement;
    let per_period = (PERIOD / dt).round() as usize;
    let amplitude = |window: &[f64]| window.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let early = amplitude(&u[trace.len()..trace.len() + per_period]);
    let late = amplitude(&u[u.len() - per_period..]);
    assert!(early > 0.0);
    assert_relative_eq!(early, late, max_relative = 0.01);
    assert_eq!(result.peaks.cumulative_ductility, 0.0);
}

#[test]
fn spectrum_lookup_feeds_the_strength_ratio() {
    let spectrum = SpectralInterpolator::new(vec![0.1, 1.0, 2.0], vec![0.2, 0.6, 0.3]).unwrap();
    let sa = spectrum.evaluate(PERIOD);
    assert_relative_eq!(sa, 0.2 + 0.4 * (0.4 / 0.9), epsilon = 1e-12);

    let fy = 0.5 * MASS * GRAVITY;
    let r = MASS * sa * GRAVITY / fy;
    assert_relative_eq!(r, sa / 0.5, epsilon = 1e-12);
}

#[test]
fn halving_recovers_steps_the_plain_newton_run_rejects() {
    let material = MaterialDescription::new().with("Elastic", elastic_stiffness());
    let dt = 0.01;
    let trace: Vec<f64> = (0..100)
        .map(|i| 0.3 * (2.0 * PI * i as f64 * dt).sin())
        .collect();
    // one iteration per step: a step only passes when its displacement
    // increment stays below 1e-4 * 1000 mm
    let coarse = SolverOptions {
        newmark: NewmarkOptions {
            tolerance: 1e-4,
            max_iterations: 1,
            ..NewmarkOptions::default()
        },
        substep: SubstepOptions {
            max_subdivisions: 8,
        },
    };
    let reference_options = SolverOptions::default();
    let coarse_request = SolveRequest {
        period: Some(PERIOD),
        trace: &trace,
        dt,
        material: &material,
        yield_disp: 1000.0,
        fv_duration: 0.0,
        scale: 1.0,
        axial_load: 0.0,
        height: 0.0,
        damping_ratio: 0.05,
        damping_coefficient: None,
        mass: MASS,
        options: &coarse,
    };
    let reference_request = SolveRequest {
        options: &reference_options,
        ..coarse_request
    };

    let registry = SolverRegistry::default();
    let newton = registry
        .resolve(NEWMARK_NEWTON)
        .unwrap()
        .run(&coarse_request)
        .unwrap()
        .result;
    assert!(!newton.converged);
    assert!(newton.history.len() < trace.len());

    let dispatched = registry.resolve(AUTO).unwrap().run(&coarse_request).unwrap();
    assert_eq!(dispatched.attempts, [NEWMARK_NEWTON, NEWMARK_SUBSTEP]);
    let rescued = dispatched.result;
    assert!(rescued.converged);
    assert_eq!(rescued.backend, NEWMARK_SUBSTEP);
    assert_eq!(rescued.history.len(), trace.len());

    let reference = registry
        .resolve(NEWMARK_NEWTON)
        .unwrap()
        .run(&reference_request)
        .unwrap()
        .result;
    assert!(reference.converged);
    assert_relative_eq!(
        rescued.peaks.max_disp,
        reference.peaks.max_disp,
        max_relative = 0.05
    );
}
