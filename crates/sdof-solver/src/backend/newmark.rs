//! Implicit Newmark integration of a single-degree-of-freedom oscillator.
//!
//! Solves the relative equation of motion
//!
//! ```text
//! m*ü + c*u̇ + F(u) - (P/h)*u = -m*ü_g(t)
//! ```
//!
//! where `F` is the hysteretic restoring force of the material description
//! and `P/h` the geometric (P-Delta) stiffness. Every step is brought into
//! equilibrium with Newton-Raphson iterations on the displacement:
//!
//! ```text
//! ü_{n+1} = (u - u_n)/(β*Δt²) - u̇_n/(β*Δt) - (1/(2β) - 1)*ü_n
//! u̇_{n+1} = u̇_n + Δt*[(1-γ)*ü_n + γ*ü_{n+1}]
//! K_eff   = k_t - P/h + γ/(β*Δt)*c + m/(β*Δt²)
//! ```
//!
//! A step fails when the iterations run out, the effective stiffness stops
//! being positive, or the residual is no longer finite.

use log::debug;

use crate::backend::options::NewmarkOptions;
use crate::backend::traits::{IntegrationBackend, SolveRequest, SolverResult};
use crate::error::Result;
use crate::history::{ResponseHistory, ResponseSample};
use crate::hysteresis::ParallelMaterial;

pub const NEWMARK_NEWTON: &str = "Newmark-Newton";

/// Newmark with plain Newton iterations; a failing step ends the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewmarkNewton;

impl IntegrationBackend for NewmarkNewton {
    fn name(&self) -> &str {
        NEWMARK_NEWTON
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolverResult> {
        Ok(Integrator::new(request)?.run(NEWMARK_NEWTON, 0))
    }
}

/// Converged state at the end of a (sub)step.
#[derive(Debug, Clone, Copy, Default)]
struct State {
    u: f64,
    v: f64,
    /// Relative acceleration
    a: f64,
    /// Ground acceleration the state is in equilibrium with
    ag: f64,
    force: f64,
    hysteretic_work: f64,
    viscous_work: f64,
    plastic_travel: f64,
    peak_disp: f64,
}

#[derive(Debug, Clone, Copy)]
struct Trial {
    u: f64,
    v: f64,
    a: f64,
    ag: f64,
    force: f64,
}

/// Step-by-step driver shared by the Newmark back-ends.
pub(crate) struct Integrator<'r, 'a> {
    request: &'r SolveRequest<'a>,
    material: ParallelMaterial,
    params: NewmarkOptions,
    damping: f64,
    geometric: f64,
    elastic_stiffness: f64,
    state: State,
}

impl<'r, 'a> Integrator<'r, 'a> {
    pub(crate) fn new(request: &'r SolveRequest<'a>) -> Result<Self> {
        request.validate()?;
        let material = ParallelMaterial::from_description(request.material)?;
        let elastic_stiffness = material.initial_stiffness();
        let damping = request.damping_for(elastic_stiffness);

        // At rest with zero restoring force, equilibrium gives ü = -ü_g
        let ag = request.ground_accel(0);
        let state = State {
            a: -ag,
            ag,
            ..State::default()
        };

        Ok(Self {
            request,
            material,
            params: request.options.newmark,
            damping,
            geometric: request.pdelta_stiffness(),
            elastic_stiffness,
            state,
        })
    }

    /// Integrate the whole record, allowing each recorded step to be halved
    /// up to `max_subdivisions` times.
    pub(crate) fn run(mut self, backend: &str, max_subdivisions: usize) -> SolverResult {
        let total = self.request.total_samples();
        let dt = self.request.dt;
        let mut history = ResponseHistory::with_capacity(total);
        history.push(self.sample(0));

        for step in 1..total {
            let ag = self.request.ground_accel(step);
            if !self.advance(dt, ag, max_subdivisions) {
                debug!(
                    "{backend}: no equilibrium at t = {:.4} s (step {step} of {})",
                    step as f64 * dt,
                    total - 1
                );
                return SolverResult::from_history(backend, false, history);
            }
            history.push(self.sample(step));
        }

        SolverResult::from_history(backend, true, history)
    }

    fn advance(&mut self, h: f64, ag: f64, subdivisions_left: usize) -> bool {
        if let Some(trial) = self.equilibrate(h, ag) {
            self.accept(trial);
            return true;
        }
        self.material.revert();
        if subdivisions_left == 0 {
            return false;
        }

        let half = 0.5 * h;
        let ag_mid = 0.5 * (self.state.ag + ag);
        self.advance(half, ag_mid, subdivisions_left - 1)
            && self.advance(half, ag, subdivisions_left - 1)
    }

    fn equilibrate(&mut self, h: f64, ag: f64) -> Option<Trial> {
        let NewmarkOptions {
            beta,
            gamma,
            tolerance,
            max_iterations,
        } = self.params;
        let m = self.request.mass;
        let c = self.damping;
        let kp = self.geometric;
        let base = self.state;
        let scale = self.request.yield_disp;

        let kinematics = |u: f64| {
            let a = (u - base.u) / (beta * h * h)
                - base.v / (beta * h)
                - (0.5 / beta - 1.0) * base.a;
            let v = base.v + h * ((1.0 - gamma) * base.a + gamma * a);
            (a, v)
        };
        let inertia = m / (beta * h * h);
        let viscous = gamma / (beta * h) * c;

        let mut u = base.u;
        for _ in 0..max_iterations {
            let (a, v) = kinematics(u);
            let (force, tangent) = self.material.set_trial(u);
            let residual = -m * ag - m * a - c * v - (force - kp * u);
            let stiffness = tangent - kp + viscous + inertia;
            if !(stiffness > 0.0) || !residual.is_finite() {
                return None;
            }

            let du = residual / stiffness;
            u += du;
            if du.abs() <= tolerance * u.abs().max(scale) {
                let (a, v) = kinematics(u);
                let (force, _) = self.material.set_trial(u);
                return Some(Trial { u, v, a, ag, force });
            }
        }
        None
    }

    fn accept(&mut self, trial: Trial) {
        let prev = self.state;
        let du = trial.u - prev.u;
        let plastic = self.material.plastic_increment();
        self.material.commit();

        self.state = State {
            u: trial.u,
            v: trial.v,
            a: trial.a,
            ag: trial.ag,
            force: trial.force,
            hysteretic_work: prev.hysteretic_work + 0.5 * (prev.force + trial.force) * du,
            viscous_work: prev.viscous_work + 0.5 * self.damping * (prev.v + trial.v) * du,
            plastic_travel: prev.plastic_travel + plastic,
            peak_disp: prev.peak_disp.max(trial.u.abs()),
        };
    }

    fn sample(&self, step: usize) -> ResponseSample {
        let s = &self.state;
        let uy = self.request.yield_disp;
        let recoverable = if self.elastic_stiffness > 0.0 {
            s.force * s.force / (2.0 * self.elastic_stiffness)
        } else {
            0.0
        };
        let damping_force = self.damping * s.v;

        ResponseSample {
            time: step as f64 * self.request.dt,
            ground_accel: self.request.scaled_input(step),
            displacement: s.u,
            velocity: s.v,
            acceleration: s.a + s.ag,
            dissipated_energy: (s.hysteretic_work - recoverable).max(0.0),
            viscous_energy: s.viscous_work,
            cumulative_ductility: s.plastic_travel / uy,
            peak_ductility: s.peak_disp / uy,
            reaction: s.force - self.geometric * s.u + damping_force,
            element_force: s.force,
            damping_force,
        }
    }
}
