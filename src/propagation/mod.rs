//! Plane-to-plane propagation of track states.
//!
//! [`PropagatorToPlane`] moves a [`TrackState`] from its current plane to a
//! caller-specified target plane: first a pure rotation of the local frame
//! onto a plane through the current position parallel to the target, then
//! iterative stepping toward the target with optional energy loss and
//! multiple-scattering noise, and finally an exact re-expression on the
//! target plane. Every failure path returns the unmodified origin state with
//! `success = false`; nothing in here panics or throws.

pub mod interactor;

use nalgebra::{Matrix5, Vector5};
use serde::{Deserialize, Serialize};

use crate::common::constants::MAX_PROPAGATION_ITERS;
use crate::detector::DetectorProperties;
use crate::fit::TrackState;
use crate::geometry::Plane;

pub use interactor::{Interactor, LarInteractor};

/// Propagation direction relative to the fit pass.
///
/// `Backward` flips the sign of the computed path length: arc length is
/// positive along the direction the fit is walking, and the spatial step
/// correspondingly runs opposite to the momentum vector. Callers pick the
/// direction matching their pass (forward filter vs. backward smoother);
/// `Unknown` leaves the geometric sign untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    Unknown,
}

impl Direction {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            Direction::Backward => -1.0,
            Direction::Forward | Direction::Unknown => 1.0,
        }
    }
}

/// Tunable propagation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropagatorConfig {
    /// Largest fraction of the kinetic energy a single sub-step may lose.
    pub max_eloss_fraction: f64,
    /// Delta-ray cutoff (MeV) for the restricted dE/dx in the step bound.
    pub tcut: f64,
    /// Sub-step cap; exceeding it is a propagation failure.
    pub max_iters: usize,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            max_eloss_fraction: 0.1,
            tcut: 10.0,
            max_iters: MAX_PROPAGATION_ITERS,
        }
    }
}

/// The propagation engine. Holds injected read-only references to the
/// detector properties (step-size bound) and the interactor (material
/// effects); owns no mutable state, so one instance serves any number of
/// concurrent fits.
#[derive(Debug)]
pub struct PropagatorToPlane<'a, D: DetectorProperties, I: Interactor> {
    detprop: &'a D,
    interactor: &'a I,
    config: PropagatorConfig,
}

impl<'a, D: DetectorProperties, I: Interactor> PropagatorToPlane<'a, D, I> {
    pub fn new(detprop: &'a D, interactor: &'a I, config: PropagatorConfig) -> Self {
        Self {
            detprop,
            interactor,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    /// Propagate `origin` to `target`, optionally applying energy loss and
    /// multiple-scattering noise.
    ///
    /// On success returns the state expressed exactly on `target` and
    /// `true`; on any failure (frame degeneracy, momentum parallel to the
    /// target, particle stopping, iteration exhaustion) returns a copy of
    /// the unmodified `origin` and `false`.
    pub fn propagate_to_plane(
        &self,
        origin: &TrackState,
        target: &Plane,
        dodedx: bool,
        domcs: bool,
        dir: Direction,
    ) -> (TrackState, bool) {
        // material effects need a supported mass hypothesis
        if (dodedx || domcs) && origin.mass() < 0.0 {
            return (origin.clone(), false);
        }

        // 1 - rotate the local frame parallel to the target
        let (mut state, ok) = self.rotate_to_plane(origin, target);
        if !ok {
            return (origin.clone(), false);
        }

        // 2 - step toward the target, possibly in sub-steps
        let mut nit = 0usize;
        loop {
            nit += 1;
            if nit > self.config.max_iters {
                return (origin.clone(), false);
            }

            let (s, sperp, ok) = self.distance_pair_to_plane(&state, target, dir);
            if !ok {
                return (origin.clone(), false);
            }

            let (step_s, step_sperp, arrived) = if domcs {
                let smax = self.max_step(&state);
                if smax > 0.0 && s.abs() > smax {
                    if nit == self.config.max_iters {
                        return (origin.clone(), false);
                    }
                    let frac = smax / s.abs();
                    (s * frac, sperp * frac, false)
                } else {
                    (s, sperp, true)
                }
            } else {
                (s, sperp, true)
            };

            let (next, ok) =
                self.propagated_state_by_path(&state, step_s, step_sperp, dodedx, domcs, dir);
            if !ok {
                return (origin.clone(), false);
            }
            state = next;
            if arrived {
                break;
            }
        }

        // 3 - re-express exactly on the target plane (pure origin shift
        // within parallel planes; identity on slopes and covariance)
        let d = state.position() - target.position();
        let par = state.parameters();
        let final_par = Vector5::new(
            d.dot(&target.direction_u()),
            d.dot(&target.direction_v()),
            par[2],
            par[3],
            par[4],
        );
        let along = state.is_track_along_plane_dir();
        (
            TrackState::new(final_par, *state.covariance(), target.clone(), along, state.pid()),
            true,
        )
    }

    /// Rotate the origin's local frame onto a plane through the origin's
    /// position parallel to `target`. A pure change of local coordinates;
    /// no physical motion. Fails when the track direction is perpendicular
    /// to the new normal (`dw2dw1 == 0`), returning the origin unchanged.
    pub fn rotate_to_plane(&self, origin: &TrackState, target: &Plane) -> (TrackState, bool) {
        let p1 = origin.plane();
        let (sa1, ca1) = (p1.sin_alpha(), p1.cos_alpha());
        let (sb1, cb1) = (p1.sin_beta(), p1.cos_beta());
        let (sa2, ca2) = (target.sin_alpha(), target.cos_alpha());
        let (sb2, cb2) = (target.sin_beta(), target.cos_beta());

        let sindb = cb1 * sb2 - sb1 * cb2;
        let cosdb = cb1 * cb2 + sb1 * sb2;

        // rotation from frame 1 to frame 2, rows (u2, v2, w2) over
        // columns (u1, v1, w1)
        let ruu = ca1 * ca2 + sa1 * sa2 * cosdb;
        let ruv = -sa2 * sindb;
        let ruw = sa1 * ca2 - ca1 * sa2 * cosdb;
        let rvu = sa1 * sindb;
        let rvv = cosdb;
        let rvw = -ca1 * sindb;
        let rwu = ca1 * sa2 - sa1 * ca2 * cosdb;
        let rwv = ca2 * sindb;
        let rww = sa1 * sa2 + ca1 * ca2 * cosdb;

        let par = origin.parameters();
        let (dudw, dvdw) = (par[2], par[3]);

        let dw2dw1 = dudw * rwu + dvdw * rwv + rww;
        if dw2dw1 == 0.0 {
            return (origin.clone(), false);
        }
        let dudw2 = (dudw * ruu + dvdw * ruv + ruw) / dw2dw1;
        let dvdw2 = (dudw * rvu + dvdw * rvv + rvw) / dw2dw1;

        // frame-rotation Jacobian: positions project onto the new plane
        // along the track direction, slopes transform through the
        // perspective division, q/p is untouched
        let mut pm = Matrix5::zeros();
        pm[(0, 0)] = ruu - dudw2 * rwu;
        pm[(0, 1)] = ruv - dudw2 * rwv;
        pm[(1, 0)] = rvu - dvdw2 * rwu;
        pm[(1, 1)] = rvv - dvdw2 * rwv;
        pm[(2, 2)] = (ruu - dudw2 * rwu) / dw2dw1;
        pm[(2, 3)] = (ruv - dudw2 * rwv) / dw2dw1;
        pm[(3, 2)] = (rvu - dvdw2 * rwu) / dw2dw1;
        pm[(3, 3)] = (rvv - dvdw2 * rwv) / dw2dw1;
        pm[(4, 4)] = 1.0;

        let new_par = Vector5::new(0.0, 0.0, dudw2, dvdw2, par[4]);
        let new_cov = pm * origin.covariance() * pm.transpose();
        let new_plane = Plane::new(origin.position(), target.direction());
        let along = origin.momentum().dot(&target.direction()) > 0.0;

        (
            TrackState::new(new_par, new_cov, new_plane, along, origin.pid()),
            true,
        )
    }

    /// Path length to `target` along the momentum, and its projection onto
    /// the target normal. Fails with `(f64::MAX, f64::MAX, false)` when the
    /// momentum is exactly parallel to the target plane. `Backward` flips
    /// the sign of the path length (not of the perpendicular distance).
    pub fn distance_pair_to_plane(
        &self,
        origin: &TrackState,
        target: &Plane,
        dir: Direction,
    ) -> (f64, f64, bool) {
        let norm = target.direction();
        let cosgamma = norm.dot(&origin.momentum()) / origin.momentum().norm();
        if cosgamma == 0.0 {
            return (f64::MAX, f64::MAX, false);
        }
        let sperp = norm.dot(&(target.position() - origin.position()));
        (dir.sign() * sperp / cosgamma, sperp, true)
    }

    /// Advance a state by one sub-step of path length `s` (sign per the
    /// fit direction) with perpendicular projection `sperp`.
    pub fn propagated_state_by_path(
        &self,
        origin: &TrackState,
        s: f64,
        sperp: f64,
        dodedx: bool,
        domcs: bool,
        dir: Direction,
    ) -> (TrackState, bool) {
        // path along the momentum vector, regardless of fit direction
        let s_mom = dir.sign() * s;
        let par = origin.parameters();

        let mut new_par = Vector5::new(
            par[0] + sperp * par[2],
            par[1] + sperp * par[3],
            par[2],
            par[3],
            par[4],
        );
        if dodedx {
            match self.interactor.dedx_prop(par[4], origin.mass(), s_mom) {
                Some(pinv) => new_par[4] = pinv,
                None => return (origin.clone(), false),
            }
        }

        let mut pm = Matrix5::identity();
        pm[(0, 2)] = sperp;
        pm[(1, 3)] = sperp;
        let mut new_cov = pm * origin.covariance() * pm.transpose();
        if domcs {
            match self.interactor.noise(origin, s_mom) {
                Some(n) => new_cov += n,
                None => return (origin.clone(), false),
            }
        }

        // the plane origin rides along its normal; the transverse motion
        // lives in the local parameters
        let plane = origin.plane();
        let new_plane = Plane::new(
            plane.position() + sperp * plane.direction(),
            plane.direction(),
        );
        let along = origin.is_track_along_plane_dir();

        (
            TrackState::new(new_par, new_cov, new_plane, along, origin.pid()),
            true,
        )
    }

    /// Largest sub-step keeping the energy loss below the configured
    /// fraction of the kinetic energy.
    fn max_step(&self, state: &TrackState) -> f64 {
        let mass = state.mass();
        let p = 1.0 / state.parameters()[4].abs();
        let e = p.hypot(mass);
        let t = p * p / (e + mass);
        let dedx = self.detprop.eloss(p, mass, self.config.tcut);
        if dedx <= 0.0 {
            return f64::MAX;
        }
        self.config.max_eloss_fraction * t / dedx
    }
}
