//! Liquid-argon medium properties: restricted mean energy loss, energy-loss
//! fluctuations, and density.
//!
//! Units: momenta and masses in GeV, the delta-ray cutoff in MeV, path
//! lengths in cm, densities in g/cm^3. `eloss` returns GeV/cm and
//! `eloss_var` GeV^2/cm.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::{BETHE_K_MEV, ELECTRON_MASS_MEV};

/// Read-only medium/detector properties consumed by the propagation code.
///
/// Implementations are shared across concurrent track fits and must not
/// mutate during lookups.
pub trait DetectorProperties: Sync {
    /// Restricted mean energy loss dE/dx (GeV/cm) for momentum `p` (GeV),
    /// mass `mass` (GeV) and delta-ray cutoff `tcut` (MeV; `<= 0` means no
    /// restriction).
    fn eloss(&self, p: f64, mass: f64, tcut: f64) -> f64;

    /// Variance of the energy loss per unit path length (GeV^2/cm).
    fn eloss_var(&self, p: f64, mass: f64) -> f64;

    /// Medium density (g/cm^3).
    fn density(&self) -> f64;

    /// Radiation length (g/cm^2); divide by density for cm.
    fn radiation_length(&self) -> f64;
}

/// Sternheimer density-effect parameterization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SternheimerConfig {
    pub a: f64,
    pub k: f64,
    pub x0: f64,
    pub x1: f64,
    pub cbar: f64,
}

impl Default for SternheimerConfig {
    fn default() -> Self {
        // liquid argon
        Self {
            a: 0.1956,
            k: 3.0,
            x0: 0.2,
            x1: 3.0,
            cbar: 5.2146,
        }
    }
}

/// User-facing configuration for [`LarProperties`].
///
/// Defaults describe liquid argon; validation produces the provider or a
/// full list of issues (never panics, never stops at the first problem).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LarPropertiesConfig {
    /// Argon temperature (K); sets the density.
    pub temperature: f64,
    /// Effective atomic number Z.
    pub atomic_number: f64,
    /// Atomic mass A (g/mol).
    pub atomic_mass: f64,
    /// Mean excitation energy I (eV).
    pub excitation_energy: f64,
    /// Radiation length (g/cm^2).
    pub radiation_length: f64,
    pub sternheimer: SternheimerConfig,
}

impl Default for LarPropertiesConfig {
    fn default() -> Self {
        Self {
            temperature: 87.3,
            atomic_number: 18.0,
            atomic_mass: 39.948,
            excitation_energy: 188.0,
            radiation_length: 19.55,
            sternheimer: SternheimerConfig::default(),
        }
    }
}

impl LarPropertiesConfig {
    /// Validate the configuration, collecting every issue.
    pub fn validate(self) -> Result<LarProperties, ConfigError> {
        let mut issues = Vec::new();

        let density = density_at(self.temperature);
        if !(self.temperature > 0.0) || density <= 0.0 {
            issues.push(ConfigIssue::NonPositive {
                field: "temperature (or derived density)",
                value: self.temperature,
            });
        }
        for (field, value) in [
            ("atomic_number", self.atomic_number),
            ("atomic_mass", self.atomic_mass),
            ("excitation_energy", self.excitation_energy),
            ("radiation_length", self.radiation_length),
        ] {
            if !(value > 0.0) {
                issues.push(ConfigIssue::NonPositive { field, value });
            }
        }
        if self.sternheimer.x0 >= self.sternheimer.x1 {
            issues.push(ConfigIssue::OutOfOrder {
                lower: "sternheimer.x0",
                upper: "sternheimer.x1",
            });
        }

        if issues.is_empty() {
            Ok(LarProperties {
                density,
                config: self,
            })
        } else {
            Err(ConfigError { issues })
        }
    }
}

/// Density of liquid argon at temperature `t` (K), g/cm^3.
fn density_at(t: f64) -> f64 {
    -0.00615 * t + 1.928
}

/// Validated liquid-argon properties provider.
#[derive(Debug, Clone)]
pub struct LarProperties {
    density: f64,
    config: LarPropertiesConfig,
}

impl LarProperties {
    /// Provider with the default liquid-argon parameters.
    pub fn standard() -> Self {
        let config = LarPropertiesConfig::default();
        Self {
            density: density_at(config.temperature),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &LarPropertiesConfig {
        &self.config
    }
}

impl DetectorProperties for LarProperties {
    fn eloss(&self, p: f64, mass: f64, tcut: f64) -> f64 {
        let cfg = &self.config;
        let bg = p / mass;
        let gamma = (1.0 + bg * bg).sqrt();
        let beta = bg / gamma;
        // electron-to-particle mass ratio (both sides in GeV)
        let mer = 1.0e-3 * ELECTRON_MASS_MEV / mass;
        // maximum delta-ray energy (MeV)
        let tmax = 2.0 * ELECTRON_MASS_MEV * bg * bg / (1.0 + 2.0 * gamma * mer + mer * mer);

        let tcut = if tcut <= 0.0 || tcut > tmax { tmax } else { tcut };

        // Sternheimer density effect
        let x = bg.log10();
        let mut delta = 0.0;
        if x >= cfg.sternheimer.x0 {
            delta = 2.0 * std::f64::consts::LN_10 * x - cfg.sternheimer.cbar;
            if x < cfg.sternheimer.x1 {
                delta += cfg.sternheimer.a * (cfg.sternheimer.x1 - x).powf(cfg.sternheimer.k);
            }
        }

        // stopping number; excitation energy is in eV, hence the 1e-12
        // bringing I^2 to MeV^2
        let i2 = cfg.excitation_energy * cfg.excitation_energy;
        let b = 0.5 * (2.0 * ELECTRON_MASS_MEV * bg * bg * tcut / (1.0e-12 * i2)).ln()
            - 0.5 * beta * beta * (1.0 + tcut / tmax)
            - 0.5 * delta;
        let b = b.max(1.0);

        // MeV/cm -> GeV/cm
        1.0e-3 * self.density * BETHE_K_MEV * cfg.atomic_number * b
            / (cfg.atomic_mass * beta * beta)
    }

    fn eloss_var(&self, p: f64, mass: f64) -> f64 {
        let cfg = &self.config;
        let p2 = p * p;
        let e2 = p2 + mass * mass;
        let gamma2 = e2 / (mass * mass);
        let beta2 = p2 / e2;
        // MeV^2/cm -> GeV^2/cm
        1.0e-6
            * gamma2
            * (1.0 - 0.5 * beta2)
            * BETHE_K_MEV
            * ELECTRON_MASS_MEV
            * (cfg.atomic_number / cfg.atomic_mass)
            * self.density
    }

    #[inline]
    fn density(&self) -> f64 {
        self.density
    }

    #[inline]
    fn radiation_length(&self) -> f64 {
        self.config.radiation_length
    }
}

/// One problem found while validating a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    /// A parameter that must be strictly positive is not.
    NonPositive { field: &'static str, value: f64 },
    /// Two parameters violate their required ordering.
    OutOfOrder {
        lower: &'static str,
        upper: &'static str,
    },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::NonPositive { field, value } => {
                write!(f, "{} must be positive (got {})", field, value)
            }
            ConfigIssue::OutOfOrder { lower, upper } => {
                write!(f, "{} must be below {}", lower, upper)
            }
        }
    }
}

/// Configuration rejected; carries every issue found.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid detector configuration:")?;
        for issue in &self.issues {
            write!(f, " {};", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}
