//! Static particle definitions and relativistic kinematics.

/// Speed of light in mm/ns.
pub const SPEED_OF_LIGHT: f64 = 299.792_458;

/// Static identity of a particle species.
///
/// `Copy` so that tracks, secondaries and trajectories can carry their
/// kind by value. Masses are in MeV, charges in units of the positron
/// charge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleKind {
    /// Human-readable name.
    pub name: &'static str,
    /// PDG Monte Carlo code.
    pub pdg_code: i32,
    /// Rest mass in MeV.
    pub mass: f64,
    /// Electric charge in units of e.
    pub charge: f64,
    /// Whether the species never decays on its own.
    pub stable: bool,
}

impl ParticleKind {
    /// Photon.
    pub const GAMMA: ParticleKind = ParticleKind {
        name: "gamma",
        pdg_code: 22,
        mass: 0.0,
        charge: 0.0,
        stable: true,
    };
    /// Electron.
    pub const ELECTRON: ParticleKind = ParticleKind {
        name: "e-",
        pdg_code: 11,
        mass: 0.510_998_95,
        charge: -1.0,
        stable: true,
    };
    /// Positron.
    pub const POSITRON: ParticleKind = ParticleKind {
        name: "e+",
        pdg_code: -11,
        mass: 0.510_998_95,
        charge: 1.0,
        stable: true,
    };
    /// Negative muon.
    pub const MUON_MINUS: ParticleKind = ParticleKind {
        name: "mu-",
        pdg_code: 13,
        mass: 105.658_375_5,
        charge: -1.0,
        stable: false,
    };
    /// Positive muon.
    pub const MUON_PLUS: ParticleKind = ParticleKind {
        name: "mu+",
        pdg_code: -13,
        mass: 105.658_375_5,
        charge: 1.0,
        stable: false,
    };
    /// Positive pion.
    pub const PION_PLUS: ParticleKind = ParticleKind {
        name: "pi+",
        pdg_code: 211,
        mass: 139.570_39,
        charge: 1.0,
        stable: false,
    };
    /// Negative pion.
    pub const PION_MINUS: ParticleKind = ParticleKind {
        name: "pi-",
        pdg_code: -211,
        mass: 139.570_39,
        charge: -1.0,
        stable: false,
    };
    /// Proton.
    pub const PROTON: ParticleKind = ParticleKind {
        name: "proton",
        pdg_code: 2212,
        mass: 938.272_088_16,
        charge: 1.0,
        stable: true,
    };
    /// Neutron.
    pub const NEUTRON: ParticleKind = ParticleKind {
        name: "neutron",
        pdg_code: 2112,
        mass: 939.565_420_52,
        charge: 0.0,
        stable: false,
    };
    /// Neutral, massless, non-interacting test particle.
    pub const GEANTINO: ParticleKind = ParticleKind {
        name: "geantino",
        pdg_code: 0,
        mass: 0.0,
        charge: 0.0,
        stable: true,
    };

    /// Whether the species has zero rest mass.
    pub fn is_massless(&self) -> bool {
        self.mass <= 0.0
    }

    /// Lorentz factor at the given kinetic energy.
    ///
    /// Infinite for massless species with non-zero energy.
    pub fn gamma(&self, kinetic_energy: f64) -> f64 {
        if self.is_massless() {
            if kinetic_energy > 0.0 {
                f64::INFINITY
            } else {
                1.0
            }
        } else {
            1.0 + kinetic_energy / self.mass
        }
    }

    /// Speed in mm/ns at the given kinetic energy.
    pub fn velocity(&self, kinetic_energy: f64) -> f64 {
        if self.is_massless() {
            return SPEED_OF_LIGHT;
        }
        if kinetic_energy <= 0.0 {
            return 0.0;
        }
        let gamma = self.gamma(kinetic_energy);
        let beta = (1.0 - 1.0 / (gamma * gamma)).max(0.0).sqrt();
        beta * SPEED_OF_LIGHT
    }

    /// Momentum magnitude in MeV/c at the given kinetic energy.
    pub fn momentum(&self, kinetic_energy: f64) -> f64 {
        let t = kinetic_energy.max(0.0);
        (t * (t + 2.0 * self.mass)).sqrt()
    }
}
