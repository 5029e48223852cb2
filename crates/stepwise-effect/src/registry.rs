//! Effect registration, validation and capability tables.
//!
//! [`validate_effects`] runs once at engine construction. It checks the
//! configured effect list for structural errors and builds the
//! [`EffectTable`]: per-category id lists in registration order, so the
//! per-step hot path never re-queries which effects act in which category.

use indexmap::IndexMap;
use stepwise_core::{ActionCategory, EffectId, Track};

use crate::effect::{AlongStepAction, AtRestAction, Capabilities, Effect, PostStepAction};

use std::error::Error;
use std::fmt;

/// Name reserved for the built-in transportation stage.
pub const TRANSPORTATION_NAME: &str = "transportation";

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from effect-list validation (startup-time, not per-step).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No effects registered.
    EmptyRegistry,
    /// Two effects share a name.
    DuplicateName {
        /// The shared name.
        name: String,
        /// Registration index of the first.
        first: usize,
        /// Registration index of the second.
        second: usize,
    },
    /// An effect used the name reserved for transportation.
    ReservedName {
        /// Registration index of the offender.
        index: usize,
    },
    /// An effect declared no capabilities.
    NoCapabilities {
        /// The effect.
        effect: String,
    },
    /// `capabilities()` disagrees with the capability accessors.
    CapabilityMismatch {
        /// The effect.
        effect: String,
        /// The inconsistent category.
        category: ActionCategory,
        /// What `capabilities()` declared for it.
        declared: bool,
    },
    /// More effects than ids available.
    TooManyEffects {
        /// Number configured.
        count: usize,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRegistry => write!(f, "no effects registered"),
            Self::DuplicateName {
                name,
                first,
                second,
            } => write!(
                f,
                "effect name '{name}' registered twice (indices {first} and {second})"
            ),
            Self::ReservedName { index } => write!(
                f,
                "effect at index {index} uses the reserved name '{TRANSPORTATION_NAME}'"
            ),
            Self::NoCapabilities { effect } => {
                write!(f, "effect '{effect}' declares no capabilities")
            }
            Self::CapabilityMismatch {
                effect,
                category,
                declared,
            } => {
                let (said, got) = if *declared {
                    ("declares", "does not provide")
                } else {
                    ("does not declare", "provides")
                };
                write!(
                    f,
                    "effect '{effect}' {said} {category} but {got} the accessor"
                )
            }
            Self::TooManyEffects { count } => {
                write!(f, "{count} effects registered, more than ids available")
            }
        }
    }
}

impl Error for RegistryError {}

// ── Table ──────────────────────────────────────────────────────────

/// Validated capability table.
///
/// `EffectId(i)` is the i-th registered effect. Each category list holds
/// ids in registration order, which is also the tie-break order.
#[derive(Debug)]
#[must_use]
pub struct EffectTable {
    entries: IndexMap<String, Capabilities>,
    at_rest: Vec<EffectId>,
    along_step: Vec<EffectId>,
    post_step: Vec<EffectId>,
}

impl EffectTable {
    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of an effect.
    pub fn name(&self, id: EffectId) -> Option<&str> {
        self.entries
            .get_index(id.index()?)
            .map(|(name, _)| name.as_str())
    }

    /// Id of the effect with the given name.
    pub fn id_of(&self, name: &str) -> Option<EffectId> {
        self.entries
            .get_index_of(name)
            .map(|i| EffectId(i as u32))
    }

    /// Declared capabilities of an effect.
    pub fn capabilities(&self, id: EffectId) -> Option<Capabilities> {
        self.entries.get_index(id.index()?).map(|(_, c)| *c)
    }

    /// At-rest-capable effects in registration order.
    pub fn at_rest_ids(&self) -> &[EffectId] {
        &self.at_rest
    }

    /// Along-step-capable effects in registration order.
    pub fn along_step_ids(&self) -> &[EffectId] {
        &self.along_step
    }

    /// Post-step-capable effects in registration order.
    pub fn post_step_ids(&self) -> &[EffectId] {
        &self.post_step
    }
}

// ── Validation ─────────────────────────────────────────────────────

/// Validate an effect list and build its [`EffectTable`].
///
/// Checks performed (all at startup):
///
/// 1. The list is non-empty and fits the id space.
/// 2. No effect uses the reserved transportation name.
/// 3. Names are unique.
/// 4. Every effect declares at least one capability.
/// 5. Declared capabilities match the capability accessors.
pub fn validate_effects(effects: &mut [Box<dyn Effect>]) -> Result<EffectTable, RegistryError> {
    if effects.is_empty() {
        return Err(RegistryError::EmptyRegistry);
    }
    if effects.len() >= EffectId::TRANSPORTATION.0 as usize {
        return Err(RegistryError::TooManyEffects {
            count: effects.len(),
        });
    }

    let mut table = EffectTable {
        entries: IndexMap::with_capacity(effects.len()),
        at_rest: Vec::new(),
        along_step: Vec::new(),
        post_step: Vec::new(),
    };

    for (i, effect) in effects.iter_mut().enumerate() {
        let name = effect.name().to_string();
        if name == TRANSPORTATION_NAME {
            return Err(RegistryError::ReservedName { index: i });
        }
        if let Some(first) = table.entries.get_index_of(&name) {
            return Err(RegistryError::DuplicateName {
                name,
                first,
                second: i,
            });
        }

        let caps = effect.capabilities();
        if caps.is_empty() {
            return Err(RegistryError::NoCapabilities { effect: name });
        }
        let provided = [
            (ActionCategory::AtRest, effect.at_rest().is_some()),
            (ActionCategory::AlongStep, effect.along_step().is_some()),
            (ActionCategory::PostStep, effect.post_step().is_some()),
        ];
        for (category, has) in provided {
            let declared = caps.contains(category);
            if declared != has {
                return Err(RegistryError::CapabilityMismatch {
                    effect: name,
                    category,
                    declared,
                });
            }
        }

        let id = EffectId(i as u32);
        if caps.at_rest {
            table.at_rest.push(id);
        }
        if caps.along_step {
            table.along_step.push(id);
        }
        if caps.post_step {
            table.post_step.push(id);
        }
        table.entries.insert(name, caps);
    }

    Ok(table)
}

// ── Registry ───────────────────────────────────────────────────────

/// Owns the validated effect list of one engine instance.
pub struct EffectRegistry {
    effects: Vec<Box<dyn Effect>>,
    table: EffectTable,
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl EffectRegistry {
    /// Validate and take ownership of `effects`.
    pub fn new(mut effects: Vec<Box<dyn Effect>>) -> Result<Self, RegistryError> {
        let table = validate_effects(&mut effects)?;
        Ok(Self { effects, table })
    }

    /// The capability table.
    pub fn table(&self) -> &EffectTable {
        &self.table
    }

    /// Number of effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether there are no effects (never true after construction).
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Name of an effect, including the transportation stage.
    pub fn name(&self, id: EffectId) -> &str {
        if id == EffectId::TRANSPORTATION {
            return TRANSPORTATION_NAME;
        }
        self.table.name(id).unwrap_or("<unknown>")
    }

    /// Whether any at-rest-capable effect is registered.
    pub fn has_at_rest(&self) -> bool {
        !self.table.at_rest.is_empty()
    }

    /// At-rest view of one effect.
    pub fn at_rest_mut(&mut self, id: EffectId) -> Option<&mut dyn AtRestAction> {
        self.effects.get_mut(id.index()?)?.at_rest()
    }

    /// Along-step view of one effect.
    pub fn along_step_mut(&mut self, id: EffectId) -> Option<&mut dyn AlongStepAction> {
        self.effects.get_mut(id.index()?)?.along_step()
    }

    /// Post-step view of one effect.
    pub fn post_step_mut(&mut self, id: EffectId) -> Option<&mut dyn PostStepAction> {
        self.effects.get_mut(id.index()?)?.post_step()
    }

    /// Visit every at-rest-capable effect in registration order.
    ///
    /// Stops at the first error.
    pub fn try_for_each_at_rest<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(EffectId, &str, &mut dyn AtRestAction) -> Result<(), E>,
    {
        for &id in &self.table.at_rest {
            let name = self.table.entries.get_index(id.0 as usize).map_or("", |(n, _)| n.as_str());
            if let Some(action) = self.effects.get_mut(id.0 as usize).and_then(|e| e.at_rest()) {
                f(id, name, action)?;
            }
        }
        Ok(())
    }

    /// Visit every along-step-capable effect in registration order.
    ///
    /// Stops at the first error.
    pub fn try_for_each_along_step<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(EffectId, &str, &mut dyn AlongStepAction) -> Result<(), E>,
    {
        for &id in &self.table.along_step {
            let name = self.table.entries.get_index(id.0 as usize).map_or("", |(n, _)| n.as_str());
            if let Some(action) = self
                .effects
                .get_mut(id.0 as usize)
                .and_then(|e| e.along_step())
            {
                f(id, name, action)?;
            }
        }
        Ok(())
    }

    /// Visit every post-step-capable effect in registration order.
    ///
    /// Stops at the first error.
    pub fn try_for_each_post_step<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(EffectId, &str, &mut dyn PostStepAction) -> Result<(), E>,
    {
        for &id in &self.table.post_step {
            let name = self.table.entries.get_index(id.0 as usize).map_or("", |(n, _)| n.as_str());
            if let Some(action) = self
                .effects
                .get_mut(id.0 as usize)
                .and_then(|e| e.post_step())
            {
                f(id, name, action)?;
            }
        }
        Ok(())
    }

    /// Notify every effect that `track` is about to be stepped.
    pub fn start_tracking(&mut self, track: &Track) {
        for effect in &mut self.effects {
            effect.start_tracking(track);
        }
    }

    /// Notify every effect that the current track is finished.
    pub fn end_tracking(&mut self) {
        for effect in &mut self.effects {
            effect.end_tracking();
        }
    }
}
