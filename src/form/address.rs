//! Multi-phase address collection: city? → street → house → building → flat.

use serde::{Deserialize, Serialize};

use crate::error::Rejected;

use super::schema::AddressVariant;
use super::session::Answer;
use super::validators::{SKIP_SENTINEL, format_house, format_location, is_skip_sentinel};

/// Choice tag for the inline "skip whole address" action.
pub const SKIP_ADDRESS_TAG: &str = "skip_addr";
pub const SKIP_ADDRESS_LABEL: &str = "Пропустить адрес";

/// One sub-answer of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPhase {
    City,
    Street,
    House,
    Building,
    Flat,
}

const WITH_CITY: &[AddressPhase] = &[
    AddressPhase::City,
    AddressPhase::Street,
    AddressPhase::House,
    AddressPhase::Building,
    AddressPhase::Flat,
];

const FIXED_CITY: &[AddressPhase] = &[
    AddressPhase::Street,
    AddressPhase::House,
    AddressPhase::Building,
    AddressPhase::Flat,
];

impl AddressPhase {
    /// Prompt for a non-initial phase. The initial phase uses the field prompt.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::City => "Город (пример: Москва):",
            Self::Street => "Улица (пример: Тверская):",
            Self::House => "Дом (например: 10, 10к2, 10/2):",
            Self::Building => "Корпус (если нет — напишите «-»):",
            Self::Flat => "Квартира (число или «-»):",
        }
    }
}

/// Captured sub-answers. `values[i]` belongs to phase `i`; the phase being
/// asked is `values.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub values: Vec<String>,
}

impl AddressDraft {
    pub fn phase_index(&self) -> usize {
        self.values.len()
    }
}

/// Result of feeding one sub-answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressStep {
    /// More phases to go; ask this one next.
    Next(AddressPhase),
    /// All phases captured. Values to store, main key first.
    Finished(Vec<(String, Answer)>),
}

/// Drives one address field through its phases.
pub struct AddressCollector<'a> {
    key: &'a str,
    variant: &'a AddressVariant,
}

impl<'a> AddressCollector<'a> {
    pub fn new(key: &'a str, variant: &'a AddressVariant) -> Self {
        Self { key, variant }
    }

    pub fn phases(&self) -> &'static [AddressPhase] {
        match self.variant {
            AddressVariant::WithCity => WITH_CITY,
            AddressVariant::FixedCity { .. } => FIXED_CITY,
        }
    }

    pub fn current_phase(&self, draft: &AddressDraft) -> AddressPhase {
        let phases = self.phases();
        phases[draft.phase_index().min(phases.len() - 1)]
    }

    fn captured(&self, draft: &AddressDraft, phase: AddressPhase) -> Option<String> {
        self.phases()
            .iter()
            .position(|p| *p == phase)
            .and_then(|i| draft.values.get(i).cloned())
    }

    /// Validate a sub-answer for the current phase and record it.
    ///
    /// On rejection the draft is left untouched.
    pub fn accept(&self, draft: &mut AddressDraft, raw: &str) -> Result<AddressStep, Rejected> {
        let phase = self.current_phase(draft);
        let value = match phase {
            AddressPhase::City | AddressPhase::Street => format_location(raw)?,
            AddressPhase::House if is_skip_sentinel(raw) => SKIP_SENTINEL.to_string(),
            AddressPhase::House => {
                let street = self.captured(draft, AddressPhase::Street);
                format_house(street.as_deref(), raw)?
            }
            AddressPhase::Building | AddressPhase::Flat => {
                let s = raw.trim();
                if s.is_empty() {
                    return Err(Rejected::new("Введите текст. Для пропуска используйте «-»."));
                }
                s.to_string()
            }
        };
        draft.values.push(value);

        let phases = self.phases();
        if draft.phase_index() < phases.len() {
            Ok(AddressStep::Next(phases[draft.phase_index()]))
        } else {
            Ok(AddressStep::Finished(self.finish(draft)))
        }
    }

    /// Step back one phase, dropping that phase's value.
    ///
    /// Returns `false` when already at the initial phase.
    pub fn revert(&self, draft: &mut AddressDraft) -> bool {
        draft.values.pop().is_some()
    }

    /// Values stored when the whole address is skipped.
    pub fn skipped(&self) -> Vec<(String, Answer)> {
        std::iter::once(self.key.to_string())
            .chain(self.variant.aux_keys())
            .map(|k| (k, Answer::Blank))
            .collect()
    }

    fn finish(&self, draft: &AddressDraft) -> Vec<(String, Answer)> {
        let get = |phase| self.captured(draft, phase).unwrap_or_default();
        let city = match self.variant {
            AddressVariant::WithCity => get(AddressPhase::City),
            AddressVariant::FixedCity { city, .. } => city.clone(),
        };
        let street = get(AddressPhase::Street);
        let house = get(AddressPhase::House);
        let building = get(AddressPhase::Building);
        let flat = get(AddressPhase::Flat);

        let mut out = vec![(
            self.key.to_string(),
            Answer::Text(compose_address(&city, &street, &house, &building, &flat)),
        )];

        let part = |value: &str| {
            if is_skip_sentinel(value) {
                Answer::Blank
            } else {
                Answer::text(value)
            }
        };
        let aux = self.variant.aux_keys();
        if let [k_street, k_house, k_building, k_flat] = aux.as_slice() {
            out.push((k_street.clone(), part(&street)));
            out.push((k_house.clone(), part(&house)));
            out.push((k_building.clone(), part(&building)));
            out.push((k_flat.clone(), part(&flat)));
        }
        out
    }
}

/// `г. {city}, ул. {street}, д. {house}[, к. {building}][, кв. {flat}],`
///
/// Building and flat are omitted when they hold the skip sentinel. The
/// house is always written.
pub fn compose_address(
    city: &str,
    street: &str,
    house: &str,
    building: &str,
    flat: &str,
) -> String {
    let mut parts = vec![
        format!("г. {city}"),
        format!("ул. {street}"),
        format!("д. {house}"),
    ];
    if !is_skip_sentinel(building) {
        parts.push(format!("к. {building}"));
    }
    if !is_skip_sentinel(flat) {
        parts.push(format!("кв. {flat}"));
    }
    format!("{},", parts.join(", "))
}
