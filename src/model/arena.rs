//! Typed handles for every declared variable, indexed by (month, hour, kind).

use crate::solver::VarHandle;
use crate::{HOURS, MONTHS};

/// Kinds of per-slot decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotVariable {
    ChargeFlag,
    DischargeFlag,
    ChargeAmount,
    DischargeAmount,
    GridDraw,
    StateOfCharge,
    /// `ChargeFlag · ChargeAmount`.
    ChargedEnergy,
    /// `DischargeFlag · DischargeAmount`.
    DischargedEnergy,
}

impl SlotVariable {
    pub const ALL: [Self; 8] = [
        Self::ChargeFlag,
        Self::DischargeFlag,
        Self::ChargeAmount,
        Self::DischargeAmount,
        Self::GridDraw,
        Self::StateOfCharge,
        Self::ChargedEnergy,
        Self::DischargedEnergy,
    ];
}

/// Handles of one (month, hour) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotVars {
    pub charge_flag: VarHandle,
    pub discharge_flag: VarHandle,
    pub charge_amount: VarHandle,
    pub discharge_amount: VarHandle,
    pub grid_draw: VarHandle,
    pub state_of_charge: VarHandle,
    pub charged_energy: VarHandle,
    pub discharged_energy: VarHandle,
}

impl SlotVars {
    pub fn get(&self, kind: SlotVariable) -> VarHandle {
        match kind {
            SlotVariable::ChargeFlag => self.charge_flag,
            SlotVariable::DischargeFlag => self.discharge_flag,
            SlotVariable::ChargeAmount => self.charge_amount,
            SlotVariable::DischargeAmount => self.discharge_amount,
            SlotVariable::GridDraw => self.grid_draw,
            SlotVariable::StateOfCharge => self.state_of_charge,
            SlotVariable::ChargedEnergy => self.charged_energy,
            SlotVariable::DischargedEnergy => self.discharged_energy,
        }
    }
}

/// Handles of one month's aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthVars {
    pub cost_on_peak: VarHandle,
    pub cost_mid_peak: VarHandle,
    pub cost_off_peak: VarHandle,
    pub monthly_cost: VarHandle,
    pub monthly_ghg: VarHandle,
}

/// Owner of every handle the model builder declared.
///
/// Slots are stored month-major; months and hours are 1-based in the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableArena {
    slots: Vec<SlotVars>,
    months: Vec<MonthVars>,
}

impl VariableArena {
    /// Returns `None` unless there are exactly 12×24 slots and 12 months.
    pub fn new(slots: Vec<SlotVars>, months: Vec<MonthVars>) -> Option<Self> {
        (slots.len() == MONTHS * HOURS && months.len() == MONTHS).then_some(Self { slots, months })
    }

    pub fn slot(&self, month: usize, hour: usize) -> Option<&SlotVars> {
        if !(1..=MONTHS).contains(&month) || !(1..=HOURS).contains(&hour) {
            return None;
        }
        self.slots.get((month - 1) * HOURS + (hour - 1))
    }

    /// The 24 slots of `month`, in hour order.
    pub fn month_slots(&self, month: usize) -> Option<&[SlotVars]> {
        if !(1..=MONTHS).contains(&month) {
            return None;
        }
        let start = (month - 1) * HOURS;
        self.slots.get(start..start + HOURS)
    }

    pub fn month(&self, month: usize) -> Option<&MonthVars> {
        month.checked_sub(1).and_then(|i| self.months.get(i))
    }

    pub fn get(&self, month: usize, hour: usize, kind: SlotVariable) -> Option<VarHandle> {
        self.slot(month, hour).map(|slot| slot.get(kind))
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }
}
