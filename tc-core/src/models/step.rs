use serde::{Deserialize, Serialize};

/// Number of pages in the transaction form.
pub const TOTAL_STEPS: u8 = 9;

/// One page of the multi-step form, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormStep {
    AgentRole = 1,
    Property = 2,
    Clients = 3,
    Commission = 4,
    PropertyDetails = 5,
    TitleCompany = 6,
    Documents = 7,
    AdditionalInfo = 8,
    Signature = 9,
}

impl FormStep {
    pub const ALL: [FormStep; TOTAL_STEPS as usize] = [
        Self::AgentRole,
        Self::Property,
        Self::Clients,
        Self::Commission,
        Self::PropertyDetails,
        Self::TitleCompany,
        Self::Documents,
        Self::AdditionalInfo,
        Self::Signature,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::AgentRole => "Agent Role",
            Self::Property => "Property Information",
            Self::Clients => "Client Information",
            Self::Commission => "Commission",
            Self::PropertyDetails => "Property Details",
            Self::TitleCompany => "Title Company",
            Self::Documents => "Documents",
            Self::AdditionalInfo => "Additional Information",
            Self::Signature => "Signature",
        }
    }
}

/// Clamp an arbitrary step number into `[1, TOTAL_STEPS]`.
pub fn clamp_step(n: i64) -> u8 {
    n.clamp(1, i64::from(TOTAL_STEPS)) as u8
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn numbers_are_contiguous() {
        for (i, step) in FormStep::ALL.iter().enumerate() {
            assert_eq!(usize::from(step.number()), i + 1);
            assert_eq!(FormStep::from_number(step.number()), Some(*step));
        }
    }

    #[test]
    fn out_of_range_numbers_have_no_step() {
        assert_eq!(FormStep::from_number(0), None);
        assert_eq!(FormStep::from_number(TOTAL_STEPS + 1), None);
    }

    #[test]
    fn clamp_step_bounds() {
        assert_eq!(clamp_step(-4), 1);
        assert_eq!(clamp_step(0), 1);
        assert_eq!(clamp_step(5), 5);
        assert_eq!(clamp_step(99), TOTAL_STEPS);
    }
}
