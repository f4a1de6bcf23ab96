use crate::schema::DateRange;
use log::warn;
use serde::{Deserialize, Serialize};

/// Longest range, in days, that still allows a daily trend.
pub const DAILY_SPAN_LIMIT: i64 = 31;

/// Bucket size of the revenue trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    Daily,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// Whether the UI may offer `self` for `range`.
    pub fn is_available(&self, range: &DateRange) -> bool {
        let span = range.span_days();
        match self {
            Frequency::Daily => span <= DAILY_SPAN_LIMIT,
            Frequency::Monthly => span > DAILY_SPAN_LIMIT,
            Frequency::Yearly => true,
        }
    }

    /// A user asking for `target`. Unavailable targets leave the state as is.
    pub fn request(self, target: Frequency, range: &DateRange) -> Frequency {
        if target.is_available(range) {
            target
        } else {
            self
        }
    }

    /// Corrects the state after the range changed underneath it.
    pub fn reconcile(self, range: &DateRange) -> Frequency {
        let corrected = match self {
            Frequency::Daily if !self.is_available(range) => Frequency::Monthly,
            Frequency::Monthly if !self.is_available(range) => Frequency::Daily,
            other => other,
        };

        if corrected != self {
            warn!(
                "{} trend unavailable for a {}-day range, switching to {}",
                self.label(),
                range.span_days(),
                corrected.label()
            );
        }

        corrected
    }
}

/// Department picked by clicking the department revenue chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Department(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// Carries the x-axis category of the clicked bar.
    DepartmentClicked(String),
    Cleared,
}

impl Selection {
    pub fn apply(self, event: SelectionEvent) -> Selection {
        match event {
            SelectionEvent::DepartmentClicked(name) if name.is_empty() => self,
            SelectionEvent::DepartmentClicked(name) => Selection::Department(name),
            SelectionEvent::Cleared => Selection::None,
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            Selection::None => None,
            Selection::Department(name) => Some(name.as_str()),
        }
    }
}
