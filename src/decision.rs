use std::fmt;

/// Probability at or above which a scan is reported as pneumonia.
pub const PNEUMONIA_THRESHOLD: f32 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Pneumonia,
    Normal,
}

impl Label {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pneumonia => "PNEUMONIA",
            Self::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one classification. `percent` is the confidence in `label`, not always
/// the pneumonia probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub label: Label,
    pub percent: u8,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Prediction: {}\nProbability: {}%",
            self.label, self.percent
        )
    }
}

/// Thresholds the model's pneumonia probability into a label and display percent.
///
/// Probabilities outside `[0, 1]` are clamped first.
pub fn decide(probability_of_pneumonia: f32) -> Prediction {
    let p = probability_of_pneumonia.clamp(0.0, 1.0);
    if p >= PNEUMONIA_THRESHOLD {
        Prediction {
            label: Label::Pneumonia,
            percent: round_half_up(p * 100.0),
        }
    } else {
        Prediction {
            label: Label::Normal,
            percent: round_half_up((1.0 - p) * 100.0),
        }
    }
}

fn round_half_up(value: f32) -> u8 {
    (value + 0.5).floor().clamp(0.0, 100.0) as u8
}
