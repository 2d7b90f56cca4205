use serde::Serialize;

/// One line of output, emitted per processed packet.
///
/// Serializes either as a flat array `[a0, a1, ...]` or as
/// `{"leftSamples": [...], "rightSamples": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Amplitudes(Vec<f32>),
    Channels {
        #[serde(rename = "leftSamples")]
        left_samples: Vec<f32>,
        #[serde(rename = "rightSamples")]
        right_samples: Vec<f32>,
    },
}

impl OutputRecord {
    /// Total number of scalars carried by the record.
    pub fn scalar_count(&self) -> usize {
        match self {
            Self::Amplitudes(values) => values.len(),
            Self::Channels {
                left_samples,
                right_samples,
            } => left_samples.len() + right_samples.len(),
        }
    }
}
