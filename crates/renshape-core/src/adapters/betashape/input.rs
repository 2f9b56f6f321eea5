//! ENSDF-style input decks for Betashape.

use super::BetashapeError;
use crate::adapters::calculator::{DecayParameters, LevelParameters};
use crate::adapters::library::DiscreteTransition;
use crate::common::elements::{NuclideId, element_symbol};
use crate::common::uncertainty::std_to_shorthand;

/// Daughter spin-parity giving each tabulated transition type from a `0+` parent.
pub fn daughter_spin_parity(transition_type: &str) -> Option<&'static str> {
    match transition_type.trim() {
        "a" => Some("0+"),
        "1u" => Some("2-"),
        "2u" => Some("3+"),
        "3u" => Some("4-"),
        _ => None,
    }
}

/// Left-aligned field of exactly `width` characters.
fn column(value: &str, width: usize) -> String {
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// `135XE` as a right-aligned ENSDF nucleus identifier (`  12C` style mass field).
fn nucleus_field(name: &str) -> String {
    let split = name.find(|c: char| !c.is_ascii_digit()).unwrap_or(name.len());
    format!("{:>3}{}", &name[..split], &name[split..])
}

fn padded(record: &str, width: usize) -> String {
    let fill = width.saturating_sub(record.chars().count()).max(1);
    format!("{record}{}", " ".repeat(fill))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

impl DecayParameters {
    /// Calculator input for a decay-library entry.
    ///
    /// Energies are converted from MeV to keV and intensities from fractions to
    /// percent. The parent is taken as `0+`, so each transition type fixes the
    /// daughter spin-parity. `q` is `(value, uncertainty)` in keV; when unknown the
    /// largest end-point energy is used.
    pub fn from_discrete_transitions(
        parent: &NuclideId,
        transitions: &[DiscreteTransition],
        q: Option<(f64, f64)>,
        half_life_sec: Option<f64>,
    ) -> Result<Self, BetashapeError> {
        let parent_symbol = parent
            .symbol()
            .ok_or(BetashapeError::UnknownElement {
                atomic_number: parent.atomic_number,
            })?;
        let daughter_symbol = element_symbol(parent.atomic_number as usize + 1).ok_or(
            BetashapeError::UnknownElement {
                atomic_number: parent.atomic_number + 1,
            },
        )?;
        if transitions.is_empty() {
            return Err(BetashapeError::NoTransitions);
        }

        let end_points: Vec<f64> = transitions.iter().map(|t| t.energy * 1.0e3).collect();
        let end_point_uncertainties: Vec<f64> = transitions
            .iter()
            .map(|t| t.energy_uncertainty * 1.0e3)
            .collect();

        let (q_value, q_std) = match q {
            Some(q) => q,
            None => {
                let (index, max) = end_points
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (index, value)| {
                        if value > best.1 { (index, value) } else { best }
                    });
                (max, end_point_uncertainties[index])
            }
        };
        let (q_text, q_digits) = std_to_shorthand(q_value, q_std)?;
        let q_rounded: f64 = q_text.parse().map_err(|_| BetashapeError::InvalidParameter {
            message: format!("Q-value '{q_text}' is not numeric"),
        })?;

        let mut levels = Vec::with_capacity(transitions.len());
        for (index, transition) in transitions.iter().enumerate() {
            let spin_parity = daughter_spin_parity(&transition.transition_type).ok_or_else(|| {
                BetashapeError::UnsupportedTransition {
                    transition_type: transition.transition_type.clone(),
                }
            })?;

            let intensity = round_to(transition.intensity * 100.0, 4);
            let intensity_std = round_to(transition.intensity_uncertainty * 100.0, 4);
            let (intensity, intensity_uncertainty) = if intensity_std == 0.0 {
                (format!("{intensity}"), "0".to_string())
            } else {
                std_to_shorthand(intensity, intensity_std)?
            };

            let (energy, energy_uncertainty) =
                std_to_shorthand(q_rounded - end_points[index], end_point_uncertainties[index])?;

            levels.push(LevelParameters {
                energy,
                energy_uncertainty,
                spin_parity: spin_parity.to_string(),
                intensity,
                intensity_uncertainty,
            });
        }

        let (half_life, half_life_units) = match half_life_sec {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => (format!("{seconds}"), "S".to_string()),
            _ => (String::new(), String::new()),
        };

        Ok(Self {
            parent: format!("{}{}", parent.mass_number, parent_symbol.to_ascii_uppercase()),
            daughter: format!("{}{}", parent.mass_number, daughter_symbol.to_ascii_uppercase()),
            parent_level_energy: "0.0".to_string(),
            parent_level_uncertainty: String::new(),
            parent_spin_parity: "0+".to_string(),
            half_life,
            half_life_units,
            half_life_uncertainty: String::new(),
            q_value: q_text,
            q_uncertainty: q_digits,
            normalization: "1.0".to_string(),
            normalization_uncertainty: String::new(),
            branching: "1".to_string(),
            branching_uncertainty: String::new(),
            levels,
        })
    }

    /// Fixed-column ENSDF deck: identification, parent, normalization and
    /// production-normalization records, then one level and one beta record per
    /// transition.
    pub fn to_ensdf(&self) -> String {
        let daughter = nucleus_field(&self.daughter);
        let parent = nucleus_field(&self.parent);
        let half_life = format!("{} {}", self.half_life, self.half_life_units);

        let mut deck = String::new();
        deck.push_str(&padded(&daughter, 9));
        deck.push_str(&column(&format!("{} B- DECAY:{}", self.parent, half_life), 30));
        deck.push('\n');

        deck.push_str(&padded(&parent, 7));
        deck.push_str("P ");
        deck.push_str(&column(&self.parent_level_energy, 10));
        deck.push_str(&column(&self.parent_level_uncertainty, 2));
        deck.push_str(&column(&self.parent_spin_parity, 18));
        deck.push_str(&column(&half_life, 10));
        deck.push_str(&column(&self.half_life_uncertainty, 6));
        deck.push_str(&column("", 9));
        deck.push_str(&column(&self.q_value, 10));
        deck.push_str(&column(&self.q_uncertainty, 2));
        deck.push_str(&column("", 4));
        deck.push('\n');

        deck.push_str(&padded(&daughter, 7));
        deck.push_str("N ");
        deck.push_str(&column(&self.normalization, 9));
        deck.push_str(&column(&self.normalization_uncertainty, 2));
        deck.push_str(&column("", 11));
        deck.push_str(&column(&self.branching, 8));
        deck.push_str(&column(&self.branching_uncertainty, 2));
        deck.push_str(&column("1.0", 10));
        deck.push('\n');

        deck.push_str(&padded(&daughter, 6));
        deck.push_str("PN\n");

        for level in &self.levels {
            deck.push_str(&padded(&daughter, 7));
            deck.push_str("L ");
            deck.push_str(&column(&level.energy, 10));
            deck.push_str(&column(&level.energy_uncertainty, 2));
            deck.push_str(&column(&level.spin_parity, 18));
            deck.push_str(&column("", 16));
            deck.push_str(&column("", 9));
            deck.push('\n');

            deck.push_str(&padded(&daughter, 7));
            deck.push_str("B ");
            deck.push_str(&column("", 12));
            deck.push_str(&column(&level.intensity, 8));
            deck.push_str(&column(&level.intensity_uncertainty, 2));
            deck.push_str(&column("", 46));
            deck.push_str(&column("", 2));
            deck.push('\n');
        }
        deck
    }
}
