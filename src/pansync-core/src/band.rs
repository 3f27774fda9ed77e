// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Amateur-band classification and step-to-band-edge navigation.

/// One entry in the band table. `preferred_mhz` is mutated by `step()`
/// whenever the engine observes a frequency inside this band, so that
/// stepping away and back returns to the last frequency tuned there.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: &'static str,
    pub start_mhz: f64,
    pub preferred_mhz: f64,
    pub end_mhz: f64,
}

impl Band {
    const fn new(name: &'static str, start_mhz: f64, preferred_mhz: f64, end_mhz: f64) -> Self {
        Self {
            name,
            start_mhz,
            preferred_mhz,
            end_mhz,
        }
    }
}

const DEFAULT_BANDS: &[Band] = &[
    Band::new("160m", 1.810, 1.843, 2.000),
    Band::new(" 80m", 3.500, 3.603, 3.800),
    Band::new(" 60m", 5.3515, 5.354, 5.3665),
    Band::new(" 40m", 7.000, 7.053, 7.200),
    Band::new(" 30m", 10.100, 10.130, 10.150),
    Band::new(" 20m", 14.000, 14.125, 14.350),
    Band::new(" 17m", 18.068, 18.120, 18.168),
    Band::new(" 15m", 21.000, 21.151, 21.450),
    Band::new(" 12m", 24.890, 24.940, 24.990),
    Band::new(" 10m", 28.000, 28.320, 29.700),
    Band::new("  6m", 50.000, 50.100, 52.000),
];

/// Direction of a band-to-band step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Outcome of [`BandTable::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Tune to this preferred frequency (MHz) in the neighboring band.
    Goto(f64),
    /// Already at the edge of the table in that direction; beep instead.
    Boundary,
}

/// Ordered band table, classifying a frequency and navigating band edges.
pub struct BandTable {
    bands: Vec<Band>,
}

impl Default for BandTable {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS.to_vec(),
        }
    }
}

impl BandTable {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// Band name containing `freq_mhz`, or `"OOB"` if none does.
    #[must_use]
    pub fn name_for(&self, freq_mhz: f64) -> &str {
        match self.index_in_band(freq_mhz) {
            Some(i) => self.bands[i].name,
            None => "OOB",
        }
    }

    /// Step to the neighboring band's preferred frequency.
    ///
    /// If `freq_mhz` lies inside a band, that band's `preferred_mhz` is
    /// updated to `freq_mhz` before stepping, so the next visit resumes
    /// there. If it lies outside every band, the step is computed from
    /// the nearest lower band without mutating any preferred slot.
    pub fn step(&mut self, freq_mhz: f64, direction: Direction) -> StepOutcome {
        if let Some(i) = self.index_in_band(freq_mhz) {
            self.bands[i].preferred_mhz = freq_mhz;
            return match direction {
                Direction::Up => {
                    if i + 1 >= self.bands.len() {
                        StepOutcome::Boundary
                    } else {
                        StepOutcome::Goto(self.bands[i + 1].preferred_mhz)
                    }
                }
                Direction::Down => {
                    if i == 0 {
                        StepOutcome::Boundary
                    } else {
                        StepOutcome::Goto(self.bands[i - 1].preferred_mhz)
                    }
                }
            };
        }

        let i = self.floor_index(freq_mhz);
        match direction {
            Direction::Up => {
                let next = i + 1;
                if next < 0 || next as usize >= self.bands.len() {
                    StepOutcome::Boundary
                } else {
                    StepOutcome::Goto(self.bands[next as usize].preferred_mhz)
                }
            }
            Direction::Down => {
                if i < 0 {
                    StepOutcome::Boundary
                } else {
                    StepOutcome::Goto(self.bands[i as usize].preferred_mhz)
                }
            }
        }
    }

    /// Index of the last band whose `start_mhz <= freq_mhz`, or -1 if
    /// `freq_mhz` is below every band's start. Equivalent to the source's
    /// `bisect_right(starts, freq) - 1`.
    fn floor_index(&self, freq_mhz: f64) -> isize {
        match self
            .bands
            .partition_point(|b| b.start_mhz <= freq_mhz)
        {
            0 => -1,
            n => (n - 1) as isize,
        }
    }

    /// Index of the band containing `freq_mhz`, inclusive of both edges.
    fn index_in_band(&self, freq_mhz: f64) -> Option<usize> {
        let i = self.floor_index(freq_mhz);
        if i < 0 {
            return None;
        }
        let i = i as usize;
        if freq_mhz <= self.bands[i].end_mhz {
            Some(i)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_band() {
        let t = BandTable::default();
        assert_eq!(t.name_for(14.200), " 20m");
        assert_eq!(t.name_for(7.100), " 40m");
    }

    #[test]
    fn classifies_out_of_band() {
        let t = BandTable::default();
        assert_eq!(t.name_for(2.500), "OOB");
        assert_eq!(t.name_for(0.100), "OOB");
    }

    #[test]
    fn steps_up_from_top_band_hits_boundary_and_beeps() {
        let mut t = BandTable::default();
        assert_eq!(t.step(51.000, Direction::Up), StepOutcome::Boundary);
    }

    #[test]
    fn steps_down_from_top_band_returns_10m_preferred() {
        let mut t = BandTable::default();
        assert_eq!(t.step(51.000, Direction::Down), StepOutcome::Goto(28.320));
    }

    #[test]
    fn step_remembers_preferred_frequency() {
        let mut t = BandTable::default();
        let _ = t.step(14.250, Direction::Up);
        assert_eq!(t.step(18.100, Direction::Down), StepOutcome::Goto(14.250));
    }

    #[test]
    fn steps_up_from_below_lowest_band_goes_to_its_preferred() {
        let mut t = BandTable::default();
        assert_eq!(t.step(1.000, Direction::Up), StepOutcome::Goto(1.843));
    }

    #[test]
    fn steps_down_from_below_lowest_band_is_boundary() {
        let mut t = BandTable::default();
        assert_eq!(t.step(1.000, Direction::Down), StepOutcome::Boundary);
    }
}
