//! Live telemetry records.
//!
//! A [`LiveDataRecord`] combines two sources read on every sampling tick:
//!
//! - a [`StateSnapshot`] from the SpeakerBoost state-info query, already in
//!   engineering units;
//! - six raw bytes from the top of the register map ([`RawInfoRegisters`]):
//!   the status register, the battery ADC and the die temperature.

use crate::FormatError;

/// Number of raw info-register bytes read per tick.
pub const INFO_REGISTER_BYTES: usize = 6;

/// Full-scale battery voltage of the 10-bit ADC.
pub const BATTERY_FULL_SCALE: f32 = 5.5;

/// SpeakerBoost status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StatusFlags(pub u16);

impl StatusFlags {
    /// Algorithm active.
    pub const ACTIVITY: u16 = 1 << 0;
    /// Signal (S) control active.
    pub const S_CTRL: u16 = 1 << 1;
    /// Output muted.
    pub const MUTED: u16 = 1 << 2;
    /// Excursion (X) control active.
    pub const X_CTRL: u16 = 1 << 3;
    /// Temperature (T) control active.
    pub const T_CTRL: u16 = 1 << 4;
    /// New speaker model loaded.
    pub const NEW_MODEL: u16 = 1 << 5;
    /// Volume ready.
    pub const VOLUME_RDY: u16 = 1 << 6;
    /// Speaker damage detected.
    pub const DAMAGED: u16 = 1 << 7;
    /// Signal clipping.
    pub const SIGNAL_CLIPPING: u16 = 1 << 8;

    const LETTERS: [(u16, char); 9] = [
        (Self::ACTIVITY, 'A'),
        (Self::S_CTRL, 'S'),
        (Self::MUTED, 'M'),
        (Self::X_CTRL, 'X'),
        (Self::T_CTRL, 'T'),
        (Self::NEW_MODEL, 'L'),
        (Self::VOLUME_RDY, 'V'),
        (Self::DAMAGED, 'D'),
        (Self::SIGNAL_CLIPPING, 'C'),
    ];

    /// Raw bit word.
    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    /// True if every bit in `mask` is set.
    #[inline]
    pub fn contains(self, mask: u16) -> bool {
        self.0 & mask == mask
    }
}

/// Renders as `ASMXTLVDC`, upper case for set flags and lower case otherwise.
impl core::fmt::Display for StatusFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (mask, letter) in Self::LETTERS {
            let c = if self.contains(mask) {
                letter
            } else {
                letter.to_ascii_lowercase()
            };
            core::fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

/// SpeakerBoost state as reported by the DSP.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateSnapshot {
    /// Status flag word.
    pub status_flags: StatusFlags,
    /// Current AGC gain.
    pub agc_gain: f32,
    /// Current limiter gain.
    pub lim_gain: f32,
    /// Current clip/limit threshold.
    pub s_max: f32,
    /// Speaker coil temperature.
    pub t: i32,
    /// Excursion caused by SpeakerBoost gain control.
    pub x1: f32,
    /// Excursion caused by manual gain setting.
    pub x2: f32,
    /// Loudspeaker blocked resistance.
    pub re: f32,
    /// MIPS shortage indicator.
    pub short_on_mips: i32,
}

/// The six info-register bytes read on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawInfoRegisters {
    /// Status register, bytes 0..2.
    pub status_register: u16,
    /// Battery ADC field, bytes 2..4.
    pub battery_adc: u16,
    /// Die temperature field, bytes 4..6.
    pub ic_temp_raw: u16,
}

impl RawInfoRegisters {
    /// Parse the six big-endian info bytes.
    ///
    /// # Errors
    ///
    /// [`FormatError::Length`] unless exactly six bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() != INFO_REGISTER_BYTES {
            return Err(FormatError::Length {
                expected: INFO_REGISTER_BYTES,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            status_register: u16::from_be_bytes([bytes[0], bytes[1]]),
            battery_adc: u16::from_be_bytes([bytes[2], bytes[3]]),
            ic_temp_raw: u16::from_be_bytes([bytes[4], bytes[5]]),
        })
    }

    /// Serialize back to the register layout.
    pub fn to_bytes(self) -> [u8; INFO_REGISTER_BYTES] {
        let [s0, s1] = self.status_register.to_be_bytes();
        let [b0, b1] = self.battery_adc.to_be_bytes();
        let [t0, t1] = self.ic_temp_raw.to_be_bytes();
        [s0, s1, b0, b1, t0, t1]
    }

    /// Battery voltage, `adc * 5.5 / 1024`.
    pub fn battery_voltage(self) -> f32 {
        (f32::from(self.battery_adc) * BATTERY_FULL_SCALE) / 1024.0
    }

    /// Die temperature in degrees.
    ///
    /// The field is a 9-bit two's-complement value: raw values from 256 up
    /// read as `raw - 512`.
    pub fn ic_temp(self) -> i32 {
        let raw = i32::from(self.ic_temp_raw);
        if raw >= 256 { raw - 512 } else { raw }
    }

    /// Inverse of [`battery_voltage`](Self::battery_voltage), rounded to the
    /// nearest ADC step.
    pub fn battery_adc_for(volts: f32) -> u16 {
        libm::roundf(volts * 1024.0 / BATTERY_FULL_SCALE).clamp(0.0, f32::from(u16::MAX)) as u16
    }

    /// Inverse of [`ic_temp`](Self::ic_temp) for temperatures in `-256..256`.
    pub fn ic_temp_raw_for(degrees: i32) -> u16 {
        let d = degrees.clamp(-256, 255);
        (if d < 0 { d + 512 } else { d }) as u16
    }
}

/// One telemetry sample in engineering units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LiveDataRecord {
    /// Raw status register.
    pub status_register: u16,
    /// SpeakerBoost status flags.
    pub status_flags: StatusFlags,
    /// Current AGC gain.
    pub agc_gain: f32,
    /// Current limiter gain.
    pub limit_gain: f32,
    /// Current clip/limit threshold.
    pub limit_clip: f32,
    /// Battery voltage (V).
    pub battery_voltage: f32,
    /// Speaker coil temperature.
    pub speaker_temp: i32,
    /// Die temperature.
    pub ic_temp: i32,
    /// Excursion caused by SpeakerBoost gain control.
    pub boost_excursion: f32,
    /// Excursion caused by manual gain setting.
    pub manual_excursion: f32,
    /// Loudspeaker blocked resistance.
    pub speaker_resistance: f32,
    /// MIPS shortage indicator.
    pub short_on_mips: i32,
}

impl LiveDataRecord {
    /// Combine a state snapshot with the decoded info registers.
    pub fn from_parts(state: &StateSnapshot, regs: RawInfoRegisters) -> Self {
        Self {
            status_register: regs.status_register,
            status_flags: state.status_flags,
            agc_gain: state.agc_gain,
            limit_gain: state.lim_gain,
            limit_clip: state.s_max,
            battery_voltage: regs.battery_voltage(),
            speaker_temp: state.t,
            ic_temp: regs.ic_temp(),
            boost_excursion: state.x1,
            manual_excursion: state.x2,
            speaker_resistance: state.re,
            short_on_mips: state.short_on_mips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reference_registers() {
        let regs = RawInfoRegisters::from_bytes(&[0x12, 0x34, 0x00, 0x64, 0x01, 0x90]).unwrap();
        assert_eq!(regs.status_register, 0x1234);
        assert_eq!(regs.battery_voltage(), 100.0 * 5.5 / 1024.0);
        assert_eq!(regs.ic_temp(), -112);
    }

    #[test]
    fn ic_temp_threshold() {
        let at = |raw| RawInfoRegisters {
            ic_temp_raw: raw,
            ..Default::default()
        };
        assert_eq!(at(255).ic_temp(), 255);
        assert_eq!(at(256).ic_temp(), -256);
        assert_eq!(at(511).ic_temp(), -1);
        assert_eq!(at(25).ic_temp(), 25);
    }

    #[test]
    fn info_bytes_wrong_length() {
        assert!(RawInfoRegisters::from_bytes(&[0; 5]).is_err());
    }

    #[test]
    fn inverse_helpers() {
        assert_eq!(RawInfoRegisters::ic_temp_raw_for(-112), 400);
        assert_eq!(RawInfoRegisters::ic_temp_raw_for(40), 40);
        assert_eq!(RawInfoRegisters::battery_adc_for(100.0 * 5.5 / 1024.0), 100);
    }

    #[test]
    fn status_flags_string() {
        let flags = StatusFlags(StatusFlags::ACTIVITY | StatusFlags::DAMAGED);
        assert_eq!(flags.to_string(), "AsmxtlvDc");
        assert_eq!(StatusFlags(0x1ff).to_string(), "ASMXTLVDC");
    }

    #[test]
    fn record_from_parts() {
        let state = StateSnapshot {
            agc_gain: 1.5,
            t: 42,
            re: 7.8,
            ..Default::default()
        };
        let regs = RawInfoRegisters {
            status_register: 0x0010,
            battery_adc: 700,
            ic_temp_raw: 30,
        };
        let rec = LiveDataRecord::from_parts(&state, regs);
        assert_eq!(rec.agc_gain, 1.5);
        assert_eq!(rec.speaker_temp, 42);
        assert_eq!(rec.ic_temp, 30);
        assert_eq!(rec.status_register, 0x0010);
        assert_eq!(rec.speaker_resistance, 7.8);
    }
}
