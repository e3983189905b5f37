//! CSV rendering of telemetry records.
//!
//! One line per sample:
//!
//! ```text
//! line,0xAA,0xSSSS,0xFFFF,agc,lim,clip,vbat,spkT,icT,x1,x2,re,mips
//! ```
//!
//! Floats carry six decimals. The same format is read back by
//! [`ReplayBackend`](crate::ReplayBackend).

use std::io::Write;

use spkboost_core::{LiveDataRecord, StatusFlags};

/// Column header line.
pub const RECORD_COLUMNS: &str = "line,i2caddr,statusRegister,statusFlags,agcGain,limitGain,limitClip,batteryVoltage,speakerTemp,icTemp,boostExcursion,manualExcursion,speakerResistance,shortOnMips";

/// Write the two header lines of a telemetry CSV.
pub fn print_record_header<W: Write>(out: &mut W, interval_ms: u64) -> std::io::Result<()> {
    writeln!(out, "recording interval time: {interval_ms} ms")?;
    writeln!(out, "{RECORD_COLUMNS}")
}

/// Render one record as a CSV line, without the newline.
pub fn format_record_line(line: u64, address: u8, record: &LiveDataRecord) -> String {
    format!(
        "{},0x{:02x},0x{:04x},0x{:04x},{:.6},{:.6},{:.6},{:.6},{},{},{:.6},{:.6},{:.6},{}",
        line,
        address,
        record.status_register,
        record.status_flags.bits(),
        record.agc_gain,
        record.limit_gain,
        record.limit_clip,
        record.battery_voltage,
        record.speaker_temp,
        record.ic_temp,
        record.boost_excursion,
        record.manual_excursion,
        record.speaker_resistance,
        record.short_on_mips,
    )
}

/// A telemetry line read back from CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRecord {
    /// Line counter.
    pub line: u64,
    /// Device address.
    pub address: u8,
    /// Sample values.
    pub record: LiveDataRecord,
}

fn hex<T: TryFrom<u32>>(field: &str) -> Option<T> {
    let digits = field.trim().strip_prefix("0x")?;
    u32::from_str_radix(digits, 16).ok().and_then(|v| T::try_from(v).ok())
}

/// Parse a line produced by [`format_record_line`].
///
/// Returns `None` for header lines and anything else that does not hold
/// exactly 14 well-formed fields.
pub fn parse_record_line(text: &str) -> Option<ParsedRecord> {
    let fields: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    let [
        line,
        address,
        status_register,
        flags,
        agc,
        lim,
        clip,
        vbat,
        spk_t,
        ic_t,
        x1,
        x2,
        re,
        mips,
    ] = fields.as_slice()
    else {
        return None;
    };

    Some(ParsedRecord {
        line: line.parse().ok()?,
        address: hex(address)?,
        record: LiveDataRecord {
            status_register: hex(status_register)?,
            status_flags: StatusFlags(hex(flags)?),
            agc_gain: agc.parse().ok()?,
            limit_gain: lim.parse().ok()?,
            limit_clip: clip.parse().ok()?,
            battery_voltage: vbat.parse().ok()?,
            speaker_temp: spk_t.parse().ok()?,
            ic_temp: ic_t.parse().ok()?,
            boost_excursion: x1.parse().ok()?,
            manual_excursion: x2.parse().ok()?,
            speaker_resistance: re.parse().ok()?,
            short_on_mips: mips.parse().ok()?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LiveDataRecord {
        LiveDataRecord {
            status_register: 0x805f,
            status_flags: StatusFlags(0x41),
            agc_gain: 1.5,
            limit_gain: 0.25,
            limit_clip: 2.0,
            battery_voltage: 3.75,
            speaker_temp: 28,
            ic_temp: -3,
            boost_excursion: 0.125,
            manual_excursion: 0.0,
            speaker_resistance: 7.8,
            short_on_mips: 0,
        }
    }

    #[test]
    fn header_lines() {
        let mut out = Vec::new();
        print_record_header(&mut out, 250).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["recording interval time: 250 ms", RECORD_COLUMNS]);
    }

    #[test]
    fn line_format() {
        assert_eq!(
            format_record_line(7, 0x34, &sample()),
            "7,0x34,0x805f,0x0041,1.500000,0.250000,2.000000,3.750000,28,-3,0.125000,0.000000,7.800000,0"
        );
    }

    #[test]
    fn parse_reads_back_formatted_line() {
        let text = format_record_line(3, 0x36, &sample());
        let parsed = parse_record_line(&text).unwrap();
        assert_eq!(parsed.line, 3);
        assert_eq!(parsed.address, 0x36);
        assert_eq!(parsed.record, sample());
    }

    #[test]
    fn parse_rejects_headers() {
        assert_eq!(parse_record_line("recording interval time: 1000 ms"), None);
        assert_eq!(parse_record_line(RECORD_COLUMNS), None);
        assert_eq!(parse_record_line(""), None);
        assert_eq!(parse_record_line("1,0x34,0x0000"), None);
    }
}
