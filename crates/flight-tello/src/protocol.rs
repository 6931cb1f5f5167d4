//! Parsing for the device's semicolon-delimited telemetry records

use flight_core::DroneState;

/// Fields extracted from one telemetry packet. Anything the packet did not
/// carry (or failed to parse) stays `None`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub battery: Option<f64>,
    pub height: Option<f64>,
    pub yaw: Option<f64>,
    pub flight_time: Option<f64>,
    pub temperature: Option<f64>,
}

impl TelemetryRecord {
    /// Fold the record into a drone state snapshot
    pub fn apply(&self, state: &mut DroneState) {
        if let Some(battery) = self.battery {
            state.battery = battery.clamp(0.0, 100.0);
        }
        if let Some(height) = self.height {
            state.z = height.max(0.0);
        }
        if let Some(yaw) = self.yaw {
            state.yaw = yaw.rem_euclid(360.0);
        }
        if let Some(flight_time) = self.flight_time {
            state.flight_time = flight_time;
        }
        if let Some(temperature) = self.temperature {
            state.temperature = temperature;
        }
    }
}

/// Parse a raw state line like `pitch:0;roll:0;yaw:37;bat:84;...`.
/// Malformed pairs are skipped.
pub fn parse_telemetry(raw: &str) -> TelemetryRecord {
    let mut record = TelemetryRecord::default();

    for pair in raw.trim().trim_end_matches(';').split(';') {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<f64>() else {
            continue;
        };
        match key.trim() {
            "bat" => record.battery = Some(value),
            "h" => record.height = Some(value),
            "yaw" => record.yaw = Some(value),
            "time" => record.flight_time = Some(value),
            "temph" => record.temperature = Some(value),
            _ => {}
        }
    }

    record
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let raw = "pitch:0;roll:-1;yaw:37;vgx:0;bat:84;h:120;time:96;templ:52;temph:56;\r\n";
        let record = parse_telemetry(raw);

        assert_eq!(record.battery, Some(84.0));
        assert_eq!(record.height, Some(120.0));
        assert_eq!(record.yaw, Some(37.0));
        assert_eq!(record.flight_time, Some(96.0));
        assert_eq!(record.temperature, Some(56.0));
    }

    #[test]
    fn test_parse_skips_garbage() {
        let record = parse_telemetry("bat:abc;;h:50;noise;yaw");
        assert_eq!(record.battery, None);
        assert_eq!(record.height, Some(50.0));
        assert_eq!(record.yaw, None);
    }

    #[test]
    fn test_apply_normalizes() {
        let mut state = DroneState::new();
        let record = parse_telemetry("yaw:-90;bat:104;h:-3");
        record.apply(&mut state);

        assert_eq!(state.yaw, 270.0);
        assert_eq!(state.battery, 100.0);
        assert_eq!(state.z, 0.0);
    }

    #[test]
    fn test_apply_leaves_missing_fields() {
        let mut state = DroneState::new();
        state.battery = 77.0;
        parse_telemetry("h:42").apply(&mut state);

        assert_eq!(state.battery, 77.0);
        assert_eq!(state.z, 42.0);
    }
}
