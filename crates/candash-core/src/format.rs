use serde_json::Value;

/// Separator between message and signal coordinates in a vehicle row key.
/// DBC message and signal names never contain it.
pub const VEHICLE_KEY_SEPARATOR: char = '/';

pub fn fps_key(channel: &str) -> String {
    channel.to_string()
}

pub fn system_key(item: &str) -> String {
    item.to_string()
}

pub fn vehicle_key(message_id: &str, signal_id: &str) -> String {
    format!("{message_id}{VEHICLE_KEY_SEPARATOR}{signal_id}")
}

/// Render a raw value for display.
///
/// A non-empty `name` wins outright (symbolic/enumerated signal values).
/// Numbers are rounded to 8 decimal places to suppress float noise from
/// the decoder; the rounding is idempotent. A non-empty `unit` is appended
/// with a single space.
pub fn format_value(value: &Value, name: Option<&str>, unit: Option<&str>) -> String {
    if let Some(name) = name {
        if !name.is_empty() {
            return name.to_string();
        }
    }

    let text = match value {
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    match unit {
        Some(unit) if !unit.is_empty() => format!("{text} {unit}"),
        _ => text,
    }
}

fn format_number(value: f64) -> String {
    let rounded = (value * 1e8).round() / 1e8;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_overrides_value_and_unit() {
        assert_eq!(
            format_value(&json!(5), Some("ERROR_STATE"), Some("V")),
            "ERROR_STATE"
        );
        // An empty name does not override.
        assert_eq!(format_value(&json!(5), Some(""), Some("V")), "5 V");
    }

    #[test]
    fn numbers_round_to_eight_decimals() {
        assert_eq!(format_value(&json!(1.234567891), None, Some("V")), "1.23456789 V");
        assert_eq!(format_value(&json!(0), None, None), "0");
        assert_eq!(format_value(&json!(42.5), None, None), "42.5");
        assert_eq!(format_value(&json!(-0.000000004), None, None), "0");
    }

    #[test]
    fn rounding_is_idempotent() {
        let once = format_value(&json!(3.141592653589793), None, None);
        let reparsed: f64 = once.parse().unwrap();
        assert_eq!(format_value(&json!(reparsed), None, None), once);
    }

    #[test]
    fn strings_and_bools_pass_through_with_unit() {
        assert_eq!(format_value(&json!("37 %"), None, None), "37 %");
        assert_eq!(format_value(&json!(true), None, None), "true");
        assert_eq!(format_value(&json!("12.4"), None, Some("KB/s")), "12.4 KB/s");
        assert_eq!(format_value(&Value::Null, None, None), "");
    }

    #[test]
    fn vehicle_keys_join_coordinates() {
        assert_eq!(
            vehicle_key("ID132HVBattAmpVolt", "BattVoltage132"),
            "ID132HVBattAmpVolt/BattVoltage132"
        );
        assert_eq!(fps_key("can0"), "can0");
        assert_eq!(system_key("disk usage"), "disk usage");
    }
}
