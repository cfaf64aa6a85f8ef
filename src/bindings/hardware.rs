//! Hardware pass-throughs.
//!
//! Every op forwards to the injected [`crate::platform::Platform`] and does
//! nothing else. Script names keep their historical casing.

use std::sync::Arc;

use super::{op_ids, Bindings};
use crate::frame::Value;

pub fn register_hardware(bindings: &mut Bindings) {
    bindings.register(
        op_ids::PIN_MODE,
        "pinMode",
        "Set a pin's mode. Args: pin, mode.",
        2,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let pin = frame.pop_int()?;
            let mode = frame.pop_int()?;
            frame.close_bracket()?;
            host.platform.pin_mode(pin, mode);
            Ok(())
        }),
    );

    bindings.register(
        op_ids::DIGITAL_WRITE,
        "digitalWrite",
        "Drive a digital pin. Args: pin, level.",
        2,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let pin = frame.pop_int()?;
            let level = frame.pop_int()?;
            frame.close_bracket()?;
            host.platform.digital_write(pin, level);
            Ok(())
        }),
    );

    bindings.register(
        op_ids::ANALOG_WRITE,
        "analogWrite",
        "Write an analog level. Args: pin, value.",
        2,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let pin = frame.pop_int()?;
            let value = frame.pop_int()?;
            frame.close_bracket()?;
            host.platform.analog_write(pin, value);
            Ok(())
        }),
    );

    bindings.register(
        op_ids::ANALOG_READ,
        "analogRead",
        "Sample an analog pin. Args: pin. Returns level.",
        1,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let pin = frame.pop_int()?;
            frame.close_bracket()?;
            let level = host.platform.analog_read(pin);
            frame.push(Value::Int(level));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::DELAY,
        "DELAY",
        "Block the script. Args: milliseconds.",
        1,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let ms = frame.pop_int()?;
            frame.close_bracket()?;
            host.platform.delay_ms(ms);
            Ok(())
        }),
    );

    bindings.register(
        op_ids::MILLIS,
        "millis",
        "Milliseconds since boot. Returns integer.",
        0,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            frame.close_bracket()?;
            let now = host.platform.millis();
            frame.push(Value::Int(now));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::GET_TIME,
        "GetTime",
        "Wall clock as \"HH:MM\". Returns string.",
        0,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            frame.close_bracket()?;
            let (hour, minute) = host.platform.wall_clock();
            frame.push(Value::Str(format!("{:02}:{:02}", hour, minute)));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::GET_BATTERY_PCT,
        "GetBatteryPct",
        "Battery charge percentage. Returns integer.",
        0,
        true,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            frame.close_bracket()?;
            let pct = host.platform.battery_percent();
            frame.push(Value::Int(pct));
            Ok(())
        }),
    );

    bindings.register(
        op_ids::MOTOR,
        "Motor",
        "Pulse the vibration motor. Args: duration_ms.",
        1,
        false,
        Arc::new(|host, frame| {
            frame.open_bracket()?;
            let duration = frame.pop_int()?;
            frame.close_bracket()?;
            host.platform.vibrate(duration);
            Ok(())
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Host;
    use crate::frame::ArgStack;
    use crate::platform::{CannedReadings, PlatformCall, RecordingPlatform};
    use crate::sink::SinkTable;

    fn new_host() -> (Host, RecordingPlatform) {
        let platform = RecordingPlatform::with_readings(CannedReadings {
            analog_level: 880,
            clock_ms: 1234,
            battery: 76,
            time_of_day: (9, 5),
        });
        let host = Host::new(SinkTable::new(), Box::new(platform.clone()));
        (host, platform)
    }

    fn call(bindings: &Bindings, host: &mut Host, name: &str, args: Vec<Value>) -> ArgStack {
        let mut frame = ArgStack::new(args);
        bindings.call(name, host, &mut frame).unwrap();
        frame
    }

    #[test]
    fn writes_forward_to_platform() {
        let bindings = Bindings::new();
        let (mut host, platform) = new_host();

        call(&bindings, &mut host, "pinMode", vec![Value::Int(13), Value::Int(1)]);
        call(
            &bindings,
            &mut host,
            "digitalWrite",
            vec![Value::Int(13), Value::Int(1)],
        );
        call(&bindings, &mut host, "Motor", vec![Value::Int(100)]);

        assert_eq!(
            platform.calls(),
            vec![
                PlatformCall::PinMode(13, 1),
                PlatformCall::DigitalWrite(13, 1),
                PlatformCall::Vibrate(100),
            ]
        );
    }

    #[test]
    fn reads_push_platform_answers() {
        let bindings = Bindings::new();
        let (mut host, _platform) = new_host();

        let frame = call(&bindings, &mut host, "analogRead", vec![Value::Int(34)]);
        assert_eq!(frame.results(), &[Value::Int(880)]);

        let frame = call(&bindings, &mut host, "millis", vec![]);
        assert_eq!(frame.results(), &[Value::Int(1234)]);

        let frame = call(&bindings, &mut host, "GetBatteryPct", vec![]);
        assert_eq!(frame.results(), &[Value::Int(76)]);
    }

    #[test]
    fn get_time_is_zero_padded() {
        let bindings = Bindings::new();
        let (mut host, _platform) = new_host();
        let frame = call(&bindings, &mut host, "GetTime", vec![]);
        assert_eq!(frame.results(), &[Value::Str("09:05".to_string())]);
    }
}
