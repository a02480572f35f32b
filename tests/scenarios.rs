use hewalex_geco_tools::device::{Device, Error};
use hewalex_geco_tools::devices::{pcwu, zps};
use hewalex_geco_tools::profile;
use hewalex_geco_tools::transport::{RegisterFile, Transaction};
use hewalex_geco_tools::value::{Decimal, Value};

#[test]
fn heat_pump_ambient_temperature() {
    let mut device = Device::new(pcwu(), RegisterFile::new(600).with_words(128, &[215]));
    let value = device.read("T1").unwrap();
    assert_eq!(value, Value::Decimal(Decimal::new(215, 1)));
    assert_eq!(value.to_string(), "21.5");
}

#[test]
fn heat_pump_enable_and_disable() {
    for initial in [0, 1, 255] {
        let mut device = Device::new(pcwu(), RegisterFile::new(600).with_words(304, &[initial]));
        device.enable().unwrap();
        device.disable().unwrap();
        assert_eq!(
            device.transport().transactions(),
            [
                Transaction::Write { address: 304, words: vec![255] },
                Transaction::Write { address: 304, words: vec![0] },
            ]
        );
    }
}

#[test]
fn solar_night_cooling() {
    let mut device = Device::new(zps(), RegisterFile::new(400));
    device.enable_night_cooling().unwrap();
    let address = zps().resolve("NightCoolingEnabled").unwrap().address;
    assert_eq!(
        device.transport().transactions(),
        [Transaction::Write { address, words: vec![1] }]
    );
    assert_eq!(device.read("NightCoolingEnabled").unwrap(), Value::Bool(true));
}

#[test]
fn status_space_is_read_only() {
    for profile in [pcwu(), zps()] {
        let mut device = Device::new(profile, RegisterFile::new(600));
        for register in profile.registers().filter(|r| !profile.is_config(r.address)) {
            let err = device.write(register.address, &Value::Word(0)).unwrap_err();
            assert!(matches!(err, Error::NotWritable(r) if r == register), "{register}");
        }
        assert!(device.transport().transactions().is_empty());
    }
}

#[test]
fn bounds_are_enforced() {
    let profile = pcwu();
    assert_eq!(
        profile.resolve(profile.max_address() + 2),
        Err(profile::Error::RegisterOutOfRange(538))
    );
    assert_eq!(
        profile.resolve("NoSuchRegister"),
        Err(profile::Error::UnknownRegister("NoSuchRegister".into()))
    );
}

#[test]
fn run_state_is_read_field_by_field() {
    let file = RegisterFile::new(600)
        .with_words(194, &[1])
        .with_words(202, &[2])
        .with_words(304, &[255]);
    let mut device = Device::new(pcwu(), file);
    assert_eq!(device.read("IsManual").unwrap(), Value::Word(1));
    assert_eq!(device.read("WaitingStatus").unwrap(), Value::Word(2));
    assert_eq!(device.read("HeatPumpEnabled").unwrap(), Value::Bool(true));
}
