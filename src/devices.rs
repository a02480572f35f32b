//! Register catalogs of the supported device variants.
//!
//! Addresses count 16-bit words. Names and meanings come from observing live devices; registers
//! called `unknownN`/`RegN` are known to exist but their meaning is not.

use std::sync::LazyLock;

use crate::profile::{Definition, DeviceProfile, Switch};
use crate::registers::registers;

/// Name of the PCWU switch turning the heat pump on and off.
pub const HEAT_PUMP: &str = "heat_pump";
/// Name of the ZPS switch controlling night cooling of the tank through the collectors.
pub const NIGHT_COOLING: &str = "night_cooling";

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, strum::Display, strum::VariantArray)]
#[strum(serialize_all = "lowercase")]
pub enum Variant {
    /// PCWU heat pump, as seen through its MG-426-P01 executive module.
    Pcwu,
    /// ZPS solar controller G-422-P09.
    Zps,
}

impl Variant {
    pub fn profile(self) -> &'static DeviceProfile {
        match self {
            Self::Pcwu => pcwu(),
            Self::Zps => zps(),
        }
    }
}

/// PCWU heat pump executive module.
///
/// The module holds no controller settings. `IsManual` (194) reports whether the controller is
/// on (2) or off (1), `WaitingStatus` (202) why the pump is not running, and `HeatPumpEnabled`
/// (304) the manual enable. With the controller off the module keeps the pump off regardless of
/// 304. Their combination is left to the caller.
///
/// Writing 1 into `HeatPumpEnabled` has been observed to sometimes disable the pump; the
/// [`HEAT_PUMP`] switch writes 255 instead.
pub static PCWU: Definition = Definition {
    name: "pcwu",
    max_address: 536,
    max_register_count: 226,
    config_start: 302,
    true_word: 1,
    registers: registers! {
        // Status
        120: DATE, R_, "date";
        124: TIME, R_, "time";
        128: TE10, R_, "T1";                        // ambient
        130: TE10, R_, "T2";                        // tank bottom
        132: TE10, R_, "T3";                        // tank top
        138: TE10, R_, "T6";                        // water inlet
        140: TE10, R_, "T7";                        // water outlet
        142: TE10, R_, "T8";                        // evaporator
        144: TE10, R_, "T9";                        // before compressor
        146: TE10, R_, "T10";                       // after compressor
        166: WORD, R_, "unknown5";
        192: WORD, R_, "unknown3";
        194: WORD, R_, "IsManual";
        196: MASK, R_, [
            "FanON", _, "CirculationPumpON", _, _, "HeatPumpON", _, _, _, _, _,
            "CompressorON", "HeaterEON",
        ];
        198: WORD, R_, "EV1";                       // expansion valve opening
        // 0 available, 2 disabled through 304, 4 low COP, 32 waiting for a restart
        202: WORD, R_, "WaitingStatus";
        206: WORD, R_, "WaitingTimer";
        210: WORD, R_, "unknown7";
        218: WORD, R_, "unknown8";
        220: WORD, R_, "unknown9";
        222: WORD, R_, "unknown10";
        // Configuration
        302: WORD, RW, "InstallationScheme";        // 1-9
        304: BOOL, RW, "HeatPumpEnabled";
        306: WORD, RW, "TapWaterSensor";            // 0=T2, 1=T3, 2=T7
        308: TE10, RW, "TapWaterTemp";
        310: TE10, RW, "TapWaterHysteresis";
        312: TE10, RW, "AmbientMinTemp";
        314: TPRG, RW, "TimeProgramHPM-F";
        318: TPRG, RW, "TimeProgramHPSat";
        322: TPRG, RW, "TimeProgramHPSun";
        326: BOOL, RW, "AntiFreezingEnabled";
        328: WORD, RW, "WaterPumpOperationMode";    // 0=continuous, 1=synchronous
        330: WORD, RW, "FanOperationMode";          // 0=max, 1=min, 2=day/night
        332: WORD, RW, "DefrostingInterval";        // min
        334: TE10, RW, "DefrostingStartTemp";
        336: TE10, RW, "DefrostingStopTemp";
        338: WORD, RW, "DefrostingMaxTime";         // min
        516: BOOL, RW, "ExtControllerHPOFF";
    },
    switches: &[Switch { name: HEAT_PUMP, register: "HeatPumpEnabled", on: 255, off: 0 }],
};

/// ZPS solar controller, including the controller settings.
pub static ZPS: Definition = Definition {
    name: "zps",
    max_address: 330,
    max_register_count: 76,
    config_start: 170,
    true_word: 1,
    registers: registers! {
        // Status
        120: DATE, R_, "date";
        124: TIME, R_, "time";
        128: TEMP, R_, "T1";                        // collectors
        130: TEMP, R_, "T2";                        // tank bottom
        132: TEMP, R_, "T3";                        // air separator
        134: TEMP, R_, "T4";                        // tank top
        136: TEMP, R_, "T5";                        // boiler outlet
        138: TEMP, R_, "T6";
        144: WORD, R_, "CollectorPower";            // W
        148: FL10, R_, "Consumption";               // W
        150: BOOL, R_, "CollectorActive";
        152: FL10, R_, "FlowRate";                  // l/min
        154: MASK, R_, ["CollectorPumpON", _, "CirculationPumpON"];
        156: WORD, R_, "CollectorPumpSpeed";        // 0-15
        166: FL10, R_, "TotalEnergy";               // kWh
        // Configuration
        170: WORD, RW, "InstallationScheme";        // 1-19
        172: WORD, RW, "DisplayTimeout";            // 1-10 min
        174: WORD, RW, "DisplayBrightness";         // 1-10
        176: BOOL, RW, "AlarmSoundEnabled";
        178: BOOL, RW, "KeySoundEnabled";
        180: WORD, RW, "DisplayLanguage";           // 0=PL, 1=EN, 2=DE, 3=FR, 4=PT, 5=ES, 6=NL, 7=IT, 8=CZ, 9=SL
        182: TEMP, RW, "FluidFreezingTemp";
        186: FL10, RW, "FlowRateNominal";           // l/min
        188: WORD, RW, "FlowRateMeasurement";       // 0=rotameter, 1=electronic G916, 2=electronic
        190: F100, RW, "FlowRateWeight";            // imp/l
        192: BOOL, RW, "HolidayEnabled";
        194: WORD, RW, "HolidayStartDay";
        196: WORD, RW, "HolidayStartMonth";
        198: WORD, RW, "HolidayStartYear";
        200: WORD, RW, "HolidayEndDay";
        202: WORD, RW, "HolidayEndMonth";
        204: WORD, RW, "HolidayEndYear";
        206: WORD, RW, "CollectorType";             // 0=flat, 1=tube
        208: TEMP, RW, "CollectorPumpHysteresis";
        210: TEMP, RW, "ExtraPumpHysteresis";
        212: TEMP, RW, "CollectorPumpMaxTemp";
        214: WORD, RW, "BoilerPumpMinTemp";
        218: WORD, RW, "HeatSourceMaxTemp";
        220: WORD, RW, "BoilerPumpMaxTemp";
        222: BOOL, RW, "PumpRegulationEnabled";
        226: WORD, RW, "HeatSourceMaxCollectorPower"; // 100-9900 W
        228: BOOL, RW, "CollectorOverheatProtEnabled";
        230: TEMP, RW, "CollectorOverheatProtMaxTemp";
        232: BOOL, RW, "CollectorFreezingProtEnabled";
        234: WORD, RW, "HeatingPriority";
        236: BOOL, RW, "LegionellaProtEnabled";
        238: BOOL, RW, "LockBoilerKWithBoilerC";
        240: BOOL, RW, "NightCoolingEnabled";
        242: TEMP, RW, "NightCoolingStartTemp";
        244: TEMP, RW, "NightCoolingStopTemp";
        246: WORD, RW, "NightCoolingStopTime";      // h
        248: TPRG, RW, "TimeProgramCM-F";
        252: TPRG, RW, "TimeProgramCSat";
        256: TPRG, RW, "TimeProgramCSun";
        260: TPRG, RW, "TimeProgramKM-F";
        264: TPRG, RW, "TimeProgramKSat";
        268: TPRG, RW, "TimeProgramKSun";
        278: WORD, RW, "CollectorPumpMinRev";       // rev/min
        280: WORD, RW, "CollectorPumpMaxRev";       // rev/min
        282: WORD, RW, "CollectorPumpMinIncTime";   // s
        284: WORD, RW, "CollectorPumpMinDecTime";   // s
        286: WORD, RW, "CollectorPumpStartupSpeed"; // 1-15
        288: BOOL, RW, "PressureSwitchEnabled";
        290: BOOL, RW, "TankOverheatProtEnabled";
        // Live in configuration space but report status.
        312: DWRD, R_, "TotalOperationTime";        // min
        320: WORD, R_, "Reg320";
        322: BOOL, RW, "CirculationPumpEnabled";
        324: WORD, RW, "CirculationPumpMode";       // 0=discontinuous, 1=continuous
        326: TEMP, RW, "CirculationPumpMinTemp";
        328: WORD, RW, "CirculationPumpONTime";     // 1-59 min
        330: WORD, RW, "CirculationPumpOFFTime";    // 1-59 min
    },
    switches: &[Switch { name: NIGHT_COOLING, register: "NightCoolingEnabled", on: 1, off: 0 }],
};

fn build(definition: &'static Definition) -> DeviceProfile {
    DeviceProfile::new(definition)
        .unwrap_or_else(|e| panic!("register catalog `{}` is malformed: {e}", definition.name))
}

static PCWU_PROFILE: LazyLock<DeviceProfile> = LazyLock::new(|| build(&PCWU));
static ZPS_PROFILE: LazyLock<DeviceProfile> = LazyLock::new(|| build(&ZPS));

pub fn pcwu() -> &'static DeviceProfile {
    &PCWU_PROFILE
}

pub fn zps() -> &'static DeviceProfile {
    &ZPS_PROFILE
}
