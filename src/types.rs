use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hardware targets the guides are written for.
///
/// The persisted form is the display name, so blobs written by older
/// versions of the app (which stored `"ESP8266 (NodeMCU)"` and friends)
/// keep loading. Parsing also accepts the short id used on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Board {
    #[default]
    Rpi5,
    ArduinoR4,
    Esp32,
    PicoW,
    Microbit,
    M5Stick,
    Esp8266,
    ArduinoNano,
}

impl Board {
    pub const ALL: [Board; 8] = [
        Board::Rpi5,
        Board::ArduinoR4,
        Board::Esp32,
        Board::PicoW,
        Board::Microbit,
        Board::M5Stick,
        Board::Esp8266,
        Board::ArduinoNano,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Board::Rpi5 => "rpi5",
            Board::ArduinoR4 => "arduino-r4",
            Board::Esp32 => "esp32",
            Board::PicoW => "pico-w",
            Board::Microbit => "microbit",
            Board::M5Stick => "m5stick",
            Board::Esp8266 => "esp8266",
            Board::ArduinoNano => "arduino-nano",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Board::Rpi5 => "Raspberry Pi 5",
            Board::ArduinoR4 => "Arduino Uno R4",
            Board::Esp32 => "ESP32",
            Board::PicoW => "Raspberry Pi Pico W",
            Board::Microbit => "Micro:bit V2",
            Board::M5Stick => "M5StickC Plus",
            Board::Esp8266 => "ESP8266 (NodeMCU)",
            Board::ArduinoNano => "Arduino Nano",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Board::Rpi5 => "Powerhouse for vision & heavy processing.",
            Board::ArduinoR4 => "The classic with 32-bit power & LED matrix.",
            Board::Esp32 => "WiFi + Bluetooth IoT standard.",
            Board::PicoW => "Dual-core RP2040 with native WiFi.",
            Board::Microbit => "Education focused with Radio/BLE & sensors.",
            Board::M5Stick => "Portable ESP32 with screen & battery.",
            Board::Esp8266 => "Low-cost WiFi microchip (NodeMCU/D1 Mini).",
            Board::ArduinoNano => "Compact, breadboard-friendly classic.",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Board::ALL
            .into_iter()
            .find(|b| {
                b.id().eq_ignore_ascii_case(needle) || b.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| format!("Unknown board: {s}"))
    }
}

impl TryFrom<String> for Board {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.display_name().to_string()
    }
}

/// Code dialect the completion service is asked to emit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    #[default]
    #[value(name = "default")]
    Default,
    #[value(name = "micropython")]
    MicroPython,
    #[value(name = "cpp")]
    Cpp,
    #[value(name = "circuitpython")]
    CircuitPython,
}

impl LanguagePreference {
    pub const ALL: [LanguagePreference; 4] = [
        LanguagePreference::Default,
        LanguagePreference::MicroPython,
        LanguagePreference::Cpp,
        LanguagePreference::CircuitPython,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            LanguagePreference::Default => "default",
            LanguagePreference::MicroPython => "micropython",
            LanguagePreference::Cpp => "cpp",
            LanguagePreference::CircuitPython => "circuitpython",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LanguagePreference::Default => "Default (best fit for the board)",
            LanguagePreference::MicroPython => "MicroPython",
            LanguagePreference::Cpp => "C++ (Arduino)",
            LanguagePreference::CircuitPython => "CircuitPython",
        }
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for LanguagePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguagePreference::ALL
            .into_iter()
            .find(|l| l.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown language preference: {s}"))
    }
}

/// Selects the prompt template and the system framing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Sensor,
    Game,
    Barcode,
    Network,
    Scratch,
    General,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Sensor => "sensor",
            TaskCategory::Game => "game",
            TaskCategory::Barcode => "barcode",
            TaskCategory::Network => "network",
            TaskCategory::Scratch => "scratch",
            TaskCategory::General => "general",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tabs of the app. Saved projects remember the tab they came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    Home,
    Sensors,
    Games,
    Barcode,
    Network,
    Scratch,
    Saved,
}

const SENSOR_PRESETS: &[&str] = &[
    "DHT22 (Temp/Humidity)",
    "HC-SR04 (Ultrasonic)",
    "MPU6050 (Gyro/Accel)",
    "BME280 (Pressure/Temp)",
    "OLED Display (SSD1306)",
    "Servo Motor (SG90)",
];

const GAME_PRESETS: &[&str] = &[
    "Snake",
    "Tetris",
    "Pong",
    "Space Invaders",
    "Doom (RPi Only)",
    "Dino Run",
];

const BARCODE_PRESETS: &[&str] = &[
    "USB Barcode Scanner (HID Mode)",
    "Serial/UART Barcode Module (e.g., GM65)",
    "Camera Module (OpenCV/ZBar)",
    "Pi Camera Module V3",
];

const NETWORK_PRESETS: &[&str] = &[
    "Scan WiFi Networks",
    "Connect & Ping Google",
    "Check Signal Strength (RSSI)",
    "Simple Web Server",
    "MQTT Client Setup",
    "Radio/BLE Chat (Micro:bit)",
];

const SCRATCH_PRESETS: &[&str] = &[
    "Blink LED with Scratch",
    "Read Button Press",
    "Move Sprite with Tilt Sensor",
    "Create a Controller Game",
    "Display Text on Matrix/Screen",
];

impl AppView {
    pub const ALL: [AppView; 7] = [
        AppView::Home,
        AppView::Sensors,
        AppView::Games,
        AppView::Barcode,
        AppView::Network,
        AppView::Scratch,
        AppView::Saved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppView::Home => "home",
            AppView::Sensors => "sensors",
            AppView::Games => "games",
            AppView::Barcode => "barcode",
            AppView::Network => "network",
            AppView::Scratch => "scratch",
            AppView::Saved => "saved",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppView::Home => "Home",
            AppView::Sensors => "Sensor Lab",
            AppView::Games => "Arcade Builder",
            AppView::Barcode => "Barcode Systems",
            AppView::Network => "Network Tools",
            AppView::Scratch => "Scratch & Blocks",
            AppView::Saved => "Saved Projects",
        }
    }

    /// Label for the preset picker on this tab.
    pub fn preset_label(&self) -> &'static str {
        match self {
            AppView::Sensors => "Choose Sensor",
            AppView::Games => "Choose Game",
            AppView::Network => "Network Task",
            AppView::Scratch => "Coding Task",
            AppView::Barcode | AppView::Home | AppView::Saved => "Hardware Type",
        }
    }

    pub fn category(&self) -> TaskCategory {
        match self {
            AppView::Sensors => TaskCategory::Sensor,
            AppView::Games => TaskCategory::Game,
            AppView::Barcode => TaskCategory::Barcode,
            AppView::Network => TaskCategory::Network,
            AppView::Scratch => TaskCategory::Scratch,
            AppView::Home | AppView::Saved => TaskCategory::General,
        }
    }

    pub fn presets(&self) -> &'static [&'static str] {
        match self {
            AppView::Sensors => SENSOR_PRESETS,
            AppView::Games => GAME_PRESETS,
            AppView::Barcode => BARCODE_PRESETS,
            AppView::Network => NETWORK_PRESETS,
            AppView::Scratch => SCRATCH_PRESETS,
            AppView::Home | AppView::Saved => &[],
        }
    }

    /// Tabs that lead to a generation form.
    pub fn is_generator(&self) -> bool {
        !matches!(self, AppView::Saved)
    }
}

impl From<TaskCategory> for AppView {
    fn from(category: TaskCategory) -> Self {
        match category {
            TaskCategory::Sensor => AppView::Sensors,
            TaskCategory::Game => AppView::Games,
            TaskCategory::Barcode => AppView::Barcode,
            TaskCategory::Network => AppView::Network,
            TaskCategory::Scratch => AppView::Scratch,
            TaskCategory::General => AppView::Home,
        }
    }
}

impl fmt::Display for AppView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-initiated generation. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub board: Board,
    pub topic: String,
    pub category: TaskCategory,
    pub language: LanguagePreference,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProject {
    pub id: String,
    pub title: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub board: Board,
    pub view: AppView,
    pub topic: String,
    pub content: String,
}

impl SavedProject {
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// What a save action hands to the project store; id and timestamp are
/// assigned there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub board: Board,
    pub view: AppView,
    pub topic: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_parses_id_and_display_name() {
        assert_eq!("esp8266".parse::<Board>().unwrap(), Board::Esp8266);
        assert_eq!("ESP8266 (NodeMCU)".parse::<Board>().unwrap(), Board::Esp8266);
        assert_eq!("micro:bit v2".parse::<Board>().unwrap(), Board::Microbit);
        assert!("teensy".parse::<Board>().is_err());
        assert_eq!(Board::default(), Board::Rpi5);
    }

    #[test]
    fn board_serializes_as_display_name() {
        let json = serde_json::to_string(&Board::PicoW).unwrap();
        assert_eq!(json, "\"Raspberry Pi Pico W\"");
        let back: Board = serde_json::from_str("\"pico-w\"").unwrap();
        assert_eq!(back, Board::PicoW);
    }

    #[test]
    fn generator_tabs_map_to_categories() {
        assert_eq!(AppView::Games.category(), TaskCategory::Game);
        assert_eq!(AppView::Home.category(), TaskCategory::General);
        assert_eq!(AppView::from(TaskCategory::Network), AppView::Network);
        assert!(AppView::Home.presets().is_empty());
        assert_eq!(AppView::Barcode.presets().len(), 4);
        assert!(!AppView::Saved.is_generator());
    }

    #[test]
    fn saved_project_uses_camel_case_fields() {
        let project = SavedProject {
            id: "1700000000000".into(),
            title: "Blink".into(),
            timestamp: 1_700_000_000_000,
            board: Board::Esp32,
            view: AppView::Sensors,
            topic: "Blink LED".into(),
            content: "# Blink".into(),
        };
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["board"], "ESP32");
        assert_eq!(value["view"], "sensors");
        assert!(project.created_at().is_some());
    }
}
