use crate::compat;
use crate::error::{ServiceError, ServiceResult};
use crate::types::{Board, GenerationRequest, LanguagePreference, TaskCategory};

pub const PERSONA: &str = "You are an expert embedded systems engineer and maker. You specialize in Raspberry Pi, Arduino, ESP32, Pico W, Micro:bit, M5Stick and ESP8266 projects.";

/// Appended when an explicit dialect was requested.
const UNSUPPORTED_COMBINATION_RULE: &str = "If the selected board cannot run this language, say so clearly at the start of the answer and explain which language the board does support. Never silently substitute a different language.";

/// Instruction pair sent to the completion service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltPrompt {
    /// System instruction (persona, category framing, language rules).
    pub instructions: String,
    /// The user turn.
    pub prompt: String,
}

fn category_framing(category: TaskCategory) -> Option<&'static str> {
    match category {
        TaskCategory::Sensor => Some(
            "Provide concise, clear wiring instructions and complete, well-commented code examples.",
        ),
        TaskCategory::Game => Some(
            "You are an expert in retro gaming emulation and game development for microcontrollers. Focus on performance.",
        ),
        TaskCategory::Barcode => {
            Some("You are an expert in industrial automation and computer vision.")
        }
        TaskCategory::Network => Some(
            "You are a network engineer for IoT devices. Focus on connectivity, signal strength, and protocol handling.",
        ),
        TaskCategory::Scratch => {
            Some("You are an educator specializing in STEM and visual programming.")
        }
        TaskCategory::General => None,
    }
}

fn language_constraints(language: LanguagePreference) -> String {
    match language {
        LanguagePreference::Default => "Use the most common language for the board: Python for Raspberry Pi and Pico, Arduino C++ for Arduino, ESP32, ESP8266 and M5Stick, and MakeCode (JavaScript/Blocks description) or MicroPython for Micro:bit.".to_string(),
        LanguagePreference::MicroPython => format!(
            "Write all code in MicroPython, using the machine and network modules where relevant. {UNSUPPORTED_COMBINATION_RULE}"
        ),
        LanguagePreference::Cpp => format!(
            "Write all code in C++ for the Arduino framework (Arduino IDE or PlatformIO), including the required libraries and setup()/loop() structure. {UNSUPPORTED_COMBINATION_RULE}"
        ),
        LanguagePreference::CircuitPython => format!(
            "Write all code in CircuitPython, using the board, digitalio and busio modules and listing any Adafruit libraries to copy into lib/. {UNSUPPORTED_COMBINATION_RULE}"
        ),
    }
}

fn category_prompt(category: TaskCategory, board: &str, topic: &str) -> String {
    match category {
        TaskCategory::Sensor => format!(
            "Create a step-by-step tutorial for connecting and using a \"{topic}\" with a {board}. Include a wiring diagram description (pin to pin) and the necessary code to read data from the sensor."
        ),
        TaskCategory::Game => format!(
            "Explain how to run or create the game \"{topic}\" on a {board}. If it's a microcontroller (Arduino, ESP32, Pico, Micro:bit, M5Stick), provide the source code to build a simple version. If it's a Raspberry Pi, explain setup or installation."
        ),
        TaskCategory::Barcode => format!(
            "Create a comprehensive guide to build a barcode reader using a {board}. The user is interested in using: {topic}. Provide the hardware list, wiring instructions, and the complete software implementation."
        ),
        TaskCategory::Network => format!(
            "Create a guide to check network connectivity on the {board}, specifically regarding \"{topic}\". Include code to scan for WiFi networks (if applicable), connect to a network, check signal strength (RSSI), and perform a simple ping or HTTP request to verify internet access. If the board (like Micro:bit) uses Radio/BLE, explain how to test that connection instead."
        ),
        TaskCategory::Scratch => format!(
            "Explain how to use the {board} with Scratch or a block-based coding environment like MakeCode or UIFlow. Focus on the task: \"{topic}\". Explain the required firmware, software/extensions (like Scratch Link), and provide a logical description of the block arrangement or equivalent code to achieve the task."
        ),
        TaskCategory::General => {
            format!("Explain how to use {topic} with {board} in a maker project.")
        }
    }
}

/// Build the instruction pair for one generation.
///
/// The topic and board name are interpolated as plain text. An empty topic
/// is an input error; callers are expected to have caught it already.
pub fn build_prompt(
    board: Board,
    topic: &str,
    category: TaskCategory,
    language: LanguagePreference,
) -> ServiceResult<BuiltPrompt> {
    if topic.trim().is_empty() {
        return Err(ServiceError::Input(
            "Please select an option or enter a custom topic.".to_string(),
        ));
    }

    let mut instructions = String::from(PERSONA);
    if let Some(framing) = category_framing(category) {
        instructions.push(' ');
        instructions.push_str(framing);
    }
    instructions.push(' ');
    instructions.push_str(&language_constraints(language));

    if !compat::is_supported(board, language) {
        tracing::debug!(
            board = board.id(),
            language = language.id(),
            "building prompt for an unsupported combination"
        );
    }

    Ok(BuiltPrompt {
        instructions,
        prompt: category_prompt(category, board.display_name(), topic),
    })
}

pub fn build_for_request(request: &GenerationRequest) -> ServiceResult<BuiltPrompt> {
    build_prompt(
        request.board,
        &request.topic,
        request.category,
        request.language,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_give_identical_output() {
        let a = build_prompt(
            Board::Esp32,
            "DHT22 (Temp/Humidity)",
            TaskCategory::Sensor,
            LanguagePreference::MicroPython,
        )
        .unwrap();
        let b = build_prompt(
            Board::Esp32,
            "DHT22 (Temp/Humidity)",
            TaskCategory::Sensor,
            LanguagePreference::MicroPython,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn topic_and_board_appear_verbatim() {
        let topic = "Snake <with> \"quotes\" & {braces}";
        for category in [
            TaskCategory::Sensor,
            TaskCategory::Game,
            TaskCategory::Barcode,
            TaskCategory::Network,
            TaskCategory::Scratch,
            TaskCategory::General,
        ] {
            let built =
                build_prompt(Board::Esp8266, topic, category, LanguagePreference::Default).unwrap();
            assert!(built.prompt.contains(topic), "{category}");
            assert!(built.prompt.contains("ESP8266 (NodeMCU)"), "{category}");
        }
    }

    #[test]
    fn instructions_carry_category_and_language_rules() {
        let built = build_prompt(
            Board::Microbit,
            "Pong",
            TaskCategory::Game,
            LanguagePreference::CircuitPython,
        )
        .unwrap();
        assert!(built.instructions.starts_with(PERSONA));
        assert!(built.instructions.contains("retro gaming"));
        assert!(built.instructions.contains("CircuitPython"));
        assert!(built.instructions.contains(UNSUPPORTED_COMBINATION_RULE));
    }

    #[test]
    fn default_language_has_no_substitution_rule() {
        let built = build_prompt(
            Board::Rpi5,
            "Blink LED",
            TaskCategory::General,
            LanguagePreference::Default,
        )
        .unwrap();
        assert!(!built.instructions.contains(UNSUPPORTED_COMBINATION_RULE));
        assert_eq!(
            built.prompt,
            "Explain how to use Blink LED with Raspberry Pi 5 in a maker project."
        );
    }

    #[test]
    fn empty_topic_is_an_input_error() {
        let err = build_prompt(
            Board::Esp32,
            "   ",
            TaskCategory::Sensor,
            LanguagePreference::Default,
        )
        .unwrap_err();
        assert!(err.is_input());
    }
}
