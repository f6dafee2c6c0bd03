//! Which language dialects each board can run.

use crate::types::{Board, LanguagePreference};

/// Returns whether `board` can run code written in `language`.
///
/// `Default` always qualifies; it asks the service to pick the board's
/// native dialect.
pub fn is_supported(board: Board, language: LanguagePreference) -> bool {
    use LanguagePreference::{CircuitPython, Cpp, MicroPython};

    if language == LanguagePreference::Default {
        return true;
    }

    match board {
        // Native toolchains only.
        Board::ArduinoR4 | Board::ArduinoNano => language == Cpp,
        // No CircuitPython port.
        Board::Microbit | Board::M5Stick => matches!(language, MicroPython | Cpp),
        Board::Esp8266 => language != CircuitPython,
        // Full Linux: CircuitPython via Blinka, no MicroPython firmware.
        Board::Rpi5 => language != MicroPython,
        Board::Esp32 | Board::PicoW => true,
    }
}

/// String-keyed lookup for ids coming from the command line or old data.
/// Anything unrecognised is denied.
pub fn is_supported_id(board: &str, language: &str) -> bool {
    match (board.parse::<Board>(), language.parse::<LanguagePreference>()) {
        (Ok(board), Ok(language)) => is_supported(board, language),
        _ => false,
    }
}

/// Languages offered for `board`, `Default` first.
pub fn supported_languages(board: Board) -> Vec<LanguagePreference> {
    LanguagePreference::ALL
        .into_iter()
        .filter(|language| is_supported(board, *language))
        .collect()
}
