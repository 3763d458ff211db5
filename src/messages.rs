//! Display screens.
//!
//! Every screen is a fixed two-line template rendered through
//! [`CharacterDisplay`]. Spaces are cursor moves and digits go through
//! `write_digit`, so a display driver only needs the five port calls.
//!
//! | Screen     | Line 1              | Line 2                     |
//! |------------|---------------------|----------------------------|
//! | Welcome    | `HELLO <name>`      | `PUSH TO START`            |
//! | Start      | `BLOW 5 TIMES...`   |                            |
//! | Retry      | `TRY AGAIN`         | `BLOW 5 TIMES...`          |
//! | Result     | `BAC LEVEL: 0.NN%`  | `DRIVE SAFE!` / `TOO HIGH` |
//! | Farewell   | `YOU HAVE ARRIVED`  | `SAFELY. GOODBYE!`         |
//! | LockedOut  | `CALL AN UBER OR`   | `#TAXI (#<digits>)`        |

use crate::app::ports::CharacterDisplay;
use crate::config::InterlockConfig;
use crate::control::bac::{BacValue, Verdict};

const BLOW_PROMPT: &str = "BLOW 5 TIMES...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Start,
    Retry,
    Result { bac: BacValue, verdict: Verdict },
    Farewell,
    LockedOut,
}

/// Clear the display and draw `screen`.
pub fn render(screen: &Screen, config: &InterlockConfig, display: &mut impl CharacterDisplay) {
    display.clear();
    match screen {
        Screen::Welcome => {
            write_text(display, "HELLO ");
            write_text(display, config.driver_name.as_str());
            display.new_line();
            write_text(display, "PUSH TO START");
        }
        Screen::Start => write_text(display, BLOW_PROMPT),
        Screen::Retry => {
            write_text(display, "TRY AGAIN");
            display.new_line();
            write_text(display, BLOW_PROMPT);
        }
        Screen::Result { bac, verdict } => {
            write_text(display, "BAC LEVEL: ");
            write_bac_figure(display, *bac);
            display.write_char('%');
            display.new_line();
            match verdict {
                Verdict::Pass => write_text(display, "DRIVE SAFE!"),
                Verdict::Fail => write_text(display, "TOO HIGH"),
            }
        }
        Screen::Farewell => {
            write_text(display, "YOU HAVE ARRIVED");
            display.new_line();
            write_text(display, "SAFELY. GOODBYE!");
        }
        Screen::LockedOut => {
            write_text(display, "CALL AN UBER OR");
            display.new_line();
            write_text(display, "#TAXI (#");
            for &d in &config.contact_digits {
                display.write_digit(d.min(9));
            }
            display.write_char(')');
        }
    }
}

/// Write `text`, mapping spaces to cursor moves and ASCII digits to
/// `write_digit`.
pub fn write_text(display: &mut impl CharacterDisplay, text: &str) {
    for c in text.chars() {
        match c {
            ' ' => display.move_cursor(),
            '0'..='9' => display.write_digit(c as u8 - b'0'),
            _ => display.write_char(c),
        }
    }
}

/// `0.NN`: two significant digits of a BAC scaled by 100 000.
fn write_bac_figure(display: &mut impl CharacterDisplay, bac: BacValue) {
    display.write_digit(0);
    display.write_char('.');
    if bac < 10 {
        display.write_digit(0);
        display.write_digit(0);
    } else {
        display.write_digit((bac / 10_000).min(9) as u8);
        display.write_digit(((bac % 10_000) / 1000).min(9) as u8);
    }
}
